//! Fixtures, a fluent [`harness::TestWorkflowBuilder`], and reusable
//! invariant assertions for chorus integration tests.

pub mod assertions;
pub mod fixtures;
pub mod harness;

pub use harness::{TestWorkflow, TestWorkflowBuilder};
