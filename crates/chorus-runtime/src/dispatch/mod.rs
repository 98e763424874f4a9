//! Dispatch drivers (spec §5): [`cooperative::drive`] runs the ready queue
//! to completion on the calling thread; [`parallel::drive`] spreads it
//! across a fixed worker pool while enforcing at-most-one in-flight
//! instance per node name (P5).

pub mod cooperative;
pub mod parallel;
