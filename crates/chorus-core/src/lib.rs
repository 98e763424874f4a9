//! Clock and identity utilities with no I/O and no knowledge of the event
//! model — every higher crate in the workspace depends on this one.

mod clock;
mod ids;

pub use clock::Clock;
pub use ids::new_id;
