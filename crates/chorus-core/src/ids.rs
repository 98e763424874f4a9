use uuid::Uuid;

/// Fresh identifier for a new message, event, or node. A thin indirection
/// over `Uuid::new_v4` so call sites read as intent ("new event id") rather
/// than restating the generation mechanism, and so the mechanism can change
/// in one place later.
pub fn new_id() -> Uuid {
    Uuid::new_v4()
}
