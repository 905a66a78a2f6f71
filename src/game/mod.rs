//! Game core: round state machine, scoring and the session that ties
//! them to the player store.

pub mod events;
pub mod round;
pub mod scoring;
pub mod session;
