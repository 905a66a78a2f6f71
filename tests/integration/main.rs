//! Integration tests for PRICE CLASH.
//!
//! Drive the public API end to end: price feed, round clock, session,
//! persistence.

mod game_flow;
mod mock_source;
