//! PRICE CLASH: 10-second up/down price prediction game.
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod config;
pub mod types;
pub mod game;
pub mod store;
pub mod storage;
pub mod price;
pub mod engine;
pub mod server;
