//! # Perfect Archive
//!
//! A game show statistics archive: stores per-episode player results,
//! determines who advanced and who won, and serves cached corpus-wide
//! statistics and leaderboards.
//!
//! ## Architecture
//!
//! - **models**: Core data structures (games, players, statistics payloads)
//! - **calculate**: Outcome engine, aggregation and relative ratings
//! - **storage**: Filesystem store (JSONL games, JSON snapshot)
//! - **cache**: Persisted statistics snapshot, rebuilt after every write
//! - **ingest**: Submission parsing, validation and the write flow
//! - **api**: REST API endpoints
//! - **config**: Configuration loading and validation

pub mod api;
pub mod cache;
pub mod calculate;
pub mod config;
pub mod ingest;
pub mod models;
pub mod storage;

pub use models::*;
