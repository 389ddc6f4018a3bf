//! Core types and the presence-inference engine for roomwatch.
//!
//! This crate is deliberately free of HTTP and database dependencies. Storage
//! is reached through the [`store::ReadingStore`] trait and alerts leave
//! through the [`alert::AlertSink`] trait; everything else (the sync window
//! clock, motion aggregation, the presence predicate) lives here.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod alert;
pub mod error;
pub mod monitor;
pub mod motion;
pub mod pair;
pub mod policy;
pub mod presence;
pub mod reading;
pub mod store;
pub mod window;

#[cfg(test)]
mod fake;

pub use error::{Error, Result};
