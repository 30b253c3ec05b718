//! External text-generation provider plumbing
//!
//! The core never sees credentials; it holds an already-instantiated
//! client exposing `complete(system, user) -> text`.

pub mod client;

pub use client::{LlmClient, ProviderClient};
