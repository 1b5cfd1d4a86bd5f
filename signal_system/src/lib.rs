//! Signal system for cache event handling
//!
//! This crate provides callback registration and event fan-out
//! for cache decisions in the CacheHaus ecosystem.

pub mod event;
pub mod manager;
pub mod prelude;
pub mod types;

pub use event::{CacheEvent, EventType};
pub use manager::SignalManager;
pub use types::EventCallback;
