#![forbid(unsafe_code)]

//! Runtime: selection-driven property aggregation on background workers.
//!
//! # Role in the inspector
//! `inspect-runtime` owns the [`PropertiesManager`]. Given a selection, it
//! works out which panels and property groups apply to every selected object
//! (or to any of them, in union mode), builds their controls on a worker
//! thread, and attaches the result to the container on the owning thread.
//!
//! # Primary responsibilities
//! - **Aggregation**: the three passes in [`aggregate`] and [`materialize`].
//! - **Cancellation**: generation ids checked cooperatively by workers.
//! - **Thread accounting**: [`ThreadCounter`] for commands that must wait.
//! - **Deferred finalize**: results applied only when still current.
//!
//! # Debugging
//! Structured events go through `tracing`. For quick stderr output without a
//! subscriber, set `INSPECT_DEBUG_TRACE=1`.

pub mod aggregate;
pub mod config;
pub mod debug_trace;
pub mod finalize;
pub mod generation;
pub mod listeners;
pub mod manager;
pub mod materialize;
pub mod thread_count;
mod worker;

pub use aggregate::{AggregateOptions, Aggregation, aggregate};
pub use config::{AggregationMode, ConfigError, ManagerConfig, PropertyMerge};
pub use finalize::FinalizeOutcome;
pub use generation::{Generation, GenerationCounter, GenerationToken, Stale};
pub use listeners::{ListenerId, Listeners};
pub use manager::PropertiesManager;
pub use materialize::{build_panels, interpret_groups};
pub use thread_count::{ActiveTask, ThreadCounter};
pub use worker::{PropertiesCreated, ResultNotifier};
