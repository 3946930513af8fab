//! Background Tasks Module
//!
//! Contains background tasks that run for the lifetime of a cache.
//!
//! # Tasks
//! - Expiry sweep: removes expired entries at the configured interval

mod sweep;

pub use sweep::SweepHandle;
pub(crate) use sweep::spawn_sweep_task;
