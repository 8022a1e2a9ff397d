//! Audio routing graph manager.
//!
//! This crate owns the in-memory routing graph of one audio device
//! module and keeps it consistent with the module through synchronous
//! negotiation:
//!
//! ```text
//! [framework caller] ──> [RouteManager] ──> [NegotiationClient] ──> [device module]
//!                          │
//!                          ├── PortCatalog        (immutable port snapshot)
//!                          ├── port config map    (negotiated configurations)
//!                          ├── patch map          (negotiated connections)
//!                          └── handle map         (framework handle -> patch id)
//! ```
//!
//! Composite operations (opening a stream, upserting a framework patch)
//! thread a [`cleanup::Cleanups`] rollback stack through every step, so a
//! failure part-way leaves the module exactly as it was found.
//!
//! One manager instance serves one module and expects the caller to
//! serialize all entry points; there is no internal locking.

pub mod catalog;
pub mod cleanup;
mod config;
pub mod error;
pub mod framework;
pub mod manager;
pub mod negotiation;
mod patch;
pub mod stream;

#[cfg(test)]
pub(crate) mod testing;

pub use catalog::PortCatalog;
pub use cleanup::{CleanupAction, Cleanups};
pub use error::{RouteError, RouteResult};
pub use framework::FrameworkHandle;
pub use manager::RouteManager;
pub use negotiation::NegotiationClient;
pub use stream::{OpenedStream, PreparedStream, StreamConfig};

// Re-export the module-boundary types callers deal in.
pub use audioroute_hal::{
    AudioFormat, AudioPatch, AudioPort, AudioPortConfig, DeviceDescriptor, DeviceType, Direction,
    IoFlags, IoHandle, ModuleError, PatchId, PortConfigId, PortId,
};
