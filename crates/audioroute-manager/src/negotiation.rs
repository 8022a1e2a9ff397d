//! Synchronous negotiation client for the device module.
//!
//! Wraps the [`AudioModule`] trait object and implements the two-phase
//! port-config protocol: propose the request, and if the module answers
//! with a counter-suggestion instead of applying it, resubmit that
//! suggestion exactly once. Patches are coarser grained and go through a
//! single round trip.

use std::sync::Arc;

use audioroute_hal::{
    AudioModule, AudioPatch, AudioPort, AudioPortConfig, OpenStreamArgs, PatchId, PortConfigId,
    StreamDescriptor,
};
use tracing::{debug, error};

use crate::error::{RouteError, RouteResult};

/// Blocking call wrapper around the negotiating peer.
pub struct NegotiationClient {
    instance: String,
    module: Arc<dyn AudioModule>,
}

impl NegotiationClient {
    pub fn new(instance: impl Into<String>, module: Arc<dyn AudioModule>) -> Self {
        Self {
            instance: instance.into(),
            module,
        }
    }

    /// Returns the module instance name (for logging).
    pub fn instance(&self) -> &str {
        &self.instance
    }

    pub fn list_ports(&self) -> RouteResult<Vec<AudioPort>> {
        Ok(self.module.list_ports()?)
    }

    pub fn list_port_configs(&self) -> RouteResult<Vec<AudioPortConfig>> {
        Ok(self.module.list_port_configs()?)
    }

    pub fn list_patches(&self) -> RouteResult<Vec<AudioPatch>> {
        Ok(self.module.list_patches()?)
    }

    /// Negotiates a port configuration with the module.
    ///
    /// If the module did not apply the request verbatim, its suggestion
    /// is resubmitted once. A module that refuses its own suggestion
    /// cannot be negotiated with at all, which is reported as
    /// [`RouteError::NotInitialized`].
    pub fn apply_port_config(&self, requested: &AudioPortConfig) -> RouteResult<AudioPortConfig> {
        let (applied, as_requested) = self.module.set_port_config(requested)?;
        if as_requested {
            return Ok(applied);
        }
        debug!(
            instance = %self.instance,
            "module suggested an alternative port config, resubmitting: {:?}",
            applied
        );
        let (applied, as_requested) = self.module.set_port_config(&applied)?;
        if !as_requested {
            error!(
                instance = %self.instance,
                "module did not apply its own suggested config: {:?}",
                applied
            );
            return Err(RouteError::NotInitialized);
        }
        Ok(applied)
    }

    /// Negotiates a patch with the module. Single round trip; the module
    /// accepts (filling in latencies and buffer sizing) or rejects.
    pub fn apply_patch(&self, requested: &AudioPatch) -> RouteResult<AudioPatch> {
        Ok(self.module.set_patch(requested)?)
    }

    pub fn reset_port_config(&self, id: PortConfigId) -> RouteResult<()> {
        Ok(self.module.reset_port_config(id)?)
    }

    pub fn reset_patch(&self, id: PatchId) -> RouteResult<()> {
        Ok(self.module.reset_patch(id)?)
    }

    pub fn open_stream(&self, args: OpenStreamArgs) -> RouteResult<StreamDescriptor> {
        Ok(self.module.open_stream(args)?)
    }
}
