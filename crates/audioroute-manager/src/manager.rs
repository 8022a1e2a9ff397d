//! The routing graph manager.
//!
//! [`RouteManager`] owns the four collections of the routing graph
//! (ports, port configurations, patches and the framework-handle map) and
//! keeps them consistent with the device module. One instance manages one
//! module; the caller serializes all entry points, the manager performs
//! no internal locking.

use std::collections::BTreeMap;
use std::sync::Arc;

use audioroute_hal::{AudioModule, AudioPatch, AudioPortConfig, PatchId, PortConfigId};
use tracing::{error, info, warn};

use crate::catalog::PortCatalog;
use crate::cleanup::{CleanupAction, Cleanups};
use crate::error::{RouteError, RouteResult};
use crate::framework::FrameworkHandle;
use crate::negotiation::NegotiationClient;

/// Audio routing graph manager for one device module.
pub struct RouteManager {
    pub(crate) client: NegotiationClient,
    pub(crate) catalog: PortCatalog,
    pub(crate) initialized: bool,
    pub(crate) port_configs: BTreeMap<PortConfigId, AudioPortConfig>,
    pub(crate) patches: BTreeMap<PatchId, AudioPatch>,
    pub(crate) fwk_handles: BTreeMap<FrameworkHandle, PatchId>,
}

impl std::fmt::Debug for RouteManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteManager")
            .field("instance", &self.client.instance())
            .field("initialized", &self.initialized)
            .field("ports", &self.catalog.len())
            .field("port_configs", &self.port_configs.len())
            .field("patches", &self.patches.len())
            .field("fwk_handles", &self.fwk_handles.len())
            .finish()
    }
}

impl RouteManager {
    /// Creates an uninitialized manager for a module instance. No module
    /// call happens until [`RouteManager::initialize`].
    pub fn new(instance: impl Into<String>, module: Arc<dyn AudioModule>) -> Self {
        Self {
            client: NegotiationClient::new(instance, module),
            catalog: PortCatalog::empty(),
            initialized: false,
            port_configs: BTreeMap::new(),
            patches: BTreeMap::new(),
            fwk_handles: BTreeMap::new(),
        }
    }

    /// Loads the port catalog and seeds the configuration and patch maps
    /// from whatever already exists on the module side (attach to a live
    /// module). Any failure leaves the manager unusable.
    pub fn initialize(&mut self) -> RouteResult<()> {
        match self.load_module_state() {
            Ok(()) => {
                self.initialized = true;
                info!(
                    instance = self.client.instance(),
                    port_configs = self.port_configs.len(),
                    patches = self.patches.len(),
                    "route manager initialized"
                );
                Ok(())
            }
            Err(e) => {
                error!(
                    instance = self.client.instance(),
                    error = %e,
                    "failed to initialize route manager"
                );
                Err(RouteError::NotInitialized)
            }
        }
    }

    fn load_module_state(&mut self) -> RouteResult<()> {
        self.catalog = PortCatalog::load(&self.client)?;
        // Both lists are allowed to be empty on a fresh module.
        for config in self.client.list_port_configs()? {
            self.port_configs.insert(config.id, config);
        }
        for patch in self.client.list_patches()? {
            self.patches.insert(patch.id, patch);
        }
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub(crate) fn ensure_initialized(&self) -> RouteResult<()> {
        if self.initialized {
            Ok(())
        } else {
            Err(RouteError::NotInitialized)
        }
    }

    /// Returns the immutable port catalog.
    pub fn catalog(&self) -> &PortCatalog {
        &self.catalog
    }

    pub fn port_config(&self, id: PortConfigId) -> Option<&AudioPortConfig> {
        self.port_configs.get(&id)
    }

    pub fn patch(&self, id: PatchId) -> Option<&AudioPatch> {
        self.patches.get(&id)
    }

    pub fn port_config_count(&self) -> usize {
        self.port_configs.len()
    }

    pub fn patch_count(&self) -> usize {
        self.patches.len()
    }

    /// Executes the pending undo entries of a rollback stack in reverse
    /// creation order. A no-op once the stack was disarmed or drained.
    pub fn unwind(&mut self, cleanups: &mut Cleanups) {
        for action in cleanups.take_pending() {
            match action {
                CleanupAction::ResetPortConfig(id) => self.reset_port_config(id),
                CleanupAction::ResetPatch(id) => self.reset_patch(id),
            }
        }
    }

    /// Destroys a port configuration, informing the module. Best effort:
    /// a module-side failure is logged, the local entry is gone either
    /// way.
    pub fn reset_port_config(&mut self, id: PortConfigId) {
        if self.port_configs.remove(&id).is_none() {
            error!(instance = self.client.instance(), %id, "port config not found for reset");
            return;
        }
        if let Err(e) = self.client.reset_port_config(id) {
            warn!(
                instance = self.client.instance(),
                %id,
                error = %e,
                "error while resetting port config"
            );
        }
    }

    /// Destroys a patch, informing the module. Best effort, like
    /// [`RouteManager::reset_port_config`].
    pub fn reset_patch(&mut self, id: PatchId) {
        if self.patches.remove(&id).is_none() {
            error!(instance = self.client.instance(), %id, "patch not found for reset");
            return;
        }
        if let Err(e) = self.client.reset_patch(id) {
            warn!(
                instance = self.client.instance(),
                %id,
                error = %e,
                "error while resetting patch"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::testing::{test_ports, TestModule};

    use super::*;

    #[test]
    fn test_initialize_loads_catalog_and_seeds_maps() {
        let module = Arc::new(TestModule::new(test_ports()));
        let mut manager = RouteManager::new("primary", module);

        assert!(!manager.is_initialized());
        manager.initialize().unwrap();
        assert!(manager.is_initialized());
        assert_eq!(manager.catalog().len(), 5);
        assert_eq!(manager.port_config_count(), 0);
        assert_eq!(manager.patch_count(), 0);
    }

    #[test]
    fn test_initialize_unreachable_module_is_not_initialized() {
        let module = Arc::new(TestModule::unreachable());
        let mut manager = RouteManager::new("primary", module);

        assert_eq!(manager.initialize().unwrap_err(), RouteError::NotInitialized);
        assert!(!manager.is_initialized());
    }

    #[test]
    fn test_entry_points_require_initialization() {
        let module = Arc::new(TestModule::new(test_ports()));
        let manager = RouteManager::new("primary", module);

        assert_eq!(
            manager.ensure_initialized().unwrap_err(),
            RouteError::NotInitialized
        );
    }
}
