//! Framework patch upsert: the caller-facing surface for creating,
//! updating and releasing patches by a caller-chosen handle.
//!
//! The handle space belongs to the framework caller and may outlive any
//! single patch incarnation; the handle map is the only bridge between it
//! and the module's patch id space.

use std::collections::BTreeSet;
use std::fmt;

use audioroute_hal::{AudioPortConfig, PortConfigId};
use tracing::{debug, warn};

use crate::cleanup::{CleanupAction, Cleanups};
use crate::error::{RouteError, RouteResult};
use crate::manager::RouteManager;

/// Caller-chosen, long-lived patch identifier.
///
/// Distinct from the module's [`audioroute_hal::PatchId`] space and never
/// implicitly interconvertible with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FrameworkHandle(i32);

impl FrameworkHandle {
    pub const fn new(raw: i32) -> Self {
        FrameworkHandle(raw)
    }

    pub const fn as_raw(&self) -> i32 {
        self.0
    }
}

impl fmt::Display for FrameworkHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl RouteManager {
    /// Creates or updates the patch identified by `handle`.
    ///
    /// Every source/sink request is resolved through the port-config
    /// resolver. A known handle fully replaces its patch's endpoint sets
    /// (never merges) while keeping the association; an unknown or absent
    /// handle creates a new patch. When the caller passes no handle at
    /// all, one is minted equal to the module-assigned patch id, a
    /// compromise that holds only while handles and patch ids do not
    /// collide, which the call enforces.
    pub fn create_or_update_patch(
        &mut self,
        sources: &[AudioPortConfig],
        sinks: &[AudioPortConfig],
        handle: &mut Option<FrameworkHandle>,
    ) -> RouteResult<()> {
        self.ensure_initialized()?;
        if sources.is_empty() || sinks.is_empty() {
            return Err(RouteError::bad_value(
                "a patch needs at least one source and one sink",
            ));
        }
        let mut cleanups = Cleanups::new();
        let result = self.upsert_patch_inner(sources, sinks, handle, &mut cleanups);
        if result.is_ok() {
            cleanups.disarm_all();
        }
        self.unwind(&mut cleanups);
        result
    }

    fn upsert_patch_inner(
        &mut self,
        sources: &[AudioPortConfig],
        sinks: &[AudioPortConfig],
        handle: &mut Option<FrameworkHandle>,
        cleanups: &mut Cleanups,
    ) -> RouteResult<()> {
        // The handle may point at a patch that is still present; if so,
        // its endpoint lists are replaced wholesale below.
        let known_patch_id = handle.and_then(|h| self.fwk_handles.get(&h).copied());
        let mut existing = known_patch_id.and_then(|id| self.patches.get(&id).cloned());
        if let Some(patch) = existing.as_mut() {
            patch.source_port_config_ids.clear();
            patch.sink_port_config_ids.clear();
        }

        let source_ids = self.resolve_endpoint_configs(sources, cleanups)?;
        let sink_ids = self.resolve_endpoint_configs(sinks, cleanups)?;

        if let Some(mut patch) = existing {
            // Always resubmitted as a direct set: the id sets differ from
            // what is on file, a find-or-create would miss anyway.
            patch.source_port_config_ids = source_ids;
            patch.sink_port_config_ids = sink_ids;
            let applied = self.client.apply_patch(&patch)?;
            debug!(
                instance = self.client.instance(),
                id = %applied.id,
                "updated patch"
            );
            self.patches.insert(applied.id, applied);
            // The handle keeps pointing at the same patch id.
            return Ok(());
        }

        let sources: BTreeSet<PortConfigId> = source_ids.into_iter().collect();
        let sinks: BTreeSet<PortConfigId> = sink_ids.into_iter().collect();
        let (patch, _created) = self.find_or_create_patch(&sources, &sinks)?;
        // No rollback entry for the patch: a patch with no live configs
        // is harmless, so 'created' is ignored here.
        match *handle {
            Some(h) => {
                self.fwk_handles.insert(h, patch.id);
            }
            None => {
                // The module cannot mint a handle that is unique in the
                // framework's space; reusing the patch id only works
                // while the two spaces happen not to collide. Known to
                // occur in test setups only.
                let minted = FrameworkHandle::new(patch.id.as_raw());
                if self.fwk_handles.contains_key(&minted) {
                    warn!(
                        instance = self.client.instance(),
                        handle = %minted,
                        "minted patch handle clashes with an existing framework handle"
                    );
                    return Err(RouteError::bad_value(format!(
                        "minted patch handle {minted} clashes with an existing handle"
                    )));
                }
                self.fwk_handles.insert(minted, patch.id);
                *handle = Some(minted);
            }
        }
        Ok(())
    }

    fn resolve_endpoint_configs(
        &mut self,
        requests: &[AudioPortConfig],
        cleanups: &mut Cleanups,
    ) -> RouteResult<Vec<PortConfigId>> {
        let mut ids = Vec::with_capacity(requests.len());
        for request in requests {
            let (config, created) = self.find_or_create_port_config(request)?;
            if created {
                cleanups.push(CleanupAction::ResetPortConfig(config.id));
            }
            ids.push(config.id);
        }
        Ok(ids)
    }

    /// Releases the patch identified by `handle`.
    ///
    /// Unknown handles are a [`RouteError::BadValue`] and cause no module
    /// call. A module-side reset failure propagates and leaves the
    /// association in place.
    pub fn release_patch(&mut self, handle: FrameworkHandle) -> RouteResult<()> {
        self.ensure_initialized()?;
        let Some(patch_id) = self.fwk_handles.get(&handle).copied() else {
            warn!(
                instance = self.client.instance(),
                %handle,
                "release of unknown patch handle"
            );
            return Err(RouteError::bad_value(format!(
                "unknown patch handle {handle}"
            )));
        };
        self.client.reset_patch(patch_id)?;
        self.patches.remove(&patch_id);
        self.fwk_handles.remove(&handle);
        debug!(
            instance = self.client.instance(),
            %handle,
            patch = %patch_id,
            "released patch"
        );
        Ok(())
    }

    /// Returns the module patch id a framework handle currently maps to.
    pub fn patch_id_for_handle(&self, handle: FrameworkHandle) -> Option<audioroute_hal::PatchId> {
        self.fwk_handles.get(&handle).copied()
    }

    pub fn handle_count(&self) -> usize {
        self.fwk_handles.len()
    }
}
