//! Patch resolver: find-or-create logic for connections between sets of
//! port configurations.
//!
//! Two patches are the same connection iff their source-id set and
//! sink-id set are pairwise equal; the order in which ids were listed is
//! irrelevant.

use std::collections::BTreeSet;

use audioroute_hal::{AudioPatch, PatchId, PortConfigId};
use tracing::debug;

use crate::error::RouteResult;
use crate::manager::RouteManager;

impl RouteManager {
    /// Resolves or creates the patch connecting the given configuration
    /// sets. A newly negotiated patch takes the module's answer verbatim
    /// (id, per-link latencies, minimum buffer size).
    pub fn find_or_create_patch(
        &mut self,
        source_ids: &BTreeSet<PortConfigId>,
        sink_ids: &BTreeSet<PortConfigId>,
    ) -> RouteResult<(AudioPatch, bool)> {
        self.ensure_initialized()?;
        if let Some(patch) = self.find_patch(source_ids, sink_ids) {
            return Ok((patch.clone(), false));
        }
        let requested = AudioPatch {
            id: PatchId::from_raw(0),
            source_port_config_ids: source_ids.iter().copied().collect(),
            sink_port_config_ids: sink_ids.iter().copied().collect(),
            latencies_ms: Vec::new(),
            min_stream_buffer_size_frames: 0,
        };
        let applied = self.client.apply_patch(&requested)?;
        debug!(
            instance = self.client.instance(),
            id = %applied.id,
            sources = ?applied.source_port_config_ids,
            sinks = ?applied.sink_port_config_ids,
            "created patch"
        );
        self.patches.insert(applied.id, applied.clone());
        Ok((applied, true))
    }

    pub(crate) fn find_patch(
        &self,
        source_ids: &BTreeSet<PortConfigId>,
        sink_ids: &BTreeSet<PortConfigId>,
    ) -> Option<&AudioPatch> {
        self.patches.values().find(|patch| {
            let sources: BTreeSet<PortConfigId> =
                patch.source_port_config_ids.iter().copied().collect();
            let sinks: BTreeSet<PortConfigId> =
                patch.sink_port_config_ids.iter().copied().collect();
            sources == *source_ids && sinks == *sink_ids
        })
    }
}
