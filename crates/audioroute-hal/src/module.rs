//! The device-module interface.
//!
//! [`AudioModule`] is the synchronous call/response surface of the
//! negotiating peer. Calls block until the module responds; there is no
//! cancellation. Implementations own the transport entirely.

use crate::error::ModuleResult;
use crate::model::{AudioPatch, AudioPort, AudioPortConfig, Direction};
use crate::types::{PatchId, PortConfigId};

/// Arguments for opening a stream on a finalized mix port configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenStreamArgs {
    pub direction: Direction,
    /// The negotiated mix-side configuration the stream attaches to.
    pub mix_port_config_id: PortConfigId,
    pub buffer_size_frames: i64,
}

/// Module-side descriptor of an opened stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamDescriptor {
    pub mix_port_config_id: PortConfigId,
    pub buffer_size_frames: i64,
}

/// Synchronous interface to the audio device module.
///
/// Port configurations and patches follow a propose/accept protocol:
/// `set_port_config` may answer with a suggested alternative instead of
/// applying the request (see the second tuple element), while `set_patch`
/// either accepts or rejects outright.
pub trait AudioModule: Send + Sync {
    /// Enumerates the declared ports. Called once at catalog load.
    fn list_ports(&self) -> ModuleResult<Vec<AudioPort>>;

    /// Enumerates the port configurations that already exist on the
    /// module side (supports attaching to a live module).
    fn list_port_configs(&self) -> ModuleResult<Vec<AudioPortConfig>>;

    /// Enumerates the patches that already exist on the module side.
    fn list_patches(&self) -> ModuleResult<Vec<AudioPatch>>;

    /// Proposes a port configuration. Returns the configuration the
    /// module settled on and whether it equals the request; when false,
    /// the returned configuration is the module's counter-suggestion and
    /// has not been applied.
    fn set_port_config(
        &self,
        requested: &AudioPortConfig,
    ) -> ModuleResult<(AudioPortConfig, bool)>;

    /// Proposes a patch. The module either accepts (filling in id,
    /// latencies and minimum buffer size) or rejects.
    fn set_patch(&self, requested: &AudioPatch) -> ModuleResult<AudioPatch>;

    /// Destroys a port configuration on the module side.
    fn reset_port_config(&self, id: PortConfigId) -> ModuleResult<()>;

    /// Destroys a patch on the module side.
    fn reset_patch(&self, id: PatchId) -> ModuleResult<()>;

    /// Opens a stream on a finalized mix port configuration.
    fn open_stream(&self, args: OpenStreamArgs) -> ModuleResult<StreamDescriptor>;
}
