//! Audio HAL module boundary.
//!
//! This crate defines everything the routing manager shares with the
//! audio device module it negotiates against: the error taxonomy, the
//! strongly-typed object ids, the port/config/patch data model and the
//! [`AudioModule`] trait describing the module's synchronous call
//! surface. The wire transport behind that trait is out of scope.

pub mod error;
pub mod model;
pub mod module;
pub mod types;

pub use error::{ModuleError, ModuleResult};
pub use model::{
    input_flags, output_flags, AudioFormat, AudioPatch, AudioPort, AudioPortConfig, AudioProfile,
    ChannelMask, DeviceDescriptor, DeviceType, Direction, IoFlags, PortConfigExt, PortExt,
    SampleFormat,
};
pub use module::{AudioModule, OpenStreamArgs, StreamDescriptor};
pub use types::{IoHandle, PatchId, PortConfigId, PortId, RawId};
