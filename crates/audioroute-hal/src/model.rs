//! Audio routing data model.
//!
//! These are the objects exchanged with the device module during
//! negotiation: declared ports, concrete port configurations and patches,
//! plus the format vocabulary they are built from. The transport encoding
//! is owned by the module implementation; the types here only carry the
//! serde derives.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{IoHandle, PatchId, PortConfigId, PortId};

/// Sample representation of a PCM stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SampleFormat {
    PcmI16,
    PcmI24,
    PcmI32,
    PcmF32,
}

impl SampleFormat {
    /// Returns the size of one sample in bytes.
    pub const fn bytes_per_sample(&self) -> usize {
        match self {
            SampleFormat::PcmI16 => 2,
            SampleFormat::PcmI24 => 3,
            SampleFormat::PcmI32 | SampleFormat::PcmF32 => 4,
        }
    }
}

/// Channel position bit mask.
///
/// One bit per speaker/microphone position; the number of set bits is the
/// channel count of the stream.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ChannelMask(pub u32);

impl ChannelMask {
    pub const MONO: Self = ChannelMask(0x1);
    pub const STEREO: Self = ChannelMask(0x3);
    pub const QUAD: Self = ChannelMask(0xf);
    pub const FIVE_POINT_ONE: Self = ChannelMask(0x3f);

    /// Returns the number of channels in the mask.
    pub const fn channel_count(&self) -> usize {
        self.0.count_ones() as usize
    }
}

impl fmt::Display for ChannelMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:x}", self.0)
    }
}

/// The format triple fully describing a PCM stream layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AudioFormat {
    pub sample_rate: u32,
    pub channel_mask: ChannelMask,
    pub sample_format: SampleFormat,
}

impl AudioFormat {
    /// Returns the size of one frame (one sample per channel) in bytes.
    pub fn frame_size_bytes(&self) -> usize {
        self.channel_mask.channel_count() * self.sample_format.bytes_per_sample()
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}Hz/{}/{:?}",
            self.sample_rate, self.channel_mask, self.sample_format
        )
    }
}

/// Stream direction as seen from the device module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Input,
    Output,
}

/// Input stream flag bits.
pub mod input_flags {
    /// Low-latency capture path. Not mandatory: lookups may retry with
    /// this bit cleared if no port advertises it.
    pub const FAST: u32 = 1 << 0;
    pub const RAW: u32 = 1 << 1;
    pub const SYNC: u32 = 1 << 2;
    pub const DIRECT: u32 = 1 << 3;
}

/// Output stream flag bits.
pub mod output_flags {
    pub const DIRECT: u32 = 1 << 0;
    pub const PRIMARY: u32 = 1 << 1;
    pub const FAST: u32 = 1 << 2;
    pub const DEEP_BUFFER: u32 = 1 << 3;
    pub const COMPRESS_OFFLOAD: u32 = 1 << 4;
}

/// Direction-tagged i/o flag mask.
///
/// The tag doubles as the stream direction; the payload is a bit mask out
/// of [`input_flags`] or [`output_flags`] respectively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IoFlags {
    Input(u32),
    Output(u32),
}

impl IoFlags {
    pub fn direction(&self) -> Direction {
        match self {
            IoFlags::Input(_) => Direction::Input,
            IoFlags::Output(_) => Direction::Output,
        }
    }

    pub fn is_input(&self) -> bool {
        matches!(self, IoFlags::Input(_))
    }

    /// Returns the raw flag bits regardless of direction.
    pub fn bits(&self) -> u32 {
        match self {
            IoFlags::Input(bits) | IoFlags::Output(bits) => *bits,
        }
    }
}

/// Kind of a device-backed endpoint.
///
/// `InDefault` and `OutDefault` are sentinel categories: they address
/// whatever port the module flagged as the default for that direction,
/// not a concrete piece of hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceType {
    InDefault,
    InMicrophone,
    InHeadset,
    InTelephonyRx,
    OutDefault,
    OutSpeaker,
    OutHeadset,
    OutHdmi,
    OutTelephonyTx,
}

impl DeviceType {
    pub fn is_input(&self) -> bool {
        matches!(
            self,
            DeviceType::InDefault
                | DeviceType::InMicrophone
                | DeviceType::InHeadset
                | DeviceType::InTelephonyRx
        )
    }

    /// Returns the direction this type is a default sentinel for, if any.
    pub fn default_sentinel(&self) -> Option<Direction> {
        match self {
            DeviceType::InDefault => Some(Direction::Input),
            DeviceType::OutDefault => Some(Direction::Output),
            _ => None,
        }
    }
}

/// Address of a device-backed endpoint.
///
/// Empty for devices that exist at most once per module (e.g. the
/// built-in speaker).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceDescriptor {
    pub device_type: DeviceType,
    pub address: String,
}

impl DeviceDescriptor {
    pub fn new(device_type: DeviceType, address: impl Into<String>) -> Self {
        Self {
            device_type,
            address: address.into(),
        }
    }

    /// Descriptor for the sentinel default device of a direction.
    pub fn default_for(direction: Direction) -> Self {
        let device_type = match direction {
            Direction::Input => DeviceType::InDefault,
            Direction::Output => DeviceType::OutDefault,
        };
        Self::new(device_type, "")
    }
}

/// A supported (format, sample-rate-set, channel-mask-set) combination
/// advertised by a mix port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioProfile {
    pub sample_format: SampleFormat,
    pub sample_rates: Vec<u32>,
    pub channel_masks: Vec<ChannelMask>,
}

impl AudioProfile {
    /// Returns true if the profile covers the given format triple.
    pub fn supports(&self, format: &AudioFormat) -> bool {
        self.sample_format == format.sample_format
            && self.sample_rates.contains(&format.sample_rate)
            && self.channel_masks.contains(&format.channel_mask)
    }
}

/// Extension payload distinguishing device ports from mix ports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PortExt {
    /// Hardware-backed endpoint.
    Device {
        device: DeviceDescriptor,
        /// Set on the module-designated default device of this direction.
        is_default: bool,
    },
    /// Software-stream-facing endpoint.
    Mix { profiles: Vec<AudioProfile> },
}

/// A declared endpoint of the routing graph.
///
/// Ports are enumerated once from the module at load time and never
/// change afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioPort {
    pub id: PortId,
    pub name: String,
    pub flags: IoFlags,
    pub ext: PortExt,
}

/// Extension payload of a concrete port configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PortConfigExt {
    Device(DeviceDescriptor),
    Mix {
        /// Handle of the stream this configuration belongs to.
        handle: IoHandle,
    },
}

/// A concrete, negotiated configuration of one port.
///
/// Field-level options reflect the negotiation protocol: a request may
/// leave fields unset for the module to fill in, but a stored mix
/// configuration is always fully specified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioPortConfig {
    pub id: PortConfigId,
    pub port_id: PortId,
    pub sample_rate: Option<u32>,
    pub channel_mask: Option<ChannelMask>,
    pub sample_format: Option<SampleFormat>,
    pub flags: Option<IoFlags>,
    pub ext: PortConfigExt,
}

impl AudioPortConfig {
    /// Returns true if rate, mask, format and flags are all present.
    pub fn is_fully_specified(&self) -> bool {
        self.sample_rate.is_some()
            && self.channel_mask.is_some()
            && self.sample_format.is_some()
            && self.flags.is_some()
    }

    /// Returns the format triple if all three fields are present.
    pub fn format_triple(&self) -> Option<AudioFormat> {
        Some(AudioFormat {
            sample_rate: self.sample_rate?,
            channel_mask: self.channel_mask?,
            sample_format: self.sample_format?,
        })
    }

    /// Returns true if the stored triple equals the given format.
    pub fn matches_format(&self, format: &AudioFormat) -> bool {
        self.sample_rate == Some(format.sample_rate)
            && self.channel_mask == Some(format.channel_mask)
            && self.sample_format == Some(format.sample_format)
    }

    /// Copies the format triple into the configuration fields.
    pub fn set_format(&mut self, format: &AudioFormat) {
        self.sample_rate = Some(format.sample_rate);
        self.channel_mask = Some(format.channel_mask);
        self.sample_format = Some(format.sample_format);
    }
}

/// A negotiated connection between port configurations.
///
/// Source and sink id lists are compared as sets; latency and minimum
/// buffer size are filled in by the module when the patch is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioPatch {
    pub id: PatchId,
    pub source_port_config_ids: Vec<PortConfigId>,
    pub sink_port_config_ids: Vec<PortConfigId>,
    pub latencies_ms: Vec<i32>,
    pub min_stream_buffer_size_frames: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_size() {
        let format = AudioFormat {
            sample_rate: 48_000,
            channel_mask: ChannelMask::STEREO,
            sample_format: SampleFormat::PcmI16,
        };
        assert_eq!(format.frame_size_bytes(), 4);

        let format = AudioFormat {
            sample_rate: 44_100,
            channel_mask: ChannelMask::FIVE_POINT_ONE,
            sample_format: SampleFormat::PcmF32,
        };
        assert_eq!(format.frame_size_bytes(), 24);
    }

    #[test]
    fn test_channel_count() {
        assert_eq!(ChannelMask::MONO.channel_count(), 1);
        assert_eq!(ChannelMask::STEREO.channel_count(), 2);
        assert_eq!(ChannelMask::FIVE_POINT_ONE.channel_count(), 6);
    }

    #[test]
    fn test_profile_supports() {
        let profile = AudioProfile {
            sample_format: SampleFormat::PcmI16,
            sample_rates: vec![44_100, 48_000],
            channel_masks: vec![ChannelMask::MONO, ChannelMask::STEREO],
        };

        let format = AudioFormat {
            sample_rate: 48_000,
            channel_mask: ChannelMask::STEREO,
            sample_format: SampleFormat::PcmI16,
        };
        assert!(profile.supports(&format));

        let unsupported = AudioFormat {
            sample_rate: 96_000,
            ..format
        };
        assert!(!profile.supports(&unsupported));
    }

    #[test]
    fn test_default_sentinel() {
        assert_eq!(
            DeviceType::InDefault.default_sentinel(),
            Some(Direction::Input)
        );
        assert_eq!(
            DeviceType::OutDefault.default_sentinel(),
            Some(Direction::Output)
        );
        assert_eq!(DeviceType::OutSpeaker.default_sentinel(), None);
    }

    #[test]
    fn test_port_config_specification() {
        let mut config = AudioPortConfig {
            id: PortConfigId::from_raw(1),
            port_id: PortId::from_raw(2),
            sample_rate: None,
            channel_mask: None,
            sample_format: None,
            flags: Some(IoFlags::Output(0)),
            ext: PortConfigExt::Mix {
                handle: IoHandle(10),
            },
        };
        assert!(!config.is_fully_specified());
        assert_eq!(config.format_triple(), None);

        let format = AudioFormat {
            sample_rate: 48_000,
            channel_mask: ChannelMask::STEREO,
            sample_format: SampleFormat::PcmI24,
        };
        config.set_format(&format);
        assert!(config.is_fully_specified());
        assert_eq!(config.format_triple(), Some(format));
        assert!(config.matches_format(&format));
    }

    #[test]
    fn test_io_flags() {
        let flags = IoFlags::Input(input_flags::FAST | input_flags::RAW);
        assert!(flags.is_input());
        assert_eq!(flags.direction(), Direction::Input);
        assert_eq!(flags.bits() & input_flags::FAST, input_flags::FAST);
    }
}
