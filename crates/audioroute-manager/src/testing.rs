//! Recording mock of the device module, shared by the unit tests.
//!
//! Simulates the negotiating peer without hardware: assigns ids out of a
//! module-wide counter, journals every negotiation and reset call, and
//! can be told to fail specific operations or to insist on a preferred
//! sample rate (exercising the two-phase protocol).

use std::sync::Mutex;

use audioroute_hal::{
    AudioModule, AudioPatch, AudioPort, AudioPortConfig, AudioProfile, ChannelMask,
    DeviceDescriptor, DeviceType, IoFlags, ModuleError, ModuleResult, OpenStreamArgs, PatchId,
    PortConfigExt, PortConfigId, PortExt, PortId, SampleFormat, StreamDescriptor,
};

/// One journaled reset call, in arrival order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetCall {
    PortConfig(PortConfigId),
    Patch(PatchId),
}

#[derive(Default)]
struct ModuleState {
    port_configs: Vec<AudioPortConfig>,
    patches: Vec<AudioPatch>,
    next_id: i32,
    set_port_config_calls: u32,
    set_patch_calls: u32,
    created_port_config_ids: Vec<PortConfigId>,
    last_patch_id: Option<PatchId>,
    resets: Vec<ResetCall>,
    fail_patches: Option<ModuleError>,
    fail_open_stream: Option<ModuleError>,
    preferred_rate: Option<u32>,
}

/// In-memory device module double.
pub struct TestModule {
    ports: Vec<AudioPort>,
    unreachable: bool,
    state: Mutex<ModuleState>,
}

impl TestModule {
    pub fn new(ports: Vec<AudioPort>) -> Self {
        Self {
            ports,
            unreachable: false,
            state: Mutex::new(ModuleState {
                next_id: 100,
                ..ModuleState::default()
            }),
        }
    }

    /// A module whose every call fails with `Unavailable`.
    pub fn unreachable() -> Self {
        Self {
            ports: Vec::new(),
            unreachable: true,
            state: Mutex::new(ModuleState::default()),
        }
    }

    /// Makes subsequent `set_patch` calls fail with the given error.
    pub fn fail_patches(&self, error: ModuleError) {
        self.state.lock().unwrap().fail_patches = Some(error);
    }

    /// Makes subsequent `open_stream` calls fail with the given error.
    pub fn fail_open_stream(&self, error: ModuleError) {
        self.state.lock().unwrap().fail_open_stream = Some(error);
    }

    /// Makes the module counter-suggest this sample rate for any mix
    /// config proposed with a different one.
    pub fn set_preferred_rate(&self, rate: u32) {
        self.state.lock().unwrap().preferred_rate = Some(rate);
    }

    pub fn set_port_config_calls(&self) -> u32 {
        self.state.lock().unwrap().set_port_config_calls
    }

    pub fn set_patch_calls(&self) -> u32 {
        self.state.lock().unwrap().set_patch_calls
    }

    pub fn created_port_config_ids(&self) -> Vec<PortConfigId> {
        self.state.lock().unwrap().created_port_config_ids.clone()
    }

    pub fn last_patch_id(&self) -> Option<PatchId> {
        self.state.lock().unwrap().last_patch_id
    }

    pub fn resets(&self) -> Vec<ResetCall> {
        self.state.lock().unwrap().resets.clone()
    }

    pub fn latency_ms(&self) -> i32 {
        20
    }

    pub fn min_buffer_frames(&self) -> i64 {
        960
    }

    fn check_reachable(&self) -> ModuleResult<()> {
        if self.unreachable {
            Err(ModuleError::Unavailable)
        } else {
            Ok(())
        }
    }
}

impl AudioModule for TestModule {
    fn list_ports(&self) -> ModuleResult<Vec<AudioPort>> {
        self.check_reachable()?;
        Ok(self.ports.clone())
    }

    fn list_port_configs(&self) -> ModuleResult<Vec<AudioPortConfig>> {
        self.check_reachable()?;
        Ok(self.state.lock().unwrap().port_configs.clone())
    }

    fn list_patches(&self) -> ModuleResult<Vec<AudioPatch>> {
        self.check_reachable()?;
        Ok(self.state.lock().unwrap().patches.clone())
    }

    fn set_port_config(
        &self,
        requested: &AudioPortConfig,
    ) -> ModuleResult<(AudioPortConfig, bool)> {
        self.check_reachable()?;
        let mut state = self.state.lock().unwrap();
        state.set_port_config_calls += 1;

        if let (Some(preferred), PortConfigExt::Mix { .. }) =
            (state.preferred_rate, &requested.ext)
        {
            if requested.sample_rate.is_some() && requested.sample_rate != Some(preferred) {
                let mut suggested = requested.clone();
                suggested.sample_rate = Some(preferred);
                return Ok((suggested, false));
            }
        }

        let mut applied = requested.clone();
        if applied.id.as_raw() == 0 {
            applied.id = PortConfigId::from_raw(state.next_id);
            state.next_id += 1;
        }
        state.created_port_config_ids.push(applied.id);
        state.port_configs.push(applied.clone());
        Ok((applied, true))
    }

    fn set_patch(&self, requested: &AudioPatch) -> ModuleResult<AudioPatch> {
        self.check_reachable()?;
        let mut state = self.state.lock().unwrap();
        if let Some(error) = &state.fail_patches {
            return Err(error.clone());
        }
        state.set_patch_calls += 1;

        let mut applied = requested.clone();
        if applied.id.as_raw() == 0 {
            applied.id = PatchId::from_raw(state.next_id);
            state.next_id += 1;
        }
        applied.latencies_ms = vec![self.latency_ms()];
        applied.min_stream_buffer_size_frames = self.min_buffer_frames();
        state.last_patch_id = Some(applied.id);
        state.patches.retain(|p| p.id != applied.id);
        state.patches.push(applied.clone());
        Ok(applied)
    }

    fn reset_port_config(&self, id: PortConfigId) -> ModuleResult<()> {
        self.check_reachable()?;
        let mut state = self.state.lock().unwrap();
        state.resets.push(ResetCall::PortConfig(id));
        state.port_configs.retain(|c| c.id != id);
        Ok(())
    }

    fn reset_patch(&self, id: PatchId) -> ModuleResult<()> {
        self.check_reachable()?;
        let mut state = self.state.lock().unwrap();
        state.resets.push(ResetCall::Patch(id));
        state.patches.retain(|p| p.id != id);
        Ok(())
    }

    fn open_stream(&self, args: OpenStreamArgs) -> ModuleResult<StreamDescriptor> {
        self.check_reachable()?;
        let state = self.state.lock().unwrap();
        if let Some(error) = &state.fail_open_stream {
            return Err(error.clone());
        }
        Ok(StreamDescriptor {
            mix_port_config_id: args.mix_port_config_id,
            buffer_size_frames: args.buffer_size_frames,
        })
    }
}

fn pcm16_profile() -> AudioProfile {
    AudioProfile {
        sample_format: SampleFormat::PcmI16,
        sample_rates: vec![44_100, 48_000],
        channel_masks: vec![ChannelMask::MONO, ChannelMask::STEREO],
    }
}

/// The standard five-port fixture: default speaker and microphone, one
/// mix port per direction, and a non-default wired headset.
pub fn test_ports() -> Vec<AudioPort> {
    vec![
        AudioPort {
            id: PortId::from_raw(1),
            name: "speaker".to_string(),
            flags: IoFlags::Output(0),
            ext: PortExt::Device {
                device: DeviceDescriptor::new(DeviceType::OutSpeaker, ""),
                is_default: true,
            },
        },
        AudioPort {
            id: PortId::from_raw(2),
            name: "builtin_mic".to_string(),
            flags: IoFlags::Input(0),
            ext: PortExt::Device {
                device: DeviceDescriptor::new(DeviceType::InMicrophone, ""),
                is_default: true,
            },
        },
        AudioPort {
            id: PortId::from_raw(3),
            name: "primary_output".to_string(),
            flags: IoFlags::Output(0),
            ext: PortExt::Mix {
                profiles: vec![pcm16_profile()],
            },
        },
        AudioPort {
            id: PortId::from_raw(4),
            name: "primary_input".to_string(),
            flags: IoFlags::Input(0),
            ext: PortExt::Mix {
                profiles: vec![pcm16_profile()],
            },
        },
        AudioPort {
            id: PortId::from_raw(5),
            name: "wired_headset".to_string(),
            flags: IoFlags::Output(0),
            ext: PortExt::Device {
                device: DeviceDescriptor::new(DeviceType::OutHeadset, ""),
                is_default: false,
            },
        },
    ]
}
