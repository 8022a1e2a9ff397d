//! Stream-open orchestrator.
//!
//! Composes the port-config and patch resolvers behind a rollback stack
//! to atomically prepare the device-side route for one stream: device
//! config, mix config, patch between them. Resources created along the
//! way are unwound unless the whole operation, including the module's
//! stream factory call, succeeds.

use std::collections::BTreeSet;

use audioroute_hal::{
    AudioFormat, DeviceDescriptor, Direction, IoFlags, IoHandle, OpenStreamArgs, PortConfigId,
    StreamDescriptor,
};
use tracing::debug;

use crate::cleanup::{CleanupAction, Cleanups};
use crate::error::RouteResult;
use crate::manager::RouteManager;

/// Caller-requested stream parameters. `prepare_to_open_stream` rewrites
/// both fields with what was actually negotiated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamConfig {
    pub format: AudioFormat,
    /// Requested buffer size; filled from the patch's minimum when not
    /// specified.
    pub frame_count: Option<i64>,
}

impl StreamConfig {
    pub fn new(format: AudioFormat) -> Self {
        Self {
            format,
            frame_count: None,
        }
    }
}

/// Result of route preparation, pending the actual stream opening.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedStream {
    pub mix_port_config_id: PortConfigId,
    pub nominal_latency_ms: i32,
}

/// An opened stream together with its negotiated latency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenedStream {
    pub descriptor: StreamDescriptor,
    pub nominal_latency_ms: i32,
}

impl RouteManager {
    /// Prepares the device-side route for one stream.
    ///
    /// On return, `config` holds the format the mix config actually
    /// carries (the module may have normalized it) and a concrete frame
    /// count. Every resource created here is recorded in `cleanups`; the
    /// caller commits with [`Cleanups::disarm_all`] only once stream
    /// construction fully succeeds, and unwinds otherwise.
    pub fn prepare_to_open_stream(
        &mut self,
        io_handle: IoHandle,
        device: &DeviceDescriptor,
        flags: IoFlags,
        config: &mut StreamConfig,
        cleanups: &mut Cleanups,
    ) -> RouteResult<PreparedStream> {
        self.ensure_initialized()?;
        let is_input = flags.is_input();

        let (device_config, created) = self.find_or_create_device_port_config(device)?;
        if created {
            cleanups.push(CleanupAction::ResetPortConfig(device_config.id));
        }

        let (mix_config, created) =
            self.find_or_create_mix_port_config(&config.format, Some(flags), io_handle)?;
        if created {
            cleanups.push(CleanupAction::ResetPortConfig(mix_config.id));
        }
        if let Some(applied) = mix_config.format_triple() {
            config.format = applied;
        }

        let sources: BTreeSet<PortConfigId>;
        let sinks: BTreeSet<PortConfigId>;
        if is_input {
            sources = [device_config.id].into_iter().collect();
            sinks = [mix_config.id].into_iter().collect();
        } else {
            sources = [mix_config.id].into_iter().collect();
            sinks = [device_config.id].into_iter().collect();
        }
        let (patch, created) = self.find_or_create_patch(&sources, &sinks)?;
        if created {
            cleanups.push(CleanupAction::ResetPatch(patch.id));
        }

        let nominal_latency_ms = patch.latencies_ms.first().copied().unwrap_or(0);
        if config.frame_count.is_none() {
            config.frame_count = Some(patch.min_stream_buffer_size_frames);
        }
        debug!(
            instance = self.client.instance(),
            %io_handle,
            mix_config = %mix_config.id,
            patch = %patch.id,
            latency_ms = nominal_latency_ms,
            "prepared stream route"
        );
        Ok(PreparedStream {
            mix_port_config_id: mix_config.id,
            nominal_latency_ms,
        })
    }

    /// Prepares the route for an output stream and opens it through the
    /// module's stream factory. A factory failure unwinds everything the
    /// preparation created.
    pub fn open_output_stream(
        &mut self,
        io_handle: IoHandle,
        device: &DeviceDescriptor,
        flags: u32,
        config: &mut StreamConfig,
    ) -> RouteResult<OpenedStream> {
        self.open_stream_guarded(io_handle, device, IoFlags::Output(flags), config)
    }

    /// Input counterpart of [`RouteManager::open_output_stream`].
    pub fn open_input_stream(
        &mut self,
        io_handle: IoHandle,
        device: &DeviceDescriptor,
        flags: u32,
        config: &mut StreamConfig,
    ) -> RouteResult<OpenedStream> {
        self.open_stream_guarded(io_handle, device, IoFlags::Input(flags), config)
    }

    fn open_stream_guarded(
        &mut self,
        io_handle: IoHandle,
        device: &DeviceDescriptor,
        flags: IoFlags,
        config: &mut StreamConfig,
    ) -> RouteResult<OpenedStream> {
        self.ensure_initialized()?;
        let mut cleanups = Cleanups::new();
        let result = self.open_stream_inner(io_handle, device, flags, config, &mut cleanups);
        if result.is_ok() {
            cleanups.disarm_all();
        }
        self.unwind(&mut cleanups);
        result
    }

    fn open_stream_inner(
        &mut self,
        io_handle: IoHandle,
        device: &DeviceDescriptor,
        flags: IoFlags,
        config: &mut StreamConfig,
        cleanups: &mut Cleanups,
    ) -> RouteResult<OpenedStream> {
        let prepared = self.prepare_to_open_stream(io_handle, device, flags, config, cleanups)?;
        let descriptor = self.client.open_stream(OpenStreamArgs {
            direction: flags.direction(),
            mix_port_config_id: prepared.mix_port_config_id,
            buffer_size_frames: config.frame_count.unwrap_or(0),
        })?;
        Ok(OpenedStream {
            descriptor,
            nominal_latency_ms: prepared.nominal_latency_ms,
        })
    }

    /// Computes the byte size of an input buffer for the requested
    /// parameters by preparing (and immediately releasing) a route to the
    /// default input device. The temporary configs are always unwound;
    /// nothing this call creates survives it.
    pub fn get_input_buffer_size(&mut self, config: &StreamConfig) -> RouteResult<usize> {
        self.ensure_initialized()?;
        let mut working = config.clone();
        let device = DeviceDescriptor::default_for(Direction::Input);
        let mut cleanups = Cleanups::new();
        let result = self.prepare_to_open_stream(
            IoHandle::NONE,
            &device,
            IoFlags::Input(0),
            &mut working,
            &mut cleanups,
        );
        // Deliberately not disarmed: temporary port configs are released
        // on both success and failure.
        self.unwind(&mut cleanups);
        result?;
        let frames = working.frame_count.unwrap_or(0).max(0) as usize;
        Ok(frames * working.format.frame_size_bytes())
    }
}
