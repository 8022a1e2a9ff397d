//! Port-config resolver: find-or-create logic for concrete
//! configurations of a port.
//!
//! Two addressing modes exist: by device descriptor for hardware-side
//! configurations, and by format triple + flags + stream handle for
//! mix-side configurations. Both return the configuration together with a
//! flag telling the caller whether it was created by this call (and so
//! may need a rollback entry).

use audioroute_hal::{
    AudioFormat, AudioPortConfig, DeviceDescriptor, IoFlags, IoHandle, PortConfigExt,
    PortConfigId, PortExt,
};
use tracing::{debug, warn};

use crate::error::{RouteError, RouteResult};
use crate::manager::RouteManager;

impl RouteManager {
    /// Resolves or creates the configuration of a device port.
    ///
    /// The descriptor may name a sentinel default category, in which case
    /// matching goes through the catalog's distinguished default id
    /// rather than literal type/address equality.
    pub fn find_or_create_device_port_config(
        &mut self,
        device: &DeviceDescriptor,
    ) -> RouteResult<(AudioPortConfig, bool)> {
        self.ensure_initialized()?;
        if let Some(config) = self.find_device_port_config(device) {
            return Ok((config.clone(), false));
        }
        let Some(port) = self.catalog.find_device_port(device) else {
            warn!(
                instance = self.client.instance(),
                "device port for {:?} is not found in the module", device
            );
            return Err(RouteError::bad_value(format!(
                "no device port matches {device:?}"
            )));
        };
        // Seed with the port id and the port's own descriptor; the rest
        // is for the module to fill in.
        let port_id = port.id;
        let port_device = match &port.ext {
            PortExt::Device { device: d, .. } => d.clone(),
            // find_device_port never returns a mix port.
            PortExt::Mix { .. } => device.clone(),
        };
        let requested = AudioPortConfig {
            id: PortConfigId::from_raw(0),
            port_id,
            sample_rate: None,
            channel_mask: None,
            sample_format: None,
            flags: None,
            ext: PortConfigExt::Device(port_device),
        };
        let applied = self.create_port_config(&requested)?;
        Ok((applied, true))
    }

    /// Resolves or creates a mix-side configuration for a stream.
    ///
    /// Without flags only an existing configuration can be returned;
    /// creation is refused (the port lookup needs the flags to pick a mix
    /// port).
    pub fn find_or_create_mix_port_config(
        &mut self,
        format: &AudioFormat,
        flags: Option<IoFlags>,
        handle: IoHandle,
    ) -> RouteResult<(AudioPortConfig, bool)> {
        self.ensure_initialized()?;
        if let Some(config) = self.find_mix_port_config(format, flags, handle) {
            return Ok((config.clone(), false));
        }
        let Some(flags) = flags else {
            warn!(
                instance = self.client.instance(),
                %handle,
                "mix port config for {format} not found and was not created as flags are not specified"
            );
            return Err(RouteError::bad_value(format!(
                "no mix port config for {format}, handle {handle}, and no flags to create one"
            )));
        };
        let Some(port) = self.catalog.find_mix_port(format, flags) else {
            warn!(
                instance = self.client.instance(),
                "mix port for {format}, flags {:?} is not found in the module", flags
            );
            return Err(RouteError::bad_value(format!(
                "no mix port supports {format} with flags {flags:?}"
            )));
        };
        let mut requested = AudioPortConfig {
            id: PortConfigId::from_raw(0),
            port_id: port.id,
            sample_rate: None,
            channel_mask: None,
            sample_format: None,
            flags: Some(flags),
            ext: PortConfigExt::Mix { handle },
        };
        requested.set_format(format);
        let mut applied = self.create_port_config(&requested)?;
        // The module does not track stream ownership; tag the stored
        // entry with the owning handle ourselves.
        applied.ext = PortConfigExt::Mix { handle };
        if let Some(stored) = self.port_configs.get_mut(&applied.id) {
            stored.ext = PortConfigExt::Mix { handle };
        }
        Ok((applied, true))
    }

    /// Resolves or creates a configuration from an already-shaped
    /// request, dispatching on its extension tag. Mix requests must carry
    /// a full format triple.
    pub fn find_or_create_port_config(
        &mut self,
        requested: &AudioPortConfig,
    ) -> RouteResult<(AudioPortConfig, bool)> {
        match &requested.ext {
            PortConfigExt::Mix { handle } => {
                let Some(format) = requested.format_triple() else {
                    warn!(
                        instance = self.client.instance(),
                        "provided mix port config is not fully specified: {:?}", requested
                    );
                    return Err(RouteError::bad_value(
                        "mix port config request is not fully specified",
                    ));
                };
                self.find_or_create_mix_port_config(&format, requested.flags, *handle)
            }
            PortConfigExt::Device(device) => self.find_or_create_device_port_config(device),
        }
    }

    /// Negotiates a new configuration with the module and stores the
    /// accepted result.
    fn create_port_config(&mut self, requested: &AudioPortConfig) -> RouteResult<AudioPortConfig> {
        let applied = self.client.apply_port_config(requested)?;
        debug!(
            instance = self.client.instance(),
            id = %applied.id,
            port = %applied.port_id,
            "created port config"
        );
        self.port_configs.insert(applied.id, applied.clone());
        Ok(applied)
    }

    pub(crate) fn find_device_port_config(
        &self,
        device: &DeviceDescriptor,
    ) -> Option<&AudioPortConfig> {
        self.port_configs
            .values()
            .find(|config| self.catalog.device_matches_config(device, config))
    }

    pub(crate) fn find_mix_port_config(
        &self,
        format: &AudioFormat,
        flags: Option<IoFlags>,
        handle: IoHandle,
    ) -> Option<&AudioPortConfig> {
        self.port_configs.values().find(|config| {
            let PortConfigExt::Mix { handle: h } = &config.ext else {
                return false;
            };
            debug_assert!(
                config.is_fully_specified(),
                "stored mix port config is not fully specified: {config:?}"
            );
            *h == handle
                && config.matches_format(format)
                && flags.map_or(true, |f| config.flags == Some(f))
        })
    }
}
