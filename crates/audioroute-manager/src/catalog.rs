//! Port catalog: the immutable-after-load snapshot of declared ports.
//!
//! Loaded once from the module; afterwards the port map never changes.
//! The catalog also owns the two distinguished default-port ids and the
//! port lookup primitives used by the resolvers.

use std::collections::BTreeMap;

use audioroute_hal::{
    input_flags, AudioFormat, AudioPort, AudioPortConfig, DeviceDescriptor, Direction, IoFlags,
    PortConfigExt, PortExt, PortId,
};
use tracing::{info, warn};

use crate::error::RouteResult;
use crate::negotiation::NegotiationClient;

/// Snapshot of the module's declared ports.
#[derive(Debug)]
pub struct PortCatalog {
    ports: BTreeMap<PortId, AudioPort>,
    default_input_port: Option<PortId>,
    default_output_port: Option<PortId>,
}

impl PortCatalog {
    /// An unloaded catalog; every lookup misses.
    pub(crate) fn empty() -> Self {
        Self {
            ports: BTreeMap::new(),
            default_input_port: None,
            default_output_port: None,
        }
    }

    /// Queries the module for its full port list and snapshots it.
    pub(crate) fn load(client: &NegotiationClient) -> RouteResult<Self> {
        let ports = client.list_ports()?;
        if ports.is_empty() {
            warn!(
                instance = client.instance(),
                "module returned an empty list of audio ports"
            );
        }
        let mut catalog = Self::empty();
        for port in ports {
            if let PortExt::Device {
                is_default: true, ..
            } = port.ext
            {
                match port.flags.direction() {
                    Direction::Input => catalog.default_input_port = Some(port.id),
                    Direction::Output => catalog.default_output_port = Some(port.id),
                }
            }
            catalog.ports.insert(port.id, port);
        }
        info!(
            instance = client.instance(),
            ports = catalog.ports.len(),
            default_input = ?catalog.default_input_port,
            default_output = ?catalog.default_output_port,
            "loaded port catalog"
        );
        Ok(catalog)
    }

    pub fn get(&self, id: PortId) -> Option<&AudioPort> {
        self.ports.get(&id)
    }

    pub fn len(&self) -> usize {
        self.ports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ports.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AudioPort> {
        self.ports.values()
    }

    /// Returns the module-designated default port of a direction.
    pub fn default_port(&self, direction: Direction) -> Option<PortId> {
        match direction {
            Direction::Input => self.default_input_port,
            Direction::Output => self.default_output_port,
        }
    }

    /// Finds the device port addressed by a descriptor.
    ///
    /// Sentinel default categories resolve through the distinguished
    /// default id for their direction; anything else matches on exact
    /// device type and address.
    pub(crate) fn find_device_port(&self, device: &DeviceDescriptor) -> Option<&AudioPort> {
        if let Some(direction) = device.device_type.default_sentinel() {
            return self.default_port(direction).and_then(|id| self.ports.get(&id));
        }
        self.ports.values().find(|port| match &port.ext {
            PortExt::Device { device: d, .. } => d == device,
            PortExt::Mix { .. } => false,
        })
    }

    /// Finds a mix port advertising the format triple with equal flags.
    ///
    /// A FAST input request that no port satisfies is retried with the
    /// FAST bit cleared before giving up.
    pub(crate) fn find_mix_port(&self, format: &AudioFormat, flags: IoFlags) -> Option<&AudioPort> {
        if let Some(port) = self.find_mix_port_exact(format, flags) {
            return Some(port);
        }
        if let IoFlags::Input(bits) = flags {
            if bits & input_flags::FAST != 0 {
                return self.find_mix_port_exact(format, IoFlags::Input(bits & !input_flags::FAST));
            }
        }
        None
    }

    fn find_mix_port_exact(&self, format: &AudioFormat, flags: IoFlags) -> Option<&AudioPort> {
        self.ports.values().find(|port| match &port.ext {
            PortExt::Mix { profiles } => {
                port.flags == flags && profiles.iter().any(|profile| profile.supports(format))
            }
            PortExt::Device { .. } => false,
        })
    }

    /// Returns true if a stored port configuration belongs to the device
    /// a descriptor addresses, honoring the default sentinels.
    pub(crate) fn device_matches_config(
        &self,
        device: &DeviceDescriptor,
        config: &AudioPortConfig,
    ) -> bool {
        let PortConfigExt::Device(d) = &config.ext else {
            return false;
        };
        match device.device_type.default_sentinel() {
            Some(direction) => self.default_port(direction) == Some(config.port_id),
            None => d == device,
        }
    }
}
