use bacsim_datalink::DataLinkAddress;
use bacsim_device::{ConfigError, DeviceConfig, ObjectCounts};
use clap::Parser;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

/// Command-line options for the `bacsim` binary.
///
/// With `--config` the device is loaded from a JSON file; otherwise one is
/// generated from the per-type object counts.
#[derive(Parser, Debug)]
#[command(name = "bacsim", about = "Simulated BACnet/IP field device")]
pub struct SimulatorArgs {
    /// JSON device configuration. Overrides the generated object set.
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Device instance number. Overrides the configured instance.
    #[arg(long)]
    pub instance: Option<u32>,
    /// Local address to bind.
    #[arg(long, default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub bind: IpAddr,
    #[arg(long, default_value_t = DataLinkAddress::BACNET_IP_DEFAULT_PORT)]
    pub port: u16,
    /// Where I-Am announcements are sent. Defaults to the local broadcast
    /// address on `--port`.
    #[arg(long)]
    pub broadcast: Option<SocketAddr>,
    #[arg(long, default_value_t = 3)]
    pub analog_inputs: u32,
    #[arg(long, default_value_t = 0)]
    pub analog_outputs: u32,
    #[arg(long, default_value_t = 0)]
    pub analog_values: u32,
    #[arg(long, default_value_t = 2)]
    pub binary_inputs: u32,
    #[arg(long, default_value_t = 0)]
    pub binary_outputs: u32,
    #[arg(long, default_value_t = 0)]
    pub binary_values: u32,
    #[arg(long, default_value_t = 0)]
    pub multi_state_inputs: u32,
    #[arg(long, default_value_t = 0)]
    pub multi_state_outputs: u32,
    #[arg(long, default_value_t = 0)]
    pub multi_state_values: u32,
}

pub const DEFAULT_INSTANCE: u32 = 9999;

impl SimulatorArgs {
    pub fn counts(&self) -> ObjectCounts {
        ObjectCounts {
            analog_inputs: self.analog_inputs,
            analog_outputs: self.analog_outputs,
            analog_values: self.analog_values,
            binary_inputs: self.binary_inputs,
            binary_outputs: self.binary_outputs,
            binary_values: self.binary_values,
            multi_state_inputs: self.multi_state_inputs,
            multi_state_outputs: self.multi_state_outputs,
            multi_state_values: self.multi_state_values,
        }
    }

    pub fn device_config(&self) -> Result<DeviceConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => DeviceConfig::load(path)?,
            None => DeviceConfig::generated(
                self.instance.unwrap_or(DEFAULT_INSTANCE),
                &self.counts(),
            ),
        };
        if let Some(instance) = self.instance {
            config.instance = instance;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }

    pub fn broadcast_addr(&self) -> DataLinkAddress {
        self.broadcast
            .map(DataLinkAddress::Ip)
            .unwrap_or_else(|| DataLinkAddress::local_broadcast(self.port))
    }
}
