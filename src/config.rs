//! Device properties, read from the command line or the environment.

use std::time::Duration;

use clap::{Parser, ValueEnum};
use tracing::level_filters::LevelFilter;

use crate::{
    externals::pump::services::Connection,
    internals::core::{cache::Thresholds, classifier::StatusTable, device::DeviceSettings},
};

/// Transport used to reach the pump controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ConnectType {
    Serial,
    Net,
}

/// Control system adapter for an Edwards nEXT turbomolecular pump.
#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct DeviceProperties {
    /// Either `net` or `serial`.
    #[arg(long, env = "NEXT_CONNECT_TYPE", value_enum, default_value_t = ConnectType::Serial)]
    pub connect_type: ConnectType,

    /// Serial port of the device.
    #[arg(long, env = "NEXT_SERIAL_PORT", default_value = "/dev/ttyUSB0")]
    pub serial_port: String,

    /// Baud rate of the serial port.
    #[arg(long, env = "NEXT_BAUDRATE", default_value_t = 9600)]
    pub baudrate: u32,

    /// Hostname or IP address of the device.
    #[arg(long, env = "NEXT_HOST_NAME", default_value = "device.domain")]
    pub host_name: String,

    /// Socket port number of the device.
    #[arg(long, env = "NEXT_PORT_NUMBER", default_value_t = 2001)]
    pub port_number: u16,

    /// Device which indicates pressure in the evacuated volume.
    #[arg(long, env = "NEXT_PRESSURE_DEVICE")]
    pub pressure_device: Option<String>,

    /// Maximum age of speed and status readings.
    #[arg(long, env = "NEXT_SPEED_THRESHOLD_MS", default_value_t = 200)]
    pub speed_threshold_ms: u64,

    /// Maximum age of link voltage, current and power readings.
    #[arg(long, env = "NEXT_LINK_THRESHOLD_MS", default_value_t = 300)]
    pub link_threshold_ms: u64,

    /// Maximum age of temperature readings.
    #[arg(long, env = "NEXT_TEMPERATURE_THRESHOLD_MS", default_value_t = 300)]
    pub temperature_threshold_ms: u64,

    /// How often the monitor logs a full snapshot.
    #[arg(long, env = "NEXT_MONITOR_INTERVAL_MS", default_value_t = 1000)]
    pub monitor_interval_ms: u64,

    /// Run against a simulated pump instead of real hardware.
    #[arg(long, env = "NEXT_SIMULATE")]
    pub simulate: bool,

    /// Run headless without reading operator requests from stdin.
    #[arg(long, env = "NEXT_NO_CONSOLE")]
    pub no_console: bool,

    /// Maximum log level (off, error, warn, info, debug, trace).
    #[arg(long, env = "NEXT_LOG_LEVEL", default_value = "info")]
    pub log_level: LevelFilter,
}

impl DeviceProperties {
    pub fn connection(&self) -> Connection {
        match self.connect_type {
            ConnectType::Serial => Connection::Serial {
                port: self.serial_port.clone(),
                baud_rate: self.baudrate,
            },
            ConnectType::Net => Connection::Net {
                host: self.host_name.clone(),
                port: self.port_number,
            },
        }
    }

    pub fn thresholds(&self) -> Thresholds {
        Thresholds {
            speed_state: Duration::from_millis(self.speed_threshold_ms),
            link: Duration::from_millis(self.link_threshold_ms),
            temperature: Duration::from_millis(self.temperature_threshold_ms),
        }
    }

    pub fn monitor_interval(&self) -> Duration {
        Duration::from_millis(self.monitor_interval_ms)
    }

    pub fn device_settings(&self) -> DeviceSettings {
        DeviceSettings {
            thresholds: self.thresholds(),
            pressure_device: self.pressure_device.clone(),
            status_table: StatusTable::next(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> DeviceProperties {
        let argv = std::iter::once("edwards_next_control").chain(args.iter().copied());
        DeviceProperties::try_parse_from(argv).expect("Failed to parse properties.")
    }

    #[test]
    fn test_serial_connection() {
        let properties = parse(&[
            "--connect-type",
            "serial",
            "--serial-port",
            "/dev/ttyS3",
            "--baudrate",
            "19200",
        ]);
        assert_eq!(
            properties.connection(),
            Connection::Serial {
                port: "/dev/ttyS3".to_string(),
                baud_rate: 19200
            }
        );
    }

    #[test]
    fn test_net_connection() {
        let properties = parse(&[
            "--connect-type",
            "net",
            "--host-name",
            "10.0.0.12",
            "--port-number",
            "4001",
        ]);
        assert_eq!(
            properties.connection(),
            Connection::Net {
                host: "10.0.0.12".to_string(),
                port: 4001
            }
        );
    }

    #[test]
    fn test_thresholds_and_pressure() {
        let properties = parse(&[
            "--speed-threshold-ms",
            "150",
            "--link-threshold-ms",
            "250",
            "--temperature-threshold-ms",
            "1000",
            "--pressure-device",
            "sim/gauge",
        ]);
        let settings = properties.device_settings();
        assert_eq!(settings.thresholds.speed_state, Duration::from_millis(150));
        assert_eq!(settings.thresholds.link, Duration::from_millis(250));
        assert_eq!(settings.thresholds.temperature, Duration::from_secs(1));
        assert_eq!(settings.pressure_device.as_deref(), Some("sim/gauge"));
    }

    #[test]
    fn test_invalid_connect_type() {
        let result =
            DeviceProperties::try_parse_from(["edwards_next_control", "--connect-type", "usb"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_console_can_be_disabled() {
        assert!(!parse(&[]).no_console);
        assert!(parse(&["--no-console"]).no_console);
    }
}
