use std::str::FromStr;

use tracing::{debug, instrument};

use crate::{
    internals::core::ports::{DriverError, PumpDriver},
    models::{
        readings::{LinkReading, SpeedState, TemperatureReading},
        status_bits::StatusBits,
    },
};

use super::services::{NextLinkService, Reply};

/// Rotational speed (Hz) and status word as hex.
const QUERY_SPEED_STATE: &str = "?V852";
/// Motor and controller temperatures (degC).
const QUERY_TEMPERATURES: &str = "?V859";
/// Link voltage, current and power in tenths.
const QUERY_LINK: &str = "?V860";
const COMMAND_START: &str = "!C852 1";
const COMMAND_STOP: &str = "!C852 0";

/// `PumpDriver` talking to a nEXT controller over its ASCII protocol.
pub struct NextPumpAdapter {
    service: NextLinkService,
}

impl NextPumpAdapter {
    pub fn new(service: NextLinkService) -> Self {
        Self { service }
    }

    /// Run a query and return exactly `count` value fields.
    fn query(&mut self, request: &str, count: usize) -> Result<Vec<String>, DriverError> {
        match self.service.transact(request)? {
            Reply::Values { fields, .. } if fields.len() == count => Ok(fields),
            Reply::Values { fields, .. } => Err(DriverError::Malformed {
                command: request.to_string(),
                reply: fields.join(";"),
            }),
            Reply::Status { code, .. } => Err(DriverError::Rejected {
                command: request.to_string(),
                code,
            }),
        }
    }

    fn command(&mut self, request: &str) -> Result<(), DriverError> {
        match self.service.transact(request)? {
            Reply::Status { code: 0, .. } => Ok(()),
            Reply::Status { code, .. } => Err(DriverError::Rejected {
                command: request.to_string(),
                code,
            }),
            Reply::Values { fields, .. } => Err(DriverError::Malformed {
                command: request.to_string(),
                reply: fields.join(";"),
            }),
        }
    }
}

fn parse_field<T: FromStr>(request: &str, field: &str) -> Result<T, DriverError> {
    field.parse().map_err(|_| DriverError::Malformed {
        command: request.to_string(),
        reply: field.to_string(),
    })
}

fn tenths(request: &str, field: &str) -> Result<f64, DriverError> {
    Ok(parse_field::<f64>(request, field)? / 10.0)
}

impl PumpDriver for NextPumpAdapter {
    #[instrument(skip_all)]
    fn speed_state(&mut self) -> Result<SpeedState, DriverError> {
        let fields = self.query(QUERY_SPEED_STATE, 2)?;
        let status = u16::from_str_radix(&fields[1], 16).map_err(|_| DriverError::Malformed {
            command: QUERY_SPEED_STATE.to_string(),
            reply: fields[1].clone(),
        })?;
        Ok(SpeedState {
            frequency_hz: parse_field(QUERY_SPEED_STATE, &fields[0])?,
            status: StatusBits::new(status),
        })
    }

    #[instrument(skip_all)]
    fn link(&mut self) -> Result<LinkReading, DriverError> {
        let fields = self.query(QUERY_LINK, 3)?;
        Ok(LinkReading {
            voltage_v: tenths(QUERY_LINK, &fields[0])?,
            current_a: tenths(QUERY_LINK, &fields[1])?,
            power_w: tenths(QUERY_LINK, &fields[2])?,
        })
    }

    #[instrument(skip_all)]
    fn temperatures(&mut self) -> Result<TemperatureReading, DriverError> {
        let fields = self.query(QUERY_TEMPERATURES, 2)?;
        Ok(TemperatureReading {
            motor_c: parse_field(QUERY_TEMPERATURES, &fields[0])?,
            controller_c: parse_field(QUERY_TEMPERATURES, &fields[1])?,
        })
    }

    fn start(&mut self) -> Result<(), DriverError> {
        debug!("Sending start command.");
        self.command(COMMAND_START)
    }

    fn stop(&mut self) -> Result<(), DriverError> {
        debug!("Sending stop command.");
        self.command(COMMAND_STOP)
    }

    fn close(&mut self) -> Result<(), DriverError> {
        self.service.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::externals::pump::services::tests::ScriptedStream;

    fn adapter(replies: &str) -> NextPumpAdapter {
        NextPumpAdapter::new(NextLinkService::from_stream(Box::new(ScriptedStream::new(
            replies,
        ))))
    }

    #[test]
    fn test_speed_state() {
        let reading = adapter("=V852 1500;0814\r")
            .speed_state()
            .expect("Failed to read speed.");

        assert_eq!(reading.frequency_hz, 1500.0);
        assert_eq!(reading.status, StatusBits::from_bits(&[2, 4, 11]));
    }

    #[test]
    fn test_link_is_scaled_from_tenths() {
        let reading = adapter("=V860 480;12;576\r")
            .link()
            .expect("Failed to read link.");

        assert_eq!(reading.voltage_v, 48.0);
        assert_eq!(reading.current_a, 1.2);
        assert_eq!(reading.power_w, 57.6);
    }

    #[test]
    fn test_temperatures() {
        let reading = adapter("=V859 35;41\r")
            .temperatures()
            .expect("Failed to read temperatures.");

        assert_eq!(reading.motor_c, 35.0);
        assert_eq!(reading.controller_c, 41.0);
    }

    #[test]
    fn test_query_error_code_is_rejected() {
        assert!(matches!(
            adapter("*V852 4\r").speed_state(),
            Err(DriverError::Rejected { code: 4, .. })
        ));
    }

    #[test]
    fn test_wrong_field_count_is_malformed() {
        assert!(matches!(
            adapter("=V860 480;12\r").link(),
            Err(DriverError::Malformed { .. })
        ));
        assert!(matches!(
            adapter("=V852 fast;0004\r").speed_state(),
            Err(DriverError::Malformed { .. })
        ));
    }

    #[test]
    fn test_start_and_stop() {
        let stream = ScriptedStream::new("*C852 0\r*C852 0\r*C852 7\r");
        let written = stream.written.clone();
        let mut pump = NextPumpAdapter::new(NextLinkService::from_stream(Box::new(stream)));

        pump.start().expect("Failed to start.");
        pump.stop().expect("Failed to stop.");
        assert!(matches!(
            pump.start(),
            Err(DriverError::Rejected { code: 7, .. })
        ));
        assert_eq!(
            written.lock().unwrap().as_slice(),
            b"!C852 1\r!C852 0\r!C852 1\r"
        );
    }
}
