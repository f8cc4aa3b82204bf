//! OBD-II PID Definitions and Formulas
//!
//! Standard Mode 01 Parameter IDs and the arithmetic that turns their data
//! bytes into engineering units.

use crate::error::CommandResult;
use crate::reading::{strip_header, PayloadDecoder, Reading};
use elm_protocol::{CommandFrame, ElmResult, Mode};
use serde::{Deserialize, Serialize};

const KMH_TO_MPH: f64 = 0.621_371;
const KPA_TO_PSI: f64 = 0.145_038;
const GPS_TO_LBMIN: f64 = 0.132_277;

/// Standard OBD-II PIDs for Mode 01 (current data)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Pid {
    /// Calculated engine load (0x04)
    EngineLoad = 0x04,
    /// Engine coolant temperature (0x05)
    CoolantTemp = 0x05,
    /// Short-term fuel trim bank 1 (0x06)
    ShortFuelTrim = 0x06,
    /// Long-term fuel trim bank 1 (0x07)
    LongFuelTrim = 0x07,
    /// Intake manifold absolute pressure (0x0B)
    IntakeManifoldPressure = 0x0B,
    /// Engine RPM (0x0C)
    Rpm = 0x0C,
    /// Vehicle speed (0x0D)
    Speed = 0x0D,
    /// Mass air flow rate (0x10)
    Maf = 0x10,
    /// Throttle position (0x11)
    ThrottlePosition = 0x11,
    /// Oxygen sensor voltage bank 1, sensor 1 (0x14)
    O2Voltage = 0x14,
}

impl Pid {
    pub const ALL: [Pid; 10] = [
        Pid::EngineLoad,
        Pid::CoolantTemp,
        Pid::ShortFuelTrim,
        Pid::LongFuelTrim,
        Pid::IntakeManifoldPressure,
        Pid::Rpm,
        Pid::Speed,
        Pid::Maf,
        Pid::ThrottlePosition,
        Pid::O2Voltage,
    ];

    /// Get the PID hex value
    pub fn as_hex(&self) -> u8 {
        *self as u8
    }

    /// Catalog name
    pub fn name(&self) -> &'static str {
        match self {
            Pid::EngineLoad => "engine-load",
            Pid::CoolantTemp => "coolant-temp",
            Pid::ShortFuelTrim => "short-fuel-trim",
            Pid::LongFuelTrim => "long-fuel-trim",
            Pid::IntakeManifoldPressure => "intake-pressure",
            Pid::Rpm => "rpm",
            Pid::Speed => "speed",
            Pid::Maf => "maf",
            Pid::ThrottlePosition => "throttle",
            Pid::O2Voltage => "o2-voltage",
        }
    }

    /// Get the number of data bytes for this PID
    pub fn response_bytes(&self) -> usize {
        match self {
            Pid::Rpm | Pid::Maf | Pid::O2Voltage => 2,
            _ => 1,
        }
    }

    /// Request frame for this PID
    pub fn frame(&self) -> ElmResult<CommandFrame> {
        CommandFrame::new(Mode::CurrentData, Some(format!("{:02X}", self.as_hex()).as_str()))
    }

    fn convert(&self, bytes: &[u8], imperial: bool) -> (f64, &'static str, usize) {
        let a = bytes[0] as f64;
        match self {
            // A * 100 / 255 (%)
            Pid::EngineLoad | Pid::ThrottlePosition => (a * 100.0 / 255.0, "%", 1),
            // A - 40 (°C)
            Pid::CoolantTemp if imperial => ((a - 40.0) * 9.0 / 5.0 + 32.0, "F", 0),
            Pid::CoolantTemp => (a - 40.0, "C", 0),
            // (A - 128) * 100 / 128 (%)
            Pid::ShortFuelTrim | Pid::LongFuelTrim => ((a - 128.0) * 100.0 / 128.0, "%", 1),
            // A (kPa)
            Pid::IntakeManifoldPressure if imperial => (a * KPA_TO_PSI, "psi", 1),
            Pid::IntakeManifoldPressure => (a, "kPa", 0),
            // ((A*256)+B)/4
            Pid::Rpm => ((a * 256.0 + bytes[1] as f64) / 4.0, "RPM", 0),
            // A (km/h)
            Pid::Speed if imperial => (a * KMH_TO_MPH, "mph", 0),
            Pid::Speed => (a, "km/h", 0),
            // ((A*256)+B) / 100 (g/s)
            Pid::Maf if imperial => ((a * 256.0 + bytes[1] as f64) / 100.0 * GPS_TO_LBMIN, "lb/min", 2),
            Pid::Maf => ((a * 256.0 + bytes[1] as f64) / 100.0, "g/s", 2),
            // A / 200 (V)
            Pid::O2Voltage => (a / 200.0, "V", 3),
        }
    }
}

impl PayloadDecoder for Pid {
    fn decode_payload(&self, payload: &[u8], imperial: bool) -> CommandResult<Reading> {
        let header = [Mode::CurrentData.response_header(), self.as_hex()];
        let data = strip_header(self.name(), payload, &header, self.response_bytes())?;
        let (value, unit, precision) = self.convert(data, imperial);
        Ok(Reading::number(self.name(), value, unit, precision))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CommandError;

    fn decode(pid: Pid, data: &[u8], imperial: bool) -> f64 {
        let mut payload = vec![0x41, pid.as_hex()];
        payload.extend_from_slice(data);
        pid.decode_payload(&payload, imperial)
            .unwrap()
            .as_number()
            .unwrap()
    }

    #[test]
    fn test_rpm_decode() {
        // 1A 2B => ((0x1A * 256) + 0x2B) / 4 = (26*256 + 43) / 4 = 6699/4 = 1674.75
        assert!((decode(Pid::Rpm, &[0x1A, 0x2B], false) - 1674.75).abs() < 0.01);
    }

    #[test]
    fn test_coolant_temp_decode() {
        // 0x73 = 115, so temp = 115 - 40 = 75°C = 167°F
        assert!((decode(Pid::CoolantTemp, &[0x73], false) - 75.0).abs() < 0.01);
        assert!((decode(Pid::CoolantTemp, &[0x73], true) - 167.0).abs() < 0.01);
    }

    #[test]
    fn test_speed_decode() {
        // 0x55 = 85 km/h
        assert!((decode(Pid::Speed, &[0x55], false) - 85.0).abs() < 0.01);
        assert!((decode(Pid::Speed, &[0x64], true) - 62.137).abs() < 0.01);
    }

    #[test]
    fn test_fuel_trim_decode() {
        // 0x80 = 128, so trim = (128-128)*100/128 = 0%
        assert!(decode(Pid::ShortFuelTrim, &[0x80], false).abs() < 0.01);

        // 0x90 = 144, so trim = (144-128)*100/128 = 12.5%
        assert!((decode(Pid::LongFuelTrim, &[0x90], false) - 12.5).abs() < 0.01);
    }

    #[test]
    fn test_maf_and_o2_decode() {
        // 0x01F4 = 500 => 5.00 g/s
        assert!((decode(Pid::Maf, &[0x01, 0xF4], false) - 5.0).abs() < 0.001);
        // 0x5B = 91 => 0.455 V, trailing trim byte ignored
        assert!((decode(Pid::O2Voltage, &[0x5B, 0xFF], false) - 0.455).abs() < 0.001);
    }

    #[test]
    fn test_units_follow_flag() {
        let payload = [0x41, 0x0D, 0x64];
        assert_eq!(Pid::Speed.decode_payload(&payload, false).unwrap().unit, "km/h");
        assert_eq!(Pid::Speed.decode_payload(&payload, true).unwrap().unit, "mph");
    }

    #[test]
    fn test_wrong_pid_echo_rejected() {
        let err = Pid::Rpm.decode_payload(&[0x41, 0x0D, 0x00], false).unwrap_err();
        assert!(matches!(err, CommandError::UnexpectedHeader { .. }));
    }

    #[test]
    fn test_short_payload_rejected() {
        let err = Pid::Rpm.decode_payload(&[0x41, 0x0C, 0x1A], false).unwrap_err();
        assert!(matches!(err, CommandError::ShortPayload { expected: 2, actual: 1, .. }));
    }

    #[test]
    fn test_frames() {
        assert_eq!(Pid::Rpm.frame().unwrap().wire_text(), "01 0C");
        assert_eq!(Pid::O2Voltage.frame().unwrap().wire_text(), "01 14");
    }
}
