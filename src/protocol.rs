//! Register layout of the Luxtronik heat pump controller and the decoding of
//! the raw value and parameter arrays into typed snapshots.
//!
//! The controller answers with two flat arrays of signed 32-bit integers. Every
//! quantity sits at a fixed position, temperatures are transmitted in tenths of
//! a degree Celsius and timestamps as seconds since the Unix epoch.
use crate::{Error, Result};
use chrono::{DateTime, Local, Utc};
use std::fmt;

/// Position of a register in the value array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ValueIndex(usize);

impl ValueIndex {
    pub const TEMPERATURE_SUPPLY: Self = Self(10);
    pub const TEMPERATURE_RETURN: Self = Self(11);
    pub const TEMPERATURE_REFERENCE_RETURN: Self = Self(12);
    pub const TEMPERATURE_OUT_EXTERNAL: Self = Self(13);
    pub const TEMPERATURE_HOT_GAS: Self = Self(14);
    pub const TEMPERATURE_OUTSIDE: Self = Self(15);
    pub const TEMPERATURE_OUTSIDE_AVG: Self = Self(16);
    pub const TEMPERATURE_SERVICEWATER: Self = Self(17);
    pub const TEMPERATURE_SERVICEWATER_REFERENCE: Self = Self(18);
    pub const TEMPERATURE_PROBE_IN: Self = Self(19);
    pub const TEMPERATURE_PROBE_OUT: Self = Self(20);
    pub const TEMPERATURE_MK1: Self = Self(21);
    pub const TEMPERATURE_MK1_REFERENCE: Self = Self(22);
    pub const TEMPERATURE_MK2: Self = Self(24);
    pub const TEMPERATURE_MK2_REFERENCE: Self = Self(25);
    pub const TEMPERATURE_SOLAR_COLLECTOR: Self = Self(26);
    pub const TEMPERATURE_SOLAR_STORAGE: Self = Self(27);
    pub const TEMPERATURE_EXTERNAL_SOURCE: Self = Self(28);

    /// First of the 19 consecutive output flags AV .. MA2.
    pub const OUTPUT_AV: Self = Self(37);
    pub const OUTPUT_MZ3: Self = Self(138);
    pub const OUTPUT_MA3: Self = Self(139);
    pub const OUTPUT_FP3: Self = Self(140);
    pub const OUTPUT_VSK: Self = Self(166);
    pub const OUTPUT_FRH: Self = Self(167);

    pub const TIME_COMPRESSOR1: Self = Self(56);
    pub const STARTS_COMPRESSOR1: Self = Self(57);
    pub const TIME_COMPRESSOR2: Self = Self(58);
    pub const STARTS_COMPRESSOR2: Self = Self(59);
    pub const TIME_ZWE1: Self = Self(60);
    pub const TIME_ZWE2: Self = Self(61);
    pub const TIME_ZWE3: Self = Self(62);
    pub const TIME_HEATPUMP: Self = Self(63);
    pub const TIME_HEATING: Self = Self(64);
    pub const TIME_WARMWATER: Self = Self(65);
    pub const TIME_COOLING: Self = Self(66);

    /// Newest of the five switch-off error timestamps.
    pub const SWITCHOFF_ERROR_TIMESTAMP: Self = Self(95);
    /// Newest of the five switch-off error codes.
    pub const SWITCHOFF_ERROR_CODE: Self = Self(100);
    pub const SWITCHOFF_ERROR_COUNT: Self = Self(105);
    /// Newest of the five switch-off reasons.
    pub const SWITCHOFF_REASON_CODE: Self = Self(106);
    /// Newest of the five switch-off reason timestamps.
    pub const SWITCHOFF_REASON_TIMESTAMP: Self = Self(111);

    pub const HEATPUMP_STATE: Self = Self(117);
    pub const HEATPUMP_EXTENDED_STATE: Self = Self(119);
    pub const HEATPUMP_STATE_TIME: Self = Self(120);

    pub const THERMALENERGY_HEATING: Self = Self(151);
    pub const THERMALENERGY_WARMWATER: Self = Self(152);
    pub const THERMALENERGY_POOL: Self = Self(153);
    pub const THERMALENERGY_TOTAL: Self = Self(154);
    pub const MASSFLOW: Self = Self(155);

    pub const OUTPUT_AV2: Self = Self(213);
    pub const OUTPUT_VBO2: Self = Self(214);
    pub const OUTPUT_VD12: Self = Self(215);
    pub const OUTPUT_VDH2: Self = Self(216);

    const fn offset(self, n: usize) -> Self {
        Self(self.0 + n)
    }
}

impl From<ValueIndex> for usize {
    fn from(index: ValueIndex) -> usize {
        index.0
    }
}

/// Position of a register in the parameter array.
///
/// Parameters are the only registers that can be written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParameterIndex(usize);

impl ParameterIndex {
    pub const HEATING_TEMPERATURE: Self = Self(1);
    pub const WARMWATER_TEMPERATURE: Self = Self(2);
    pub const HEATING_OPERATION_MODE: Self = Self(3);
    pub const WARMWATER_OPERATION_MODE: Self = Self(4);
    pub const COOLING_OPERATION_MODE: Self = Self(108);
    pub const COOLING_RELEASE_TEMPERATURE: Self = Self(110);
    /// Target temperature of mixing circuit 1 while cooling.
    pub const COOLING_INLET_TEMPERATURE: Self = Self(132);
    pub const COOLING_START_AFTER_HOURS: Self = Self(850);
    pub const COOLING_STOP_AFTER_HOURS: Self = Self(851);

    /// The index as transmitted in a write request.
    pub fn encode(self) -> i32 {
        // All indices are small compile-time constants.
        self.0 as i32
    }
}

impl From<ParameterIndex> for usize {
    fn from(index: ParameterIndex) -> usize {
        index.0
    }
}

impl fmt::Display for ParameterIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Number of registers a value array must hold to decode every mandatory field.
pub const MIN_VALUES_LEN: usize = ValueIndex::OUTPUT_FRH.0 + 1;
/// Value arrays longer than this carry the extended outputs of newer firmware.
pub const EXTENDED_THRESHOLD: usize = ValueIndex::OUTPUT_VDH2.0;
/// Number of registers a parameter array must hold.
pub const MIN_PARAMETERS_LEN: usize = ParameterIndex::COOLING_STOP_AFTER_HOURS.0 + 1;

/// Raw thermal energy counters at or above this value are off by exactly this
/// amount, a sign bug of the controller firmware.
pub const THERMAL_ENERGY_OVERFLOW: i32 = 214_748_364;

/// Number of entries in the switch-off error and reason histories.
pub const SWITCHOFF_HISTORY_LEN: usize = 5;

/// A temperature in degrees Celsius (°C).
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct Temperature(f64);

impl Temperature {
    /// Decodes a register holding tenths of a degree.
    pub fn decode(raw: i32) -> Self {
        Self(decode_tenths(raw))
    }

    pub fn as_degree_celsius(&self) -> f64 {
        self.0
    }
}

impl std::ops::Deref for Temperature {
    type Target = f64;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<f64> for Temperature {
    fn from(value: f64) -> Self {
        Self(value)
    }
}

impl fmt::Display for Temperature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}", self.0)
    }
}

/// Converts a register holding tenths into its decimal value.
pub fn decode_tenths(raw: i32) -> f64 {
    f64::from(raw) / 10.0
}

/// Applies the firmware correction of the four thermal energy counters.
pub fn correct_thermal_energy(raw: i32) -> i32 {
    if raw >= THERMAL_ENERGY_OVERFLOW {
        raw - THERMAL_ENERGY_OVERFLOW
    } else {
        raw
    }
}

/// Converts a timestamp register to the local time zone.
pub fn decode_timestamp(raw: i32) -> DateTime<Local> {
    DateTime::<Utc>::from_timestamp(i64::from(raw), 0)
        .unwrap_or_default()
        .with_timezone(&Local)
}

fn check_len(array: &'static str, registers: &[i32], expected: usize) -> Result<()> {
    if registers.len() < expected {
        Err(Error::MalformedPayload {
            array,
            expected,
            actual: registers.len(),
        })
    } else {
        Ok(())
    }
}

/// Measured temperatures in °C.
#[derive(Debug, Clone, PartialEq)]
pub struct Temperatures {
    pub supply: Temperature,
    pub flow_return: Temperature,
    pub reference_return: Temperature,
    pub out_external: Temperature,
    pub hot_gas: Temperature,
    pub outside: Temperature,
    pub outside_average: Temperature,
    pub servicewater: Temperature,
    pub servicewater_reference: Temperature,
    pub probe_in: Temperature,
    pub probe_out: Temperature,
    pub mk1: Temperature,
    pub mk1_reference: Temperature,
    pub mk2: Temperature,
    pub mk2_reference: Temperature,
    pub solar_collector: Temperature,
    pub solar_storage: Temperature,
    pub external_source: Temperature,
}

/// Operating time counters and compressor starts, raw device units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperatingTimes {
    pub compressor1: i32,
    pub compressor1_starts: i32,
    pub compressor2: i32,
    pub compressor2_starts: i32,
    pub zwe1: i32,
    pub zwe2: i32,
    pub zwe3: i32,
    pub heatpump: i32,
    pub heating: i32,
    pub warmwater: i32,
    pub cooling: i32,
}

/// Produced thermal energy in kWh, firmware correction applied.
#[derive(Debug, Clone, PartialEq)]
pub struct ThermalEnergy {
    pub heating: f64,
    pub warmwater: f64,
    pub pool: f64,
    pub total: f64,
}

/// State of the switching outputs of the controller.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Outputs {
    /// Defrost valve.
    pub av: bool,
    /// Service water pump.
    pub bup: bool,
    /// Heating circulation pump.
    pub hup: bool,
    /// Mixer 1 open.
    pub ma1: bool,
    /// Mixer 1 closed.
    pub mz1: bool,
    /// Ventilation.
    pub ven: bool,
    /// Brine pump.
    pub vbo: bool,
    /// Compressor 1.
    pub vd1: bool,
    /// Compressor 2.
    pub vd2: bool,
    /// Circulation pump.
    pub zip: bool,
    /// Auxiliary circulation pump.
    pub zup: bool,
    /// Control signal additional heating.
    pub zw1: bool,
    /// Control signal additional heating, failure signal.
    pub zw2sst: bool,
    pub zw3sst: bool,
    /// Pump flow circuit 2.
    pub fp2: bool,
    /// Solar charge pump.
    pub slp: bool,
    /// Swimming pool pump.
    pub sup: bool,
    pub mz2: bool,
    pub ma2: bool,
    pub mz3: bool,
    pub ma3: bool,
    pub fp3: bool,
    pub vsk: bool,
    pub frh: bool,
}

/// Outputs only reported by controllers with a second compressor circuit.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExtendedOutputs {
    pub av2: bool,
    pub vbo2: bool,
    pub vd12: bool,
    pub vdh2: bool,
}

/// One entry of a switch-off history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchOffEvent {
    pub code: i32,
    pub timestamp: DateTime<Local>,
}

/// Decoded view of one value array.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueSnapshot {
    pub temperatures: Temperatures,
    pub operating_times: OperatingTimes,
    pub thermal_energy: ThermalEnergy,
    pub mass_flow: i32,
    pub outputs: Outputs,
    /// `None` if the controller does not report the extended outputs.
    pub extended_outputs: Option<ExtendedOutputs>,
    pub heatpump_state: i32,
    pub heatpump_extended_state: i32,
    pub heatpump_state_time: i32,
    /// Newest first.
    pub switchoff_errors: [SwitchOffEvent; SWITCHOFF_HISTORY_LEN],
    pub switchoff_error_count: i32,
    /// Newest first.
    pub switchoff_reasons: [SwitchOffEvent; SWITCHOFF_HISTORY_LEN],
}

impl ValueSnapshot {
    /// Decodes a value array.
    ///
    /// # Errors
    ///
    /// [`Error::MalformedPayload`] if `values` is shorter than [`MIN_VALUES_LEN`].
    pub fn decode_from_registers(values: &[i32]) -> Result<Self> {
        check_len("value", values, MIN_VALUES_LEN)?;
        let reg = |index: ValueIndex| values[index.0];
        let temperature = |index: ValueIndex| Temperature::decode(reg(index));
        let flag = |index: ValueIndex| reg(index) != 0;
        let energy = |index: ValueIndex| decode_tenths(correct_thermal_energy(reg(index)));
        let history = |codes: ValueIndex,
                       timestamps: ValueIndex|
         -> [SwitchOffEvent; SWITCHOFF_HISTORY_LEN] {
            std::array::from_fn(|n| SwitchOffEvent {
                code: reg(codes.offset(n)),
                timestamp: decode_timestamp(reg(timestamps.offset(n))),
            })
        };
        let output = |n: usize| flag(ValueIndex::OUTPUT_AV.offset(n));

        let extended_outputs = (values.len() > EXTENDED_THRESHOLD).then(|| ExtendedOutputs {
            av2: flag(ValueIndex::OUTPUT_AV2),
            vbo2: flag(ValueIndex::OUTPUT_VBO2),
            vd12: flag(ValueIndex::OUTPUT_VD12),
            vdh2: flag(ValueIndex::OUTPUT_VDH2),
        });

        Ok(Self {
            temperatures: Temperatures {
                supply: temperature(ValueIndex::TEMPERATURE_SUPPLY),
                flow_return: temperature(ValueIndex::TEMPERATURE_RETURN),
                reference_return: temperature(ValueIndex::TEMPERATURE_REFERENCE_RETURN),
                out_external: temperature(ValueIndex::TEMPERATURE_OUT_EXTERNAL),
                hot_gas: temperature(ValueIndex::TEMPERATURE_HOT_GAS),
                outside: temperature(ValueIndex::TEMPERATURE_OUTSIDE),
                outside_average: temperature(ValueIndex::TEMPERATURE_OUTSIDE_AVG),
                servicewater: temperature(ValueIndex::TEMPERATURE_SERVICEWATER),
                servicewater_reference: temperature(ValueIndex::TEMPERATURE_SERVICEWATER_REFERENCE),
                probe_in: temperature(ValueIndex::TEMPERATURE_PROBE_IN),
                probe_out: temperature(ValueIndex::TEMPERATURE_PROBE_OUT),
                mk1: temperature(ValueIndex::TEMPERATURE_MK1),
                mk1_reference: temperature(ValueIndex::TEMPERATURE_MK1_REFERENCE),
                mk2: temperature(ValueIndex::TEMPERATURE_MK2),
                mk2_reference: temperature(ValueIndex::TEMPERATURE_MK2_REFERENCE),
                solar_collector: temperature(ValueIndex::TEMPERATURE_SOLAR_COLLECTOR),
                solar_storage: temperature(ValueIndex::TEMPERATURE_SOLAR_STORAGE),
                external_source: temperature(ValueIndex::TEMPERATURE_EXTERNAL_SOURCE),
            },
            operating_times: OperatingTimes {
                compressor1: reg(ValueIndex::TIME_COMPRESSOR1),
                compressor1_starts: reg(ValueIndex::STARTS_COMPRESSOR1),
                compressor2: reg(ValueIndex::TIME_COMPRESSOR2),
                compressor2_starts: reg(ValueIndex::STARTS_COMPRESSOR2),
                zwe1: reg(ValueIndex::TIME_ZWE1),
                zwe2: reg(ValueIndex::TIME_ZWE2),
                zwe3: reg(ValueIndex::TIME_ZWE3),
                heatpump: reg(ValueIndex::TIME_HEATPUMP),
                heating: reg(ValueIndex::TIME_HEATING),
                warmwater: reg(ValueIndex::TIME_WARMWATER),
                cooling: reg(ValueIndex::TIME_COOLING),
            },
            thermal_energy: ThermalEnergy {
                heating: energy(ValueIndex::THERMALENERGY_HEATING),
                warmwater: energy(ValueIndex::THERMALENERGY_WARMWATER),
                pool: energy(ValueIndex::THERMALENERGY_POOL),
                total: energy(ValueIndex::THERMALENERGY_TOTAL),
            },
            mass_flow: reg(ValueIndex::MASSFLOW),
            outputs: Outputs {
                av: output(0),
                bup: output(1),
                hup: output(2),
                ma1: output(3),
                mz1: output(4),
                ven: output(5),
                vbo: output(6),
                vd1: output(7),
                vd2: output(8),
                zip: output(9),
                zup: output(10),
                zw1: output(11),
                zw2sst: output(12),
                zw3sst: output(13),
                fp2: output(14),
                slp: output(15),
                sup: output(16),
                mz2: output(17),
                ma2: output(18),
                mz3: flag(ValueIndex::OUTPUT_MZ3),
                ma3: flag(ValueIndex::OUTPUT_MA3),
                fp3: flag(ValueIndex::OUTPUT_FP3),
                vsk: flag(ValueIndex::OUTPUT_VSK),
                frh: flag(ValueIndex::OUTPUT_FRH),
            },
            extended_outputs,
            heatpump_state: reg(ValueIndex::HEATPUMP_STATE),
            heatpump_extended_state: reg(ValueIndex::HEATPUMP_EXTENDED_STATE),
            heatpump_state_time: reg(ValueIndex::HEATPUMP_STATE_TIME),
            switchoff_errors: history(
                ValueIndex::SWITCHOFF_ERROR_CODE,
                ValueIndex::SWITCHOFF_ERROR_TIMESTAMP,
            ),
            switchoff_error_count: reg(ValueIndex::SWITCHOFF_ERROR_COUNT),
            switchoff_reasons: history(
                ValueIndex::SWITCHOFF_REASON_CODE,
                ValueIndex::SWITCHOFF_REASON_TIMESTAMP,
            ),
        })
    }
}

/// Decoded view of one parameter array.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSnapshot {
    pub heating_temperature: Temperature,
    pub warmwater_temperature: Temperature,
    /// 0 automatic, 1 second heat source, 2 party, 3 holidays, 4 off.
    pub heating_operation_mode: i32,
    /// Same encoding as `heating_operation_mode`.
    pub warmwater_operation_mode: i32,
    /// 0 off, 1 automatic.
    pub cooling_operation_mode: i32,
    pub cooling_release_temperature: Temperature,
    pub cooling_inlet_temperature: Temperature,
    /// Hours.
    pub cooling_start_after_hours: f64,
    /// Hours.
    pub cooling_stop_after_hours: f64,
}

impl ParameterSnapshot {
    /// Decodes a parameter array.
    ///
    /// # Errors
    ///
    /// [`Error::MalformedPayload`] if `parameters` is shorter than [`MIN_PARAMETERS_LEN`].
    pub fn decode_from_registers(parameters: &[i32]) -> Result<Self> {
        check_len("parameter", parameters, MIN_PARAMETERS_LEN)?;
        let reg = |index: ParameterIndex| parameters[index.0];
        Ok(Self {
            heating_temperature: Temperature::decode(reg(ParameterIndex::HEATING_TEMPERATURE)),
            warmwater_temperature: Temperature::decode(reg(ParameterIndex::WARMWATER_TEMPERATURE)),
            heating_operation_mode: reg(ParameterIndex::HEATING_OPERATION_MODE),
            warmwater_operation_mode: reg(ParameterIndex::WARMWATER_OPERATION_MODE),
            cooling_operation_mode: reg(ParameterIndex::COOLING_OPERATION_MODE),
            cooling_release_temperature: Temperature::decode(reg(
                ParameterIndex::COOLING_RELEASE_TEMPERATURE,
            )),
            cooling_inlet_temperature: Temperature::decode(reg(
                ParameterIndex::COOLING_INLET_TEMPERATURE,
            )),
            cooling_start_after_hours: decode_tenths(reg(ParameterIndex::COOLING_START_AFTER_HOURS)),
            cooling_stop_after_hours: decode_tenths(reg(ParameterIndex::COOLING_STOP_AFTER_HOURS)),
        })
    }
}

/// Decodes both arrays of one refresh cycle.
pub fn decode(values: &[i32], parameters: &[i32]) -> Result<(ValueSnapshot, ParameterSnapshot)> {
    Ok((
        ValueSnapshot::decode_from_registers(values)?,
        ParameterSnapshot::decode_from_registers(parameters)?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn values(len: usize) -> Vec<i32> {
        vec![0; len]
    }

    #[test]
    fn decode_tenths_is_float_division() {
        assert_eq!(decode_tenths(215), 21.5);
        assert_eq!(decode_tenths(-3), -0.3);
        assert_eq!(decode_tenths(7), 0.7);
        assert_eq!(*Temperature::decode(-112), -11.2);
    }

    #[test]
    fn thermal_energy_correction() {
        assert_eq!(correct_thermal_energy(0), 0);
        assert_eq!(correct_thermal_energy(214_748_363), 214_748_363);
        assert_eq!(correct_thermal_energy(214_748_364), 0);
        assert_eq!(correct_thermal_energy(214_748_400), 36);
        assert_eq!(correct_thermal_energy(i32::MAX), i32::MAX - 214_748_364);
    }

    #[test]
    fn thermal_energy_correction_only_applies_to_energy_counters() {
        let mut raw = values(MIN_VALUES_LEN);
        for index in 151..=154 {
            raw[index] = 214_748_400;
        }
        raw[usize::from(ValueIndex::MASSFLOW)] = 214_748_400;
        raw[usize::from(ValueIndex::TIME_HEATPUMP)] = 214_748_400;

        let snapshot = ValueSnapshot::decode_from_registers(&raw).unwrap();
        assert_eq!(snapshot.thermal_energy.heating, 3.6);
        assert_eq!(snapshot.thermal_energy.warmwater, 3.6);
        assert_eq!(snapshot.thermal_energy.pool, 3.6);
        assert_eq!(snapshot.thermal_energy.total, 3.6);
        assert_eq!(snapshot.mass_flow, 214_748_400);
        assert_eq!(snapshot.operating_times.heatpump, 214_748_400);
    }

    #[test]
    fn decode_value_fields() {
        let mut raw = values(MIN_VALUES_LEN);
        raw[10] = 215;
        raw[15] = -42;
        raw[28] = 101;
        raw[37] = 1;
        raw[55] = -1;
        raw[57] = 1234;
        raw[66] = 99;
        raw[95] = 0;
        raw[100] = 715;
        raw[104] = 3;
        raw[105] = 7;
        raw[110] = 9;
        raw[115] = 86_400;
        raw[117] = 2;
        raw[119] = 5;
        raw[120] = 360;
        raw[151] = 123;
        raw[155] = 1500;
        raw[167] = 1;

        let snapshot = ValueSnapshot::decode_from_registers(&raw).unwrap();
        assert_eq!(*snapshot.temperatures.supply, 21.5);
        assert_eq!(*snapshot.temperatures.outside, -4.2);
        assert_eq!(*snapshot.temperatures.external_source, 10.1);
        assert!(snapshot.outputs.av);
        assert!(!snapshot.outputs.bup);
        assert!(snapshot.outputs.ma2);
        assert!(snapshot.outputs.frh);
        assert_eq!(snapshot.operating_times.compressor1_starts, 1234);
        assert_eq!(snapshot.operating_times.cooling, 99);
        assert_eq!(snapshot.switchoff_errors[0].code, 715);
        assert_eq!(snapshot.switchoff_errors[4].code, 3);
        assert_eq!(
            snapshot.switchoff_errors[0].timestamp,
            DateTime::<Utc>::from_timestamp(0, 0).unwrap()
        );
        assert_eq!(snapshot.switchoff_error_count, 7);
        assert_eq!(snapshot.switchoff_reasons[4].code, 9);
        assert_eq!(
            snapshot.switchoff_reasons[4].timestamp,
            DateTime::<Utc>::from_timestamp(86_400, 0).unwrap()
        );
        assert_eq!(snapshot.heatpump_state, 2);
        assert_eq!(snapshot.heatpump_extended_state, 5);
        assert_eq!(snapshot.heatpump_state_time, 360);
        assert_eq!(snapshot.thermal_energy.heating, 12.3);
        assert_eq!(snapshot.mass_flow, 1500);
    }

    #[test]
    fn timestamps_are_local() {
        let timestamp = decode_timestamp(1_600_000_000);
        assert_eq!(timestamp.timestamp(), 1_600_000_000);
        assert_eq!(
            timestamp.with_timezone(&Utc).to_rfc3339(),
            "2020-09-13T12:26:40+00:00"
        );
    }

    #[test]
    fn extended_outputs_present_only_above_threshold() {
        let snapshot = ValueSnapshot::decode_from_registers(&values(MIN_VALUES_LEN)).unwrap();
        assert_eq!(snapshot.extended_outputs, None);

        let snapshot = ValueSnapshot::decode_from_registers(&values(EXTENDED_THRESHOLD)).unwrap();
        assert_eq!(snapshot.extended_outputs, None);

        let mut raw = values(EXTENDED_THRESHOLD + 1);
        raw[214] = 1;
        let snapshot = ValueSnapshot::decode_from_registers(&raw).unwrap();
        assert_eq!(
            snapshot.extended_outputs,
            Some(ExtendedOutputs {
                vbo2: true,
                ..Default::default()
            })
        );
    }

    #[test]
    fn short_arrays_are_malformed() {
        assert_matches!(
            ValueSnapshot::decode_from_registers(&values(MIN_VALUES_LEN - 1)),
            Err(Error::MalformedPayload {
                array: "value",
                expected: MIN_VALUES_LEN,
                actual: 167,
            })
        );
        assert_matches!(
            ParameterSnapshot::decode_from_registers(&[]),
            Err(Error::MalformedPayload {
                array: "parameter",
                ..
            })
        );
        assert_matches!(
            decode(&values(MIN_VALUES_LEN), &values(MIN_PARAMETERS_LEN - 1)),
            Err(Error::MalformedPayload { .. })
        );
    }

    #[test]
    fn decode_parameter_fields() {
        let mut raw = values(MIN_PARAMETERS_LEN);
        raw[1] = -15;
        raw[2] = 480;
        raw[3] = 4;
        raw[4] = 2;
        raw[108] = 1;
        raw[110] = 120;
        raw[132] = 185;
        raw[850] = 25;
        raw[851] = 5;

        let snapshot = ParameterSnapshot::decode_from_registers(&raw).unwrap();
        assert_eq!(*snapshot.heating_temperature, -1.5);
        assert_eq!(*snapshot.warmwater_temperature, 48.0);
        assert_eq!(snapshot.heating_operation_mode, 4);
        assert_eq!(snapshot.warmwater_operation_mode, 2);
        assert_eq!(snapshot.cooling_operation_mode, 1);
        assert_eq!(*snapshot.cooling_release_temperature, 12.0);
        assert_eq!(*snapshot.cooling_inlet_temperature, 18.5);
        assert_eq!(snapshot.cooling_start_after_hours, 2.5);
        assert_eq!(snapshot.cooling_stop_after_hours, 0.5);
    }
}
