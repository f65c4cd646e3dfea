//! Named channel updates derived from a snapshot.
//!
//! A status reporter receives one `(channel id, state)` pair per decoded field.
use crate::protocol::{ParameterSnapshot, SwitchOffEvent, Temperature, ValueSnapshot};
use chrono::{DateTime, Local};
use std::fmt;

/// The state published for one channel.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelState {
    Decimal(f64),
    Number(i64),
    Switch(bool),
    Text(String),
    DateTime(DateTime<Local>),
}

impl fmt::Display for ChannelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelState::Decimal(value) => write!(f, "{value}"),
            ChannelState::Number(value) => write!(f, "{value}"),
            ChannelState::Switch(true) => f.write_str("ON"),
            ChannelState::Switch(false) => f.write_str("OFF"),
            ChannelState::Text(value) => f.write_str(value),
            ChannelState::DateTime(value) => write!(f, "{}", value.to_rfc3339()),
        }
    }
}

impl From<Temperature> for ChannelState {
    fn from(value: Temperature) -> Self {
        ChannelState::Decimal(*value)
    }
}

impl From<f64> for ChannelState {
    fn from(value: f64) -> Self {
        ChannelState::Decimal(value)
    }
}

impl From<i32> for ChannelState {
    fn from(value: i32) -> Self {
        ChannelState::Number(i64::from(value))
    }
}

impl From<bool> for ChannelState {
    fn from(value: bool) -> Self {
        ChannelState::Switch(value)
    }
}

/// A single named update.
pub type ChannelUpdate = (String, ChannelState);

#[derive(Default)]
struct Updates(Vec<ChannelUpdate>);

impl Updates {
    fn push(&mut self, channel: &str, state: impl Into<ChannelState>) {
        self.0.push((channel.to_string(), state.into()));
    }

    fn text(&mut self, channel: &str, value: i32) {
        self.push(channel, ChannelState::Text(value.to_string()));
    }

    fn history(&mut self, prefix: &str, events: &[SwitchOffEvent]) {
        for (n, event) in events.iter().enumerate() {
            self.push(&format!("{prefix}_{n}"), event.code);
            self.push(
                &format!("{prefix}_timestamp_{n}"),
                ChannelState::DateTime(event.timestamp),
            );
        }
    }
}

impl ValueSnapshot {
    /// Flattens the snapshot into channel updates.
    ///
    /// The extended outputs are only listed when the controller reported them.
    pub fn channel_updates(&self) -> Vec<ChannelUpdate> {
        let mut u = Updates::default();

        let t = &self.temperatures;
        u.push("temperature_supply", t.supply);
        u.push("temperature_return", t.flow_return);
        u.push("temperature_reference_return", t.reference_return);
        u.push("temperature_out_external", t.out_external);
        u.push("temperature_hot_gas", t.hot_gas);
        u.push("temperature_outside", t.outside);
        u.push("temperature_outside_avg", t.outside_average);
        u.push("temperature_servicewater", t.servicewater);
        u.push("temperature_servicewater_reference", t.servicewater_reference);
        u.push("temperature_probe_in", t.probe_in);
        u.push("temperature_probe_out", t.probe_out);
        u.push("temperature_mk1", t.mk1);
        u.push("temperature_mk1_reference", t.mk1_reference);
        u.push("temperature_mk2", t.mk2);
        u.push("temperature_mk2_reference", t.mk2_reference);
        u.push("temperature_solar_collector", t.solar_collector);
        u.push("temperature_solar_storage", t.solar_storage);
        u.push("temperature_external_source", t.external_source);

        let times = &self.operating_times;
        u.push("time_compressor1", times.compressor1);
        u.push("starts_compressor1", times.compressor1_starts);
        u.push("time_compressor2", times.compressor2);
        u.push("starts_compressor2", times.compressor2_starts);
        u.push("time_zwe1", times.zwe1);
        u.push("time_zwe2", times.zwe2);
        u.push("time_zwe3", times.zwe3);
        u.push("time_heatpump", times.heatpump);
        u.push("time_heating", times.heating);
        u.push("time_warmwater", times.warmwater);
        u.push("time_cooling", times.cooling);

        let energy = &self.thermal_energy;
        u.push("thermalenergy_heating", energy.heating);
        u.push("thermalenergy_warmwater", energy.warmwater);
        u.push("thermalenergy_pool", energy.pool);
        u.push("thermalenergy_total", energy.total);
        u.push("massflow", self.mass_flow);

        u.text("heatpump_state", self.heatpump_state);
        u.push("heatpump_state_time", self.heatpump_state_time);
        u.text("heatpump_extended_state", self.heatpump_extended_state);

        u.history("heatpump_switchoff_error", &self.switchoff_errors);
        u.push("heatpump_switchoff_error_count", self.switchoff_error_count);
        u.history("heatpump_switchoff_reason", &self.switchoff_reasons);

        let o = &self.outputs;
        for (channel, state) in [
            ("output_av", o.av),
            ("output_bup", o.bup),
            ("output_hup", o.hup),
            ("output_ma1", o.ma1),
            ("output_mz1", o.mz1),
            ("output_ven", o.ven),
            ("output_vbo", o.vbo),
            ("output_vd1", o.vd1),
            ("output_vd2", o.vd2),
            ("output_zip", o.zip),
            ("output_zup", o.zup),
            ("output_zw1", o.zw1),
            ("output_zw2sst", o.zw2sst),
            ("output_zw3sst", o.zw3sst),
            ("output_fp2", o.fp2),
            ("output_slp", o.slp),
            ("output_sup", o.sup),
            ("output_mz2", o.mz2),
            ("output_ma2", o.ma2),
            ("output_mz3", o.mz3),
            ("output_ma3", o.ma3),
            ("output_fp3", o.fp3),
            ("output_vsk", o.vsk),
            ("output_frh", o.frh),
        ] {
            u.push(channel, state);
        }

        if let Some(x) = &self.extended_outputs {
            u.push("output_av2", x.av2);
            u.push("output_vbo2", x.vbo2);
            u.push("output_vd12", x.vd12);
            u.push("output_vdh2", x.vdh2);
        }

        u.0
    }
}

impl ParameterSnapshot {
    /// Flattens the snapshot into channel updates named like the command channels.
    pub fn channel_updates(&self) -> Vec<ChannelUpdate> {
        let mut u = Updates::default();
        u.push("heating_temperature", self.heating_temperature);
        u.text("heating_operation_mode", self.heating_operation_mode);
        u.push("warmwater_temperature", self.warmwater_temperature);
        u.text("warmwater_operation_mode", self.warmwater_operation_mode);
        u.text("cooling_operation_mode", self.cooling_operation_mode);
        u.push("cooling_release_temperature", self.cooling_release_temperature);
        u.push("cooling_inlet_temperature", self.cooling_inlet_temperature);
        u.push("cooling_start_after_hours", self.cooling_start_after_hours);
        u.push("cooling_stop_after_hours", self.cooling_stop_after_hours);
        u.0
    }
}
