use super::types::BessSpec;

/// Mutable state of one simulation run: SOC plus the day cursor.
///
/// SOC is kept in percent and always stays inside the spec's
/// `[min_soc_percent, max_soc_percent]` window. Energy limits are enforced
/// here; mode selection lives in the controller.
#[derive(Debug, Clone)]
pub struct SimulationState {
    spec: BessSpec,
    /// State of charge (%).
    pub state_of_charge_percent: f64,
    /// Index of the day currently being simulated.
    pub day_index: usize,
}

impl SimulationState {
    /// Starts a run at `initial_soc_percent`, clamped into the SOC window.
    pub fn new(spec: BessSpec, initial_soc_percent: f64) -> Self {
        Self {
            spec,
            state_of_charge_percent: initial_soc_percent
                .clamp(spec.min_soc_percent, spec.max_soc_percent),
            day_index: 0,
        }
    }

    pub fn spec(&self) -> &BessSpec {
        &self.spec
    }

    /// Stored energy above the minimum SOC (kWh).
    pub fn dischargeable_kwh(&self) -> f64 {
        ((self.state_of_charge_percent - self.spec.min_soc_percent) * self.spec.capacity_kwh
            / 100.0)
            .max(0.0)
    }

    /// Energy that can still be drawn in before reaching the maximum SOC,
    /// measured before efficiency losses (kWh).
    pub fn chargeable_kwh(&self) -> f64 {
        ((self.spec.max_soc_percent - self.state_of_charge_percent) * self.spec.capacity_kwh
            / 100.0
            / self.spec.round_trip_efficiency)
            .max(0.0)
    }

    /// Draws up to `available_kwh` into the battery.
    ///
    /// Returns the energy drawn from the source (kWh), before losses.
    pub fn charge(&mut self, available_kwh: f64) -> f64 {
        let energy_in = available_kwh.max(0.0).min(self.chargeable_kwh());
        self.state_of_charge_percent +=
            energy_in * self.spec.round_trip_efficiency / self.spec.capacity_kwh * 100.0;
        self.clamp_soc();
        energy_in
    }

    /// Releases up to `requested_kwh` from the battery.
    ///
    /// Returns the energy delivered to the load (kWh).
    pub fn discharge(&mut self, requested_kwh: f64) -> f64 {
        let energy_out = requested_kwh.max(0.0).min(self.dischargeable_kwh());
        self.state_of_charge_percent -= energy_out / self.spec.capacity_kwh * 100.0;
        self.clamp_soc();
        energy_out
    }

    fn clamp_soc(&mut self) {
        self.state_of_charge_percent = self
            .state_of_charge_percent
            .clamp(self.spec.min_soc_percent, self.spec.max_soc_percent);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ideal(capacity_kwh: f64) -> BessSpec {
        BessSpec {
            round_trip_efficiency: 1.0,
            ..BessSpec::new(capacity_kwh / 4.0, capacity_kwh)
        }
    }

    #[test]
    fn initial_soc_is_clamped_into_window() {
        let s = SimulationState::new(BessSpec::new(10.0, 40.0), 99.0);
        assert_eq!(s.state_of_charge_percent, 90.0);
        let s = SimulationState::new(BessSpec::new(10.0, 40.0), 0.0);
        assert_eq!(s.state_of_charge_percent, 10.0);
    }

    #[test]
    fn discharge_stops_at_min_soc() {
        // 100 kWh at 50 %, min 10 % -> 40 kWh available
        let mut s = SimulationState::new(ideal(100.0), 50.0);
        assert!((s.discharge(60.0) - 40.0).abs() < 1e-9);
        assert!((s.state_of_charge_percent - 10.0).abs() < 1e-9);
        assert_eq!(s.discharge(5.0), 0.0);
    }

    #[test]
    fn charge_stops_at_max_soc() {
        let mut s = SimulationState::new(ideal(100.0), 50.0);
        assert!((s.charge(100.0) - 40.0).abs() < 1e-9);
        assert!((s.state_of_charge_percent - 90.0).abs() < 1e-9);
        assert_eq!(s.charge(1.0), 0.0);
    }

    #[test]
    fn charging_losses_reduce_stored_energy() {
        // 10 kWh drawn at 90 % efficiency stores 9 kWh = 9 % of 100 kWh
        let mut s = SimulationState::new(BessSpec::new(25.0, 100.0), 50.0);
        let drawn = s.charge(10.0);
        assert!((drawn - 10.0).abs() < 1e-9);
        assert!((s.state_of_charge_percent - 59.0).abs() < 1e-9);
    }

    #[test]
    fn full_charge_accounts_for_efficiency() {
        // From 50 % to 90 % stores 40 kWh, which needs 40 / 0.9 kWh drawn
        let mut s = SimulationState::new(BessSpec::new(25.0, 100.0), 50.0);
        let drawn = s.charge(1000.0);
        assert!((drawn - 40.0 / 0.9).abs() < 1e-9);
        assert!((s.state_of_charge_percent - 90.0).abs() < 1e-9);
    }

    #[test]
    fn negative_requests_are_ignored() {
        let mut s = SimulationState::new(ideal(100.0), 50.0);
        assert_eq!(s.charge(-5.0), 0.0);
        assert_eq!(s.discharge(-5.0), 0.0);
        assert_eq!(s.state_of_charge_percent, 50.0);
    }
}
