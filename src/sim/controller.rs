//! Per-sample charge / discharge decision for each charging strategy.

use crate::tariff::{HourWindow, TariffPeriod};

use super::types::{BatteryMode, ChargingStrategy};

/// What the controller sees for one sample.
#[derive(Debug, Clone, Copy)]
pub struct StepContext {
    pub hour: u32,
    pub period: TariffPeriod,
    /// Solar surplus available at this sample (kW). Zero for grid charging.
    pub solar_surplus_kw: f64,
}

/// Picks the battery mode for a sample.
///
/// Controllers only decide the mode. Energy limits are enforced by
/// [`super::battery::SimulationState`].
pub trait Controller {
    fn mode(&self, ctx: &StepContext) -> BatteryMode;

    fn strategy(&self) -> ChargingStrategy;
}

/// Charges from the grid inside a fixed night window, discharges at peak.
#[derive(Debug, Clone, Copy)]
pub struct GridOffPeakController {
    pub charge_window: HourWindow,
}

impl Controller for GridOffPeakController {
    fn mode(&self, ctx: &StepContext) -> BatteryMode {
        if ctx.period == TariffPeriod::Peak {
            BatteryMode::Discharging
        } else if self.charge_window.contains(ctx.hour) {
            BatteryMode::Charging
        } else {
            BatteryMode::Idle
        }
    }

    fn strategy(&self) -> ChargingStrategy {
        ChargingStrategy::GridOffPeak
    }
}

/// Charges whenever solar surplus is available, discharges at peak.
#[derive(Debug, Default, Clone, Copy)]
pub struct SolarController;

impl Controller for SolarController {
    fn mode(&self, ctx: &StepContext) -> BatteryMode {
        if ctx.period == TariffPeriod::Peak {
            BatteryMode::Discharging
        } else if ctx.solar_surplus_kw > 0.0 {
            BatteryMode::Charging
        } else {
            BatteryMode::Idle
        }
    }

    fn strategy(&self) -> ChargingStrategy {
        ChargingStrategy::Solar
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(hour: u32, period: TariffPeriod, solar: f64) -> StepContext {
        StepContext {
            hour,
            period,
            solar_surplus_kw: solar,
        }
    }

    #[test]
    fn grid_controller_charges_at_night_and_discharges_at_peak() {
        let c = GridOffPeakController {
            charge_window: HourWindow::new(0, 6),
        };
        assert_eq!(c.mode(&ctx(2, TariffPeriod::OffPeak, 0.0)), BatteryMode::Charging);
        assert_eq!(c.mode(&ctx(19, TariffPeriod::Peak, 0.0)), BatteryMode::Discharging);
        assert_eq!(c.mode(&ctx(10, TariffPeriod::OffPeak, 0.0)), BatteryMode::Idle);
        assert_eq!(c.mode(&ctx(21, TariffPeriod::Intermediate, 0.0)), BatteryMode::Idle);
    }

    #[test]
    fn solar_controller_follows_surplus() {
        let c = SolarController;
        assert_eq!(c.mode(&ctx(12, TariffPeriod::OffPeak, 50.0)), BatteryMode::Charging);
        assert_eq!(c.mode(&ctx(2, TariffPeriod::OffPeak, 0.0)), BatteryMode::Idle);
        assert_eq!(c.mode(&ctx(18, TariffPeriod::Peak, 10.0)), BatteryMode::Discharging);
    }
}
