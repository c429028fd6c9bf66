//! Generic backward-induction optimiser over discretised storage states.
//!
//! The storage energy axis is split into equally wide states; between
//! adjacent hours the state may move by a bounded number of steps. Backward
//! induction fills a value table from the horizon end to the present, then a
//! forward walk turns the best-transition table into a dispatch plan. The
//! objective is supplied by an [`AssessmentFunction`], so all strategist
//! variants share this single optimiser.

use devices::Device;
use types::{TimePeriod, OPERATION_PERIOD_IN_HOURS};

use crate::error::{AgentError, Result};
use crate::strategist::assessment::AssessmentFunction;

/// Output of the forward walk: one entry per planned period.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchPlan {
    /// Scheduled external energy exchange per period (positive charges).
    pub external_energy_deltas_in_mwh: Vec<f64>,
    /// Internal energy at the start of each period along the planned path.
    pub initial_internal_energies_in_mwh: Vec<f64>,
    /// Absolute transition value per MWh of each planned exchange; NaN for
    /// idle periods. Used for opportunity-cost bidding.
    pub specific_values_in_eur_per_mwh: Vec<f64>,
}

/// Backward-induction optimiser with a fixed discretisation.
#[derive(Debug, Clone)]
pub struct Optimiser {
    number_of_energy_states: usize,
    number_of_transition_states: usize,
    forecast_steps: usize,
    schedule_steps: usize,
}

impl Optimiser {
    pub fn new(
        number_of_energy_states: usize,
        number_of_transition_states: usize,
        forecast_steps: usize,
        schedule_steps: usize,
    ) -> Result<Self> {
        if number_of_energy_states < 2 {
            return Err(AgentError::InvalidConfig(format!(
                "NumberOfEnergyStates must be at least 2, got {}",
                number_of_energy_states
            )));
        }
        if number_of_transition_states < 1 {
            return Err(AgentError::InvalidConfig(
                "NumberOfTransitionStates must be at least 1".into(),
            ));
        }
        if schedule_steps == 0 || schedule_steps > forecast_steps {
            return Err(AgentError::InvalidConfig(format!(
                "ScheduleDurationInHours must be in 1..={}, got {}",
                forecast_steps, schedule_steps
            )));
        }
        Ok(Self {
            number_of_energy_states,
            number_of_transition_states,
            forecast_steps,
            schedule_steps,
        })
    }

    pub fn forecast_steps(&self) -> usize {
        self.forecast_steps
    }

    pub fn schedule_steps(&self) -> usize {
        self.schedule_steps
    }

    /// Runs backward induction from the horizon end and walks the best
    /// transitions forward from the device's current energy level.
    pub fn optimise(
        &self,
        first_period: TimePeriod,
        device: &Device,
        assessment: &mut dyn AssessmentFunction,
    ) -> Result<DispatchPlan> {
        let states = self.number_of_energy_states;
        let capacity = device.energy_storage_capacity_in_mwh();
        if capacity <= 0.0 {
            return Err(AgentError::InvalidConfig(
                "storage capacity must be positive for dispatch optimisation".into(),
            ));
        }
        let energy_per_state = capacity / (states - 1) as f64;
        let (charging_span, discharging_span) = self.transition_spans(device, energy_per_state);
        let target = assessment.target();

        // best_value[t][i]: best objective from period t onward when entering
        // it at state i; terminal row stays zero.
        let mut best_value = vec![vec![0.0; states]; self.forecast_steps + 1];
        let mut best_next = vec![vec![0usize; states]; self.forecast_steps];

        for offset in 0..self.forecast_steps {
            let period_index = self.forecast_steps - offset - 1;
            let time = first_period
                .shift_by_duration(period_index as u64)
                .start_time();
            assessment.prepare_for(time)?;

            for initial_state in 0..states {
                let first_final = initial_state.saturating_sub(discharging_span);
                let last_final = (initial_state + charging_span).min(states - 1);
                let mut current_best = target.initial_value();
                let mut best_final_state = None;

                for final_state in first_final..=last_final {
                    let delta =
                        self.external_energy_delta(initial_state, final_state, energy_per_state, device);
                    let value =
                        assessment.assess_transition(delta) + best_value[period_index + 1][final_state];
                    if target.improves(value, current_best) {
                        current_best = value;
                        best_final_state = Some(final_state);
                    }
                }

                let Some(final_state) = best_final_state else {
                    return Err(AgentError::NoValidStrategy);
                };
                best_value[period_index][initial_state] = current_best;
                best_next[period_index][initial_state] = final_state;
            }
        }

        let mut plan = DispatchPlan {
            external_energy_deltas_in_mwh: Vec::with_capacity(self.schedule_steps),
            initial_internal_energies_in_mwh: Vec::with_capacity(self.schedule_steps),
            specific_values_in_eur_per_mwh: Vec::with_capacity(self.schedule_steps),
        };
        let mut state = self.nearest_state(device.energy_in_storage_in_mwh(), energy_per_state);
        for period_index in 0..self.schedule_steps {
            let next_state = best_next[period_index][state];
            let delta = self.external_energy_delta(state, next_state, energy_per_state, device);
            let transition_value =
                best_value[period_index][state] - best_value[period_index + 1][next_state];

            plan.external_energy_deltas_in_mwh.push(delta);
            plan.initial_internal_energies_in_mwh
                .push(state as f64 * energy_per_state);
            plan.specific_values_in_eur_per_mwh.push(if delta == 0.0 {
                f64::NAN
            } else {
                (transition_value / delta).abs()
            });
            state = next_state;
        }
        Ok(plan)
    }

    /// State-step spans per direction, capped so the implied external power
    /// stays within the device's installed power after efficiency
    /// correction.
    fn transition_spans(&self, device: &Device, energy_per_state: f64) -> (usize, usize) {
        let hours = OPERATION_PERIOD_IN_HOURS;
        let max_internal_charge =
            device.installed_power_in_mw() * hours * device.charging_efficiency();
        let max_internal_discharge =
            device.installed_power_in_mw() * hours / device.discharging_efficiency();
        let charging_span = ((max_internal_charge / energy_per_state) + 1e-9).floor() as usize;
        let discharging_span = ((max_internal_discharge / energy_per_state) + 1e-9).floor() as usize;
        (
            charging_span.min(self.number_of_transition_states),
            discharging_span.min(self.number_of_transition_states),
        )
    }

    /// External energy exchanged when moving between the given states.
    fn external_energy_delta(
        &self,
        initial_state: usize,
        final_state: usize,
        energy_per_state: f64,
        device: &Device,
    ) -> f64 {
        let internal_delta = (final_state as f64 - initial_state as f64) * energy_per_state;
        device.internal_to_external_energy(internal_delta)
    }

    /// Discretised state closest to the given energy content.
    fn nearest_state(&self, energy_in_mwh: f64, energy_per_state: f64) -> usize {
        ((energy_in_mwh / energy_per_state).round() as usize).min(self.number_of_energy_states - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategist::assessment::MaxProfitPriceTaker;
    use devices::StorageParameters;
    use types::{AmountAtTime, TimePeriod, TimeStamp};

    const EPS: f64 = 1e-9;

    fn unit_device() -> Device {
        Device::new(&StorageParameters {
            energy_to_power_ratio: 1.0,
            self_discharge_rate_per_hour: 0.0,
            charging_efficiency: 1.0,
            discharging_efficiency: 1.0,
            initial_energy_level_in_mwh: 0.0,
            installed_power_in_mw: 1.0,
        })
        .unwrap()
    }

    fn price_taker(prices: &[f64]) -> MaxProfitPriceTaker {
        let mut assessment = MaxProfitPriceTaker::default();
        let forecasts: Vec<AmountAtTime> = prices
            .iter()
            .enumerate()
            .map(|(hour, &price)| AmountAtTime::new(TimeStamp::from_hours(hour as u64), price))
            .collect();
        assessment.store_price_forecasts(&forecasts);
        assessment
    }

    #[test]
    fn test_price_taker_arbitrage_cycle() {
        // Alternating cheap and expensive hours: charge low, discharge high.
        let device = unit_device();
        let mut assessment = price_taker(&[20.0, 80.0, 20.0, 80.0]);
        let optimiser = Optimiser::new(11, 10, 4, 4).unwrap();
        let plan = optimiser
            .optimise(
                TimePeriod::hour_starting_at(TimeStamp::ZERO),
                &device,
                &mut assessment,
            )
            .unwrap();

        let expected = [1.0, -1.0, 1.0, -1.0];
        for (planned, expected) in plan
            .external_energy_deltas_in_mwh
            .iter()
            .zip(expected.iter())
        {
            assert!((planned - expected).abs() < EPS);
        }
        assert_eq!(
            plan.initial_internal_energies_in_mwh,
            vec![0.0, 1.0, 0.0, 1.0]
        );
    }

    #[test]
    fn test_flat_prices_stay_idle() {
        let device = unit_device();
        let mut assessment = price_taker(&[50.0, 50.0, 50.0, 50.0]);
        let optimiser = Optimiser::new(11, 10, 4, 4).unwrap();
        let plan = optimiser
            .optimise(
                TimePeriod::hour_starting_at(TimeStamp::ZERO),
                &device,
                &mut assessment,
            )
            .unwrap();
        for delta in &plan.external_energy_deltas_in_mwh {
            assert_eq!(*delta, 0.0);
        }
    }

    #[test]
    fn test_plan_beats_greedy_alternative() {
        // Prices fall before they rise: greedy charging at hour 0 misses the
        // cheaper hour 1. Backward induction must not.
        let device = unit_device();
        let mut assessment = price_taker(&[40.0, 10.0, 90.0, 30.0]);
        let optimiser = Optimiser::new(11, 10, 4, 4).unwrap();
        let plan = optimiser
            .optimise(
                TimePeriod::hour_starting_at(TimeStamp::ZERO),
                &device,
                &mut assessment,
            )
            .unwrap();
        assert_eq!(plan.external_energy_deltas_in_mwh[0], 0.0);
        assert!((plan.external_energy_deltas_in_mwh[1] - 1.0).abs() < EPS);
        assert!((plan.external_energy_deltas_in_mwh[2] + 1.0).abs() < EPS);
    }

    #[test]
    fn test_transitions_respect_power_limit() {
        // Eleven states over 2 MWh capacity but only 1 MW of power: at most
        // five states (1 MWh) may be crossed per hour.
        let device = Device::new(&StorageParameters {
            energy_to_power_ratio: 2.0,
            self_discharge_rate_per_hour: 0.0,
            charging_efficiency: 1.0,
            discharging_efficiency: 1.0,
            initial_energy_level_in_mwh: 0.0,
            installed_power_in_mw: 1.0,
        })
        .unwrap();
        let mut assessment = price_taker(&[10.0, 100.0]);
        let optimiser = Optimiser::new(11, 10, 2, 2).unwrap();
        let plan = optimiser
            .optimise(
                TimePeriod::hour_starting_at(TimeStamp::ZERO),
                &device,
                &mut assessment,
            )
            .unwrap();
        assert!(plan.external_energy_deltas_in_mwh[0] <= 1.0 + EPS);
        assert!(plan.external_energy_deltas_in_mwh[1] >= -1.0 - EPS);
    }

    #[test]
    fn test_specific_values_track_prices() {
        let device = unit_device();
        let mut assessment = price_taker(&[20.0, 80.0]);
        let optimiser = Optimiser::new(11, 10, 2, 2).unwrap();
        let plan = optimiser
            .optimise(
                TimePeriod::hour_starting_at(TimeStamp::ZERO),
                &device,
                &mut assessment,
            )
            .unwrap();
        // Charging 1 MWh at 20 followed by discharging at 80: the first
        // transition is worth the charge price net of the continuation.
        assert!(plan.specific_values_in_eur_per_mwh[0].is_finite());
        assert!((plan.specific_values_in_eur_per_mwh[1] - 80.0).abs() < EPS);
    }

    #[test]
    fn test_invalid_discretisation_rejected() {
        assert!(Optimiser::new(1, 10, 4, 4).is_err());
        assert!(Optimiser::new(11, 0, 4, 4).is_err());
        assert!(Optimiser::new(11, 10, 4, 5).is_err());
    }
}
