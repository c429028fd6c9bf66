//! Merit-order sensitivities: how a cleared market reacts to added load or
//! added supply.
//!
//! A sensitivity transforms the cleared order books into two monotone
//! stepwise curves, one for *charging* (adding load) and one for
//! *discharging* (adding supply). Flexibility strategists use them to value
//! a hypothetical additional charge or discharge, including the price effect
//! of their own bid.

use serde::{Deserialize, Serialize};

use crate::order_book::{Demand, OrderBookItem, SortedBook, Supply};

/// Which merit-order value a sensitivity tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SensitivityFlavor {
    /// Electricity price reaction; items ordered by offer price.
    Price,
    /// Dispatch cost reaction; items ordered by marginal cost.
    Cost,
}

/// One step of a sensitivity curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivityItem {
    pub power: f64,
    pub price: f64,
    pub marginal_cost: f64,
    pub cumulated_lower_power: f64,
    pub monetary_offset: f64,
}

impl SensitivityItem {
    fn new(power: f64, price: f64, marginal_cost: f64) -> Self {
        Self {
            power,
            price,
            marginal_cost,
            cumulated_lower_power: 0.0,
            monetary_offset: 0.0,
        }
    }

    #[inline]
    pub fn cumulated_upper_power(&self) -> f64 {
        self.cumulated_lower_power + self.power
    }
}

/// External power per discretisation step, as used by the strategists.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepPower {
    charging_power_per_step: f64,
    discharging_power_per_step: f64,
}

impl StepPower {
    pub fn new(
        external_charging_power_in_mw: f64,
        external_discharging_power_in_mw: f64,
        number_of_steps: usize,
    ) -> Self {
        Self {
            charging_power_per_step: external_charging_power_in_mw / number_of_steps as f64,
            discharging_power_per_step: external_discharging_power_in_mw / number_of_steps as f64,
        }
    }

    /// External power at the given step delta: positive deltas charge,
    /// negative deltas discharge.
    pub fn power(&self, step_delta: i64) -> f64 {
        if step_delta >= 0 {
            step_delta as f64 * self.charging_power_per_step
        } else {
            step_delta as f64 * self.discharging_power_per_step
        }
    }
}

/// Stepwise price or cost curve over added charging / discharging power.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeritOrderSensitivity {
    flavor: SensitivityFlavor,
    external_charging_power_in_mw: f64,
    external_discharging_power_in_mw: f64,
    charging_items: Vec<SensitivityItem>,
    discharging_items: Vec<SensitivityItem>,
}

impl MeritOrderSensitivity {
    /// Creates an empty sensitivity bounded by the strategist's maximum
    /// external charging and discharging powers.
    pub fn new(
        flavor: SensitivityFlavor,
        max_charging_power_in_mw: f64,
        max_discharging_power_in_mw: f64,
    ) -> Self {
        Self {
            flavor,
            external_charging_power_in_mw: max_charging_power_in_mw,
            external_discharging_power_in_mw: max_discharging_power_in_mw,
            charging_items: Vec::new(),
            discharging_items: Vec::new(),
        }
    }

    pub fn flavor(&self) -> SensitivityFlavor {
        self.flavor
    }

    /// True until sensitivities have been derived from books.
    pub fn is_empty(&self) -> bool {
        self.charging_items.is_empty() && self.discharging_items.is_empty()
    }

    /// Rebuilds both curves from post-clearing books.
    ///
    /// Charging picks up power that raising the load would activate or
    /// displace: unawarded supply and awarded demand. Discharging picks up
    /// power that additional supply could replace or serve: awarded supply
    /// and unawarded demand.
    pub fn update_from_books(&mut self, supply: &SortedBook<Supply>, demand: &SortedBook<Demand>) {
        self.charging_items.clear();
        self.discharging_items.clear();

        for item in supply.items() {
            if item.block_power() <= 0.0 {
                continue;
            }
            self.add_split_item(item, item.not_awarded_power(), item.awarded_power);
        }
        for item in demand.items() {
            if item.block_power() <= 0.0 {
                continue;
            }
            self.add_split_item(item, item.awarded_power, item.not_awarded_power());
        }

        let key = self.sort_key();
        self.charging_items
            .sort_by(|a, b| key(a).total_cmp(&key(b)));
        self.discharging_items
            .sort_by(|a, b| key(b).total_cmp(&key(a)));

        Self::set_cumulative_values(&mut self.charging_items, self.flavor);
        Self::set_cumulative_values(&mut self.discharging_items, self.flavor);

        let max_charging = self.external_charging_power_in_mw;
        self.charging_items
            .retain(|item| item.cumulated_lower_power <= max_charging);
        let max_discharging = self.external_discharging_power_in_mw;
        self.discharging_items
            .retain(|item| item.cumulated_lower_power <= max_discharging);
    }

    /// Adds the charging and discharging shares of one order book item.
    fn add_split_item(&mut self, item: &OrderBookItem, charging_power: f64, discharging_power: f64) {
        if charging_power > 0.0 {
            self.charging_items.push(SensitivityItem::new(
                charging_power,
                item.price(),
                item.marginal_cost(),
            ));
        }
        if discharging_power > 0.0 {
            self.discharging_items.push(SensitivityItem::new(
                discharging_power,
                item.price(),
                item.marginal_cost(),
            ));
        }
    }

    fn sort_key(&self) -> fn(&SensitivityItem) -> f64 {
        match self.flavor {
            SensitivityFlavor::Price => |item: &SensitivityItem| item.price,
            SensitivityFlavor::Cost => |item: &SensitivityItem| item.marginal_cost,
        }
    }

    fn set_cumulative_values(items: &mut [SensitivityItem], flavor: SensitivityFlavor) {
        let mut cumulated_power = 0.0;
        let mut monetary_offset = 0.0;
        for item in items {
            item.cumulated_lower_power = cumulated_power;
            item.monetary_offset = monetary_offset;
            cumulated_power += item.power;
            monetary_offset += match flavor {
                SensitivityFlavor::Price => item.price,
                SensitivityFlavor::Cost => item.price * item.power,
            };
        }
    }

    /// Value of one curve step at the given signed power.
    ///
    /// The price flavor yields the stepwise marginal price; the cost flavor
    /// the average cost of the full block up to `power`.
    fn value_of_item_at_power(&self, item: &SensitivityItem, power: f64) -> f64 {
        match self.flavor {
            SensitivityFlavor::Price => item.price,
            SensitivityFlavor::Cost => {
                let absolute = power.abs();
                power.signum()
                    * (item.monetary_offset
                        + (absolute - item.cumulated_lower_power) * item.price)
                    / absolute
            }
        }
    }

    /// Sensitivity values in `2 * steps + 1` equally spaced power steps.
    ///
    /// Index `steps` is the zero-power value; higher indices walk the
    /// charging side up to the maximum charging power, lower indices the
    /// discharging side. Powers beyond the covered bands yield NaN.
    pub fn values_in_steps(&self, steps: usize) -> Vec<f64> {
        let mut values = vec![0.0; 2 * steps + 1];
        values[steps] = 0.0;

        let charging_power_per_step = self.external_charging_power_in_mw / steps as f64;
        let mut index = 0;
        for step in 1..=steps {
            let power = charging_power_per_step * step as f64;
            while index < self.charging_items.len()
                && self.charging_items[index].cumulated_upper_power() < power
            {
                index += 1;
            }
            values[steps + step] = if index < self.charging_items.len() {
                self.value_of_item_at_power(&self.charging_items[index], power)
            } else {
                f64::NAN
            };
        }

        let discharging_power_per_step = self.external_discharging_power_in_mw / steps as f64;
        let mut index = 0;
        for step in 1..=steps {
            let power = discharging_power_per_step * step as f64;
            while index < self.discharging_items.len()
                && self.discharging_items[index].cumulated_upper_power() < power
            {
                index += 1;
            }
            values[steps - step] = if index < self.discharging_items.len() {
                self.value_of_item_at_power(&self.discharging_items[index], -power)
            } else {
                f64::NAN
            };
        }
        values
    }

    /// External power increments matching [`Self::values_in_steps`].
    pub fn step_powers(&self, steps: usize) -> StepPower {
        StepPower::new(
            self.external_charging_power_in_mw,
            self.external_discharging_power_in_mw,
            steps,
        )
    }

    /// Total monetary value of an additional external energy delta.
    ///
    /// Integrates the offer prices over the affected bands: positive for the
    /// cost of charging `delta > 0`, negative for the revenue of discharging
    /// `delta < 0`. NaN when the delta exceeds the covered bands.
    pub fn monetary_value_at(&self, external_energy_delta_in_mwh: f64) -> f64 {
        if external_energy_delta_in_mwh == 0.0 {
            return 0.0;
        }
        let items = if external_energy_delta_in_mwh > 0.0 {
            &self.charging_items
        } else {
            &self.discharging_items
        };
        let mut remaining = external_energy_delta_in_mwh.abs();
        let mut money = 0.0;
        for item in items {
            if remaining <= 0.0 {
                break;
            }
            let taken = item.power.min(remaining);
            money += taken * item.price;
            remaining -= taken;
        }
        if remaining > 1e-9 {
            return f64::NAN;
        }
        external_energy_delta_in_mwh.signum() * money
    }
}

/// Degenerate sensitivity holding only a flat electricity price forecast.
///
/// Used by price-taking strategists whose forecasts arrive as plain prices
/// instead of order books.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct PriceNoSensitivity {
    price_forecast_in_eur_per_mwh: f64,
}

impl PriceNoSensitivity {
    pub fn new(price_forecast_in_eur_per_mwh: f64) -> Self {
        Self {
            price_forecast_in_eur_per_mwh,
        }
    }

    /// Stored forecast; NaN forecasts read as zero.
    pub fn price_forecast(&self) -> f64 {
        if self.price_forecast_in_eur_per_mwh.is_nan() {
            0.0
        } else {
            self.price_forecast_in_eur_per_mwh
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clearing::MarketClearing;
    use crate::order_book::DistributionMethod;
    use types::{Bid, PriceBounds, TraderId};

    const EPS: f64 = 1e-9;

    /// Clears supply-only books so nothing is awarded; all supply becomes
    /// charging potential.
    fn unawarded_supply_sensitivity(flavor: SensitivityFlavor) -> MeritOrderSensitivity {
        let mut market = MarketClearing::new(
            PriceBounds::default(),
            DistributionMethod::FirstComeFirstServe,
            1,
        );
        let mut supply = market.open_supply_book();
        supply
            .push(Bid::supply(5.0, 30.0, 30.0, TraderId(0)))
            .unwrap();
        supply
            .push(Bid::supply(5.0, 60.0, 60.0, TraderId(1)))
            .unwrap();
        let demand = market.open_demand_book();
        let result = market.clear(supply, demand).unwrap();

        let mut sensitivity = MeritOrderSensitivity::new(flavor, 10.0, 10.0);
        sensitivity.update_from_books(&result.supply_book, &result.demand_book);
        sensitivity
    }

    #[test]
    fn test_cost_values_in_steps_average_cost() {
        let sensitivity = unawarded_supply_sensitivity(SensitivityFlavor::Cost);
        let values = sensitivity.values_in_steps(2);
        assert_eq!(values.len(), 5);
        assert_eq!(values[2], 0.0);
        assert!((values[3] - 30.0).abs() < EPS); // 5 MWh at 30 EUR/MWh
        assert!((values[4] - 45.0).abs() < EPS); // (5*30 + 5*60) / 10
        // No discharging potential without awarded supply or unawarded demand.
        assert!(values[0].is_nan());
        assert!(values[1].is_nan());
    }

    #[test]
    fn test_price_values_are_stepwise_marginal() {
        let sensitivity = unawarded_supply_sensitivity(SensitivityFlavor::Price);
        let values = sensitivity.values_in_steps(2);
        assert!((values[3] - 30.0).abs() < EPS);
        assert!((values[4] - 60.0).abs() < EPS);
    }

    #[test]
    fn test_charging_side_monotone() {
        let sensitivity = unawarded_supply_sensitivity(SensitivityFlavor::Cost);
        let values = sensitivity.values_in_steps(5);
        let charging: Vec<f64> = values[5..].to_vec();
        for pair in charging.windows(2) {
            assert!(pair[1] >= pair[0] - EPS);
        }
    }

    #[test]
    fn test_monetary_value_at_integrates_bands() {
        let sensitivity = unawarded_supply_sensitivity(SensitivityFlavor::Price);
        assert_eq!(sensitivity.monetary_value_at(0.0), 0.0);
        assert!((sensitivity.monetary_value_at(5.0) - 150.0).abs() < EPS);
        assert!((sensitivity.monetary_value_at(10.0) - 450.0).abs() < EPS);
        assert!(sensitivity.monetary_value_at(11.0).is_nan());
        // No discharging bands exist, so any discharge is uncovered.
        assert!(sensitivity.monetary_value_at(-1.0).is_nan());
    }

    #[test]
    fn test_discharging_side_from_cleared_market() {
        let mut market = MarketClearing::new(
            PriceBounds::default(),
            DistributionMethod::FirstComeFirstServe,
            1,
        );
        let mut supply = market.open_supply_book();
        supply
            .push(Bid::supply(10.0, 20.0, 20.0, TraderId(0)))
            .unwrap();
        let mut demand = market.open_demand_book();
        demand
            .push(Bid::demand(10.0, 100.0, 0.0, TraderId(1)))
            .unwrap();
        let result = market.clear(supply, demand).unwrap();

        let mut sensitivity = MeritOrderSensitivity::new(SensitivityFlavor::Price, 10.0, 10.0);
        sensitivity.update_from_books(&result.supply_book, &result.demand_book);

        // Awarded supply can be bought back when discharging...
        assert!((sensitivity.monetary_value_at(-10.0) + 200.0).abs() < EPS);
        // ...and awarded demand is displaced when charging.
        assert!((sensitivity.monetary_value_at(10.0) - 1000.0).abs() < EPS);
    }

    #[test]
    fn test_discharging_side_deepens_monotonically() {
        // Two supply blocks fully awarded against a large demand block give
        // a two-step discharging curve.
        let mut market = MarketClearing::new(
            PriceBounds::default(),
            DistributionMethod::FirstComeFirstServe,
            1,
        );
        let mut supply = market.open_supply_book();
        supply
            .push(Bid::supply(5.0, 20.0, 20.0, TraderId(0)))
            .unwrap();
        supply
            .push(Bid::supply(5.0, 50.0, 50.0, TraderId(1)))
            .unwrap();
        let mut demand = market.open_demand_book();
        demand
            .push(Bid::demand(10.0, 100.0, 0.0, TraderId(2)))
            .unwrap();
        let result = market.clear(supply, demand).unwrap();

        let mut sensitivity = MeritOrderSensitivity::new(SensitivityFlavor::Cost, 10.0, 10.0);
        sensitivity.update_from_books(&result.supply_book, &result.demand_book);
        let values = sensitivity.values_in_steps(5);

        // Zero at the centre; traversed from shallow to deep discharge
        // (reverse index) the values never decrease: the expensive plant is
        // displaced first, so the average revenue falls with depth.
        assert_eq!(values[5], 0.0);
        for step in 0..4 {
            assert!(values[step] + EPS >= values[step + 1]);
        }
        // The total revenue still grows with every additional MWh.
        let mut previous_revenue = 0.0;
        for power in [2.0, 4.0, 6.0, 8.0, 10.0] {
            let revenue = -sensitivity.monetary_value_at(-power);
            assert!(revenue > previous_revenue);
            previous_revenue = revenue;
        }
    }

    #[test]
    fn test_step_power_mapping() {
        let step_power = StepPower::new(10.0, 20.0, 5);
        assert_eq!(step_power.power(0), 0.0);
        assert_eq!(step_power.power(5), 10.0);
        assert_eq!(step_power.power(2), 4.0);
        assert_eq!(step_power.power(-5), -20.0);
        assert_eq!(step_power.power(-1), -4.0);
    }

    #[test]
    fn test_price_no_sensitivity_nan_reads_zero() {
        assert_eq!(PriceNoSensitivity::new(f64::NAN).price_forecast(), 0.0);
        assert_eq!(PriceNoSensitivity::new(42.0).price_forecast(), 42.0);
    }

    #[test]
    fn test_items_beyond_max_power_dropped() {
        let mut market = MarketClearing::new(
            PriceBounds::default(),
            DistributionMethod::FirstComeFirstServe,
            1,
        );
        let mut supply = market.open_supply_book();
        supply
            .push(Bid::supply(5.0, 30.0, 30.0, TraderId(0)))
            .unwrap();
        supply
            .push(Bid::supply(5.0, 60.0, 60.0, TraderId(1)))
            .unwrap();
        let demand = market.open_demand_book();
        let result = market.clear(supply, demand).unwrap();

        // Max charging power of 4 MW keeps only the first band.
        let mut sensitivity = MeritOrderSensitivity::new(SensitivityFlavor::Price, 4.0, 4.0);
        sensitivity.update_from_books(&result.supply_book, &result.demand_book);
        let values = sensitivity.values_in_steps(1);
        assert!((values[2] - 30.0).abs() < EPS);
    }
}
