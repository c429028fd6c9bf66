//! Uniform-price merit-order clearing for a single hour.

use rand::rngs::StdRng;
use rand::SeedableRng;

use types::{AwardData, PriceBounds, TimeStamp, TraderId};

use crate::error::Result;
use crate::order_book::{
    Demand, DistributionMethod, OrderBookItem, SortedBook, Supply, UnsortedBook,
};

/// Outcome of clearing one hour of trading.
///
/// The books carry per-bid awards; the scalars describe the uniform price
/// and the total traded energy.
#[derive(Debug, Clone)]
pub struct ClearingResult {
    pub supply_book: SortedBook<Supply>,
    pub demand_book: SortedBook<Demand>,
    pub awarded_price_in_eur_per_mwh: f64,
    pub awarded_cumulative_power_in_mwh: f64,
    /// Total dispatch cost of awarded supply at marginal cost.
    pub system_cost_in_eur: f64,
}

impl ClearingResult {
    /// Award message for one trader and the given delivery interval.
    pub fn award_for(&self, trader_id: TraderId, delivery_time: TimeStamp) -> AwardData {
        AwardData {
            supply_energy_in_mwh: self.supply_book.traders_sum_of_power(trader_id),
            demand_energy_in_mwh: self.demand_book.traders_sum_of_power(trader_id),
            power_price_in_eur_per_mwh: self.awarded_price_in_eur_per_mwh,
            begin_of_delivery_interval: delivery_time,
        }
    }
}

/// The market clearing engine.
///
/// Owns the legal price band, the price-setting distribution method and the
/// seeded RNG used by [`DistributionMethod::Randomize`], so identical inputs
/// and seed reproduce identical awards.
#[derive(Debug)]
pub struct MarketClearing {
    bounds: PriceBounds,
    method: DistributionMethod,
    rng: StdRng,
}

impl MarketClearing {
    pub fn new(bounds: PriceBounds, method: DistributionMethod, seed: u64) -> Self {
        Self {
            bounds,
            method,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn bounds(&self) -> PriceBounds {
        self.bounds
    }

    /// Opens an empty supply book with this market's price band.
    pub fn open_supply_book(&self) -> UnsortedBook<Supply> {
        UnsortedBook::new(self.bounds)
    }

    /// Opens an empty demand book with this market's price band.
    pub fn open_demand_book(&self) -> UnsortedBook<Demand> {
        UnsortedBook::new(self.bounds)
    }

    /// Clears the given books and distributes awards.
    ///
    /// Closing the books validates all bids; a negative block power aborts
    /// the clearing with an error. A market without real supply power clears
    /// at the scarcity price with zero award, one without real demand power
    /// at the minimal price.
    pub fn clear(
        &mut self,
        supply: UnsortedBook<Supply>,
        demand: UnsortedBook<Demand>,
    ) -> Result<ClearingResult> {
        let supply_has_power = supply.offered_power() > 0.0;
        let demand_has_power = demand.offered_power() > 0.0;
        let mut supply_book = supply.close()?;
        let mut demand_book = demand.close()?;

        let (awarded_power, awarded_price) = if !supply_has_power {
            (0.0, self.bounds.scarcity_price_in_eur_per_mwh)
        } else if !demand_has_power {
            (0.0, self.bounds.minimal_price_in_eur_per_mwh)
        } else {
            Self::find_crossing(supply_book.items(), demand_book.items())
        };

        supply_book.update_awarded_power(awarded_power, awarded_price, self.method, &mut self.rng);
        demand_book.update_awarded_power(awarded_power, awarded_price, self.method, &mut self.rng);

        let system_cost_in_eur = supply_book
            .items()
            .iter()
            .map(|item| item.awarded_power * item.marginal_cost())
            .sum();

        Ok(ClearingResult {
            supply_book,
            demand_book,
            awarded_price_in_eur_per_mwh: awarded_price,
            awarded_cumulative_power_in_mwh: awarded_power,
            system_cost_in_eur,
        })
    }

    /// Walks both cumulative-power curves to the point where the ascending
    /// supply curve first meets or exceeds the descending demand curve.
    ///
    /// Returns the awarded cumulative power and the uniform price. The
    /// price-setting side is the one whose bid band strictly contains the
    /// awarded power; when the award lands exactly on breakpoints of both
    /// curves, the last supply step ending there sets the price.
    fn find_crossing(supply: &[OrderBookItem], demand: &[OrderBookItem]) -> (f64, f64) {
        let mut supply_index = 0;
        let mut demand_index = 0;
        let mut awarded_power = 0.0;
        loop {
            let supply_price = supply[supply_index].price();
            let demand_price = demand[demand_index].price();
            if supply_price > demand_price {
                break;
            }
            let supply_upper = supply[supply_index].cumulated_upper_power;
            let demand_upper = demand[demand_index].cumulated_upper_power;
            match supply_upper.total_cmp(&demand_upper) {
                std::cmp::Ordering::Less => {
                    awarded_power = supply_upper;
                    if supply_index + 1 < supply.len() {
                        supply_index += 1;
                    } else {
                        break;
                    }
                }
                std::cmp::Ordering::Greater => {
                    awarded_power = demand_upper;
                    if demand_index + 1 < demand.len() {
                        demand_index += 1;
                    } else {
                        break;
                    }
                }
                std::cmp::Ordering::Equal => {
                    awarded_power = supply_upper;
                    let supply_can_advance = supply_index + 1 < supply.len();
                    let demand_can_advance = demand_index + 1 < demand.len();
                    if supply_can_advance {
                        supply_index += 1;
                    }
                    if demand_can_advance {
                        demand_index += 1;
                    }
                    if !supply_can_advance && !demand_can_advance {
                        break;
                    }
                }
            }
        }

        let strictly_inside = |item: &&OrderBookItem| {
            item.cumulated_lower_power < awarded_power
                && awarded_power < item.cumulated_upper_power
        };
        let price = if let Some(item) = supply.iter().find(strictly_inside) {
            item.price()
        } else if let Some(item) = demand.iter().find(strictly_inside) {
            item.price()
        } else {
            supply
                .iter()
                .rev()
                .find(|item| {
                    item.block_power() > 0.0
                        && (item.cumulated_upper_power - awarded_power).abs() < 1e-9
                })
                .map(OrderBookItem::price)
                .unwrap_or_else(|| supply[supply_index].price())
        };
        (awarded_power, price)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::Bid;

    const EPS: f64 = 1e-9;

    fn market(method: DistributionMethod) -> MarketClearing {
        MarketClearing::new(PriceBounds::default(), method, 42)
    }

    fn books(
        market: &MarketClearing,
        supply: &[(f64, f64)],
        demand: &[(f64, f64)],
    ) -> (UnsortedBook<Supply>, UnsortedBook<Demand>) {
        let mut supply_book = market.open_supply_book();
        for (index, &(energy, price)) in supply.iter().enumerate() {
            supply_book
                .push(Bid::supply(energy, price, price, TraderId(index as u64)))
                .unwrap();
        }
        let mut demand_book = market.open_demand_book();
        for (index, &(energy, price)) in demand.iter().enumerate() {
            demand_book
                .push(Bid::demand(energy, price, 0.0, TraderId(100 + index as u64)))
                .unwrap();
        }
        (supply_book, demand_book)
    }

    #[test]
    fn test_single_hour_clearing_no_ties() {
        // Two supply blocks, the expensive one price-setting and partially awarded.
        let mut market = market(DistributionMethod::FirstComeFirstServe);
        let (supply, demand) = books(&market, &[(10.0, 20.0), (5.0, 50.0)], &[(12.0, 100.0)]);
        let result = market.clear(supply, demand).unwrap();

        assert_eq!(result.awarded_price_in_eur_per_mwh, 50.0);
        assert_eq!(result.awarded_cumulative_power_in_mwh, 12.0);
        assert_eq!(result.supply_book.traders_sum_of_power(TraderId(0)), 10.0);
        assert_eq!(result.supply_book.traders_sum_of_power(TraderId(1)), 2.0);
        assert_eq!(result.demand_book.traders_sum_of_power(TraderId(100)), 12.0);
    }

    #[test]
    fn test_price_setting_tie_same_shares() {
        let mut market = market(DistributionMethod::SameShares);
        let (supply, demand) = books(&market, &[(4.0, 30.0), (4.0, 30.0)], &[(6.0, 100.0)]);
        let result = market.clear(supply, demand).unwrap();

        assert_eq!(result.awarded_price_in_eur_per_mwh, 30.0);
        assert!((result.supply_book.traders_sum_of_power(TraderId(0)) - 3.0).abs() < EPS);
        assert!((result.supply_book.traders_sum_of_power(TraderId(1)) - 3.0).abs() < EPS);
    }

    #[test]
    fn test_awarded_supply_equals_awarded_demand() {
        let mut market = market(DistributionMethod::FirstComeFirstServe);
        let (supply, demand) = books(
            &market,
            &[(10.0, 5.0), (8.0, 35.0), (5.0, 80.0)],
            &[(7.0, 120.0), (9.0, 60.0), (4.0, 20.0)],
        );
        let result = market.clear(supply, demand).unwrap();
        let supplied = result.supply_book.total_awarded_power();
        let consumed = result.demand_book.total_awarded_power();
        assert!((supplied - consumed).abs() < EPS);
        assert!((supplied - result.awarded_cumulative_power_in_mwh).abs() < EPS);
    }

    #[test]
    fn test_empty_supply_clears_at_scarcity() {
        let mut market = market(DistributionMethod::FirstComeFirstServe);
        let (supply, demand) = books(&market, &[], &[(12.0, 100.0)]);
        let result = market.clear(supply, demand).unwrap();
        assert_eq!(result.awarded_cumulative_power_in_mwh, 0.0);
        assert_eq!(result.awarded_price_in_eur_per_mwh, 3000.0);
    }

    #[test]
    fn test_empty_demand_clears_at_minimal() {
        let mut market = market(DistributionMethod::FirstComeFirstServe);
        let (supply, demand) = books(&market, &[(10.0, 20.0)], &[]);
        let result = market.clear(supply, demand).unwrap();
        assert_eq!(result.awarded_cumulative_power_in_mwh, 0.0);
        assert_eq!(result.awarded_price_in_eur_per_mwh, -500.0);
    }

    #[test]
    fn test_supply_shortage_clears_at_demand_price() {
        // All supply awarded, the unserved demand sets the price.
        let mut market = market(DistributionMethod::FirstComeFirstServe);
        let (supply, demand) = books(&market, &[(10.0, 20.0)], &[(15.0, 3000.0)]);
        let result = market.clear(supply, demand).unwrap();
        assert_eq!(result.awarded_cumulative_power_in_mwh, 10.0);
        assert_eq!(result.awarded_price_in_eur_per_mwh, 3000.0);
        assert_eq!(result.supply_book.traders_sum_of_power(TraderId(0)), 10.0);
    }

    #[test]
    fn test_no_overlap_awards_nothing() {
        let mut market = market(DistributionMethod::FirstComeFirstServe);
        let (supply, demand) = books(&market, &[(10.0, 90.0)], &[(5.0, 50.0)]);
        let result = market.clear(supply, demand).unwrap();
        assert_eq!(result.awarded_cumulative_power_in_mwh, 0.0);
        assert_eq!(result.supply_book.total_awarded_power(), 0.0);
        assert_eq!(result.demand_book.total_awarded_power(), 0.0);
    }

    #[test]
    fn test_system_cost_uses_marginal_cost() {
        let mut market = market(DistributionMethod::FirstComeFirstServe);
        let mut supply_book = market.open_supply_book();
        supply_book
            .push(Bid::supply(10.0, 20.0, 15.0, TraderId(0)))
            .unwrap();
        let mut demand_book = market.open_demand_book();
        demand_book
            .push(Bid::demand(10.0, 100.0, 0.0, TraderId(1)))
            .unwrap();
        let result = market.clear(supply_book, demand_book).unwrap();
        assert!((result.system_cost_in_eur - 150.0).abs() < EPS);
    }

    #[test]
    fn test_randomize_is_reproducible_for_equal_seeds() {
        let run = || {
            let mut market = MarketClearing::new(
                PriceBounds::default(),
                DistributionMethod::Randomize,
                7,
            );
            let (supply, demand) = books(
                &market,
                &[(4.0, 30.0), (4.0, 30.0), (4.0, 30.0)],
                &[(6.0, 100.0)],
            );
            let result = market.clear(supply, demand).unwrap();
            (0..3)
                .map(|index| result.supply_book.traders_sum_of_power(TraderId(index)))
                .collect::<Vec<_>>()
        };
        assert_eq!(run(), run());
    }
}
