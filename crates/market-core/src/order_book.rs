//! Order books for a single hour of trading.
//!
//! A book starts out as an append-only [`UnsortedBook`]. Closing it checks
//! bid validity, appends the virtual zero-power tail bid that guarantees the
//! supply and demand curves cross, sorts the items and assigns cumulative
//! powers. The resulting [`SortedBook`] accepts no further bids; it only
//! answers queries and receives the award update after clearing. The
//! unsorted/sorted split encodes the book lifecycle in the type system.

use std::cmp::Ordering;
use std::marker::PhantomData;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use types::{Bid, BidSide, PriceBounds, TraderId};

use crate::error::{MarketCoreError, Result};

/// Trader id carried by the virtual tail bids appended at close.
pub const VIRTUAL_TRADER_ID: TraderId = TraderId(u64::MAX);

/// Method of distributing power across multiple price-setting bids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum DistributionMethod {
    /// Bids are awarded in the order they appear after sorting the book.
    #[default]
    FirstComeFirstServe,
    /// Bids with the same price are awarded in a random (seeded) order.
    Randomize,
    /// Bids with the same price are all awarded the same share.
    SameShares,
}

/// Marker for the two book orientations.
pub trait BookSide {
    /// Side of the bids this book accepts.
    const SIDE: BidSide;

    /// Price of the virtual zero-power tail bid.
    fn tail_price(bounds: &PriceBounds) -> f64;

    /// Sort order along the merit order (ascending for supply, descending
    /// for demand).
    fn compare_prices(a: f64, b: f64) -> Ordering;
}

/// Supply orientation: ascending prices, tail at the scarcity price.
#[derive(Debug, Clone, Copy)]
pub struct Supply;

/// Demand orientation: descending prices, tail at the negated scarcity price.
#[derive(Debug, Clone, Copy)]
pub struct Demand;

impl BookSide for Supply {
    const SIDE: BidSide = BidSide::Supply;

    fn tail_price(bounds: &PriceBounds) -> f64 {
        bounds.scarcity_price_in_eur_per_mwh
    }

    fn compare_prices(a: f64, b: f64) -> Ordering {
        a.total_cmp(&b)
    }
}

impl BookSide for Demand {
    const SIDE: BidSide = BidSide::Demand;

    fn tail_price(bounds: &PriceBounds) -> f64 {
        -bounds.scarcity_price_in_eur_per_mwh
    }

    fn compare_prices(a: f64, b: f64) -> Ordering {
        b.total_cmp(&a)
    }
}

/// A bid within a sorted book, carrying its merit-order position and award.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBookItem {
    pub bid: Bid,
    pub cumulated_lower_power: f64,
    pub cumulated_upper_power: f64,
    pub awarded_power: f64,
}

impl OrderBookItem {
    fn new(bid: Bid) -> Self {
        Self {
            bid,
            cumulated_lower_power: 0.0,
            cumulated_upper_power: 0.0,
            awarded_power: 0.0,
        }
    }

    /// The bid's block power.
    #[inline]
    pub fn block_power(&self) -> f64 {
        self.bid.energy_in_mwh
    }

    /// The bid's offer price.
    #[inline]
    pub fn price(&self) -> f64 {
        self.bid.price_in_eur_per_mwh
    }

    /// The bid's marginal cost.
    #[inline]
    pub fn marginal_cost(&self) -> f64 {
        self.bid.marginal_cost_in_eur_per_mwh
    }

    #[inline]
    pub fn trader_id(&self) -> TraderId {
        self.bid.trader_id
    }

    /// Power of this bid that was not awarded.
    #[inline]
    pub fn not_awarded_power(&self) -> f64 {
        self.block_power() - self.awarded_power
    }
}

/// An open, append-only book for one hour of trading.
#[derive(Debug, Clone)]
pub struct UnsortedBook<S: BookSide> {
    bids: Vec<Bid>,
    bounds: PriceBounds,
    _side: PhantomData<S>,
}

impl<S: BookSide> UnsortedBook<S> {
    /// Creates an empty book with the given legal price band.
    pub fn new(bounds: PriceBounds) -> Self {
        Self {
            bids: Vec::new(),
            bounds,
            _side: PhantomData,
        }
    }

    /// Adds a bid to the open book.
    ///
    /// Rejects bids of the wrong side and bids priced outside the legal band.
    pub fn push(&mut self, bid: Bid) -> Result<()> {
        if bid.side != S::SIDE {
            return Err(MarketCoreError::WrongSide { expected: S::SIDE });
        }
        if !self.bounds.contains(bid.price_in_eur_per_mwh) {
            return Err(MarketCoreError::PriceOutOfBounds {
                price_in_eur_per_mwh: bid.price_in_eur_per_mwh,
            });
        }
        self.bids.push(bid);
        Ok(())
    }

    /// Adds all bids of a bundle.
    pub fn push_all(&mut self, bids: impl IntoIterator<Item = Bid>) -> Result<()> {
        for bid in bids {
            self.push(bid)?;
        }
        Ok(())
    }

    /// Sum of all offered block powers.
    pub fn offered_power(&self) -> f64 {
        self.bids.iter().map(|bid| bid.energy_in_mwh).sum()
    }

    pub fn len(&self) -> usize {
        self.bids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bids.is_empty()
    }

    /// Closes the book: validates block powers, appends the virtual tail,
    /// sorts along the merit order and assigns cumulative powers.
    ///
    /// Rejects the whole book if any bid carries negative block power.
    pub fn close(self) -> Result<SortedBook<S>> {
        for bid in &self.bids {
            if bid.energy_in_mwh < 0.0 {
                return Err(MarketCoreError::negative_power(bid));
            }
        }
        let mut items: Vec<OrderBookItem> = self.bids.into_iter().map(OrderBookItem::new).collect();
        let tail = match S::SIDE {
            BidSide::Supply => Bid::supply(0.0, S::tail_price(&self.bounds), 0.0, VIRTUAL_TRADER_ID),
            BidSide::Demand => Bid::demand(0.0, S::tail_price(&self.bounds), 0.0, VIRTUAL_TRADER_ID),
        };
        items.push(OrderBookItem::new(tail));

        // Stable sort keeps arrival order among equally priced bids, which
        // FirstComeFirstServe distribution relies on.
        items.sort_by(|a, b| S::compare_prices(a.price(), b.price()));

        let mut cumulated = 0.0;
        for item in &mut items {
            item.cumulated_lower_power = cumulated;
            cumulated += item.block_power();
            item.cumulated_upper_power = cumulated;
        }

        Ok(SortedBook {
            items,
            awarded_price: f64::NAN,
            awarded_cumulative_power: f64::NAN,
            _side: PhantomData,
        })
    }
}

/// A closed book: sorted, cumulated, ready for clearing and award updates.
#[derive(Debug, Clone)]
pub struct SortedBook<S: BookSide> {
    items: Vec<OrderBookItem>,
    awarded_price: f64,
    awarded_cumulative_power: f64,
    _side: PhantomData<S>,
}

impl<S: BookSide> SortedBook<S> {
    /// Items in merit order, including the virtual tail.
    pub fn items(&self) -> &[OrderBookItem] {
        &self.items
    }

    /// Uniform price of the last award update; NaN before clearing.
    pub fn awarded_price(&self) -> f64 {
        self.awarded_price
    }

    /// Total awarded power of the last award update; NaN before clearing.
    pub fn awarded_cumulative_power(&self) -> f64 {
        self.awarded_cumulative_power
    }

    /// Sum of all block powers, excluding the virtual tail.
    pub fn offered_power(&self) -> f64 {
        self.items
            .iter()
            .filter(|item| item.trader_id() != VIRTUAL_TRADER_ID)
            .map(OrderBookItem::block_power)
            .sum()
    }

    /// Sum of awarded power across all bids of the given trader.
    pub fn traders_sum_of_power(&self, trader_id: TraderId) -> f64 {
        self.items
            .iter()
            .filter(|item| item.trader_id() == trader_id)
            .map(|item| item.awarded_power)
            .sum()
    }

    /// Sum of awarded power across all bids in the book.
    pub fn total_awarded_power(&self) -> f64 {
        self.items.iter().map(|item| item.awarded_power).sum()
    }

    /// Updates the awarded power of every item from the clearing outcome.
    ///
    /// Bids not sharing the clearing price are fully awarded when their
    /// cumulated power fits under `total_power` and zero otherwise. The
    /// residual is distributed across price-setting bids per `method`;
    /// price-setting bids without positive block power are dropped from the
    /// distribution and awarded zero.
    pub fn update_awarded_power(
        &mut self,
        total_power: f64,
        price: f64,
        method: DistributionMethod,
        rng: &mut StdRng,
    ) {
        self.awarded_price = price;
        self.awarded_cumulative_power = total_power;

        let mut price_setting: Vec<usize> = Vec::new();
        for (index, item) in self.items.iter_mut().enumerate() {
            if item.price() == price {
                item.awarded_power = 0.0;
                if item.block_power() > 0.0 {
                    price_setting.push(index);
                }
            } else if item.cumulated_upper_power <= total_power {
                item.awarded_power = item.block_power();
            } else {
                item.awarded_power = 0.0;
            }
        }
        if price_setting.is_empty() {
            return;
        }

        let lowest_cumulated = price_setting
            .iter()
            .map(|&index| self.items[index].cumulated_lower_power)
            .fold(f64::INFINITY, f64::min);
        let available_power = total_power - lowest_cumulated;

        match method {
            DistributionMethod::FirstComeFirstServe => {
                self.award_first_come_first_serve(&price_setting, available_power);
            }
            DistributionMethod::SameShares => {
                let offered: f64 = price_setting
                    .iter()
                    .map(|&index| self.items[index].block_power())
                    .sum();
                let share = available_power / offered;
                for &index in &price_setting {
                    let item = &mut self.items[index];
                    item.awarded_power = item.block_power() * share;
                }
            }
            DistributionMethod::Randomize => {
                price_setting.shuffle(rng);
                self.award_first_come_first_serve(&price_setting, available_power);
            }
        }
    }

    fn award_first_come_first_serve(&mut self, price_setting: &[usize], mut available_power: f64) {
        for &index in price_setting {
            let item = &mut self.items[index];
            let awarded = item.block_power().min(available_power);
            item.awarded_power = awarded;
            available_power -= awarded;
        }
    }
}

/// Demand that is not sheddable, i.e. bid at or above the scarcity price.
impl SortedBook<Demand> {
    pub fn unsheddable_demand(&self, bounds: &PriceBounds) -> f64 {
        self.items
            .iter()
            .filter(|item| {
                item.trader_id() != VIRTUAL_TRADER_ID
                    && item.price() >= bounds.scarcity_price_in_eur_per_mwh
            })
            .map(OrderBookItem::block_power)
            .sum()
    }
}
