//! Route filtering.
//!
//! Walks the aggregator's ranked candidates best-first and keeps the first
//! route whose every hop charges no more than the fee ceiling.

use rust_decimal::Decimal;
use tracing::debug;

use crate::types::Route;

#[derive(Debug, Clone)]
pub struct RouteFilter {
    max_fee_pct: Decimal,
    /// Optional price-impact ceiling. Off unless configured.
    max_price_impact_pct: Option<Decimal>,
}

impl RouteFilter {
    pub fn new(max_fee_pct: Decimal) -> Self {
        Self {
            max_fee_pct,
            max_price_impact_pct: None,
        }
    }

    pub fn with_price_impact_ceiling(mut self, max_price_impact_pct: Option<Decimal>) -> Self {
        self.max_price_impact_pct = max_price_impact_pct;
        self
    }

    /// Whether a single route passes the policy.
    pub fn accepts(&self, route: &Route) -> bool {
        if route.hops.iter().any(|h| h.fee_pct > self.max_fee_pct) {
            return false;
        }
        match self.max_price_impact_pct {
            Some(ceiling) => route.price_impact_pct.abs() <= ceiling,
            None => true,
        }
    }

    /// First acceptable route in rank order, or `None` if every candidate
    /// is rejected.
    pub fn select(&self, routes: Vec<Route>) -> Option<Route> {
        routes.into_iter().enumerate().find_map(|(rank, route)| {
            if self.accepts(&route) {
                Some(route)
            } else {
                debug!(
                    rank,
                    route = %route.labels(),
                    max_hop_fee = %route.max_hop_fee_pct(),
                    price_impact = %route.price_impact_pct,
                    "Skipping route: platform fee or price impact too high"
                );
                None
            }
        })
    }
}
