//! Quote service.
//!
//! Wraps the routing capability: converts the input amount to atomic units,
//! asks for fresh routes, applies the route filter and reports the chosen
//! route's output in human units. Every failure comes back as a
//! [`QuoteError`]; the caller treats all of them as "no quote this cycle".

use rust_decimal::Decimal;
use tracing::{debug, info};

use super::filter::RouteFilter;
use crate::routing::{RouteProvider, RouteRequest};
use crate::types::{Quote, QuoteError, Token};
use crate::units::{from_atomic, to_atomic};

pub struct QuoteService {
    provider: Box<dyn RouteProvider>,
    filter: RouteFilter,
}

impl QuoteService {
    pub fn new(provider: Box<dyn RouteProvider>, filter: RouteFilter) -> Self {
        Self { provider, filter }
    }

    /// Best acceptable route for `amount` (human units) of `input` into
    /// `output`.
    pub async fn get_quote(
        &self,
        input: Option<&Token>,
        output: Option<&Token>,
        amount: Decimal,
        slippage_bps: u16,
    ) -> Result<Quote, QuoteError> {
        let (input, output) = match (input, output) {
            (Some(i), Some(o)) => (i, o),
            _ => return Err(QuoteError::MissingToken),
        };

        info!(
            amount = %amount,
            from = %input.symbol,
            to = %output.symbol,
            "Getting routes"
        );

        let request = RouteRequest {
            input_mint: input.address.clone(),
            output_mint: output.address.clone(),
            amount: to_atomic(amount, input.decimals),
            slippage_bps,
            force_fetch: true,
        };

        let routes = self
            .provider
            .compute_routes(&request)
            .await
            .map_err(|e| QuoteError::Routing(format!("{e:#}")))?;

        let candidates = routes.len();
        debug!(provider = self.provider.name(), candidates, "Possible number of routes");
        if candidates == 0 {
            return Err(QuoteError::NoRoutes);
        }

        let route = self
            .filter
            .select(routes)
            .ok_or(QuoteError::AllRoutesFiltered { candidates })?;

        if route.out_amount == 0 {
            return Err(QuoteError::ZeroOutput);
        }

        let output_amount = from_atomic(route.out_amount, output.decimals);
        info!(
            candidates,
            out = %output_amount,
            symbol = %output.symbol,
            route = %route.labels(),
            "Best quote"
        );

        Ok(Quote {
            input_amount: amount,
            output_amount,
            route,
        })
    }
}
