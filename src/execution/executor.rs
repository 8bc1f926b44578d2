use rust_decimal::Decimal;
use uuid::Uuid;

use crate::api::Brokerage;
use crate::models::{
    Bracket, OrderAck, OrderClass, OrderRequest, OrderType, Signal, TimeInForce,
};
use crate::risk::RiskParams;
use crate::{BotError, Result};

#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionAction {
    Submit(OrderRequest),
    Skip,
}

#[derive(Debug, Clone)]
pub struct ExecutionDecision {
    pub action: ExecutionAction,
    pub reason: String,
}

/// Turns a signal into a sized, bracketed market order
///
/// Holds no state between calls; every decision reads buying power fresh.
pub struct OrderComposer {
    symbol: String,
    params: RiskParams,
}

impl OrderComposer {
    pub fn new(symbol: impl Into<String>, params: RiskParams) -> Self {
        Self {
            symbol: symbol.into(),
            params,
        }
    }

    /// Decide what to submit for `signal` at `current_price` given `buying_power`
    pub fn compose(
        &self,
        signal: Signal,
        current_price: Decimal,
        buying_power: Decimal,
    ) -> Result<ExecutionDecision> {
        let Some(side) = signal.side() else {
            return Ok(ExecutionDecision {
                action: ExecutionAction::Skip,
                reason: "Hold signal".to_string(),
            });
        };

        let quantity = self.calculate_position_size(current_price, buying_power)?;
        let bracket = Bracket::for_side(side, current_price, &self.params)?;

        let order = OrderRequest {
            client_order_id: Uuid::new_v4(),
            symbol: self.symbol.clone(),
            side,
            quantity,
            order_type: OrderType::Market,
            time_in_force: TimeInForce::Gtc,
            order_class: OrderClass::Bracket,
            bracket,
        };

        Ok(ExecutionDecision {
            action: ExecutionAction::Submit(order),
            reason: format!(
                "{:?} signal, {} of {} buying power",
                signal,
                self.params.position_size_fraction,
                buying_power
            ),
        })
    }

    /// quantity = (buying_power * position_size_fraction) / current_price
    fn calculate_position_size(
        &self,
        current_price: Decimal,
        buying_power: Decimal,
    ) -> Result<Decimal> {
        if current_price <= Decimal::ZERO {
            return Err(BotError::invalid_data(format!(
                "current price must be positive, got {}",
                current_price
            )));
        }
        if buying_power <= Decimal::ZERO {
            return Err(BotError::invalid_data(format!(
                "buying power must be positive, got {}",
                buying_power
            )));
        }

        let trade_value = buying_power
            .checked_mul(self.params.position_size_fraction)
            .ok_or_else(|| BotError::invalid_data("trade value overflows"))?;

        trade_value
            .checked_div(current_price)
            .ok_or_else(|| BotError::invalid_data("order quantity overflows"))
    }

    /// Size and submit one order for a non-Hold signal
    ///
    /// Returns `Ok(None)` for Hold without touching the brokerage. Account and
    /// submission failures are returned as-is; nothing is retried here.
    pub async fn execute<B>(
        &self,
        brokerage: &B,
        signal: Signal,
        current_price: Decimal,
    ) -> Result<Option<OrderAck>>
    where
        B: Brokerage + ?Sized,
    {
        if signal == Signal::Hold {
            return Ok(None);
        }

        // Fail before the account round trip when the price alone rules the order out
        if current_price <= Decimal::ZERO {
            return Err(BotError::invalid_data(format!(
                "current price must be positive, got {}",
                current_price
            )));
        }

        let account = brokerage.account().await?;
        let decision = self.compose(signal, current_price, account.buying_power)?;

        let ExecutionAction::Submit(order) = decision.action else {
            return Ok(None);
        };

        tracing::debug!(reason = %decision.reason, client_order_id = %order.client_order_id, "Submitting order");
        let ack = brokerage.submit_order(&order).await?;

        tracing::info!(
            order_id = %ack.id,
            status = %ack.status,
            side = ?order.side,
            qty = %order.quantity,
            take_profit = %order.bracket.take_profit_limit_price,
            stop_loss = %order.bracket.stop_loss_stop_price,
            "Bracket order accepted"
        );

        Ok(Some(ack))
    }
}
