use rust_decimal::Decimal;

use crate::models::{Bracket, OrderSide};
use crate::{BotError, Result};

/// Position sizing and bracket distances, fixed at deploy time
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskParams {
    /// Fraction of buying power committed per order (0.01 = 1%)
    pub position_size_fraction: Decimal,
    /// Take-profit distance from entry, in percent
    pub take_profit_percent: Decimal,
    /// Stop-loss distance from entry, in percent
    pub stop_loss_percent: Decimal,
}

impl Default for RiskParams {
    fn default() -> Self {
        Self {
            position_size_fraction: Decimal::new(1, 2), // 1% of buying power
            take_profit_percent: Decimal::ONE,          // +1.0%
            stop_loss_percent: Decimal::new(5, 1),      // -0.5%
        }
    }
}

impl RiskParams {
    /// Reject parameters that would break the bracket ordering or size orders
    /// beyond the account
    pub fn validate(&self) -> Result<()> {
        if self.position_size_fraction <= Decimal::ZERO || self.position_size_fraction > Decimal::ONE
        {
            return Err(BotError::Config(format!(
                "position_size must be in (0, 1], got {}",
                self.position_size_fraction
            )));
        }

        // A Sell take-profit of 100% or more lands at or below zero
        if self.take_profit_percent <= Decimal::ZERO
            || self.take_profit_percent >= Decimal::ONE_HUNDRED
        {
            return Err(BotError::Config(format!(
                "take_profit_percent must be in (0, 100), got {}",
                self.take_profit_percent
            )));
        }

        if self.stop_loss_percent <= Decimal::ZERO
            || self.stop_loss_percent >= Decimal::ONE_HUNDRED
        {
            return Err(BotError::Config(format!(
                "stop_loss_percent must be in (0, 100), got {}",
                self.stop_loss_percent
            )));
        }

        Ok(())
    }
}

impl Bracket {
    /// Take-profit and stop-loss prices around `entry`, mirrored by side
    ///
    /// Buy:  take_profit = entry * (1 + tp%), stop_loss = entry * (1 - sl%)
    /// Sell: take_profit = entry * (1 - tp%), stop_loss = entry * (1 + sl%)
    pub fn for_side(side: OrderSide, entry: Decimal, params: &RiskParams) -> Result<Self> {
        let take_profit_offset = params.take_profit_percent / Decimal::ONE_HUNDRED;
        let stop_loss_offset = params.stop_loss_percent / Decimal::ONE_HUNDRED;

        let (take_profit_factor, stop_loss_factor) = match side {
            OrderSide::Buy => (
                Decimal::ONE + take_profit_offset,
                Decimal::ONE - stop_loss_offset,
            ),
            OrderSide::Sell => (
                Decimal::ONE - take_profit_offset,
                Decimal::ONE + stop_loss_offset,
            ),
        };

        let overflow =
            || BotError::invalid_data(format!("bracket prices overflow at entry {}", entry));

        Ok(Self {
            take_profit_limit_price: entry.checked_mul(take_profit_factor).ok_or_else(overflow)?,
            stop_loss_stop_price: entry.checked_mul(stop_loss_factor).ok_or_else(overflow)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_buy_bracket() {
        let bracket = Bracket::for_side(OrderSide::Buy, dec("100"), &RiskParams::default()).unwrap();

        assert_eq!(bracket.take_profit_limit_price, dec("101.0"));
        assert_eq!(bracket.stop_loss_stop_price, dec("99.5"));
    }

    #[test]
    fn test_sell_bracket_is_mirrored() {
        let bracket = Bracket::for_side(OrderSide::Sell, dec("100"), &RiskParams::default()).unwrap();

        assert_eq!(bracket.take_profit_limit_price, dec("99.0"));
        assert_eq!(bracket.stop_loss_stop_price, dec("100.5"));
    }

    #[test]
    fn test_bracket_ordering_across_prices() {
        let params = RiskParams::default();

        for entry in ["0.0001", "1", "99.99", "64250.75", "1000000"] {
            let entry = dec(entry);

            let buy = Bracket::for_side(OrderSide::Buy, entry, &params).unwrap();
            assert!(buy.take_profit_limit_price > entry);
            assert!(entry > buy.stop_loss_stop_price);

            let sell = Bracket::for_side(OrderSide::Sell, entry, &params).unwrap();
            assert!(sell.take_profit_limit_price < entry);
            assert!(entry < sell.stop_loss_stop_price);
        }
    }

    #[test]
    fn test_bracket_overflow_is_data_error() {
        let err = Bracket::for_side(OrderSide::Sell, Decimal::MAX, &RiskParams::default())
            .unwrap_err();
        assert!(matches!(err, BotError::InvalidData(_)));

        assert!(Bracket::for_side(OrderSide::Buy, Decimal::MAX, &RiskParams::default()).is_err());
    }

    #[test]
    fn test_default_params_are_valid() {
        assert!(RiskParams::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_out_of_range_params() {
        let oversized = RiskParams {
            position_size_fraction: dec("1.5"),
            ..Default::default()
        };
        assert!(matches!(oversized.validate(), Err(BotError::Config(_))));

        let zero_stop = RiskParams {
            stop_loss_percent: Decimal::ZERO,
            ..Default::default()
        };
        assert!(zero_stop.validate().is_err());

        let full_take_profit = RiskParams {
            take_profit_percent: dec("100"),
            ..Default::default()
        };
        assert!(full_take_profit.validate().is_err());
    }
}
