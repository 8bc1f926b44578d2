use rust_decimal::Decimal;

use crate::models::Signal;

/// Relative divergence of the reference price from the quoted price
///
/// Returns `None` when the quote is zero or negative, or when the ratio does
/// not fit in a `Decimal`.
///
/// # Example
/// ```
/// use rust_decimal::Decimal;
/// use spreadbot::strategy::divergence;
///
/// let d = divergence(Decimal::from(101), Decimal::from(100)).unwrap();
/// assert_eq!(d, Decimal::new(1, 2)); // 0.01
/// ```
pub fn divergence(reference_price: Decimal, quoted_price: Decimal) -> Option<Decimal> {
    if quoted_price <= Decimal::ZERO {
        return None;
    }
    reference_price
        .checked_sub(quoted_price)?
        .checked_div(quoted_price)
}

/// Classify the gap between the feed's reference price and the brokerage quote
///
/// Acts only when `|divergence| > confidence_interval`; a reference price above
/// the quote means the market is expected to rise (Buy), below means Sell.
/// Landing exactly on the band holds.
///
/// Inputs that cannot be traded on (a non-positive quote or a negative
/// confidence band) are reported and yield Hold.
pub fn generate_signal(
    reference_price: Decimal,
    confidence_interval: Decimal,
    quoted_price: Decimal,
) -> Signal {
    if confidence_interval < Decimal::ZERO {
        tracing::warn!(
            confidence_interval = %confidence_interval,
            "Negative confidence interval from feed, holding"
        );
        return Signal::Hold;
    }

    if quoted_price <= Decimal::ZERO {
        tracing::warn!(
            quoted_price = %quoted_price,
            "Non-positive quoted price, holding"
        );
        return Signal::Hold;
    }

    let Some(d) = divergence(reference_price, quoted_price) else {
        tracing::warn!(
            reference_price = %reference_price,
            quoted_price = %quoted_price,
            "Divergence out of range, holding"
        );
        return Signal::Hold;
    };

    if d.abs() > confidence_interval {
        if d > Decimal::ZERO {
            Signal::Buy
        } else {
            Signal::Sell
        }
    } else {
        Signal::Hold
    }
}
