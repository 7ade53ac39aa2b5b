//! Per-token prices for the models we know about (USD).

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// (input, output) cost per token for a model, or `None` if unknown.
pub fn model_cost(model: &str) -> Option<(Decimal, Decimal)> {
    let per_million = match model {
        m if m.starts_with("gpt-4o-mini") => (dec!(0.15), dec!(0.60)),
        m if m.starts_with("gpt-4o") => (dec!(2.50), dec!(10.00)),
        m if m.starts_with("gpt-4.1-mini") => (dec!(0.40), dec!(1.60)),
        m if m.starts_with("claude-3-5-haiku") => (dec!(0.80), dec!(4.00)),
        m if m.starts_with("claude-sonnet-4") || m.starts_with("claude-3-5-sonnet") => {
            (dec!(3.00), dec!(15.00))
        }
        _ => return None,
    };
    let million = dec!(1_000_000);
    Some((per_million.0 / million, per_million.1 / million))
}

/// Cost of a call given token counts and a price pair.
pub fn call_cost(prices: (Decimal, Decimal), input_tokens: u32, output_tokens: u32) -> Decimal {
    prices.0 * Decimal::from(input_tokens) + prices.1 * Decimal::from(output_tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mini_is_cheaper_than_full() {
        let (mini_in, _) = model_cost("gpt-4o-mini").unwrap();
        let (full_in, _) = model_cost("gpt-4o").unwrap();
        assert!(mini_in < full_in);
    }

    #[test]
    fn unknown_model_has_no_price() {
        assert!(model_cost("some-local-model").is_none());
    }

    #[test]
    fn call_cost_sums_both_directions() {
        let prices = (dec!(0.000001), dec!(0.000002));
        assert_eq!(call_cost(prices, 1000, 500), dec!(0.002));
    }
}
