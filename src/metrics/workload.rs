use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::round2;
use crate::error::{PilotHealthError, Result};
use crate::models::NasaTlxRatings;

/// Raw (unweighted) NASA-TLX overall score: mean of the six subscales,
/// rounded to two decimals. Every subscale must lie in 0–100.
pub fn raw_tlx_score(ratings: &NasaTlxRatings) -> Result<Decimal> {
    let subscales = [
        ("mental_demand", ratings.mental_demand),
        ("physical_demand", ratings.physical_demand),
        ("temporal_demand", ratings.temporal_demand),
        ("performance", ratings.performance),
        ("effort", ratings.effort),
        ("frustration", ratings.frustration),
    ];

    let mut total = Decimal::ZERO;
    for (name, value) in subscales {
        if value < Decimal::ZERO || value > dec!(100) {
            return Err(PilotHealthError::Validation(format!(
                "NASA-TLX {} deve estar entre 0 e 100 (recebido {})",
                name, value
            )));
        }
        total += value;
    }

    Ok(round2(total / Decimal::from(subscales.len())))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ratings(values: [Decimal; 6]) -> NasaTlxRatings {
        NasaTlxRatings {
            mental_demand: values[0],
            physical_demand: values[1],
            temporal_demand: values[2],
            performance: values[3],
            effort: values[4],
            frustration: values[5],
        }
    }

    #[test]
    fn test_raw_tlx_is_mean() {
        let r = ratings([dec!(80), dec!(70), dec!(75), dec!(60), dec!(90), dec!(75)]);
        assert_eq!(raw_tlx_score(&r).unwrap(), dec!(75));

        let r = ratings([dec!(10), dec!(20), dec!(20), dec!(20), dec!(20), dec!(10)]);
        assert_eq!(raw_tlx_score(&r).unwrap(), dec!(16.67));
    }

    #[test]
    fn test_out_of_range_subscale_rejected() {
        let r = ratings([dec!(101), dec!(0), dec!(0), dec!(0), dec!(0), dec!(0)]);
        assert!(matches!(raw_tlx_score(&r), Err(PilotHealthError::Validation(_))));

        let r = ratings([dec!(0), dec!(0), dec!(0), dec!(0), dec!(0), dec!(-1)]);
        assert!(raw_tlx_score(&r).is_err());
    }
}
