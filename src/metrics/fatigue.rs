use rust_decimal::Decimal;

use super::round2;

/// Fatigue-Injury Index: intensity × NASA-TLX overall score × region weight.
///
/// `None` when intensity or the workload score is missing, or when the
/// region carries no weight, or when the product does not fit in a `Decimal`.
/// The index is unbounded and only meaningful for comparing complaints
/// against each other.
pub fn fatigue_injury_index(
    intensity: Option<u8>,
    nasa_tlx_score: Option<Decimal>,
    region_weight: u8,
) -> Option<Decimal> {
    if region_weight == 0 {
        return None;
    }
    let intensity = intensity?;
    let score = nasa_tlx_score?;

    Decimal::from(intensity)
        .checked_mul(score)?
        .checked_mul(Decimal::from(region_weight))
        .map(round2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_index_formula() {
        assert_eq!(
            fatigue_injury_index(Some(8), Some(dec!(75)), 3),
            Some(dec!(1800.00))
        );
        assert_eq!(
            fatigue_injury_index(Some(3), Some(dec!(41.667)), 2),
            Some(dec!(250.00))
        );
    }

    #[test]
    fn test_index_missing_factors() {
        assert_eq!(fatigue_injury_index(Some(8), Some(dec!(75)), 0), None);
        assert_eq!(fatigue_injury_index(Some(8), None, 3), None);
        assert_eq!(fatigue_injury_index(None, Some(dec!(75)), 3), None);
    }

    #[test]
    fn test_zero_intensity_still_produces_an_index() {
        assert_eq!(
            fatigue_injury_index(Some(0), Some(dec!(60)), 2),
            Some(Decimal::ZERO)
        );
    }

    #[test]
    fn test_overflowing_score_degrades_to_none() {
        assert_eq!(fatigue_injury_index(Some(10), Some(Decimal::MAX), 3), None);
        assert_eq!(fatigue_injury_index(Some(1), Some(Decimal::MAX), 2), None);
        assert_eq!(
            fatigue_injury_index(Some(1), Some(Decimal::MAX), 1),
            Some(round2(Decimal::MAX))
        );
    }
}
