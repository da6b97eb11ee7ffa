//! Derived health metrics
//!
//! Pure functions over a joined complaint row: BMI, IPAQ activity level and
//! the Fatigue-Injury Index. Nothing here touches storage, and missing input
//! always yields a null or sentinel result instead of an error.

pub mod bmi;
pub mod fatigue;
pub mod ipaq;
pub mod region;
pub mod workload;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

pub use bmi::{calculate_bmi, BmiClassification, BmiResult};
pub use fatigue::fatigue_injury_index;
pub use ipaq::{classify_ipaq, IpaqClassification, IpaqResponse, MetBreakdown};
pub use region::region_weight;
pub use workload::raw_tlx_score;

/// Round half away from zero to two decimals
pub(crate) fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Everything the engine reads from one complaint and its pilot
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsInput {
    pub weight_kg: Option<Decimal>,
    pub height_m: Option<Decimal>,
    pub intensity: Option<u8>,
    pub location: String,
    pub ipaq: IpaqResponse,
    pub nasa_tlx_score: Option<Decimal>,
}

/// Engine output, merged by callers into their response payloads
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedMetrics {
    /// Two-decimal display value; `bmi_classification` uses the exact quotient
    #[serde(with = "rust_decimal::serde::float_option")]
    pub bmi: Option<Decimal>,
    pub bmi_classification: BmiClassification,
    pub ipaq_classification: IpaqClassification,
    pub region_weight: u8,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub fatigue_injury_index: Option<Decimal>,
}

/// Stateless entry point shared by every request that shows derived metrics
pub struct MetricsEngine;

impl MetricsEngine {
    pub fn evaluate(input: &MetricsInput) -> DerivedMetrics {
        let bmi = calculate_bmi(input.weight_kg, input.height_m);
        let weight = region_weight(&input.location);

        DerivedMetrics {
            bmi: bmi.bmi,
            bmi_classification: bmi.classification,
            ipaq_classification: classify_ipaq(&input.ipaq),
            region_weight: weight,
            fatigue_injury_index: fatigue_injury_index(
                input.intensity,
                input.nasa_tlx_score,
                weight,
            ),
        }
    }
}
