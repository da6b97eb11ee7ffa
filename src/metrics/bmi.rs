use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::round2;

/// BMI buckets, labelled the way the dashboards show them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BmiClassification {
    #[serde(rename = "Abaixo do peso")]
    Underweight,
    #[serde(rename = "Peso Normal")]
    Normal,
    #[serde(rename = "Sobrepeso")]
    Overweight,
    #[serde(rename = "Obesidade Grau I")]
    ObesityClass1,
    #[serde(rename = "Obesidade Grau II")]
    ObesityClass2,
    #[serde(rename = "Obesidade Grau III")]
    ObesityClass3,
    #[serde(rename = "Dados insuficientes")]
    InsufficientData,
}

impl BmiClassification {
    pub fn label(&self) -> &'static str {
        match self {
            BmiClassification::Underweight => "Abaixo do peso",
            BmiClassification::Normal => "Peso Normal",
            BmiClassification::Overweight => "Sobrepeso",
            BmiClassification::ObesityClass1 => "Obesidade Grau I",
            BmiClassification::ObesityClass2 => "Obesidade Grau II",
            BmiClassification::ObesityClass3 => "Obesidade Grau III",
            BmiClassification::InsufficientData => "Dados insuficientes",
        }
    }

    /// Bucket for a BMI value; lower bounds are inclusive
    pub fn from_bmi(bmi: Decimal) -> Self {
        if bmi < dec!(18.5) {
            BmiClassification::Underweight
        } else if bmi < dec!(25) {
            BmiClassification::Normal
        } else if bmi < dec!(30) {
            BmiClassification::Overweight
        } else if bmi < dec!(35) {
            BmiClassification::ObesityClass1
        } else if bmi < dec!(40) {
            BmiClassification::ObesityClass2
        } else {
            BmiClassification::ObesityClass3
        }
    }
}

/// BMI value (2 dp) and its bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BmiResult {
    /// Rounded for display only. Near a threshold it can land on the
    /// boundary while `classification` still reflects the unrounded value,
    /// e.g. 59.93 kg at 1.80 m reads 18.50 and stays "Abaixo do peso".
    pub bmi: Option<Decimal>,
    pub classification: BmiClassification,
}

impl BmiResult {
    pub const INSUFFICIENT: BmiResult = BmiResult {
        bmi: None,
        classification: BmiClassification::InsufficientData,
    };
}

/// Body Mass Index from weight (kg) and height (m).
///
/// The bucket is chosen from the exact quotient, the reported value is
/// rounded to two decimals. Non-positive inputs count as missing.
pub fn calculate_bmi(weight_kg: Option<Decimal>, height_m: Option<Decimal>) -> BmiResult {
    let (weight, height) = match (weight_kg, height_m) {
        (Some(w), Some(h)) if w > Decimal::ZERO && h > Decimal::ZERO => (w, h),
        _ => return BmiResult::INSUFFICIENT,
    };

    let height_squared = match height.checked_mul(height) {
        Some(sq) if sq > Decimal::ZERO => sq,
        // height so small that its square underflows to zero
        _ => return BmiResult::INSUFFICIENT,
    };

    match weight.checked_div(height_squared) {
        Some(bmi) => BmiResult {
            bmi: Some(round2(bmi)),
            classification: BmiClassification::from_bmi(bmi),
        },
        None => BmiResult::INSUFFICIENT,
    }
}
