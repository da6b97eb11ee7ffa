use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::models::IpaqAnswers;

/// MET weights per IPAQ intensity tier
const VIGOROUS_MET: Decimal = dec!(8.0);
const MODERATE_MET: Decimal = dec!(4.0);
const WALKING_MET: Decimal = dec!(3.3);

/// IPAQ activity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IpaqClassification {
    #[serde(rename = "Muito Ativo")]
    VeryActive,
    #[serde(rename = "Ativo")]
    Active,
    #[serde(rename = "Insuficientemente Ativo")]
    InsufficientlyActive,
    #[serde(rename = "Não informado")]
    NotInformed,
}

impl IpaqClassification {
    pub fn label(&self) -> &'static str {
        match self {
            IpaqClassification::VeryActive => "Muito Ativo",
            IpaqClassification::Active => "Ativo",
            IpaqClassification::InsufficientlyActive => "Insuficientemente Ativo",
            IpaqClassification::NotInformed => "Não informado",
        }
    }
}

/// Whether a questionnaire exists at all, kept apart from an all-zero one
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IpaqResponse {
    NotSubmitted,
    Submitted(IpaqAnswers),
}

impl IpaqResponse {
    /// Build from flat joined columns, where a missing moderate-days answer
    /// means no questionnaire was filled in.
    pub fn from_joined(answers: IpaqAnswers) -> Self {
        if answers.moderate_activity_days.is_none() {
            IpaqResponse::NotSubmitted
        } else {
            IpaqResponse::Submitted(answers)
        }
    }

    pub fn answers(&self) -> Option<&IpaqAnswers> {
        match self {
            IpaqResponse::NotSubmitted => None,
            IpaqResponse::Submitted(answers) => Some(answers),
        }
    }
}

impl From<Option<IpaqAnswers>> for IpaqResponse {
    fn from(answers: Option<IpaqAnswers>) -> Self {
        match answers {
            Some(answers) => IpaqResponse::Submitted(answers),
            None => IpaqResponse::NotSubmitted,
        }
    }
}

/// MET-minutes per tier for one week of answers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetBreakdown {
    #[serde(with = "rust_decimal::serde::float")]
    pub vigorous_met: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub moderate_met: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub walking_met: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_met: Decimal,
    pub total_days: u32,
}

impl MetBreakdown {
    /// Missing answers count as zero
    pub fn from_answers(answers: &IpaqAnswers) -> Self {
        let vd = answers.vigorous_activity_days.unwrap_or(0);
        let md = answers.moderate_activity_days.unwrap_or(0);
        let wd = answers.walking_days.unwrap_or(0);

        let vigorous_met = tier_met(VIGOROUS_MET, vd, answers.vigorous_activity_minutes);
        let moderate_met = tier_met(MODERATE_MET, md, answers.moderate_activity_minutes);
        let walking_met = tier_met(WALKING_MET, wd, answers.walking_minutes);

        Self {
            vigorous_met,
            moderate_met,
            walking_met,
            total_met: vigorous_met + moderate_met + walking_met,
            total_days: u32::from(vd) + u32::from(md) + u32::from(wd),
        }
    }
}

fn tier_met(weight: Decimal, days: u8, minutes: Option<u32>) -> Decimal {
    weight * Decimal::from(days) * Decimal::from(minutes.unwrap_or(0))
}

/// Classify a questionnaire. Rules are checked in order, first match wins:
///
/// 1. Muito Ativo: (vigorous days >= 3 and total >= 1500 MET-min) or
///    (total days >= 7 and total >= 3000 MET-min)
/// 2. Ativo: vigorous days >= 3, moderate days >= 5, or
///    (total days >= 5 and vigorous + moderate >= 600 MET-min)
/// 3. Insuficientemente Ativo
pub fn classify_ipaq(response: &IpaqResponse) -> IpaqClassification {
    let answers = match response {
        IpaqResponse::NotSubmitted => return IpaqClassification::NotInformed,
        IpaqResponse::Submitted(answers) => answers,
    };

    let vigorous_days = answers.vigorous_activity_days.unwrap_or(0);
    let moderate_days = answers.moderate_activity_days.unwrap_or(0);
    let met = MetBreakdown::from_answers(answers);

    if (vigorous_days >= 3 && met.total_met >= dec!(1500))
        || (met.total_days >= 7 && met.total_met >= dec!(3000))
    {
        IpaqClassification::VeryActive
    } else if vigorous_days >= 3
        || moderate_days >= 5
        || (met.total_days >= 5 && met.vigorous_met + met.moderate_met >= dec!(600))
    {
        IpaqClassification::Active
    } else {
        IpaqClassification::InsufficientlyActive
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answers(vd: u8, vm: u32, md: u8, mm: u32, wd: u8, wm: u32) -> IpaqResponse {
        IpaqResponse::Submitted(IpaqAnswers {
            vigorous_activity_days: Some(vd),
            vigorous_activity_minutes: Some(vm),
            moderate_activity_days: Some(md),
            moderate_activity_minutes: Some(mm),
            walking_days: Some(wd),
            walking_minutes: Some(wm),
            sitting_minutes: None,
        })
    }

    #[test]
    fn test_not_submitted_is_not_informed() {
        assert_eq!(
            classify_ipaq(&IpaqResponse::NotSubmitted),
            IpaqClassification::NotInformed
        );

        let joined = IpaqResponse::from_joined(IpaqAnswers {
            vigorous_activity_days: Some(7),
            vigorous_activity_minutes: Some(120),
            moderate_activity_days: None,
            ..Default::default()
        });
        assert_eq!(classify_ipaq(&joined), IpaqClassification::NotInformed);
    }

    #[test]
    fn test_vigorous_below_met_threshold_is_active() {
        // 8 * 3 * 60 = 1440 < 1500 and only 3 days in total
        let response = answers(3, 60, 0, 0, 0, 0);
        assert_eq!(classify_ipaq(&response), IpaqClassification::Active);
    }

    #[test]
    fn test_vigorous_above_met_threshold_is_very_active() {
        // 8 * 3 * 80 = 1920
        let response = answers(3, 80, 0, 0, 0, 0);
        assert_eq!(classify_ipaq(&response), IpaqClassification::VeryActive);
    }

    #[test]
    fn test_seven_days_high_volume_is_very_active() {
        // 4*3*100 + 3.3*4*150 = 1200 + 1980 = 3180, 7 days, no vigorous
        let response = answers(0, 0, 3, 100, 4, 150);
        assert_eq!(classify_ipaq(&response), IpaqClassification::VeryActive);
    }

    #[test]
    fn test_moderate_five_days_is_active() {
        let response = answers(0, 0, 5, 10, 0, 0);
        assert_eq!(classify_ipaq(&response), IpaqClassification::Active);
    }

    #[test]
    fn test_combined_days_with_enough_vigorous_moderate_met() {
        // 5 days total, 8*2*20 + 4*3*25 = 320 + 300 = 620
        let response = answers(2, 20, 3, 25, 0, 0);
        assert_eq!(classify_ipaq(&response), IpaqClassification::Active);

        // walking does not count toward the 600 threshold
        let response = answers(1, 10, 1, 10, 3, 300);
        assert_eq!(classify_ipaq(&response), IpaqClassification::InsufficientlyActive);
    }

    #[test]
    fn test_all_zero_submission_is_insufficiently_active() {
        let response = answers(0, 0, 0, 0, 0, 0);
        assert_eq!(
            classify_ipaq(&response),
            IpaqClassification::InsufficientlyActive
        );
    }

    #[test]
    fn test_missing_minutes_default_to_zero() {
        let response = IpaqResponse::Submitted(IpaqAnswers {
            vigorous_activity_days: Some(4),
            moderate_activity_days: Some(0),
            ..Default::default()
        });
        let met = MetBreakdown::from_answers(response.answers().unwrap());
        assert_eq!(met.total_met, Decimal::ZERO);
        assert_eq!(met.total_days, 4);
        // vigorous days alone still reach the Ativo tier
        assert_eq!(classify_ipaq(&response), IpaqClassification::Active);
    }

    #[test]
    fn test_met_breakdown() {
        let response = answers(2, 30, 3, 40, 5, 20);
        let met = MetBreakdown::from_answers(response.answers().unwrap());
        assert_eq!(met.vigorous_met, dec!(480));
        assert_eq!(met.moderate_met, dec!(480));
        assert_eq!(met.walking_met, dec!(330));
        assert_eq!(met.total_met, dec!(1290));
        assert_eq!(met.total_days, 10);
    }
}
