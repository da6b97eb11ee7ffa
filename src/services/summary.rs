use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use super::{derive_metrics, HealthService};
use crate::database::{ComplaintFilters, JoinedComplaint};
use crate::error::Result;
use crate::metrics::{calculate_bmi, BmiClassification, DerivedMetrics, IpaqClassification};
use crate::models::{Actor, ComplaintStatus, Onset, Role};

const NOT_AVAILABLE: &str = "N/A";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryStats {
    pub most_affected_region: String,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub average_intensity: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub average_nasa_tlx: Option<Decimal>,
    pub most_frequent_ipaq: String,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub bmi: Option<Decimal>,
    pub bmi_classification: BmiClassification,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BodymapPoint {
    pub location: String,
    pub intensity: u8,
    pub onset: Option<Onset>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSeriesPoint {
    pub x: DateTime<Utc>,
    #[serde(with = "rust_decimal::serde::float")]
    pub y: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSeries {
    pub complaint_intensity: Vec<TimeSeriesPoint>,
    pub nasa_tlx: Vec<TimeSeriesPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineEntry {
    pub id: String,
    pub location: String,
    pub intensity: u8,
    pub submission_date: DateTime<Utc>,
    pub status: ComplaintStatus,
    #[serde(rename = "ipaqClassification")]
    pub ipaq_classification: IpaqClassification,
    #[serde(rename = "nasaTlxScore", with = "rust_decimal::serde::float_option")]
    pub nasa_tlx_score: Option<Decimal>,
    #[serde(rename = "fatigueInjuryIndex", with = "rust_decimal::serde::float_option")]
    pub fatigue_injury_index: Option<Decimal>,
}

/// Pilot dashboard payload
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthSummary {
    pub summary_stats: SummaryStats,
    pub bodymap: Vec<BodymapPoint>,
    pub time_series: TimeSeries,
    /// Newest first
    pub timeline: Vec<TimelineEntry>,
}

impl HealthService {
    /// Dashboard of the calling pilot across all of their complaints
    pub fn pilot_health_summary(&self, actor: &Actor) -> Result<HealthSummary> {
        actor.require(Role::Pilot)?;

        let mut rows = self.db.query_joined(&ComplaintFilters {
            pilot_id: Some(actor.user_id.clone()),
            ..Default::default()
        })?;
        rows.reverse();

        let profile = self.get_profile(actor)?;
        let bmi = calculate_bmi(profile.weight_kg, profile.height_m);

        let evaluated: Vec<(JoinedComplaint, DerivedMetrics)> = rows
            .into_iter()
            .map(|row| {
                let metrics = derive_metrics(&row);
                (row, metrics)
            })
            .collect();

        tracing::debug!(
            pilot_id = %actor.user_id,
            complaints = evaluated.len(),
            "Building health summary"
        );

        let summary = HealthSummary {
            summary_stats: summary_stats(&evaluated, bmi.bmi, bmi.classification),
            bodymap: evaluated
                .iter()
                .map(|(row, _)| BodymapPoint {
                    location: row.complaint.location.clone(),
                    intensity: row.complaint.intensity,
                    onset: row.complaint.onset,
                })
                .collect(),
            time_series: TimeSeries {
                complaint_intensity: evaluated
                    .iter()
                    .map(|(row, _)| TimeSeriesPoint {
                        x: row.complaint.submission_date,
                        y: Decimal::from(row.complaint.intensity),
                    })
                    .collect(),
                nasa_tlx: evaluated
                    .iter()
                    .filter_map(|(row, _)| {
                        row.nasa_tlx.as_ref().map(|tlx| TimeSeriesPoint {
                            x: row.complaint.submission_date,
                            y: tlx.overall_score,
                        })
                    })
                    .collect(),
            },
            timeline: evaluated
                .iter()
                .rev()
                .map(|(row, metrics)| TimelineEntry {
                    id: row.complaint.id.clone(),
                    location: row.complaint.location.clone(),
                    intensity: row.complaint.intensity,
                    submission_date: row.complaint.submission_date,
                    status: row.complaint.status,
                    ipaq_classification: metrics.ipaq_classification,
                    nasa_tlx_score: row.nasa_tlx.as_ref().map(|t| t.overall_score),
                    fatigue_injury_index: metrics.fatigue_injury_index,
                })
                .collect(),
        };

        Ok(summary)
    }
}

/// `evaluated` must be in chronological order
fn summary_stats(
    evaluated: &[(JoinedComplaint, DerivedMetrics)],
    bmi: Option<Decimal>,
    bmi_classification: BmiClassification,
) -> SummaryStats {
    if evaluated.is_empty() {
        return SummaryStats {
            most_affected_region: NOT_AVAILABLE.to_string(),
            average_intensity: None,
            average_nasa_tlx: None,
            most_frequent_ipaq: NOT_AVAILABLE.to_string(),
            bmi,
            bmi_classification,
        };
    }

    let intensities: Vec<Decimal> = evaluated
        .iter()
        .map(|(row, _)| Decimal::from(row.complaint.intensity))
        .collect();
    let tlx_scores: Vec<Decimal> = evaluated
        .iter()
        .filter_map(|(row, _)| row.nasa_tlx.as_ref().map(|t| t.overall_score))
        .collect();

    let region = most_frequent(evaluated.iter().map(|(row, _)| row.complaint.location.as_str()))
        .unwrap_or(NOT_AVAILABLE);

    let ipaq = most_frequent(
        evaluated
            .iter()
            .map(|(_, m)| m.ipaq_classification)
            .filter(|c| *c != IpaqClassification::NotInformed)
            .map(|c| c.label()),
    )
    .unwrap_or(IpaqClassification::NotInformed.label());

    SummaryStats {
        most_affected_region: region.to_string(),
        average_intensity: mean_1dp(&intensities),
        average_nasa_tlx: mean_1dp(&tlx_scores),
        most_frequent_ipaq: ipaq.to_string(),
        bmi,
        bmi_classification,
    }
}

/// Most common item; ties go to whichever appeared first
pub(crate) fn most_frequent<'a>(items: impl IntoIterator<Item = &'a str>) -> Option<&'a str> {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for item in items {
        match counts.iter_mut().find(|(key, _)| *key == item) {
            Some((_, count)) => *count += 1,
            None => counts.push((item, 1)),
        }
    }

    let mut best: Option<(&str, usize)> = None;
    for (key, count) in counts {
        if best.map_or(true, |(_, best_count)| count > best_count) {
            best = Some((key, count));
        }
    }
    best.map(|(key, _)| key)
}

pub(crate) fn mean_1dp(values: &[Decimal]) -> Option<Decimal> {
    if values.is_empty() {
        return None;
    }
    let total: Decimal = values.iter().sum();
    Some(
        (total / Decimal::from(values.len()))
            .round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_most_frequent_tie_goes_to_first() {
        assert_eq!(most_frequent(["Joelho", "Ombro", "Ombro", "Joelho"]), Some("Joelho"));
        assert_eq!(most_frequent(["Ombro", "Joelho", "Joelho"]), Some("Joelho"));
        assert_eq!(most_frequent(Vec::<&str>::new()), None);
    }

    #[test]
    fn test_mean_rounds_to_one_decimal() {
        assert_eq!(mean_1dp(&[dec!(7), dec!(8)]), Some(dec!(7.5)));
        assert_eq!(mean_1dp(&[dec!(1), dec!(2), dec!(2)]), Some(dec!(1.7)));
        assert_eq!(mean_1dp(&[]), None);
    }

    #[test]
    fn test_empty_summary_stats() {
        let stats = summary_stats(&[], None, BmiClassification::InsufficientData);
        assert_eq!(stats.most_affected_region, "N/A");
        assert_eq!(stats.most_frequent_ipaq, "N/A");
        assert_eq!(stats.average_intensity, None);

        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["bmiClassification"], "Dados insuficientes");
        assert!(json["averageNasaTlx"].is_null());
    }
}
