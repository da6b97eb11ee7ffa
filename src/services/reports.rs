use std::collections::{BTreeMap, HashSet};

use rust_decimal::Decimal;
use serde::Serialize;

use super::summary::mean_1dp;
use super::HealthService;
use crate::config::TriageSettings;
use crate::database::{ComplaintFilters, JoinedComplaint};
use crate::error::Result;
use crate::models::{Actor, ImpactLevel, Role};

const YES: &str = "Sim";
const NO: &str = "Não";
const NOT_INFORMED: &str = "Não informado";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportKpis {
    pub total_complaints: usize,
    /// Registered pilots, whether or not they have complained
    pub total_pilots: usize,
    /// Pilots with at least one complaint
    pub reporting_pilots: usize,
    #[serde(with = "rust_decimal::serde::float")]
    pub average_intensity: Decimal,
    pub high_intensity_complaints: usize,
}

/// Aggregate statistics for the professional reports page
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportsSummary {
    #[serde(flatten)]
    pub kpis: ReportKpis,
    pub complaints_by_region: BTreeMap<String, usize>,
    pub flight_impact_distribution: BTreeMap<String, usize>,
    /// Keyed by `YYYY-MM`
    pub complaints_per_month: BTreeMap<String, usize>,
    pub loss_of_movement: BTreeMap<String, usize>,
    pub medication_use: BTreeMap<String, usize>,
    pub onset_distribution: BTreeMap<String, usize>,
}

impl HealthService {
    pub fn reports_summary(&self, actor: &Actor) -> Result<ReportsSummary> {
        actor.require(Role::Professional)?;

        let rows = self.db.query_joined(&ComplaintFilters::default())?;
        let total_pilots = self.db.users_with_role(Role::Pilot)?.len();

        let summary = aggregate(&rows, total_pilots, &self.triage);
        tracing::debug!(
            complaints = summary.kpis.total_complaints,
            pilots = summary.kpis.total_pilots,
            "Built reports summary"
        );
        Ok(summary)
    }
}

fn aggregate(rows: &[JoinedComplaint], total_pilots: usize, triage: &TriageSettings) -> ReportsSummary {
    let intensities: Vec<Decimal> = rows
        .iter()
        .map(|r| Decimal::from(r.complaint.intensity))
        .collect();
    let reporting: HashSet<&str> = rows.iter().map(|r| r.complaint.pilot_id.as_str()).collect();

    let mut by_region = BTreeMap::new();
    let mut flight_impact = BTreeMap::new();
    let mut per_month = BTreeMap::new();
    let mut loss_of_movement = yes_no_buckets();
    let mut medication_use = yes_no_buckets();
    let mut onset = BTreeMap::new();

    for row in rows {
        let c = &row.complaint;
        bump(&mut by_region, c.location.clone());
        bump(
            &mut flight_impact,
            ImpactLevel::from_code(c.flight_impact.as_deref()).label().to_string(),
        );
        bump(&mut per_month, c.submission_date.format("%Y-%m").to_string());
        bump(&mut loss_of_movement, yes_no(c.loss_of_movement).to_string());
        bump(&mut medication_use, yes_no(c.medication_used).to_string());
        bump(
            &mut onset,
            c.onset.map_or(NOT_INFORMED, |o| o.as_str()).to_string(),
        );
    }

    ReportsSummary {
        kpis: ReportKpis {
            total_complaints: rows.len(),
            total_pilots,
            reporting_pilots: reporting.len(),
            average_intensity: mean_1dp(&intensities).unwrap_or(Decimal::ZERO),
            high_intensity_complaints: rows
                .iter()
                .filter(|r| r.complaint.intensity > triage.high_intensity)
                .count(),
        },
        complaints_by_region: by_region,
        flight_impact_distribution: flight_impact,
        complaints_per_month: per_month,
        loss_of_movement,
        medication_use,
        onset_distribution: onset,
    }
}

fn bump(map: &mut BTreeMap<String, usize>, key: String) {
    *map.entry(key).or_insert(0) += 1;
}

fn yes_no_buckets() -> BTreeMap<String, usize> {
    BTreeMap::from([(YES.to_string(), 0), (NO.to_string(), 0)])
}

fn yes_no(value: Option<bool>) -> &'static str {
    match value {
        Some(true) => YES,
        Some(false) => NO,
        None => NOT_INFORMED,
    }
}
