use serde::Serialize;
use std::path::Path;

use super::{export_failed, DateRange};
use crate::error::Result;
use crate::models::ImpactLevel;
use crate::services::ComplaintListRow;

/// One line of the complaint spreadsheet
#[derive(Debug, Serialize)]
struct ComplaintRecord<'a> {
    id: &'a str,
    submission_date: String,
    pilot: &'a str,
    location: &'a str,
    intensity: u8,
    status: &'static str,
    age_status: &'static str,
    flight_impact: &'static str,
    concentration_impact: &'static str,
    days_missed: Option<u32>,
    loss_of_movement: Option<bool>,
    medication_used: Option<bool>,
    onset: Option<&'static str>,
    has_assessment: bool,
}

/// Export the professional complaint queue to CSV.
///
/// Returns the number of rows written after applying `range`.
pub fn export_complaints<P: AsRef<Path>>(
    rows: &[ComplaintListRow],
    range: &DateRange,
    output_path: P,
) -> Result<usize> {
    let path = output_path.as_ref();
    let mut writer = ::csv::Writer::from_path(path).map_err(|e| export_failed(path, e))?;

    let mut written = 0;
    for row in rows
        .iter()
        .filter(|r| range.contains(&r.complaint.submission_date.date_naive()))
    {
        let c = &row.complaint;
        writer
            .serialize(ComplaintRecord {
                id: &c.id,
                submission_date: c.submission_date.format("%Y-%m-%d %H:%M").to_string(),
                pilot: &row.pilot_name,
                location: &c.location,
                intensity: c.intensity,
                status: c.status.as_str(),
                age_status: row.age_status.label(),
                flight_impact: ImpactLevel::from_code(c.flight_impact.as_deref()).label(),
                concentration_impact: ImpactLevel::from_code(c.concentration_impact.as_deref())
                    .label(),
                days_missed: c.days_missed,
                loss_of_movement: c.loss_of_movement,
                medication_used: c.medication_used,
                onset: c.onset.map(|o| o.as_str()),
                has_assessment: row.has_assessment,
            })
            .map_err(|e| export_failed(path, e))?;
        written += 1;
    }

    writer.flush().map_err(|e| export_failed(path, e))?;
    tracing::info!(path = %path.display(), rows = written, "Exported complaints CSV");
    Ok(written)
}
