use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::{notification, professional_link, HealthService};
use crate::config::TriageSettings;
use crate::database::{ComplaintFilters, JoinedComplaint};
use crate::error::{Entity, PilotHealthError, Result};
use crate::export::DateRange;
use crate::models::{Actor, Complaint, ComplaintForm, ComplaintStatus, Role};

/// Whether a pilot's complaint already has a professional opinion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AssessmentStatus {
    #[serde(rename = "Parecer Disponível")]
    Available,
    #[serde(rename = "Aguardando Parecer")]
    Waiting,
}

impl AssessmentStatus {
    pub fn label(&self) -> &'static str {
        match self {
            AssessmentStatus::Available => "Parecer Disponível",
            AssessmentStatus::Waiting => "Aguardando Parecer",
        }
    }
}

/// Age bucket shown next to each complaint in the professional queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum AgeStatus {
    #[serde(rename = "Recente")]
    Recent,
    #[serde(rename = "Atenção")]
    Attention,
    #[serde(rename = "Crítica")]
    Critical,
}

impl AgeStatus {
    pub fn from_age_days(days: i64, triage: &TriageSettings) -> Self {
        if days <= triage.recent_days {
            AgeStatus::Recent
        } else if days <= triage.attention_days {
            AgeStatus::Attention
        } else {
            AgeStatus::Critical
        }
    }

    pub fn of(submitted: DateTime<Utc>, now: DateTime<Utc>, triage: &TriageSettings) -> Self {
        Self::from_age_days((now - submitted).num_days(), triage)
    }

    pub fn label(&self) -> &'static str {
        match self {
            AgeStatus::Recent => "Recente",
            AgeStatus::Attention => "Atenção",
            AgeStatus::Critical => "Crítica",
        }
    }
}

/// Row of the pilot's own complaint history
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MyComplaint {
    #[serde(flatten)]
    pub complaint: Complaint,
    pub assessment_status: AssessmentStatus,
}

/// Row of the professional complaint queue
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComplaintListRow {
    #[serde(flatten)]
    pub complaint: Complaint,
    pub pilot_name: String,
    pub age_status: AgeStatus,
    pub has_assessment: bool,
}

impl HealthService {
    /// Record a new complaint and notify every professional
    pub fn submit_complaint(&mut self, actor: &Actor, form: ComplaintForm) -> Result<Complaint> {
        actor.require(Role::Pilot)?;
        let pilot = self.get_user(&actor.user_id)?;

        let location = form.location.trim();
        if location.is_empty() {
            return Err(PilotHealthError::Validation(
                "Localização da queixa é obrigatória.".to_string(),
            ));
        }
        if form.intensity > 10 {
            return Err(PilotHealthError::Validation(
                "Intensidade deve estar entre 0 e 10.".to_string(),
            ));
        }

        let complaint = Complaint {
            id: Uuid::new_v4().to_string(),
            pilot_id: pilot.id.clone(),
            location: location.to_string(),
            intensity: form.intensity,
            duration: non_blank(form.duration),
            flight_impact: non_blank(form.flight_impact),
            concentration_impact: non_blank(form.concentration_impact),
            days_missed: form.days_missed,
            loss_of_movement: form.loss_of_movement,
            medication_used: form.medication_used,
            onset: form.onset,
            history: form.history,
            qualitative_details: non_blank(form.qualitative_details),
            status: ComplaintStatus::Pending,
            submission_date: Utc::now(),
        };

        let notifications: Vec<_> = self
            .db
            .users_with_role(Role::Professional)?
            .iter()
            .map(|pro| {
                notification(
                    &pro.id,
                    format!("Nova queixa de {}: {}", pilot.name, complaint.location),
                    professional_link(&complaint.id),
                )
            })
            .collect();

        self.db.insert_complaint(&complaint, &notifications)?;
        tracing::info!(
            complaint_id = %complaint.id,
            pilot_id = %pilot.id,
            intensity = complaint.intensity,
            notified = notifications.len(),
            "Complaint submitted"
        );

        Ok(complaint)
    }

    /// The caller's complaints, newest first
    pub fn list_my_complaints(&self, actor: &Actor) -> Result<Vec<MyComplaint>> {
        actor.require(Role::Pilot)?;
        let rows = self.db.query_joined(&ComplaintFilters {
            pilot_id: Some(actor.user_id.clone()),
            ..Default::default()
        })?;

        Ok(rows
            .into_iter()
            .map(|row| MyComplaint {
                assessment_status: if row.has_assessment {
                    AssessmentStatus::Available
                } else {
                    AssessmentStatus::Waiting
                },
                complaint: row.complaint,
            })
            .collect())
    }

    /// One page of the professional queue, newest first.
    ///
    /// `search` matches pilot name or location case-insensitively; `location`
    /// is an exact region filter. `page` is zero-based and holds up to
    /// `page_size` rows; a page past the end is empty.
    pub fn list_complaints(
        &self,
        actor: &Actor,
        search: Option<&str>,
        location: Option<&str>,
        page: usize,
    ) -> Result<Vec<ComplaintListRow>> {
        actor.require(Role::Professional)?;

        let needle = search
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty());
        let offset = page.saturating_mul(self.page_size);
        let mut filters = ComplaintFilters {
            location: location.map(str::to_string),
            ..Default::default()
        };

        // Search folds case in Rust, so only unsearched pages can be cut in SQL
        let rows: Vec<_> = match &needle {
            None => {
                filters.limit = Some(self.page_size);
                filters.offset = offset;
                self.db.query_joined(&filters)?
            }
            Some(needle) => self
                .db
                .query_joined(&filters)?
                .into_iter()
                .filter(|row| matches_search(row, needle))
                .skip(offset)
                .take(self.page_size)
                .collect(),
        };

        let listing = self.queue_rows(rows);
        tracing::debug!(rows = listing.len(), page, ?search, ?location, "Listed complaints");
        Ok(listing)
    }

    /// Every complaint submitted within `range`, newest first, without paging
    pub fn complaints_for_export(
        &self,
        actor: &Actor,
        range: &DateRange,
    ) -> Result<Vec<ComplaintListRow>> {
        actor.require(Role::Professional)?;

        let rows = self.db.query_joined(&ComplaintFilters {
            submitted_from: range.start,
            submitted_to: range.end,
            ..Default::default()
        })?;

        let listing = self.queue_rows(rows);
        tracing::debug!(rows = listing.len(), ?range, "Selected complaints for export");
        Ok(listing)
    }

    fn queue_rows(&self, rows: Vec<JoinedComplaint>) -> Vec<ComplaintListRow> {
        let now = Utc::now();
        rows.into_iter()
            .map(|row| ComplaintListRow {
                age_status: AgeStatus::of(row.complaint.submission_date, now, &self.triage),
                pilot_name: row.pilot.name,
                has_assessment: row.has_assessment,
                complaint: row.complaint,
            })
            .collect()
    }

    pub fn update_status(
        &self,
        actor: &Actor,
        complaint_id: &str,
        status: ComplaintStatus,
    ) -> Result<()> {
        actor.require(Role::Professional)?;
        if !self.db.update_complaint_status(complaint_id, status)? {
            return Err(PilotHealthError::not_found(Entity::Complaint, complaint_id));
        }
        tracing::info!(complaint_id, status = status.as_str(), "Complaint status changed");
        Ok(())
    }
}

fn matches_search(row: &JoinedComplaint, needle: &str) -> bool {
    row.pilot.name.to_lowercase().contains(needle)
        || row.complaint.location.to_lowercase().contains(needle)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
