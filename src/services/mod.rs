//! Request-level operations
//!
//! Every operation takes the calling [`Actor`] and enforces role and
//! ownership before touching the store. The metrics engine is invoked from
//! the complaint detail views and from the pilot health summary.

mod assessments;
mod complaints;
mod detail;
mod messaging;
mod profiles;
mod questionnaires;
mod reports;
mod summary;
mod users;

pub use assessments::{AssessmentForm, PilotReport};
pub use complaints::{AgeStatus, AssessmentStatus, ComplaintListRow, MyComplaint};
pub use detail::{ComplaintDetail, ComplaintView, IpaqView, PilotContact, PilotView};
pub use messaging::NotificationFeed;
pub use reports::{ReportKpis, ReportsSummary};
pub use summary::{
    BodymapPoint, HealthSummary, SummaryStats, TimeSeries, TimeSeriesPoint, TimelineEntry,
};

use chrono::Utc;
use uuid::Uuid;

use crate::config::{AppConfig, TriageSettings};
use crate::database::{Database, JoinedComplaint};
use crate::error::{Entity, PilotHealthError, Result};
use crate::metrics::{DerivedMetrics, IpaqResponse, MetricsEngine, MetricsInput};
use crate::models::{Actor, Complaint, Notification, Role};

/// Service facade over the store
pub struct HealthService {
    db: Database,
    triage: TriageSettings,
    page_size: usize,
}

impl HealthService {
    pub fn new(db: Database, triage: TriageSettings, page_size: usize) -> Self {
        Self {
            db,
            triage,
            page_size,
        }
    }

    /// Open the store named in the config and seed its bases
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let db = Database::new(&config.settings.database_path)?;
        for base in &config.bases {
            db.ensure_base(base)?;
        }
        Ok(Self::new(db, config.triage, config.settings.page_size))
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Complaint that must exist and belong to the calling pilot
    fn owned_complaint(&self, actor: &Actor, complaint_id: &str) -> Result<Complaint> {
        let complaint = self
            .db
            .get_complaint(complaint_id)?
            .ok_or_else(|| PilotHealthError::not_found(Entity::Complaint, complaint_id))?;

        if actor.role != Role::Pilot || complaint.pilot_id != actor.user_id {
            tracing::warn!(
                user_id = %actor.user_id,
                complaint_id,
                "Rejected access to a complaint owned by another user"
            );
            return Err(PilotHealthError::Forbidden(
                "complaint belongs to another pilot".to_string(),
            ));
        }
        Ok(complaint)
    }

    /// Complaint visible to the actor: any for professionals, own for pilots
    fn visible_complaint(&self, actor: &Actor, complaint_id: &str) -> Result<Complaint> {
        match actor.role {
            Role::Professional => self
                .db
                .get_complaint(complaint_id)?
                .ok_or_else(|| PilotHealthError::not_found(Entity::Complaint, complaint_id)),
            Role::Pilot => self.owned_complaint(actor, complaint_id),
        }
    }
}

/// Run the engine over one joined complaint
pub(crate) fn derive_metrics(joined: &JoinedComplaint) -> DerivedMetrics {
    let (weight_kg, height_m) = joined
        .profile
        .as_ref()
        .map(|p| (p.weight_kg, p.height_m))
        .unwrap_or((None, None));

    let ipaq = match &joined.ipaq {
        Some(answers) => IpaqResponse::from_joined(answers.clone()),
        None => IpaqResponse::NotSubmitted,
    };

    MetricsEngine::evaluate(&MetricsInput {
        weight_kg,
        height_m,
        intensity: Some(joined.complaint.intensity),
        location: joined.complaint.location.clone(),
        ipaq,
        nasa_tlx_score: joined.nasa_tlx.as_ref().map(|t| t.overall_score),
    })
}

pub(crate) fn notification(user_id: &str, message: String, link: String) -> Notification {
    Notification {
        id: Uuid::new_v4().to_string(),
        user_id: user_id.to_string(),
        message,
        link,
        is_read: false,
        created_at: Utc::now(),
    }
}

pub(crate) fn professional_link(complaint_id: &str) -> String {
    format!("/complaint/{}", complaint_id)
}

pub(crate) fn pilot_link(complaint_id: &str) -> String {
    format!("/my-complaints/{}", complaint_id)
}
