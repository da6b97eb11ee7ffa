use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{notification, pilot_link, HealthService};
use crate::error::{Entity, PilotHealthError, Result};
use crate::models::{Actor, Assessment, Role};

/// Professional opinion as entered on the complaint page
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssessmentForm {
    pub diagnosis: String,
    pub treatment_plan: Option<String>,
    pub notes: Option<String>,
}

/// Assessment listed in the pilot's reports page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PilotReport {
    #[serde(flatten)]
    pub assessment: Assessment,
    pub complaint_location: String,
    pub complaint_date: DateTime<Utc>,
}

impl HealthService {
    /// Record an assessment; the complaint becomes "Respondida" and its
    /// pilot is notified.
    pub fn submit_assessment(
        &mut self,
        actor: &Actor,
        complaint_id: &str,
        form: AssessmentForm,
    ) -> Result<Assessment> {
        actor.require(Role::Professional)?;

        let diagnosis = form.diagnosis.trim();
        if diagnosis.is_empty() {
            return Err(PilotHealthError::Validation(
                "Diagnóstico é obrigatório.".to_string(),
            ));
        }

        let complaint = self
            .db
            .get_complaint(complaint_id)?
            .ok_or_else(|| PilotHealthError::not_found(Entity::Complaint, complaint_id))?;
        let professional = self.get_user(&actor.user_id)?;

        let assessment = Assessment {
            id: Uuid::new_v4().to_string(),
            complaint_id: complaint.id.clone(),
            professional_id: professional.id.clone(),
            professional_name: professional.name.clone(),
            diagnosis: diagnosis.to_string(),
            treatment_plan: form.treatment_plan.filter(|s| !s.trim().is_empty()),
            notes: form.notes.filter(|s| !s.trim().is_empty()),
            assessment_date: Utc::now(),
        };
        let notice = notification(
            &complaint.pilot_id,
            format!(
                "{} registrou um parecer para sua queixa: {}",
                professional.name, complaint.location
            ),
            pilot_link(&complaint.id),
        );

        self.db.insert_assessment(&assessment, &notice)?;
        tracing::info!(
            complaint_id,
            assessment_id = %assessment.id,
            professional_id = %professional.id,
            "Assessment recorded"
        );

        Ok(assessment)
    }

    /// Assessments written about the caller's complaints, newest first
    pub fn list_my_reports(&self, actor: &Actor) -> Result<Vec<PilotReport>> {
        actor.require(Role::Pilot)?;
        let rows = self.db.reports_for_pilot(&actor.user_id)?;

        Ok(rows
            .into_iter()
            .map(|row| PilotReport {
                assessment: row.assessment,
                complaint_location: row.complaint_location,
                complaint_date: row.complaint_date,
            })
            .collect())
    }
}
