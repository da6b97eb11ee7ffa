use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use super::{derive_metrics, HealthService};
use crate::database::JoinedComplaint;
use crate::error::{Entity, PilotHealthError, Result};
use crate::metrics::{BmiClassification, IpaqClassification, MetBreakdown};
use crate::models::{Actor, Assessment, Complaint, ImpactLevel, IpaqAnswers, NasaTlxRecord, Role};

/// Complaint fields plus human-readable impact labels
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComplaintView {
    #[serde(flatten)]
    pub complaint: Complaint,
    pub flight_impact_label: &'static str,
    pub concentration_impact_label: &'static str,
}

/// Contact data only professionals get to see
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PilotContact {
    pub email: String,
    pub whatsapp: Option<String>,
    pub saram: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PilotView {
    pub id: String,
    pub name: String,
    pub rank: Option<String>,
    pub aircraft_type: Option<String>,
    pub base_name: Option<String>,
    pub birth_date: Option<NaiveDate>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub weight_kg: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub height_m: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub bmi: Option<Decimal>,
    #[serde(rename = "bmiClassification")]
    pub bmi_classification: BmiClassification,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<PilotContact>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IpaqView {
    #[serde(flatten)]
    pub answers: Option<IpaqAnswers>,
    #[serde(rename = "ipaqClassification")]
    pub ipaq_classification: IpaqClassification,
    #[serde(rename = "metBreakdown")]
    pub met_breakdown: Option<MetBreakdown>,
}

/// Everything shown on a complaint page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComplaintDetail {
    pub complaint: ComplaintView,
    pub pilot: PilotView,
    pub ipaq: IpaqView,
    pub nasa_tlx: Option<NasaTlxRecord>,
    #[serde(rename = "fatigueInjuryIndex", with = "rust_decimal::serde::float_option")]
    pub fatigue_injury_index: Option<Decimal>,
    #[serde(rename = "regionWeight")]
    pub region_weight: u8,
    pub assessments: Vec<Assessment>,
}

impl HealthService {
    /// Complaint page as seen by a professional, including pilot contact
    pub fn complaint_detail_for_professional(
        &self,
        actor: &Actor,
        complaint_id: &str,
    ) -> Result<ComplaintDetail> {
        actor.require(Role::Professional)?;
        self.complaint_detail(complaint_id, true)
    }

    /// Complaint page as seen by the pilot who filed it
    pub fn complaint_detail_for_pilot(
        &self,
        actor: &Actor,
        complaint_id: &str,
    ) -> Result<ComplaintDetail> {
        actor.require(Role::Pilot)?;
        self.owned_complaint(actor, complaint_id)?;
        self.complaint_detail(complaint_id, false)
    }

    fn complaint_detail(&self, complaint_id: &str, with_contact: bool) -> Result<ComplaintDetail> {
        let joined = self
            .db
            .load_joined(complaint_id)?
            .ok_or_else(|| PilotHealthError::not_found(Entity::Complaint, complaint_id))?;
        let assessments = self.db.assessments_for_complaint(complaint_id)?;

        tracing::debug!(complaint_id, with_contact, "Building complaint detail");
        Ok(build_detail(joined, assessments, with_contact))
    }
}

fn build_detail(
    joined: JoinedComplaint,
    assessments: Vec<Assessment>,
    with_contact: bool,
) -> ComplaintDetail {
    let metrics = derive_metrics(&joined);
    let JoinedComplaint {
        complaint,
        pilot,
        profile,
        ipaq,
        nasa_tlx,
        ..
    } = joined;
    let profile = profile.unwrap_or_default();

    let contact = with_contact.then(|| PilotContact {
        email: pilot.email.clone(),
        whatsapp: profile.whatsapp.clone(),
        saram: profile.saram.clone(),
    });

    ComplaintDetail {
        complaint: ComplaintView {
            flight_impact_label: ImpactLevel::from_code(complaint.flight_impact.as_deref()).label(),
            concentration_impact_label: ImpactLevel::from_code(
                complaint.concentration_impact.as_deref(),
            )
            .label(),
            complaint,
        },
        pilot: PilotView {
            id: pilot.id,
            name: pilot.name,
            rank: profile.rank,
            aircraft_type: profile.aircraft_type,
            base_name: profile.base_name,
            birth_date: profile.birth_date,
            weight_kg: profile.weight_kg,
            height_m: profile.height_m,
            bmi: metrics.bmi,
            bmi_classification: metrics.bmi_classification,
            contact,
        },
        ipaq: IpaqView {
            met_breakdown: ipaq.as_ref().map(MetBreakdown::from_answers),
            answers: ipaq,
            ipaq_classification: metrics.ipaq_classification,
        },
        nasa_tlx,
        fatigue_injury_index: metrics.fatigue_injury_index,
        region_weight: metrics.region_weight,
        assessments,
    }
}
