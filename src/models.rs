use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{PilotHealthError, Result};

/// Role of an authenticated user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Pilot,
    Professional,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Pilot => "pilot",
            Role::Professional => "professional",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "pilot" => Ok(Role::Pilot),
            "professional" => Ok(Role::Professional),
            _ => Err(PilotHealthError::Validation(format!("Unknown role: {}", s))),
        }
    }
}

/// The caller of a service operation, as established by the auth layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub user_id: String,
    pub role: Role,
}

impl Actor {
    pub fn pilot(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            role: Role::Pilot,
        }
    }

    pub fn professional(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            role: Role::Professional,
        }
    }

    pub fn require(&self, role: Role) -> Result<()> {
        if self.role == role {
            Ok(())
        } else {
            Err(PilotHealthError::Forbidden(format!(
                "operation requires role {}",
                role.as_str()
            )))
        }
    }
}

/// Registered user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// Air base a pilot is stationed at
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Base {
    pub id: i64,
    pub name: String,
}

/// Profile data shared by pilots and professionals; unused fields stay empty
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    pub user_id: String,
    pub rank: Option<String>,
    /// Military service number
    pub saram: Option<String>,
    pub aircraft_type: Option<String>,
    pub base_id: Option<i64>,
    pub base_name: Option<String>,
    pub birth_date: Option<NaiveDate>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub weight_kg: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub height_m: Option<Decimal>,
    pub whatsapp: Option<String>,
    /// Professional council registration (CRM / CREFITO)
    pub crm_crefito: Option<String>,
}

/// Partial profile update; `None` leaves the stored value untouched
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    pub rank: Option<String>,
    pub saram: Option<String>,
    pub aircraft_type: Option<String>,
    pub base_id: Option<i64>,
    pub birth_date: Option<NaiveDate>,
    pub weight_kg: Option<Decimal>,
    pub height_m: Option<Decimal>,
    pub whatsapp: Option<String>,
    pub crm_crefito: Option<String>,
}

/// How the complaint started
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Onset {
    #[serde(rename = "súbito")]
    Sudden,
    #[serde(rename = "gradual")]
    Gradual,
    #[serde(rename = "crônico")]
    Chronic,
}

impl Onset {
    pub fn as_str(&self) -> &'static str {
        match self {
            Onset::Sudden => "súbito",
            Onset::Gradual => "gradual",
            Onset::Chronic => "crônico",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "súbito" => Ok(Onset::Sudden),
            "gradual" => Ok(Onset::Gradual),
            "crônico" => Ok(Onset::Chronic),
            _ => Err(PilotHealthError::Validation(format!("Início inválido: {}", s))),
        }
    }
}

/// Whether the complaint happened before
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum History {
    #[serde(rename = "primeira_vez")]
    FirstTime,
    #[serde(rename = "contínua")]
    Continuous,
    #[serde(rename = "recorrente")]
    Recurrent,
}

impl History {
    pub fn as_str(&self) -> &'static str {
        match self {
            History::FirstTime => "primeira_vez",
            History::Continuous => "contínua",
            History::Recurrent => "recorrente",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "primeira_vez" => Ok(History::FirstTime),
            "contínua" => Ok(History::Continuous),
            "recorrente" => Ok(History::Recurrent),
            _ => Err(PilotHealthError::Validation(format!("Histórico inválido: {}", s))),
        }
    }
}

/// Triage state of a complaint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComplaintStatus {
    #[serde(rename = "Pendente")]
    Pending,
    #[serde(rename = "Em análise")]
    InReview,
    #[serde(rename = "Respondida")]
    Answered,
}

impl ComplaintStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComplaintStatus::Pending => "Pendente",
            ComplaintStatus::InReview => "Em análise",
            ComplaintStatus::Answered => "Respondida",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "Pendente" => Ok(ComplaintStatus::Pending),
            "Em análise" => Ok(ComplaintStatus::InReview),
            "Respondida" => Ok(ComplaintStatus::Answered),
            _ => Err(PilotHealthError::Validation(format!("Status inválido: {}", s))),
        }
    }
}

/// Impact of the complaint on flying or on concentration.
///
/// Stored as the short code submitted by the form; unknown or missing codes
/// are reported as "Não informado".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ImpactLevel {
    None,
    Mild,
    Moderate,
    Severe,
    NotInformed,
}

impl ImpactLevel {
    pub fn from_code(code: Option<&str>) -> Self {
        match code {
            Some("nenhum") => ImpactLevel::None,
            Some("leve") => ImpactLevel::Mild,
            Some("moderado") => ImpactLevel::Moderate,
            Some("grave") => ImpactLevel::Severe,
            _ => ImpactLevel::NotInformed,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ImpactLevel::None => "Sem impacto",
            ImpactLevel::Mild => "Impacto leve",
            ImpactLevel::Moderate => "Impacto moderado",
            ImpactLevel::Severe => "Impacto grave",
            ImpactLevel::NotInformed => "Não informado",
        }
    }
}

/// Complaint form as submitted by a pilot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComplaintForm {
    pub location: String,
    pub intensity: u8,
    pub duration: Option<String>,
    pub flight_impact: Option<String>,
    pub concentration_impact: Option<String>,
    pub days_missed: Option<u32>,
    pub loss_of_movement: Option<bool>,
    pub medication_used: Option<bool>,
    pub onset: Option<Onset>,
    pub history: Option<History>,
    pub qualitative_details: Option<String>,
}

/// Stored complaint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Complaint {
    pub id: String,
    pub pilot_id: String,
    pub location: String,
    pub intensity: u8,
    pub duration: Option<String>,
    pub flight_impact: Option<String>,
    pub concentration_impact: Option<String>,
    pub days_missed: Option<u32>,
    pub loss_of_movement: Option<bool>,
    pub medication_used: Option<bool>,
    pub onset: Option<Onset>,
    pub history: Option<History>,
    pub qualitative_details: Option<String>,
    pub status: ComplaintStatus,
    pub submission_date: DateTime<Utc>,
}

/// IPAQ short-form answers
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpaqAnswers {
    pub vigorous_activity_days: Option<u8>,
    pub vigorous_activity_minutes: Option<u32>,
    pub moderate_activity_days: Option<u8>,
    pub moderate_activity_minutes: Option<u32>,
    pub walking_days: Option<u8>,
    pub walking_minutes: Option<u32>,
    pub sitting_minutes: Option<u32>,
}

/// NASA-TLX subscale ratings, each 0–100
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NasaTlxRatings {
    #[serde(with = "rust_decimal::serde::float")]
    pub mental_demand: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub physical_demand: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub temporal_demand: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub performance: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub effort: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub frustration: Decimal,
}

/// Stored NASA-TLX questionnaire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NasaTlxRecord {
    #[serde(flatten)]
    pub ratings: NasaTlxRatings,
    #[serde(with = "rust_decimal::serde::float")]
    pub overall_score: Decimal,
    pub submitted_at: DateTime<Utc>,
}

/// Professional assessment of a complaint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub id: String,
    pub complaint_id: String,
    pub professional_id: String,
    pub professional_name: String,
    pub diagnosis: String,
    pub treatment_plan: Option<String>,
    pub notes: Option<String>,
    pub assessment_date: DateTime<Utc>,
}

/// Message in a complaint thread
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub complaint_id: String,
    pub sender_id: String,
    pub sender_name: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// In-app notification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub user_id: String,
    pub message: String,
    pub link: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}
