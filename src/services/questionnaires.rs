use chrono::Utc;

use super::HealthService;
use crate::error::{PilotHealthError, Result};
use crate::metrics::{classify_ipaq, raw_tlx_score, IpaqClassification, IpaqResponse};
use crate::models::{Actor, IpaqAnswers, NasaTlxRatings, NasaTlxRecord};

impl HealthService {
    /// Store the IPAQ answers of a complaint, replacing earlier ones
    pub fn submit_ipaq(
        &self,
        actor: &Actor,
        complaint_id: &str,
        answers: IpaqAnswers,
    ) -> Result<IpaqClassification> {
        self.owned_complaint(actor, complaint_id)?;
        validate_ipaq(&answers)?;

        self.db.upsert_ipaq(complaint_id, &answers, Utc::now())?;
        let classification = classify_ipaq(&IpaqResponse::Submitted(answers));

        tracing::info!(
            complaint_id,
            classification = classification.label(),
            "IPAQ submitted"
        );
        Ok(classification)
    }

    /// Store the NASA-TLX ratings of a complaint, replacing earlier ones
    pub fn submit_nasa_tlx(
        &self,
        actor: &Actor,
        complaint_id: &str,
        ratings: NasaTlxRatings,
    ) -> Result<NasaTlxRecord> {
        self.owned_complaint(actor, complaint_id)?;

        let record = NasaTlxRecord {
            overall_score: raw_tlx_score(&ratings)?,
            ratings,
            submitted_at: Utc::now(),
        };
        self.db.upsert_nasa_tlx(complaint_id, &record)?;

        tracing::info!(complaint_id, overall = %record.overall_score, "NASA-TLX submitted");
        Ok(record)
    }
}

fn validate_ipaq(answers: &IpaqAnswers) -> Result<()> {
    let days = [
        ("vigorous_activity_days", answers.vigorous_activity_days),
        ("moderate_activity_days", answers.moderate_activity_days),
        ("walking_days", answers.walking_days),
    ];

    for (field, value) in days {
        match value {
            None => {
                return Err(PilotHealthError::Validation(format!(
                    "IPAQ: {} é obrigatório.",
                    field
                )))
            }
            Some(d) if d > 7 => {
                return Err(PilotHealthError::Validation(format!(
                    "IPAQ: {} deve estar entre 0 e 7.",
                    field
                )))
            }
            Some(_) => {}
        }
    }

    let minutes = [
        answers.vigorous_activity_minutes,
        answers.moderate_activity_minutes,
        answers.walking_minutes,
        answers.sitting_minutes,
    ];
    if minutes.iter().flatten().any(|m| *m > 24 * 60) {
        return Err(PilotHealthError::Validation(
            "IPAQ: minutos por dia não podem passar de 1440.".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answers(days: u8) -> IpaqAnswers {
        IpaqAnswers {
            vigorous_activity_days: Some(days),
            vigorous_activity_minutes: Some(30),
            moderate_activity_days: Some(0),
            moderate_activity_minutes: Some(0),
            walking_days: Some(0),
            walking_minutes: Some(0),
            sitting_minutes: None,
        }
    }

    #[test]
    fn test_ipaq_days_bounded() {
        assert!(validate_ipaq(&answers(7)).is_ok());
        assert!(validate_ipaq(&answers(8)).is_err());
    }

    #[test]
    fn test_ipaq_requires_day_counts() {
        let mut a = answers(3);
        a.moderate_activity_days = None;
        assert!(matches!(validate_ipaq(&a), Err(PilotHealthError::Validation(_))));
    }

    #[test]
    fn test_ipaq_minutes_bounded() {
        let mut a = answers(3);
        a.sitting_minutes = Some(1500);
        assert!(validate_ipaq(&a).is_err());
    }
}
