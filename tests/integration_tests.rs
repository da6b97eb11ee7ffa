use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use pilothealth::config::TriageSettings;
use pilothealth::services::{AgeStatus, AssessmentForm, AssessmentStatus};
use pilothealth::{
    Actor, Complaint, ComplaintForm, ComplaintStatus, Database, HealthService, IpaqAnswers,
    NasaTlxRatings, Onset, PilotHealthError, ProfileUpdate, Role, User,
};
use pilothealth::export::{self, DateRange};
use rust_decimal_macros::dec;
use uuid::Uuid;

/// End-to-end workflows against an in-memory store

#[cfg(test)]
mod integration_tests {
    use super::*;

    struct Fixture {
        svc: HealthService,
        pilot: Actor,
        other_pilot: Actor,
        physio: Actor,
        doctor: Actor,
    }

    fn setup() -> Fixture {
        let svc = HealthService::new(Database::in_memory().unwrap(), TriageSettings::default(), 100);
        let pilot = svc
            .create_user("Cap. Ribeiro", "ribeiro@fab.mil.br", Role::Pilot)
            .unwrap();
        let other = svc
            .create_user("Ten. Moraes", "moraes@fab.mil.br", Role::Pilot)
            .unwrap();
        let physio = svc
            .create_user("Ft. Carvalho", "carvalho@fab.mil.br", Role::Professional)
            .unwrap();
        let doctor = svc
            .create_user("Dr. Teixeira", "teixeira@fab.mil.br", Role::Professional)
            .unwrap();

        Fixture {
            svc,
            pilot: Actor::pilot(pilot.id),
            other_pilot: Actor::pilot(other.id),
            physio: Actor::professional(physio.id),
            doctor: Actor::professional(doctor.id),
        }
    }

    fn lumbar_form(intensity: u8) -> ComplaintForm {
        ComplaintForm {
            location: "Coluna Lombar".to_string(),
            intensity,
            duration: Some("3 semanas".to_string()),
            flight_impact: Some("moderado".to_string()),
            concentration_impact: Some("leve".to_string()),
            days_missed: Some(2),
            loss_of_movement: Some(false),
            medication_used: Some(true),
            onset: Some(Onset::Gradual),
            history: None,
            qualitative_details: Some("Piora após missões longas".to_string()),
        }
    }

    fn tlx_75() -> NasaTlxRatings {
        NasaTlxRatings {
            mental_demand: dec!(80),
            physical_demand: dec!(70),
            temporal_demand: dec!(75),
            performance: dec!(60),
            effort: dec!(90),
            frustration: dec!(75),
        }
    }

    /// Submit, questionnaires, detail with derived metrics, assessment, thread
    #[test]
    fn test_complaint_lifecycle() {
        let Fixture {
            mut svc,
            pilot,
            physio,
            doctor,
            ..
        } = setup();

        svc.update_profile(
            &pilot,
            ProfileUpdate {
                weight_kg: Some(dec!(82.5)),
                height_m: Some(dec!(1.78)),
                saram: Some("7654321".to_string()),
                ..Default::default()
            },
        )
        .unwrap();

        let complaint = svc.submit_complaint(&pilot, lumbar_form(8)).unwrap();
        assert_eq!(complaint.status, ComplaintStatus::Pending);

        // Every professional hears about the new complaint
        for pro in [&physio, &doctor] {
            let feed = svc.list_notifications(pro).unwrap();
            assert_eq!(feed.unread_count, 1);
            assert_eq!(feed.notifications[0].link, format!("/complaint/{}", complaint.id));
        }

        let ipaq = svc
            .submit_ipaq(
                &pilot,
                &complaint.id,
                IpaqAnswers {
                    vigorous_activity_days: Some(3),
                    vigorous_activity_minutes: Some(80),
                    moderate_activity_days: Some(0),
                    moderate_activity_minutes: Some(0),
                    walking_days: Some(0),
                    walking_minutes: Some(0),
                    sitting_minutes: Some(480),
                },
            )
            .unwrap();
        assert_eq!(ipaq.label(), "Muito Ativo");

        let tlx = svc.submit_nasa_tlx(&pilot, &complaint.id, tlx_75()).unwrap();
        assert_eq!(tlx.overall_score, dec!(75));

        let detail = svc
            .complaint_detail_for_professional(&physio, &complaint.id)
            .unwrap();
        assert_eq!(detail.pilot.bmi, Some(dec!(26.04)));
        assert_eq!(detail.pilot.bmi_classification.label(), "Sobrepeso");
        assert_eq!(detail.ipaq.ipaq_classification.label(), "Muito Ativo");
        assert_eq!(detail.region_weight, 3);
        assert_eq!(detail.fatigue_injury_index, Some(dec!(1800.00)));
        assert_eq!(
            detail.pilot.contact.as_ref().unwrap().saram.as_deref(),
            Some("7654321")
        );

        let own = svc.complaint_detail_for_pilot(&pilot, &complaint.id).unwrap();
        assert!(own.pilot.contact.is_none());
        assert_eq!(own.fatigue_injury_index, detail.fatigue_injury_index);

        svc.update_status(&physio, &complaint.id, ComplaintStatus::InReview)
            .unwrap();

        let assessment = svc
            .submit_assessment(
                &physio,
                &complaint.id,
                AssessmentForm {
                    diagnosis: "Lombalgia mecânica".to_string(),
                    treatment_plan: Some("Fortalecimento de core, 6 semanas".to_string()),
                    notes: None,
                },
            )
            .unwrap();
        assert_eq!(assessment.professional_name, "Ft. Carvalho");

        let mine = svc.list_my_complaints(&pilot).unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].complaint.status, ComplaintStatus::Answered);
        assert_eq!(mine[0].assessment_status, AssessmentStatus::Available);

        let reports = svc.list_my_reports(&pilot).unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].complaint_location, "Coluna Lombar");
        assert_eq!(reports[0].assessment.diagnosis, "Lombalgia mecânica");

        let pilot_feed = svc.list_notifications(&pilot).unwrap();
        assert_eq!(pilot_feed.unread_count, 1);
        assert_eq!(
            pilot_feed.notifications[0].link,
            format!("/my-complaints/{}", complaint.id)
        );

        // Thread: pilot writes, every professional is notified; reply goes back to the pilot
        svc.send_message(&pilot, &complaint.id, "  Ainda sinto dor ao decolar  ")
            .unwrap();
        svc.send_message(&doctor, &complaint.id, "Vamos reavaliar na sexta.")
            .unwrap();

        let thread = svc.list_messages(&physio, &complaint.id).unwrap();
        assert_eq!(thread.len(), 2);
        assert_eq!(thread[0].content, "Ainda sinto dor ao decolar");
        assert_eq!(thread[0].sender_name, "Cap. Ribeiro");
        assert_eq!(thread[1].sender_name, "Dr. Teixeira");

        assert_eq!(svc.unread_count(&physio).unwrap(), 2);
        assert_eq!(svc.unread_count(&pilot).unwrap(), 2);
    }

    #[test]
    fn test_detail_without_questionnaires_degrades() {
        let Fixture {
            mut svc,
            pilot,
            physio,
            ..
        } = setup();
        let complaint = svc
            .submit_complaint(
                &pilot,
                ComplaintForm {
                    location: "Mão Esquerda".to_string(),
                    intensity: 4,
                    ..Default::default()
                },
            )
            .unwrap();

        let detail = svc
            .complaint_detail_for_professional(&physio, &complaint.id)
            .unwrap();
        assert_eq!(detail.pilot.bmi, None);
        assert_eq!(detail.pilot.bmi_classification.label(), "Dados insuficientes");
        assert_eq!(detail.ipaq.ipaq_classification.label(), "Não informado");
        assert_eq!(detail.region_weight, 0);
        assert_eq!(detail.fatigue_injury_index, None);
        assert_eq!(detail.complaint.flight_impact_label, "Não informado");

        let json = serde_json::to_value(&detail).unwrap();
        assert!(json["fatigueInjuryIndex"].is_null());
        assert!(json["pilot"]["bmi"].is_null());
    }

    #[test]
    fn test_access_rules() {
        let Fixture {
            mut svc,
            pilot,
            other_pilot,
            physio,
            ..
        } = setup();
        let complaint = svc.submit_complaint(&pilot, lumbar_form(5)).unwrap();

        // Pilots cannot see or answer for someone else's complaint
        let err = svc
            .complaint_detail_for_pilot(&other_pilot, &complaint.id)
            .unwrap_err();
        assert!(matches!(err, PilotHealthError::Forbidden(_)));
        assert!(svc.submit_nasa_tlx(&other_pilot, &complaint.id, tlx_75()).is_err());
        assert!(svc.list_messages(&other_pilot, &complaint.id).is_err());

        // Role checks
        assert!(matches!(
            svc.submit_complaint(&physio, lumbar_form(3)),
            Err(PilotHealthError::Forbidden(_))
        ));
        assert!(svc.list_complaints(&pilot, None, None, 0).is_err());
        assert!(svc.reports_summary(&pilot).is_err());
        assert!(svc.pilot_health_summary(&physio).is_err());
        assert!(svc
            .submit_assessment(
                &pilot,
                &complaint.id,
                AssessmentForm {
                    diagnosis: "x".to_string(),
                    ..Default::default()
                }
            )
            .is_err());

        // Notifications can only be marked by their owner
        let feed = svc.list_notifications(&physio).unwrap();
        let id = feed.notifications[0].id.clone();
        assert!(matches!(
            svc.mark_read(&pilot, &id),
            Err(PilotHealthError::Forbidden(_))
        ));
        svc.mark_read(&physio, &id).unwrap();
        assert_eq!(svc.unread_count(&physio).unwrap(), 0);
    }

    #[test]
    fn test_missing_records() {
        let Fixture {
            mut svc,
            pilot,
            physio,
            ..
        } = setup();

        let err = svc
            .complaint_detail_for_professional(&physio, "does-not-exist")
            .unwrap_err();
        assert_eq!(err.user_message(), "Queixa não encontrada.");

        assert!(matches!(
            svc.update_status(&physio, "does-not-exist", ComplaintStatus::InReview),
            Err(PilotHealthError::NotFound { .. })
        ));
        assert!(matches!(
            svc.send_message(&pilot, "does-not-exist", "oi"),
            Err(PilotHealthError::NotFound { .. })
        ));
        assert!(matches!(
            svc.mark_read(&pilot, "does-not-exist"),
            Err(PilotHealthError::NotFound { .. })
        ));
    }

    #[test]
    fn test_validation_failures() {
        let Fixture {
            mut svc,
            pilot,
            physio,
            ..
        } = setup();

        let mut form = lumbar_form(11);
        assert!(matches!(
            svc.submit_complaint(&pilot, form.clone()),
            Err(PilotHealthError::Validation(_))
        ));
        form.intensity = 5;
        form.location = "   ".to_string();
        assert!(svc.submit_complaint(&pilot, form).is_err());

        let complaint = svc.submit_complaint(&pilot, lumbar_form(5)).unwrap();
        assert!(svc.send_message(&pilot, &complaint.id, "   ").is_err());
        assert!(svc
            .submit_assessment(&physio, &complaint.id, AssessmentForm::default())
            .is_err());

        let mut ratings = tlx_75();
        ratings.effort = dec!(120);
        assert!(svc.submit_nasa_tlx(&pilot, &complaint.id, ratings).is_err());

        // Nothing above reached the store
        assert_eq!(svc.database().get_stats().unwrap().complaint_count, 1);
        assert_eq!(svc.database().get_stats().unwrap().message_count, 0);
    }

    fn user(name: &str, email: &str, role: Role) -> User {
        User {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            email: email.to_string(),
            role,
            created_at: Utc::now(),
        }
    }

    fn dated_complaint(pilot_id: &str, location: &str, submitted: DateTime<Utc>) -> Complaint {
        Complaint {
            id: Uuid::new_v4().to_string(),
            pilot_id: pilot_id.to_string(),
            location: location.to_string(),
            intensity: 9,
            duration: None,
            flight_impact: None,
            concentration_impact: None,
            days_missed: None,
            loss_of_movement: None,
            medication_used: None,
            onset: None,
            history: None,
            qualitative_details: None,
            status: ComplaintStatus::Pending,
            submission_date: submitted,
        }
    }

    #[test]
    fn test_professional_queue_search_and_age() {
        // Back-dated rows go in before the service takes over the store
        let mut db = Database::in_memory().unwrap();
        let ribeiro = user("Cap. Ribeiro", "ribeiro@fab.mil.br", Role::Pilot);
        let moraes = user("Ten. Moraes", "moraes@fab.mil.br", Role::Pilot);
        let carvalho = user("Ft. Carvalho", "carvalho@fab.mil.br", Role::Professional);
        for u in [&ribeiro, &moraes, &carvalho] {
            db.insert_user(u).unwrap();
        }
        let mut old = dated_complaint(&moraes.id, "Joelho", Utc::now() - Duration::days(75));
        old.id = "old-complaint".to_string();
        db.insert_complaint(&old, &[]).unwrap();

        let mut svc = HealthService::new(db, TriageSettings::default(), 100);
        let pilot = Actor::pilot(ribeiro.id);
        let other_pilot = Actor::pilot(moraes.id);
        let physio = Actor::professional(carvalho.id);

        svc.submit_complaint(&pilot, lumbar_form(6)).unwrap();
        svc.submit_complaint(
            &other_pilot,
            ComplaintForm {
                location: "Ombro".to_string(),
                intensity: 3,
                ..Default::default()
            },
        )
        .unwrap();

        let all = svc.list_complaints(&physio, None, None, 0).unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[2].complaint.id, "old-complaint");
        assert_eq!(all[2].age_status, AgeStatus::Critical);
        assert_eq!(all[0].age_status, AgeStatus::Recent);

        let by_name = svc.list_complaints(&physio, Some("moraes"), None, 0).unwrap();
        assert_eq!(by_name.len(), 2);
        assert!(by_name.iter().all(|r| r.pilot_name == "Ten. Moraes"));

        let by_text = svc.list_complaints(&physio, Some("LOMBAR"), None, 0).unwrap();
        assert_eq!(by_text.len(), 1);

        let by_location = svc.list_complaints(&physio, None, Some("Ombro"), 0).unwrap();
        assert_eq!(by_location.len(), 1);
        assert_eq!(by_location[0].complaint.location, "Ombro");
    }

    #[test]
    fn test_pilot_health_summary() {
        let Fixture {
            mut svc,
            pilot,
            ..
        } = setup();

        let empty = svc.pilot_health_summary(&pilot).unwrap();
        assert_eq!(empty.summary_stats.most_affected_region, "N/A");
        assert!(empty.timeline.is_empty());

        svc.update_profile(
            &pilot,
            ProfileUpdate {
                weight_kg: Some(dec!(70)),
                height_m: Some(dec!(1.75)),
                ..Default::default()
            },
        )
        .unwrap();

        let first = svc.submit_complaint(&pilot, lumbar_form(8)).unwrap();
        svc.submit_nasa_tlx(&pilot, &first.id, tlx_75()).unwrap();
        let second = svc
            .submit_complaint(
                &pilot,
                ComplaintForm {
                    location: "Ombro".to_string(),
                    intensity: 5,
                    ..Default::default()
                },
            )
            .unwrap();

        let summary = svc.pilot_health_summary(&pilot).unwrap();
        let stats = &summary.summary_stats;
        // One complaint per region: the earlier one wins the tie
        assert_eq!(stats.most_affected_region, "Coluna Lombar");
        assert_eq!(stats.average_intensity, Some(dec!(6.5)));
        assert_eq!(stats.average_nasa_tlx, Some(dec!(75.0)));
        assert_eq!(stats.most_frequent_ipaq, "Não informado");
        assert_eq!(stats.bmi, Some(dec!(22.86)));
        assert_eq!(stats.bmi_classification.label(), "Peso Normal");

        assert_eq!(summary.bodymap.len(), 2);
        assert_eq!(summary.time_series.complaint_intensity.len(), 2);
        assert_eq!(summary.time_series.nasa_tlx.len(), 1);

        assert_eq!(summary.timeline[0].id, second.id);
        assert_eq!(summary.timeline[1].id, first.id);
        assert_eq!(summary.timeline[1].fatigue_injury_index, Some(dec!(1800.00)));
        assert_eq!(summary.timeline[0].fatigue_injury_index, None);

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["summaryStats"]["mostAffectedRegion"], "Coluna Lombar");
        assert!(json["timeSeries"]["complaintIntensity"].is_array());
        assert_eq!(json["timeline"][1]["nasaTlxScore"], serde_json::json!(75.0));
    }

    #[test]
    fn test_reports_summary() {
        let Fixture {
            mut svc,
            pilot,
            other_pilot,
            physio,
            ..
        } = setup();

        svc.submit_complaint(&pilot, lumbar_form(8)).unwrap();
        svc.submit_complaint(&pilot, lumbar_form(9)).unwrap();
        svc.submit_complaint(
            &other_pilot,
            ComplaintForm {
                location: "Joelho".to_string(),
                intensity: 4,
                loss_of_movement: Some(true),
                ..Default::default()
            },
        )
        .unwrap();

        let report = svc.reports_summary(&physio).unwrap();
        assert_eq!(report.kpis.total_complaints, 3);
        assert_eq!(report.kpis.total_pilots, 2);
        assert_eq!(report.kpis.average_intensity, dec!(7.0));
        assert_eq!(report.kpis.high_intensity_complaints, 2);
        assert_eq!(report.complaints_by_region["Coluna Lombar"], 2);
        assert_eq!(report.flight_impact_distribution["Impacto moderado"], 2);
        assert_eq!(report.loss_of_movement["Sim"], 1);
        assert_eq!(report.loss_of_movement["Não"], 2);
        assert_eq!(report.onset_distribution["gradual"], 2);

        let month = Utc::now().format("%Y-%m").to_string();
        assert_eq!(report.complaints_per_month[&month], 3);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["totalComplaints"], 3);
        assert_eq!(json["medicationUse"]["Sim"], 2);
    }

    #[test]
    fn test_queue_pages_reach_every_complaint() {
        let mut db = Database::in_memory().unwrap();
        let pilot = user("Maj. Duarte", "duarte@fab.mil.br", Role::Pilot);
        let physio = user("Ft. Nogueira", "nogueira@fab.mil.br", Role::Professional);
        db.insert_user(&pilot).unwrap();
        db.insert_user(&physio).unwrap();
        for day in 1..=5 {
            let submitted = Utc.with_ymd_and_hms(2023, 6, day, 9, 0, 0).unwrap();
            db.insert_complaint(&dated_complaint(&pilot.id, "Joelho", submitted), &[])
                .unwrap();
        }
        let svc = HealthService::new(db, TriageSettings::default(), 2);
        let physio = Actor::professional(physio.id);

        let pages: Vec<usize> = (0..4)
            .map(|page| svc.list_complaints(&physio, None, None, page).unwrap().len())
            .collect();
        assert_eq!(pages, vec![2, 2, 1, 0]);

        let last = svc.list_complaints(&physio, None, None, 2).unwrap();
        assert_eq!(
            last[0].complaint.submission_date.date_naive(),
            NaiveDate::from_ymd_opt(2023, 6, 1).unwrap()
        );

        let searched: Vec<usize> = (0..3)
            .map(|page| {
                svc.list_complaints(&physio, Some("duarte"), None, page)
                    .unwrap()
                    .len()
            })
            .collect();
        assert_eq!(searched, vec![2, 2, 1]);
    }

    #[test]
    fn test_export_is_not_capped_by_page_size() {
        let mut db = Database::in_memory().unwrap();
        let pilot = user("Cap. Farias", "farias@fab.mil.br", Role::Pilot);
        let physio = user("Dr. Pacheco", "pacheco@fab.mil.br", Role::Professional);
        db.insert_user(&pilot).unwrap();
        db.insert_user(&physio).unwrap();
        for day in 1..=3 {
            let submitted = Utc.with_ymd_and_hms(2022, 1, day, 12, 0, 0).unwrap();
            db.insert_complaint(&dated_complaint(&pilot.id, "Ombro", submitted), &[])
                .unwrap();
        }

        let mut svc = HealthService::new(db, TriageSettings::default(), 2);
        let pilot = Actor::pilot(pilot.id);
        let physio = Actor::professional(physio.id);
        for intensity in 1..=3 {
            svc.submit_complaint(&pilot, lumbar_form(intensity)).unwrap();
        }

        let everything = svc.complaints_for_export(&physio, &DateRange::default()).unwrap();
        assert_eq!(everything.len(), 6);

        // Only back-dated rows fall in the range, and all of them are older
        // than the newest page of the queue
        let january = DateRange::new(
            NaiveDate::from_ymd_opt(2022, 1, 1),
            NaiveDate::from_ymd_opt(2022, 1, 31),
        );
        let old = svc.complaints_for_export(&physio, &january).unwrap();
        assert_eq!(old.len(), 3);
        assert!(old.iter().all(|r| r.complaint.location == "Ombro"));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("queixas.csv");
        let written = export::csv::export_complaints(&everything, &DateRange::default(), &path).unwrap();
        assert_eq!(written, 6);
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 7);

        assert!(svc.complaints_for_export(&pilot, &january).is_err());
    }
}
