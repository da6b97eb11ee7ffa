use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use pilothealth::config::TriageSettings;
use pilothealth::metrics::{IpaqResponse, MetricsEngine, MetricsInput};
use pilothealth::{Actor, ComplaintForm, Database, HealthService, IpaqAnswers, ProfileUpdate, Role};

/// Benchmarks for the metrics engine and the pages that run it per complaint

const REGIONS: &[&str] = &["Coluna Lombar", "Joelho", "Ombro", "Cotovelo", "Mão Esquerda"];

fn create_inputs(count: usize) -> Vec<MetricsInput> {
    (0..count)
        .map(|i| MetricsInput {
            weight_kg: Some(dec!(60) + Decimal::from(i % 40)),
            height_m: Some(dec!(1.60) + Decimal::new((i % 35) as i64, 2)),
            intensity: Some((i % 11) as u8),
            location: REGIONS[i % REGIONS.len()].to_string(),
            ipaq: if i % 3 == 0 {
                IpaqResponse::NotSubmitted
            } else {
                IpaqResponse::Submitted(IpaqAnswers {
                    vigorous_activity_days: Some((i % 8) as u8),
                    vigorous_activity_minutes: Some(45),
                    moderate_activity_days: Some((i % 6) as u8),
                    moderate_activity_minutes: Some(30),
                    walking_days: Some(5),
                    walking_minutes: Some(20),
                    sitting_minutes: Some(480),
                })
            },
            nasa_tlx_score: Some(Decimal::new((i % 10000) as i64, 2)),
        })
        .collect()
}

fn bench_engine(c: &mut Criterion) {
    let mut group = c.benchmark_group("Metrics Engine");

    for &size in &[1, 100, 10_000] {
        let inputs = create_inputs(size);

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("evaluate", size), &inputs, |b, inputs| {
            b.iter(|| {
                for input in inputs {
                    black_box(MetricsEngine::evaluate(black_box(input)));
                }
            });
        });
    }

    group.finish();
}

fn bench_health_summary(c: &mut Criterion) {
    let mut group = c.benchmark_group("Health Summary");

    for &complaints in &[10, 100] {
        let mut svc =
            HealthService::new(Database::in_memory().unwrap(), TriageSettings::default(), 500);
        let user = svc
            .create_user("Bench Pilot", "bench@fab.mil.br", Role::Pilot)
            .unwrap();
        let pilot = Actor::pilot(user.id);
        svc.update_profile(
            &pilot,
            ProfileUpdate {
                weight_kg: Some(dec!(77)),
                height_m: Some(dec!(1.79)),
                ..Default::default()
            },
        )
        .unwrap();

        for i in 0..complaints {
            svc.submit_complaint(
                &pilot,
                ComplaintForm {
                    location: REGIONS[i % REGIONS.len()].to_string(),
                    intensity: (i % 11) as u8,
                    ..Default::default()
                },
            )
            .unwrap();
        }

        group.bench_with_input(
            BenchmarkId::new("pilot_health_summary", complaints),
            &pilot,
            |b, pilot| b.iter(|| black_box(svc.pilot_health_summary(pilot).unwrap())),
        );
    }

    group.finish();
}

criterion_group!(benches, bench_engine, bench_health_summary);
criterion_main!(benches);
