use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use colored::*;
use rust_decimal::Decimal;
use std::path::{Path, PathBuf};
use tabled::{settings::Style, Table, Tabled};

use pilothealth::error::{ErrorSeverity, PilotHealthError};
use pilothealth::export::{self, DateRange, ExportFormat};
use pilothealth::logging::init_logging;
use pilothealth::metrics::{IpaqResponse, MetricsEngine, MetricsInput};
use pilothealth::services::{AgeStatus, AssessmentForm, ComplaintListRow, MyComplaint};
use pilothealth::{
    Actor, AppConfig, ComplaintForm, ComplaintStatus, HealthService, History, IpaqAnswers,
    NasaTlxRatings, Onset, ProfileUpdate, Role,
};

/// PilotHealth - musculoskeletal complaint tracking for pilots
///
/// Pilots report complaints and fill in activity (IPAQ) and workload
/// (NASA-TLX) questionnaires; health professionals triage, assess and reply.
#[derive(Parser)]
#[command(name = "pilothealth")]
#[command(version)]
#[command(about = "Pilot complaint tracking and health metrics CLI", long_about = None)]
struct Cli {
    /// Sets a custom config file
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Overrides the database file from the config
    #[arg(long, value_name = "FILE", global = true)]
    database: Option<PathBuf>,

    /// Id of the user performing the command
    #[arg(long = "as", value_name = "USER_ID", global = true)]
    as_user: Option<String>,

    /// Increase verbosity of output
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage users
    #[command(subcommand)]
    User(UserCommand),

    /// Manage air bases
    #[command(subcommand)]
    Base(BaseCommand),

    /// Show or edit the caller's profile
    #[command(subcommand)]
    Profile(ProfileCommand),

    /// Submit, list and triage complaints
    #[command(subcommand)]
    Complaint(ComplaintCommand),

    /// Answer the IPAQ short form for a complaint
    Ipaq(IpaqArgs),

    /// Answer the NASA-TLX for a complaint
    Tlx(TlxArgs),

    /// Record a professional assessment
    Assess {
        complaint_id: String,

        #[arg(short, long)]
        diagnosis: String,

        #[arg(short, long)]
        treatment: Option<String>,

        #[arg(short, long)]
        notes: Option<String>,
    },

    /// List assessments written about the caller's complaints
    Reports,

    /// Complaint message thread
    #[command(subcommand)]
    Message(MessageCommand),

    /// Notification bell
    #[command(subcommand)]
    Notifications(NotificationCommand),

    /// Personal health dashboard of the calling pilot
    Summary {
        /// Write the payload to a JSON file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Aggregate statistics for professionals
    Report {
        /// Write the payload to a JSON file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Record counts in the store
    Stats,

    /// Evaluate the metrics engine on ad-hoc values without touching the store
    Metrics(MetricsArgs),

    /// Configure application settings
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Subcommand)]
enum UserCommand {
    /// Register a user
    Add {
        #[arg(short, long)]
        name: String,

        #[arg(short, long)]
        email: String,

        /// pilot or professional
        #[arg(short, long, value_parser = parse_role)]
        role: Role,
    },
    /// Show one user
    Show { user_id: String },
    /// List health professionals
    Professionals,
}

#[derive(Subcommand)]
enum BaseCommand {
    List,
    Add { name: String },
}

#[derive(Subcommand)]
enum ProfileCommand {
    Show,
    Set(ProfileArgs),
}

#[derive(Args)]
struct ProfileArgs {
    #[arg(long)]
    rank: Option<String>,
    #[arg(long)]
    saram: Option<String>,
    #[arg(long)]
    aircraft: Option<String>,
    #[arg(long)]
    base_id: Option<i64>,
    /// YYYY-MM-DD
    #[arg(long)]
    birth_date: Option<NaiveDate>,
    /// Kilograms
    #[arg(long)]
    weight: Option<Decimal>,
    /// Meters
    #[arg(long)]
    height: Option<Decimal>,
    #[arg(long)]
    whatsapp: Option<String>,
    #[arg(long)]
    crm_crefito: Option<String>,
}

#[derive(Subcommand)]
enum ComplaintCommand {
    /// File a new complaint
    Submit(ComplaintArgs),
    /// The caller's own complaints
    Mine,
    /// Professional complaint queue
    List {
        /// Matches pilot name or location
        #[arg(short, long)]
        search: Option<String>,
        /// Exact body region
        #[arg(short, long)]
        location: Option<String>,
        /// Page number, starting at 1
        #[arg(short, long, default_value_t = 1)]
        page: usize,
    },
    /// Complaint detail with derived metrics
    Show { complaint_id: String },
    /// Change the triage status
    Status {
        complaint_id: String,
        #[arg(value_parser = parse_status)]
        status: ComplaintStatus,
    },
    /// Export the complaint queue
    Export {
        #[arg(short, long)]
        output: PathBuf,
        /// csv or json (defaults to the file extension)
        #[arg(short, long)]
        format: Option<ExportFormat>,
        #[arg(long)]
        from: Option<NaiveDate>,
        #[arg(long)]
        to: Option<NaiveDate>,
    },
}

#[derive(Args)]
struct ComplaintArgs {
    #[arg(short, long)]
    location: String,
    /// 0 to 10
    #[arg(short, long)]
    intensity: u8,
    #[arg(long)]
    duration: Option<String>,
    /// nenhum, leve, moderado or grave
    #[arg(long)]
    flight_impact: Option<String>,
    /// nenhum, leve, moderado or grave
    #[arg(long)]
    concentration_impact: Option<String>,
    #[arg(long)]
    days_missed: Option<u32>,
    #[arg(long)]
    loss_of_movement: Option<bool>,
    #[arg(long)]
    medication_used: Option<bool>,
    /// súbito, gradual or crônico
    #[arg(long, value_parser = parse_onset)]
    onset: Option<Onset>,
    /// primeira_vez, contínua or recorrente
    #[arg(long, value_parser = parse_history)]
    history: Option<History>,
    #[arg(long)]
    details: Option<String>,
}

#[derive(Args)]
struct IpaqArgs {
    complaint_id: String,
    #[arg(long)]
    vigorous_days: u8,
    #[arg(long, default_value = "0")]
    vigorous_minutes: u32,
    #[arg(long)]
    moderate_days: u8,
    #[arg(long, default_value = "0")]
    moderate_minutes: u32,
    #[arg(long)]
    walking_days: u8,
    #[arg(long, default_value = "0")]
    walking_minutes: u32,
    #[arg(long)]
    sitting_minutes: Option<u32>,
}

#[derive(Args)]
struct TlxArgs {
    complaint_id: String,
    #[arg(long)]
    mental: Decimal,
    #[arg(long)]
    physical: Decimal,
    #[arg(long)]
    temporal: Decimal,
    #[arg(long)]
    performance: Decimal,
    #[arg(long)]
    effort: Decimal,
    #[arg(long)]
    frustration: Decimal,
}

#[derive(Subcommand)]
enum MessageCommand {
    Send { complaint_id: String, content: String },
    List { complaint_id: String },
}

#[derive(Subcommand)]
enum NotificationCommand {
    List,
    Count,
    Read { notification_id: String },
}

#[derive(Args)]
struct MetricsArgs {
    #[arg(long)]
    weight: Option<Decimal>,
    #[arg(long)]
    height: Option<Decimal>,
    #[arg(long)]
    intensity: Option<u8>,
    #[arg(long, default_value = "")]
    location: String,
    /// NASA-TLX overall score, 0 to 100
    #[arg(long, value_parser = parse_tlx_score)]
    tlx: Option<Decimal>,
    /// IPAQ answers; the three day counts together mark the questionnaire as answered
    #[arg(long)]
    vigorous_days: Option<u8>,
    #[arg(long)]
    vigorous_minutes: Option<u32>,
    #[arg(long)]
    moderate_days: Option<u8>,
    #[arg(long)]
    moderate_minutes: Option<u32>,
    #[arg(long)]
    walking_days: Option<u8>,
    #[arg(long)]
    walking_minutes: Option<u32>,
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Write a default config file
    Init,
    /// Print the effective configuration
    Show,
}

#[derive(Tabled)]
struct QueueRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Data")]
    date: String,
    #[tabled(rename = "Piloto")]
    pilot: String,
    #[tabled(rename = "Região")]
    location: String,
    #[tabled(rename = "Intensidade")]
    intensity: u8,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Idade")]
    age: String,
}

#[derive(Tabled)]
struct MyComplaintRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Data")]
    date: String,
    #[tabled(rename = "Região")]
    location: String,
    #[tabled(rename = "Intensidade")]
    intensity: u8,
    #[tabled(rename = "Parecer")]
    assessment: String,
}

fn main() {
    if let Err(err) = run() {
        match err.downcast_ref::<PilotHealthError>() {
            Some(app_err) => {
                match app_err.severity() {
                    ErrorSeverity::Critical | ErrorSeverity::Error => {
                        tracing::error!(error = %app_err, "Command failed")
                    }
                    ErrorSeverity::Warning => tracing::warn!(error = %app_err, "Command rejected"),
                    ErrorSeverity::Info => tracing::info!(error = %app_err, "Command rejected"),
                }
                eprintln!("{} {}", "✗".red().bold(), app_err.user_message().red());
                if app_err.is_retryable() {
                    eprintln!("  {}", "Tente novamente em instantes.".yellow());
                }
            }
            None => eprintln!("{} {:#}", "✗".red().bold(), err),
        }
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(AppConfig::default_config_path);
    let mut config = AppConfig::load_or_default(Some(&config_path));
    if let Some(db) = &cli.database {
        config.settings.database_path = db.clone();
    }
    config.logging.level = config.logging.level.raised_by(cli.verbose);
    init_logging(&config.logging).context("Failed to initialize logging")?;

    if let Commands::Config(cmd) = &cli.command {
        return handle_config(cmd, &mut config, &config_path);
    }
    if let Commands::Metrics(args) = &cli.command {
        return handle_metrics(args);
    }

    let mut service = HealthService::from_config(&config)?;
    let as_user = cli.as_user.clone();

    match cli.command {
        Commands::User(cmd) => match cmd {
            UserCommand::Add { name, email, role } => {
                let user = service.create_user(&name, &email, role)?;
                println!("{} {} ({})", "✓ User created:".green(), user.id, user.name);
            }
            UserCommand::Show { user_id } => print_json(&service.get_user(&user_id)?)?,
            UserCommand::Professionals => print_json(&service.list_professionals()?)?,
        },

        Commands::Base(cmd) => match cmd {
            BaseCommand::List => print_json(&service.list_bases()?)?,
            BaseCommand::Add { name } => {
                let base = service.ensure_base(&name)?;
                println!("{} {} ({})", "✓ Base:".green(), base.id, base.name);
            }
        },

        Commands::Profile(cmd) => {
            let actor = resolve_actor(&service, as_user.as_deref())?;
            match cmd {
                ProfileCommand::Show => print_json(&service.get_profile(&actor)?)?,
                ProfileCommand::Set(args) => {
                    let update = ProfileUpdate {
                        rank: args.rank,
                        saram: args.saram,
                        aircraft_type: args.aircraft,
                        base_id: args.base_id,
                        birth_date: args.birth_date,
                        weight_kg: args.weight,
                        height_m: args.height,
                        whatsapp: args.whatsapp,
                        crm_crefito: args.crm_crefito,
                    };
                    print_json(&service.update_profile(&actor, update)?)?;
                }
            }
        }

        Commands::Complaint(cmd) => {
            let actor = resolve_actor(&service, as_user.as_deref())?;
            handle_complaint(&mut service, &actor, cmd)?;
        }

        Commands::Ipaq(args) => {
            let actor = resolve_actor(&service, as_user.as_deref())?;
            let answers = IpaqAnswers {
                vigorous_activity_days: Some(args.vigorous_days),
                vigorous_activity_minutes: Some(args.vigorous_minutes),
                moderate_activity_days: Some(args.moderate_days),
                moderate_activity_minutes: Some(args.moderate_minutes),
                walking_days: Some(args.walking_days),
                walking_minutes: Some(args.walking_minutes),
                sitting_minutes: args.sitting_minutes,
            };
            let classification = service.submit_ipaq(&actor, &args.complaint_id, answers)?;
            println!("{} {}", "✓ IPAQ:".green(), classification.label().bold());
        }

        Commands::Tlx(args) => {
            let actor = resolve_actor(&service, as_user.as_deref())?;
            let ratings = NasaTlxRatings {
                mental_demand: args.mental,
                physical_demand: args.physical,
                temporal_demand: args.temporal,
                performance: args.performance,
                effort: args.effort,
                frustration: args.frustration,
            };
            let record = service.submit_nasa_tlx(&actor, &args.complaint_id, ratings)?;
            println!("{} {}", "✓ NASA-TLX:".green(), record.overall_score.to_string().bold());
        }

        Commands::Assess {
            complaint_id,
            diagnosis,
            treatment,
            notes,
        } => {
            let actor = resolve_actor(&service, as_user.as_deref())?;
            let form = AssessmentForm {
                diagnosis,
                treatment_plan: treatment,
                notes,
            };
            let assessment = service.submit_assessment(&actor, &complaint_id, form)?;
            println!("{} {}", "✓ Assessment recorded:".green(), assessment.id);
        }

        Commands::Reports => {
            let actor = resolve_actor(&service, as_user.as_deref())?;
            print_json(&service.list_my_reports(&actor)?)?;
        }

        Commands::Message(cmd) => {
            let actor = resolve_actor(&service, as_user.as_deref())?;
            match cmd {
                MessageCommand::Send {
                    complaint_id,
                    content,
                } => {
                    let message = service.send_message(&actor, &complaint_id, &content)?;
                    println!("{} {}", "✓ Message sent:".green(), message.id);
                }
                MessageCommand::List { complaint_id } => {
                    for m in service.list_messages(&actor, &complaint_id)? {
                        println!(
                            "{} {}: {}",
                            m.created_at.format("%d/%m/%Y %H:%M").to_string().dimmed(),
                            m.sender_name.bold(),
                            m.content
                        );
                    }
                }
            }
        }

        Commands::Notifications(cmd) => {
            let actor = resolve_actor(&service, as_user.as_deref())?;
            match cmd {
                NotificationCommand::List => print_json(&service.list_notifications(&actor)?)?,
                NotificationCommand::Count => println!("{}", service.unread_count(&actor)?),
                NotificationCommand::Read { notification_id } => {
                    service.mark_read(&actor, &notification_id)?;
                    println!("{}", "✓ Marked as read".green());
                }
            }
        }

        Commands::Summary { output } => {
            let actor = resolve_actor(&service, as_user.as_deref())?;
            emit(&service.pilot_health_summary(&actor)?, output.as_deref())?;
        }

        Commands::Report { output } => {
            let actor = resolve_actor(&service, as_user.as_deref())?;
            emit(&service.reports_summary(&actor)?, output.as_deref())?;
        }

        Commands::Stats => {
            let stats = service.database().get_stats()?;
            println!("{}", "Store statistics".cyan().bold());
            println!("  Users:                {}", stats.user_count);
            println!("  Complaints:           {}", stats.complaint_count);
            println!("  Messages:             {}", stats.message_count);
            println!("  Unread notifications: {}", stats.unread_notification_count);
        }

        Commands::Metrics(args) => handle_metrics(&args)?,
        Commands::Config(cmd) => handle_config(&cmd, &mut config, &config_path)?,
    }

    Ok(())
}

fn handle_complaint(
    service: &mut HealthService,
    actor: &Actor,
    cmd: ComplaintCommand,
) -> Result<()> {
    match cmd {
        ComplaintCommand::Submit(args) => {
            let form = ComplaintForm {
                location: args.location,
                intensity: args.intensity,
                duration: args.duration,
                flight_impact: args.flight_impact,
                concentration_impact: args.concentration_impact,
                days_missed: args.days_missed,
                loss_of_movement: args.loss_of_movement,
                medication_used: args.medication_used,
                onset: args.onset,
                history: args.history,
                qualitative_details: args.details,
            };
            let complaint = service.submit_complaint(actor, form)?;
            println!("{} {}", "✓ Complaint submitted:".green(), complaint.id);
        }

        ComplaintCommand::Mine => {
            let rows: Vec<MyComplaintRow> = service
                .list_my_complaints(actor)?
                .into_iter()
                .map(my_complaint_row)
                .collect();
            println!("{}", Table::new(rows).with(Style::rounded()));
        }

        ComplaintCommand::List {
            search,
            location,
            page,
        } => {
            let rows: Vec<QueueRow> = service
                .list_complaints(
                    actor,
                    search.as_deref(),
                    location.as_deref(),
                    page.saturating_sub(1),
                )?
                .into_iter()
                .map(queue_row)
                .collect();
            println!("{}", Table::new(rows).with(Style::rounded()));
        }

        ComplaintCommand::Show { complaint_id } => {
            let detail = match actor.role {
                Role::Professional => service.complaint_detail_for_professional(actor, &complaint_id)?,
                Role::Pilot => service.complaint_detail_for_pilot(actor, &complaint_id)?,
            };
            print_json(&detail)?;
        }

        ComplaintCommand::Status {
            complaint_id,
            status,
        } => {
            service.update_status(actor, &complaint_id, status)?;
            println!("{} {}", "✓ Status:".green(), status.as_str());
        }

        ComplaintCommand::Export {
            output,
            format,
            from,
            to,
        } => {
            let range = DateRange::new(from, to);
            let rows = service.complaints_for_export(actor, &range)?;
            let format = format
                .or_else(|| ExportFormat::from_path(&output))
                .unwrap_or(ExportFormat::Csv);

            let written = match format {
                ExportFormat::Csv => export::csv::export_complaints(&rows, &range, &output)?,
                ExportFormat::Json => {
                    export::json::export_json(&rows, &output)?;
                    rows.len()
                }
            };
            println!(
                "{} {} complaints to {}",
                "✓ Exported".green(),
                written,
                output.display()
            );
        }
    }
    Ok(())
}

fn handle_metrics(args: &MetricsArgs) -> Result<()> {
    let metrics = MetricsEngine::evaluate(&MetricsInput {
        weight_kg: args.weight,
        height_m: args.height,
        intensity: args.intensity,
        location: args.location.clone(),
        ipaq: metrics_ipaq(args),
        nasa_tlx_score: args.tlx,
    });
    print_json(&metrics)
}

fn metrics_ipaq(args: &MetricsArgs) -> IpaqResponse {
    match (args.vigorous_days, args.moderate_days, args.walking_days) {
        (Some(vigorous), Some(moderate), Some(walking)) => IpaqResponse::Submitted(IpaqAnswers {
            vigorous_activity_days: Some(vigorous),
            vigorous_activity_minutes: args.vigorous_minutes,
            moderate_activity_days: Some(moderate),
            moderate_activity_minutes: args.moderate_minutes,
            walking_days: Some(walking),
            walking_minutes: args.walking_minutes,
            sitting_minutes: None,
        }),
        _ => IpaqResponse::NotSubmitted,
    }
}

fn handle_config(cmd: &ConfigCommand, config: &mut AppConfig, path: &Path) -> Result<()> {
    match cmd {
        ConfigCommand::Init => {
            config.save_to_file(path)?;
            println!("{} {}", "✓ Config written to".green(), path.display());
        }
        ConfigCommand::Show => {
            println!("{}", toml::to_string_pretty(config)?);
        }
    }
    Ok(())
}

fn resolve_actor(service: &HealthService, user_id: Option<&str>) -> Result<Actor> {
    let user_id = user_id.context("This command needs --as <USER_ID>")?;
    let user = service.get_user(user_id)?;
    Ok(Actor {
        user_id: user.id,
        role: user.role,
    })
}

fn queue_row(row: ComplaintListRow) -> QueueRow {
    let age = match row.age_status {
        AgeStatus::Recent => row.age_status.label().green(),
        AgeStatus::Attention => row.age_status.label().yellow(),
        AgeStatus::Critical => row.age_status.label().red(),
    };
    QueueRow {
        id: row.complaint.id,
        date: row.complaint.submission_date.format("%d/%m/%Y").to_string(),
        pilot: row.pilot_name,
        location: row.complaint.location,
        intensity: row.complaint.intensity,
        status: row.complaint.status.as_str().to_string(),
        age: age.to_string(),
    }
}

fn my_complaint_row(row: MyComplaint) -> MyComplaintRow {
    MyComplaintRow {
        id: row.complaint.id,
        date: row.complaint.submission_date.format("%d/%m/%Y").to_string(),
        location: row.complaint.location,
        intensity: row.complaint.intensity,
        assessment: row.assessment_status.label().to_string(),
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn emit<T: serde::Serialize>(value: &T, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            export::json::export_json(value, path)?;
            println!("{} {}", "✓ Written to".green(), path.display());
            Ok(())
        }
        None => print_json(value),
    }
}

fn parse_role(s: &str) -> std::result::Result<Role, String> {
    Role::parse(s).map_err(|e| e.to_string())
}

fn parse_tlx_score(s: &str) -> std::result::Result<Decimal, String> {
    let score: Decimal = s.parse().map_err(|e| format!("{}", e))?;
    if score < Decimal::ZERO || score > Decimal::ONE_HUNDRED {
        return Err(format!("NASA-TLX score must be between 0 and 100, got {}", score));
    }
    Ok(score)
}

fn parse_status(s: &str) -> std::result::Result<ComplaintStatus, String> {
    ComplaintStatus::parse(s).map_err(|e| e.to_string())
}

fn parse_onset(s: &str) -> std::result::Result<Onset, String> {
    Onset::parse(s).map_err(|e| e.to_string())
}

fn parse_history(s: &str) -> std::result::Result<History, String> {
    History::parse(s).map_err(|e| e.to_string())
}
