use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

mod confidence;
mod db;
mod encourage;
mod goals;
mod models;
mod report;
mod signals;

use confidence::{HISTORY_DAYS, RECENT_DAYS};
use models::SignalType;

#[derive(Parser)]
#[command(name = "confidence-coach")]
#[command(about = "Study confidence scoring and encouragement coach", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load realistic seed data
    Seed,
    /// Import performance records from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Append one study session for a student
    Log {
        #[arg(long)]
        email: String,
        #[arg(long)]
        topic_id: i64,
        #[arg(long)]
        score: f64,
        #[arg(long)]
        minutes: i32,
        #[arg(long)]
        mistakes: Option<String>,
    },
    /// Compute the confidence score and factor breakdown
    Confidence {
        #[arg(long)]
        email: String,
        #[arg(long)]
        json: bool,
    },
    /// Detect behavioral signals from recent history
    Signals {
        #[arg(long)]
        email: String,
        #[arg(long)]
        persist: bool,
        #[arg(long)]
        json: bool,
    },
    /// Draft 2-4 daily micro-goals
    Goals {
        #[arg(long)]
        email: String,
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long)]
        persist: bool,
        #[arg(long)]
        json: bool,
    },
    /// Pick encouragement for the trailing week
    Encourage {
        #[arg(long)]
        email: String,
        #[arg(long)]
        personalized: bool,
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long)]
        persist: bool,
    },
    /// Mark a micro-goal done and acknowledge it
    CompleteGoal {
        #[arg(long)]
        id: Uuid,
    },
    /// Acknowledge an encouragement message as viewed
    ViewMessage {
        #[arg(long)]
        id: Uuid,
    },
    /// Generate a markdown report for one student
    Report {
        #[arg(long)]
        email: String,
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let database_url = std::env::var("DATABASE_URL")
        .context("DATABASE_URL must be set to a Postgres instance")?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("failed to connect to Postgres")?;

    match cli.command {
        Commands::InitDb => {
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            db::seed(&pool).await?;
            println!("Seed data inserted.");
        }
        Commands::Import { csv } => {
            let inserted = db::import_csv(&pool, &csv).await?;
            println!("Inserted {inserted} performance records from {}.", csv.display());
        }
        Commands::Log {
            email,
            topic_id,
            score,
            minutes,
            mistakes,
        } => {
            anyhow::ensure!(
                (0.0..=100.0).contains(&score),
                "score must be between 0 and 100"
            );
            anyhow::ensure!(minutes >= 0, "minutes must not be negative");
            let student = db::student_by_email(&pool, &email).await?;
            db::log_session(&pool, student.id, topic_id, score, minutes, mistakes.as_deref())
                .await?;
            println!("Session logged for {}.", student.name);
        }
        Commands::Confidence { email, json } => {
            let student = db::student_by_email(&pool, &email).await?;
            let records =
                db::fetch_performance(&pool, student.id, confidence::cutoff(HISTORY_DAYS)).await?;
            let goals =
                db::fetch_goals(&pool, student.id, confidence::cutoff(HISTORY_DAYS)).await?;
            let breakdown = confidence::factor_breakdown(&records, &goals);
            let score = confidence::confidence_score(&records, &goals);

            if json {
                println!("{}", serde_json::to_string_pretty(&breakdown)?);
            } else {
                println!("Confidence score for {}: {score:.2}", student.name);
                if records.is_empty() {
                    println!("(no sessions in the last {HISTORY_DAYS} days; score is neutral)");
                } else {
                    println!("- consistency: {:.1}", breakdown.consistency);
                    println!("- improvement streak: {:.1}", breakdown.improvement_streak);
                    println!("- mistake reduction: {:.1}", breakdown.mistake_reduction);
                    println!("- goal completion: {:.1}", breakdown.goal_completion);
                    println!("- performance trend: {:.1}", breakdown.performance_trend);
                }
            }
        }
        Commands::Signals {
            email,
            persist,
            json,
        } => {
            let student = db::student_by_email(&pool, &email).await?;
            let records =
                db::fetch_performance(&pool, student.id, confidence::cutoff(HISTORY_DAYS)).await?;
            let recent =
                db::fetch_performance(&pool, student.id, confidence::cutoff(RECENT_DAYS)).await?;
            let detected = signals::detect_signals(&records, &recent);

            if json {
                println!("{}", serde_json::to_string_pretty(&detected)?);
            } else if detected.is_empty() {
                println!("No signals detected for {}.", student.name);
            } else {
                for signal in &detected {
                    println!(
                        "- {} ({:.1}): {}",
                        signal.signal_type.as_str(),
                        signal.value,
                        signal.description
                    );
                }
            }

            if persist {
                let inserted = db::insert_signals(&pool, student.id, &detected).await?;
                println!("Persisted {inserted} signals.");
            }
        }
        Commands::Goals {
            email,
            seed,
            persist,
            json,
        } => {
            let student = db::student_by_email(&pool, &email).await?;
            let topics = db::fetch_topics(&pool).await?;
            let recent =
                db::fetch_performance(&pool, student.id, confidence::cutoff(RECENT_DAYS)).await?;
            let mut rng = make_rng(seed);
            let drafts = goals::generate_daily_goals(&topics, &recent, &mut rng);

            if json {
                println!("{}", serde_json::to_string_pretty(&drafts)?);
            } else {
                println!("Daily goals for {}:", student.name);
                for draft in &drafts {
                    println!(
                        "- [p{}] {} (~{} mins)",
                        draft.priority, draft.goal_text, draft.estimated_time
                    );
                }
            }

            if persist {
                let inserted = db::insert_goals(&pool, student.id, &drafts).await?;
                println!("Persisted {inserted} goals.");
            }
        }
        Commands::Encourage {
            email,
            personalized,
            seed,
            persist,
        } => {
            let student = db::student_by_email(&pool, &email).await?;
            let week_cutoff = confidence::cutoff(RECENT_DAYS);
            let records = db::fetch_performance(&pool, student.id, week_cutoff).await?;
            let completed = db::count_completed_goals(&pool, student.id, week_cutoff).await?;
            let stress =
                db::count_signals(&pool, student.id, SignalType::Stress, week_cutoff).await?;
            let summary = encourage::analyze_progress(&records, completed, stress);
            let mut rng = make_rng(seed);

            let messages = if personalized {
                let recent_stress = db::count_signals(
                    &pool,
                    student.id,
                    SignalType::Stress,
                    confidence::cutoff(encourage::SETBACK_DAYS),
                )
                .await?
                    > 0;
                encourage::personalized_encouragement(&summary, recent_stress, &mut rng)
            } else {
                vec![models::MessageDraft {
                    message_type: models::MessageType::Daily,
                    message: encourage::daily_encouragement(&summary, &mut rng),
                }]
            };

            for message in &messages {
                println!("[{}] {}", message.message_type.as_str(), message.message);
            }

            if persist {
                let inserted = db::insert_messages(&pool, student.id, &messages).await?;
                println!("Persisted {inserted} messages.");
            }
        }
        Commands::CompleteGoal { id } => match db::complete_goal(&pool, id).await? {
            Some(goal_text) => {
                println!("Completed: {goal_text}");
                println!("{}", encourage::after_goal_encouragement(&goal_text));
            }
            None => println!("Goal not found or already completed."),
        },
        Commands::ViewMessage { id } => {
            if db::mark_message_viewed(&pool, id).await? {
                println!("Message marked as viewed.");
            } else {
                println!("Message not found or already viewed.");
            }
        }
        Commands::Report { email, seed, out } => {
            let student = db::student_by_email(&pool, &email).await?;
            let history_cutoff = confidence::cutoff(HISTORY_DAYS);
            let week_cutoff = confidence::cutoff(RECENT_DAYS);

            let records = db::fetch_performance(&pool, student.id, history_cutoff).await?;
            let recent = db::fetch_performance(&pool, student.id, week_cutoff).await?;
            let goal_history = db::fetch_goals(&pool, student.id, history_cutoff).await?;
            let topics = db::fetch_topics(&pool).await?;
            let completed = db::count_completed_goals(&pool, student.id, week_cutoff).await?;
            let stress =
                db::count_signals(&pool, student.id, SignalType::Stress, week_cutoff).await?;

            let breakdown = if records.is_empty() {
                None
            } else {
                Some(confidence::factor_breakdown(&records, &goal_history))
            };
            let detected = signals::detect_signals(&records, &recent);
            let mut rng = make_rng(seed);
            let drafts = goals::generate_daily_goals(&topics, &recent, &mut rng);
            let summary = encourage::analyze_progress(&recent, completed, stress);
            let encouragement = encourage::daily_encouragement(&summary, &mut rng);

            let rendered = report::build_report(
                &student,
                history_cutoff,
                breakdown.as_ref(),
                &detected,
                &drafts,
                &encouragement,
            );
            std::fs::write(&out, rendered)?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}
