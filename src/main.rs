use std::path::PathBuf;

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use sqlx::postgres::PgPoolOptions;

mod db;
mod models;
mod reconcile;
mod report;

use models::Viewer;

#[derive(Parser)]
#[command(name = "dlr-audit")]
#[command(about = "Daily lecture record reconciliation and reporting", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Role {
    Admin,
    Hod,
    Faculty,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load realistic seed data
    Seed,
    /// Import timetable slots from a CSV file
    ImportTimetable {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Import daily lecture records from a CSV file
    ImportRecords {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Reconcile planned slots against submitted records for a date
    Reconcile {
        #[arg(long)]
        date: NaiveDate,
        #[arg(long, value_enum, default_value = "admin")]
        role: Role,
        /// Viewer email, required for the faculty role
        #[arg(long)]
        email: Option<String>,
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Generate the daily report
    Report {
        #[arg(long)]
        date: NaiveDate,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
        /// Also write the report rows as JSON for the PDF/Excel writers
        #[arg(long)]
        json: Option<PathBuf>,
    },
    /// Approve a date, freezing its records and reconciliation output
    Approve {
        #[arg(long)]
        date: NaiveDate,
        #[arg(long)]
        approved_by: String,
        #[arg(long)]
        email: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let database_url = std::env::var("DATABASE_URL")
        .context("DATABASE_URL must be set to a production Postgres instance")?;

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
        Commands::ImportTimetable { csv } => {
            let (inserted, skipped) = db::import_timetable_csv(&pool, &csv).await?;
            println!(
                "Inserted {inserted} slots from {} ({skipped} skipped for bad times).",
                csv.display()
            );
        }
        Commands::ImportRecords { csv } => {
            let (inserted, locked) = db::import_records_csv(&pool, &csv).await?;
            println!(
                "Inserted {inserted} records from {} ({locked} skipped on approved dates).",
                csv.display()
            );
        }
        Commands::Reconcile {
            date,
            role,
            email,
            json,
        } => {
            let viewer = match role {
                Role::Admin => Viewer::Admin,
                Role::Hod => Viewer::Hod,
                Role::Faculty => {
                    let email = email.context("--email is required for the faculty role")?;
                    let faculty = db::list_faculty(&pool).await?;
                    Viewer::Faculty {
                        faculty_id: reconcile::resolve_faculty_id(&faculty, &email),
                    }
                }
            };

            let weekday = reconcile::weekday_name(date);
            let slots = db::list_slots_for_weekday(&pool, &weekday).await?;
            let records = db::list_records_for_date(&pool, date).await?;
            let approval = db::get_approval(&pool, date).await?;
            let entries = reconcile::reconcile(&slots, &records, approval.as_ref(), viewer);

            if json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
                return Ok(());
            }

            if entries.is_empty() {
                println!("No slots visible for {date} ({weekday}).");
                return Ok(());
            }

            println!("Reconciliation for {date} ({weekday}):");
            for entry in &entries {
                println!(
                    "- {} {} {} | {} {} - {} | room {} | {}",
                    entry.slot.semester,
                    entry.slot.division,
                    entry.slot.subject_name,
                    entry.slot.day_of_week,
                    entry.slot.start_time.format("%H:%M"),
                    entry.slot.end_time.format("%H:%M"),
                    entry.slot.room_no,
                    entry.status
                );
            }
        }
        Commands::Report { date, out, json } => {
            let weekday = reconcile::weekday_name(date);
            let slots = db::list_slots_for_weekday(&pool, &weekday).await?;
            let records = db::list_records_for_date(&pool, date).await?;
            let approval = db::get_approval(&pool, date).await?;

            let rows = report::project_report(&slots, &records);
            let rendered = report::render_report(date, &rows, approval.as_ref());
            std::fs::write(&out, rendered)?;
            println!("Report written to {}.", out.display());

            if let Some(json_path) = json {
                std::fs::write(&json_path, serde_json::to_string_pretty(&rows)?)?;
                println!("Report rows written to {}.", json_path.display());
            }
        }
        Commands::Approve {
            date,
            approved_by,
            email,
        } => {
            db::upsert_approval(&pool, date, &approved_by, email.as_deref()).await?;
            println!("Records for {date} approved and locked.");
        }
    }

    Ok(())
}
