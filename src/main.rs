use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;

use std::sync::Arc;

use codeboard::config::Config;
use codeboard::db::Database;
use codeboard::leaderboard::SystemClock;
use codeboard::models::{Family, NATIONAL_REFERENCE, Scope, Snapshot};
use codeboard::pipeline::Pipeline;
use codeboard::platforms::Platforms;
use codeboard::{score, seed};

#[derive(Parser)]
#[command(name = "codeboard")]
#[command(about = "Coding-platform stats refresh and leaderboard builder", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Refresh every student's stats, then rebuild all leaderboards
    Run,
    /// Refresh stats and scores only
    Refresh,
    /// Rebuild leaderboards from the stored scores
    Leaderboards,
    /// Run the full pipeline every REFRESH_INTERVAL_HOURS
    Watch,
    /// Load a small demo hierarchy with students
    Seed,
    /// Show a student's stored counters and how their score adds up
    Score { student_id: String },
    /// Print a stored leaderboard snapshot as JSON
    Show {
        #[arg(value_enum)]
        family: FamilyArg,
        scope: Scope,
        /// City, state or entity id; defaults to the national reference for national scope
        reference: Option<String>,
        /// Print ranked rows instead of JSON
        #[arg(long)]
        table: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum FamilyArg {
    Students,
    Colleges,
}

impl From<FamilyArg> for Family {
    fn from(arg: FamilyArg) -> Self {
        match arg {
            FamilyArg::Students => Family::Students,
            FamilyArg::Colleges => Family::Colleges,
        }
    }
}

fn print_snapshot<E>(snapshot: Option<Snapshot<E>>, scope: Scope, reference: &str, table: bool) -> Result<()>
where
    E: Serialize + std::fmt::Display,
{
    match snapshot {
        Some(snapshot) if table => {
            println!("{scope} leaderboard for {reference} (generated {})", snapshot.generated_at);
            for entry in &snapshot.entries {
                println!("{entry}");
            }
        }
        Some(snapshot) => {
            let json = serde_json::to_string_pretty(&snapshot).context("Could not render snapshot.")?;
            println!("{json}");
        }
        None => println!("No leaderboard found for {scope} {reference}."),
    }
    Ok(())
}

fn show(db: &Database, family: Family, scope: Scope, reference: Option<String>, table: bool) -> Result<()> {
    if family == Family::Colleges && !Scope::INSTITUTION.contains(&scope) {
        bail!("College leaderboards exist only for city, state and national scope.");
    }

    let reference = match (reference, scope) {
        (Some(reference), _) => reference,
        (None, Scope::National) => String::from(NATIONAL_REFERENCE),
        (None, _) => {
            let references = db.query_leaderboard_references(family, scope)?;
            if references.is_empty() {
                println!("No {scope} leaderboards have been built yet.");
            } else {
                println!("Available {scope} leaderboards:");
                for reference in references {
                    println!("- {reference}");
                }
            }
            return Ok(());
        }
    };

    match family {
        Family::Students => {
            print_snapshot(db.query_student_leaderboard(scope, &reference)?, scope, &reference, table)
        }
        Family::Colleges => {
            print_snapshot(db.query_college_leaderboard(scope, &reference)?, scope, &reference, table)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Begin logger
    env_logger::init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    let db = Database::open(&config.db_path)
        .with_context(|| format!("Could not open database at {}", config.db_path))?;
    let db = Arc::new(db);

    let pipeline = || -> Result<Pipeline> {
        let platforms = Platforms::from_config(&config)?;
        Ok(Pipeline::new(Arc::clone(&db), platforms, config.clone(), Arc::new(SystemClock)))
    };

    match cli.command {
        Commands::Run => println!("{}", pipeline()?.run().await?),
        Commands::Refresh => println!("{}", pipeline()?.refresh().await?),
        Commands::Leaderboards => {
            let (students, colleges) = pipeline()?.rebuild_leaderboards().await?;
            println!("Student leaderboards: {students}\nCollege leaderboards: {colleges}");
        }
        Commands::Watch => pipeline()?.watch().await,
        Commands::Seed => {
            let summary = seed::seed_demo(&db)?;
            println!("Seeded {summary}.");
        }
        Commands::Score { student_id } => match db.query_student(&student_id)? {
            Some(student) => {
                println!("{student}");
                println!("{}", score::breakdown(&student.counters));
            }
            None => println!("No student with id {student_id}."),
        },
        Commands::Show { family, scope, reference, table } => {
            show(&db, family.into(), scope, reference, table)?;
        }
    }

    Ok(())
}
