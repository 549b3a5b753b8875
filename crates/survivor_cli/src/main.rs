//! `survivor` command-line front end.
//!
//! # Responsibility
//! - Open the game database and dispatch one game operation per invocation.
//! - Print results as JSON; failures print `{"ok": false, ...}` and exit 1.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use survivor_core::db::open_db;
use survivor_core::{
    default_log_level, init_logging, GameConfig, Match, MatchDraft, MatchListQuery, MatchStatus,
    SqliteGameRepository, SurvivorService, User,
};

#[derive(Parser)]
#[command(name = "survivor")]
#[command(version)]
#[command(about = "Esports survivor prediction game: one match, one pick, one life")]
struct Cli {
    /// Path to the SQLite database file
    #[arg(short, long, global = true, default_value = "survivor.sqlite3")]
    database: PathBuf,

    /// Optional TOML game configuration
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Absolute directory for rotating log files; logging is off when absent
    #[arg(long, global = true)]
    log_dir: Option<String>,

    /// Log level (trace|debug|info|warn|error)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch the user registered under an email, creating it when absent
    Login {
        #[arg(short, long)]
        email: String,
    },
    /// Show the user's active match, assigning one when none is active
    CurrentMatch {
        #[arg(short, long)]
        email: String,
    },
    /// Pick the winner of the user's assigned match
    Pick {
        #[arg(short, long)]
        email: String,
        #[arg(short = 'm', long = "match")]
        match_id: String,
        #[arg(short, long)]
        team: String,
    },
    /// Declare a match winner and score every pick on it
    Complete {
        #[arg(short = 'm', long = "match")]
        match_id: String,
        #[arg(short, long)]
        winner: String,
    },
    /// Users ordered by rank
    Leaderboard,
    /// Pick history of one user
    Picks {
        #[arg(short, long)]
        email: String,
    },
    /// Pick statistics of one user
    Stats {
        #[arg(short, long)]
        email: String,
    },
    /// List scheduled matches
    Matches {
        #[arg(short, long)]
        status: Option<StatusArg>,
        #[arg(long)]
        stage: Option<String>,
    },
    /// Add one upcoming match
    AddMatch {
        #[arg(long)]
        id: String,
        #[arg(long)]
        team_a: String,
        #[arg(long)]
        team_b: String,
        #[arg(long)]
        stage: String,
        /// RFC 3339 start time, e.g. 2025-08-29T18:00:00Z
        #[arg(long)]
        start: String,
    },
    /// Import a JSON array of matches (`id, team_a, team_b, stage, start_time`)
    ImportSchedule {
        #[arg(short, long)]
        file: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum StatusArg {
    Upcoming,
    Completed,
}

impl From<StatusArg> for MatchStatus {
    fn from(value: StatusArg) -> Self {
        match value {
            StatusArg::Upcoming => MatchStatus::Upcoming,
            StatusArg::Completed => MatchStatus::Completed,
        }
    }
}

#[derive(Serialize)]
struct Failure {
    ok: bool,
    message: String,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            log::warn!("event=cli_command module=cli status=error error={err:#}");
            let failure = Failure {
                ok: false,
                message: format!("{err:#}"),
            };
            match serde_json::to_string_pretty(&failure) {
                Ok(text) => println!("{text}"),
                Err(_) => eprintln!("{err:#}"),
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<String> {
    if let Some(log_dir) = &cli.log_dir {
        let level = cli.log_level.as_deref().unwrap_or(default_log_level());
        init_logging(level, log_dir).context("failed to initialize logging")?;
    }

    let config = match &cli.config {
        Some(path) => GameConfig::load(path)?,
        None => GameConfig::default(),
    };
    let conn = open_db(&cli.database)
        .with_context(|| format!("failed to open database `{}`", cli.database.display()))?;
    let repo = SqliteGameRepository::try_new(&conn)?;
    let service = SurvivorService::new(repo, config);

    let json = match cli.command {
        Commands::Login { email } => to_json(&service.login(&email)?)?,
        Commands::CurrentMatch { email } => {
            let user = service.login(&email)?;
            to_json(&service.current_match(user.id)?)?
        }
        Commands::Pick {
            email,
            match_id,
            team,
        } => {
            let user = service.login(&email)?;
            to_json(&service.submit_pick(user.id, &match_id, &team)?)?
        }
        Commands::Complete { match_id, winner } => {
            to_json(&service.complete_match(&match_id, &winner)?)?
        }
        Commands::Leaderboard => to_json(&service.leaderboard()?)?,
        Commands::Picks { email } => {
            let user = existing_user(&service, &email)?;
            to_json(&service.user_picks(user.id)?)?
        }
        Commands::Stats { email } => {
            let user = existing_user(&service, &email)?;
            to_json(&service.user_stats(user.id)?)?
        }
        Commands::Matches { status, stage } => to_json(&service.list_matches(&MatchListQuery {
            status: status.map(MatchStatus::from),
            stage,
        })?)?,
        Commands::AddMatch {
            id,
            team_a,
            team_b,
            stage,
            start,
        } => {
            let game: Match = MatchDraft {
                id,
                team_a,
                team_b,
                stage,
                start_time: start,
            }
            .into_match()?;
            to_json(&service.add_match(game)?)?
        }
        Commands::ImportSchedule { file } => {
            let text = std::fs::read_to_string(&file)
                .with_context(|| format!("failed to read schedule `{}`", file.display()))?;
            let drafts: Vec<MatchDraft> =
                serde_json::from_str(&text).context("schedule must be a JSON array of matches")?;
            let imported = service.import_schedule(drafts)?;
            to_json(&serde_json::json!({ "ok": true, "imported": imported }))?
        }
    };
    Ok(json)
}

/// Read-only commands must not register new users as a side effect.
fn existing_user(
    service: &SurvivorService<SqliteGameRepository<'_>>,
    email: &str,
) -> Result<User> {
    service
        .find_user(email)?
        .with_context(|| format!("no user registered under `{}`", email.trim()))
}

fn to_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).context("failed to encode output")
}
