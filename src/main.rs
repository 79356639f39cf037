use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use lotto_lib::api::{build_client, fetch_and_save_range};
use lotto_lib::config::{self, Config};
use lotto_lib::database::{count_draws, create_database, get_latest_draws, load_draws};
use lotto_lib::import::{export_draw_csv, import_draw_csv};
use lotto_lib::matcher::{CandidateSet, summarize};
use lotto_lib::reports::{SummaryFormat, format_summary, render_check_report, render_frequency};
use lotto_lib::scheduler::{run_update, run_weekly};
use lotto_lib::stats::number_frequency;
use lotto_lib::utils::{format_numbers, parse_numbers};
use lotto_lib::wish::check_wish_file;

#[derive(Parser)]
#[command(name = "lotto-checker", about = "Collect 6/45 draw results and check numbers against them")]
struct Cli {
    /// SQLite database path (overrides LOTTO_DB_PATH)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch a range of draws from the operator
    Fetch {
        #[arg(long, default_value = "1")]
        from: u32,
        #[arg(long)]
        to: u32,
    },

    /// Fetch every draw that is due but not stored yet
    Update,

    /// Update now and then every Saturday evening
    Watch,

    /// Check six numbers against every stored draw, e.g. `check 1,2,3,4,5,6`
    Check {
        #[arg(required = true, num_args = 1..)]
        numbers: Vec<String>,
    },

    /// Check every row of a wish file (.xlsx or .csv) and write Result/Details back
    Wishes {
        #[arg(short, long, default_value = "wish_number.xlsx")]
        file: PathBuf,
    },

    /// Show how often each number was drawn
    Frequency,

    /// List the latest stored draws
    List {
        #[arg(short, long, default_value = "10")]
        last: u32,
    },

    /// Import draws from a CSV file
    Import {
        #[arg(short, long, default_value = "lotto_win_info.csv")]
        file: PathBuf,
    },

    /// Export stored draws to a CSV file
    Export {
        #[arg(short, long, default_value = "lotto_win_info.csv")]
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = config::load()?;
    if let Some(db) = &cli.db {
        config.database_url = db.display().to_string();
    }

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let conn = create_database(Path::new(&config.database_url))
        .with_context(|| format!("cannot open database {}", config.database_url))?;
    let format = SummaryFormat::for_locale(config.locale);

    match cli.command {
        Command::Fetch { from, to } => cmd_fetch(&conn, &config, from, to).await,
        Command::Update => cmd_update(&conn, &config).await,
        Command::Watch => run_weekly(&conn, &config).await,
        Command::Check { numbers } => cmd_check(&conn, &numbers.join(" "), &format),
        Command::Wishes { file } => cmd_wishes(&conn, &file, &format),
        Command::Frequency => cmd_frequency(&conn),
        Command::List { last } => cmd_list(&conn, last),
        Command::Import { file } => {
            let result = import_draw_csv(&conn, &file)?;
            println!(
                "📥 {} draws read, {} inserted, {} already stored",
                result.total_records, result.inserted, result.skipped
            );
            Ok(())
        }
        Command::Export { file } => {
            let count = export_draw_csv(&conn, &file)?;
            println!("📤 {} draws written to {}", count, file.display());
            Ok(())
        }
    }
}

fn ensure_draws(conn: &Connection) -> Result<bool> {
    if count_draws(conn)? == 0 {
        println!("⚠ No draws stored. Run `lotto-checker update` or `lotto-checker import` first.");
        return Ok(false);
    }
    Ok(true)
}

async fn cmd_fetch(conn: &Connection, config: &Config, from: u32, to: u32) -> Result<()> {
    let client = build_client(&config.api)?;
    let fetched = fetch_and_save_range(conn, &client, &config.api, from, to).await?;
    println!("🎯 {} new draws saved", fetched.len());
    Ok(())
}

async fn cmd_update(conn: &Connection, config: &Config) -> Result<()> {
    let client = build_client(&config.api)?;
    let fetched = run_update(conn, &client, config, Local::now().date_naive()).await?;
    if fetched.is_empty() {
        println!("✅ Already up to date");
    }
    for record in &fetched {
        println!(
            "🎟️ Draw {} ({}): {} + {}",
            record.draw.draw_number(),
            record.draw.draw_date(),
            format_numbers(record.draw.main_numbers()),
            record.draw.bonus_number()
        );
    }
    Ok(())
}

fn cmd_check(conn: &Connection, input: &str, format: &SummaryFormat) -> Result<()> {
    let candidate = CandidateSet::new(parse_numbers(input)?).context("enter exactly six numbers")?;
    if !ensure_draws(conn)? {
        return Ok(());
    }

    let draws = load_draws(conn)?;
    let summary = summarize(&candidate, &draws);
    let (short, detail) = format_summary(&summary, format);

    print!("{}", render_check_report(&candidate, &draws, format));
    println!("\n{} → {}", format_numbers(candidate.numbers()), short);
    if !detail.is_empty() {
        println!("{}", detail);
    }
    Ok(())
}

fn cmd_wishes(conn: &Connection, file: &Path, format: &SummaryFormat) -> Result<()> {
    if !ensure_draws(conn)? {
        return Ok(());
    }

    let draws = load_draws(conn)?;
    let outcomes = check_wish_file(file, &draws, format)?;
    for outcome in &outcomes {
        println!(
            "#{:<3} {:<22} {}",
            outcome.row,
            format_numbers(outcome.candidate.numbers()),
            outcome.result
        );
    }
    println!("✅ {} rows updated in {}", outcomes.len(), file.display());
    Ok(())
}

fn cmd_frequency(conn: &Connection) -> Result<()> {
    if !ensure_draws(conn)? {
        return Ok(());
    }
    let draws = load_draws(conn)?;
    print!("{}", render_frequency(&number_frequency(&draws)));
    Ok(())
}

fn cmd_list(conn: &Connection, last: u32) -> Result<()> {
    if !ensure_draws(conn)? {
        return Ok(());
    }
    for record in get_latest_draws(conn, last)? {
        println!(
            "{:>5}  {}  {:<22} + {:<2}  1st: {} winners × {} KRW",
            record.draw.draw_number(),
            record.draw.draw_date(),
            format_numbers(record.draw.main_numbers()),
            record.draw.bonus_number(),
            record.prize.first_prize_winners,
            record.prize.first_prize_amount
        );
    }
    Ok(())
}
