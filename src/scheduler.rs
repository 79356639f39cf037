//! Weekly draw update.
//!
//! Each run catches up on every draw that is due but missing, so a process
//! that was down over one or more Saturdays recovers on the next start.

use crate::api::{build_client, fetch_draw};
use crate::config::Config;
use crate::database::{get_latest_draw, load_draws, save_draw};
use crate::reports::render_frequency;
use crate::stats::number_frequency;
use crate::types::DrawRecord;
use crate::utils::{DRAW_WEEKDAY, next_draw, next_run_after};
use anyhow::{Result, bail};
use chrono::{Local, NaiveDate};
use rusqlite::Connection;
use tracing::{error, info};

pub const FIRST_DRAW: u32 = 1;

/// Fetches and stores every due draw after the latest stored one.
pub async fn run_update(
    conn: &Connection,
    client: &reqwest::Client,
    config: &Config,
    today: NaiveDate,
) -> Result<Vec<DrawRecord>> {
    let mut fetched = Vec::new();

    let (mut latest_no, mut latest_date) = match get_latest_draw(conn)? {
        Some(record) => (record.draw.draw_number(), record.draw.draw_date()),
        None => {
            info!("no draws stored, starting from draw {}", FIRST_DRAW);
            match fetch_draw(client, &config.api, FIRST_DRAW).await? {
                Some(record) => {
                    save_draw(conn, &record)?;
                    let latest = (record.draw.draw_number(), record.draw.draw_date());
                    fetched.push(record);
                    latest
                }
                None => bail!("draw {} is not available", FIRST_DRAW),
            }
        }
    };
    info!(latest_no, %latest_date, "latest stored draw");

    while let Some((next_no, expected_date)) = next_draw(latest_no, latest_date, today) {
        if !config.api.request_delay.is_zero() && !fetched.is_empty() {
            tokio::time::sleep(config.api.request_delay).await;
        }

        let Some(record) = fetch_draw(client, &config.api, next_no).await? else {
            info!(next_no, %expected_date, "draw not published yet");
            break;
        };
        if record.draw.draw_date() <= latest_date {
            bail!(
                "draw {} dated {} does not follow draw {} dated {}",
                next_no,
                record.draw.draw_date(),
                latest_no,
                latest_date
            );
        }

        save_draw(conn, &record)?;
        info!(draw_no = next_no, date = %record.draw.draw_date(), "stored new draw");
        latest_no = next_no;
        latest_date = record.draw.draw_date();
        fetched.push(record);
    }

    Ok(fetched)
}

/// Runs one update and renders the number frequency of the store afterwards.
/// The table is produced whether or not anything new arrived.
pub async fn update_and_report(
    conn: &Connection,
    client: &reqwest::Client,
    config: &Config,
    today: NaiveDate,
) -> Result<String> {
    match run_update(conn, client, config, today).await {
        Ok(fetched) if fetched.is_empty() => info!("no new draws"),
        Ok(fetched) => info!(count = fetched.len(), "update finished"),
        Err(e) => error!(error = %e, "update failed"),
    }

    let draws = load_draws(conn)?;
    Ok(render_frequency(&number_frequency(&draws)))
}

async fn weekly_tick(conn: &Connection, client: &reqwest::Client, config: &Config) {
    match update_and_report(conn, client, config, Local::now().date_naive()).await {
        Ok(report) => println!("{}", report),
        Err(e) => error!(error = %e, "failed to load draws"),
    }
}

/// Updates now, then every `DRAW_WEEKDAY` at `config.draw_hour`, until the task is dropped.
pub async fn run_weekly(conn: &Connection, config: &Config) -> Result<()> {
    let client = build_client(&config.api)?;
    weekly_tick(conn, &client, config).await;

    loop {
        let now = Local::now().naive_local();
        let next = next_run_after(now, DRAW_WEEKDAY, config.draw_hour);
        info!(%next, "next update scheduled");

        let wait = (next - now).to_std().unwrap_or_default();
        tokio::time::sleep(wait).await;
        weekly_tick(conn, &client, config).await;
    }
}
