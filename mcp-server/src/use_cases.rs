use anyhow::Result;
use chrono::Local;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use lotto_lib::api::fetch_and_save_range;
use lotto_lib::config::Config;
use lotto_lib::database::*;
use lotto_lib::matcher::{CandidateSet, TierSummary, evaluate};
use lotto_lib::reports::{SummaryFormat, format_summary};
use lotto_lib::scheduler::run_update;
use lotto_lib::stats::number_frequency;
use lotto_lib::utils::{parse_draw_date, parse_numbers};
use lotto_lib::wish::check_wish_file;

fn required_str<'a>(arguments: &'a HashMap<String, Value>, key: &str) -> Result<&'a str> {
    arguments
        .get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| anyhow::anyhow!("Missing {} parameter", key))
}

fn required_u32(arguments: &HashMap<String, Value>, key: &str) -> Result<u32> {
    let value = arguments
        .get(key)
        .and_then(|v| v.as_u64())
        .ok_or_else(|| anyhow::anyhow!("Missing {} parameter", key))?;
    u32::try_from(value).map_err(|_| anyhow::anyhow!("{} is too large", key))
}

fn optional_u32(arguments: &HashMap<String, Value>, key: &str, default: u32) -> Result<u32> {
    if arguments.contains_key(key) {
        required_u32(arguments, key)
    } else {
        Ok(default)
    }
}

/// Accepts `[1, 2, 3, 4, 5, 6]` or `"1, 2, 3, 4, 5, 6"`.
fn numbers_argument(arguments: &HashMap<String, Value>) -> Result<Vec<i64>> {
    match arguments.get("numbers") {
        Some(Value::Array(items)) => items
            .iter()
            .map(|v| {
                v.as_i64()
                    .ok_or_else(|| anyhow::anyhow!("numbers must be integers, got {}", v))
            })
            .collect(),
        Some(Value::String(raw)) => parse_numbers(raw),
        _ => Err(anyhow::anyhow!("Missing numbers parameter")),
    }
}

pub struct DrawUseCase {
    connection: Arc<rusqlite::Connection>,
}

impl DrawUseCase {
    pub fn new(connection: Arc<rusqlite::Connection>) -> Self {
        Self { connection }
    }

    pub async fn get_latest_draws(&self, arguments: &HashMap<String, Value>) -> Result<String> {
        let limit = optional_u32(arguments, "limit", 10)?;
        let results = get_latest_draws(&self.connection, limit)?;

        Ok(json!({
            "success": true,
            "results": results
        })
        .to_string())
    }

    pub async fn get_draw(&self, arguments: &HashMap<String, Value>) -> Result<String> {
        let draw_no = required_u32(arguments, "draw_no")?;
        let result = get_draw_by_number(&self.connection, draw_no)?;

        Ok(json!({
            "success": true,
            "result": result
        })
        .to_string())
    }

    pub async fn get_draws_by_date_range(
        &self,
        arguments: &HashMap<String, Value>,
    ) -> Result<String> {
        let start_date = parse_draw_date(required_str(arguments, "start_date")?)?;
        let end_date = parse_draw_date(required_str(arguments, "end_date")?)?;
        let results = get_draws_by_date_range(&self.connection, start_date, end_date)?;

        Ok(json!({
            "success": true,
            "results": results
        })
        .to_string())
    }

    pub async fn number_frequency(&self, arguments: &HashMap<String, Value>) -> Result<String> {
        let draws = match arguments.get("last") {
            Some(_) => {
                let last = required_u32(arguments, "last")?;
                get_latest_draws(&self.connection, last)?
                    .into_iter()
                    .map(|record| record.draw)
                    .collect()
            }
            None => load_draws(&self.connection)?,
        };

        Ok(json!({
            "success": true,
            "draws_counted": draws.len(),
            "frequency": number_frequency(&draws)
        })
        .to_string())
    }
}

pub struct CheckUseCase {
    connection: Arc<rusqlite::Connection>,
    format: SummaryFormat,
}

impl CheckUseCase {
    pub fn new(connection: Arc<rusqlite::Connection>, format: SummaryFormat) -> Self {
        Self { connection, format }
    }

    pub async fn check_numbers(&self, arguments: &HashMap<String, Value>) -> Result<String> {
        let candidate = CandidateSet::new(numbers_argument(arguments)?)?;
        let draws = load_draws(&self.connection)?;

        let results = evaluate(&candidate, &draws);
        let summary = TierSummary::from_results(&results);
        let (short, detail) = format_summary(&summary, &self.format);
        let wins: Vec<_> = results.iter().filter(|r| r.tier.is_prize()).collect();

        Ok(json!({
            "success": true,
            "numbers": candidate,
            "draws_checked": draws.len(),
            "result": short,
            "details": detail,
            "summary": summary,
            "wins": wins
        })
        .to_string())
    }

    pub async fn check_wish_file(&self, arguments: &HashMap<String, Value>) -> Result<String> {
        let path = required_str(arguments, "path")?;
        let draws = load_draws(&self.connection)?;
        let outcomes = check_wish_file(Path::new(path), &draws, &self.format)?;

        Ok(json!({
            "success": true,
            "rows": outcomes.len(),
            "outcomes": outcomes
        })
        .to_string())
    }
}

pub struct FetchUseCase {
    connection: Arc<rusqlite::Connection>,
    client: reqwest::Client,
    config: Config,
}

impl FetchUseCase {
    pub fn new(
        connection: Arc<rusqlite::Connection>,
        client: reqwest::Client,
        config: Config,
    ) -> Self {
        Self {
            connection,
            client,
            config,
        }
    }

    pub async fn fetch_draws(&self, arguments: &HashMap<String, Value>) -> Result<String> {
        let from = required_u32(arguments, "from")?;
        let to = required_u32(arguments, "to")?;
        let results =
            fetch_and_save_range(&self.connection, &self.client, &self.config.api, from, to).await?;

        Ok(json!({
            "success": true,
            "results_count": results.len(),
            "results": results
        })
        .to_string())
    }

    pub async fn update_draws(&self, _arguments: &HashMap<String, Value>) -> Result<String> {
        let today = Local::now().date_naive();
        let results = run_update(&self.connection, &self.client, &self.config, today).await?;
        let latest = get_latest_draw(&self.connection)?;

        Ok(json!({
            "success": true,
            "results_count": results.len(),
            "results": results,
            "latest": latest
        })
        .to_string())
    }
}
