use crate::config::ApiConfig;
use crate::database::{check_existing_draws, save_multiple_draws};
use crate::types::{DrawRecord, LottoResponse};
use anyhow::{Context, Result, bail};
use reqwest::StatusCode;
use rusqlite::Connection;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Largest `from..=to` span accepted by `fetch_and_save_range`.
pub const MAX_FETCH_SPAN: u32 = 5_000;

const RETRYABLE_STATUSES: [StatusCode; 5] = [
    StatusCode::TOO_MANY_REQUESTS,
    StatusCode::INTERNAL_SERVER_ERROR,
    StatusCode::BAD_GATEWAY,
    StatusCode::SERVICE_UNAVAILABLE,
    StatusCode::GATEWAY_TIMEOUT,
];

pub fn is_retryable(status: StatusCode) -> bool {
    RETRYABLE_STATUSES.contains(&status)
}

/// `backoff * 2^attempt`: 1s, 2s, 4s, ... for a one second base.
pub fn backoff_delay(backoff: Duration, attempt: u32) -> Duration {
    backoff.saturating_mul(1u32 << attempt.min(16))
}

pub fn draw_url(base_url: &str, draw_no: u32) -> String {
    format!("{}?method=getLottoNumber&drwNo={}", base_url, draw_no)
}

pub fn build_client(config: &ApiConfig) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(config.timeout)
        .build()
        .context("failed to build HTTP client")
}

pub async fn fetch_lotto_response(
    client: &reqwest::Client,
    config: &ApiConfig,
    draw_no: u32,
) -> Result<LottoResponse> {
    let url = draw_url(&config.base_url, draw_no);
    let mut attempt = 0;

    loop {
        match client.get(&url).send().await {
            Ok(response) => {
                let status = response.status();
                if status.is_success() {
                    return response
                        .json::<LottoResponse>()
                        .await
                        .with_context(|| format!("draw {}: unreadable response body", draw_no));
                }
                if !is_retryable(status) || attempt >= config.max_retries {
                    bail!("draw {}: HTTP {}", draw_no, status);
                }
                warn!(draw_no, %status, attempt, "retryable status");
            }
            Err(e) => {
                if attempt >= config.max_retries {
                    return Err(e).with_context(|| format!("draw {}: request failed", draw_no));
                }
                warn!(draw_no, error = %e, attempt, "request failed");
            }
        }

        tokio::time::sleep(backoff_delay(config.backoff, attempt)).await;
        attempt += 1;
    }
}

/// Fetches one draw. `Ok(None)` means the operator has not published it.
pub async fn fetch_draw(
    client: &reqwest::Client,
    config: &ApiConfig,
    draw_no: u32,
) -> Result<Option<DrawRecord>> {
    let response = fetch_lotto_response(client, config, draw_no).await?;
    let record = response.into_record()?;
    if let Some(record) = &record {
        if record.draw.draw_number() != draw_no {
            bail!(
                "asked for draw {} but received draw {}",
                draw_no,
                record.draw.draw_number()
            );
        }
    }
    Ok(record)
}

/// Fetches `from..=to`, skipping stored draws, and saves what came back.
/// Stops at the first draw the operator has not published, since later ones
/// cannot exist either.
pub async fn fetch_and_save_range(
    conn: &Connection,
    client: &reqwest::Client,
    config: &ApiConfig,
    from: u32,
    to: u32,
) -> Result<Vec<DrawRecord>> {
    if from == 0 || from > to {
        bail!("invalid draw range {}..={}", from, to);
    }
    if to - from >= MAX_FETCH_SPAN {
        bail!(
            "draw range {}..={} is too large (at most {} draws per call)",
            from,
            to,
            MAX_FETCH_SPAN
        );
    }

    let requested: Vec<u32> = (from..=to).collect();
    let (to_fetch, existing) = check_existing_draws(conn, &requested)?;

    if !existing.is_empty() {
        info!(count = existing.len(), "draws already stored, skipping");
    }
    if to_fetch.is_empty() {
        return Ok(Vec::new());
    }

    info!(count = to_fetch.len(), from, to, "fetching draws");
    let mut fetched = Vec::new();

    for (i, &draw_no) in to_fetch.iter().enumerate() {
        match fetch_draw(client, config, draw_no).await {
            Ok(Some(record)) => {
                debug!(draw_no, date = %record.draw.draw_date(), "fetched");
                fetched.push(record);
            }
            Ok(None) => {
                info!(draw_no, "no result published yet, stopping");
                break;
            }
            Err(e) => warn!(draw_no, error = %e, "fetch failed, skipping"),
        }

        if i + 1 < to_fetch.len() && !config.request_delay.is_zero() {
            tokio::time::sleep(config.request_delay).await;
        }
    }

    if !fetched.is_empty() {
        let inserted = save_multiple_draws(conn, &fetched)?;
        info!(inserted, "saved new draws");
    } else {
        warn!("no new draws were fetched");
    }

    Ok(fetched)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_statuses() {
        assert!(is_retryable(StatusCode::TOO_MANY_REQUESTS));
        assert!(is_retryable(StatusCode::SERVICE_UNAVAILABLE));
        assert!(!is_retryable(StatusCode::NOT_FOUND));
        assert!(!is_retryable(StatusCode::NOT_IMPLEMENTED));
    }

    #[test]
    fn test_backoff_doubles() {
        let base = Duration::from_secs(1);
        let delays: Vec<u64> = (0..5).map(|a| backoff_delay(base, a).as_secs()).collect();
        assert_eq!(delays, vec![1, 2, 4, 8, 16]);
    }

    #[test]
    fn test_draw_url() {
        assert_eq!(
            draw_url("https://dhlottery.co.kr/common.do", 1154),
            "https://dhlottery.co.kr/common.do?method=getLottoNumber&drwNo=1154"
        );
    }

    #[tokio::test]
    async fn test_invalid_range_rejected() {
        let conn = Connection::open_in_memory().unwrap();
        crate::database::create_database_with_connection(&conn).unwrap();
        let config = ApiConfig::default();
        let client = build_client(&config).unwrap();
        assert!(fetch_and_save_range(&conn, &client, &config, 5, 4).await.is_err());
        assert!(fetch_and_save_range(&conn, &client, &config, 0, 4).await.is_err());
    }

    #[tokio::test]
    async fn test_oversized_range_rejected_before_any_request() {
        let conn = Connection::open_in_memory().unwrap();
        crate::database::create_database_with_connection(&conn).unwrap();
        let config = ApiConfig {
            base_url: "http://127.0.0.1:9/common.do".to_string(),
            max_retries: 0,
            ..ApiConfig::default()
        };
        let client = build_client(&config).unwrap();

        let err = fetch_and_save_range(&conn, &client, &config, 1, u32::MAX)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("too large"));
        assert!(
            fetch_and_save_range(&conn, &client, &config, 10, 10 + MAX_FETCH_SPAN)
                .await
                .is_err()
        );
    }
}
