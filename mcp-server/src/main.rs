use anyhow::Result;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use lotto_lib::api::build_client;
use lotto_lib::config;
use lotto_lib::reports::SummaryFormat;
use lotto_mcp::connection::conn;
use lotto_mcp::{CheckUseCase, DrawUseCase, FetchUseCase, MCPHandler, stdio};

#[tokio::main]
async fn main() -> Result<()> {
    let config = config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    tracing::info!("Let's check your lotto numbers.");

    let db_conn = conn(&config.database_url)?;
    let db_conn_arc = Arc::new(db_conn);
    let client = build_client(&config.api)?;

    let draw_use_case = DrawUseCase::new(Arc::clone(&db_conn_arc));

    let check_use_case = CheckUseCase::new(
        Arc::clone(&db_conn_arc),
        SummaryFormat::for_locale(config.locale),
    );

    let fetch_use_case = FetchUseCase::new(Arc::clone(&db_conn_arc), client, config.clone());

    let handler = MCPHandler::new(
        Arc::new(draw_use_case),
        Arc::new(check_use_case),
        Arc::new(fetch_use_case),
    );

    let (reader, writer) = stdio();

    handler.serve(reader, writer).await.inspect_err(|e| {
        tracing::error!("serving error: {:?}", e);
    })?;

    Ok(())
}
