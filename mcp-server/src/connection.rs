use anyhow::{Context, Result};
use rusqlite::Connection;
use std::path::Path;

pub fn conn(database_url: &str) -> Result<Connection> {
    lotto_lib::database::create_database(Path::new(database_url))
        .with_context(|| format!("cannot open database {}", database_url))
}
