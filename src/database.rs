use crate::matcher::Draw;
use crate::types::{DrawRecord, PrizeInfo};
use crate::utils::DATE_FORMAT;
use chrono::NaiveDate;
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Params, Result, Row, params};
use std::fs;
use std::path::Path;

const DRAW_COLUMNS: &str = "draw_no, draw_date, num1, num2, num3, num4, num5, num6, bonus,
     total_sales, first_prize_total, first_prize_winners, first_prize_amount";

pub fn create_database(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_CANTOPEN),
                Some(format!("Failed to create directory {}: {}", parent.display(), e)),
            )
        })?;
    }

    let conn = Connection::open(path)?;
    create_database_with_connection(&conn)?;
    Ok(conn)
}

pub fn create_database_with_connection(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS draws (
            draw_no INTEGER PRIMARY KEY,
            draw_date TEXT NOT NULL,
            num1 INTEGER NOT NULL,
            num2 INTEGER NOT NULL,
            num3 INTEGER NOT NULL,
            num4 INTEGER NOT NULL,
            num5 INTEGER NOT NULL,
            num6 INTEGER NOT NULL,
            bonus INTEGER NOT NULL,
            total_sales INTEGER NOT NULL DEFAULT 0,
            first_prize_total INTEGER NOT NULL DEFAULT 0,
            first_prize_winners INTEGER NOT NULL DEFAULT 0,
            first_prize_amount INTEGER NOT NULL DEFAULT 0,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_draws_date ON draws (draw_date)",
        [],
    )?;
    Ok(())
}

/// Inserts the draw unless its number is already stored. Returns whether a row was added.
pub fn save_draw(conn: &Connection, record: &DrawRecord) -> Result<bool> {
    let n = record.draw.main_numbers();
    let changed = conn.execute(
        "INSERT OR IGNORE INTO draws (
            draw_no, draw_date, num1, num2, num3, num4, num5, num6, bonus,
            total_sales, first_prize_total, first_prize_winners, first_prize_amount
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        params![
            record.draw.draw_number(),
            record.draw.draw_date().format(DATE_FORMAT).to_string(),
            n[0],
            n[1],
            n[2],
            n[3],
            n[4],
            n[5],
            record.draw.bonus_number(),
            record.prize.total_sales,
            record.prize.first_prize_total,
            record.prize.first_prize_winners,
            record.prize.first_prize_amount,
        ],
    )?;
    Ok(changed > 0)
}

/// Saves all records in one transaction and returns how many were new.
pub fn save_multiple_draws(conn: &Connection, records: &[DrawRecord]) -> Result<usize> {
    let tx = conn.unchecked_transaction()?;
    let mut inserted = 0;
    for record in records {
        if save_draw(&tx, record)? {
            inserted += 1;
        }
    }
    tx.commit()?;
    Ok(inserted)
}

fn row_to_record(row: &Row) -> Result<DrawRecord> {
    let draw_no: u32 = row.get(0)?;
    let raw_date: String = row.get(1)?;
    let draw_date = NaiveDate::parse_from_str(&raw_date, DATE_FORMAT)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(1, Type::Text, Box::new(e)))?;

    let main = [
        row.get::<_, i64>(2)?,
        row.get::<_, i64>(3)?,
        row.get::<_, i64>(4)?,
        row.get::<_, i64>(5)?,
        row.get::<_, i64>(6)?,
        row.get::<_, i64>(7)?,
    ];
    let bonus: i64 = row.get(8)?;
    let draw = Draw::new(draw_no, draw_date, main, bonus)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(0, Type::Integer, Box::new(e)))?;

    Ok(DrawRecord {
        draw,
        prize: PrizeInfo {
            total_sales: row.get(9)?,
            first_prize_total: row.get(10)?,
            first_prize_winners: row.get(11)?,
            first_prize_amount: row.get(12)?,
        },
    })
}

fn query_draws<P: Params>(conn: &Connection, tail: &str, params: P) -> Result<Vec<DrawRecord>> {
    let sql = format!("SELECT {} FROM draws {}", DRAW_COLUMNS, tail);
    let mut stmt = conn.prepare(&sql)?;
    let records = stmt
        .query_map(params, row_to_record)?
        .collect::<Result<Vec<_>>>()?;
    Ok(records)
}

/// Every stored draw, oldest first.
pub fn get_all_draws(conn: &Connection) -> Result<Vec<DrawRecord>> {
    query_draws(conn, "ORDER BY draw_no ASC", [])
}

/// Immutable snapshot handed to the matcher.
pub fn load_draws(conn: &Connection) -> Result<Vec<Draw>> {
    Ok(get_all_draws(conn)?
        .into_iter()
        .map(|record| record.draw)
        .collect())
}

pub fn get_latest_draws(conn: &Connection, limit: u32) -> Result<Vec<DrawRecord>> {
    query_draws(conn, "ORDER BY draw_no DESC LIMIT ?1", [limit])
}

pub fn get_latest_draw(conn: &Connection) -> Result<Option<DrawRecord>> {
    Ok(get_latest_draws(conn, 1)?.into_iter().next())
}

pub fn get_draw_by_number(conn: &Connection, draw_no: u32) -> Result<Option<DrawRecord>> {
    let sql = format!("SELECT {} FROM draws WHERE draw_no = ?1", DRAW_COLUMNS);
    let mut stmt = conn.prepare(&sql)?;
    stmt.query_row([draw_no], row_to_record).optional()
}

pub fn get_draws_by_date_range(
    conn: &Connection,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Result<Vec<DrawRecord>> {
    query_draws(
        conn,
        "WHERE draw_date >= ?1 AND draw_date <= ?2 ORDER BY draw_no ASC",
        [
            start_date.format(DATE_FORMAT).to_string(),
            end_date.format(DATE_FORMAT).to_string(),
        ],
    )
}

pub fn draw_exists(conn: &Connection, draw_no: u32) -> Result<bool> {
    let mut stmt = conn.prepare("SELECT COUNT(*) FROM draws WHERE draw_no = ?1")?;
    let count: i64 = stmt.query_row([draw_no], |row| row.get(0))?;
    Ok(count > 0)
}

pub fn count_draws(conn: &Connection) -> Result<u32> {
    conn.query_row("SELECT COUNT(*) FROM draws", [], |row| row.get(0))
}

/// Splits requested draw numbers into (to fetch, already stored).
pub fn check_existing_draws(conn: &Connection, draw_nos: &[u32]) -> Result<(Vec<u32>, Vec<u32>)> {
    let mut to_fetch = Vec::new();
    let mut existing = Vec::new();

    for &draw_no in draw_nos {
        if draw_exists(conn, draw_no)? {
            existing.push(draw_no);
        } else {
            to_fetch.push(draw_no);
        }
    }

    Ok((to_fetch, existing))
}
