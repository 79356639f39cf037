use crate::database::{get_all_draws, save_multiple_draws};
use crate::matcher::Draw;
use crate::types::{DrawRecord, PrizeInfo};
use crate::utils::{DATE_FORMAT, parse_draw_date};
use anyhow::{Context, Result};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::info;

/// One line of `lotto_win_info.csv`.
#[derive(Debug, Serialize, Deserialize)]
struct DrawCsvRow {
    #[serde(rename = "회차")]
    draw_no: u32,
    #[serde(rename = "추첨일")]
    draw_date: String,
    #[serde(rename = "Num1")]
    num1: i64,
    #[serde(rename = "Num2")]
    num2: i64,
    #[serde(rename = "Num3")]
    num3: i64,
    #[serde(rename = "Num4")]
    num4: i64,
    #[serde(rename = "Num5")]
    num5: i64,
    #[serde(rename = "Num6")]
    num6: i64,
    #[serde(rename = "보너스")]
    bonus: i64,
    #[serde(rename = "총판매액", default)]
    total_sales: Option<i64>,
    #[serde(rename = "1등당첨금", default)]
    first_prize_total: Option<i64>,
    #[serde(rename = "1등당첨인원", default)]
    first_prize_winners: Option<i64>,
    #[serde(rename = "1등수령액", default)]
    first_prize_amount: Option<i64>,
}

impl DrawCsvRow {
    fn into_record(self) -> Result<DrawRecord> {
        let draw_date = parse_draw_date(&self.draw_date)?;
        let main = [
            self.num1, self.num2, self.num3, self.num4, self.num5, self.num6,
        ];
        let draw = Draw::new(self.draw_no, draw_date, main, self.bonus)?;
        Ok(DrawRecord {
            draw,
            prize: PrizeInfo {
                total_sales: self.total_sales.unwrap_or_default(),
                first_prize_total: self.first_prize_total.unwrap_or_default(),
                first_prize_winners: self.first_prize_winners.unwrap_or_default(),
                first_prize_amount: self.first_prize_amount.unwrap_or_default(),
            },
        })
    }

    fn from_record(record: &DrawRecord) -> Self {
        let n = record.draw.main_numbers();
        Self {
            draw_no: record.draw.draw_number(),
            draw_date: record.draw.draw_date().format(DATE_FORMAT).to_string(),
            num1: n[0].into(),
            num2: n[1].into(),
            num3: n[2].into(),
            num4: n[3].into(),
            num5: n[4].into(),
            num6: n[5].into(),
            bonus: record.draw.bonus_number().into(),
            total_sales: Some(record.prize.total_sales),
            first_prize_total: Some(record.prize.first_prize_total),
            first_prize_winners: Some(record.prize.first_prize_winners),
            first_prize_amount: Some(record.prize.first_prize_amount),
        }
    }
}

/// Reads a draw CSV, keeping the first row for each draw number.
pub fn read_draw_csv(path: &Path) -> Result<Vec<DrawRecord>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("cannot open {}", path.display()))?;

    let mut seen = HashSet::new();
    let mut records = Vec::new();
    for (i, row) in reader.deserialize::<DrawCsvRow>().enumerate() {
        let line = i + 2;
        let row = row.with_context(|| format!("{} line {}: unreadable row", path.display(), line))?;
        let record = row
            .into_record()
            .with_context(|| format!("{} line {}: invalid draw", path.display(), line))?;
        if seen.insert(record.draw.draw_number()) {
            records.push(record);
        }
    }
    Ok(records)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportResult {
    pub total_records: usize,
    pub inserted: usize,
    pub skipped: usize,
}

pub fn import_draw_csv(conn: &Connection, path: &Path) -> Result<ImportResult> {
    let records = read_draw_csv(path)?;
    let inserted = save_multiple_draws(conn, &records)?;
    let result = ImportResult {
        total_records: records.len(),
        inserted,
        skipped: records.len() - inserted,
    };
    info!(path = %path.display(), ?result, "imported draw file");
    Ok(result)
}

/// Writes every stored draw to `path` in ascending draw order.
pub fn export_draw_csv(conn: &Connection, path: &Path) -> Result<usize> {
    let records = get_all_draws(conn)?;
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("cannot create {}", path.display()))?;
    for record in &records {
        writer.serialize(DrawCsvRow::from_record(record))?;
    }
    writer.flush()?;
    Ok(records.len())
}
