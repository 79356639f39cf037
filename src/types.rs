use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use crate::matcher::Draw;
use crate::utils::parse_draw_date;

/// Payload of `common.do?method=getLottoNumber`.
///
/// Only `returnValue` is present when the draw does not exist yet.
#[derive(Deserialize, Debug)]
pub struct LottoResponse {
    #[serde(rename = "returnValue")]
    pub return_value: String,
    #[serde(rename = "drwNo")]
    pub draw_no: Option<u32>,
    #[serde(rename = "drwNoDate")]
    pub draw_date: Option<String>,
    #[serde(rename = "drwtNo1")]
    pub num1: Option<i64>,
    #[serde(rename = "drwtNo2")]
    pub num2: Option<i64>,
    #[serde(rename = "drwtNo3")]
    pub num3: Option<i64>,
    #[serde(rename = "drwtNo4")]
    pub num4: Option<i64>,
    #[serde(rename = "drwtNo5")]
    pub num5: Option<i64>,
    #[serde(rename = "drwtNo6")]
    pub num6: Option<i64>,
    #[serde(rename = "bnusNo")]
    pub bonus: Option<i64>,
    #[serde(rename = "totSellamnt")]
    pub total_sales: Option<i64>,
    #[serde(rename = "firstAccumamnt")]
    pub first_prize_total: Option<i64>,
    #[serde(rename = "firstPrzwnerCo")]
    pub first_prize_winners: Option<i64>,
    #[serde(rename = "firstWinamnt")]
    pub first_prize_amount: Option<i64>,
}

impl LottoResponse {
    pub fn is_success(&self) -> bool {
        self.return_value == "success"
    }

    /// Validated record, or `None` when the operator has no result for the draw.
    pub fn into_record(self) -> Result<Option<DrawRecord>> {
        if !self.is_success() {
            return Ok(None);
        }

        let draw_no = self.draw_no.context("missing drwNo")?;
        let raw_date = self
            .draw_date
            .as_deref()
            .with_context(|| format!("draw {}: missing drwNoDate", draw_no))?;
        let draw_date = parse_draw_date(raw_date)?;

        let mains = [
            self.num1, self.num2, self.num3, self.num4, self.num5, self.num6,
        ];
        if mains.iter().any(Option::is_none) {
            bail!("draw {}: missing winning numbers", draw_no);
        }
        let bonus = self
            .bonus
            .with_context(|| format!("draw {}: missing bnusNo", draw_no))?;

        let draw = Draw::new(draw_no, draw_date, mains.into_iter().flatten(), bonus)
            .with_context(|| format!("draw {}: invalid numbers", draw_no))?;

        Ok(Some(DrawRecord {
            draw,
            prize: PrizeInfo {
                total_sales: self.total_sales.unwrap_or_default(),
                first_prize_total: self.first_prize_total.unwrap_or_default(),
                first_prize_winners: self.first_prize_winners.unwrap_or_default(),
                first_prize_amount: self.first_prize_amount.unwrap_or_default(),
            },
        }))
    }
}

/// Sales and first prize figures published with a draw, in KRW.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PrizeInfo {
    pub total_sales: i64,
    pub first_prize_total: i64,
    pub first_prize_winners: i64,
    pub first_prize_amount: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DrawRecord {
    #[serde(flatten)]
    pub draw: Draw,
    #[serde(flatten)]
    pub prize: PrizeInfo,
}
