use crate::config::Locale;
use crate::matcher::{CandidateSet, Draw, Tier, TierSummary, evaluate};
use crate::stats::NumberFrequency;
use crate::utils::format_numbers;

/// Text pieces used when rendering a `TierSummary`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryFormat {
    /// Labels for `Tier::PRIZES`, in rank order.
    pub labels: [String; 4],
    /// Appended directly after a count: "1st 2times".
    pub count_suffix: String,
    pub entry_separator: String,
    pub detail_separator: String,
    pub occurrence_separator: String,
    pub no_win: String,
}

impl Default for SummaryFormat {
    fn default() -> Self {
        Self {
            labels: ["1st", "2nd", "3rd", "4th"].map(String::from),
            count_suffix: "times".to_string(),
            entry_separator: ", ".to_string(),
            detail_separator: "; ".to_string(),
            occurrence_separator: ", ".to_string(),
            no_win: "no win".to_string(),
        }
    }
}

impl SummaryFormat {
    /// Labels used by the wish spreadsheets: "1등 2회", "낙첨".
    pub fn korean() -> Self {
        Self {
            labels: ["1등", "2등", "3등", "4등"].map(String::from),
            count_suffix: "회".to_string(),
            no_win: "낙첨".to_string(),
            ..Self::default()
        }
    }

    pub fn for_locale(locale: Locale) -> Self {
        match locale {
            Locale::En => Self::default(),
            Locale::Ko => Self::korean(),
        }
    }

    pub fn label(&self, tier: Tier) -> &str {
        match tier {
            Tier::First => &self.labels[0],
            Tier::Second => &self.labels[1],
            Tier::Third => &self.labels[2],
            Tier::Fourth => &self.labels[3],
            Tier::NoPrize => &self.no_win,
        }
    }
}

/// Returns `(short, detail)`, e.g. `("1st 1times, 4th 2times", "1st: 102; 4th: 101, 103")`.
pub fn format_summary(summary: &TierSummary, format: &SummaryFormat) -> (String, String) {
    if !summary.is_win() {
        return (format.no_win.clone(), String::new());
    }

    let winning: Vec<_> = summary.iter().filter(|(_, stats)| stats.count > 0).collect();

    let short = winning
        .iter()
        .map(|(tier, stats)| {
            format!("{} {}{}", format.label(*tier), stats.count, format.count_suffix)
        })
        .collect::<Vec<_>>()
        .join(&format.entry_separator);

    let detail = winning
        .iter()
        .map(|(tier, stats)| {
            let draws = stats
                .occurrences
                .iter()
                .map(|n| n.to_string())
                .collect::<Vec<_>>()
                .join(&format.occurrence_separator);
            format!("{}: {}", format.label(*tier), draws)
        })
        .collect::<Vec<_>>()
        .join(&format.detail_separator);

    (short, detail)
}

/// Per-draw listing of every winning draw, grouped by tier.
pub fn render_check_report(
    candidate: &CandidateSet,
    draws: &[Draw],
    format: &SummaryFormat,
) -> String {
    let results = evaluate(candidate, draws);

    let mut report = String::new();
    for tier in Tier::PRIZES {
        let hits: Vec<_> = draws
            .iter()
            .zip(&results)
            .filter(|(_, result)| result.tier == tier)
            .collect();
        if hits.is_empty() {
            continue;
        }

        report.push_str(&format!("\n=== {} ===\n", format.label(tier)));
        for (draw, result) in hits {
            report.push_str(&format!(
                "draw {} ({}): {}",
                result.draw_number,
                result.draw_date,
                format_numbers(draw.main_numbers())
            ));
            if tier == Tier::Second {
                report.push_str(&format!(" + bonus {}", draw.bonus_number()));
            }
            report.push('\n');
        }
    }

    if report.is_empty() {
        report = format!(
            "{}: {} did not match any past draw\n",
            format.no_win,
            format_numbers(candidate.numbers())
        );
    }
    report
}

pub fn render_frequency(frequencies: &[NumberFrequency]) -> String {
    let mut out = String::from("=== number frequency (1-45) ===\n");
    for entry in frequencies {
        out.push_str(&format!("{:>2}: {}\n", entry.number, entry.count));
    }
    out
}
