//! Prize tier matching for 6/45 draws.
//!
//! `Draw` and `CandidateSet` can only be built through their validating
//! constructors, so `classify`, `evaluate` and `summarize` are total.

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

pub const MIN_NUMBER: i64 = 1;
pub const MAX_NUMBER: i64 = 45;
pub const PICK_COUNT: usize = 6;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InvalidInput {
    #[error("expected {expected} numbers, got {actual}")]
    WrongCount { expected: usize, actual: usize },
    #[error("number {0} is out of range (1-45)")]
    OutOfRange(i64),
    #[error("duplicate number {0}")]
    Duplicate(u8),
    #[error("bonus number {0} is one of the main numbers")]
    BonusCollision(u8),
    #[error("draw number must be positive")]
    ZeroDrawNumber,
}

/// Six distinct numbers in 1..=45, kept sorted with a bitmask for set ops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct NumberSet {
    numbers: [u8; PICK_COUNT],
    mask: u64,
}

impl NumberSet {
    fn new<I>(numbers: I) -> Result<Self, InvalidInput>
    where
        I: IntoIterator<Item = i64>,
    {
        let raw: Vec<i64> = numbers.into_iter().collect();
        if raw.len() != PICK_COUNT {
            return Err(InvalidInput::WrongCount {
                expected: PICK_COUNT,
                actual: raw.len(),
            });
        }

        let mut mask = 0u64;
        let mut sorted = [0u8; PICK_COUNT];
        for (slot, &n) in sorted.iter_mut().zip(&raw) {
            let n = to_number(n)?;
            let bit = 1u64 << n;
            if mask & bit != 0 {
                return Err(InvalidInput::Duplicate(n));
            }
            mask |= bit;
            *slot = n;
        }
        sorted.sort_unstable();

        Ok(Self {
            numbers: sorted,
            mask,
        })
    }

    fn contains(&self, n: u8) -> bool {
        self.mask & (1u64 << n) != 0
    }

    fn overlap(&self, other: &NumberSet) -> u32 {
        (self.mask & other.mask).count_ones()
    }
}

fn to_number(n: i64) -> Result<u8, InvalidInput> {
    if !(MIN_NUMBER..=MAX_NUMBER).contains(&n) {
        return Err(InvalidInput::OutOfRange(n));
    }
    Ok(n as u8)
}

/// A user-chosen ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CandidateSet {
    numbers: NumberSet,
}

impl CandidateSet {
    pub fn new<I>(numbers: I) -> Result<Self, InvalidInput>
    where
        I: IntoIterator<Item = i64>,
    {
        Ok(Self {
            numbers: NumberSet::new(numbers)?,
        })
    }

    /// Numbers in ascending order.
    pub fn numbers(&self) -> &[u8; PICK_COUNT] {
        &self.numbers.numbers
    }

    pub fn contains(&self, n: u8) -> bool {
        self.numbers.contains(n)
    }
}

impl Serialize for CandidateSet {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.numbers().serialize(serializer)
    }
}

/// One recorded draw result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Draw {
    draw_number: u32,
    draw_date: NaiveDate,
    main: NumberSet,
    bonus: u8,
}

impl Draw {
    pub fn new<I>(
        draw_number: u32,
        draw_date: NaiveDate,
        main_numbers: I,
        bonus_number: i64,
    ) -> Result<Self, InvalidInput>
    where
        I: IntoIterator<Item = i64>,
    {
        if draw_number == 0 {
            return Err(InvalidInput::ZeroDrawNumber);
        }
        let main = NumberSet::new(main_numbers)?;
        let bonus = to_number(bonus_number)?;
        if main.contains(bonus) {
            return Err(InvalidInput::BonusCollision(bonus));
        }

        Ok(Self {
            draw_number,
            draw_date,
            main,
            bonus,
        })
    }

    pub fn draw_number(&self) -> u32 {
        self.draw_number
    }

    pub fn draw_date(&self) -> NaiveDate {
        self.draw_date
    }

    /// Main numbers in ascending order.
    pub fn main_numbers(&self) -> &[u8; PICK_COUNT] {
        &self.main.numbers
    }

    pub fn bonus_number(&self) -> u8 {
        self.bonus
    }
}

impl Serialize for Draw {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;

        let mut state = serializer.serialize_struct("Draw", 4)?;
        state.serialize_field("draw_number", &self.draw_number)?;
        state.serialize_field("draw_date", &self.draw_date)?;
        state.serialize_field("main_numbers", self.main_numbers())?;
        state.serialize_field("bonus_number", &self.bonus)?;
        state.end()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Tier {
    First,
    Second,
    Third,
    Fourth,
    NoPrize,
}

impl Tier {
    /// Winning tiers in rank order.
    pub const PRIZES: [Tier; 4] = [Tier::First, Tier::Second, Tier::Third, Tier::Fourth];

    pub fn is_prize(self) -> bool {
        self != Tier::NoPrize
    }
}

pub fn classify(candidate: &CandidateSet, draw: &Draw) -> Tier {
    match candidate.numbers.overlap(&draw.main) {
        6 => Tier::First,
        5 if candidate.contains(draw.bonus) => Tier::Second,
        5 => Tier::Third,
        4 => Tier::Fourth,
        _ => Tier::NoPrize,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MatchResult {
    pub tier: Tier,
    pub draw_number: u32,
    pub draw_date: NaiveDate,
}

/// Classifies the candidate against every draw, in input order.
pub fn evaluate<'a, I>(candidate: &CandidateSet, draws: I) -> Vec<MatchResult>
where
    I: IntoIterator<Item = &'a Draw>,
{
    draws
        .into_iter()
        .map(|draw| MatchResult {
            tier: classify(candidate, draw),
            draw_number: draw.draw_number,
            draw_date: draw.draw_date,
        })
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TierStats {
    pub count: usize,
    pub occurrences: Vec<u32>,
}

impl TierStats {
    fn record(&mut self, draw_number: u32) {
        self.count += 1;
        self.occurrences.push(draw_number);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TierSummary {
    pub first: TierStats,
    pub second: TierStats,
    pub third: TierStats,
    pub fourth: TierStats,
}

impl TierSummary {
    pub fn from_results<'a, I>(results: I) -> Self
    where
        I: IntoIterator<Item = &'a MatchResult>,
    {
        let mut summary = Self::default();
        for result in results {
            if let Some(stats) = summary.get_mut(result.tier) {
                stats.record(result.draw_number);
            }
        }
        summary
    }

    /// Stats for a winning tier; `None` for `Tier::NoPrize`.
    pub fn get(&self, tier: Tier) -> Option<&TierStats> {
        match tier {
            Tier::First => Some(&self.first),
            Tier::Second => Some(&self.second),
            Tier::Third => Some(&self.third),
            Tier::Fourth => Some(&self.fourth),
            Tier::NoPrize => None,
        }
    }

    fn get_mut(&mut self, tier: Tier) -> Option<&mut TierStats> {
        match tier {
            Tier::First => Some(&mut self.first),
            Tier::Second => Some(&mut self.second),
            Tier::Third => Some(&mut self.third),
            Tier::Fourth => Some(&mut self.fourth),
            Tier::NoPrize => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Tier, &TierStats)> {
        Tier::PRIZES
            .into_iter()
            .filter_map(move |tier| self.get(tier).map(|stats| (tier, stats)))
    }

    pub fn total_wins(&self) -> usize {
        self.iter().map(|(_, stats)| stats.count).sum()
    }

    pub fn is_win(&self) -> bool {
        self.total_wins() > 0
    }
}

pub fn summarize<'a, I>(candidate: &CandidateSet, draws: I) -> TierSummary
where
    I: IntoIterator<Item = &'a Draw>,
{
    TierSummary::from_results(&evaluate(candidate, draws))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn draw(no: u32, main: [i64; 6], bonus: i64) -> Draw {
        Draw::new(no, date("2025-01-04"), main, bonus).unwrap()
    }

    fn candidate(numbers: [i64; 6]) -> CandidateSet {
        CandidateSet::new(numbers).unwrap()
    }

    fn reference_draw() -> Draw {
        draw(1, [1, 2, 3, 4, 5, 6], 7)
    }

    #[test]
    fn test_classify_first() {
        assert_eq!(classify(&candidate([1, 2, 3, 4, 5, 6]), &reference_draw()), Tier::First);
    }

    #[test]
    fn test_classify_second_needs_bonus() {
        assert_eq!(classify(&candidate([1, 2, 3, 4, 5, 7]), &reference_draw()), Tier::Second);
    }

    #[test]
    fn test_classify_third() {
        assert_eq!(classify(&candidate([1, 2, 3, 4, 5, 8]), &reference_draw()), Tier::Third);
    }

    #[test]
    fn test_classify_fourth() {
        assert_eq!(classify(&candidate([1, 2, 3, 4, 9, 10]), &reference_draw()), Tier::Fourth);
    }

    #[test]
    fn test_classify_three_matches_is_no_prize() {
        assert_eq!(
            classify(&candidate([1, 2, 3, 9, 10, 11]), &reference_draw()),
            Tier::NoPrize
        );
    }

    #[test]
    fn test_classify_four_with_bonus_stays_fourth() {
        assert_eq!(classify(&candidate([1, 2, 3, 4, 7, 10]), &reference_draw()), Tier::Fourth);
    }

    #[test]
    fn test_classify_full_tier_table() {
        let d = reference_draw();
        for overlap in 0..=6usize {
            for with_bonus in [false, true] {
                if with_bonus && overlap == 6 {
                    continue;
                }
                let mut numbers: Vec<i64> = (1..=overlap as i64).collect();
                if with_bonus {
                    numbers.push(7);
                }
                numbers.extend((20..).take(6 - numbers.len()));

                let expected = match (overlap, with_bonus) {
                    (6, _) => Tier::First,
                    (5, true) => Tier::Second,
                    (5, false) => Tier::Third,
                    (4, _) => Tier::Fourth,
                    _ => Tier::NoPrize,
                };
                let tier = classify(&CandidateSet::new(numbers.clone()).unwrap(), &d);
                assert_eq!(tier, expected, "{:?} vs {:?}", numbers, d.main_numbers());
            }
        }
    }

    #[test]
    fn test_classify_ignores_input_order() {
        let d = reference_draw();
        assert_eq!(classify(&candidate([6, 5, 4, 3, 2, 1]), &d), Tier::First);
        let shuffled = Draw::new(1, date("2025-01-04"), [6, 1, 5, 2, 4, 3], 7).unwrap();
        assert_eq!(classify(&candidate([7, 1, 2, 3, 4, 5]), &shuffled), Tier::Second);
    }

    #[test]
    fn test_classify_is_deterministic() {
        let c = candidate([1, 2, 3, 4, 5, 8]);
        let d = reference_draw();
        assert_eq!(classify(&c, &d), classify(&c, &d));
    }

    #[test]
    fn test_summarize_counts_and_order() {
        let c = candidate([1, 2, 3, 4, 5, 6]);
        let draws = vec![
            draw(101, [1, 2, 3, 4, 40, 41], 42),
            draw(102, [1, 2, 3, 4, 5, 6], 7),
            draw(103, [1, 2, 3, 4, 43, 44], 45),
        ];

        let summary = summarize(&c, &draws);
        assert_eq!(summary.first.count, 1);
        assert_eq!(summary.first.occurrences, vec![102]);
        assert_eq!(summary.fourth.count, 2);
        assert_eq!(summary.fourth.occurrences, vec![101, 103]);
        assert_eq!(summary.second, TierStats::default());
        assert_eq!(summary.third, TierStats::default());
        assert_eq!(summary.total_wins(), 3);
        assert_eq!(summary, summarize(&c, &draws));
    }

    #[test]
    fn test_summarize_preserves_input_order_not_draw_order() {
        let c = candidate([1, 2, 3, 4, 5, 6]);
        let draws = vec![
            draw(200, [1, 2, 3, 4, 40, 41], 42),
            draw(100, [1, 2, 3, 4, 43, 44], 45),
        ];
        assert_eq!(summarize(&c, &draws).fourth.occurrences, vec![200, 100]);
    }

    #[test]
    fn test_summarize_empty_is_no_win() {
        let summary = summarize(&candidate([1, 2, 3, 4, 5, 6]), std::iter::empty());
        assert!(!summary.is_win());
        assert_eq!(summary.iter().count(), 4);
    }

    #[test]
    fn test_evaluate_reports_every_draw() {
        let c = candidate([1, 2, 3, 4, 5, 6]);
        let draws = vec![reference_draw(), draw(2, [10, 11, 12, 13, 14, 15], 16)];

        let results = evaluate(&c, &draws);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].tier, Tier::First);
        assert_eq!(results[1].tier, Tier::NoPrize);
        assert_eq!(results[1].draw_number, 2);
        assert!(TierSummary::from_results(&results).get(Tier::NoPrize).is_none());
    }

    #[test]
    fn test_candidate_rejects_wrong_count() {
        assert_eq!(
            CandidateSet::new([1, 2, 3, 4, 5]),
            Err(InvalidInput::WrongCount { expected: 6, actual: 5 })
        );
        assert!(CandidateSet::new([1, 2, 3, 4, 5, 6, 7]).is_err());
    }

    #[test]
    fn test_candidate_rejects_out_of_range() {
        assert_eq!(CandidateSet::new([0, 2, 3, 4, 5, 6]), Err(InvalidInput::OutOfRange(0)));
        assert_eq!(CandidateSet::new([1, 2, 3, 4, 5, 46]), Err(InvalidInput::OutOfRange(46)));
        assert_eq!(CandidateSet::new([-1, 2, 3, 4, 5, 6]), Err(InvalidInput::OutOfRange(-1)));
    }

    #[test]
    fn test_candidate_rejects_duplicates() {
        assert_eq!(CandidateSet::new([1, 1, 3, 4, 5, 6]), Err(InvalidInput::Duplicate(1)));
    }

    #[test]
    fn test_candidate_numbers_sorted() {
        assert_eq!(candidate([45, 3, 12, 1, 30, 7]).numbers(), &[1, 3, 7, 12, 30, 45]);
    }

    #[test]
    fn test_draw_rejects_bonus_collision() {
        assert_eq!(
            Draw::new(1, date("2025-01-04"), [1, 2, 3, 4, 5, 6], 6),
            Err(InvalidInput::BonusCollision(6))
        );
    }

    #[test]
    fn test_draw_rejects_zero_number_and_bad_bonus() {
        assert_eq!(
            Draw::new(0, date("2025-01-04"), [1, 2, 3, 4, 5, 6], 7),
            Err(InvalidInput::ZeroDrawNumber)
        );
        assert_eq!(
            Draw::new(1, date("2025-01-04"), [1, 2, 3, 4, 5, 6], 46),
            Err(InvalidInput::OutOfRange(46))
        );
    }

    #[test]
    fn test_draw_serializes_numbers() {
        let json = serde_json::to_value(reference_draw()).unwrap();
        assert_eq!(json["draw_number"], 1);
        assert_eq!(json["draw_date"], "2025-01-04");
        assert_eq!(json["main_numbers"], serde_json::json!([1, 2, 3, 4, 5, 6]));
        assert_eq!(json["bonus_number"], 7);
        assert_eq!(serde_json::to_value(Tier::NoPrize).unwrap(), "NO_PRIZE");
    }
}
