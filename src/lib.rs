// Draw collection and prize checking for the 6/45 lottery
pub mod api;
pub mod config;
pub mod database;
pub mod import;
pub mod matcher;
pub mod reports;
pub mod scheduler;
pub mod stats;
pub mod types;
pub mod utils;
pub mod wish;

pub use matcher::{
    CandidateSet, Draw, InvalidInput, MatchResult, Tier, TierStats, TierSummary, classify,
    evaluate, summarize,
};
pub use reports::{SummaryFormat, format_summary};
pub use types::{DrawRecord, PrizeInfo};
