//! Web scraper for race entry pages
//!
//! Fetches a race page and pulls entrant names and win odds out of the
//! markup. The page layout is not assumed; see [`extract`] for the
//! heuristics.
//!
//! # Example
//!
//! ```no_run
//! use stakeplan::scraper::{RaceScraper, ScraperConfig};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     let scraper = RaceScraper::new(ScraperConfig::default())?;
//!
//!     let race = scraper.scrape("https://race.example.jp/race/shutuba.html").await?;
//!     println!("Found {} entrants", race.entrants.len());
//!
//!     Ok(())
//! }
//! ```

mod client;
pub mod extract;

pub use client::{decode_body, validate_url, RaceScraper, ScraperConfig, ScraperError};
pub use extract::{
    parse_race_page, text_blocks, ExtractionRules, ExtractionStrategy, KatakanaOddsStrategy,
};

use crate::models::Entrant;
use serde::{Deserialize, Serialize};

/// Entrants scraped from a single race page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapedRace {
    pub url: String,
    pub scraped_at: String,
    pub entrants: Vec<Entrant>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_to_chasing_plan() {
        let html = r#"<html><body><table>
            <tr><td>3</td><td>ベータ</td><td>470(0)</td><td>3.0</td></tr>
            <tr><td>5</td><td>アルファ</td><td>452(-2)</td><td>2.0</td></tr>
        </table></body></html>"#;

        let entrants =
            parse_race_page(html, "tr, li, div", &KatakanaOddsStrategy::default()).unwrap();
        let plan = crate::core::staking::StakeCalculator::scraped().plan(&entrants).unwrap();

        let stakes: Vec<_> = plan
            .allocations
            .iter()
            .map(|a| (a.entrant.name.as_str(), a.stake))
            .collect();
        assert_eq!(stakes, vec![("アルファ", 5000), ("ベータ", 5000)]);
        assert_eq!(plan.remaining_budget(), 90_000);
    }

    #[test]
    fn test_scraped_race_json() {
        let race = ScrapedRace {
            url: "https://race.example.jp/race/1".to_string(),
            scraped_at: "2024-12-28T10:00:00+00:00".to_string(),
            entrants: vec![Entrant::unnumbered("アルファ", 2.5)],
        };

        let json = serde_json::to_string(&race).unwrap();
        let back: ScrapedRace = serde_json::from_str(&json).unwrap();
        assert_eq!(back.entrants, race.entrants);
    }
}
