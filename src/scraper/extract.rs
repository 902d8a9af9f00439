//! Entrant extraction from race page HTML
//!
//! Race pages are loosely structured, so extraction works on flattened text
//! blocks rather than on fixed selectors. Each block is searched for an
//! odds-shaped number and a katakana horse name.

use super::ScraperError;
use crate::models::Entrant;
use regex::Regex;
use scraper::{Html, Selector};
use std::collections::HashSet;
use tracing::debug;

/// Elements whose text is scanned, in document order
pub const DEFAULT_BLOCK_SELECTOR: &str = "tr, li, div";

/// Tunable heuristics for pulling entrants out of text blocks
#[derive(Debug, Clone)]
pub struct ExtractionRules {
    /// Odds regex; capture group 1 is the odds value
    pub odds_pattern: String,
    /// Character class body for name characters
    pub name_chars: String,
    pub name_min: usize,
    pub name_max: usize,
}

impl Default for ExtractionRules {
    fn default() -> Self {
        Self {
            // 1.0-99.9 or 140.0-149.9, never part of a longer number.
            // Body weights (e.g. 480, 452.0) fall outside both ranges.
            odds_pattern: r"(?:^|[^\d.])(\d{1,2}\.\d|14\d\.\d)(?:[^\d.]|$)".to_string(),
            name_chars: "ァ-ヶー".to_string(),
            name_min: 2,
            name_max: 9,
        }
    }
}

impl ExtractionRules {
    fn name_pattern(&self) -> String {
        format!("[{}]{{{},{}}}", self.name_chars, self.name_min, self.name_max)
    }
}

/// Turns flattened text blocks into entrants
pub trait ExtractionStrategy {
    fn extract(&self, blocks: &[String]) -> Vec<Entrant>;
}

/// Pairs the first odds-shaped number with the first katakana name in a block
///
/// Names are deduplicated by exact match, so two different entrants sharing
/// a name collapse into the first one seen.
#[derive(Debug, Clone)]
pub struct KatakanaOddsStrategy {
    odds_pattern: Regex,
    name_pattern: Regex,
}

impl Default for KatakanaOddsStrategy {
    fn default() -> Self {
        Self::new(&ExtractionRules::default()).unwrap()
    }
}

impl KatakanaOddsStrategy {
    pub fn new(rules: &ExtractionRules) -> Result<Self, ScraperError> {
        let odds_pattern =
            Regex::new(&rules.odds_pattern).map_err(|e| ScraperError::ParseError(e.to_string()))?;
        let name_pattern = Regex::new(&rules.name_pattern())
            .map_err(|e| ScraperError::ParseError(e.to_string()))?;

        Ok(Self {
            odds_pattern,
            name_pattern,
        })
    }

    /// First odds-shaped value in the text
    pub fn find_odds(&self, text: &str) -> Option<f64> {
        self.odds_pattern
            .captures(text)
            .and_then(|caps| caps[1].parse::<f64>().ok())
            .filter(|odds| *odds > 0.0)
    }

    /// First name-shaped run in the text
    pub fn find_name<'a>(&self, text: &'a str) -> Option<&'a str> {
        self.name_pattern.find(text).map(|m| m.as_str())
    }
}

impl ExtractionStrategy for KatakanaOddsStrategy {
    fn extract(&self, blocks: &[String]) -> Vec<Entrant> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut entrants = Vec::new();

        for block in blocks {
            let (Some(odds), Some(name)) = (self.find_odds(block), self.find_name(block)) else {
                continue;
            };

            if !seen.insert(name.to_string()) {
                continue;
            }

            debug!("Found {} at {}", name, odds);
            entrants.push(Entrant::unnumbered(name, odds));
        }

        entrants
    }
}

/// Flatten every matching element into a whitespace-normalised text block
pub fn text_blocks(html: &str, selector: &str) -> Result<Vec<String>, ScraperError> {
    let document = Html::parse_document(html);
    let selector = Selector::parse(selector).map_err(|e| ScraperError::ParseError(e.to_string()))?;

    Ok(document
        .select(&selector)
        .map(|element| {
            element
                .text()
                .flat_map(|t| t.split_whitespace())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .filter(|text| !text.is_empty())
        .collect())
}

/// Extract entrants from a race page
pub fn parse_race_page(
    html: &str,
    selector: &str,
    strategy: &dyn ExtractionStrategy,
) -> Result<Vec<Entrant>, ScraperError> {
    let blocks = text_blocks(html, selector)?;
    debug!("Scanning {} text blocks", blocks.len());

    let entrants = strategy.extract(&blocks);
    if entrants.is_empty() {
        return Err(ScraperError::NoEntrants);
    }

    Ok(entrants)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blocks(texts: &[&str]) -> Vec<String> {
        texts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_find_odds_ranges() {
        let s = KatakanaOddsStrategy::default();
        assert_eq!(s.find_odds("単勝 3.4"), Some(3.4));
        assert_eq!(s.find_odds("99.9"), Some(99.9));
        assert_eq!(s.find_odds("145.3倍"), Some(145.3));
        assert_eq!(s.find_odds("150.2"), None);
        assert_eq!(s.find_odds("120.5"), None);
    }

    #[test]
    fn test_find_odds_ignores_body_weight() {
        let s = KatakanaOddsStrategy::default();
        assert_eq!(s.find_odds("452.0"), None);
        assert_eq!(s.find_odds("480(+2)"), None);
        assert_eq!(s.find_odds("480(+2) 12.7"), Some(12.7));
    }

    #[test]
    fn test_find_odds_first_match_wins() {
        // Two odds-shaped tokens; the earlier one is taken even if the
        // later one is the real price
        let s = KatakanaOddsStrategy::default();
        assert_eq!(s.find_odds("57.0 アルファ 3.2"), Some(57.0));
    }

    #[test]
    fn test_find_name_lengths() {
        let s = KatakanaOddsStrategy::default();
        assert_eq!(s.find_name("1 ア 2.5"), None);
        assert_eq!(s.find_name("1 アイ 2.5"), Some("アイ"));
        assert_eq!(s.find_name("キタサンブラック 1.8"), Some("キタサンブラック"));
        assert_eq!(s.find_name("アイウエオカキクケコ"), Some("アイウエオカキクケ"));
        assert_eq!(s.find_name("Alpha 2.5"), None);
    }

    #[test]
    fn test_extract_dedupes_by_name() {
        let s = KatakanaOddsStrategy::default();
        let entrants = s.extract(&blocks(&[
            "1 アルファ 牡3 2.5",
            "アルファ 9.9",
            "2 ベータ 牝4 1.8",
            "no match here",
        ]));

        assert_eq!(entrants.len(), 2);
        assert_eq!(entrants[0].name, "アルファ");
        assert_eq!(entrants[0].odds, 2.5);
        assert_eq!(entrants[1].name, "ベータ");
        assert_eq!(entrants[0].number, "-");
    }

    #[test]
    fn test_custom_rules() {
        let rules = ExtractionRules {
            name_chars: "A-Za-z".to_string(),
            name_min: 3,
            ..Default::default()
        };
        let s = KatakanaOddsStrategy::new(&rules).unwrap();
        let entrants = s.extract(&blocks(&["Alpha 2.5"]));
        assert_eq!(entrants, vec![Entrant::unnumbered("Alpha", 2.5)]);
    }

    #[test]
    fn test_invalid_rules() {
        let rules = ExtractionRules {
            odds_pattern: "(".to_string(),
            ..Default::default()
        };
        assert!(KatakanaOddsStrategy::new(&rules).is_err());
    }

    #[test]
    fn test_text_blocks_flatten_cells() {
        let html = r#"<html><body><table>
            <tr><td>1</td><td>アルファ</td><td>480(+2)</td><td>2.5</td></tr>
            <tr><td>2</td><td>ベータ</td><td>462(-4)</td><td>1.8</td></tr>
        </table><ul><li>ガンマ   <b>7.1</b></li></ul></body></html>"#;

        let blocks = text_blocks(html, DEFAULT_BLOCK_SELECTOR).unwrap();
        assert_eq!(
            blocks,
            vec![
                "1 アルファ 480(+2) 2.5",
                "2 ベータ 462(-4) 1.8",
                "ガンマ 7.1",
            ]
        );
    }

    #[test]
    fn test_parse_race_page() {
        let html = r#"<html><body><table>
            <tr><th>馬番</th><th>馬名</th><th>馬体重</th><th>単勝</th></tr>
            <tr><td>1</td><td>アルファ</td><td>480(+2)</td><td>2.5</td></tr>
            <tr><td>2</td><td>ベータ</td><td>462(-4)</td><td>145.0</td></tr>
        </table></body></html>"#;

        let strategy = KatakanaOddsStrategy::default();
        let entrants = parse_race_page(html, DEFAULT_BLOCK_SELECTOR, &strategy).unwrap();
        assert_eq!(
            entrants,
            vec![
                Entrant::unnumbered("アルファ", 2.5),
                Entrant::unnumbered("ベータ", 145.0),
            ]
        );
    }

    #[test]
    fn test_parse_empty_page() {
        let html = r#"<html><body><div id="app"></div><script>render()</script></body></html>"#;
        let strategy = KatakanaOddsStrategy::default();
        let result = parse_race_page(html, DEFAULT_BLOCK_SELECTOR, &strategy);
        assert!(matches!(result, Err(ScraperError::NoEntrants)));
    }

    #[test]
    fn test_bad_selector() {
        assert!(text_blocks("<html></html>", "tr[").is_err());
    }
}
