//! Race card text parser
//!
//! Reads entrants from text pasted out of a race card, one entrant per line.
//! Two line shapes are recognised, tried in order:
//!
//! - `number rank name odds` (e.g. `1 3 サトノダイヤモンド 2.5`)
//! - `name odds` (number and rank become `-`)
//!
//! Anything else on a line is ignored, so surrounding noise such as headers
//! or trailing columns does not break the paste.
//!
//! # Example
//!
//! ```
//! use stakeplan::data::parser::EntryParser;
//!
//! let parser = EntryParser::new();
//! let entrants = parser.parse_text("1 3 Alpha 2.5\n7 1 Beta 1.8").unwrap();
//! assert_eq!(entrants.len(), 2);
//! ```

use encoding_rs::{SHIFT_JIS, UTF_8};
use regex::Regex;
use std::fs;
use std::io;
use std::path::Path;
use tracing::debug;

use crate::error::{PlanError, MANUAL_FORMAT_HINT};
use crate::models::Entrant;

/// A line that matched one of the two entrant shapes
#[derive(Debug, Clone, PartialEq)]
pub enum LineMatch {
    /// `number rank name odds`
    Full {
        number: String,
        popularity: String,
        name: String,
        odds: f64,
    },
    /// `name odds`
    NameOdds { name: String, odds: f64 },
}

impl LineMatch {
    pub fn odds(&self) -> f64 {
        match self {
            LineMatch::Full { odds, .. } | LineMatch::NameOdds { odds, .. } => *odds,
        }
    }

    pub fn into_entrant(self) -> Entrant {
        match self {
            LineMatch::Full {
                number,
                popularity,
                name,
                odds,
            } => Entrant::new(number, popularity, name, odds),
            LineMatch::NameOdds { name, odds } => Entrant::unnumbered(name, odds),
        }
    }
}

/// Convert full-width digits, the full-width period and the ideographic
/// space to their ASCII forms
pub fn normalize_text(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '０'..='９' => char::from_u32(c as u32 - '０' as u32 + '0' as u32).unwrap_or(c),
            '．' => '.',
            '\u{3000}' => ' ',
            _ => c,
        })
        .collect()
}

/// Decode pasted text as UTF-8, falling back to Shift_JIS (CP932)
pub fn decode_text(bytes: &[u8]) -> Option<String> {
    let (decoded, had_errors) = UTF_8.decode_with_bom_removal(bytes);
    if !had_errors {
        return Some(decoded.into_owned());
    }

    let (decoded, _, had_errors) = SHIFT_JIS.decode(bytes);
    if had_errors {
        None
    } else {
        Some(decoded.into_owned())
    }
}

/// Read a saved race card from disk
pub fn read_text_file(path: &Path) -> io::Result<String> {
    let bytes = fs::read(path)?;

    decode_text(&bytes).ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("{} is neither UTF-8 nor Shift_JIS text", path.display()),
        )
    })
}

/// Race card line parser
pub struct EntryParser {
    full_pattern: Regex,
    name_odds_pattern: Regex,
}

impl Default for EntryParser {
    fn default() -> Self {
        Self::new()
    }
}

impl EntryParser {
    pub fn new() -> Self {
        Self {
            full_pattern: Regex::new(r"(\d+)\s+(\d+)\s+([^\d\s]+)\s+([\d.]+)").unwrap(),
            name_odds_pattern: Regex::new(r"([^\d\s]+)\s+([\d.]+)").unwrap(),
        }
    }

    /// Match a single line against the two entrant shapes
    ///
    /// A line that has the full shape but unreadable odds is rejected
    /// outright rather than retried as `name odds`.
    pub fn match_line(&self, line: &str) -> Option<LineMatch> {
        let line = normalize_text(line);

        if let Some(caps) = self.full_pattern.captures(&line) {
            return Some(LineMatch::Full {
                number: caps[1].to_string(),
                popularity: caps[2].to_string(),
                name: caps[3].to_string(),
                odds: caps[4].parse().ok()?,
            });
        }

        let caps = self.name_odds_pattern.captures(&line)?;
        Some(LineMatch::NameOdds {
            name: caps[1].to_string(),
            odds: caps[2].parse().ok()?,
        })
    }

    /// Parse one line into an entrant, dropping non-positive odds
    pub fn parse_line(&self, line: &str) -> Option<Entrant> {
        let matched = self.match_line(line)?;
        let odds = matched.odds();

        if !odds.is_finite() || odds <= 0.0 {
            return None;
        }

        Some(matched.into_entrant())
    }

    /// Parse a whole paste, in input order
    pub fn parse_text(&self, text: &str) -> Result<Vec<Entrant>, PlanError> {
        if text.trim().is_empty() {
            return Err(PlanError::EmptyInput);
        }

        let entrants: Vec<Entrant> = text
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| {
                let entrant = self.parse_line(line);
                if entrant.is_none() {
                    debug!("Skipping line: {:?}", line);
                }
                entrant
            })
            .collect();

        if entrants.is_empty() {
            return Err(PlanError::no_entrants(MANUAL_FORMAT_HINT));
        }

        debug!("Parsed {} entrants", entrants.len());
        Ok(entrants)
    }
}
