//! Ranked records and their line format
//!
//! Every file the pipeline produces is line-oriented UTF-8 with one
//! `identifier<TAB>score` row per line. Scores carry exactly three
//! fraction digits and are held as integer thousandths so comparisons
//! during merge are exact.

use std::fmt;
use std::str::FromStr;

/// Field separator in every list file
pub const FIELD_SEPARATOR: char = '\t';

/// Affinity score in thousandths, `0..=1000`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Score(u16);

impl Score {
    pub const MIN: Score = Score(0);
    pub const MAX: Score = Score(1000);

    /// Create from thousandths, clamping to `0..=1000`
    pub fn from_millis(millis: u16) -> Self {
        Score(millis.min(1000))
    }

    /// Round a real value in `[0, 1]` to three decimal digits
    pub fn from_f64(value: f64) -> Self {
        let millis = (value.clamp(0.0, 1.0) * 1000.0).round() as u16;
        Score::from_millis(millis)
    }

    /// Value in thousandths
    pub fn millis(self) -> u16 {
        self.0
    }

    /// Value as a real number
    pub fn as_f64(self) -> f64 {
        f64::from(self.0) / 1000.0
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:03}", self.0 / 1000, self.0 % 1000)
    }
}

impl FromStr for Score {
    type Err = String;

    /// Parse `0.25`, `0.250`, `1`, `1.0`; more than three fraction digits
    /// or values outside `[0, 1]` are rejected
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (whole, frac) = match s.split_once('.') {
            Some((w, f)) => (w, f),
            None => (s, ""),
        };

        if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
            return Err(format!("invalid score '{}'", s));
        }
        if frac.len() > 3 || !frac.bytes().all(|b| b.is_ascii_digit()) {
            return Err(format!("invalid score '{}': expected at most 3 fraction digits", s));
        }

        // anything past "1" is out of range whatever its length
        let whole = whole.trim_start_matches('0');
        if whole.len() > 1 || (whole.len() == 1 && whole != "1") {
            return Err(format!("score '{}' is above 1", s));
        }

        let mut millis: u16 = if whole == "1" { 1000 } else { 0 };
        let mut scale = 100;
        for b in frac.bytes() {
            millis += u16::from(b - b'0') * scale;
            scale /= 10;
        }

        if millis > 1000 {
            return Err(format!("score '{}' is above 1", s));
        }

        Ok(Score(millis))
    }
}

/// One (identifier, score) row of a list file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub identifier: String,
    pub score: Score,
}

impl Record {
    pub fn new(identifier: impl Into<String>, score: Score) -> Self {
        Self {
            identifier: identifier.into(),
            score,
        }
    }

    /// Format as a line without trailing newline
    pub fn to_line(&self) -> String {
        format!("{}{}{}", self.identifier, FIELD_SEPARATOR, self.score)
    }
}

/// Extract the score field of a list line without allocating
pub fn parse_score(line: &str) -> Result<Score, String> {
    let (identifier, score) = line
        .split_once(FIELD_SEPARATOR)
        .ok_or_else(|| "missing tab separator".to_string())?;

    if identifier.is_empty() {
        return Err("empty identifier".into());
    }

    score.parse()
}

/// Parse a full list line into a record
pub fn parse_line(line: &str) -> Result<Record, String> {
    let score = parse_score(line)?;
    let identifier = line
        .split(FIELD_SEPARATOR)
        .next()
        .unwrap_or_default()
        .to_string();
    Ok(Record { identifier, score })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_display() {
        assert_eq!(Score::from_millis(250).to_string(), "0.250");
        assert_eq!(Score::from_millis(5).to_string(), "0.005");
        assert_eq!(Score::MAX.to_string(), "1.000");
        assert_eq!(Score::MIN.to_string(), "0.000");
    }

    #[test]
    fn test_score_from_f64_rounds() {
        assert_eq!(Score::from_f64(0.12345).millis(), 123);
        assert_eq!(Score::from_f64(0.9996).millis(), 1000);
        assert_eq!(Score::from_f64(-0.5), Score::MIN);
    }

    #[test]
    fn test_score_parse() {
        assert_eq!("0.25".parse::<Score>().unwrap().millis(), 250);
        assert_eq!("0.250".parse::<Score>().unwrap().millis(), 250);
        assert_eq!("0.7".parse::<Score>().unwrap().millis(), 700);
        assert_eq!("1".parse::<Score>().unwrap(), Score::MAX);
        assert_eq!("0.0".parse::<Score>().unwrap(), Score::MIN);
    }

    #[test]
    fn test_score_parse_rejects() {
        assert!("".parse::<Score>().is_err());
        assert!("abc".parse::<Score>().is_err());
        assert!("0.1234".parse::<Score>().is_err());
        assert!("1.5".parse::<Score>().is_err());
        assert!("-0.1".parse::<Score>().is_err());
        assert!(".5".parse::<Score>().is_err());
    }

    #[test]
    fn test_score_parse_large_whole_part() {
        assert!("4294967.9".parse::<Score>().is_err());
        assert!("99999.999".parse::<Score>().is_err());
        assert!("2".parse::<Score>().is_err());
        assert!("1.001".parse::<Score>().is_err());
        assert_eq!("001.000".parse::<Score>().unwrap(), Score::MAX);
        assert_eq!("00.5".parse::<Score>().unwrap().millis(), 500);
    }

    #[test]
    fn test_parse_line() {
        let record = parse_line("ABC123\t0.042").unwrap();
        assert_eq!(record.identifier, "ABC123");
        assert_eq!(record.score.millis(), 42);
        assert_eq!(record.to_line(), "ABC123\t0.042");

        assert!(parse_line("no-tab-here").is_err());
        assert!(parse_line("\t0.5").is_err());
    }
}
