//! Parser and evaluator for the media query subset used by breakpoints.
//!
//! Supported syntax:
//!
//! - media types `all`, `screen` and `print`, optionally prefixed by `only`
//!   or `not`
//! - `and`-joined features: `min-width`, `max-width`, `width`, `min-height`,
//!   `max-height`, `height` (lengths in `px`, `em` or `rem`) and
//!   `orientation` (`portrait` or `landscape`)
//! - comma separated lists, which match when any member matches

use crate::error::QueryError;
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

/// Pixels per `em`/`rem` unit.
const FONT_SIZE_PX: f64 = 16.0;

static FEATURE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\(\s*([a-zA-Z-]+)\s*(?::\s*([^()]+?))?\s*\)$").expect("feature regex is valid")
});

static AND_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s+and\s+").expect("and regex is valid"));

static LENGTH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+(?:\.\d+)?|\.\d+)\s*(px|em|rem)?$").expect("length regex is valid")
});

/// Viewport dimensions in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Portrait when the height is at least the width.
    pub fn orientation(&self) -> Orientation {
        if self.height >= self.width {
            Orientation::Portrait
        } else {
            Orientation::Landscape
        }
    }
}

impl fmt::Display for Viewport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Portrait,
    Landscape,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MediaType {
    All,
    Screen,
    Print,
}

impl MediaType {
    // The simulated viewport is a screen.
    fn matches(self) -> bool {
        matches!(self, MediaType::All | MediaType::Screen)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum MediaFeature {
    MinWidth(f64),
    MaxWidth(f64),
    Width(f64),
    MinHeight(f64),
    MaxHeight(f64),
    Height(f64),
    Orientation(Orientation),
}

impl MediaFeature {
    fn matches(self, viewport: Viewport) -> bool {
        let width = f64::from(viewport.width);
        let height = f64::from(viewport.height);
        match self {
            MediaFeature::MinWidth(px) => width >= px,
            MediaFeature::MaxWidth(px) => width <= px,
            MediaFeature::Width(px) => width == px,
            MediaFeature::MinHeight(px) => height >= px,
            MediaFeature::MaxHeight(px) => height <= px,
            MediaFeature::Height(px) => height == px,
            MediaFeature::Orientation(orientation) => viewport.orientation() == orientation,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct MediaQuery {
    negated: bool,
    media_type: MediaType,
    features: Vec<MediaFeature>,
}

impl MediaQuery {
    fn matches(&self, viewport: Viewport) -> bool {
        let matched =
            self.media_type.matches() && self.features.iter().all(|f| f.matches(viewport));
        matched != self.negated
    }
}

/// A parsed, comma separated media query list.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaQueryList {
    queries: Vec<MediaQuery>,
}

impl MediaQueryList {
    /// Parses a media query list.
    ///
    /// # Errors
    ///
    /// Returns a [`QueryError`] for empty parts, unknown media types, unknown
    /// or malformed features and bad lengths.
    pub fn parse(input: &str) -> Result<Self, QueryError> {
        let queries = input
            .split(',')
            .map(parse_query)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { queries })
    }

    /// Whether any query in the list matches `viewport`.
    pub fn matches(&self, viewport: Viewport) -> bool {
        self.queries.iter().any(|query| query.matches(viewport))
    }
}

impl FromStr for MediaQueryList {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn parse_query(input: &str) -> Result<MediaQuery, QueryError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(QueryError::Empty);
    }

    let mut parts = AND_RE.split(input).map(str::trim).peekable();
    let mut negated = false;
    let mut media_type = MediaType::All;

    if let Some(first) = parts.next_if(|part| !part.starts_with('(')) {
        let mut words = first.split_whitespace();
        let mut word = words.next().unwrap_or_default().to_lowercase();
        if word == "not" || word == "only" {
            negated = word == "not";
            word = words
                .next()
                .ok_or(QueryError::UnsupportedMediaType {
                    media_type: first.to_string(),
                })?
                .to_lowercase();
        }
        if words.next().is_some() {
            return Err(QueryError::UnsupportedMediaType {
                media_type: first.to_string(),
            });
        }
        media_type = match word.as_str() {
            "all" => MediaType::All,
            "screen" => MediaType::Screen,
            "print" => MediaType::Print,
            _ => {
                return Err(QueryError::UnsupportedMediaType {
                    media_type: first.to_string(),
                });
            }
        };
    }

    let features = parts.map(parse_feature).collect::<Result<Vec<_>, _>>()?;

    Ok(MediaQuery {
        negated,
        media_type,
        features,
    })
}

fn parse_feature(input: &str) -> Result<MediaFeature, QueryError> {
    let invalid = || QueryError::InvalidFeature {
        feature: input.to_string(),
    };

    let caps = FEATURE_RE.captures(input).ok_or_else(invalid)?;
    let name = caps[1].to_lowercase();
    let value = caps.get(2).map(|m| m.as_str().trim()).ok_or_else(invalid)?;

    let length = |feature: &str| parse_length(feature, value);
    let feature = match name.as_str() {
        "min-width" => MediaFeature::MinWidth(length(&name)?),
        "max-width" => MediaFeature::MaxWidth(length(&name)?),
        "width" => MediaFeature::Width(length(&name)?),
        "min-height" => MediaFeature::MinHeight(length(&name)?),
        "max-height" => MediaFeature::MaxHeight(length(&name)?),
        "height" => MediaFeature::Height(length(&name)?),
        "orientation" => match value.to_lowercase().as_str() {
            "portrait" => MediaFeature::Orientation(Orientation::Portrait),
            "landscape" => MediaFeature::Orientation(Orientation::Landscape),
            _ => return Err(invalid()),
        },
        _ => return Err(invalid()),
    };
    Ok(feature)
}

fn parse_length(feature: &str, value: &str) -> Result<f64, QueryError> {
    let invalid = || QueryError::InvalidLength {
        feature: feature.to_string(),
        value: value.to_string(),
    };

    let caps = LENGTH_RE.captures(value).ok_or_else(invalid)?;
    let number: f64 = caps[1].parse().map_err(|_| invalid())?;
    match caps.get(2).map(|m| m.as_str()) {
        Some("px") => Ok(number),
        Some("em") | Some("rem") => Ok(number * FONT_SIZE_PX),
        // Only zero may omit its unit
        None if number == 0.0 => Ok(0.0),
        _ => Err(invalid()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matches(query: &str, width: u32, height: u32) -> bool {
        MediaQueryList::parse(query)
            .unwrap()
            .matches(Viewport::new(width, height))
    }

    #[test]
    fn test_all_and_screen_always_match() {
        assert!(matches("all", 1, 1));
        assert!(matches("screen", 4000, 10));
        assert!(matches("only screen", 320, 480));
        assert!(!matches("print", 1024, 768));
        assert!(matches("not print", 1024, 768));
    }

    /// # Width Ranges
    ///
    /// ## Expected Outcome
    /// - Bounds are inclusive on both ends
    #[test]
    fn test_width_range_bounds_are_inclusive() {
        let query = "(min-width: 768px) and (max-width: 991px)";
        assert!(!matches(query, 767, 600));
        assert!(matches(query, 768, 600));
        assert!(matches(query, 991, 600));
        assert!(!matches(query, 992, 600));

        assert!(matches("screen and (min-width: 1200px)", 1200, 800));
        assert!(matches("(max-width: 767px)", 767, 800));
        assert!(matches("(width: 500px)", 500, 800));
    }

    #[test]
    fn test_em_units_use_sixteen_pixels() {
        assert!(matches("(min-width: 48em)", 768, 600));
        assert!(!matches("(min-width: 48em)", 767, 600));
        assert!(matches("(max-width: 30rem)", 480, 600));
        assert!(matches("(min-width: 0)", 0, 0));
    }

    #[test]
    fn test_orientation_and_height() {
        assert!(matches("(orientation: portrait)", 320, 480));
        assert!(!matches("(orientation: portrait)", 480, 320));
        assert!(matches("(orientation: landscape) and (min-height: 300px)", 480, 320));
        assert!(!matches("(max-height: 200px)", 480, 320));
    }

    #[test]
    fn test_lists_and_negation() {
        let query = "(max-width: 500px), (min-width: 1000px)";
        assert!(matches(query, 400, 600));
        assert!(!matches(query, 700, 600));
        assert!(matches(query, 1100, 600));

        assert!(matches("not screen and (max-width: 500px)", 700, 600));
        assert!(!matches("not screen and (max-width: 500px)", 400, 600));
        assert!(matches("SCREEN AND (MIN-WIDTH: 100px)", 200, 100));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(MediaQueryList::parse(""), Err(QueryError::Empty));
        assert_eq!(MediaQueryList::parse("all,"), Err(QueryError::Empty));
        assert!(matches!(
            MediaQueryList::parse("tv"),
            Err(QueryError::UnsupportedMediaType { .. })
        ));
        assert!(matches!(
            MediaQueryList::parse("(min-colour: 8)"),
            Err(QueryError::InvalidFeature { .. })
        ));
        assert!(matches!(
            MediaQueryList::parse("(min-width)"),
            Err(QueryError::InvalidFeature { .. })
        ));
        assert!(matches!(
            MediaQueryList::parse("(min-width: wide)"),
            Err(QueryError::InvalidLength { .. })
        ));
        assert!(matches!(
            MediaQueryList::parse("(min-width: 10)"),
            Err(QueryError::InvalidLength { .. })
        ));
    }
}
