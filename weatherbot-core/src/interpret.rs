//! Turns a free-text weather question into an [`Intent`].
//!
//! Three independent extractions run over the same text:
//! - [`extract_location`] finds the place the question is about,
//! - [`classify_query_type`] decides between current conditions and a forecast,
//! - [`parse_time_horizon`] resolves relative time phrases into a day count.
//!
//! None of them fail on textual input; "nothing found" is a normal outcome.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{Error, Result, text::normalize};

/// Whether the question is about conditions right now or ahead of time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryType {
    #[default]
    Current,
    Forecast,
}

impl QueryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryType::Current => "current",
            QueryType::Forecast => "forecast",
        }
    }
}

impl fmt::Display for QueryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured reading of one user question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Intent {
    pub location: Option<String>,
    pub query_type: QueryType,
    /// Days ahead, always positive when present.
    pub horizon_days: Option<u32>,
}

/// Interpret a raw query. `None` means the caller had no text at all.
pub fn interpret(raw: Option<&str>) -> Result<Intent> {
    let raw = raw.ok_or(Error::InputMissing)?;
    let text = normalize(raw);

    let intent = Intent {
        location: extract_location(&text),
        query_type: classify_query_type(&text),
        horizon_days: parse_time_horizon(&text),
    };

    debug!(query = %text, ?intent, "interpreted query");
    Ok(intent)
}

/// Words introducing a location that follows them.
const LEADING_PREPOSITIONS: &[&str] = &["in", "for", "at"];

/// Words that follow a location ("Boston weather").
const TRAILING_KEYWORDS: &[&str] = &[
    "weather",
    "forecast",
    "forecasts",
    "temperature",
    "temperatures",
];

/// Words that end a location span.
const BOUNDARY_WORDS: &[&str] = &[
    // time
    "today", "tonight", "tomorrow", "yesterday", "now", "right", "later", "soon",
    "currently", "next", "this", "coming", "upcoming", "week", "weekend", "weekly",
    "morning", "afternoon", "evening", "night", "day", "days", "hourly", "daily",
    // glue
    "in", "for", "at", "on", "over", "during", "by", "from", "with", "and", "or",
    "but", "be", "is", "will", "going",
    // topic
    "weather", "forecast", "forecasts", "temperature", "temperatures", "like",
    "please",
];

/// Words that never make up a location on their own.
const FILLER_WORDS: &[&str] = &[
    "a", "an", "the", "my", "your", "our", "that", "here", "there", "me", "us",
    "you", "it", "it's", "its", "general", "advance", "detail", "area", "place",
    "outside", "what", "what's", "whats", "how", "how's", "hows", "current", "local",
    "today's", "tomorrow's", "tonight's", "todays", "tomorrows", "latest", "usual",
    "give", "show", "tell", "get", "check", "any",
];

/// How strongly the surrounding words mark a span as a place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Cue {
    /// After `for`/`at`, which also introduce purposes and venues.
    Weak,
    /// After `in`, or right before a weather keyword.
    Strong,
}

#[derive(Debug)]
struct Candidate {
    span: String,
    /// Token range `[start, end)` the span came from.
    start: usize,
    end: usize,
    cue: Cue,
}

impl Candidate {
    /// A stronger cue always wins. Between equal cues a longer span only
    /// replaces one it overlaps or extends ("Dallas" -> "Dallas, Texas").
    fn outranks(&self, current: &Candidate) -> bool {
        if self.cue != current.cue {
            return self.cue > current.cue;
        }

        let overlaps = self.start < current.end && current.start < self.end;
        let extends = self
            .span
            .to_lowercase()
            .starts_with(&current.span.to_lowercase());

        (overlaps || extends) && self.span.len() > current.span.len()
    }
}

/// Find the location a weather question is about.
///
/// Recognizes a place after `in`/`for`/`at` ("weather in Boston",
/// "forecast for Miami, FL") and a place right before a weather keyword
/// ("Boston weather", "Tokyo forecast"). A place after `in` or before a
/// keyword beats one after `for`/`at`, so "weather in Boston for a picnic"
/// is about Boston. A more specific form of the same place wins over the
/// short one, so "Dallas, Texas" beats "Dallas".
pub fn extract_location(text: &str) -> Option<String> {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    let mut best: Option<Candidate> = None;

    for (idx, token) in tokens.iter().enumerate() {
        let word = bare_word(token);

        let candidate = if LEADING_PREPOSITIONS.contains(&word.as_str()) && !ends_clause(token) {
            let cue = if word == "in" { Cue::Strong } else { Cue::Weak };
            span_after(&tokens, idx + 1, cue)
        } else if TRAILING_KEYWORDS.contains(&word.as_str()) {
            span_before(&tokens, idx)
        } else {
            None
        };

        if let Some(candidate) = candidate {
            if best.as_ref().is_none_or(|b| candidate.outranks(b)) {
                best = Some(candidate);
            }
        }
    }

    best.map(|c| c.span)
}

/// Capitalized words allowed after a comma ("Paris, France", "Miami, FL").
const MAX_QUALIFIER_WORDS: usize = 2;

fn span_after(tokens: &[&str], start: usize, cue: Cue) -> Option<Candidate> {
    let mut parts = Vec::new();
    // Words taken after the first comma, if one was seen.
    let mut qualifier: Option<usize> = None;

    for token in tokens.iter().skip(start) {
        let word = bare_word(token);
        if word.is_empty() || is_boundary(&word) || is_filler(&word) {
            break;
        }
        if let Some(taken) = qualifier {
            if taken == MAX_QUALIFIER_WORDS || !starts_uppercase(token) {
                break;
            }
            qualifier = Some(taken + 1);
        }

        parts.push(*token);
        if ends_clause(token) {
            break;
        }
        if qualifier.is_none() && token.ends_with(',') {
            qualifier = Some(0);
        }
    }

    let span = accept_span(&parts)?;
    Some(Candidate { span, start, end: start + parts.len(), cue })
}

fn span_before(tokens: &[&str], keyword_idx: usize) -> Option<Candidate> {
    let mut parts = Vec::new();

    for (offset, token) in tokens[..keyword_idx].iter().rev().enumerate() {
        if ends_clause(token) {
            break;
        }
        // Only the word right before the keyword may carry a possessive.
        let token = if offset == 0 { strip_possessive(token) } else { *token };
        let word = bare_word(token);
        if word.is_empty() || is_boundary(&word) || is_filler(&word) {
            break;
        }
        parts.push(token);
    }

    parts.reverse();
    let span = accept_span(&parts)?;
    Some(Candidate {
        span,
        start: keyword_idx - parts.len(),
        end: keyword_idx,
        cue: Cue::Strong,
    })
}

fn accept_span(parts: &[&str]) -> Option<String> {
    let span = normalize(&parts.join(" "));

    let starts_with_letter = span.chars().next().is_some_and(char::is_alphabetic);
    let starts_with_filler = span
        .split_whitespace()
        .next()
        .is_some_and(|w| is_filler(&bare_word(w)));

    if !starts_with_letter || starts_with_filler {
        return None;
    }

    Some(span)
}

fn is_filler(word: &str) -> bool {
    FILLER_WORDS.contains(&word)
}

fn starts_uppercase(token: &str) -> bool {
    token.chars().next().is_some_and(char::is_uppercase)
}

fn is_boundary(word: &str) -> bool {
    word.starts_with(|c: char| c.is_ascii_digit()) || BOUNDARY_WORDS.contains(&word)
}

/// Punctuation that closes a clause. A period only counts after a word
/// longer than an abbreviation such as "St." or "Mt.".
fn ends_clause(token: &str) -> bool {
    if token.ends_with(['?', '!', ';']) {
        return true;
    }
    token
        .strip_suffix('.')
        .is_some_and(|stem| stem.chars().filter(|c| c.is_alphabetic()).count() > 3)
}

fn strip_possessive(token: &str) -> &str {
    token
        .strip_suffix("'s")
        .or_else(|| token.strip_suffix("\u{2019}s"))
        .unwrap_or(token)
}

/// Lowercased token without surrounding punctuation.
fn bare_word(token: &str) -> String {
    token
        .trim_matches(|c: char| !c.is_alphanumeric() && c != '\'' && c != '\u{2019}')
        .trim_matches(['\'', '\u{2019}'])
        .replace('\u{2019}', "'")
        .to_lowercase()
}

static FORECAST_CUES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(forecasts?|tomorrow|tonight|upcoming|later|soon|next|coming|weekend|this week|will|going to|gonna|expect(ed)?|\d+\s*-?\s*days?)\b",
    )
    .expect("forecast cue pattern is valid")
});

static CURRENT_CUES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(current|currently|now|right now|today|at the moment|how (hot|cold|warm)|is it|outside)\b",
    )
    .expect("current cue pattern is valid")
});

/// Decide between current conditions and a forecast.
///
/// Forward-looking words win over present-tense ones; with no cue at all the
/// question is about the current weather.
pub fn classify_query_type(text: &str) -> QueryType {
    let forecast = FORECAST_CUES.is_match(text);
    let current = CURRENT_CUES.is_match(text);

    if forecast && current {
        debug!(query = %text, "conflicting time cues, treating as forecast");
    }

    if forecast {
        QueryType::Forecast
    } else {
        QueryType::Current
    }
}

static DAY_COUNT: LazyLock<Regex> = LazyLock::new(|| {
    // A range such as "5-7 days" counts up to its upper bound. The leading
    // anchor keeps "2.5 days" from reading as 5.
    Regex::new(r"(?i)(?:^|[\s(])(-?)(?:\d+\s*(?:-|to)\s*)?(\d+)(?:\s+|-)?days?\b")
        .expect("day count pattern is valid")
});

static DAY_AFTER_TOMORROW: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bday after tomorrow\b").expect("day-after-tomorrow pattern is valid")
});

static TOMORROW: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\btomorrow\b").expect("tomorrow pattern is valid"));

static NEXT_WEEK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bnext week\b").expect("next week pattern is valid"));

/// Number of days ahead the question refers to.
///
/// An explicit "N days" takes priority, then "day after tomorrow" (2),
/// "tomorrow" (1) and "next week" (7). A range uses its upper end. Zero,
/// negative, fractional or unparseable counts are treated as absent. No upper
/// bound is applied here.
pub fn parse_time_horizon(text: &str) -> Option<u32> {
    if let Some(caps) = DAY_COUNT.captures(text) {
        if !caps[1].is_empty() {
            return None;
        }
        return caps[2].parse::<u32>().ok().filter(|days| *days > 0);
    }

    if DAY_AFTER_TOMORROW.is_match(text) {
        Some(2)
    } else if TOMORROW.is_match(text) {
        Some(1)
    } else if NEXT_WEEK.is_match(text) {
        Some(7)
    } else {
        None
    }
}
