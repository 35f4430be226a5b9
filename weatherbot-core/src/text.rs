//! Cleanup of raw location strings.

/// Characters dropped from the end of a cleaned string.
const TRAILING_PUNCTUATION: &[char] = &['.', ',', '!', '?'];

/// Trim, collapse whitespace runs to a single space and drop any trailing
/// run of `.`, `,`, `!` and `?` (whitespace mixed into that run goes too).
///
/// Never fails; empty or whitespace-only input yields an empty string.
pub fn normalize(raw: &str) -> String {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");

    collapsed
        .trim_end_matches(|c: char| TRAILING_PUNCTUATION.contains(&c) || c.is_whitespace())
        .to_string()
}
