//! Status text splitting.
//!
//! This module turns arbitrary text into the ordered segments of a thread.
//! Each segment is the longest leading prefix of the remaining text that the
//! platform accepts as a single status, so concatenating the segments always
//! gives back the original text.

use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;
use unicode_segmentation::UnicodeSegmentation;

/// Maximum weighted length of a single status.
pub const MAX_WEIGHTED_LENGTH: usize = 280;

/// Length every URL counts as, whatever its real length.
pub const TRANSFORMED_URL_LENGTH: usize = 23;

const SCALE: usize = 100;
const DEFAULT_WEIGHT: usize = 200;

/// Errors raised when text cannot be split into valid segments.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SplitError {
    /// The validity rule accepted nothing of the non-empty remaining text.
    #[error("no valid prefix for the remaining text at byte offset {offset}")]
    NoValidPrefix {
        /// Byte offset of the remaining text in the input.
        offset: usize,
    },

    /// The validity rule reported a prefix that cannot be cut out of the text.
    #[error("validity rule returned a prefix of {length} bytes at offset {offset}, which is not a char boundary within the {remaining} remaining bytes")]
    InvalidBoundary {
        /// Byte offset of the remaining text in the input.
        offset: usize,
        /// Prefix length returned by the rule.
        length: usize,
        /// Bytes left in the input at `offset`.
        remaining: usize,
    },
}

/// The platform's single-status validity rule.
pub trait ValidityRule: Send + Sync {
    /// Returns the byte length of the longest leading prefix of `text` that is
    /// valid as a single status. Zero means not even the first character fits.
    fn longest_valid_prefix(&self, text: &str) -> usize;
}

/// An inclusive range of code points sharing a weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeightRange {
    pub start: u32,
    pub end: u32,
    pub weight: usize,
}

/// Weighted-length validity rule following the platform's v3 text configuration.
///
/// Text is measured by extended grapheme cluster and never cut inside one.
/// An emoji cluster (including ZWJ sequences, skin tones, flags and keycaps)
/// counts as two characters. Other clusters sum their code points: those in
/// the configured ranges (Latin, general punctuation and the like) count as
/// one character, everything else (CJK) counts as two.
///
/// URLs count as [`TRANSFORMED_URL_LENGTH`] regardless of their real length
/// and are never cut in half. Only URLs with an `http://` or `https://`
/// scheme are recognised; bare domains such as `example.com/x` are counted
/// character by character, although the platform shortens them too.
#[derive(Debug, Clone)]
pub struct WeightedLengthRule {
    pub max_weighted_length: usize,
    pub scale: usize,
    pub default_weight: usize,
    pub ranges: Vec<WeightRange>,
    pub transformed_url_length: usize,
}

impl Default for WeightedLengthRule {
    fn default() -> Self {
        Self {
            max_weighted_length: MAX_WEIGHTED_LENGTH,
            scale: SCALE,
            default_weight: DEFAULT_WEIGHT,
            ranges: vec![
                WeightRange { start: 0, end: 4351, weight: 100 },
                WeightRange { start: 8192, end: 8205, weight: 100 },
                WeightRange { start: 8208, end: 8223, weight: 100 },
                WeightRange { start: 8242, end: 8247, weight: 100 },
            ],
            transformed_url_length: TRANSFORMED_URL_LENGTH,
        }
    }
}

fn url_regex() -> &'static Regex {
    static URL_RE: OnceLock<Regex> = OnceLock::new();
    // Trailing punctuation is left out of the URL, as the platform does.
    URL_RE.get_or_init(|| {
        Regex::new(r#"(?i)https?://[^\s]*[^\s.,;:!?'")\]]"#).expect("URL pattern is valid")
    })
}

/// Blocks whose characters start an emoji: miscellaneous technical,
/// miscellaneous symbols, dingbats, symbols and arrows, and everything from
/// mahjong tiles through the supplemental pictographs (flags included).
fn is_emoji_char(c: char) -> bool {
    matches!(
        c as u32,
        0x2300..=0x23FF | 0x2600..=0x27BF | 0x2B00..=0x2BFF | 0x1F000..=0x1FAFF
    )
}

fn is_emoji_cluster(cluster: &str) -> bool {
    let mut chars = cluster.chars();
    match chars.next() {
        Some(first) if is_emoji_char(first) => true,
        // Keycaps ("#️⃣") and text symbols forced to emoji style ("©️")
        Some(_) => chars.any(|c| c == '\u{FE0F}' || c == '\u{20E3}'),
        None => false,
    }
}

impl WeightedLengthRule {
    fn char_weight(&self, c: char) -> usize {
        let code_point = c as u32;
        self.ranges
            .iter()
            .find(|range| (range.start..=range.end).contains(&code_point))
            .map(|range| range.weight)
            .unwrap_or(self.default_weight)
    }

    fn cluster_weight(&self, cluster: &str) -> usize {
        if is_emoji_cluster(cluster) {
            self.default_weight
        } else {
            cluster.chars().map(|c| self.char_weight(c)).sum()
        }
    }

    fn url_weight(&self) -> usize {
        self.transformed_url_length * self.scale
    }

    /// Walks `text` cluster by cluster accumulating scaled weights, stopping
    /// before the first cluster or URL that would exceed `limit`.
    /// Returns (bytes consumed, scaled weight).
    fn scan(&self, text: &str, limit: Option<usize>) -> (usize, usize) {
        let mut urls = url_regex().find_iter(text).peekable();
        let mut total = 0;
        let mut pos = 0;

        for (start, cluster) in text.grapheme_indices(true) {
            let end = start + cluster.len();
            if start < pos {
                // Tail of a cluster the last URL ended inside of
                pos = pos.max(end);
                continue;
            }
            while urls.next_if(|url| url.start() < start).is_some() {}

            let url_end = urls.next_if(|url| url.start() == start).map(|url| url.end());
            let weight = match url_end {
                Some(_) => self.url_weight(),
                None => self.cluster_weight(cluster),
            };
            if limit.is_some_and(|limit| total + weight > limit) {
                break;
            }
            total += weight;
            pos = url_end.unwrap_or(end);
        }

        (pos, total)
    }

    /// Returns the weighted length of `text` in platform characters.
    pub fn weighted_length(&self, text: &str) -> usize {
        let (_, total) = self.scan(text, None);
        total / self.scale
    }

    /// Returns `true` if `text` fits in a single status.
    pub fn is_valid(&self, text: &str) -> bool {
        self.longest_valid_prefix(text) == text.len()
    }
}

impl ValidityRule for WeightedLengthRule {
    fn longest_valid_prefix(&self, text: &str) -> usize {
        let (pos, _) = self.scan(text, Some(self.max_weighted_length * self.scale));
        pos
    }
}

/// Splits `text` into the segments of a thread.
///
/// Each segment is the longest valid prefix of whatever text remains, so the
/// split is greedy and the segments concatenate back to `text` exactly.
/// Empty text yields no segments at all.
///
/// # Errors
///
/// Returns [`SplitError`] when the rule accepts nothing of non-empty text, or
/// reports a prefix that is not a char boundary of the remaining text. Under
/// the platform rule every single character is valid, so this only guards
/// against a faulty rule looping forever.
pub fn split_status<R>(rule: &R, text: &str) -> Result<Vec<String>, SplitError>
where
    R: ValidityRule + ?Sized,
{
    let mut segments = Vec::new();
    let mut offset = 0;

    while offset < text.len() {
        let remaining = &text[offset..];
        let length = rule.longest_valid_prefix(remaining);

        if length == 0 {
            return Err(SplitError::NoValidPrefix { offset });
        }
        if length > remaining.len() || !remaining.is_char_boundary(length) {
            return Err(SplitError::InvalidBoundary {
                offset,
                length,
                remaining: remaining.len(),
            });
        }

        segments.push(remaining[..length].to_string());
        offset += length;
    }

    Ok(segments)
}
