//! Fuzzy matching of free-text organization names against catalog slugs.
//!
//! Human-typed names and generated slugs differ in case, accents and
//! punctuation but usually share a common substring, so names are first
//! normalized with [`clean`] and then scored with [`symmetric_ratio`].

use std::sync::LazyLock;

use regex::Regex;

/// Suffix appended by the catalog to deduplicate colliding slugs (`paris-2`).
static DUPLICATE_SLUG_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-\d+$").expect("DUPLICATE_SLUG_SUFFIX: invalid pattern"));

/// Normalize a name or slug for comparison.
///
/// Strips a trailing `-<digits>` deduplication suffix, lower-cases,
/// transliterates to ASCII and removes hyphens. Missing values normalize to
/// the empty string.
pub fn clean(text: Option<&str>) -> String {
    let Some(text) = text else {
        return String::new();
    };
    let text = DUPLICATE_SLUG_SUFFIX.replace(text, "");
    deunicode::deunicode(&text.to_lowercase()).replace('-', "")
}

/// Similarity of two strings in `0..=100`, as twice the longest common
/// subsequence over the total length.
pub fn ratio(a: &str, b: &str) -> u8 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    Similarity::of(&a, &b).percent()
}

/// Best [`ratio`] between the shorter string and any alignment of it
/// against the longer one.
///
/// Alignments are every full-length window of the longer string plus the
/// partial overlaps at both ends: its prefixes and suffixes shorter than the
/// shorter string. Equal-length strings are aligned in both directions. An
/// empty operand scores 0.
pub fn partial_ratio(a: &str, b: &str) -> u8 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let (shorter, longer) = if a.len() <= b.len() { (&a, &b) } else { (&b, &a) };

    if shorter.is_empty() {
        return 0;
    }

    let mut best = best_alignment(shorter, longer);
    if shorter.len() == longer.len() && !best.is_perfect() {
        best = best.max(best_alignment(longer, shorter));
    }
    best.percent()
}

fn best_alignment(needle: &[char], haystack: &[char]) -> Similarity {
    let m = needle.len();
    let n = haystack.len();

    let prefixes = (1..m).map(|end| &haystack[..end]);
    let windows = haystack.windows(m);
    let suffixes = (n - m + 1..n).map(|start| &haystack[start..]);

    let mut best: Option<Similarity> = None;
    for slice in prefixes.chain(windows).chain(suffixes) {
        let score = Similarity::of(needle, slice);
        let current = best.map_or(score, |best| best.max(score));
        best = Some(current);
        if current.is_perfect() {
            break;
        }
    }
    best.unwrap_or(Similarity {
        common: 0,
        total: m + n,
    })
}

/// Partial ratio that always compares the shorter string against the longer.
pub fn symmetric_ratio(a: &str, b: &str) -> u8 {
    if a.chars().count() > b.chars().count() {
        partial_ratio(b, a)
    } else {
        partial_ratio(a, b)
    }
}

/// Score two raw names after normalization.
pub fn name_similarity(a: Option<&str>, b: Option<&str>) -> u8 {
    symmetric_ratio(&clean(a), &clean(b))
}

/// `2 * lcs / total`, kept as an exact fraction until rounding.
#[derive(Debug, Clone, Copy)]
struct Similarity {
    common: usize,
    total: usize,
}

impl Similarity {
    fn of(a: &[char], b: &[char]) -> Self {
        Self {
            common: longest_common_subsequence(a, b),
            total: a.len() + b.len(),
        }
    }

    fn is_perfect(&self) -> bool {
        self.total > 0 && 2 * self.common == self.total
    }

    fn max(self, other: Self) -> Self {
        // a/b < c/d  <=>  a*d < c*b
        let lhs = self.common * other.total;
        let rhs = other.common * self.total;
        if rhs > lhs {
            other
        } else {
            self
        }
    }

    /// Percentage rounded half to even.
    fn percent(&self) -> u8 {
        if self.total == 0 {
            return 100;
        }
        let numerator = 200 * self.common;
        let quotient = numerator / self.total;
        let remainder = numerator % self.total;
        let rounded = match (2 * remainder).cmp(&self.total) {
            std::cmp::Ordering::Greater => quotient + 1,
            std::cmp::Ordering::Equal if quotient % 2 == 1 => quotient + 1,
            _ => quotient,
        };
        rounded.min(100) as u8
    }
}

fn longest_common_subsequence(a: &[char], b: &[char]) -> usize {
    let mut previous = vec![0usize; b.len() + 1];
    let mut current = vec![0usize; b.len() + 1];

    for &ca in a {
        for (j, &cb) in b.iter().enumerate() {
            current[j + 1] = if ca == cb {
                previous[j] + 1
            } else {
                current[j].max(previous[j + 1])
            };
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[b.len()]
}
