//! Greedy line wrapping with hyphenation-aware word splitting.
//!
//! Lines are budgeted in characters, not pixels: the render path only uses
//! monospaced faces, so `max_chars` is derived once per font trial and the
//! wrap itself stays font-free and deterministic.

use smallvec::SmallVec;

/// Candidate break offsets for one word, ascending, in chars.
pub type BreakPositions = SmallVec<[usize; 8]>;

/// Locale-specific word-break source.
///
/// Offsets are character counts from the start of the word; a returned
/// offset `p` means the word may break into `word[..p]` + `word[p..]`.
/// An empty result means the word is unknown or too short to break.
pub trait Hyphenator {
    fn break_positions(&self, word: &str) -> BreakPositions;
}

/// Heuristic English hyphenator.
///
/// Breaks at vowel/consonant boundaries and before common suffixes. Words
/// shorter than 7 characters yield no candidates. Construct with a language
/// tag; anything that is not `en*` disables breaking entirely.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EnglishHyphenator {
    enabled: bool,
}

impl EnglishHyphenator {
    /// Build from a language tag such as `"en"` or `"en_US"`.
    pub fn from_tag(tag: &str) -> Self {
        Self {
            enabled: tag.to_ascii_lowercase().starts_with("en"),
        }
    }
}

impl Default for EnglishHyphenator {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Hyphenator for EnglishHyphenator {
    fn break_positions(&self, word: &str) -> BreakPositions {
        let mut candidates = BreakPositions::new();
        if !self.enabled {
            return candidates;
        }
        let chars: Vec<char> = word.chars().collect();
        if chars.len() < 7 {
            return candidates;
        }
        let is_vowel = |c: char| matches!(c.to_ascii_lowercase(), 'a' | 'e' | 'i' | 'o' | 'u' | 'y');

        for i in 3..(chars.len().saturating_sub(3)) {
            let prev = chars[i - 1];
            let next = chars[i];
            if !prev.is_ascii_alphabetic() || !next.is_ascii_alphabetic() {
                continue;
            }
            if is_vowel(prev) != is_vowel(next) {
                candidates.push(i);
            }
        }

        const SUFFIXES: &[&str] = &[
            "tion", "sion", "ment", "ness", "less", "able", "ible", "ally", "ingly", "edly",
            "ing", "ed", "ly",
        ];
        let lower = word.to_ascii_lowercase();
        for suffix in SUFFIXES {
            if lower.ends_with(suffix) {
                let split = chars.len().saturating_sub(suffix.chars().count());
                if split >= 3 && split + 3 <= chars.len() {
                    candidates.push(split);
                }
            }
        }

        candidates.sort_unstable();
        candidates.dedup();
        candidates
    }
}

/// Fragment-size limits for hyphenated splits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct WrapOptions {
    /// Minimum chars left of a break.
    pub min_left: usize,
    /// Minimum chars right of a break.
    pub min_right: usize,
}

impl Default for WrapOptions {
    fn default() -> Self {
        Self {
            min_left: 3,
            min_right: 3,
        }
    }
}

/// Split `word` at the latest admissible hyphenation position.
///
/// A position `p` is admissible when the left fragment holds at least
/// `min_left` chars, the right fragment at least `min_right`, and the left
/// fragment plus its trailing hyphen fits in `max_chars`. Returns
/// `(head, tail)` with `head` ending in `-`, or `None` when the word
/// already fits or no position is admissible.
pub fn split_word(
    word: &str,
    max_chars: usize,
    hyphenator: &dyn Hyphenator,
    opts: WrapOptions,
) -> Option<(String, String)> {
    let word_len = word.chars().count();
    if word_len <= max_chars {
        return None;
    }

    let positions = hyphenator.break_positions(word);
    if positions.is_empty() {
        return None;
    }

    // head + "-" must fit in max_chars
    let limit = max_chars.checked_sub(1)?;

    let mut best = None;
    for &p in &positions {
        if p >= opts.min_left && word_len - p >= opts.min_right && p <= limit {
            best = Some(p);
        }
    }

    let best = best?;
    let (left, right) = split_at_chars(word, best)?;
    Some((format!("{left}-"), right.to_string()))
}

/// Wrap `text` into lines of at most `max_chars` characters.
///
/// Greedy single pass over whitespace-delimited words. A word too long for
/// an empty line is hyphenated via `hyphenator`; when no admissible break
/// exists it is hard-cut to exactly `max_chars` chars (`max_chars - 1` of
/// the word plus a hyphen) and the remainder re-enters the stream. Output
/// depends only on the inputs; no state is carried across calls.
pub fn wrap_text(
    text: &str,
    max_chars: usize,
    hyphenator: &dyn Hyphenator,
    opts: WrapOptions,
) -> Vec<String> {
    let mut words: std::collections::VecDeque<String> =
        text.split_whitespace().map(str::to_string).collect();
    let mut lines = Vec::new();
    let mut line = String::new();

    while let Some(word) = words.pop_front() {
        let word_len = word.chars().count();

        if line.is_empty() {
            if word_len <= max_chars {
                line = word;
            } else if max_chars < 2 {
                // Degenerate budget: a hard cut could never shrink the
                // remainder, so emit the word whole instead of looping.
                lines.push(word);
            } else if let Some((head, tail)) = split_word(&word, max_chars, hyphenator, opts) {
                lines.push(head);
                words.push_front(tail);
            } else if let Some((head, rest)) = split_at_chars(&word, max_chars - 1) {
                lines.push(format!("{head}-"));
                words.push_front(rest.to_string());
            }
        } else if line.chars().count() + 1 + word_len <= max_chars {
            line.push(' ');
            line.push_str(&word);
        } else {
            lines.push(std::mem::take(&mut line));
            words.push_front(word);
        }
    }

    if !line.is_empty() {
        lines.push(line);
    }

    lines
}

fn split_at_chars(word: &str, split_chars: usize) -> Option<(&str, &str)> {
    if split_chars == 0 || split_chars >= word.chars().count() {
        return None;
    }
    let mut split_byte = None;
    for (idx, (byte, _)) in word.char_indices().enumerate() {
        if idx == split_chars {
            split_byte = Some(byte);
            break;
        }
    }
    let split_byte = split_byte?;
    Some((&word[..split_byte], &word[split_byte..]))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedBreaks(Vec<usize>);

    impl Hyphenator for FixedBreaks {
        fn break_positions(&self, _word: &str) -> BreakPositions {
            self.0.iter().copied().collect()
        }
    }

    fn wrap(text: &str, max_chars: usize) -> Vec<String> {
        wrap_text(
            text,
            max_chars,
            &EnglishHyphenator::default(),
            WrapOptions::default(),
        )
    }

    #[test]
    fn all_lines_stay_within_budget() {
        let text = "The quick brown fox jumps over the lazy dog near the riverbank";
        for max_chars in 7..=30 {
            for line in wrap(text, max_chars) {
                assert!(
                    line.chars().count() <= max_chars,
                    "line {line:?} exceeds budget {max_chars}"
                );
            }
        }
    }

    #[test]
    fn words_joined_by_single_spaces() {
        let lines = wrap("one two three four", 12);
        assert_eq!(lines, vec!["one two", "three four"]);
    }

    #[test]
    fn hard_cut_line_is_exactly_max_chars() {
        let hyphenator = FixedBreaks(Vec::new());
        let lines = wrap_text("abcdefghijkl", 5, &hyphenator, WrapOptions::default());
        assert_eq!(lines[0], "abcd-");
        assert_eq!(lines[0].chars().count(), 5);
        // remainder re-enters the stream and keeps shrinking
        assert_eq!(lines, vec!["abcd-", "efgh-", "ijkl"]);
    }

    #[test]
    fn split_reassembles_original_word() {
        let word = "Internationalization";
        let (head, tail) = split_word(
            word,
            10,
            &EnglishHyphenator::default(),
            WrapOptions::default(),
        )
        .expect("split should succeed");
        assert!(head.ends_with('-'));
        assert!(head.chars().count() <= 10);
        assert!(tail.chars().count() >= 3);
        let rejoined = format!("{}{}", &head[..head.len() - 1], tail);
        assert_eq!(rejoined, word);
    }

    #[test]
    fn split_prefers_latest_admissible_position() {
        let hyphenator = FixedBreaks(vec![3, 5, 7]);
        let (head, tail) =
            split_word("abcdefghij", 8, &hyphenator, WrapOptions::default()).expect("split");
        assert_eq!(head, "abcdefg-");
        assert_eq!(tail, "hij");
    }

    #[test]
    fn split_rejects_word_that_already_fits() {
        assert!(split_word(
            "short",
            10,
            &EnglishHyphenator::default(),
            WrapOptions::default()
        )
        .is_none());
    }

    #[test]
    fn split_rejects_inadmissible_positions() {
        // tail would be shorter than min_right
        let hyphenator = FixedBreaks(vec![9]);
        assert!(split_word("abcdefghij", 8, &hyphenator, WrapOptions::default()).is_none());
    }

    #[test]
    fn oversize_word_hyphenates_then_continues() {
        let lines = wrap("a Internationalization b", 10);
        assert!(lines.len() >= 3);
        assert!(lines[1].ends_with('-'));
        for line in &lines {
            assert!(line.chars().count() <= 10);
        }
        let rejoined: String = lines
            .iter()
            .map(|l| l.strip_suffix('-').unwrap_or(l))
            .collect::<Vec<_>>()
            .concat();
        assert!(rejoined.contains("Internationalization"));
    }

    #[test]
    fn non_english_tag_disables_breaking() {
        let hyphenator = EnglishHyphenator::from_tag("fr_FR");
        assert!(hyphenator.break_positions("Internationalization").is_empty());
    }

    #[test]
    fn degenerate_budget_still_terminates() {
        let lines = wrap("abcdef", 1);
        assert_eq!(lines, vec!["abcdef"]);
    }

    #[test]
    fn empty_text_yields_no_lines() {
        assert!(wrap("", 20).is_empty());
        assert!(wrap("   \n\t ", 20).is_empty());
    }
}
