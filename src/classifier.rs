//! Content classifier: additive scoring over the signal list.
//!
//! Classification runs in a fixed order:
//! 1. blank input short-circuits to plain text,
//! 2. every signal adds `matches × weight` to its language,
//! 3. the component-markup override adds a fixed score to `tsx` or `jsx`,
//! 4. the highest score wins, ties going to the language that entered first.

use crate::detector::Detection;
use crate::lang::{Catalog, TEXT};
use crate::signals::Signal;

/// Display name used when the input is blank.
pub const BLANK_NAME: &str = "Plain Text";
/// Display name used when nothing fired on non-blank input.
pub const UNMATCHED_NAME: &str = "Text";

const TYPED_COMPONENT: &str = "tsx";
const TYPED_COMPONENT_SCORE: u64 = 10;
const UNTYPED_COMPONENT: &str = "jsx";
const UNTYPED_COMPONENT_SCORE: u64 = 8;

/// Per-call score table that remembers insertion order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct ScoreBoard<'a> {
    entries: Vec<(&'a str, u64)>,
}

impl<'a> ScoreBoard<'a> {
    pub(crate) fn add(&mut self, language: &'a str, points: u64) {
        match self.entries.iter_mut().find(|(id, _)| *id == language) {
            Some((_, score)) => *score = score.saturating_add(points),
            None => self.entries.push((language, points)),
        }
    }

    #[cfg(test)]
    pub(crate) fn get(&self, language: &str) -> Option<u64> {
        self.entries
            .iter()
            .find(|(id, _)| *id == language)
            .map(|&(_, score)| score)
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Highest score; the earliest entry wins a tie.
    pub(crate) fn leader(&self) -> Option<(&'a str, u64)> {
        self.entries.iter().fold(None, |best, &(id, score)| match best {
            Some((_, top)) if top >= score => best,
            _ => Some((id, score)),
        })
    }
}

/// Fold every firing signal into a fresh score board, then apply the override.
pub(crate) fn score<'a>(code: &str, signals: &'a [Signal]) -> ScoreBoard<'a> {
    let mut board = signals
        .iter()
        .fold(ScoreBoard::default(), |mut board, signal| {
            let points = signal.score(code);
            if points > 0 {
                board.add(signal.language(), points);
            }
            board
        });

    if let Some((language, points)) = component_override(code) {
        board.add(language, points);
    }
    board
}

/// Coarse check separating component markup (JSX/TSX) from plain script or HTML.
///
/// Fires on a React import or reference, or on a tag opening with an
/// uppercase letter. Any `": "`, `"interface "` or `"type "` in the text
/// marks it as typed.
pub(crate) fn component_override(code: &str) -> Option<(&'static str, u64)> {
    let looks_like_component = code.contains("import React")
        || code.contains("React.")
        || has_component_tag(code);
    if !looks_like_component {
        return None;
    }

    if code.contains(": ") || code.contains("interface ") || code.contains("type ") {
        Some((TYPED_COMPONENT, TYPED_COMPONENT_SCORE))
    } else {
        Some((UNTYPED_COMPONENT, UNTYPED_COMPONENT_SCORE))
    }
}

fn has_component_tag(code: &str) -> bool {
    code.as_bytes()
        .windows(2)
        .any(|pair| pair[0] == b'<' && pair[1].is_ascii_uppercase())
}

/// Classify `code` by content alone. Never fails.
pub fn classify(code: &str, signals: &[Signal], catalog: &Catalog) -> Detection {
    if code.trim().is_empty() {
        return Detection::new(TEXT, BLANK_NAME);
    }

    match score(code, signals).leader() {
        Some((language, _)) => Detection::new(language, catalog.name_or_id(language)),
        None => Detection::new(TEXT, UNMATCHED_NAME),
    }
}
