//! Query matching over the candidate list.
//!
//! Both modes fold ASCII case only; any other byte is compared as-is.

use crate::core::candidate::{CandidateList, ResultView};

/// Sort key of a matching candidate. Lower sorts first; ties fall back to
/// the candidate's original index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MatchKey {
    /// Byte offset of the first contiguous occurrence.
    Substring { offset: usize },
    /// Distance between the first and last matched character, then the
    /// position of the first one.
    Fuzzy { span: usize, first: usize },
}

/// Filters the whole candidate list. An empty query keeps every candidate
/// in original order.
pub fn filter(candidates: &CandidateList, query: &str, fuzzy: bool) -> ResultView {
    filter_indices(candidates, 0..candidates.len(), query, fuzzy)
}

/// Filters only the entries of `view`. When `query` extends the query that
/// produced `view`, the result equals [`filter`] over the full list, because
/// every candidate matching the longer query also matches its prefix.
pub fn refine(candidates: &CandidateList, view: &ResultView, query: &str, fuzzy: bool) -> ResultView {
    filter_indices(candidates, view.indices().iter().copied(), query, fuzzy)
}

fn filter_indices<I>(candidates: &CandidateList, indices: I, query: &str, fuzzy: bool) -> ResultView
where
    I: Iterator<Item = usize>,
{
    if query.is_empty() {
        let mut all: Vec<usize> = indices.collect();
        all.sort_unstable();
        return ResultView::from_indices(all);
    }

    let query_chars: Vec<char> = query.chars().map(|ch| ch.to_ascii_lowercase()).collect();
    let mut matched: Vec<(MatchKey, usize)> = indices
        .filter_map(|index| {
            let display = candidates.get(index)?.display();
            let key = if fuzzy {
                fuzzy_key(display, &query_chars)
            } else {
                find_ignore_ascii_case(display, query).map(|offset| MatchKey::Substring { offset })
            }?;
            Some((key, index))
        })
        .collect();

    matched.sort_unstable();
    ResultView::from_indices(matched.into_iter().map(|(_, index)| index).collect())
}

/// Byte offset of the first ASCII-case-insensitive occurrence of `needle`.
/// The returned offset always lies on a char boundary of `haystack`.
pub fn find_ignore_ascii_case(haystack: &str, needle: &str) -> Option<usize> {
    let hay = haystack.as_bytes();
    let pat = needle.as_bytes();
    if pat.is_empty() {
        return Some(0);
    }
    if pat.len() > hay.len() {
        return None;
    }
    (0..=hay.len() - pat.len()).find(|&start| {
        hay[start..start + pat.len()]
            .iter()
            .zip(pat)
            .all(|(a, b)| a.eq_ignore_ascii_case(b))
    })
}

/// Tightest in-order occurrence of `query` inside `text`, measured in chars.
fn fuzzy_key(text: &str, query: &[char]) -> Option<MatchKey> {
    let (&head, rest) = query.split_first()?;
    let chars: Vec<char> = text.chars().map(|ch| ch.to_ascii_lowercase()).collect();
    let mut best: Option<(usize, usize)> = None;

    for start in 0..chars.len() {
        if chars[start] != head {
            continue;
        }
        let mut remaining = rest.iter().peekable();
        let mut last = start;
        for (pos, ch) in chars.iter().enumerate().skip(start + 1) {
            match remaining.peek() {
                Some(&&want) if want == *ch => {
                    remaining.next();
                    last = pos;
                }
                Some(_) => {}
                None => break,
            }
        }
        if remaining.peek().is_some() {
            // A later start sees a suffix of what this one saw.
            break;
        }
        let span = last - start;
        if best.map_or(true, |(best_span, _)| span < best_span) {
            best = Some((span, start));
        }
    }

    best.map(|(span, first)| MatchKey::Fuzzy { span, first })
}
