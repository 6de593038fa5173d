//! Candidate store: the immutable candidate list and the filtered view over it.

use std::io::{self, BufRead};

use crate::core::desktop;

/// A selectable entry. `payload` is what gets printed on confirmation when
/// present (for application entries, the command line).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    display: String,
    payload: Option<String>,
}

impl Candidate {
    pub fn new(display: impl Into<String>) -> Self {
        Self {
            display: display.into(),
            payload: None,
        }
    }

    pub fn with_payload(display: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            display: display.into(),
            payload: Some(payload.into()),
        }
    }

    pub fn display(&self) -> &str {
        &self.display
    }

    pub fn payload(&self) -> Option<&str> {
        self.payload.as_deref()
    }

    /// The line emitted when this candidate is confirmed.
    pub fn output(&self) -> &str {
        self.payload.as_deref().unwrap_or(&self.display)
    }
}

/// Fixed, ordered candidate sequence. Identity of a candidate is its index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateList {
    items: Vec<Candidate>,
}

impl CandidateList {
    pub fn new(items: Vec<Candidate>) -> Self {
        Self { items }
    }

    pub fn from_displays<I, S>(displays: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(displays.into_iter().map(Candidate::new).collect())
    }

    /// Reads one candidate per line. Trailing `\r` is stripped, empty lines
    /// are skipped and invalid UTF-8 is replaced rather than rejected.
    pub fn from_lines<R: BufRead>(mut reader: R) -> io::Result<Self> {
        let mut items = Vec::new();
        let mut line = Vec::new();
        loop {
            line.clear();
            if reader.read_until(b'\n', &mut line)? == 0 {
                break;
            }
            while matches!(line.last(), Some(b'\n' | b'\r')) {
                line.pop();
            }
            if line.is_empty() {
                continue;
            }
            items.push(Candidate::new(String::from_utf8_lossy(&line).into_owned()));
        }
        Ok(Self { items })
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Candidate> {
        self.items.get(index)
    }

    pub fn as_slice(&self) -> &[Candidate] {
        &self.items
    }

    pub fn iter(&self) -> impl Iterator<Item = &Candidate> {
        self.items.iter()
    }
}

/// Ordered indices into a [`CandidateList`]. Empty is legal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultView {
    indices: Vec<usize>,
}

impl ResultView {
    /// The identity view: every candidate in original order.
    pub fn all(len: usize) -> Self {
        Self {
            indices: (0..len).collect(),
        }
    }

    pub fn from_indices(indices: Vec<usize>) -> Self {
        Self { indices }
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Candidate index at view position `position`.
    pub fn get(&self, position: usize) -> Option<usize> {
        self.indices.get(position).copied()
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn resolve<'a>(&self, candidates: &'a CandidateList, position: usize) -> Option<&'a Candidate> {
        self.get(position).and_then(|index| candidates.get(index))
    }
}

/// Where candidates come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CandidateSource {
    /// Newline-separated entries on a byte stream.
    #[default]
    Lines,
    /// Installed `.desktop` application entries.
    Desktop,
}

impl CandidateSource {
    pub fn load<R: BufRead>(self, input: R) -> io::Result<CandidateList> {
        match self {
            CandidateSource::Lines => CandidateList::from_lines(input),
            CandidateSource::Desktop => Ok(desktop::load_applications(&desktop::application_dirs())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Candidate, CandidateList, ResultView};

    #[test]
    fn from_lines_strips_line_endings_and_skips_blanks() {
        let input = b"alpha\r\n\nbeta\ngamma" as &[u8];
        let list = CandidateList::from_lines(input).expect("read lines");
        let displays: Vec<&str> = list.iter().map(Candidate::display).collect();
        assert_eq!(displays, vec!["alpha", "beta", "gamma"]);
    }

    #[test]
    fn from_lines_replaces_invalid_utf8() {
        let input = b"ok\n\xffbad\n" as &[u8];
        let list = CandidateList::from_lines(input).expect("read lines");
        assert_eq!(list.len(), 2);
        assert_eq!(list.get(1).map(Candidate::display), Some("\u{fffd}bad"));
    }

    #[test]
    fn output_prefers_payload() {
        assert_eq!(Candidate::new("Firefox").output(), "Firefox");
        assert_eq!(
            Candidate::with_payload("Firefox", "firefox --new-window").output(),
            "firefox --new-window"
        );
    }

    #[test]
    fn view_resolves_through_indices() {
        let list = CandidateList::from_displays(["a", "b", "c"]);
        let view = ResultView::from_indices(vec![2, 0]);
        assert_eq!(view.resolve(&list, 0).map(Candidate::display), Some("c"));
        assert_eq!(view.resolve(&list, 1).map(Candidate::display), Some("a"));
        assert!(view.resolve(&list, 2).is_none());
        assert_eq!(ResultView::all(3).indices(), &[0, 1, 2]);
    }
}
