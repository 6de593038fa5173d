//! Bounded query text kept as scalars and as UTF-8 at the same time.

/// Maximum number of scalars the query can hold.
pub const MAX_QUERY_CHARS: usize = 256;

/// The query being typed. `text` is always the UTF-8 encoding of `chars`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryBuffer {
    chars: Vec<char>,
    text: String,
}

impl QueryBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn chars(&self) -> &[char] {
        &self.chars
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.chars.len() >= MAX_QUERY_CHARS
    }

    /// Appends `ch` when it is printable and there is room left.
    pub fn push(&mut self, ch: char) -> bool {
        if self.is_full() || !is_printable(ch) {
            return false;
        }
        self.chars.push(ch);
        self.text.push(ch);
        true
    }

    pub fn pop(&mut self) -> Option<char> {
        let ch = self.chars.pop()?;
        self.text.truncate(self.text.len() - ch.len_utf8());
        Some(ch)
    }

    /// Drops trailing whitespace, then the word before it.
    pub fn delete_word(&mut self) -> bool {
        let before = self.chars.len();
        while self.chars.last().is_some_and(|ch| ch.is_whitespace()) {
            self.pop();
        }
        while self.chars.last().is_some_and(|ch| !ch.is_whitespace()) {
            self.pop();
        }
        self.chars.len() != before
    }

    pub fn clear(&mut self) -> bool {
        let changed = !self.chars.is_empty();
        self.chars.clear();
        self.text.clear();
        changed
    }
}

/// Whether `ch` may be typed into the query: not a control, format,
/// private-use, noncharacter or line/paragraph separator code point.
pub fn is_printable(ch: char) -> bool {
    if ch.is_control() {
        return false;
    }
    let cp = ch as u32;
    let format = matches!(
        cp,
        0x00AD
            | 0x0600..=0x0605
            | 0x061C
            | 0x06DD
            | 0x070F
            | 0x180E
            | 0x200B..=0x200F
            | 0x202A..=0x202E
            | 0x2060..=0x2064
            | 0x2066..=0x206F
            | 0xFEFF
            | 0xFFF9..=0xFFFB
            | 0xE0001
            | 0xE0020..=0xE007F
    );
    let private_use = matches!(cp, 0xE000..=0xF8FF | 0xF0000..=0xFFFFD | 0x100000..=0x10FFFD);
    let separator = matches!(cp, 0x2028 | 0x2029);
    let noncharacter = matches!(cp, 0xFDD0..=0xFDEF) || (cp & 0xFFFE) == 0xFFFE;
    !(format || private_use || separator || noncharacter)
}

#[cfg(test)]
mod tests {
    use super::{is_printable, QueryBuffer, MAX_QUERY_CHARS};

    #[test]
    fn push_and_pop_keep_both_views_in_sync() {
        let mut query = QueryBuffer::new();
        for ch in ['a', 'é', '字', '🦀'] {
            assert!(query.push(ch));
        }
        assert_eq!(query.as_str(), "aé字🦀");
        assert_eq!(query.len(), 4);
        assert_eq!(query.pop(), Some('🦀'));
        assert_eq!(query.as_str(), "aé字");
        assert_eq!(query.pop(), Some('字'));
        assert_eq!(query.pop(), Some('é'));
        assert_eq!(query.as_str(), "a");
    }

    #[test]
    fn rejects_control_and_private_use() {
        let mut query = QueryBuffer::new();
        assert!(!query.push('\n'));
        assert!(!query.push('\u{7f}'));
        assert!(!query.push('\u{e000}'));
        assert!(!query.push('\u{200b}'));
        assert!(query.is_empty());
        assert!(is_printable(' '));
    }

    #[test]
    fn stops_at_capacity() {
        let mut query = QueryBuffer::new();
        for _ in 0..MAX_QUERY_CHARS {
            assert!(query.push('x'));
        }
        assert!(query.is_full());
        assert!(!query.push('y'));
        assert_eq!(query.as_str().len(), MAX_QUERY_CHARS);
    }

    #[test]
    fn delete_word_strips_trailing_space_then_word() {
        let mut query = QueryBuffer::new();
        "git commit  ".chars().for_each(|ch| {
            query.push(ch);
        });
        assert!(query.delete_word());
        assert_eq!(query.as_str(), "git ");
        assert!(query.delete_word());
        assert_eq!(query.as_str(), "");
        assert!(!query.delete_word());
    }

    #[test]
    fn clear_reports_change_only_when_non_empty() {
        let mut query = QueryBuffer::new();
        assert!(!query.clear());
        query.push('q');
        assert!(query.clear());
        assert!(query.is_empty());
    }
}
