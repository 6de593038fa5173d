//! Query, selection and paging state driven by key commands.

use crate::core::candidate::ResultView;
use crate::core::query::QueryBuffer;

/// Edit and navigation commands produced by the key dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Insert(char),
    DeleteChar,
    DeleteWord,
    Clear,
    Previous,
    Next,
    Home,
}

impl Command {
    pub fn edits_query(self) -> bool {
        matches!(
            self,
            Command::Insert(_) | Command::DeleteChar | Command::DeleteWord | Command::Clear
        )
    }
}

/// Position of the highlighted result: `page_anchor` is the view index of
/// the first result on screen, `cursor` the slot within that page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SelectionState {
    pub page_anchor: usize,
    pub cursor: usize,
}

impl SelectionState {
    pub fn position(&self) -> usize {
        self.page_anchor + self.cursor
    }
}

#[derive(Debug, Clone, Default)]
pub struct InputModel {
    query: QueryBuffer,
    view: ResultView,
    selection: SelectionState,
    /// Results drawn by the most recent frame. Written by the renderer.
    last_drawn_count: usize,
    /// Page size remembered when `next` last wrapped to a new page.
    last_page_size: usize,
}

impl InputModel {
    pub fn new(view: ResultView) -> Self {
        Self {
            view,
            ..Self::default()
        }
    }

    pub fn query(&self) -> &QueryBuffer {
        &self.query
    }

    pub fn view(&self) -> &ResultView {
        &self.view
    }

    pub fn selection(&self) -> SelectionState {
        self.selection
    }

    pub fn last_drawn_count(&self) -> usize {
        self.last_drawn_count
    }

    /// View position of the highlighted result, if the view is non-empty.
    pub fn selected_position(&self) -> Option<usize> {
        let position = self.selection.position();
        (position < self.view.len()).then_some(position)
    }

    /// Applies `command`; returns whether the query text changed.
    pub fn apply(&mut self, command: Command) -> bool {
        match command {
            Command::Insert(ch) => self.query.push(ch),
            Command::DeleteChar => self.query.pop().is_some(),
            Command::DeleteWord => self.query.delete_word(),
            Command::Clear => self.query.clear(),
            Command::Previous => {
                self.select_previous();
                false
            }
            Command::Next => {
                self.select_next();
                false
            }
            Command::Home => {
                self.home();
                false
            }
        }
    }

    /// Installs a freshly filtered view and resets the selection to its top.
    pub fn replace_view(&mut self, view: ResultView) {
        self.view = view;
        self.home();
    }

    pub fn home(&mut self) {
        self.selection = SelectionState::default();
    }

    /// Records how many results the last frame drew. The cursor is pulled
    /// back onto the page if the page came out shorter than the slot it
    /// points at.
    pub fn record_drawn(&mut self, drawn: usize) {
        self.last_drawn_count = drawn;
        if drawn > 0 && self.selection.cursor >= drawn {
            self.selection.cursor = drawn - 1;
        }
    }

    fn page_size(&self) -> usize {
        self.last_drawn_count.min(self.view.len()).max(1)
    }

    fn select_previous(&mut self) {
        if self.selection.cursor > 0 {
            self.selection.cursor -= 1;
            return;
        }
        let page = self.page_size();
        let anchor = self.selection.page_anchor;
        if anchor > page {
            let step = self.last_page_size.clamp(1, anchor);
            self.selection.page_anchor = anchor - step;
            self.selection.cursor = step - 1;
        } else if anchor > 0 {
            self.selection.cursor = anchor - 1;
            self.selection.page_anchor = 0;
        }
    }

    fn select_next(&mut self) {
        let page = self.page_size();
        self.selection.cursor += 1;
        if self.selection.cursor >= page {
            self.selection.cursor -= page;
            self.selection.page_anchor = if self.view.is_empty() {
                0
            } else {
                (self.selection.page_anchor + page) % self.view.len()
            };
            self.last_page_size = self.last_drawn_count;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Command, InputModel, SelectionState};
    use crate::core::candidate::ResultView;

    fn model_with(len: usize, drawn: usize) -> InputModel {
        let mut model = InputModel::new(ResultView::all(len));
        model.record_drawn(drawn.min(len));
        model
    }

    /// Mirrors a renderer that fits `page` results per frame.
    fn render(model: &mut InputModel, page: usize) {
        let remaining = model.view().len().saturating_sub(model.selection().page_anchor);
        model.record_drawn(page.min(remaining));
    }

    #[test]
    fn next_moves_within_page_then_wraps() {
        let mut model = model_with(100, 5);
        for _ in 0..4 {
            model.apply(Command::Next);
            render(&mut model, 5);
        }
        assert_eq!(model.selection(), SelectionState { page_anchor: 0, cursor: 4 });
        model.apply(Command::Next);
        render(&mut model, 5);
        assert_eq!(model.selection(), SelectionState { page_anchor: 5, cursor: 0 });
        assert_eq!(model.selected_position(), Some(5));
    }

    #[test]
    fn previous_at_top_of_page_goes_back_a_page() {
        let mut model = model_with(100, 5);
        for _ in 0..10 {
            model.apply(Command::Next);
            render(&mut model, 5);
        }
        assert_eq!(model.selection(), SelectionState { page_anchor: 10, cursor: 0 });
        model.apply(Command::Previous);
        render(&mut model, 5);
        assert_eq!(model.selection(), SelectionState { page_anchor: 5, cursor: 4 });
    }

    #[test]
    fn previous_on_second_page_returns_to_first() {
        let mut model = model_with(100, 5);
        for _ in 0..5 {
            model.apply(Command::Next);
            render(&mut model, 5);
        }
        assert_eq!(model.selection().page_anchor, 5);
        model.apply(Command::Previous);
        assert_eq!(model.selection(), SelectionState { page_anchor: 0, cursor: 4 });
    }

    #[test]
    fn previous_at_very_top_is_noop() {
        let mut model = model_with(3, 3);
        model.apply(Command::Previous);
        assert_eq!(model.selection(), SelectionState::default());
    }

    #[test]
    fn next_wraps_past_end_of_view() {
        let mut model = model_with(3, 3);
        for _ in 0..3 {
            model.apply(Command::Next);
            render(&mut model, 3);
        }
        assert_eq!(model.selection(), SelectionState::default());
    }

    #[test]
    fn next_on_empty_view_stays_home() {
        let mut model = model_with(0, 0);
        model.apply(Command::Next);
        assert_eq!(model.selection(), SelectionState::default());
        assert_eq!(model.selected_position(), None);
    }

    #[test]
    fn edits_report_query_changes() {
        let mut model = model_with(3, 3);
        assert!(model.apply(Command::Insert('a')));
        assert!(!model.apply(Command::Insert('\u{7}')));
        assert!(model.apply(Command::DeleteChar));
        assert!(!model.apply(Command::DeleteChar));
        assert!(!model.apply(Command::DeleteWord));
        assert!(!model.apply(Command::Clear));
        assert!(!model.apply(Command::Home));
    }

    #[test]
    fn record_drawn_pulls_cursor_onto_short_page() {
        let mut model = model_with(10, 5);
        for _ in 0..4 {
            model.apply(Command::Next);
        }
        model.record_drawn(2);
        assert_eq!(model.selection().cursor, 1);
    }
}
