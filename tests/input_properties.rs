//! Property tests for the query and selection model, driven the way the
//! session drives it: apply a command, refilter when the query changed,
//! then let a renderer that fits `page` results record what it drew.

use proptest::prelude::*;
use tofi::core::query::{is_printable, QueryBuffer, MAX_QUERY_CHARS};
use tofi::{filter, CandidateList, Command, InputModel};

fn command_strategy() -> impl Strategy<Value = Command> {
    prop_oneof![
        3 => prop::sample::select(vec!['a', 'b', 'c', ' ', 'é', '\u{7}']).prop_map(Command::Insert),
        1 => Just(Command::DeleteChar),
        1 => Just(Command::DeleteWord),
        1 => Just(Command::Clear),
        3 => Just(Command::Previous),
        4 => Just(Command::Next),
        1 => Just(Command::Home),
    ]
}

fn candidates_strategy() -> impl Strategy<Value = CandidateList> {
    prop::collection::vec("[abc é]{0,6}", 0..40).prop_map(CandidateList::from_displays)
}

fn draw(model: &mut InputModel, page: usize) {
    let remaining = model.view().len().saturating_sub(model.selection().page_anchor);
    model.record_drawn(page.min(remaining));
}

proptest! {
    #[test]
    fn selection_stays_valid(
        list in candidates_strategy(),
        commands in prop::collection::vec(command_strategy(), 0..80),
        page in 1usize..8,
        fuzzy in any::<bool>(),
    ) {
        let mut model = InputModel::new(filter(&list, "", fuzzy));
        draw(&mut model, page);
        for command in commands {
            if model.apply(command) {
                let view = filter(&list, model.query().as_str(), fuzzy);
                model.replace_view(view);
                let selection = model.selection();
                prop_assert_eq!((selection.page_anchor, selection.cursor), (0, 0));
            }
            draw(&mut model, page);

            let selection = model.selection();
            let len = model.view().len();
            prop_assert!(selection.cursor < model.last_drawn_count().max(1), "{:?} after {:?}", selection, command);
            prop_assert!(selection.page_anchor <= len);
            if len > 0 {
                prop_assert!(selection.position() < len, "{:?} len={} after {:?}", selection, len, command);
                prop_assert!(selection.page_anchor < len);
            }
        }
    }

    #[test]
    fn insert_then_delete_restores_query(prefix in "[a-z é]{0,20}", ch in any::<char>()) {
        let mut query = QueryBuffer::new();
        for c in prefix.chars() {
            query.push(c);
        }
        let before = query.clone();
        if query.push(ch) {
            prop_assert!(is_printable(ch));
            prop_assert_eq!(query.pop(), Some(ch));
        }
        prop_assert_eq!(&query, &before);
        prop_assert_eq!(query.as_str().chars().count(), query.len());
        prop_assert!(query.len() <= MAX_QUERY_CHARS);
    }
}

#[test]
fn query_is_bounded() {
    let mut query = QueryBuffer::new();
    for _ in 0..MAX_QUERY_CHARS {
        assert!(query.push('x'));
    }
    assert!(query.is_full());
    assert!(!query.push('y'));
    assert_eq!(query.as_str().len(), MAX_QUERY_CHARS);
}
