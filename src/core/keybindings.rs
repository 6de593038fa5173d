//! Maps key events to input-model commands and session transitions.

use crate::core::input_model::Command;
use crate::core::keys::{evdev, KeyEvent, Keysym};
use crate::core::query::is_printable;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Edit(Command),
    Confirm,
    Cancel,
    Ignore,
}

/// First matching rule wins. Ctrl shortcuts are matched on the physical key
/// so they stay put across keyboard layouts.
pub fn dispatch(event: &KeyEvent) -> Action {
    if let Some(ch) = event.utf32.filter(|&ch| is_printable(ch)) {
        return Action::Edit(Command::Insert(ch));
    }

    let sym = event.keysym;
    let ctrl_key = |code: u32| event.ctrl_held() && event.evdev_code() == Some(code);

    if sym == Keysym::BACKSPACE {
        Action::Edit(Command::DeleteChar)
    } else if ctrl_key(evdev::KEY_W) {
        Action::Edit(Command::DeleteWord)
    } else if ctrl_key(evdev::KEY_U) {
        Action::Edit(Command::Clear)
    } else if matches!(sym, Keysym::UP | Keysym::LEFT | Keysym::ISO_LEFT_TAB) || ctrl_key(evdev::KEY_K) {
        Action::Edit(Command::Previous)
    } else if matches!(sym, Keysym::DOWN | Keysym::RIGHT | Keysym::TAB) || ctrl_key(evdev::KEY_J) {
        Action::Edit(Command::Next)
    } else if sym == Keysym::HOME {
        Action::Edit(Command::Home)
    } else if sym == Keysym::ESCAPE || ctrl_key(evdev::KEY_C) {
        Action::Cancel
    } else if matches!(sym, Keysym::RETURN | Keysym::KP_ENTER) {
        Action::Confirm
    } else {
        Action::Ignore
    }
}

#[cfg(test)]
mod tests {
    use super::{dispatch, Action};
    use crate::core::input_model::Command;
    use crate::core::keys::{evdev, KeyEvent, Keysym, MOD_CTRL, MOD_SHIFT};

    #[test]
    fn printable_characters_insert() {
        assert_eq!(dispatch(&KeyEvent::character('a')), Action::Edit(Command::Insert('a')));
        assert_eq!(dispatch(&KeyEvent::character(' ')), Action::Edit(Command::Insert(' ')));
    }

    #[test]
    fn ctrl_shortcuts_follow_physical_position() {
        // A layout where the W position produces 'z' still deletes a word.
        let mut event = KeyEvent::ctrl(evdev::KEY_W);
        event.keysym = Keysym(u32::from(b'z'));
        assert_eq!(dispatch(&event), Action::Edit(Command::DeleteWord));
        assert_eq!(dispatch(&KeyEvent::ctrl(evdev::KEY_U)), Action::Edit(Command::Clear));
        assert_eq!(dispatch(&KeyEvent::ctrl(evdev::KEY_K)), Action::Edit(Command::Previous));
        assert_eq!(dispatch(&KeyEvent::ctrl(evdev::KEY_J)), Action::Edit(Command::Next));
        assert_eq!(dispatch(&KeyEvent::ctrl(evdev::KEY_C)), Action::Cancel);
    }

    #[test]
    fn navigation_keys() {
        let named = |code, sym| dispatch(&KeyEvent::named(code, sym, 0));
        assert_eq!(named(evdev::KEY_UP, Keysym::UP), Action::Edit(Command::Previous));
        assert_eq!(named(evdev::KEY_LEFT, Keysym::LEFT), Action::Edit(Command::Previous));
        assert_eq!(
            dispatch(&KeyEvent::named(evdev::KEY_TAB, Keysym::ISO_LEFT_TAB, MOD_SHIFT)),
            Action::Edit(Command::Previous)
        );
        assert_eq!(named(evdev::KEY_DOWN, Keysym::DOWN), Action::Edit(Command::Next));
        assert_eq!(named(evdev::KEY_RIGHT, Keysym::RIGHT), Action::Edit(Command::Next));
        assert_eq!(named(evdev::KEY_TAB, Keysym::TAB), Action::Edit(Command::Next));
        assert_eq!(named(evdev::KEY_HOME, Keysym::HOME), Action::Edit(Command::Home));
        assert_eq!(named(evdev::KEY_BACKSPACE, Keysym::BACKSPACE), Action::Edit(Command::DeleteChar));
    }

    #[test]
    fn lifecycle_keys() {
        assert_eq!(dispatch(&KeyEvent::named(evdev::KEY_ESC, Keysym::ESCAPE, 0)), Action::Cancel);
        assert_eq!(dispatch(&KeyEvent::named(evdev::KEY_ENTER, Keysym::RETURN, 0)), Action::Confirm);
        assert_eq!(dispatch(&KeyEvent::named(evdev::KEY_KPENTER, Keysym::KP_ENTER, 0)), Action::Confirm);
    }

    #[test]
    fn unbound_keys_are_ignored() {
        assert_eq!(dispatch(&KeyEvent::ctrl(30)), Action::Ignore);
        assert_eq!(dispatch(&KeyEvent::named(0, Keysym::NO_SYMBOL, MOD_CTRL)), Action::Ignore);
    }
}
