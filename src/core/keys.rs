//! Keyboard event model: XKB-style keycodes, keysyms and modifier masks.

/// Linux evdev codes are 8 lower than XKB keycodes.
pub const EVDEV_OFFSET: u32 = 8;

pub const MOD_SHIFT: u8 = 1;
pub const MOD_ALT: u8 = 2;
pub const MOD_CTRL: u8 = 4;
pub const MOD_SUPER: u8 = 8;

/// Physical key positions (evdev codes) used by Ctrl shortcuts.
pub mod evdev {
    pub const KEY_ESC: u32 = 1;
    pub const KEY_BACKSPACE: u32 = 14;
    pub const KEY_TAB: u32 = 15;
    pub const KEY_W: u32 = 17;
    pub const KEY_U: u32 = 22;
    pub const KEY_ENTER: u32 = 28;
    pub const KEY_J: u32 = 36;
    pub const KEY_K: u32 = 37;
    pub const KEY_C: u32 = 46;
    pub const KEY_SPACE: u32 = 57;
    pub const KEY_HOME: u32 = 102;
    pub const KEY_UP: u32 = 103;
    pub const KEY_LEFT: u32 = 105;
    pub const KEY_RIGHT: u32 = 106;
    pub const KEY_DOWN: u32 = 108;
    pub const KEY_KPENTER: u32 = 96;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Keysym(pub u32);

impl Keysym {
    pub const NO_SYMBOL: Keysym = Keysym(0);
    pub const BACKSPACE: Keysym = Keysym(0xff08);
    pub const TAB: Keysym = Keysym(0xff09);
    pub const RETURN: Keysym = Keysym(0xff0d);
    pub const ESCAPE: Keysym = Keysym(0xff1b);
    pub const HOME: Keysym = Keysym(0xff50);
    pub const LEFT: Keysym = Keysym(0xff51);
    pub const UP: Keysym = Keysym(0xff52);
    pub const RIGHT: Keysym = Keysym(0xff53);
    pub const DOWN: Keysym = Keysym(0xff54);
    pub const KP_ENTER: Keysym = Keysym(0xff8d);
    pub const ISO_LEFT_TAB: Keysym = Keysym(0xfe20);

    /// Keysym of a Latin-1 character, or the Unicode keysym range otherwise.
    pub fn from_char(ch: char) -> Keysym {
        let cp = ch as u32;
        if (0x20..=0x7e).contains(&cp) || (0xa0..=0xff).contains(&cp) {
            Keysym(cp)
        } else {
            Keysym(0x0100_0000 | cp)
        }
    }
}

/// One decoded key press as delivered by a keyboard-state adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEvent {
    /// XKB keycode (evdev code + 8).
    pub keycode: u32,
    pub keysym: Keysym,
    pub modifiers: u8,
    /// Decoded character, if the key produces one.
    pub utf32: Option<char>,
    pub utf8: String,
}

impl KeyEvent {
    pub fn new(keycode: u32, keysym: Keysym, modifiers: u8, utf32: Option<char>) -> Self {
        Self {
            keycode,
            keysym,
            modifiers,
            utf32,
            utf8: utf32.map(String::from).unwrap_or_default(),
        }
    }

    /// Plain typed character on the US-layout position that produces it.
    pub fn character(ch: char) -> Self {
        let keycode = us_layout_keycode(ch).map_or(0, |code| code + EVDEV_OFFSET);
        let modifiers = if ch.is_ascii_uppercase() { MOD_SHIFT } else { 0 };
        Self::new(keycode, Keysym::from_char(ch), modifiers, Some(ch))
    }

    /// A non-character key such as an arrow or Return.
    pub fn named(evdev_code: u32, keysym: Keysym, modifiers: u8) -> Self {
        Self::new(evdev_code + EVDEV_OFFSET, keysym, modifiers, None)
    }

    /// Ctrl held on the physical key at `evdev_code`.
    pub fn ctrl(evdev_code: u32) -> Self {
        let keysym = us_layout_char(evdev_code).map_or(Keysym::NO_SYMBOL, Keysym::from_char);
        Self::new(evdev_code + EVDEV_OFFSET, keysym, MOD_CTRL, None)
    }

    /// Physical key position, independent of the active layout.
    pub fn evdev_code(&self) -> Option<u32> {
        self.keycode.checked_sub(EVDEV_OFFSET)
    }

    pub fn ctrl_held(&self) -> bool {
        self.modifiers & MOD_CTRL != 0
    }
}

const US_LETTER_ROWS: [(&str, u32); 3] = [("qwertyuiop", 16), ("asdfghjkl", 30), ("zxcvbnm", 44)];

/// Evdev code of the key that types `ch` on a US QWERTY layout.
pub fn us_layout_keycode(ch: char) -> Option<u32> {
    let lower = ch.to_ascii_lowercase();
    if lower == ' ' {
        return Some(evdev::KEY_SPACE);
    }
    if let Some(digit) = lower.to_digit(10) {
        // KEY_1 = 2 .. KEY_9 = 10, KEY_0 = 11
        return Some(if digit == 0 { 11 } else { digit + 1 });
    }
    US_LETTER_ROWS.iter().find_map(|(row, first)| {
        row.find(lower).map(|offset| first + offset as u32)
    })
}

/// Letter typed by the evdev key `code` on a US QWERTY layout.
pub fn us_layout_char(code: u32) -> Option<char> {
    US_LETTER_ROWS.iter().find_map(|(row, first)| {
        code.checked_sub(*first)
            .and_then(|offset| row.chars().nth(offset as usize))
    })
}

#[cfg(test)]
mod tests {
    use super::{evdev, us_layout_char, us_layout_keycode, KeyEvent, Keysym, MOD_CTRL};

    #[test]
    fn us_layout_positions_match_evdev_codes() {
        assert_eq!(us_layout_keycode('w'), Some(evdev::KEY_W));
        assert_eq!(us_layout_keycode('U'), Some(evdev::KEY_U));
        assert_eq!(us_layout_keycode('j'), Some(evdev::KEY_J));
        assert_eq!(us_layout_keycode('k'), Some(evdev::KEY_K));
        assert_eq!(us_layout_keycode('c'), Some(evdev::KEY_C));
        assert_eq!(us_layout_keycode('1'), Some(2));
        assert_eq!(us_layout_keycode('0'), Some(11));
        assert_eq!(us_layout_keycode('é'), None);
        assert_eq!(us_layout_char(evdev::KEY_W), Some('w'));
        assert_eq!(us_layout_char(evdev::KEY_C), Some('c'));
        assert_eq!(us_layout_char(evdev::KEY_ENTER), None);
    }

    #[test]
    fn ctrl_event_keeps_physical_code() {
        let event = KeyEvent::ctrl(evdev::KEY_W);
        assert_eq!(event.evdev_code(), Some(evdev::KEY_W));
        assert_eq!(event.keysym, Keysym(u32::from(b'w')));
        assert_eq!(event.modifiers, MOD_CTRL);
        assert!(event.utf32.is_none());
    }

    #[test]
    fn character_event_encodes_utf8() {
        let event = KeyEvent::character('ß');
        assert_eq!(event.utf8, "ß");
        assert_eq!(event.keysym, Keysym(0xdf));
        assert_eq!(KeyEvent::character('字').keysym, Keysym(0x0100_5b57));
    }
}
