//! Terminal keyboard decoding.
//!
//! Raw bytes from the tty are split into complete escape sequences (an
//! incomplete tail waits for more bytes or a short timeout, so a lone Escape
//! is told apart from the start of an arrow key) and each sequence is turned
//! into a [`KeyEvent`] shaped like one from a keymap-aware compositor.

use std::time::{Duration, Instant};

use crate::core::keys::{evdev, us_layout_keycode, KeyEvent, Keysym, MOD_ALT, MOD_CTRL, MOD_SHIFT};

const ESC: char = '\x1b';

/// How long an incomplete escape sequence may wait for its remaining bytes.
pub const DEFAULT_ESCAPE_TIMEOUT: Duration = Duration::from_millis(25);

#[derive(Debug)]
enum SequenceStatus {
    Complete,
    Incomplete,
    NotEscape,
}

pub struct KeyDecoder {
    /// Bytes of a UTF-8 character split across reads.
    partial: Vec<u8>,
    buffer: String,
    timeout: Duration,
    flush_deadline: Option<Instant>,
}

impl Default for KeyDecoder {
    fn default() -> Self {
        Self::new(DEFAULT_ESCAPE_TIMEOUT)
    }
}

impl KeyDecoder {
    pub fn new(timeout: Duration) -> Self {
        Self {
            partial: Vec::new(),
            buffer: String::new(),
            timeout,
            flush_deadline: None,
        }
    }

    pub fn process(&mut self, data: &[u8]) -> Vec<KeyEvent> {
        self.flush_deadline = None;
        self.partial.extend_from_slice(data);
        let text = take_valid_utf8(&mut self.partial);
        self.buffer.push_str(&text);

        let (sequences, remainder) = extract_complete_sequences(&self.buffer);
        self.buffer = remainder;
        if !self.buffer.is_empty() {
            self.flush_deadline = Some(Instant::now() + self.timeout);
        }
        sequences.iter().filter_map(|seq| decode_sequence(seq)).collect()
    }

    /// Gives up on an incomplete sequence once its deadline has passed.
    pub fn flush_due(&mut self, now: Instant) -> Vec<KeyEvent> {
        match self.flush_deadline {
            Some(deadline) if now >= deadline => self.flush(),
            _ => Vec::new(),
        }
    }

    pub fn flush(&mut self) -> Vec<KeyEvent> {
        self.flush_deadline = None;
        let pending = std::mem::take(&mut self.buffer);
        if pending.is_empty() {
            return Vec::new();
        }
        // A bare Escape is the only incomplete sequence that means anything.
        decode_sequence(&pending).into_iter().collect()
    }

    /// Time until the pending deadline, capped at `default`.
    pub fn next_timeout(&self, now: Instant, default: Duration) -> Duration {
        match self.flush_deadline {
            Some(deadline) => deadline.saturating_duration_since(now).min(default),
            None => default,
        }
    }

    pub fn pending(&self) -> &str {
        &self.buffer
    }
}

/// Drains the valid UTF-8 prefix of `bytes`. An incomplete trailing
/// character is kept; invalid bytes are dropped.
fn take_valid_utf8(bytes: &mut Vec<u8>) -> String {
    let mut out = String::new();
    let mut rest: &[u8] = bytes;
    loop {
        match std::str::from_utf8(rest) {
            Ok(valid) => {
                out.push_str(valid);
                rest = &[];
                break;
            }
            Err(err) => {
                let (valid, after) = rest.split_at(err.valid_up_to());
                out.push_str(std::str::from_utf8(valid).unwrap_or_default());
                match err.error_len() {
                    Some(len) => rest = &after[len..],
                    None => {
                        rest = after;
                        break;
                    }
                }
            }
        }
    }
    *bytes = rest.to_vec();
    out
}

fn extract_complete_sequences(buffer: &str) -> (Vec<String>, String) {
    let mut sequences = Vec::new();
    let mut pos = 0;

    while let Some(ch) = buffer[pos..].chars().next() {
        if ch != ESC {
            sequences.push(ch.to_string());
            pos += ch.len_utf8();
            continue;
        }
        let mut end = pos + 1;
        loop {
            if end > buffer.len() {
                return (sequences, buffer[pos..].to_string());
            }
            if !buffer.is_char_boundary(end) {
                end += 1;
                continue;
            }
            match is_complete_sequence(&buffer[pos..end]) {
                SequenceStatus::Complete | SequenceStatus::NotEscape => {
                    sequences.push(buffer[pos..end].to_string());
                    pos = end;
                    break;
                }
                SequenceStatus::Incomplete => end += 1,
            }
        }
    }

    (sequences, String::new())
}

fn is_complete_sequence(data: &str) -> SequenceStatus {
    if !data.starts_with(ESC) {
        return SequenceStatus::NotEscape;
    }
    let after = &data[1..];
    if after.is_empty() {
        return SequenceStatus::Incomplete;
    }
    if let Some(payload) = after.strip_prefix('[') {
        return match payload.as_bytes().last() {
            Some(last) if (0x40..=0x7e).contains(last) => SequenceStatus::Complete,
            _ => SequenceStatus::Incomplete,
        };
    }
    if after.starts_with([']', 'P', '_']) {
        // OSC, DCS and APC replies (kitty graphics acknowledgements among
        // them) run until ST or BEL.
        return if data.len() > 2 && (data.ends_with("\x1b\\") || data.ends_with('\x07')) {
            SequenceStatus::Complete
        } else {
            SequenceStatus::Incomplete
        };
    }
    if after.starts_with('O') {
        return if after.len() >= 2 {
            SequenceStatus::Complete
        } else {
            SequenceStatus::Incomplete
        };
    }
    SequenceStatus::Complete
}

fn named(code: u32, sym: Keysym, modifiers: u8) -> Option<KeyEvent> {
    Some(KeyEvent::named(code, sym, modifiers))
}

/// Ctrl on the US-layout key that types `letter`.
fn ctrl_letter(letter: char, extra: u8) -> Option<KeyEvent> {
    let code = us_layout_keycode(letter)?;
    let mut event = KeyEvent::ctrl(code);
    event.modifiers |= extra;
    Some(event)
}

fn character(ch: char, modifiers: u8) -> KeyEvent {
    let mut event = KeyEvent::character(ch);
    event.modifiers |= modifiers;
    event
}

/// Decodes one complete sequence. Unknown sequences and terminal replies
/// decode to `None`.
pub fn decode_sequence(seq: &str) -> Option<KeyEvent> {
    let mut chars = seq.chars();
    let first = chars.next()?;
    let rest = chars.as_str();

    if first != ESC {
        return if rest.is_empty() { decode_plain(first, 0) } else { None };
    }
    if rest.is_empty() {
        return named(evdev::KEY_ESC, Keysym::ESCAPE, 0);
    }
    if let Some(csi) = rest.strip_prefix('[') {
        return decode_csi(csi);
    }
    if let Some(ss3) = rest.strip_prefix('O') {
        return decode_final(ss3.chars().next()?, 0);
    }
    let mut alt = rest.chars();
    match (alt.next(), alt.next()) {
        (Some(ch), None) => decode_plain(ch, MOD_ALT),
        _ => None,
    }
}

fn decode_plain(ch: char, modifiers: u8) -> Option<KeyEvent> {
    match ch {
        // Raw mode leaves Return as CR; LF only arrives from Ctrl+J.
        '\r' => named(evdev::KEY_ENTER, Keysym::RETURN, modifiers),
        '\t' => named(evdev::KEY_TAB, Keysym::TAB, modifiers),
        '\x7f' | '\x08' => named(evdev::KEY_BACKSPACE, Keysym::BACKSPACE, modifiers),
        '\x1b' => named(evdev::KEY_ESC, Keysym::ESCAPE, modifiers),
        '\x01'..='\x1a' => ctrl_letter(char::from(ch as u8 + 0x60), modifiers),
        '\0'..='\x1f' => None,
        _ => Some(character(ch, modifiers)),
    }
}

fn decode_final(final_char: char, modifiers: u8) -> Option<KeyEvent> {
    match final_char {
        'A' => named(evdev::KEY_UP, Keysym::UP, modifiers),
        'B' => named(evdev::KEY_DOWN, Keysym::DOWN, modifiers),
        'C' => named(evdev::KEY_RIGHT, Keysym::RIGHT, modifiers),
        'D' => named(evdev::KEY_LEFT, Keysym::LEFT, modifiers),
        'H' => named(evdev::KEY_HOME, Keysym::HOME, modifiers),
        'M' => named(evdev::KEY_KPENTER, Keysym::KP_ENTER, modifiers),
        'Z' => named(evdev::KEY_TAB, Keysym::ISO_LEFT_TAB, modifiers | MOD_SHIFT),
        _ => None,
    }
}

/// xterm encodes modifiers as `1 + mask` with shift, alt and ctrl in the
/// same bit positions as ours.
fn modifier_param(param: Option<&str>) -> u8 {
    param
        .and_then(|p| p.split(':').next())
        .and_then(|p| p.parse::<u32>().ok())
        .map_or(0, |value| (value.saturating_sub(1) & 0x07) as u8)
}

fn decode_csi(body: &str) -> Option<KeyEvent> {
    let final_char = body.chars().last()?;
    let params = &body[..body.len() - final_char.len_utf8()];
    if params.starts_with(['<', '?', '>']) {
        return None;
    }
    let mut fields = params.split(';');
    let first = fields.next().filter(|p| !p.is_empty());
    let modifiers = modifier_param(fields.next());

    match final_char {
        '~' => match first? {
            "1" | "7" => named(evdev::KEY_HOME, Keysym::HOME, modifiers),
            _ => None,
        },
        'u' => decode_csi_u(first?, modifiers),
        _ => decode_final(final_char, modifiers),
    }
}

/// `CSI codepoint ; modifiers u` from terminals with the fixterms/kitty
/// keyboard encoding.
fn decode_csi_u(codepoint: &str, modifiers: u8) -> Option<KeyEvent> {
    let code = codepoint.split(':').next()?.parse::<u32>().ok()?;
    let ch = char::from_u32(code)?;
    match ch {
        '\r' => named(evdev::KEY_ENTER, Keysym::RETURN, modifiers),
        '\t' if modifiers & MOD_SHIFT != 0 => named(evdev::KEY_TAB, Keysym::ISO_LEFT_TAB, modifiers),
        '\t' => named(evdev::KEY_TAB, Keysym::TAB, modifiers),
        '\x1b' => named(evdev::KEY_ESC, Keysym::ESCAPE, modifiers),
        '\x7f' => named(evdev::KEY_BACKSPACE, Keysym::BACKSPACE, modifiers),
        _ if modifiers & MOD_CTRL != 0 => ctrl_letter(ch, modifiers & !MOD_CTRL),
        _ if ch.is_control() => None,
        _ => Some(character(ch, modifiers)),
    }
}
