#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;

pub fn read_fixture(name: &str) -> String {
    let path: PathBuf = [env!("CARGO_MANIFEST_DIR"), "tests", "fixtures", name].iter().collect();
    fs::read_to_string(&path).unwrap_or_else(|err| panic!("failed to read fixture {name}: {err}"))
}

/// One tab-separated fixture row with its 1-based line number.
pub struct Row {
    pub line: usize,
    pub fields: Vec<String>,
}

/// Rows of a tab-separated fixture. Blank lines and `#` comments are
/// skipped; fields are returned as written, without unescaping.
pub fn read_rows(name: &str) -> Vec<Row> {
    read_fixture(name)
        .lines()
        .enumerate()
        .map(|(idx, line)| (idx + 1, line.trim_end_matches('\r')))
        .filter(|(_, line)| !line.trim().is_empty() && !line.starts_with('#'))
        .map(|(line, text)| Row {
            line,
            fields: text.split('\t').map(str::to_string).collect(),
        })
        .collect()
}

/// Expands `\e`, `\n`, `\r`, `\t`, `\\` and `\xNN` (ASCII only). Anything
/// else after a backslash is kept literally.
pub fn unescape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars();

    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('e') => out.push('\x1b'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('\\') => out.push('\\'),
            Some('x') => {
                let digits: String = chars.by_ref().take(2).collect();
                match u8::from_str_radix(&digits, 16) {
                    Ok(byte) if byte.is_ascii() && digits.len() == 2 => out.push(char::from(byte)),
                    _ => {
                        out.push_str("\\x");
                        out.push_str(&digits);
                    }
                }
            }
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }

    out
}
