//! Installed application entries (`--drun`).
//!
//! Scans `applications/` below the XDG data directories and turns each
//! visible `Type=Application` desktop entry into a candidate whose payload is
//! the `Exec` line with field codes removed.

use std::collections::HashSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::core::candidate::{Candidate, CandidateList};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesktopEntry {
    pub name: String,
    pub exec: String,
}

/// Directories searched for `.desktop` files, highest precedence first.
pub fn application_dirs() -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    match env::var("XDG_DATA_HOME") {
        Ok(home) if !home.is_empty() => dirs.push(PathBuf::from(home)),
        _ => {
            if let Ok(home) = env::var("HOME") {
                dirs.push(Path::new(&home).join(".local/share"));
            }
        }
    }
    let data_dirs = env::var("XDG_DATA_DIRS")
        .ok()
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| "/usr/local/share:/usr/share".to_string());
    dirs.extend(
        data_dirs
            .split(':')
            .filter(|dir| !dir.is_empty())
            .map(PathBuf::from),
    );
    dirs.into_iter().map(|dir| dir.join("applications")).collect()
}

/// Loads every visible application below `dirs`. A desktop-file id found in
/// an earlier directory shadows the same id further down the list.
pub fn load_applications(dirs: &[PathBuf]) -> CandidateList {
    let mut seen_ids = HashSet::new();
    let mut entries = Vec::new();

    for dir in dirs {
        let mut files = Vec::new();
        collect_desktop_files(dir, dir, &mut files);
        files.sort();
        for (id, path) in files {
            if !seen_ids.insert(id) {
                continue;
            }
            let Ok(contents) = fs::read_to_string(&path) else {
                debug!(path = %path.display(), "skipping unreadable desktop file");
                continue;
            };
            if let Some(entry) = parse_desktop_entry(&contents) {
                entries.push(entry);
            }
        }
    }

    entries.sort_by(|a, b| {
        a.name
            .to_lowercase()
            .cmp(&b.name.to_lowercase())
            .then_with(|| a.name.cmp(&b.name))
    });
    entries.dedup_by(|a, b| a.name == b.name);
    debug!(count = entries.len(), "loaded application entries");

    CandidateList::new(
        entries
            .into_iter()
            .map(|entry| Candidate::with_payload(entry.name, entry.exec))
            .collect(),
    )
}

fn collect_desktop_files(root: &Path, dir: &Path, out: &mut Vec<(String, PathBuf)>) {
    let Ok(read_dir) = fs::read_dir(dir) else {
        return;
    };
    for entry in read_dir.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_desktop_files(root, &path, out);
        } else if path.extension().is_some_and(|ext| ext == "desktop") {
            // Desktop-file ids replace path separators below the root with '-'.
            let id = path
                .strip_prefix(root)
                .unwrap_or(&path)
                .to_string_lossy()
                .replace('/', "-");
            out.push((id, path));
        }
    }
}

/// Parses the `[Desktop Entry]` group. Returns `None` for entries that are
/// hidden, not applications, or missing `Name`/`Exec`.
pub fn parse_desktop_entry(contents: &str) -> Option<DesktopEntry> {
    let mut in_group = false;
    let mut name = None;
    let mut exec = None;
    let mut kind = None;
    let mut hidden = false;

    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if line.starts_with('[') {
            in_group = line == "[Desktop Entry]";
            continue;
        }
        if !in_group {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let value = value.trim();
        match key.trim() {
            "Name" => name = Some(value.to_string()),
            "Exec" => exec = Some(value.to_string()),
            "Type" => kind = Some(value.to_string()),
            "NoDisplay" | "Hidden" => hidden |= value.eq_ignore_ascii_case("true"),
            _ => {}
        }
    }

    if hidden || kind.as_deref() != Some("Application") {
        return None;
    }
    let name = name.filter(|name| !name.is_empty())?;
    let exec = strip_field_codes(&exec?);
    if exec.is_empty() {
        return None;
    }
    Some(DesktopEntry { name, exec })
}

/// Removes `%f`-style field codes and unescapes `%%`.
pub fn strip_field_codes(exec: &str) -> String {
    let mut out = String::with_capacity(exec.len());
    let mut chars = exec.chars();
    while let Some(ch) = chars.next() {
        if ch != '%' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('%') => out.push('%'),
            Some('f' | 'F' | 'u' | 'U' | 'd' | 'D' | 'n' | 'N' | 'i' | 'c' | 'k' | 'v' | 'm') => {}
            Some(other) => {
                out.push('%');
                out.push(other);
            }
            None => out.push('%'),
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}
