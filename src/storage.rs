//! Date-based placement and naming of uploaded files, and mapping of
//! request paths back into the file root.
//! Used by: handlers::upload, handlers::browse.

use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;

use crate::error::{Error, Result};

/// Where an upload lands: `{root}/YYYY/MM/DD/{stem}#HHMMSS{.ext}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTarget {
    dir: PathBuf,
    path: PathBuf,
    public_path: String,
}

impl UploadTarget {
    pub fn new(root: &Path, client_name: &str, now: NaiveDateTime) -> Result<Self> {
        let name = base_name(client_name)
            .ok_or_else(|| Error::Validation(format!("invalid file name: {client_name:?}")))?;
        let day = now.format("%Y/%m/%d").to_string();
        let stamped = stamp(name, &now.format("#%H%M%S").to_string());

        let dir = day.split('/').fold(root.to_path_buf(), |dir, part| dir.join(part));
        let path = dir.join(&stamped);
        Ok(Self {
            dir,
            path,
            public_path: format!("/{day}/{stamped}"),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Location relative to the file root, as served by the file browser.
    pub fn public_path(&self) -> &str {
        &self.public_path
    }
}

/// Maps a request path such as `/2026/10/19/` to a path relative to the file
/// root. Components are percent-decoded; anything that could leave the root
/// (`..`, embedded separators, NUL) rejects the whole path.
pub fn resolve_request_path(path: &str) -> Option<PathBuf> {
    let mut relative = PathBuf::new();
    for component in path.split('/').filter(|c| !c.is_empty()) {
        let decoded = percent_decode(component)?;
        if decoded.contains('\0') || base_name(&decoded) != Some(decoded.as_str()) {
            return None;
        }
        relative.push(decoded);
    }
    Some(relative)
}

/// Percent-encodes a single path component for use in an href.
pub fn encode_component(component: &str) -> String {
    let mut encoded = String::with_capacity(component.len());
    for byte in component.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'.' | b'_' | b'~') {
            encoded.push(char::from(byte));
        } else {
            encoded.push_str(&format!("%{byte:02X}"));
        }
    }
    encoded
}

fn percent_decode(component: &str) -> Option<String> {
    let bytes = component.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = bytes.get(i + 1..i + 3)?;
            if !hex.iter().all(u8::is_ascii_hexdigit) {
                return None;
            }
            let hex = std::str::from_utf8(hex).ok()?;
            decoded.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            decoded.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(decoded).ok()
}

/// Last path component of a client-supplied name; rejects empty and dot names.
fn base_name(name: &str) -> Option<&str> {
    let base = name.rsplit(|c| c == '/' || c == '\\').next()?;
    match base {
        "" | "." | ".." => None,
        _ => Some(base),
    }
}

/// Inserts `suffix` before the last extension, or appends it.
fn stamp(name: &str, suffix: &str) -> String {
    match name.rfind('.') {
        Some(i) => format!("{}{}{}", &name[..i], suffix, &name[i..]),
        None => format!("{name}{suffix}"),
    }
}
