//! Environment manifest loading and python pin rewriting
//!
//! The manifest is parsed with `serde_yaml` to find the python entry, but
//! the rewrite is applied to the original text so comments and ordering
//! survive. When the entry cannot be matched to a block-sequence line the
//! document is re-serialized from the parsed value instead.

use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use serde_yaml::Value;

use crate::error::{FreezeError, FreezeResult};

/// Top-level key holding the dependency list
pub const DEPENDENCIES_KEY: &str = "dependencies";

static DEPENDENCIES_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^dependencies\s*:\s*(?:#.*)?$").expect("static regex")
});

static ITEM_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<indent>[ \t]*)-(?P<gap>[ \t]+)(?P<value>.*?)(?P<comment>[ \t]+#.*)?$")
        .expect("static regex")
});

/// Whether a conda match spec names the python package itself.
///
/// Compares everything before the first `=`, so `python=3.8` and
/// `python==3.8.1` match while `python-dateutil` and `python>=3` do not.
#[must_use]
pub fn is_python_entry(dep: &str) -> bool {
    dep.split('=').next() == Some("python")
}

/// Match spec pinning python to a minor series
#[must_use]
pub fn python_pin(py: &str) -> String {
    format!("python={py}.*")
}

/// A parsed environment manifest together with its source text
#[derive(Debug, Clone)]
pub struct Manifest {
    path: PathBuf,
    text: String,
    doc: Value,
}

impl Manifest {
    /// Read and parse the manifest at `path`
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or is not valid YAML.
    pub fn load(path: &Path) -> FreezeResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| FreezeError::io_error(path, e))?;
        Self::parse(path, text)
    }

    /// Parse manifest text; `path` is used for error messages
    ///
    /// # Errors
    /// Returns an error if `text` is not valid YAML.
    pub fn parse(path: impl Into<PathBuf>, text: impl Into<String>) -> FreezeResult<Self> {
        let path = path.into();
        let text = text.into();
        let doc = serde_yaml::from_str(&text).map_err(|e| FreezeError::yaml_error(&path, e))?;
        Ok(Self { path, text, doc })
    }

    /// Source path
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Original text
    #[inline]
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The `dependencies` sequence
    ///
    /// # Errors
    /// Returns [`FreezeError::MissingKey`] if the key is absent or not a sequence.
    pub fn dependencies(&self) -> FreezeResult<&[Value]> {
        self.doc
            .get(DEPENDENCIES_KEY)
            .and_then(Value::as_sequence)
            .map(Vec::as_slice)
            .ok_or_else(|| FreezeError::missing_key(&self.path, DEPENDENCIES_KEY, "sequence"))
    }

    /// Render the manifest with the python entry replaced by `python={py}.*`
    ///
    /// # Errors
    /// Returns [`FreezeError::PythonPinMissing`] if no dependency names python.
    pub fn pin_python(&self, py: &str) -> FreezeResult<String> {
        let deps = self.dependencies()?;
        let Some((index, current)) = deps
            .iter()
            .enumerate()
            .find_map(|(i, d)| d.as_str().filter(|s| is_python_entry(s)).map(|s| (i, s)))
        else {
            return Err(FreezeError::PythonPinMissing {
                path: self.path.clone(),
                dependencies: deps.iter().map(describe).collect(),
            });
        };

        let pin = python_pin(py);
        if let Some(text) = rewrite_item_line(&self.text, index, current, &pin) {
            return Ok(text);
        }

        tracing::debug!(
            path = %self.path.display(),
            "python entry not on a block sequence line, re-serializing"
        );
        let mut doc = self.doc.clone();
        if let Some(slot) = doc
            .get_mut(DEPENDENCIES_KEY)
            .and_then(Value::as_sequence_mut)
            .and_then(|seq| seq.get_mut(index))
        {
            *slot = Value::String(pin);
        }
        serde_yaml::to_string(&doc).map_err(|e| FreezeError::yaml_error(&self.path, e))
    }
}

fn describe(dep: &Value) -> String {
    match dep {
        Value::String(s) => s.clone(),
        other => serde_json::to_string(other).unwrap_or_else(|_| "<unprintable>".to_string()),
    }
}

/// Replace the `index`-th item of the top-level `dependencies` block
/// sequence, provided its scalar equals `expected`.
fn rewrite_item_line(text: &str, index: usize, expected: &str, replacement: &str) -> Option<String> {
    let lines: Vec<&str> = text.split_inclusive('\n').collect();
    let start = lines
        .iter()
        .position(|raw| DEPENDENCIES_LINE.is_match(strip_eol(raw)))?;

    let mut item_indent = None;
    let mut seen = 0;
    for (i, raw) in lines.iter().enumerate().skip(start + 1) {
        let line = strip_eol(raw);
        let trimmed = line.trim_start();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let Some(caps) = ITEM_LINE.captures(line) else {
            if trimmed.len() == line.len() {
                // next top-level key
                return None;
            }
            continue;
        };

        let indent = &caps["indent"];
        let base = *item_indent.get_or_insert(indent.len());
        if indent.len() < base {
            return None;
        }
        if indent.len() > base {
            continue;
        }

        if seen == index {
            let (quote, scalar) = unquote(&caps["value"]);
            if scalar != expected {
                return None;
            }
            let comment = caps.name("comment").map_or("", |m| m.as_str());
            let eol = &raw[line.len()..];

            let mut out = String::with_capacity(text.len() + replacement.len());
            out.extend(lines[..i].iter().copied());
            out.push_str(&format!(
                "{indent}-{gap}{quote}{replacement}{quote}{comment}{eol}",
                gap = &caps["gap"],
            ));
            out.extend(lines[i + 1..].iter().copied());
            return Some(out);
        }
        seen += 1;
    }
    None
}

fn strip_eol(raw: &str) -> &str {
    raw.trim_end_matches('\n').trim_end_matches('\r')
}

fn unquote(value: &str) -> (&'static str, &str) {
    for quote in ["\"", "'"] {
        if let Some(inner) = value
            .strip_prefix(quote)
            .and_then(|v| v.strip_suffix(quote))
        {
            return (quote, inner);
        }
    }
    ("", value)
}
