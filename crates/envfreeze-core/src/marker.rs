//! Generated-file marker
//!
//! Files written by envfreeze start with a comment line containing
//! [`MARKER`]. A file without it on its first line is treated as hand
//! edited and is never overwritten.

use std::fs::File;
use std::io::{BufRead, BufReader, ErrorKind};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{FreezeError, FreezeResult};

/// Literal looked for on the first line of an existing file
pub const MARKER: &str = "GENERATED";

const STAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

/// Who owns a file on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Ownership {
    /// File does not exist yet
    Absent,
    /// First line carries the marker
    Generated,
    /// Existing file without the marker
    HandEdited,
}

impl Ownership {
    /// Whether envfreeze may write this file
    #[inline]
    #[must_use]
    pub fn may_overwrite(self) -> bool {
        !matches!(self, Self::HandEdited)
    }
}

/// Classify the file at `path` by its first line.
///
/// # Errors
/// Returns an IO error if the file exists but cannot be read.
pub fn inspect(path: &Path) -> FreezeResult<Ownership> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Ownership::Absent),
        Err(err) => return Err(FreezeError::io_error(path, err)),
    };

    let mut first = Vec::new();
    BufReader::new(file)
        .read_until(b'\n', &mut first)
        .map_err(|e| FreezeError::io_error(path, e))?;

    Ok(classify_first_line(&String::from_utf8_lossy(&first)))
}

/// Classify an existing file from its first line.
#[must_use]
pub fn classify_first_line(line: &str) -> Ownership {
    if line.contains(MARKER) {
        Ownership::Generated
    } else {
        Ownership::HandEdited
    }
}

/// What kind of output the header stamps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StampKind {
    /// Regenerated manifest
    Generated,
    /// Frozen lock file
    Frozen,
}

impl StampKind {
    fn label(self) -> &'static str {
        match self {
            Self::Generated => "Generated",
            Self::Frozen => "Frozen",
        }
    }
}

/// Two-line comment header written at the top of every output file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedHeader {
    source: String,
    kind: StampKind,
    at: DateTime<Utc>,
}

impl GeneratedHeader {
    /// Header for a file derived from `source`
    #[must_use]
    pub fn new(source: impl Into<String>, kind: StampKind, at: DateTime<Utc>) -> Self {
        Self {
            source: source.into(),
            kind,
            at,
        }
    }

    /// Render the header, including the trailing newline
    #[must_use]
    pub fn render(&self) -> String {
        format!(
            "# AUTO {MARKER} FROM {}, DO NOT MANUALLY MODIFY\n# {} on {}\n",
            self.source,
            self.kind.label(),
            self.at.format(STAMP_FORMAT),
        )
    }
}
