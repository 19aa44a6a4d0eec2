//! Git Status Parsing
//!
//! Turns the textual output of `diff-index --name-status`,
//! `update-index --refresh` and the `--name-only` family into structured
//! values. Output order is preserved; nothing is sorted or deduplicated.

use std::fmt;

use regex::Regex;

use crate::errors::{GitError, PoolError, Result};

/// `STATUS[score]<TAB>path[<TAB>path]`
const NAME_STATUS_PATTERN: &str = r"^([A-Z])(\d*)\t([^\t]+)(?:\t([^\t]+))?$";

/// Marker printed by `update-index --refresh` for stale entries.
pub const NEEDS_UPDATE_MARKER: &str = "needs update";

/// One-letter change status, following git's `--name-status` convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeStatus {
    Added,
    Copied,
    Deleted,
    Modified,
    Renamed,
    TypeChanged,
    Unmerged,
    Unknown,
    Broken,
}

impl ChangeStatus {
    #[must_use]
    pub fn from_code(code: char) -> Option<Self> {
        match code {
            'A' => Some(Self::Added),
            'C' => Some(Self::Copied),
            'D' => Some(Self::Deleted),
            'M' => Some(Self::Modified),
            'R' => Some(Self::Renamed),
            'T' => Some(Self::TypeChanged),
            'U' => Some(Self::Unmerged),
            'X' => Some(Self::Unknown),
            'B' => Some(Self::Broken),
            _ => None,
        }
    }

    #[must_use]
    pub fn code(self) -> char {
        match self {
            Self::Added => 'A',
            Self::Copied => 'C',
            Self::Deleted => 'D',
            Self::Modified => 'M',
            Self::Renamed => 'R',
            Self::TypeChanged => 'T',
            Self::Unmerged => 'U',
            Self::Unknown => 'X',
            Self::Broken => 'B',
        }
    }
}

impl fmt::Display for ChangeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A changed path and how it changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    pub status: ChangeStatus,
    pub path: String,
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{}", self.status, self.path)
    }
}

/// Parses `--name-status` output.
///
/// Renames and copies carry two paths; the destination is kept.
///
/// # Errors
/// * If a line does not start with a known status letter followed by a tab
pub fn parse_name_status(output: &str) -> Result<Vec<Change>> {
    let regex_rule =
        Regex::new(NAME_STATUS_PATTERN).map_err(|e| PoolError::InvalidInput(e.to_string()))?;

    output
        .lines()
        .filter(|line| !line.is_empty())
        .map(|line| -> Result<Change> {
            let invalid = || GitError::InvalidStatus {
                output: line.to_string(),
            };

            let captures = regex_rule.captures(line).ok_or_else(invalid)?;
            let status = captures[1]
                .chars()
                .next()
                .and_then(ChangeStatus::from_code)
                .ok_or_else(invalid)?;
            let path = captures
                .get(4)
                .or_else(|| captures.get(3))
                .ok_or_else(invalid)?;

            Ok(Change {
                status,
                path: path.as_str().to_string(),
            })
        })
        .collect()
}

/// Paths reported as `path: needs update`. The path is everything before
/// the last `:`.
#[must_use]
pub fn parse_needs_update(output: &str) -> Vec<String> {
    output
        .lines()
        .filter(|line| line.ends_with(NEEDS_UPDATE_MARKER))
        .filter_map(|line| line.rsplit_once(':').map(|(path, _)| path.to_string()))
        .collect()
}

/// Non-empty lines, in order.
#[must_use]
pub fn parse_path_list(output: &str) -> Vec<String> {
    output
        .lines()
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Second whitespace-delimited token of the first line, as printed by
/// `show-ref` and `name-rev` (`<id> <name>`).
///
/// # Errors
/// * If the first line has fewer than two tokens
pub fn second_token(output: &str) -> Result<String> {
    output
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .map(str::to_string)
        .ok_or_else(|| {
            GitError::InvalidStatus {
                output: output.to_string(),
            }
            .into()
        })
}
