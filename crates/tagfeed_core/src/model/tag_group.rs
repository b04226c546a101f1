//! Tag group model.
//!
//! # Invariants
//! - Group names are trimmed and non-blank.
//! - Terms inside one group are trimmed, non-blank and unique; `position`
//!   keeps the order they were configured in.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Local row id of a tag group.
pub type TagGroupId = i64;

/// Local row id of a tag.
pub type TagId = i64;

/// One search term of a tag group, e.g. `#rust`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: TagId,
    pub term: String,
    /// Zero-based order inside the owning group.
    pub position: u32,
}

/// Named set of search terms whose matching posts are aggregated together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagGroup {
    pub id: TagGroupId,
    pub name: String,
    /// Ordered by `position`.
    pub tags: Vec<Tag>,
}

impl TagGroup {
    /// Returns the group's terms in configured order.
    pub fn terms(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(|tag| tag.term.as_str())
    }

    pub fn has_tags(&self) -> bool {
        !self.tags.is_empty()
    }
}

/// Validation failures for tag group definitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagGroupValidationError {
    BlankName,
    BlankTerm { position: usize },
}

impl Display for TagGroupValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankName => write!(f, "tag group name cannot be blank"),
            Self::BlankTerm { position } => {
                write!(f, "tag term at position {position} cannot be blank")
            }
        }
    }
}

impl Error for TagGroupValidationError {}

/// Trims a group name, rejecting blank values.
pub fn normalize_group_name(name: &str) -> Result<String, TagGroupValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(TagGroupValidationError::BlankName);
    }
    Ok(trimmed.to_string())
}

/// Trims terms and drops repeats, keeping the first occurrence's position.
/// Case is kept; matching is left to the search API.
pub fn normalize_terms(terms: &[String]) -> Result<Vec<String>, TagGroupValidationError> {
    let mut seen = HashSet::new();
    let mut normalized = Vec::with_capacity(terms.len());
    for (position, term) in terms.iter().enumerate() {
        let trimmed = term.trim();
        if trimmed.is_empty() {
            return Err(TagGroupValidationError::BlankTerm { position });
        }
        if seen.insert(trimmed.to_string()) {
            normalized.push(trimmed.to_string());
        }
    }
    Ok(normalized)
}
