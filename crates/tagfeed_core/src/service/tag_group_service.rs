//! Tag group administration use-cases.
//!
//! # Responsibility
//! - Create, list, look up and delete tag groups by name.
//! - Translate repository failures into admin-facing errors.

use crate::model::tag_group::{TagGroup, TagGroupValidationError};
use crate::repo::tag_group_repo::TagGroupRepository;
use crate::repo::{RepoError, RepoResult};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for tag group administration.
#[derive(Debug)]
pub enum TagGroupServiceError {
    InvalidDefinition(TagGroupValidationError),
    DuplicateName(String),
    NotFound(String),
    Repo(RepoError),
}

impl Display for TagGroupServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidDefinition(err) => write!(f, "{err}"),
            Self::DuplicateName(name) => write!(f, "tag group already exists: `{name}`"),
            Self::NotFound(name) => write!(f, "tag group not found: `{name}`"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for TagGroupServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidDefinition(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for TagGroupServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::InvalidTagGroup(err) => Self::InvalidDefinition(err),
            RepoError::DuplicateTagGroup(name) => Self::DuplicateName(name),
            other => Self::Repo(other),
        }
    }
}

pub struct TagGroupService<R: TagGroupRepository> {
    repo: R,
}

impl<R: TagGroupRepository> TagGroupService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates a group; terms are trimmed and deduplicated in order.
    pub fn create_group(
        &self,
        name: &str,
        terms: &[String],
    ) -> Result<TagGroup, TagGroupServiceError> {
        Ok(self.repo.create_tag_group(name, terms)?)
    }

    pub fn list_groups(&self) -> RepoResult<Vec<TagGroup>> {
        self.repo.list_tag_groups()
    }

    pub fn find_group(&self, name: &str) -> RepoResult<Option<TagGroup>> {
        self.repo.find_tag_group_by_name(name)
    }

    /// Resolves a group by name or fails with `NotFound`.
    pub fn require_group(&self, name: &str) -> Result<TagGroup, TagGroupServiceError> {
        self.repo
            .find_tag_group_by_name(name)?
            .ok_or_else(|| TagGroupServiceError::NotFound(name.trim().to_string()))
    }

    /// Deletes a group with its tags and posts.
    pub fn remove_group(&self, name: &str) -> Result<(), TagGroupServiceError> {
        let group = self.require_group(name)?;
        self.repo.delete_tag_group(group.id)?;
        Ok(())
    }
}
