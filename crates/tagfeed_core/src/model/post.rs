//! Ingested post model.
//!
//! # Responsibility
//! - Define the stored post read model and its write-side counterpart.
//! - Reject write models that would break the dedup key.
//!
//! # Invariants
//! - `external_id` is the origin platform's id and the global dedup key.
//! - `created_at` is the origin platform's timestamp in epoch milliseconds.
//! - `id` grows with insertion order and breaks ties between equal
//!   `created_at` values.

use crate::model::tag_group::TagGroupId;
use crate::model::user::{User, UserId};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Local row id of a post; monotonically increasing with insertion.
pub type PostId = i64;

/// Stored post joined with its author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub external_id: String,
    pub text: String,
    pub author: User,
    pub tag_group_id: TagGroupId,
    pub created_at: i64,
}

/// Write model for a post about to be persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPost {
    pub external_id: String,
    pub text: String,
    pub user_id: UserId,
    pub tag_group_id: TagGroupId,
    pub created_at: i64,
}

/// Validation failures for [`NewPost`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostValidationError {
    /// Without an external id there is nothing to dedup on.
    BlankExternalId,
}

impl Display for PostValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankExternalId => write!(f, "post external id cannot be blank"),
        }
    }
}

impl Error for PostValidationError {}

impl NewPost {
    pub fn validate(&self) -> Result<(), PostValidationError> {
        if self.external_id.trim().is_empty() {
            return Err(PostValidationError::BlankExternalId);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{NewPost, PostValidationError};

    #[test]
    fn validate_rejects_blank_external_id() {
        let post = NewPost {
            external_id: "  ".to_string(),
            text: "hello".to_string(),
            user_id: 1,
            tag_group_id: 1,
            created_at: 0,
        };
        assert_eq!(
            post.validate().unwrap_err(),
            PostValidationError::BlankExternalId
        );
    }
}
