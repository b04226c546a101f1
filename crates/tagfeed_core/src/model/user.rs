//! Local record for an external post author.

use serde::{Deserialize, Serialize};

/// Local row id of a user.
pub type UserId = i64;

/// Author as known locally. Created on first sight, never deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    /// Origin platform handle, e.g. `@lucasas`. Unique.
    pub external_id: String,
    /// Avatar reference captured when the author was first seen.
    pub image_url: Option<String>,
}
