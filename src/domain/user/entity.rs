//! User entity and related types

use std::str::FromStr;

use chrono::{DateTime, Duration, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use super::validation::UserDraft;

/// Engine-assigned user identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(u64);

impl UserId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl FromStr for UserId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u64>().map(Self)
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Current time truncated to milliseconds.
///
/// Milliseconds are the finest precision every backend stores (BSON dates being
/// the coarsest), so a record read back from any engine compares equal to the
/// one that was written.
pub fn timestamp_now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// A persisted user record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    id: UserId,
    name: String,
    email: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl User {
    /// Build a freshly created record; `created_at` and `updated_at` are identical
    pub fn create(id: UserId, draft: UserDraft, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: draft.name,
            email: draft.email,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    /// Rebuild a record loaded from a backend
    pub fn restore(
        id: UserId,
        name: impl Into<String>,
        email: impl Into<String>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
        deleted_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            email: email.into(),
            created_at,
            updated_at,
            deleted_at,
        }
    }

    pub fn id(&self) -> UserId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }

    /// Apply a draft to this record, keeping `id` and `created_at`.
    ///
    /// `updated_at` always moves strictly forward, even when the clock has not
    /// advanced past the previous value.
    pub fn revise(mut self, draft: UserDraft) -> Self {
        self.name = draft.name;
        self.email = draft.email;
        self.touch();
        self
    }

    fn touch(&mut self) {
        let now = timestamp_now();

        self.updated_at = if now > self.updated_at {
            now
        } else {
            self.updated_at + Duration::milliseconds(1)
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(name: &str, email: &str) -> UserDraft {
        UserDraft {
            name: name.to_string(),
            email: email.to_string(),
        }
    }

    #[test]
    fn test_user_id_parse() {
        assert_eq!("42".parse::<UserId>().unwrap(), UserId::new(42));
        assert!("abc".parse::<UserId>().is_err());
        assert!("-1".parse::<UserId>().is_err());
        assert!("".parse::<UserId>().is_err());
    }

    #[test]
    fn test_create_sets_equal_timestamps() {
        let now = timestamp_now();
        let user = User::create(UserId::new(1), draft("Alice", "alice@example.com"), now);

        assert_eq!(user.id(), UserId::new(1));
        assert_eq!(user.name(), "Alice");
        assert_eq!(user.created_at(), user.updated_at());
        assert!(user.deleted_at().is_none());
    }

    #[test]
    fn test_revise_preserves_identity() {
        let now = timestamp_now();
        let user = User::create(UserId::new(7), draft("Alice", "alice@example.com"), now);

        let revised = user.clone().revise(draft("Alicia", "alicia@example.com"));

        assert_eq!(revised.id(), user.id());
        assert_eq!(revised.created_at(), user.created_at());
        assert_eq!(revised.name(), "Alicia");
        assert_eq!(revised.email(), "alicia@example.com");
        assert!(revised.updated_at() > user.updated_at());
    }

    #[test]
    fn test_revise_moves_forward_from_future_timestamp() {
        let future = timestamp_now() + Duration::hours(1);
        let user = User::create(UserId::new(1), draft("Bob", "bob@example.com"), future);

        let revised = user.revise(draft("Bobby", "bob@example.com"));

        assert_eq!(revised.updated_at(), future + Duration::milliseconds(1));
    }

    #[test]
    fn test_timestamp_precision() {
        let now = timestamp_now();
        assert_eq!(now.timestamp_subsec_nanos() % 1_000_000, 0);
    }

    #[test]
    fn test_serialization_field_names() {
        let user = User::create(UserId::new(3), draft("Carol", "carol@example.com"), timestamp_now());
        let json = serde_json::to_value(&user).unwrap();

        assert_eq!(json["id"], 3);
        assert_eq!(json["name"], "Carol");
        assert!(json.get("created_at").is_some());
        assert!(json.get("updated_at").is_some());
        assert!(json["deleted_at"].is_null());
    }
}
