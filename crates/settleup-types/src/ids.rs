//! Identifiers used throughout SettleUp.
//!
//! Participant identifiers arrive from collaborators in several shapes
//! (bare strings, records carrying an `id`/`_id` field, strings wrapping a
//! 24-hex-digit object id). [`ParticipantRef`] models that raw shape and
//! [`ParticipantRef::normalize`] turns it into the one canonical
//! [`ParticipantId`] the engine works with. Normalization happens once, on
//! ingress; nothing downstream inspects raw references.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Result, SettleupError};

/// An embedded object id: 12 bytes, hex encoded.
static OBJECT_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("[a-fA-F0-9]{24}").expect("object id pattern is valid"));

// ---------------------------------------------------------------------------
// ParticipantId
// ---------------------------------------------------------------------------

/// Canonical participant identifier.
///
/// Ordering is lexical on the canonical string; the matcher relies on it as
/// the tie-break key, so two runs over the same balances always pair the same
/// participants.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ParticipantId(String);

impl ParticipantId {
    /// Parse a raw string into a canonical id.
    ///
    /// The string is trimmed. If it contains 24 consecutive hex digits
    /// (e.g. `ObjectId("64f1…")`), the first such 24, lowercased, become the
    /// id. A longer hex run is cut to its first 24 digits. Otherwise the
    /// trimmed string is used as-is.
    ///
    /// # Errors
    /// Returns [`SettleupError::InvalidParticipant`] for empty or
    /// whitespace-only input, or input containing control characters.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(SettleupError::invalid_participant("empty identifier"));
        }
        if trimmed.chars().any(char::is_control) {
            return Err(SettleupError::invalid_participant(format!(
                "identifier {trimmed:?} contains control characters"
            )));
        }
        if let Some(object_id) = OBJECT_ID.find(trimmed) {
            return Ok(Self(object_id.as_str().to_ascii_lowercase()));
        }
        Ok(Self(trimmed.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ParticipantId {
    type Error = SettleupError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<ParticipantId> for String {
    fn from(id: ParticipantId) -> Self {
        id.0
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Test helpers.
#[cfg(any(test, feature = "test-helpers"))]
impl ParticipantId {
    /// Build an id from a literal known to be valid.
    pub fn named(raw: &str) -> Self {
        Self::parse(raw).expect("test participant id must be valid")
    }
}

// ---------------------------------------------------------------------------
// ParticipantRef
// ---------------------------------------------------------------------------

/// A record embedding a participant identifier, as sent by collaborators
/// that pass whole user documents instead of bare ids.
///
/// Accepts `_id`, `id`, or both; `_id` wins when both are present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawParticipantRecord")]
pub struct ParticipantRecord {
    pub id: String,
    /// Display name, when the collaborator populated one. Not used for identity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Deserialize)]
struct RawParticipantRecord {
    #[serde(rename = "_id")]
    object_id: Option<String>,
    id: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

impl TryFrom<RawParticipantRecord> for ParticipantRecord {
    type Error = SettleupError;

    fn try_from(raw: RawParticipantRecord) -> Result<Self> {
        let id = raw
            .object_id
            .or(raw.id)
            .ok_or_else(|| SettleupError::invalid_participant("record has neither _id nor id"))?;
        Ok(Self { id, name: raw.name })
    }
}

/// Raw participant reference as received at the system boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParticipantRef {
    /// Bare identifier, possibly wrapping an embedded object id.
    Raw(String),
    /// Numeric identifier.
    Numeric(u64),
    /// Structured record carrying an `id` or `_id` field.
    Record(ParticipantRecord),
}

impl ParticipantRef {
    /// Normalize into the canonical [`ParticipantId`].
    ///
    /// # Errors
    /// Returns [`SettleupError::InvalidParticipant`] if no valid identifier
    /// can be extracted.
    pub fn normalize(&self) -> Result<ParticipantId> {
        match self {
            Self::Raw(raw) => ParticipantId::parse(raw),
            Self::Numeric(n) => ParticipantId::parse(&n.to_string()),
            Self::Record(record) => ParticipantId::parse(&record.id).map_err(|err| {
                SettleupError::invalid_participant(format!("record {record:?}: {err}"))
            }),
        }
    }
}

impl From<&str> for ParticipantRef {
    fn from(raw: &str) -> Self {
        Self::Raw(raw.to_string())
    }
}

impl From<ParticipantId> for ParticipantRef {
    fn from(id: ParticipantId) -> Self {
        Self::Raw(id.0)
    }
}

// ---------------------------------------------------------------------------
// GroupId
// ---------------------------------------------------------------------------

/// Identifier of the group whose ledger a settlement run rewrites.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(String);

impl GroupId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "group:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// LedgerRecordId
// ---------------------------------------------------------------------------

/// Unique ledger record identifier. Uses UUIDv7 for time-ordered sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct LedgerRecordId(pub Uuid);

impl LedgerRecordId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for LedgerRecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for LedgerRecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// LedgerVersion
// ---------------------------------------------------------------------------

/// Per-group version token, bumped by every mutation of a group's unsettled
/// rows. A replace is only accepted against the version it was computed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Default, Serialize, Deserialize)]
pub struct LedgerVersion(pub u64);

impl LedgerVersion {
    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for LedgerVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
