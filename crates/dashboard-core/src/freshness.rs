//! Conditional re-fetch support.
//!
//! A [`FreshnessToken`] is the instant of the most recent write, handed to
//! clients as a weak entity tag (`W/"2024-01-01T01:10:00Z"`). When a client
//! sends it back, [`check`] decides whether anything changed since.
//!
//! The decision table:
//!
//! | Store | Client token | Result |
//! |-------|--------------|--------|
//! | empty | anything | `Stale`, no token |
//! | non-empty | absent | `Stale` |
//! | non-empty | unparseable | `Stale` |
//! | non-empty | same instant | `NotModified` |
//! | non-empty | other instant | `Stale` |
//!
//! An unparseable token never fails the request; the client simply gets a
//! full response with a fresh token.

use std::fmt;

use serde::Serialize;
use time::format_description::well_known::Rfc3339;
use time::{OffsetDateTime, UtcOffset};
use tracing::debug;

/// The instant of the most recent write, as handed to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct FreshnessToken(#[serde(with = "time::serde::rfc3339")] OffsetDateTime);

impl FreshnessToken {
    /// Wrap a last-write instant.
    pub fn new(last_updated: OffsetDateTime) -> Self {
        Self(last_updated.to_offset(UtcOffset::UTC))
    }

    /// The instant this token stands for.
    pub fn timestamp(&self) -> OffsetDateTime {
        self.0
    }

    /// Render as a weak HTTP entity tag.
    pub fn to_etag(&self) -> String {
        format!("W/\"{}\"", self)
    }

    /// Parse a single entity tag or bare RFC 3339 timestamp.
    ///
    /// Accepts `W/"<ts>"`, `"<ts>"` and `<ts>`.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        let value = value.strip_prefix("W/").unwrap_or(value);
        let value = value
            .strip_prefix('"')
            .and_then(|v| v.strip_suffix('"'))
            .unwrap_or(value);

        OffsetDateTime::parse(value, &Rfc3339).ok().map(Self::new)
    }
}

impl fmt::Display for FreshnessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.format(&Rfc3339) {
            Ok(s) => f.write_str(&s),
            Err(_) => write!(f, "{}", self.0.unix_timestamp_nanos()),
        }
    }
}

/// Outcome of comparing a client token with the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Freshness {
    /// The client already has the current data.
    NotModified,
    /// The client must get a full response.
    ///
    /// `current` is the token to attach to it; `None` when the store has no
    /// readings yet.
    Stale { current: Option<FreshnessToken> },
}

impl Freshness {
    /// Whether the client can reuse what it has.
    pub fn is_not_modified(&self) -> bool {
        matches!(self, Freshness::NotModified)
    }

    /// Token to attach to a full response, if any.
    pub fn current(&self) -> Option<FreshnessToken> {
        match self {
            Freshness::NotModified => None,
            Freshness::Stale { current } => *current,
        }
    }
}

/// Compare a client-supplied token against the store's last write.
///
/// `client_token` is the raw header value; it may hold a comma-separated
/// list of entity tags, any of which may match.
pub fn check(client_token: Option<&str>, last_updated: Option<OffsetDateTime>) -> Freshness {
    let Some(last_updated) = last_updated else {
        return Freshness::Stale { current: None };
    };
    let current = FreshnessToken::new(last_updated);

    let Some(client_token) = client_token else {
        return Freshness::Stale {
            current: Some(current),
        };
    };

    let parsed: Vec<FreshnessToken> = client_token
        .split(',')
        .filter_map(FreshnessToken::parse)
        .collect();

    if parsed.is_empty() {
        debug!("Ignoring unparseable freshness token {:?}", client_token);
    } else if parsed.contains(&current) {
        return Freshness::NotModified;
    }

    Freshness::Stale {
        current: Some(current),
    }
}
