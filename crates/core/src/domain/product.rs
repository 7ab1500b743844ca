// Product Domain Model
// Mirrors the JSON shapes emitted by `suseconnect -s` and `suseconnect --json -l`.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use super::error::DomainError;

/// Timestamp shape used by the subscription manager, e.g. "2026-07-31 00:00:00 UTC"
const MANAGER_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

/// Normalized registration status (free-text `status` is kept alongside)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubscriptionStatus {
    Active,
    Expired,
    Unregistered,
}

impl std::fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubscriptionStatus::Active => write!(f, "Active"),
            SubscriptionStatus::Expired => write!(f, "Expired"),
            SubscriptionStatus::Unregistered => write!(f, "Unregistered"),
        }
    }
}

/// identifier/version/arch triple uniquely identifying a product
///
/// Rendered in the `identifier/version/arch` form the subscription manager
/// accepts for its `-p` option.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductKey {
    pub identifier: String,
    pub version: String,
    pub arch: String,
}

impl ProductKey {
    pub fn new(
        identifier: impl Into<String>,
        version: impl Into<String>,
        arch: impl Into<String>,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            version: version.into(),
            arch: arch.into(),
        }
    }

    /// Parse the `identifier/version/arch` form
    ///
    /// # Errors
    /// - `DomainError::InvalidProductKey` if the triple is malformed or has
    ///   empty segments
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let parts: Vec<&str> = raw.split('/').collect();
        match parts.as_slice() {
            [identifier, version, arch]
                if !identifier.is_empty() && !version.is_empty() && !arch.is_empty() =>
            {
                Ok(Self::new(*identifier, *version, *arch))
            }
            _ => Err(DomainError::InvalidProductKey(raw.to_string())),
        }
    }
}

impl std::fmt::Display for ProductKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.identifier, self.version, self.arch)
    }
}

/// A registered product's state as reported by the status query
///
/// Produced fresh on every query call and never mutated in place; the next
/// query result supersedes it wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    #[serde(default)]
    pub name: Option<String>,
    pub identifier: String,
    pub version: String,
    pub arch: String,
    pub status: String,
    #[serde(default)]
    pub regcode: Option<String>,
    #[serde(default)]
    pub starts_at: Option<String>,
    #[serde(default)]
    pub expires_at: Option<String>,
    #[serde(default)]
    pub subscription_status: Option<SubscriptionStatus>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub extensions: Option<Vec<Extension>>,
}

impl Subscription {
    pub fn product_key(&self) -> ProductKey {
        ProductKey::new(&self.identifier, &self.version, &self.arch)
    }

    /// Start of the validity window, when present and well-formed
    pub fn starts(&self) -> Option<DateTime<Utc>> {
        parse_manager_time(self.starts_at.as_deref()?)
    }

    /// End of the validity window, when present and well-formed
    pub fn expires(&self) -> Option<DateTime<Utc>> {
        parse_manager_time(self.expires_at.as_deref()?)
    }
}

/// An addable product offering from the extensions query
///
/// Extensions nest recursively with unbounded depth; callers must walk the
/// tree rather than assume a fixed number of levels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Extension {
    pub name: String,
    pub identifier: String,
    pub version: String,
    pub arch: String,
    pub activated: bool,
    pub available: bool,
    pub free: bool,
    #[serde(default)]
    pub expires_at: Option<String>,
    #[serde(default)]
    pub extensions: Vec<Extension>,
}

impl Extension {
    pub fn product_key(&self) -> ProductKey {
        ProductKey::new(&self.identifier, &self.version, &self.arch)
    }

    /// Whether this extension may be offered for activation
    pub fn is_activatable(&self) -> bool {
        self.free && self.available && !self.activated
    }

    pub fn expires(&self) -> Option<DateTime<Utc>> {
        parse_manager_time(self.expires_at.as_deref()?)
    }
}

fn parse_manager_time(raw: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(raw, MANAGER_TIME_FORMAT)
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn product_key_round_trip() {
        let key = ProductKey::parse("SLES/15.5/x86_64").unwrap();
        assert_eq!(key.identifier, "SLES");
        assert_eq!(key.to_string(), "SLES/15.5/x86_64");
    }

    #[test]
    fn product_key_rejects_malformed() {
        assert!(ProductKey::parse("SLES/15.5").is_err());
        assert!(ProductKey::parse("SLES//x86_64").is_err());
        assert!(ProductKey::parse("").is_err());
    }

    #[test]
    fn activatable_requires_all_three_flags() {
        let mut ext = Extension {
            name: "Basesystem".into(),
            identifier: "sle-module-basesystem".into(),
            version: "15.5".into(),
            arch: "x86_64".into(),
            activated: false,
            available: true,
            free: true,
            expires_at: None,
            extensions: vec![],
        };
        assert!(ext.is_activatable());

        ext.activated = true;
        assert!(!ext.is_activatable());

        ext.activated = false;
        ext.free = false;
        assert!(!ext.is_activatable());
    }

    #[test]
    fn validity_window_parses_manager_format() {
        let sub = Subscription {
            name: None,
            identifier: "SLES".into(),
            version: "15.5".into(),
            arch: "x86_64".into(),
            status: "Registered".into(),
            regcode: None,
            starts_at: Some("2024-05-31 10:32:04 UTC".into()),
            expires_at: Some("garbage".into()),
            subscription_status: None,
            kind: None,
            extensions: None,
        };

        assert!(sub.starts().is_some());
        // Malformed timestamps degrade to None, never an error
        assert!(sub.expires().is_none());
    }
}
