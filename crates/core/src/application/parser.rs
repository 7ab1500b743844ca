// Output Parser
// Deserializes subprocess stdout into domain records. Pure, no I/O.

use serde::Deserialize;

use crate::domain::{Extension, Subscription};

/// Shape of the extensions listing: an object whose `extensions` field may
/// be absent or null, both meaning "no extensions"
#[derive(Debug, Deserialize)]
struct ExtensionListing {
    #[serde(default)]
    extensions: Option<Vec<Extension>>,
}

/// Parse the status query output (JSON array of subscription records)
pub fn parse_subscriptions(raw: &str) -> Result<Vec<Subscription>, serde_json::Error> {
    serde_json::from_str(raw)
}

/// Parse the extensions query output
pub fn parse_extensions(raw: &str) -> Result<Vec<Extension>, serde_json::Error> {
    let listing: ExtensionListing = serde_json::from_str(raw)?;
    Ok(listing.extensions.unwrap_or_default())
}
