// Subscription manager settings file
// The manager reads /etc/SUSEConnect, a small "key: value" document with
// the keys url, language and insecure. Unknown lines are preserved by the
// manager but not by us: saving regenerates the file from the known keys,
// matching how the settings form always behaved.

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

pub const DEFAULT_SETTINGS_PATH: &str = "/etc/SUSEConnect";

static URL_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^url: ?(.*?)$").unwrap());
static LANGUAGE_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^language: ?(.*?)$").unwrap());
static INSECURE_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^insecure: ?(.*?)$").unwrap());

/// Settings persisted for the subscription manager
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    /// Registration server / proxy URL
    pub url: Option<String>,
    /// Country code for server responses
    pub language: Option<String>,
    /// Accept insecure proxy certificates
    pub insecure: bool,
}

impl Settings {
    /// Extract the known keys from file content, tolerating unknown lines
    pub fn parse(content: &str) -> Self {
        let capture = |re: &Regex| {
            re.captures(content)
                .map(|caps| caps[1].to_string())
                .filter(|value| !value.is_empty())
        };

        Self {
            url: capture(&URL_LINE),
            language: capture(&LANGUAGE_LINE),
            insecure: capture(&INSECURE_LINE).as_deref() == Some("true"),
        }
    }

    /// Render the file content: a `---` header plus only the set keys
    pub fn render(&self) -> String {
        let mut lines = vec!["---".to_string()];
        if let Some(url) = self.url.as_deref().filter(|v| !v.is_empty()) {
            lines.push(format!("url: {url}"));
        }
        if let Some(language) = self.language.as_deref().filter(|v| !v.is_empty()) {
            lines.push(format!("language: {language}"));
        }
        if self.insecure {
            lines.push("insecure: true".to_string());
        }
        lines.join("\n") + "\n"
    }

    /// Load settings; a missing file yields the defaults
    pub async fn load(path: &Path) -> Result<Self> {
        match tokio::fs::read_to_string(path).await {
            Ok(content) => Ok(Self::parse(&content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e).with_context(|| format!("reading {}", path.display())),
        }
    }

    /// Persist settings, replacing the file wholesale
    pub async fn save(&self, path: &Path) -> Result<()> {
        tokio::fs::write(path, self.render())
            .await
            .with_context(|| format!("writing {}", path.display()))
    }
}
