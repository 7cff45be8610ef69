use std::fmt;

use serde::{Deserialize, Deserializer};

/// Where a portal leads. Relative paths stay on the site; anything carrying a
/// URL scheme leaves it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    Page(String),
    External(String),
}

impl Destination {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.contains("://") {
            Self::External(raw.to_string())
        } else {
            Self::Page(raw.trim_start_matches("./").to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Page(path) | Self::External(path) => path,
        }
    }

    pub fn is_external(&self) -> bool {
        matches!(self, Self::External(_))
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Destination {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}
