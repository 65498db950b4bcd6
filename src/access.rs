use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Access tier recorded in a document's front matter.
///
/// Unknown strings survive a load/save cycle unchanged and are only visible
/// to an admin viewer.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(from = "String", into = "String")]
pub(crate) enum AccessLevel {
    #[default]
    Personal,
    Work,
    Admin,
    Other(String),
}

impl AccessLevel {
    pub fn as_str(&self) -> &str {
        match self {
            AccessLevel::Personal => "personal",
            AccessLevel::Work => "work",
            AccessLevel::Admin => "admin",
            AccessLevel::Other(s) => s,
        }
    }
}

impl From<String> for AccessLevel {
    fn from(s: String) -> Self {
        match s.as_str() {
            "personal" => AccessLevel::Personal,
            "work" => AccessLevel::Work,
            "admin" => AccessLevel::Admin,
            _ => AccessLevel::Other(s),
        }
    }
}

impl From<&str> for AccessLevel {
    fn from(s: &str) -> Self {
        AccessLevel::from(s.to_string())
    }
}

impl From<AccessLevel> for String {
    fn from(level: AccessLevel) -> Self {
        match level {
            AccessLevel::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tier of a logged-in viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Tier {
    Admin,
    Work,
}

impl Tier {
    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Admin => "admin",
            Tier::Work => "work",
        }
    }

    pub fn can_see(self, level: &AccessLevel) -> bool {
        match self {
            Tier::Admin => true,
            Tier::Work => matches!(level, AccessLevel::Personal | AccessLevel::Work),
        }
    }

    pub fn can_modify(self) -> bool {
        self == Tier::Admin
    }
}

impl FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Tier::Admin),
            "work" => Ok(Tier::Work),
            _ => Err(format!("unknown tier: {s}")),
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
