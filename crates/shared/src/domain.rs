use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::ParseSortKeyError;

macro_rules! code_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

// Primary key across all endpoints, e.g. `29-1141`.
code_newtype!(SocCode);
// O*NET-SOC classification code, e.g. `29-1141.00`.
code_newtype!(OnetSocCode);

/// Listing order. The exact ordering policy belongs to the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SortKey {
    /// AI risk mean, descending.
    #[default]
    #[serde(rename = "ai")]
    Risk,
    /// Employment count, descending.
    #[serde(rename = "employment")]
    Employment,
}

impl SortKey {
    pub fn as_query_value(self) -> &'static str {
        match self {
            Self::Risk => "ai",
            Self::Employment => "employment",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_query_value())
    }
}

impl FromStr for SortKey {
    type Err = ParseSortKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ai" | "risk" => Ok(Self::Risk),
            "employment" => Ok(Self::Employment),
            _ => Err(ParseSortKeyError(s.to_string())),
        }
    }
}
