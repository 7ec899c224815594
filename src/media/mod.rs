//! Byte-level media classification and container metadata
//!
//! Everything in here is a pure function over a caller-owned buffer: no I/O,
//! no shared mutable state, safe to call from any number of tasks at once.

pub mod duration;
pub mod sniff;

pub use duration::read_duration;
pub use sniff::{classify, signature_kind};

use crate::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Classification of an uploaded blob, derived only from its leading bytes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
    Unknown,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
            MediaKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "image" => Ok(MediaKind::Image),
            "video" => Ok(MediaKind::Video),
            "unknown" => Ok(MediaKind::Unknown),
            other => Err(Error::InvalidArgument(format!(
                "Unknown media kind '{}'. Expected image or video",
                other
            ))),
        }
    }
}
