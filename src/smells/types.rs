//! Android code-smell types tracked by the lifecycle analyses

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Smell tags as they appear in metrics column names and instance log
/// file names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SmellType {
    /// HashMap usage
    Hmu,
    /// Init OnDraw
    Iod,
    /// Invalidate without rect
    Iwr,
    /// Leaking inner class
    Lic,
    /// Member ignoring method
    Mim,
    /// No low memory resolver
    Nlmr,
    /// Unsuited LRU cache size
    Ucs,
    /// Unsupported hardware acceleration
    Uha,
    /// UI overdraw
    Uio,
}

impl SmellType {
    pub const ALL: [SmellType; 9] = [
        SmellType::Hmu,
        SmellType::Iod,
        SmellType::Iwr,
        SmellType::Lic,
        SmellType::Mim,
        SmellType::Nlmr,
        SmellType::Ucs,
        SmellType::Uha,
        SmellType::Uio,
    ];

    pub fn tag(&self) -> &'static str {
        match self {
            SmellType::Hmu => "HMU",
            SmellType::Iod => "IOD",
            SmellType::Iwr => "IWR",
            SmellType::Lic => "LIC",
            SmellType::Mim => "MIM",
            SmellType::Nlmr => "NLMR",
            SmellType::Ucs => "UCS",
            SmellType::Uha => "UHA",
            SmellType::Uio => "UIO",
        }
    }
}

impl FromStr for SmellType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SmellType::ALL
            .into_iter()
            .find(|smell| smell.tag().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("Unknown smell type '{}'", s))
    }
}

impl std::fmt::Display for SmellType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}
