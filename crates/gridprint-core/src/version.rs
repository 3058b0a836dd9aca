//! Game versions packed into a single 64-bit integer.
//!
//! The external form is `major << 48 | minor << 32 | patch << 16 | dev`.
//! Inputs may also be a sequence of up to four components.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "VersionRepr", into = "u64")]
pub struct Version(u64);

#[derive(Deserialize)]
#[serde(untagged)]
enum VersionRepr {
    Packed(u64),
    Parts(Vec<u64>),
}

impl Version {
    /// The game version written into blueprints that do not state one.
    pub const CURRENT: Version = Version::from_parts(1, 1, 110, 0);

    pub const fn from_parts(major: u16, minor: u16, patch: u16, dev: u16) -> Self {
        Self((major as u64) << 48 | (minor as u64) << 32 | (patch as u64) << 16 | dev as u64)
    }

    pub const fn from_packed(packed: u64) -> Self {
        Self(packed)
    }

    /// Build from one to four components; missing trailing parts are zero.
    pub fn from_slice(parts: &[u64]) -> Result<Self, String> {
        if parts.is_empty() || parts.len() > 4 {
            return Err(format!("version must have 1 to 4 components, found {}", parts.len()));
        }
        let mut out = [0u16; 4];
        for (slot, &part) in out.iter_mut().zip(parts) {
            *slot = u16::try_from(part).map_err(|_| format!("version component {part} exceeds 65535"))?;
        }
        Ok(Self::from_parts(out[0], out[1], out[2], out[3]))
    }

    pub const fn packed(self) -> u64 {
        self.0
    }

    pub const fn parts(self) -> (u16, u16, u16, u16) {
        (
            (self.0 >> 48) as u16,
            (self.0 >> 32) as u16,
            (self.0 >> 16) as u16,
            self.0 as u16,
        )
    }
}

impl TryFrom<VersionRepr> for Version {
    type Error = String;

    fn try_from(repr: VersionRepr) -> Result<Self, Self::Error> {
        match repr {
            VersionRepr::Packed(packed) => Ok(Version(packed)),
            VersionRepr::Parts(parts) => Version::from_slice(&parts),
        }
    }
}

impl From<Version> for u64 {
    fn from(v: Version) -> u64 {
        v.0
    }
}

impl From<(u16, u16, u16, u16)> for Version {
    fn from((major, minor, patch, dev): (u16, u16, u16, u16)) -> Self {
        Self::from_parts(major, minor, patch, dev)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (major, minor, patch, dev) = self.parts();
        write!(f, "{major}.{minor}.{patch}.{dev}")
    }
}
