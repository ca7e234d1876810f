//! Per-sender daily capacity.
//!
//! The quota is a single persisted setting; every sender currently gets the
//! same value.

use serde::{Deserialize, Serialize};

use crate::domain::User;

/// Quota used when the setting is missing or unusable.
pub const DEFAULT_QUOTA: u32 = 25;
/// Smallest quota the setting may hold.
pub const MIN_QUOTA: u32 = 1;
/// Largest quota the setting may hold.
pub const MAX_QUOTA: u32 = 200;

/// Maximum assignments a sender should carry on one date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Quota(u32);

impl Quota {
    /// Clamp a requested value into `[MIN_QUOTA, MAX_QUOTA]`.
    pub fn clamped(value: i64) -> Self {
        Self(value.clamp(i64::from(MIN_QUOTA), i64::from(MAX_QUOTA)) as u32)
    }

    /// Interpret a stored setting value.
    ///
    /// Missing, unparseable and non-positive values fall back to the default;
    /// anything above the maximum is clamped.
    pub fn from_setting(raw: Option<&str>) -> Self {
        let Some(parsed) = raw.and_then(|s| s.trim().parse::<f64>().ok()) else {
            return Self::default();
        };
        if !parsed.is_finite() || parsed < f64::from(MIN_QUOTA) {
            return Self::default();
        }
        Self::clamped(parsed.trunc() as i64)
    }

    pub fn get(self) -> u32 {
        self.0
    }

    /// Quota as a slot count.
    pub fn slots(self) -> usize {
        self.0 as usize
    }
}

impl Default for Quota {
    fn default() -> Self {
        Self(DEFAULT_QUOTA)
    }
}

impl std::fmt::Display for Quota {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Maps a sender to its per-date capacity.
pub trait CapacityPolicy {
    /// Slots the sender may fill on any single date.
    fn quota_for(&self, sender: &User) -> usize;
}

/// Same quota for every sender.
#[derive(Debug, Clone, Copy)]
pub struct UniformQuota {
    quota: Quota,
}

impl UniformQuota {
    pub fn new(quota: Quota) -> Self {
        Self { quota }
    }
}

impl CapacityPolicy for UniformQuota {
    fn quota_for(&self, _sender: &User) -> usize {
        self.quota.slots()
    }
}
