//! Voucher package catalog.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// A voucher product tier.
///
/// The catalog is closed: unknown identifiers are rejected with
/// `Error::InvalidPackage` instead of falling back to a default duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Package {
    #[serde(rename = "1hour")]
    OneHour,
    #[serde(rename = "1day")]
    OneDay,
    #[serde(rename = "3days")]
    ThreeDays,
    #[serde(rename = "1week")]
    OneWeek,
}

impl Package {
    /// Every package, in display order.
    pub const ALL: [Package; 4] = [
        Package::OneHour,
        Package::OneDay,
        Package::ThreeDays,
        Package::OneWeek,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OneHour => "1hour",
            Self::OneDay => "1day",
            Self::ThreeDays => "3days",
            Self::OneWeek => "1week",
        }
    }

    /// Access time granted by a voucher of this package.
    pub fn duration(&self) -> Duration {
        match self {
            Self::OneHour => Duration::hours(1),
            Self::OneDay => Duration::hours(24),
            Self::ThreeDays => Duration::hours(72),
            Self::OneWeek => Duration::hours(168),
        }
    }

    /// Price in IDR.
    pub fn price(&self) -> u64 {
        match self {
            Self::OneHour => 5_000,
            Self::OneDay => 15_000,
            Self::ThreeDays => 35_000,
            Self::OneWeek => 70_000,
        }
    }

    /// Prefix of voucher codes issued for this package.
    pub fn code_prefix(&self) -> &'static str {
        match self {
            Self::OneHour => "1H",
            Self::OneDay => "1D",
            Self::ThreeDays => "3D",
            Self::OneWeek => "1W",
        }
    }

    /// Router rate limit (upload/download).
    pub fn bandwidth(&self) -> &'static str {
        match self {
            Self::OneHour => "2M/2M",
            Self::OneDay | Self::ThreeDays => "5M/5M",
            Self::OneWeek => "10M/10M",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::OneHour => "1 Jam",
            Self::OneDay => "1 Hari",
            Self::ThreeDays => "3 Hari",
            Self::OneWeek => "1 Minggu",
        }
    }
}

impl FromStr for Package {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Package::ALL
            .into_iter()
            .find(|p| p.as_str() == s.trim())
            .ok_or_else(|| Error::InvalidPackage(s.to_string()))
    }
}

impl fmt::Display for Package {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Public catalog entry served to the storefront.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageInfo {
    pub id: Package,
    pub name: String,
    pub price: u64,
    pub duration_hours: i64,
    pub bandwidth: String,
}

impl From<Package> for PackageInfo {
    fn from(package: Package) -> Self {
        Self {
            id: package,
            name: package.display_name().to_string(),
            price: package.price(),
            duration_hours: package.duration().num_hours(),
            bandwidth: package.bandwidth().to_string(),
        }
    }
}

/// The full catalog.
pub fn catalog() -> Vec<PackageInfo> {
    Package::ALL.into_iter().map(PackageInfo::from).collect()
}
