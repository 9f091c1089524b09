//! Carrier detection and tracking URLs.
//!
//! Tracking numbers are matched against known carrier formats after
//! normalisation (surrounding and inner whitespace removed, upper-cased).
//! Anything unrecognised links to a universal tracker with its original
//! casing, since those formats may be case-sensitive.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

static UPS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^1Z[0-9A-Z]{16}$").expect("Invalid regex"));
static USPS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(94\d{18,}|\d{20,})$").expect("Invalid regex"));
static FEDEX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{12,15}$").expect("Invalid regex"));
static DHL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{10,11}$").expect("Invalid regex"));

/// A shipping carrier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Carrier {
    Ups,
    Usps,
    Fedex,
    Dhl,
    /// No known format matched.
    Other,
}

impl Carrier {
    /// Detect the carrier of an already-normalised tracking number.
    fn detect(number: &str) -> Self {
        if UPS_RE.is_match(number) {
            Self::Ups
        } else if USPS_RE.is_match(number) {
            Self::Usps
        } else if FEDEX_RE.is_match(number) {
            Self::Fedex
        } else if DHL_RE.is_match(number) {
            Self::Dhl
        } else {
            Self::Other
        }
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Ups => "UPS",
            Self::Usps => "USPS",
            Self::Fedex => "FedEx",
            Self::Dhl => "DHL",
            Self::Other => "Carrier",
        }
    }

    fn url(self, number: &str) -> String {
        let encoded: String = url::form_urlencoded::byte_serialize(number.as_bytes()).collect();
        match self {
            Self::Ups => format!("https://www.ups.com/track?tracknum={encoded}"),
            Self::Usps => {
                format!("https://tools.usps.com/go/TrackConfirmAction?tLabels={encoded}")
            }
            Self::Fedex => format!("https://www.fedex.com/fedextrack/?trknbr={encoded}"),
            Self::Dhl => {
                format!("https://www.dhl.com/en/express/tracking.html?AWB={encoded}&brand=DHL")
            }
            Self::Other => format!("https://parcelsapp.com/en/tracking/{encoded}"),
        }
    }
}

impl fmt::Display for Carrier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A normalised tracking number with its carrier and link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackingLink {
    pub carrier: Carrier,
    pub number: String,
    pub url: String,
}

/// Strip all whitespace and upper-case.
#[must_use]
pub fn normalize(raw: &str) -> String {
    compact(raw).to_uppercase()
}

fn compact(raw: &str) -> String {
    raw.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Build the tracking link for a raw tracking number.
///
/// Returns `None` for blank input.
///
/// ```
/// use perkshop_core::tracking::{Carrier, tracking_link};
///
/// let link = tracking_link("1Z999AA10123456784").unwrap();
/// assert_eq!(link.carrier, Carrier::Ups);
/// assert_eq!(link.url, "https://www.ups.com/track?tracknum=1Z999AA10123456784");
/// assert!(tracking_link("   ").is_none());
/// ```
#[must_use]
pub fn tracking_link(raw: &str) -> Option<TrackingLink> {
    let compacted = compact(raw);
    if compacted.is_empty() {
        return None;
    }
    let normalized = compacted.to_uppercase();
    let carrier = Carrier::detect(&normalized);
    let number = if carrier == Carrier::Other {
        compacted
    } else {
        normalized
    };
    Some(TrackingLink {
        carrier,
        url: carrier.url(&number),
        number,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_ups() {
        let link = tracking_link("1z999aa10123456784").unwrap();
        assert_eq!(link.carrier, Carrier::Ups);
        assert_eq!(link.number, "1Z999AA10123456784");
    }

    #[test]
    fn test_usps_with_spaces() {
        let link = tracking_link("9401 2345 6789 0123 4567 8").unwrap();
        assert_eq!(link.carrier, Carrier::Usps);
        assert_eq!(
            link.url,
            "https://tools.usps.com/go/TrackConfirmAction?tLabels=940123456789012345678"
        );
    }

    #[test]
    fn test_usps_long_numeric() {
        let link = tracking_link("12345678901234567890").unwrap();
        assert_eq!(link.carrier, Carrier::Usps);
    }

    #[test]
    fn test_fedex_and_dhl_lengths() {
        assert_eq!(tracking_link("123456789012").unwrap().carrier, Carrier::Fedex);
        assert_eq!(tracking_link("123456789012345").unwrap().carrier, Carrier::Fedex);
        assert_eq!(tracking_link("1234567890").unwrap().carrier, Carrier::Dhl);
        assert_eq!(
            tracking_link("12345678901").unwrap().url,
            "https://www.dhl.com/en/express/tracking.html?AWB=12345678901&brand=DHL"
        );
    }

    #[test]
    fn test_fallback_is_encoded() {
        let link = tracking_link("LX-55/AB").unwrap();
        assert_eq!(link.carrier, Carrier::Other);
        assert_eq!(link.url, "https://parcelsapp.com/en/tracking/LX-55%2FAB");
    }

    #[test]
    fn test_fallback_keeps_casing() {
        let link = tracking_link(" Lx 55ab ").unwrap();
        assert_eq!(link.carrier, Carrier::Other);
        assert_eq!(link.number, "Lx55ab");
        assert_eq!(link.url, "https://parcelsapp.com/en/tracking/Lx55ab");
    }

    #[test]
    fn test_blank_is_none() {
        assert!(tracking_link("").is_none());
        assert!(tracking_link(" \t\n").is_none());
    }
}
