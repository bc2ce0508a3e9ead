//! Vendor definitions for the integrated OSINT services

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::OsintError;

/// Supported third-party OSINT services
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VendorId {
    /// Snusbase - breach database grouped by source
    Snusbase,
    /// LeakCheck - breach lookups with source metadata
    LeakCheck,
    /// BreachDirectory - breach lookups via RapidAPI
    BreachDirectory,
    /// DeHashed - breach search engine
    Dehashed,
    /// LeakOsint - multi-database breach search
    LeakOsint,
    /// Leak-Lookup - breach index keyed by database
    LeakLookup,
    /// HackCheck - breach search
    HackCheck,
    /// Oathnet - breach and stealer search
    Oathnet,
    /// Inf0sec - tabular leak lookups
    Inf0sec,
    /// Hudson Rock - infostealer intelligence
    HudsonRock,
    /// OSINT Industries - account enumeration over an SSE stream
    OsintIndustries,
    /// SEON - email and phone footprint
    Seon,
    /// Shodan - host intelligence
    Shodan,
    /// IPinfo - IP geolocation
    IpInfo,
    /// IPQualityScore - fraud scoring
    IpQualityScore,
    /// VirusTotal - domain, IP and file reputation
    VirusTotal,
    /// Hunter - email discovery for domains
    Hunter,
    /// WhoisXML - WHOIS records
    WhoisXml,
    /// Endato - people search
    Endato,
    /// VinAudit - vehicle specifications
    VinAudit,
    /// NHTSA vPIC - public VIN decoder
    Nhtsa,
    /// Discord lookup - public Discord profile data
    DiscordLookup,
    /// Hashes.com - hash lookups
    HashesCom,
}

/// Broad grouping used for display and filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VendorCategory {
    Breach,
    Stealer,
    Accounts,
    People,
    Network,
    Domain,
    Vehicle,
    Social,
    Hash,
}

impl VendorId {
    /// Every vendor, in catalogue order
    pub const ALL: [VendorId; 23] = [
        VendorId::Snusbase,
        VendorId::LeakCheck,
        VendorId::BreachDirectory,
        VendorId::Dehashed,
        VendorId::LeakOsint,
        VendorId::LeakLookup,
        VendorId::HackCheck,
        VendorId::Oathnet,
        VendorId::Inf0sec,
        VendorId::HudsonRock,
        VendorId::OsintIndustries,
        VendorId::Seon,
        VendorId::Shodan,
        VendorId::IpInfo,
        VendorId::IpQualityScore,
        VendorId::VirusTotal,
        VendorId::Hunter,
        VendorId::WhoisXml,
        VendorId::Endato,
        VendorId::VinAudit,
        VendorId::Nhtsa,
        VendorId::DiscordLookup,
        VendorId::HashesCom,
    ];

    /// Stable lowercase identifier (matches the serde form)
    pub fn as_str(&self) -> &'static str {
        match self {
            VendorId::Snusbase => "snusbase",
            VendorId::LeakCheck => "leakcheck",
            VendorId::BreachDirectory => "breachdirectory",
            VendorId::Dehashed => "dehashed",
            VendorId::LeakOsint => "leakosint",
            VendorId::LeakLookup => "leaklookup",
            VendorId::HackCheck => "hackcheck",
            VendorId::Oathnet => "oathnet",
            VendorId::HudsonRock => "hudsonrock",
            VendorId::OsintIndustries => "osintindustries",
            VendorId::Inf0sec => "inf0sec",
            VendorId::Seon => "seon",
            VendorId::Shodan => "shodan",
            VendorId::IpInfo => "ipinfo",
            VendorId::IpQualityScore => "ipqualityscore",
            VendorId::VirusTotal => "virustotal",
            VendorId::Hunter => "hunter",
            VendorId::WhoisXml => "whoisxml",
            VendorId::Endato => "endato",
            VendorId::VinAudit => "vinaudit",
            VendorId::Nhtsa => "nhtsa",
            VendorId::DiscordLookup => "discordlookup",
            VendorId::HashesCom => "hashescom",
        }
    }

    /// Get the full display name
    pub fn display_name(&self) -> &'static str {
        match self {
            VendorId::Snusbase => "Snusbase",
            VendorId::LeakCheck => "LeakCheck",
            VendorId::BreachDirectory => "BreachDirectory",
            VendorId::Dehashed => "DeHashed",
            VendorId::LeakOsint => "LeakOsint",
            VendorId::LeakLookup => "Leak-Lookup",
            VendorId::HackCheck => "HackCheck",
            VendorId::Oathnet => "Oathnet",
            VendorId::HudsonRock => "Hudson Rock",
            VendorId::OsintIndustries => "OSINT Industries",
            VendorId::Inf0sec => "Inf0sec",
            VendorId::Seon => "SEON",
            VendorId::Shodan => "Shodan",
            VendorId::IpInfo => "IPinfo",
            VendorId::IpQualityScore => "IPQualityScore",
            VendorId::VirusTotal => "VirusTotal",
            VendorId::Hunter => "Hunter",
            VendorId::WhoisXml => "WhoisXML",
            VendorId::Endato => "Endato",
            VendorId::VinAudit => "VinAudit",
            VendorId::Nhtsa => "NHTSA vPIC",
            VendorId::DiscordLookup => "Discord Lookup",
            VendorId::HashesCom => "Hashes.com",
        }
    }

    pub fn category(&self) -> VendorCategory {
        match self {
            VendorId::Snusbase
            | VendorId::LeakCheck
            | VendorId::BreachDirectory
            | VendorId::Dehashed
            | VendorId::LeakOsint
            | VendorId::LeakLookup
            | VendorId::HackCheck
            | VendorId::Oathnet
            | VendorId::Inf0sec => VendorCategory::Breach,
            VendorId::HudsonRock => VendorCategory::Stealer,
            VendorId::OsintIndustries | VendorId::Seon => VendorCategory::Accounts,
            VendorId::Endato => VendorCategory::People,
            VendorId::Shodan | VendorId::IpInfo | VendorId::IpQualityScore => {
                VendorCategory::Network
            }
            VendorId::VirusTotal | VendorId::Hunter | VendorId::WhoisXml => VendorCategory::Domain,
            VendorId::VinAudit | VendorId::Nhtsa => VendorCategory::Vehicle,
            VendorId::DiscordLookup => VendorCategory::Social,
            VendorId::HashesCom => VendorCategory::Hash,
        }
    }
}

impl fmt::Display for VendorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl std::str::FromStr for VendorId {
    type Err = OsintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_lowercase();

        VendorId::ALL
            .iter()
            .copied()
            .find(|v| v.as_str() == wanted)
            .ok_or_else(|| OsintError::config(format!("Unknown vendor: {}", s)))
    }
}
