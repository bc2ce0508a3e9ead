//! Built-in vendor catalogue
//!
//! Field names follow payloads observed from each service. Vendors do not
//! publish authoritative schemas, so these specs are configuration to be
//! checked against live responses when a vendor changes its API.

use osint_core::{QueryType, VendorId};

use crate::adapter::VendorAdapter;
use crate::spec::{AdapterSpec, Merge, Shape};

use QueryType::*;

/// Source-database tag column for breach vendors
const DATABASE: &str = "database";

pub static BUILTIN_ADAPTERS: [VendorAdapter; 23] = [
    // ------------------------------------------------------------------
    // Breach databases
    // ------------------------------------------------------------------
    VendorAdapter {
        id: VendorId::Snusbase,
        query_types: &[Email, Username, Password, Hash, Ip, Name, Domain],
        spec: AdapterSpec {
            shape: Shape::Grouped {
                tag: DATABASE,
                inner: None,
            },
            result_fields: &["results"],
            preferred_columns: &[
                DATABASE, "email", "username", "password", "hash", "salt", "lastip", "name",
            ],
            total_path: Some("size"),
            ..AdapterSpec::DEFAULT
        },
    },
    VendorAdapter {
        id: VendorId::LeakCheck,
        query_types: &[Email, Username, Phone, Hash, Domain, Password],
        spec: AdapterSpec {
            result_fields: &["result"],
            merges: &[Merge::new("source", "source_")],
            preferred_columns: &[
                "source_name",
                "email",
                "username",
                "password",
                "source_breach_date",
            ],
            total_path: Some("found"),
            ..AdapterSpec::DEFAULT
        },
    },
    VendorAdapter {
        id: VendorId::BreachDirectory,
        query_types: &[Email, Username, Phone, Domain],
        spec: AdapterSpec {
            result_fields: &["result"],
            preferred_columns: &["email", "password", "sha1", "hash", "sources"],
            total_path: Some("found"),
            ..AdapterSpec::DEFAULT
        },
    },
    VendorAdapter {
        id: VendorId::Dehashed,
        query_types: &[
            Email, Username, Password, Hash, Ip, Name, Address, Phone, Vin, Domain,
        ],
        spec: AdapterSpec {
            result_fields: &["entries"],
            renames: &[("database_name", DATABASE)],
            drop: &["id"],
            preferred_columns: &[
                DATABASE,
                "email",
                "username",
                "password",
                "hashed_password",
                "name",
                "ip_address",
                "phone",
                "address",
            ],
            total_path: Some("total"),
            ..AdapterSpec::DEFAULT
        },
    },
    VendorAdapter {
        id: VendorId::LeakOsint,
        query_types: &[
            Email, Username, Phone, Name, Ip, Domain, Ssn, Address, Password,
        ],
        spec: AdapterSpec {
            shape: Shape::Grouped {
                tag: DATABASE,
                inner: Some("Data"),
            },
            result_fields: &["List"],
            preferred_columns: &[DATABASE, "Email", "FullName", "Phone", "Password"],
            total_path: Some("NumOfResults"),
            ..AdapterSpec::DEFAULT
        },
    },
    VendorAdapter {
        id: VendorId::LeakLookup,
        query_types: &[Email, Username, Ip, Phone, Domain, Password, Name],
        spec: AdapterSpec {
            shape: Shape::Grouped {
                tag: DATABASE,
                inner: None,
            },
            result_fields: &["message"],
            preferred_columns: &[DATABASE, "email_address", "username", "password"],
            ..AdapterSpec::DEFAULT
        },
    },
    VendorAdapter {
        id: VendorId::HackCheck,
        query_types: &[Email, Username, Password, Phone, Ip, Name, Domain, Hash],
        spec: AdapterSpec {
            result_fields: &["results"],
            merges: &[Merge::new("source", "source_")],
            preferred_columns: &[
                "source_name",
                "email",
                "username",
                "password",
                "source_date",
            ],
            total_path: Some("databases"),
            ..AdapterSpec::DEFAULT
        },
    },
    VendorAdapter {
        id: VendorId::Oathnet,
        query_types: &[Email, Username, Ip, Phone, Domain, Password],
        spec: AdapterSpec {
            result_fields: &["data.results", "results"],
            renames: &[("dbname", DATABASE)],
            preferred_columns: &[DATABASE, "email", "username", "password"],
            total_path: Some("data.results_found"),
            ..AdapterSpec::DEFAULT
        },
    },
    VendorAdapter {
        id: VendorId::Inf0sec,
        query_types: &[Email, Username, Phone, Domain, Ip],
        spec: AdapterSpec {
            shape: Shape::Grouped {
                tag: "source",
                inner: None,
            },
            result_fields: &["results", "result"],
            preferred_columns: &["source", "email", "username", "password"],
            ..AdapterSpec::DEFAULT
        },
    },
    // ------------------------------------------------------------------
    // Infostealer and account enumeration
    // ------------------------------------------------------------------
    VendorAdapter {
        id: VendorId::HudsonRock,
        query_types: &[Email, Username],
        spec: AdapterSpec {
            result_fields: &["stealers"],
            preferred_columns: &[
                "computer_name",
                "operating_system",
                "date_compromised",
                "malware_path",
                "ip",
            ],
            ..AdapterSpec::DEFAULT
        },
    },
    VendorAdapter {
        id: VendorId::OsintIndustries,
        query_types: &[Email, Username, Phone],
        spec: AdapterSpec {
            shape: Shape::SseBatch {
                batch_status: "batch_results",
                items_field: "results",
            },
            columns: &[
                ("plugin", "plugin_name"),
                ("service", "data.meta.name"),
                ("badges", "data.badges"),
            ],
            merges: &[
                Merge::new("data.display", ""),
                Merge::new("data.recovery", "recovery_"),
            ],
            preferred_columns: &["plugin", "service", "badges"],
            ..AdapterSpec::DEFAULT
        },
    },
    VendorAdapter {
        id: VendorId::Seon,
        query_types: &[Email, Phone],
        spec: AdapterSpec {
            shape: Shape::Grouped {
                tag: "service",
                inner: None,
            },
            result_fields: &["data.account_details"],
            preferred_columns: &["service", "registered", "url"],
            ..AdapterSpec::DEFAULT
        },
    },
    // ------------------------------------------------------------------
    // Network and domain intelligence
    // ------------------------------------------------------------------
    VendorAdapter {
        id: VendorId::Shodan,
        query_types: &[Ip],
        spec: AdapterSpec {
            result_fields: &["data"],
            merges: &[Merge::new("location", "")],
            drop: &["_shodan", "opts", "http", "ssl", "html"],
            preferred_columns: &[
                "ip_str",
                "port",
                "transport",
                "product",
                "version",
                "org",
                "hostnames",
            ],
            ..AdapterSpec::DEFAULT
        },
    },
    VendorAdapter {
        id: VendorId::IpInfo,
        query_types: &[Ip],
        spec: AdapterSpec {
            shape: Shape::Single,
            merges: &[Merge::new("privacy", "privacy_"), Merge::new("asn", "asn_")],
            drop: &["readme"],
            preferred_columns: &["ip", "hostname", "city", "region", "country", "org"],
            ..AdapterSpec::DEFAULT
        },
    },
    VendorAdapter {
        id: VendorId::IpQualityScore,
        query_types: &[Ip, Email, Phone],
        spec: AdapterSpec {
            shape: Shape::Single,
            drop: &["request_id", "success"],
            preferred_columns: &["fraud_score", "proxy", "vpn", "tor", "ISP", "country_code"],
            ..AdapterSpec::DEFAULT
        },
    },
    VendorAdapter {
        id: VendorId::VirusTotal,
        query_types: &[Domain, Ip, Hash],
        spec: AdapterSpec {
            shape: Shape::Single,
            result_fields: &["data.attributes"],
            merges: &[
                Merge::new("last_analysis_stats", "stats_"),
                Merge::new("total_votes", "votes_"),
            ],
            drop: &["last_analysis_results", "last_dns_records", "last_https_certificate"],
            preferred_columns: &[
                "reputation",
                "stats_malicious",
                "stats_suspicious",
                "stats_harmless",
            ],
            ..AdapterSpec::DEFAULT
        },
    },
    VendorAdapter {
        id: VendorId::Hunter,
        query_types: &[Domain],
        spec: AdapterSpec {
            result_fields: &["data.emails"],
            preferred_columns: &[
                "value",
                "type",
                "confidence",
                "first_name",
                "last_name",
                "position",
            ],
            total_path: Some("meta.results"),
            ..AdapterSpec::DEFAULT
        },
    },
    VendorAdapter {
        id: VendorId::WhoisXml,
        query_types: &[Domain],
        spec: AdapterSpec {
            shape: Shape::Single,
            result_fields: &["WhoisRecord"],
            merges: &[
                Merge::new("registrant", "registrant_"),
                Merge::new("administrativeContact", "admin_"),
                Merge::new("technicalContact", "tech_"),
                Merge::new("nameServers", "nameservers_"),
            ],
            drop: &["rawText", "strippedText", "registryData", "audit", "header", "footer"],
            preferred_columns: &["domainName", "registrarName", "createdDate", "expiresDate"],
            ..AdapterSpec::DEFAULT
        },
    },
    // ------------------------------------------------------------------
    // People, vehicles, social, hashes
    // ------------------------------------------------------------------
    VendorAdapter {
        id: VendorId::Endato,
        query_types: &[Name, Phone, Email, Address],
        spec: AdapterSpec {
            result_fields: &["persons"],
            merges: &[Merge::new("name", "name_")],
            drop: &["tahoeId"],
            preferred_columns: &["name_firstName", "name_lastName", "age", "dob"],
            total_path: Some("pagination.totalResults"),
            ..AdapterSpec::DEFAULT
        },
    },
    VendorAdapter {
        id: VendorId::VinAudit,
        query_types: &[Vin],
        spec: AdapterSpec {
            shape: Shape::Single,
            result_fields: &["attributes"],
            preferred_columns: &["year", "make", "model", "trim", "engine"],
            ..AdapterSpec::DEFAULT
        },
    },
    VendorAdapter {
        id: VendorId::Nhtsa,
        query_types: &[Vin],
        spec: AdapterSpec {
            result_fields: &["Results"],
            preferred_columns: &["ModelYear", "Make", "Model", "Trim", "VehicleType"],
            total_path: Some("Count"),
            ..AdapterSpec::DEFAULT
        },
    },
    VendorAdapter {
        id: VendorId::DiscordLookup,
        query_types: &[Discord],
        spec: AdapterSpec {
            shape: Shape::Single,
            merges: &[Merge::new("avatar", "avatar_"), Merge::new("banner", "banner_")],
            preferred_columns: &["id", "username", "global_name", "created_at", "badges"],
            ..AdapterSpec::DEFAULT
        },
    },
    VendorAdapter {
        id: VendorId::HashesCom,
        query_types: &[Hash],
        spec: AdapterSpec {
            result_fields: &["found"],
            preferred_columns: &["hash", "plaintext", "algorithm", "salt"],
            ..AdapterSpec::DEFAULT
        },
    },
];
