//! Query types and request-construction validation

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use std::sync::LazyLock;

use crate::{OsintError, OsintResult};

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email pattern")
});

static DOMAIN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?i)([a-z0-9]([a-z0-9-]{0,61}[a-z0-9])?\.)+[a-z]{2,63}$")
        .expect("valid domain pattern")
});

static VIN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?i)[A-HJ-NPR-Z0-9]{17}$").expect("valid VIN pattern"));

/// Search attributes a vendor can be queried by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryType {
    Email,
    Username,
    Password,
    Phone,
    Ip,
    Domain,
    Name,
    Ssn,
    Address,
    Vin,
    Discord,
    Hash,
}

impl QueryType {
    pub const ALL: [QueryType; 12] = [
        QueryType::Email,
        QueryType::Username,
        QueryType::Password,
        QueryType::Phone,
        QueryType::Ip,
        QueryType::Domain,
        QueryType::Name,
        QueryType::Ssn,
        QueryType::Address,
        QueryType::Vin,
        QueryType::Discord,
        QueryType::Hash,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            QueryType::Email => "email",
            QueryType::Username => "username",
            QueryType::Password => "password",
            QueryType::Phone => "phone",
            QueryType::Ip => "ip",
            QueryType::Domain => "domain",
            QueryType::Name => "name",
            QueryType::Ssn => "ssn",
            QueryType::Address => "address",
            QueryType::Vin => "vin",
            QueryType::Discord => "discord",
            QueryType::Hash => "hash",
        }
    }

    /// Human readable label
    pub fn label(&self) -> &'static str {
        match self {
            QueryType::Email => "Email",
            QueryType::Username => "Username",
            QueryType::Password => "Password",
            QueryType::Phone => "Phone",
            QueryType::Ip => "IP Address",
            QueryType::Domain => "Domain",
            QueryType::Name => "Full Name",
            QueryType::Ssn => "SSN",
            QueryType::Address => "Address",
            QueryType::Vin => "VIN",
            QueryType::Discord => "Discord ID",
            QueryType::Hash => "Hash",
        }
    }

    /// Check that `value` is well-formed for this query type.
    ///
    /// Returns the value in the form vendors expect (trimmed, digits only
    /// for phone/SSN, upper-case VIN, lower-case hash).
    pub fn normalize_value(&self, value: &str) -> OsintResult<String> {
        let value = value.trim();
        if value.is_empty() {
            return Err(OsintError::invalid_query(format!(
                "{} must not be empty",
                self.label()
            )));
        }

        let invalid = || {
            OsintError::invalid_query(format!("'{}' is not a valid {}", value, self.label()))
        };

        match self {
            QueryType::Email => {
                if EMAIL_RE.is_match(value) {
                    Ok(value.to_string())
                } else {
                    Err(invalid())
                }
            }
            QueryType::Ip => value
                .parse::<IpAddr>()
                .map(|ip| ip.to_string())
                .map_err(|_| invalid()),
            QueryType::Domain => {
                let domain = value.trim_end_matches('.').to_lowercase();
                if DOMAIN_RE.is_match(&domain) {
                    Ok(domain)
                } else {
                    Err(invalid())
                }
            }
            QueryType::Phone => {
                let digits: String = value.chars().filter(|c| c.is_ascii_digit()).collect();
                let allowed = value
                    .chars()
                    .all(|c| c.is_ascii_digit() || " +-().".contains(c));
                if allowed && (7..=15).contains(&digits.len()) {
                    Ok(digits)
                } else {
                    Err(invalid())
                }
            }
            QueryType::Ssn => {
                let digits: String = value.chars().filter(|c| c.is_ascii_digit()).collect();
                let allowed = value.chars().all(|c| c.is_ascii_digit() || c == '-');
                if allowed && digits.len() == 9 {
                    Ok(digits)
                } else {
                    Err(invalid())
                }
            }
            QueryType::Vin => {
                if VIN_RE.is_match(value) {
                    Ok(value.to_uppercase())
                } else {
                    Err(invalid())
                }
            }
            QueryType::Discord => {
                let snowflake = value.len() >= 17
                    && value.len() <= 20
                    && value.chars().all(|c| c.is_ascii_digit());
                if snowflake {
                    Ok(value.to_string())
                } else {
                    Err(invalid())
                }
            }
            QueryType::Hash => {
                let hex = value.chars().all(|c| c.is_ascii_hexdigit());
                if hex && matches!(value.len(), 32 | 40 | 64 | 128) {
                    Ok(value.to_lowercase())
                } else {
                    Err(invalid())
                }
            }
            QueryType::Username | QueryType::Password | QueryType::Name | QueryType::Address => {
                Ok(value.to_string())
            }
        }
    }
}

impl fmt::Display for QueryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for QueryType {
    type Err = OsintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "email" => Ok(QueryType::Email),
            "username" | "user" => Ok(QueryType::Username),
            "password" => Ok(QueryType::Password),
            "phone" => Ok(QueryType::Phone),
            "ip" | "lastip" => Ok(QueryType::Ip),
            "domain" => Ok(QueryType::Domain),
            "name" => Ok(QueryType::Name),
            "ssn" => Ok(QueryType::Ssn),
            "address" => Ok(QueryType::Address),
            "vin" => Ok(QueryType::Vin),
            "discord" => Ok(QueryType::Discord),
            "hash" => Ok(QueryType::Hash),
            _ => Err(OsintError::invalid_query(format!("Unknown query type: {}", s))),
        }
    }
}

/// A validated query value paired with its type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub value: String,
    pub query_type: QueryType,
}

impl SearchQuery {
    /// Build a query, rejecting values that do not fit the query type
    pub fn new(value: &str, query_type: QueryType) -> OsintResult<Self> {
        let value = query_type.normalize_value(value)?;
        Ok(Self { value, query_type })
    }
}
