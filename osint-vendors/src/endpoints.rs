//! Request templates for every vendor
//!
//! Templates use three placeholders: `{value}` (the normalized query
//! value), `{type}` (the vendor's name for the query type) and `{key}`
//! (the API key). Placeholders in URLs are percent-encoded; JSON and form
//! bodies carry them verbatim.

use osint_core::{QueryType, VendorId};

use QueryType::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

/// How the API key reaches the vendor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Auth {
    /// Public endpoint
    None,
    /// `<header>: <key>`
    Header(&'static str),
    /// `Authorization: Bearer <key>`
    Bearer,
    /// HTTP basic auth with the account user and the key as password
    Basic,
    /// Account user and key in two separate headers
    HeaderPair {
        user: &'static str,
        key: &'static str,
    },
    /// The key is placed through `{key}` in the URL or body
    Template,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyTemplate {
    None,
    /// JSON document; string leaves are filled in after parsing
    Json(&'static str),
    /// `application/x-www-form-urlencoded` fields
    Form(&'static [(&'static str, &'static str)]),
}

/// Environment variables holding a vendor's credentials
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CredentialEnv {
    pub key: &'static str,
    /// Account name or email for vendors that pair it with the key
    pub user: Option<&'static str>,
    /// Whether the endpoint refuses anonymous requests
    pub required: bool,
}

impl CredentialEnv {
    const fn key(key: &'static str) -> Self {
        Self {
            key,
            user: None,
            required: true,
        }
    }

    const fn optional(key: &'static str) -> Self {
        Self {
            key,
            user: None,
            required: false,
        }
    }

    const fn pair(user: &'static str, key: &'static str) -> Self {
        Self {
            key,
            user: Some(user),
            required: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoint {
    pub vendor: VendorId,
    pub method: HttpMethod,
    pub url: &'static str,
    pub auth: Auth,
    pub credentials: Option<CredentialEnv>,
    pub body: BodyTemplate,
    /// Fixed headers sent with every request
    pub headers: &'static [(&'static str, &'static str)],
    /// Vendor spelling of query types that differ from [`QueryType::as_str`]
    pub type_names: &'static [(QueryType, &'static str)],
}

impl Endpoint {
    const fn get(vendor: VendorId, url: &'static str) -> Self {
        Self {
            vendor,
            method: HttpMethod::Get,
            url,
            auth: Auth::None,
            credentials: None,
            body: BodyTemplate::None,
            headers: &[],
            type_names: &[],
        }
    }

    const fn post(vendor: VendorId, url: &'static str, body: BodyTemplate) -> Self {
        Self {
            method: HttpMethod::Post,
            body,
            ..Self::get(vendor, url)
        }
    }

    /// The vendor's name for a query type
    pub fn type_name(&self, query_type: QueryType) -> &'static str {
        self.type_names
            .iter()
            .find(|(qt, _)| *qt == query_type)
            .map(|(_, name)| *name)
            .unwrap_or_else(|| query_type.as_str())
    }

    /// Look up the endpoint for a vendor
    pub fn for_vendor(vendor: VendorId) -> &'static Endpoint {
        // The table is kept in `VendorId::ALL` order
        &ENDPOINTS[vendor as usize]
    }
}

const RAPIDAPI: CredentialEnv = CredentialEnv::key("RAPIDAPI_KEY");

pub static ENDPOINTS: [Endpoint; 23] = [
    Endpoint {
        auth: Auth::Header("Auth"),
        credentials: Some(CredentialEnv::key("SNUSBASE_API_KEY")),
        headers: &[("Content-Type", "application/json")],
        type_names: &[(Ip, "lastip")],
        ..Endpoint::post(
            VendorId::Snusbase,
            "https://api.snusbase.com/data/search",
            BodyTemplate::Json(r#"{"terms":["{value}"],"types":["{type}"],"wildcard":false}"#),
        )
    },
    Endpoint {
        auth: Auth::Header("X-API-Key"),
        credentials: Some(CredentialEnv::key("LEAKCHECK_API_KEY")),
        type_names: &[(Hash, "hash"), (Password, "pass_plaintext")],
        ..Endpoint::get(
            VendorId::LeakCheck,
            "https://leakcheck.io/api/v2/query/{value}?type={type}",
        )
    },
    Endpoint {
        auth: Auth::Header("X-RapidAPI-Key"),
        credentials: Some(RAPIDAPI),
        headers: &[("X-RapidAPI-Host", "breachdirectory.p.rapidapi.com")],
        ..Endpoint::get(
            VendorId::BreachDirectory,
            "https://breachdirectory.p.rapidapi.com/?func=auto&term={value}",
        )
    },
    Endpoint {
        auth: Auth::Basic,
        credentials: Some(CredentialEnv::pair("DEHASHED_EMAIL", "DEHASHED_API_KEY")),
        headers: &[("Accept", "application/json")],
        type_names: &[(Ip, "ip_address"), (Hash, "hashed_password")],
        ..Endpoint::get(
            VendorId::Dehashed,
            "https://api.dehashed.com/search?query={type}:%22{value}%22&size=10000",
        )
    },
    Endpoint {
        auth: Auth::Template,
        credentials: Some(CredentialEnv::key("LEAKOSINT_API_KEY")),
        ..Endpoint::post(
            VendorId::LeakOsint,
            "https://leakosintapi.com/",
            BodyTemplate::Json(
                r#"{"token":"{key}","request":"{value}","limit":100,"lang":"en"}"#,
            ),
        )
    },
    Endpoint {
        auth: Auth::Template,
        credentials: Some(CredentialEnv::key("LEAKLOOKUP_API_KEY")),
        type_names: &[
            (Email, "email_address"),
            (Ip, "ipaddress"),
            (Name, "fullname"),
        ],
        ..Endpoint::post(
            VendorId::LeakLookup,
            "https://leak-lookup.com/api/search",
            BodyTemplate::Form(&[("key", "{key}"), ("type", "{type}"), ("query", "{value}")]),
        )
    },
    Endpoint {
        auth: Auth::Template,
        credentials: Some(CredentialEnv::key("HACKCHECK_API_KEY")),
        ..Endpoint::get(
            VendorId::HackCheck,
            "https://api.hackcheck.io/search/{key}/{type}/{value}",
        )
    },
    Endpoint {
        auth: Auth::Header("x-api-key"),
        credentials: Some(CredentialEnv::key("OATHNET_API_KEY")),
        ..Endpoint::get(
            VendorId::Oathnet,
            "https://oathnet.org/api/service/search-breach?q={value}&type={type}",
        )
    },
    Endpoint {
        auth: Auth::Bearer,
        credentials: Some(CredentialEnv::key("INF0SEC_API_KEY")),
        ..Endpoint::get(
            VendorId::Inf0sec,
            "https://api.inf0sec.net/v1/leaks?query={value}&type={type}",
        )
    },
    Endpoint::get(
        VendorId::HudsonRock,
        "https://cavalier.hudsonrock.com/api/json/v2/osint-tools/search-by-{type}?{type}={value}",
    ),
    Endpoint {
        auth: Auth::Header("api-key"),
        credentials: Some(CredentialEnv::key("OSINT_INDUSTRIES_API_KEY")),
        headers: &[
            ("Content-Type", "application/json"),
            ("Accept", "text/event-stream"),
        ],
        ..Endpoint::post(
            VendorId::OsintIndustries,
            "https://api.osint.industries/v2/request-streaming",
            BodyTemplate::Json(r#"{"type":"{type}","query":"{value}","timeout":60}"#),
        )
    },
    Endpoint {
        auth: Auth::Header("X-API-KEY"),
        credentials: Some(CredentialEnv::key("SEON_API_KEY")),
        ..Endpoint::get(
            VendorId::Seon,
            "https://api.seon.io/SeonRestService/{type}-api/v2/{value}",
        )
    },
    Endpoint {
        auth: Auth::Template,
        credentials: Some(CredentialEnv::key("SHODAN_API_KEY")),
        ..Endpoint::get(
            VendorId::Shodan,
            "https://api.shodan.io/shodan/host/{value}?key={key}",
        )
    },
    Endpoint {
        auth: Auth::Bearer,
        credentials: Some(CredentialEnv::optional("IPINFO_TOKEN")),
        ..Endpoint::get(VendorId::IpInfo, "https://ipinfo.io/{value}/json")
    },
    Endpoint {
        auth: Auth::Template,
        credentials: Some(CredentialEnv::key("IPQS_API_KEY")),
        ..Endpoint::get(
            VendorId::IpQualityScore,
            "https://ipqualityscore.com/api/json/{type}/{key}/{value}",
        )
    },
    Endpoint {
        auth: Auth::Header("x-apikey"),
        credentials: Some(CredentialEnv::key("VIRUSTOTAL_API_KEY")),
        type_names: &[(Domain, "domains"), (Ip, "ip_addresses"), (Hash, "files")],
        ..Endpoint::get(
            VendorId::VirusTotal,
            "https://www.virustotal.com/api/v3/{type}/{value}",
        )
    },
    Endpoint {
        auth: Auth::Template,
        credentials: Some(CredentialEnv::key("HUNTER_API_KEY")),
        ..Endpoint::get(
            VendorId::Hunter,
            "https://api.hunter.io/v2/domain-search?domain={value}&api_key={key}",
        )
    },
    Endpoint {
        auth: Auth::Template,
        credentials: Some(CredentialEnv::key("WHOISXML_API_KEY")),
        ..Endpoint::get(
            VendorId::WhoisXml,
            "https://www.whoisxmlapi.com/whoisserver/WhoisService?domainName={value}&outputFormat=JSON&apiKey={key}",
        )
    },
    Endpoint {
        auth: Auth::HeaderPair {
            user: "galaxy-ap-name",
            key: "galaxy-ap-password",
        },
        credentials: Some(CredentialEnv::pair("ENDATO_API_NAME", "ENDATO_API_PASSWORD")),
        headers: &[
            ("galaxy-search-type", "Person"),
            ("Content-Type", "application/json"),
        ],
        type_names: &[
            (Name, "FullName"),
            (Phone, "Phone"),
            (Email, "Email"),
            (Address, "AddressLine1"),
        ],
        ..Endpoint::post(
            VendorId::Endato,
            "https://devapi.endato.com/PersonSearch",
            BodyTemplate::Json(r#"{"{type}":"{value}"}"#),
        )
    },
    Endpoint {
        auth: Auth::Template,
        credentials: Some(CredentialEnv::key("VINAUDIT_API_KEY")),
        ..Endpoint::get(
            VendorId::VinAudit,
            "https://specifications.vinaudit.com/v3/specifications?format=json&key={key}&vin={value}",
        )
    },
    Endpoint::get(
        VendorId::Nhtsa,
        "https://vpic.nhtsa.dot.gov/api/vehicles/DecodeVinValues/{value}?format=json",
    ),
    Endpoint::get(
        VendorId::DiscordLookup,
        "https://discordlookup.mesalytic.moe/v1/user/{value}",
    ),
    Endpoint {
        auth: Auth::Template,
        credentials: Some(CredentialEnv::key("HASHES_API_KEY")),
        ..Endpoint::post(
            VendorId::HashesCom,
            "https://hashes.com/en/api/search",
            BodyTemplate::Form(&[("key", "{key}"), ("hashes[]", "{value}")]),
        )
    },
];
