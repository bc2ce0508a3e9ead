//! Vendor credentials loaded from the environment

use std::collections::HashMap;
use std::env;
use std::fmt;

use osint_core::VendorId;

use crate::endpoints::{Endpoint, ENDPOINTS};

/// API key plus the optional account name some vendors pair it with
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub key: String,
    pub user: Option<String>,
}

impl Credential {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            user: None,
        }
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }
}

// Keys never reach logs
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("key", &"<redacted>")
            .field("user", &self.user)
            .finish()
    }
}

/// Credentials for every configured vendor
#[derive(Debug, Clone, Default)]
pub struct VendorCredentials {
    by_vendor: HashMap<VendorId, Credential>,
}

impl VendorCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load credentials from environment variables
    ///
    /// Each endpoint names its own variables (e.g. `SNUSBASE_API_KEY`,
    /// `DEHASHED_EMAIL` + `DEHASHED_API_KEY`). Vendors whose variables are
    /// unset or empty are simply left unconfigured.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load credentials through an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let mut by_vendor = HashMap::new();
        for endpoint in &ENDPOINTS {
            let Some(vars) = endpoint.credentials else {
                continue;
            };
            let Some(key) = read(vars.key) else {
                continue;
            };
            let mut credential = Credential::new(key);
            if let Some(user_var) = vars.user {
                match read(user_var) {
                    Some(user) => credential = credential.with_user(user),
                    None => continue,
                }
            }
            by_vendor.insert(endpoint.vendor, credential);
        }

        Self { by_vendor }
    }

    /// Set or replace a vendor's credential
    pub fn with(mut self, vendor: VendorId, credential: Credential) -> Self {
        self.by_vendor.insert(vendor, credential);
        self
    }

    pub fn get(&self, vendor: VendorId) -> Option<&Credential> {
        self.by_vendor.get(&vendor)
    }

    /// Whether a vendor can be queried: it either has a credential or
    /// does not need one
    pub fn is_configured(&self, vendor: VendorId) -> bool {
        match Endpoint::for_vendor(vendor).credentials {
            Some(vars) if vars.required => self.by_vendor.contains_key(&vendor),
            _ => true,
        }
    }

    /// Vendors that can be queried, in catalogue order
    pub fn configured_vendors(&self) -> Vec<VendorId> {
        VendorId::ALL
            .into_iter()
            .filter(|v| self.is_configured(*v))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(vars: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        move |name| {
            vars.iter()
                .find(|(k, _)| *k == name)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn test_from_lookup_reads_keys() {
        let creds = VendorCredentials::from_lookup(lookup(&[
            ("SNUSBASE_API_KEY", "sb-key"),
            ("SHODAN_API_KEY", "  "),
        ]));

        assert_eq!(creds.get(VendorId::Snusbase), Some(&Credential::new("sb-key")));
        assert!(creds.get(VendorId::Shodan).is_none());
        assert!(!creds.is_configured(VendorId::Shodan));
    }

    #[test]
    fn test_paired_credentials_need_both_halves() {
        let half = VendorCredentials::from_lookup(lookup(&[("DEHASHED_API_KEY", "k")]));
        assert!(!half.is_configured(VendorId::Dehashed));

        let both = VendorCredentials::from_lookup(lookup(&[
            ("DEHASHED_API_KEY", "k"),
            ("DEHASHED_EMAIL", "me@x.com"),
        ]));
        assert_eq!(
            both.get(VendorId::Dehashed).and_then(|c| c.user.as_deref()),
            Some("me@x.com")
        );
    }

    #[test]
    fn test_public_vendors_are_always_configured() {
        let creds = VendorCredentials::new();
        assert!(creds.is_configured(VendorId::Nhtsa));
        assert!(creds.is_configured(VendorId::IpInfo));
        assert!(!creds.is_configured(VendorId::Snusbase));
        assert!(creds.configured_vendors().contains(&VendorId::HudsonRock));
    }

    #[test]
    fn test_debug_redacts_key() {
        let rendered = format!("{:?}", Credential::new("secret"));
        assert!(!rendered.contains("secret"));
    }
}
