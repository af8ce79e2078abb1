//! Cross-origin access decisions.
//!
//! The policy is built once from configuration and only read afterwards.
//! Credentials can only be enabled on the allow-list variants: there is no
//! way to construct a wildcard or reflecting policy that also sends
//! `Access-Control-Allow-Credentials: true`.

use thiserror::Error;

use crate::config::{split_list, CorsSection};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PolicyError {
    #[error("unknown CORS policy `{0}` (expected exact, suffix, wildcard or reflect)")]
    Unknown(String),
    #[error("CORS policy `{0}` cannot allow credentials; use exact or suffix")]
    CredentialsNotAllowed(String),
    #[error("CORS policy `suffix` needs at least one trusted suffix")]
    NoSuffixes,
}

/// Literal origins a deployment trusts, in configured order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowList {
    origins: Vec<String>,
    credentials: bool,
}

impl AllowList {
    pub fn new<I, S>(origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let origins = origins
            .into_iter()
            .map(|o| o.as_ref().trim().trim_end_matches('/').to_ascii_lowercase())
            .filter(|o| !o.is_empty())
            .collect();
        Self { origins, credentials: false }
    }

    pub fn with_credentials(mut self) -> Self {
        self.credentials = true;
        self
    }

    pub fn contains(&self, origin: &str) -> bool {
        self.origins.iter().any(|o| o.eq_ignore_ascii_case(origin))
    }

    pub fn origins(&self) -> &[String] { &self.origins }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OriginPolicy {
    /// Grant only literal members of the list.
    Exact(AllowList),
    /// Grant literal members and any origin whose host ends with a trusted suffix.
    Suffix { list: AllowList, suffixes: Vec<String> },
    /// `Access-Control-Allow-Origin: *`, never with credentials.
    Wildcard,
    /// Echo the caller's origin back, never with credentials.
    Reflect,
}

/// Header values to attach for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorsDecision {
    pub allow_origin: Option<String>,
    pub allow_credentials: bool,
}

impl OriginPolicy {
    pub fn from_config(cors: &CorsSection) -> Result<Self, PolicyError> {
        let mut list = AllowList::new(split_list(&cors.allowed_origins));
        let name = cors.policy.trim().to_ascii_lowercase();
        match name.as_str() {
            "exact" | "suffix" if cors.allow_credentials => list = list.with_credentials(),
            "wildcard" | "reflect" if cors.allow_credentials => return Err(PolicyError::CredentialsNotAllowed(name.clone())),
            _ => {}
        }
        match name.as_str() {
            "exact" => Ok(Self::Exact(list)),
            "suffix" => {
                let suffixes: Vec<String> = split_list(&cors.trusted_suffixes)
                    .into_iter()
                    .map(|s| s.to_ascii_lowercase())
                    .collect();
                if suffixes.is_empty() {
                    return Err(PolicyError::NoSuffixes);
                }
                Ok(Self::Suffix { list, suffixes })
            }
            "wildcard" => Ok(Self::Wildcard),
            "reflect" => Ok(Self::Reflect),
            _ => Err(PolicyError::Unknown(name.clone())),
        }
    }

    pub fn decide(&self, origin: Option<&str>) -> CorsDecision {
        let deny = CorsDecision { allow_origin: None, allow_credentials: false };
        match self {
            Self::Wildcard => CorsDecision { allow_origin: Some("*".into()), allow_credentials: false },
            Self::Reflect => CorsDecision { allow_origin: origin.map(String::from), allow_credentials: false },
            Self::Exact(list) => match origin {
                Some(o) if list.contains(o) => grant(o, list),
                _ => deny,
            },
            Self::Suffix { list, suffixes } => match origin {
                Some(o) if list.contains(o) || host_has_suffix(o, suffixes) => grant(o, list),
                _ => deny,
            },
        }
    }

    /// Whether the response differs per `Origin` and caches must key on it.
    pub fn varies_by_origin(&self) -> bool {
        !matches!(self, Self::Wildcard)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Exact(_) => "exact",
            Self::Suffix { .. } => "suffix",
            Self::Wildcard => "wildcard",
            Self::Reflect => "reflect",
        }
    }
}

fn grant(origin: &str, list: &AllowList) -> CorsDecision {
    CorsDecision { allow_origin: Some(origin.to_string()), allow_credentials: list.credentials }
}

// Compares against the host only, so a suffix can't be smuggled in via a path.
fn host_has_suffix(origin: &str, suffixes: &[String]) -> bool {
    let Some((scheme, rest)) = origin.split_once("://") else { return false };
    if scheme != "https" && scheme != "http" {
        return false;
    }
    if rest.contains(&['/', '?', '#', '@'][..]) {
        return false;
    }
    let host = rest.rsplit_once(':').map_or(rest, |(h, _)| h).to_ascii_lowercase();
    suffixes.iter().any(|suffix| {
        if suffix.starts_with('.') {
            host.ends_with(suffix.as_str()) && host.len() > suffix.len()
        } else {
            host == *suffix || host.ends_with(&format!(".{suffix}"))
        }
    })
}
