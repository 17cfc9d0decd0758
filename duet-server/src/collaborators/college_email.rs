use crate::collaborators::identity::{IdentityVerifier, Verification};
use crate::config::CollegeDomainConfig;
use crate::error::{CollaboratorError, ConfigError};
use async_trait::async_trait;
use regex::Regex;
use std::collections::HashSet;
use tracing::debug;

const DEFAULT_COLLEGE_SUFFIXES: &[&str] = &[
    "edu",
    "edu.in",
    "ac.uk",
    "ac.in",
    "edu.au",
    "edu.cn",
    "adypu.edu.in",
];

const EMAIL_SHAPE: &str = r"^[^\s@]+@[^\s@]+\.[^\s@]{2,}$";

/// Accepts any address on an academic domain.
///
/// An address qualifies when its domain ends in one of the default academic
/// suffixes or a configured extra suffix (on a label boundary), or equals one
/// of the configured known domains.
#[derive(Debug, Clone)]
pub struct CollegeDomainVerifier {
    /// Longest first, without a leading dot.
    suffixes: Vec<String>,
    known_domains: HashSet<String>,
    email_shape: Regex,
}

impl CollegeDomainVerifier {
    pub fn new(config: &CollegeDomainConfig) -> Result<Self, ConfigError> {
        let mut suffixes: Vec<String> = DEFAULT_COLLEGE_SUFFIXES
            .iter()
            .map(|s| (*s).to_owned())
            .chain(config.extra_suffixes.iter().map(|s| normalize_suffix(s)))
            .filter(|s| !s.is_empty())
            .collect();
        suffixes.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        suffixes.dedup();

        let known_domains = config
            .known_domains
            .iter()
            .map(|d| d.trim().to_lowercase())
            .filter(|d| !d.is_empty())
            .collect();

        Ok(Self {
            suffixes,
            known_domains,
            email_shape: Regex::new(EMAIL_SHAPE)?,
        })
    }

    pub fn is_college_email(&self, email: &str) -> bool {
        self.college_domain(email).is_some()
    }

    /// Human-readable college label derived from the address, e.g.
    /// `"Stanford"` for `someone@cs.stanford.edu`.
    pub fn college_name(&self, email: &str) -> Option<String> {
        let domain = self.college_domain(email)?;
        let base = match self.matched_suffix(&domain) {
            Some(suffix) => domain[..domain.len() - suffix.len()].trim_end_matches('.'),
            None => domain.as_str(),
        };
        let base = if base.is_empty() { domain.as_str() } else { base };
        let label = base.rsplit('.').next().unwrap_or(base);

        let friendly = label
            .split(['-', '_'])
            .filter(|word| !word.is_empty())
            .map(capitalize)
            .collect::<Vec<_>>()
            .join(" ");

        if friendly.is_empty() {
            Some(domain)
        } else {
            Some(friendly)
        }
    }

    fn college_domain(&self, email: &str) -> Option<String> {
        let email = email.trim().to_lowercase();
        if !self.email_shape.is_match(&email) {
            return None;
        }
        let (_, domain) = email.split_once('@')?;

        if self.matched_suffix(domain).is_some() || self.known_domains.contains(domain) {
            Some(domain.to_owned())
        } else {
            None
        }
    }

    fn matched_suffix(&self, domain: &str) -> Option<&str> {
        self.suffixes
            .iter()
            .find(|suffix| {
                domain == suffix.as_str()
                    || domain
                        .strip_suffix(suffix.as_str())
                        .is_some_and(|rest| rest.ends_with('.'))
            })
            .map(String::as_str)
    }
}

#[async_trait]
impl IdentityVerifier for CollegeDomainVerifier {
    async fn verify(&self, email: &str, name: &str) -> Result<Verification, CollaboratorError> {
        match self.college_name(email) {
            Some(college) => {
                debug!(%college, "College e-mail accepted");
                Ok(Verification::verified(name.trim()))
            }
            None => Ok(Verification::unverified()),
        }
    }
}

fn normalize_suffix(suffix: &str) -> String {
    suffix.trim().trim_start_matches('.').to_lowercase()
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
