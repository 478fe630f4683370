//! Host normalization and classification against the rule tables.

use relink_core::{config::RulesConfig, error::RelinkError};
use std::collections::{HashMap, HashSet};
use url::Url;

/// What to do with one link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification<'a> {
    /// Host is (a subdomain of) a paywalled domain.
    Paywall,
    /// Host has a social mirror; swap the host for this one.
    Mirror(&'a str),
    /// Leave the link alone.
    Passthrough,
}

/// Immutable rule tables, built once at startup.
#[derive(Debug, Clone)]
pub struct RuleSet {
    paywall_domains: HashSet<String>,
    /// Original host → mirror host.
    mirror_for: HashMap<String, String>,
    redirector_base: String,
    link_text: String,
}

impl RuleSet {
    /// Build the rule tables from config, normalizing every entry.
    pub fn from_config(config: &RulesConfig) -> Result<Self, RelinkError> {
        if config.redirector_base.trim().is_empty() {
            return Err(RelinkError::Rules("redirector_base is empty".into()));
        }

        let mut paywall_domains = HashSet::new();
        for entry in &config.paywall_domains {
            let domain = normalize_entry(entry);
            if domain.is_empty() {
                return Err(RelinkError::Rules(format!(
                    "invalid paywall domain '{entry}'"
                )));
            }
            paywall_domains.insert(domain);
        }

        let mut mirror_for = HashMap::new();
        for (mirror, originals) in &config.mirrors {
            let mirror = mirror.trim().to_lowercase();
            if mirror.is_empty() {
                return Err(RelinkError::Rules("empty mirror host".into()));
            }
            for original in originals {
                let original = normalize_entry(original);
                if original.is_empty() {
                    return Err(RelinkError::Rules(format!(
                        "empty original host for mirror '{mirror}'"
                    )));
                }
                if let Some(previous) = mirror_for.insert(original.clone(), mirror.clone()) {
                    if previous != mirror {
                        return Err(RelinkError::Rules(format!(
                            "host '{original}' is mapped to both '{previous}' and '{mirror}'"
                        )));
                    }
                }
            }
        }

        Ok(Self {
            paywall_domains,
            mirror_for,
            redirector_base: config.redirector_base.trim().to_string(),
            link_text: config.link_text.clone(),
        })
    }

    pub fn redirector_base(&self) -> &str {
        &self.redirector_base
    }

    pub fn link_text(&self) -> &str {
        &self.link_text
    }

    pub fn paywall_count(&self) -> usize {
        self.paywall_domains.len()
    }

    pub fn mirror_count(&self) -> usize {
        self.mirror_for.len()
    }

    /// Whether the normalized host is a paywall domain or one of its subdomains.
    pub fn is_paywalled(&self, host: &str) -> bool {
        if self.paywall_domains.contains(host) {
            return true;
        }
        // Walk label-aligned suffixes: "a.b.nytimes.com" → "b.nytimes.com" → "nytimes.com".
        let mut rest = host;
        while let Some((_, suffix)) = rest.split_once('.') {
            if self.paywall_domains.contains(suffix) {
                return true;
            }
            rest = suffix;
        }
        false
    }

    /// Mirror host for an exact normalized host match.
    pub fn mirror_for(&self, host: &str) -> Option<&str> {
        self.mirror_for.get(host).map(String::as_str)
    }

    /// Classify a parsed URL. Paywall rules win over social rules.
    pub fn classify(&self, url: &Url) -> Classification<'_> {
        let Some(host) = url.host_str() else {
            return Classification::Passthrough;
        };
        let host = normalize_host(host);

        if self.is_paywalled(&host) {
            Classification::Paywall
        } else if let Some(mirror) = self.mirror_for(&host) {
            Classification::Mirror(mirror)
        } else {
            Classification::Passthrough
        }
    }
}

/// Lower-case a host and drop exactly one leading `www.`.
pub fn normalize_host(host: &str) -> String {
    let host = host.to_lowercase();
    match host.strip_prefix("www.") {
        Some(rest) => rest.to_string(),
        None => host,
    }
}

/// Normalize a rule-table entry: trim, lower-case, strip `www.` and stray dots.
fn normalize_entry(entry: &str) -> String {
    normalize_host(entry.trim())
        .trim_matches('.')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn rules() -> RuleSet {
        let mut mirrors = BTreeMap::new();
        mirrors.insert(
            "fixupx.com".to_string(),
            vec!["twitter.com".to_string(), "x.com".to_string()],
        );
        mirrors.insert("fxnews.example".to_string(), vec!["news.nytimes.com".to_string()]);
        RuleSet::from_config(&RulesConfig {
            redirector_base: "https://bypass.example/?u=".into(),
            link_text: "read".into(),
            paywall_domains: vec!["nytimes.com".into(), "WWW.FT.com".into()],
            mirrors,
        })
        .unwrap()
    }

    fn classify(rules: &RuleSet, link: &str) -> String {
        let url = Url::parse(link).unwrap();
        format!("{:?}", rules.classify(&url))
    }

    #[test]
    fn test_normalize_host() {
        assert_eq!(normalize_host("www.NYTimes.com"), "nytimes.com");
        assert_eq!(normalize_host("www.www.x.com"), "www.x.com");
        assert_eq!(normalize_host("mobile.x.com"), "mobile.x.com");
    }

    #[test]
    fn test_paywall_exact_and_suffix() {
        let r = rules();
        assert!(r.is_paywalled("nytimes.com"));
        assert!(r.is_paywalled("cooking.nytimes.com"));
        assert!(r.is_paywalled("a.b.nytimes.com"));
        assert!(r.is_paywalled("ft.com"));
    }

    #[test]
    fn test_paywall_suffix_must_align_on_label() {
        let r = rules();
        assert!(!r.is_paywalled("notnytimes.com"));
        assert!(!r.is_paywalled("nytimes.com.evil.org"));
        assert!(!r.is_paywalled("soft.com"));
    }

    #[test]
    fn test_classify_strips_www() {
        let r = rules();
        assert_eq!(classify(&r, "https://www.nytimes.com/x"), "Paywall");
        assert_eq!(
            classify(&r, "https://www.twitter.com/foo"),
            "Mirror(\"fixupx.com\")"
        );
    }

    #[test]
    fn test_social_is_exact_only() {
        let r = rules();
        assert_eq!(classify(&r, "https://x.com/a"), "Mirror(\"fixupx.com\")");
        assert_eq!(classify(&r, "https://mobile.twitter.com/a"), "Passthrough");
    }

    #[test]
    fn test_paywall_takes_precedence_over_social() {
        let r = rules();
        assert_eq!(classify(&r, "https://news.nytimes.com/a"), "Paywall");
    }

    #[test]
    fn test_unmatched_and_hostless() {
        let r = rules();
        assert_eq!(classify(&r, "https://example.org/"), "Passthrough");
        assert_eq!(classify(&r, "mailto:someone@nytimes.com"), "Passthrough");
    }

    #[test]
    fn test_from_config_rejects_bad_tables() {
        let mut cfg = RulesConfig::default();
        cfg.paywall_domains.push("  ".into());
        assert!(RuleSet::from_config(&cfg).is_err());

        let mut cfg = RulesConfig::default();
        cfg.redirector_base = String::new();
        assert!(RuleSet::from_config(&cfg).is_err());

        let mut cfg = RulesConfig::default();
        cfg.mirrors
            .insert("vxtwitter.com".into(), vec!["twitter.com".into()]);
        assert!(RuleSet::from_config(&cfg).is_err());
    }

    #[test]
    fn test_default_tables_load() {
        let r = RuleSet::from_config(&RulesConfig::default()).unwrap();
        assert!(r.paywall_count() > 10);
        assert_eq!(r.mirror_for("x.com"), Some("fixupx.com"));
        assert_eq!(r.mirror_for("instagram.com"), Some("ddinstagram.com"));
    }
}
