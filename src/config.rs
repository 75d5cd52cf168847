use crate::models::RuleKind;
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// Weight applied by each rule when it fires. All weights are additive;
/// negative values are unrepresentable and rejected at parse time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleWeights {
    pub domain_age_very_new: u32,
    pub domain_age_new: u32,
    pub domain_age_recent: u32,
    pub no_mx_records: u32,
    pub no_spf_records: u32,
    pub ssl_invalid: u32,
    pub ssl_self_signed: u32,
    pub risky_tld: u32,
    pub suspicious_keyword: u32,
    pub punycode_detected: u32,
    pub whois_lookup_failed: u32,
    pub dns_resolution_failed: u32,
    pub ssl_probe_failed: u32,
}

impl RuleWeights {
    /// Look up the weight for a rule. Exhaustive by construction: a new
    /// rule kind does not compile until it is given a weight here.
    pub fn weight(&self, rule: RuleKind) -> u32 {
        match rule {
            RuleKind::DomainAgeVeryNew => self.domain_age_very_new,
            RuleKind::DomainAgeNew => self.domain_age_new,
            RuleKind::DomainAgeRecent => self.domain_age_recent,
            RuleKind::NoMxRecords => self.no_mx_records,
            RuleKind::NoSpfRecords => self.no_spf_records,
            RuleKind::SslInvalid => self.ssl_invalid,
            RuleKind::SslSelfSigned => self.ssl_self_signed,
            RuleKind::RiskyTld => self.risky_tld,
            RuleKind::SuspiciousKeyword => self.suspicious_keyword,
            RuleKind::PunycodeDetected => self.punycode_detected,
            RuleKind::WhoisLookupFailed => self.whois_lookup_failed,
            RuleKind::DnsResolutionFailed => self.dns_resolution_failed,
            RuleKind::SslProbeFailed => self.ssl_probe_failed,
        }
    }
}

/// Ascending classification thresholds, used as inclusive lower bounds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskThresholds {
    pub low: u32,
    pub medium: u32,
    pub high: u32,
    pub critical: u32,
}

/// Per-collector timeouts in seconds. Consumed by the collectors, not the
/// engine, but validated together with the rest of the table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timeouts {
    pub dns: u64,
    pub whois: u64,
    pub ssl: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskConfig {
    pub risk_weights: RuleWeights,
    pub risk_thresholds: RiskThresholds,
    pub risky_tlds: Vec<String>,
    pub suspicious_keywords: Vec<String>,
    /// How many keyword rules may contribute score per analysis. Extra
    /// matches are still reported in the bundle.
    #[serde(default = "default_keyword_rule_cap")]
    pub max_scored_keywords: usize,
    pub timeouts: Timeouts,
}

fn default_keyword_rule_cap() -> usize {
    2
}

impl Default for RiskConfig {
    fn default() -> Self {
        RiskConfig {
            risk_weights: RuleWeights {
                domain_age_very_new: 25,
                domain_age_new: 15,
                domain_age_recent: 8,
                no_mx_records: 15,
                no_spf_records: 10,
                ssl_invalid: 20,
                ssl_self_signed: 15,
                risky_tld: 20,
                suspicious_keyword: 15,
                punycode_detected: 25,
                whois_lookup_failed: 10,
                dns_resolution_failed: 15,
                ssl_probe_failed: 5,
            },
            risk_thresholds: RiskThresholds {
                low: 0,
                medium: 30,
                high: 60,
                critical: 80,
            },
            risky_tlds: [".tk", ".ml", ".ga", ".cf", ".gq", ".xyz", ".top", ".club"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            suspicious_keywords: [
                "login", "signin", "account", "verify", "secure", "banking", "paypal", "amazon",
                "update", "confirm", "password", "wallet",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            max_scored_keywords: 2,
            timeouts: Timeouts {
                dns: 5,
                whois: 10,
                ssl: 10,
            },
        }
    }
}

impl RiskConfig {
    pub fn from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let mut config: RiskConfig = serde_yaml::from_str(content)?;
        config.normalize();
        config.validate()?;
        Ok(config)
    }

    pub fn to_file(&self, path: &str) -> Result<()> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Keyword and TLD matching is case-insensitive; store both lowercased.
    fn normalize(&mut self) {
        for keyword in &mut self.suspicious_keywords {
            *keyword = keyword.to_lowercase();
        }
        for tld in &mut self.risky_tlds {
            *tld = tld.to_lowercase();
        }
    }

    /// Reject the whole configuration on the first violated constraint.
    /// There is no degraded mode: either the table is fully valid or no
    /// analysis runs.
    pub fn validate(&self) -> Result<()> {
        let t = &self.risk_thresholds;
        if !(t.low < t.medium && t.medium < t.high && t.high < t.critical) {
            bail!(
                "risk thresholds must be strictly ascending (low {} < medium {} < high {} < critical {})",
                t.low,
                t.medium,
                t.high,
                t.critical
            );
        }
        if t.critical > 100 {
            bail!("critical threshold cannot exceed 100 (got {})", t.critical);
        }
        if self.suspicious_keywords.is_empty() {
            bail!("suspicious_keywords must not be empty");
        }
        if self.risky_tlds.is_empty() {
            bail!("risky_tlds must not be empty");
        }
        for tld in &self.risky_tlds {
            if !tld.starts_with('.') {
                bail!("risky TLD entry '{}' must start with '.'", tld);
            }
        }
        for (name, value) in [
            ("dns", self.timeouts.dns),
            ("whois", self.timeouts.whois),
            ("ssl", self.timeouts.ssl),
        ] {
            if value == 0 {
                bail!("{} timeout must be greater than zero", name);
            }
        }
        Ok(())
    }
}
