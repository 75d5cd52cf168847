use serde::{Deserialize, Serialize};

/// Normalized per-domain observation set. Populated by the collectors,
/// consumed by the risk engine. Immutable once built.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalBundle {
    pub domain: String,

    // Infrastructure signals. `age_days` is None when the WHOIS lookup
    // failed or returned no creation date; the errors list tells which.
    pub age_days: Option<u32>,
    #[serde(default)]
    pub has_mx: bool,
    #[serde(default)]
    pub has_spf: bool,
    #[serde(default)]
    pub ssl_valid: bool,
    #[serde(default)]
    pub is_self_signed: bool,

    // Lexical signals
    #[serde(default)]
    pub triggered_keywords: Vec<String>,
    #[serde(default)]
    pub risky_tld: bool,
    #[serde(default)]
    pub is_punycode: bool,

    // One entry per failed collection step, e.g. "WHOIS: query timeout".
    // Append-only; never cleared.
    #[serde(default)]
    pub errors: Vec<String>,
}

impl SignalBundle {
    pub fn new(domain: impl Into<String>) -> Self {
        SignalBundle {
            domain: domain.into(),
            ..Default::default()
        }
    }
}

/// Closed set of scoring rules. Adding a variant forces every weight and
/// evaluator site to handle it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    DomainAgeVeryNew,
    DomainAgeNew,
    DomainAgeRecent,
    NoMxRecords,
    NoSpfRecords,
    SslInvalid,
    SslSelfSigned,
    RiskyTld,
    SuspiciousKeyword,
    PunycodeDetected,
    WhoisLookupFailed,
    DnsResolutionFailed,
    SslProbeFailed,
}

impl RuleKind {
    /// Stable rule identifier, identical to the serialized form.
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleKind::DomainAgeVeryNew => "domain_age_very_new",
            RuleKind::DomainAgeNew => "domain_age_new",
            RuleKind::DomainAgeRecent => "domain_age_recent",
            RuleKind::NoMxRecords => "no_mx_records",
            RuleKind::NoSpfRecords => "no_spf_records",
            RuleKind::SslInvalid => "ssl_invalid",
            RuleKind::SslSelfSigned => "ssl_self_signed",
            RuleKind::RiskyTld => "risky_tld",
            RuleKind::SuspiciousKeyword => "suspicious_keyword",
            RuleKind::PunycodeDetected => "punycode_detected",
            RuleKind::WhoisLookupFailed => "whois_lookup_failed",
            RuleKind::DnsResolutionFailed => "dns_resolution_failed",
            RuleKind::SslProbeFailed => "ssl_probe_failed",
        }
    }
}

impl std::fmt::Display for RuleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One fired rule with its applied weight and a human-readable reason.
/// Non-firing rules are omitted from results entirely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggeredRule {
    pub rule: RuleKind,
    pub triggered: bool,
    pub weight: u32,
    pub justification: String,
}

impl TriggeredRule {
    pub fn new(rule: RuleKind, weight: u32, justification: String) -> Self {
        TriggeredRule {
            rule,
            triggered: true,
            weight,
            justification,
        }
    }
}

/// Ordinal risk band derived from the score via configured thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
            RiskLevel::Critical => "Critical",
        };
        write!(f, "{label}")
    }
}

/// Final assessment: score, band, the rules that fired (in evaluation
/// order), advisory pattern annotations, and the bundle that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskResult {
    pub domain: String,
    pub score: u32,
    pub classification: RiskLevel,
    pub triggered_rules: Vec<TriggeredRule>,
    // Composite signatures over the same bundle. Explanatory only; their
    // component rules are already weighted above, so they carry no score.
    #[serde(default)]
    pub patterns: Vec<String>,
    pub intelligence: SignalBundle,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rule_kind_serializes_as_snake_case_identifier() {
        let json = serde_json::to_string(&RuleKind::DomainAgeVeryNew).unwrap();
        assert_eq!(json, "\"domain_age_very_new\"");
        let json = serde_json::to_string(&RuleKind::SslProbeFailed).unwrap();
        assert_eq!(json, "\"ssl_probe_failed\"");
    }

    #[test]
    fn risk_levels_are_ordered() {
        assert!(RiskLevel::Low < RiskLevel::Medium);
        assert!(RiskLevel::Medium < RiskLevel::High);
        assert!(RiskLevel::High < RiskLevel::Critical);
    }

    #[test]
    fn risk_level_serializes_as_band_name() {
        assert_eq!(
            serde_json::to_string(&RiskLevel::Critical).unwrap(),
            "\"Critical\""
        );
    }
}
