use crate::config::{RiskConfig, RiskThresholds};
use crate::models::{RiskLevel, RiskResult, RuleKind, SignalBundle, TriggeredRule};
use crate::patterns;

/// Maximum score after clamping.
pub const MAX_SCORE: u32 = 100;

/// Deterministic weighted-rule scoring engine. Holds a validated
/// configuration and nothing else; every evaluation is a pure function of
/// the bundle and that table. No I/O, no clock, no globals.
#[derive(Debug, Clone)]
pub struct RiskEngine {
    config: RiskConfig,
}

impl RiskEngine {
    /// The configuration must already have passed `RiskConfig::validate`;
    /// the engine itself never re-checks it.
    pub fn new(config: RiskConfig) -> Self {
        RiskEngine { config }
    }

    pub fn config(&self) -> &RiskConfig {
        &self.config
    }

    /// Evaluate every rule family against the bundle and assemble the
    /// final result. Total: any well-formed bundle produces a complete
    /// result, including the degenerate all-quiet bundle (score 0).
    pub fn evaluate(&self, bundle: &SignalBundle) -> RiskResult {
        let mut triggered: Vec<TriggeredRule> = Vec::new();

        self.evaluate_domain_age(bundle, &mut triggered);
        self.evaluate_dns_signals(bundle, &mut triggered);
        self.evaluate_ssl_signals(bundle, &mut triggered);
        self.evaluate_behavioral_signals(bundle, &mut triggered);
        self.evaluate_failure_signals(bundle, &mut triggered);

        let raw: u32 = triggered.iter().map(|rule| rule.weight).sum();
        let score = raw.min(MAX_SCORE);

        RiskResult {
            domain: bundle.domain.clone(),
            score,
            classification: classify(score, &self.config.risk_thresholds),
            triggered_rules: triggered,
            patterns: patterns::detect_patterns(bundle),
            intelligence: bundle.clone(),
        }
    }

    fn fire(&self, rules: &mut Vec<TriggeredRule>, kind: RuleKind, justification: String) {
        let weight = self.config.risk_weights.weight(kind);
        rules.push(TriggeredRule::new(kind, weight, justification));
    }

    /// Age brackets are non-overlapping: exactly one band fires, narrowest
    /// first. An unknown age fires nothing; the absence is surfaced by the
    /// failure rules when a collection error accompanies it.
    fn evaluate_domain_age(&self, bundle: &SignalBundle, rules: &mut Vec<TriggeredRule>) {
        let Some(age) = bundle.age_days else {
            return;
        };

        if age < 7 {
            self.fire(
                rules,
                RuleKind::DomainAgeVeryNew,
                format!("Domain registered {age} days ago (under 7 days)"),
            );
        } else if age < 30 {
            self.fire(
                rules,
                RuleKind::DomainAgeNew,
                format!("Domain registered {age} days ago (under 30 days)"),
            );
        } else if age < 90 {
            self.fire(
                rules,
                RuleKind::DomainAgeRecent,
                format!("Domain registered {age} days ago (under 90 days)"),
            );
        }
    }

    fn evaluate_dns_signals(&self, bundle: &SignalBundle, rules: &mut Vec<TriggeredRule>) {
        if !bundle.has_mx {
            self.fire(
                rules,
                RuleKind::NoMxRecords,
                "No MX records found (no mail infrastructure)".to_string(),
            );
        }
        if !bundle.has_spf {
            self.fire(
                rules,
                RuleKind::NoSpfRecords,
                "No SPF record found (no sender authentication)".to_string(),
            );
        }
    }

    fn evaluate_ssl_signals(&self, bundle: &SignalBundle, rules: &mut Vec<TriggeredRule>) {
        if !bundle.ssl_valid {
            self.fire(
                rules,
                RuleKind::SslInvalid,
                "TLS certificate invalid or not presented".to_string(),
            );
        }
        if bundle.is_self_signed {
            self.fire(
                rules,
                RuleKind::SslSelfSigned,
                "TLS certificate is self-signed".to_string(),
            );
        }
    }

    fn evaluate_behavioral_signals(&self, bundle: &SignalBundle, rules: &mut Vec<TriggeredRule>) {
        if bundle.risky_tld {
            let suffix = self
                .config
                .risky_tlds
                .iter()
                .find(|tld| bundle.domain.ends_with(tld.as_str()))
                .map(|tld| tld.as_str())
                .unwrap_or("unknown");
            self.fire(
                rules,
                RuleKind::RiskyTld,
                format!("High-risk TLD detected: '{suffix}'"),
            );
        }

        // One rule per distinct keyword in discovery order, capped. Matches
        // beyond the cap stay visible in the bundle but add no score.
        for keyword in bundle
            .triggered_keywords
            .iter()
            .take(self.config.max_scored_keywords)
        {
            self.fire(
                rules,
                RuleKind::SuspiciousKeyword,
                format!("Suspicious keyword detected: '{keyword}'"),
            );
        }

        if bundle.is_punycode {
            self.fire(
                rules,
                RuleKind::PunycodeDetected,
                "Punycode encoding detected (possible homograph spoofing)".to_string(),
            );
        }
    }

    /// Absence of data is evidence. Each error category fires its rule
    /// once no matter how many entries that category produced.
    fn evaluate_failure_signals(&self, bundle: &SignalBundle, rules: &mut Vec<TriggeredRule>) {
        let mut whois_failed = false;
        let mut dns_failed = false;
        let mut ssl_failed = false;

        for error in &bundle.errors {
            match error_category(error) {
                Some(ErrorCategory::Whois) => whois_failed = true,
                Some(ErrorCategory::Dns) => dns_failed = true,
                Some(ErrorCategory::Ssl) => ssl_failed = true,
                None => {}
            }
        }

        if whois_failed {
            self.fire(
                rules,
                RuleKind::WhoisLookupFailed,
                "WHOIS lookup failed or timed out".to_string(),
            );
        }
        if dns_failed {
            self.fire(
                rules,
                RuleKind::DnsResolutionFailed,
                "DNS resolution failed".to_string(),
            );
        }
        if ssl_failed {
            self.fire(
                rules,
                RuleKind::SslProbeFailed,
                "TLS probe failed".to_string(),
            );
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ErrorCategory {
    Whois,
    Dns,
    Ssl,
}

/// Collector errors follow a fixed "CATEGORY: detail" convention; only the
/// prefix is inspected, never the free text.
fn error_category(error: &str) -> Option<ErrorCategory> {
    let prefix = error.split(':').next()?.trim();
    if prefix.eq_ignore_ascii_case("whois") {
        Some(ErrorCategory::Whois)
    } else if prefix.eq_ignore_ascii_case("dns") {
        Some(ErrorCategory::Dns)
    } else if prefix.eq_ignore_ascii_case("ssl") {
        Some(ErrorCategory::Ssl)
    } else {
        None
    }
}

/// Map a clamped score to its band. Thresholds are inclusive lower bounds,
/// so a score exactly on a threshold lands in the upper band.
pub fn classify(score: u32, thresholds: &RiskThresholds) -> RiskLevel {
    if score >= thresholds.critical {
        RiskLevel::Critical
    } else if score >= thresholds.high {
        RiskLevel::High
    } else if score >= thresholds.medium {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> RiskEngine {
        RiskEngine::new(RiskConfig::default())
    }

    fn quiet_bundle(domain: &str) -> SignalBundle {
        SignalBundle {
            domain: domain.to_string(),
            age_days: Some(9000),
            has_mx: true,
            has_spf: true,
            ssl_valid: true,
            ..SignalBundle::new(domain)
        }
    }

    #[test]
    fn quiet_bundle_scores_zero_and_classifies_low() {
        let result = engine().evaluate(&quiet_bundle("google.com"));

        assert_eq!(result.score, 0);
        assert_eq!(result.classification, RiskLevel::Low);
        assert!(result.triggered_rules.is_empty());
        assert!(result.patterns.is_empty());
    }

    #[test]
    fn fully_hostile_bundle_clamps_to_100() {
        let bundle = SignalBundle {
            domain: "secure-login.tk".to_string(),
            age_days: Some(3),
            has_mx: false,
            has_spf: false,
            ssl_valid: false,
            triggered_keywords: vec!["secure".to_string(), "login".to_string()],
            risky_tld: true,
            ..SignalBundle::new("secure-login.tk")
        };

        let result = engine().evaluate(&bundle);

        // 25 + 15 + 10 + 20 + 20 + 15*2 = 120, clamped
        assert_eq!(result.score, 100);
        assert_eq!(result.classification, RiskLevel::Critical);
    }

    #[test]
    fn whois_failure_scores_without_any_age_rule() {
        let bundle = SignalBundle {
            domain: "example.com".to_string(),
            age_days: None,
            has_mx: true,
            has_spf: true,
            ssl_valid: true,
            errors: vec!["WHOIS: timeout".to_string()],
            ..SignalBundle::new("example.com")
        };

        let result = engine().evaluate(&bundle);

        assert_eq!(result.score, 10);
        assert!(result
            .triggered_rules
            .iter()
            .any(|r| r.rule == RuleKind::WhoisLookupFailed));
        assert!(!result.triggered_rules.iter().any(|r| matches!(
            r.rule,
            RuleKind::DomainAgeVeryNew | RuleKind::DomainAgeNew | RuleKind::DomainAgeRecent
        )));
    }

    #[test]
    fn exactly_one_age_bracket_fires() {
        let cases = [
            (0, Some(RuleKind::DomainAgeVeryNew)),
            (6, Some(RuleKind::DomainAgeVeryNew)),
            (7, Some(RuleKind::DomainAgeNew)),
            (29, Some(RuleKind::DomainAgeNew)),
            (30, Some(RuleKind::DomainAgeRecent)),
            (89, Some(RuleKind::DomainAgeRecent)),
            (90, None),
            (9000, None),
        ];

        for (age, expected) in cases {
            let bundle = SignalBundle {
                age_days: Some(age),
                ..quiet_bundle("example.com")
            };
            let result = engine().evaluate(&bundle);
            let age_rules: Vec<_> = result
                .triggered_rules
                .iter()
                .filter(|r| {
                    matches!(
                        r.rule,
                        RuleKind::DomainAgeVeryNew
                            | RuleKind::DomainAgeNew
                            | RuleKind::DomainAgeRecent
                    )
                })
                .collect();

            match expected {
                Some(kind) => {
                    assert_eq!(age_rules.len(), 1, "age {age}");
                    assert_eq!(age_rules[0].rule, kind, "age {age}");
                }
                None => assert!(age_rules.is_empty(), "age {age}"),
            }
        }
    }

    #[test]
    fn keyword_contribution_caps_but_report_keeps_all_matches() {
        let keywords: Vec<String> = ["login", "secure", "banking", "verify", "wallet"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let capped = SignalBundle {
            triggered_keywords: keywords.clone(),
            ..quiet_bundle("example.com")
        };
        let at_cap = SignalBundle {
            triggered_keywords: keywords[..2].to_vec(),
            ..quiet_bundle("example.com")
        };

        let capped_result = engine().evaluate(&capped);
        let at_cap_result = engine().evaluate(&at_cap);

        assert_eq!(capped_result.score, at_cap_result.score);
        assert_eq!(capped_result.intelligence.triggered_keywords.len(), 5);
        let keyword_rules: Vec<_> = capped_result
            .triggered_rules
            .iter()
            .filter(|r| r.rule == RuleKind::SuspiciousKeyword)
            .collect();
        assert_eq!(keyword_rules.len(), 2);
        assert!(keyword_rules[0].justification.contains("login"));
        assert!(keyword_rules[1].justification.contains("secure"));
    }

    #[test]
    fn score_on_threshold_lands_in_upper_band() {
        let thresholds = RiskConfig::default().risk_thresholds;
        assert_eq!(classify(29, &thresholds), RiskLevel::Low);
        assert_eq!(classify(30, &thresholds), RiskLevel::Medium);
        assert_eq!(classify(59, &thresholds), RiskLevel::Medium);
        assert_eq!(classify(60, &thresholds), RiskLevel::High);
        assert_eq!(classify(79, &thresholds), RiskLevel::High);
        assert_eq!(classify(80, &thresholds), RiskLevel::Critical);
        assert_eq!(classify(100, &thresholds), RiskLevel::Critical);
    }

    #[test]
    fn evaluation_is_idempotent() {
        let bundle = SignalBundle {
            domain: "xn--secure.tk".to_string(),
            age_days: Some(12),
            triggered_keywords: vec!["secure".to_string()],
            risky_tld: true,
            is_punycode: true,
            errors: vec!["DNS: query timeout".to_string()],
            ..SignalBundle::new("xn--secure.tk")
        };

        let first = engine().evaluate(&bundle);
        let second = engine().evaluate(&bundle);

        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn flipping_any_single_signal_never_decreases_score() {
        let base = quiet_bundle("example.com");
        let base_score = engine().evaluate(&base).score;

        let flips: Vec<SignalBundle> = vec![
            SignalBundle {
                age_days: Some(3),
                ..base.clone()
            },
            SignalBundle {
                has_mx: false,
                ..base.clone()
            },
            SignalBundle {
                has_spf: false,
                ..base.clone()
            },
            SignalBundle {
                ssl_valid: false,
                ..base.clone()
            },
            SignalBundle {
                is_self_signed: true,
                ..base.clone()
            },
            SignalBundle {
                triggered_keywords: vec!["login".to_string()],
                ..base.clone()
            },
            SignalBundle {
                risky_tld: true,
                ..base.clone()
            },
            SignalBundle {
                is_punycode: true,
                ..base.clone()
            },
            SignalBundle {
                errors: vec!["SSL: connection timeout".to_string()],
                ..base.clone()
            },
        ];

        for flipped in flips {
            let score = engine().evaluate(&flipped).score;
            assert!(score >= base_score, "flip decreased score: {flipped:?}");
        }
    }

    #[test]
    fn repeated_errors_in_one_category_fire_the_rule_once() {
        let bundle = SignalBundle {
            errors: vec![
                "WHOIS: query timeout".to_string(),
                "WHOIS: lookup failed".to_string(),
                "DNS: query timeout".to_string(),
            ],
            ..quiet_bundle("example.com")
        };

        let result = engine().evaluate(&bundle);

        let whois_rules = result
            .triggered_rules
            .iter()
            .filter(|r| r.rule == RuleKind::WhoisLookupFailed)
            .count();
        assert_eq!(whois_rules, 1);
        assert_eq!(
            result.score,
            10 + 15,
            "one whois failure plus one dns failure"
        );
    }

    #[test]
    fn unrecognized_error_prefix_fires_nothing() {
        let bundle = SignalBundle {
            errors: vec!["GEOIP: unavailable".to_string()],
            ..quiet_bundle("example.com")
        };
        assert_eq!(engine().evaluate(&bundle).score, 0);
    }

    #[test]
    fn rules_appear_in_family_evaluation_order() {
        let bundle = SignalBundle {
            domain: "xn--login.tk".to_string(),
            age_days: Some(3),
            has_mx: false,
            has_spf: false,
            ssl_valid: false,
            is_self_signed: true,
            triggered_keywords: vec!["login".to_string()],
            risky_tld: true,
            is_punycode: true,
            errors: vec!["WHOIS: timeout".to_string()],
            ..SignalBundle::new("xn--login.tk")
        };

        let kinds: Vec<RuleKind> = engine()
            .evaluate(&bundle)
            .triggered_rules
            .iter()
            .map(|r| r.rule)
            .collect();

        assert_eq!(
            kinds,
            vec![
                RuleKind::DomainAgeVeryNew,
                RuleKind::NoMxRecords,
                RuleKind::NoSpfRecords,
                RuleKind::SslInvalid,
                RuleKind::SslSelfSigned,
                RuleKind::RiskyTld,
                RuleKind::SuspiciousKeyword,
                RuleKind::PunycodeDetected,
                RuleKind::WhoisLookupFailed,
            ]
        );
    }

    #[test]
    fn risky_tld_justification_names_the_suffix() {
        let bundle = SignalBundle {
            domain: "bad.tk".to_string(),
            risky_tld: true,
            ..quiet_bundle("bad.tk")
        };

        let result = engine().evaluate(&bundle);
        let rule = result
            .triggered_rules
            .iter()
            .find(|r| r.rule == RuleKind::RiskyTld)
            .unwrap();
        assert!(rule.justification.contains(".tk"));
    }
}
