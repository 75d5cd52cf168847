use crate::config::RiskConfig;
use crate::validator;

/// Lexical signals extracted from the domain string itself. Pure; the only
/// collector that can never fail.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LexicalSignals {
    pub triggered_keywords: Vec<String>,
    pub risky_tld: bool,
    pub is_punycode: bool,
}

/// Scan a normalized domain against the configured keyword and TLD lists.
/// Keywords are reported in configured-list order with duplicates
/// collapsed; the TLD check is a case-insensitive suffix match including
/// the leading dot.
pub fn analyze(domain: &str, config: &RiskConfig) -> LexicalSignals {
    let mut triggered_keywords = Vec::new();
    for keyword in &config.suspicious_keywords {
        if domain.contains(keyword.as_str()) && !triggered_keywords.contains(keyword) {
            log::debug!("keyword '{keyword}' found in {domain}");
            triggered_keywords.push(keyword.clone());
        }
    }

    let risky_tld = config
        .risky_tlds
        .iter()
        .any(|tld| domain.ends_with(tld.as_str()));
    if risky_tld {
        log::debug!("risky TLD match for {domain}");
    }

    LexicalSignals {
        triggered_keywords,
        risky_tld,
        is_punycode: validator::is_punycode(domain),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_keywords_in_configured_order() {
        let config = RiskConfig::default();
        let signals = analyze("secure-login-verify.com", &config);
        // Configured order (login, verify, secure), not appearance order.
        assert_eq!(signals.triggered_keywords, vec!["login", "verify", "secure"]);
    }

    #[test]
    fn collapses_duplicate_keyword_matches() {
        let mut config = RiskConfig::default();
        config.suspicious_keywords = vec!["login".to_string(), "login".to_string()];
        let signals = analyze("login-login.com", &config);
        assert_eq!(signals.triggered_keywords, vec!["login"]);
    }

    #[test]
    fn matches_risky_tld_as_suffix() {
        let config = RiskConfig::default();
        assert!(analyze("anything.tk", &config).risky_tld);
        assert!(!analyze("tk.example.com", &config).risky_tld);
        assert!(!analyze("example.com", &config).risky_tld);
    }

    #[test]
    fn flags_punycode_domains() {
        let config = RiskConfig::default();
        assert!(analyze("xn--pple-43d.com", &config).is_punycode);
        assert!(!analyze("apple.com", &config).is_punycode);
    }

    #[test]
    fn clean_domain_yields_no_signals() {
        let config = RiskConfig::default();
        let signals = analyze("example.org", &config);
        assert_eq!(signals, LexicalSignals::default());
    }
}
