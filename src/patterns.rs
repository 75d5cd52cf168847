use crate::models::SignalBundle;

/// Composite signatures recognized over a signal bundle. Each is an
/// explanatory annotation layered on top of the individual rules: the
/// component signals are already weighted there, so patterns add text,
/// never score. Signatures are independent and may co-fire.
pub fn detect_patterns(bundle: &SignalBundle) -> Vec<String> {
    let mut patterns = Vec::new();

    // Ghost: registered days ago with no mail infrastructure behind it,
    // the shape of an automated disposable registration.
    if matches!(bundle.age_days, Some(age) if age < 7) && !bundle.has_mx {
        patterns.push(
            "Ghost pattern: domain created within the last week with no MX records \
             (disposable registration)"
                .to_string(),
        );
    }

    // Authority: a lure keyword behind a valid certificate. Valid TLS
    // lowers naive signal-only suspicion, which is exactly what a
    // convincing phishing landing page relies on.
    if !bundle.triggered_keywords.is_empty() && bundle.ssl_valid {
        patterns.push(format!(
            "Authority pattern: suspicious keyword '{}' served behind a valid TLS \
             certificate (credible phishing page)",
            bundle.triggered_keywords[0]
        ));
    }

    // Homograph: punycode in any label.
    if bundle.is_punycode {
        patterns.push(
            "Homograph pattern: punycode-encoded label may imitate another domain's \
             visual appearance"
                .to_string(),
        );
    }

    patterns
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiet_bundle_matches_no_pattern() {
        let bundle = SignalBundle {
            has_mx: true,
            ssl_valid: true,
            ..SignalBundle::new("example.com")
        };
        assert!(detect_patterns(&bundle).is_empty());
    }

    #[test]
    fn ghost_requires_known_young_age_and_missing_mx() {
        let ghost = SignalBundle {
            age_days: Some(2),
            has_mx: false,
            ..SignalBundle::new("fresh.top")
        };
        assert_eq!(detect_patterns(&ghost).len(), 1);

        // Unknown age is not evidence of youth.
        let unknown_age = SignalBundle {
            age_days: None,
            has_mx: false,
            ..SignalBundle::new("fresh.top")
        };
        assert!(detect_patterns(&unknown_age).is_empty());

        // A week-old domain with MX is not a ghost.
        let with_mx = SignalBundle {
            age_days: Some(2),
            has_mx: true,
            ..SignalBundle::new("fresh.top")
        };
        assert!(detect_patterns(&with_mx).is_empty());
    }

    #[test]
    fn authority_fires_only_with_valid_tls() {
        let authority = SignalBundle {
            triggered_keywords: vec!["login".to_string()],
            ssl_valid: true,
            has_mx: true,
            ..SignalBundle::new("login-portal.com")
        };
        let found = detect_patterns(&authority);
        assert_eq!(found.len(), 1);
        assert!(found[0].contains("login"));

        let invalid_tls = SignalBundle {
            triggered_keywords: vec!["login".to_string()],
            ssl_valid: false,
            has_mx: true,
            ..SignalBundle::new("login-portal.com")
        };
        assert!(detect_patterns(&invalid_tls).is_empty());
    }

    #[test]
    fn patterns_may_co_fire() {
        let bundle = SignalBundle {
            age_days: Some(1),
            has_mx: false,
            ssl_valid: true,
            triggered_keywords: vec!["secure".to_string()],
            is_punycode: true,
            ..SignalBundle::new("xn--secure.tk")
        };
        assert_eq!(detect_patterns(&bundle).len(), 3);
    }
}
