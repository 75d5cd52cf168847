use crate::config::RiskConfig;
use crate::dns::DnsCollector;
use crate::engine::RiskEngine;
use crate::lexical;
use crate::models::{RiskResult, SignalBundle};
use crate::ssl_probe::SslCollector;
use crate::validator;
use crate::whois::WhoisCollector;
use anyhow::Result;

/// Orchestrates collection and evaluation for one domain at a time.
/// Shared between the CLI and the API server; cheap to clone.
#[derive(Debug, Clone)]
pub struct AnalyzerService {
    engine: RiskEngine,
    dns: DnsCollector,
    whois: WhoisCollector,
    ssl: SslCollector,
}

impl AnalyzerService {
    pub fn new(config: RiskConfig) -> Self {
        let dns = DnsCollector::new(config.timeouts.dns);
        let whois = WhoisCollector::new(config.timeouts.whois);
        let ssl = SslCollector::new(config.timeouts.ssl);
        AnalyzerService {
            engine: RiskEngine::new(config),
            dns,
            whois,
            ssl,
        }
    }

    pub fn config(&self) -> &RiskConfig {
        self.engine.config()
    }

    /// Full pipeline: validate, collect, evaluate. The only error is
    /// invalid domain input; collector failures degrade into bundle data
    /// and a domain that passes validation always yields a complete
    /// result.
    pub async fn analyze(&self, raw_domain: &str) -> Result<RiskResult> {
        let domain = validator::normalize(raw_domain)?;
        log::info!("analyzing domain: {domain}");

        let bundle = self.collect(&domain).await;
        let result = self.engine.evaluate(&bundle);

        log::info!(
            "analysis complete: {domain} scored {} ({})",
            result.score,
            result.classification
        );
        Ok(result)
    }

    /// Score an already-assembled bundle without any collection. Used by
    /// tests and anywhere signals arrive from elsewhere.
    pub fn evaluate_bundle(&self, bundle: &SignalBundle) -> RiskResult {
        self.engine.evaluate(bundle)
    }

    /// Fan the network collectors out concurrently; each enforces its own
    /// timeout and reports failure through its errors list, so the merge
    /// below never blocks past the slowest timeout and never fails.
    async fn collect(&self, domain: &str) -> SignalBundle {
        let lexical = lexical::analyze(domain, self.config());

        let (dns, whois, ssl) = tokio::join!(
            self.dns.collect(domain),
            self.whois.collect(domain),
            self.ssl.collect(domain),
        );

        let mut errors = dns.errors;
        errors.extend(whois.errors);
        errors.extend(ssl.errors);

        SignalBundle {
            domain: domain.to_string(),
            age_days: whois.age_days,
            has_mx: dns.has_mx,
            has_spf: dns.has_spf,
            ssl_valid: ssl.ssl_valid,
            is_self_signed: ssl.is_self_signed,
            triggered_keywords: lexical.triggered_keywords,
            risky_tld: lexical.risky_tld,
            is_punycode: lexical.is_punycode,
            errors,
        }
    }
}
