use hickory_resolver::error::ResolveErrorKind;
use hickory_resolver::proto::op::ResponseCode;
use hickory_resolver::TokioAsyncResolver;
use std::time::Duration;
use tokio::time::timeout;

/// DNS observations for one domain. `has_mx`/`has_spf` stay false on
/// failure; the errors list records why.
#[derive(Debug, Clone, Default)]
pub struct DnsSignals {
    pub has_mx: bool,
    pub has_spf: bool,
    pub errors: Vec<String>,
}

/// Checks mail infrastructure records. Every failure mode degrades to a
/// partial result; nothing here returns an error to the caller.
#[derive(Debug, Clone)]
pub struct DnsCollector {
    timeout: Duration,
}

impl DnsCollector {
    pub fn new(timeout_seconds: u64) -> Self {
        DnsCollector {
            timeout: Duration::from_secs(timeout_seconds),
        }
    }

    pub async fn collect(&self, domain: &str) -> DnsSignals {
        let mut signals = DnsSignals::default();

        let resolver = match TokioAsyncResolver::tokio_from_system_conf() {
            Ok(resolver) => resolver,
            Err(e) => {
                log::warn!("system resolver unavailable: {e}");
                signals.errors.push("DNS: resolver unavailable".to_string());
                return signals;
            }
        };

        match timeout(self.timeout, resolver.mx_lookup(domain)).await {
            Ok(Ok(mx)) => {
                signals.has_mx = mx.iter().next().is_some();
                log::debug!("{domain}: has_mx={}", signals.has_mx);
            }
            Ok(Err(e)) => match e.kind() {
                ResolveErrorKind::NoRecordsFound { response_code, .. } => {
                    if *response_code == ResponseCode::NXDomain {
                        log::warn!("{domain}: NXDOMAIN");
                        signals.errors.push("DNS: domain does not exist".to_string());
                    } else {
                        log::debug!("{domain}: no MX records");
                    }
                }
                _ => {
                    log::warn!("{domain}: MX lookup failed: {e}");
                    signals.errors.push("DNS: lookup failed".to_string());
                }
            },
            Err(_) => {
                log::warn!("{domain}: MX lookup timed out");
                signals.errors.push("DNS: query timeout".to_string());
            }
        }

        match timeout(self.timeout, resolver.txt_lookup(domain)).await {
            Ok(Ok(txt)) => {
                for record in txt.iter() {
                    let value: String = record
                        .txt_data()
                        .iter()
                        .map(|data| String::from_utf8_lossy(data))
                        .collect();
                    if value.to_lowercase().starts_with("v=spf1") {
                        signals.has_spf = true;
                        log::debug!("{domain}: SPF record found");
                        break;
                    }
                }
            }
            Ok(Err(e)) => match e.kind() {
                // Missing TXT records are common and carry their own
                // scoring rule; only real lookup failures go to errors.
                ResolveErrorKind::NoRecordsFound { .. } => {
                    log::debug!("{domain}: no TXT records");
                }
                _ => {
                    log::warn!("{domain}: TXT lookup failed: {e}");
                    if signals.errors.is_empty() {
                        signals.errors.push("DNS: lookup failed".to_string());
                    }
                }
            },
            Err(_) => {
                log::warn!("{domain}: TXT lookup timed out");
                if signals.errors.is_empty() {
                    signals.errors.push("DNS: query timeout".to_string());
                }
            }
        }

        signals
    }
}
