use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;

/// TLS observations from a best-effort handshake on port 443.
/// `ssl_valid` is false whenever the handshake failed or timed out;
/// certificate problems are scored by their own rules and do not produce
/// error entries, only unreachability does.
#[derive(Debug, Clone, Default)]
pub struct SslSignals {
    pub ssl_valid: bool,
    pub is_self_signed: bool,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct SslCollector {
    timeout: Duration,
}

impl SslCollector {
    pub fn new(timeout_seconds: u64) -> Self {
        SslCollector {
            timeout: Duration::from_secs(timeout_seconds),
        }
    }

    pub async fn collect(&self, domain: &str) -> SslSignals {
        let mut signals = SslSignals::default();

        let tcp = match timeout(self.timeout, TcpStream::connect((domain, 443))).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => {
                log::debug!("{domain}: no HTTPS service: {e}");
                signals.errors.push("SSL: connection failed".to_string());
                return signals;
            }
            Err(_) => {
                log::warn!("{domain}: TLS connect timed out");
                signals.errors.push("SSL: connection timeout".to_string());
                return signals;
            }
        };

        let connector = match native_tls::TlsConnector::new() {
            Ok(connector) => tokio_native_tls::TlsConnector::from(connector),
            Err(e) => {
                log::warn!("TLS backend unavailable: {e}");
                signals.errors.push("SSL: probe unavailable".to_string());
                return signals;
            }
        };

        match timeout(self.timeout, connector.connect(domain, tcp)).await {
            Ok(Ok(_)) => {
                signals.ssl_valid = true;
                log::debug!("{domain}: certificate verified");
            }
            Ok(Err(e)) => {
                // Verification failures are a scoring signal, not a
                // collection error. The backend names self-signed chains
                // in its error text on every platform we target.
                let text = e.to_string().to_lowercase();
                if text.contains("self signed") || text.contains("self-signed") {
                    signals.is_self_signed = true;
                    log::debug!("{domain}: self-signed certificate");
                } else {
                    log::debug!("{domain}: certificate verification failed: {e}");
                }
            }
            Err(_) => {
                log::warn!("{domain}: TLS handshake timed out");
                signals.errors.push("SSL: connection timeout".to_string());
            }
        }

        signals
    }
}
