use anyhow::{anyhow, Result};
use regex::Regex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::RwLock;
use tokio::time::timeout;

/// WHOIS observations for one domain. A lookup that reached a server but
/// found no parseable creation date yields `age_days = None` with no error
/// entry; the age is then legitimately unknown rather than withheld.
#[derive(Debug, Clone, Default)]
pub struct WhoisSignals {
    pub age_days: Option<u32>,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone)]
struct CachedAge {
    age_days: Option<u32>,
    cached_at: SystemTime,
}

/// Queries registry WHOIS servers over TCP port 43 and extracts the domain
/// creation date from the text response. Successful answers are cached for
/// 24 hours; failures are not cached.
#[derive(Debug, Clone)]
pub struct WhoisCollector {
    cache: Arc<RwLock<HashMap<String, CachedAge>>>,
    cache_ttl: Duration,
    timeout: Duration,
}

impl WhoisCollector {
    pub fn new(timeout_seconds: u64) -> Self {
        WhoisCollector {
            cache: Arc::new(RwLock::new(HashMap::new())),
            cache_ttl: Duration::from_secs(24 * 60 * 60),
            timeout: Duration::from_secs(timeout_seconds),
        }
    }

    pub async fn collect(&self, domain: &str) -> WhoisSignals {
        let root = registrable_domain(domain);
        log::debug!("WHOIS lookup for {domain} (root: {root})");

        if let Some(age_days) = self.cached(&root).await {
            log::debug!("using cached WHOIS age for {root}");
            return WhoisSignals {
                age_days,
                errors: Vec::new(),
            };
        }

        match self.fetch_age(&root).await {
            Ok(age_days) => {
                let mut cache = self.cache.write().await;
                cache.insert(
                    root,
                    CachedAge {
                        age_days,
                        cached_at: SystemTime::now(),
                    },
                );
                WhoisSignals {
                    age_days,
                    errors: Vec::new(),
                }
            }
            Err(e) => {
                log::warn!("WHOIS lookup failed for {root}: {e}");
                WhoisSignals {
                    age_days: None,
                    errors: vec![format!("WHOIS: {e}")],
                }
            }
        }
    }

    async fn cached(&self, root: &str) -> Option<Option<u32>> {
        let cache = self.cache.read().await;
        let entry = cache.get(root)?;
        let age = SystemTime::now()
            .duration_since(entry.cached_at)
            .unwrap_or(Duration::ZERO);
        if age < self.cache_ttl {
            Some(entry.age_days)
        } else {
            None
        }
    }

    async fn fetch_age(&self, root: &str) -> Result<Option<u32>> {
        let primary = whois_server_for(root);
        let mut servers = vec![primary];
        for fallback in ["whois.iana.org", "whois.internic.net"] {
            if !servers.contains(&fallback) {
                servers.push(fallback);
            }
        }

        let mut last_error = anyhow!("lookup failed");
        for server in servers {
            match self.query_server(server, root).await {
                Ok(text) => {
                    log::debug!("WHOIS response from {server} for {root} ({} chars)", text.len());
                    return Ok(creation_age_days(&text));
                }
                Err(e) => {
                    log::debug!("WHOIS server {server} failed for {root}: {e}");
                    last_error = e;
                }
            }
        }

        Err(last_error)
    }

    async fn query_server(&self, server: &str, root: &str) -> Result<String> {
        let connect = TcpStream::connect(format!("{server}:43"));
        let mut stream = timeout(self.timeout, connect)
            .await
            .map_err(|_| anyhow!("query timeout"))??;

        stream.write_all(format!("{root}\r\n").as_bytes()).await?;

        let mut response = String::new();
        timeout(self.timeout, stream.read_to_string(&mut response))
            .await
            .map_err(|_| anyhow!("query timeout"))??;

        if response.is_empty() {
            return Err(anyhow!("empty response"));
        }
        Ok(response)
    }
}

/// Registrable domain for WHOIS queries, stripping subdomains while
/// keeping common two-part public suffixes intact.
pub fn registrable_domain(domain: &str) -> String {
    const TWO_PART_TLDS: [&str; 12] = [
        "co.uk", "org.uk", "ac.uk", "gov.uk", "com.au", "net.au", "co.jp", "co.kr", "com.br",
        "co.za", "co.nz", "co.in",
    ];

    let parts: Vec<&str> = domain.split('.').collect();
    if parts.len() < 2 {
        return domain.to_string();
    }

    let last_two = format!("{}.{}", parts[parts.len() - 2], parts[parts.len() - 1]);
    if parts.len() >= 3 && TWO_PART_TLDS.contains(&last_two.as_str()) {
        return format!("{}.{}", parts[parts.len() - 3], last_two);
    }
    last_two
}

fn whois_server_for(root: &str) -> &'static str {
    let tld = root.rsplit('.').next().unwrap_or(root);
    match tld {
        "com" | "net" => "whois.verisign-grs.com",
        "org" => "whois.pir.org",
        "info" => "whois.afilias.net",
        "biz" => "whois.neulevel.biz",
        "us" => "whois.nic.us",
        "uk" => "whois.nic.uk",
        "de" => "whois.denic.de",
        "fr" => "whois.afnic.fr",
        "nl" => "whois.domain-registry.nl",
        "ca" => "whois.cira.ca",
        "au" => "whois.auda.org.au",
        "jp" => "whois.jprs.jp",
        "br" => "whois.registro.br",
        "tk" => "whois.dot.tk",
        "ml" => "whois.dot.ml",
        "ga" => "whois.dot.ga",
        "cf" => "whois.dot.cf",
        _ => "whois.iana.org",
    }
}

/// Pull the creation date out of a WHOIS text response and convert it to
/// an age in days. Registries disagree wildly on field names; the label
/// patterns below cover the common ones.
fn creation_age_days(text: &str) -> Option<u32> {
    let labels = [
        r"(?i)creation\s*date[:\s]+([^\r\n]+)",
        r"(?i)created\s*(?:on)?[:\s]+([^\r\n]+)",
        r"(?i)registered\s*(?:on)?[:\s]+([^\r\n]+)",
        r"(?i)registration\s*(?:date|time)[:\s]+([^\r\n]+)",
        r"(?i)domain\s*created[:\s]+([^\r\n]+)",
        r"(?i)create[d]?_date[:\s]+([^\r\n]+)",
    ];

    for label in labels {
        let Ok(regex) = Regex::new(label) else {
            continue;
        };
        if let Some(captures) = regex.captures(text) {
            if let Some(date_match) = captures.get(1) {
                let date_str = date_match.as_str().trim();
                if let Some(created) = parse_date(date_str) {
                    let age = age_in_days(created);
                    log::debug!("parsed creation date '{date_str}' ({age} days)");
                    return Some(age);
                }
                log::debug!("unparseable creation date: '{date_str}'");
            }
        }
    }

    None
}

/// ISO-style dates cover every registry format worth supporting; the
/// leading YYYY-MM-DD is extracted no matter what trails it.
fn parse_date(date_str: &str) -> Option<SystemTime> {
    let iso = Regex::new(r"(\d{4})-(\d{2})-(\d{2})").ok()?;
    let captures = iso.captures(date_str)?;
    let year: u64 = captures[1].parse().ok()?;
    let month: u64 = captures[2].parse().ok()?;
    let day: u64 = captures[3].parse().ok()?;

    if !(1970..=9999).contains(&year) || !(1..=12).contains(&month) || !(1..=31).contains(&day) {
        return None;
    }

    // Approximate day arithmetic is plenty for bucketing ages into
    // multi-day brackets.
    let mut days = (year - 1970) * 365 + (year - 1970) / 4;
    const DAYS_IN_MONTH: [u64; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];
    for m in 1..month {
        days += DAYS_IN_MONTH[(m - 1) as usize];
    }
    days += day - 1;

    Some(UNIX_EPOCH + Duration::from_secs(days * 24 * 60 * 60))
}

fn age_in_days(created: SystemTime) -> u32 {
    let secs = SystemTime::now()
        .duration_since(created)
        .unwrap_or(Duration::ZERO)
        .as_secs();
    (secs / (24 * 60 * 60)) as u32
}
