//! CDN availability probing.
//!
//! Issues one lightweight HEAD check per candidate path against the CDN
//! mirror and resolves every file to a mirror-or-fallback delivery URL.
//! Probing is bounded-concurrency and failure-tolerant: transport errors,
//! timeouts, and faulted tasks all surface as unreachable outcomes, never as
//! errors, so a run always yields exactly one decision per path.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use reqwest::Client;

use crate::error::Result;
use crate::models::{Config, ProbeStats};
use crate::utils::UrlBuilder;

/// Outcome of a single existence probe.
#[derive(Debug, Clone)]
pub struct ProbeOutcome {
    pub path: String,
    pub reachable: bool,
    /// HTTP status, or 0 when no response was received
    pub status_code: u16,
    pub error: Option<String>,
}

impl ProbeOutcome {
    /// Outcome for a probe task that failed outside the HTTP layer.
    fn fault(path: String, message: String) -> Self {
        Self {
            path,
            reachable: false,
            status_code: 0,
            error: Some(message),
        }
    }
}

/// Per-file URL decision derived from a probe outcome.
#[derive(Debug, Clone)]
pub struct DeliveryUrls {
    pub path: String,
    /// Direct-origin URL, independent of the probe outcome
    pub international_url: String,
    /// Mirror URL when reachable, proxy fallback otherwise
    pub china_url: String,
    pub reachable: bool,
    pub status_code: u16,
}

/// Probes single candidate paths against the CDN mirror.
pub struct UrlProber {
    client: Client,
    urls: UrlBuilder,
}

impl UrlProber {
    /// Create a prober with the configured user agent and probe timeout.
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.scanner.user_agent)
            .timeout(Duration::from_secs(config.scanner.probe_timeout_secs))
            .build()?;
        Ok(Self {
            client,
            urls: UrlBuilder::new(&config.repo),
        })
    }

    /// Check whether the CDN mirror serves the given repository path.
    ///
    /// Captures every failure mode in the returned outcome.
    pub async fn probe(&self, path: &str) -> ProbeOutcome {
        let mirror = self.urls.mirror_url(path);
        match self.client.head(&mirror).send().await {
            Ok(response) => ProbeOutcome {
                path: path.to_string(),
                reachable: response.status().is_success(),
                status_code: response.status().as_u16(),
                error: None,
            },
            Err(error) => ProbeOutcome {
                path: path.to_string(),
                reachable: false,
                status_code: 0,
                error: Some(error.to_string()),
            },
        }
    }

    /// Resolve the two delivery URLs for a probed path.
    pub fn decide(&self, outcome: &ProbeOutcome) -> DeliveryUrls {
        let china_url = if outcome.reachable {
            self.urls.mirror_url(&outcome.path)
        } else {
            self.urls.fallback_url(&outcome.path)
        };
        DeliveryUrls {
            path: outcome.path.clone(),
            international_url: self.urls.direct_url(&outcome.path),
            china_url,
            reachable: outcome.reachable,
            status_code: outcome.status_code,
        }
    }
}

/// Runs the prober over a full candidate set with bounded parallelism.
pub struct ProbeScheduler {
    prober: Arc<UrlProber>,
    concurrency: usize,
}

impl ProbeScheduler {
    pub fn new(prober: UrlProber, concurrency: usize) -> Self {
        Self {
            prober: Arc::new(prober),
            concurrency: concurrency.max(1),
        }
    }

    /// Probe every candidate path and derive one URL decision per path.
    ///
    /// Each probe runs in its own task; a task that faults is converted to an
    /// unreachable outcome at the join point and siblings keep running. The
    /// stream is drained by this single owner, which is the only writer of
    /// the result map.
    pub async fn probe_all(&self, paths: &[String]) -> (HashMap<String, DeliveryUrls>, ProbeStats) {
        let total = paths.len();
        log::info!(
            "Probing {} CDN mirror links ({} concurrent)",
            total,
            self.concurrency
        );

        let mut decisions = HashMap::with_capacity(total);
        let mut stats = ProbeStats::default();
        let mut completed = 0usize;

        let mut outcomes = stream::iter(paths.iter().cloned())
            .map(|path| {
                let prober = Arc::clone(&self.prober);
                async move {
                    let task = tokio::spawn({
                        let prober = Arc::clone(&prober);
                        let path = path.clone();
                        async move { prober.probe(&path).await }
                    });
                    match task.await {
                        Ok(outcome) => outcome,
                        Err(error) => ProbeOutcome::fault(path, error.to_string()),
                    }
                }
            })
            .buffer_unordered(self.concurrency);

        while let Some(outcome) = outcomes.next().await {
            completed += 1;
            if outcome.reachable {
                stats.reachable += 1;
            } else {
                stats.unreachable += 1;
                if let Some(error) = &outcome.error {
                    log::debug!("{} unreachable: {}", outcome.path, error);
                }
            }
            let decision = self.prober.decide(&outcome);
            decisions.insert(outcome.path, decision);

            if completed % 50 == 0 {
                log::info!("Probe progress: {}/{}", completed, total);
            }
        }

        stats.finish(decisions.len());
        log::info!(
            "Probe summary: {} reachable, {} unreachable ({:.1}% mirror hit rate)",
            stats.reachable,
            stats.unreachable,
            stats.success_rate
        );
        (decisions, stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Config whose CDN host points at a closed local port, so every probe
    /// fails fast with a transport error.
    fn unreachable_config() -> Config {
        let mut config = Config::default();
        config.repo.cdn_host = "http://127.0.0.1:9".to_string();
        config.scanner.probe_timeout_secs = 2;
        config.scanner.max_concurrent = 4;
        config
    }

    #[tokio::test]
    async fn test_probe_transport_error_is_unreachable() {
        let config = unreachable_config();
        let prober = UrlProber::new(&config).expect("prober builds");

        let outcome = prober.probe("小学/数学/课本.pdf").await;
        assert!(!outcome.reachable);
        assert_eq!(outcome.status_code, 0);
        assert!(outcome.error.is_some());
    }

    #[tokio::test]
    async fn test_probe_all_yields_one_decision_per_path() {
        let config = unreachable_config();
        let prober = UrlProber::new(&config).expect("prober builds");
        let scheduler = ProbeScheduler::new(prober, config.scanner.max_concurrent);

        let paths: Vec<String> = (1..=7).map(|i| format!("小学/数学/课本{i}.pdf")).collect();
        let (decisions, stats) = scheduler.probe_all(&paths).await;

        assert_eq!(decisions.len(), paths.len());
        assert_eq!(stats.tested, paths.len());
        assert_eq!(stats.unreachable, paths.len());
        for path in &paths {
            let decision = decisions.get(path).expect("decision for every path");
            assert!(!decision.international_url.is_empty());
            assert!(!decision.china_url.is_empty());
        }
    }

    #[tokio::test]
    async fn test_unreachable_decisions_use_proxy_fallback() {
        let config = unreachable_config();
        let prober = UrlProber::new(&config).expect("prober builds");
        let scheduler = ProbeScheduler::new(prober, 2);

        let paths = vec!["高中/物理/课本.pdf".to_string()];
        let (decisions, _) = scheduler.probe_all(&paths).await;

        let decision = decisions.get(&paths[0]).expect("decision");
        assert!(!decision.reachable);
        assert!(decision.china_url.starts_with("https://ghfast.top/"));
        assert!(
            decision
                .international_url
                .starts_with("https://raw.githubusercontent.com/")
        );
    }

    #[test]
    fn test_decide_prefers_mirror_when_reachable() {
        let config = Config::default();
        let prober = UrlProber::new(&config).expect("prober builds");

        let outcome = ProbeOutcome {
            path: "a.pdf".to_string(),
            reachable: true,
            status_code: 200,
            error: None,
        };
        let decision = prober.decide(&outcome);
        assert!(decision.china_url.starts_with("https://cdn.jsdelivr.net/"));

        let failed = ProbeOutcome {
            path: "a.pdf".to_string(),
            reachable: false,
            status_code: 404,
            error: None,
        };
        let fallback = prober.decide(&failed);
        assert!(fallback.china_url.starts_with("https://ghfast.top/"));
    }
}
