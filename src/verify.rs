// src/verify.rs
//! URL verification side-channel.
//!
//! Runs after generation, independently of the pipeline: drafts and news
//! items carry canonical URLs exactly so this check can re-validate them
//! later. HEAD first; some hosts reject HEAD, so 403/405 falls back to GET.

use std::time::Duration;

use tracing::debug;

use crate::sources::types::VerificationStatus;

const VERIFY_TIMEOUT: Duration = Duration::from_secs(10);

pub struct UrlVerifier {
    client: reqwest::Client,
}

impl Default for UrlVerifier {
    fn default() -> Self {
        Self::new()
    }
}

impl UrlVerifier {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .user_agent("postsmith/0.1")
            .connect_timeout(Duration::from_secs(4))
            .timeout(VERIFY_TIMEOUT)
            .build()
            .expect("reqwest client");
        Self { client }
    }

    /// Classify reachability of one URL. Network-level failure means we could
    /// not tell, so the URL stays `Unverified` rather than `Broken`.
    pub async fn verify(&self, url: &str) -> VerificationStatus {
        let head = match self.client.head(url).send().await {
            Ok(resp) => resp,
            Err(e) => {
                debug!(error = %e, url, "HEAD failed");
                return VerificationStatus::Unverified;
            }
        };

        let status = head.status();
        if status.is_success() {
            return VerificationStatus::Verified;
        }

        // Hosts that disallow HEAD get a second chance with GET.
        if matches!(status.as_u16(), 403 | 405) {
            return match self.client.get(url).send().await {
                Ok(resp) if resp.status().is_success() => VerificationStatus::Verified,
                Ok(_) => VerificationStatus::Broken,
                Err(e) => {
                    debug!(error = %e, url, "GET fallback failed");
                    VerificationStatus::Unverified
                }
            };
        }

        VerificationStatus::Broken
    }
}
