use anyhow::Result;
use serde::Serialize;

use crate::classifier::JudgmentAdapter;
use crate::config::Config;
use crate::extractor::{extract_evidence, ExtractedEvidence};
use crate::fusion::fuse_scores;
use crate::heuristics::calculate_heuristic_score;
use crate::marketing::analyze_marketing_legitimacy;
use crate::submission::RawSubmission;
use crate::url_resolver::{UrlResolution, UrlResolver};
use crate::verdict::{assemble_verdict, Verdict};

/// Service status for the observability surface
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub service: &'static str,
    pub status: &'static str,
    pub ai_enabled: bool,
    pub ai_service: &'static str,
    pub version: &'static str,
}

/// One engine per process: immutable configuration, a resolver client and
/// the classifier capability selected at startup. No state survives a
/// submission.
pub struct AnalysisEngine {
    resolver: UrlResolver,
    adapter: JudgmentAdapter,
}

impl AnalysisEngine {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            resolver: UrlResolver::new(&config.resolver)?,
            adapter: JudgmentAdapter::new(&config.classifier),
        })
    }

    /// Engine with an injected classifier capability, for callers that
    /// bring their own
    pub fn with_adapter(config: &Config, adapter: JudgmentAdapter) -> Result<Self> {
        Ok(Self {
            resolver: UrlResolver::new(&config.resolver)?,
            adapter,
        })
    }

    pub fn ai_enabled(&self) -> bool {
        self.adapter.is_enabled()
    }

    pub fn status(&self) -> StatusReport {
        StatusReport {
            service: "phish-triage",
            status: "running",
            ai_enabled: self.ai_enabled(),
            ai_service: if self.ai_enabled() {
                "remote classifier"
            } else {
                "disabled"
            },
            version: env!("CARGO_PKG_VERSION"),
        }
    }

    /// Score one submission. Infallible: every failure along the way
    /// degrades into data and the verdict is always complete.
    ///
    /// Resolution (network) and heuristic scoring (pure) share only
    /// read-only inputs and run concurrently; the judgment needs the
    /// resolution and runs after.
    pub async fn analyze(&self, submission: &RawSubmission) -> Verdict {
        let evidence = extract_evidence(&submission.raw_input);

        let resolution_task = async {
            match evidence.url.as_deref() {
                Some(url) if self.resolver.is_shortened(url) => {
                    log::info!("resolving shortened URL: {url}");
                    Some(self.resolver.resolve(url).await)
                }
                _ => None,
            }
        };
        let scoring_task = async {
            calculate_heuristic_score(
                &submission.raw_input,
                evidence.url.as_deref(),
                &submission.enrichment,
                submission.platform(),
            )
        };
        let (resolution, (heuristic_score, _evidence_items)) =
            tokio::join!(resolution_task, scoring_task);

        self.finish(submission, evidence, heuristic_score, resolution)
            .await
    }

    /// Testing seam: same pipeline with the resolution supplied by the
    /// caller, so nothing touches the network.
    pub async fn analyze_with_resolution(
        &self,
        submission: &RawSubmission,
        resolution: Option<UrlResolution>,
    ) -> Verdict {
        let evidence = extract_evidence(&submission.raw_input);
        let (heuristic_score, _evidence_items) = calculate_heuristic_score(
            &submission.raw_input,
            evidence.url.as_deref(),
            &submission.enrichment,
            submission.platform(),
        );

        self.finish(submission, evidence, heuristic_score, resolution)
            .await
    }

    async fn finish(
        &self,
        submission: &RawSubmission,
        evidence: ExtractedEvidence,
        heuristic_score: i32,
        resolution: Option<UrlResolution>,
    ) -> Verdict {
        let marketing = resolution
            .as_ref()
            .map(|r| analyze_marketing_legitimacy(r, &submission.raw_input));

        let judgment = self
            .adapter
            .judge(
                &evidence.message_text,
                evidence.url.as_deref(),
                &submission.enrichment,
                resolution.as_ref(),
            )
            .await;

        let fusion = fuse_scores(
            heuristic_score,
            &judgment,
            marketing.as_ref(),
            &submission.enrichment,
            submission.platform(),
        );

        log::info!(
            "verdict: final={} heuristic={} risk={:?} action={}",
            fusion.final_score,
            fusion.heuristic_score,
            fusion.risk_level,
            fusion.action.label()
        );

        assemble_verdict(
            &evidence,
            &submission.enrichment,
            judgment,
            fusion,
            resolution,
            marketing,
        )
    }
}
