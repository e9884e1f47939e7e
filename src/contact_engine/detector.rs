//! Candidate pool scanning, threshold filtering and ranking

use crate::contact_engine::ai_reviewer::{AiReviewer, CompletionProvider};
use crate::contact_engine::scorer::{MatchBreakdown, MatchScorer};
use crate::contact_engine::{ContactRecord, MatchResult, SuggestedAction};
use tracing::debug;

/// Scans a candidate pool against one target contact.
///
/// Every candidate is compared once, so cost grows linearly with the pool
/// and quadratically with name and company lengths. Large pools should be
/// narrowed by the caller first (e.g. by email domain).
pub struct DuplicateDetector {
    scorer: MatchScorer,
}

impl Default for DuplicateDetector {
    fn default() -> Self {
        Self::new(MatchScorer::default())
    }
}

impl DuplicateDetector {
    pub fn new(scorer: MatchScorer) -> Self {
        Self { scorer }
    }

    /// Rule-based detection only.
    pub fn detect(&self, target: &ContactRecord, candidates: &[ContactRecord], threshold: f64) -> Vec<MatchResult> {
        let scored = candidates
            .iter()
            .map(|candidate| (candidate, self.scorer.score(target, candidate)));

        Self::rank(scored, threshold)
    }

    /// Detection with an AI second opinion on promising pairs.
    ///
    /// Reviews run one candidate at a time. A failed review leaves the
    /// rule-based score untouched.
    pub async fn detect_with_review<P: CompletionProvider>(
        &self,
        target: &ContactRecord,
        candidates: &[ContactRecord],
        threshold: f64,
        reviewer: &AiReviewer<P>,
    ) -> Vec<MatchResult> {
        let mut scored = Vec::new();

        for candidate in candidates {
            let mut breakdown = self.scorer.score(target, candidate);

            if breakdown.qualifies_for_review() {
                if let Some(verdict) = reviewer.review(target, candidate).await {
                    debug!(
                        candidate_id = %candidate.id,
                        rule_score = breakdown.score,
                        ai_score = verdict.similarity,
                        "Applying AI verdict"
                    );
                    breakdown = breakdown.with_verdict(verdict);
                }
            }

            scored.push((candidate, breakdown));
        }

        Self::rank(scored, threshold)
    }

    fn rank<'a, I>(scored: I, threshold: f64) -> Vec<MatchResult>
    where
        I: IntoIterator<Item = (&'a ContactRecord, MatchBreakdown)>,
    {
        let mut results: Vec<MatchResult> = scored
            .into_iter()
            .filter(|(_, breakdown)| breakdown.score >= threshold)
            .map(|(candidate, breakdown)| MatchResult {
                contact_id: candidate.id.clone(),
                name: candidate.display_name(),
                email: candidate.email.clone(),
                company: candidate.company.clone(),
                match_score: breakdown.score,
                match_reasons: breakdown.reasons,
                suggested_action: SuggestedAction::for_score(breakdown.score),
            })
            .collect();

        // stable: ties keep pool order
        results.sort_by(|a, b| b.match_score.total_cmp(&a.match_score));
        results
    }
}
