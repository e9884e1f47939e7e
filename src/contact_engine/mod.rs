//! Duplicate contact detection engine
//!
//! Scores a target contact against a pool of candidates using string
//! similarity and weighted field comparisons, keeps the matches above a
//! threshold, and proposes merges for the high-confidence ones. An optional
//! AI reviewer can refine promising matches; when it is missing or failing,
//! detection degrades to the rule-based score.

pub mod similarity;
pub mod scorer;
pub mod detector;
pub mod recommender;
pub mod ai_reviewer;
pub mod store;

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use ai_reviewer::{AiReviewer, CompletionProvider, OpenAiProvider};
use detector::DuplicateDetector;
use recommender::MergeRecommender;
use scorer::{MatchScorer, ScoreNormalization};

/// Contact as supplied by the caller. Every field except the id is optional
/// and an absent field simply contributes nothing to a match.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactRecord {
    #[serde(default)]
    pub id: String,
    pub name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub title: Option<String>,
}

impl ContactRecord {
    /// `name` if set, otherwise `first_name last_name`, trimmed.
    pub fn display_name(&self) -> String {
        match non_empty(&self.name) {
            Some(name) => name.trim().to_string(),
            None => format!(
                "{} {}",
                self.first_name.as_deref().unwrap_or(""),
                self.last_name.as_deref().unwrap_or("")
            )
            .trim()
            .to_string(),
        }
    }
}

/// Treats `Some("")` the same as `None`.
pub(crate) fn non_empty(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|value| !value.is_empty())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestedAction {
    Merge,
    Review,
    KeepSeparate,
}

impl SuggestedAction {
    pub fn for_score(score: f64) -> Self {
        if score >= 0.95 {
            SuggestedAction::Merge
        } else if score >= 0.85 {
            SuggestedAction::Review
        } else {
            SuggestedAction::KeepSeparate
        }
    }
}

/// One candidate that scored at or above the detection threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    pub contact_id: String,
    pub name: String,
    pub email: Option<String>,
    pub company: Option<String>,
    pub match_score: f64,
    pub match_reasons: Vec<String>,
    pub suggested_action: SuggestedAction,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeRecommendation {
    pub primary_contact_id: String,
    pub duplicate_ids: Vec<String>,
    /// Mean score of the grouped duplicates, as a rounded percentage
    pub confidence: u32,
    pub reasoning: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateReport {
    pub contact_id: String,
    pub has_duplicates: bool,
    pub duplicates: Vec<MatchResult>,
    /// Best duplicate score as a rounded percentage, 0 when nothing matched
    pub confidence: u32,
    pub merge_recommendations: Vec<MergeRecommendation>,
}

/// Configuration for the duplicate engine
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub default_threshold: f64,
    pub normalization: ScoreNormalization,
    pub ai_review_enabled: bool,
    pub ai_timeout_secs: u64,
    pub ai_model: String,
    pub ai_api_base: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_threshold: 0.8,
            normalization: ScoreNormalization::FactorAverage,
            ai_review_enabled: true,
            ai_timeout_secs: 5,
            ai_model: "gpt-4o-mini".to_string(),
            ai_api_base: "https://api.openai.com/v1".to_string(),
        }
    }
}

impl EngineConfig {
    /// Resolves a caller-supplied threshold, clamped to `[0, 1]`.
    pub fn resolve_threshold(&self, requested: Option<f64>) -> f64 {
        let threshold = requested
            .filter(|t| t.is_finite())
            .unwrap_or(self.default_threshold);
        threshold.clamp(0.0, 1.0)
    }

    /// Time budget for one AI review, never below one second.
    pub fn ai_timeout(&self) -> Duration {
        Duration::from_secs(self.ai_timeout_secs.max(1))
    }
}

/// Main duplicate detection engine
pub struct DuplicateEngine<P = OpenAiProvider> {
    config: EngineConfig,
    detector: Arc<DuplicateDetector>,
    recommender: Arc<MergeRecommender>,
    reviewer: Option<Arc<AiReviewer<P>>>,
}

impl<P: CompletionProvider> DuplicateEngine<P> {
    pub fn new(config: EngineConfig, provider: Option<P>) -> Self {
        let reviewer = if config.ai_review_enabled {
            provider.map(|p| {
                Arc::new(AiReviewer::new(p, config.ai_timeout()))
            })
        } else {
            None
        };

        Self {
            detector: Arc::new(DuplicateDetector::new(MatchScorer::new(config.normalization))),
            recommender: Arc::new(MergeRecommender::new()),
            reviewer,
            config,
        }
    }

    pub fn ai_review_active(&self) -> bool {
        self.reviewer.is_some()
    }

    /// Find duplicates of `target` among `candidates`.
    ///
    /// The target's own id is dropped from the pool. Never fails: AI review
    /// problems are logged and the rule-based scores are used instead.
    pub async fn find_duplicates(
        &self,
        target: &ContactRecord,
        candidates: &[ContactRecord],
        threshold: Option<f64>,
    ) -> DuplicateReport {
        let threshold = self.config.resolve_threshold(threshold);
        let pool: Vec<ContactRecord> = candidates
            .iter()
            .filter(|candidate| target.id.is_empty() || candidate.id != target.id)
            .cloned()
            .collect();

        debug!(
            contact_id = %target.id,
            pool_size = candidates.len(),
            threshold,
            ai_review = self.reviewer.is_some(),
            "Scoring candidate pool"
        );

        let duplicates = match self.reviewer.as_deref() {
            Some(reviewer) => {
                self.detector
                    .detect_with_review(target, &pool, threshold, reviewer)
                    .await
            }
            None => self.detector.detect(target, &pool, threshold),
        };
        let merge_recommendations = self.recommender.recommend(target, &duplicates);

        let confidence = duplicates
            .first()
            .map(|best| to_percentage(best.match_score))
            .unwrap_or(0);

        info!(
            contact_id = %target.id,
            duplicates = duplicates.len(),
            recommendations = merge_recommendations.len(),
            confidence,
            "Duplicate detection finished"
        );

        DuplicateReport {
            contact_id: target.id.clone(),
            has_duplicates: !duplicates.is_empty(),
            duplicates,
            confidence,
            merge_recommendations,
        }
    }
}

/// Score in `[0, 1]` to a rounded percentage.
pub(crate) fn to_percentage(score: f64) -> u32 {
    (score * 100.0).round().clamp(0.0, 100.0) as u32
}
