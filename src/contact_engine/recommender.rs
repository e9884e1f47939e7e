//! Merge proposals for high-confidence duplicates

use crate::contact_engine::{to_percentage, ContactRecord, MatchResult, MergeRecommendation};

const MERGE_MIN_SCORE: f64 = 0.9;

const REASONING: [&str; 3] = [
    "High similarity scores detected",
    "Exact or near-exact matches found",
    "Automated merge recommended",
];

pub struct MergeRecommender {
    min_score: f64,
}

impl Default for MergeRecommender {
    fn default() -> Self {
        Self::new()
    }
}

impl MergeRecommender {
    pub fn new() -> Self {
        Self {
            min_score: MERGE_MIN_SCORE,
        }
    }

    /// At most one recommendation, grouping every match scoring >= 0.9
    /// under `target`.
    pub fn recommend(&self, target: &ContactRecord, matches: &[MatchResult]) -> Vec<MergeRecommendation> {
        let high_confidence: Vec<&MatchResult> = matches
            .iter()
            .filter(|m| m.match_score >= self.min_score)
            .collect();

        if high_confidence.is_empty() {
            return Vec::new();
        }

        let mean = high_confidence.iter().map(|m| m.match_score).sum::<f64>()
            / high_confidence.len() as f64;

        vec![MergeRecommendation {
            primary_contact_id: target.id.clone(),
            duplicate_ids: high_confidence.iter().map(|m| m.contact_id.clone()).collect(),
            confidence: to_percentage(mean),
            reasoning: REASONING.iter().map(|r| r.to_string()).collect(),
        }]
    }
}
