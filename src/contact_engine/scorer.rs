//! Weighted multi-field match scoring between two contacts

use crate::contact_engine::ai_reviewer::AiVerdict;
use crate::contact_engine::similarity::similarity;
use crate::contact_engine::{non_empty, to_percentage, ContactRecord};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

lazy_static! {
    static ref NON_DIGIT: Regex = Regex::new(r"\D").unwrap();
}

const EMAIL_WEIGHT: f64 = 0.4;
const NAME_WEIGHT: f64 = 0.3;
const COMPANY_WEIGHT: f64 = 0.2;
const PHONE_WEIGHT: f64 = 0.1;

const NAME_MIN_SIMILARITY: f64 = 0.7;
const COMPANY_MIN_SIMILARITY: f64 = 0.8;

/// Accumulated score a pair needs before an AI review is worth asking for.
const REVIEW_MIN_ACCUMULATED: f64 = 0.5;

/// How the accumulated field weights become the final score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreNormalization {
    /// Accumulated weight divided by the number of contributing fields
    FactorAverage,
    /// Accumulated weight as-is; all fields matching exactly gives 1.0
    WeightedSum,
}

/// Outcome of scoring one pair of contacts.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchBreakdown {
    pub score: f64,
    /// Sum of contributed weights before normalization
    pub accumulated: f64,
    pub factors: u32,
    pub reasons: Vec<String>,
}

impl MatchBreakdown {
    pub fn qualifies_for_review(&self) -> bool {
        self.factors > 0 && self.accumulated > REVIEW_MIN_ACCUMULATED
    }

    /// Average the rule-based score with an AI verdict and append its reasons.
    pub fn with_verdict(mut self, verdict: AiVerdict) -> Self {
        self.score = (self.score + verdict.similarity) / 2.0;
        self.reasons.extend(verdict.reasons);
        self
    }
}

pub struct MatchScorer {
    normalization: ScoreNormalization,
}

impl Default for MatchScorer {
    fn default() -> Self {
        Self::new(ScoreNormalization::FactorAverage)
    }
}

impl MatchScorer {
    pub fn new(normalization: ScoreNormalization) -> Self {
        Self { normalization }
    }

    pub fn score(&self, contact1: &ContactRecord, contact2: &ContactRecord) -> MatchBreakdown {
        let mut accumulated = 0.0;
        let mut factors = 0u32;
        let mut reasons = Vec::new();

        // Email: exact, case-insensitive
        if let (Some(e1), Some(e2)) = (non_empty(&contact1.email), non_empty(&contact2.email)) {
            if e1.to_lowercase() == e2.to_lowercase() {
                accumulated += EMAIL_WEIGHT;
                factors += 1;
                reasons.push("Exact email match".to_string());
            }
        }

        // Name: fuzzy on the normalized full name
        let name1 = normalized_name(contact1);
        let name2 = normalized_name(contact2);
        if !name1.is_empty() && !name2.is_empty() {
            let name_similarity = similarity(&name1, &name2);
            if name_similarity > NAME_MIN_SIMILARITY {
                accumulated += name_similarity * NAME_WEIGHT;
                factors += 1;
                reasons.push(format!("Name similarity: {}%", to_percentage(name_similarity)));
            }
        }

        // Company: fuzzy
        if let (Some(c1), Some(c2)) = (non_empty(&contact1.company), non_empty(&contact2.company)) {
            let company_similarity = similarity(&c1.to_lowercase(), &c2.to_lowercase());
            if company_similarity > COMPANY_MIN_SIMILARITY {
                accumulated += company_similarity * COMPANY_WEIGHT;
                factors += 1;
                reasons.push(format!("Company similarity: {}%", to_percentage(company_similarity)));
            }
        }

        // Phone: digits only, exact
        let phone1 = normalized_phone(&contact1.phone);
        let phone2 = normalized_phone(&contact2.phone);
        if !phone1.is_empty() && phone1 == phone2 {
            accumulated += PHONE_WEIGHT;
            factors += 1;
            reasons.push("Phone number match".to_string());
        }

        let score = if factors == 0 {
            0.0
        } else {
            match self.normalization {
                ScoreNormalization::FactorAverage => accumulated / factors.max(1) as f64,
                ScoreNormalization::WeightedSum => accumulated.min(1.0),
            }
        };

        MatchBreakdown {
            score,
            accumulated,
            factors,
            reasons,
        }
    }
}

fn normalized_name(contact: &ContactRecord) -> String {
    contact.display_name().to_lowercase().trim().to_string()
}

fn normalized_phone(phone: &Option<String>) -> String {
    phone
        .as_deref()
        .map(|p| NON_DIGIT.replace_all(p, "").into_owned())
        .unwrap_or_default()
}
