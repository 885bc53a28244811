//! Core review records and sentiment scores.

use serde::{Deserialize, Serialize};

/// One row of the uploaded CSV after validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewRecord {
    pub hospital_id: String,
    pub review_text: String,
    /// Validated to 1..=5.
    pub star_rating: u8,
}

impl ReviewRecord {
    /// Star score on the same −2..+2 scale as review scores.
    pub fn star_score(&self) -> f64 {
        self.star_rating as f64 - 3.0
    }
}

/// Softmax probabilities from one sentiment model over one review.
/// Two-class checkpoints report `neutral = 0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SentimentScore {
    pub positive: f64,
    pub neutral: f64,
    pub negative: f64,
}

impl SentimentScore {
    /// Undecided score used for empty text and scoring failures.
    pub const NEUTRAL: SentimentScore =
        SentimentScore { positive: 0.5, neutral: 0.0, negative: 0.5 };

    pub fn new(positive: f64, neutral: f64, negative: f64) -> Self {
        Self { positive, neutral, negative }
    }

    /// Review score: `2·P(pos) − 2·P(neg)`, range −2..+2. Neutral mass
    /// pulls the score toward zero without contributing directly.
    pub fn review_score(&self) -> f64 {
        (self.positive * 2.0) - (self.negative * 2.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn star_score_is_centered_on_three() {
        let rec = ReviewRecord {
            hospital_id: "h1".into(),
            review_text: "とても良い病院です".into(),
            star_rating: 5,
        };
        assert_eq!(rec.star_score(), 2.0);

        let rec = ReviewRecord { star_rating: 1, ..rec };
        assert_eq!(rec.star_score(), -2.0);
    }

    #[test]
    fn review_score_spans_minus_two_to_two() {
        assert_eq!(SentimentScore::new(1.0, 0.0, 0.0).review_score(), 2.0);
        assert_eq!(SentimentScore::new(0.0, 0.0, 1.0).review_score(), -2.0);
        assert_eq!(SentimentScore::NEUTRAL.review_score(), 0.0);
        // A fully neutral 3-class prediction also lands on zero.
        assert_eq!(SentimentScore::new(0.0, 1.0, 0.0).review_score(), 0.0);
    }
}
