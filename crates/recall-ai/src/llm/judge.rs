//! Result types for structured judging completions.
//!
//! A judge prompt asks the model either for bounded integer scores or for a
//! pairwise verdict. The types here only validate and carry those results;
//! building the prompts is left to the caller.

use serde::{Deserialize, Serialize};

use crate::error::AiError;

/// An integer score in `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Score(u8);

impl Score {
    pub const MAX: u8 = 100;

    pub fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for Score {
    type Error = AiError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        if (0..=i64::from(Self::MAX)).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(AiError::InvalidFormat(format!(
                "score {value} is outside 0..=100"
            )))
        }
    }
}

impl From<Score> for u8 {
    fn from(score: Score) -> Self {
        score.0
    }
}

/// Single-answer scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreCard {
    pub faithfulness_score: Score,
    pub informativeness_score: Score,
    pub coherency_score: Score,
}

impl ScoreCard {
    pub fn mean(&self) -> f64 {
        let sum = u32::from(self.faithfulness_score.value())
            + u32::from(self.informativeness_score.value())
            + u32::from(self.coherency_score.value());
        f64::from(sum) / 3.0
    }
}

/// Outcome of comparing two candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    #[serde(rename = "option 1 is better")]
    FirstBetter,
    #[serde(rename = "option 2 is better")]
    SecondBetter,
    #[serde(rename = "draw")]
    Draw,
}

/// Pairwise verdicts along the same criteria as [`ScoreCard`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairwiseVerdict {
    pub faithfulness: Verdict,
    pub informativeness: Verdict,
    pub coherency: Verdict,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::structured::parse_json_content;

    #[test]
    fn test_score_card_accepts_bounded_scores() {
        let card: ScoreCard = parse_json_content(
            r#"{"faithfulness_score": 90, "informativeness_score": 60, "coherency_score": 30}"#,
        )
        .unwrap();
        assert_eq!(card.faithfulness_score.value(), 90);
        assert!((card.mean() - 60.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_score_card_rejects_out_of_range() {
        let result: crate::error::Result<ScoreCard> = parse_json_content(
            r#"{"faithfulness_score": 101, "informativeness_score": 60, "coherency_score": 30}"#,
        );
        assert!(result.is_err());

        let negative: crate::error::Result<ScoreCard> = parse_json_content(
            r#"{"faithfulness_score": -1, "informativeness_score": 60, "coherency_score": 30}"#,
        );
        assert!(negative.is_err());
    }

    #[test]
    fn test_verdict_wire_names() {
        let verdict: PairwiseVerdict = parse_json_content(
            r#"{"faithfulness": "option 1 is better", "informativeness": "draw", "coherency": "option 2 is better"}"#,
        )
        .unwrap();
        assert_eq!(verdict.faithfulness, Verdict::FirstBetter);
        assert_eq!(verdict.informativeness, Verdict::Draw);
        assert_eq!(verdict.coherency, Verdict::SecondBetter);
        assert_eq!(
            serde_json::to_string(&Verdict::Draw).unwrap(),
            "\"draw\""
        );
    }
}
