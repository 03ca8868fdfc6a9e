use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::{Error, Result};

pub const MIN_SCORE: i32 = 0;
pub const MAX_SCORE: i32 = 10;
pub const NOT_AVAILABLE: &str = "N/A";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ApplicationEvaluation {
    pub id: Uuid,
    pub application_id: Uuid,
    pub evaluator_id: Uuid,
    pub technical_score: i16,
    pub experience_score: i16,
    pub cultural_fit_score: i16,
    pub comments: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ApplicationEvaluation {
    pub fn total(&self) -> i32 {
        i32::from(self.technical_score)
            + i32::from(self.experience_score)
            + i32::from(self.cultural_fit_score)
    }

    pub fn average(&self) -> Decimal {
        round_score(Decimal::from(self.total()) / Decimal::from(3))
    }
}

/// A validated score triple. Construction is the only place bounds are checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Scores {
    pub technical: i16,
    pub experience: i16,
    pub cultural_fit: i16,
}

impl Scores {
    pub fn new(technical: i32, experience: i32, cultural_fit: i32) -> Result<Self> {
        Ok(Self {
            technical: bounded("technical_score", technical)?,
            experience: bounded("experience_score", experience)?,
            cultural_fit: bounded("cultural_fit_score", cultural_fit)?,
        })
    }
}

fn bounded(field: &'static str, value: i32) -> Result<i16> {
    if (MIN_SCORE..=MAX_SCORE).contains(&value) {
        Ok(value as i16)
    } else {
        Err(Error::InvalidScore { field, value })
    }
}

/// Averages over every evaluation of one application, one decimal place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScoreAverages {
    pub technical: Decimal,
    pub experience: Decimal,
    pub cultural_fit: Decimal,
    pub total: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EvaluationAggregate {
    pub count: i64,
    /// `None` when nobody has evaluated the application yet.
    pub averages: Option<ScoreAverages>,
}

impl EvaluationAggregate {
    pub fn empty() -> Self {
        Self {
            count: 0,
            averages: None,
        }
    }

    /// Builds the aggregate from unrounded per-dimension means as returned by the store.
    pub fn from_means(
        count: i64,
        technical: Option<Decimal>,
        experience: Option<Decimal>,
        cultural_fit: Option<Decimal>,
    ) -> Self {
        match (count, technical, experience, cultural_fit) {
            (n, Some(t), Some(e), Some(c)) if n > 0 => Self {
                count: n,
                averages: Some(ScoreAverages {
                    technical: round_score(t),
                    experience: round_score(e),
                    cultural_fit: round_score(c),
                    total: round_score(score_key(t, e, c)),
                }),
            },
            _ => Self::empty(),
        }
    }

    pub fn from_evaluations(evaluations: &[ApplicationEvaluation]) -> Self {
        if evaluations.is_empty() {
            return Self::empty();
        }
        let n = Decimal::from(evaluations.len() as i64);
        let sum = |f: fn(&ApplicationEvaluation) -> i16| -> Decimal {
            evaluations.iter().map(|e| Decimal::from(f(e))).sum::<Decimal>() / n
        };
        Self::from_means(
            evaluations.len() as i64,
            Some(sum(|e| e.technical_score)),
            Some(sum(|e| e.experience_score)),
            Some(sum(|e| e.cultural_fit_score)),
        )
    }

    pub fn display_total(&self) -> String {
        format_score(self.averages.map(|a| a.total))
    }
}

/// The single sort and display key: mean of the three per-dimension means.
pub fn score_key(technical: Decimal, experience: Decimal, cultural_fit: Decimal) -> Decimal {
    (technical + experience + cultural_fit) / Decimal::from(3)
}

pub fn round_score(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
}

/// One decimal place, or `N/A` when there is no score.
pub fn format_score(score: Option<Decimal>) -> String {
    match score {
        Some(value) => format!("{:.1}", round_score(value)),
        None => NOT_AVAILABLE.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn evaluation(t: i16, e: i16, c: i16) -> ApplicationEvaluation {
        ApplicationEvaluation {
            id: Uuid::new_v4(),
            application_id: Uuid::nil(),
            evaluator_id: Uuid::new_v4(),
            technical_score: t,
            experience_score: e,
            cultural_fit_score: c,
            comments: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn scores_outside_bounds_are_rejected() {
        assert!(Scores::new(0, 10, 5).is_ok());
        match Scores::new(11, 5, 5) {
            Err(Error::InvalidScore { field, value }) => {
                assert_eq!(field, "technical_score");
                assert_eq!(value, 11);
            }
            other => panic!("expected InvalidScore, got {other:?}"),
        }
        assert!(Scores::new(5, -1, 5).is_err());
        assert!(Scores::new(5, 5, 100).is_err());
    }

    #[test]
    fn aggregate_of_nothing_is_not_available() {
        let aggregate = EvaluationAggregate::from_evaluations(&[]);
        assert_eq!(aggregate.count, 0);
        assert!(aggregate.averages.is_none());
        assert_eq!(aggregate.display_total(), "N/A");
    }

    #[test]
    fn aggregate_averages_each_dimension() {
        let aggregate =
            EvaluationAggregate::from_evaluations(&[evaluation(10, 10, 10), evaluation(8, 8, 8)]);
        let averages = aggregate.averages.unwrap();
        assert_eq!(aggregate.count, 2);
        assert_eq!(averages.technical, Decimal::from(9));
        assert_eq!(averages.total, Decimal::from(9));
        assert_eq!(aggregate.display_total(), "9.0");
    }

    #[test]
    fn aggregate_rounds_to_one_decimal() {
        let aggregate = EvaluationAggregate::from_evaluations(&[evaluation(7, 8, 8)]);
        let averages = aggregate.averages.unwrap();
        assert_eq!(averages.total, Decimal::from_str("7.7").unwrap());
        assert_eq!(aggregate.display_total(), "7.7");
    }

    #[test]
    fn single_evaluation_derivations() {
        let e = evaluation(9, 6, 7);
        assert_eq!(e.total(), 22);
        assert_eq!(e.average(), Decimal::from_str("7.3").unwrap());
    }

    #[test]
    fn format_score_pads_one_decimal() {
        assert_eq!(format_score(Some(Decimal::from(9))), "9.0");
        assert_eq!(format_score(Some(Decimal::from_str("8.66").unwrap())), "8.7");
        assert_eq!(format_score(None), "N/A");
    }
}
