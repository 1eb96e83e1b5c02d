//! Aggregate statistics over attempt records.
//!
//! Everything here is computed on read from the attempts handed in; nothing
//! is cached or maintained incrementally.

use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;

use crate::models::domain::QuizAttempt;

/// `scored / total * 100`, or 0 when there were no questions.
pub fn percentage(scored: i32, total: i32) -> f64 {
    if total <= 0 {
        return 0.0;
    }
    scored as f64 / total as f64 * 100.0
}

pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Default)]
pub struct AttemptSummary {
    pub attempts: usize,
    pub average_percentage: f64,
    pub best_percentage: f64,
    pub total_questions_answered: i64,
}

/// Mean and max are taken over per-attempt percentages, so attempts with
/// different question counts weigh the same.
pub fn summarize(attempts: &[QuizAttempt]) -> AttemptSummary {
    if attempts.is_empty() {
        return AttemptSummary::default();
    }

    let percentages: Vec<f64> = attempts.iter().map(QuizAttempt::percentage).collect();
    let average = percentages.iter().sum::<f64>() / percentages.len() as f64;
    let best = percentages.iter().cloned().fold(0.0, f64::max);

    AttemptSummary {
        attempts: attempts.len(),
        average_percentage: average,
        best_percentage: best,
        total_questions_answered: attempts.iter().map(|a| a.total_questions as i64).sum(),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceTier {
    pub min_percentage: f64,
    pub label: String,
}

/// Threshold ladder mapping a percentage to a label. Thresholds are strictly
/// descending and the last one is 0, so every percentage gets a label.
#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceLadder {
    tiers: Vec<PerformanceTier>,
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("invalid performance ladder: {0}")]
pub struct LadderError(String);

impl PerformanceLadder {
    pub fn new(tiers: Vec<PerformanceTier>) -> Result<Self, LadderError> {
        let last = tiers
            .last()
            .ok_or_else(|| LadderError("at least one tier is required".into()))?;
        if last.min_percentage != 0.0 {
            return Err(LadderError("lowest tier must start at 0".into()));
        }
        if tiers
            .windows(2)
            .any(|pair| pair[0].min_percentage <= pair[1].min_percentage)
        {
            return Err(LadderError("thresholds must be strictly descending".into()));
        }
        if tiers.iter().any(|t| !(0.0..=100.0).contains(&t.min_percentage)) {
            return Err(LadderError("thresholds must lie within 0-100".into()));
        }
        Ok(Self { tiers })
    }

    pub fn bucket(&self, percentage: f64) -> &str {
        self.tiers
            .iter()
            .find(|tier| percentage >= tier.min_percentage)
            .or_else(|| self.tiers.last())
            .map(|tier| tier.label.as_str())
            .unwrap_or_default()
    }

    pub fn tiers(&self) -> &[PerformanceTier] {
        &self.tiers
    }
}

impl Default for PerformanceLadder {
    fn default() -> Self {
        let tiers = [
            (90.0, "Excellent"),
            (80.0, "Very Good"),
            (70.0, "Good"),
            (60.0, "Average"),
            (50.0, "Below Average"),
            (0.0, "Poor"),
        ]
        .into_iter()
        .map(|(min_percentage, label)| PerformanceTier {
            min_percentage,
            label: label.to_string(),
        })
        .collect();

        Self { tiers }
    }
}

/// Parses `90:Excellent,75:Good,0:Needs Improvement`.
impl FromStr for PerformanceLadder {
    type Err = LadderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tiers = s
            .split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(|entry| {
                let (threshold, label) = entry
                    .split_once(':')
                    .ok_or_else(|| LadderError(format!("'{}' is not threshold:label", entry)))?;
                let min_percentage = threshold
                    .trim()
                    .parse::<f64>()
                    .map_err(|_| LadderError(format!("'{}' is not a number", threshold)))?;
                let label = label.trim();
                if label.is_empty() {
                    return Err(LadderError(format!("tier {} has no label", threshold)));
                }
                Ok(PerformanceTier {
                    min_percentage,
                    label: label.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Self::new(tiers)
    }
}
