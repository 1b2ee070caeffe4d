//! Estimate accuracy of accepted issues.

use crate::models::Issue;

use super::Vocabulary;

/// `|(actual - |actual - estimate|) * 100| / actual` for issues in the
/// accepted status with both logged time and an original estimate.
///
/// An exact estimate scores 100; being off by the whole actual time scores 0.
/// Underestimates and overestimates of the same size score the same. The
/// outer absolute value makes the score climb again past that point, so an
/// estimate of three times the actual time also scores 100.
pub fn accuracy(issue: &Issue, vocabulary: &Vocabulary) -> Option<f64> {
    if issue.status != vocabulary.accepted || issue.time_spent <= 0 || issue.original_estimate <= 0 {
        return None;
    }
    let actual = issue.time_spent as f64;
    let estimate = issue.original_estimate as f64;
    let difference = (actual - estimate).abs();
    Some(((actual - difference) * 100.0).abs() / actual)
}
