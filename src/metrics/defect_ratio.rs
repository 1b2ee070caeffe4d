//! Defect ratio: how often accepted work is later rejected.

use crate::models::Issue;

use super::Vocabulary;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DefectCounts {
    /// Transitions into `accepted`.
    pub delivered: u64,
    /// Transitions from `accepted` into `rejected`.
    pub rejected: u64,
}

impl DefectCounts {
    pub fn add(&mut self, issue: &Issue, vocabulary: &Vocabulary) {
        for (_, t) in issue.transitions() {
            if !t.is(&vocabulary.status_field) {
                continue;
            }
            if t.goes_to(&vocabulary.accepted) {
                self.delivered += 1;
            }
            if t.comes_from(&vocabulary.accepted) && t.goes_to(&vocabulary.rejected) {
                self.rejected += 1;
            }
        }
    }

    /// `rejected / delivered`; `None` when nothing was delivered.
    pub fn ratio(&self) -> Option<f64> {
        (self.delivered > 0).then(|| self.rejected as f64 / self.delivered as f64)
    }
}

pub fn count(issues: &[Issue], vocabulary: &Vocabulary) -> DefectCounts {
    let mut counts = DefectCounts::default();
    for issue in issues {
        counts.add(issue, vocabulary);
    }
    counts
}

/// Mean of the defined ratios; `None` if there are none.
pub fn mean(ratios: &[f64]) -> Option<f64> {
    (!ratios.is_empty()).then(|| ratios.iter().sum::<f64>() / ratios.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::test_support::{issue, transition_at};

    #[test]
    fn counts_deliveries_and_rejections() {
        let mut first = issue("1", "Rejected");
        first.history = vec![
            transition_at("2024-03-04T09:00:00.000+0000", "status", "Delivered", "Accepted"),
            transition_at("2024-03-05T09:00:00.000+0000", "status", "Accepted", "Rejected"),
        ];
        let mut second = issue("2", "Accepted");
        second.history = vec![transition_at("2024-03-06T09:00:00.000+0000", "status", "Delivered", "Accepted")];
        let mut third = issue("3", "Rejected");
        // Rejected without ever being accepted is not a defect.
        third.history = vec![transition_at("2024-03-06T09:00:00.000+0000", "status", "Delivered", "Rejected")];

        let counts = count(&[first, second, third], &Vocabulary::default());
        assert_eq!(counts, DefectCounts { delivered: 2, rejected: 1 });
        assert_eq!(counts.ratio(), Some(0.5));
    }

    #[test]
    fn ratio_is_undefined_without_deliveries() {
        let counts = DefectCounts { delivered: 0, rejected: 3 };
        assert_eq!(counts.ratio(), None);
        assert_eq!(count(&[], &Vocabulary::default()).ratio(), None);
    }

    #[test]
    fn ratio_uses_floating_point_division() {
        let counts = DefectCounts { delivered: 3, rejected: 1 };
        let ratio = counts.ratio().unwrap();
        assert!((ratio - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn mean_of_ratios_and_of_nothing() {
        assert_eq!(mean(&[]), None);
        assert_eq!(mean(&[0.5, 0.25, 0.0]), Some(0.25));
    }
}
