//! Narrative composition. Sections appear in a fixed order and are only
//! ever skipped, never reordered or padded.

use factorlens_core::{Counterfactual, KeyFactor, SimilarCase};

pub struct RationaleComposer {
    factor_count: usize,
}

impl Default for RationaleComposer {
    fn default() -> Self {
        Self { factor_count: 2 }
    }
}

impl RationaleComposer {
    pub fn new(factor_count: usize) -> Self {
        Self { factor_count }
    }

    pub fn compose(
        &self,
        prediction: f64,
        key_factors: &[KeyFactor],
        counterfactuals: &[Counterfactual],
        similar_cases: &[SimilarCase],
    ) -> String {
        let mut parts = vec![format!("The model predicts {:.4}.", prediction)];

        let positive = self.leading(key_factors, |f| f.impact.is_positive());
        if !positive.is_empty() {
            parts.push(format!("Key positive factors include: {}.", positive.join(", ")));
        }

        let negative = self.leading(key_factors, |f| f.impact.is_negative());
        if !negative.is_empty() {
            parts.push(format!("Key negative factors include: {}.", negative.join(", ")));
        }

        if let Some(feature) = best_counterfactual(counterfactuals).and_then(|c| c.feature_name()) {
            parts.push(format!("To improve the outcome, consider adjusting {}.", feature));
        }

        if let Some(case) = most_similar(similar_cases) {
            parts.push(format!(
                "Similar historical cases show outcomes around {:.4}.",
                case.prediction
            ));
        }

        parts.join(" ")
    }

    fn leading<'f>(&self, factors: &'f [KeyFactor], keep: impl Fn(&KeyFactor) -> bool) -> Vec<&'f str> {
        factors
            .iter()
            .filter(|&f| keep(f))
            .take(self.factor_count)
            .map(|f| f.feature_name.as_str())
            .collect()
    }
}

/// Highest expected impact; the first one wins a tie.
pub fn best_counterfactual(counterfactuals: &[Counterfactual]) -> Option<&Counterfactual> {
    counterfactuals.iter().reduce(|best, c| {
        if c.expected_impact > best.expected_impact {
            c
        } else {
            best
        }
    })
}

/// Highest similarity; the first one wins a tie.
pub fn most_similar(cases: &[SimilarCase]) -> Option<&SimilarCase> {
    cases
        .iter()
        .reduce(|best, c| if c.similarity > best.similarity { c } else { best })
}
