//! Prompt/completion split of a model's token ceiling.

use serde::Serialize;
use tracing::info;

use crate::error::BudgetError;

/// Splits a model's absolute token ceiling into a prompt allowance and a
/// completion allowance according to the summary ratio.
///
/// `max_prompt_tokens = floor(max_tokens / (1 + sum_ratio))` and the
/// completion gets the remainder.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TokenBudget {
    model_name: String,
    max_tokens: usize,
    sum_ratio: f64,
    max_prompt_tokens: usize,
    max_completion_tokens: usize,
}

impl TokenBudget {
    pub fn new(
        model_name: impl Into<String>,
        max_tokens: usize,
        sum_ratio: f64,
    ) -> Result<Self, BudgetError> {
        if max_tokens == 0 {
            return Err(BudgetError::ZeroCeiling);
        }
        let mut budget = Self {
            model_name: model_name.into(),
            max_tokens,
            sum_ratio: 0.0,
            max_prompt_tokens: 0,
            max_completion_tokens: 0,
        };
        budget.set_ratio(sum_ratio)?;
        Ok(budget)
    }

    /// Update the ratio and recompute both derived limits.
    pub fn set_ratio(&mut self, sum_ratio: f64) -> Result<(), BudgetError> {
        if !(sum_ratio > 0.0 && sum_ratio <= 1.0) {
            return Err(BudgetError::InvalidRatio(sum_ratio));
        }
        self.sum_ratio = sum_ratio;
        self.max_prompt_tokens = (self.max_tokens as f64 / (1.0 + sum_ratio)).floor() as usize;
        self.max_completion_tokens = self.max_tokens - self.max_prompt_tokens;
        info!(
            model = %self.model_name,
            sum_ratio,
            max_tokens = self.max_tokens,
            max_prompt_tokens = self.max_prompt_tokens,
            max_completion_tokens = self.max_completion_tokens,
            "token budget updated"
        );
        Ok(())
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn max_tokens(&self) -> usize {
        self.max_tokens
    }

    pub fn sum_ratio(&self) -> f64 {
        self.sum_ratio
    }

    pub fn max_prompt_tokens(&self) -> usize {
        self.max_prompt_tokens
    }

    pub fn max_completion_tokens(&self) -> usize {
        self.max_completion_tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_prompt_and_completion_split() {
        let budget = TokenBudget::new("gpt-4", 8000, 0.45).unwrap();
        assert_eq!(budget.max_prompt_tokens(), 5517);
        assert_eq!(budget.max_completion_tokens(), 2483);
        assert_eq!(budget.max_prompt_tokens() + budget.max_completion_tokens(), 8000);
    }

    #[test]
    fn ratio_of_one_splits_evenly() {
        let budget = TokenBudget::new("m", 1000, 1.0).unwrap();
        assert_eq!(budget.max_prompt_tokens(), 500);
        assert_eq!(budget.max_completion_tokens(), 500);
    }

    #[test]
    fn set_ratio_is_idempotent() {
        let mut budget = TokenBudget::new("m", 4000, 0.5).unwrap();
        budget.set_ratio(0.35).unwrap();
        let first = (budget.max_prompt_tokens(), budget.max_completion_tokens());
        budget.set_ratio(0.35).unwrap();
        let second = (budget.max_prompt_tokens(), budget.max_completion_tokens());
        assert_eq!(first, second);
        assert_eq!(budget.sum_ratio(), 0.35);
    }

    #[test]
    fn rejects_out_of_range_ratio() {
        assert_eq!(
            TokenBudget::new("m", 100, 0.0).unwrap_err(),
            BudgetError::InvalidRatio(0.0)
        );
        let mut budget = TokenBudget::new("m", 100, 0.5).unwrap();
        assert!(budget.set_ratio(1.5).is_err());
        assert!(budget.set_ratio(f64::NAN).is_err());
        // a rejected update leaves the budget untouched
        assert_eq!(budget.sum_ratio(), 0.5);
    }

    #[test]
    fn rejects_zero_ceiling() {
        assert_eq!(TokenBudget::new("m", 0, 0.5).unwrap_err(), BudgetError::ZeroCeiling);
    }
}
