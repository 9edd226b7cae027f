use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BudgetError {
    #[error("summary ratio must be in (0, 1], got {0}")]
    InvalidRatio(f64),

    #[error("token ceiling must be positive")]
    ZeroCeiling,
}

#[derive(Error, Debug)]
pub enum TokenizerError {
    #[error("unknown tokenizer: '{0}' (expected cl100k, r50k or whitespace)")]
    Unknown(String),

    #[error("failed to load {encoding} encoding: {reason}")]
    Load { encoding: &'static str, reason: String },
}
