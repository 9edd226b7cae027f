pub mod model;
pub mod provider;
pub mod providers;

pub use model::SummaryModel;
pub use provider::{LlmError, LlmProvider, Message, Role, SummarizeError};
pub use providers::create_provider;
