pub mod eligibility;
pub mod judge;
pub mod key_lock;
pub mod llm_provider;
pub mod mastery;
pub mod progression;

pub use judge::AiJudge;
pub use llm_provider::{LLMConfig, LLMError, LLMProvider, TextGenerator};
pub use progression::{ProgressionEngine, ProgressionError};
