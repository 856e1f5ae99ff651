//! LLMValidator (spec §4.6).

pub mod validator;

pub use validator::{LlmValidator, ValidationOutcome, ValidationStatus, Verdict};
