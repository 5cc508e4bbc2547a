//! Retrieval-augmented question answering.
//!
//! Loads the persisted index, retrieves the closest chunks for a question and
//! asks a hosted generative model for an answer grounded in them.

pub mod context;
mod generation;
mod response;

pub use context::format_context_for_prompt;
pub use generation::{error_answer, extract_generated_text, strip_prompt_echo, TextGenerator};
pub use response::{Answer, AnswerEngine, NO_DATA_ANSWER};
