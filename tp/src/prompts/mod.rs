//! Prompt templates for the planner's language-model agents

mod embedded;
mod loader;

pub use loader::{COMPOSER_TEMPLATE, FINDER_TEMPLATE, JUDGE_TEMPLATE, PromptLoader};
