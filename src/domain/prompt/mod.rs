//! Prompt templates with named placeholders

mod template;

pub use template::{render_template, Prompt, PromptTemplate, TemplateError};
