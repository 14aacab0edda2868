//! Prompt template parsing and rendering
//!
//! Placeholders use the `{name}` syntax, where `name` is an identifier
//! (`[A-Za-z_][A-Za-z0-9_]*`). Braces around anything else, such as the JSON
//! examples many prompts embed, are kept verbatim.
//!
//! Rendering is all-or-nothing: if any referenced placeholder is unbound the
//! whole render fails and nothing is substituted.

use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use thiserror::Error;

/// Regex to match placeholders: {name}
static PLACEHOLDER_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").unwrap());

/// Template processing errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("Unbound placeholder: {name}")]
    UnboundPlaceholder { name: String },
}

impl TemplateError {
    pub fn unbound(name: impl Into<String>) -> Self {
        Self::UnboundPlaceholder { name: name.into() }
    }
}

/// A parsed prompt template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    /// Original template content
    content: String,
    /// Placeholder names in order of first appearance
    placeholders: Vec<String>,
}

impl PromptTemplate {
    /// Parse a template string and extract its placeholders
    pub fn new(content: impl Into<String>) -> Self {
        let content = content.into();
        let mut seen = HashSet::new();
        let placeholders = PLACEHOLDER_PATTERN
            .captures_iter(&content)
            .map(|cap| cap[1].to_string())
            .filter(|name| seen.insert(name.clone()))
            .collect();

        Self {
            content,
            placeholders,
        }
    }

    /// Get the original template content
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Get the placeholder names referenced by the template
    pub fn placeholders(&self) -> &[String] {
        &self.placeholders
    }

    pub fn has_placeholders(&self) -> bool {
        !self.placeholders.is_empty()
    }

    /// Verify that every placeholder is among `names`.
    ///
    /// Runners call this before their first model call so that a template
    /// referencing a name they never bind fails fast.
    pub fn check_bindings(&self, names: &[&str]) -> Result<(), TemplateError> {
        match self
            .placeholders
            .iter()
            .find(|p| !names.contains(&p.as_str()))
        {
            Some(missing) => Err(TemplateError::unbound(missing)),
            None => Ok(()),
        }
    }

    /// Render the template with provided values
    pub fn render(&self, values: &HashMap<String, String>) -> Result<String, TemplateError> {
        if let Some(missing) = self.placeholders.iter().find(|p| !values.contains_key(*p)) {
            return Err(TemplateError::unbound(missing));
        }

        let rendered = PLACEHOLDER_PATTERN.replace_all(&self.content, |cap: &Captures<'_>| {
            values.get(&cap[1]).cloned().unwrap_or_default()
        });

        Ok(rendered.into_owned())
    }
}

impl From<&str> for PromptTemplate {
    fn from(content: &str) -> Self {
        Self::new(content)
    }
}

impl From<String> for PromptTemplate {
    fn from(content: String) -> Self {
        Self::new(content)
    }
}

/// A template together with its bindings
#[derive(Debug, Clone)]
pub struct Prompt {
    template: PromptTemplate,
    bindings: HashMap<String, String>,
}

impl Prompt {
    pub fn new(template: PromptTemplate) -> Self {
        Self {
            template,
            bindings: HashMap::new(),
        }
    }

    /// Bind a placeholder to a value
    pub fn bind(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.bindings.insert(name.into(), value.into());
        self
    }

    pub fn template(&self) -> &PromptTemplate {
        &self.template
    }

    pub fn bindings(&self) -> &HashMap<String, String> {
        &self.bindings
    }

    pub fn render(&self) -> Result<String, TemplateError> {
        self.template.render(&self.bindings)
    }
}

/// Convenience function to render a template string directly
pub fn render_template(
    template: &str,
    values: &HashMap<String, String>,
) -> Result<String, TemplateError> {
    PromptTemplate::new(template).render(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_parse_no_placeholders() {
        let template = PromptTemplate::new("Hello, world!");
        assert!(!template.has_placeholders());
    }

    #[test]
    fn test_parse_duplicate_placeholders() {
        let template = PromptTemplate::new("{name} and {name} again, {other}");
        assert_eq!(template.placeholders(), &["name", "other"]);
    }

    #[test]
    fn test_render_single_placeholder() {
        let result = render_template("Task: {task}", &values(&[("task", "T")])).unwrap();
        assert_eq!(result, "Task: T");
    }

    #[test]
    fn test_render_unbound_placeholder() {
        let result = render_template("Task: {other}", &values(&[("task", "T")]));
        assert_eq!(result, Err(TemplateError::unbound("other")));
    }

    #[test]
    fn test_render_is_all_or_nothing() {
        let template = PromptTemplate::new("{a} then {b}");
        let result = template.render(&values(&[("a", "first")]));

        match result {
            Err(TemplateError::UnboundPlaceholder { name }) => assert_eq!(name, "b"),
            other => panic!("Expected UnboundPlaceholder, got {:?}", other),
        }
    }

    #[test]
    fn test_json_braces_are_literal() {
        let template = PromptTemplate::new(
            r#"Task: {task}
Reply as JSON: {"analysis": "...", "tasks": [{"type": "x"}]}"#,
        );

        assert_eq!(template.placeholders(), &["task"]);

        let result = template.render(&values(&[("task", "build it")])).unwrap();
        assert!(result.starts_with("Task: build it\n"));
        assert!(result.contains(r#"{"analysis": "...", "tasks": [{"type": "x"}]}"#));
    }

    #[test]
    fn test_values_are_not_re_expanded() {
        let result = render_template(
            "{input}",
            &values(&[("input", "contains {input} and {task}")]),
        )
        .unwrap();

        assert_eq!(result, "contains {input} and {task}");
    }

    #[test]
    fn test_extra_bindings_are_ignored() {
        let result =
            render_template("Hi {name}", &values(&[("name", "Ada"), ("unused", "x")])).unwrap();
        assert_eq!(result, "Hi Ada");
    }

    #[test]
    fn test_check_bindings() {
        let template = PromptTemplate::new("{task} / {context}");

        assert!(template.check_bindings(&["task", "context"]).is_ok());
        assert_eq!(
            template.check_bindings(&["task"]),
            Err(TemplateError::unbound("context"))
        );
    }

    #[test]
    fn test_prompt_bindings() {
        let prompt = Prompt::new(PromptTemplate::new("You are a {role}. {task}"))
            .bind("role", "reviewer")
            .bind("task", "Review the patch.");

        assert_eq!(prompt.render().unwrap(), "You are a reviewer. Review the patch.");
        assert_eq!(prompt.bindings().len(), 2);
    }
}
