//! Typed prompt templates (spec §3, §6).
//!
//! The source system formats templates with general-purpose string
//! substitution and validates at use time. Per REDESIGN FLAGS, a
//! `PromptTemplate` here declares its variables at construction; formatting
//! rejects any declared variable that is missing from the caller-supplied
//! map, and [`PromptTemplate::new`] rejects a format string whose `{name}`
//! placeholders don't match the declared variables, so a mismatch is caught
//! once, at build time, rather than on every call.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// What a template is used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateKind {
    RagQuery,
    QuestionGeneration,
    ResponseEvaluation,
    Reranking,
    PodcastGeneration,
}

/// A named, variable-declaring prompt template.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptTemplate {
    pub id: String,
    pub owner_user_id: String,
    pub kind: TemplateKind,
    format_string: String,
    pub input_variables: Vec<String>,
    pub example_inputs: HashMap<String, String>,
    pub is_default: bool,
}

impl PromptTemplate {
    /// Builds a template, rejecting it immediately if the format string
    /// references a `{name}` placeholder not present in `input_variables`,
    /// or declares a variable the format string never uses.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Validation`] on a variable/placeholder mismatch.
    pub fn new(
        id: impl Into<String>,
        owner_user_id: impl Into<String>,
        kind: TemplateKind,
        format_string: impl Into<String>,
        input_variables: Vec<String>,
    ) -> Result<Self> {
        let format_string = format_string.into();
        let placeholders = extract_placeholders(&format_string);

        for placeholder in &placeholders {
            if !input_variables.iter().any(|v| v == placeholder) {
                return Err(CoreError::validation(format!(
                    "template references undeclared variable {{{placeholder}}}"
                )));
            }
        }
        for declared in &input_variables {
            if !placeholders.contains(declared) {
                return Err(CoreError::validation(format!(
                    "template declares unused variable {declared}"
                )));
            }
        }

        Ok(Self {
            id: id.into(),
            owner_user_id: owner_user_id.into(),
            kind,
            format_string,
            input_variables,
            example_inputs: HashMap::new(),
            is_default: false,
        })
    }

    /// Substitutes each `{name}` placeholder with the corresponding value
    /// from `variables`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Validation`] if any declared variable is
    /// missing from `variables`.
    pub fn format(&self, variables: &HashMap<String, String>) -> Result<String> {
        let mut output = self.format_string.clone();
        for variable in &self.input_variables {
            let Some(value) = variables.get(variable) else {
                return Err(CoreError::validation(format!(
                    "missing template variable: {variable}"
                )));
            };
            output = output.replace(&format!("{{{variable}}}"), value);
        }
        Ok(output)
    }
}

fn extract_placeholders(format_string: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut chars = format_string.char_indices().peekable();
    while let Some((_, ch)) = chars.next() {
        if ch != '{' {
            continue;
        }
        let mut name = String::new();
        for (_, inner) in chars.by_ref() {
            if inner == '}' {
                break;
            }
            name.push(inner);
        }
        if !name.is_empty() && !names.contains(&name) {
            names.push(name);
        }
    }
    names
}
