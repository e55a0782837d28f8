//! Strict validation of the upstream catalog payload.
//!
//! Expected shape:
//!
//! ```json
//! [
//!   { "name": "Containers & Docker",
//!     "scripts": [ { "name": "Docker", "slug": "docker", "description": "...",
//!                    "type": "ct", "disable": false } ] }
//! ]
//! ```
//!
//! Only a non-list top level rejects the payload. Each malformed category
//! or script is skipped with one warning and recorded as a [`Rejection`].

use serde_json::{Map, Value};
use tracing::warn;

use catalog_types::item::truncate_chars;
use catalog_types::MAX_DESCRIPTION_CHARS;

use crate::error::IngestError;

/// A script that passed validation. Slug not yet assigned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidScript {
    /// Trimmed display name, never empty
    pub name: String,
    /// Text the slug is derived from: upstream `slug` if given, else the name
    pub slug_source: String,
    pub description: String,
    pub category: String,
    pub script_type: String,
    pub disabled: bool,
    pub website: Option<String>,
    pub documentation: Option<String>,
    pub logo: Option<String>,
    /// Position in the payload, for diagnostics
    pub category_index: usize,
    pub script_index: usize,
}

/// Why a category or script was skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub category_index: usize,
    /// `None` when the whole category was rejected
    pub script_index: Option<usize>,
    pub reason: String,
}

/// Outcome of validating one script record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptRecord {
    Valid(ValidScript),
    Rejected(String),
}

/// Everything usable from one payload, in catalog order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidatedCatalog {
    pub scripts: Vec<ValidScript>,
    pub rejected: Vec<Rejection>,
}

/// Parse and validate a raw catalog payload.
pub fn validate(raw: &[u8]) -> Result<ValidatedCatalog, IngestError> {
    let payload: Value = serde_json::from_slice(raw)
        .map_err(|e| IngestError::MalformedPayload(format!("invalid JSON: {}", e)))?;

    let categories = match payload {
        Value::Array(categories) => categories,
        other => {
            return Err(IngestError::MalformedPayload(format!(
                "expected a list of categories, got {}",
                type_name(&other)
            )))
        }
    };

    let mut catalog = ValidatedCatalog::default();
    for (category_index, category) in categories.iter().enumerate() {
        let (category_name, scripts) = match parse_category(category) {
            Ok(parsed) => parsed,
            Err(reason) => {
                warn!(category = category_index, reason = %reason, "Skipping malformed category");
                catalog.rejected.push(Rejection {
                    category_index,
                    script_index: None,
                    reason,
                });
                continue;
            }
        };

        for (script_index, script) in scripts.iter().enumerate() {
            match parse_script(script, &category_name) {
                ScriptRecord::Valid(mut valid) => {
                    valid.category_index = category_index;
                    valid.script_index = script_index;
                    catalog.scripts.push(valid);
                }
                ScriptRecord::Rejected(reason) => {
                    warn!(
                        category = category_index,
                        script = script_index,
                        reason = %reason,
                        "Skipping malformed script"
                    );
                    catalog.rejected.push(Rejection {
                        category_index,
                        script_index: Some(script_index),
                        reason,
                    });
                }
            }
        }
    }

    Ok(catalog)
}

fn parse_category(category: &Value) -> Result<(String, &[Value]), String> {
    let Value::Object(fields) = category else {
        return Err(format!("category is {}, not an object", type_name(category)));
    };

    let name = optional_string(fields, "name").unwrap_or_default();
    let scripts = match fields.get("scripts") {
        None | Some(Value::Null) => &[][..],
        Some(Value::Array(scripts)) => scripts.as_slice(),
        Some(other) => return Err(format!("scripts is {}, not a list", type_name(other))),
    };
    Ok((name.trim().to_string(), scripts))
}

/// Validate one script object into a strict record.
///
/// Payload positions are left at zero; [`validate`] fills them in.
pub fn parse_script(script: &Value, category: &str) -> ScriptRecord {
    let Value::Object(fields) = script else {
        return ScriptRecord::Rejected(format!("script is {}, not an object", type_name(script)));
    };

    let name = match fields.get("name") {
        Some(Value::String(name)) if !name.trim().is_empty() => name.trim().to_string(),
        Some(Value::String(_)) => return ScriptRecord::Rejected("name is empty".to_string()),
        Some(other) => {
            return ScriptRecord::Rejected(format!("name is {}, not a string", type_name(other)))
        }
        None => return ScriptRecord::Rejected("missing name".to_string()),
    };

    let slug_source = match fields.get("slug") {
        None | Some(Value::Null) => name.clone(),
        Some(Value::String(slug)) if slug.trim().is_empty() => name.clone(),
        Some(Value::String(slug)) => slug.trim().to_string(),
        Some(other) => {
            return ScriptRecord::Rejected(format!("slug is {}, not a string", type_name(other)))
        }
    };

    let description = optional_string(fields, "description")
        .map(|d| truncate_chars(&d, MAX_DESCRIPTION_CHARS))
        .unwrap_or_default();

    let disabled = matches!(fields.get("disable"), Some(Value::Bool(true)))
        || matches!(fields.get("disabled"), Some(Value::Bool(true)));

    ScriptRecord::Valid(ValidScript {
        name,
        slug_source,
        description,
        category: category.to_string(),
        script_type: optional_string(fields, "type").unwrap_or_default(),
        disabled,
        website: optional_string(fields, "website"),
        documentation: optional_string(fields, "documentation"),
        logo: optional_string(fields, "logo"),
        category_index: 0,
        script_index: 0,
    })
}

/// A string field, or `None` when absent or of another type.
fn optional_string(fields: &Map<String, Value>, key: &str) -> Option<String> {
    match fields.get(key) {
        Some(Value::String(s)) => Some(s.clone()),
        _ => None,
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
