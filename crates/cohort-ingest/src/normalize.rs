//! Payload normalizer
//!
//! Turns whatever the proposal source returned into a single string that is
//! expected to parse as JSON. Each quirk of the producer is handled by an
//! independent step; a step that finds nothing to do is skipped.
//!
//! ```text
//! Value → [singleton unwrap] → [envelope unwrap] → text → [unescape] → [fence strip] → trim
//! ```

use crate::error::IngestError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

/// Default envelope key the producer nests real payloads under
pub const DEFAULT_ENVELOPE_KEY: &str = "output";

static LEADING_FENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*```(?:json|JSON)?[ \t]*(?:\\r\\n|\\n|\r?\n)?").expect("valid fence regex")
});

static TRAILING_FENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:\\r\\n|\\n|\r?\n)?[ \t]*```\s*$").expect("valid fence regex")
});

/// Outcome of a single step
#[derive(Debug, Clone, PartialEq)]
pub enum Step<T> {
    /// The step changed the payload
    Applied(T),
    /// The step did not match; payload passed through untouched
    Skipped(T),
}

impl<T> Step<T> {
    fn into_parts(self) -> (T, bool) {
        match self {
            Self::Applied(v) => (v, true),
            Self::Skipped(v) => (v, false),
        }
    }
}

/// Step operating on the structured payload before it becomes text
pub trait ValueStep: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Transform the payload
    fn apply(&self, value: Value) -> Step<Value>;
}

/// Step operating on the payload text
pub trait TextStep: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Transform the text
    fn apply(&self, text: String) -> Step<String>;
}

/// Take the first element of a non-empty list
#[derive(Debug, Clone, Copy, Default)]
pub struct UnwrapSingleton;

impl ValueStep for UnwrapSingleton {
    fn name(&self) -> &'static str {
        "unwrap-singleton"
    }

    fn apply(&self, value: Value) -> Step<Value> {
        match value {
            Value::Array(mut items) if !items.is_empty() => Step::Applied(items.swap_remove(0)),
            other => Step::Skipped(other),
        }
    }
}

/// Replace a record with its envelope field unless it already carries `groups`
#[derive(Debug, Clone)]
pub struct UnwrapEnvelope {
    key: String,
}

impl UnwrapEnvelope {
    /// Unwrap records nested under `key`
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

impl Default for UnwrapEnvelope {
    fn default() -> Self {
        Self::new(DEFAULT_ENVELOPE_KEY)
    }
}

impl ValueStep for UnwrapEnvelope {
    fn name(&self) -> &'static str {
        "unwrap-envelope"
    }

    fn apply(&self, value: Value) -> Step<Value> {
        match value {
            Value::Object(mut map) if !map.contains_key("groups") && map.contains_key(&self.key) => {
                let inner = map.remove(&self.key).unwrap_or(Value::Null);
                Step::Applied(inner)
            }
            other => Step::Skipped(other),
        }
    }
}

/// Undo one extra level of string escaping
///
/// Fires when the text holds a double backslash, or holds escaped quotes
/// while being a quoted literal or not parsing as JSON. A failed unescape
/// leaves the text as is.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unescape;

impl Unescape {
    fn is_quoted(text: &str) -> bool {
        text.len() >= 2 && text.starts_with('"') && text.ends_with('"')
    }

    fn looks_escaped(text: &str) -> bool {
        text.contains(r"\\")
            || (text.contains(r#"\""#)
                && (Self::is_quoted(text) || serde_json::from_str::<Value>(text).is_err()))
    }

    fn unescape(text: &str) -> Option<String> {
        if Self::is_quoted(text) {
            if let Ok(inner) = serde_json::from_str::<String>(text) {
                return Some(inner);
            }
        }
        serde_json::from_str::<String>(&format!("\"{text}\"")).ok()
    }
}

impl TextStep for Unescape {
    fn name(&self) -> &'static str {
        "unescape"
    }

    fn apply(&self, text: String) -> Step<String> {
        if !Self::looks_escaped(&text) {
            return Step::Skipped(text);
        }
        match Self::unescape(&text) {
            Some(inner) => Step::Applied(inner),
            None => Step::Skipped(text),
        }
    }
}

/// Strip a leading ```` ```json ```` opener and a trailing fence
#[derive(Debug, Clone, Copy, Default)]
pub struct StripFence;

impl TextStep for StripFence {
    fn name(&self) -> &'static str {
        "strip-fence"
    }

    fn apply(&self, text: String) -> Step<String> {
        let head = LEADING_FENCE.replace(&text, "");
        let stripped = TRAILING_FENCE.replace(&head, "");
        if stripped.len() == text.len() {
            Step::Skipped(text)
        } else {
            Step::Applied(stripped.into_owned())
        }
    }
}

/// Normalized payload text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalized {
    /// Text expected to parse as JSON
    pub text: String,
    /// Names of the steps that changed the payload, in order
    pub applied: Vec<&'static str>,
}

/// Ordered chain of normalization steps
pub struct PayloadNormalizer {
    value_steps: Vec<Box<dyn ValueStep>>,
    text_steps: Vec<Box<dyn TextStep>>,
}

impl std::fmt::Debug for PayloadNormalizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PayloadNormalizer")
            .field(
                "value_steps",
                &self.value_steps.iter().map(|s| s.name()).collect::<Vec<_>>(),
            )
            .field(
                "text_steps",
                &self.text_steps.iter().map(|s| s.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl Default for PayloadNormalizer {
    fn default() -> Self {
        Self::with_envelope_key(DEFAULT_ENVELOPE_KEY)
    }
}

impl PayloadNormalizer {
    /// Normalizer with no steps at all
    #[must_use]
    pub fn empty() -> Self {
        Self {
            value_steps: Vec::new(),
            text_steps: Vec::new(),
        }
    }

    /// Standard chain using a custom envelope key
    #[must_use]
    pub fn with_envelope_key(key: impl Into<String>) -> Self {
        Self::empty()
            .with_value_step(UnwrapSingleton)
            .with_value_step(UnwrapEnvelope::new(key))
            .with_text_step(Unescape)
            .with_text_step(StripFence)
    }

    /// Append a structured-payload step
    #[must_use]
    pub fn with_value_step(mut self, step: impl ValueStep + 'static) -> Self {
        self.value_steps.push(Box::new(step));
        self
    }

    /// Append a text step
    #[must_use]
    pub fn with_text_step(mut self, step: impl TextStep + 'static) -> Self {
        self.text_steps.push(Box::new(step));
        self
    }

    /// Normalize a raw payload
    ///
    /// # Errors
    /// - `IngestError::UnsupportedPayload` if, after unwrapping, the payload is
    ///   neither text nor a structure
    pub fn normalize(&self, raw: Value) -> Result<Normalized, IngestError> {
        let mut applied = Vec::new();

        let mut value = raw;
        for step in &self.value_steps {
            let (next, fired) = step.apply(value).into_parts();
            if fired {
                tracing::debug!(step = step.name(), "normalizer step applied");
                applied.push(step.name());
            }
            value = next;
        }

        let mut text = match value {
            Value::String(s) => s,
            structured @ (Value::Object(_) | Value::Array(_)) => structured.to_string(),
            other => {
                return Err(IngestError::UnsupportedPayload {
                    found: value_kind(&other),
                })
            }
        };

        for step in &self.text_steps {
            let (next, fired) = step.apply(text).into_parts();
            if fired {
                tracing::debug!(step = step.name(), "normalizer step applied");
                applied.push(step.name());
            }
            text = next;
        }

        Ok(Normalized {
            text: text.trim().to_string(),
            applied,
        })
    }

    /// Normalize a payload that arrived as plain text
    ///
    /// # Errors
    /// Never in practice; text is always a supported payload.
    pub fn normalize_text(&self, raw: &str) -> Result<Normalized, IngestError> {
        self.normalize(Value::String(raw.to_string()))
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
