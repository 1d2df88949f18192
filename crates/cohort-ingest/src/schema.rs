//! Schema validation and sanitizing
//!
//! Walks the parsed JSON by hand so every shape violation names the exact
//! path that failed. Shape problems are never repaired here.

use crate::error::IngestError;
use crate::sanitize::{sanitize_list, sanitize_text};
use cohort_model::{AssignmentProposal, ParticipantId, ProposedGroup, ProposedMember};
use serde_json::{Map, Value};

/// Keys accepted for a group's member list
pub const MEMBER_LIST_KEYS: &[&str] = &["members", "students"];

/// Keys accepted for a member's name
pub const MEMBER_NAME_KEYS: &[&str] = &["displayName", "studentName"];

/// Parses normalized text into a sanitized [`AssignmentProposal`]
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaValidator;

impl SchemaValidator {
    /// Create validator
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Parse and validate normalized payload text
    ///
    /// # Errors
    /// - `IngestError::MalformedPayload` if the text is not JSON
    /// - `IngestError::SchemaViolation` if the JSON has the wrong shape
    pub fn parse(&self, text: &str) -> Result<AssignmentProposal, IngestError> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| IngestError::malformed(format!("JSON parse error: {e}")))?;
        self.validate(&value)
    }

    /// Validate an already parsed payload
    ///
    /// # Errors
    /// - `IngestError::SchemaViolation` if the JSON has the wrong shape
    pub fn validate(&self, value: &Value) -> Result<AssignmentProposal, IngestError> {
        let root = value
            .as_object()
            .ok_or_else(|| IngestError::schema("$", "record"))?;
        let groups = root
            .get("groups")
            .and_then(Value::as_array)
            .ok_or_else(|| IngestError::schema("groups", "list of group records"))?;

        let groups = groups
            .iter()
            .enumerate()
            .map(|(i, g)| parse_group(&format!("groups[{i}]"), g))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(AssignmentProposal::new(groups))
    }
}

fn parse_group(path: &str, value: &Value) -> Result<ProposedGroup, IngestError> {
    let record = value
        .as_object()
        .ok_or_else(|| IngestError::schema(path, "group record"))?;

    let group_number = record
        .get("groupNumber")
        .and_then(Value::as_u64)
        .filter(|&n| n > 0)
        .and_then(|n| u32::try_from(n).ok())
        .ok_or_else(|| IngestError::schema(format!("{path}.groupNumber"), "positive integer"))?;

    let leader_id = required_str(record, path, "leaderId")?;

    let (members_key, members) = first_present(record, MEMBER_LIST_KEYS)
        .ok_or_else(|| IngestError::schema(format!("{path}.members"), "list of member records"))?;
    let members = members.as_array().ok_or_else(|| {
        IngestError::schema(format!("{path}.{members_key}"), "list of member records")
    })?;

    let members = members
        .iter()
        .enumerate()
        .map(|(i, m)| parse_member(&format!("{path}.{members_key}[{i}]"), m))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ProposedGroup {
        group_number,
        leader_id: ParticipantId::new(leader_id),
        members,
    })
}

fn parse_member(path: &str, value: &Value) -> Result<ProposedMember, IngestError> {
    let record = value
        .as_object()
        .ok_or_else(|| IngestError::schema(path, "member record"))?;

    let id = required_str(record, path, "id")?;

    let (name_key, name) = first_present(record, MEMBER_NAME_KEYS)
        .ok_or_else(|| IngestError::schema(format!("{path}.displayName"), "string"))?;
    let name = name
        .as_str()
        .ok_or_else(|| IngestError::schema(format!("{path}.{name_key}"), "string"))?;

    Ok(ProposedMember {
        id: ParticipantId::new(id),
        display_name: sanitize_text(name),
        strengths: optional_text_list(record, path, "strengths")?,
        attention: optional_text_list(record, path, "attention")?,
    })
}

fn required_str<'a>(
    record: &'a Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<&'a str, IngestError> {
    record
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| IngestError::schema(format!("{path}.{key}"), "string"))
}

fn first_present<'a>(
    record: &'a Map<String, Value>,
    keys: &[&'static str],
) -> Option<(&'static str, &'a Value)> {
    keys.iter()
        .find_map(|&k| record.get(k).map(|v| (k, v)))
}

fn optional_text_list(
    record: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<Vec<String>, IngestError> {
    let items = match record.get(key) {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(items)) => items,
        Some(_) => return Err(IngestError::schema(format!("{path}.{key}"), "list of strings")),
    };

    let raw = items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            item.as_str()
                .ok_or_else(|| IngestError::schema(format!("{path}.{key}[{i}]"), "string"))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(sanitize_list(raw))
}
