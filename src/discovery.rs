//! Field discovery over pasted JSON samples.
//!
//! A sample is walked depth-first into a flat list of typed field paths that the
//! mapping workflow and the mapping-suggestion prompt can offer as choices.
//! Paths use `$` for the root, `.key` for object members and a literal `[]`
//! suffix for "each element of this array".
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::collections::HashSet;
use std::fmt;

/// Path used for the sample root when no base path is given.
pub const ROOT_PATH: &str = "$";

const ARRAY_ELEMENT_SUFFIX: &str = "[]";
const MAX_EXAMPLE_CHARS: usize = 80;

/// JSON type inferred for a discovered field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Null,
    Array,
    Object,
    Integer,
    Number,
    String,
    Boolean,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Null => "null",
            FieldType::Array => "array",
            FieldType::Object => "object",
            FieldType::Integer => "integer",
            FieldType::Number => "number",
            FieldType::String => "string",
            FieldType::Boolean => "boolean",
        }
    }

    fn of(value: &Value) -> Self {
        match value {
            Value::Null => FieldType::Null,
            Value::Bool(_) => FieldType::Boolean,
            Value::Number(number) if number_is_integral(number) => FieldType::Integer,
            Value::Number(_) => FieldType::Number,
            Value::String(_) => FieldType::String,
            Value::Array(_) => FieldType::Array,
            Value::Object(_) => FieldType::Object,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One selectable field path discovered in a sample.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredField {
    pub path: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<String>,
}

impl DiscoveredField {
    fn container(path: &str, field_type: FieldType) -> Self {
        Self {
            path: path.to_string(),
            field_type,
            example: None,
        }
    }
}

/// Extract the field list of a sample rooted at `$`.
///
/// The root object is transparent: it produces no descriptor of its own and its
/// members are addressed by bare key (`id`, `site.id`). Scalar and array roots
/// are addressed as `$`. Tools that keep the `$` prefix on object members
/// (`$.id`) produce paths that will not match these.
pub fn extract_fields(sample: &Value) -> Vec<DiscoveredField> {
    extract_fields_at(sample, "")
}

/// Extract the field list of a sample mounted at `base_path`.
///
/// An empty base path means "the sample root"; see [`extract_fields`].
pub fn extract_fields_at(sample: &Value, base_path: &str) -> Vec<DiscoveredField> {
    let mut fields = Vec::new();
    if base_path.is_empty() {
        match sample {
            Value::Object(members) => walk_members(members, "", &mut fields),
            _ => walk(sample, ROOT_PATH, &mut fields),
        }
    } else {
        walk(sample, base_path, &mut fields);
    }
    dedupe_by_path(fields)
}

/// Collect just the paths, in discovery order.
pub fn field_paths(fields: &[DiscoveredField]) -> Vec<String> {
    fields.iter().map(|field| field.path.clone()).collect()
}

fn walk(node: &Value, path: &str, fields: &mut Vec<DiscoveredField>) {
    match node {
        Value::Array(items) => {
            fields.push(DiscoveredField::container(path, FieldType::Array));
            // Only the first element is walked; it stands in for the element shape.
            if let Some(first) = items.first() {
                walk(first, &element_path(path), fields);
            }
        }
        Value::Object(members) => {
            if !path.is_empty() {
                fields.push(DiscoveredField::container(path, FieldType::Object));
            }
            walk_members(members, path, fields);
        }
        scalar => fields.push(DiscoveredField {
            path: path.to_string(),
            field_type: FieldType::of(scalar),
            example: render_example(scalar),
        }),
    }
}

fn walk_members(
    members: &serde_json::Map<String, Value>,
    parent: &str,
    fields: &mut Vec<DiscoveredField>,
) {
    for (key, value) in members {
        walk(value, &member_path(parent, key), fields);
    }
}

fn member_path(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{parent}.{key}")
    }
}

fn element_path(parent: &str) -> String {
    format!("{parent}{ARRAY_ELEMENT_SUFFIX}")
}

fn dedupe_by_path(fields: Vec<DiscoveredField>) -> Vec<DiscoveredField> {
    let mut seen = HashSet::new();
    fields
        .into_iter()
        .filter(|field| seen.insert(field.path.clone()))
        .collect()
}

fn render_example(value: &Value) -> Option<String> {
    let text = match value {
        Value::Null => return None,
        Value::String(text) => text.clone(),
        Value::Number(number) => render_number(number),
        other => other.to_string(),
    };
    Some(text.chars().take(MAX_EXAMPLE_CHARS).collect())
}

fn number_is_integral(number: &Number) -> bool {
    if number.is_i64() || number.is_u64() {
        return true;
    }
    number
        .as_f64()
        .is_some_and(|value| value.is_finite() && value.fract() == 0.0)
}

// Integral floats render without a fractional part so `3.0` reads as `3`.
fn render_number(number: &Number) -> String {
    match number.as_f64() {
        Some(value)
            if number.is_f64() && value.fract() == 0.0 && value.abs() < i64::MAX as f64 =>
        {
            format!("{}", value as i64)
        }
        _ => number.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn field(path: &str, field_type: FieldType, example: Option<&str>) -> DiscoveredField {
        DiscoveredField {
            path: path.to_string(),
            field_type,
            example: example.map(str::to_string),
        }
    }

    #[test]
    fn empty_root_object_has_no_fields() {
        assert!(extract_fields(&json!({})).is_empty());
    }

    #[test]
    fn scalar_root_is_addressed_as_dollar() {
        assert_eq!(
            extract_fields(&json!(42)),
            vec![field("$", FieldType::Integer, Some("42"))]
        );
        assert_eq!(
            extract_fields(&json!("hello")),
            vec![field("$", FieldType::String, Some("hello"))]
        );
    }

    #[test]
    fn null_root_has_no_example() {
        assert_eq!(
            extract_fields(&Value::Null),
            vec![field("$", FieldType::Null, None)]
        );
    }

    #[test]
    fn distinguishes_integers_from_fractional_numbers() {
        assert_eq!(extract_fields(&json!(3.14))[0].field_type, FieldType::Number);
        assert_eq!(extract_fields(&json!(3))[0].field_type, FieldType::Integer);
        let whole_float = extract_fields(&json!(3.0));
        assert_eq!(whole_float[0].field_type, FieldType::Integer);
        assert_eq!(whole_float[0].example.as_deref(), Some("3"));
    }

    #[test]
    fn flattens_array_of_objects_through_first_element() {
        let sample = json!([{"id": "1", "site": {"id": "S1"}}, {"id": "2", "other": true}]);
        assert_eq!(
            extract_fields(&sample),
            vec![
                field("$", FieldType::Array, None),
                field("$[]", FieldType::Object, None),
                field("$[].id", FieldType::String, Some("1")),
                field("$[].site", FieldType::Object, None),
                field("$[].site.id", FieldType::String, Some("S1")),
            ]
        );
    }

    #[test]
    fn root_object_members_use_bare_keys_in_insertion_order() {
        let sample = json!({
            "zeta": 1,
            "workOrder": {"id": 7, "tags": ["a"], "empty": []},
            "alpha": null
        });
        assert_eq!(
            extract_fields(&sample),
            vec![
                field("zeta", FieldType::Integer, Some("1")),
                field("workOrder", FieldType::Object, None),
                field("workOrder.id", FieldType::Integer, Some("7")),
                field("workOrder.tags", FieldType::Array, None),
                field("workOrder.tags[]", FieldType::String, Some("a")),
                field("workOrder.empty", FieldType::Array, None),
                field("alpha", FieldType::Null, None),
            ]
        );
    }

    #[test]
    fn nested_arrays_stack_element_suffixes() {
        let sample = json!({"grid": [[{"x": 1.5}]]});
        let paths = field_paths(&extract_fields(&sample));
        assert_eq!(
            paths,
            vec!["grid", "grid[]", "grid[][]", "grid[][].x"]
        );
    }

    #[test]
    fn explicit_base_path_emits_the_object_itself() {
        let fields = extract_fields_at(&json!({"id": true}), "payload");
        assert_eq!(
            fields,
            vec![
                field("payload", FieldType::Object, None),
                field("payload.id", FieldType::Boolean, Some("true")),
            ]
        );
    }

    #[test]
    fn examples_are_truncated_to_eighty_characters() {
        let long = "é".repeat(120);
        let fields = extract_fields(&json!({ "note": long }));
        assert_eq!(fields[0].example.as_ref().map(|e| e.chars().count()), Some(80));
    }

    #[test]
    fn dedupe_keeps_first_occurrence() {
        let fields = vec![
            field("a", FieldType::Object, None),
            field("a.b", FieldType::String, Some("x")),
            field("a", FieldType::Array, None),
        ];
        assert_eq!(
            dedupe_by_path(fields),
            vec![
                field("a", FieldType::Object, None),
                field("a.b", FieldType::String, Some("x")),
            ]
        );
    }

    #[test]
    fn extraction_is_deterministic_and_paths_are_unique() {
        let sample = json!({
            "items": [{"sku": "A", "qty": 2, "meta": {"k": [1, 2]}}],
            "total": 9.99,
            "paid": false
        });
        let first = extract_fields(&sample);
        assert_eq!(first, extract_fields(&sample));
        let unique: HashSet<_> = first.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(unique.len(), first.len());
    }

    #[test]
    fn serializes_type_under_type_key() {
        let value = serde_json::to_value(field("$", FieldType::Integer, Some("42"))).unwrap();
        assert_eq!(value, json!({"path": "$", "type": "integer", "example": "42"}));
        let container = serde_json::to_value(field("$", FieldType::Array, None)).unwrap();
        assert_eq!(container, json!({"path": "$", "type": "array"}));
    }
}
