//! Recursive schema walk: validate and normalize a nested record.
//!
//! The walker never mutates its input; it builds a brand-new record whose
//! keys follow the schema definition order. Per field: absent → synthesize
//! the default (or fail as missing), present → cast then validate. Nested
//! records and dispatch lists recurse with a dotted path so every error
//! names the exact offending field.

use serde_json::{Map, Value};

use super::{Entry, Field, Schema};
use crate::error::SceneError;

fn join(path: &str, name: &str) -> String {
    if path.is_empty() {
        name.to_owned()
    } else {
        format!("{path}.{name}")
    }
}

/// Validate `record` against `schema`, returning the normalized record.
/// `path` is the dotted location of `record` from the scene root (empty at
/// the root).
///
/// # Errors
/// The first field that is missing without a default, fails to cast, or
/// fails its semantic check aborts the walk with the corresponding
/// [`SceneError`].
pub fn validate_record(
    record: &Map<String, Value>,
    schema: Schema,
    path: &str,
) -> Result<Map<String, Value>, SceneError> {
    let mut out = Map::new();

    for (name, entry) in schema {
        let field_path = join(path, name);
        let raw = record.get(*name);

        let value = match entry {
            Entry::Field(field) => {
                walk_field(field, raw, record, &out, &field_path)?
            }
            Entry::Record(sub_schema) => {
                walk_subrecord(raw, sub_schema, &field_path)?
            }
            Entry::Dispatch { key, resolve } => {
                walk_dispatch(raw, key, *resolve, &field_path)?
            }
        };
        let _ = out.insert((*name).to_owned(), value);
    }

    for key in record.keys() {
        if !schema.iter().any(|(name, _)| *name == key.as_str()) {
            log::warn!("dropping unknown field \"{}\"", join(path, key));
        }
    }

    Ok(out)
}

fn walk_field(
    field: &Field,
    raw: Option<&Value>,
    record: &Map<String, Value>,
    out: &Map<String, Value>,
    path: &str,
) -> Result<Value, SceneError> {
    let value = match raw {
        None => field.default(out).ok_or_else(|| SceneError::MissingField {
            path: path.to_owned(),
        })?,
        Some(raw) => {
            let cast = field.cast(raw, path)?;
            field.validate(&cast).map_err(|reason| {
                SceneError::Validation {
                    path: path.to_owned(),
                    value: cast.to_string(),
                    reason,
                }
            })?;
            cast
        }
    };

    // Per-element lists must agree with their anchor array's length even
    // when supplied explicitly, not only when defaulted.
    if let Some(anchor) = field.anchor() {
        let anchor_len = out
            .get(anchor)
            .or_else(|| record.get(anchor))
            .and_then(Value::as_array)
            .map(Vec::len);
        if let (Some(expected), Some(items)) = (anchor_len, value.as_array()) {
            if items.len() != expected {
                return Err(SceneError::Validation {
                    path: path.to_owned(),
                    value: value.to_string(),
                    reason: format!(
                        "should have one element per \"{anchor}\" entry ({expected})"
                    ),
                });
            }
        }
    }

    Ok(value)
}

fn walk_subrecord(
    raw: Option<&Value>,
    schema: Schema,
    path: &str,
) -> Result<Value, SceneError> {
    let empty = Map::new();
    let sub = match raw {
        None => &empty,
        Some(Value::Object(map)) => map,
        Some(other) => {
            return Err(SceneError::Cast {
                path: path.to_owned(),
                value: other.to_string(),
                expected: "record",
            })
        }
    };
    validate_record(sub, schema, path).map(Value::Object)
}

fn walk_dispatch(
    raw: Option<&Value>,
    key: &str,
    resolve: fn(&str) -> Option<Schema>,
    path: &str,
) -> Result<Value, SceneError> {
    let items = match raw {
        None => return Ok(Value::Array(Vec::new())),
        Some(Value::Array(items)) => items,
        Some(other) => {
            return Err(SceneError::Cast {
                path: path.to_owned(),
                value: other.to_string(),
                expected: "list of records",
            })
        }
    };

    let mut out = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        let item_path = format!("{path}[{i}]");
        let Value::Object(record) = item else {
            return Err(SceneError::Cast {
                path: item_path,
                value: item.to_string(),
                expected: "record",
            });
        };
        let keyword = match record.get(key) {
            None => {
                return Err(SceneError::MissingField {
                    path: join(&item_path, key),
                })
            }
            Some(Value::String(s)) => s.as_str(),
            Some(other) => {
                return Err(SceneError::Cast {
                    path: join(&item_path, key),
                    value: other.to_string(),
                    expected: "keyword string",
                })
            }
        };
        let schema = resolve(keyword).ok_or_else(|| {
            SceneError::UnknownRepresentation {
                path: item_path.clone(),
                found: keyword.to_owned(),
            }
        })?;
        out.push(Value::Object(validate_record(record, schema, &item_path)?));
    }
    Ok(Value::Array(out))
}
