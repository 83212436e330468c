//! Field validators: the leaves of the schema tree.
//!
//! Each [`Field`] variant knows how to `cast` a raw JSON value to its
//! canonical type, `validate` a semantic constraint on the cast value, and
//! produce a `default` when the field is absent. Defaults may depend on a
//! sibling anchor array (per-element lists replicate a fill value to the
//! anchor's length), which is what keeps per-vertex attributes consistent
//! with the vertex count when the caller omits them.

use serde_json::{Map, Number, Value};

use crate::error::SceneError;

// ---------------------------------------------------------------------------
// Element kinds
// ---------------------------------------------------------------------------

/// Canonical numeric kind for scalar and list fields.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scalar {
    /// Double-precision float in the canonical record.
    Float,
    /// Plain integer (packed colors, resolutions, identifiers).
    Int,
}

impl Scalar {
    fn name(self) -> &'static str {
        match self {
            Self::Float => "float",
            Self::Int => "integer",
        }
    }

    /// Coerce a raw JSON value to this kind. Numeric strings cast like
    /// numbers; anything else is uncastable.
    fn cast(self, raw: &Value) -> Option<Value> {
        match self {
            Self::Float => {
                let v = match raw {
                    Value::Number(n) => n.as_f64()?,
                    Value::String(s) => s.trim().parse::<f64>().ok()?,
                    _ => return None,
                };
                Number::from_f64(v).map(Value::Number)
            }
            Self::Int => {
                let v = match raw {
                    Value::Number(n) => match n.as_i64() {
                        Some(i) => i,
                        // int() of a float truncates toward zero
                        None => n.as_f64()?.trunc() as i64,
                    },
                    Value::String(s) => s.trim().parse::<i64>().ok()?,
                    _ => return None,
                };
                Some(Value::from(v))
            }
        }
    }

    /// Render a default value (stored as f64 in the schema tables) in this
    /// kind's canonical form.
    fn materialize(self, v: f64) -> Value {
        match self {
            Self::Float => Value::from(v),
            Self::Int => Value::from(v as i64),
        }
    }
}

/// Element width of a geometry array in the canonical record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArrayElem {
    /// 32-bit float (coordinates, normals, vertices).
    F32,
    /// 32-bit unsigned integer (face indices).
    U32,
}

impl ArrayElem {
    /// Dtype name used on the wire (`{data, type, shape}` payloads).
    #[must_use]
    pub fn dtype_name(self) -> &'static str {
        match self {
            Self::F32 => "float32",
            Self::U32 => "uint32",
        }
    }

    fn cast(self, raw: &Value) -> Option<Value> {
        match self {
            // Round-trip through f32 so the canonical record carries exactly
            // the 32-bit value the renderer will see.
            Self::F32 => {
                let v = raw.as_f64()?;
                Number::from_f64(f64::from(v as f32)).map(Value::Number)
            }
            Self::U32 => {
                let v = raw.as_u64()?;
                u32::try_from(v).ok().map(Value::from)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Validator variants
// ---------------------------------------------------------------------------

/// Range-constrained scalar (aspect ratio, field of view, radius,
/// resolution, packed color).
#[derive(Clone, Copy, Debug)]
pub struct BoundedScalar {
    /// Numeric kind the value casts to.
    pub kind: Scalar,
    /// Lower bound.
    pub min: f64,
    /// Upper bound (`f64::INFINITY` for unbounded).
    pub max: f64,
    /// Whether `min` itself is admitted.
    pub min_inclusive: bool,
    /// Whether `max` itself is admitted.
    pub max_inclusive: bool,
    /// Default when the field is absent; `None` makes the field required.
    pub default: Option<f64>,
}

/// Homogeneous list of scalars. Either fixed-length with an explicit default
/// (camera vectors) or anchored: defaulted by replicating `fill` once per
/// element of the sibling `anchor` array (per-vertex attributes).
#[derive(Clone, Copy, Debug)]
pub struct TypedList {
    /// Element kind.
    pub elem: Scalar,
    /// Exact required length, if fixed.
    pub len: Option<usize>,
    /// Sibling array field whose length drives the synthesized default.
    pub anchor: Option<&'static str>,
    /// Per-element default replicated to the anchor length.
    pub fill: Option<f64>,
    /// Explicit default list (camera vectors).
    pub default: Option<&'static [f64]>,
}

/// Fixed-width geometry array (N rows of `cols` numbers).
#[derive(Clone, Copy, Debug)]
pub struct ArrayField {
    /// Element width in the canonical record.
    pub elem: ArrayElem,
    /// Row width (3 for coordinate-like arrays).
    pub cols: usize,
}

/// Fixed keyword string; doubles as the representation dispatch key. Never
/// has a default.
#[derive(Clone, Copy, Debug)]
pub struct Keyword {
    /// The only admitted value.
    pub value: &'static str,
}

/// Boolean flag cast by truthiness coercion.
#[derive(Clone, Copy, Debug)]
pub struct Boolean {
    /// Default when absent.
    pub default: bool,
}

/// One field validator. A closed set: an unknown validator kind is a
/// programming error, not a data error, so downstream code matches
/// exhaustively.
#[derive(Clone, Copy, Debug)]
pub enum Field {
    /// Range-constrained scalar.
    BoundedScalar(BoundedScalar),
    /// Homogeneous scalar list.
    TypedList(TypedList),
    /// Fixed-width geometry array.
    Array(ArrayField),
    /// Fixed keyword string.
    Keyword(Keyword),
    /// Truthiness-coerced boolean.
    Boolean(Boolean),
    /// Required integer identifier; cast is identity, uniqueness is checked
    /// at the scene level.
    UniqueId,
}

impl Field {
    /// Human-readable target type, used in cast diagnostics.
    #[must_use]
    pub fn expected(&self) -> &'static str {
        match self {
            Self::BoundedScalar(b) => b.kind.name(),
            Self::TypedList(l) => match l.elem {
                Scalar::Float => "list of float",
                Scalar::Int => "list of integer",
            },
            Self::Array(a) => match a.elem {
                ArrayElem::F32 => "float32 array",
                ArrayElem::U32 => "uint32 array",
            },
            Self::Keyword(_) => "keyword string",
            Self::Boolean(_) => "boolean",
            Self::UniqueId => "integer identifier",
        }
    }

    /// Coerce a raw value to this field's canonical type.
    ///
    /// # Errors
    /// [`SceneError::Cast`] naming `path` when the value cannot be coerced.
    pub fn cast(&self, raw: &Value, path: &str) -> Result<Value, SceneError> {
        let cast_err = |at: String, bad: &Value| SceneError::Cast {
            path: at,
            value: bad.to_string(),
            expected: self.expected(),
        };

        match self {
            Self::BoundedScalar(b) => b
                .kind
                .cast(raw)
                .ok_or_else(|| cast_err(path.to_owned(), raw)),
            Self::TypedList(l) => {
                let Value::Array(items) = raw else {
                    return Err(cast_err(path.to_owned(), raw));
                };
                let mut out = Vec::with_capacity(items.len());
                for (i, item) in items.iter().enumerate() {
                    let cast = l
                        .elem
                        .cast(item)
                        .ok_or_else(|| cast_err(format!("{path}[{i}]"), item))?;
                    out.push(cast);
                }
                Ok(Value::Array(out))
            }
            Self::Array(a) => {
                let Value::Array(rows) = raw else {
                    return Err(cast_err(path.to_owned(), raw));
                };
                let mut out = Vec::with_capacity(rows.len());
                for (i, row) in rows.iter().enumerate() {
                    let Value::Array(items) = row else {
                        return Err(cast_err(format!("{path}[{i}]"), row));
                    };
                    let mut cast_row = Vec::with_capacity(items.len());
                    for (j, item) in items.iter().enumerate() {
                        let cast = a.elem.cast(item).ok_or_else(|| {
                            cast_err(format!("{path}[{i}][{j}]"), item)
                        })?;
                        cast_row.push(cast);
                    }
                    out.push(Value::Array(cast_row));
                }
                Ok(Value::Array(out))
            }
            Self::Keyword(_) => match raw {
                Value::String(s) => Ok(Value::String(s.clone())),
                _ => Err(cast_err(path.to_owned(), raw)),
            },
            Self::Boolean(_) => match raw {
                Value::Bool(b) => Ok(Value::Bool(*b)),
                Value::Number(n) => {
                    Ok(Value::Bool(n.as_f64().is_some_and(|v| v != 0.0)))
                }
                _ => Err(cast_err(path.to_owned(), raw)),
            },
            Self::UniqueId => Ok(raw.clone()),
        }
    }

    /// Check the semantic constraint on an already-cast value. Never
    /// panics; a failed check returns the human-readable reason.
    ///
    /// # Errors
    /// The constraint message when the value violates it.
    pub fn validate(&self, value: &Value) -> Result<(), String> {
        match self {
            Self::BoundedScalar(b) => {
                let v = value.as_f64().unwrap_or(f64::NAN);
                let above = if b.min_inclusive { v >= b.min } else { v > b.min };
                let below = if b.max_inclusive { v <= b.max } else { v < b.max };
                if above && below {
                    Ok(())
                } else {
                    Err(format!("should be between {} and {}", b.min, b.max))
                }
            }
            Self::TypedList(l) => {
                let Some(items) = value.as_array() else {
                    return Err(format!(
                        "should be a list with elements of type {}",
                        l.elem.name()
                    ));
                };
                if let Some(len) = l.len {
                    if items.len() != len {
                        return Err(format!("should be a list of {len} elements"));
                    }
                }
                let uniform = items.iter().all(|v| match l.elem {
                    Scalar::Float => v.is_number(),
                    Scalar::Int => v.is_i64() || v.is_u64(),
                });
                if uniform {
                    Ok(())
                } else {
                    Err(format!(
                        "should be a list with elements of type {}",
                        l.elem.name()
                    ))
                }
            }
            Self::Array(a) => {
                let rows = value.as_array().map(Vec::as_slice).unwrap_or(&[]);
                let ragged = rows.iter().any(|row| {
                    row.as_array().map_or(true, |r| r.len() != a.cols)
                });
                if ragged {
                    Err(format!(
                        "should be an array of {}-element rows",
                        a.cols
                    ))
                } else {
                    Ok(())
                }
            }
            Self::Keyword(k) => {
                if value.as_str() == Some(k.value) {
                    Ok(())
                } else {
                    Err(format!("should be \"{}\"", k.value))
                }
            }
            Self::Boolean(_) => {
                if value.is_boolean() {
                    Ok(())
                } else {
                    Err("should be a boolean".to_owned())
                }
            }
            Self::UniqueId => {
                if value.is_i64() || value.is_u64() {
                    Ok(())
                } else {
                    Err("should be an integer identifier".to_owned())
                }
            }
        }
    }

    /// Synthesize the default for an absent field. `record` is the
    /// partially-normalized containing record; anchor fields are declared
    /// before their dependents, so a per-element list can read its anchor's
    /// length from it. `None` means the field is required.
    #[must_use]
    pub fn default(&self, record: &Map<String, Value>) -> Option<Value> {
        match self {
            Self::BoundedScalar(b) => {
                b.default.map(|d| b.kind.materialize(d))
            }
            Self::TypedList(l) => {
                if let Some(values) = l.default {
                    return Some(Value::Array(
                        values.iter().map(|&v| l.elem.materialize(v)).collect(),
                    ));
                }
                let fill = l.fill?;
                let anchor_len = record.get(l.anchor?)?.as_array()?.len();
                Some(Value::Array(
                    std::iter::repeat_with(|| l.elem.materialize(fill))
                        .take(anchor_len)
                        .collect(),
                ))
            }
            Self::Boolean(b) => Some(Value::Bool(b.default)),
            Self::Array(_) | Self::Keyword(_) | Self::UniqueId => None,
        }
    }

    /// The sibling array this field's length must agree with, if any.
    #[must_use]
    pub fn anchor(&self) -> Option<&'static str> {
        match self {
            Self::TypedList(l) => l.anchor,
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    const ASPECT: Field = Field::BoundedScalar(BoundedScalar {
        kind: Scalar::Float,
        min: 0.0,
        max: f64::INFINITY,
        min_inclusive: false,
        max_inclusive: true,
        default: Some(1.0),
    });

    const COLORS: Field = Field::TypedList(TypedList {
        elem: Scalar::Int,
        len: None,
        anchor: Some("coordinates"),
        fill: Some(16_777_215.0),
        default: None,
    });

    const COORDS: Field = Field::Array(ArrayField {
        elem: ArrayElem::F32,
        cols: 3,
    });

    #[test]
    fn bounded_scalar_casts_numeric_strings() {
        let v = ASPECT.cast(&json!("1.5"), "aspect").unwrap();
        assert_eq!(v, json!(1.5));
    }

    #[test]
    fn bounded_scalar_rejects_non_numeric_strings() {
        let err = ASPECT.cast(&json!("wide"), "aspect").unwrap_err();
        assert!(matches!(err, SceneError::Cast { .. }));
    }

    #[test]
    fn bounded_scalar_exclusive_minimum() {
        assert!(ASPECT.validate(&json!(0.0)).is_err());
        assert!(ASPECT.validate(&json!(0.1)).is_ok());
        let reason = ASPECT.validate(&json!(-1.0)).unwrap_err();
        assert_eq!(reason, "should be between 0 and inf");
    }

    #[test]
    fn typed_list_casts_each_element() {
        let v = COLORS
            .cast(&json!([255.0, "16711680", 16_777_215]), "colors")
            .unwrap();
        assert_eq!(v, json!([255, 16_711_680, 16_777_215]));
    }

    #[test]
    fn typed_list_cast_error_names_element() {
        let err = COLORS.cast(&json!([255, [1]]), "colors").unwrap_err();
        let SceneError::Cast { path, .. } = err else {
            panic!("expected cast error");
        };
        assert_eq!(path, "colors[1]");
    }

    #[test]
    fn typed_list_default_replicates_to_anchor_length() {
        let mut record = Map::new();
        let _ = record.insert(
            "coordinates".to_owned(),
            json!([[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]]),
        );
        let v = COLORS.default(&record).unwrap();
        assert_eq!(v, json!([16_777_215, 16_777_215]));
    }

    #[test]
    fn typed_list_default_requires_anchor() {
        assert!(COLORS.default(&Map::new()).is_none());
    }

    #[test]
    fn fixed_length_list_rejects_wrong_length() {
        let location = Field::TypedList(TypedList {
            elem: Scalar::Float,
            len: Some(3),
            anchor: None,
            fill: None,
            default: Some(&[0.0, 0.0, -1.0]),
        });
        assert!(location.validate(&json!([0.0, 1.0])).is_err());
        assert!(location.validate(&json!([0.0, 1.0, 2.0])).is_ok());
    }

    #[test]
    fn array_casts_rows_to_f32_width() {
        let v = COORDS
            .cast(&json!([[0, 0, 0], [0.5, 1, 2]]), "coordinates")
            .unwrap();
        assert_eq!(v, json!([[0.0, 0.0, 0.0], [0.5, 1.0, 2.0]]));
    }

    #[test]
    fn array_validate_rejects_ragged_rows() {
        let v = json!([[0.0, 0.0, 0.0], [1.0, 2.0]]);
        let reason = COORDS.validate(&v).unwrap_err();
        assert_eq!(reason, "should be an array of 3-element rows");
    }

    #[test]
    fn faces_reject_negative_indices() {
        let faces = Field::Array(ArrayField {
            elem: ArrayElem::U32,
            cols: 3,
        });
        let err = faces.cast(&json!([[0, 1, -1]]), "faces").unwrap_err();
        assert!(matches!(err, SceneError::Cast { .. }));
    }

    #[test]
    fn keyword_validates_exact_value() {
        let kw = Field::Keyword(Keyword { value: "points" });
        assert!(kw.validate(&json!("points")).is_ok());
        assert_eq!(
            kw.validate(&json!("spheres")).unwrap_err(),
            "should be \"points\""
        );
    }

    #[test]
    fn boolean_truthiness_coercion() {
        let arrow = Field::Boolean(Boolean { default: false });
        assert_eq!(arrow.cast(&json!(1), "arrow").unwrap(), json!(true));
        assert_eq!(arrow.cast(&json!(0.0), "arrow").unwrap(), json!(false));
        assert!(arrow.cast(&json!("yes"), "arrow").is_err());
    }

    #[test]
    fn unique_id_requires_integer() {
        assert!(Field::UniqueId.validate(&json!(4)).is_ok());
        assert!(Field::UniqueId.validate(&json!("4a")).is_err());
        assert!(Field::UniqueId.validate(&json!(1.5)).is_err());
    }
}
