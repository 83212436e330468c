//! Wire encoding for renderer-bound messages.
//!
//! The browser-side renderer is driven by `callMethod` messages over the
//! notebook comm channel. Geometry arrays travel as base64 payloads
//! (`{data, type, shape}`) so the receiving side can view them directly as
//! typed arrays; per-element lists and scalars stay plain JSON, matching
//! the original widget protocol. This module builds the messages; the
//! transport itself lives with the widget, not here.

use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::scene::{RepKind, Representation};
use crate::schema::{ArrayElem, Entry, Field};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors produced while encoding or decoding wire payloads.
#[derive(Debug)]
pub enum WireError {
    /// Payload data is not valid base64.
    Base64(base64::DecodeError),
    /// Payload dtype name is not one this protocol carries.
    Dtype {
        /// The unrecognized dtype name.
        found: String,
    },
    /// Decoded byte length is not a whole number of elements.
    ByteLength {
        /// Decoded byte count.
        len: usize,
        /// Element type the payload claims.
        elem: &'static str,
    },
    /// Payload shape disagrees with the element count.
    Shape {
        /// Element count implied by the shape.
        expected: usize,
        /// Actual decoded element count.
        found: usize,
    },
    /// An option field could not be encoded as a numeric array.
    Malformed {
        /// Name of the offending option field.
        field: String,
    },
    /// Typed options failed to serialize.
    Json(serde_json::Error),
}

impl fmt::Display for WireError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Base64(e) => write!(f, "payload base64 error: {e}"),
            Self::Dtype { found } => {
                write!(f, "unsupported payload dtype \"{found}\"")
            }
            Self::ByteLength { len, elem } => {
                write!(f, "{len} bytes is not a whole number of {elem} elements")
            }
            Self::Shape { expected, found } => {
                write!(
                    f,
                    "payload shape expects {expected} elements, found {found}"
                )
            }
            Self::Malformed { field } => {
                write!(f, "field \"{field}\" is not a numeric array")
            }
            Self::Json(e) => write!(f, "wire serialization error: {e}"),
        }
    }
}

impl std::error::Error for WireError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Base64(e) => Some(e),
            Self::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<base64::DecodeError> for WireError {
    fn from(e: base64::DecodeError) -> Self {
        Self::Base64(e)
    }
}

impl From<serde_json::Error> for WireError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}

// ---------------------------------------------------------------------------
// Array payloads
// ---------------------------------------------------------------------------

/// A geometry array on the wire: raw element bytes, base64-encoded, plus
/// dtype name and shape. Byte order is the platform's native order, which
/// the renderer's typed-array view assumes (little-endian on all supported
/// targets).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArrayPayload {
    /// Base64-encoded element bytes.
    pub data: String,
    /// Dtype name (`float32` or `uint32`).
    #[serde(rename = "type")]
    pub dtype: String,
    /// Array dimensions, outermost first.
    pub shape: Vec<usize>,
}

impl ArrayPayload {
    /// Encode a flat `f32` slice with the given shape.
    #[must_use]
    pub fn from_f32s(values: &[f32], shape: &[usize]) -> Self {
        Self {
            data: STANDARD.encode(bytemuck::cast_slice::<_, u8>(values)),
            dtype: ArrayElem::F32.dtype_name().to_owned(),
            shape: shape.to_vec(),
        }
    }

    /// Encode a flat `u32` slice with the given shape.
    #[must_use]
    pub fn from_u32s(values: &[u32], shape: &[usize]) -> Self {
        Self {
            data: STANDARD.encode(bytemuck::cast_slice::<_, u8>(values)),
            dtype: ArrayElem::U32.dtype_name().to_owned(),
            shape: shape.to_vec(),
        }
    }

    fn decode_bytes(&self, elem: ArrayElem) -> Result<Vec<u8>, WireError> {
        if self.dtype != elem.dtype_name() {
            return Err(WireError::Dtype {
                found: self.dtype.clone(),
            });
        }
        let bytes = STANDARD.decode(&self.data)?;
        if bytes.len() % 4 != 0 {
            return Err(WireError::ByteLength {
                len: bytes.len(),
                elem: elem.dtype_name(),
            });
        }
        let count = bytes.len() / 4;
        let expected: usize = self.shape.iter().product();
        if count != expected {
            return Err(WireError::Shape {
                expected,
                found: count,
            });
        }
        Ok(bytes)
    }

    /// Decode back into a flat `f32` vector.
    ///
    /// # Errors
    /// [`WireError`] on dtype mismatch, bad base64, or a byte count that
    /// disagrees with the shape.
    pub fn to_f32s(&self) -> Result<Vec<f32>, WireError> {
        let bytes = self.decode_bytes(ArrayElem::F32)?;
        Ok(bytemuck::pod_collect_to_vec(&bytes))
    }

    /// Decode back into a flat `u32` vector.
    ///
    /// # Errors
    /// [`WireError`] on dtype mismatch, bad base64, or a byte count that
    /// disagrees with the shape.
    pub fn to_u32s(&self) -> Result<Vec<u32>, WireError> {
        let bytes = self.decode_bytes(ArrayElem::U32)?;
        Ok(bytemuck::pod_collect_to_vec(&bytes))
    }
}

/// Encode a canonical nested-row array value as a payload.
fn encode_rows(
    rows: &Value,
    elem: ArrayElem,
    field: &str,
) -> Result<Value, WireError> {
    let malformed = || WireError::Malformed {
        field: field.to_owned(),
    };

    let rows = rows.as_array().ok_or_else(malformed)?;
    let cols = rows.first().and_then(Value::as_array).map_or(0, Vec::len);
    let shape = [rows.len(), cols];

    let payload = match elem {
        ArrayElem::F32 => {
            let mut flat = Vec::with_capacity(rows.len() * cols);
            for row in rows {
                let row = row.as_array().ok_or_else(malformed)?;
                for v in row {
                    flat.push(v.as_f64().ok_or_else(malformed)? as f32);
                }
            }
            ArrayPayload::from_f32s(&flat, &shape)
        }
        ArrayElem::U32 => {
            let mut flat = Vec::with_capacity(rows.len() * cols);
            for row in rows {
                let row = row.as_array().ok_or_else(malformed)?;
                for v in row {
                    let v = v.as_u64().ok_or_else(malformed)?;
                    flat.push(u32::try_from(v).map_err(|_| malformed())?);
                }
            }
            ArrayPayload::from_u32s(&flat, &shape)
        }
    };
    Ok(serde_json::to_value(payload)?)
}

/// Rewrite an options record for the wire: geometry-array fields become
/// payloads, everything else passes through untouched. Accepts partial
/// records (update calls send only the fields that changed).
fn encode_options(
    kind: RepKind,
    options: &Map<String, Value>,
) -> Result<Map<String, Value>, WireError> {
    let mut out = Map::new();
    for (name, entry) in kind.options_schema() {
        let Some(value) = options.get(*name) else {
            continue;
        };
        let encoded = match entry {
            Entry::Field(Field::Array(a)) => {
                encode_rows(value, a.elem, name)?
            }
            _ => value.clone(),
        };
        let _ = out.insert((*name).to_owned(), encoded);
    }
    // Pass through anything outside the schema unchanged; the renderer
    // ignores what it does not know.
    for (name, value) in options {
        if !out.contains_key(name)
            && !kind
                .options_schema()
                .iter()
                .any(|(n, _)| *n == name.as_str())
        {
            let _ = out.insert(name.clone(), value.clone());
        }
    }
    Ok(out)
}

// ---------------------------------------------------------------------------
// Remote calls
// ---------------------------------------------------------------------------

/// One `callMethod` message for the browser-side renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteCall {
    /// Message discriminator; always `"callMethod"`.
    #[serde(rename = "type")]
    pub msg_type: String,
    /// Renderer method to invoke.
    pub method_name: String,
    /// Method arguments, with geometry arrays payload-encoded.
    pub args: Value,
}

impl RemoteCall {
    /// Build a call to an arbitrary renderer method. `args` are passed
    /// through as-is; use the dedicated constructors for representation
    /// calls so geometry arrays get encoded.
    #[must_use]
    pub fn call_method(method_name: &str, args: Value) -> Self {
        Self {
            msg_type: "callMethod".to_owned(),
            method_name: method_name.to_owned(),
            args,
        }
    }

    /// `addRepresentation`: ship a typed representation to the renderer.
    ///
    /// # Errors
    /// [`WireError`] if the options fail to serialize or contain a
    /// malformed geometry array.
    pub fn add_representation(rep: &Representation) -> Result<Self, WireError> {
        let kind = rep.options.kind();
        let serialized = serde_json::to_value(&rep.options)?;
        let options = serialized
            .get("options")
            .and_then(Value::as_object)
            .ok_or_else(|| WireError::Malformed {
                field: "options".to_owned(),
            })?;
        let encoded = encode_options(kind, options)?;
        Ok(Self::call_method(
            "addRepresentation",
            json!({
                "type": kind.keyword(),
                "repId": rep.rep_id,
                "options": Value::Object(encoded),
            }),
        ))
    }

    /// `updateRepresentation`: ship changed options for an existing
    /// representation. `options` may be partial.
    ///
    /// # Errors
    /// [`WireError`] if a geometry-array field is malformed.
    pub fn update_representation(
        kind: RepKind,
        rep_id: u32,
        options: &Map<String, Value>,
    ) -> Result<Self, WireError> {
        let encoded = encode_options(kind, options)?;
        Ok(Self::call_method(
            "updateRepresentation",
            json!({
                "repId": rep_id,
                "options": Value::Object(encoded),
            }),
        ))
    }

    /// `removeRepresentation`: drop a representation by id.
    #[must_use]
    pub fn remove_representation(rep_id: u32) -> Self {
        Self::call_method("removeRepresentation", json!({ "repId": rep_id }))
    }
}
