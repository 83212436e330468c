//! Scene normalization: the validation gate between ad-hoc scene records
//! and the renderer.
//!
//! A scene is a camera plus an ordered list of representations. Callers
//! build raw JSON-shaped records; [`normalize_scene`] validates and
//! completes them into canonical form (every field present, defaulted where
//! omitted, cast to its canonical type) or fails with a precise
//! [`SceneError`]. The typed [`Scene`] model decodes from canonical records
//! for Rust-side consumers.
//!
//! Normalization is purely functional: no I/O, no shared state, same input
//! always yields the same output.

mod representation;

pub use representation::*;

use glam::{Quat, Vec3};
use rustc_hash::FxHashSet;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::SceneError;
use crate::schema::{
    validate_record, BoundedScalar, Entry, Field, Scalar, Schema, TypedList,
};

// ---------------------------------------------------------------------------
// Scene schema
// ---------------------------------------------------------------------------

const fn camera_vector(default: &'static [f64]) -> Entry {
    Entry::Field(Field::TypedList(TypedList {
        elem: Scalar::Float,
        len: Some(default.len()),
        anchor: None,
        fill: None,
        default: Some(default),
    }))
}

const CAMERA_SCHEMA: Schema = &[
    (
        "aspect",
        Entry::Field(Field::BoundedScalar(BoundedScalar {
            kind: Scalar::Float,
            min: 0.0,
            max: f64::INFINITY,
            min_inclusive: false,
            max_inclusive: true,
            default: Some(1.0),
        })),
    ),
    (
        "vfov",
        Entry::Field(Field::BoundedScalar(BoundedScalar {
            kind: Scalar::Float,
            min: 0.0,
            max: 180.0,
            min_inclusive: false,
            max_inclusive: true,
            default: Some(90.0),
        })),
    ),
    ("location", camera_vector(&[0.0, 0.0, -1.0])),
    ("quaternion", camera_vector(&[0.0, 0.0, 0.0, 1.0])),
    ("target", camera_vector(&[0.0, 0.0, 0.0])),
];

const SCENE_SCHEMA: Schema = &[
    ("camera", Entry::Record(CAMERA_SCHEMA)),
    (
        "representations",
        Entry::Dispatch {
            key: "rep_type",
            resolve: resolve_schema,
        },
    ),
];

// ---------------------------------------------------------------------------
// Normalization entry points
// ---------------------------------------------------------------------------

/// Validate and complete a raw scene record.
///
/// Camera fields always receive defaults when absent; a missing
/// `representations` list normalizes to empty. Representation order is
/// preserved. The input is never mutated.
///
/// # Errors
/// The first missing, uncastable, or out-of-constraint field aborts with
/// the corresponding [`SceneError`]; duplicate `rep_id` values are rejected
/// as validation errors.
pub fn normalize_scene(scene: &Value) -> Result<Value, SceneError> {
    let record = scene.as_object().ok_or_else(|| SceneError::Cast {
        path: "scene".to_owned(),
        value: scene.to_string(),
        expected: "record",
    })?;

    let out = validate_record(record, SCENE_SCHEMA, "")?;
    check_unique_ids(&out)?;

    let count = out
        .get("representations")
        .and_then(Value::as_array)
        .map_or(0, Vec::len);
    log::debug!("normalized scene with {count} representation(s)");

    Ok(Value::Object(out))
}

/// Like [`normalize_scene`], but first merges `overrides` into every
/// representation's options record. Overrides win over per-representation
/// values. Used by export paths that impose render-wide settings.
///
/// # Errors
/// Same failure modes as [`normalize_scene`], evaluated after the merge.
pub fn normalize_scene_with(
    scene: &Value,
    overrides: &Map<String, Value>,
) -> Result<Value, SceneError> {
    if overrides.is_empty() {
        return normalize_scene(scene);
    }

    let mut merged = scene.clone();
    if let Some(reps) = merged
        .get_mut("representations")
        .and_then(Value::as_array_mut)
    {
        for rep in reps {
            let Some(rep) = rep.as_object_mut() else {
                continue;
            };
            let options = rep
                .entry("options")
                .or_insert_with(|| Value::Object(Map::new()));
            if let Some(options) = options.as_object_mut() {
                for (key, value) in overrides {
                    let _ = options.insert(key.clone(), value.clone());
                }
            }
        }
    }
    normalize_scene(&merged)
}

/// Downstream update/remove-by-id calls assume ids are unique, so reusing
/// one within a scene is rejected here rather than surfacing as a renderer
/// glitch later.
fn check_unique_ids(scene: &Map<String, Value>) -> Result<(), SceneError> {
    let Some(reps) = scene.get("representations").and_then(Value::as_array)
    else {
        return Ok(());
    };

    let mut seen = FxHashSet::default();
    for (i, rep) in reps.iter().enumerate() {
        let Some(id) = rep.get("rep_id") else {
            continue;
        };
        if !seen.insert(id.to_string()) {
            return Err(SceneError::Validation {
                path: format!("representations[{i}].rep_id"),
                value: id.to_string(),
                reason: "should be unique within the scene".to_owned(),
            });
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Typed model
// ---------------------------------------------------------------------------

/// Camera description: projection parameters plus an orientation frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Camera {
    /// Viewport aspect ratio (width / height); must be positive.
    #[schemars(range(min = 0.0))]
    pub aspect: f32,
    /// Vertical field of view in degrees, in (0, 180].
    #[schemars(range(min = 0.0, max = 180.0))]
    pub vfov: f32,
    /// Camera position.
    #[schemars(with = "[f32; 3]")]
    pub location: Vec3,
    /// Camera orientation.
    #[schemars(with = "[f32; 4]")]
    pub quaternion: Quat,
    /// Point the camera looks at.
    #[schemars(with = "[f32; 3]")]
    pub target: Vec3,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            aspect: 1.0,
            vfov: 90.0,
            location: Vec3::new(0.0, 0.0, -1.0),
            quaternion: Quat::IDENTITY,
            target: Vec3::ZERO,
        }
    }
}

/// A fully-typed scene: the decoded form of a canonical scene record.
#[derive(
    Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema,
)]
#[serde(default)]
pub struct Scene {
    /// Camera description.
    pub camera: Camera,
    /// Drawable representations in draw/update order.
    pub representations: Vec<Representation>,
}

impl Scene {
    /// An empty scene with a default camera.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalize a raw scene record and decode it into the typed model.
    ///
    /// # Errors
    /// Any [`normalize_scene`] failure, or [`SceneError::Decode`] if the
    /// canonical record does not fit the typed model.
    pub fn from_value(raw: &Value) -> Result<Self, SceneError> {
        let canonical = normalize_scene(raw)?;
        Ok(serde_json::from_value(canonical)?)
    }

    /// Re-emit the canonical record for this scene.
    ///
    /// # Errors
    /// [`SceneError::Decode`] if serialization fails (it cannot for
    /// well-formed scenes).
    pub fn to_value(&self) -> Result<Value, SceneError> {
        Ok(serde_json::to_value(self)?)
    }

    /// Look up a representation by id.
    #[must_use]
    pub fn representation(&self, rep_id: u32) -> Option<&Representation> {
        self.representations.iter().find(|r| r.rep_id == rep_id)
    }

    /// Whether a representation with this id exists.
    #[must_use]
    pub fn contains(&self, rep_id: u32) -> bool {
        self.representation(rep_id).is_some()
    }

    /// Generate JSON Schema describing the typed scene model, for
    /// UI-side editors.
    #[must_use]
    pub fn json_schema() -> schemars::Schema {
        schemars::schema_for!(Scene)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::error::SceneError;

    fn points_scene() -> Value {
        json!({
            "representations": [{
                "rep_id": 1,
                "rep_type": "points",
                "options": {
                    "coordinates": [[0, 0, 0], [0, 0, 1], [0, 1, 2]],
                },
            }],
        })
    }

    #[test]
    fn camera_defaults_fill_missing_fields() {
        let scene = normalize_scene(&json!({"representations": []})).unwrap();
        assert_eq!(
            scene["camera"],
            json!({
                "aspect": 1.0,
                "vfov": 90.0,
                "location": [0.0, 0.0, -1.0],
                "quaternion": [0.0, 0.0, 0.0, 1.0],
                "target": [0.0, 0.0, 0.0],
            })
        );
    }

    #[test]
    fn missing_representations_default_to_empty() {
        let scene = normalize_scene(&json!({})).unwrap();
        assert_eq!(scene["representations"], json!([]));
    }

    #[test]
    fn normalization_is_idempotent() {
        let once = normalize_scene(&points_scene()).unwrap();
        let twice = normalize_scene(&once).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn negative_aspect_is_rejected() {
        let err =
            normalize_scene(&json!({"camera": {"aspect": -1}})).unwrap_err();
        let SceneError::Validation { path, .. } = err else {
            panic!("expected validation error, got {err}");
        };
        assert_eq!(path, "camera.aspect");
    }

    #[test]
    fn points_defaults_match_anchor_length() {
        let scene = normalize_scene(&points_scene()).unwrap();
        let options = &scene["representations"][0]["options"];
        assert_eq!(
            options["colors"],
            json!([0xFF_FFFF, 0xFF_FFFF, 0xFF_FFFF])
        );
        assert_eq!(options["sizes"], json!([0.1, 0.1, 0.1]));
        assert_eq!(options["opacities"], json!([1.0, 1.0, 1.0]));
    }

    #[test]
    fn spheres_default_radii() {
        let scene = normalize_scene(&json!({
            "representations": [{
                "rep_id": 1,
                "rep_type": "spheres",
                "options": {
                    "coordinates": [[0, 0, 0], [0, 0, 1], [0, 1, 2]],
                },
            }],
        }))
        .unwrap();
        let options = &scene["representations"][0]["options"];
        assert_eq!(options["radii"], json!([0.1, 0.1, 0.1]));
        assert_eq!(options["alpha"], json!([1.0, 1.0, 1.0]));
    }

    #[test]
    fn keyword_dispatch_keeps_rep_type() {
        let scene = normalize_scene(&points_scene()).unwrap();
        assert_eq!(scene["representations"][0]["rep_type"], json!("points"));
    }

    #[test]
    fn unknown_rep_type_is_a_hard_error() {
        let err = normalize_scene(&json!({
            "representations": [{
                "rep_id": 1,
                "rep_type": "blob",
                "options": {},
            }],
        }))
        .unwrap_err();
        let SceneError::UnknownRepresentation { found, .. } = err else {
            panic!("expected unknown representation, got {err}");
        };
        assert_eq!(found, "blob");
    }

    #[test]
    fn rep_id_is_required() {
        let err = normalize_scene(&json!({
            "representations": [{
                "rep_type": "points",
                "options": {"coordinates": [[0, 0, 0]]},
            }],
        }))
        .unwrap_err();
        let SceneError::MissingField { path } = err else {
            panic!("expected missing field, got {err}");
        };
        assert_eq!(path, "representations[0].rep_id");
    }

    #[test]
    fn smoothtube_requires_coordinates() {
        let err = normalize_scene(&json!({
            "representations": [{
                "rep_id": 1,
                "rep_type": "smoothtube",
                "options": {},
            }],
        }))
        .unwrap_err();
        let SceneError::MissingField { path } = err else {
            panic!("expected missing field, got {err}");
        };
        assert_eq!(path, "representations[0].options.coordinates");
    }

    #[test]
    fn smoothtube_rejects_non_numeric_radius() {
        let err = normalize_scene(&json!({
            "representations": [{
                "rep_id": 1,
                "rep_type": "smoothtube",
                "options": {
                    "coordinates": [[0, 0, 0]],
                    "radius": "thick",
                },
            }],
        }))
        .unwrap_err();
        assert!(matches!(err, SceneError::Cast { .. }), "got {err}");
    }

    #[test]
    fn smoothtube_fills_scalar_defaults() {
        let scene = normalize_scene(&json!({
            "representations": [{
                "rep_id": 1,
                "rep_type": "smoothtube",
                "options": {"coordinates": [[0, 0, 0], [0, 0, 1]]},
            }],
        }))
        .unwrap();
        let options = &scene["representations"][0]["options"];
        assert_eq!(options["radius"], json!(1.0));
        assert_eq!(options["color"], json!(0xFF_FFFF));
        assert_eq!(options["resolution"], json!(16));
    }

    #[test]
    fn smoothtube_resolution_lower_bound() {
        let err = normalize_scene(&json!({
            "representations": [{
                "rep_id": 1,
                "rep_type": "smoothtube",
                "options": {
                    "coordinates": [[0, 0, 0]],
                    "resolution": 1,
                },
            }],
        }))
        .unwrap_err();
        assert!(matches!(err, SceneError::Validation { .. }), "got {err}");
    }

    #[test]
    fn representation_order_is_preserved() {
        let scene = normalize_scene(&json!({
            "representations": [
                {
                    "rep_id": 2,
                    "rep_type": "spheres",
                    "options": {"coordinates": [[0, 0, 0]]},
                },
                {
                    "rep_id": 1,
                    "rep_type": "points",
                    "options": {"coordinates": [[0, 0, 0]]},
                },
            ],
        }))
        .unwrap();
        let reps = scene["representations"].as_array().unwrap();
        assert_eq!(reps[0]["rep_type"], json!("spheres"));
        assert_eq!(reps[0]["rep_id"], json!(2));
        assert_eq!(reps[1]["rep_type"], json!("points"));
        assert_eq!(reps[1]["rep_id"], json!(1));
    }

    #[test]
    fn duplicate_rep_ids_are_rejected() {
        let err = normalize_scene(&json!({
            "representations": [
                {
                    "rep_id": 1,
                    "rep_type": "points",
                    "options": {"coordinates": [[0, 0, 0]]},
                },
                {
                    "rep_id": 1,
                    "rep_type": "spheres",
                    "options": {"coordinates": [[0, 0, 0]]},
                },
            ],
        }))
        .unwrap_err();
        let SceneError::Validation { path, reason, .. } = err else {
            panic!("expected validation error, got {err}");
        };
        assert_eq!(path, "representations[1].rep_id");
        assert!(reason.contains("unique"));
    }

    #[test]
    fn overrides_merge_into_every_representation() {
        let overrides = match json!({"sizes": [0.5, 0.5, 0.5]}) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };
        let scene =
            normalize_scene_with(&points_scene(), &overrides).unwrap();
        assert_eq!(
            scene["representations"][0]["options"]["sizes"],
            json!([0.5, 0.5, 0.5])
        );
    }

    #[test]
    fn non_record_scene_is_a_cast_error() {
        let err = normalize_scene(&json!([1, 2, 3])).unwrap_err();
        assert!(matches!(err, SceneError::Cast { .. }), "got {err}");
    }

    #[test]
    fn typed_decode_of_points_scene() {
        let scene = Scene::from_value(&points_scene()).unwrap();
        assert_eq!(scene.camera, Camera::default());
        assert_eq!(scene.representations.len(), 1);

        let rep = scene.representation(1).unwrap();
        let RepOptions::Points(points) = &rep.options else {
            panic!("expected points options");
        };
        assert_eq!(points.coordinates.len(), 3);
        assert_eq!(points.colors, vec![0xFF_FFFF; 3]);
        assert_eq!(points.sizes, vec![0.1, 0.1, 0.1]);
        assert!(scene.contains(1));
        assert!(!scene.contains(2));
    }

    #[test]
    fn typed_scene_round_trips_through_canonical_form() {
        let scene = Scene {
            camera: Camera::default(),
            representations: vec![Representation::new(
                1,
                RepOptions::Spheres(SpheresOptions::new(vec![
                    [0.0, 0.0, 0.0],
                    [0.0, 0.0, 1.0],
                ])),
            )],
        };
        let value = scene.to_value().unwrap();
        let back = Scene::from_value(&value).unwrap();
        assert_eq!(back, scene);
    }

    #[test]
    fn json_schema_exposes_top_level_sections() {
        let schema = serde_json::to_value(Scene::json_schema()).unwrap();
        let props = schema["properties"].as_object().unwrap();
        assert!(props.contains_key("camera"));
        assert!(props.contains_key("representations"));
    }
}
