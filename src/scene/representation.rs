//! The seven representation kinds: dispatch keywords, per-kind schemas, and
//! the strongly-typed options model.
//!
//! `rep_type` keywords are the wire-facing discriminator; internally the
//! kinds form a closed enum and every dispatch is an exhaustive match, so
//! adding a kind means adding one schema table and one options struct and
//! the compiler points at every site that needs updating.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::color;
use crate::schema::{
    ArrayElem, ArrayField, Boolean, BoundedScalar, Entry, Field, Keyword,
    Scalar, Schema, TypedList,
};

// ---------------------------------------------------------------------------
// Schema tables
// ---------------------------------------------------------------------------

/// Default per-element size for point sprites.
const DEFAULT_SIZE: f64 = 0.1;
/// Default per-element radius for spheres and cylinders.
const DEFAULT_RADIUS: f64 = 0.1;

const COORDS: Entry = Entry::Field(Field::Array(ArrayField {
    elem: ArrayElem::F32,
    cols: 3,
}));

const FACES: Entry = Entry::Field(Field::Array(ArrayField {
    elem: ArrayElem::U32,
    cols: 3,
}));

const fn color_list(anchor: &'static str) -> Entry {
    Entry::Field(Field::TypedList(TypedList {
        elem: Scalar::Int,
        len: None,
        anchor: Some(anchor),
        fill: Some(color::WHITE as f64),
        default: None,
    }))
}

const fn float_list(anchor: &'static str, fill: f64) -> Entry {
    Entry::Field(Field::TypedList(TypedList {
        elem: Scalar::Float,
        len: None,
        anchor: Some(anchor),
        fill: Some(fill),
        default: None,
    }))
}

const fn color_scalar() -> Entry {
    Entry::Field(Field::BoundedScalar(BoundedScalar {
        kind: Scalar::Int,
        min: 0.0,
        max: color::WHITE as f64,
        min_inclusive: true,
        max_inclusive: true,
        default: Some(color::WHITE as f64),
    }))
}

const fn nonnegative_float(default: f64) -> Entry {
    Entry::Field(Field::BoundedScalar(BoundedScalar {
        kind: Scalar::Float,
        min: 0.0,
        max: f64::INFINITY,
        min_inclusive: true,
        max_inclusive: true,
        default: Some(default),
    }))
}

const POINTS_OPTIONS: Schema = &[
    ("coordinates", COORDS),
    ("colors", color_list("coordinates")),
    ("sizes", float_list("coordinates", DEFAULT_SIZE)),
    ("opacities", float_list("coordinates", 1.0)),
];

const SPHERES_OPTIONS: Schema = &[
    ("coordinates", COORDS),
    ("colors", color_list("coordinates")),
    ("radii", float_list("coordinates", DEFAULT_RADIUS)),
    ("alpha", float_list("coordinates", 1.0)),
];

const CYLINDERS_OPTIONS: Schema = &[
    ("startCoords", COORDS),
    ("endCoords", COORDS),
    ("colors", color_list("startCoords")),
    ("radii", float_list("startCoords", DEFAULT_RADIUS)),
    ("alpha", float_list("startCoords", 1.0)),
];

const LINES_OPTIONS: Schema = &[
    ("startCoords", COORDS),
    ("endCoords", COORDS),
    ("startColors", color_list("startCoords")),
    ("endColors", color_list("endCoords")),
];

const SURFACE_OPTIONS: Schema = &[
    ("verts", COORDS),
    ("faces", FACES),
    ("colors", color_list("verts")),
    ("alpha", float_list("verts", 1.0)),
];

const SMOOTHTUBE_OPTIONS: Schema = &[
    ("coordinates", COORDS),
    ("radius", nonnegative_float(1.0)),
    ("color", color_scalar()),
    (
        "resolution",
        Entry::Field(Field::BoundedScalar(BoundedScalar {
            kind: Scalar::Int,
            min: 2.0,
            max: f64::INFINITY,
            min_inclusive: true,
            max_inclusive: true,
            default: Some(16.0),
        })),
    ),
];

const RIBBON_OPTIONS: Schema = &[
    ("coordinates", COORDS),
    ("normals", COORDS),
    ("color", color_scalar()),
    ("width", nonnegative_float(0.2)),
    (
        "arrow",
        Entry::Field(Field::Boolean(Boolean { default: false })),
    ),
];

const fn rep_schema(keyword: &'static str, options: Schema) -> [(&'static str, Entry); 3] {
    [
        ("rep_id", Entry::Field(Field::UniqueId)),
        ("rep_type", Entry::Field(Field::Keyword(Keyword { value: keyword }))),
        ("options", Entry::Record(options)),
    ]
}

const POINTS_SCHEMA: Schema = &rep_schema("points", POINTS_OPTIONS);
const SPHERES_SCHEMA: Schema = &rep_schema("spheres", SPHERES_OPTIONS);
const CYLINDERS_SCHEMA: Schema = &rep_schema("cylinders", CYLINDERS_OPTIONS);
const LINES_SCHEMA: Schema = &rep_schema("lines", LINES_OPTIONS);
const SURFACE_SCHEMA: Schema = &rep_schema("surface", SURFACE_OPTIONS);
const SMOOTHTUBE_SCHEMA: Schema = &rep_schema("smoothtube", SMOOTHTUBE_OPTIONS);
const RIBBON_SCHEMA: Schema = &rep_schema("ribbon", RIBBON_OPTIONS);

// ---------------------------------------------------------------------------
// Kind dispatch
// ---------------------------------------------------------------------------

/// The closed set of representation kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RepKind {
    /// Point sprites at each coordinate.
    Points,
    /// Spheres at each coordinate.
    Spheres,
    /// Cylinders between start/end coordinate pairs.
    Cylinders,
    /// Straight line segments between start/end coordinate pairs.
    Lines,
    /// Triangle mesh surface.
    Surface,
    /// Smooth tube threaded through control points.
    SmoothTube,
    /// Flat ribbon following control points and normals.
    Ribbon,
}

impl RepKind {
    /// Every kind, in wire order.
    pub const ALL: [Self; 7] = [
        Self::Points,
        Self::Spheres,
        Self::Cylinders,
        Self::Lines,
        Self::Surface,
        Self::SmoothTube,
        Self::Ribbon,
    ];

    /// The `rep_type` keyword carried on the wire.
    #[must_use]
    pub fn keyword(self) -> &'static str {
        match self {
            Self::Points => "points",
            Self::Spheres => "spheres",
            Self::Cylinders => "cylinders",
            Self::Lines => "lines",
            Self::Surface => "surface",
            Self::SmoothTube => "smoothtube",
            Self::Ribbon => "ribbon",
        }
    }

    /// Resolve a `rep_type` keyword. `None` for anything outside the closed
    /// set.
    #[must_use]
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "points" => Some(Self::Points),
            "spheres" => Some(Self::Spheres),
            "cylinders" => Some(Self::Cylinders),
            "lines" => Some(Self::Lines),
            "surface" => Some(Self::Surface),
            "smoothtube" => Some(Self::SmoothTube),
            "ribbon" => Some(Self::Ribbon),
            _ => None,
        }
    }

    /// Full record schema for this kind (`rep_id` + `rep_type` + `options`).
    #[must_use]
    pub fn schema(self) -> Schema {
        match self {
            Self::Points => POINTS_SCHEMA,
            Self::Spheres => SPHERES_SCHEMA,
            Self::Cylinders => CYLINDERS_SCHEMA,
            Self::Lines => LINES_SCHEMA,
            Self::Surface => SURFACE_SCHEMA,
            Self::SmoothTube => SMOOTHTUBE_SCHEMA,
            Self::Ribbon => RIBBON_SCHEMA,
        }
    }

    /// Schema of the `options` sub-record alone (used when validating
    /// update-representation payloads).
    #[must_use]
    pub fn options_schema(self) -> Schema {
        match self {
            Self::Points => POINTS_OPTIONS,
            Self::Spheres => SPHERES_OPTIONS,
            Self::Cylinders => CYLINDERS_OPTIONS,
            Self::Lines => LINES_OPTIONS,
            Self::Surface => SURFACE_OPTIONS,
            Self::SmoothTube => SMOOTHTUBE_OPTIONS,
            Self::Ribbon => RIBBON_OPTIONS,
        }
    }
}

/// Dispatch resolver handed to the schema walker: keyword → record schema.
pub(crate) fn resolve_schema(keyword: &str) -> Option<Schema> {
    RepKind::from_keyword(keyword).map(RepKind::schema)
}

// ---------------------------------------------------------------------------
// Typed options
// ---------------------------------------------------------------------------

/// Options for a `points` representation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PointsOptions {
    /// Point positions, one row per point.
    pub coordinates: Vec<[f32; 3]>,
    /// Packed 0xRRGGBB color per point.
    pub colors: Vec<u32>,
    /// Sprite size per point.
    pub sizes: Vec<f32>,
    /// Opacity per point in [0, 1].
    pub opacities: Vec<f32>,
}

impl PointsOptions {
    /// White points of size 0.1, fully opaque.
    #[must_use]
    pub fn new(coordinates: Vec<[f32; 3]>) -> Self {
        let n = coordinates.len();
        Self {
            coordinates,
            colors: vec![color::WHITE; n],
            sizes: vec![DEFAULT_SIZE as f32; n],
            opacities: vec![1.0; n],
        }
    }
}

/// Options for a `spheres` representation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SpheresOptions {
    /// Sphere centers.
    pub coordinates: Vec<[f32; 3]>,
    /// Packed 0xRRGGBB color per sphere.
    pub colors: Vec<u32>,
    /// Radius per sphere.
    pub radii: Vec<f32>,
    /// Alpha per sphere in [0, 1].
    pub alpha: Vec<f32>,
}

impl SpheresOptions {
    /// White spheres of radius 0.1, fully opaque.
    #[must_use]
    pub fn new(coordinates: Vec<[f32; 3]>) -> Self {
        let n = coordinates.len();
        Self {
            coordinates,
            colors: vec![color::WHITE; n],
            radii: vec![DEFAULT_RADIUS as f32; n],
            alpha: vec![1.0; n],
        }
    }
}

/// Options for a `cylinders` representation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CylindersOptions {
    /// Cylinder start points.
    pub start_coords: Vec<[f32; 3]>,
    /// Cylinder end points.
    pub end_coords: Vec<[f32; 3]>,
    /// Packed 0xRRGGBB color per cylinder.
    pub colors: Vec<u32>,
    /// Radius per cylinder.
    pub radii: Vec<f32>,
    /// Alpha per cylinder in [0, 1].
    pub alpha: Vec<f32>,
}

impl CylindersOptions {
    /// White cylinders of radius 0.1, fully opaque.
    #[must_use]
    pub fn new(start_coords: Vec<[f32; 3]>, end_coords: Vec<[f32; 3]>) -> Self {
        let n = start_coords.len();
        Self {
            start_coords,
            end_coords,
            colors: vec![color::WHITE; n],
            radii: vec![DEFAULT_RADIUS as f32; n],
            alpha: vec![1.0; n],
        }
    }
}

/// Options for a `lines` representation. Segment endpoints carry their own
/// colors so bonds can blend between the two atom colors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LinesOptions {
    /// Segment start points.
    pub start_coords: Vec<[f32; 3]>,
    /// Segment end points.
    pub end_coords: Vec<[f32; 3]>,
    /// Packed 0xRRGGBB color at each start point.
    pub start_colors: Vec<u32>,
    /// Packed 0xRRGGBB color at each end point.
    pub end_colors: Vec<u32>,
}

impl LinesOptions {
    /// White segments.
    #[must_use]
    pub fn new(start_coords: Vec<[f32; 3]>, end_coords: Vec<[f32; 3]>) -> Self {
        let start_colors = vec![color::WHITE; start_coords.len()];
        let end_colors = vec![color::WHITE; end_coords.len()];
        Self {
            start_coords,
            end_coords,
            start_colors,
            end_colors,
        }
    }
}

/// Options for a `surface` representation (triangle mesh).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SurfaceOptions {
    /// Mesh vertices.
    pub verts: Vec<[f32; 3]>,
    /// Triangle vertex indices, one row per face.
    pub faces: Vec<[u32; 3]>,
    /// Packed 0xRRGGBB color per vertex.
    pub colors: Vec<u32>,
    /// Alpha per vertex in [0, 1].
    pub alpha: Vec<f32>,
}

impl SurfaceOptions {
    /// White opaque mesh.
    #[must_use]
    pub fn new(verts: Vec<[f32; 3]>, faces: Vec<[u32; 3]>) -> Self {
        let n = verts.len();
        Self {
            verts,
            faces,
            colors: vec![color::WHITE; n],
            alpha: vec![1.0; n],
        }
    }
}

/// Options for a `smoothtube` representation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SmoothTubeOptions {
    /// Control points the tube threads through.
    pub coordinates: Vec<[f32; 3]>,
    /// Tube radius.
    #[schemars(range(min = 0.0))]
    pub radius: f32,
    /// Packed 0xRRGGBB tube color.
    pub color: u32,
    /// Radial segment count of the tube cross-section.
    #[schemars(range(min = 2))]
    pub resolution: u32,
}

impl SmoothTubeOptions {
    /// White tube of radius 1.0 with 16 radial segments.
    #[must_use]
    pub fn new(coordinates: Vec<[f32; 3]>) -> Self {
        Self {
            coordinates,
            radius: 1.0,
            color: color::WHITE,
            resolution: 16,
        }
    }
}

/// Options for a `ribbon` representation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RibbonOptions {
    /// Control points the ribbon follows.
    pub coordinates: Vec<[f32; 3]>,
    /// Ribbon plane normal per control point.
    pub normals: Vec<[f32; 3]>,
    /// Packed 0xRRGGBB ribbon color.
    pub color: u32,
    /// Ribbon width.
    #[schemars(range(min = 0.0))]
    pub width: f32,
    /// Draw an arrow head at the final control point.
    pub arrow: bool,
}

impl RibbonOptions {
    /// White ribbon of width 0.2, no arrow head.
    #[must_use]
    pub fn new(coordinates: Vec<[f32; 3]>, normals: Vec<[f32; 3]>) -> Self {
        Self {
            coordinates,
            normals,
            color: color::WHITE,
            width: 0.2,
            arrow: false,
        }
    }
}

/// Typed options for one representation, tagged by kind. Serializes as
/// `{"rep_type": <keyword>, "options": {...}}`, the same shape the dynamic
/// normalizer emits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "rep_type", content = "options", rename_all = "lowercase")]
pub enum RepOptions {
    /// Point sprites.
    Points(PointsOptions),
    /// Spheres.
    Spheres(SpheresOptions),
    /// Cylinders.
    Cylinders(CylindersOptions),
    /// Line segments.
    Lines(LinesOptions),
    /// Triangle mesh surface.
    Surface(SurfaceOptions),
    /// Smooth tube.
    SmoothTube(SmoothTubeOptions),
    /// Ribbon.
    Ribbon(RibbonOptions),
}

impl RepOptions {
    /// The kind these options belong to.
    #[must_use]
    pub fn kind(&self) -> RepKind {
        match self {
            Self::Points(_) => RepKind::Points,
            Self::Spheres(_) => RepKind::Spheres,
            Self::Cylinders(_) => RepKind::Cylinders,
            Self::Lines(_) => RepKind::Lines,
            Self::Surface(_) => RepKind::Surface,
            Self::SmoothTube(_) => RepKind::SmoothTube,
            Self::Ribbon(_) => RepKind::Ribbon,
        }
    }
}

/// One drawable representation: a caller-assigned integer id plus kind-typed
/// options. Ids must be unique within a scene; `normalize_scene` enforces
/// this.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Representation {
    /// Caller-assigned unique identifier, used by update/remove calls.
    pub rep_id: u32,
    /// Kind-typed options.
    #[serde(flatten)]
    pub options: RepOptions,
}

impl Representation {
    /// Pair an id with typed options.
    #[must_use]
    pub fn new(rep_id: u32, options: RepOptions) -> Self {
        Self { rep_id, options }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn every_kind_round_trips_through_its_keyword() {
        for kind in RepKind::ALL {
            assert_eq!(RepKind::from_keyword(kind.keyword()), Some(kind));
        }
        assert_eq!(RepKind::from_keyword("blob"), None);
    }

    #[test]
    fn resolver_matches_keyword_field() {
        for kind in RepKind::ALL {
            let schema = resolve_schema(kind.keyword()).unwrap();
            let keyword = schema.iter().find_map(|(name, entry)| {
                match (name, entry) {
                    (&"rep_type", Entry::Field(Field::Keyword(k))) => {
                        Some(k.value)
                    }
                    _ => None,
                }
            });
            assert_eq!(keyword, Some(kind.keyword()));
        }
    }

    #[test]
    fn representation_serializes_to_wire_shape() {
        let rep = Representation::new(
            3,
            RepOptions::Points(PointsOptions::new(vec![[0.0, 0.0, 0.0]])),
        );
        let value = serde_json::to_value(&rep).unwrap();
        assert_eq!(value["rep_id"], json!(3));
        assert_eq!(value["rep_type"], json!("points"));
        assert_eq!(value["options"]["colors"], json!([0xFF_FFFF]));
        let size = value["options"]["sizes"][0].as_f64().unwrap();
        assert!((size - 0.1).abs() < 1e-6);
    }

    #[test]
    fn lines_use_camel_case_on_the_wire() {
        let rep = RepOptions::Lines(LinesOptions::new(
            vec![[0.0, 0.0, 0.0]],
            vec![[1.0, 0.0, 0.0]],
        ));
        let value = serde_json::to_value(&rep).unwrap();
        assert!(value["options"].get("startCoords").is_some());
        assert!(value["options"].get("endColors").is_some());
    }

    #[test]
    fn smoothtube_defaults() {
        let tube = SmoothTubeOptions::new(vec![[0.0, 0.0, 0.0]]);
        assert_eq!(tube.radius, 1.0);
        assert_eq!(tube.color, 0xFF_FFFF);
        assert_eq!(tube.resolution, 16);
    }

    #[test]
    fn typed_round_trip() {
        let rep = Representation::new(
            7,
            RepOptions::Ribbon(RibbonOptions::new(
                vec![[0.0, 0.0, 0.0], [0.0, 0.0, 1.0]],
                vec![[0.0, 1.0, 0.0], [0.0, 1.0, 0.0]],
            )),
        );
        let value = serde_json::to_value(&rep).unwrap();
        let back: Representation = serde_json::from_value(value).unwrap();
        assert_eq!(back, rep);
    }
}
