// -- Lint policy ---------------------------------------------------------
// This is the single source of truth for crate-wide lints.

// Broad lint groups
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![deny(clippy::nursery)]
// Documentation
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]
#![deny(rustdoc::bare_urls)]
// No panicking in library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]
// No debug/print artifacts
#![deny(clippy::dbg_macro)]
#![deny(clippy::print_stdout)]
#![deny(clippy::print_stderr)]
// Import hygiene
#![deny(clippy::wildcard_imports)]
// Complexity limits (thresholds in clippy.toml)
#![deny(clippy::cognitive_complexity)]
#![deny(clippy::excessive_nesting)]
// Clone / pass-by-value hygiene
#![deny(clippy::needless_pass_by_value)]
#![deny(clippy::implicit_clone)]
// String hygiene
#![deny(clippy::inefficient_to_string)]
#![deny(clippy::redundant_closure_for_method_calls)]
#![deny(clippy::manual_string_new)]
#![deny(clippy::str_to_string)]
// Cargo lints (warn, not deny since cargo lints can be noisy)
#![warn(clippy::cargo)]
// Unused / redundant code
#![deny(unused_results)]
#![deny(unused_qualifications)]
// Cast hygiene
#![deny(trivial_casts)]
#![deny(trivial_numeric_casts)]

//! Scene schema validation and normalization for notebook molecular
//! viewers.
//!
//! Widget code describes a scene as a JSON-shaped record: a camera plus an
//! ordered list of geometric representations (points, spheres, cylinders,
//! lines, surface meshes, smooth tubes, ribbons). This crate is the
//! validation gate in front of the renderer: it checks every field against
//! a per-kind schema, fills defaults (including per-vertex attributes sized
//! to match their coordinate arrays), and either returns a canonical scene
//! safe to hand off or fails with a diagnostic naming the exact offending
//! field.
//!
//! # Key entry points
//!
//! - [`scene::normalize_scene`] - validate and complete a raw scene record
//! - [`scene::Scene`] - the typed model decoded from canonical records
//! - [`scene::RepKind`] - the closed set of representation kinds
//! - [`wire::RemoteCall`] - renderer-bound `callMethod` messages with
//!   base64 geometry payloads
//!
//! # Architecture
//!
//! Schemas are static trees of field validators
//! ([`schema::Field`]) walked recursively by [`schema::validate_record`].
//! Representation records dispatch on their `rep_type` keyword to one of
//! seven kind schemas; internally the kinds are a closed enum and every
//! dispatch is an exhaustive match. Normalization is purely functional:
//! no I/O, no shared state, safe to call from any thread.

pub mod color;
pub mod error;
pub mod scene;
pub mod schema;
pub mod wire;
