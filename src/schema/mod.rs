//! Static schema tree: validators, nested records, and the representation
//! dispatch rule.
//!
//! Schemas are `'static` const tables, never mutable globals, so concurrent
//! normalization calls share nothing. A schema is an ordered list of
//! `(name, entry)` pairs; the walker emits output keys in exactly this
//! order, giving downstream consumers a stable key ordering regardless of
//! how the raw input was built.

mod field;
mod walker;

pub use field::{
    ArrayElem, ArrayField, Boolean, BoundedScalar, Field, Keyword, Scalar,
    TypedList,
};
pub use walker::validate_record;

/// An ordered field schema: one `(name, entry)` pair per field.
pub type Schema = &'static [(&'static str, Entry)];

/// One schema entry. The set is closed; the walker matches exhaustively, so
/// a new entry kind is a compile error until every walk site handles it.
#[derive(Clone, Copy, Debug)]
pub enum Entry {
    /// A plain leaf field.
    Field(Field),
    /// A nested sub-record validated against its own schema (e.g. `camera`).
    /// A missing sub-record walks as empty, so unconditional defaults apply.
    Record(Schema),
    /// A heterogeneous list of records, each resolved to its own schema by a
    /// keyword field (the representation list). A missing list defaults to
    /// empty.
    Dispatch {
        /// Name of the keyword field consulted on each element.
        key: &'static str,
        /// Maps the keyword to the element's schema; `None` is a hard
        /// "unknown representation type" error.
        resolve: fn(&str) -> Option<Schema>,
    },
}
