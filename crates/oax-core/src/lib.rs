//! Document resolution and derivation engine for OpenAPI 3.x.
//!
//! Everything here is a pure function of one (or, for [`diff`], two) loaded
//! [`Document`](parse::spec::Document)s: reference resolution, parameter
//! merging, example synthesis, type projection, endpoint listing, and
//! endpoint-level diffing.

pub mod config;
pub mod diff;
pub mod endpoint;
pub mod error;
pub mod example;
pub mod params;
pub mod parse;
pub mod request;
pub mod resolve;
pub mod shape;

/// Recursion bound shared by example generation and type projection.
/// Nodes deeper than this yield the truncation sentinel.
pub const DEPTH_LIMIT: usize = 5;

pub use diff::{DiffResult, diff};
pub use endpoint::{Endpoint, all_tags, extract_endpoints, group_by_tag};
pub use example::ExampleGenerator;
pub use params::merged_parameters;
pub use parse::spec::Document;
pub use resolve::RefResolver;
pub use shape::{TypeProjector, TypeShape};
