//! # specforge — requirements Markdown to SQL pipelines
//!
//! > Write the mapping tables, get the transformations.
//!
//! specforge parses semi-structured requirements documents (YAML
//! configuration plus Markdown mapping tables) into a normalized
//! pipeline specification, then synthesizes one SQLX transformation and
//! one SQL test script per model.
//!
//! ## Quick Example
//!
//! ```rust,ignore
//! use specforge::prelude::*;
//!
//! // Parse a requirements document
//! let doc = specforge::parse(markdown_text)?;
//!
//! // Synthesize SQL for each model
//! let options = BuildOptions::from_document(&doc);
//! for model in &doc.models {
//!     let sqlx = build_sqlx(model, &options);
//!     // => config { type: "table", schema: "temp" } ... SELECT ...
//! }
//! ```
//!
//! ## Document anatomy
//!
//! | Piece                | Form                                   | Feeds                |
//! |----------------------|----------------------------------------|----------------------|
//! | Configuration        | fenced ```yaml or front-matter         | schema resolution    |
//! | Model header         | `### Model: <name> (schema: <schema>)` | one model each       |
//! | Sources line         | `` Sources: `raw.customers` ``         | FROM target          |
//! | Mapping tables       | fenced ```markdown pipe tables         | projections, joins   |

pub mod builder;
pub mod emit;
pub mod error;
pub mod model;
pub mod parser;
pub mod spec_writer;
pub mod table;
pub mod testgen;

pub mod prelude {
    pub use crate::builder::{BuildOptions, NO_SCOPE, build_sqlx};
    pub use crate::emit::{decode_artifact, generate_sqlx, write_artifact};
    pub use crate::error::*;
    pub use crate::model::*;
    pub use crate::parser::parse;
    pub use crate::spec_writer::write_spec_artifacts;
    pub use crate::testgen::generate_tests;
}

/// Parse a requirements Markdown document into a normalized
/// [`model::RequirementsDoc`].
///
/// # Example
///
/// ```
/// let doc = specforge::parse("### Model: stg_t (schema: temp)\n").unwrap();
/// assert_eq!(doc.models[0].name, "stg_t");
/// ```
pub fn parse(markdown: &str) -> error::Result<model::RequirementsDoc> {
    parser::parse(markdown)
}
