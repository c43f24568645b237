//! Data model for parsed requirements documents.
//!
//! This module defines the value types that represent a normalized
//! requirements document: the schema configuration, the per-model
//! transformation units, and the collaborator artifact shape.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};

/// A fully parsed requirements document.
///
/// Constructed once per parse call and immutable afterwards; every
/// downstream generator (spec writer, SQL builder, test generator) is a
/// pure function over this value.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RequirementsDoc {
    /// Target schema names for each pipeline layer.
    #[serde(default)]
    pub schema: SchemaConfig,
    /// Transformation units, in document order.
    #[serde(default)]
    pub models: Vec<ModelSpec>,
    /// Declared upstream tables.
    #[serde(default)]
    pub sources: Vec<SourceDecl>,
    /// CSV fixture text per upstream table name.
    #[serde(default)]
    pub mocks: IndexMap<String, String>,
}

/// Schema names resolved per layer. Missing keys fall back to the
/// raw/temp/analytics convention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaConfig {
    #[serde(default = "default_raw_schema")]
    pub raw_schema: String,
    #[serde(default = "default_staging_schema")]
    pub staging_schema: String,
    #[serde(default = "default_final_schema")]
    pub final_schema: String,
}

fn default_raw_schema() -> String {
    "raw".to_string()
}

fn default_staging_schema() -> String {
    "temp".to_string()
}

fn default_final_schema() -> String {
    "analytics".to_string()
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            raw_schema: default_raw_schema(),
            staging_schema: default_staging_schema(),
            final_schema: default_final_schema(),
        }
    }
}

/// Pipeline stage of a model. Determines which schema the generated
/// table lands in and which synthesis strategy applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layer {
    #[default]
    Staging,
    Final,
}

impl std::fmt::Display for Layer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Layer::Staging => write!(f, "staging"),
            Layer::Final => write!(f, "final"),
        }
    }
}

/// One named transformation unit: a single output table definition.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ModelSpec {
    pub name: String,
    #[serde(default)]
    pub layer: Layer,
    /// Upstream table names. The first source is the primary FROM target.
    #[serde(default)]
    pub sources: Vec<String>,
    #[serde(default)]
    pub column_mapping: Vec<ColumnMapping>,
    #[serde(default)]
    pub joins: Vec<Join>,
    #[serde(default)]
    pub filters: Vec<Filter>,
    #[serde(default)]
    pub aggregations: Vec<Aggregation>,
    #[serde(default)]
    pub group_by: Vec<String>,
    /// Output constraints as written, e.g. primary_key or accepted_values.
    #[serde(default)]
    pub constraints: IndexMap<String, String>,
    /// Pre-authored CTEs for YAML-declared models without mapping tables.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ctes: Vec<Cte>,
    /// Pre-authored final select for YAML-declared models.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_select: Option<String>,
}

/// One projected column of a model.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ColumnMapping {
    #[serde(default, deserialize_with = "stringish")]
    pub target_column: String,
    /// Documentation only, never interpreted.
    #[serde(default, rename = "type", deserialize_with = "stringish")]
    pub kind: String,
    #[serde(default, deserialize_with = "stringish")]
    pub from_table: String,
    #[serde(default, deserialize_with = "stringish")]
    pub from_column: String,
    /// Template with a `{from}` placeholder, a literal expression, or
    /// empty for pass-through.
    #[serde(default, deserialize_with = "stringish")]
    pub transform: String,
    #[serde(default, deserialize_with = "stringish")]
    pub nullable: String,
    /// Comma-separated test kind names.
    #[serde(default, deserialize_with = "stringish")]
    pub tests: String,
    #[serde(default, deserialize_with = "stringish")]
    pub description: String,
}

/// A join to another upstream table.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Join {
    #[serde(default, deserialize_with = "stringish")]
    pub left_table: String,
    #[serde(default, deserialize_with = "stringish")]
    pub right_table: String,
    /// Join kind token (LEFT, INNER, ...); empty means LEFT.
    #[serde(default, rename = "type", deserialize_with = "stringish")]
    pub kind: String,
    /// Raw boolean SQL predicate; a join without one is dropped.
    #[serde(default, deserialize_with = "stringish")]
    pub condition: String,
}

/// A row filter scoped to a staging entity.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Filter {
    /// Scope token, or `(none)` for no scope restriction.
    #[serde(default, deserialize_with = "stringish")]
    pub applies_to: String,
    #[serde(default, deserialize_with = "stringish")]
    pub predicate: String,
    #[serde(default, deserialize_with = "stringish")]
    pub rationale: String,
}

/// An aggregate metric of a final-layer model.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Aggregation {
    #[serde(default, deserialize_with = "stringish")]
    pub metric_column: String,
    #[serde(default, rename = "type", deserialize_with = "stringish")]
    pub kind: String,
    /// Raw SQL aggregate expression; required for emission.
    #[serde(default, deserialize_with = "stringish")]
    pub formula: String,
    #[serde(default, deserialize_with = "stringish")]
    pub tests: String,
    #[serde(default, deserialize_with = "stringish")]
    pub description: String,
}

/// A declared upstream table.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SourceDecl {
    pub name: String,
    #[serde(default, deserialize_with = "stringish")]
    pub description: String,
}

/// A named intermediate result for pre-authored models.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Cte {
    pub name: String,
    #[serde(default, deserialize_with = "stringish")]
    pub select: String,
}

/// One generated SQL artifact as returned by an external generator.
///
/// Decoded once at the collaborator boundary: either a plain SQL string
/// or a structured object with separate config header and select body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GeneratedArtifact {
    Structured { header: String, body: String },
    PlainText(String),
}

impl GeneratedArtifact {
    /// Normalize to a single SQLX text ready to be written to disk.
    pub fn into_sqlx(self) -> String {
        match self {
            GeneratedArtifact::PlainText(text) => text,
            GeneratedArtifact::Structured { header, body } => format!("{header}\n\n{body}"),
        }
    }
}

/// Accepts a string, a list of strings (joined with commas), a bool, or
/// null for fields that authors write loosely in YAML blocks.
fn stringish<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Many(Vec<String>),
        Flag(bool),
        Missing(()),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Many(items) => items.join(","),
        Raw::Flag(b) => b.to_string(),
        Raw::Missing(()) => String::new(),
    })
}
