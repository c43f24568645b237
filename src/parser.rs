//! Requirements document parser.
//!
//! Scans semi-structured requirements Markdown for a YAML configuration
//! block and repeated Model sections, producing a normalized
//! [`RequirementsDoc`]. Missing pieces degrade to empty results; the one
//! hard failure is a configuration block that is not valid YAML.
//!
//! # Document shape
//!
//! ````text
//! ---
//! schema:
//!   staging_schema: temp
//! ---
//!
//! ### Model: stg_customers (schema: temp)
//! Sources: `raw.customers`
//!
//! #### Column mapping
//! ```markdown
//! | target_column | from_table | from_column | transform |
//! |---------------|------------|-------------|-----------|
//! | customer_id   | customers  | id          |           |
//! ```
//! ````

use std::collections::HashMap;
use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;

use crate::error::Result;
use crate::model::{Aggregation, ColumnMapping, Filter, Join, Layer, ModelSpec, RequirementsDoc};
use crate::table::{Row, parse_table};

static FENCED_YAML: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)```yaml\s*(?s:(.*?))\s*```").expect("fenced yaml pattern"));

// Front-matter only counts at the very start of the document.
static FRONTMATTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\A---\s*\n(?s:(.*?))\n---").expect("front-matter pattern"));

static MODEL_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^###\s+Model:\s*(\S+)\s*\(schema:\s*([^)]+)\)\s*$")
        .expect("model header pattern")
});

static SOURCES_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Sources:\s*`([^`]+)`").expect("sources line pattern"));

static SECTION_TABLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(Column mapping|Joins|Filters|Aggregations|Group by|Output constraints)\n```markdown\n(?s:(.*?))\n```",
    )
    .expect("section table pattern")
});

/// Parse a requirements Markdown document into a normalized document.
///
/// Configuration is taken from a fenced ```yaml block if present,
/// otherwise from front-matter at the start of the document. Schema keys
/// default to raw/temp/analytics. Table-driven Model sections replace
/// any models declared in the YAML block.
///
/// # Errors
///
/// Returns [`crate::error::SpecError::Yaml`] when a configuration block
/// exists but is not valid YAML.
pub fn parse(markdown: &str) -> Result<RequirementsDoc> {
    let config_block = FENCED_YAML
        .captures(markdown)
        .or_else(|| FRONTMATTER.captures(markdown))
        .map(|cap| cap[1].to_string());

    let mut doc = match config_block {
        Some(yaml_text) => {
            let value: serde_yaml::Value = serde_yaml::from_str(&yaml_text)?;
            if value.is_null() {
                RequirementsDoc::default()
            } else {
                serde_yaml::from_value(value)?
            }
        }
        None => RequirementsDoc::default(),
    };

    let models = parse_models(markdown, &doc.schema.staging_schema);
    if !models.is_empty() {
        // Table-driven models take precedence over YAML-declared ones.
        doc.models = models;
    }

    tracing::debug!(
        models = doc.models.len(),
        sources = doc.sources.len(),
        "parsed requirements document"
    );
    Ok(doc)
}

/// Scan the full document for Model sections.
///
/// Each `### Model: <name> (schema: <schema>)` header opens a block that
/// runs to the next header or end of text. The layer is inferred by
/// comparing the declared schema token against `staging_schema`; this is
/// a naming convention, not a structural guarantee.
pub fn parse_models(doc_text: &str, staging_schema: &str) -> Vec<ModelSpec> {
    let headers: Vec<(usize, String, String)> = MODEL_HEADER
        .captures_iter(doc_text)
        .map(|cap| {
            let start = cap.get(0).map_or(0, |m| m.start());
            (start, cap[1].trim().to_string(), cap[2].trim().to_string())
        })
        .collect();

    let mut models = Vec::with_capacity(headers.len());
    for (i, (start, name, schema_name)) in headers.iter().enumerate() {
        if name.is_empty() {
            continue;
        }
        let end = headers.get(i + 1).map_or(doc_text.len(), |next| next.0);
        let block = &doc_text[*start..end];

        let sources: Vec<String> = SOURCES_LINE
            .captures(block)
            .map(|cap| {
                cap[1]
                    .split(',')
                    .map(|s| {
                        // Keep only the bare table name from qualified names.
                        let s = s.trim();
                        s.rsplit('.').next().unwrap_or(s).to_string()
                    })
                    .collect()
            })
            .unwrap_or_default();

        let layer = if *schema_name == *staging_schema {
            Layer::Staging
        } else {
            Layer::Final
        };

        let mut sections: HashMap<String, Vec<Row>> = HashMap::new();
        for cap in SECTION_TABLE.captures_iter(block) {
            let title = cap[1].to_lowercase();
            // First occurrence per title wins.
            if !sections.contains_key(&title) {
                sections.insert(title, parse_table(&cap[2]));
            }
        }
        let section = |title: &str| sections.get(title).cloned().unwrap_or_default();

        let group_by = section("group by")
            .iter()
            .filter_map(|row| {
                let key = row.get("group_key")?.trim();
                (!key.is_empty()).then(|| key.to_string())
            })
            .collect();

        let mut constraints = IndexMap::new();
        for row in section("output constraints") {
            for (key, value) in row {
                let (key, value) = (key.trim(), value.trim());
                if !key.is_empty() && !value.is_empty() {
                    // Last row wins on key collisions.
                    constraints.insert(key.to_string(), value.to_string());
                }
            }
        }

        models.push(ModelSpec {
            name: name.clone(),
            layer,
            sources,
            column_mapping: section("column mapping").iter().map(column_from_row).collect(),
            joins: section("joins").iter().map(join_from_row).collect(),
            filters: section("filters").iter().map(filter_from_row).collect(),
            aggregations: section("aggregations").iter().map(aggregation_from_row).collect(),
            group_by,
            constraints,
            ctes: Vec::new(),
            final_select: None,
        });
    }
    models
}

fn cell(row: &Row, key: &str) -> String {
    row.get(key).cloned().unwrap_or_default()
}

fn column_from_row(row: &Row) -> ColumnMapping {
    ColumnMapping {
        target_column: cell(row, "target_column"),
        kind: cell(row, "type"),
        from_table: cell(row, "from_table"),
        from_column: cell(row, "from_column"),
        transform: cell(row, "transform"),
        nullable: cell(row, "nullable"),
        tests: cell(row, "tests"),
        description: cell(row, "description"),
    }
}

fn join_from_row(row: &Row) -> Join {
    Join {
        left_table: cell(row, "left_table"),
        right_table: cell(row, "right_table"),
        kind: cell(row, "type"),
        condition: cell(row, "condition"),
    }
}

fn filter_from_row(row: &Row) -> Filter {
    Filter {
        applies_to: cell(row, "applies_to"),
        predicate: cell(row, "predicate"),
        rationale: cell(row, "rationale"),
    }
}

fn aggregation_from_row(row: &Row) -> Aggregation {
    Aggregation {
        metric_column: cell(row, "metric_column"),
        kind: cell(row, "type"),
        formula: cell(row, "formula"),
        tests: cell(row, "tests"),
        description: cell(row, "description"),
    }
}
