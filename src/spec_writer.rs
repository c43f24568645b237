//! Normalized spec and mapping documentation output.
//!
//! Writes the machine-readable `spec.json` next to the generated
//! project plus one Markdown mapping doc per model under `mappings/`.
//! Both are projections of the parsed document with no decision logic.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::model::{ModelSpec, RequirementsDoc};

/// Paths written by [`write_spec_artifacts`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecArtifacts {
    pub spec_json: PathBuf,
    pub mapping_docs: Vec<PathBuf>,
}

/// Write `spec.json` and per-model mapping docs.
///
/// `definitions_dir` is where generated code will later land; the spec
/// and `mappings/` directory are placed in its parent, mirroring the
/// project layout downstream tooling expects.
pub fn write_spec_artifacts(doc: &RequirementsDoc, definitions_dir: &Path) -> Result<SpecArtifacts> {
    let project_root = definitions_dir.parent().unwrap_or(definitions_dir);
    fs::create_dir_all(project_root)?;

    let spec_json = project_root.join("spec.json");
    fs::write(&spec_json, serde_json::to_string_pretty(doc)?)?;

    let mappings_dir = project_root.join("mappings");
    let mut mapping_docs = Vec::with_capacity(doc.models.len());
    for model in &doc.models {
        mapping_docs.push(write_model_doc(model, &mappings_dir)?);
    }

    tracing::debug!(spec = %spec_json.display(), docs = mapping_docs.len(), "wrote spec artifacts");
    Ok(SpecArtifacts { spec_json, mapping_docs })
}

/// Render one Markdown table.
fn md_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let header_row = format!("| {} |", headers.join(" | "));
    let sep_row = format!(
        "|{}|",
        headers
            .iter()
            .map(|h| "-".repeat(h.len() + 2))
            .collect::<Vec<_>>()
            .join("|")
    );
    let mut lines = vec![header_row, sep_row];
    for row in rows {
        lines.push(format!("| {} |", row.join(" | ")));
    }
    lines.join("\n")
}

fn write_model_doc(model: &ModelSpec, out_dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(out_dir)?;
    let mut lines: Vec<String> = Vec::new();

    lines.push(format!("# Model: {} (layer: {})\n", model.name, model.layer));
    if !model.sources.is_empty() {
        lines.push(format!("Sources: {}\n", model.sources.join(", ")));
    }

    if !model.column_mapping.is_empty() {
        lines.push("## Column mapping\n".to_string());
        let headers = [
            "target_column",
            "type",
            "from_table",
            "from_column",
            "transform",
            "nullable",
            "tests",
            "description",
        ];
        let rows: Vec<Vec<String>> = model
            .column_mapping
            .iter()
            .map(|c| {
                vec![
                    c.target_column.clone(),
                    c.kind.clone(),
                    c.from_table.clone(),
                    c.from_column.clone(),
                    c.transform.clone(),
                    c.nullable.clone(),
                    c.tests.clone(),
                    c.description.clone(),
                ]
            })
            .collect();
        lines.push(format!("{}\n", md_table(&headers, &rows)));
    }

    if !model.joins.is_empty() {
        lines.push("## Joins\n".to_string());
        let headers = ["left_table", "right_table", "type", "condition"];
        let rows: Vec<Vec<String>> = model
            .joins
            .iter()
            .map(|j| {
                vec![
                    j.left_table.clone(),
                    j.right_table.clone(),
                    j.kind.clone(),
                    j.condition.clone(),
                ]
            })
            .collect();
        lines.push(format!("{}\n", md_table(&headers, &rows)));
    }

    if !model.filters.is_empty() {
        lines.push("## Filters\n".to_string());
        let headers = ["applies_to", "predicate", "rationale"];
        let rows: Vec<Vec<String>> = model
            .filters
            .iter()
            .map(|f| vec![f.applies_to.clone(), f.predicate.clone(), f.rationale.clone()])
            .collect();
        lines.push(format!("{}\n", md_table(&headers, &rows)));
    }

    if !model.aggregations.is_empty() {
        lines.push("## Aggregations\n".to_string());
        let headers = ["metric_column", "type", "formula", "tests", "description"];
        let rows: Vec<Vec<String>> = model
            .aggregations
            .iter()
            .map(|a| {
                vec![
                    a.metric_column.clone(),
                    a.kind.clone(),
                    a.formula.clone(),
                    a.tests.clone(),
                    a.description.clone(),
                ]
            })
            .collect();
        lines.push(format!("{}\n", md_table(&headers, &rows)));
    }

    if !model.group_by.is_empty() {
        lines.push("## Group by\n".to_string());
        let rows: Vec<Vec<String>> = model.group_by.iter().map(|k| vec![k.clone()]).collect();
        lines.push(format!("{}\n", md_table(&["group_key"], &rows)));
    }

    if !model.constraints.is_empty() {
        lines.push("## Output constraints\n".to_string());
        let headers: Vec<&str> = model.constraints.keys().map(String::as_str).collect();
        let rows = vec![model.constraints.values().cloned().collect::<Vec<_>>()];
        lines.push(format!("{}\n", md_table(&headers, &rows)));
    }

    let out_path = out_dir.join(format!("{}.md", model.name));
    fs::write(&out_path, lines.join("\n"))?;
    Ok(out_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use crate::table::parse_table;
    use pretty_assertions::assert_eq;

    #[test]
    fn md_table_layout() {
        let table = md_table(
            &["a", "bb"],
            &[vec!["1".to_string(), "2".to_string()]],
        );
        assert_eq!(table, "| a | bb |\n|---|----|\n| 1 | 2 |");
    }

    #[test]
    fn rendered_tables_round_trip_through_the_extractor() {
        let table = md_table(
            &["target_column", "from_table"],
            &[
                vec!["customer_id".to_string(), "customers".to_string()],
                vec!["email".to_string(), "customers".to_string()],
            ],
        );
        let rows = parse_table(&table);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["target_column"], "customer_id");
        assert_eq!(rows[1]["from_table"], "customers");
    }

    #[test]
    fn writes_spec_json_and_mapping_docs() {
        let dir = tempfile::tempdir().unwrap();
        let doc = parse(
            "### Model: stg_t (schema: temp)\n\nSources: `raw.t`\n\nColumn mapping\n```markdown\n| target_column | from_table | from_column |\n|---|---|---|\n| id | t | id |\n```\n",
        )
        .unwrap();

        let definitions = dir.path().join("out/definitions");
        let artifacts = write_spec_artifacts(&doc, &definitions).unwrap();

        let json = fs::read_to_string(&artifacts.spec_json).unwrap();
        let round_trip: RequirementsDoc = serde_json::from_str(&json).unwrap();
        assert_eq!(round_trip, doc);

        assert_eq!(artifacts.mapping_docs.len(), 1);
        let md = fs::read_to_string(&artifacts.mapping_docs[0]).unwrap();
        assert!(md.starts_with("# Model: stg_t (layer: staging)"));
        assert!(md.contains("## Column mapping"));
        assert!(md.contains("| id | "));
    }
}
