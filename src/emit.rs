//! SQLX artifact emission.
//!
//! Writes one `.sqlx` file per model. Table-driven models (any column
//! mapping or aggregations) go through the deterministic SQL builder;
//! YAML-declared models with pre-authored CTEs and a final select are
//! assembled verbatim. Also hosts the collaborator boundary: external
//! generators hand back JSON that is decoded once into a
//! [`GeneratedArtifact`] and normalized before writing.

use std::fs;
use std::path::{Path, PathBuf};

use crate::builder::{BuildOptions, build_sqlx, config_header};
use crate::error::Result;
use crate::model::{GeneratedArtifact, Layer, ModelSpec, RequirementsDoc};

/// Generate one SQLX file per model under `out_dir`.
///
/// Returns the written paths in model order. A document without models
/// writes nothing.
pub fn generate_sqlx(doc: &RequirementsDoc, out_dir: &Path) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(out_dir)?;
    let options = BuildOptions::from_document(doc);

    let mut written = Vec::with_capacity(doc.models.len());
    for model in &doc.models {
        let text = model_sqlx(model, &options);
        let path = out_dir.join(format!("{}.sqlx", model.name));
        fs::write(&path, text)?;
        tracing::debug!(path = %path.display(), "wrote sqlx artifact");
        written.push(path);
    }
    Ok(written)
}

/// Render the SQLX text for one model.
pub fn model_sqlx(model: &ModelSpec, options: &BuildOptions) -> String {
    if !model.column_mapping.is_empty() || !model.aggregations.is_empty() {
        return build_sqlx(model, options);
    }

    // Pre-authored model: config header, optional WITH block, final select.
    let schema = match model.layer {
        Layer::Staging => &options.staging_schema,
        Layer::Final => &options.final_schema,
    };
    let mut parts = vec![config_header(schema)];
    if !model.ctes.is_empty() {
        let cte_sqls: Vec<String> = model
            .ctes
            .iter()
            .map(|cte| format!("{} AS (\n{}\n)\n", cte.name, cte.select.trim()))
            .collect();
        parts.push(format!("WITH\n{}\n", cte_sqls.join(",\n\n")));
    }
    let final_select = model
        .final_select
        .as_deref()
        .unwrap_or("SELECT 1 AS placeholder");
    parts.push(format!("{final_select}\n"));
    parts.join("\n")
}

/// Decode one collaborator response into an artifact.
///
/// Accepts either a plain JSON string or a `{header, body}` object; any
/// other shape is a decode error surfaced to the caller.
pub fn decode_artifact(json_text: &str) -> Result<GeneratedArtifact> {
    Ok(serde_json::from_str(json_text)?)
}

/// Write a normalized collaborator artifact as `<name>.sqlx`.
pub fn write_artifact(name: &str, artifact: GeneratedArtifact, out_dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(out_dir)?;
    let path = out_dir.join(format!("{name}.sqlx"));
    fs::write(&path, artifact.into_sqlx())?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Cte;
    use pretty_assertions::assert_eq;

    fn preauthored_model() -> ModelSpec {
        ModelSpec {
            name: "rpt_daily".to_string(),
            layer: Layer::Final,
            ctes: vec![Cte {
                name: "base".to_string(),
                select: "SELECT * FROM ${ref('stg_orders')}".to_string(),
            }],
            final_select: Some("SELECT * FROM base".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn preauthored_model_renders_with_block() {
        let options = BuildOptions::new("temp", "analytics");
        let text = model_sqlx(&preauthored_model(), &options);
        assert_eq!(
            text,
            "config {\n  type: \"table\",\n  schema: \"analytics\"\n}\n\n\nWITH\nbase AS (\nSELECT * FROM ${ref('stg_orders')}\n)\n\n\nSELECT * FROM base\n"
        );
    }

    #[test]
    fn preauthored_model_without_select_gets_placeholder() {
        let options = BuildOptions::new("temp", "analytics");
        let mut model = preauthored_model();
        model.ctes.clear();
        model.final_select = None;
        let text = model_sqlx(&model, &options);
        assert!(text.ends_with("SELECT 1 AS placeholder\n"));
    }

    #[test]
    fn writes_one_file_per_model() {
        let dir = tempfile::tempdir().unwrap();
        let mut doc = RequirementsDoc::default();
        doc.models.push(preauthored_model());
        let written = generate_sqlx(&doc, dir.path()).unwrap();
        assert_eq!(written.len(), 1);
        assert!(written[0].ends_with("rpt_daily.sqlx"));
        let text = fs::read_to_string(&written[0]).unwrap();
        assert!(text.contains("WITH"));
    }

    #[test]
    fn artifact_boundary_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = decode_artifact(r#"{"header": "config {}", "body": "SELECT 2"}"#).unwrap();
        let path = write_artifact("gen_model", artifact, dir.path()).unwrap();
        assert_eq!(fs::read_to_string(path).unwrap(), "config {}\n\nSELECT 2");
    }

    #[test]
    fn malformed_artifact_json_is_an_error() {
        assert!(decode_artifact("{not json").is_err());
    }
}
