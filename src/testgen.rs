//! SQL test script generation.
//!
//! Emits one test script per model: a traceability header, inline mock
//! temp tables built from the document's CSV fixtures, and a trailing
//! assertion placeholder for authors to refine.

use std::fs;
use std::path::{Path, PathBuf};

use crate::model::RequirementsDoc;
use crate::error::Result;

const DEFAULT_FIXTURE: &str = "id,value\n1,1\n";

/// Generate `test_req_<model>.sql` files under `out_dir`.
///
/// `source` is the requirements document path recorded in each header
/// for traceability. A document without models still writes a single
/// fallback test.
pub fn generate_tests(doc: &RequirementsDoc, out_dir: &Path, source: &Path) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(out_dir)?;

    let names: Vec<&str> = if doc.models.is_empty() {
        vec!["final_output"]
    } else {
        doc.models.iter().map(|m| m.name.as_str()).collect()
    };

    let mut written = Vec::with_capacity(names.len());
    for name in names {
        let mut parts = vec![format!(
            "-- Auto-generated tests from requirements\n-- Requirements source: {}\n",
            source.display()
        )];
        parts.extend(mock_tables(doc));
        parts.push("SELECT 1 AS test_assertion;\n".to_string());

        let path = out_dir.join(format!("test_req_{name}.sql"));
        fs::write(&path, parts.join("\n"))?;
        written.push(path);
    }
    tracing::debug!(tests = written.len(), "wrote test scripts");
    Ok(written)
}

/// One inline mock temp table per declared source, using the document's
/// CSV fixture or a minimal default.
fn mock_tables(doc: &RequirementsDoc) -> Vec<String> {
    doc.sources
        .iter()
        .map(|src| {
            let csv = doc
                .mocks
                .get(&src.name)
                .map(String::as_str)
                .unwrap_or(DEFAULT_FIXTURE);
            mock_temp_table_sql(&src.name, csv)
        })
        .collect()
}

/// Render a `WITH <table> AS (...)` block from CSV fixture text: header
/// row gives the column list, each data row becomes a UNION ALL branch.
fn mock_temp_table_sql(table_name: &str, csv_body: &str) -> String {
    let mut lines = csv_body.trim().lines();
    let headers = lines.next().unwrap_or_default();
    let branches: Vec<String> = lines
        .map(|line| {
            let quoted: Vec<String> = line.split(',').map(|c| format!("'{c}'")).collect();
            format!("SELECT {}", quoted.join(", "))
        })
        .collect();
    let union_all = if branches.is_empty() {
        "SELECT NULL AS placeholder".to_string()
    } else {
        branches.join("\nUNION ALL\n")
    };
    let select_alias = headers
        .split(',')
        .map(str::trim)
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "WITH {table_name} AS (\n  SELECT {select_alias} FROM (\n{}\n  )\n)\n",
        indent(&union_all, 4)
    )
}

fn indent(text: &str, spaces: usize) -> String {
    let pad = " ".repeat(spaces);
    text.lines()
        .map(|line| format!("{pad}{line}"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SourceDecl;
    use pretty_assertions::assert_eq;

    #[test]
    fn mock_table_from_two_row_csv() {
        let sql = mock_temp_table_sql("orders", "id,amt\n1,10\n2,20\n");
        assert_eq!(
            sql,
            "WITH orders AS (\n  SELECT id, amt FROM (\n    SELECT '1', '10'\n    UNION ALL\n    SELECT '2', '20'\n  )\n)\n"
        );
    }

    #[test]
    fn header_only_csv_gets_placeholder_row() {
        let sql = mock_temp_table_sql("empty", "id,value\n");
        assert!(sql.contains("SELECT NULL AS placeholder"));
    }

    #[test]
    fn one_test_file_per_model_with_mocks() {
        let dir = tempfile::tempdir().unwrap();
        let mut doc = RequirementsDoc::default();
        doc.sources.push(SourceDecl {
            name: "customers".to_string(),
            ..Default::default()
        });
        doc.mocks
            .insert("customers".to_string(), "id,email\n1,a@b.c\n".to_string());
        doc.models.push(crate::model::ModelSpec {
            name: "stg_customers".to_string(),
            ..Default::default()
        });

        let written = generate_tests(&doc, dir.path(), Path::new("req.md")).unwrap();
        assert_eq!(written.len(), 1);
        assert!(written[0].ends_with("test_req_stg_customers.sql"));
        let text = fs::read_to_string(&written[0]).unwrap();
        assert!(text.starts_with("-- Auto-generated tests from requirements"));
        assert!(text.contains("-- Requirements source: req.md"));
        assert!(text.contains("WITH customers AS ("));
        assert!(text.contains("SELECT '1', 'a@b.c'"));
        assert!(text.ends_with("SELECT 1 AS test_assertion;\n"));
    }

    #[test]
    fn no_models_writes_fallback_test() {
        let dir = tempfile::tempdir().unwrap();
        let doc = RequirementsDoc::default();
        let written = generate_tests(&doc, dir.path(), Path::new("req.md")).unwrap();
        assert_eq!(written.len(), 1);
        assert!(written[0].ends_with("test_req_final_output.sql"));
    }

    #[test]
    fn undeclared_mock_falls_back_to_default_fixture() {
        let mut doc = RequirementsDoc::default();
        doc.sources.push(SourceDecl {
            name: "orders".to_string(),
            ..Default::default()
        });
        let blocks = mock_tables(&doc);
        assert_eq!(blocks.len(), 1);
        assert!(blocks[0].contains("SELECT id, value FROM ("));
        assert!(blocks[0].contains("SELECT '1', '1'"));
    }
}
