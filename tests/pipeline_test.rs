use std::fs;

use specforge::builder::{BuildOptions, build_sqlx};
use specforge::emit::generate_sqlx;
use specforge::model::Layer;
use specforge::parse;
use specforge::spec_writer::write_spec_artifacts;
use specforge::testgen::generate_tests;

const REQUIREMENTS: &str = r#"# Customer pipeline requirements

```yaml
schema:
  raw_schema: raw
  staging_schema: temp
  final_schema: analytics
sources:
  - name: customers
    description: CRM customer extract
mocks:
  customers: |
    id,email
    1,a@example.com
    2,b@example.com
```

### Model: stg_customers (schema: temp)

Sources: `raw.customers`

#### Column mapping
```markdown
| target_column | type  | from_table | from_column | transform | nullable | tests    | description |
|---------------|-------|------------|-------------|-----------|----------|----------|-------------|
| customer_id   | INT64 | customers  | id          |           | no       | not_null | Primary key |
```
"#;

#[test]
fn requirements_to_sqlx_end_to_end() {
    let doc = parse(REQUIREMENTS).expect("requirements document should parse");

    assert_eq!(doc.models.len(), 1);
    let model = &doc.models[0];
    assert_eq!(model.name, "stg_customers");
    assert_eq!(model.layer, Layer::Staging);
    assert_eq!(model.sources, ["customers"]);

    let sql = build_sqlx(model, &BuildOptions::from_document(&doc));
    assert!(sql.contains("config {\n  type: \"table\",\n  schema: \"temp\"\n}"));
    assert!(sql.contains("customers.id AS customer_id"));
    assert!(sql.contains("FROM ${ref('customers')}"));
}

#[test]
fn all_artifacts_are_written_from_one_document() {
    let dir = tempfile::tempdir().expect("tempdir");
    let doc = parse(REQUIREMENTS).expect("requirements document should parse");

    let definitions = dir.path().join("project/definitions");
    let artifacts = write_spec_artifacts(&doc, &definitions).expect("spec artifacts");
    assert!(artifacts.spec_json.exists());
    assert_eq!(artifacts.mapping_docs.len(), 1);

    // spec.json round-trips into the same document the generators consume.
    let spec_text = fs::read_to_string(&artifacts.spec_json).expect("read spec.json");
    let reloaded: specforge::model::RequirementsDoc =
        serde_json::from_str(&spec_text).expect("spec.json decodes");
    assert_eq!(reloaded, doc);

    let sqlx_paths = generate_sqlx(&reloaded, &definitions).expect("sqlx generation");
    assert_eq!(sqlx_paths.len(), 1);
    let sqlx = fs::read_to_string(&sqlx_paths[0]).expect("read sqlx");
    assert!(sqlx.starts_with("config {"));
    assert!(sqlx.contains("SELECT\n       customers.id AS customer_id"));

    let tests_dir = dir.path().join("tests_out");
    let test_paths =
        generate_tests(&reloaded, &tests_dir, std::path::Path::new("req.md")).expect("tests");
    assert_eq!(test_paths.len(), 1);
    let test_sql = fs::read_to_string(&test_paths[0]).expect("read test sql");
    assert!(test_sql.contains("WITH customers AS ("));
    assert!(test_sql.contains("SELECT '1', 'a@example.com'"));
    assert!(test_sql.contains("SELECT 1 AS test_assertion;"));
}
