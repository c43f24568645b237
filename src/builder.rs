//! SQL synthesis from model specifications.
//!
//! Turns one [`ModelSpec`] into a SQLX text: a config header declaring
//! the target schema followed by a single SELECT statement. Synthesis
//! never fails; incomplete fields produce degraded-but-valid output
//! (dropped clauses, a placeholder query) instead of errors.

use std::collections::BTreeSet;

use crate::model::{ColumnMapping, Layer, ModelSpec, RequirementsDoc};

/// The `applies_to` value that opts a filter out of scope restriction.
pub const NO_SCOPE: &str = "(none)";

/// Fallback FROM target for aggregate models that declare no sources.
const DEFAULT_AGGREGATE_SOURCE: &str = "stg_orders";

/// Configuration for one synthesis pass.
///
/// `filter_scopes` is the allow-list of entity names a filter's
/// `applies_to` may name; it is explicit configuration, not a convention
/// baked into the builder. [`BuildOptions::from_document`] derives a
/// default set from the document's model and source names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOptions {
    pub staging_schema: String,
    pub final_schema: String,
    /// Recognized filter scope names, compared case-insensitively.
    pub filter_scopes: BTreeSet<String>,
}

impl BuildOptions {
    pub fn new(staging_schema: impl Into<String>, final_schema: impl Into<String>) -> Self {
        Self {
            staging_schema: staging_schema.into(),
            final_schema: final_schema.into(),
            filter_scopes: BTreeSet::new(),
        }
    }

    /// Derive options from a parsed document: schema names from its
    /// configuration, filter scopes from its model names plus every
    /// declared and referenced source table.
    pub fn from_document(doc: &RequirementsDoc) -> Self {
        let mut options = Self::new(&doc.schema.staging_schema, &doc.schema.final_schema);
        for model in &doc.models {
            options.filter_scopes.insert(model.name.to_lowercase());
            for source in &model.sources {
                options.filter_scopes.insert(source.to_lowercase());
            }
        }
        for source in &doc.sources {
            options.filter_scopes.insert(source.name.to_lowercase());
        }
        options
    }

    /// Add one scope name to the allow-list.
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.filter_scopes.insert(scope.into().to_lowercase());
        self
    }

    fn scope_allows(&self, applies_to: &str) -> bool {
        let scope = applies_to.trim();
        scope == NO_SCOPE || self.filter_scopes.contains(&scope.to_lowercase())
    }
}

/// Build the complete SQLX text for a model: config header plus SELECT.
pub fn build_sqlx(model: &ModelSpec, options: &BuildOptions) -> String {
    let schema = match model.layer {
        Layer::Staging => &options.staging_schema,
        Layer::Final => &options.final_schema,
    };
    let body = match model.layer {
        Layer::Staging => build_staging_sql(model, options),
        Layer::Final => build_final_sql(model, options),
    };
    tracing::debug!(model = %model.name, layer = %model.layer, schema = %schema, "synthesized sqlx");
    format!("{}{body}\n", config_header(schema))
}

/// The config header shared by every generated artifact.
pub fn config_header(schema: &str) -> String {
    format!("config {{\n  type: \"table\",\n  schema: \"{schema}\"\n}}\n\n")
}

/// A logical reference to another generated table, resolved downstream.
pub fn to_ref(name: &str) -> String {
    format!("${{ref('{name}')}}")
}

/// Staging synthesis: FROM the first source, gated joins, scoped
/// filters, one projected expression per mapped column.
fn build_staging_sql(model: &ModelSpec, options: &BuildOptions) -> String {
    let Some(from_table) = model.sources.first() else {
        // Safety fallback so downstream file-writing never aborts.
        return "SELECT 1 AS placeholder".to_string();
    };

    let join_sqls: Vec<String> = model
        .joins
        .iter()
        .filter_map(|join| {
            let right = join.right_table.trim();
            let condition = join.condition.trim();
            // A join without a right table or condition is dropped.
            if right.is_empty() || condition.is_empty() {
                return None;
            }
            let kind = join.kind.trim();
            let kind = if kind.is_empty() {
                "LEFT".to_string()
            } else {
                kind.to_uppercase()
            };
            Some(format!("{kind} JOIN {} ON {condition}", to_ref(right)))
        })
        .collect();

    let where_sqls: Vec<&str> = model
        .filters
        .iter()
        .filter_map(|filter| {
            let predicate = filter.predicate.trim();
            (!predicate.is_empty() && options.scope_allows(&filter.applies_to))
                .then_some(predicate)
        })
        .collect();

    let select_list = model
        .column_mapping
        .iter()
        .filter(|col| !col.target_column.trim().is_empty())
        .map(select_expr)
        .collect::<Vec<_>>()
        .join(",\n       ");

    let mut sql = vec![format!(
        "SELECT\n       {select_list}\nFROM {}",
        to_ref(from_table)
    )];
    if !join_sqls.is_empty() {
        sql.push(join_sqls.join("\n"));
    }
    if !where_sqls.is_empty() {
        sql.push(format!("\nWHERE {}", where_sqls.join(" AND ")));
    }
    sql.join("\n")
}

/// Final synthesis: aggregate expressions over an upstream staging
/// reference, with optional GROUP BY. Models without aggregations fall
/// back to the staging pass-through path.
fn build_final_sql(model: &ModelSpec, options: &BuildOptions) -> String {
    if model.aggregations.is_empty() {
        return build_staging_sql(model, options);
    }

    let select_list = model
        .aggregations
        .iter()
        .filter_map(|agg| {
            let column = agg.metric_column.trim();
            let formula = agg.formula.trim();
            (!column.is_empty() && !formula.is_empty())
                .then(|| format!("{formula} AS {column}"))
        })
        .collect::<Vec<_>>()
        .join(",\n       ");

    let upstream = model
        .sources
        .first()
        .map(String::as_str)
        .unwrap_or(DEFAULT_AGGREGATE_SOURCE);

    let group_sql = if model.group_by.is_empty() {
        String::new()
    } else {
        format!("\nGROUP BY {}", model.group_by.join(", "))
    };

    format!(
        "SELECT\n       {select_list}\nFROM {}{group_sql}",
        to_ref(upstream)
    )
}

/// One projected column expression: transform template substitution,
/// literal transform, or pass-through, aliased to the target column.
fn select_expr(col: &ColumnMapping) -> String {
    let src = col.from_table.trim();
    let src_col = col.from_column.trim();
    let transform = col.transform.trim();
    let target = col.target_column.trim();

    let base = if !src.is_empty() && !src_col.is_empty() {
        format!("{src}.{src_col}")
    } else {
        "NULL".to_string()
    };
    let expr = if transform.contains("{from}") {
        transform.replace("{from}", &base)
    } else if !transform.is_empty() {
        transform.to_string()
    } else {
        base
    };
    format!("{expr} AS {target}")
}
