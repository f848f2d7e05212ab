//! CLI command implementations
//!
//! Both commands load a table file, build its indexes and initialize an
//! index scan executor for the plan. `scan` then runs the logical scan to
//! completion; `validate` stops after initialization.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};

use crate::executor::{run_to_completion, IndexScanExecutor, ScanConfig};
use crate::index::{BTreeIndex, TableIndex};
use crate::observability::{init_logging, log_event_with_fields, Event, EventFields};
use crate::planner::IndexScanPlanNode;
use crate::table::{ColumnDef, Table};
use crate::types::{RowId, Value};

use super::args::Command;
use super::errors::{CliError, CliResult};
use super::io::{read_file, read_json_file, write_line, write_response};

/// Index declaration inside a table file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexDef {
    pub name: String,
    /// Table column positions forming the key, most significant first
    pub key_columns: Vec<usize>,
}

/// Table file structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableFile {
    pub name: String,
    pub columns: Vec<ColumnDef>,
    #[serde(default)]
    pub rows: Vec<Vec<Value>>,
    /// Row ids (insertion positions) flagged as pending delete
    #[serde(default)]
    pub pending_delete: Vec<u64>,
    #[serde(default)]
    pub indexes: Vec<IndexDef>,
}

/// A loaded table with its built indexes
#[derive(Debug)]
pub struct Catalog {
    pub table: Table,
    pub indexes: Vec<BTreeIndex>,
}

impl Catalog {
    /// Load a table file and build every declared index
    pub fn load(path: &Path) -> CliResult<Self> {
        let file: TableFile = read_json_file(path)?;
        Self::from_file(file)
    }

    pub fn from_file(file: TableFile) -> CliResult<Self> {
        let mut table = Table::new(file.name, file.columns);
        for row in file.rows {
            table.insert(row)?;
        }
        for id in file.pending_delete {
            table.mark_pending_delete(RowId(id))?;
        }

        let indexes = file
            .indexes
            .into_iter()
            .map(|def| BTreeIndex::build(def.name, def.key_columns, &table))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { table, indexes })
    }

    /// Index by name
    pub fn index(&self, name: &str) -> CliResult<&BTreeIndex> {
        self.indexes
            .iter()
            .find(|index| index.name() == name)
            .ok_or_else(|| {
                CliError::plan_rejected(format!(
                    "table '{}' has no index '{}'",
                    self.table.name(),
                    name
                ))
            })
    }
}

/// Main entry point for the CLI
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Scan {
            table,
            plan,
            params,
            config,
        } => scan(&table, &plan, &params, config.as_deref()),
        Command::Validate {
            table,
            plan,
            config,
        } => validate(&table, &plan, config.as_deref()),
    }
}

/// Load the scan configuration and install logging
fn load_config(path: Option<&Path>) -> CliResult<ScanConfig> {
    let config = match path {
        Some(path) => ScanConfig::load(path).map_err(|e| CliError::config_error(e.message()))?,
        None => ScanConfig::default(),
    };
    init_logging(&config.log_level);
    log_event_with_fields(
        Event::ConfigLoaded,
        &EventFields {
            suspend_threshold: Some(config.default_suspend_threshold),
            ..EventFields::default()
        },
    );
    Ok(config)
}

fn load_plan(path: &Path) -> CliResult<IndexScanPlanNode> {
    let text = read_file(path)?;
    IndexScanPlanNode::from_json(&text).map_err(|e| CliError::plan_rejected(e.to_string()))
}

/// Parse statement parameters from a JSON array
pub fn parse_params(text: &str) -> CliResult<Vec<Value>> {
    serde_json::from_str(text)
        .map_err(|e| CliError::io_error(format!("params must be a JSON array of values: {}", e)))
}

/// Run a plan to completion and collect one JSON object per invocation
pub fn scan_invocations(
    table_path: &Path,
    plan_path: &Path,
    params: &[Value],
    config: &ScanConfig,
) -> CliResult<Vec<JsonValue>> {
    let catalog = Catalog::load(table_path)?;
    let plan = load_plan(plan_path)?;
    let index = catalog.index(&plan.target_index)?;

    let mut executor = IndexScanExecutor::new(plan, index, &catalog.table, config)?;
    let invocations = run_to_completion(&mut executor, params)?;
    Ok(invocations.iter().map(|result| result.to_json()).collect())
}

/// Run a scan, printing one JSON line per invocation
pub fn scan(
    table_path: &Path,
    plan_path: &Path,
    params: &str,
    config_path: Option<&Path>,
) -> CliResult<()> {
    let config = load_config(config_path)?;
    let params = parse_params(params)?;
    for line in scan_invocations(table_path, plan_path, &params, &config)? {
        write_line(&line)?;
    }
    Ok(())
}

/// Initialize an executor for the plan and report the result
pub fn validate(table_path: &Path, plan_path: &Path, config_path: Option<&Path>) -> CliResult<()> {
    let config = load_config(config_path)?;
    let catalog = Catalog::load(table_path)?;
    let plan = load_plan(plan_path)?;
    let index = catalog.index(&plan.target_index)?;

    let executor = IndexScanExecutor::new(plan, index, &catalog.table, &config)?;
    let plan = executor.plan();
    write_response(json!({
        "table": plan.target_table,
        "index": plan.target_index,
        "lookup": plan.lookup_type.as_str(),
        "direction": plan.sort_direction.as_str(),
        "suspendable": plan.suspendable,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    use crate::cli::errors::CliErrorCode;

    const TABLE: &str = r#"{
        "name": "t",
        "columns": [
            {"name": "a", "type": "integer"},
            {"name": "b", "type": "varchar", "length": 4}
        ],
        "rows": [[1, "w"], [1, "x"], [2, "y"], [3, "z"]],
        "indexes": [{"name": "idx_a", "key_columns": [0]}]
    }"#;

    fn write(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_catalog_builds_indexes() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "table.json", TABLE);
        let catalog = Catalog::load(&path).unwrap();
        assert_eq!(catalog.table.len(), 4);
        assert_eq!(catalog.index("idx_a").unwrap().entry_count(), 4);
        assert_eq!(
            catalog.index("missing").unwrap_err().code(),
            &CliErrorCode::PlanRejected
        );
    }

    #[test]
    fn test_catalog_rejects_bad_row() {
        let file: TableFile = serde_json::from_str(
            r#"{"name": "t", "columns": [{"name": "a", "type": "tiny_int"}], "rows": [[1000]]}"#,
        )
        .unwrap();
        let err = Catalog::from_file(file).unwrap_err();
        assert_eq!(err.code(), &CliErrorCode::TableError);
    }

    #[test]
    fn test_scan_invocations_suspend_and_resume() {
        let dir = TempDir::new().unwrap();
        let table = write(&dir, "table.json", TABLE);
        let plan = write(
            &dir,
            "plan.json",
            r#"{
                "target_table": "t",
                "target_index": "idx_a",
                "lookup_type": "greater_equal",
                "search_keys": [{"kind": "parameter", "index": 0}],
                "suspendable": true,
                "suspend_threshold": 2
            }"#,
        );

        let params = parse_params("[1]").unwrap();
        let lines = scan_invocations(&table, &plan, &params, &ScanConfig::default()).unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["status"], "suspended-more-available");
        assert_eq!(lines[0]["rows"], json!([[1, "w"], [1, "x"]]));
        assert_eq!(lines[1]["status"], "exhausted");
        assert_eq!(lines[1]["rows"], json!([[2, "y"], [3, "z"]]));
    }

    #[test]
    fn test_plan_for_unknown_index_rejected() {
        let dir = TempDir::new().unwrap();
        let table = write(&dir, "table.json", TABLE);
        let plan = write(
            &dir,
            "plan.json",
            r#"{"target_table": "t", "target_index": "idx_b", "lookup_type": "equal"}"#,
        );
        let err = scan_invocations(&table, &plan, &[], &ScanConfig::default()).unwrap_err();
        assert_eq!(err.code(), &CliErrorCode::PlanRejected);
    }

    #[test]
    fn test_bad_config_file() {
        let dir = TempDir::new().unwrap();
        let config = write(&dir, "config.json", r#"{"default_suspend_threshold": 0}"#);
        let err = load_config(Some(&config)).unwrap_err();
        assert_eq!(err.code(), &CliErrorCode::ConfigError);
    }

    #[test]
    fn test_params_must_be_array() {
        assert_eq!(parse_params("[1, \"a\", null]").unwrap().len(), 3);
        assert!(parse_params("{\"a\": 1}").is_err());
    }
}
