//! C5: resolves the final output filename, appends the correct
//! extension, and writes the table to the process-scoped output
//! directory. Writes go to a temporary file in the same
//! directory first and are renamed into place, so a failed write never
//! leaves a partially-written file under the returned name.

use dataflow_engine::{ArtifactSink, DataflowError, Result};
use dataflow_table::io::{csv::write_csv, xlsx::write_xlsx};
use dataflow_table::Table;
use serde_json::Value as Json;
use std::path::{Path, PathBuf};

pub struct LocalArtifactSink {
    output_dir: PathBuf,
}

impl LocalArtifactSink {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    fn resolve_name(&self, node_type: &str, config: &Json) -> String {
        let extension = if node_type == "output_csv" { "csv" } else { "xlsx" };
        let mut name = config
            .get("filename")
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("output_{}", &uuid::Uuid::new_v4().simple().to_string()[..8]));

        if Path::new(&name).extension().is_none() {
            name = format!("{}.{}", name, extension);
        }
        name
    }
}

impl ArtifactSink for LocalArtifactSink {
    fn write(&self, table: &Table, node_type: &str, config: &Json) -> Result<String> {
        std::fs::create_dir_all(&self.output_dir).map_err(|e| DataflowError::sink_io(e.to_string()))?;

        let name = self.resolve_name(node_type, config);
        let final_path = self.output_dir.join(&name);
        let tmp_path = self.output_dir.join(format!(".{}.tmp", name));

        let write_result = if node_type == "output_csv" {
            let delimiter = config
                .get("delimiter")
                .and_then(|v| v.as_str())
                .and_then(|s| s.bytes().next())
                .unwrap_or(b',');
            write_csv(table, &tmp_path, delimiter)
        } else {
            write_xlsx(table, &tmp_path)
        };

        write_result.map_err(|e| DataflowError::sink_io(e.to_string()))?;
        std::fs::rename(&tmp_path, &final_path).map_err(|e| {
            let _ = std::fs::remove_file(&tmp_path);
            DataflowError::sink_io(e.to_string())
        })?;

        Ok(name)
    }
}
