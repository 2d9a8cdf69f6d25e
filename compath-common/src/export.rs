//! Tab-separated mapping export
//!
//! One row per mapping: side 1 name, id and resource, the mapping type, then
//! side 2 name, id and resource. There is no header line.

use crate::db::mappings::{list_mappings, Mapping, MappingFilter};
use crate::Result;
use sqlx::SqlitePool;
use std::io::Write;

/// Tabs and newlines inside names would break the row layout
fn clean(field: &str) -> String {
    field.replace(['\t', '\n', '\r'], " ")
}

pub fn export_row(mapping: &Mapping) -> String {
    [
        clean(&mapping.side_1.pathway_name),
        clean(&mapping.side_1.pathway_id),
        clean(&mapping.side_1.resource),
        mapping.mapping_type.as_str().to_string(),
        clean(&mapping.side_2.pathway_name),
        clean(&mapping.side_2.pathway_id),
        clean(&mapping.side_2.resource),
    ]
    .join("\t")
}

pub fn write_mappings<W: Write>(writer: &mut W, mappings: &[Mapping]) -> Result<()> {
    for mapping in mappings {
        writeln!(writer, "{}", export_row(mapping))?;
    }
    Ok(())
}

/// Render all (or only accepted) mappings as TSV
pub async fn export_mappings(pool: &SqlitePool, accepted_only: bool) -> Result<String> {
    let filter = if accepted_only {
        MappingFilter::accepted_only()
    } else {
        MappingFilter::default()
    };

    let mappings = list_mappings(pool, &filter).await?;
    let mut buffer = Vec::new();
    write_mappings(&mut buffer, &mappings)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}
