//! Tab-separated curation files
//!
//! The first non-blank line is the header; header matching ignores case and
//! surrounding whitespace. Three layouts are understood:
//!
//! - tabular: `Source Resource`, `Source ID`, `Target Resource`, `Target ID`,
//!   `Mapping Type`; sides are looked up by identifier
//! - special: the tabular columns plus `Source Name` and `Target Name`; sides
//!   are looked up by name and the identifier must agree
//! - statements: reference pathway name in the first column and one or more
//!   `|`-separated free-text statements in a later column

use crate::model::MappingType;
use crate::{Error, Result};

pub const SOURCE_RESOURCE: &str = "Source Resource";
pub const SOURCE_ID: &str = "Source ID";
pub const SOURCE_NAME: &str = "Source Name";
pub const TARGET_RESOURCE: &str = "Target Resource";
pub const TARGET_ID: &str = "Target ID";
pub const TARGET_NAME: &str = "Target Name";
pub const MAPPING_TYPE: &str = "Mapping Type";

/// Column holding the statements in curation templates
pub const DEFAULT_STATEMENT_COLUMN: usize = 3;

/// Parsed tab-separated file
#[derive(Debug, Clone)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<TableRow>,
}

#[derive(Debug, Clone)]
pub struct TableRow {
    /// 1-based line number in the source file
    pub line: usize,
    pub cells: Vec<String>,
}

impl TableRow {
    /// Trimmed cell content; missing trailing cells read as empty
    pub fn cell(&self, index: usize) -> &str {
        self.cells.get(index).map(|c| c.trim()).unwrap_or("")
    }
}

impl Table {
    pub fn parse(content: &str) -> Result<Self> {
        // Spreadsheet exports often lead with a byte order mark
        let content = content.strip_prefix('\u{feff}').unwrap_or(content);

        let mut lines = content
            .lines()
            .enumerate()
            .map(|(i, line)| (i + 1, line.trim_end_matches('\r')))
            .filter(|(_, line)| !line.trim().is_empty());

        let Some((_, header)) = lines.next() else {
            return Err(Error::InvalidInput("curation file is empty".to_string()));
        };

        let headers = header.split('\t').map(|h| h.trim().to_string()).collect();
        let rows = lines
            .map(|(line, text)| TableRow {
                line,
                cells: text.split('\t').map(str::to_string).collect(),
            })
            .collect();

        Ok(Self { headers, rows })
    }

    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case(name.trim()))
    }

    pub fn require_column(&self, name: &str) -> Result<usize> {
        self.column(name)
            .ok_or_else(|| Error::InvalidInput(format!("missing column '{}'", name)))
    }
}

/// One side of a candidate mapping as written in the file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SideSpec {
    pub resource: String,
    pub id: Option<String>,
    pub name: Option<String>,
}

impl SideSpec {
    pub fn by_id(resource: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            id: Some(id.into()),
            name: None,
        }
    }

    pub fn by_name(resource: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            id: None,
            name: Some(name.into()),
        }
    }
}

/// A mapping read from the file, not yet checked against the resources
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub side_1: SideSpec,
    pub side_2: SideSpec,
    pub mapping_type: MappingType,
}

/// Parse outcome of one row (or one statement of a row)
#[derive(Debug)]
pub struct ParsedRow {
    pub line: usize,
    pub candidate: Result<Candidate>,
}

fn non_empty(row: &TableRow, index: usize, column: &str) -> Result<String> {
    let value = row.cell(index);
    if value.is_empty() {
        return Err(Error::InvalidInput(format!("empty '{}'", column)));
    }
    Ok(value.to_string())
}

/// Column positions shared by the tabular and special layouts
struct Columns {
    source_resource: usize,
    source_id: usize,
    source_name: Option<usize>,
    target_resource: usize,
    target_id: usize,
    target_name: Option<usize>,
    mapping_type: usize,
}

impl Columns {
    fn locate(table: &Table, with_names: bool) -> Result<Self> {
        let name_column = |name: &str| -> Result<Option<usize>> {
            if with_names {
                table.require_column(name).map(Some)
            } else {
                Ok(None)
            }
        };

        Ok(Self {
            source_resource: table.require_column(SOURCE_RESOURCE)?,
            source_id: table.require_column(SOURCE_ID)?,
            source_name: name_column(SOURCE_NAME)?,
            target_resource: table.require_column(TARGET_RESOURCE)?,
            target_id: table.require_column(TARGET_ID)?,
            target_name: name_column(TARGET_NAME)?,
            mapping_type: table.require_column(MAPPING_TYPE)?,
        })
    }

    fn side(
        row: &TableRow,
        resource: usize,
        id: usize,
        name: Option<usize>,
        labels: (&str, &str, &str),
    ) -> Result<SideSpec> {
        let (resource_label, id_label, name_label) = labels;
        let resource = non_empty(row, resource, resource_label)?;

        match name {
            // Looked up by name; the identifier is optional and only cross-checked
            Some(name) => {
                let id = row.cell(id);
                Ok(SideSpec {
                    resource,
                    id: (!id.is_empty()).then(|| id.to_string()),
                    name: Some(non_empty(row, name, name_label)?),
                })
            }
            None => Ok(SideSpec::by_id(resource, non_empty(row, id, id_label)?)),
        }
    }

    fn candidate(&self, row: &TableRow) -> Result<Candidate> {
        Ok(Candidate {
            side_1: Self::side(
                row,
                self.source_resource,
                self.source_id,
                self.source_name,
                (SOURCE_RESOURCE, SOURCE_ID, SOURCE_NAME),
            )?,
            side_2: Self::side(
                row,
                self.target_resource,
                self.target_id,
                self.target_name,
                (TARGET_RESOURCE, TARGET_ID, TARGET_NAME),
            )?,
            mapping_type: row.cell(self.mapping_type).parse()?,
        })
    }

    fn parse_rows(&self, table: &Table) -> Vec<ParsedRow> {
        table
            .rows
            .iter()
            .map(|row| ParsedRow {
                line: row.line,
                candidate: self.candidate(row),
            })
            .collect()
    }
}

/// Rows of the normalized tabular layout
pub fn parse_tabular(table: &Table) -> Result<Vec<ParsedRow>> {
    Ok(Columns::locate(table, false)?.parse_rows(table))
}

/// Rows of the special-mappings layout
pub fn parse_special(table: &Table) -> Result<Vec<ParsedRow>> {
    Ok(Columns::locate(table, true)?.parse_rows(table))
}

/// A single free-text statement with the reference pathway of its row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementCell {
    pub line: usize,
    pub reference_pathway: String,
    pub statement: String,
}

/// Split the statement column into individual statements, skipping blank cells
pub fn statement_cells(table: &Table, column: usize) -> Vec<StatementCell> {
    table
        .rows
        .iter()
        .flat_map(|row| {
            let reference_pathway = row.cell(0).to_string();
            row.cell(column)
                .split('|')
                .filter(|statement| !statement.trim().is_empty())
                .map(|statement| StatementCell {
                    line: row.line,
                    reference_pathway: reference_pathway.clone(),
                    statement: statement.to_string(),
                })
                .collect::<Vec<_>>()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABULAR: &str = "Source Resource\tSource ID\tTarget Resource\tTarget ID\tMapping Type\n\
        kegg\thsa00010\treactome\tR-HSA-70171\tequivalentTo\n\
        \n\
        reactome\tR-HSA-1\treactome\tR-HSA-2\tpartOf\n\
        kegg\t\treactome\tR-HSA-2\tisPartOf\n";

    #[test]
    fn test_parse_table_skips_blank_lines() {
        let table = Table::parse(TABULAR).unwrap();
        assert_eq!(table.headers.len(), 5);
        assert_eq!(table.rows.len(), 3);
        assert_eq!(table.rows[1].line, 4);
        assert_eq!(table.column("source id"), Some(1));
        assert!(matches!(Table::parse("\n  \n"), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_byte_order_mark_is_not_part_of_first_header() {
        let content = format!("\u{feff}{}", TABULAR);
        let table = Table::parse(&content).unwrap();
        assert_eq!(table.headers[0], "Source Resource");
        assert_eq!(table.column("Source Resource"), Some(0));
        assert_eq!(parse_tabular(&table).unwrap().len(), 3);
    }

    #[test]
    fn test_parse_tabular_rows() {
        let rows = parse_tabular(&Table::parse(TABULAR).unwrap()).unwrap();
        assert_eq!(rows.len(), 3);

        let first = rows[0].candidate.as_ref().unwrap();
        assert_eq!(first.side_1, SideSpec::by_id("kegg", "hsa00010"));
        assert_eq!(first.side_2, SideSpec::by_id("reactome", "R-HSA-70171"));
        assert_eq!(first.mapping_type, MappingType::EquivalentTo);

        assert!(matches!(rows[1].candidate, Err(Error::InvalidMappingType(_))));
        assert!(matches!(rows[2].candidate, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_missing_column_rejects_file() {
        let table = Table::parse("Source Resource\tSource ID\n").unwrap();
        assert!(matches!(parse_tabular(&table), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_parse_special_rows() {
        let content = "source resource\tsource id\tsource name\ttarget resource\ttarget id\ttarget name\tmapping type\n\
            kegg\t\tGlycolysis\treactome\tR-HSA-70171\tGlycolysis\tequivalentTo\n";
        let rows = parse_special(&Table::parse(content).unwrap()).unwrap();
        let candidate = rows[0].candidate.as_ref().unwrap();
        assert_eq!(candidate.side_1.id, None);
        assert_eq!(candidate.side_1.name.as_deref(), Some("Glycolysis"));
        assert_eq!(candidate.side_2.id.as_deref(), Some("R-HSA-70171"));
    }

    #[test]
    fn test_statement_cells() {
        let content = "Pathway\tID\tNotes\tMappings\n\
            Glycolysis\thsa00010\t\tGlycolysis equivalentTo Glycolysis|Glycolysis* isPartOf Metabolism\n\
            Apoptosis\thsa04210\t\t\n";
        let cells = statement_cells(&Table::parse(content).unwrap(), DEFAULT_STATEMENT_COLUMN);
        assert_eq!(cells.len(), 2);
        assert_eq!(cells[0].reference_pathway, "Glycolysis");
        assert_eq!(cells[1].statement, "Glycolysis* isPartOf Metabolism");
        assert_eq!(cells[1].line, 2);
    }
}
