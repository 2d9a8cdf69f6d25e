//! Free-text curation statements
//!
//! A statement relates the row's reference pathway to a pathway of the
//! compared resource, e.g. `Glycolysis equivalentTo Glycolysis and
//! Gluconeogenesis` or `Glycolysis* isPartOf Carbohydrate metabolism`. In
//! `isPartOf` statements the left pathway is always the part; the star marks
//! the pathway that belongs to the reference resource.

use crate::curation::tabular::{Candidate, SideSpec, StatementCell};
use crate::model::{MappingType, EQUIVALENT_TO, IS_PART_OF};
use crate::{Error, Result};

const STAR: char = '*';

/// Relationship keyword of a statement, `equivalentTo` taking precedence
pub fn get_mapping_type(statement: &str) -> Option<MappingType> {
    if statement.contains(EQUIVALENT_TO) {
        Some(MappingType::EquivalentTo)
    } else if statement.contains(IS_PART_OF) {
        Some(MappingType::IsPartOf)
    } else {
        None
    }
}

/// The two trimmed sides around `keyword`, if it occurs exactly once
pub fn get_pathways_from_statement(statement: &str, keyword: &str) -> Option<(String, String)> {
    let mut parts = statement.split(keyword);
    match (parts.next(), parts.next(), parts.next()) {
        (Some(left), Some(right), None) => Some((left.trim().to_string(), right.trim().to_string())),
        _ => None,
    }
}

pub fn remove_star(pathway_name: &str) -> String {
    pathway_name.replace(STAR, "").trim().to_string()
}

/// Whether `statement` is well formed for the row of `reference_pathway`
pub fn statement_syntax_checker(statement: &str, reference_pathway: &str) -> bool {
    // Every string contains the empty name
    if reference_pathway.trim().is_empty() {
        return false;
    }

    if !statement.contains(reference_pathway)
        || !MappingType::ALL
            .iter()
            .any(|mapping_type| statement.contains(mapping_type.as_str()))
    {
        return false;
    }

    let statement = statement.trim();

    if statement.contains(EQUIVALENT_TO) && statement.starts_with(reference_pathway) {
        if let Some((left, right)) = get_pathways_from_statement(statement, EQUIVALENT_TO) {
            if !left.is_empty() && !right.is_empty() {
                return true;
            }
        }
    }

    if statement.contains(IS_PART_OF) {
        if !statement.contains(STAR) {
            return false;
        }
        return get_pathways_from_statement(statement, IS_PART_OF).is_some();
    }

    false
}

/// Turn a statement into a name-based candidate between the two resources
pub fn parse_statement(
    statement: &str,
    reference_resource: &str,
    compared_resource: &str,
) -> Result<Candidate> {
    let mapping_type = get_mapping_type(statement)
        .ok_or_else(|| Error::InvalidMappingType(statement.trim().to_string()))?;

    let (left, right) = get_pathways_from_statement(statement, mapping_type.as_str())
        .ok_or_else(|| {
            Error::InvalidInput(format!("'{}' does not relate exactly two pathways", statement))
        })?;

    let (side_1, side_2) = match mapping_type {
        MappingType::IsPartOf if left.contains(STAR) => (
            SideSpec::by_name(reference_resource, remove_star(&left)),
            SideSpec::by_name(compared_resource, right),
        ),
        MappingType::IsPartOf => (
            SideSpec::by_name(compared_resource, left),
            SideSpec::by_name(reference_resource, remove_star(&right)),
        ),
        MappingType::EquivalentTo => (
            SideSpec::by_name(reference_resource, left),
            SideSpec::by_name(compared_resource, right),
        ),
    };

    Ok(Candidate {
        side_1,
        side_2,
        mapping_type,
    })
}

/// A statement that failed the syntax check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxProblem {
    pub line: usize,
    pub reference_pathway: String,
    pub statement: String,
}

impl std::fmt::Display for SyntaxProblem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "line {}: problem with \"{}\" given the reference pathway \"{}\"",
            self.line, self.statement, self.reference_pathway
        )
    }
}

/// Check every statement of a file before anything is written
pub fn ensure_syntax(cells: &[StatementCell]) -> Vec<SyntaxProblem> {
    cells
        .iter()
        .filter(|cell| !statement_syntax_checker(&cell.statement, &cell.reference_pathway))
        .map(|cell| SyntaxProblem {
            line: cell.line,
            reference_pathway: cell.reference_pathway.clone(),
            statement: cell.statement.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equivalent_statements() {
        assert!(statement_syntax_checker(
            "Pathway X equivalentTo Pathway Y",
            "Pathway X"
        ));
        assert!(statement_syntax_checker(
            "  Pathway X equivalentTo Pathway Y  ",
            "Pathway X"
        ));
        // Must start with the reference pathway
        assert!(!statement_syntax_checker(
            "Pathway Y equivalentTo Pathway X",
            "Pathway X"
        ));
        assert!(!statement_syntax_checker("Pathway X equivalentTo ", "Pathway X"));
        assert!(!statement_syntax_checker(
            "Pathway X equivalentTo A equivalentTo B",
            "Pathway X"
        ));
    }

    #[test]
    fn test_part_of_requires_star() {
        assert!(!statement_syntax_checker(
            "Pathway X isPartOf Pathway Parent",
            "Pathway X"
        ));
        assert!(statement_syntax_checker(
            "Pathway X* isPartOf Pathway Parent",
            "Pathway X"
        ));
        assert!(statement_syntax_checker(
            "Pathway Child isPartOf Pathway X*",
            "Pathway X"
        ));
        assert!(!statement_syntax_checker(
            "Pathway X* isPartOf A isPartOf B",
            "Pathway X"
        ));
    }

    #[test]
    fn test_rejected_shapes() {
        assert!(!statement_syntax_checker("", "Pathway X"));
        assert!(!statement_syntax_checker("Pathway X ispartof Pathway Y*", "Pathway X"));
        assert!(!statement_syntax_checker("Pathway X equivalentTo Pathway Y", "Pathway Z"));
    }

    #[test]
    fn test_blank_reference_pathway_is_rejected() {
        assert!(!statement_syntax_checker("Pathway X equivalentTo Pathway Y", ""));
        assert!(!statement_syntax_checker("Pathway X* isPartOf Pathway Y", "  "));
    }

    #[test]
    fn test_parse_statement_sides() {
        let candidate = parse_statement("Glycolysis* isPartOf Metabolism", "kegg", "reactome").unwrap();
        assert_eq!(candidate.mapping_type, MappingType::IsPartOf);
        assert_eq!(candidate.side_1, SideSpec::by_name("kegg", "Glycolysis"));
        assert_eq!(candidate.side_2, SideSpec::by_name("reactome", "Metabolism"));

        // Reference pathway on the right: the compared pathway is the part
        let candidate = parse_statement("Glycolysis isPartOf Metabolism*", "kegg", "reactome").unwrap();
        assert_eq!(candidate.side_1, SideSpec::by_name("reactome", "Glycolysis"));
        assert_eq!(candidate.side_2, SideSpec::by_name("kegg", "Metabolism"));

        let candidate =
            parse_statement("Apoptosis equivalentTo Apoptosis", "kegg", "wikipathways").unwrap();
        assert_eq!(candidate.mapping_type, MappingType::EquivalentTo);
        assert_eq!(candidate.side_2.resource, "wikipathways");

        assert!(matches!(
            parse_statement("Apoptosis sameAs Apoptosis", "kegg", "wikipathways"),
            Err(Error::InvalidMappingType(_))
        ));
    }

    #[test]
    fn test_ensure_syntax_reports_each_problem() {
        let cells = vec![
            StatementCell {
                line: 2,
                reference_pathway: "Apoptosis".to_string(),
                statement: "Apoptosis equivalentTo Apoptosis".to_string(),
            },
            StatementCell {
                line: 3,
                reference_pathway: "Glycolysis".to_string(),
                statement: "Glycolysis isPartOf Metabolism".to_string(),
            },
        ];
        let problems = ensure_syntax(&cells);
        assert_eq!(problems.len(), 1);
        assert_eq!(problems[0].line, 3);
        assert!(problems[0].to_string().contains("Glycolysis isPartOf Metabolism"));
    }
}
