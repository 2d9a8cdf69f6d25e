//! Curation import pipeline

pub mod pipeline;
pub mod source;
pub mod statement;
pub mod tabular;

pub use pipeline::{resolve_curator, CurationFormat, CurationImporter, ImportReport};
pub use statement::{ensure_syntax, statement_syntax_checker, SyntaxProblem};
pub use tabular::DEFAULT_STATEMENT_COLUMN;
