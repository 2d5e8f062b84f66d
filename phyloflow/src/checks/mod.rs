//! Cross-validation of semi-structured auxiliary inputs.
//!
//! Two independent checks guard downstream stages: the optional domain
//! annotation table and the mandatory gene-identifier cross-check. Both
//! report the exact offending rows or identifiers when they fail.

mod domain;
mod genes;
mod reference;

pub use domain::validate_domain_table;
pub use genes::{cross_check_gene_ids, GeneIdReport};
pub use reference::ReferenceTable;
