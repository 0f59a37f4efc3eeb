//! Core engine for analyzing fixed-schema survey exports.
//!
//! The crate models a survey as a read-only [SchemaRegistry] of
//! [QuestionDefinition]s, normalizes raw export rows into
//! [CanonicalRecord]s of typed [Value]s, and answers questions about the
//! normalized collection through a [FilterSet] and the aggregation
//! functions in [query].
//!
//! This crate is deliberately I/O-free. Reading CSV exports and JSON
//! schemas, and writing aggregates back out, is the caller's concern.
//!
//! ```
//! use survey_tally::*;
//!
//! let schema = SchemaRegistry::from_definitions(vec![
//!     QuestionDefinition::new("role", "What is your role?", QuestionType::SingleChoice)
//!         .with_options(&["Designer", "Programmer"]),
//! ])?;
//!
//! let mut record = CanonicalRecord::new();
//! record.insert("role", Value::Choice("Designer".to_string()));
//! let records = vec![record];
//!
//! let mut filters = FilterSet::new(FilterLogic::And);
//! filters.add(&schema, Filter::equals("role", "Designer"))?;
//! let kept = filters.apply(&records);
//!
//! let counts = query::flat_counts(&schema, &kept, "role")?;
//! assert_eq!(counts.get("Designer"), 1);
//! # Ok::<(), SchemaError>(())
//! ```

pub mod filter;
pub mod header;
pub mod query;
pub mod record;
pub mod schema;

pub use crate::filter::{Filter, FilterLogic, FilterSet, FilterValue};
pub use crate::header::{
    detect_type, synthesize_key, HeaderNormalizer, HeaderPattern, HeaderRule, NormalizedHeader,
    SubLabelRule,
};
pub use crate::record::{
    split_list, CanonicalRecord, ColumnBinding, ColumnPlan, RowNormalizer, Value, OTHER,
};
pub use crate::schema::{QuestionDefinition, QuestionType, SchemaError, SchemaRegistry};
