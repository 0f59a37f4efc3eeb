// ********* Filter predicate engine ***********

use log::debug;

use crate::record::CanonicalRecord;
use crate::schema::{SchemaError, SchemaRegistry};

/// The value side of a filter. A `Many` value matches when any one of
/// its entries matches, so a single filter already expresses an OR over
/// alternatives for the same question.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum FilterValue {
    One(String),
    Many(Vec<String>),
}

impl FilterValue {
    fn entries(&self) -> &[String] {
        match self {
            FilterValue::One(v) => std::slice::from_ref(v),
            FilterValue::Many(vs) => vs,
        }
    }
}

/// One predicate over one question.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Filter {
    pub question: String,
    pub value: FilterValue,
    pub negate: bool,
}

impl Filter {
    pub fn equals(question: &str, value: &str) -> Filter {
        Filter {
            question: question.to_string(),
            value: FilterValue::One(value.to_string()),
            negate: false,
        }
    }

    pub fn any_of(question: &str, values: &[&str]) -> Filter {
        Filter {
            question: question.to_string(),
            value: FilterValue::Many(values.iter().map(|v| v.to_string()).collect()),
            negate: false,
        }
    }

    pub fn negated(mut self) -> Filter {
        self.negate = !self.negate;
        self
    }

    /// Whether this record satisfies the predicate. An unanswered
    /// question matches nothing, which a negated filter then inverts.
    pub fn matches(&self, record: &CanonicalRecord) -> bool {
        let hit = match record.get(&self.question) {
            None => false,
            Some(value) => {
                let facets = value.facets();
                self.value
                    .entries()
                    .iter()
                    .any(|wanted| facets.iter().any(|f| f == wanted))
            }
        };
        hit != self.negate
    }
}

/// How the filters of a set combine across questions.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Default)]
pub enum FilterLogic {
    #[default]
    And,
    Or,
}

/// An ordered collection of filters plus the cross-filter logic. The
/// empty set matches every record.
#[derive(Debug, Clone, Default)]
pub struct FilterSet {
    filters: Vec<Filter>,
    pub logic: FilterLogic,
}

impl FilterSet {
    pub fn new(logic: FilterLogic) -> FilterSet {
        FilterSet {
            filters: Vec::new(),
            logic,
        }
    }

    /// Adds a filter after checking its question against the schema.
    /// A typo'd question id fails here rather than silently matching
    /// nothing at evaluation time.
    pub fn add(&mut self, schema: &SchemaRegistry, filter: Filter) -> Result<(), SchemaError> {
        if !schema.contains(&filter.question) {
            return Err(SchemaError::UnknownQuestion {
                id: filter.question.clone(),
            });
        }
        self.filters.push(filter);
        Ok(())
    }

    /// Removes every filter on the given question. Returns how many
    /// were dropped.
    pub fn remove_question(&mut self, question: &str) -> usize {
        let before = self.filters.len();
        self.filters.retain(|f| f.question != question);
        before - self.filters.len()
    }

    pub fn clear(&mut self) {
        self.filters.clear();
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn matches(&self, record: &CanonicalRecord) -> bool {
        if self.filters.is_empty() {
            return true;
        }
        match self.logic {
            FilterLogic::And => self.filters.iter().all(|f| f.matches(record)),
            FilterLogic::Or => self.filters.iter().any(|f| f.matches(record)),
        }
    }

    /// Returns the matching records as a new owned collection, in their
    /// original order. The source is untouched.
    pub fn apply(&self, records: &[CanonicalRecord]) -> Vec<CanonicalRecord> {
        let kept: Vec<CanonicalRecord> = records
            .iter()
            .filter(|r| self.matches(r))
            .cloned()
            .collect();
        debug!(
            "filter set ({} filters, {:?}): kept {}/{} records",
            self.filters.len(),
            self.logic,
            kept.len(),
            records.len()
        );
        kept
    }
}
