// ********* Response normalization ***********
//
// Turns raw export rows into canonical records keyed by question id,
// with every answer carried as a typed value. One malformed cell never
// aborts a batch; anomalies are logged and the cell becomes null.

use std::collections::HashMap;

use log::{debug, warn};

use crate::schema::{QuestionType, SchemaRegistry};

/// Marker that closed-option answers outside the schema collapse to.
pub const OTHER: &str = "Other";

/// One normalized answer. An unanswered question has no entry in the
/// record at all, there is no null variant.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum Value {
    /// Identifier or open text, verbatim (trimmed).
    Text(String),
    /// A single closed-option pick.
    Choice(String),
    /// Multiple choice or ranking. Order is the respondent's order and
    /// is significant for ranking questions.
    List(Vec<String>),
    /// Matrix answers as (item, level) pairs in column-plan order.
    /// Items the respondent left unrated are absent.
    Matrix(Vec<(String, String)>),
}

impl Value {
    /// Every scalar facet of the value, used by filtering and flat
    /// counts. Matrix entries flatten to `"item: level"`.
    pub fn facets(&self) -> Vec<String> {
        match self {
            Value::Text(s) => vec![s.clone()],
            Value::Choice(s) => vec![s.clone()],
            Value::List(items) => items.clone(),
            Value::Matrix(pairs) => pairs
                .iter()
                .map(|(item, level)| format!("{}: {}", item, level))
                .collect(),
        }
    }
}

/// One respondent's normalized answers.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct CanonicalRecord {
    values: HashMap<String, Value>,
    /// Original texts of answers that were collapsed to [OTHER],
    /// as (question id, original answer).
    overflow: Vec<(String, String)>,
}

impl CanonicalRecord {
    pub fn new() -> CanonicalRecord {
        CanonicalRecord::default()
    }

    pub fn get(&self, question: &str) -> Option<&Value> {
        self.values.get(question)
    }

    pub fn is_answered(&self, question: &str) -> bool {
        self.values.contains_key(question)
    }

    pub fn insert(&mut self, question: &str, value: Value) {
        self.values.insert(question.to_string(), value);
    }

    pub fn push_overflow(&mut self, question: &str, original: &str) {
        self.overflow.push((question.to_string(), original.to_string()));
    }

    /// Raw texts that were replaced by the overflow marker.
    pub fn overflow_answers(&self) -> &[(String, String)] {
        &self.overflow
    }
}

/// One export column bound to its question (and matrix item).
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ColumnBinding {
    /// Index into the raw row.
    pub column: usize,
    pub question: String,
    /// Set for matrix columns: the item this column rates.
    pub item: Option<String>,
}

/// The per-export mapping from raw columns to schema questions,
/// computed once from the header row and reused for every data row.
#[derive(Debug, Clone)]
pub struct ColumnPlan {
    bindings: Vec<ColumnBinding>,
}

impl ColumnPlan {
    pub fn new(bindings: Vec<ColumnBinding>) -> ColumnPlan {
        ColumnPlan { bindings }
    }

    pub fn bindings(&self) -> &[ColumnBinding] {
        &self.bindings
    }
}

/// Splits a raw multi-valued cell into trimmed non-empty parts,
/// preserving order. The export's list delimiter is `;`; some hand-fixed
/// exports use `,` instead, hence the flag.
pub fn split_list(raw: &str, comma_fallback: bool) -> Vec<String> {
    let delimiter = if comma_fallback && !raw.contains(';') {
        ','
    } else {
        ';'
    };
    raw.split(delimiter)
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .map(|p| p.to_string())
        .collect()
}

/// Row-by-row normalizer. Holds the schema and the column plan.
pub struct RowNormalizer<'a> {
    schema: &'a SchemaRegistry,
    plan: &'a ColumnPlan,
    /// Split lists on commas when a cell has no semicolons.
    pub comma_fallback: bool,
}

impl<'a> RowNormalizer<'a> {
    pub fn new(schema: &'a SchemaRegistry, plan: &'a ColumnPlan) -> RowNormalizer<'a> {
        RowNormalizer {
            schema,
            plan,
            comma_fallback: false,
        }
    }

    /// Normalizes one raw row. `row_idx` is only used in log messages.
    pub fn normalize_row(&self, row: &[String], row_idx: usize) -> CanonicalRecord {
        let mut record = CanonicalRecord::new();
        // Matrix questions span several columns, gathered in plan order.
        let mut matrices: Vec<(String, Vec<(String, String)>)> = Vec::new();

        for binding in self.plan.bindings() {
            let raw = match row.get(binding.column) {
                Some(cell) => cell.trim(),
                None => continue,
            };
            if raw.is_empty() {
                continue;
            }
            let def = match self.schema.get(&binding.question) {
                Some(d) => d,
                None => continue,
            };

            if def.qtype.is_matrix() {
                let item = match &binding.item {
                    Some(item) => item.clone(),
                    None => continue,
                };
                if !def.scale.is_empty() && !def.scale.iter().any(|s| s == raw) {
                    warn!(
                        "row {}: rating {:?} for {:?} of question {:?} is outside the scale, dropping",
                        row_idx, raw, item, def.id
                    );
                    continue;
                }
                match matrices.iter_mut().find(|(q, _)| q == &def.id) {
                    Some((_, pairs)) => pairs.push((item, raw.to_string())),
                    None => matrices.push((def.id.clone(), vec![(item, raw.to_string())])),
                }
                continue;
            }

            match def.qtype {
                QuestionType::Identifier => match raw.parse::<u64>() {
                    Ok(_) => record.insert(&def.id, Value::Text(raw.to_string())),
                    Err(_) => {
                        warn!("row {}: identifier {:?} is not numeric, skipping", row_idx, raw);
                    }
                },
                QuestionType::SingleChoice => {
                    let value = self.reconcile(&mut record, &def.id, &def.options, raw);
                    record.insert(&def.id, Value::Choice(value));
                }
                QuestionType::MultipleChoice
                | QuestionType::MultipleChoiceLimited
                | QuestionType::Ranking => {
                    let parts = split_list(raw, self.comma_fallback);
                    if parts.is_empty() {
                        continue;
                    }
                    let values: Vec<String> = if def.qtype.has_closed_options() {
                        parts
                            .iter()
                            .map(|p| self.reconcile(&mut record, &def.id, &def.options, p))
                            .collect()
                    } else {
                        // Ranking answers stay verbatim; caps and option
                        // sets apply at query time.
                        parts
                    };
                    record.insert(&def.id, Value::List(values));
                }
                QuestionType::OpenText => {
                    record.insert(&def.id, Value::Text(raw.to_string()));
                }
                _ => {}
            }
        }

        for (question, pairs) in matrices {
            record.insert(&question, Value::Matrix(pairs));
        }
        debug!("row {}: normalized {} answers", row_idx, self.plan.bindings().len());
        record
    }

    /// Normalizes every row of a batch.
    pub fn normalize_all(&self, rows: &[Vec<String>]) -> Vec<CanonicalRecord> {
        rows.iter()
            .enumerate()
            .map(|(idx, row)| self.normalize_row(row, idx))
            .collect()
    }

    fn reconcile(
        &self,
        record: &mut CanonicalRecord,
        question: &str,
        options: &[String],
        answer: &str,
    ) -> String {
        if options.is_empty() || options.iter().any(|o| o == answer) {
            answer.to_string()
        } else {
            record.push_overflow(question, answer);
            OTHER.to_string()
        }
    }
}
