// ********* Query / aggregation engine ***********
//
// All aggregations take the schema, a slice of canonical records (already
// filtered by the caller) and a question id. An empty slice yields empty
// or zero-filled results, never an error.

use std::collections::HashMap;

use log::debug;

use crate::record::{CanonicalRecord, Value};
use crate::schema::{SchemaError, SchemaRegistry};

/// A count table that remembers the order keys were first seen.
#[derive(Debug, Clone, Default)]
pub struct Tally {
    entries: Vec<(String, u64)>,
    index: HashMap<String, usize>,
}

impl Tally {
    pub fn new() -> Tally {
        Tally::default()
    }

    /// Seeds a key at zero so it appears in the output even when no
    /// record carries it.
    pub fn seed(&mut self, key: &str) {
        if !self.index.contains_key(key) {
            self.index.insert(key.to_string(), self.entries.len());
            self.entries.push((key.to_string(), 0));
        }
    }

    pub fn bump(&mut self, key: &str) {
        match self.index.get(key) {
            Some(idx) => self.entries[*idx].1 += 1,
            None => {
                self.index.insert(key.to_string(), self.entries.len());
                self.entries.push((key.to_string(), 1));
            }
        }
    }

    pub fn get(&self, key: &str) -> u64 {
        self.index.get(key).map(|idx| self.entries[*idx].1).unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.entries.iter().map(|(_, c)| c).sum()
    }

    /// (key, count) pairs in first-seen order.
    pub fn entries(&self) -> &[(String, u64)] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Counts every scalar facet of the answers to one question. List
/// answers contribute one count per entry; matrix answers contribute one
/// count per `"item: level"` composite.
pub fn flat_counts(
    schema: &SchemaRegistry,
    records: &[CanonicalRecord],
    question: &str,
) -> Result<Tally, SchemaError> {
    schema.define(question)?;
    let mut tally = Tally::new();
    for record in records {
        if let Some(value) = record.get(question) {
            for facet in value.facets() {
                tally.bump(&facet);
            }
        }
    }
    debug!(
        "flat counts for {:?}: {} keys over {} records",
        question,
        tally.entries().len(),
        records.len()
    );
    Ok(tally)
}

/// Per-item level counts for a matrix question. Items come out in
/// schema order with every declared level present, zero-filled.
pub fn matrix_counts(
    schema: &SchemaRegistry,
    records: &[CanonicalRecord],
    question: &str,
) -> Result<Vec<(String, Tally)>, SchemaError> {
    let def = schema.define(question)?;
    if !def.qtype.is_matrix() {
        return Err(SchemaError::NotMatrix {
            id: question.to_string(),
        });
    }
    let mut per_item: Vec<(String, Tally)> = def
        .items
        .iter()
        .map(|item| {
            let mut tally = Tally::new();
            for level in def.scale.iter() {
                tally.seed(level);
            }
            (item.clone(), tally)
        })
        .collect();

    for record in records {
        if let Some(Value::Matrix(pairs)) = record.get(question) {
            for (item, level) in pairs {
                match per_item.iter_mut().find(|(i, _)| i == item) {
                    Some((_, tally)) => tally.bump(level),
                    None => {
                        // Item missing from the schema, count it anyway.
                        let mut tally = Tally::new();
                        for l in def.scale.iter() {
                            tally.seed(l);
                        }
                        tally.bump(level);
                        per_item.push((item.clone(), tally));
                    }
                }
            }
        }
    }
    Ok(per_item)
}

/// The number of ranks a ranking question awards points over: the
/// declared cap when present, otherwise the full option count.
fn max_rank(def: &crate::schema::QuestionDefinition) -> usize {
    def.max_selections
        .map(|c| c as usize)
        .unwrap_or(def.options.len())
}

/// Borda scores for a ranking question: the answer ranked at position
/// `p` (1-indexed) earns `max_rank - p + 1` points, entries past
/// `max_rank` earn nothing. Every declared option appears, options never
/// ranked score 0.0.
pub fn ranking_scores(
    schema: &SchemaRegistry,
    records: &[CanonicalRecord],
    question: &str,
) -> Result<Vec<(String, f64)>, SchemaError> {
    let def = schema.define(question)?;
    if def.qtype != crate::schema::QuestionType::Ranking {
        return Err(SchemaError::NotRanking {
            id: question.to_string(),
        });
    }
    let cap = max_rank(def);
    let mut scores: Vec<(String, f64)> =
        def.options.iter().map(|o| (o.clone(), 0.0)).collect();

    for record in records {
        if let Some(Value::List(ranked)) = record.get(question) {
            for (pos, answer) in ranked.iter().take(cap).enumerate() {
                let points = (cap - pos) as f64;
                match scores.iter_mut().find(|(o, _)| o == answer) {
                    Some((_, score)) => *score += points,
                    None => scores.push((answer.clone(), points)),
                }
            }
        }
    }
    Ok(scores)
}

/// How often each option landed at each rank position. Every declared
/// option gets a zero-filled vector of length `max_rank`.
pub fn ranking_positions(
    schema: &SchemaRegistry,
    records: &[CanonicalRecord],
    question: &str,
) -> Result<Vec<(String, Vec<u64>)>, SchemaError> {
    let def = schema.define(question)?;
    if def.qtype != crate::schema::QuestionType::Ranking {
        return Err(SchemaError::NotRanking {
            id: question.to_string(),
        });
    }
    let cap = max_rank(def);
    let mut positions: Vec<(String, Vec<u64>)> = def
        .options
        .iter()
        .map(|o| (o.clone(), vec![0u64; cap]))
        .collect();

    for record in records {
        if let Some(Value::List(ranked)) = record.get(question) {
            for (pos, answer) in ranked.iter().take(cap).enumerate() {
                match positions.iter_mut().find(|(o, _)| o == answer) {
                    Some((_, counts)) => counts[pos] += 1,
                    None => {
                        let mut counts = vec![0u64; cap];
                        counts[pos] += 1;
                        positions.push((answer.clone(), counts));
                    }
                }
            }
        }
    }
    Ok(positions)
}

/// Share of records that answered the question, with the rate formatted
/// to one decimal place.
pub fn response_rate(
    schema: &SchemaRegistry,
    records: &[CanonicalRecord],
    question: &str,
) -> Result<(u64, u64, String), SchemaError> {
    schema.define(question)?;
    let total = records.len() as u64;
    let answered = records.iter().filter(|r| r.is_answered(question)).count() as u64;
    let rate = if total == 0 {
        0.0
    } else {
        answered as f64 / total as f64 * 100.0
    };
    Ok((answered, total, format!("{:.1}%", rate)))
}
