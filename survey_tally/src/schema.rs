// ********* Schema registry ***********

use std::collections::HashMap;
use std::error::Error;
use std::fmt::Display;

/// The response shape of a question.
///
/// `RatingScale` and `InterestScale` are the per-column faces of matrix
/// questions as seen by the type detector; a hand-authored schema groups
/// them under `Matrix`. All three share the matrix value shape.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum QuestionType {
    Identifier,
    SingleChoice,
    MultipleChoice,
    MultipleChoiceLimited,
    Ranking,
    Matrix,
    RatingScale,
    InterestScale,
    OpenText,
}

impl QuestionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::Identifier => "identifier",
            QuestionType::SingleChoice => "single_choice",
            QuestionType::MultipleChoice => "multiple_choice",
            QuestionType::MultipleChoiceLimited => "multiple_choice_limited",
            QuestionType::Ranking => "ranking",
            QuestionType::Matrix => "matrix",
            QuestionType::RatingScale => "rating_scale",
            QuestionType::InterestScale => "interest_scale",
            QuestionType::OpenText => "open_text",
        }
    }

    pub fn parse(s: &str) -> Option<QuestionType> {
        match s {
            "identifier" => Some(QuestionType::Identifier),
            "single_choice" => Some(QuestionType::SingleChoice),
            "multiple_choice" => Some(QuestionType::MultipleChoice),
            "multiple_choice_limited" => Some(QuestionType::MultipleChoiceLimited),
            "ranking" => Some(QuestionType::Ranking),
            "matrix" => Some(QuestionType::Matrix),
            "rating_scale" => Some(QuestionType::RatingScale),
            "interest_scale" => Some(QuestionType::InterestScale),
            "open_text" => Some(QuestionType::OpenText),
            _ => None,
        }
    }

    /// Answers are a delimited list whose left-to-right order is preserved.
    pub fn is_multi_valued(&self) -> bool {
        matches!(
            self,
            QuestionType::MultipleChoice | QuestionType::MultipleChoiceLimited | QuestionType::Ranking
        )
    }

    /// Answers are gathered from several sub-columns into one item->level mapping.
    pub fn is_matrix(&self) -> bool {
        matches!(
            self,
            QuestionType::Matrix | QuestionType::RatingScale | QuestionType::InterestScale
        )
    }

    /// Answers outside `options` are collapsed to the overflow marker.
    pub fn has_closed_options(&self) -> bool {
        matches!(
            self,
            QuestionType::SingleChoice
                | QuestionType::MultipleChoice
                | QuestionType::MultipleChoiceLimited
        )
    }
}

impl Display for QuestionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One canonical question. Built once at startup, never mutated.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct QuestionDefinition {
    /// Unique short key, e.g. `years_experience`.
    pub id: String,
    /// The original question text from the export.
    pub prompt: String,
    pub qtype: QuestionType,
    /// Closed option set, in survey order. Empty for identifier/open_text.
    pub options: Vec<String>,
    /// Matrix row labels (tool names, genres, ...), in column order.
    pub items: Vec<String>,
    /// Matrix column/level labels, in scale order.
    pub scale: Vec<String>,
    /// Informational selection cap ("Select up to 3", "Rank top 3").
    pub max_selections: Option<u32>,
    /// Whether out-of-schema answers are expected for this question.
    pub has_other: bool,
}

impl QuestionDefinition {
    pub fn new(id: &str, prompt: &str, qtype: QuestionType) -> QuestionDefinition {
        QuestionDefinition {
            id: id.to_string(),
            prompt: prompt.to_string(),
            qtype,
            options: Vec::new(),
            items: Vec::new(),
            scale: Vec::new(),
            max_selections: None,
            has_other: false,
        }
    }

    pub fn with_options(mut self, options: &[&str]) -> QuestionDefinition {
        self.options = options.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_items(mut self, items: &[&str]) -> QuestionDefinition {
        self.items = items.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_scale(mut self, scale: &[&str]) -> QuestionDefinition {
        self.scale = scale.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_max_selections(mut self, cap: u32) -> QuestionDefinition {
        self.max_selections = Some(cap);
        self
    }

    pub fn with_other(mut self) -> QuestionDefinition {
        self.has_other = true;
        self
    }
}

/// Errors raised when a filter or query references the schema incorrectly.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum SchemaError {
    UnknownQuestion { id: String },
    DuplicateQuestion { id: String },
    NotMatrix { id: String },
    NotRanking { id: String },
}

impl Error for SchemaError {}

impl Display for SchemaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchemaError::UnknownQuestion { id } => {
                write!(f, "question '{}' not found in schema", id)
            }
            SchemaError::DuplicateQuestion { id } => {
                write!(f, "question '{}' defined more than once", id)
            }
            SchemaError::NotMatrix { id } => {
                write!(f, "question '{}' is not a matrix-type question", id)
            }
            SchemaError::NotRanking { id } => {
                write!(f, "question '{}' is not a ranking-type question", id)
            }
        }
    }
}

/// The canonical list of question definitions, shared read-only by every
/// other component. Definition order is preserved.
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    defs: Vec<QuestionDefinition>,
    by_id: HashMap<String, usize>,
}

impl SchemaRegistry {
    pub fn from_definitions(defs: Vec<QuestionDefinition>) -> Result<SchemaRegistry, SchemaError> {
        let mut by_id: HashMap<String, usize> = HashMap::new();
        for (idx, d) in defs.iter().enumerate() {
            if by_id.insert(d.id.clone(), idx).is_some() {
                return Err(SchemaError::DuplicateQuestion { id: d.id.clone() });
            }
        }
        Ok(SchemaRegistry { defs, by_id })
    }

    pub fn define(&self, id: &str) -> Result<&QuestionDefinition, SchemaError> {
        self.get(id).ok_or(SchemaError::UnknownQuestion { id: id.to_string() })
    }

    pub fn get(&self, id: &str) -> Option<&QuestionDefinition> {
        self.by_id.get(id).map(|idx| &self.defs[*idx])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    /// All question ids, in definition order.
    pub fn all_ids(&self) -> impl Iterator<Item = &str> {
        self.defs.iter().map(|d| d.id.as_str())
    }

    pub fn definitions(&self) -> &[QuestionDefinition] {
        &self.defs
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }
}
