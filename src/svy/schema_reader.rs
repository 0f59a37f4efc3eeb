// Reading a hand-authored question schema from a JSON file.

use std::fs;

use log::info;
use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;
use snafu::prelude::*;

use survey_tally::{QuestionDefinition, QuestionType, SchemaRegistry};

use crate::svy::{
    MissingQuestionsSnafu, OpeningJsonSnafu, ParsingJsonSnafu, SchemaSnafu, SvyResult,
    UnknownTypeTagSnafu,
};

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct SchemaQuestion {
    pub id: String,
    pub question: String,
    #[serde(rename = "type")]
    pub question_type: String,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub items: Vec<String>,
    #[serde(default)]
    pub scale: Vec<String>,
    #[serde(rename = "maxSelections")]
    pub max_selections: Option<u32>,
    #[serde(rename = "hasOther")]
    pub has_other: Option<bool>,
}

pub fn read_schema(path: &str) -> SvyResult<SchemaRegistry> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    parse_schema(contents.as_str(), path)
}

pub fn parse_schema(contents: &str, path: &str) -> SvyResult<SchemaRegistry> {
    let js: JSValue = serde_json::from_str(contents).context(ParsingJsonSnafu {})?;
    let questions_js = js
        .get("questions")
        .cloned()
        .context(MissingQuestionsSnafu { path })?;
    let questions: Vec<SchemaQuestion> =
        serde_json::from_value(questions_js).context(ParsingJsonSnafu {})?;
    build_registry(&questions)
}

pub fn build_registry(questions: &[SchemaQuestion]) -> SvyResult<SchemaRegistry> {
    let mut defs: Vec<QuestionDefinition> = Vec::new();
    for q in questions {
        let qtype = QuestionType::parse(q.question_type.as_str()).context(UnknownTypeTagSnafu {
            tag: q.question_type.clone(),
            id: q.id.clone(),
        })?;
        let mut def = QuestionDefinition::new(&q.id, &q.question, qtype);
        def.options = q.options.clone();
        def.items = q.items.clone();
        def.scale = q.scale.clone();
        def.max_selections = q.max_selections;
        def.has_other = q.has_other.unwrap_or(false);
        defs.push(def);
    }
    let schema = SchemaRegistry::from_definitions(defs).context(SchemaSnafu {})?;
    info!("loaded schema with {} questions", schema.len());
    Ok(schema)
}
