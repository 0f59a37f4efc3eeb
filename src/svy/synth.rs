// Schema synthesis: building a question registry from nothing but the
// export itself, for surveys that have no hand-authored schema yet.

use log::{debug, info, warn};
use snafu::prelude::*;

use survey_tally::{
    detect_type, split_list, ColumnBinding, ColumnPlan, HeaderNormalizer, QuestionDefinition,
    QuestionType, SchemaRegistry,
};

use crate::svy::io_csv::CsvExport;
use crate::svy::{SchemaSnafu, SvyResult};

/// Per-question observations gathered during synthesis, kept for the
/// summary report.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct QuestionStats {
    pub response_count: u64,
    pub unique_answers: Vec<String>,
}

pub struct SynthesizedSchema {
    pub schema: SchemaRegistry,
    /// Binds exactly the columns the questions were built from. A column
    /// skipped over a key collision has no binding here.
    pub plan: ColumnPlan,
    /// (question id, stats) in schema order.
    pub stats: Vec<(String, QuestionStats)>,
    pub total_rows: u64,
}

// One question in the making, spanning one column (or several for a
// matrix family).
struct Draft {
    id: String,
    prompt: String,
    type_hint: Option<QuestionType>,
    // (column, item label) for matrix families, single entry otherwise.
    columns: Vec<(usize, Option<String>)>,
}

pub fn synthesize(
    export: &CsvExport,
    normalizer: &HeaderNormalizer,
    comma_lists: bool,
) -> SvyResult<SynthesizedSchema> {
    let mut drafts: Vec<Draft> = Vec::new();

    for (col, header) in export.headers.iter().enumerate() {
        let norm = normalizer.normalize(header);
        match drafts.iter_mut().find(|d| d.id == norm.id) {
            None => drafts.push(Draft {
                id: norm.id,
                prompt: header.clone(),
                type_hint: norm.type_hint,
                columns: vec![(col, norm.sub_label)],
            }),
            Some(draft) => {
                let both_matrix = draft.type_hint.map(|t| t.is_matrix()).unwrap_or(false)
                    && norm.type_hint.map(|t| t.is_matrix()).unwrap_or(false);
                if both_matrix {
                    draft.columns.push((col, norm.sub_label));
                } else {
                    warn!(
                        "column {} ({:?}) collides with question {:?}, skipping it",
                        col, header, draft.id
                    );
                }
            }
        }
    }

    let mut defs: Vec<QuestionDefinition> = Vec::new();
    let mut stats: Vec<(String, QuestionStats)> = Vec::new();
    let mut bindings: Vec<ColumnBinding> = Vec::new();
    for draft in drafts {
        let (def, st) = build_question(&draft, export, comma_lists);
        debug!(
            "synthesized {:?} as {} ({} responses)",
            def.id, def.qtype, st.response_count
        );
        for (col, item) in draft.columns.iter() {
            bindings.push(ColumnBinding {
                column: *col,
                question: draft.id.clone(),
                item: item.clone(),
            });
        }
        defs.push(def);
        stats.push((draft.id, st));
    }

    let schema = SchemaRegistry::from_definitions(defs).context(SchemaSnafu {})?;
    info!("synthesized schema with {} questions", schema.len());
    Ok(SynthesizedSchema {
        schema,
        plan: ColumnPlan::new(bindings),
        stats,
        total_rows: export.rows.len() as u64,
    })
}

fn build_question(
    draft: &Draft,
    export: &CsvExport,
    comma_lists: bool,
) -> (QuestionDefinition, QuestionStats) {
    if draft.columns.len() > 1 || draft.type_hint.map(|t| t.is_matrix()).unwrap_or(false) {
        return build_matrix_question(draft, export);
    }

    let col = draft.columns[0].0;
    let mut unique: Vec<String> = Vec::new();
    let mut response_count = 0u64;
    for row in export.rows.iter() {
        let cell = row.get(col).map(|c| c.trim()).unwrap_or("");
        if cell.is_empty() {
            continue;
        }
        response_count += 1;
        for part in split_list(cell, comma_lists) {
            if !unique.contains(&part) {
                unique.push(part);
            }
        }
    }
    unique.sort();

    let qtype = detect_type(&draft.prompt, &unique, draft.type_hint);
    let mut def = QuestionDefinition::new(&draft.id, &draft.prompt, qtype);
    if qtype.has_closed_options() || qtype == QuestionType::Ranking {
        def.options = unique.clone();
    }
    if qtype == QuestionType::MultipleChoiceLimited || qtype == QuestionType::Ranking {
        def.max_selections = parse_cap(&draft.prompt);
    }
    (
        def,
        QuestionStats {
            response_count,
            unique_answers: unique,
        },
    )
}

fn build_matrix_question(draft: &Draft, export: &CsvExport) -> (QuestionDefinition, QuestionStats) {
    let items: Vec<String> = draft
        .columns
        .iter()
        .map(|(_, label)| label.clone().unwrap_or_else(|| draft.prompt.clone()))
        .collect();
    let mut scale: Vec<String> = Vec::new();
    let mut response_count = 0u64;
    for row in export.rows.iter() {
        let mut answered = false;
        for (col, _) in draft.columns.iter() {
            let cell = row.get(*col).map(|c| c.trim()).unwrap_or("");
            if cell.is_empty() {
                continue;
            }
            answered = true;
            if !scale.contains(&cell.to_string()) {
                scale.push(cell.to_string());
            }
        }
        if answered {
            response_count += 1;
        }
    }
    scale.sort();

    let mut def = QuestionDefinition::new(&draft.id, &draft.prompt, QuestionType::Matrix);
    def.items = items;
    def.scale = scale.clone();
    (
        def,
        QuestionStats {
            response_count,
            unique_answers: scale,
        },
    )
}

/// Pulls the numeric cap out of prompts like "Select up to 3" or
/// "Rank top 3".
fn parse_cap(prompt: &str) -> Option<u32> {
    for marker in ["Select up to", "Rank top"] {
        if let Some(pos) = prompt.find(marker) {
            let digits: String = prompt[pos + marker.len()..]
                .chars()
                .skip_while(|c| !c.is_ascii_digit())
                .take_while(|c| c.is_ascii_digit())
                .collect();
            if let Result::Ok(n) = digits.parse::<u32>() {
                return Some(n);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::svy::rules;

    fn export() -> CsvExport {
        let headers = vec![
            "Id".to_string(),
            "What is your current professional role?".to_string(),
            "Which game engine do you primarily use? (Select all that apply)".to_string(),
            "What are your primary concerns when considering procedural generation? Select up to 2"
                .to_string(),
            "How would you rate your current experience with the following procedural tools?.Houdini"
                .to_string(),
            "How would you rate your current experience with the following procedural tools?.Blender"
                .to_string(),
        ];
        let rows = vec![
            vec!["1", "Designer", "Unity; Unreal", "Cost; Learning curve", "Expert", ""],
            vec!["2", "Programmer", "Unity", "Cost", "", "Basic"],
            vec!["3", "", "Godot", "", "None", "Basic"],
        ]
        .into_iter()
        .map(|r| r.into_iter().map(|c| c.to_string()).collect())
        .collect();
        CsvExport { headers, rows }
    }

    #[test]
    fn synthesizes_types_and_options() {
        let synth = synthesize(&export(), &rules::normalizer(), false).unwrap();
        let schema = &synth.schema;
        assert_eq!(
            schema.get("id").unwrap().qtype,
            QuestionType::Identifier
        );
        let role = schema.get("professional_role").unwrap();
        assert_eq!(role.qtype, QuestionType::SingleChoice);
        assert_eq!(role.options, vec!["Designer", "Programmer"]);
        let engines = schema.get("game_engines").unwrap();
        assert_eq!(engines.qtype, QuestionType::MultipleChoice);
        assert_eq!(engines.options, vec!["Godot", "Unity", "Unreal"]);
        let concerns = schema.get("primary_concerns").unwrap();
        assert_eq!(concerns.qtype, QuestionType::MultipleChoiceLimited);
        assert_eq!(concerns.max_selections, Some(2));
    }

    #[test]
    fn groups_matrix_columns_into_one_question() {
        let synth = synthesize(&export(), &rules::normalizer(), false).unwrap();
        let exp = synth.schema.get("tool_experience").unwrap();
        assert_eq!(exp.qtype, QuestionType::Matrix);
        assert_eq!(exp.items, vec!["Houdini", "Blender"]);
        assert_eq!(exp.scale, vec!["Basic", "Expert", "None"]);
    }

    #[test]
    fn counts_responses_per_question() {
        let synth = synthesize(&export(), &rules::normalizer(), false).unwrap();
        let get = |id: &str| {
            synth
                .stats
                .iter()
                .find(|(q, _)| q == id)
                .map(|(_, s)| s.response_count)
                .unwrap()
        };
        assert_eq!(synth.total_rows, 3);
        assert_eq!(get("professional_role"), 2);
        assert_eq!(get("primary_concerns"), 2);
        // Any rated column counts the row as a response.
        assert_eq!(get("tool_experience"), 3);
    }

    #[test]
    fn colliding_columns_stay_out_of_schema_and_plan() {
        use survey_tally::{RowNormalizer, Value};

        // Both headers synthesize to the same fallback key.
        let headers = vec![
            "A question nobody planned for?".to_string(),
            "A question, nobody planned for!".to_string(),
        ];
        let rows = vec![vec!["first".to_string(), "second".to_string()]];
        let export = CsvExport { headers, rows };

        let synth = synthesize(&export, &rules::normalizer(), false).unwrap();
        assert_eq!(synth.schema.len(), 1);
        assert_eq!(synth.plan.bindings().len(), 1);
        assert_eq!(synth.plan.bindings()[0].column, 0);

        // The skipped column's data must not leak into the kept question.
        let normalizer = RowNormalizer::new(&synth.schema, &synth.plan);
        let records = normalizer.normalize_all(&export.rows);
        assert_eq!(
            records[0].get("a_question_nobody_planned_for"),
            Some(&Value::Choice("first".to_string()))
        );
    }

    #[test]
    fn parse_cap_reads_the_first_number() {
        assert_eq!(parse_cap("Select up to 3 options"), Some(3));
        assert_eq!(parse_cap("Rank top 5"), Some(5));
        assert_eq!(parse_cap("Rank your favorites"), None);
    }
}
