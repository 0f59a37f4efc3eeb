// Assembling the JSON views of the normalized data: the per-respondent
// record dump and the aggregate report, plus the schema synthesis
// summary printed on stdout.

use serde_json::json;
use serde_json::Map as JSMap;
use serde_json::Value as JSValue;
use snafu::prelude::*;

use survey_tally::{query, CanonicalRecord, QuestionType, SchemaRegistry, Value};

use crate::svy::synth::SynthesizedSchema;
use crate::svy::{SchemaSnafu, SvyResult};

/// The per-question summary printed after a synthesis pass.
pub fn print_schema_summary(synth: &SynthesizedSchema) {
    println!("Questions: {}", synth.schema.len());
    println!("Responses: {}", synth.total_rows);
    for def in synth.schema.definitions() {
        let stats = synth.stats.iter().find(|(id, _)| id == &def.id);
        println!("{} ({})", def.id, def.qtype);
        if let Some((_, st)) = stats {
            let rate = if synth.total_rows == 0 {
                0.0
            } else {
                st.response_count as f64 / synth.total_rows as f64 * 100.0
            };
            println!(
                "  responses: {}/{} ({:.1}%)",
                st.response_count, synth.total_rows, rate
            );
            println!("  distinct answers: {}", st.unique_answers.len());
            for sample in st.unique_answers.iter().take(5) {
                println!("    - {}", sample);
            }
        }
    }
}

fn value_to_json(value: &Value) -> JSValue {
    match value {
        Value::Text(s) => json!(s),
        Value::Choice(s) => json!(s),
        Value::List(items) => json!(items),
        Value::Matrix(pairs) => {
            let mut m: JSMap<String, JSValue> = JSMap::new();
            for (item, level) in pairs {
                m.insert(item.clone(), json!(level));
            }
            JSValue::Object(m)
        }
    }
}

/// One JSON object per respondent, keyed by question id in schema order,
/// with `null` for unanswered questions. Raw texts that were collapsed
/// to the overflow marker come along under `otherResponses`.
pub fn records_json(schema: &SchemaRegistry, records: &[CanonicalRecord]) -> JSValue {
    let mut out: Vec<JSValue> = Vec::new();
    for record in records {
        let mut obj: JSMap<String, JSValue> = JSMap::new();
        for id in schema.all_ids() {
            let v = match record.get(id) {
                Some(value) => value_to_json(value),
                None => JSValue::Null,
            };
            obj.insert(id.to_string(), v);
        }
        if !record.overflow_answers().is_empty() {
            let mut overflow: JSMap<String, JSValue> = JSMap::new();
            for (question, original) in record.overflow_answers() {
                overflow
                    .entry(question.clone())
                    .or_insert_with(|| JSValue::Array(vec![]));
                if let Some(JSValue::Array(a)) = overflow.get_mut(question) {
                    a.push(json!(original));
                }
            }
            obj.insert("otherResponses".to_string(), JSValue::Object(overflow));
        }
        out.push(JSValue::Object(obj));
    }
    JSValue::Array(out)
}

fn tally_to_json(entries: &[(String, u64)]) -> JSValue {
    let mut m: JSMap<String, JSValue> = JSMap::new();
    for (key, count) in entries {
        m.insert(key.clone(), json!(count));
    }
    JSValue::Object(m)
}

/// The full aggregate report over an (already filtered) collection.
pub fn aggregate_report(
    schema: &SchemaRegistry,
    records: &[CanonicalRecord],
) -> SvyResult<JSValue> {
    let mut questions: JSMap<String, JSValue> = JSMap::new();
    for def in schema.definitions() {
        let (answered, total, rate) =
            query::response_rate(schema, records, &def.id).context(SchemaSnafu {})?;
        let mut block: JSMap<String, JSValue> = JSMap::new();
        block.insert("type".to_string(), json!(def.qtype.as_str()));
        block.insert("responses".to_string(), json!(answered));
        block.insert("total".to_string(), json!(total));
        block.insert("responseRate".to_string(), json!(rate));

        match def.qtype {
            QuestionType::Identifier | QuestionType::OpenText => {}
            QuestionType::Ranking => {
                let scores = query::ranking_scores(schema, records, &def.id)
                    .context(SchemaSnafu {})?;
                let mut scores_m: JSMap<String, JSValue> = JSMap::new();
                for (option, score) in scores {
                    scores_m.insert(option, json!(score));
                }
                block.insert("scores".to_string(), JSValue::Object(scores_m));
                let positions = query::ranking_positions(schema, records, &def.id)
                    .context(SchemaSnafu {})?;
                let mut pos_m: JSMap<String, JSValue> = JSMap::new();
                for (option, counts) in positions {
                    pos_m.insert(option, json!(counts));
                }
                block.insert("positions".to_string(), JSValue::Object(pos_m));
            }
            t if t.is_matrix() => {
                let matrix = query::matrix_counts(schema, records, &def.id)
                    .context(SchemaSnafu {})?;
                let mut items_m: JSMap<String, JSValue> = JSMap::new();
                for (item, tally) in matrix {
                    items_m.insert(item, tally_to_json(tally.entries()));
                }
                block.insert("items".to_string(), JSValue::Object(items_m));
            }
            _ => {
                let counts =
                    query::flat_counts(schema, records, &def.id).context(SchemaSnafu {})?;
                block.insert("counts".to_string(), tally_to_json(counts.entries()));
            }
        }
        questions.insert(def.id.clone(), JSValue::Object(block));
    }
    Ok(json!({
        "respondents": records.len(),
        "questions": questions
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use survey_tally::{QuestionDefinition, SchemaRegistry, OTHER};

    fn schema() -> SchemaRegistry {
        SchemaRegistry::from_definitions(vec![
            QuestionDefinition::new("role", "Role?", QuestionType::SingleChoice)
                .with_options(&["Designer", "Programmer"]),
            QuestionDefinition::new("priorities", "Rank top 2", QuestionType::Ranking)
                .with_options(&["Speed", "Quality", "Cost"])
                .with_max_selections(2),
            QuestionDefinition::new("experience", "Experience?", QuestionType::Matrix)
                .with_items(&["Houdini"])
                .with_scale(&["None", "Expert"]),
        ])
        .unwrap()
    }

    fn records() -> Vec<CanonicalRecord> {
        let mut r1 = CanonicalRecord::new();
        r1.insert("role", Value::Choice("Designer".to_string()));
        r1.insert(
            "priorities",
            Value::List(vec!["Speed".to_string(), "Cost".to_string()]),
        );
        r1.insert(
            "experience",
            Value::Matrix(vec![("Houdini".to_string(), "Expert".to_string())]),
        );
        let mut r2 = CanonicalRecord::new();
        r2.insert("role", Value::Choice(OTHER.to_string()));
        r2.push_overflow("role", "Artist");
        vec![r1, r2]
    }

    #[test]
    fn records_json_has_nulls_and_overflow() {
        let js = records_json(&schema(), &records());
        let arr = js.as_array().unwrap();
        assert_eq!(arr.len(), 2);
        assert_eq!(arr[0]["role"], json!("Designer"));
        assert_eq!(arr[0]["experience"]["Houdini"], json!("Expert"));
        assert!(arr[1]["priorities"].is_null());
        assert_eq!(arr[1]["otherResponses"]["role"], json!(["Artist"]));
        assert!(arr[0].get("otherResponses").is_none());
    }

    #[test]
    fn aggregate_report_covers_every_question() {
        let js = aggregate_report(&schema(), &records()).unwrap();
        assert_eq!(js["respondents"], json!(2));
        let qs = js["questions"].as_object().unwrap();
        assert_eq!(qs.len(), 3);
        assert_eq!(js["questions"]["role"]["counts"]["Designer"], json!(1));
        assert_eq!(js["questions"]["role"]["counts"][OTHER], json!(1));
        assert_eq!(js["questions"]["role"]["responseRate"], json!("100.0%"));
        // Borda with a cap of 2: Speed first (2.0), Cost second (1.0).
        assert_eq!(js["questions"]["priorities"]["scores"]["Speed"], json!(2.0));
        assert_eq!(js["questions"]["priorities"]["scores"]["Cost"], json!(1.0));
        assert_eq!(js["questions"]["priorities"]["scores"]["Quality"], json!(0.0));
        assert_eq!(
            js["questions"]["priorities"]["positions"]["Speed"],
            json!([1, 0])
        );
        assert_eq!(
            js["questions"]["experience"]["items"]["Houdini"]["Expert"],
            json!(1)
        );
        assert_eq!(js["questions"]["priorities"]["responseRate"], json!("50.0%"));
    }

    #[test]
    fn aggregate_report_on_empty_collection() {
        let js = aggregate_report(&schema(), &[]).unwrap();
        assert_eq!(js["respondents"], json!(0));
        assert_eq!(js["questions"]["role"]["counts"], json!({}));
        assert_eq!(js["questions"]["priorities"]["scores"]["Speed"], json!(0.0));
    }
}
