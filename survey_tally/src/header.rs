// ********* Header normalization ***********
//
// Survey exports carry the full question text as column headers, with
// matrix questions fanned out over one column per item. This module maps
// those raw headers onto stable short question ids through an ordered
// rule table, with a synthesized fallback key when no rule matches.

use log::debug;

use crate::schema::QuestionType;

/// Longest key a synthesized fallback may produce.
const MAX_SYNTHESIZED_LEN: usize = 50;

/// How a rule decides whether it applies to a raw header.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum HeaderPattern {
    /// The header is exactly this string.
    Exact(String),
    /// The header contains this substring.
    Contains(String),
    /// The header contains every one of these substrings.
    ContainsAll(Vec<String>),
}

impl HeaderPattern {
    pub fn matches(&self, header: &str) -> bool {
        match self {
            HeaderPattern::Exact(s) => header == s,
            HeaderPattern::Contains(s) => header.contains(s.as_str()),
            HeaderPattern::ContainsAll(parts) => parts.iter().all(|p| header.contains(p.as_str())),
        }
    }
}

/// How a matching rule extracts the matrix item label from the header.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum SubLabelRule {
    /// The header is the whole question, no item label.
    None,
    /// Item label follows the first `?`, with any trailing `.`-suffix
    /// boilerplate removed. Used by the interest-scale family.
    AfterQuestionMark,
    /// Item label is the segment after the last `.`. Used by the
    /// rating-scale family.
    AfterLastDot,
}

impl SubLabelRule {
    fn extract(&self, header: &str) -> Option<String> {
        match self {
            SubLabelRule::None => None,
            SubLabelRule::AfterQuestionMark => {
                let (_, rest) = header.split_once('?')?;
                let label = match rest.split_once('.') {
                    Some((before, _)) => before,
                    None => rest,
                };
                let label = label.trim();
                if label.is_empty() {
                    None
                } else {
                    Some(label.to_string())
                }
            }
            SubLabelRule::AfterLastDot => {
                let (_, label) = header.rsplit_once('.')?;
                let label = label.trim();
                if label.is_empty() {
                    None
                } else {
                    Some(label.to_string())
                }
            }
        }
    }
}

/// One entry of the ordered rule table. The first rule whose pattern
/// matches wins.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct HeaderRule {
    pub pattern: HeaderPattern,
    /// Question id assigned to matching headers. For matrix families the
    /// extracted item label is appended as `{id}_{label-key}` when
    /// `keyed_by_sub_label` is set.
    pub id: String,
    pub sub_label: SubLabelRule,
    /// When set, each matching column gets its own id derived from the
    /// extracted item label rather than sharing `id`.
    pub keyed_by_sub_label: bool,
    /// Question type the rule asserts, bypassing the answer heuristic.
    pub type_hint: Option<QuestionType>,
}

impl HeaderRule {
    pub fn exact(pattern: &str, id: &str) -> HeaderRule {
        HeaderRule {
            pattern: HeaderPattern::Exact(pattern.to_string()),
            id: id.to_string(),
            sub_label: SubLabelRule::None,
            keyed_by_sub_label: false,
            type_hint: None,
        }
    }

    pub fn contains(pattern: &str, id: &str) -> HeaderRule {
        HeaderRule {
            pattern: HeaderPattern::Contains(pattern.to_string()),
            id: id.to_string(),
            sub_label: SubLabelRule::None,
            keyed_by_sub_label: false,
            type_hint: None,
        }
    }

    pub fn contains_all(patterns: &[&str], id: &str) -> HeaderRule {
        HeaderRule {
            pattern: HeaderPattern::ContainsAll(patterns.iter().map(|s| s.to_string()).collect()),
            id: id.to_string(),
            sub_label: SubLabelRule::None,
            keyed_by_sub_label: false,
            type_hint: None,
        }
    }

    pub fn with_sub_label(mut self, rule: SubLabelRule, keyed: bool) -> HeaderRule {
        self.sub_label = rule;
        self.keyed_by_sub_label = keyed;
        self
    }

    pub fn with_type(mut self, qtype: QuestionType) -> HeaderRule {
        self.type_hint = Some(qtype);
        self
    }
}

/// The outcome of normalizing one raw header.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct NormalizedHeader {
    /// Stable short question id.
    pub id: String,
    /// Matrix item label extracted from the header, if any.
    pub sub_label: Option<String>,
    /// True when no rule matched and the id was derived mechanically
    /// from the header text. Synthesized ids may collide.
    pub synthesized: bool,
    pub type_hint: Option<QuestionType>,
}

/// Ordered header rule table.
#[derive(Debug, Clone, Default)]
pub struct HeaderNormalizer {
    rules: Vec<HeaderRule>,
}

impl HeaderNormalizer {
    pub fn new(rules: Vec<HeaderRule>) -> HeaderNormalizer {
        HeaderNormalizer { rules }
    }

    /// Maps one raw header to its normalized form. Rules are tried in
    /// order and the first match wins; when none matches, the id is
    /// synthesized from the header text and tagged as such.
    pub fn normalize(&self, header: &str) -> NormalizedHeader {
        for rule in self.rules.iter() {
            if rule.pattern.matches(header) {
                let sub_label = rule.sub_label.extract(header);
                let id = if rule.keyed_by_sub_label {
                    match &sub_label {
                        Some(label) => format!("{}_{}", rule.id, synthesize_key(label)),
                        // Item label missing where the rule expected one:
                        // fall through to the family id itself.
                        None => rule.id.clone(),
                    }
                } else {
                    rule.id.clone()
                };
                debug!("header {:?} -> {:?} (rule {:?})", header, id, rule.pattern);
                return NormalizedHeader {
                    id,
                    sub_label,
                    synthesized: false,
                    type_hint: rule.type_hint,
                };
            }
        }
        let id = synthesize_key(header);
        debug!("header {:?} -> synthesized {:?}", header, id);
        NormalizedHeader {
            id,
            sub_label: None,
            synthesized: true,
            type_hint: None,
        }
    }
}

/// Mechanical fallback key: drop everything but alphanumerics and
/// spaces, lowercase, collapse whitespace runs to `_`, truncate.
pub fn synthesize_key(text: &str) -> String {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || c.is_whitespace())
        .collect::<String>()
        .to_lowercase();
    let joined = cleaned.split_whitespace().collect::<Vec<&str>>().join("_");
    joined.chars().take(MAX_SYNTHESIZED_LEN).collect()
}

/// Guesses a question type from the header text and the set of distinct
/// answers observed in the export. A rule's type hint always wins over
/// the answer-shape heuristic.
pub fn detect_type(
    header: &str,
    unique_answers: &[String],
    hint: Option<QuestionType>,
) -> QuestionType {
    if header == "Id" {
        return QuestionType::Identifier;
    }
    if header.contains("Select all that apply") {
        return QuestionType::MultipleChoice;
    }
    if header.contains("Select up to") {
        return QuestionType::MultipleChoiceLimited;
    }
    if header.contains("Rank top") {
        return QuestionType::Ranking;
    }
    if let Some(qtype) = hint {
        return qtype;
    }
    if unique_answers.len() <= 10 && unique_answers.iter().all(|a| a.chars().count() < 100) {
        QuestionType::SingleChoice
    } else {
        QuestionType::OpenText
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_matching_rule_wins() {
        let norm = HeaderNormalizer::new(vec![
            HeaderRule::contains("professional role", "professional_role"),
            HeaderRule::contains("role", "some_other_role"),
        ]);
        let h = norm.normalize("What is your current professional role?");
        assert_eq!(h.id, "professional_role");
        assert!(!h.synthesized);
        assert_eq!(h.sub_label, None);
    }

    #[test]
    fn sub_label_after_question_mark_strips_suffix() {
        let rule = HeaderRule::contains_all(
            &["game genre", "interested would you be"],
            "genre_interest",
        )
        .with_sub_label(SubLabelRule::AfterQuestionMark, true)
        .with_type(QuestionType::InterestScale);
        let norm = HeaderNormalizer::new(vec![rule]);
        let h = norm.normalize(
            "If your project were of the following game genre, how interested would you be?\
             Roguelike .Please pick one",
        );
        assert_eq!(h.sub_label.as_deref(), Some("Roguelike"));
        assert_eq!(h.id, "genre_interest_roguelike");
        assert_eq!(h.type_hint, Some(QuestionType::InterestScale));
    }

    #[test]
    fn sub_label_after_last_dot() {
        let rule = HeaderRule::contains("procedural tools?", "experience")
            .with_sub_label(SubLabelRule::AfterLastDot, true)
            .with_type(QuestionType::RatingScale);
        let norm = HeaderNormalizer::new(vec![rule]);
        let h = norm
            .normalize("How would you rate your current experience with procedural tools?.Houdini");
        assert_eq!(h.sub_label.as_deref(), Some("Houdini"));
        assert_eq!(h.id, "experience_houdini");
    }

    #[test]
    fn fallback_key_is_cleaned_and_truncated() {
        let norm = HeaderNormalizer::new(vec![]);
        let h = norm.normalize("What's your favorite   (or least favorite) tool?");
        assert!(h.synthesized);
        assert_eq!(h.id, "whats_your_favorite_or_least_favorite_tool");

        let long = "a".repeat(80);
        assert_eq!(synthesize_key(&long).len(), 50);
    }

    #[test]
    fn type_detection_priorities() {
        assert_eq!(detect_type("Id", &[], None), QuestionType::Identifier);
        assert_eq!(
            detect_type("Pick your engines (Select all that apply)", &[], None),
            QuestionType::MultipleChoice
        );
        assert_eq!(
            detect_type("Concerns? Select up to 3", &[], None),
            QuestionType::MultipleChoiceLimited
        );
        assert_eq!(
            detect_type("Rank top 3 approaches", &[], None),
            QuestionType::Ranking
        );
        assert_eq!(
            detect_type("anything", &[], Some(QuestionType::RatingScale)),
            QuestionType::RatingScale
        );
    }

    #[test]
    fn short_closed_answers_imply_single_choice() {
        let answers: Vec<String> = vec!["Yes".to_string(), "No".to_string()];
        assert_eq!(
            detect_type("Do you use it?", &answers, None),
            QuestionType::SingleChoice
        );
        let many: Vec<String> = (0..11).map(|i| format!("a{}", i)).collect();
        assert_eq!(detect_type("Free text", &many, None), QuestionType::OpenText);
        let long_answer = vec!["x".repeat(150)];
        assert_eq!(
            detect_type("Explain", &long_answer, None),
            QuestionType::OpenText
        );
    }
}
