// The header rule table for the procedural-level-generation survey export.
//
// The rules recognize the full question texts that the survey platform
// writes as column headers and pin each one to a stable short id. The two
// matrix families (tool experience, genre interest) fan out over one
// column per item; their rules extract the item label and carry a type
// hint so synthesis does not have to guess from the answers.

use survey_tally::{HeaderNormalizer, HeaderRule, QuestionType, SubLabelRule};

pub fn header_rules() -> Vec<HeaderRule> {
    vec![
        HeaderRule::exact("Id", "id").with_type(QuestionType::Identifier),
        HeaderRule::contains("professional role", "professional_role"),
        HeaderRule::contains("years of experience", "years_experience"),
        HeaderRule::contains("game engine", "game_engines"),
        HeaderRule::contains("procedural tools?", "tool_experience")
            .with_sub_label(SubLabelRule::AfterLastDot, false)
            .with_type(QuestionType::Matrix),
        HeaderRule::contains("aspects do you currently use it for", "current_pcg_usage"),
        HeaderRule::contains(
            "How frequently do you incorporate",
            "level_generation_frequency",
        ),
        HeaderRule::contains("primary concerns when considering", "primary_concerns"),
        HeaderRule::contains("best describes your view on procedural", "tool_view"),
        HeaderRule::contains("most critical factor when evaluating", "critical_factors"),
        HeaderRule::contains_all(
            &["node-based tool", "features would be most important"],
            "node_tool_features",
        ),
        HeaderRule::contains("real-time feedback", "realtime_feedback_importance"),
        HeaderRule::contains(
            "approach to creating procedural generators",
            "preferred_approach",
        ),
        HeaderRule::contains(
            "level of integration would you prefer",
            "integration_preference",
        ),
        HeaderRule::contains_all(
            &["game genre", "interested would you be"],
            "genre_interest",
        )
        .with_sub_label(SubLabelRule::AfterQuestionMark, false)
        .with_type(QuestionType::Matrix),
        HeaderRule::contains(
            "levels typically represented and stored",
            "level_representation",
        ),
        HeaderRule::contains(
            "approaches to level generation would be most useful",
            "most_useful_approach",
        ),
        HeaderRule::contains("role would you prefer AI to play", "ai_role_preference"),
        HeaderRule::contains_all(
            &["AI-assisted procedural level design", "which is most important"],
            "ai_importance_factors",
        ),
        HeaderRule::contains("concerns you most about using AI", "ai_concerns"),
        HeaderRule::contains(
            "problems do you wish a procedural level generation tool could solve",
            "desired_solutions",
        ),
        HeaderRule::contains("single most important problem", "most_important_problem"),
    ]
}

pub fn normalizer() -> HeaderNormalizer {
    HeaderNormalizer::new(header_rules())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_headers_map_to_stable_ids() {
        let norm = normalizer();
        assert_eq!(norm.normalize("Id").id, "id");
        assert_eq!(
            norm.normalize("What is your current professional role?").id,
            "professional_role"
        );
        assert_eq!(
            norm.normalize("How many years of experience do you have in game development?")
                .id,
            "years_experience"
        );
        assert_eq!(
            norm.normalize("Which game engine do you primarily use? (Select all that apply)")
                .id,
            "game_engines"
        );
    }

    #[test]
    fn tool_experience_columns_share_one_question() {
        let norm = normalizer();
        let h1 = norm.normalize(
            "How would you rate your current experience with the following procedural tools?.Houdini",
        );
        let h2 = norm.normalize(
            "How would you rate your current experience with the following procedural tools?.Unity Terrain Tools",
        );
        assert_eq!(h1.id, "tool_experience");
        assert_eq!(h2.id, "tool_experience");
        assert_eq!(h1.sub_label.as_deref(), Some("Houdini"));
        assert_eq!(h2.sub_label.as_deref(), Some("Unity Terrain Tools"));
        assert_eq!(h1.type_hint, Some(QuestionType::Matrix));
    }

    #[test]
    fn genre_interest_columns_share_one_question() {
        let norm = normalizer();
        let h = norm.normalize(
            "If your project were of the following game genre, how interested would you be in \
             procedural level generation? Roguelike",
        );
        assert_eq!(h.id, "genre_interest");
        assert_eq!(h.sub_label.as_deref(), Some("Roguelike"));
        assert_eq!(h.type_hint, Some(QuestionType::Matrix));
    }

    #[test]
    fn unknown_headers_get_synthesized_ids() {
        let norm = normalizer();
        let h = norm.normalize("A question nobody planned for?");
        assert!(h.synthesized);
        assert_eq!(h.id, "a_question_nobody_planned_for");
    }
}
