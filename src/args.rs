use clap::Parser;

/// This is a survey tabulation and filtering program.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path) The CSV export of the survey, one row per respondent with
    /// the question texts in the first row.
    #[clap(short, long, value_parser)]
    pub input: String,

    /// (file path, optional) A JSON description of the questions. When omitted,
    /// the schema is synthesized from the export itself and a per-question
    /// summary is printed.
    #[clap(short, long, value_parser)]
    pub schema: Option<String>,

    /// (file path or 'stdout') If specified, the normalized responses will be
    /// written in JSON format to the given location.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (question id) If specified, prints the tally of answers for this
    /// question after filtering.
    #[clap(short, long, value_parser)]
    pub counts: Option<String>,

    /// (file path or 'stdout') If specified, a full aggregate report (counts,
    /// matrix breakdowns, ranking scores, response rates) will be written in
    /// JSON format to the given location.
    #[clap(long, value_parser)]
    pub report: Option<String>,

    /// (file path) A reference file containing an aggregate report in JSON
    /// format. If provided, svtally will check that the produced report
    /// matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (repeatable) A filter of the form 'question=value', or 'question!=value'
    /// to negate. Several alternatives for the same question can be given as
    /// 'question=value1|value2'.
    #[clap(short, long, value_parser)]
    pub filter: Vec<String>,

    /// (default 'and') How multiple --filter options combine: 'and' keeps
    /// respondents matching every filter, 'or' those matching any.
    #[clap(long, value_parser)]
    pub filter_logic: Option<String>,

    /// If passed as an argument, list answers with no semicolon will also be
    /// split on commas. Some hand-edited exports use commas as the delimiter.
    #[clap(long, takes_value = false)]
    pub comma_lists: bool,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
