// Copyright 2025 DiseaseKG Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Rule-based question analyzer.
//!
//! Classifies a free-text question into a structured [`Analysis`]:
//! entities found in the lexicons, gender, time period or range,
//! grouping dimensions, aggregation kind, query type and a default
//! visualization. Matching is substring containment against the
//! lowercased question plus one date regex; there is no tokenization
//! and no further language understanding.
//!
//! ## Example
//!
//! - "malaria deaths in Europe" ⇒ diseases=[Malaria], measures=[Deaths],
//!   locations=[Europe], table view
//! - "total covid cases by country" ⇒ sum aggregation grouped by
//!   location, bar view
//! - "tuberculosis from 2000 to 2015" ⇒ trend over a time range,
//!   line view

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::lexicon::{Lexicon, LexiconEntry};

/// Gender constraint extracted from the question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Female,
    Male,
}

/// An axis along which aggregate queries partition results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Grouping {
    Sex,
    Location,
    Age,
    Year,
}

/// Aggregation function requested by the question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    Sum,
    Avg,
}

impl Aggregation {
    /// SPARQL aggregate function name.
    pub fn sparql_name(&self) -> &'static str {
        match self {
            Aggregation::Sum => "SUM",
            Aggregation::Avg => "AVG",
        }
    }
}

/// Coarse intent classification of the question.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryType {
    #[default]
    General,
    Trend,
    Total,
    Average,
    Comparison,
    Ranking,
}

/// Suggested rendering for the result set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visualization {
    #[default]
    Table,
    Bar,
    Line,
    Pie,
    Map,
    Metric,
}

impl Visualization {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visualization::Table => "table",
            Visualization::Bar => "bar",
            Visualization::Line => "line",
            Visualization::Pie => "pie",
            Visualization::Map => "map",
            Visualization::Metric => "metric",
        }
    }
}

/// Structured intent extracted from one question.
///
/// Created fresh per question and never mutated afterwards. Empty
/// collections and the `General`/`Table` defaults stand in for anything
/// the question did not mention — analysis never fails.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    /// Canonical disease names, in first-match order.
    pub diseases: Vec<String>,
    /// Canonical location names, in first-match order.
    pub locations: Vec<String>,
    /// Canonical measure names, in first-match order.
    pub measures: Vec<String>,
    pub gender: Option<Gender>,
    /// Single 4-digit year token, when exactly one was found.
    pub time_period: Option<String>,
    /// `[min, max]` of the raw year tokens when two or more were found.
    ///
    /// The comparison is on the token strings, not their numeric values.
    /// All extracted tokens are 4-digit years in 1900–2099, so the two
    /// orderings agree; revisit if the extraction pattern ever admits
    /// tokens of differing length.
    pub time_range: Option<[String; 2]>,
    /// Grouping dimensions in insertion order, duplicates suppressed.
    pub grouping: Vec<Grouping>,
    pub aggregation: Option<Aggregation>,
    pub query_type: QueryType,
    pub visualization: Visualization,
}

impl Analysis {
    fn push_grouping(&mut self, dimension: Grouping) {
        if !self.grouping.contains(&dimension) {
            self.grouping.push(dimension);
        }
    }
}

/// 4-digit years between 1900 and 2099, anywhere in the question.
static YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(?:19|20)\d{2}\b").unwrap());

/// Scans questions against a [`Lexicon`].
///
/// Stateless apart from the immutable lexicon; one instance can serve
/// concurrent requests.
#[derive(Debug, Clone)]
pub struct QuestionAnalyzer {
    lexicon: Lexicon,
}

impl QuestionAnalyzer {
    /// Analyzer over the built-in bilingual lexicon.
    pub fn new() -> Self {
        Self {
            lexicon: Lexicon::builtin().clone(),
        }
    }

    /// Analyzer over a custom lexicon.
    pub fn with_lexicon(lexicon: Lexicon) -> Self {
        Self { lexicon }
    }

    /// Classify a question. Never fails.
    pub fn analyze(&self, question: &str) -> Analysis {
        let question = question.to_lowercase();
        let cues = &self.lexicon.cues;
        let mut analysis = Analysis::default();

        // 1. Entity tables. Substring containment means multi-word terms
        // and shorter terms sharing a prefix can both match; different
        // canonical values for one concept are allowed to co-occur.
        analysis.diseases = match_terms(&self.lexicon.diseases, &question);
        analysis.locations = match_terms(&self.lexicon.locations, &question);
        analysis.measures = match_terms(&self.lexicon.measures, &question);

        // 2. Gender. The female branch is checked first and wins when
        // cues for both genders are present.
        if contains_any(&question, &cues.female) {
            analysis.gender = Some(Gender::Female);
        } else if contains_any(&question, &cues.male) {
            analysis.gender = Some(Gender::Male);
        }

        // 3. Years, in order of appearance, duplicates kept.
        let years: Vec<&str> = YEAR_RE.find_iter(&question).map(|m| m.as_str()).collect();
        if years.len() >= 2 {
            // min/max over the raw tokens; see the field doc on Analysis.
            let min = years.iter().min().copied().unwrap_or_default();
            let max = years.iter().max().copied().unwrap_or_default();
            analysis.time_range = Some([min.to_string(), max.to_string()]);
            analysis.query_type = QueryType::Trend;
            analysis.visualization = Visualization::Line;
        } else if let Some(year) = years.first() {
            analysis.time_period = Some((*year).to_string());
        }

        // 4. Grouping cues, each checked independently.
        if contains_any(&question, &cues.sex_group) {
            analysis.push_grouping(Grouping::Sex);
        }
        if contains_any(&question, &cues.location_group) {
            analysis.push_grouping(Grouping::Location);
        }
        if contains_any(&question, &cues.age_group) {
            analysis.push_grouping(Grouping::Age);
        }
        if contains_any(&question, &cues.year_group) {
            analysis.push_grouping(Grouping::Year);
            analysis.query_type = QueryType::Trend;
            analysis.visualization = Visualization::Line;
        }

        // 5. Aggregation. Sum before average, mutually exclusive; the
        // metric view is withheld from the sum branch once any grouping
        // was recorded.
        if contains_any(&question, &cues.sum) {
            analysis.aggregation = Some(Aggregation::Sum);
            analysis.query_type = QueryType::Total;
            if analysis.grouping.is_empty() {
                analysis.visualization = Visualization::Metric;
            }
        } else if contains_any(&question, &cues.average) {
            analysis.aggregation = Some(Aggregation::Avg);
            analysis.query_type = QueryType::Average;
            analysis.visualization = Visualization::Metric;
        }

        // 6. Query-type overrides, first match wins. The order is
        // load-bearing: comparison outranks ranking outranks
        // distribution outranks map.
        let overrides: [(&[String], fn(&mut Analysis)); 4] = [
            (&cues.comparison, |a| {
                a.query_type = QueryType::Comparison;
                a.visualization = Visualization::Bar;
            }),
            (&cues.ranking, |a| {
                a.query_type = QueryType::Ranking;
                a.visualization = Visualization::Bar;
            }),
            (&cues.distribution, |a| a.visualization = Visualization::Pie),
            (&cues.map, |a| a.visualization = Visualization::Map),
        ];
        for (cue_words, apply) in overrides {
            if contains_any(&question, cue_words) {
                apply(&mut analysis);
                break;
            }
        }

        // 7. Final visualization refinement; runs last and may override
        // everything chosen in steps 3–6.
        if matches!(analysis.grouping.as_slice(), [Grouping::Sex]) {
            analysis.visualization = Visualization::Pie;
        } else if analysis.grouping.contains(&Grouping::Location)
            && analysis.query_type != QueryType::Trend
        {
            analysis.visualization = Visualization::Bar;
        }

        tracing::debug!(
            diseases = analysis.diseases.len(),
            locations = analysis.locations.len(),
            measures = analysis.measures.len(),
            query_type = ?analysis.query_type,
            "analyzed question"
        );

        analysis
    }
}

impl Default for QuestionAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

/// Canonical values of every entry whose term appears in the question,
/// in table order, without re-adding a canonical value already found.
fn match_terms(entries: &[LexiconEntry], question: &str) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();
    for entry in entries {
        if question.contains(entry.term.as_str()) && !found.contains(&entry.canonical) {
            found.push(entry.canonical.clone());
        }
    }
    found
}

fn contains_any(question: &str, cues: &[String]) -> bool {
    cues.iter().any(|cue| question.contains(cue.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyze(question: &str) -> Analysis {
        QuestionAnalyzer::new().analyze(question)
    }

    #[test]
    fn lexicon_terms_resolve_to_canonical_values() {
        let analysis = analyze("malaria deaths in Europe");
        assert_eq!(analysis.diseases, vec!["Malaria"]);
        assert_eq!(analysis.locations, vec!["Europe"]);
        assert_eq!(analysis.measures, vec!["Deaths"]);
        assert_eq!(analysis.query_type, QueryType::General);
        assert_eq!(analysis.visualization, Visualization::Table);
    }

    #[test]
    fn macedonian_terms_resolve_too() {
        let analysis = analyze("смртност од туберкулоза во европа");
        assert_eq!(analysis.diseases, vec!["Tuberculosis"]);
        assert_eq!(analysis.locations, vec!["Europe"]);
        assert_eq!(analysis.measures, vec!["Deaths"]);
    }

    #[test]
    fn duplicate_canonical_values_are_not_readded() {
        // Both "covid" and "covid-19" match; one canonical value.
        let analysis = analyze("covid-19 cases");
        assert_eq!(analysis.diseases, vec!["COVID-19"]);
    }

    #[test]
    fn different_canonical_values_can_cooccur() {
        let analysis = analyze("compare malaria and tuberculosis deaths");
        assert_eq!(analysis.diseases, vec!["Malaria", "Tuberculosis"]);
    }

    #[test]
    fn female_cue_outranks_male_cue() {
        // "women" contains "men", so both cue lists fire.
        let analysis = analyze("stroke deaths among women");
        assert_eq!(analysis.gender, Some(Gender::Female));
        assert_eq!(analyze("deaths among men").gender, Some(Gender::Male));
    }

    #[test]
    fn single_year_becomes_time_period() {
        let analysis = analyze("malaria deaths in 2015");
        assert_eq!(analysis.time_period.as_deref(), Some("2015"));
        assert!(analysis.time_range.is_none());
        assert_eq!(analysis.query_type, QueryType::General);
    }

    #[test]
    fn two_years_become_a_trend_range() {
        let analysis = analyze("malaria deaths from 2015 to 2000");
        assert_eq!(
            analysis.time_range,
            Some(["2000".to_string(), "2015".to_string()])
        );
        assert!(analysis.time_period.is_none());
        assert_eq!(analysis.query_type, QueryType::Trend);
        assert_eq!(analysis.visualization, Visualization::Line);
    }

    #[test]
    fn out_of_range_numbers_are_not_years() {
        let analysis = analyze("deaths in 1850 and 2150");
        assert!(analysis.time_period.is_none());
        assert!(analysis.time_range.is_none());
    }

    #[test]
    fn sex_grouping_alone_forces_pie() {
        let analysis = analyze("covid deaths by sex");
        assert_eq!(analysis.grouping, vec![Grouping::Sex]);
        assert_eq!(analysis.visualization, Visualization::Pie);
    }

    #[test]
    fn year_grouping_forces_trend_and_line() {
        let analysis = analyze("tuberculosis deaths over time");
        assert_eq!(analysis.grouping, vec![Grouping::Year]);
        assert_eq!(analysis.query_type, QueryType::Trend);
        assert_eq!(analysis.visualization, Visualization::Line);
    }

    #[test]
    fn location_grouping_forces_bar_unless_trend() {
        let by_country = analyze("total covid deaths by country");
        assert!(by_country.grouping.contains(&Grouping::Location));
        assert_eq!(by_country.visualization, Visualization::Bar);

        let trend = analyze("covid deaths by country over time");
        assert_eq!(trend.query_type, QueryType::Trend);
        assert_eq!(trend.visualization, Visualization::Line);
    }

    #[test]
    fn total_without_grouping_is_a_metric() {
        let analysis = analyze("total malaria deaths");
        assert_eq!(analysis.aggregation, Some(Aggregation::Sum));
        assert_eq!(analysis.query_type, QueryType::Total);
        assert!(analysis.grouping.is_empty());
        assert_eq!(analysis.visualization, Visualization::Metric);
    }

    #[test]
    fn sum_outranks_average_when_both_cue() {
        let analysis = analyze("total and average deaths");
        assert_eq!(analysis.aggregation, Some(Aggregation::Sum));
        assert_eq!(analysis.query_type, QueryType::Total);
    }

    #[test]
    fn average_is_always_a_metric() {
        let analysis = analyze("average deaths by age");
        assert_eq!(analysis.aggregation, Some(Aggregation::Avg));
        assert_eq!(analysis.query_type, QueryType::Average);
        assert_eq!(analysis.visualization, Visualization::Metric);
    }

    #[test]
    fn comparison_outranks_ranking() {
        let analysis = analyze("compare the top countries");
        assert_eq!(analysis.query_type, QueryType::Comparison);
        assert_eq!(analysis.visualization, Visualization::Bar);
    }

    #[test]
    fn ranking_sets_bar() {
        let analysis = analyze("highest malaria deaths");
        assert_eq!(analysis.query_type, QueryType::Ranking);
        assert_eq!(analysis.visualization, Visualization::Bar);
    }

    #[test]
    fn distribution_changes_only_the_visualization() {
        let analysis = analyze("distribution of stroke deaths");
        assert_eq!(analysis.query_type, QueryType::General);
        assert_eq!(analysis.visualization, Visualization::Pie);
    }

    #[test]
    fn map_cue_sets_map_view() {
        let analysis = analyze("show malaria deaths on a map");
        assert_eq!(analysis.visualization, Visualization::Map);
    }

    #[test]
    fn empty_question_yields_defaults() {
        let analysis = analyze("");
        assert_eq!(analysis, Analysis::default());
    }

    #[test]
    fn analysis_serializes_with_lowercase_tags() {
        let analysis = analyze("total covid deaths by country");
        let json = serde_json::to_value(&analysis).unwrap();
        assert_eq!(json["query_type"], "total");
        assert_eq!(json["visualization"], "bar");
        assert_eq!(json["grouping"][0], "location");
        assert_eq!(json["aggregation"], "sum");
    }
}
