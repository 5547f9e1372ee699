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

//! Deterministic SPARQL generation from an [`Analysis`].
//!
//! Two query shapes exist: a flat record listing and a grouped
//! aggregate. Both share one WHERE skeleton over the HealthRecord
//! vocabulary and both are capped at 20 rows.

use serde::Serialize;

use crate::analyzer::{Analysis, Grouping, Visualization};
use crate::schema;

/// A generated query together with the visualization it should feed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompiledQuery {
    pub query: String,
    pub visualization: Visualization,
}

/// Compiles an [`Analysis`] into a SPARQL SELECT query.
///
/// Pure and infallible: any analysis, however empty, yields a valid
/// query. With no filters at all the result is an unfiltered listing
/// of the first 20 records.
#[derive(Debug, Clone, Copy, Default)]
pub struct SparqlGenerator;

impl SparqlGenerator {
    pub fn new() -> Self {
        Self
    }

    pub fn generate(&self, analysis: &Analysis) -> CompiledQuery {
        let compiled = match analysis.aggregation {
            Some(agg) => self.generate_aggregate(analysis, agg.sparql_name()),
            None => self.generate_listing(analysis),
        };
        tracing::debug!(
            visualization = compiled.visualization.as_str(),
            "compiled SPARQL query"
        );
        compiled
    }

    /// Flat listing of matching records.
    fn generate_listing(&self, analysis: &Analysis) -> CompiledQuery {
        let query = format!(
            "{}\n\nSELECT ?value ?causeName ?location ?measure ?year ?sex\n{}\nLIMIT 20",
            schema::QUERY_PREFIXES,
            where_clause(&filters(analysis, false)),
        );
        CompiledQuery {
            query,
            visualization: analysis.visualization,
        }
    }

    /// Grouped SUM or AVG over the value column.
    ///
    /// Grouping variables keep a fixed ?sex ?location ?year order no
    /// matter how the question phrased them; an age grouping has no
    /// variable in this vocabulary and is ignored here. When a location
    /// grouping is present the location filter is dropped so the groups
    /// are not collapsed to the filtered value.
    fn generate_aggregate(&self, analysis: &Analysis, function: &str) -> CompiledQuery {
        let mut group_vars: Vec<&str> = Vec::new();
        if analysis.grouping.contains(&Grouping::Sex) {
            group_vars.push("?sex");
        }
        if analysis.grouping.contains(&Grouping::Location) {
            group_vars.push("?location");
        }
        if analysis.grouping.contains(&Grouping::Year) {
            group_vars.push("?year");
        }

        let skip_location = analysis.grouping.contains(&Grouping::Location);

        let select = if group_vars.is_empty() {
            format!("SELECT ({function}(?value) AS ?value)")
        } else {
            format!("SELECT {} ({function}(?value) AS ?value)", group_vars.join(" "))
        };

        let mut query = format!(
            "{}\n\n{}\n{}",
            schema::QUERY_PREFIXES,
            select,
            where_clause(&filters(analysis, skip_location)),
        );
        if !group_vars.is_empty() {
            query.push_str(&format!("\nGROUP BY {}", group_vars.join(" ")));
        }
        query.push_str("\nLIMIT 20");

        let visualization = if group_vars.is_empty() {
            Visualization::Metric
        } else {
            Visualization::Bar
        };
        CompiledQuery {
            query,
            visualization,
        }
    }
}

/// The shared WHERE skeleton. `year` and `sex` are sparse predicates,
/// so they are matched optionally to keep records without them.
fn where_clause(filter_exprs: &[String]) -> String {
    let mut clause = String::from(
        "WHERE {\n\
         \x20   ?record a dis:HealthRecord ;\n\
         \x20           dis:value ?value ;\n\
         \x20           dis:causeName ?causeName ;\n\
         \x20           dis:location ?location ;\n\
         \x20           dis:measure ?measure .\n\
         \x20   OPTIONAL { ?record dis:year ?year }\n\
         \x20   OPTIONAL { ?record dis:sex ?sex }\n",
    );
    if !filter_exprs.is_empty() {
        clause.push_str(&format!("    FILTER({})\n", filter_exprs.join(" && ")));
    }
    clause.push('}');
    clause
}

/// Equality filters for the first entity of each kind.
///
/// Only the first matched disease, location and measure constrain the
/// query; additional matches ride along in the analysis for display
/// but are not filtered. A time range never produces a filter, the
/// grouped trend query already returns every year.
fn filters(analysis: &Analysis, skip_location: bool) -> Vec<String> {
    let mut exprs = Vec::new();
    if let Some(disease) = analysis.diseases.first() {
        exprs.push(format!("?causeName = \"{}\"", escape_literal(disease)));
    }
    if let Some(measure) = analysis.measures.first() {
        exprs.push(format!("?measure = \"{}\"", escape_literal(measure)));
    }
    if !skip_location {
        if let Some(location) = analysis.locations.first() {
            exprs.push(format!("?location = \"{}\"", escape_literal(location)));
        }
    }
    if let Some(year) = &analysis.time_period {
        exprs.push(format!("?year = \"{}\"^^xsd:gYear", escape_literal(year)));
    }
    exprs
}

/// Escape a string for use inside a double-quoted SPARQL literal.
///
/// Backslashes first, then quotes, so injected quote characters cannot
/// terminate the literal and alter the query shape.
fn escape_literal(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
