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

//! RDF vocabulary constants for the disease knowledge graph.
//!
//! A `HealthRecord` always carries `value`, `causeName`, `location` and
//! `measure`; `year` and `sex` are sparse and must be matched with
//! OPTIONAL patterns.

/// Namespace of the health-record vocabulary.
pub const DIS_NS: &str = "http://diseases.org/disease-kg/";

/// SNOMED CT identifier namespace, used for `dis:cause` links.
pub const SNOMED_NS: &str = "http://snomed.info/id/";

/// XML Schema datatypes namespace.
pub const XSD_NS: &str = "http://www.w3.org/2001/XMLSchema#";

/// PREFIX preamble shared by every generated query.
pub const QUERY_PREFIXES: &str = "PREFIX dis: <http://diseases.org/disease-kg/>\n\
                                  PREFIX xsd: <http://www.w3.org/2001/XMLSchema#>";

/// RDF class of one statistical observation.
pub const CLASS_HEALTH_RECORD: &str = "HealthRecord";

// Required predicates.
pub const P_VALUE: &str = "value";
pub const P_CAUSE_NAME: &str = "causeName";
pub const P_LOCATION: &str = "location";
pub const P_MEASURE: &str = "measure";

// Sparse predicates.
pub const P_YEAR: &str = "year";
pub const P_SEX: &str = "sex";
pub const P_AGE: &str = "age";

// Descriptive predicates used by ingestion only.
pub const P_METRIC: &str = "metric";
pub const P_MEASURE_ID: &str = "measureId";
pub const P_METRIC_ID: &str = "metricId";
pub const P_SEX_ID: &str = "sexId";
pub const P_AGE_ID: &str = "ageId";
pub const P_MEASURE_DESCRIPTION: &str = "measureDescription";
pub const P_CAUSE: &str = "cause";
pub const P_DATASET_LINK: &str = "datasetLink";

/// SNOMED CT code for a canonical cause name, when one is known.
///
/// Consumed by the ingestion collaborator to emit `dis:cause` links;
/// query generation never touches this table.
pub fn snomed_code(cause_name: &str) -> Option<&'static str> {
    let code = match cause_name {
        "HIV/AIDS" => "86406008",
        "Leukemia" => "93143009",
        "Diabetes mellitus type 2" => "44054006",
        "Tuberculosis" => "56717001",
        "COVID-19" => "840539006",
        "Prostate cancer" => "399068003",
        "Stroke" => "230690007",
        "Breast cancer" => "254837009",
        "Stomach cancer" => "363406005",
        "Anorexia nervosa" => "447562003",
        "Schizophrenia" => "58214004",
        "Bipolar disorder" => "13746004",
        "Bulimia nervosa" => "439960005",
        "Malaria" => "1386000",
        "Lung Cancer" => "254637007",
        _ => return None,
    };
    Some(code)
}
