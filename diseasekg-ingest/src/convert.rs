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

//! CSV row converters for the supported source datasets.
//!
//! Each converter reads one CSV layout and emits HealthRecord subjects
//! keyed so that re-ingesting the same file overwrites rather than
//! duplicates. Unknown columns are ignored; a missing expected column
//! fails the whole run.

use std::io::Read;

use anyhow::{Context, Result};
use serde::Deserialize;

use diseasekg_query::schema;

use crate::turtle::{Record, TurtleDoc};

/// One row of an IHME GBD export.
#[derive(Debug, Deserialize)]
struct IhmeRow {
    measure_id: i64,
    measure_name: String,
    location_id: i64,
    location_name: String,
    sex_id: i64,
    sex_name: String,
    age_id: i64,
    age_name: String,
    cause_id: i64,
    cause_name: String,
    metric_id: i64,
    metric_name: String,
    year: i32,
    val: f64,
}

/// One row of the OWID global malaria deaths series.
#[derive(Debug, Deserialize)]
struct OwidMalariaRow {
    #[serde(rename = "Entity")]
    entity: String,
    #[serde(rename = "Code")]
    code: String,
    #[serde(rename = "Year")]
    year: i32,
    malaria_deaths: f64,
}

/// One row of the OWID lung cancer deaths-by-sex series.
#[derive(Debug, Deserialize)]
struct OwidLungCancerRow {
    #[serde(rename = "Entity")]
    entity: String,
    #[serde(rename = "Code")]
    code: String,
    #[serde(rename = "Year")]
    year: i32,
    #[serde(
        rename = "Age-standardized deaths from trachea, bronchus, lung cancers in females in those aged all ages per 100,000 people"
    )]
    female_rate: f64,
    #[serde(
        rename = "Age-standardized deaths from trachea, bronchus, lung cancers in males in those aged all ages per 100,000 people"
    )]
    male_rate: f64,
}

/// IHME GBD export: one record per row, all id and name predicates.
pub fn convert_ihme<R: Read>(input: R) -> Result<TurtleDoc> {
    let mut doc = TurtleDoc::new();
    let mut reader = csv::Reader::from_reader(input);
    for (i, row) in reader.deserialize().enumerate() {
        let row: IhmeRow = row.with_context(|| format!("IHME row {}", i + 1))?;
        let key = format!(
            "{}/{}/{}/{}/{}/{}",
            row.location_id, row.year, row.cause_id, row.measure_id, row.sex_id, row.age_id
        );
        let mut record = Record::new(&key)
            .integer(schema::P_MEASURE_ID, row.measure_id)
            .integer(schema::P_METRIC_ID, row.metric_id)
            .integer(schema::P_SEX_ID, row.sex_id)
            .integer(schema::P_AGE_ID, row.age_id)
            .string(schema::P_LOCATION, &row.location_name)
            .gyear(schema::P_YEAR, row.year)
            .string(schema::P_SEX, &row.sex_name)
            .string(schema::P_AGE, &row.age_name)
            .string(schema::P_METRIC, &row.metric_name)
            .float(schema::P_VALUE, row.val)
            .string(schema::P_MEASURE, &row.measure_name)
            .string(
                schema::P_MEASURE_DESCRIPTION,
                &format!(
                    "This record represents {} measured in {}",
                    row.measure_name, row.metric_name
                ),
            )
            .string(schema::P_CAUSE_NAME, &row.cause_name);
        if let Some(code) = schema::snomed_code(row.cause_name.trim()) {
            record = record.snomed(schema::P_CAUSE, code);
        }
        doc.push(record);
    }
    Ok(doc)
}

/// OWID malaria series: one deaths record per row.
pub fn convert_owid_malaria<R: Read>(input: R, dataset_link: &str) -> Result<TurtleDoc> {
    let mut doc = TurtleDoc::new();
    let mut reader = csv::Reader::from_reader(input);
    for (i, row) in reader.deserialize().enumerate() {
        let row: OwidMalariaRow = row.with_context(|| format!("OWID malaria row {}", i + 1))?;
        let key = format!("{}/{}/Malaria/all/{}", row.code, row.year, dataset_link);
        let mut record = Record::new(&key)
            .string(schema::P_LOCATION, &row.entity)
            .gyear(schema::P_YEAR, row.year)
            .string(
                schema::P_MEASURE_DESCRIPTION,
                "Number of deaths due to Malaria",
            )
            .float(schema::P_VALUE, row.malaria_deaths)
            .string(schema::P_CAUSE_NAME, "Malaria")
            .string(schema::P_DATASET_LINK, dataset_link);
        if let Some(code) = schema::snomed_code("Malaria") {
            record = record.snomed(schema::P_CAUSE, code);
        }
        doc.push(record);
    }
    Ok(doc)
}

/// OWID lung cancer series: two records per row, one per sex.
pub fn convert_owid_lung_cancer<R: Read>(input: R, dataset_link: &str) -> Result<TurtleDoc> {
    let mut doc = TurtleDoc::new();
    let mut reader = csv::Reader::from_reader(input);
    for (i, row) in reader.deserialize().enumerate() {
        let row: OwidLungCancerRow =
            row.with_context(|| format!("OWID lung cancer row {}", i + 1))?;
        for (sex, rate) in [("female", row.female_rate), ("male", row.male_rate)] {
            let key = format!(
                "{}/{}/LungCancer/{}/{}",
                row.code, row.year, sex, dataset_link
            );
            let mut record = Record::new(&key)
                .string(schema::P_LOCATION, &row.entity)
                .gyear(schema::P_YEAR, row.year)
                .string(
                    schema::P_MEASURE_DESCRIPTION,
                    &format!("Age-standardized deaths per 100,000 {sex}s"),
                )
                .float(schema::P_VALUE, rate)
                .string(schema::P_CAUSE_NAME, "Lung Cancer")
                .string(schema::P_SEX, sex)
                .string(schema::P_DATASET_LINK, dataset_link);
            if let Some(code) = schema::snomed_code("Lung Cancer") {
                record = record.snomed(schema::P_CAUSE, code);
            }
            doc.push(record);
        }
    }
    Ok(doc)
}

#[cfg(test)]
mod tests {
    use super::*;

    const IHME_HEADER: &str = "measure_id,measure_name,location_id,location_name,sex_id,sex_name,age_id,age_name,cause_id,cause_name,metric_id,metric_name,year,val,upper,lower";

    #[test]
    fn ihme_rows_become_full_records() {
        let csv = format!(
            "{IHME_HEADER}\n1,Deaths,44,Europe,3,Both,22,All ages,345,Malaria,1,Number,2015,1234.5,1300,1200\n"
        );
        let doc = convert_ihme(csv.as_bytes()).unwrap();
        assert_eq!(doc.len(), 1);

        let ttl = doc.to_turtle();
        assert!(ttl.contains("record/44/2015/345/1/3/22>"));
        assert!(ttl.contains("dis:location \"Europe\"^^xsd:string"));
        assert!(ttl.contains("dis:year \"2015\"^^xsd:gYear"));
        assert!(ttl.contains("dis:value \"1234.5\"^^xsd:float"));
        assert!(ttl.contains("dis:measure \"Deaths\"^^xsd:string"));
        assert!(ttl.contains(
            "dis:measureDescription \"This record represents Deaths measured in Number\"^^xsd:string"
        ));
        assert!(ttl.contains("dis:cause snomed:1386000"));
    }

    #[test]
    fn unknown_causes_get_no_snomed_link() {
        let csv = format!(
            "{IHME_HEADER}\n1,Deaths,44,Europe,3,Both,22,All ages,345,Common cold,1,Number,2015,1.0,1,1\n"
        );
        let doc = convert_ihme(csv.as_bytes()).unwrap();
        assert!(!doc.to_turtle().contains("dis:cause snomed:"));
    }

    #[test]
    fn missing_ihme_column_fails_with_row_context() {
        let csv = "measure_id,location_name\n1,Europe\n";
        let err = convert_ihme(csv.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("IHME row 1"));
    }

    #[test]
    fn converts_straight_from_a_file_handle() {
        use std::io::Write;

        let csv = "Entity,Code,Year,malaria_deaths\nEurope,OWID_EUR,2001,1200\n";
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(csv.as_bytes()).unwrap();

        let handle = std::fs::File::open(file.path()).unwrap();
        let doc = convert_owid_malaria(handle, "https://example.org/malaria").unwrap();
        assert_eq!(doc.len(), 1);
    }

    #[test]
    fn malaria_rows_become_single_records() {
        let csv = "Entity,Code,Year,malaria_deaths\nAfrica,OWID_AFR,2010,594000\n";
        let doc = convert_owid_malaria(csv.as_bytes(), "https://example.org/malaria").unwrap();
        assert_eq!(doc.len(), 1);

        let ttl = doc.to_turtle();
        assert!(ttl.contains("record/OWID_AFR/2010/Malaria/all/https://example.org/malaria>"));
        assert!(ttl.contains("dis:causeName \"Malaria\"^^xsd:string"));
        assert!(ttl.contains("dis:datasetLink \"https://example.org/malaria\"^^xsd:string"));
        assert!(ttl.contains("dis:cause snomed:1386000"));
        assert!(!ttl.contains("dis:sex "));
    }

    #[test]
    fn lung_cancer_rows_become_one_record_per_sex() {
        // Header fields containing commas are quoted in the source files.
        let csv = "Entity,Code,Year,\"Age-standardized deaths from trachea, bronchus, lung cancers in females in those aged all ages per 100,000 people\",\"Age-standardized deaths from trachea, bronchus, lung cancers in males in those aged all ages per 100,000 people\"\nDenmark,DNK,1999,18.2,48.7\n";
        let doc = convert_owid_lung_cancer(csv.as_bytes(), "https://example.org/lung").unwrap();
        assert_eq!(doc.len(), 2);

        let ttl = doc.to_turtle();
        assert!(ttl.contains("record/DNK/1999/LungCancer/female/https://example.org/lung>"));
        assert!(ttl.contains("record/DNK/1999/LungCancer/male/https://example.org/lung>"));
        assert!(ttl.contains("dis:value \"18.2\"^^xsd:float"));
        assert!(ttl.contains("dis:value \"48.7\"^^xsd:float"));
        assert!(ttl.contains(
            "dis:measureDescription \"Age-standardized deaths per 100,000 females\"^^xsd:string"
        ));
        assert!(ttl.contains("dis:sex \"male\"^^xsd:string"));
    }
}
