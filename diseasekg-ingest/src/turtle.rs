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

//! Minimal Turtle serialization for HealthRecord uploads.
//!
//! Only what the converters emit is supported: one typed subject per
//! record, predicate-object lists with typed literals, and `dis:cause`
//! IRI links. Everything is written with explicit xsd datatypes to
//! match what the store already holds.

use std::fmt::Write;

use diseasekg_query::schema;

/// One HealthRecord subject with its predicate-object list.
#[derive(Debug, Clone)]
pub struct Record {
    subject: String,
    objects: Vec<(String, String)>,
}

impl Record {
    /// A record rooted at `<{dis}record/{key}>`.
    pub fn new(key: &str) -> Self {
        Self {
            subject: format!("{}record/{}", schema::DIS_NS, key),
            objects: Vec::new(),
        }
    }

    pub fn string(mut self, predicate: &str, value: &str) -> Self {
        self.objects.push((
            predicate.to_string(),
            format!("\"{}\"^^xsd:string", escape_string(value)),
        ));
        self
    }

    pub fn integer(mut self, predicate: &str, value: i64) -> Self {
        self.objects
            .push((predicate.to_string(), format!("\"{value}\"^^xsd:integer")));
        self
    }

    pub fn float(mut self, predicate: &str, value: f64) -> Self {
        self.objects
            .push((predicate.to_string(), format!("\"{value}\"^^xsd:float")));
        self
    }

    pub fn gyear(mut self, predicate: &str, year: i32) -> Self {
        self.objects
            .push((predicate.to_string(), format!("\"{year}\"^^xsd:gYear")));
        self
    }

    pub fn snomed(mut self, predicate: &str, code: &str) -> Self {
        self.objects
            .push((predicate.to_string(), format!("snomed:{code}")));
        self
    }
}

/// A set of records serializable as one Turtle document.
#[derive(Debug, Clone, Default)]
pub struct TurtleDoc {
    records: Vec<Record>,
}

impl TurtleDoc {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: Record) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Serialize every record under the shared prefix preamble.
    pub fn to_turtle(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "@prefix dis: <{}> .", schema::DIS_NS);
        let _ = writeln!(out, "@prefix snomed: <{}> .", schema::SNOMED_NS);
        let _ = writeln!(out, "@prefix xsd: <{}> .", schema::XSD_NS);

        for record in &self.records {
            let _ = writeln!(out);
            let _ = writeln!(
                out,
                "<{}> a dis:{} ;",
                record.subject,
                schema::CLASS_HEALTH_RECORD
            );
            for (i, (predicate, object)) in record.objects.iter().enumerate() {
                let terminator = if i + 1 == record.objects.len() { '.' } else { ';' };
                let _ = writeln!(out, "    dis:{predicate} {object} {terminator}");
            }
        }
        out
    }
}

/// Escape a Turtle double-quoted string literal.
fn escape_string(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\t' => escaped.push_str("\\t"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_carries_prefixes_and_typed_literals() {
        let mut doc = TurtleDoc::new();
        doc.push(
            Record::new("MKD/2015/Malaria/all/src")
                .string(schema::P_LOCATION, "Macedonia")
                .gyear(schema::P_YEAR, 2015)
                .float(schema::P_VALUE, 12.5)
                .integer(schema::P_SEX_ID, 3)
                .snomed(schema::P_CAUSE, "1386000"),
        );

        let ttl = doc.to_turtle();
        assert!(ttl.starts_with("@prefix dis: <http://diseases.org/disease-kg/> ."));
        assert!(ttl.contains("<http://diseases.org/disease-kg/record/MKD/2015/Malaria/all/src> a dis:HealthRecord ;"));
        assert!(ttl.contains("dis:location \"Macedonia\"^^xsd:string ;"));
        assert!(ttl.contains("dis:year \"2015\"^^xsd:gYear ;"));
        assert!(ttl.contains("dis:value \"12.5\"^^xsd:float ;"));
        assert!(ttl.contains("dis:sexId \"3\"^^xsd:integer ;"));
        assert!(ttl.contains("dis:cause snomed:1386000 ."));
    }

    #[test]
    fn last_object_closes_the_statement() {
        let mut doc = TurtleDoc::new();
        doc.push(Record::new("k").string(schema::P_LOCATION, "Europe"));
        let ttl = doc.to_turtle();
        assert!(ttl.trim_end().ends_with("dis:location \"Europe\"^^xsd:string ."));
    }

    #[test]
    fn quotes_and_backslashes_are_escaped() {
        assert_eq!(escape_string(r#"a "b" c\d"#), r#"a \"b\" c\\d"#);
        assert_eq!(escape_string("line1\nline2"), "line1\\nline2");
    }
}
