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

//! DiseaseKG Query Engine
//!
//! Rule-based analysis of natural-language questions about disease
//! statistics and deterministic compilation of the resulting intent
//! into SPARQL SELECT queries over the HealthRecord vocabulary.
//!
//! The analyzer and the generator are pure: no I/O, no shared mutable
//! state, safe to call concurrently.

pub mod analyzer;
pub mod lexicon;
pub mod schema;
pub mod sparql;

pub use analyzer::{
    Aggregation, Analysis, Gender, Grouping, QueryType, QuestionAnalyzer, Visualization,
};
pub use lexicon::{Lexicon, LexiconError};
pub use sparql::{CompiledQuery, SparqlGenerator};
