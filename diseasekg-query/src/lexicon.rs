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

//! Surface-term lexicons and cue-phrase tables.
//!
//! The lexicon is configuration data, not code: the default bilingual
//! tables live in `lexicon.toml` and are parsed once at first use.
//! A deployment can load its own document via [`Lexicon::from_toml`].

use once_cell::sync::Lazy;
use serde::Deserialize;
use thiserror::Error;

/// One surface-term → canonical-value mapping.
///
/// Entry order inside a table is significant: the analyzer scans top to
/// bottom and the first entry whose term is contained in the question
/// claims that term.
#[derive(Debug, Clone, Deserialize)]
pub struct LexiconEntry {
    pub term: String,
    pub canonical: String,
}

/// Cue-phrase lists for everything that is not an entity table.
#[derive(Debug, Clone, Deserialize)]
pub struct CueWords {
    pub female: Vec<String>,
    pub male: Vec<String>,
    pub sex_group: Vec<String>,
    pub location_group: Vec<String>,
    pub age_group: Vec<String>,
    pub year_group: Vec<String>,
    pub sum: Vec<String>,
    pub average: Vec<String>,
    pub comparison: Vec<String>,
    pub ranking: Vec<String>,
    pub distribution: Vec<String>,
    pub map: Vec<String>,
}

/// Immutable term tables consulted by the analyzer.
#[derive(Debug, Clone, Deserialize)]
pub struct Lexicon {
    pub diseases: Vec<LexiconEntry>,
    pub locations: Vec<LexiconEntry>,
    pub measures: Vec<LexiconEntry>,
    pub cues: CueWords,
}

#[derive(Debug, Error)]
pub enum LexiconError {
    #[error("invalid lexicon document: {0}")]
    Parse(#[from] toml::de::Error),
}

static BUILTIN: Lazy<Lexicon> = Lazy::new(|| {
    Lexicon::from_toml(include_str!("../lexicon.toml")).expect("embedded lexicon is valid")
});

impl Lexicon {
    /// Parse a lexicon from a TOML document.
    pub fn from_toml(document: &str) -> Result<Self, LexiconError> {
        Ok(toml::from_str(document)?)
    }

    /// The built-in English/Macedonian lexicon, parsed once.
    pub fn builtin() -> &'static Lexicon {
        &BUILTIN
    }
}
