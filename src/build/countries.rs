// The static country reference table and the name resolution against it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use snafu::prelude::*;

use crate::build::context::JsonCache;
use crate::build::{BuildResult, ParsingJsonSnafu};

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct Country {
    pub name: String,
    pub iso2: String,
    pub iso3: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub other_names: Vec<String>,
}

pub struct CountryTable {
    countries: Vec<Country>,
}

impl CountryTable {
    /// Loads the reference table, a JSON object keyed by ISO-2 code.
    pub fn load(path: &str, cache: &mut JsonCache) -> BuildResult<CountryTable> {
        let js = cache.get(path)?;
        let by_code: BTreeMap<String, Country> =
            serde_json::from_value(js.clone()).context(ParsingJsonSnafu { path })?;
        Ok(CountryTable::new(by_code.into_values().collect()))
    }

    pub fn new(countries: Vec<Country>) -> CountryTable {
        CountryTable { countries }
    }

    /// Resolves a free-text country name against the canonical names and the
    /// declared aliases. Matching is case-insensitive equality; there is no
    /// fuzzy matching on purpose.
    pub fn resolve(&self, name: &str) -> Option<&Country> {
        let needle = name.trim().to_lowercase();
        self.countries.iter().find(|c| {
            c.name.to_lowercase() == needle
                || c.other_names.iter().any(|n| n.to_lowercase() == needle)
        })
    }

    /// The display name for a 2- or 3-letter ISO code.
    pub fn name_for(&self, code: &str) -> Option<&str> {
        let needle = code.to_uppercase();
        let country = if code.len() == 3 {
            self.countries.iter().find(|c| c.iso3 == needle)
        } else {
            self.countries.iter().find(|c| c.iso2 == needle)
        };
        country.map(|c| c.name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Country> {
        self.countries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> CountryTable {
        CountryTable::new(vec![
            Country {
                name: "Tanzania".to_string(),
                iso2: "TZ".to_string(),
                iso3: "TZA".to_string(),
                other_names: vec!["United Republic of Tanzania".to_string()],
            },
            Country {
                name: "Chile".to_string(),
                iso2: "CL".to_string(),
                iso3: "CHL".to_string(),
                other_names: vec![],
            },
        ])
    }

    #[test]
    fn resolves_canonical_and_alternate_names() {
        let t = table();
        assert_eq!(t.resolve("Chile").unwrap().iso2, "CL");
        assert_eq!(t.resolve("chile").unwrap().iso2, "CL");
        assert_eq!(
            t.resolve("United Republic of Tanzania").unwrap().iso2,
            "TZ"
        );
        assert_eq!(t.resolve("Narnia"), None);
    }

    #[test]
    fn no_fuzzy_matching() {
        let t = table();
        assert_eq!(t.resolve("Chil"), None);
        assert_eq!(t.resolve("Republic of Chile"), None);
    }

    #[test]
    fn reverse_lookup_by_code_length() {
        let t = table();
        assert_eq!(t.name_for("TZ"), Some("Tanzania"));
        assert_eq!(t.name_for("TZA"), Some("Tanzania"));
        assert_eq!(t.name_for("tza"), Some("Tanzania"));
        assert_eq!(t.name_for("XX"), None);
    }

    #[test]
    fn table_parses_the_reference_file_format() {
        let js: serde_json::Value = serde_json::from_str(
            r#"{"CL": {"name": "Chile", "iso2": "CL", "iso3": "CHL"},
                "TZ": {"name": "Tanzania", "iso2": "TZ", "iso3": "TZA",
                       "other_names": ["United Republic of Tanzania"]}}"#,
        )
        .unwrap();
        let by_code: BTreeMap<String, Country> = serde_json::from_value(js).unwrap();
        let t = CountryTable::new(by_code.into_values().collect());
        assert_eq!(t.resolve("united republic of tanzania").unwrap().iso2, "TZ");
    }
}
