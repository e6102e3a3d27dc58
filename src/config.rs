// src/config.rs
use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use serde::Deserialize;

use crate::utils::error::ConfigError;

// Markers that tag a service label with its travel direction, e.g.
// "1-6_hacia_cabred". Matched once, when the configuration is built.
const TO_CABRED_MARKER: &str = "hacia_cabred";
const TO_RETIRO_MARKER: &str = "hacia_retiro";

// Page layout of the published PDF. Subject to change between editions.
const SAN_MARTIN_PAGES: [(usize, &str); 4] = [
    (0, "1-6_hacia_cabred"),
    (1, "1-6_hacia_retiro"),
    (2, "7_hacia_cabred"),
    (3, "7_hacia_retiro"),
];

// Stations in canonical order, Retiro first. The reverse direction's column
// schema is derived from this list.
const SAN_MARTIN_STATIONS: [&str; 22] = [
    "Retiro",
    "Palermo",
    "Villa Crespo",
    "La Paternal",
    "Villa del Parque",
    "Devoto",
    "Sáenz Peña",
    "Santos Lugares",
    "Caseros",
    "El Palomar",
    "Hurlingham",
    "W. C. Morris",
    "Bella Vista",
    "Muñiz",
    "San Miguel",
    "José C. Paz",
    "Sol y Verde",
    "Pte. Derqui",
    "Villa Astolfi",
    "Pilar",
    "Manzanares",
    "Dr. Cabred",
];

/// Travel direction of a timetable page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Canonical station order, Retiro first.
    ToCabred,
    /// Reversed station order, Dr. Cabred first.
    ToRetiro,
}

impl Direction {
    /// Derives the direction from a service label name. Labels that carry
    /// neither marker have no direction and their pages cannot be processed.
    pub fn from_label(label: &str) -> Option<Self> {
        if label.contains(TO_CABRED_MARKER) {
            Some(Self::ToCabred)
        } else if label.contains(TO_RETIRO_MARKER) {
            Some(Self::ToRetiro)
        } else {
            None
        }
    }

    /// Stem used in output filenames, e.g. `db_tren_destino_cabred.json`.
    pub fn file_stem(&self) -> &'static str {
        match self {
            Self::ToCabred => "cabred",
            Self::ToRetiro => "retiro",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ToCabred => TO_CABRED_MARKER,
            Self::ToRetiro => TO_RETIRO_MARKER,
        })
    }
}

/// Service variant of one document page, with its direction resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceLabel {
    pub name: String,
    pub direction: Direction,
}

/// On-disk configuration form: label names only, directions derived on load.
///
/// ```json
/// { "pages": { "0": "1-6_hacia_cabred" }, "stations": ["Retiro", "Palermo"] }
/// ```
#[derive(Debug, Deserialize)]
struct RawConfig {
    pages: HashMap<usize, String>,
    stations: Vec<String>,
}

/// Immutable extraction configuration: which page carries which service, and
/// the station column schema for each direction.
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    pages: HashMap<usize, ServiceLabel>,
    stations_to_cabred: Vec<String>,
    stations_to_retiro: Vec<String>,
}

impl ExtractorConfig {
    /// Builds a configuration from a page→label map and the canonical
    /// station sequence. Labels whose direction cannot be derived are
    /// dropped from the map with a warning; their pages are skipped at
    /// extraction time.
    pub fn new(
        pages: HashMap<usize, String>,
        stations: Vec<String>,
    ) -> Result<Self, ConfigError> {
        if stations.is_empty() {
            return Err(ConfigError::EmptyStations);
        }

        let mut labeled = HashMap::new();
        for (index, name) in pages {
            match Direction::from_label(&name) {
                Some(direction) => {
                    labeled.insert(index, ServiceLabel { name, direction });
                }
                None => {
                    tracing::warn!(
                        "Page {} dropped from mapping: label '{}' matches neither '{}' nor '{}'",
                        index,
                        name,
                        TO_CABRED_MARKER,
                        TO_RETIRO_MARKER
                    );
                }
            }
        }

        let stations_to_retiro: Vec<String> = stations.iter().rev().cloned().collect();

        Ok(Self {
            pages: labeled,
            stations_to_cabred: stations,
            stations_to_retiro,
        })
    }

    /// Built-in configuration for the San Martín line PDF.
    pub fn san_martin() -> Self {
        let pages = SAN_MARTIN_PAGES
            .iter()
            .map(|(index, name)| (*index, name.to_string()))
            .collect();
        let stations = SAN_MARTIN_STATIONS.iter().map(|s| s.to_string()).collect();
        Self::new(pages, stations).expect("built-in San Martin configuration is valid")
    }

    /// Loads a configuration from a JSON file (see [`RawConfig`] for the
    /// expected shape).
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let raw: RawConfig = serde_json::from_str(&contents)?;
        Self::new(raw.pages, raw.stations)
    }

    /// The service label for a page index, or `None` if the page is not in
    /// the mapping (or its label had no recognizable direction).
    pub fn label_for_page(&self, index: usize) -> Option<&ServiceLabel> {
        self.pages.get(&index)
    }

    /// Station column schema for one direction.
    pub fn stations(&self, direction: Direction) -> &[String] {
        match direction {
            Direction::ToCabred => &self.stations_to_cabred,
            Direction::ToRetiro => &self.stations_to_retiro,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stations(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn direction_derives_from_label_markers() {
        assert_eq!(
            Direction::from_label("1-6_hacia_cabred"),
            Some(Direction::ToCabred)
        );
        assert_eq!(
            Direction::from_label("7_hacia_retiro"),
            Some(Direction::ToRetiro)
        );
        assert_eq!(Direction::from_label("hoja_4_desconocida"), None);
    }

    #[test]
    fn unrecognized_labels_are_dropped_from_the_page_map() {
        let mut pages = HashMap::new();
        pages.insert(0, "1-6_hacia_cabred".to_string());
        pages.insert(1, "hoja_1_desconocida".to_string());

        let config = ExtractorConfig::new(pages, stations(&["Retiro", "Palermo"])).unwrap();

        assert!(config.label_for_page(0).is_some());
        assert!(config.label_for_page(1).is_none());
    }

    #[test]
    fn reverse_sequence_is_the_canonical_sequence_reversed() {
        let config = ExtractorConfig::san_martin();
        let forward = config.stations(Direction::ToCabred);
        let reverse = config.stations(Direction::ToRetiro);

        assert_eq!(forward.len(), reverse.len());
        let mut reversed_back: Vec<String> = reverse.to_vec();
        reversed_back.reverse();
        assert_eq!(forward, reversed_back.as_slice());

        assert_eq!(forward.first().map(String::as_str), Some("Retiro"));
        assert_eq!(reverse.first().map(String::as_str), Some("Dr. Cabred"));
    }

    #[test]
    fn san_martin_defaults_cover_four_pages_and_22_stations() {
        let config = ExtractorConfig::san_martin();
        assert_eq!(config.stations(Direction::ToCabred).len(), 22);
        for index in 0..4 {
            assert!(config.label_for_page(index).is_some(), "page {}", index);
        }
        assert!(config.label_for_page(4).is_none());
    }

    #[test]
    fn empty_station_list_is_rejected() {
        let err = ExtractorConfig::new(HashMap::new(), Vec::new()).unwrap_err();
        assert!(matches!(err, ConfigError::EmptyStations));
    }

    #[test]
    fn config_parses_from_json_form() {
        let json = r#"{
            "pages": { "0": "1-6_hacia_cabred", "1": "1-6_hacia_retiro" },
            "stations": ["Retiro", "Palermo", "Pilar"]
        }"#;
        let raw: RawConfig = serde_json::from_str(json).unwrap();
        let config = ExtractorConfig::new(raw.pages, raw.stations).unwrap();

        let label = config.label_for_page(1).unwrap();
        assert_eq!(label.name, "1-6_hacia_retiro");
        assert_eq!(label.direction, Direction::ToRetiro);
        assert_eq!(
            config.stations(Direction::ToRetiro),
            stations(&["Pilar", "Palermo", "Retiro"]).as_slice()
        );
    }
}
