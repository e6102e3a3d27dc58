// src/storage/mod.rs
use std::fs;
use std::path::{Path, PathBuf};

use crate::extractors::timetable::{DirectionalRecordSet, ExtractionStats};
use crate::utils::error::StorageError;

const SOURCE_PDF_FILENAME: &str = "horarios_san_martin.pdf";
const SUMMARY_FILENAME: &str = "extraction_summary.json";

pub struct StorageManager {
    base_dir: PathBuf,
}

impl StorageManager {
    /// Creates a new StorageManager with the specified base directory
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self, StorageError> {
        let base_path = base_dir.as_ref().to_path_buf();

        // Create the base directory if it doesn't exist
        if !base_path.exists() {
            fs::create_dir_all(&base_path).map_err(StorageError::IoError)?;
        }

        Ok(Self { base_dir: base_path })
    }

    /// Keeps a copy of the downloaded PDF next to the generated record files.
    pub fn save_source_pdf(&self, bytes: &[u8]) -> Result<PathBuf, StorageError> {
        let file_path = self.base_dir.join(SOURCE_PDF_FILENAME);
        fs::write(&file_path, bytes).map_err(StorageError::IoError)?;
        tracing::info!("Saved source PDF to {}", file_path.display());
        Ok(file_path)
    }

    /// Writes one direction's records as a JSON array of objects, fields
    /// named by the header. A direction with no rows produces no file at all
    /// rather than an empty one; `Ok(None)` reports the skip.
    pub fn save_record_set(
        &self,
        set: &DirectionalRecordSet,
    ) -> Result<Option<PathBuf>, StorageError> {
        if set.is_empty() {
            tracing::warn!(
                "No rows extracted for direction '{}'; skipping output file",
                set.direction
            );
            return Ok(None);
        }

        let filename = format!("db_tren_destino_{}.json", set.direction.file_stem());
        let file_path = self.base_dir.join(filename);

        let records = set.to_records();
        let json = serde_json::to_string_pretty(&records)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;

        fs::write(&file_path, json).map_err(StorageError::IoError)?;

        tracing::info!("Saved {} records to {}", set.len(), file_path.display());

        Ok(Some(file_path))
    }

    /// Writes the run summary: where the document came from, when the run
    /// happened, and the extraction counters.
    pub fn save_run_summary(
        &self,
        source: &str,
        stats: &ExtractionStats,
    ) -> Result<PathBuf, StorageError> {
        let file_path = self.base_dir.join(SUMMARY_FILENAME);

        let summary = serde_json::json!({
            "source": source,
            "generated_at": chrono::Utc::now().to_rfc3339(),
            "stats": stats,
        });

        let summary_str = serde_json::to_string_pretty(&summary)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;

        fs::write(&file_path, summary_str).map_err(StorageError::IoError)?;

        tracing::info!("Saved run summary to {}", file_path.display());

        Ok(file_path)
    }

    /// Dumps one page's raw extracted text under `debug/`, for inspecting
    /// what the tokenizer actually saw.
    pub fn save_page_text(&self, index: usize, text: &str) -> Result<PathBuf, StorageError> {
        let debug_dir = self.base_dir.join("debug");
        if !debug_dir.exists() {
            fs::create_dir_all(&debug_dir).map_err(StorageError::IoError)?;
        }

        let file_path = debug_dir.join(format!("page_{}.txt", index));
        fs::write(&file_path, text).map_err(StorageError::IoError)?;

        Ok(file_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Direction;
    use crate::extractors::timetable::DirectionalRecordSet;

    fn sample_set(with_row: bool) -> DirectionalRecordSet {
        let stations: Vec<String> = ["Retiro", "Palermo", "Pilar"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let mut set = DirectionalRecordSet::new(Direction::ToCabred, &stations);
        if with_row {
            set.rows.push(vec![
                "1-6_hacia_cabred".to_string(),
                "0301".to_string(),
                "04:40".to_string(),
                "04:49".to_string(),
                "--".to_string(),
            ]);
        }
        set
    }

    #[test]
    fn empty_record_set_produces_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let storage = StorageManager::new(dir.path()).unwrap();

        let saved = storage.save_record_set(&sample_set(false)).unwrap();

        assert!(saved.is_none());
        assert!(!dir.path().join("db_tren_destino_cabred.json").exists());
    }

    #[test]
    fn record_set_round_trips_through_json() {
        let dir = tempfile::tempdir().unwrap();
        let storage = StorageManager::new(dir.path()).unwrap();

        let path = storage
            .save_record_set(&sample_set(true))
            .unwrap()
            .expect("non-empty set should produce a file");
        assert!(path.ends_with("db_tren_destino_cabred.json"));

        let contents = fs::read_to_string(&path).unwrap();
        let records: Vec<serde_json::Map<String, serde_json::Value>> =
            serde_json::from_str(&contents).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(
            records[0].get("Tren_ID"),
            Some(&serde_json::Value::String("0301".to_string()))
        );
        // Key order is what the frontend derives station order from.
        let keys: Vec<&String> = records[0].keys().collect();
        assert_eq!(keys[0], "Servicio");
        assert_eq!(keys[2], "Retiro");
        assert_eq!(keys[4], "Pilar");
    }

    #[test]
    fn page_text_dumps_land_in_the_debug_directory() {
        let dir = tempfile::tempdir().unwrap();
        let storage = StorageManager::new(dir.path()).unwrap();

        let path = storage.save_page_text(2, "0301 04:40").unwrap();

        assert_eq!(path, dir.path().join("debug").join("page_2.txt"));
        assert_eq!(fs::read_to_string(path).unwrap(), "0301 04:40");
    }

    #[test]
    fn run_summary_embeds_the_counters() {
        let dir = tempfile::tempdir().unwrap();
        let storage = StorageManager::new(dir.path()).unwrap();

        let mut stats = ExtractionStats::default();
        stats.rows_accepted = 7;
        let path = storage.save_run_summary("local file", &stats).unwrap();

        let summary: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(summary["source"], "local file");
        assert_eq!(summary["stats"]["rows_accepted"], 7);
        assert!(summary["generated_at"].is_string());
    }
}
