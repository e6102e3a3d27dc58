// src/extractors/timetable.rs

// --- Imports ---
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::config::{Direction, ExtractorConfig, ServiceLabel};

// --- Constants ---
// Column names ahead of the per-station columns. The generated JSON is read
// by the timetable frontend, which filters records on exactly these keys.
pub const SERVICE_COLUMN: &str = "Servicio";
pub const TRAIN_ID_COLUMN: &str = "Tren_ID";

// A line must carry more tokens than this to be considered a timetable row.
// Headers, footers and stray page furniture rarely clear the bar.
const MIN_ROW_TOKENS: usize = 5;

// --- Regex Patterns (Lazy Static) ---
// Token grammar of a timetable line: a 4-digit train number, an HH:MM time,
// or a "no service" run of dashes. Alternation order matters: the train
// number must be tried before the time so "0815" is one token.
static TOKEN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\d{4}|\d{2}:\d{2}|-{2,}").expect("Failed to compile TOKEN_RE")
});

static TRAIN_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}$").expect("Failed to compile TRAIN_ID_RE"));

// --- Tokenizer ---

/// Splits one line of page text into raw field tokens, scanned left to
/// right, non-overlapping. Lines with no matches yield an empty vec; an
/// unparseable line is not an error, it simply produces fewer tokens and is
/// weeded out by the row validator.
pub fn tokenize(line: &str) -> Vec<&str> {
    TOKEN_RE.find_iter(line).map(|m| m.as_str()).collect()
}

// --- Page Source Seam ---

/// Anything that can expose an ordered sequence of pages, each yielding its
/// text content or `None` when no text could be extracted.
pub trait PageSource {
    fn page_texts(&self) -> Vec<Option<String>>;
}

// Plain vectors act as a page source, mainly for tests.
impl PageSource for Vec<Option<String>> {
    fn page_texts(&self) -> Vec<Option<String>> {
        self.clone()
    }
}

// --- Data Structures ---

/// All accepted rows for one travel direction, sharing one station schema.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectionalRecordSet {
    pub direction: Direction,
    /// `["Servicio", "Tren_ID", <stations in direction order>...]`
    pub header: Vec<String>,
    /// Each row is `[label name, train id, one value per station]`.
    pub rows: Vec<Vec<String>>,
}

impl DirectionalRecordSet {
    pub fn new(direction: Direction, stations: &[String]) -> Self {
        let mut header = Vec::with_capacity(stations.len() + 2);
        header.push(SERVICE_COLUMN.to_string());
        header.push(TRAIN_ID_COLUMN.to_string());
        header.extend(stations.iter().cloned());
        Self {
            direction,
            header,
            rows: Vec::new(),
        }
    }

    fn push_row(&mut self, label: &ServiceLabel, tokens: &[&str]) {
        let mut row = Vec::with_capacity(tokens.len() + 1);
        row.push(label.name.clone());
        row.extend(tokens.iter().map(|t| t.to_string()));
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// One JSON object per row, fields named by the header in header order.
    pub fn to_records(&self) -> Vec<Map<String, Value>> {
        self.rows
            .iter()
            .map(|row| {
                self.header
                    .iter()
                    .cloned()
                    .zip(row.iter().map(|value| Value::String(value.clone())))
                    .collect()
            })
            .collect()
    }
}

/// Row acceptance/drop counts for one page.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct PageStats {
    pub page: usize,
    pub label: String,
    pub accepted: usize,
    /// Rows that looked like timetable entries but had the wrong column count.
    pub dropped: usize,
}

/// Diagnostic counters for one extraction run. Dropped rows never reach the
/// output, so these counts are the only trace of them.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct ExtractionStats {
    pub pages_processed: usize,
    pub pages_skipped: usize,
    pub pages_empty: usize,
    pub rows_accepted: usize,
    pub rows_dropped: usize,
    pub per_page: Vec<PageStats>,
}

/// Output of one extraction run: both directional record sets plus the
/// diagnostic counters.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub to_cabred: DirectionalRecordSet,
    pub to_retiro: DirectionalRecordSet,
    pub stats: ExtractionStats,
}

impl Extraction {
    pub fn record_sets(&self) -> [&DirectionalRecordSet; 2] {
        [&self.to_cabred, &self.to_retiro]
    }
}

// --- Main Extractor ---

pub struct TimetableExtractor {
    config: ExtractorConfig,
}

impl TimetableExtractor {
    pub fn new(config: ExtractorConfig) -> Self {
        Self { config }
    }

    /// Runs the extraction over every page of the source, in document order.
    ///
    /// A page with no configured service label, or with no extractable text,
    /// is skipped without aborting the run. A direction no page feeds simply
    /// ends up with an empty record set.
    pub fn extract(&self, source: &impl PageSource) -> Extraction {
        let mut to_cabred = DirectionalRecordSet::new(
            Direction::ToCabred,
            self.config.stations(Direction::ToCabred),
        );
        let mut to_retiro = DirectionalRecordSet::new(
            Direction::ToRetiro,
            self.config.stations(Direction::ToRetiro),
        );
        let mut stats = ExtractionStats::default();

        for (index, text) in source.page_texts().into_iter().enumerate() {
            let Some(label) = self.config.label_for_page(index) else {
                tracing::warn!("Page {} skipped: no service label configured", index);
                stats.pages_skipped += 1;
                continue;
            };

            let Some(text) = text else {
                tracing::debug!("Page {} ({}) has no extractable text", index, label.name);
                stats.pages_empty += 1;
                continue;
            };

            let stations = self.config.stations(label.direction);
            let target = match label.direction {
                Direction::ToCabred => &mut to_cabred,
                Direction::ToRetiro => &mut to_retiro,
            };

            let mut page_stats = PageStats {
                page: index,
                label: label.name.clone(),
                ..Default::default()
            };

            for line in text.lines() {
                Self::consume_line(label, stations, line, target, &mut page_stats);
            }

            tracing::info!(
                "Page {} ({}): {} rows accepted, {} dropped",
                index,
                label.name,
                page_stats.accepted,
                page_stats.dropped
            );
            stats.pages_processed += 1;
            stats.rows_accepted += page_stats.accepted;
            stats.rows_dropped += page_stats.dropped;
            stats.per_page.push(page_stats);
        }

        Extraction {
            to_cabred,
            to_retiro,
            stats,
        }
    }

    /// Validates one line's tokens against the direction's station schema and
    /// appends the row on an exact column-count match. Under- or
    /// over-populated rows are dropped wholesale rather than realigned; a
    /// misaligned row would silently attribute times to the wrong stations.
    fn consume_line(
        label: &ServiceLabel,
        stations: &[String],
        line: &str,
        target: &mut DirectionalRecordSet,
        page_stats: &mut PageStats,
    ) {
        let tokens = tokenize(line);

        // Cheap pre-filter: a timetable row starts with a train number and
        // carries per-station data. Everything else is page furniture.
        if tokens.len() <= MIN_ROW_TOKENS {
            return;
        }
        if !TRAIN_ID_RE.is_match(tokens[0]) {
            return;
        }

        // Train id + one value per station; the service label column is
        // prepended after validation and not counted here.
        let expected = stations.len() + 1;

        if tokens.len() == expected {
            target.push_row(label, &tokens);
            page_stats.accepted += 1;
        } else {
            tracing::debug!(
                "Page {}: dropped row '{}': {} tokens, expected {}",
                page_stats.page,
                tokens[0],
                tokens.len(),
                expected
            );
            page_stats.dropped += 1;
        }
    }
}
