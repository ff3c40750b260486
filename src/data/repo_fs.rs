//! Filesystem-backed reader for the historical CSV dataset.
//!
//! The format is a plain headered CSV without quoting: the cleaned training
//! exports never contain embedded commas.

use std::fs;
use std::path::Path;

use crate::common::error::{PredictError, PredictResult};
use crate::common::ids::Fingerprint;
use crate::features::derive::{
    AFFECTED_BODY_PARTS, EXPOSURE_TO_SICK_PEOPLE, RECENT_TRAVEL_HISTORY, SEVERITY_LEVEL,
    SLEEP_HOURS,
};
use crate::features::vocabulary::SYMPTOM_PREFIX;

use super::domain::{DataRepo, Dataset, HistoricalRecord, DISEASE};

/// Reads datasets straight from local files.
#[derive(Default)]
pub struct FsDataRepo;

impl FsDataRepo {
    pub fn new() -> Self {
        Self
    }
}

impl DataRepo for FsDataRepo {
    fn load_dataset(&self, path: &Path) -> PredictResult<Dataset> {
        let bytes = fs::read(path).map_err(|e| {
            PredictError::dataset(format!("cannot read {}: {e}", path.display()))
        })?;
        let text = String::from_utf8(bytes)
            .map_err(|_| PredictError::dataset(format!("{} is not valid UTF-8", path.display())))?;
        parse_csv(&text)
    }
}

struct Columns {
    severity: usize,
    body_part: usize,
    sleep_hours: usize,
    travel: usize,
    exposure: usize,
    disease: usize,
    symptoms: Vec<usize>,
}

impl Columns {
    fn locate(header: &[&str]) -> PredictResult<(Self, Vec<String>)> {
        let find = |name: &str| {
            header
                .iter()
                .position(|h| *h == name)
                .ok_or_else(|| PredictError::dataset(format!("missing column '{name}'")))
        };
        let mut symptoms = Vec::new();
        let mut ids = Vec::new();
        for (idx, h) in header.iter().enumerate() {
            if let Some(id) = h.strip_prefix(SYMPTOM_PREFIX) {
                if !id.is_empty() && !ids.iter().any(|known: &String| known == id) {
                    symptoms.push(idx);
                    ids.push(id.to_string());
                }
            }
        }
        let cols = Self {
            severity: find(SEVERITY_LEVEL)?,
            body_part: find(AFFECTED_BODY_PARTS)?,
            sleep_hours: find(SLEEP_HOURS)?,
            travel: find(RECENT_TRAVEL_HISTORY)?,
            exposure: find(EXPOSURE_TO_SICK_PEOPLE)?,
            disease: find(DISEASE)?,
            symptoms,
        };
        Ok((cols, ids))
    }
}

fn parse_flag(cell: &str, line: usize, column: &str) -> PredictResult<bool> {
    let cell = cell.trim();
    if cell.is_empty() {
        return Ok(false);
    }
    if let Ok(v) = cell.parse::<f64>() {
        return Ok(v != 0.0);
    }
    match cell.to_ascii_lowercase().as_str() {
        "true" | "yes" => Ok(true),
        "false" | "no" => Ok(false),
        _ => Err(PredictError::dataset(format!(
            "line {line}: column '{column}' has non-flag value '{cell}'"
        ))),
    }
}

/// Parse dataset text. Blank lines are skipped; ragged rows fail loudly.
pub fn parse_csv(text: &str) -> PredictResult<Dataset> {
    let mut fingerprint = Fingerprint::new();
    fingerprint.update(text.as_bytes());

    let mut lines = text
        .lines()
        .enumerate()
        .map(|(i, l)| (i + 1, l.trim_end_matches('\r')))
        .filter(|(_, l)| !l.trim().is_empty());

    let (_, header_line) = lines
        .next()
        .ok_or_else(|| PredictError::dataset("dataset is empty"))?;
    let header: Vec<&str> = header_line
        .trim_start_matches('\u{feff}')
        .split(',')
        .map(str::trim)
        .collect();
    let (cols, symptom_ids) = Columns::locate(&header)?;

    let mut records = Vec::new();
    for (line_no, line) in lines {
        let cells: Vec<&str> = line.split(',').collect();
        if cells.len() != header.len() {
            return Err(PredictError::dataset(format!(
                "line {line_no}: expected {} fields, found {}",
                header.len(),
                cells.len()
            )));
        }
        let sleep_raw = cells[cols.sleep_hours].trim();
        let sleep_hours = sleep_raw.parse::<f64>().map_err(|_| {
            PredictError::dataset(format!(
                "line {line_no}: '{SLEEP_HOURS}' is not numeric: '{sleep_raw}'"
            ))
        })?;
        let symptoms = cols
            .symptoms
            .iter()
            .map(|&idx| parse_flag(cells[idx], line_no, header[idx]))
            .collect::<PredictResult<Vec<_>>>()?;

        records.push(HistoricalRecord {
            severity: cells[cols.severity].trim().to_string(),
            body_part: cells[cols.body_part].trim().to_string(),
            sleep_hours,
            travel_history: cells[cols.travel].trim().to_string(),
            exposure: cells[cols.exposure].trim().to_string(),
            symptoms,
            disease: cells[cols.disease].trim().to_string(),
        });
    }

    Ok(Dataset {
        symptoms: symptom_ids,
        records,
        fingerprint: fingerprint.finish_hex(),
    })
}
