use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::info;

use crate::error::{PipelineError, Result};
use crate::records::FilmRecord;

pub const FILM_COLUMNS: [&str; 5] = ["id", "film", "year", "awards", "nominations"];

/// Write one CSV line per record under a fixed header. Overwrites `path`.
pub fn to_csv(records: &[FilmRecord], path: &Path) -> Result<()> {
    create_data_folder(path)?;
    let err = |e: csv::Error| PipelineError::export(path, e);

    let mut w = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(err)?;
    w.write_record(FILM_COLUMNS).map_err(err)?;
    for r in records {
        w.serialize(r).map_err(err)?;
    }
    w.flush().map_err(|e| PipelineError::export(path, e))?;

    info!("Data exported to {:?} ({} rows)", path, records.len());
    Ok(())
}

/// Write a pretty-printed JSON array. Ids are rendered as strings.
pub fn to_json(records: &[FilmRecord], path: &Path) -> Result<()> {
    create_data_folder(path)?;
    let file = File::create(path).map_err(|e| PipelineError::export(path, e))?;
    let mut w = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut w, records).map_err(|e| PipelineError::export(path, e))?;
    w.flush().map_err(|e| PipelineError::export(path, e))?;

    info!("Data exported to {:?} ({} records)", path, records.len());
    Ok(())
}

fn create_data_folder(path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() && !dir.exists() {
            std::fs::create_dir_all(dir).map_err(|e| PipelineError::export(dir, e))?;
            info!("Created directory: {:?}", dir);
        }
    }
    Ok(())
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use super::*;

    fn sample() -> Vec<FilmRecord> {
        vec![
            FilmRecord::new("Oppenheimer", Some(2023), Some(7), Some(13)),
            FilmRecord::new("Wings, the \"silent\" one", None, Some(2), None),
        ]
    }

    #[test]
    fn csv_has_header_and_one_line_per_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("output.csv");
        let records = sample();
        to_csv(&records, &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "id,film,year,awards,nominations");
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], format!("{},Oppenheimer,2023,7,13", records[0].id));
        assert_eq!(
            lines[2],
            format!("{},\"Wings, the \"\"silent\"\" one\",,2,", records[1].id)
        );
    }

    #[test]
    fn csv_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output.csv");
        to_csv(&sample(), &path).unwrap();
        to_csv(&sample()[..1], &path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 2);
    }

    #[test]
    fn csv_with_no_records_still_has_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.csv");
        to_csv(&[], &path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.trim_end(), "id,film,year,awards,nominations");
    }

    #[test]
    fn json_ids_are_strings_and_fields_ordered() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("output.json");
        let records = sample();
        to_json(&records, &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("[\n  {\n    \"id\": "));

        let parsed: Value = serde_json::from_str(&text).unwrap();
        let arr = parsed.as_array().unwrap();
        assert_eq!(arr.len(), 2);
        for (obj, rec) in arr.iter().zip(&records) {
            assert_eq!(obj["id"], Value::String(rec.id.to_string()));
            assert_eq!(obj["film"], Value::String(rec.title.clone()));
        }
        assert_eq!(arr[1]["year"], Value::Null);

        assert_eq!(arr[0].as_object().unwrap().len(), 5);
        let pos = |k: &str| text.find(&format!("\"{}\"", k)).unwrap();
        assert!(pos("id") < pos("film"));
        assert!(pos("film") < pos("year"));
        assert!(pos("year") < pos("awards"));
        assert!(pos("awards") < pos("nominations"));
    }

    #[test]
    fn json_round_trips_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output.json");
        let records = sample();
        to_json(&records, &path).unwrap();
        let back: Vec<FilmRecord> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(back, records);
    }
}
