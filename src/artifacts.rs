use anyhow::{Context, Result};
use log::info;
use serde::Serialize;
use std::fs;
use std::path::PathBuf;

use crate::email::ClassificationRecord;

pub const INPUTS_FILE: &str = "inputs.json";
pub const RECORDS_FILE: &str = "cleaned_classifications.json";
pub const CSV_FILE: &str = "classifications.csv";

/// Writes the run artifacts into the data directory.
pub struct ArtifactWriter {
    dir: PathBuf,
}

impl ArtifactWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Unable to create data directory {}", dir.display()))?;
        Ok(ArtifactWriter { dir })
    }

    /// Backend inputs exactly as sent, as a JSON array of strings.
    pub fn write_inputs(&self, inputs: &[String]) -> Result<PathBuf> {
        self.write_json(INPUTS_FILE, inputs)
    }

    pub fn write_records(&self, records: &[ClassificationRecord]) -> Result<PathBuf> {
        self.write_json(RECORDS_FILE, records)
    }

    pub fn write_csv(&self, records: &[ClassificationRecord]) -> Result<PathBuf> {
        let path = self.dir.join(CSV_FILE);
        let mut writer = csv::Writer::from_path(&path)
            .with_context(|| format!("Unable to create {}", path.display()))?;

        for record in records {
            writer.serialize(record).context("Unable to write CSV row")?;
        }
        writer.flush().context("Unable to flush CSV file")?;

        info!("💾 {} record(s) exported to {}", records.len(), path.display());
        Ok(path)
    }

    /// All three artifacts for one batch.
    pub fn write_all(&self, inputs: &[String], records: &[ClassificationRecord]) -> Result<()> {
        self.write_inputs(inputs)?;
        self.write_records(records)?;
        self.write_csv(records)?;
        Ok(())
    }

    fn write_json<T: Serialize + ?Sized>(&self, name: &str, value: &T) -> Result<PathBuf> {
        let path = self.dir.join(name);
        let json = serde_json::to_string_pretty(value).context("Unable to serialize artifact")?;
        fs::write(&path, json).with_context(|| format!("Unable to write {}", path.display()))?;

        info!("💾 Saved {}", path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{ClassificationResult, StatusLabel};
    use crate::email::RawMessage;

    fn records() -> Vec<ClassificationRecord> {
        vec![
            ClassificationRecord::new(
                &RawMessage::new("m1", "Interview with Globex", "", ""),
                ClassificationResult::backend(StatusLabel::Interview, Some(0.9)),
                "Globex".to_string(),
            ),
            ClassificationRecord::new(
                &RawMessage::new("m2", "Thanks", "", ""),
                ClassificationResult::fallback(StatusLabel::ApplicationReceived),
                "Unknown".to_string(),
            ),
        ]
    }

    #[test]
    fn test_records_json_fields() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ArtifactWriter::new(dir.path()).unwrap();

        let path = writer.write_records(&records()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();

        let first = value[0].as_object().unwrap();
        let mut keys: Vec<&str> = first.keys().map(String::as_str).collect();
        keys.sort();
        assert_eq!(keys, vec!["classification", "company", "confidence", "email_id", "subject"]);
        assert_eq!(value[1]["classification"], "Application Received");
        assert!(value[1]["confidence"].is_null());
    }

    #[test]
    fn test_inputs_json_is_string_array() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ArtifactWriter::new(dir.path().join("nested")).unwrap();

        let path = writer.write_inputs(&["a".to_string(), "b".to_string()]).unwrap();
        let inputs: Vec<String> = serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(inputs, vec!["a", "b"]);
    }

    #[test]
    fn test_csv_export() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ArtifactWriter::new(dir.path()).unwrap();

        let path = writer.write_csv(&records()).unwrap();
        let content = fs::read_to_string(path).unwrap();
        let lines: Vec<&str> = content.lines().collect();

        assert_eq!(lines[0], "email_id,subject,classification,confidence,company");
        assert_eq!(lines[1], "m1,Interview with Globex,Interview,0.9,Globex");
        assert_eq!(lines[2], "m2,Thanks,Application Received,,Unknown");
    }
}
