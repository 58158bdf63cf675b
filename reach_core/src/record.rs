//! Per-trial trajectory records and where they go

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use crate::conditions::{ConditionRow, COLUMNS};
use crate::error::RecordError;

/// Header of the trajectory block in a trial file
pub const SAMPLE_COLUMNS: [&str; 5] = ["time", "frame_nr", "cursor_x", "cursor_y", "shift_applied"];

/// One recorded frame of the reach
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub time: f64, // Seconds since the start click
    pub frame: u32,
    pub cursor_x: f32,
    pub cursor_y: f32,
    pub shift_applied: bool,
}

impl Sample {
    pub fn values(&self) -> [String; 5] {
        [
            self.time.to_string(),
            self.frame.to_string(),
            self.cursor_x.to_string(),
            self.cursor_y.to_string(),
            u8::from(self.shift_applied).to_string(),
        ]
    }
}

/// Everything persisted about one finished trial
#[derive(Debug, Clone, PartialEq)]
pub struct TrialRecord {
    pub participant: String,
    pub trial: usize,
    pub condition: ConditionRow,
    pub score: i32,
    pub samples: Vec<Sample>,
}

impl TrialRecord {
    /// Movement time: timestamp of the last sample
    pub fn movement_time(&self) -> f64 {
        self.samples.last().map_or(0.0, |s| s.time)
    }
}

/// Destination for finished trials
pub trait RecordSink {
    fn persist(&mut self, record: &TrialRecord) -> Result<(), RecordError>;
}

/// Keeps records in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    pub records: Vec<TrialRecord>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordSink for MemorySink {
    fn persist(&mut self, record: &TrialRecord) -> Result<(), RecordError> {
        self.records.push(record.clone());
        Ok(())
    }
}

impl<S: RecordSink + ?Sized> RecordSink for &mut S {
    fn persist(&mut self, record: &TrialRecord) -> Result<(), RecordError> {
        (**self).persist(record)
    }
}

/// Writes one CSV file per trial into a participant folder:
/// condition header and row (plus `trial_score`), the sample header, then one
/// row per recorded frame.
#[derive(Debug, Clone)]
pub struct CsvTrialWriter {
    data_dir: PathBuf,
}

impl CsvTrialWriter {
    /// Creates the directory if needed
    pub fn new(data_dir: impl Into<PathBuf>) -> Result<Self, RecordError> {
        let data_dir = data_dir.into();
        fs::create_dir_all(&data_dir)?;
        Ok(Self { data_dir })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn file_name(participant: &str, trial: usize) -> String {
        format!("participant_{participant}_trial_{trial}_trajectory.csv")
    }

    pub fn path_for(&self, record: &TrialRecord) -> PathBuf {
        self.data_dir
            .join(Self::file_name(&record.participant, record.trial))
    }
}

impl RecordSink for CsvTrialWriter {
    fn persist(&mut self, record: &TrialRecord) -> Result<(), RecordError> {
        // One file per trial; a retried trial replaces a partial block
        let file = File::create(self.path_for(record))?;
        let mut wtr = csv::WriterBuilder::new().flexible(true).from_writer(file);

        let mut header: Vec<&str> = COLUMNS.to_vec();
        header.push("trial_score");
        wtr.write_record(&header)?;

        let mut row = record.condition.values();
        row.push(record.score.to_string());
        wtr.write_record(&row)?;

        wtr.write_record(SAMPLE_COLUMNS)?;
        for sample in &record.samples {
            wtr.write_record(sample.values())?;
        }
        wtr.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conditions::ConditionGrid;

    fn record() -> TrialRecord {
        TrialRecord {
            participant: "p01".to_string(),
            trial: 3,
            condition: ConditionGrid::default().expand()[2].clone(),
            score: 82,
            samples: vec![
                Sample {
                    time: 0.0,
                    frame: 1,
                    cursor_x: 0.0,
                    cursor_y: -240.0,
                    shift_applied: false,
                },
                Sample {
                    time: 0.5,
                    frame: 2,
                    cursor_x: 240.0,
                    cursor_y: -200.0,
                    shift_applied: true,
                },
            ],
        }
    }

    #[test]
    fn test_csv_trial_layout() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = CsvTrialWriter::new(dir.path().join("p01")).unwrap();
        let record = record();
        writer.persist(&record).unwrap();

        let path = writer.path_for(&record);
        assert!(path.ends_with("participant_p01_trial_3_trajectory.csv"));
        let text = std::fs::read_to_string(path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 5);
        assert!(lines[0].starts_with("index,start_X,"));
        assert!(lines[0].ends_with(",shift_threshold,trial_score"));
        assert_eq!(lines[1], "2,0,-240,10,0,240,10,10,1,50,200,200,240,-240,82");
        assert_eq!(lines[2], "time,frame_nr,cursor_x,cursor_y,shift_applied");
        assert_eq!(lines[3], "0,1,0,-240,0");
        assert_eq!(lines[4], "0.5,2,240,-200,1");
    }

    #[test]
    fn test_persisting_again_replaces_the_block() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = CsvTrialWriter::new(dir.path()).unwrap();
        let mut record = record();
        let path = writer.path_for(&record);

        // A leftover from an interrupted write
        std::fs::write(&path, "index,start_X\n2,0\ntime,frame_nr\n0,1").unwrap();
        writer.persist(&record).unwrap();
        record.score = 90;
        writer.persist(&record).unwrap();

        let text = std::fs::read_to_string(path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 5);
        assert_eq!(lines.iter().filter(|l| l.starts_with("index,")).count(), 1);
        assert!(lines[1].ends_with(",90"));
        assert_eq!(lines[4], "0.5,2,240,-200,1");
    }

    #[test]
    fn test_unwritable_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = CsvTrialWriter::new(dir.path()).unwrap();
        std::fs::remove_dir_all(dir.path()).unwrap();
        assert!(writer.persist(&record()).is_err());
    }

    #[test]
    fn test_memory_sink_keeps_order() {
        let mut sink = MemorySink::new();
        let mut r = record();
        sink.persist(&r).unwrap();
        r.trial = 4;
        sink.persist(&r).unwrap();
        assert_eq!(sink.records.len(), 2);
        assert_eq!(sink.records[1].trial, 4);
        assert_eq!(sink.records[0].movement_time(), 0.5);
    }
}
