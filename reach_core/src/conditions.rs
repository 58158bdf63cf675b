//! Condition table: loading, full-factorial construction, and expansion into
//! the trial order of a session.

use std::cmp::Ordering;
use std::fs::File;
use std::io;
use std::path::Path;

use glam::Vec2;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::ConditionError;

/// Column names, in table order
pub const COLUMNS: [&str; 14] = [
    "index",
    "start_X",
    "start_Y",
    "startradius",
    "target_X",
    "target_Y",
    "target_SX",
    "target_SY",
    "nDotsTarget",
    "cursor_SX",
    "cursor_SY",
    "nDotsCursor",
    "cursor_shift",
    "shift_threshold",
];

/// One parameterised trial configuration (pixel units)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionRow {
    /// Id of the condition before repetition and shuffling
    #[serde(default)]
    pub index: usize,
    #[serde(rename = "start_X")]
    pub start_x: f32,
    #[serde(rename = "start_Y")]
    pub start_y: f32,
    #[serde(rename = "startradius")]
    pub start_radius: f32,
    #[serde(rename = "target_X")]
    pub target_x: f32,
    #[serde(rename = "target_Y")]
    pub target_y: f32,
    #[serde(rename = "target_SX")]
    pub target_sx: f32,
    #[serde(rename = "target_SY")]
    pub target_sy: f32,
    #[serde(rename = "nDotsTarget")]
    pub n_dots_target: u32,
    #[serde(rename = "cursor_SX")]
    pub cursor_sx: f32,
    #[serde(rename = "cursor_SY")]
    pub cursor_sy: f32,
    #[serde(rename = "nDotsCursor")]
    pub n_dots_cursor: u32,
    pub cursor_shift: f32,
    pub shift_threshold: f32,
}

impl ConditionRow {
    pub fn start(&self) -> Vec2 {
        Vec2::new(self.start_x, self.start_y)
    }

    pub fn target(&self) -> Vec2 {
        Vec2::new(self.target_x, self.target_y)
    }

    pub fn target_size(&self) -> Vec2 {
        Vec2::new(self.target_sx, self.target_sy)
    }

    pub fn cursor_size(&self) -> Vec2 {
        Vec2::new(self.cursor_sx, self.cursor_sy)
    }

    /// Numeric value of a column, by table name
    pub fn column(&self, name: &str) -> Option<f64> {
        let v = match name {
            "index" => self.index as f64,
            "start_X" => self.start_x.into(),
            "start_Y" => self.start_y.into(),
            "startradius" => self.start_radius.into(),
            "target_X" => self.target_x.into(),
            "target_Y" => self.target_y.into(),
            "target_SX" => self.target_sx.into(),
            "target_SY" => self.target_sy.into(),
            "nDotsTarget" => self.n_dots_target.into(),
            "cursor_SX" => self.cursor_sx.into(),
            "cursor_SY" => self.cursor_sy.into(),
            "nDotsCursor" => self.n_dots_cursor.into(),
            "cursor_shift" => self.cursor_shift.into(),
            "shift_threshold" => self.shift_threshold.into(),
            _ => return None,
        };
        Some(v)
    }

    /// Values formatted for a CSV row, aligned with [`COLUMNS`]
    pub fn values(&self) -> Vec<String> {
        vec![
            self.index.to_string(),
            self.start_x.to_string(),
            self.start_y.to_string(),
            self.start_radius.to_string(),
            self.target_x.to_string(),
            self.target_y.to_string(),
            self.target_sx.to_string(),
            self.target_sy.to_string(),
            self.n_dots_target.to_string(),
            self.cursor_sx.to_string(),
            self.cursor_sy.to_string(),
            self.n_dots_cursor.to_string(),
            self.cursor_shift.to_string(),
            self.shift_threshold.to_string(),
        ]
    }

    pub fn validate(&self) -> Result<(), ConditionError> {
        if self.n_dots_target == 0 {
            return Err(ConditionError::NoDots {
                index: self.index,
                field: "nDotsTarget",
            });
        }
        if self.n_dots_cursor == 0 {
            return Err(ConditionError::NoDots {
                index: self.index,
                field: "nDotsCursor",
            });
        }

        let positive = [
            ("startradius", self.start_radius),
            ("target_SX", self.target_sx),
            ("target_SY", self.target_sy),
        ];
        let non_negative = [("cursor_SX", self.cursor_sx), ("cursor_SY", self.cursor_sy)];
        let finite = [
            ("start_X", self.start_x),
            ("start_Y", self.start_y),
            ("target_X", self.target_x),
            ("target_Y", self.target_y),
            ("cursor_shift", self.cursor_shift),
        ];
        let out_of_range = |(field, value): (&'static str, f32)| ConditionError::OutOfRange {
            index: self.index,
            field,
            value,
        };

        if let Some(&bad) = positive
            .iter()
            .find(|(_, v)| !(v.is_finite() && *v > 0.0))
        {
            return Err(out_of_range(bad));
        }
        if let Some(&bad) = non_negative
            .iter()
            .find(|(_, v)| !(v.is_finite() && *v >= 0.0))
        {
            return Err(out_of_range(bad));
        }
        if let Some(&bad) = finite.iter().find(|(_, v)| !v.is_finite()) {
            return Err(out_of_range(bad));
        }
        // An infinite threshold disables the shift
        if self.shift_threshold.is_nan() {
            return Err(out_of_range(("shift_threshold", self.shift_threshold)));
        }
        Ok(())
    }
}

/// Factor levels crossed into a full-factorial condition table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConditionGrid {
    pub start_x: Vec<f32>,
    pub start_y: Vec<f32>,
    pub start_radius: Vec<f32>,
    pub target_x: Vec<f32>,
    pub target_y: Vec<f32>,
    pub target_size: Vec<[f32; 2]>,
    pub n_dots_target: Vec<u32>,
    pub cursor_size: Vec<[f32; 2]>,
    pub n_dots_cursor: Vec<u32>,
    pub cursor_shift: Vec<f32>,
    pub shift_threshold: Vec<f32>,
}

impl Default for ConditionGrid {
    /// Solid 10 px target straight ahead, 200-dot cursor clouds of three
    /// shapes, shifted left, not at all, or right once past the start height.
    fn default() -> Self {
        Self {
            start_x: vec![0.0],
            start_y: vec![-240.0],
            start_radius: vec![10.0],
            target_x: vec![0.0],
            target_y: vec![240.0],
            target_size: vec![[10.0, 10.0]],
            n_dots_target: vec![1],
            cursor_size: vec![[50.0, 200.0], [100.0, 100.0], [200.0, 50.0]],
            n_dots_cursor: vec![200],
            cursor_shift: vec![-240.0, 0.0, 240.0],
            shift_threshold: vec![-240.0],
        }
    }
}

impl ConditionGrid {
    fn radices(&self) -> [usize; 11] {
        [
            self.start_x.len(),
            self.start_y.len(),
            self.start_radius.len(),
            self.target_x.len(),
            self.target_y.len(),
            self.target_size.len(),
            self.n_dots_target.len(),
            self.cursor_size.len(),
            self.n_dots_cursor.len(),
            self.cursor_shift.len(),
            self.shift_threshold.len(),
        ]
    }

    /// Number of rows `expand` yields (0 if any factor has no levels)
    pub fn len(&self) -> usize {
        self.radices().iter().product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cartesian product of all factors, last factor varying fastest.
    /// Rows are numbered by `index` in that order.
    pub fn expand(&self) -> Vec<ConditionRow> {
        let radices = self.radices();
        (0..self.len())
            .map(|index| {
                let mut digits = [0usize; 11];
                let mut rest = index;
                for (digit, &radix) in digits.iter_mut().zip(radices.iter()).rev() {
                    *digit = rest % radix;
                    rest /= radix;
                }
                let [sx, sy, sr, tx, ty, ts, nt, cs, nc, shift, thr] = digits;
                ConditionRow {
                    index,
                    start_x: self.start_x[sx],
                    start_y: self.start_y[sy],
                    start_radius: self.start_radius[sr],
                    target_x: self.target_x[tx],
                    target_y: self.target_y[ty],
                    target_sx: self.target_size[ts][0],
                    target_sy: self.target_size[ts][1],
                    n_dots_target: self.n_dots_target[nt],
                    cursor_sx: self.cursor_size[cs][0],
                    cursor_sy: self.cursor_size[cs][1],
                    n_dots_cursor: self.n_dots_cursor[nc],
                    cursor_shift: self.cursor_shift[shift],
                    shift_threshold: self.shift_threshold[thr],
                }
            })
            .collect()
    }
}

/// Read a condition table from CSV. Rows without an `index` column are
/// numbered in file order.
pub fn read_conditions<R: io::Read>(reader: R) -> Result<Vec<ConditionRow>, ConditionError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let has_index = rdr.headers()?.iter().any(|h| h == "index");

    let mut rows = Vec::new();
    for (i, record) in rdr.deserialize::<ConditionRow>().enumerate() {
        let mut row = record?;
        if !has_index {
            row.index = i;
        }
        row.validate()?;
        rows.push(row);
    }
    Ok(rows)
}

pub fn load_conditions(path: impl AsRef<Path>) -> Result<Vec<ConditionRow>, ConditionError> {
    read_conditions(File::open(path)?)
}

/// Write a condition table as CSV with the standard column names
pub fn write_conditions<W: io::Write>(
    rows: &[ConditionRow],
    writer: W,
) -> Result<(), ConditionError> {
    let mut wtr = csv::Writer::from_writer(writer);
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Order of the repeated condition table
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrialOrder {
    /// Repetitions back to back, as listed
    AsListed,
    /// Random permutation of all rows
    Shuffled,
    /// Rows grouped by a column (ascending), shuffled inside each group
    ShuffledWithin(String),
    /// Stable sort by a column
    SortedBy(String),
}

impl TrialOrder {
    pub fn from_flags(shuffle: bool, grouping: Option<&str>) -> Self {
        match (shuffle, grouping) {
            (true, None) => TrialOrder::Shuffled,
            (true, Some(col)) => TrialOrder::ShuffledWithin(col.to_string()),
            (false, Some(col)) => TrialOrder::SortedBy(col.to_string()),
            (false, None) => TrialOrder::AsListed,
        }
    }
}

fn check_column(name: &str) -> Result<(), ConditionError> {
    if COLUMNS.contains(&name) {
        Ok(())
    } else {
        Err(ConditionError::UnknownColumn(name.to_string()))
    }
}

fn sort_by_column(rows: &mut [ConditionRow], name: &str) {
    let key = |row: &ConditionRow| row.column(name).unwrap_or(f64::NAN);
    rows.sort_by(|a, b| key(a).total_cmp(&key(b)));
}

/// Repeat the table `reps` times and put it in session order
pub fn repeat_and_shuffle<R: Rng + ?Sized>(
    rows: &[ConditionRow],
    reps: usize,
    order: &TrialOrder,
    rng: &mut R,
) -> Result<Vec<ConditionRow>, ConditionError> {
    let mut out: Vec<ConditionRow> = Vec::with_capacity(rows.len() * reps);
    for _ in 0..reps {
        out.extend_from_slice(rows);
    }

    match order {
        TrialOrder::AsListed => {}
        TrialOrder::Shuffled => out.shuffle(rng),
        TrialOrder::SortedBy(col) => {
            check_column(col)?;
            sort_by_column(&mut out, col);
        }
        TrialOrder::ShuffledWithin(col) => {
            check_column(col)?;
            sort_by_column(&mut out, col);
            let mut start = 0;
            while start < out.len() {
                let key = out[start].column(col);
                let mut end = start + 1;
                while end < out.len()
                    && out[end].column(col).partial_cmp(&key) == Some(Ordering::Equal)
                {
                    end += 1;
                }
                out[start..end].shuffle(rng);
                start = end;
            }
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ExperimentRng;

    const CSV: &str = "\
start_X,start_Y,startradius,target_X,target_Y,target_SX,target_SY,nDotsTarget,cursor_SX,cursor_SY,nDotsCursor,cursor_shift,shift_threshold
0,-240,10,0,240,10,10,1,50,200,200,240,-240
0,-240,10,0,240,10,10,1,100,100,200,0,-240
";

    #[test]
    fn test_default_grid_matches_session_design() {
        let grid = ConditionGrid::default();
        let rows = grid.expand();
        assert_eq!(rows.len(), 9);
        assert_eq!(grid.len(), 9);
        // Shift varies fastest, cursor size next
        assert_eq!(rows[0].cursor_size(), Vec2::new(50.0, 200.0));
        assert_eq!(rows[0].cursor_shift, -240.0);
        assert_eq!(rows[1].cursor_shift, 0.0);
        assert_eq!(rows[3].cursor_size(), Vec2::new(100.0, 100.0));
        assert_eq!(rows[8].cursor_size(), Vec2::new(200.0, 50.0));
        assert_eq!(rows[8].cursor_shift, 240.0);
        assert!(rows.iter().enumerate().all(|(i, r)| r.index == i));
    }

    #[test]
    fn test_empty_factor_gives_empty_grid() {
        let grid = ConditionGrid {
            cursor_shift: vec![],
            ..ConditionGrid::default()
        };
        assert!(grid.is_empty());
        assert!(grid.expand().is_empty());
    }

    #[test]
    fn test_read_conditions_assigns_index() {
        let rows = read_conditions(CSV.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].index, 0);
        assert_eq!(rows[1].index, 1);
        assert_eq!(rows[0].n_dots_cursor, 200);
        assert_eq!(rows[0].cursor_shift, 240.0);
        assert_eq!(rows[1].cursor_sx, 100.0);
        assert_eq!(rows[0].start(), Vec2::new(0.0, -240.0));
    }

    #[test]
    fn test_read_rejects_zero_dots() {
        let csv = CSV.replace(",1,50,", ",0,50,");
        let err = read_conditions(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, ConditionError::NoDots { field: "nDotsTarget", .. }));
    }

    #[test]
    fn test_validate_rejects_degenerate_geometry() {
        let base = ConditionGrid::default().expand().remove(4);
        assert!(base.validate().is_ok());

        let cases: [fn(&mut ConditionRow); 7] = [
            |r| r.cursor_sx = -5.0,
            |r| r.cursor_sy = f32::NAN,
            |r| r.target_sx = 0.0,
            |r| r.target_sy = f32::INFINITY,
            |r| r.start_radius = 0.0,
            |r| r.target_y = f32::NAN,
            |r| r.shift_threshold = f32::NAN,
        ];
        for corrupt in cases {
            let mut row = base.clone();
            corrupt(&mut row);
            assert!(
                matches!(row.validate(), Err(ConditionError::OutOfRange { index: 4, .. })),
                "{row:?} should be rejected"
            );
        }

        // A zero-spread cloud stacks its dots on the cursor
        let mut stacked = base.clone();
        stacked.cursor_sx = 0.0;
        stacked.cursor_sy = 0.0;
        assert!(stacked.validate().is_ok());
        let mut never_shift = base;
        never_shift.shift_threshold = f32::INFINITY;
        assert!(never_shift.validate().is_ok());
    }

    #[test]
    fn test_read_rejects_negative_sigma() {
        let csv = CSV.replace(",100,100,", ",-100,100,");
        let err = read_conditions(csv.as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            ConditionError::OutOfRange { index: 1, field: "cursor_SX", value } if value == -100.0
        ));
    }

    #[test]
    fn test_write_then_read_keeps_index() {
        let rows = ConditionGrid::default().expand();
        let mut buf = Vec::new();
        write_conditions(&rows[3..5], &mut buf).unwrap();
        let text = String::from_utf8(buf.clone()).unwrap();
        assert!(text.starts_with(&COLUMNS.join(",")), "Header uses column names");
        let back = read_conditions(buf.as_slice()).unwrap();
        assert_eq!(back[0].index, 3);
        assert_eq!(back[1].index, 4);
    }

    #[test]
    fn test_repeat_and_shuffle_keeps_each_row_reps_times() {
        let rows = ConditionGrid::default().expand();
        let mut rng = ExperimentRng::new(9);
        let out = repeat_and_shuffle(&rows, 5, &TrialOrder::Shuffled, &mut rng.0).unwrap();
        assert_eq!(out.len(), 5 * rows.len());
        for row in &rows {
            let count = out.iter().filter(|r| *r == row).count();
            assert_eq!(count, 5, "Row {} appears five times", row.index);
        }
        let listed = repeat_and_shuffle(&rows, 5, &TrialOrder::AsListed, &mut rng.0).unwrap();
        assert_ne!(out, listed, "Shuffled order differs from listed order");
    }

    #[test]
    fn test_shuffle_within_group_keeps_groups_together() {
        let rows = ConditionGrid::default().expand();
        let mut rng = ExperimentRng::new(10);
        let order = TrialOrder::ShuffledWithin("cursor_shift".to_string());
        let out = repeat_and_shuffle(&rows, 4, &order, &mut rng.0).unwrap();
        assert_eq!(out.len(), 36);

        let shifts: Vec<f32> = out.iter().map(|r| r.cursor_shift).collect();
        assert!(shifts[..12].iter().all(|&s| s == -240.0));
        assert!(shifts[12..24].iter().all(|&s| s == 0.0));
        assert!(shifts[24..].iter().all(|&s| s == 240.0));
        for row in &rows {
            assert_eq!(out.iter().filter(|r| *r == row).count(), 4);
        }
    }

    #[test]
    fn test_sorted_by_is_stable() {
        let rows = ConditionGrid::default().expand();
        let mut rng = ExperimentRng::new(11);
        let order = TrialOrder::SortedBy("cursor_shift".to_string());
        let out = repeat_and_shuffle(&rows, 2, &order, &mut rng.0).unwrap();
        let first_group: Vec<usize> = out[..6].iter().map(|r| r.index).collect();
        assert_eq!(first_group, vec![0, 3, 6, 0, 3, 6]);
    }

    #[test]
    fn test_unknown_grouping_column() {
        let rows = ConditionGrid::default().expand();
        let mut rng = ExperimentRng::new(12);
        let order = TrialOrder::from_flags(true, Some("colour"));
        let err = repeat_and_shuffle(&rows, 1, &order, &mut rng.0).unwrap_err();
        assert!(matches!(err, ConditionError::UnknownColumn(c) if c == "colour"));
    }
}
