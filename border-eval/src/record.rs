//! The scores file, a tab-separated log of evaluation results.
//!
//! The first line is a header with columns `steps`, `elapsed`, `mean`, `median`
//! and `stdev`, followed by the names of the statistics of the agent.
//! Each evaluation appends a [`ScoreRow`].
use crate::util::EvalResult;
use anyhow::Result;
use std::{
    fs::{File, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

/// Name of the scores file in the output directory.
pub const SCORES_FILE: &str = "scores.txt";

/// Columns preceding the statistics of the agent.
pub const BASE_COLUMNS: [&str; 5] = ["steps", "elapsed", "mean", "median", "stdev"];

/// Returns the path of the scores file in `outdir`.
pub fn scores_path(outdir: impl AsRef<Path>) -> PathBuf {
    outdir.as_ref().join(SCORES_FILE)
}

/// A row of the scores file.
#[derive(Debug, Clone)]
pub struct ScoreRow {
    /// Environment steps at the evaluation.
    pub step: usize,

    /// Seconds elapsed since the evaluator was created.
    pub elapsed: f64,

    /// Statistics of the evaluation episodes.
    pub result: EvalResult,

    /// Statistics of the agent.
    pub agent_stats: Vec<(String, f64)>,
}

impl ScoreRow {
    /// Returns the column names for an agent with the given statistics.
    pub fn header(agent_stats: &[(String, f64)]) -> Vec<String> {
        BASE_COLUMNS
            .iter()
            .map(|s| s.to_string())
            .chain(agent_stats.iter().map(|(name, _)| name.clone()))
            .collect()
    }

    /// Returns the string-ified values of the row.
    ///
    /// Floats are always rendered with a decimal point.
    pub fn values(&self) -> Vec<String> {
        let mut values = vec![
            self.step.to_string(),
            format!("{:?}", self.elapsed),
            format!("{:?}", self.result.mean),
            format!("{:?}", self.result.median),
            format!("{:?}", self.result.stdev),
        ];
        values.extend(self.agent_stats.iter().map(|(_, v)| format!("{:?}", v)));
        values
    }
}

/// Creates the scores file in `outdir`, truncating any existing one, and writes the header.
pub fn write_header(outdir: impl AsRef<Path>, agent_stats: &[(String, f64)]) -> Result<()> {
    let mut file = File::create(scores_path(outdir))?;
    writeln!(file, "{}", ScoreRow::header(agent_stats).join("\t"))?;
    Ok(())
}

/// Appends a tab-separated line of `values` to the scores file in `outdir`.
///
/// The file is created if it does not exist. Callers sharing the file among
/// threads need to serialize calls of this function.
pub fn record_stats(outdir: impl AsRef<Path>, values: &[String]) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(scores_path(outdir))?;
    writeln!(file, "{}", values.join("\t"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempdir::TempDir;

    fn agent_stats() -> Vec<(String, f64)> {
        vec![
            ("average_q".to_string(), 0.5),
            ("n_updates".to_string(), 12.0),
        ]
    }

    #[test]
    fn test_header_and_rows() -> Result<()> {
        let tmp_dir = TempDir::new("scores")?;
        write_header(tmp_dir.path(), &agent_stats())?;

        let row = ScoreRow {
            step: 100,
            elapsed: 1.5,
            result: EvalResult::from_scores(&[1.0, 3.0, 2.0]),
            agent_stats: agent_stats(),
        };
        record_stats(tmp_dir.path(), &row.values())?;
        record_stats(tmp_dir.path(), &row.values())?;

        let s = fs::read_to_string(scores_path(tmp_dir.path()))?;
        let lines = s.lines().collect::<Vec<_>>();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "steps\telapsed\tmean\tmedian\tstdev\taverage_q\tn_updates");
        assert_eq!(lines[1], "100\t1.5\t2.0\t2.0\t1.0\t0.5\t12.0");
        assert_eq!(lines[1], lines[2]);
        Ok(())
    }

    #[test]
    fn test_write_header_truncates() -> Result<()> {
        let tmp_dir = TempDir::new("scores")?;
        record_stats(tmp_dir.path(), &["stale".to_string()])?;
        write_header(tmp_dir.path(), &[])?;

        let s = fs::read_to_string(scores_path(tmp_dir.path()))?;
        assert_eq!(s, "steps\telapsed\tmean\tmedian\tstdev\n");
        Ok(())
    }
}
