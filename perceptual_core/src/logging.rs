use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;

use crate::objective::{LayerPenalty, PenaltyReport};

pub const PENALTY_LOG_PATH: &str = "logs/penalties.jsonl";

fn ensure_parent(path: &Path) -> io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent),
        _ => Ok(()),
    }
}

fn append_json_line<P: AsRef<Path>, T: Serialize>(path: P, value: &T) -> io::Result<()> {
    ensure_parent(path.as_ref())?;
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    serde_json::to_writer(&mut file, value)
        .map_err(|err| io::Error::new(io::ErrorKind::Other, err))?;
    file.write_all(b"\n")
}

#[derive(Debug, Serialize)]
pub struct PenaltyLogEntry<'a> {
    pub iteration: usize,
    pub loss: f32,
    pub penalties: &'a [LayerPenalty],
    pub total: f32,
    pub timestamp_ms: u128,
}

/// Appends one step's report to `logs/penalties.jsonl`.
pub fn log_penalty_report(iteration: usize, report: &PenaltyReport) -> io::Result<()> {
    log_penalty_report_to(PENALTY_LOG_PATH, iteration, report)
}

pub fn log_penalty_report_to<P: AsRef<Path>>(
    path: P,
    iteration: usize,
    report: &PenaltyReport,
) -> io::Result<()> {
    let entry = PenaltyLogEntry {
        iteration,
        loss: report.loss,
        penalties: &report.penalties,
        total: report.total,
        timestamp_ms: SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis(),
    };
    append_json_line(path, &entry)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appends_one_line_per_report() {
        let path = std::env::temp_dir()
            .join(format!("perceptual-core-log-{}", std::process::id()))
            .join("penalties.jsonl");
        let _ = fs::remove_file(&path);

        let report = PenaltyReport {
            loss: 0.0,
            penalties: vec![LayerPenalty {
                layer: "vgg".to_string(),
                regularizer: "ContentVGGRegularizer",
                penalty: 1.5,
            }],
            total: 1.5,
        };
        log_penalty_report_to(&path, 0, &report).unwrap();
        log_penalty_report_to(&path, 1, &report).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);

        let entry: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(entry["iteration"], 1);
        assert_eq!(entry["penalties"][0]["layer"], "vgg");
        assert_eq!(entry["total"], 1.5);

        let _ = fs::remove_file(&path);
    }
}
