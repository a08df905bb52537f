use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use stroop_core::TrialResult;
use stroop_experiment::{SessionSummary, save_trial_log, summarize};
use stroop_render::{BoxPlot, ChartFont, render_box_plot, save_png};
use tracing::info;

/// Files written for one completed session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub trial_log: PathBuf,
    pub chart: PathBuf,
    pub summary: PathBuf,
}

impl ArtifactPaths {
    pub fn new(dir: &Path, subject: &str, timestamp: &str) -> Self {
        let stem = format!("{}_{timestamp}", file_safe(subject));
        Self {
            trial_log: dir.join(format!("{stem}_stroop.csv")),
            chart: dir.join(format!("{stem}_stroop.png")),
            summary: dir.join(format!("{stem}_summary.json")),
        }
    }

    /// Paths stamped with the local time.
    pub fn now(dir: &Path, subject: &str) -> Self {
        let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S").to_string();
        Self::new(dir, subject, &timestamp)
    }
}

/// Keeps letters, digits, `-` and `_`; anything else becomes `_`.
fn file_safe(subject: &str) -> String {
    let cleaned: String = subject
        .trim()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "anonymous".to_string()
    } else {
        cleaned
    }
}

pub fn write_chart(
    path: &Path,
    title: &str,
    trials: &[TrialResult],
    font: Option<ChartFont>,
) -> Result<()> {
    let plot = BoxPlot::from_trials(title, trials);
    let pixmap = render_box_plot(&plot, font)?;
    save_png(path, &pixmap)
}

/// Writes the trial log, summary and chart of a finished session.
pub fn write_artifacts(
    paths: &ArtifactPaths,
    subject: &str,
    trials: &[TrialResult],
    font: Option<ChartFont>,
) -> Result<SessionSummary> {
    save_trial_log(&paths.trial_log, trials)
        .with_context(|| format!("saving trial log {}", paths.trial_log.display()))?;

    let summary = summarize(trials);
    let json = summary.to_json()?;
    fs::write(&paths.summary, json)
        .with_context(|| format!("writing summary {}", paths.summary.display()))?;
    info!(path = %paths.summary.display(), "summary written");

    write_chart(&paths.chart, &format!("Stroop reaction times: {subject}"), trials, font)?;
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use stroop_core::BlockKind;
    use stroop_experiment::load_trial_log;

    fn trial(block: BlockKind, correct: bool, rt: f64) -> TrialResult {
        TrialResult {
            block,
            target: "BLUE".to_string(),
            response: if correct { "BLUE" } else { "RED" }.to_string(),
            correct,
            reaction_time: rt,
        }
    }

    #[test]
    fn names_carry_subject_and_timestamp() {
        let paths = ArtifactPaths::new(Path::new("out"), "s 01/x", "20260101_120000");
        assert_eq!(paths.trial_log, Path::new("out/s_01_x_20260101_120000_stroop.csv"));
        assert_eq!(paths.chart, Path::new("out/s_01_x_20260101_120000_stroop.png"));
        assert_eq!(paths.summary, Path::new("out/s_01_x_20260101_120000_summary.json"));
        assert_eq!(file_safe("  "), "anonymous");
    }

    #[test]
    fn completed_session_leaves_three_files() {
        let dir = tempfile::tempdir().unwrap();
        let paths = ArtifactPaths::new(dir.path(), "s01", "t");
        let trials = vec![
            trial(BlockKind::TextCongruent, true, 0.45),
            trial(BlockKind::TextIncongruent, false, 0.8),
            trial(BlockKind::SwatchCongruent, true, 0.5),
        ];

        let summary = write_artifacts(&paths, "s01", &trials, None).unwrap();
        assert_eq!(summary.trials, 3);
        assert_eq!(summary.correct, 2);
        assert_eq!(load_trial_log(&paths.trial_log).unwrap(), trials);
        assert!(paths.chart.exists());
        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&paths.summary).unwrap()).unwrap();
        assert_eq!(json["trials"], 3);
    }
}
