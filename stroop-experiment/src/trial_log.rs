//! Comma-separated trial log: one row per trial result, correct or not.

use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use stroop_core::{BlockKind, TrialResult};
use thiserror::Error;
use tracing::info;

pub const HEADER: [&str; 5] = [
    "trial_type",
    "word_or_color",
    "response",
    "correct",
    "reaction_time",
];

#[derive(Debug, Error)]
pub enum LogError {
    #[error("trial log I/O: {0}")]
    Io(#[from] io::Error),
    #[error("trial log line {line}: {message}")]
    Parse { line: usize, message: String },
    #[error("trial log header {0:?} does not match the expected columns")]
    Header(String),
}

fn parse_error(line: usize, message: impl Into<String>) -> LogError {
    LogError::Parse {
        line,
        message: message.into(),
    }
}

fn escape(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

pub fn write_trial_log<W: Write>(writer: W, trials: &[TrialResult]) -> Result<(), LogError> {
    let mut out = BufWriter::new(writer);
    writeln!(out, "{}", HEADER.join(","))?;
    for trial in trials {
        writeln!(
            out,
            "{},{},{},{},{}",
            trial.block.label(),
            escape(&trial.target),
            escape(&trial.response),
            trial.correct,
            trial.reaction_time,
        )?;
    }
    out.flush()?;
    Ok(())
}

/// Splits CSV text into records. Quoted fields may hold commas, quotes and line
/// breaks. Each record carries the line it starts on.
fn records(text: &str) -> Result<Vec<(usize, Vec<String>)>, LogError> {
    let mut records = Vec::new();
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut quoted = false;
    let mut line = 1;
    let mut start = 1;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if quoted {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => quoted = false,
                '\n' => {
                    line += 1;
                    field.push(c);
                }
                _ => field.push(c),
            }
            continue;
        }
        match c {
            '"' if field.is_empty() => quoted = true,
            ',' => fields.push(std::mem::take(&mut field)),
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' => {
                fields.push(std::mem::take(&mut field));
                if !(fields.len() == 1 && fields[0].trim().is_empty()) {
                    records.push((start, std::mem::take(&mut fields)));
                }
                fields.clear();
                line += 1;
                start = line;
            }
            _ => field.push(c),
        }
    }
    if quoted {
        return Err(parse_error(start, "unterminated quoted field"));
    }
    if !field.is_empty() || !fields.is_empty() {
        fields.push(field);
        records.push((start, fields));
    }
    Ok(records)
}

fn parse_bool(line: usize, value: &str) -> Result<bool, LogError> {
    match value {
        "true" | "True" | "1" => Ok(true),
        "false" | "False" | "0" => Ok(false),
        other => Err(parse_error(line, format!("bad correctness flag {other:?}"))),
    }
}

pub fn read_trial_log<R: Read>(mut reader: R) -> Result<Vec<TrialResult>, LogError> {
    let mut text = String::new();
    reader.read_to_string(&mut text)?;
    let mut rows = records(text.strip_prefix('\u{feff}').unwrap_or(&text))?.into_iter();

    let (_, header) = rows
        .next()
        .ok_or_else(|| LogError::Header(String::new()))?;
    if header.len() != HEADER.len() || header.iter().zip(HEADER).any(|(h, e)| h.trim() != e) {
        return Err(LogError::Header(header.join(",")));
    }

    rows.map(|(line, fields)| -> Result<TrialResult, LogError> {
        let [block, target, response, correct, rt]: [String; 5] =
            fields.try_into().map_err(|fields: Vec<String>| {
                parse_error(line, format!("expected 5 fields, found {}", fields.len()))
            })?;
        let block = BlockKind::from_label(block.trim())
            .ok_or_else(|| parse_error(line, format!("unknown trial type {block:?}")))?;
        let reaction_time = rt
            .trim()
            .parse::<f64>()
            .map_err(|e| parse_error(line, format!("bad reaction time {rt:?}: {e}")))?;
        Ok(TrialResult {
            block,
            target,
            response,
            correct: parse_bool(line, correct.trim())?,
            reaction_time,
        })
    })
    .collect()
}

/// Writes the log next to `path` and renames it into place, so readers never see
/// a half-written file.
pub fn save_trial_log(path: &Path, trials: &[TrialResult]) -> Result<(), LogError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let tmp = staging_path(path);
    let written = File::create(&tmp)
        .map_err(LogError::from)
        .and_then(|file| write_trial_log(file, trials));
    if let Err(e) = written {
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }
    fs::rename(&tmp, path)?;
    info!(path = %path.display(), trials = trials.len(), "trial log written");
    Ok(())
}

pub fn load_trial_log(path: &Path) -> Result<Vec<TrialResult>, LogError> {
    read_trial_log(File::open(path)?)
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trial(block: BlockKind, target: &str, response: &str, rt: f64) -> TrialResult {
        TrialResult {
            block,
            target: target.to_string(),
            response: response.to_string(),
            correct: target == response,
            reaction_time: rt,
        }
    }

    fn sample() -> Vec<TrialResult> {
        vec![
            trial(BlockKind::TextCongruent, "RED", "RED", 0.612_345_678_9),
            trial(BlockKind::TextIncongruent, "GREEN", "RED", 1.0 / 3.0),
            trial(BlockKind::SwatchCongruent, "BLUE", "BLUE", 2.5),
            trial(BlockKind::SwatchIncongruent, "ORANGE", "ORANGE", 0.000_123),
        ]
    }

    #[test]
    fn writes_header_and_rows() {
        let mut buf = Vec::new();
        write_trial_log(&mut buf, &sample()[..2]).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "trial_type,word_or_color,response,correct,reaction_time");
        assert_eq!(lines[1], "text_congruent,RED,RED,true,0.6123456789");
        assert!(lines[2].starts_with("text_incongruent,GREEN,RED,false,0.333"));
    }

    #[test]
    fn read_back_matches_field_for_field() {
        let trials = sample();
        let mut buf = Vec::new();
        write_trial_log(&mut buf, &trials).unwrap();
        assert_eq!(read_trial_log(buf.as_slice()).unwrap(), trials);
    }

    #[test]
    fn awkward_names_are_quoted() {
        let trials = vec![trial(BlockKind::TextCongruent, "DARK, \"RED\"", "DARK, \"RED\"", 0.5)];
        let mut buf = Vec::new();
        write_trial_log(&mut buf, &trials).unwrap();
        let text = String::from_utf8(buf.clone()).unwrap();
        assert!(text.contains("\"DARK, \"\"RED\"\"\""));
        assert_eq!(read_trial_log(buf.as_slice()).unwrap(), trials);
    }

    #[test]
    fn accepts_capitalized_flags_and_spaced_header() {
        let text = "trial_type, word_or_color, response, correct, reaction_time\r\n\
                    text_congruent,RED,RED,True,0.5\r\n\
                    swatch_incongruent,RED,BLUE,False,0.75\r\n\r\n";
        let trials = read_trial_log(text.as_bytes()).unwrap();
        assert_eq!(trials.len(), 2);
        assert!(trials[0].correct);
        assert!(!trials[1].correct);
        assert_eq!(trials[1].block, BlockKind::SwatchIncongruent);
    }

    #[test]
    fn errors_name_the_line() {
        let text = "trial_type,word_or_color,response,correct,reaction_time\n\
                    text_congruent,RED,RED,true,0.5\n\
                    text_congruent,RED,RED,maybe,0.5\n";
        match read_trial_log(text.as_bytes()) {
            Err(LogError::Parse { line, .. }) => assert_eq!(line, 3),
            other => panic!("expected a parse error, got {other:?}"),
        }

        let short = "trial_type,word_or_color,response,correct,reaction_time\nfoo,RED\n";
        assert!(matches!(
            read_trial_log(short.as_bytes()),
            Err(LogError::Parse { line: 2, .. })
        ));
        assert!(matches!(
            read_trial_log("a,b,c\n".as_bytes()),
            Err(LogError::Header(_))
        ));
        assert!(matches!(read_trial_log("".as_bytes()), Err(LogError::Header(_))));
    }

    #[test]
    fn save_and_load_through_the_filesystem() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("subject_stroop.csv");
        save_trial_log(&path, &sample()).unwrap();
        assert!(!staging_path(&path).exists());
        assert_eq!(load_trial_log(&path).unwrap(), sample());
    }
}
