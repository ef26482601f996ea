use std::{
    fs::{self, OpenOptions},
    io::{self, Read, Seek, SeekFrom, Write},
    path::{Path, PathBuf},
};

use crate::{
    error::SurveyError,
    metrics::LOG_READ_FALLBACKS_TOTAL,
    models::{answer::AnswerRecord, ParticipantId, PriorAnswers, PriorLogStatus},
};

pub const LOG_HEADER: [&str; 7] = [
    "timestamp",
    "user",
    "image_file",
    "true_region",
    "prompt_type",
    "selected_region",
    "is_correct",
];

const FORMULA_PREFIXES: [char; 7] = ['=', '+', '@', '-', '\t', '\r', '\n'];

/// Escapes a CSV field. Values starting with a spreadsheet formula character
/// get a tab prefix; values with separators or quotes are quoted.
fn escape_csv_field(value: &str) -> String {
    let sanitized = if value.starts_with(FORMULA_PREFIXES) {
        format!("\t{}", value)
    } else {
        value.to_string()
    };

    if sanitized.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", sanitized.replace('"', "\"\""))
    } else {
        sanitized
    }
}

/// Inverse of `escape_csv_field` for one line. Quoted fields may contain
/// commas and doubled quotes, but not line breaks.
fn split_csv_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    field.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            }
            '"' if field.is_empty() => in_quotes = true,
            ',' if !in_quotes => fields.push(unescape_field(std::mem::take(&mut field))),
            _ => field.push(c),
        }
    }
    fields.push(unescape_field(field));
    fields
}

fn unescape_field(field: String) -> String {
    match field.strip_prefix('\t') {
        Some(rest) if rest.starts_with(FORMULA_PREFIXES) => rest.to_string(),
        _ => field,
    }
}

fn format_row(record: &AnswerRecord) -> String {
    [
        escape_csv_field(&record.timestamp),
        escape_csv_field(&record.user),
        escape_csv_field(&record.image_file),
        escape_csv_field(&record.true_region),
        escape_csv_field(&record.prompt_type),
        escape_csv_field(&record.selected_region),
        record.correctness_flag().to_string(),
    ]
    .join(",")
}

/// Per-participant append-only CSV logs under one results directory.
#[derive(Debug, Clone)]
pub struct ResultLog {
    results_dir: PathBuf,
}

impl ResultLog {
    pub fn new(results_dir: impl Into<PathBuf>) -> Self {
        Self {
            results_dir: results_dir.into(),
        }
    }

    pub fn results_dir(&self) -> &Path {
        &self.results_dir
    }

    pub fn path_for(&self, participant: &ParticipantId) -> PathBuf {
        self.results_dir
            .join(format!("result_{}.csv", participant.as_str()))
    }

    /// Reads the filenames this participant already answered. Never fails:
    /// a missing or empty log means no prior data, anything unusable is
    /// reported through `PriorLogStatus::Unreadable` and treated the same.
    pub fn load(&self, participant: &ParticipantId) -> PriorAnswers {
        let path = self.path_for(participant);
        let prior = match fs::read_to_string(&path) {
            Ok(content) => parse_log(&content),
            Err(e) if e.kind() == io::ErrorKind::NotFound => PriorAnswers::none(),
            Err(e) => PriorAnswers::unreadable(format!("failed to read log: {}", e)),
        };

        if let PriorLogStatus::Unreadable(reason) = &prior.status {
            LOG_READ_FALLBACKS_TOTAL.with_label_values(&["unreadable"]).inc();
            tracing::warn!(
                participant = %participant,
                path = %path.display(),
                "Result log unusable, treating as no prior answers: {}",
                reason
            );
        }

        prior
    }

    /// Appends one record, writing the header first when the log has no
    /// content yet (missing, empty or blank lines only). Returns only after
    /// the data has been synced to disk.
    pub fn append(
        &self,
        participant: &ParticipantId,
        record: &AnswerRecord,
    ) -> Result<PathBuf, SurveyError> {
        let path = self.path_for(participant);
        let wrap = |source: io::Error| SurveyError::LogWrite {
            path: path.clone(),
            source,
        };

        let mut file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(&path)
            .map_err(wrap)?;

        let mut existing = Vec::new();
        file.seek(SeekFrom::Start(0)).map_err(wrap)?;
        file.read_to_end(&mut existing).map_err(wrap)?;

        let mut buf = String::new();
        if !existing.is_empty() && !existing.ends_with(b"\n") {
            // previous write was cut short; keep the new row on its own line
            buf.push('\n');
        }
        if content_lines(&String::from_utf8_lossy(&existing))
            .next()
            .is_none()
        {
            buf.push_str(&LOG_HEADER.join(","));
            buf.push('\n');
        }
        buf.push_str(&format_row(record));
        buf.push('\n');

        file.write_all(buf.as_bytes()).map_err(wrap)?;
        file.flush().map_err(wrap)?;
        file.sync_all().map_err(wrap)?;

        tracing::debug!(
            "Appended answer for {} to {}",
            record.image_file,
            path.display()
        );
        Ok(path)
    }
}

/// Lines carrying something other than whitespace or a byte order mark.
/// Shared by reader and writer so both agree on when a log is still empty.
fn content_lines(content: &str) -> impl Iterator<Item = &str> {
    content
        .lines()
        .filter(|line| !line.trim_start_matches('\u{feff}').trim().is_empty())
}

fn parse_log(content: &str) -> PriorAnswers {
    let mut lines = content_lines(content);

    let Some(header_line) = lines.next() else {
        return PriorAnswers::none();
    };

    let header: Vec<String> = split_csv_line(header_line.trim_start_matches('\u{feff}'));
    let Some(file_idx) = header.iter().position(|h| h.trim() == "image_file") else {
        return PriorAnswers::unreadable("missing image_file column");
    };
    let correct_idx = header.iter().position(|h| h.trim() == "is_correct");

    let mut prior = PriorAnswers::none();
    prior.status = PriorLogStatus::Loaded;

    for line in lines {
        let fields = split_csv_line(line);
        let Some(image_file) = fields.get(file_idx).filter(|f| !f.is_empty()) else {
            continue;
        };
        let correct = correct_idx
            .and_then(|idx| fields.get(idx))
            .is_some_and(|flag| flag.trim() == "1");
        if prior.answered.insert(image_file.clone()) && correct {
            prior.correct += 1;
        }
    }

    prior
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Stimulus;
    use chrono::NaiveDate;

    fn record(participant: &ParticipantId, file: &str, selected: &str) -> AnswerRecord {
        let at = NaiveDate::from_ymd_opt(2025, 3, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        AnswerRecord::score(participant, &Stimulus::new(file), selected, at)
    }

    #[test]
    fn test_csv_escape_formula_injection() {
        assert_eq!(escape_csv_field("=1+1"), "\t=1+1");
        assert_eq!(escape_csv_field("-taro"), "\t-taro");
        assert_eq!(escape_csv_field("taro"), "taro");
        assert_eq!(escape_csv_field("Name, Jr."), "\"Name, Jr.\"");
        assert_eq!(escape_csv_field("O\"Brien"), "\"O\"\"Brien\"");
    }

    #[test]
    fn split_reverses_escape() {
        let values = ["plain", "=SUM(A1)", "a,b", "say \"hi\"", "", "山田"];
        let line = values
            .iter()
            .map(|v| escape_csv_field(v))
            .collect::<Vec<_>>()
            .join(",");
        assert_eq!(split_csv_line(&line), values);
    }

    #[test]
    fn fresh_log_gets_header_then_rows() {
        let dir = tempfile::tempdir().unwrap();
        let log = ResultLog::new(dir.path());
        let taro = ParticipantId::parse("taro").unwrap();

        let path = log
            .append(&taro, &record(&taro, "saga_simple_001.png", "saga"))
            .unwrap();
        assert_eq!(path, dir.path().join("result_taro.csv"));

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[0],
            "timestamp,user,image_file,true_region,prompt_type,selected_region,is_correct"
        );
        assert_eq!(
            lines[1],
            "2025-03-01 12:00:00,taro,saga_simple_001.png,saga,simple,saga,1"
        );

        log.append(&taro, &record(&taro, "nara_hard_002.png", "osaka"))
            .unwrap();
        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], LOG_HEADER.join(","));
        assert!(lines[2].ends_with(",nara,hard,osaka,0"));
    }

    #[test]
    fn blank_log_gets_header_before_first_row() {
        let dir = tempfile::tempdir().unwrap();
        let log = ResultLog::new(dir.path());
        let jiro = ParticipantId::parse("jiro").unwrap();

        for blank in ["\n", "  \r\n\n", "\u{feff}"] {
            fs::write(log.path_for(&jiro), blank).unwrap();
            assert_eq!(log.load(&jiro).status, PriorLogStatus::NoPriorData);

            log.append(&jiro, &record(&jiro, "saga_simple_001.png", "saga"))
                .unwrap();
            let prior = log.load(&jiro);
            assert_eq!(prior.status, PriorLogStatus::Loaded, "{blank:?}");
            assert!(prior.contains("saga_simple_001.png"));

            let content = fs::read_to_string(log.path_for(&jiro)).unwrap();
            assert_eq!(content.matches(&LOG_HEADER.join(",")).count(), 1);
        }
    }

    #[test]
    fn load_missing_or_empty_log_is_no_prior_data() {
        let dir = tempfile::tempdir().unwrap();
        let log = ResultLog::new(dir.path());
        let taro = ParticipantId::parse("taro").unwrap();

        assert_eq!(log.load(&taro).status, PriorLogStatus::NoPriorData);

        fs::write(log.path_for(&taro), "").unwrap();
        let prior = log.load(&taro);
        assert_eq!(prior.status, PriorLogStatus::NoPriorData);
        assert!(prior.answered.is_empty());
    }

    #[test]
    fn load_without_image_column_is_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        let log = ResultLog::new(dir.path());
        let taro = ParticipantId::parse("taro").unwrap();
        fs::write(log.path_for(&taro), "a,b,c\n1,2,3\n").unwrap();

        let prior = log.load(&taro);
        assert!(matches!(prior.status, PriorLogStatus::Unreadable(_)));
        assert!(prior.answered.is_empty());
    }

    #[test]
    fn load_reads_answers_and_correct_count() {
        let dir = tempfile::tempdir().unwrap();
        let log = ResultLog::new(dir.path());
        let taro = ParticipantId::parse("taro").unwrap();
        log.append(&taro, &record(&taro, "miyazaki_hard_004.png", "miyazaki"))
            .unwrap();
        log.append(&taro, &record(&taro, "saga_simple_001.png", "nara"))
            .unwrap();

        let prior = log.load(&taro);
        assert_eq!(prior.status, PriorLogStatus::Loaded);
        assert!(prior.contains("miyazaki_hard_004.png"));
        assert!(prior.contains("saga_simple_001.png"));
        assert_eq!(prior.answered.len(), 2);
        assert_eq!(prior.correct, 1);
    }

    #[test]
    fn load_accepts_bom_crlf_and_reordered_columns() {
        let dir = tempfile::tempdir().unwrap();
        let log = ResultLog::new(dir.path());
        let hanako = ParticipantId::parse("hanako").unwrap();
        fs::write(
            log.path_for(&hanako),
            "\u{feff}is_correct,image_file\r\n1,osaka_simple_001.png\r\n0,nara_simple_002.png\r\n",
        )
        .unwrap();

        let prior = log.load(&hanako);
        assert_eq!(prior.answered.len(), 2);
        assert_eq!(prior.correct, 1);
    }

    #[test]
    fn append_after_truncated_row_starts_new_line() {
        let dir = tempfile::tempdir().unwrap();
        let log = ResultLog::new(dir.path());
        let taro = ParticipantId::parse("taro").unwrap();
        fs::write(
            log.path_for(&taro),
            format!("{}\n2025-03-01 12:00:00,taro,saga_si", LOG_HEADER.join(",")),
        )
        .unwrap();

        log.append(&taro, &record(&taro, "nara_hard_002.png", "nara"))
            .unwrap();
        let prior = log.load(&taro);
        assert!(prior.contains("nara_hard_002.png"));
        assert_eq!(prior.correct, 1);
    }

    #[test]
    fn append_into_missing_directory_reports_error() {
        let dir = tempfile::tempdir().unwrap();
        let log = ResultLog::new(dir.path().join("does-not-exist"));
        let taro = ParticipantId::parse("taro").unwrap();

        let err = log
            .append(&taro, &record(&taro, "saga_simple_001.png", "saga"))
            .unwrap_err();
        assert!(matches!(err, SurveyError::LogWrite { .. }));
    }
}
