//! Batch reading and writing of interchange records.
//!
//! One [`Category`] per line (see [`Category::to_interchange`]). Blank lines
//! are ignored. Malformed lines are either logged and skipped or abort the
//! whole batch, depending on the [`LoadPolicy`].

use crate::Category;
use crate::error::{Error, RecordError, Result};
use std::io::{BufRead, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadPolicy {
    /// Log malformed records and keep going.
    #[default]
    SkipInvalid,
    /// Fail on the first malformed record.
    AbortOnError,
}

#[derive(Debug, Default)]
pub struct LoadReport {
    pub categories: Vec<Category>,
    /// Records dropped under [`LoadPolicy::SkipInvalid`].
    pub skipped: Vec<RecordError>,
}

/// Read one category per line.
///
/// Text fields are kept exactly as stored (no case folding), so records must
/// already be in the case the tokenizer produces: with the default
/// [`CasePolicy::Upper`](crate::CasePolicy::Upper) a lower-case record never
/// matches tokenized input.
///
/// A line that is not valid UTF-8 is a malformed record like any other; only
/// failures of the reader itself are returned as [`Error::Io`].
pub fn read_records(mut reader: impl BufRead, policy: LoadPolicy) -> Result<LoadReport> {
    let mut report = LoadReport::default();
    let mut buf = Vec::new();
    let mut line_no = 0;

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        line_no += 1;

        let parsed = match std::str::from_utf8(&buf) {
            Ok(line) if line.trim().is_empty() => continue,
            Ok(line) => Category::from_interchange(line),
            Err(err) => Err(RecordError::new(format!("invalid UTF-8: {err}"))),
        };

        match parsed {
            Ok(category) => report.categories.push(category),
            Err(err) => {
                let err = err.at_line(line_no);
                if policy == LoadPolicy::AbortOnError {
                    return Err(Error::Record(err));
                }
                tracing::warn!(line = err.line, reason = %err.reason, "skipping malformed record");
                report.skipped.push(err);
            }
        }
    }

    tracing::debug!(loaded = report.categories.len(), skipped = report.skipped.len(), "read records");
    Ok(report)
}

/// Write `categories` sorted by sequence number; returns how many were written.
pub fn write_records<'c>(mut writer: impl Write, categories: impl IntoIterator<Item = &'c Category>) -> Result<usize> {
    let mut categories: Vec<&Category> = categories.into_iter().collect();
    categories.sort_by(|a, b| a.cmp_by_number(b));

    for category in &categories {
        writeln!(writer, "{}", category.to_interchange())?;
    }
    writer.flush()?;
    Ok(categories.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::{BufReader, Cursor};

    const BATCH: &str = "\
1,HELLO,*,*,Hi there#Comma friend,greetings.aiml
not a record

3,WHAT IS *,*,*,I do not know,facts.aiml
x,BAD NUMBER,*,*,,facts.aiml
";

    #[test]
    fn skip_policy_keeps_valid_records() {
        let report = read_records(Cursor::new(BATCH), LoadPolicy::SkipInvalid).unwrap();
        assert_eq!(report.categories.len(), 2);
        assert_eq!(report.categories[0].template(), "Hi there, friend");
        assert_eq!(report.categories[1].number(), 3);

        let lines: Vec<usize> = report.skipped.iter().map(|e| e.line).collect();
        assert_eq!(lines, vec![2, 5]);
    }

    #[test]
    fn abort_policy_stops_at_first_bad_record() {
        let err = read_records(Cursor::new(BATCH), LoadPolicy::AbortOnError).unwrap_err();
        match err {
            Error::Record(record) => assert_eq!(record.line, 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn invalid_utf8_is_a_malformed_record() {
        let batch = b"1,HELLO,*,*,hi,x\n2,\xff\xfe,*,*,bad,x\n3,BYE,*,*,bye,x\n".to_vec();

        let report = read_records(Cursor::new(batch.clone()), LoadPolicy::SkipInvalid).unwrap();
        let patterns: Vec<&str> = report.categories.iter().map(Category::pattern).collect();
        assert_eq!(patterns, vec!["HELLO", "BYE"]);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].line, 2);
        assert!(report.skipped[0].reason.starts_with("invalid UTF-8"));

        match read_records(Cursor::new(batch), LoadPolicy::AbortOnError).unwrap_err() {
            Error::Record(record) => assert_eq!(record.line, 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn records_keep_their_stored_case() {
        let report = read_records(Cursor::new("1,hello *,*,*,hi,x\n"), LoadPolicy::AbortOnError).unwrap();
        assert_eq!(report.categories[0].pattern(), "hello *");
    }

    #[test]
    fn write_then_read_through_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("brain.csv");

        let categories = vec![
            category!(pattern: "B", template: "second\nline", source: "b.aiml").with_number(2),
            category!(pattern: "A", that: "X", template: "#1", source: "a.aiml").with_number(1),
        ];
        let written = write_records(File::create(&path).unwrap(), &categories).unwrap();
        assert_eq!(written, 2);

        let report = read_records(BufReader::new(File::open(&path).unwrap()), LoadPolicy::AbortOnError).unwrap();
        let patterns: Vec<&str> = report.categories.iter().map(Category::pattern).collect();
        assert_eq!(patterns, vec!["A", "B"]);
        assert_eq!(report.categories[0].that(), "X");
        assert_eq!(report.categories[0].template(), "#1");
        assert_eq!(report.categories[1].template(), "second\nline");
    }
}
