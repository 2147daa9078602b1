use std::io::Cursor;
use std::time::Instant;

use polars::prelude::{
    CsvParseOptions, CsvReadOptions, DataFrame, DataType, PolarsError, SerReader,
};
use rayon::prelude::*;
use tracing::{debug, error, trace};

use crate::table::{Record, Schema};

/// Turns the fetched text into records. Parsing never fails, lines that do
/// not fit the schema are dropped and an empty result is a valid outcome.
pub trait RecordParser: Send + Sync {
    fn parse(&self, text: &str, schema: &Schema) -> Vec<Record>;
}

/// Splits lines on `\n` and fields on `,` without any escaping.
///
/// Quoted fields containing a comma end up split into too many fields and
/// the line is dropped. Use [`CsvParser`] when the export contains those.
#[derive(Debug, Default, Clone, Copy)]
pub struct CommaParser;

impl RecordParser for CommaParser {
    fn parse(&self, text: &str, schema: &Schema) -> Vec<Record> {
        let mut records = Vec::new();
        let lines = text.split('\n').filter(|line| !line.trim().is_empty());

        for (lidx, line) in lines.enumerate() {
            let values: Vec<String> = line.split(',').map(unquote).collect();
            let nvalues = values.len();
            let Some(record) = Record::from_values(schema, values) else {
                trace!("Dropping line {lidx}: {nvalues} fields, expected {}", schema.len());
                continue;
            };
            if lidx == 0 && is_header(&record, schema) {
                trace!("Skipping header line: {line}");
                continue;
            }
            records.push(record);
        }
        records
    }
}

/// Quote aware parser backed by polars' csv reader.
#[derive(Debug, Default, Clone, Copy)]
pub struct CsvParser;

impl CsvParser {
    fn read_frame(text: &str) -> Result<DataFrame, PolarsError> {
        let parse_options = CsvParseOptions::default()
            .with_separator(b',')
            .with_quote_char(Some(b'"'))
            .with_missing_is_null(false);

        CsvReadOptions::default()
            .with_has_header(false)
            .with_infer_schema_length(Some(0))
            .with_parse_options(parse_options)
            .into_reader_with_file_handle(Cursor::new(text.as_bytes().to_vec()))
            .finish()
    }

    fn load_column(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>, PolarsError> {
        let col = df.column(name)?.cast(&DataType::String)?;
        let series = col.str()?;
        Ok(series
            .into_iter()
            .map(|value| value.map(|s| s.trim().to_string()))
            .collect())
    }

    /// Keeps the non-blank lines whose quote aware field count matches the
    /// schema. The flag tells whether the line was the first non-blank one.
    fn matching_lines<'a>(text: &'a str, schema: &Schema) -> Vec<(bool, &'a str)> {
        text.split('\n')
            .filter(|line| !line.trim().is_empty())
            .enumerate()
            .filter_map(|(lidx, line)| {
                let nfields = count_fields(line);
                if nfields == schema.len() {
                    Some((lidx == 0, line))
                } else {
                    trace!("Dropping line {lidx}: {nfields} fields, expected {}", schema.len());
                    None
                }
            })
            .collect()
    }

    fn frame_to_records(
        df: &DataFrame,
        schema: &Schema,
        first_is_line_zero: bool,
    ) -> Result<Vec<Record>, PolarsError> {
        if df.width() != schema.len() {
            debug!(
                "Csv export has {} columns, expected {}",
                df.width(),
                schema.len()
            );
            return Ok(Vec::new());
        }

        // Each column is converted in its own task.
        let columns = df
            .get_column_names()
            .par_iter()
            .map(|name| Self::load_column(df, name.as_str()))
            .collect::<Result<Vec<_>, _>>()?;

        let mut records = Vec::with_capacity(df.height());
        for ridx in 0..df.height() {
            let values: Option<Vec<String>> = columns.iter().map(|c| c[ridx].clone()).collect();
            let Some(record) = values.and_then(|v| Record::from_values(schema, v)) else {
                trace!("Dropping incomplete row {ridx}");
                continue;
            };
            if ridx == 0 && first_is_line_zero && is_header(&record, schema) {
                continue;
            }
            records.push(record);
        }
        Ok(records)
    }
}

impl RecordParser for CsvParser {
    fn parse(&self, text: &str, schema: &Schema) -> Vec<Record> {
        let lines = Self::matching_lines(text, schema);
        let Some(&(first_is_line_zero, _)) = lines.first() else {
            return Vec::new();
        };
        let start_time = Instant::now();
        let kept = lines.iter().map(|(_, line)| *line).collect::<Vec<_>>().join("\n");
        let result = Self::read_frame(&kept)
            .and_then(|df| Self::frame_to_records(&df, schema, first_is_line_zero));
        match result {
            Ok(records) => {
                debug!(
                    "Parsed {} records in {}ms",
                    records.len(),
                    start_time.elapsed().as_millis()
                );
                records
            }
            Err(e) => {
                error!("Csv parsing failed: {e}");
                Vec::new()
            }
        }
    }
}

/// Trims the value and strips one leading and one trailing double quote.
fn unquote(value: &str) -> String {
    let value = value.trim();
    let value = value.strip_prefix('"').unwrap_or(value);
    let value = value.strip_suffix('"').unwrap_or(value);
    value.to_string()
}

/// Counts the comma separated fields of a line, commas inside quotes do not split.
fn count_fields(line: &str) -> usize {
    let mut in_quotes = false;
    let mut nfields = 1;
    for chr in line.chars() {
        match chr {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => nfields += 1,
            _ => (),
        }
    }
    nfields
}

/// An exported header line carries the first column key as its first value.
fn is_header(record: &Record, schema: &Schema) -> bool {
    schema.key(0).is_some_and(|key| {
        record
            .get(schema, key)
            .is_some_and(|value| value.to_lowercase() == key.to_lowercase())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> Schema {
        Schema::new(["title", "author", "lang", "note"]).unwrap()
    }

    fn songs_schema() -> Schema {
        Schema::new(["songName", "artist", "language", "notes"]).unwrap()
    }

    fn titles(records: &[Record]) -> Vec<&str> {
        records.iter().map(|r| r.value(0)).collect()
    }

    #[test]
    fn parses_rows_and_skips_header() {
        let text = "title,author,lang,note\nZed,Amy,EN,\nAce,Bob,EN,\n";
        let records = CommaParser.parse(text, &schema());
        assert_eq!(records.len(), 2);
        assert_eq!(titles(&records), vec!["Zed", "Ace"]);
        assert_eq!(records[0].values(), &["Zed", "Amy", "EN", ""]);
    }

    #[test]
    fn header_detection_ignores_case() {
        let text = "SONGNAME,Artist,Language,Notes\nHello,Adele,EN,ballad";
        let records = CommaParser.parse(text, &songs_schema());
        assert_eq!(titles(&records), vec!["Hello"]);
    }

    #[test]
    fn header_only_checked_on_first_line() {
        let text = "Hello,Adele,EN,ballad\ntitle,x,y,z\n";
        let records = CommaParser.parse(text, &schema());
        assert_eq!(titles(&records), vec!["Hello", "title"]);
    }

    #[test]
    fn header_only_body_yields_nothing() {
        assert!(CommaParser.parse("songName,artist,language,notes\n", &songs_schema()).is_empty());
    }

    #[test]
    fn drops_lines_with_wrong_field_count() {
        let text = "a,b,c\nZed,Amy,EN,\none,two,three,four,five\nAce,Bob,EN,x";
        let records = CommaParser.parse(text, &schema());
        assert_eq!(titles(&records), vec!["Zed", "Ace"]);
        assert!(records.iter().all(|r| r.values().len() == 4));
    }

    #[test]
    fn skips_blank_lines_and_handles_crlf() {
        let text = "\r\n   \nZed, Amy ,EN,note\r\n\n\t\nAce,Bob,EN,\r\n";
        let records = CommaParser.parse(text, &schema());
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].values(), &["Zed", "Amy", "EN", "note"]);
        assert_eq!(records[1].value(3), "");
    }

    #[test]
    fn strips_one_pair_of_quotes() {
        let text = "\"Zed\",\"\"Amy\"\",\"EN\", \"";
        let records = CommaParser.parse(text, &schema());
        assert_eq!(records[0].values(), &["Zed", "\"Amy\"", "EN", ""]);
    }

    #[test]
    fn quoted_comma_is_split() {
        let text = "\"Hello, Goodbye\",Beatles,EN,\nAce,Bob,EN,";
        assert_eq!(titles(&CommaParser.parse(text, &schema())), vec!["Ace"]);
    }

    #[test]
    fn empty_input_yields_nothing() {
        assert!(CommaParser.parse("", &schema()).is_empty());
        assert!(CommaParser.parse(" \n\n ", &schema()).is_empty());
    }

    #[test]
    fn csv_parser_keeps_quoted_commas() {
        let text = "title,author,lang,note\n\"Hello, Goodbye\",Beatles,EN,x\nAce,Bob,EN,y\n";
        let records = CsvParser.parse(text, &schema());
        assert_eq!(titles(&records), vec!["Hello, Goodbye", "Ace"]);
        assert_eq!(records[0].value(1), "Beatles");
    }

    #[test]
    fn csv_parser_drops_short_lines() {
        let text = "title,author,lang,note\nshort,line\nZed,Amy,EN,x\n";
        let records = CsvParser.parse(text, &schema());
        assert_eq!(titles(&records), vec!["Zed"]);
        assert!(records.iter().all(|r| r.values().len() == 4));
    }

    #[test]
    fn csv_parser_drops_only_the_long_line() {
        let text = "Zed,Amy,EN,x\nbad,one,two,three,four\nAce,Bob,EN,y\n";
        assert_eq!(titles(&CsvParser.parse(text, &schema())), vec!["Zed", "Ace"]);
    }

    #[test]
    fn csv_parser_skips_blank_lines_before_the_header() {
        let text = "\n  \ntitle,author,lang,note\n\nZed,Amy,EN,x\n\nAce,Bob,EN,y\n";
        assert_eq!(titles(&CsvParser.parse(text, &schema())), vec!["Zed", "Ace"]);
    }

    #[test]
    fn csv_parser_checks_header_only_on_first_line() {
        let text = "a,b\ntitle,author,lang,note\nZed,Amy,EN,x\n";
        assert_eq!(titles(&CsvParser.parse(text, &schema())), vec!["title", "Zed"]);
    }

    #[test]
    fn quoted_commas_do_not_count_as_fields() {
        assert_eq!(count_fields("\"Hello, Goodbye\",Beatles,EN,x"), 4);
        assert_eq!(count_fields("\"Say \"\"hi\"\", now\",b"), 2);
        assert_eq!(count_fields(""), 1);
    }

    #[test]
    fn csv_parser_rejects_other_widths() {
        let text = "a,b,c\nd,e,f\n";
        assert!(CsvParser.parse(text, &schema()).is_empty());
        assert!(CsvParser.parse("", &schema()).is_empty());
    }
}
