use std::io::{self, Write};
use std::mem::take;

const SEPARATOR: char = ',';
const BYTE_ORDER_MARK: char = '\u{feff}';

/* ---------------- Parsing ---------------- */

/// Parse comma-separated records (quotes, doubled-quote escapes, and CRLF tolerant).
///
/// Blank lines are skipped. An unterminated quote swallows the rest of the
/// input into its field rather than failing.
pub fn parse_records(text: &str) -> Vec<Vec<String>> {
    let text = text.strip_prefix(BYTE_ORDER_MARK).unwrap_or(text);
    let mut records = Vec::new();
    let mut field = String::new();
    let mut record = Vec::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' => {
                if in_quotes {
                    if matches!(chars.peek(), Some('"')) {
                        chars.next();
                        field.push('"');
                    } else {
                        in_quotes = false;
                    }
                } else {
                    in_quotes = true;
                }
            }
            c if c == SEPARATOR && !in_quotes => {
                record.push(take(&mut field));
            }
            '\n' | '\r' if !in_quotes => {
                if ch == '\r' && matches!(chars.peek(), Some('\n')) {
                    chars.next();
                }
                record.push(take(&mut field));
                push_record(&mut records, take(&mut record));
            }
            _ => field.push(ch),
        }
    }

    record.push(field);
    push_record(&mut records, record);
    records
}

fn push_record(records: &mut Vec<Vec<String>>, record: Vec<String>) {
    let blank = record.len() == 1 && record[0].is_empty();
    if !record.is_empty() && !blank {
        records.push(record);
    }
}

/* ---------------- Writing ---------------- */

fn needs_quotes(field: &str) -> bool {
    field.contains(SEPARATOR)
        || field.contains('"')
        || field.contains('\n')
        || field.contains('\r')
        || field.starts_with(' ')
        || field.ends_with(' ')
}

/// Write a single record, quoting fields that need it.
pub fn write_record<W, S>(mut w: W, record: &[S]) -> io::Result<()>
where
    W: Write,
    S: AsRef<str>,
{
    let mut first = true;
    for cell in record {
        let cell = cell.as_ref();
        if !first {
            write!(w, "{}", SEPARATOR)?;
        } else {
            first = false;
        }
        if needs_quotes(cell) {
            write!(w, "\"{}\"", cell.replace('"', "\"\""))?;
        } else {
            write!(w, "{}", cell)?;
        }
    }
    writeln!(w)
}

/// Render a header plus records into one string.
pub fn records_to_string<S: AsRef<str>>(header: &[S], records: &[Vec<String>]) -> String {
    let mut buf: Vec<u8> = Vec::new();
    // Writing into a Vec cannot fail.
    let _ = write_record(&mut buf, header);
    for record in records {
        let _ = write_record(&mut buf, record);
    }
    match String::from_utf8(buf) {
        Ok(s) => s,
        Err(e) => String::from_utf8_lossy(&e.into_bytes()).into_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_quoted_fields_and_crlf() {
        let text = "a,b,c\r\n1,\"two, too\",\"say \"\"hi\"\"\"\r\n\r\n3,,\n";
        let records = parse_records(text);
        assert_eq!(
            records,
            vec![
                vec!["a", "b", "c"],
                vec!["1", "two, too", "say \"hi\""],
                vec!["3", "", ""],
            ]
        );
    }

    #[test]
    fn parses_multiline_quoted_field() {
        let records = parse_records("notes\n\"line one\nline two\"\n");
        assert_eq!(records, vec![vec!["notes"], vec!["line one\nline two"]]);
    }

    #[test]
    fn strips_byte_order_mark() {
        let records = parse_records("\u{feff}Dates,Notes\nJune 1965,");
        assert_eq!(records[0][0], "Dates");
        assert_eq!(records[1], vec!["June 1965", ""]);
    }

    #[test]
    fn written_records_parse_back() {
        let header = ["token", "notes"];
        let records = vec![
            vec!["nasser".to_string(), "10-12".to_string()],
            vec![",".to_string(), "quote \" inside".to_string()],
            vec![" padded".to_string(), String::new()],
        ];
        let text = records_to_string(&header, &records);
        let parsed = parse_records(&text);
        assert_eq!(parsed[0], vec!["token", "notes"]);
        assert_eq!(&parsed[1..], records.as_slice());
    }
}
