//! CSV ingestion with encoding and delimiter auto-detection.
//!
//! Turns CSV bytes into [`Row`] batches. Every cell becomes a string; typing
//! is left to recipe directives such as `set-type`.

use std::path::Path;

use crate::error::{CsvError, CsvResult};
use crate::models::{Row, Value};

/// Delimiters tried by [`detect_delimiter`], in tie-break order.
pub const CANDIDATE_DELIMITERS: [char; 4] = [';', ',', '\t', '|'];

/// Parsed rows plus what was detected along the way.
#[derive(Debug, Clone)]
pub struct ParseResult {
    pub rows: Vec<Row>,
    /// Detected or used encoding
    pub encoding: String,
    /// Detected or used delimiter
    pub delimiter: char,
    /// Column headers
    pub headers: Vec<String>,
}

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    let charset = chardet::detect(bytes).0;

    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" | "" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        _ => charset,
    }
}

/// Decode bytes with the given encoding. Unknown encodings fall back to lossy UTF-8.
pub fn decode_content(bytes: &[u8], encoding: &str) -> String {
    match encoding.to_lowercase().as_str() {
        "iso-8859-1" | "latin-1" | "latin1" => {
            encoding_rs::ISO_8859_15.decode(bytes).0.into_owned()
        }
        "windows-1252" | "cp1252" => encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned(),
        _ => String::from_utf8_lossy(bytes).into_owned(),
    }
}

/// Pick the candidate delimiter occurring most often in the header line.
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let mut best = CANDIDATE_DELIMITERS[0];
    let mut best_count = 0;
    for sep in CANDIDATE_DELIMITERS {
        let count = first_line.matches(sep).count();
        if count > best_count {
            best_count = count;
            best = sep;
        }
    }
    best
}

/// Parse CSV text with an explicit delimiter.
///
/// Short records are padded with empty strings; extra fields are ignored.
///
/// ```ignore
/// let rows = parse_str("name;age\nAlice;30", ';')?;
/// assert_eq!(rows[0].get("name"), Some(&Value::from("Alice")));
/// ```
pub fn parse_str(content: &str, delimiter: char) -> CsvResult<(Vec<String>, Vec<Row>)> {
    if content.trim().is_empty() {
        return Err(CsvError::EmptyFile);
    }
    let delimiter = u8::try_from(delimiter).map_err(|_| {
        CsvError::IoError(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("delimiter '{}' is not a single byte", delimiter),
        ))
    })?;

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    if headers.iter().all(String::is_empty) {
        return Err(CsvError::NoHeaders);
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.iter().all(str::is_empty) {
            continue;
        }
        let row: Row = headers
            .iter()
            .enumerate()
            .map(|(idx, header)| {
                let cell = record.get(idx).unwrap_or("");
                (header.clone(), Value::from(cell))
            })
            .collect();
        rows.push(row);
    }

    Ok((headers, rows))
}

/// Parse CSV bytes with auto-detection of encoding and delimiter.
pub fn parse_bytes_auto(bytes: &[u8]) -> CsvResult<ParseResult> {
    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding);
    let delimiter = detect_delimiter(&content);
    let (headers, rows) = parse_str(&content, delimiter)?;

    Ok(ParseResult {
        rows,
        encoding,
        delimiter,
        headers,
    })
}

/// Parse a CSV file with auto-detection of encoding and delimiter.
pub fn parse_file_auto(path: impl AsRef<Path>) -> CsvResult<ParseResult> {
    let bytes = std::fs::read(path)?;
    parse_bytes_auto(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_simple_csv() {
        let (headers, rows) = parse_str("name;age\nAlice;30\nBob;25", ';').unwrap();
        assert_eq!(headers, vec!["name", "age"]);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1], Row::new().with("name", "Bob").with("age", "25"));
    }

    #[test]
    fn test_quoted_values_keep_delimiters() {
        let (_, rows) = parse_str("name,quote\n\"Doe, Jane\",\"say \"\"hi\"\"\"", ',').unwrap();
        assert_eq!(rows[0].get("name"), Some(&Value::from("Doe, Jane")));
        assert_eq!(rows[0].get("quote"), Some(&Value::from("say \"hi\"")));
    }

    #[test]
    fn test_ragged_records() {
        let (_, rows) = parse_str("a;b;c\n1;;3\n4\n5;6;7;8", ';').unwrap();
        assert_eq!(rows[0].get("b"), Some(&Value::from("")));
        assert_eq!(rows[1].get("c"), Some(&Value::from("")));
        assert_eq!(rows[2].len(), 3);
    }

    #[test]
    fn test_empty_input() {
        assert!(matches!(parse_str("", ';'), Err(CsvError::EmptyFile)));
        assert!(matches!(parse_str("  \n", ';'), Err(CsvError::EmptyFile)));
    }

    #[test]
    fn test_detect_delimiter() {
        assert_eq!(detect_delimiter("a;b;c\n1;2;3"), ';');
        assert_eq!(detect_delimiter("a,b,c\n1,2,3"), ',');
        assert_eq!(detect_delimiter("a\tb\tc"), '\t');
        assert_eq!(detect_delimiter("a|b|c"), '|');
        assert_eq!(detect_delimiter("single"), ';');
    }

    #[test]
    fn test_auto_parse() {
        let result = parse_bytes_auto(b"name,age\nAlice,30\nBob,25").unwrap();
        assert_eq!(result.delimiter, ',');
        assert_eq!(result.encoding, "utf-8");
        assert_eq!(result.rows.len(), 2);
        assert_eq!(result.headers, vec!["name", "age"]);
    }

    #[test]
    fn test_latin1_decoding() {
        // "Société" in ISO-8859-1
        let bytes: &[u8] = &[0x53, 0x6F, 0x63, 0x69, 0xE9, 0x74, 0xE9];
        assert_eq!(decode_content(bytes, "iso-8859-1"), "Société");
    }

    #[test]
    fn test_parse_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "id|tags").unwrap();
        writeln!(file, "1|a,b").unwrap();
        let result = parse_file_auto(file.path()).unwrap();
        assert_eq!(result.delimiter, '|');
        assert_eq!(result.rows[0].get("tags"), Some(&Value::from("a,b")));
    }
}
