//! JSON I/O handling for CLI
//!
//! - Input: one JSON document via stdin (may span lines)
//! - Output: one JSON document per line via stdout

use std::io::{self, Read, Write};

use serde::Serialize;

use super::errors::{CliError, CliResult};
use crate::query::QueryRequest;

/// Read a query request from `reader`
pub fn read_query_request<R: Read>(mut reader: R) -> CliResult<QueryRequest> {
    let mut input = String::new();
    reader.read_to_string(&mut input)?;

    if input.trim().is_empty() {
        return Err(CliError::io_error("Empty input"));
    }

    Ok(serde_json::from_str(&input)?)
}

/// Read a query request from stdin
pub fn read_request() -> CliResult<QueryRequest> {
    read_query_request(io::stdin().lock())
}

/// Write `value` as a single JSON line to `writer`
pub fn write_json_to<W: Write, T: Serialize>(mut writer: W, value: &T) -> CliResult<()> {
    serde_json::to_writer(&mut writer, value)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

/// Write `value` as a single JSON line to stdout
pub fn write_json<T: Serialize>(value: &T) -> CliResult<()> {
    write_json_to(io::stdout().lock(), value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_read_multiline_request() {
        let input = "{\n  \"sql\": \"SELECT * FROM c\",\n  \"params\": {\"id\": 1}\n}\n";
        let request = read_query_request(input.as_bytes()).unwrap();
        assert_eq!(request.sql, "SELECT * FROM c");
        assert_eq!(request.params.unwrap()["id"], json!(1));
    }

    #[test]
    fn test_read_empty_input() {
        let err = read_query_request("  \n".as_bytes()).unwrap_err();
        assert_eq!(err.message(), "Empty input");
    }

    #[test]
    fn test_write_json_line() {
        let mut out = Vec::new();
        write_json_to(&mut out, &json!({"ok": true})).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "{\"ok\":true}\n");
    }
}
