//! `.env` file merge operations
//!
//! This module handles the flat `KEY=VALUE` format. Unlike JSON and YAML it
//! does not go through the [`Document`](crate::document::Document) model: both
//! sides are plain string maps and the merge is last-writer-wins.
//!
//! ## Parsing
//!
//! Parsing follows the usual dotenv rules as implemented by `dotenvy`:
//! comments, an optional `export ` prefix, single-quoted literals,
//! double-quoted values with escapes, and `${VAR}` expansion against keys
//! defined earlier in the same content or the process environment.
//!
//! ## Serialization
//!
//! Comments, blank lines and the original key order are not preserved. Keys
//! are written sorted, integer values bare and everything else double-quoted.

use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{Error, Result};

/// Flat `.env` content: key to string value.
pub type EnvMap = BTreeMap<String, String>;

/// Parse `.env` content into a map. Later assignments of the same key win.
///
/// The error is the parser's message; callers attach the origin.
pub fn parse_env(content: &str) -> std::result::Result<EnvMap, String> {
    dotenvy::from_read_iter(content.as_bytes())
        .collect::<std::result::Result<EnvMap, _>>()
        .map_err(|err| err.to_string())
}

/// Serialize a map back to `.env` content.
pub fn serialize_env(entries: &EnvMap) -> String {
    let mut out = String::new();
    for (key, value) in entries {
        out.push_str(key);
        out.push('=');
        if is_integer(value) {
            out.push_str(value);
        } else {
            out.push('"');
            out.push_str(&escape_value(value));
            out.push('"');
        }
        out.push('\n');
    }
    out
}

fn is_integer(value: &str) -> bool {
    value.parse::<i64>().is_ok()
}

fn escape_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            '$' => escaped.push_str("\\$"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// Set every key of `incoming` on `target`, overwriting existing values.
pub fn merge_env(target: &mut EnvMap, incoming: EnvMap) {
    target.extend(incoming);
}

/// Merge `.env` formatted `items` into the `.env` formatted `existing`
/// content and return the rewritten content.
///
/// `origin` names the existing content in error messages.
///
/// # Errors
///
/// Returns `Error::Decode` when either side is malformed.
pub fn merge_env_content(existing: &str, items: &str, origin: &Path) -> Result<String> {
    let mut entries =
        parse_env(existing).map_err(|message| Error::decode_file("env", origin, message))?;
    let incoming = parse_env(items).map_err(|message| Error::decode_items("env", message))?;
    merge_env(&mut entries, incoming);
    Ok(serialize_env(&entries))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, &str)]) -> EnvMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    mod parse_tests {
        use super::*;

        #[test]
        fn test_parse_simple_pairs() {
            let parsed = parse_env("COACH=Mourinho\nCLUB=Roma\n").unwrap();
            assert_eq!(parsed, map(&[("COACH", "Mourinho"), ("CLUB", "Roma")]));
        }

        #[test]
        fn test_parse_skips_comments_and_blank_lines() {
            let content = "# header\n\n   # indented comment\nKEY=value\n\n";
            let parsed = parse_env(content).unwrap();
            assert_eq!(parsed, map(&[("KEY", "value")]));
        }

        #[test]
        fn test_parse_export_prefix() {
            let parsed = parse_env("export API_URL=http://localhost:8080\n").unwrap();
            assert_eq!(parsed, map(&[("API_URL", "http://localhost:8080")]));
        }

        #[test]
        fn test_parse_quoted_values() {
            let content = "A=\"hello world\"\nB='single $HOME'\nC=\"line\\nbreak\"\nD=\"a \\\"quote\\\"\"\n";
            let parsed = parse_env(content).unwrap();
            assert_eq!(parsed["A"], "hello world");
            assert_eq!(parsed["B"], "single $HOME");
            assert_eq!(parsed["C"], "line\nbreak");
            assert_eq!(parsed["D"], "a \"quote\"");
        }

        #[test]
        fn test_parse_inline_comment_on_unquoted_value() {
            let parsed = parse_env("PORT=8080 # default port\nHASH=abc#def\n").unwrap();
            assert_eq!(parsed["PORT"], "8080");
            assert_eq!(parsed["HASH"], "abc#def");
        }

        #[test]
        fn test_parse_value_may_contain_equals() {
            let parsed = parse_env("DSN=postgres://u:p@h/db?sslmode=require\n").unwrap();
            assert_eq!(parsed["DSN"], "postgres://u:p@h/db?sslmode=require");
        }

        #[test]
        fn test_parse_empty_value() {
            let parsed = parse_env("EMPTY=\n").unwrap();
            assert_eq!(parsed["EMPTY"], "");
        }

        #[test]
        fn test_parse_rejects_line_without_equals() {
            let err = parse_env("KEY=value\nnot an assignment\n").unwrap_err();
            assert!(err.contains("not an assignment"));
        }

        #[test]
        fn test_parse_expands_earlier_keys() {
            let content = "FILE_TRANSFORMER_TEST_BASE=/opt/app\nBIN=${FILE_TRANSFORMER_TEST_BASE}/bin\n";
            let parsed = parse_env(content).unwrap();
            assert_eq!(parsed["BIN"], "/opt/app/bin");
        }

        #[test]
        fn test_parse_joins_text_after_closing_quote() {
            let parsed = parse_env("KEY='abc'def\n").unwrap();
            assert_eq!(parsed["KEY"], "abcdef");
        }

        #[test]
        fn test_parse_rejects_unterminated_quote() {
            assert!(parse_env("KEY=\"open\n").is_err());
            assert!(parse_env("KEY='open\n").is_err());
        }

        #[test]
        fn test_parse_last_assignment_wins() {
            let parsed = parse_env("KEY=one\nKEY=two\n").unwrap();
            assert_eq!(parsed["KEY"], "two");
        }
    }

    mod serialize_tests {
        use super::*;

        #[test]
        fn test_serialize_sorted_and_quoted() {
            let entries = map(&[("ZED", "last"), ("ALPHA", "first"), ("PORT", "8080")]);
            assert_eq!(
                serialize_env(&entries),
                "ALPHA=\"first\"\nPORT=8080\nZED=\"last\"\n"
            );
        }

        #[test]
        fn test_serialize_escapes_special_characters() {
            let entries = map(&[("MSG", "say \"hi\"\n$HOME \\o/")]);
            let serialized = serialize_env(&entries);
            assert_eq!(serialized, "MSG=\"say \\\"hi\\\"\\n\\$HOME \\\\o/\"\n");
            assert_eq!(parse_env(&serialized).unwrap(), entries);
        }
    }

    mod merge_tests {
        use super::*;

        #[test]
        fn test_merge_overwrites_and_adds() {
            let mut target = map(&[("COACH", "Mourinho"), ("CLUB", "Roma")]);
            merge_env(&mut target, map(&[("CLUB", "Porto"), ("LEAGUE", "Liga")]));
            assert_eq!(
                target,
                map(&[("COACH", "Mourinho"), ("CLUB", "Porto"), ("LEAGUE", "Liga")])
            );
        }

        #[test]
        fn test_merge_content_drops_comments() {
            let existing = "# managed file\nCOACH=Mourinho\n";
            let merged = merge_env_content(existing, "CLUB=Inter", Path::new(".env")).unwrap();
            assert_eq!(merged, "CLUB=\"Inter\"\nCOACH=\"Mourinho\"\n");
        }

        #[test]
        fn test_merge_content_error_names_file() {
            let err = merge_env_content("garbage", "A=1", Path::new("conf/.env")).unwrap_err();
            assert!(format!("{}", err).contains("conf/.env"));
        }

        #[test]
        fn test_merge_content_bad_items() {
            let err = merge_env_content("", "garbage", Path::new(".env")).unwrap_err();
            assert!(format!("{}", err).contains("items payload"));
        }
    }
}
