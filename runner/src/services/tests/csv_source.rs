//! Tests for input CSV loading

use std::io::Write;

use crate::error::RunnerError;
use crate::services::csv_source::{detect_delimiter, load_rows, parse_rows};

const HEADER: &str = "name;category;norwegian_title;norwegian_url;prompt_1;prompt_2;prompt_3";

#[test]
fn test_detect_delimiter_prefers_semicolon_on_ties() {
    assert_eq!(detect_delimiter("name;category;title"), b';');
    assert_eq!(detect_delimiter("name,category,title"), b',');
    assert_eq!(detect_delimiter("name"), b';');
    assert_eq!(detect_delimiter("a,b;c"), b';');
}

#[test]
fn test_semicolon_file_with_bom() {
    let content = format!(
        "\u{feff}{HEADER}\nBuddhism;religion;Buddhisme;https://no.wikipedia.org/wiki/Buddhisme;Hva lærer buddhismen?;;Hvordan praktiseres buddhismen?\n"
    );
    let rows = parse_rows(&content, "in.csv").unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].name(), "Buddhism");
    assert_eq!(rows[0].norwegian_title(), "Buddhisme");
    assert_eq!(rows[0].get("prompt_2"), "");
    assert_eq!(rows[0].get("prompt_3"), "Hvordan praktiseres buddhismen?");
}

#[test]
fn test_comma_file_with_quoted_fields() {
    let content = "name,category,norwegian_title,norwegian_url,prompt_1\n\
                   Islam,religion,Islam,https://no.wikipedia.org/wiki/Islam,\"Hva er islam, kort fortalt?\"\n\
                   Humanism,ideology,Humanisme,https://no.wikipedia.org/wiki/Humanisme,\"Hva betyr \"\"humanisme\"\"?\"\n";
    let rows = parse_rows(content, "in.csv").unwrap();

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].get("prompt_1"), "Hva er islam, kort fortalt?");
    assert_eq!(rows[1].get("prompt_1"), "Hva betyr \"humanisme\"?");
    // no prompt_2/3 columns at all
    assert_eq!(rows[1].get("prompt_2"), "");
}

#[test]
fn test_short_rows_lack_trailing_columns() {
    let content = format!("{HEADER}\nShinto;religion;Shinto;https://no.wikipedia.org/wiki/Shinto;Hva er shinto?\n");
    let rows = parse_rows(&content, "in.csv").unwrap();

    assert_eq!(rows[0].get("prompt_1"), "Hva er shinto?");
    assert_eq!(rows[0].get("prompt_3"), "");
}

#[test]
fn test_header_only_and_empty_files_have_no_rows() {
    assert!(parse_rows(&format!("{HEADER}\n"), "in.csv").unwrap().is_empty());
    assert!(parse_rows("", "in.csv").unwrap().is_empty());
}

#[test]
fn test_missing_identity_columns_is_fatal() {
    let content = "name;prompt_1\nBahai;Hva er bahai?\n";
    let err = parse_rows(content, "in.csv").unwrap_err();

    match err {
        RunnerError::MissingColumns { path, missing } => {
            assert_eq!(path, "in.csv");
            assert_eq!(missing, vec!["category", "norwegian_title", "norwegian_url"]);
        }
        other => panic!("expected MissingColumns, got {other:?}"),
    }
}

#[test]
fn test_load_rows_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "{HEADER}").unwrap();
    writeln!(file, "Taoism;religion;Taoisme;https://no.wikipedia.org/wiki/Taoisme;Hva er tao?;;").unwrap();
    writeln!(file, "Stoicism;philosophy;Stoisisme;https://no.wikipedia.org/wiki/Stoisisme;;;").unwrap();

    let rows = load_rows(file.path()).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1].category(), "philosophy");
}

#[test]
fn test_load_rows_missing_file_is_io_error() {
    let err = load_rows(std::path::Path::new("/definitely/not/here.csv")).unwrap_err();
    assert!(matches!(err, RunnerError::IoError(_)));
    assert_eq!(err.exit_code(), 1);
}
