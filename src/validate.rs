//! Structural validation of a raw translation payload.
//!
//! A 200 response is not a good response. The instruction demands a
//! two-column pipe table terminated by a completion marker; this module
//! checks the payload actually delivered one before the engine accepts it.
//! Each failing condition yields its own human-readable reason (never a
//! generic "invalid") so operators can tell cause classes apart, and every
//! rejection is retryable upstream: malformed content is always worth a
//! fresh sampling draw.
//!
//! Validation is stateless and derives solely from the text.

use crate::prompts::COMPLETION_MARKER;

/// Cell keywords that mark a row as a table header rather than data.
/// Matched case-insensitively against whole cells.
const HEADER_KEYWORDS: [&str; 5] = ["original", "оригинал", "translation", "перевод", "column"];

/// Structural acceptance thresholds.
#[derive(Debug, Clone)]
pub struct TableRules {
    /// Minimum data rows after header rows are discarded.
    pub min_data_rows: usize,
    /// Minimum total characters across the first ("original text") cells;
    /// a floor against near-empty or truncated tables.
    pub min_source_chars: usize,
    /// Token whose absence marks the generation as truncated. Stripped
    /// from accepted text.
    pub completion_marker: String,
}

impl Default for TableRules {
    fn default() -> Self {
        Self {
            min_data_rows: 2,
            min_source_chars: 80,
            completion_marker: COMPLETION_MARKER.to_string(),
        }
    }
}

/// Validate a raw payload; on acceptance, return the text with the
/// completion marker stripped.
///
/// The marker is checked before structure: a well-formed table without the
/// marker still means the API stopped mid-generation, and the remaining
/// rows may be missing.
pub fn validate(raw: &str, rules: &TableRules) -> Result<String, String> {
    if raw.trim().is_empty() {
        return Err("empty response text".to_string());
    }
    if !raw.contains(&rules.completion_marker) {
        return Err("missing completion marker (output truncated)".to_string());
    }

    let stripped = raw.replace(&rules.completion_marker, "").trim().to_string();
    validate_stripped(&stripped, rules)?;
    Ok(stripped)
}

/// Structural checks on marker-stripped text. This is the re-validation
/// path for text that was already accepted once: it can never fail for the
/// marker reason.
pub fn validate_stripped(text: &str, rules: &TableRules) -> Result<(), String> {
    let rows: Vec<Vec<String>> = text.lines().filter_map(parse_row).collect();
    if rows.is_empty() {
        return Err("no translation-table rows found".to_string());
    }

    let data_rows: Vec<&Vec<String>> = rows.iter().filter(|row| !is_header_row(row)).collect();
    if data_rows.len() < rules.min_data_rows {
        return Err(format!(
            "only {} data row(s), need at least {}",
            data_rows.len(),
            rules.min_data_rows
        ));
    }

    let source_chars: usize = data_rows
        .iter()
        .map(|row| row[0].chars().count())
        .sum();
    if source_chars < rules.min_source_chars {
        return Err(format!(
            "source column too short: {source_chars} chars, need at least {}",
            rules.min_source_chars
        ));
    }

    Ok(())
}

/// Parse one line as a pipe-delimited table row with ≥2 non-empty cells.
/// Alignment separator cells (`---`, `:--:`) are not content.
fn parse_row(line: &str) -> Option<Vec<String>> {
    let line = line.trim();
    if !line.contains('|') {
        return None;
    }

    let cells: Vec<String> = line
        .split('|')
        .map(str::trim)
        .filter(|cell| !cell.is_empty())
        .filter(|cell| !cell.chars().all(|c| c == '-' || c == ':'))
        .map(str::to_string)
        .collect();

    (cells.len() >= 2).then_some(cells)
}

/// A row is a header when any cell contains a known header keyword.
fn is_header_row(row: &[String]) -> bool {
    row.iter().any(|cell| {
        let cell = cell.to_lowercase();
        HEADER_KEYWORDS.iter().any(|kw| cell.contains(kw))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> TableRules {
        TableRules::default()
    }

    fn table(rows: &[(&str, &str)], marker: bool) -> String {
        let mut text = String::from("| Оригинал | Перевод |\n|---|---|\n");
        for (src, dst) in rows {
            text.push_str(&format!("| {src} | {dst} |\n"));
        }
        if marker {
            text.push_str(COMPLETION_MARKER);
        }
        text
    }

    fn long(n: usize) -> String {
        "исходный текст страницы ".repeat(n)
    }

    #[test]
    fn valid_table_is_accepted_with_marker_stripped() {
        let raw = table(&[(&long(3), "translated one"), (&long(3), "translated two")], true);
        let accepted = validate(&raw, &rules()).unwrap();
        assert!(!accepted.contains(COMPLETION_MARKER));
        assert!(accepted.contains("translated two"));
    }

    #[test]
    fn missing_marker_reads_as_truncation_even_for_a_good_table() {
        let raw = table(&[(&long(3), "a"), (&long(3), "b")], false);
        let reason = validate(&raw, &rules()).unwrap_err();
        assert!(reason.contains("truncated"), "got: {reason}");
    }

    #[test]
    fn header_rows_do_not_count_as_data() {
        // Header plus a single data row: one short of the floor.
        let raw = table(&[(&long(5), "только одна строка")], true);
        let reason = validate(&raw, &rules()).unwrap_err();
        assert!(reason.contains("data row"), "got: {reason}");

        // Exactly two data rows passes.
        let raw = table(&[(&long(3), "раз"), (&long(3), "два")], true);
        assert!(validate(&raw, &rules()).is_ok());
    }

    #[test]
    fn short_source_column_is_rejected() {
        let raw = table(&[("кратко", "short"), ("тоже", "also")], true);
        let reason = validate(&raw, &rules()).unwrap_err();
        assert!(reason.contains("too short"), "got: {reason}");
    }

    #[test]
    fn prose_without_any_table_row_is_rejected() {
        let raw = format!("Here is the translation you asked for.\n{COMPLETION_MARKER}");
        let reason = validate(&raw, &rules()).unwrap_err();
        assert!(reason.contains("no translation-table rows"), "got: {reason}");
    }

    #[test]
    fn empty_text_is_rejected_first() {
        assert_eq!(validate("   \n  ", &rules()).unwrap_err(), "empty response text");
    }

    #[test]
    fn rows_need_two_non_empty_cells() {
        assert!(parse_row("| only one cell |").is_none());
        assert!(parse_row("no pipes at all").is_none());
        assert!(parse_row("|---|---|").is_none());
        assert_eq!(
            parse_row("| a | b |").unwrap(),
            vec!["a".to_string(), "b".to_string()]
        );
    }

    #[test]
    fn accepted_text_revalidates_cleanly() {
        let raw = table(&[(&long(3), "раз"), (&long(3), "два")], true);
        let accepted = validate(&raw, &rules()).unwrap();
        // No marker check on the re-validation path.
        assert!(validate_stripped(&accepted, &rules()).is_ok());
    }

    #[test]
    fn custom_thresholds_are_honoured() {
        let lax = TableRules {
            min_data_rows: 1,
            min_source_chars: 5,
            completion_marker: "[END]".to_string(),
        };
        let raw = "| исходник | короткая строка |\n[END]";
        assert!(validate(raw, &lax).is_ok());
    }
}
