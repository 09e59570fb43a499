//! Instruction text sent with every page image.
//!
//! Centralising the prompt here keeps the retry and validation logic free of
//! prompt engineering: the completion marker the validator looks for and the
//! marker the instruction demands are the same constant, so they cannot
//! drift apart.

/// Literal token the API is instructed to emit as the very last line of a
/// finished translation. The validator treats its absence as a truncated
/// generation.
pub const COMPLETION_MARKER: &str = "<<<END_OF_TRANSLATION>>>";

/// Target language used when the caller does not override it.
pub const DEFAULT_TARGET_LANG: &str = "Russian";

/// Build the page-translation instruction for the given target language.
///
/// The instruction pins down the exact output shape the validator expects:
/// a two-column pipe table and the completion marker on its own final line.
pub fn page_instruction(target_lang: &str) -> String {
    format!(
        r#"You are an expert translator working from a scanned page image.

Transcribe and translate every piece of text on the page into {target_lang}.

Output format, follow it exactly:

1. Produce a two-column table in pipe format:
   | Original | Translation |
   |---|---|
   | <original text fragment> | <its {target_lang} translation> |
2. One table row per paragraph, speech bubble, caption, or other coherent
   text fragment, in natural reading order.
3. Put the complete original text in the first column, unabridged.
4. Translate faithfully; keep names, numbers, and units as they appear.
5. Do NOT add commentary, notes, or explanations outside the table.
6. Do NOT wrap the output in code fences.
7. After the last table row, output this marker alone on the final line:
{COMPLETION_MARKER}"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instruction_embeds_marker_and_language() {
        let prompt = page_instruction("German");
        assert!(prompt.contains(COMPLETION_MARKER));
        assert!(prompt.contains("German"));
    }

    #[test]
    fn marker_is_a_single_line_token() {
        assert!(!COMPLETION_MARKER.contains('\n'));
        assert!(!COMPLETION_MARKER.contains('|'));
    }
}
