//! Post-processing: deterministic cleanup of generated report sections.
//!
//! Asked to "write output as markdown", models regularly wrap the whole
//! answer in a ```` ```markdown ```` fence, emit CRLF line endings or pad with
//! runs of blank lines. These rules undo that without touching content.
//!
//! Rules (applied in order):
//! 1. Normalise line endings (CRLF → LF)
//! 2. Strip an outer ```` ```markdown ```` / ```` ``` ```` fence; fences with
//!    another language (e.g. ```` ```mermaid ````) are content and stay
//! 3. Trim trailing whitespace per line
//! 4. Collapse 3+ consecutive blank lines down to 2
//! 5. Strip invisible Unicode (zero-width spaces, BOM, soft hyphens)
//! 6. Trim the section

use once_cell::sync::Lazy;
use regex::Regex;

/// Apply all cleanup rules to one section.
pub fn clean_section(input: &str) -> String {
    let s = normalise_line_endings(input);
    let s = strip_markdown_fences(&s);
    let s = trim_trailing_whitespace(&s);
    let s = collapse_blank_lines(&s);
    let s = remove_invisible_chars(&s);
    s.trim().to_string()
}

// ── Rule 2: Strip outer markdown fences ──────────────────────────────────────

static RE_OUTER_FENCES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```(?:markdown|md)?\n(.*)\n```$").unwrap());

fn strip_markdown_fences(input: &str) -> String {
    let trimmed = input.trim();
    match RE_OUTER_FENCES.captures(trimmed) {
        // An inner fence means the outer pair is really two separate blocks.
        Some(caps) if !caps[1].contains("```") => caps[1].to_string(),
        _ => trimmed.to_string(),
    }
}

// ── Rule 1: Normalise line endings ───────────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

// ── Rule 3: Trim trailing whitespace per line ────────────────────────────────

fn trim_trailing_whitespace(input: &str) -> String {
    input
        .lines()
        .map(|line| line.trim_end())
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Rule 4: Collapse excessive blank lines ───────────────────────────────────

static RE_BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{4,}").unwrap());

fn collapse_blank_lines(input: &str) -> String {
    RE_BLANK_LINES.replace_all(input, "\n\n\n").to_string()
}

// ── Rule 5: Strip invisible Unicode ──────────────────────────────────────────

fn remove_invisible_chars(input: &str) -> String {
    input
        .chars()
        .filter(|c| !matches!(c, '\u{200B}' | '\u{200C}' | '\u{200D}' | '\u{2060}' | '\u{FEFF}' | '\u{00AD}'))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_fences_markdown_lang() {
        assert_eq!(strip_markdown_fences("```markdown\n# Hi\nthere\n```"), "# Hi\nthere");
    }

    #[test]
    fn test_strip_fences_no_lang() {
        assert_eq!(strip_markdown_fences("  ```\n- a\n- b\n```  \n"), "- a\n- b");
    }

    #[test]
    fn test_mermaid_fence_is_content() {
        let input = "```mermaid\nquadrantChart\n```";
        assert_eq!(strip_markdown_fences(input), input);
    }

    #[test]
    fn test_two_blocks_not_unwrapped() {
        let input = "```\na\n```\ntext\n```\nb\n```";
        assert_eq!(strip_markdown_fences(input), input);
    }

    #[test]
    fn test_normalise_line_endings() {
        assert_eq!(normalise_line_endings("a\r\nb\rc"), "a\nb\nc");
    }

    #[test]
    fn test_trim_trailing_whitespace() {
        assert_eq!(trim_trailing_whitespace("  hello   \nworld  "), "  hello\nworld");
    }

    #[test]
    fn test_collapse_blank_lines() {
        assert_eq!(collapse_blank_lines("a\n\n\n\n\n\nb"), "a\n\n\nb");
    }

    #[test]
    fn test_remove_invisible() {
        assert_eq!(
            remove_invisible_chars("hello\u{200B}world\u{FEFF}foo\u{00AD}bar"),
            "helloworldfoobar"
        );
    }

    #[test]
    fn test_clean_section_full_pipeline() {
        let input = "```markdown\r\n## Team\r\n\r\nJane Doe, CEO   \n\n\n\n\n\n- ex-Boeing\n```\n";
        assert_eq!(clean_section(input), "## Team\n\nJane Doe, CEO\n\n\n- ex-Boeing");
    }

    #[test]
    fn test_plain_text_untouched() {
        assert_eq!(clean_section("  Mock analysis.  "), "Mock analysis.");
    }
}
