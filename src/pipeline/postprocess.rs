//! Post-processing: deterministic cleanup of rendered Markdown.
//!
//! The HTML → Markdown renderer is faithful but noisy: it keeps whatever
//! whitespace the HTML implied, leaves long runs of blank lines where empty
//! blocks used to be, and passes through invisible characters Word likes to
//! sprinkle into text. These rules fix layout only and never touch content.
//!
//! ## Rule Order
//!
//! Line endings are normalised first so every later rule can split on `\n`.
//! Invisible characters go before whitespace trimming, since a zero-width
//! space at the end of a line would otherwise shield trailing blanks.

use once_cell::sync::Lazy;
use regex::Regex;

/// Apply all post-processing rules to rendered Markdown.
///
/// Rules (applied in order):
/// 1. Normalise line endings (CRLF / CR → LF)
/// 2. Strip invisible Unicode (zero-width spaces, BOM, soft hyphens)
/// 3. Trim trailing whitespace per line, keeping hard line breaks
/// 4. Collapse runs of blank lines down to one
/// 5. Ensure heading lines have a blank line before them
/// 6. Ensure the file ends with exactly one newline
pub fn clean_markdown(input: &str) -> String {
    let s = normalise_line_endings(input);
    let s = remove_invisible_chars(&s);
    let s = trim_trailing_whitespace(&s);
    let s = collapse_blank_lines(&s);
    let s = normalise_heading_spacing(&s);
    ensure_final_newline(&s)
}

// ── Rule 1: Normalise line endings ───────────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

// ── Rule 2: Remove invisible Unicode characters ─────────────────────────────

fn remove_invisible_chars(input: &str) -> String {
    // U+200D stays: it glues emoji sequences together.
    input.replace(['\u{200B}', '\u{FEFF}', '\u{00AD}', '\u{200C}', '\u{2060}'], "")
}

// ── Rule 3: Trim trailing whitespace per line ────────────────────────────────

/// Two or more trailing spaces between two lines of text are a Markdown hard
/// break; they are normalised to exactly two. Anything else trailing is dropped.
fn trim_trailing_whitespace(input: &str) -> String {
    let lines: Vec<&str> = input.split('\n').collect();
    lines
        .iter()
        .enumerate()
        .map(|(i, line)| {
            let trimmed = line.trim_end();
            let trailing = &line[trimmed.len()..];
            let continues = lines.get(i + 1).is_some_and(|next| !next.trim().is_empty());
            if !trimmed.is_empty()
                && continues
                && trailing.starts_with("  ")
                && !trailing.contains('\t')
            {
                format!("{trimmed}  ")
            } else {
                trimmed.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Rule 4: Collapse excessive blank lines ───────────────────────────────────

static RE_BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

fn collapse_blank_lines(input: &str) -> String {
    RE_BLANK_LINES.replace_all(input, "\n\n").to_string()
}

// ── Rule 5: Normalise heading spacing ────────────────────────────────────────

static RE_HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"^#{1,6}\s").unwrap());

fn normalise_heading_spacing(input: &str) -> String {
    let mut result = String::with_capacity(input.len() + 64);
    for (i, line) in input.split('\n').enumerate() {
        if i > 0 && RE_HEADING.is_match(line) {
            let trimmed = result.trim_end_matches('\n');
            result.truncate(trimmed.len());
            if !result.is_empty() {
                result.push_str("\n\n");
            }
        }
        result.push_str(line);
        result.push('\n');
    }
    result
}

// ── Rule 6: Ensure file ends with single newline ─────────────────────────────

fn ensure_final_newline(input: &str) -> String {
    let trimmed = input.trim_start_matches('\n').trim_end();
    if trimmed.is_empty() {
        String::from("\n")
    } else {
        format!("{}\n", trimmed)
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
