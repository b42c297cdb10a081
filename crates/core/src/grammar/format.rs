//! Textual re-serialization of label markup for display.
//!
//! [`pretty_print`] emits one command per line with normalized parameter
//! spacing; [`minify`] strips every byte of whitespace outside field data.
//! Both preserve `^FD` payloads byte-for-byte and never fail: text that is
//! not part of a command is skipped.

use crate::grammar::lexer::{COMMAND_PREFIX, CONTROL_PREFIX, FIELD_DATA, FIELD_SEPARATOR};

/// Longest mnemonic the formatter reads after a leader.
const MAX_CODE_LEN: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Pretty,
    Minify,
}

/// Pretty-print markup: one command per line, spacing around parameter
/// separators removed and interior whitespace runs collapsed.
pub fn pretty_print(markup: &str) -> String {
    format_markup(markup, Mode::Pretty).join("\n")
}

/// Minify markup: all whitespace outside `^FD`...`^FS` removed, commands
/// concatenated on a single line.
pub fn minify(markup: &str) -> String {
    format_markup(markup, Mode::Minify).concat()
}

fn format_markup(input: &str, mode: Mode) -> Vec<String> {
    let s = input.replace("\r\n", "\n");
    let b = s.as_bytes();
    let terminator = format!("{COMMAND_PREFIX}{FIELD_SEPARATOR}");
    let mut lines = Vec::new();
    let mut i = 0usize;

    while i < b.len() {
        // Leaders and mnemonic letters are ASCII, so every index used for
        // slicing below lands on a char boundary.
        if !is_leader(b[i]) {
            match next_leader(b, i) {
                Some(next) => {
                    i = next;
                    continue;
                }
                None => break,
            }
        }

        let sig = b[i] as char;
        i += 1;

        let mut j = i;
        while j < b.len() && b[j].is_ascii_uppercase() && j - i < MAX_CODE_LEN {
            j += 1;
        }
        if j == i {
            continue;
        }
        let mut code = &s[i..j];
        if code.starts_with(FIELD_DATA) {
            // `^FDHELLO` is field data "HELLO", not a three-letter command.
            code = FIELD_DATA;
            j = i + FIELD_DATA.len();
        }
        i = j;

        if code == FIELD_DATA {
            let rest = &s[i..];
            let line = match rest.find(&terminator) {
                Some(pos) => {
                    i += pos + terminator.len();
                    format!("{sig}{code}{}{terminator}", &rest[..pos])
                }
                None => {
                    i = b.len();
                    format!("{sig}{code}{rest}")
                }
            };
            lines.push(line.trim().to_string());
            continue;
        }

        let next = next_leader(b, i).unwrap_or(b.len());
        let params = &s[i..next];
        i = next;

        let params = match mode {
            Mode::Pretty => normalize_params(params),
            Mode::Minify => compact_params(params),
        };
        lines.push(format!("{sig}{code}{params}"));
    }

    lines
}

fn is_leader(byte: u8) -> bool {
    byte == COMMAND_PREFIX as u8 || byte == CONTROL_PREFIX as u8
}

fn next_leader(b: &[u8], from: usize) -> Option<usize> {
    b[from..].iter().position(|&c| is_leader(c)).map(|p| from + p)
}

/// Trim, drop whitespace around commas, and collapse runs of two or more
/// whitespace characters to a single space.
fn normalize_params(params: &str) -> String {
    let mut out = String::with_capacity(params.len());
    for (idx, field) in params.trim().split(',').enumerate() {
        if idx > 0 {
            out.push(',');
        }
        collapse_whitespace(field.trim(), &mut out);
    }
    out
}

fn collapse_whitespace(text: &str, out: &mut String) {
    let mut run = String::new();
    for c in text.chars() {
        if c.is_whitespace() {
            run.push(c);
            continue;
        }
        flush_run(&mut run, out);
        out.push(c);
    }
    flush_run(&mut run, out);
}

fn flush_run(run: &mut String, out: &mut String) {
    if run.chars().count() > 1 {
        out.push(' ');
    } else {
        out.push_str(run);
    }
    run.clear();
}

fn compact_params(params: &str) -> String {
    params.chars().filter(|c| !c.is_whitespace()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_comma_spacing() {
        assert_eq!(normalize_params("  50 , 100  "), "50,100");
        assert_eq!(normalize_params("E:A   B.TTF"), "E:A B.TTF");
        assert_eq!(normalize_params("a\tb"), "a\tb");
    }

    #[test]
    fn compacts_all_whitespace() {
        assert_eq!(compact_params(" 50 ,\n 100 "), "50,100");
    }

    #[test]
    fn field_data_prefix_is_split_from_content() {
        assert_eq!(minify("^FDHELLO WORLD^FS"), "^FDHELLO WORLD^FS");
    }
}
