use serde::Serialize;

/// Default format command prefix.
pub const COMMAND_PREFIX: char = '^';
/// Default control command prefix.
pub const CONTROL_PREFIX: char = '~';
/// Mnemonic of the field data command whose payload is scanned verbatim.
pub const FIELD_DATA: &str = "FD";
/// Mnemonic that terminates a field data payload.
pub const FIELD_SEPARATOR: &str = "FS";

/// One recognized command.
///
/// `name` and `params` borrow directly from the source input. For `^FD`,
/// `params` is the untouched payload up to (not including) the matching
/// `^FS`; for every other command it is the trimmed text up to the next
/// command leader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Token<'a> {
    /// Command mnemonic without its leader (e.g. `"FO"`, `"A"`, `"A@"`).
    pub name: &'a str,
    /// Raw parameter payload.
    pub params: &'a str,
    /// Byte offset of the leader character.
    #[serde(skip)]
    pub start: usize,
    /// Byte offset one past the last consumed character.
    #[serde(skip)]
    pub end: usize,
}

impl Token<'_> {
    /// Whether this token carries `^FD` field data.
    pub fn is_field_data(&self) -> bool {
        self.name == FIELD_DATA
    }
}

/// Tokenize label markup using the default `^` and `~` leaders.
///
/// Never fails: text before the first leader is skipped, a leader with no
/// mnemonic is dropped, and an unterminated `^FD` yields a token holding
/// everything to end of input.
pub fn tokenize(input: &str) -> Vec<Token<'_>> {
    tokenize_with_config(input, COMMAND_PREFIX, CONTROL_PREFIX)
}

/// Tokenize label markup with configurable leader characters.
///
/// `cmd_prefix` also introduces the `FS` terminator of a field data span.
/// Scanning is done over `char`s so multi-byte text is never split.
pub fn tokenize_with_config(input: &str, cmd_prefix: char, ctrl_prefix: char) -> Vec<Token<'_>> {
    let chars: Vec<(usize, char)> = input.char_indices().collect();
    let n = chars.len();
    let byte_at = |idx: usize| chars.get(idx).map_or(input.len(), |&(b, _)| b);
    let is_leader = |c: char| c == cmd_prefix || c == ctrl_prefix;

    let mut toks = Vec::new();
    let mut i = 0usize;
    while i < n {
        if !is_leader(chars[i].1) {
            i += 1;
            continue;
        }
        let start = byte_at(i);
        let name_end = read_mnemonic(&chars, i + 1);
        if name_end == i + 1 {
            i += 1;
            continue;
        }
        let name = &input[byte_at(i + 1)..byte_at(name_end)];

        if name == FIELD_DATA {
            match find_terminator(&chars, name_end, cmd_prefix) {
                Some(term) => {
                    let after = term + 1 + FIELD_SEPARATOR.len();
                    toks.push(Token {
                        name,
                        params: &input[byte_at(name_end)..byte_at(term)],
                        start,
                        end: byte_at(after),
                    });
                    i = after;
                }
                None => {
                    toks.push(Token {
                        name,
                        params: &input[byte_at(name_end)..],
                        start,
                        end: input.len(),
                    });
                    i = n;
                }
            }
            continue;
        }

        let mut j = name_end;
        while j < n && !is_leader(chars[j].1) {
            j += 1;
        }
        toks.push(Token {
            name,
            params: input[byte_at(name_end)..byte_at(j)].trim(),
            start,
            end: byte_at(j),
        });
        i = j;
    }
    toks
}

/// Read a mnemonic starting at char index `from`, returning the index one
/// past its last character (`from` itself when there is none).
///
/// `A` is a single-letter mnemonic that absorbs one `@` (downloadable font
/// selection); everything else is one or two alphanumerics.
fn read_mnemonic(chars: &[(usize, char)], from: usize) -> usize {
    let Some(&(_, first)) = chars.get(from) else {
        return from;
    };
    if !first.is_alphanumeric() {
        return from;
    }
    let next = chars.get(from + 1).map(|&(_, c)| c);
    if first == 'A' {
        return if next == Some('@') { from + 2 } else { from + 1 };
    }
    match next {
        Some(c) if c.is_alphanumeric() => from + 2,
        _ => from + 1,
    }
}

/// Find the char index of the leader of the first `^FS` at or after `from`.
fn find_terminator(chars: &[(usize, char)], from: usize, cmd_prefix: char) -> Option<usize> {
    let mut sep = FIELD_SEPARATOR.chars();
    let (s0, s1) = (sep.next()?, sep.next()?);
    (from..chars.len()).find(|&k| {
        chars[k].1 == cmd_prefix
            && chars.get(k + 1).map(|&(_, c)| c) == Some(s0)
            && chars.get(k + 2).map(|&(_, c)| c) == Some(s1)
    })
}
