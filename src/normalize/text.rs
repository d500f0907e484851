//! Text cleanup for vendor HTML snippets.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref TAG_RE: Regex = Regex::new(r"<[^>]+>").unwrap();
}

/// Remove every `<...>` tag, keeping the text between them.
pub fn strip_tags(html: &str) -> String {
    TAG_RE.replace_all(html, "").into_owned()
}

/// Decode backslash escape sequences left in vendor text.
///
/// Handles `\uXXXX` (including surrogate pairs), `\UXXXXXXXX`, `\xXX` and
/// the common single-character escapes. Malformed sequences are kept
/// verbatim. Text that is already Unicode passes through untouched.
pub fn unescape_unicode(text: &str) -> String {
    if !text.contains('\\') {
        return text.to_string();
    }

    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c != '\\' || i + 1 >= chars.len() {
            out.push(c);
            i += 1;
            continue;
        }

        let next = chars[i + 1];
        let simple = match next {
            'n' => Some('\n'),
            't' => Some('\t'),
            'r' => Some('\r'),
            '\\' => Some('\\'),
            '"' => Some('"'),
            '\'' => Some('\''),
            '/' => Some('/'),
            _ => None,
        };
        if let Some(decoded) = simple {
            out.push(decoded);
            i += 2;
            continue;
        }

        let width = match next {
            'u' => 4,
            'U' => 8,
            'x' => 2,
            _ => 0,
        };
        let code = if width > 0 {
            read_hex(&chars, i + 2, width)
        } else {
            None
        };

        match code {
            Some(high @ 0xD800..=0xDBFF) if next == 'u' => {
                // surrogate pair
                let low = (chars.get(i + 6) == Some(&'\\') && chars.get(i + 7) == Some(&'u'))
                    .then(|| read_hex(&chars, i + 8, 4))
                    .flatten()
                    .filter(|low| (0xDC00..=0xDFFF).contains(low));
                match low.and_then(|low| {
                    char::from_u32(0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00))
                }) {
                    Some(decoded) => {
                        out.push(decoded);
                        i += 12;
                    }
                    None => {
                        out.push(c);
                        i += 1;
                    }
                }
            }
            Some(code) => match char::from_u32(code) {
                Some(decoded) => {
                    out.push(decoded);
                    i += 2 + width;
                }
                None => {
                    out.push(c);
                    i += 1;
                }
            },
            None => {
                out.push(c);
                i += 1;
            }
        }
    }

    out
}

fn read_hex(chars: &[char], start: usize, width: usize) -> Option<u32> {
    let digits = chars.get(start..start + width)?;
    let s: String = digits.iter().collect();
    u32::from_str_radix(&s, 16).ok()
}
