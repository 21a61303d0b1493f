/// Remove ASCII control characters (0x00-0x1F and 0x7F)
pub fn strip_control_chars(input: &str) -> String {
    input
        .chars()
        .filter(|c| !matches!(*c, '\u{00}'..='\u{1F}' | '\u{7F}'))
        .collect()
}

/// Split an untrusted command string into argument tokens
///
/// Quote-aware word splitting only: there is no globbing, no variable
/// expansion and no operator handling, so `;`, `|` or `$(...)` are ordinary
/// characters that end up inside a token. Control characters are removed
/// before splitting.
///
/// Inside a quoted span, `\` followed by the same quote character yields a
/// literal quote. An unterminated quote runs to the end of the input.
///
/// Example: `log -5 "release v1.0"` becomes `["log", "-5", "release v1.0"]`.
pub fn tokenize(input: &str) -> Vec<String> {
    let cleaned = strip_control_chars(input);

    let mut tokens = Vec::new();
    let mut current = String::new();
    // Distinguishes an empty quoted token ("") from no token at all
    let mut in_token = false;
    let mut quote: Option<char> = None;
    let mut chars = cleaned.chars().peekable();

    while let Some(c) = chars.next() {
        match quote {
            Some(q) => {
                if c == '\\' && chars.peek() == Some(&q) {
                    current.push(q);
                    chars.next();
                } else if c == q {
                    quote = None;
                } else {
                    current.push(c);
                }
            }
            None => {
                if c.is_whitespace() {
                    if in_token {
                        tokens.push(std::mem::take(&mut current));
                        in_token = false;
                    }
                } else if c == '"' || c == '\'' {
                    quote = Some(c);
                    in_token = true;
                } else {
                    current.push(c);
                    in_token = true;
                }
            }
        }
    }

    if in_token {
        tokens.push(current);
    }

    tokens
}
