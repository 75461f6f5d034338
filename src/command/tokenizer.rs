//! Splits a raw console/chat line into command tokens.
//!
//! Tokens are separated by whitespace. A double-quoted group is one token with the
//! quotes removed (`ban "Big Al" 60`), and `\"` inside a group is a literal quote.
//! An unterminated quote runs to the end of the line, the way the engine console does.

/// Tokenize one input line. Returns an empty vector for blank input.
pub fn tokenize(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut quoted = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '\\' if quoted && chars.peek() == Some(&'"') => {
                chars.next();
                current.push('"');
            }
            '"' if quoted => {
                quoted = false;
                tokens.push(std::mem::take(&mut current));
                in_token = false;
            }
            '"' if !in_token => {
                quoted = true;
                in_token = true;
            }
            c if c.is_whitespace() && !quoted => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            c => {
                current.push(c);
                in_token = true;
            }
        }
    }
    if in_token {
        tokens.push(current);
    }
    tokens
}

/// Join `tokens[from..]` with `sep`; empty when `from` is past the end.
pub fn join_from(tokens: &[String], from: usize, sep: char) -> String {
    tokens
        .get(from..)
        .map(|rest| rest.join(&sep.to_string()))
        .unwrap_or_default()
}
