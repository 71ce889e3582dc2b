//! Row tokenizer for delimited text.
//!
//! Splits one line into raw field strings with a single left-to-right scan
//! and a quote-state flag. Unquoted fields containing the delimiter are not
//! supported (standard CSV semantics).

use crate::constants::QUOTE_CHAR;

/// Tokenize one line of delimited text into trimmed raw fields.
///
/// A quote toggles quoted state unless it is immediately followed by another
/// quote while inside quotes, which emits one literal quote. A delimiter
/// outside quotes ends the current field; end of line always ends the final
/// field, even when it is empty.
pub fn tokenize_row(line: &str, delimiter: char) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    let chars: Vec<char> = line.chars().collect();
    let mut position = 0;
    while position < chars.len() {
        let ch = chars[position];
        if ch == QUOTE_CHAR {
            if in_quotes && chars.get(position + 1) == Some(&QUOTE_CHAR) {
                // Doubled quote inside a quoted field is a literal quote.
                current.push(QUOTE_CHAR);
                position += 2;
                continue;
            }
            in_quotes = !in_quotes;
        } else if ch == delimiter && !in_quotes {
            fields.push(current.trim().to_string());
            current.clear();
        } else {
            current.push(ch);
        }
        position += 1;
    }
    fields.push(current.trim().to_string());

    fields
}
