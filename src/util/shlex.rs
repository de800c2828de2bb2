//! POSIX shell-style word splitting.
//!
//! `_CoqProject` payloads, registry files, and `Require` identifier lists are
//! all split with the same quoting rules as a POSIX shell: single quotes are
//! literal, double quotes honour backslash escapes for `\`, `"`, `$` and `` ` ``,
//! and an unquoted backslash escapes the next character.

use thiserror::Error;

/// Error produced by [`split`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShlexError {
    #[error("unterminated {0} quote")]
    UnterminatedQuote(char),

    #[error("trailing backslash")]
    TrailingEscape,
}

/// Split a string into shell words.
pub fn split(input: &str) -> Result<Vec<String>, ShlexError> {
    tokenize(input, false)
}

/// Split a string into shell words, treating an unquoted `#` as the start of
/// a comment that runs to the end of the line.
pub fn split_with_comments(input: &str) -> Result<Vec<String>, ShlexError> {
    tokenize(input, true)
}

fn tokenize(input: &str, comments: bool) -> Result<Vec<String>, ShlexError> {
    let mut words = Vec::new();
    let mut word = String::new();
    // Quoted empty strings still produce a word.
    let mut in_word = false;
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            c if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut word));
                    in_word = false;
                }
            }
            '#' if comments => {
                for next in chars.by_ref() {
                    if next == '\n' {
                        break;
                    }
                }
                if in_word {
                    words.push(std::mem::take(&mut word));
                    in_word = false;
                }
            }
            '\'' => {
                in_word = true;
                loop {
                    match chars.next() {
                        Some('\'') => break,
                        Some(q) => word.push(q),
                        None => return Err(ShlexError::UnterminatedQuote('\'')),
                    }
                }
            }
            '"' => {
                in_word = true;
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some('\\') => match chars.next() {
                            Some(e @ ('\\' | '"' | '$' | '`')) => word.push(e),
                            Some('\n') => {}
                            Some(other) => {
                                word.push('\\');
                                word.push(other);
                            }
                            None => return Err(ShlexError::UnterminatedQuote('"')),
                        },
                        Some(q) => word.push(q),
                        None => return Err(ShlexError::UnterminatedQuote('"')),
                    }
                }
            }
            '\\' => {
                in_word = true;
                match chars.next() {
                    Some('\n') => {}
                    Some(e) => word.push(e),
                    None => return Err(ShlexError::TrailingEscape),
                }
            }
            _ => {
                in_word = true;
                word.push(c);
            }
        }
    }

    if in_word {
        words.push(word);
    }
    Ok(words)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_quoted_payload() {
        let words = split(r#"KOPITIAM_0 lp "SourceLoadPath src bin""#).unwrap();
        assert_eq!(words, vec!["KOPITIAM_0", "lp", "SourceLoadPath src bin"]);
    }

    #[test]
    fn test_split_nested_quotes() {
        let words = split(r#"ExternalLoadPath "/opt/my lib" 'Foo.Bar'"#).unwrap();
        assert_eq!(words, vec!["ExternalLoadPath", "/opt/my lib", "Foo.Bar"]);
    }

    #[test]
    fn test_split_escapes_and_empty_words() {
        assert_eq!(split(r"a\ b").unwrap(), vec!["a b"]);
        assert_eq!(split(r#""" x"#).unwrap(), vec!["", "x"]);
        assert_eq!(split(r#""say \"hi\"""#).unwrap(), vec![r#"say "hi""#]);
    }

    #[test]
    fn test_comments() {
        let input = "var A \"desc\" # trailing\n# whole line\nvar B 'x'";
        assert_eq!(
            split_with_comments(input).unwrap(),
            vec!["var", "A", "desc", "var", "B", "x"]
        );
        // Without comment handling '#' is an ordinary character.
        assert_eq!(split("a#b").unwrap(), vec!["a#b"]);
    }

    #[test]
    fn test_unterminated_quote() {
        assert_eq!(split("\"abc"), Err(ShlexError::UnterminatedQuote('"')));
        assert_eq!(split("abc\\"), Err(ShlexError::TrailingEscape));
    }
}
