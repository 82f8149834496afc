//! Master-file tokenizer
//!
//! Splits zone text into logical entries. Comments, blank lines and
//! parenthesised groups spanning several physical lines are folded away here
//! so the parser only ever sees one token list per resource record or
//! directive.

use crate::error::{Error, Result};

/// A single field of an entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Token {
    /// Field text; for quoted fields the content between the quotes with
    /// escape sequences kept verbatim
    pub text: String,
    /// Whether the field was written as a quoted string
    pub quoted: bool,
}

impl Token {
    pub(crate) fn bare(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            quoted: false,
        }
    }

    pub(crate) fn quoted(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            quoted: true,
        }
    }

    /// Zone-file representation of the field
    pub(crate) fn render(&self) -> String {
        if self.quoted {
            format!("\"{}\"", self.text)
        } else {
            self.text.clone()
        }
    }
}

/// One logical line of a zone file
#[derive(Debug, Clone)]
pub(crate) struct Entry {
    /// Line number the first token appeared on (1-based)
    pub line: usize,
    /// The entry started with whitespace, so the owner is the previous one
    pub inherits_owner: bool,
    pub tokens: Vec<Token>,
}

#[derive(Default)]
struct EntryBuilder {
    entries: Vec<Entry>,
    tokens: Vec<Token>,
    word: String,
    line: usize,
    inherits_owner: bool,
}

impl EntryBuilder {
    fn push_token(&mut self, token: Token, line: usize) {
        if self.tokens.is_empty() {
            self.line = line;
        }
        self.tokens.push(token);
    }

    fn flush_word(&mut self, line: usize) {
        if !self.word.is_empty() {
            let word = std::mem::take(&mut self.word);
            self.push_token(Token::bare(word), line);
        }
    }

    fn finish_entry(&mut self) {
        if !self.tokens.is_empty() {
            self.entries.push(Entry {
                line: self.line,
                inherits_owner: self.inherits_owner,
                tokens: std::mem::take(&mut self.tokens),
            });
        }
        self.inherits_owner = false;
    }
}

/// Split zone text into logical entries
pub(crate) fn entries(text: &str) -> Result<Vec<Entry>> {
    let mut builder = EntryBuilder::default();
    let mut chars = text.chars().peekable();
    let mut line = 1;
    let mut depth = 0usize;
    let mut at_line_start = true;

    while let Some(c) = chars.next() {
        let line_start = at_line_start;
        at_line_start = false;

        match c {
            '\n' => {
                builder.flush_word(line);
                line += 1;
                if depth == 0 {
                    builder.finish_entry();
                }
                at_line_start = true;
            }
            ' ' | '\t' | '\r' => {
                if line_start && depth == 0 && builder.tokens.is_empty() && c != '\r' {
                    builder.inherits_owner = true;
                }
                builder.flush_word(line);
            }
            ';' => {
                builder.flush_word(line);
                while chars.peek().is_some_and(|&next| next != '\n') {
                    chars.next();
                }
            }
            '(' => {
                builder.flush_word(line);
                depth += 1;
            }
            ')' => {
                builder.flush_word(line);
                if depth == 0 {
                    return Err(Error::zone_parse(line, "unbalanced ')'"));
                }
                depth -= 1;
            }
            '"' => {
                builder.flush_word(line);
                let start = line;
                let mut content = String::new();
                let mut closed = false;
                while let Some(q) = chars.next() {
                    match q {
                        '"' => {
                            closed = true;
                            break;
                        }
                        '\\' => {
                            content.push(q);
                            if let Some(escaped) = chars.next() {
                                if escaped == '\n' {
                                    line += 1;
                                }
                                content.push(escaped);
                            }
                        }
                        '\n' => {
                            line += 1;
                            content.push(q);
                        }
                        _ => content.push(q),
                    }
                }
                if !closed {
                    return Err(Error::zone_parse(start, "unterminated quoted string"));
                }
                builder.push_token(Token::quoted(content), start);
            }
            '\\' => {
                builder.word.push(c);
                if let Some(escaped) = chars.next() {
                    if escaped == '\n' {
                        line += 1;
                    }
                    builder.word.push(escaped);
                }
            }
            _ => builder.word.push(c),
        }
    }

    builder.flush_word(line);
    if depth != 0 {
        return Err(Error::zone_parse(line, "unclosed '(' at end of input"));
    }
    builder.finish_entry();

    Ok(builder.entries)
}

/// Tokenize a single record value such as `10 mail.example.com.`
pub(crate) fn value_tokens(value: &str) -> Result<Vec<Token>> {
    Ok(entries(value)?
        .into_iter()
        .flat_map(|entry| entry.tokens)
        .collect())
}
