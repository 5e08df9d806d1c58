//! Loader module regeneration.
//!
//! A library's loader module (named by `neon.load`) selects the binary package
//! for the running platform from an object literal such as:
//!
//! ```js
//! module.exports = require('@neon-rs/load').proxy({
//!   platforms: {
//!     'linux-x64-gnu': () => require('@acme/linux-x64-gnu'),
//!     'darwin-arm64': () => require('@acme/darwin-arm64')
//!   }
//! });
//! ```
//!
//! Any object literal whose keys are all Node platforms is treated as such a
//! table. [`insert_platform_loaders`] appends a lazy `require` entry for each
//! new platform, following the table's existing quoting, indentation and
//! trailing-comma style.
//!
//! An empty object literal only counts when it is the value of a `platforms`
//! property, as in a freshly generated loader.
//!
//! The scanner is lexical: it understands strings, template literals, regular
//! expression literals, comments and bracket nesting. A `/` starts a regular
//! expression wherever an expression may begin (after an operator,
//! punctuation or a keyword such as `return`) and divides otherwise.

use crate::platform;
use thiserror::Error;

/// Errors from scanning loader source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoaderError {
    #[error("unterminated string literal at byte {0}")]
    UnterminatedString(usize),

    #[error("unterminated comment at byte {0}")]
    UnterminatedComment(usize),

    #[error("unterminated regular expression at byte {0}")]
    UnterminatedRegex(usize),

    #[error("unbalanced '{found}' at byte {offset}")]
    Unbalanced { found: char, offset: usize },
}

/// An object literal keyed by Node platforms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformTable {
    /// Platform keys in source order.
    pub keys: Vec<String>,
    /// Byte offset just past the last token before the closing brace.
    insert_at: usize,
    /// End of the source range replaced by the new entries. Past
    /// `insert_at` only for an empty table, whose blank interior is rewritten.
    replace_to: usize,
    trailing_comma: bool,
    /// Indentation of the first key, if it starts its own line.
    indent: Option<String>,
    /// Indentation of the closing brace, for an empty table laid out anew.
    close_indent: Option<String>,
    quote: char,
}

/// Return `source` with a loader entry added to every platform table for each
/// platform in `platforms` that the table does not already list.
pub fn insert_platform_loaders(
    source: &str,
    org: &str,
    platforms: &[String],
) -> Result<String, LoaderError> {
    let tables = find_platform_tables(source)?;

    let mut edits: Vec<(usize, usize, String)> = tables
        .iter()
        .filter_map(|table| {
            let missing: Vec<&String> = platforms
                .iter()
                .enumerate()
                .filter(|(i, p)| !table.keys.contains(p) && !platforms[..*i].contains(p))
                .map(|(_, p)| p)
                .collect();
            (!missing.is_empty()).then(|| {
                let text = render_entries(table, org, &missing);
                (table.insert_at, table.replace_to, text)
            })
        })
        .collect();
    edits.sort_by(|a, b| b.0.cmp(&a.0));

    let mut out = source.to_string();
    for (start, end, text) in edits {
        out.replace_range(start..end, &text);
    }
    Ok(out)
}

fn render_entries(table: &PlatformTable, org: &str, missing: &[&String]) -> String {
    let q = table.quote;
    let mut text = String::new();
    for (i, platform) in missing.iter().enumerate() {
        if i > 0 || (!table.keys.is_empty() && !table.trailing_comma) {
            text.push(',');
        }
        match &table.indent {
            Some(indent) => {
                text.push('\n');
                text.push_str(indent);
            }
            None => text.push(' '),
        }
        text.push_str(&format!("{q}{platform}{q}: () => require({q}{org}/{platform}{q})"));
    }
    if table.trailing_comma {
        text.push(',');
    }
    if let Some(indent) = &table.close_indent {
        text.push('\n');
        text.push_str(indent);
    }
    text
}

/// Locate every object literal in `source` whose keys are all Node platforms.
pub fn find_platform_tables(source: &str) -> Result<Vec<PlatformTable>, LoaderError> {
    Scanner::new(source).run()
}

#[derive(Debug)]
enum Token {
    Key(String, char),
    Colon,
    Comma,
    Other,
}

#[derive(Debug)]
enum KeyState {
    ExpectKey,
    ExpectColon(String, char),
    InValue,
}

#[derive(Debug)]
struct ObjectScan {
    open: usize,
    keys: Vec<String>,
    quote: Option<char>,
    first_key_at: Option<usize>,
    state: KeyState,
    plausible: bool,
    last_end: usize,
    last_was_comma: bool,
    /// The last token was the colon after a key.
    after_colon: bool,
    /// This object is the value of a `platforms` property.
    platforms_value: bool,
}

impl ObjectScan {
    fn new(open: usize) -> Self {
        Self {
            open,
            keys: Vec::new(),
            quote: None,
            first_key_at: None,
            state: KeyState::ExpectKey,
            plausible: true,
            last_end: open + 1,
            last_was_comma: false,
            after_colon: false,
            platforms_value: false,
        }
    }

    fn accept(&mut self, token: Token, start: usize, end: usize) {
        self.last_end = end;
        self.last_was_comma = matches!(token, Token::Comma);
        self.after_colon = false;

        let state = std::mem::replace(&mut self.state, KeyState::InValue);
        self.state = match (state, token) {
            (KeyState::ExpectKey, Token::Key(key, quote)) => {
                self.first_key_at.get_or_insert(start);
                KeyState::ExpectColon(key, quote)
            }
            (KeyState::ExpectColon(key, quote), Token::Colon) => {
                if quote != '\0' {
                    self.quote.get_or_insert(quote);
                }
                self.keys.push(key);
                self.after_colon = true;
                KeyState::InValue
            }
            (KeyState::InValue, Token::Comma) => KeyState::ExpectKey,
            (KeyState::InValue, _) => KeyState::InValue,
            (_, _) => {
                self.plausible = false;
                KeyState::InValue
            }
        };
    }
}

#[derive(Debug)]
enum Frame {
    Brace(ObjectScan),
    Paren(usize),
    Bracket(usize),
    TemplateExpr(usize),
}

struct Scanner<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
    stack: Vec<Frame>,
    tables: Vec<PlatformTable>,
    /// A `/` here starts a regular expression rather than dividing.
    regex_allowed: bool,
}

impl<'a> Scanner<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            bytes: src.as_bytes(),
            pos: 0,
            stack: Vec::new(),
            tables: Vec::new(),
            regex_allowed: true,
        }
    }

    fn run(mut self) -> Result<Vec<PlatformTable>, LoaderError> {
        while self.pos < self.bytes.len() {
            let start = self.pos;
            let c = self.bytes[start];
            match c {
                b if b.is_ascii_whitespace() => self.pos += 1,
                b'/' if self.peek(1) == Some(b'/') => self.skip_line_comment(),
                b'/' if self.peek(1) == Some(b'*') => self.skip_block_comment()?,
                b'/' if self.regex_allowed => {
                    self.read_regex()?;
                    self.emit(Token::Other, start);
                    self.regex_allowed = false;
                }
                b'\'' | b'"' => {
                    let value = self.read_string(c)?;
                    self.emit(Token::Key(value, c as char), start);
                    self.regex_allowed = false;
                }
                b'`' => {
                    self.pos += 1;
                    self.read_template(start)?;
                }
                b'{' => {
                    let platforms_value = self.opens_platforms_value();
                    self.emit_nested(start);
                    let mut scan = ObjectScan::new(start);
                    scan.platforms_value = platforms_value;
                    self.stack.push(Frame::Brace(scan));
                    self.pos += 1;
                    self.regex_allowed = true;
                }
                b'(' => {
                    self.emit_nested(start);
                    self.stack.push(Frame::Paren(start));
                    self.pos += 1;
                    self.regex_allowed = true;
                }
                b'[' => {
                    self.emit_nested(start);
                    self.stack.push(Frame::Bracket(start));
                    self.pos += 1;
                    self.regex_allowed = true;
                }
                b'}' => self.close_brace(start)?,
                b')' => {
                    self.close(start, ')')?;
                    self.regex_allowed = false;
                }
                b']' => {
                    self.close(start, ']')?;
                    self.regex_allowed = false;
                }
                b':' => {
                    self.pos += 1;
                    self.emit(Token::Colon, start);
                    self.regex_allowed = true;
                }
                b',' => {
                    self.pos += 1;
                    self.emit(Token::Comma, start);
                    self.regex_allowed = true;
                }
                b if is_ident_byte(b) => {
                    while self.pos < self.bytes.len() && is_ident_byte(self.bytes[self.pos]) {
                        self.pos += 1;
                    }
                    let ident = self.src[start..self.pos].to_string();
                    self.regex_allowed = is_keyword_before_expression(&ident);
                    self.emit(Token::Key(ident, '\0'), start);
                }
                _ => {
                    // Advance a whole character so slicing stays on UTF-8 boundaries
                    let width = self.src[start..].chars().next().map_or(1, char::len_utf8);
                    self.pos += width;
                    self.emit(Token::Other, start);
                    self.regex_allowed = true;
                }
            }
        }

        match self.stack.last() {
            None => Ok(self.tables),
            Some(Frame::Brace(scan)) => Err(unbalanced('{', scan.open)),
            Some(Frame::Paren(at)) => Err(unbalanced('(', *at)),
            Some(Frame::Bracket(at)) => Err(unbalanced('[', *at)),
            Some(Frame::TemplateExpr(at)) => Err(LoaderError::UnterminatedString(*at)),
        }
    }

    fn peek(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    /// Report a token that ends at the current position to the enclosing object.
    fn emit(&mut self, token: Token, start: usize) {
        let end = self.pos;
        if let Some(Frame::Brace(scan)) = self.stack.last_mut() {
            scan.accept(token, start, end);
        }
    }

    /// An opening bracket is a value token for the enclosing object; its end is
    /// updated again when the bracket closes.
    fn emit_nested(&mut self, start: usize) {
        if let Some(Frame::Brace(scan)) = self.stack.last_mut() {
            scan.accept(Token::Other, start, start + 1);
        }
    }

    fn finish_nested(&mut self) {
        let end = self.pos;
        if let Some(Frame::Brace(scan)) = self.stack.last_mut() {
            scan.last_end = end;
            scan.last_was_comma = false;
        }
    }

    fn close(&mut self, at: usize, found: char) -> Result<(), LoaderError> {
        match (self.stack.pop(), found) {
            (Some(Frame::Paren(_)), ')') | (Some(Frame::Bracket(_)), ']') => {
                self.pos += 1;
                self.finish_nested();
                Ok(())
            }
            _ => Err(unbalanced(found, at)),
        }
    }

    /// Whether a `{` at the current position is the value of a `platforms`
    /// property of the enclosing object.
    fn opens_platforms_value(&self) -> bool {
        match self.stack.last() {
            Some(Frame::Brace(parent)) => {
                parent.after_colon && parent.keys.last().is_some_and(|key| key == "platforms")
            }
            _ => false,
        }
    }

    fn close_brace(&mut self, at: usize) -> Result<(), LoaderError> {
        match self.stack.pop() {
            Some(Frame::Brace(scan)) => {
                self.pos += 1;
                self.record_table(scan, at);
                self.finish_nested();
                self.regex_allowed = false;
                Ok(())
            }
            Some(Frame::TemplateExpr(start)) => {
                self.pos += 1;
                self.read_template(start)
            }
            _ => Err(unbalanced('}', at)),
        }
    }

    fn record_table(&mut self, scan: ObjectScan, close: usize) {
        let complete = !matches!(scan.state, KeyState::ExpectColon(..));
        if !scan.plausible
            || !complete
            || (scan.keys.is_empty() && !scan.platforms_value)
            || !scan.keys.iter().all(|k| platform::is_node_platform(k))
        {
            return;
        }

        if scan.keys.is_empty() {
            self.tables.push(self.empty_table(&scan, close));
            return;
        }

        let indent = scan.first_key_at.and_then(|at| {
            let line_start = self.src[..at].rfind('\n').map_or(0, |i| i + 1);
            let prefix = &self.src[line_start..at];
            (line_start > scan.open && prefix.chars().all(char::is_whitespace))
                .then(|| prefix.to_string())
        });

        self.tables.push(PlatformTable {
            keys: scan.keys,
            insert_at: scan.last_end,
            replace_to: scan.last_end,
            trailing_comma: scan.last_was_comma,
            indent,
            close_indent: None,
            quote: scan.quote.unwrap_or('\''),
        });
    }

    /// An empty `platforms: {}` table. A blank interior is replaced by one
    /// entry per line, indented one step past the line holding the brace; an
    /// interior holding comments keeps them and gets entries inline.
    fn empty_table(&self, scan: &ObjectScan, close: usize) -> PlatformTable {
        let interior = &self.src[scan.open + 1..close];
        let blank = interior.chars().all(char::is_whitespace);

        let line_start = self.src[..scan.open].rfind('\n').map_or(0, |i| i + 1);
        let base: String = self.src[line_start..scan.open]
            .chars()
            .take_while(|c| *c == ' ' || *c == '\t')
            .collect();
        let step = if base.starts_with('\t') { "\t" } else { "  " };

        PlatformTable {
            keys: Vec::new(),
            insert_at: scan.open + 1,
            replace_to: if blank { close } else { scan.open + 1 },
            trailing_comma: false,
            indent: blank.then(|| format!("{base}{step}")),
            close_indent: blank.then_some(base),
            quote: '\'',
        }
    }

    fn skip_line_comment(&mut self) {
        while self.pos < self.bytes.len() && self.bytes[self.pos] != b'\n' {
            self.pos += 1;
        }
    }

    fn skip_block_comment(&mut self) -> Result<(), LoaderError> {
        let start = self.pos;
        match self.src[start + 2..].find("*/") {
            Some(i) => {
                self.pos = start + 2 + i + 2;
                Ok(())
            }
            None => Err(LoaderError::UnterminatedComment(start)),
        }
    }

    fn read_string(&mut self, quote: u8) -> Result<String, LoaderError> {
        let start = self.pos;
        self.pos += 1;
        let mut value = String::new();
        let mut chunk_start = self.pos;
        while self.pos < self.bytes.len() {
            match self.bytes[self.pos] {
                b'\\' => {
                    value.push_str(&self.src[chunk_start..self.pos]);
                    self.pos += 1;
                    let width = self.src[self.pos..].chars().next().map_or(0, char::len_utf8);
                    value.push_str(&self.src[self.pos..self.pos + width]);
                    self.pos += width;
                    chunk_start = self.pos;
                }
                b'\n' => break,
                b if b == quote => {
                    value.push_str(&self.src[chunk_start..self.pos]);
                    self.pos += 1;
                    return Ok(value);
                }
                _ => self.pos += 1,
            }
        }
        Err(LoaderError::UnterminatedString(start))
    }

    /// Skip a regular expression literal and its flags. A `/` inside a
    /// character class does not end it.
    fn read_regex(&mut self) -> Result<(), LoaderError> {
        let start = self.pos;
        self.pos += 1;
        let mut in_class = false;
        while self.pos < self.bytes.len() {
            match self.bytes[self.pos] {
                b'\\' => self.pos += 2,
                b'\n' => break,
                b'[' => {
                    in_class = true;
                    self.pos += 1;
                }
                b']' => {
                    in_class = false;
                    self.pos += 1;
                }
                b'/' if !in_class => {
                    self.pos += 1;
                    while self.pos < self.bytes.len() && is_ident_byte(self.bytes[self.pos]) {
                        self.pos += 1;
                    }
                    return Ok(());
                }
                _ => self.pos += 1,
            }
        }
        Err(LoaderError::UnterminatedRegex(start))
    }

    /// Scan template text up to the closing backtick or the next `${`.
    fn read_template(&mut self, start: usize) -> Result<(), LoaderError> {
        while self.pos < self.bytes.len() {
            match self.bytes[self.pos] {
                b'\\' => self.pos += 2,
                b'`' => {
                    self.pos += 1;
                    self.emit(Token::Other, start);
                    self.regex_allowed = false;
                    return Ok(());
                }
                b'$' if self.peek(1) == Some(b'{') => {
                    self.stack.push(Frame::TemplateExpr(start));
                    self.pos += 2;
                    self.regex_allowed = true;
                    return Ok(());
                }
                _ => self.pos += 1,
            }
        }
        Err(LoaderError::UnterminatedString(start))
    }
}

/// Keywords after which an expression, and so a regular expression, may start.
fn is_keyword_before_expression(word: &str) -> bool {
    matches!(
        word,
        "return"
            | "typeof"
            | "instanceof"
            | "in"
            | "of"
            | "new"
            | "delete"
            | "void"
            | "throw"
            | "case"
            | "do"
            | "else"
            | "yield"
            | "await"
    )
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$' || b >= 0x80
}

fn unbalanced(found: char, offset: usize) -> LoaderError {
    LoaderError::Unbalanced { found, offset }
}

#[cfg(test)]
#[path = "loader/loader_tests.rs"]
mod loader_tests;
