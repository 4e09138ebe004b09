//! Script transpiling.

use std::path::Path;

use kiln_graph::ModuleId;
use thiserror::Error;

use super::link::{LinkContext, link};

/// Rejected script input, with a 1-based position.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} at {line}:{column}")]
pub struct SyntaxError {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

impl SyntaxError {
    fn at(message: impl Into<String>, pos: Position) -> Self {
        Self {
            message: message.into(),
            line: pos.line,
            column: pos.column,
        }
    }
}

/// What a transpiler sees of a module.
pub struct ScriptSource<'a> {
    pub id: &'a ModuleId,
    pub path: &'a Path,
    pub code: &'a str,
    pub link: &'a LinkContext,
}

/// Turns a script into the body of a registry module function.
///
/// Output code runs with `module`, `exports` and `__kiln_require__` in
/// scope; [`link`] does that rewriting for ES module syntax.
pub trait Transpiler: Send + Sync {
    fn transpile(&self, source: &ScriptSource<'_>) -> Result<String, SyntaxError>;
}

/// Checks that brackets balance and strings terminate, then links.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultTranspiler;

impl Transpiler for DefaultTranspiler {
    fn transpile(&self, source: &ScriptSource<'_>) -> Result<String, SyntaxError> {
        check_delimiters(source.code)?;
        Ok(link(source.code, source.link))
    }
}

#[derive(Debug, Clone, Copy)]
struct Position {
    line: usize,
    column: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Frame {
    Paren,
    Bracket,
    Brace,
    /// `${` inside a template literal
    Substitution,
}

impl Frame {
    fn closer(self) -> char {
        match self {
            Frame::Paren => ')',
            Frame::Bracket => ']',
            Frame::Brace | Frame::Substitution => '}',
        }
    }
}

struct Cursor<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    pos: Position,
}

impl<'a> Cursor<'a> {
    fn new(code: &'a str) -> Self {
        Self {
            chars: code.chars().peekable(),
            pos: Position { line: 1, column: 0 },
        }
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        if c == '\n' {
            self.pos.line += 1;
            self.pos.column = 0;
        } else {
            self.pos.column += 1;
        }
        Some(c)
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }
}

/// Bracket balance over a script, skipping strings, comments, template
/// literals and regular expression literals.
pub fn check_delimiters(code: &str) -> Result<(), SyntaxError> {
    let mut cur = Cursor::new(code);
    let mut stack: Vec<(Frame, Position)> = Vec::new();
    // last significant character and the word before it, used to tell a
    // `/` division from a regex literal
    let mut prev: Option<char> = None;
    let mut prev_word = String::new();
    let mut word = String::new();

    while let Some(c) = cur.bump() {
        let start = cur.pos;
        if c.is_alphanumeric() || c == '_' || c == '$' {
            word.push(c);
            prev = Some(c);
            continue;
        }
        if !word.is_empty() {
            prev_word = std::mem::take(&mut word);
        }

        match c {
            '(' => stack.push((Frame::Paren, start)),
            '[' => stack.push((Frame::Bracket, start)),
            '{' => stack.push((Frame::Brace, start)),
            ')' | ']' | '}' => match stack.pop() {
                Some((Frame::Substitution, _)) if c == '}' => {
                    skip_template(&mut cur, &mut stack, start)?;
                    prev = Some('`');
                    prev_word.clear();
                    continue;
                }
                Some((frame, _)) if frame.closer() == c => {}
                Some((frame, opened)) => {
                    return Err(SyntaxError::at(
                        format!(
                            "expected '{}' to close line {} but found '{c}'",
                            frame.closer(),
                            opened.line
                        ),
                        start,
                    ));
                }
                None => return Err(SyntaxError::at(format!("unexpected '{c}'"), start)),
            },
            '"' | '\'' => skip_string(&mut cur, c, start)?,
            '`' => skip_template(&mut cur, &mut stack, start)?,
            '/' => match cur.peek() {
                Some('/') => {
                    while cur.peek().is_some_and(|n| n != '\n') {
                        cur.bump();
                    }
                    continue;
                }
                Some('*') => {
                    cur.bump();
                    skip_block_comment(&mut cur, start)?;
                    continue;
                }
                _ if regex_allowed(prev, &prev_word) => skip_regex(&mut cur, start)?,
                _ => {}
            },
            _ => {}
        }

        if !c.is_whitespace() {
            prev = Some(c);
            prev_word.clear();
        }
    }

    match stack.pop() {
        Some((frame, opened)) => Err(SyntaxError::at(
            format!("unclosed '{}'", opening(frame)),
            opened,
        )),
        None => Ok(()),
    }
}

fn opening(frame: Frame) -> &'static str {
    match frame {
        Frame::Paren => "(",
        Frame::Bracket => "[",
        Frame::Brace => "{",
        Frame::Substitution => "${",
    }
}

fn regex_allowed(prev: Option<char>, last_word: &str) -> bool {
    if matches!(last_word, "return" | "typeof" | "case" | "in" | "of" | "void" | "yield" | "await") {
        return true;
    }
    if !last_word.is_empty() {
        return false;
    }
    match prev {
        None => true,
        Some(p) => "(,=:[!&|?{};+-*%<>~^".contains(p),
    }
}

fn skip_string(cur: &mut Cursor<'_>, quote: char, start: Position) -> Result<(), SyntaxError> {
    while let Some(c) = cur.bump() {
        match c {
            '\\' => {
                cur.bump();
            }
            '\n' => break,
            c if c == quote => return Ok(()),
            _ => {}
        }
    }
    Err(SyntaxError::at("unterminated string literal", start))
}

/// Template body up to the closing backtick, or up to a `${` (which is
/// pushed as a frame so the matching `}` resumes the template).
fn skip_template(
    cur: &mut Cursor<'_>,
    stack: &mut Vec<(Frame, Position)>,
    start: Position,
) -> Result<(), SyntaxError> {
    while let Some(c) = cur.bump() {
        match c {
            '\\' => {
                cur.bump();
            }
            '`' => return Ok(()),
            '$' if cur.peek() == Some('{') => {
                cur.bump();
                stack.push((Frame::Substitution, cur.pos));
                return Ok(());
            }
            _ => {}
        }
    }
    Err(SyntaxError::at("unterminated template literal", start))
}

fn skip_block_comment(cur: &mut Cursor<'_>, start: Position) -> Result<(), SyntaxError> {
    while let Some(c) = cur.bump() {
        if c == '*' && cur.peek() == Some('/') {
            cur.bump();
            return Ok(());
        }
    }
    Err(SyntaxError::at("unterminated comment", start))
}

fn skip_regex(cur: &mut Cursor<'_>, start: Position) -> Result<(), SyntaxError> {
    let mut in_class = false;
    while let Some(c) = cur.bump() {
        match c {
            '\\' => {
                cur.bump();
            }
            '[' => in_class = true,
            ']' => in_class = false,
            '/' if !in_class => return Ok(()),
            '\n' => break,
            _ => {}
        }
    }
    Err(SyntaxError::at("unterminated regular expression", start))
}
