//! Macro-level parser for the xwiki/2.x syntaxes.
//!
//! Recognised forms:
//!
//! * `{{name k="v" k2=v/}}` (self-closing)
//! * `{{name k="v"}}body{{/name}}`, same-name macros may nest
//! * `{{{verbatim}}}`, skipped entirely
//!
//! Everything that is not a macro is ignored. Quoted parameter values accept
//! `\"` and `\\`.
//!
//! Macros nest at most [`MAX_NESTING`] levels deep.

use std::collections::BTreeMap;

use tracing::debug;

use super::{MacroBlock, Parser, Xdom};
use crate::error::{CoreError, Result};

pub const XWIKI_2_0: &str = "xwiki/2.0";
pub const XWIKI_2_1: &str = "xwiki/2.1";

/// Deepest macro nesting accepted; deeper documents fail to parse
pub const MAX_NESTING: usize = 64;

const OPEN: &str = "{{";
const CLOSE: &str = "}}";
const SELF_CLOSE: &str = "/}}";
const END_OPEN: &str = "{{/";
const VERBATIM_OPEN: &str = "{{{";
const VERBATIM_CLOSE: &str = "}}}";

pub struct WikiParser {
    syntax: String,
}

impl WikiParser {
    pub fn new(syntax: impl Into<String>) -> Self {
        Self {
            syntax: syntax.into(),
        }
    }
}

impl Default for WikiParser {
    fn default() -> Self {
        Self::new(XWIKI_2_1)
    }
}

impl Parser for WikiParser {
    fn syntax(&self) -> &str {
        &self.syntax
    }

    fn parse(&self, content: &str) -> Result<Xdom> {
        Ok(Xdom {
            blocks: parse_blocks(content, 0)?,
        })
    }
}

fn parse_error(offset: usize, msg: impl std::fmt::Display) -> CoreError {
    CoreError::ParseFailure(format!("{} at offset {}", msg, offset))
}

/// A malformed macro body only costs its parent its children, nesting past
/// [`MAX_NESTING`] fails the whole document.
enum BodyError {
    Malformed(CoreError),
    TooDeep(CoreError),
}

impl From<CoreError> for BodyError {
    fn from(e: CoreError) -> Self {
        BodyError::Malformed(e)
    }
}

impl From<BodyError> for CoreError {
    fn from(e: BodyError) -> Self {
        match e {
            BodyError::Malformed(e) | BodyError::TooDeep(e) => e,
        }
    }
}

struct OpenTag {
    name: String,
    parameters: BTreeMap<String, String>,
    self_closing: bool,
    /// Offset just past the tag
    end: usize,
}

fn parse_blocks(input: &str, depth: usize) -> std::result::Result<Vec<MacroBlock>, BodyError> {
    let mut blocks = Vec::new();
    let mut pos = 0;

    while let Some(offset) = input[pos..].find(OPEN) {
        let start = pos + offset;
        let rest = &input[start..];

        if rest.starts_with(VERBATIM_OPEN) {
            pos = skip_verbatim(input, start)?;
            continue;
        }
        if rest.starts_with(END_OPEN) {
            return Err(parse_error(start, "closing macro without a matching opening").into());
        }

        let tag = match parse_open_tag(input, start)? {
            Some(tag) => tag,
            None => {
                pos = start + OPEN.len();
                continue;
            }
        };
        if depth >= MAX_NESTING {
            return Err(BodyError::TooDeep(parse_error(
                start,
                format!("macros nested deeper than {}", MAX_NESTING),
            )));
        }

        let mut block = MacroBlock::new(tag.name);
        block.parameters = tag.parameters;

        if tag.self_closing {
            pos = tag.end;
        } else {
            let (body_end, close_end) = find_close(input, tag.end, &block.name)?;
            let body = &input[tag.end..body_end];
            // a body that is not markup (script code) simply has no children
            block.children = match parse_blocks(body, depth + 1) {
                Ok(children) => children,
                Err(BodyError::Malformed(e)) => {
                    debug!(name = %block.name, error = %e, "macro body is not markup");
                    Vec::new()
                }
                Err(too_deep) => return Err(too_deep),
            };
            block.content = Some(body.to_string());
            pos = close_end;
        }
        blocks.push(block);
    }

    Ok(blocks)
}

fn skip_verbatim(input: &str, start: usize) -> Result<usize> {
    let body_start = start + VERBATIM_OPEN.len();
    input[body_start..]
        .find(VERBATIM_CLOSE)
        .map(|end| body_start + end + VERBATIM_CLOSE.len())
        .ok_or_else(|| parse_error(start, "unclosed verbatim block"))
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

/// `Ok(None)` when `{{` does not start a macro (plain text)
fn parse_open_tag(input: &str, start: usize) -> Result<Option<OpenTag>> {
    let mut pos = start + OPEN.len();
    if !input[pos..].starts_with(|c: char| c.is_ascii_alphabetic()) {
        return Ok(None);
    }
    let name_len = input[pos..]
        .find(|c: char| !is_name_char(c))
        .unwrap_or(input.len() - pos);
    let name = input[pos..pos + name_len].to_string();
    pos += name_len;

    let mut parameters = BTreeMap::new();
    loop {
        let rest = &input[pos..];
        let trimmed = rest.trim_start();
        pos += rest.len() - trimmed.len();

        if trimmed.starts_with(SELF_CLOSE) {
            return Ok(Some(OpenTag {
                name,
                parameters,
                self_closing: true,
                end: pos + SELF_CLOSE.len(),
            }));
        }
        if trimmed.starts_with(CLOSE) {
            return Ok(Some(OpenTag {
                name,
                parameters,
                self_closing: false,
                end: pos + CLOSE.len(),
            }));
        }
        if trimmed.is_empty() {
            return Err(parse_error(start, format!("unterminated macro {:?}", name)));
        }

        let key_len = trimmed.find(|c: char| !is_name_char(c)).unwrap_or(trimmed.len());
        if key_len == 0 {
            return Err(parse_error(pos, format!("unexpected character in macro {:?}", name)));
        }
        let key = trimmed[..key_len].to_string();
        pos += key_len;

        if !input[pos..].starts_with('=') {
            return Err(parse_error(pos, format!("parameter {:?} has no value", key)));
        }
        pos += 1;

        let (value, next) = parse_value(input, pos)?;
        pos = next;
        parameters.insert(key, value);
    }
}

/// Returns the value and the offset just past it
fn parse_value(input: &str, pos: usize) -> Result<(String, usize)> {
    let rest = &input[pos..];

    if let Some(quoted) = rest.strip_prefix('"') {
        let mut value = String::new();
        let mut chars = quoted.char_indices().peekable();
        while let Some((i, c)) = chars.next() {
            match c {
                '\\' => match chars.peek() {
                    Some(&(_, next @ ('"' | '\\'))) => {
                        value.push(next);
                        chars.next();
                    }
                    _ => value.push(c),
                },
                '"' => return Ok((value, pos + 1 + i + 1)),
                _ => value.push(c),
            }
        }
        return Err(parse_error(pos, "unterminated quoted value"));
    }

    let len = rest
        .char_indices()
        .find(|(i, c)| {
            c.is_whitespace() || rest[*i..].starts_with(CLOSE) || rest[*i..].starts_with(SELF_CLOSE)
        })
        .map(|(i, _)| i)
        .unwrap_or(rest.len());
    Ok((rest[..len].to_string(), pos + len))
}

fn name_at(text: &str, name: &str) -> bool {
    text.get(..name.len())
        .map(|prefix| prefix.eq_ignore_ascii_case(name))
        .unwrap_or(false)
}

/// Find the `{{/name}}` matching an opening that ended at `from`.
///
/// Returns `(body_end, close_end)`.
fn find_close(input: &str, from: usize, name: &str) -> Result<(usize, usize)> {
    let mut depth = 1usize;
    let mut pos = from;

    while let Some(offset) = input[pos..].find(OPEN) {
        let at = pos + offset;
        let rest = &input[at..];

        if rest.starts_with(VERBATIM_OPEN) {
            pos = skip_verbatim(input, at)?;
            continue;
        }

        if let Some(after) = rest.strip_prefix(END_OPEN) {
            if name_at(after, name) && after[name.len()..].starts_with(CLOSE) {
                depth -= 1;
                if depth == 0 {
                    return Ok((at, at + END_OPEN.len() + name.len() + CLOSE.len()));
                }
            }
            pos = at + END_OPEN.len();
            continue;
        }

        let after = &rest[OPEN.len()..];
        let opens_same = name_at(after, name)
            && after[name.len()..]
                .chars()
                .next()
                .map(|c| c.is_whitespace() || c == '}' || c == '/')
                .unwrap_or(false);
        if opens_same {
            if let Some(tag_end) = rest.find(CLOSE) {
                if !rest[..tag_end].ends_with('/') {
                    depth += 1;
                }
            }
        }
        pos = at + OPEN.len();
    }

    Err(parse_error(from, format!("unclosed macro {:?}", name)))
}
