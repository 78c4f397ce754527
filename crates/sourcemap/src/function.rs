//! Recovery of the function enclosing a source line.
//!
//! This works on text alone: the nearest declaration above the line is taken as the start, and
//! its body is delimited by brace depth. Braces inside `//` comments are ignored, and a `//`
//! inside a string literal does not start one. Braces inside string literals and block comments
//! are still counted.

use crate::source::SourceText;
use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

static DECLARATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        concat!(
            r"\b(?:function\s+([A-Za-z_$][A-Za-z0-9_$]*)",
            r"|modifier\s+([A-Za-z_$][A-Za-z0-9_$]*)",
            r"|(constructor|fallback|receive)\s*\()",
        ),
    )
    .unwrap()
});

/// The function a source line belongs to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionContext {
    /// Name of the function, or `constructor`, `fallback` or `receive`.
    pub name: String,
    /// 1-based line of the declaration.
    pub start_line: u32,
    /// 1-based line holding the closing brace, or the last line of the file.
    pub end_line: u32,
    /// The line the context was requested for.
    pub target_line: u32,
    /// Text of lines `start_line..=end_line`.
    pub code: String,
}

impl FunctionContext {
    /// Returns true if `target_line` lies within the extracted range.
    pub fn contains_target(&self) -> bool {
        (self.start_line..=self.end_line).contains(&self.target_line)
    }
}

/// Strips a trailing `//` comment. A `//` inside a string literal is kept.
fn code_part(line: &str) -> &str {
    let mut quote = None;
    let mut escaped = false;
    let mut chars = line.char_indices().peekable();
    while let Some((idx, c)) = chars.next() {
        match quote {
            Some(_) if escaped => escaped = false,
            Some(_) if c == '\\' => escaped = true,
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == '"' || c == '\'' => quote = Some(c),
            None if c == '/' && chars.peek().is_some_and(|(_, next)| *next == '/') => {
                return &line[..idx];
            }
            None => {}
        }
    }
    line
}

/// Returns the declared name if `line` declares a function-like item.
fn declared_name(line: &str) -> Option<String> {
    let captures = DECLARATION.captures(code_part(line))?;
    captures.iter().skip(1).flatten().next().map(|m| m.as_str().to_string())
}

/// Finds the end of the body starting at `start` by tracking brace depth.
fn body_end(source: &SourceText, start: usize) -> usize {
    let mut depth = 0usize;
    let mut opened = false;
    for line_no in start..=source.line_count() {
        let Some(line) = source.line(line_no) else { break };
        for c in code_part(line).chars() {
            match c {
                '{' => {
                    depth += 1;
                    opened = true;
                }
                '}' => {
                    depth = depth.saturating_sub(1);
                    if opened && depth == 0 {
                        return line_no;
                    }
                }
                // declarations without a body end at their terminator
                ';' if !opened => return line_no,
                _ => {}
            }
        }
    }
    trace!(start, "unbalanced braces, function extends to end of file");
    source.line_count()
}

/// Extracts the function enclosing the 1-based `target_line`.
///
/// Returns `None` if the line does not exist or no declaration precedes it.
pub fn extract_function_context(
    source: &SourceText,
    target_line: usize,
) -> Option<FunctionContext> {
    if target_line == 0 || target_line > source.line_count() {
        return None;
    }

    let (start_line, name) = (1..=target_line)
        .rev()
        .find_map(|line_no| declared_name(source.line(line_no)?).map(|name| (line_no, name)))?;
    let end_line = body_end(source, start_line);
    let code = source.lines(start_line, end_line)?;

    Some(FunctionContext {
        name,
        start_line: u32::try_from(start_line).ok()?,
        end_line: u32::try_from(end_line).ok()?,
        target_line: u32::try_from(target_line).ok()?,
        code,
    })
}
