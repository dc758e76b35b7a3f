//! Vector path encoding for committed strokes.
//!
//! A finished point sequence becomes an SVG path-command string smoothed with
//! quadratic curves through the midpoints of consecutive samples:
//!
//! ```text
//! M p0  Q p0 mid(p0,p1)  Q p1 mid(p1,p2) ... L pn
//! ```
//!
//! The encoding is a pure function of its input, so every peer that replays
//! the same committed path string draws the same curve. [`decode`] recovers
//! the anchor points of a string produced here.

#[cfg(test)]
#[path = "path_test.rs"]
mod path_test;

use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_STROKE_COLOR, DOT_SEGMENT_LEN};
use crate::viewport::Point;

/// A committed stroke as stored in the log and sent on the wire.
///
/// `path_data` is in logical coordinates. The wire name `svgString` is kept
/// for compatibility with existing peers; `pathData` is accepted on input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VectorPath {
    #[serde(rename = "svgString", alias = "pathData")]
    pub path_data: String,
    pub stroke_width: f64,
    #[serde(default = "default_stroke_color")]
    pub stroke_color: String,
}

fn default_stroke_color() -> String {
    DEFAULT_STROKE_COLOR.to_owned()
}

/// Error returned by [`decode`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PathError {
    #[error("path is empty")]
    Empty,
    #[error("path must start with a move command")]
    MissingMove,
    #[error("unsupported path command: {0}")]
    UnsupportedCommand(char),
    #[error("command {0} is missing arguments")]
    MissingArguments(char),
    #[error("invalid number in path: {0}")]
    InvalidNumber(String),
    #[error("number {0} does not belong to any command")]
    DanglingNumber(f64),
}

/// Encode a logical point sequence as a smoothed vector path.
///
/// Consecutive points that print the same at two decimals are dropped first. When one effective point
/// remains (a tap with no drag) a horizontal segment [`DOT_SEGMENT_LEN`] long
/// is centred on it so the dot is visible at any stroke width. An empty
/// sequence is treated as a dot at the origin.
#[must_use]
pub fn encode(points: &[Point], stroke_color: &str, stroke_width: f64) -> VectorPath {
    let mut effective: Vec<Point> = Vec::with_capacity(points.len());
    for &p in points {
        if effective.last().is_none_or(|&q| !same_when_printed(q, p)) {
            effective.push(p);
        }
    }
    if effective.len() < 2 {
        let center = effective.first().copied().unwrap_or(Point::new(0.0, 0.0));
        let half = DOT_SEGMENT_LEN / 2.0;
        effective = vec![Point::new(center.x - half, center.y), Point::new(center.x + half, center.y)];
    }

    let mut out = String::with_capacity(effective.len() * 24);
    push_command(&mut out, 'M', &[effective[0]]);
    for pair in effective.windows(2) {
        push_command(&mut out, 'Q', &[pair[0], pair[0].midpoint(pair[1])]);
    }
    push_command(&mut out, 'L', &[effective[effective.len() - 1]]);

    VectorPath { path_data: out, stroke_width, stroke_color: stroke_color.to_owned() }
}

/// Recover the anchor points of a path produced by [`encode`].
///
/// Anchors are the move point, each quadratic control point, and each line
/// endpoint, skipping repeats of the previous anchor.
///
/// # Errors
///
/// Returns a [`PathError`] when the string is empty, does not start with
/// `M`, uses a command other than `M`/`Q`/`L`, or has malformed arguments.
pub fn decode(path_data: &str) -> Result<Vec<Point>, PathError> {
    let tokens = tokenize(path_data)?;
    let mut iter = tokens.into_iter().peekable();
    let mut anchors: Vec<Point> = Vec::new();

    match iter.peek() {
        None => return Err(PathError::Empty),
        Some(Token::Command('M')) => {}
        Some(_) => return Err(PathError::MissingMove),
    }

    while let Some(token) = iter.next() {
        let cmd = match token {
            Token::Command(cmd) => cmd,
            Token::Number(n) => return Err(PathError::DanglingNumber(n)),
        };
        let arity = match cmd {
            'M' | 'L' => 2,
            'Q' => 4,
            other => return Err(PathError::UnsupportedCommand(other)),
        };
        let mut args = Vec::with_capacity(arity);
        for _ in 0..arity {
            match iter.next() {
                Some(Token::Number(n)) => args.push(n),
                _ => return Err(PathError::MissingArguments(cmd)),
            }
        }
        // Q contributes its control point; M and L their endpoint.
        let anchor = Point::new(args[0], args[1]);
        if anchors.last() != Some(&anchor) {
            anchors.push(anchor);
        }
    }

    Ok(anchors)
}

// =============================================================
// Formatting
// =============================================================

fn push_command(out: &mut String, cmd: char, points: &[Point]) {
    if !out.is_empty() {
        out.push(' ');
    }
    out.push(cmd);
    for p in points {
        out.push(' ');
        out.push_str(&format_number(p.x));
        out.push(' ');
        out.push_str(&format_number(p.y));
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

#[allow(clippy::float_cmp)]
fn same_when_printed(a: Point, b: Point) -> bool {
    round2(a.x) == round2(b.x) && round2(a.y) == round2(b.y)
}

/// Two decimals, trailing zeros trimmed, never `-0`.
fn format_number(v: f64) -> String {
    let rounded = round2(v);
    if rounded.abs() < 0.005 {
        return "0".to_owned();
    }
    format!("{rounded}")
}

// =============================================================
// Tokenizing
// =============================================================

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Command(char),
    Number(f64),
}

fn is_command_char(c: char) -> bool {
    c.is_ascii_alphabetic() && c != 'e' && c != 'E'
}

fn tokenize(path_data: &str) -> Result<Vec<Token>, PathError> {
    let mut tokens = Vec::new();
    let words = path_data
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|w| !w.is_empty());
    for word in words {
        let mut rest = word;
        while let Some(c) = rest.chars().next() {
            if is_command_char(c) {
                tokens.push(Token::Command(c));
                rest = &rest[c.len_utf8()..];
            } else {
                let end = rest.find(is_command_char).unwrap_or(rest.len());
                let raw = &rest[..end];
                let n = raw
                    .parse::<f64>()
                    .map_err(|_| PathError::InvalidNumber(raw.to_owned()))?;
                tokens.push(Token::Number(n));
                rest = &rest[end..];
            }
        }
    }
    Ok(tokens)
}
