//! Route specification compiler.
//!
//! A route specification has the form `"[METHOD[,METHOD...] ]<path-pattern>"`.
//! The path pattern is literal text interleaved with parameter tokens:
//!
//! - `<name>` captures one path segment (`[^/]+`)
//! - `<name:regex>` captures whatever `regex` matches
//!
//! Patterns without tokens stay literal and are matched with a plain prefix
//! comparison. Patterns with tokens compile to a start-anchored regex with
//! one named group per token.

use std::collections::{BTreeSet, HashMap, HashSet};

use regex::Regex;

use crate::error::PatternError;

/// Expression used for `<name>` tokens without an explicit regex.
pub const DEFAULT_PARAM_REGEX: &str = "[^/]+";

/// Result of a successful path match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathMatch<'p> {
    /// Unconsumed suffix of the matched path
    pub remaining: &'p str,
    /// Captured parameters, empty for literal patterns
    pub params: HashMap<String, String>,
}

impl PathMatch<'_> {
    /// Number of bytes consumed from the front of `path`.
    pub fn consumed_len(&self, path: &str) -> usize {
        path.len() - self.remaining.len()
    }
}

/// A compiled path pattern.
#[derive(Debug, Clone)]
pub enum PathPattern {
    /// Token-free pattern matched by prefix comparison
    Literal(String),
    /// Pattern with tokens, compiled to an anchored regex
    Compiled {
        /// Pattern as written in the route specification
        source: String,
        /// `^`-anchored expression with one named group per token
        regex: Regex,
    },
}

impl PathPattern {
    /// Compile a path pattern.
    pub fn compile(pattern: &str) -> Result<Self, PatternError> {
        let pieces = tokenize(pattern)?;
        if pieces.iter().all(|piece| matches!(piece, Piece::Literal(_))) {
            return Ok(Self::Literal(pattern.to_string()));
        }

        let mut expr = String::with_capacity(pattern.len() + 16);
        expr.push('^');
        for piece in &pieces {
            match piece {
                Piece::Literal(text) => expr.push_str(&regex::escape(text)),
                Piece::Param { name, regex } => {
                    expr.push_str("(?P<");
                    expr.push_str(name);
                    expr.push('>');
                    expr.push_str(regex);
                    expr.push(')');
                }
            }
        }

        let regex = Regex::new(&expr).map_err(|source| PatternError::InvalidRegex {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(Self::Compiled {
            source: pattern.to_string(),
            regex,
        })
    }

    /// Pattern text as registered.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Literal(text) => text,
            Self::Compiled { source, .. } => source,
        }
    }

    /// Returns true if the pattern is matched without the regex engine.
    pub fn is_literal(&self) -> bool {
        matches!(self, Self::Literal(_))
    }

    /// Names of every capture group the pattern can produce.
    pub fn param_names(&self) -> Vec<&str> {
        match self {
            Self::Literal(_) => Vec::new(),
            Self::Compiled { regex, .. } => regex.capture_names().flatten().collect(),
        }
    }

    /// Try to consume a prefix of `path`.
    ///
    /// Returns `None` when the pattern does not match at the start of `path`.
    pub fn match_path<'p>(&self, path: &'p str) -> Option<PathMatch<'p>> {
        match self {
            Self::Literal(prefix) => path.strip_prefix(prefix.as_str()).map(|remaining| PathMatch {
                remaining,
                params: HashMap::new(),
            }),
            Self::Compiled { regex, .. } => {
                let captures = regex.captures(path)?;
                let end = captures.get(0)?.end();
                let params = regex
                    .capture_names()
                    .flatten()
                    .map(|name| {
                        let value = captures.name(name).map_or("", |m| m.as_str());
                        (name.to_string(), value.to_string())
                    })
                    .collect();
                Some(PathMatch {
                    remaining: &path[end..],
                    params,
                })
            }
        }
    }
}

/// Split a route specification into its method set and path pattern.
///
/// The text before the first space is a method list when it consists only of
/// uppercase ASCII letters and commas; otherwise the whole specification is
/// the path pattern and any method is accepted.
pub fn split_spec(spec: &str) -> Result<(BTreeSet<String>, &str), PatternError> {
    let Some((head, rest)) = spec.split_once(' ') else {
        return Ok((BTreeSet::new(), spec));
    };
    let looks_like_methods =
        !head.is_empty() && head.bytes().all(|b| b.is_ascii_uppercase() || b == b',');
    if !looks_like_methods {
        return Ok((BTreeSet::new(), spec));
    }

    let mut methods = BTreeSet::new();
    for method in head.split(',') {
        if method.is_empty() {
            return Err(PatternError::InvalidMethods {
                spec: spec.to_string(),
                methods: head.to_string(),
            });
        }
        methods.insert(method.to_string());
    }
    Ok((methods, rest.trim_start_matches(' ')))
}

enum Piece<'a> {
    Literal(&'a str),
    Param { name: &'a str, regex: &'a str },
}

fn tokenize(pattern: &str) -> Result<Vec<Piece<'_>>, PatternError> {
    let bytes = pattern.as_bytes();
    let mut pieces = Vec::new();
    let mut seen = HashSet::new();
    let mut literal_start = 0;
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'<' {
            i += 1;
            continue;
        }
        if literal_start < i {
            pieces.push(Piece::Literal(&pattern[literal_start..i]));
        }
        let (name, regex, end) = parse_token(pattern, i)?;
        if !seen.insert(name) {
            return Err(PatternError::DuplicateParam {
                pattern: pattern.to_string(),
                name: name.to_string(),
            });
        }
        pieces.push(Piece::Param { name, regex });
        i = end;
        literal_start = end;
    }
    if literal_start < bytes.len() {
        pieces.push(Piece::Literal(&pattern[literal_start..]));
    }
    Ok(pieces)
}

/// Parse the token opening at byte `start`, returning its name, regex and
/// the byte offset just past the closing `>`.
fn parse_token(pattern: &str, start: usize) -> Result<(&str, &str, usize), PatternError> {
    let unterminated = || PatternError::UnterminatedToken {
        pattern: pattern.to_string(),
        position: start,
    };

    let body_start = start + 1;
    let rest = &pattern[body_start..];
    let name_len = rest.find([':', '>']).ok_or_else(unterminated)?;
    let name = &rest[..name_len];
    if !is_identifier(name) {
        return Err(PatternError::InvalidParamName {
            pattern: pattern.to_string(),
            name: name.to_string(),
        });
    }

    if rest.as_bytes()[name_len] == b'>' {
        return Ok((name, DEFAULT_PARAM_REGEX, body_start + name_len + 1));
    }

    let regex_start = body_start + name_len + 1;
    let regex_len = regex_extent(&pattern[regex_start..]).ok_or_else(unterminated)?;
    if regex_len == 0 {
        return Err(PatternError::EmptyParamRegex {
            pattern: pattern.to_string(),
            name: name.to_string(),
        });
    }
    let regex = &pattern[regex_start..regex_start + regex_len];
    Ok((name, regex, regex_start + regex_len + 1))
}

/// Length of the token regex, ending at the first `>` outside any group,
/// character class or escape.
fn regex_extent(text: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut in_class = false;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => {
                i += 2;
                continue;
            }
            b'[' if !in_class => {
                in_class = true;
                // `[]...]` and `[^]...]` treat the leading `]` as a literal
                if bytes.get(i + 1) == Some(&b'^') {
                    i += 1;
                }
                if bytes.get(i + 1) == Some(&b']') {
                    i += 1;
                }
            }
            b']' if in_class => in_class = false,
            b'(' if !in_class => depth += 1,
            b')' if !in_class => depth = depth.saturating_sub(1),
            b'>' if !in_class && depth == 0 => return Some(i),
            _ => {}
        }
        i += 1;
    }
    None
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
