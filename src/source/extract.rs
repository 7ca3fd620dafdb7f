//! Path-based title extraction over arbitrary JSON.
//!
//! Supports the subset of JSONPath that real endpoint configurations use:
//!
//! | syntax              | meaning                                    |
//! |---------------------|--------------------------------------------|
//! | `$` (optional)      | the document root                          |
//! | `field`, `.field`   | child by name                              |
//! | `['a b']`           | child by quoted name                       |
//! | `*`, `.*`, `[*]`    | every member of an object / array          |
//! | `[2]`, `[-1]`       | array index (negative counts from the end) |
//! | `..field`, `..*`    | recursive descent                          |
//!
//! Matching never fails: a path that selects nothing, or a document that
//! does not have the expected shape, simply yields no titles.

use serde_json::Value;

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Selector {
    Field(String),
    Wildcard,
    Index(i64),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Step {
    Child(Selector),
    Descendant(Selector),
}

/// A parsed extraction path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonPath {
    steps: Vec<Step>,
}

impl JsonPath {
    /// Parse a path expression such as `result.*.title` or `$..name`.
    pub fn parse(path: &str) -> Result<Self> {
        Parser::new(path).parse()
    }

    /// Every node selected by this path, in document order.
    pub fn select<'a>(&self, document: &'a Value) -> Vec<&'a Value> {
        let mut nodes = vec![document];
        for step in &self.steps {
            let mut next = Vec::new();
            for node in nodes {
                match step {
                    Step::Child(sel) => apply(sel, node, &mut next),
                    Step::Descendant(sel) => {
                        let mut all = Vec::new();
                        descendants(node, &mut all);
                        for n in all {
                            apply(sel, n, &mut next);
                        }
                    }
                }
            }
            nodes = next;
        }
        nodes
    }

    /// The string leaves selected by this path.  Numbers, booleans, null,
    /// objects and arrays are dropped.
    pub fn titles(&self, document: &Value) -> Vec<String> {
        self.select(document)
            .into_iter()
            .filter_map(Value::as_str)
            .map(String::from)
            .collect()
    }
}

/// Apply `path` to `document` and return the matched string values.
///
/// A malformed path is treated like a path that matches nothing.
pub fn extract(path: &str, document: &Value) -> Vec<String> {
    JsonPath::parse(path)
        .map(|p| p.titles(document))
        .unwrap_or_default()
}

fn apply<'a>(selector: &Selector, node: &'a Value, out: &mut Vec<&'a Value>) {
    match (selector, node) {
        (Selector::Field(name), Value::Object(map)) => {
            if let Some(v) = map.get(name) {
                out.push(v);
            }
        }
        (Selector::Wildcard, Value::Object(map)) => out.extend(map.values()),
        (Selector::Wildcard, Value::Array(items)) => out.extend(items.iter()),
        (Selector::Index(i), Value::Array(items)) => {
            let len = items.len() as i64;
            let idx = if *i < 0 { len + i } else { *i };
            if (0..len).contains(&idx) {
                out.push(&items[idx as usize]);
            }
        }
        _ => {}
    }
}

/// Pre-order walk: the node itself, then each descendant.
fn descendants<'a>(node: &'a Value, out: &mut Vec<&'a Value>) {
    out.push(node);
    match node {
        Value::Object(map) => map.values().for_each(|v| descendants(v, out)),
        Value::Array(items) => items.iter().for_each(|v| descendants(v, out)),
        _ => {}
    }
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

struct Parser<'a> {
    src: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            chars: src.trim().chars().collect(),
            pos: 0,
        }
    }

    fn error(&self, reason: impl Into<String>) -> Error {
        Error::Extraction {
            path: self.src.to_string(),
            reason: reason.into(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn parse(mut self) -> Result<JsonPath> {
        let mut steps = Vec::new();

        if !self.eat('$') {
            // A bare leading name or wildcard: `result.*.title`, `*.name`.
            match self.peek() {
                Some('.') | Some('[') | None => {}
                Some(_) => steps.push(Step::Child(self.dot_selector()?)),
            }
        }

        while let Some(c) = self.peek() {
            match c {
                '.' => {
                    self.pos += 1;
                    if self.eat('.') {
                        let sel = if self.peek() == Some('[') {
                            self.pos += 1;
                            self.bracket_selector()?
                        } else {
                            self.dot_selector()?
                        };
                        steps.push(Step::Descendant(sel));
                    } else {
                        steps.push(Step::Child(self.dot_selector()?));
                    }
                }
                '[' => {
                    self.pos += 1;
                    steps.push(Step::Child(self.bracket_selector()?));
                }
                other => return Err(self.error(format!("unexpected `{other}` at {}", self.pos))),
            }
        }

        Ok(JsonPath { steps })
    }

    fn dot_selector(&mut self) -> Result<Selector> {
        if self.eat('*') {
            return Ok(Selector::Wildcard);
        }
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c == '.' || c == '[' {
                break;
            }
            self.pos += 1;
        }
        if start == self.pos {
            return Err(self.error(format!("expected a field name at {start}")));
        }
        Ok(Selector::Field(self.chars[start..self.pos].iter().collect()))
    }

    /// Parses what follows an opening `[`, including the closing `]`.
    fn bracket_selector(&mut self) -> Result<Selector> {
        let sel = match self.peek() {
            Some('*') => {
                self.pos += 1;
                Selector::Wildcard
            }
            Some(q @ ('\'' | '"')) => {
                self.pos += 1;
                let mut name = String::new();
                loop {
                    match self.peek() {
                        None => return Err(self.error("unterminated quoted name")),
                        Some('\\') => {
                            self.pos += 1;
                            match self.peek() {
                                Some(c) => name.push(c),
                                None => return Err(self.error("dangling escape")),
                            }
                        }
                        Some(c) if c == q => break,
                        Some(c) => name.push(c),
                    }
                    self.pos += 1;
                }
                self.pos += 1;
                Selector::Field(name)
            }
            Some(_) => {
                let start = self.pos;
                while matches!(self.peek(), Some(c) if c == '-' || c.is_ascii_digit()) {
                    self.pos += 1;
                }
                let digits: String = self.chars[start..self.pos].iter().collect();
                let idx = digits
                    .parse::<i64>()
                    .map_err(|_| self.error(format!("expected an index at {start}")))?;
                Selector::Index(idx)
            }
            None => return Err(self.error("unterminated `[`")),
        };
        if !self.eat(']') {
            return Err(self.error(format!("expected `]` at {}", self.pos)));
        }
        Ok(sel)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
