//! Matcher for the regex dialect the syllable grammar is written in.
//!
//! The `regex` crate has no lookaround, and the grammar needs lookbehind of
//! variable length (a shifter is legal only after a whole strong or weak
//! cluster). This engine covers exactly what the fragments use: literals,
//! `.`, classes with ranges and negation, groups, alternation, `?` `*` `+`,
//! and the four lookaround forms.
//!
//! Matching is done on sets of end positions rather than by backtracking, so
//! every way a node can match is known at once. That makes the longest match
//! trivial and lookbehind a question of "does some start position reach
//! here".

use crate::error::PatternError;

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Empty,
    Literal(char),
    Any,
    Class {
        ranges: Vec<(char, char)>,
        negated: bool,
    },
    Concat(Vec<Node>),
    Alternate(Vec<Node>),
    Repeat {
        node: Box<Node>,
        min: usize,
        max: Option<usize>,
    },
    Look {
        node: Box<Node>,
        behind: bool,
        negated: bool,
        // longest text the body can consume, bounds the lookbehind scan
        width: Option<usize>,
    },
}

impl Node {
    fn max_width(&self) -> Option<usize> {
        match self {
            Node::Empty | Node::Look { .. } => Some(0),
            Node::Literal(_) | Node::Any | Node::Class { .. } => Some(1),
            Node::Concat(items) => items
                .iter()
                .try_fold(0usize, |acc, item| Some(acc + item.max_width()?)),
            Node::Alternate(branches) => branches
                .iter()
                .try_fold(0usize, |acc, b| Some(acc.max(b.max_width()?))),
            Node::Repeat { node, max, .. } => match (node.max_width()?, max) {
                (0, _) => Some(0),
                (w, Some(m)) => Some(w * m),
                (_, None) => None,
            },
        }
    }
}

/// Text being matched: an optional synthetic first character followed by a
/// slice of the real input.
#[derive(Clone, Copy)]
struct Haystack<'a> {
    head: Option<char>,
    rest: &'a [char],
}

impl Haystack<'_> {
    fn get(&self, pos: usize) -> Option<char> {
        match self.head {
            Some(c) if pos == 0 => Some(c),
            Some(_) => self.rest.get(pos - 1).copied(),
            None => self.rest.get(pos).copied(),
        }
    }
}

/// A compiled grammar expression.
#[derive(Debug, Clone)]
pub struct Pattern {
    name: String,
    root: Node,
}

impl Pattern {
    pub fn parse(name: &str, source: &str) -> Result<Self, PatternError> {
        let mut parser = Parser {
            name,
            chars: source.chars().collect(),
            pos: 0,
        };
        let root = parser.parse_alternation()?;
        if parser.pos < parser.chars.len() {
            return Err(parser.error("unbalanced `)`"));
        }
        Ok(Self {
            name: name.to_string(),
            root,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Length (in chars) of the longest match anchored at the start of `text`.
    pub fn longest_match(&self, text: &[char]) -> Option<usize> {
        self.longest(Haystack { head: None, rest: text })
    }

    /// Like [`Pattern::longest_match`] on `head` followed by `text`, without
    /// copying `text`. The returned length counts `head`.
    pub fn longest_match_after(&self, head: char, text: &[char]) -> Option<usize> {
        self.longest(Haystack {
            head: Some(head),
            rest: text,
        })
    }

    pub fn is_match(&self, text: &str) -> bool {
        let chars: Vec<char> = text.chars().collect();
        ends(&self.root, Haystack { head: None, rest: &chars }, 0)
            .binary_search(&chars.len())
            .is_ok()
    }

    fn longest(&self, hay: Haystack<'_>) -> Option<usize> {
        ends(&self.root, hay, 0).last().copied()
    }
}

fn sorted_unique(mut positions: Vec<usize>) -> Vec<usize> {
    positions.sort_unstable();
    positions.dedup();
    positions
}

fn step(node: &Node, hay: Haystack<'_>, from: &[usize]) -> Vec<usize> {
    let mut out = Vec::new();
    for &pos in from {
        out.extend(ends(node, hay, pos));
    }
    sorted_unique(out)
}

fn class_contains(ranges: &[(char, char)], c: char) -> bool {
    ranges.iter().any(|&(lo, hi)| lo <= c && c <= hi)
}

/// Every position at which `node` can finish when started at `pos`, sorted.
fn ends(node: &Node, hay: Haystack<'_>, pos: usize) -> Vec<usize> {
    match node {
        Node::Empty => vec![pos],
        Node::Literal(c) => match hay.get(pos) {
            Some(h) if h == *c => vec![pos + 1],
            _ => Vec::new(),
        },
        Node::Any => match hay.get(pos) {
            Some(_) => vec![pos + 1],
            None => Vec::new(),
        },
        Node::Class { ranges, negated } => match hay.get(pos) {
            Some(c) if class_contains(ranges, c) != *negated => vec![pos + 1],
            _ => Vec::new(),
        },
        Node::Concat(items) => {
            let mut current = vec![pos];
            for item in items {
                current = step(item, hay, &current);
                if current.is_empty() {
                    break;
                }
            }
            current
        }
        Node::Alternate(branches) => {
            let mut out = Vec::new();
            for branch in branches {
                out.extend(ends(branch, hay, pos));
            }
            sorted_unique(out)
        }
        Node::Repeat { node, min, max } => {
            let mut out = Vec::new();
            if *min == 0 {
                out.push(pos);
            }
            let mut current = vec![pos];
            let mut count = 0;
            while max.map_or(true, |m| count < m) {
                let next = step(node, hay, &current);
                count += 1;
                // a position already reached with fewer repetitions has at
                // least as much budget left, so revisiting it adds nothing
                let fresh: Vec<usize> = if count > *min {
                    next.into_iter().filter(|p| !out.contains(p)).collect()
                } else {
                    next
                };
                if count >= *min {
                    out.extend(fresh.iter().copied());
                }
                if fresh.is_empty() {
                    break;
                }
                current = fresh;
            }
            sorted_unique(out)
        }
        Node::Look {
            node,
            behind,
            negated,
            width,
        } => {
            let found = if *behind {
                let lowest = width.map_or(0, |w| pos.saturating_sub(w));
                (lowest..=pos)
                    .rev()
                    .any(|start| ends(node, hay, start).binary_search(&pos).is_ok())
            } else {
                !ends(node, hay, pos).is_empty()
            };
            if found != *negated {
                vec![pos]
            } else {
                Vec::new()
            }
        }
    }
}

struct Parser<'a> {
    name: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn error(&self, reason: &'static str) -> PatternError {
        PatternError::Syntax {
            fragment: self.name.to_string(),
            offset: self.pos,
            reason,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn next(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_str(&mut self, s: &str) -> bool {
        let n = s.chars().count();
        let matches = self.chars.len() >= self.pos + n
            && self.chars[self.pos..self.pos + n].iter().copied().eq(s.chars());
        if matches {
            self.pos += n;
        }
        matches
    }

    fn parse_alternation(&mut self) -> Result<Node, PatternError> {
        let mut branches = vec![self.parse_concat()?];
        while self.eat('|') {
            branches.push(self.parse_concat()?);
        }
        Ok(if branches.len() == 1 {
            branches.swap_remove(0)
        } else {
            Node::Alternate(branches)
        })
    }

    fn parse_concat(&mut self) -> Result<Node, PatternError> {
        let mut items = Vec::new();
        while let Some(c) = self.peek() {
            if c == '|' || c == ')' {
                break;
            }
            items.push(self.parse_repeat()?);
        }
        Ok(match items.len() {
            0 => Node::Empty,
            1 => items.swap_remove(0),
            _ => Node::Concat(items),
        })
    }

    fn parse_repeat(&mut self) -> Result<Node, PatternError> {
        let mut node = self.parse_atom()?;
        loop {
            let (min, max) = match self.peek() {
                Some('?') => (0, Some(1)),
                Some('*') => (0, None),
                Some('+') => (1, None),
                _ => break,
            };
            self.pos += 1;
            node = Node::Repeat {
                node: Box::new(node),
                min,
                max,
            };
        }
        Ok(node)
    }

    fn parse_atom(&mut self) -> Result<Node, PatternError> {
        let c = self.next().ok_or_else(|| self.error("unexpected end of pattern"))?;
        match c {
            '(' => self.parse_group(),
            '[' => self.parse_class(),
            '.' => Ok(Node::Any),
            '\\' => Ok(Node::Literal(self.parse_escape()?)),
            '?' | '*' | '+' => Err(self.error("quantifier without a target")),
            '{' | '}' => Err(self.error("unresolved placeholder")),
            _ => Ok(Node::Literal(c)),
        }
    }

    fn parse_group(&mut self) -> Result<Node, PatternError> {
        // (behind, negated)
        let look = if self.eat_str("?:") {
            None
        } else if self.eat_str("?=") {
            Some((false, false))
        } else if self.eat_str("?!") {
            Some((false, true))
        } else if self.eat_str("?<=") {
            Some((true, false))
        } else if self.eat_str("?<!") {
            Some((true, true))
        } else if self.peek() == Some('?') {
            return Err(self.error("unsupported group flag"));
        } else {
            None
        };
        let inner = self.parse_alternation()?;
        if !self.eat(')') {
            return Err(self.error("unclosed group"));
        }
        Ok(match look {
            Some((behind, negated)) => Node::Look {
                width: inner.max_width(),
                node: Box::new(inner),
                behind,
                negated,
            },
            None => inner,
        })
    }

    fn parse_class(&mut self) -> Result<Node, PatternError> {
        let negated = self.eat('^');
        let mut ranges = Vec::new();
        loop {
            let c = self.next().ok_or_else(|| self.error("unclosed character class"))?;
            if c == ']' {
                break;
            }
            let lo = if c == '\\' { self.parse_escape()? } else { c };
            let is_range = self.peek() == Some('-') && self.chars.get(self.pos + 1) != Some(&']');
            if is_range {
                self.pos += 1;
                let c = self.next().ok_or_else(|| self.error("unclosed character class"))?;
                let hi = if c == '\\' { self.parse_escape()? } else { c };
                if hi < lo {
                    return Err(self.error("reversed class range"));
                }
                ranges.push((lo, hi));
            } else {
                ranges.push((lo, lo));
            }
        }
        if ranges.is_empty() {
            return Err(self.error("empty character class"));
        }
        Ok(Node::Class { ranges, negated })
    }

    fn parse_escape(&mut self) -> Result<char, PatternError> {
        match self.next() {
            Some('n') => Ok('\n'),
            Some('t') => Ok('\t'),
            Some(c) if !c.is_alphanumeric() => Ok(c),
            Some(_) => Err(self.error("unsupported escape")),
            None => Err(self.error("trailing backslash")),
        }
    }
}
