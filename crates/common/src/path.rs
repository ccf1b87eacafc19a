//! URL path templates
//!
//! A [`Path`] keeps the original template text (e.g. `/users/{userId}`) and
//! splits it into literal and variable parts. Variable parts cover only the
//! placeholder name; the `{`/`}` delimiters belong to neither kind of part.

use crate::{GeneratorError, Result};
use serde::ser::{SerializeStruct, Serializer};
use serde::Serialize;

const VAR_OPEN: char = '{';
const VAR_CLOSE: char = '}';

/// Kind of a path template part
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PartKind {
    Literal,
    Variable,
}

/// One part of a path template, as a byte span over the original text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathPart {
    pub start: usize,
    pub len: usize,
    pub kind: PartKind,
}

/// Parsed URL path template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Path {
    text: String,
    parts: Vec<PathPart>,
}

impl Path {
    /// Parse a path template
    ///
    /// # Examples
    /// ```
    /// use apigen_common::{PartKind, Path};
    ///
    /// let path = Path::parse("/rooms/{roomId}/state").unwrap();
    /// let kinds: Vec<_> = path.parts().iter().map(|p| p.kind).collect();
    /// assert_eq!(kinds, [PartKind::Literal, PartKind::Variable, PartKind::Literal]);
    /// assert_eq!(path.part_text(&path.parts()[1]), "roomId");
    /// ```
    pub fn parse(text: impl Into<String>) -> Result<Self> {
        let text = text.into();
        let mut parts = Vec::new();
        let mut literal_start = 0;
        let mut chars = text.char_indices();

        while let Some((i, c)) = chars.next() {
            match c {
                VAR_OPEN => {
                    if i > literal_start {
                        parts.push(PathPart {
                            start: literal_start,
                            len: i - literal_start,
                            kind: PartKind::Literal,
                        });
                    }
                    let var_start = i + 1;
                    let var_end = loop {
                        match chars.next() {
                            Some((j, VAR_CLOSE)) => break j,
                            Some((j, VAR_OPEN)) => {
                                return Err(malformed(&text, j, "nested variable marker"))
                            }
                            Some(_) => {}
                            None => return Err(malformed(&text, i, "unterminated variable")),
                        }
                    };
                    if var_end == var_start {
                        return Err(malformed(&text, i, "empty variable name"));
                    }
                    parts.push(PathPart {
                        start: var_start,
                        len: var_end - var_start,
                        kind: PartKind::Variable,
                    });
                    literal_start = var_end + 1;
                }
                VAR_CLOSE => return Err(malformed(&text, i, "unbalanced closing brace")),
                _ => {}
            }
        }
        if text.len() > literal_start {
            parts.push(PathPart {
                start: literal_start,
                len: text.len() - literal_start,
                kind: PartKind::Literal,
            });
        }

        Ok(Self { text, parts })
    }

    /// The original template text
    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn parts(&self) -> &[PathPart] {
        &self.parts
    }

    /// Text covered by a part of this path
    pub fn part_text(&self, part: &PathPart) -> &str {
        &self.text[part.start..part.start + part.len]
    }

    /// Names of all variables, in order of appearance
    pub fn variables(&self) -> impl Iterator<Item = &str> {
        self.parts
            .iter()
            .filter(|p| p.kind == PartKind::Variable)
            .map(|p| self.part_text(p))
    }

    /// Rebuild the template text from its parts
    pub fn reconstruct(&self) -> String {
        self.parts
            .iter()
            .map(|p| match p.kind {
                PartKind::Literal => self.part_text(p).to_string(),
                PartKind::Variable => format!("{VAR_OPEN}{}{VAR_CLOSE}", self.part_text(p)),
            })
            .collect()
    }

    /// First literal segment of the path, e.g. `users` for `/users/{id}`
    pub fn leading_segment(&self) -> &str {
        self.parts
            .first()
            .filter(|p| p.kind == PartKind::Literal)
            .and_then(|p| {
                self.part_text(p)
                    .split('/')
                    .find(|s| !s.is_empty())
            })
            .unwrap_or_default()
    }
}

impl std::fmt::Display for Path {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

impl Serialize for Path {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Part<'a> {
            text: &'a str,
            kind: PartKind,
        }

        let parts: Vec<Part> = self
            .parts
            .iter()
            .map(|p| Part {
                text: self.part_text(p),
                kind: p.kind,
            })
            .collect();
        let mut s = serializer.serialize_struct("Path", 2)?;
        s.serialize_field("text", &self.text)?;
        s.serialize_field("parts", &parts)?;
        s.end()
    }
}

fn malformed(path: &str, offset: usize, reason: &str) -> GeneratorError {
    GeneratorError::MalformedPath {
        path: path.to_string(),
        reason: format!("{} at offset {}", reason, offset),
    }
}
