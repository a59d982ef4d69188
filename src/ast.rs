use std::fmt;

/// A node of the bracket tree.
///
/// The program root is a `List` of exactly two lists: type declarations,
/// then function declarations. Shapes are not validated here; each phase
/// checks the pieces it consumes.
#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    List(Vec<Element>),
    Word(String),
    Str(String),
    Char(char),
    Int(i32),
    Float(f32),
}

impl Element {
    pub fn as_list(&self) -> Option<&[Element]> {
        match self {
            Element::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_word(&self) -> Option<&str> {
        match self {
            Element::Word(word) => Some(word),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            Element::Int(value) => Some(*value),
            _ => None,
        }
    }
}

fn write_escaped(f: &mut fmt::Formatter<'_>, text: &str) -> fmt::Result {
    for c in text.chars() {
        match c {
            '\\' => write!(f, "\\\\")?,
            '\'' => write!(f, "\\'")?,
            '"' => write!(f, "\\\"")?,
            '\n' => write!(f, "\\n")?,
            '\r' => write!(f, "\\r")?,
            '\t' => write!(f, "\\t")?,
            other => write!(f, "{other}")?,
        }
    }
    Ok(())
}

impl fmt::Display for Element {
    /// Renders the node back to source form. Lists are space-separated, so
    /// a parse of the output is structurally equal to the original tree.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Element::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Element::Word(word) => write!(f, "{word}"),
            Element::Str(text) => {
                write!(f, "\"")?;
                write_escaped(f, text)?;
                write!(f, "\"")
            }
            Element::Char(c) => {
                write!(f, "'")?;
                write_escaped(f, &c.to_string())?;
                write!(f, "'")
            }
            Element::Int(value) => write!(f, "{value}"),
            Element::Float(value) => write!(f, "{value:?}"),
        }
    }
}
