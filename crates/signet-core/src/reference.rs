//! Document and user references.
//!
//! A reference names a page as `wiki:Space.Page`. Users are pages too, so a
//! signer identity is just a [`DocumentReference`] (see [`UserReference`]).

use std::fmt;
use std::str::FromStr;

use crate::error::{CoreError, Result};

const WIKI_SEPARATOR: char = ':';
const SPACE_SEPARATOR: char = '.';
const ESCAPE: char = '\\';

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentReference {
    wiki: String,
    space: String,
    page: String,
}

/// Signer identities are user profile pages
pub type UserReference = DocumentReference;

impl DocumentReference {
    pub fn new(wiki: impl Into<String>, space: impl Into<String>, page: impl Into<String>) -> Self {
        Self {
            wiki: wiki.into(),
            space: space.into(),
            page: page.into(),
        }
    }

    pub fn wiki(&self) -> &str {
        &self.wiki
    }

    pub fn space(&self) -> &str {
        &self.space
    }

    pub fn page(&self) -> &str {
        &self.page
    }

    /// Parse a fully qualified `wiki:Space.Page` reference
    pub fn parse(input: &str) -> Result<Self> {
        let parts = split(input)?;
        match parts {
            RawParts {
                wiki: Some(wiki),
                space: Some(space),
                page,
            } if !wiki.is_empty() && !space.is_empty() && !page.is_empty() => {
                Ok(Self::new(wiki, space, page))
            }
            _ => Err(CoreError::InvalidReference(format!(
                "{:?} is not a full wiki:Space.Page reference",
                input
            ))),
        }
    }

    /// Resolve a possibly partial reference (`Page`, `Space.Page`,
    /// `wiki:Page`, `wiki:Space.Page`) against `base`
    pub fn resolve(input: &str, base: &DocumentReference) -> Result<Self> {
        let parts = split(input)?;
        if parts.page.is_empty() {
            return Err(CoreError::InvalidReference(format!(
                "{:?} does not name a page",
                input
            )));
        }
        let wiki = parts
            .wiki
            .filter(|w| !w.is_empty())
            .unwrap_or_else(|| base.wiki.clone());
        let space = parts
            .space
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| base.space.clone());
        Ok(Self::new(wiki, space, parts.page))
    }
}

struct RawParts {
    wiki: Option<String>,
    space: Option<String>,
    page: String,
}

/// Split on the first unescaped `:` and the last unescaped `.`, unescaping
/// every segment.
fn split(input: &str) -> Result<RawParts> {
    // (character, escaped) pairs
    let mut chars = Vec::with_capacity(input.len());
    let mut iter = input.chars();
    while let Some(c) = iter.next() {
        if c == ESCAPE {
            match iter.next() {
                Some(escaped) => chars.push((escaped, true)),
                None => {
                    return Err(CoreError::InvalidReference(format!(
                        "{:?} ends with a dangling escape",
                        input
                    )))
                }
            }
        } else {
            chars.push((c, false));
        }
    }

    let collect = |slice: &[(char, bool)]| slice.iter().map(|(c, _)| *c).collect::<String>();

    let wiki_end = chars
        .iter()
        .position(|(c, escaped)| *c == WIKI_SEPARATOR && !escaped);
    let (wiki, rest) = match wiki_end {
        Some(at) => (Some(collect(&chars[..at])), &chars[at + 1..]),
        None => (None, &chars[..]),
    };

    let space_end = rest
        .iter()
        .rposition(|(c, escaped)| *c == SPACE_SEPARATOR && !escaped);
    let (space, page) = match space_end {
        Some(at) => (Some(collect(&rest[..at])), collect(&rest[at + 1..])),
        None => (None, collect(rest)),
    };

    Ok(RawParts { wiki, space, page })
}

fn write_escaped(f: &mut fmt::Formatter<'_>, segment: &str) -> fmt::Result {
    for c in segment.chars() {
        if c == WIKI_SEPARATOR || c == SPACE_SEPARATOR || c == ESCAPE {
            write!(f, "{}", ESCAPE)?;
        }
        write!(f, "{}", c)?;
    }
    Ok(())
}

impl fmt::Display for DocumentReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_escaped(f, &self.wiki)?;
        write!(f, "{}", WIKI_SEPARATOR)?;
        write_escaped(f, &self.space)?;
        write!(f, "{}", SPACE_SEPARATOR)?;
        write_escaped(f, &self.page)
    }
}

impl FromStr for DocumentReference {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
