//! Slash-delimited locations inside the tree.

use std::fmt;
use std::str::FromStr;

/// An ordered sequence of non-empty segments.
///
/// Empty segments are discarded when parsing, so `"/a//b/"` and `"a/b"` are
/// the same path. The root is the path with no segments.
///
/// ```
/// use firetree::Path;
///
/// let path = Path::parse("/items//k1/");
/// assert_eq!(path.segments(), ["items", "k1"]);
/// assert_eq!(path.first(), Some("items"));
/// assert!(Path::parse("/").is_root());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Path {
    segments: Vec<String>,
}

impl Path {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn parse(raw: &str) -> Self {
        Path {
            segments: raw
                .split('/')
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    #[inline]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// The top-level key this path touches.
    #[inline]
    pub fn first(&self) -> Option<&str> {
        self.segments.first().map(String::as_str)
    }

    /// Everything below the first segment.
    #[inline]
    pub fn rest(&self) -> &[String] {
        self.segments.get(1..).unwrap_or(&[])
    }

    #[inline]
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Appends the segments of `other` below this path.
    pub fn join(&self, other: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.extend(Path::parse(other).segments);
        Path { segments }
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.segments.join("/"))
    }
}

impl FromStr for Path {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Path::parse(s))
    }
}

impl From<&str> for Path {
    fn from(s: &str) -> Self {
        Path::parse(s)
    }
}
