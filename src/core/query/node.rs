//! Parent-linked chain of query locations and URL composition.
//!
//! Nodes are immutable and share their parents through `Arc`, so a child
//! never keeps anything alive but its ancestors.

use crate::core::client::encode_segment;
use once_cell::sync::OnceCell;
use std::fmt;
use std::sync::Arc;

/// Lazily computed segment, e.g. a freshly minted key.
pub type SegmentFn = Arc<dyn Fn() -> String + Send + Sync>;

enum Segment {
    Root { base_url: String },
    Child(String),
    Keyed { value: OnceCell<String>, make: SegmentFn },
}

/// One location in a query chain.
pub struct QueryNode {
    parent: Option<Arc<QueryNode>>,
    segment: Segment,
}

impl QueryNode {
    /// Chain root at `base_url` (trailing `/` removed).
    pub fn root(base_url: &str) -> Arc<Self> {
        Arc::new(QueryNode {
            parent: None,
            segment: Segment::Root {
                base_url: base_url.trim_end_matches('/').to_string(),
            },
        })
    }

    /// Literal child. The segment is escaped when the URL is built.
    pub fn child(parent: &Arc<Self>, segment: impl Into<String>) -> Arc<Self> {
        Arc::new(QueryNode {
            parent: Some(parent.clone()),
            segment: Segment::Child(segment.into()),
        })
    }

    /// Child whose segment comes from `make`, called at most once for the
    /// lifetime of the node.
    pub fn keyed(parent: &Arc<Self>, make: SegmentFn) -> Arc<Self> {
        Arc::new(QueryNode {
            parent: Some(parent.clone()),
            segment: Segment::Keyed {
                value: OnceCell::new(),
                make,
            },
        })
    }

    pub fn parent(&self) -> Option<&Arc<QueryNode>> {
        self.parent.as_ref()
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// This node's own segment, unescaped. Empty for the root.
    pub fn segment(&self) -> &str {
        match &self.segment {
            Segment::Root { .. } => "",
            Segment::Child(s) => s,
            Segment::Keyed { value, make } => value.get_or_init(|| make()),
        }
    }

    /// Unescaped path from the root down to this node.
    pub fn path(&self) -> String {
        let mut segments = Vec::new();
        let mut cursor = Some(self);
        while let Some(node) = cursor {
            if !node.is_root() {
                segments.push(node.segment());
            }
            cursor = node.parent.as_deref();
        }
        segments.reverse();
        format!("/{}", segments.join("/"))
    }

    fn contribute(&self, out: &mut String) {
        match &self.segment {
            Segment::Root { base_url } => out.push_str(base_url),
            _ => {
                out.push('/');
                out.push_str(&encode_segment(self.segment()));
            }
        }
    }
}

impl fmt::Debug for QueryNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryNode").field("path", &self.path()).finish()
    }
}

/// Composes resource URLs from a node chain.
pub struct PathBuilder;

impl PathBuilder {
    /// URL of `node`: the root's base address followed by every segment on
    /// the way down, each percent-encoded.
    ///
    /// ```
    /// use firetree::query::{PathBuilder, QueryNode};
    ///
    /// let root = QueryNode::root("https://db.example.com/");
    /// let users = QueryNode::child(&root, "users");
    /// let ann = QueryNode::child(&users, "ann smith");
    /// assert_eq!(PathBuilder::build_url(&ann), "https://db.example.com/users/ann%20smith");
    /// ```
    pub fn build_url(node: &QueryNode) -> String {
        let mut chain = Vec::new();
        let mut cursor = Some(node);
        while let Some(n) = cursor {
            chain.push(n);
            cursor = n.parent.as_deref();
        }

        let mut url = String::new();
        for n in chain.iter().rev() {
            n.contribute(&mut url);
        }
        url
    }
}
