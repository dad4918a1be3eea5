//! Field error tree: accumulates every failure from one conversion attempt.
//!
//! A conversion never stops at the first bad field. Each converter returns an
//! [`ErrorTree`] describing everything wrong with its slice of the input, and
//! enclosing converters combine sibling trees and scope them under the field
//! name where they occurred. The caller flattens the finished tree into a flat
//! list of `(message, path)` pairs for reporting.
//!
//! The tree is append-only by construction: [`ErrorTree::combine`] keeps both
//! branches, and flattening visits every leaf exactly once.

use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

/// Message for a required product component absent from the JSON object.
pub const MISSING_PROPERTY: &str = "required property is missing";

/// Message for a JSON object key that matches no declared component.
pub const UNEXPECTED_PROPERTY: &str = "unexpected property";

/// Generic message shown for internal failures. The real cause is retained
/// on the node for diagnostics but never rendered to callers.
pub const INTERNAL_ERROR: &str = "internal conversion error";

// ---------------------------------------------------------------------------
// Tree
// ---------------------------------------------------------------------------

/// An immutable tree of conversion errors.
///
/// Four shapes: a single message leaf, an internal-failure leaf carrying an
/// opaque cause, a group of two independent sibling subtrees, and a subtree
/// scoped one nesting level deeper under a field name.
#[derive(Debug, Clone)]
pub enum ErrorTree {
    /// One user-facing error message.
    Leaf(String),
    /// An unexpected failure inside converter logic. Rendered as
    /// [`INTERNAL_ERROR`]; the cause is kept only for logs.
    Internal(Arc<dyn StdError + Send + Sync>),
    /// Two independent sibling errors. Neither branch is ever dropped.
    Group(Box<ErrorTree>, Box<ErrorTree>),
    /// One level of nesting: every path in the subtree gains this prefix.
    Scoped(String, Box<ErrorTree>),
}

/// A single flattened error: the message and the field path from the root.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct FieldError {
    /// Field names from the outermost record down to the failing value.
    /// Empty for an error at the top-level value itself.
    pub path: Vec<String>,
    /// User-facing message.
    pub message: String,
}

impl FieldError {
    /// Render the path as a JSON-Pointer-style string (`/outer/inner`, or
    /// `/` for the root).
    pub fn pointer(&self) -> String {
        if self.path.is_empty() {
            "/".to_string()
        } else {
            let mut out = String::new();
            for segment in &self.path {
                out.push('/');
                out.push_str(segment);
            }
            out
        }
    }
}

impl ErrorTree {
    /// Create a single-message leaf.
    pub fn leaf(message: impl Into<String>) -> Self {
        ErrorTree::Leaf(message.into())
    }

    /// Create an internal-failure leaf from an unexpected error.
    ///
    /// The cause is never shown to callers; [`flatten`](Self::flatten)
    /// renders it as [`INTERNAL_ERROR`].
    pub fn internal(cause: impl StdError + Send + Sync + 'static) -> Self {
        ErrorTree::Internal(Arc::new(cause))
    }

    /// Wrap a tree one nesting level deeper under `name`.
    pub fn scope(name: impl Into<String>, node: ErrorTree) -> Self {
        ErrorTree::Scoped(name.into(), Box::new(node))
    }

    /// Combine two optional trees. "No error" is the identity element;
    /// two present trees become a group that keeps both.
    pub fn combine(a: Option<ErrorTree>, b: Option<ErrorTree>) -> Option<ErrorTree> {
        match (a, b) {
            (None, b) => b,
            (a, None) => a,
            (Some(a), Some(b)) => Some(ErrorTree::Group(Box::new(a), Box::new(b))),
        }
    }

    /// Fold another tree into an accumulator.
    pub fn merge(accumulator: &mut Option<ErrorTree>, more: ErrorTree) {
        *accumulator = Self::combine(accumulator.take(), Some(more));
    }

    /// Flatten into a list of `(message, path)` pairs.
    ///
    /// The list length equals the number of leaves in the tree; the order is
    /// stable for a given tree but otherwise unspecified.
    pub fn flatten(&self) -> Vec<FieldError> {
        let mut out = Vec::new();
        let mut path = Vec::new();
        self.walk(&mut path, &mut out);
        out
    }

    fn walk(&self, path: &mut Vec<String>, out: &mut Vec<FieldError>) {
        match self {
            ErrorTree::Leaf(message) => out.push(FieldError {
                path: path.clone(),
                message: message.clone(),
            }),
            ErrorTree::Internal(cause) => {
                tracing::warn!(path = ?path, cause = %cause, "internal conversion failure");
                out.push(FieldError {
                    path: path.clone(),
                    message: INTERNAL_ERROR.to_string(),
                });
            }
            ErrorTree::Group(a, b) => {
                a.walk(path, out);
                b.walk(path, out);
            }
            ErrorTree::Scoped(name, child) => {
                path.push(name.clone());
                child.walk(path, out);
                path.pop();
            }
        }
    }

    /// Number of leaves reachable from this node. Always at least 1.
    pub fn len(&self) -> usize {
        match self {
            ErrorTree::Leaf(_) | ErrorTree::Internal(_) => 1,
            ErrorTree::Group(a, b) => a.len() + b.len(),
            ErrorTree::Scoped(_, child) => child.len(),
        }
    }

    /// Present for API symmetry; a constructed tree always holds at least
    /// one leaf.
    pub fn is_empty(&self) -> bool {
        false
    }
}

impl fmt::Display for ErrorTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.flatten().iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}: {}", error.pointer(), error.message)?;
        }
        Ok(())
    }
}

// ===========================================================================
// Tests
// ===========================================================================
