//! Navigation of YANG-shaped attribute trees.
//!
//! A [`Path`] is a sequence of [`Step`]s. Literal keys descend into object members, while
//! [`Step::FirstKey`] treats the current node as a keyed list (an object mapping instance
//! identifiers to instance sub-trees) and descends into its first entry.
//!
//! Keyed lists in notifications are expected to carry a single relevant entry. When more than
//! one is present the first one in document order is selected, every time.

use core::fmt::{self, Display, Formatter, Write};
use serde_json::{Map, Value};
use thiserror::Error;

/// One step of a [`Path`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Descend into the named object member.
    Key(&'static str),

    /// Descend into the first entry of a keyed list.
    FirstKey,
}

pub type Path = &'static [Step];

/// Builds a static [`Path`]. `*` stands for [`Step::FirstKey`].
///
/// ```ignore
/// const PEER_AS: Path = yang_path!("bgp", "neighbors", "neighbor", *, "state", "peer_as");
/// ```
macro_rules! yang_path {
    (@step *) => {
        $crate::engine::Step::FirstKey
    };
    (@step $key:literal) => {
        $crate::engine::Step::Key($key)
    };
    ($($step:tt),* $(,)?) => {
        &[$($crate::engine::path::yang_path!(@step $step)),*]
    };
}

pub(crate) use yang_path;

/// Failure to pull a value out of a notification's attribute tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("path '{path}' not found")]
    PathNotFound { path: String },

    #[error("value at '{path}' is not a scalar")]
    NotScalar { path: String },

    #[error("value at '{path}' is not numeric")]
    NotNumeric { path: String },
}

/// Renders a path as `a/b/*/c`.
struct DisplayPath<'a>(&'a [Step]);

impl Display for DisplayPath<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (i, step) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_char('/')?;
            }

            match step {
                Step::Key(key) => f.write_str(key)?,
                Step::FirstKey => f.write_char('*')?,
            }
        }

        Ok(())
    }
}

#[must_use]
pub fn display_path(path: &[Step]) -> String {
    DisplayPath(path).to_string()
}

fn not_found(path: &[Step], walked: usize) -> ExtractError {
    ExtractError::PathNotFound {
        path: display_path(&path[..walked]),
    }
}

/// Picks the entry of a keyed list the engine works with.
fn first_entry(list: &Map<String, Value>) -> Option<(&String, &Value)> {
    list.iter().next()
}

/// Walks `path` from `tree` and returns the node it lands on.
pub fn extract<'a>(tree: &'a Value, path: &[Step]) -> Result<&'a Value, ExtractError> {
    let mut node = tree;
    for (i, step) in path.iter().enumerate() {
        let next = match (step, node) {
            (Step::Key(key), Value::Object(map)) => map.get(*key),
            (Step::FirstKey, Value::Object(map)) => first_entry(map).map(|(_, entry)| entry),
            _ => None,
        };

        node = next.ok_or_else(|| not_found(path, i + 1))?;
    }

    Ok(node)
}

/// Walks `path` to a keyed list and returns the key of the selected entry.
pub fn extract_key<'a>(tree: &'a Value, path: &[Step]) -> Result<&'a str, ExtractError> {
    extract(tree, path)?
        .as_object()
        .and_then(first_entry)
        .map(|(key, _)| key.as_str())
        .ok_or_else(|| ExtractError::PathNotFound {
            path: format!("{}/*", DisplayPath(path)),
        })
}

/// Walks `path` to a scalar leaf and renders it as a label value.
pub fn extract_scalar(tree: &Value, path: &[Step]) -> Result<String, ExtractError> {
    match extract(tree, path)? {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => Err(ExtractError::NotScalar { path: display_path(path) }),
    }
}

/// Walks `path` to a finite numeric leaf. Numbers encoded as strings are accepted.
pub fn extract_number(tree: &Value, path: &[Step]) -> Result<f64, ExtractError> {
    let value = extract(tree, path)?;
    value
        .as_f64()
        .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
        .filter(|n: &f64| n.is_finite())
        .ok_or_else(|| ExtractError::NotNumeric { path: display_path(path) })
}
