//! Generic subtree search over schema-free JSON.
//!
//! API payloads arrive without a version or a stable schema, so entities are
//! recovered by shape rather than by location: the whole tree is walked and
//! every object or array node is offered to a matcher predicate.
//!
//! ## Algorithm
//! Depth-first, pre-order. The root is tested first, then each child in
//! document order. A node that matches is recorded and its children are
//! still visited, so an entity nested inside another matching entity
//! (a quoted post embedding its own author, for instance) is reported as well.
//!
//! Cost is O(nodes) per call. Input must be acyclic, which `serde_json::Value`
//! guarantees by construction.

use serde_json::Value;
use std::convert::Infallible;
use std::fmt;

/// One step of the route from the root to a matched node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // RFC 6901 escaping
            PathSegment::Key(key) => write!(f, "{}", key.replace('~', "~0").replace('/', "~1")),
            PathSegment::Index(index) => write!(f, "{}", index),
        }
    }
}

/// A matched subtree together with the key/index sequence leading to it.
#[derive(Debug, Clone, PartialEq)]
pub struct Match<'a> {
    pub value: &'a Value,
    pub path: Vec<PathSegment>,
}

impl Match<'_> {
    /// Render the path as a JSON pointer (`""` for the root).
    pub fn pointer(&self) -> String {
        self.path
            .iter()
            .map(|segment| format!("/{}", segment))
            .collect()
    }
}

/// Return every object/array node of `json` accepted by `matcher`,
/// in pre-order.
pub fn extract<'a, F>(json: &'a Value, matcher: F) -> Vec<Match<'a>>
where
    F: Fn(&Value) -> bool,
{
    match try_extract(json, |value| Ok::<_, Infallible>(matcher(value))) {
        Ok(matches) => matches,
        Err(never) => match never {},
    }
}

/// Like [`extract`], keeping only the matched values.
pub fn extract_objects<'a, F>(json: &'a Value, matcher: F) -> Vec<&'a Value>
where
    F: Fn(&Value) -> bool,
{
    extract(json, matcher)
        .into_iter()
        .map(|m| m.value)
        .collect()
}

/// Fallible form of [`extract`].
///
/// The first error returned by `matcher` stops the walk and is handed back
/// unchanged. Returning `Ok(false)` is not an error, it is simply no match.
pub fn try_extract<'a, F, E>(json: &'a Value, mut matcher: F) -> Result<Vec<Match<'a>>, E>
where
    F: FnMut(&Value) -> Result<bool, E>,
{
    let mut results = Vec::new();
    let mut path = Vec::new();
    walk(json, &mut path, &mut matcher, &mut results)?;
    Ok(results)
}

fn walk<'a, F, E>(
    node: &'a Value,
    path: &mut Vec<PathSegment>,
    matcher: &mut F,
    results: &mut Vec<Match<'a>>,
) -> Result<(), E>
where
    F: FnMut(&Value) -> Result<bool, E>,
{
    match node {
        Value::Object(map) => {
            if matcher(node)? {
                results.push(Match { value: node, path: path.clone() });
            }
            for (key, child) in map {
                path.push(PathSegment::Key(key.clone()));
                walk(child, path, matcher, results)?;
                path.pop();
            }
        }
        Value::Array(items) => {
            if matcher(node)? {
                results.push(Match { value: node, path: path.clone() });
            }
            for (index, child) in items.iter().enumerate() {
                path.push(PathSegment::Index(index));
                walk(child, path, matcher, results)?;
                path.pop();
            }
        }
        // primitives are never offered to the matcher
        _ => {}
    }
    Ok(())
}
