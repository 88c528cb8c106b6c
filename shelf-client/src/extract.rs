//! Recovery of the identifier the server assigned to a freshly written comment.
//!
//! Deployments of the comment service disagree on where they put that
//! identifier, and some omit it entirely. Each known layout is a [`Shape`];
//! they are probed in the order of [`SHAPES`] and the first hit wins.

use serde_json::Value;

use crate::api::ServerId;

/// A location inside a response body that may hold an identifier
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Shape {
    pub name: &'static str,
    path: &'static [&'static str],
}

impl Shape {
    const fn at(name: &'static str, path: &'static [&'static str]) -> Shape {
        Shape { name, path }
    }

    pub fn probe(&self, body: &Value) -> Option<ServerId> {
        let mut v = body;
        for key in self.path {
            v = v.get(key)?;
        }
        scalar_id(v)
    }
}

pub const SHAPES: &[Shape] = &[
    Shape::at("bare", &[]),
    Shape::at("data", &["data"]),
    Shape::at("commentId", &["commentId"]),
    Shape::at("data.commentId", &["data", "commentId"]),
    Shape::at("id", &["id"]),
    Shape::at("data.id", &["data", "id"]),
    Shape::at("reviewId", &["reviewId"]),
    Shape::at("data.reviewId", &["data", "reviewId"]),
    Shape::at("review_id", &["review_id"]),
    Shape::at("data.review_id", &["data", "review_id"]),
    Shape::at("result.commentId", &["result", "commentId"]),
    Shape::at("result.id", &["result", "id"]),
];

/// Integers, and strings that look like an identifier.
///
/// Some deployments put a status word or sentence in `data` where others put
/// the id, so this is a heuristic: a string counts only when it is a single
/// token holding at least one digit. `"created"` and `"successfully created"`
/// are skipped, `"c-5"` and uuids are kept. An id made only of letters is
/// missed, which leaves the write unresolved rather than listed under a
/// made-up id.
fn scalar_id(v: &Value) -> Option<ServerId> {
    match v {
        Value::Number(n) => n.as_i64().map(ServerId::Num),
        Value::String(s) if !looks_like_id(s.trim()) => None,
        Value::String(s) => ServerId::from_text(s),
        _ => None,
    }
}

fn looks_like_id(s: &str) -> bool {
    !s.contains(char::is_whitespace) && s.contains(|c: char| c.is_ascii_digit())
}

/// Returns None when no known shape matches, which some deployments do on
/// every successful write.
pub fn extract_id(body: &Value) -> Option<ServerId> {
    SHAPES.iter().find_map(|shape| {
        let id = shape.probe(body)?;
        tracing::debug!(shape = shape.name, %id, "recovered comment id from response");
        Some(id)
    })
}
