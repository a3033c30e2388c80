use super::path::{EditPath, PathSegment};
use crate::error::{CabinetError, Result};
use crate::validation::ValidationErrors;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::fmt;

/// A leaf value. Edits only ever replace leaves, so containers keep their
/// shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
}

impl Scalar {
    pub fn from_value(value: &Value) -> Option<Scalar> {
        match value {
            Value::Null => Some(Scalar::Null),
            Value::Bool(b) => Some(Scalar::Bool(*b)),
            Value::Number(n) => Some(Scalar::Number(n.clone())),
            Value::String(s) => Some(Scalar::String(s.clone())),
            Value::Array(_) | Value::Object(_) => None,
        }
    }

    pub fn into_value(self) -> Value {
        match self {
            Scalar::Null => Value::Null,
            Scalar::Bool(b) => Value::Bool(b),
            Scalar::Number(n) => Value::Number(n),
            Scalar::String(s) => Value::String(s),
        }
    }

    /// Coerces text typed into a form control to the type of the leaf it
    /// replaces.
    ///
    /// Strings stay strings. Numbers must parse as a JSON number and
    /// booleans as `true`/`false`. A null leaf takes any JSON scalar literal
    /// and otherwise becomes a string.
    pub fn parse_for(existing: &Value, raw: &str, path: &EditPath) -> Result<Scalar> {
        let field = path.to_string();
        match existing {
            Value::String(_) => Ok(Scalar::String(raw.to_string())),
            Value::Number(_) => match serde_json::from_str::<Value>(raw.trim()) {
                Ok(Value::Number(n)) => Ok(Scalar::Number(n)),
                _ => Err(ValidationErrors::single(field, format!("'{}' is not a number", raw)).into()),
            },
            Value::Bool(_) => match raw.trim() {
                "true" => Ok(Scalar::Bool(true)),
                "false" => Ok(Scalar::Bool(false)),
                _ => Err(ValidationErrors::single(field, "expected true or false").into()),
            },
            Value::Null => Ok(serde_json::from_str::<Value>(raw.trim())
                .ok()
                .as_ref()
                .and_then(Scalar::from_value)
                .unwrap_or_else(|| Scalar::String(raw.to_string()))),
            Value::Array(_) | Value::Object(_) => Err(CabinetError::Precondition(format!(
                "'{}' addresses a container, not a leaf",
                path
            ))),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::String(s) => f.write_str(s),
            other => write!(f, "{}", other.clone().into_value()),
        }
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::String(s.to_string())
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Scalar::String(s)
    }
}

impl From<bool> for Scalar {
    fn from(b: bool) -> Self {
        Scalar::Bool(b)
    }
}

impl From<i64> for Scalar {
    fn from(n: i64) -> Self {
        Scalar::Number(n.into())
    }
}

fn unresolved(path: &EditPath, depth: usize, why: &str) -> CabinetError {
    let prefix = EditPath::from(path.segments()[..=depth].to_vec());
    CabinetError::Precondition(format!("path '{}' does not resolve at '{}': {}", path, prefix, why))
}

/// Returns a copy of `doc` with the leaf at `path` replaced by `value`.
///
/// Every container on the path is rebuilt; everything off the path is cloned
/// untouched. Fails without producing anything when the path does not
/// resolve or names a container.
pub fn edit_leaf(doc: &Value, path: &EditPath, value: Scalar) -> Result<Value> {
    rebuild(doc, path, 0, value).inspect_err(|e| tracing::error!(%path, "edit rejected: {}", e))
}

fn rebuild(node: &Value, path: &EditPath, depth: usize, value: Scalar) -> Result<Value> {
    let Some(segment) = path.segments().get(depth) else {
        return match node {
            Value::Array(_) | Value::Object(_) => Err(CabinetError::Precondition(format!(
                "'{}' addresses a container, not a leaf",
                path
            ))),
            _ => Ok(value.into_value()),
        };
    };

    match (segment, node) {
        (PathSegment::Key(key), Value::Object(map)) => {
            let child = map
                .get(key)
                .ok_or_else(|| unresolved(path, depth, "missing key"))?;
            let replaced = rebuild(child, path, depth + 1, value)?;
            let mut rebuilt = map.clone();
            rebuilt.insert(key.clone(), replaced);
            Ok(Value::Object(rebuilt))
        }
        (PathSegment::Index(i), Value::Array(items)) => {
            let child = items
                .get(*i)
                .ok_or_else(|| unresolved(path, depth, "index out of bounds"))?;
            let replaced = rebuild(child, path, depth + 1, value)?;
            let mut rebuilt = items.clone();
            rebuilt[*i] = replaced;
            Ok(Value::Array(rebuilt))
        }
        (PathSegment::Key(_), Value::Array(_)) => Err(unresolved(path, depth, "key applied to an array")),
        (PathSegment::Index(_), Value::Object(_)) => {
            Err(unresolved(path, depth, "index applied to an object"))
        }
        _ => Err(unresolved(path, depth, "cannot descend into a scalar")),
    }
}

/// Replaces the leaf at `path` inside `doc`. On error `doc` is unchanged.
pub fn edit_leaf_in_place(doc: &mut Value, path: &EditPath, value: Scalar) -> Result<()> {
    let target = locate_leaf_mut(doc, path)
        .inspect_err(|e| tracing::error!(%path, "edit rejected: {}", e))?;
    *target = value.into_value();
    Ok(())
}

fn locate_leaf_mut<'a>(doc: &'a mut Value, path: &EditPath) -> Result<&'a mut Value> {
    let mut node = doc;
    for (depth, segment) in path.segments().iter().enumerate() {
        node = match (segment, node) {
            (PathSegment::Key(key), Value::Object(map)) => map
                .get_mut(key)
                .ok_or_else(|| unresolved(path, depth, "missing key"))?,
            (PathSegment::Index(i), Value::Array(items)) => items
                .get_mut(*i)
                .ok_or_else(|| unresolved(path, depth, "index out of bounds"))?,
            (PathSegment::Key(_), Value::Array(_)) => {
                return Err(unresolved(path, depth, "key applied to an array"))
            }
            (PathSegment::Index(_), Value::Object(_)) => {
                return Err(unresolved(path, depth, "index applied to an object"))
            }
            _ => return Err(unresolved(path, depth, "cannot descend into a scalar")),
        };
    }
    if node.is_array() || node.is_object() {
        return Err(CabinetError::Precondition(format!(
            "'{}' addresses a container, not a leaf",
            path
        )));
    }
    Ok(node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn p(s: &str) -> EditPath {
        s.parse().unwrap()
    }

    #[test]
    fn edited_document_keeps_key_order() {
        let doc: Value = serde_json::from_str(r#"{"zeta": 1, "alpha": {"b": "x", "a": "y"}}"#).unwrap();
        let edited = edit_leaf(&doc, &p("alpha.b"), Scalar::String("z".into())).unwrap();
        assert_eq!(
            serde_json::to_string(&edited).unwrap(),
            r#"{"zeta":1,"alpha":{"b":"z","a":"y"}}"#
        );
    }

    #[test]
    fn replaces_nested_array_element() {
        let doc = json!({ "hero": { "title": "Welcome", "items": ["a", "b"] } });
        let edited = edit_leaf(&doc, &p("hero.items.1"), "B".into()).unwrap();
        assert_eq!(
            edited,
            json!({ "hero": { "title": "Welcome", "items": ["a", "B"] } })
        );
        assert_eq!(doc["hero"]["items"][1], json!("b"));
    }

    #[test]
    fn siblings_keep_their_shape() {
        let doc = json!({
            "hero": { "title": "Welcome", "items": ["a", "b"] },
            "about": { "paragraphs": [{ "text": "x", "bold": false }, { "text": "y" }] },
            "footer": null
        });
        let edited = edit_leaf(&doc, &p("about.paragraphs.0.bold"), true.into()).unwrap();

        assert_eq!(edited["hero"], doc["hero"]);
        assert_eq!(edited["footer"], doc["footer"]);
        assert_eq!(edited["about"]["paragraphs"][1], doc["about"]["paragraphs"][1]);
        assert_eq!(edited["about"]["paragraphs"][0]["text"], json!("x"));
        assert_eq!(edited["about"]["paragraphs"][0]["bold"], json!(true));
        assert_eq!(
            edited.as_object().unwrap().len(),
            doc.as_object().unwrap().len()
        );
    }

    #[test]
    fn editing_twice_is_idempotent() {
        let doc = json!({ "a": [1, 2, { "b": "c" }] });
        let once = edit_leaf(&doc, &p("a.2.b"), "z".into()).unwrap();
        let twice = edit_leaf(&once, &p("a.2.b"), "z".into()).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn unresolved_paths_are_preconditions() {
        let doc = json!({ "hero": { "items": ["a"] }, "n": 3 });
        for bad in ["hero.items.4", "hero.missing", "hero.items.x", "hero.0", "n.x", "hero", "hero.items"] {
            let err = edit_leaf(&doc, &p(bad), "v".into()).unwrap_err();
            assert!(matches!(err, CabinetError::Precondition(_)), "{bad}: {err}");
        }
    }

    #[test]
    fn in_place_matches_pure_and_leaves_doc_on_error() {
        let doc = json!({ "hero": { "title": "Welcome", "items": ["a", "b"] } });

        let mut held = doc.clone();
        edit_leaf_in_place(&mut held, &p("hero.title"), "Bienvenue".into()).unwrap();
        assert_eq!(held, edit_leaf(&doc, &p("hero.title"), "Bienvenue".into()).unwrap());

        let before = held.clone();
        assert!(edit_leaf_in_place(&mut held, &p("hero.items.2"), "c".into()).is_err());
        assert_eq!(held, before);
    }

    #[test]
    fn root_scalar_can_be_replaced() {
        let edited = edit_leaf(&json!("old"), &EditPath::root(), "new".into()).unwrap();
        assert_eq!(edited, json!("new"));
    }

    #[test]
    fn coercion_follows_leaf_type() {
        let path = p("x");
        assert_eq!(Scalar::parse_for(&json!("s"), "42", &path).unwrap(), Scalar::String("42".into()));
        assert_eq!(Scalar::parse_for(&json!(1), " 2.5 ", &path).unwrap().into_value(), json!(2.5));
        assert_eq!(Scalar::parse_for(&json!(false), "true", &path).unwrap(), Scalar::Bool(true));
        assert_eq!(Scalar::parse_for(&json!(null), "12", &path).unwrap().into_value(), json!(12));
        assert_eq!(Scalar::parse_for(&json!(null), "hello", &path).unwrap(), Scalar::String("hello".into()));

        let err = Scalar::parse_for(&json!(1), "abc", &path).unwrap_err();
        assert!(matches!(err, CabinetError::Validation(ref v) if v.has("x")));
        assert!(Scalar::parse_for(&json!(true), "yes", &path).is_err());
        assert!(matches!(
            Scalar::parse_for(&json!([]), "1", &path).unwrap_err(),
            CabinetError::Precondition(_)
        ));
    }
}
