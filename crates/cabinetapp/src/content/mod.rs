//! # Content Editor
//!
//! Page sections hold schema-less JSON documents. The editor never needs to
//! know their shape:
//!
//! - [`path`]: [`EditPath`], the address of one node (`hero.items.1`).
//! - [`form`]: [`render`] turns a document into a [`FormNode`] tree with one
//!   control per leaf.
//! - [`edit`]: [`edit_leaf`] replaces one leaf and rebuilds only the
//!   containers on its path, so sibling branches keep their exact shape.
//! - [`session`]: [`ContentEditor`], the load / edit / save state machine
//!   around an edit buffer.
//!
//! ```
//! use cabinetapp::content::{edit_leaf, EditPath};
//! use serde_json::json;
//!
//! let doc = json!({ "hero": { "title": "Welcome", "items": ["a", "b"] } });
//! let path: EditPath = "hero.items.1".parse().unwrap();
//! let edited = edit_leaf(&doc, &path, "B".into()).unwrap();
//! assert_eq!(edited, json!({ "hero": { "title": "Welcome", "items": ["a", "B"] } }));
//! ```

pub mod edit;
pub mod form;
pub mod path;
pub mod session;

pub use edit::{edit_leaf, edit_leaf_in_place, Scalar};
pub use form::{render, Control, FormNode, TEXTAREA_THRESHOLD};
pub use path::{EditPath, PathSegment};
pub use session::{ContentEditor, EditorState, SaveRequest};
