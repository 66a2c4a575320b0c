//! tpl-i18n - translatable text extraction for markup templates
//!
//! Text wrapped in `<lang>...</lang>`, either as an element or as a whole
//! attribute value, is pulled out into a key to text map and replaced in the
//! template by a runtime expression. Keys and expressions come from a
//! caller-supplied [`KeyPolicy`].
//!
//! # Example
//!
//! ```rust
//! use tpl_i18n::SequentialKeys;
//!
//! let policy = SequentialKeys::new("node_test_", "{[ this.{key} ]}");
//! let result = tpl_i18n::transform(
//!     r#"<input placeholder="<lang>请输入</lang>"><lang>汉字</lang>"#,
//!     policy,
//! ).unwrap();
//!
//! assert_eq!(
//!     result.code,
//!     r#"<input placeholder="{[ this.node_test_1 ]}">{[ this.node_test_2 ]}"#
//! );
//! assert_eq!(result.lang_map["node_test_1"], "请输入");
//! assert_eq!(result.lang_map["node_test_2"], "汉字");
//! ```

// Public modules
pub mod error;
pub mod policy;
pub mod replacement;
pub mod splice;
pub mod transform;

pub use error::{Result, TplI18nError};
pub use policy::{KeyPolicy, SequentialKeys, TransformOptions, KEY_PLACEHOLDER};
pub use replacement::{KeyGenerator, Occurrence, Replacement};
pub use splice::SpliceBuffer;
pub use tpl_i18n_ast::{Attribute, Document, Location, NodeRef, Span};
pub use transform::{
    has_marker_ancestor, marker_text, transform, transform_from_file, LangMap, Transformed,
    Transformer, MARKER_TAG,
};
