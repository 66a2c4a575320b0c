//! Key and expression policies supplied by the caller.
//!
//! A policy decides which catalog key each marker occurrence gets and what
//! placeholder text replaces it in the rewritten template. Policies may keep
//! state (a counter, say); the engine calls `gen_key` once per occurrence in
//! document order and never shares a policy between threads itself.

use serde::Deserialize;

use crate::error::{Result, TplI18nError};
use crate::replacement::Occurrence;

/// Placeholder substituted by [`SequentialKeys`] expression templates.
pub const KEY_PLACEHOLDER: &str = "{key}";

/// Caller-supplied key and expression generation.
pub trait KeyPolicy {
    /// Produce a candidate key for one marker occurrence.
    ///
    /// An error aborts the whole transform.
    fn gen_key(&mut self, occurrence: &Occurrence<'_>) -> Result<String>;

    /// Produce the runtime placeholder text for `key`.
    fn gen_expression(&self, key: &str) -> String;
}

impl<P: KeyPolicy + ?Sized> KeyPolicy for &mut P {
    fn gen_key(&mut self, occurrence: &Occurrence<'_>) -> Result<String> {
        (**self).gen_key(occurrence)
    }

    fn gen_expression(&self, key: &str) -> String {
        (**self).gen_expression(key)
    }
}

impl<P: KeyPolicy + ?Sized> KeyPolicy for Box<P> {
    fn gen_key(&mut self, occurrence: &Occurrence<'_>) -> Result<String> {
        (**self).gen_key(occurrence)
    }

    fn gen_expression(&self, key: &str) -> String {
        (**self).gen_expression(key)
    }
}

/// Policy built from two closures.
///
/// # Example
///
/// ```rust
/// use tpl_i18n::TransformOptions;
///
/// let mut index = 0;
/// let options = TransformOptions::new(
///     move |_occurrence| {
///         index += 1;
///         format!("node_test_{index}")
///     },
///     |key| format!("{{[ this.{key} ]}}"),
/// );
/// let result = tpl_i18n::transform("<p><lang>你好</lang></p>", options).unwrap();
/// assert_eq!(result.code, "<p>{[ this.node_test_1 ]}</p>");
/// ```
pub struct TransformOptions<K, E> {
    gen_key: K,
    gen_expression: E,
}

impl<K, E> TransformOptions<K, E> {
    pub fn new(gen_key: K, gen_expression: E) -> Self
    where
        K: FnMut(&Occurrence<'_>) -> String,
        E: Fn(&str) -> String,
    {
        Self {
            gen_key,
            gen_expression,
        }
    }
}

impl<K, E> KeyPolicy for TransformOptions<K, E>
where
    K: FnMut(&Occurrence<'_>) -> String,
    E: Fn(&str) -> String,
{
    fn gen_key(&mut self, occurrence: &Occurrence<'_>) -> Result<String> {
        Ok((self.gen_key)(occurrence))
    }

    fn gen_expression(&self, key: &str) -> String {
        (self.gen_expression)(key)
    }
}

/// Counter-based keys (`prefix` + number) with a templated expression.
///
/// Deserializes from JSON such as
/// `{"prefix": "node_test_", "start": 1, "expression": "{[ this.{key} ]}"}`;
/// every field is optional.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SequentialKeys {
    pub prefix: String,
    pub start: u64,
    /// Expression template; every `{key}` is replaced by the key.
    pub expression: String,
    #[serde(skip)]
    issued: u64,
}

impl Default for SequentialKeys {
    fn default() -> Self {
        Self {
            prefix: String::new(),
            start: 1,
            expression: KEY_PLACEHOLDER.to_string(),
            issued: 0,
        }
    }
}

impl SequentialKeys {
    pub fn new(prefix: impl Into<String>, expression: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            expression: expression.into(),
            ..Self::default()
        }
    }

    pub fn with_start(mut self, start: u64) -> Self {
        self.start = start;
        self
    }

    /// Number of keys handed out so far.
    pub fn issued(&self) -> u64 {
        self.issued
    }
}

impl KeyPolicy for SequentialKeys {
    /// Fails with [`TplI18nError::KeysExhausted`] once the counter would pass `u64::MAX`.
    fn gen_key(&mut self, _occurrence: &Occurrence<'_>) -> Result<String> {
        let start = self.start;
        let exhausted = || TplI18nError::KeysExhausted { start };
        let number = start.checked_add(self.issued).ok_or_else(exhausted)?;
        self.issued = self.issued.checked_add(1).ok_or_else(exhausted)?;
        Ok(format!("{}{}", self.prefix, number))
    }

    fn gen_expression(&self, key: &str) -> String {
        self.expression.replace(KEY_PLACEHOLDER, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tpl_i18n_ast::parse;

    fn with_occurrence(f: impl FnOnce(&Occurrence<'_>)) {
        let document = parse("<lang>x</lang>");
        let node = document.get(document.top_level()[0]);
        f(&Occurrence::Element(node));
    }

    #[test]
    fn test_sequential_keys() {
        let mut keys = SequentialKeys::new("node_test_", "{[ this.{key} ]}");
        with_occurrence(|occurrence| {
            assert_eq!(keys.gen_key(occurrence).unwrap(), "node_test_1");
            assert_eq!(keys.gen_key(occurrence).unwrap(), "node_test_2");
        });
        assert_eq!(keys.issued(), 2);
        assert_eq!(keys.gen_expression("node_test_2"), "{[ this.node_test_2 ]}");
    }

    #[test]
    fn test_sequential_keys_start() {
        let mut keys = SequentialKeys::new("t", KEY_PLACEHOLDER).with_start(10);
        with_occurrence(|occurrence| assert_eq!(keys.gen_key(occurrence).unwrap(), "t10"));
    }

    #[test]
    fn test_sequential_keys_stop_at_u64_max() {
        let mut keys = SequentialKeys::new("k", KEY_PLACEHOLDER).with_start(u64::MAX);
        with_occurrence(|occurrence| {
            assert_eq!(keys.gen_key(occurrence).unwrap(), format!("k{}", u64::MAX));
            let err = keys.gen_key(occurrence).unwrap_err();
            assert!(matches!(err, TplI18nError::KeysExhausted { start: u64::MAX }));
        });
        assert_eq!(keys.issued(), 1);
    }

    #[test]
    fn test_sequential_keys_from_json() {
        let keys: SequentialKeys =
            serde_json::from_str(r#"{"prefix": "k_", "expression": "$t('{key}')"}"#).unwrap();
        assert_eq!(keys.prefix, "k_");
        assert_eq!(keys.start, 1);
        assert_eq!(keys.gen_expression("k_1"), "$t('k_1')");

        let defaults: SequentialKeys = serde_json::from_str("{}").unwrap();
        assert_eq!(defaults, SequentialKeys::default());
    }

    #[test]
    fn test_closure_options() {
        let mut options = TransformOptions::new(
            |occurrence: &Occurrence<'_>| format!("key_{}", occurrence.location().line),
            |key: &str| format!("<%= {key} %>"),
        );
        with_occurrence(|occurrence| assert_eq!(options.gen_key(occurrence).unwrap(), "key_1"));
        assert_eq!(options.gen_expression("a"), "<%= a %>");
    }

    #[test]
    fn test_policy_through_mutable_reference() {
        fn next_key<P: KeyPolicy>(mut policy: P, occurrence: &Occurrence<'_>) -> String {
            policy.gen_key(occurrence).unwrap()
        }

        let mut keys = SequentialKeys::default();
        with_occurrence(|occurrence| {
            assert_eq!(next_key(&mut keys, occurrence), "1");
            assert_eq!(next_key(&mut keys, occurrence), "2");
        });
        assert_eq!(keys.issued(), 2);
    }
}
