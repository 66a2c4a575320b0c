//! Key/expression generation for marker occurrences.

use std::fmt;

use tpl_i18n_ast::{Attribute, Location, NodeRef};

use crate::error::{Result, TplI18nError};
use crate::policy::KeyPolicy;

/// One place in a template where translatable text was marked.
#[derive(Debug, Clone, Copy)]
pub enum Occurrence<'a> {
    /// A `<lang>...</lang>` element.
    Element(NodeRef<'a>),
    /// An attribute whose whole value is `<lang>...</lang>`.
    Attribute {
        element: NodeRef<'a>,
        attribute: &'a Attribute,
    },
}

impl<'a> Occurrence<'a> {
    /// The marker element, or the element carrying the attribute.
    pub fn element(&self) -> NodeRef<'a> {
        match self {
            Occurrence::Element(element) | Occurrence::Attribute { element, .. } => *element,
        }
    }

    pub fn attribute(&self) -> Option<&'a Attribute> {
        match self {
            Occurrence::Element(_) => None,
            Occurrence::Attribute { attribute, .. } => Some(attribute),
        }
    }

    pub fn is_attribute(&self) -> bool {
        matches!(self, Occurrence::Attribute { .. })
    }

    pub fn location(&self) -> Location {
        match self {
            Occurrence::Element(element) => element.location(),
            Occurrence::Attribute { attribute, .. } => attribute.location,
        }
    }
}

/// Hands out [`Replacement`]s using a caller-supplied [`KeyPolicy`].
pub struct KeyGenerator<P> {
    policy: P,
}

impl<P: KeyPolicy> KeyGenerator<P> {
    pub fn new(policy: P) -> Self {
        Self { policy }
    }

    /// Ask the policy for a key and derive its expression.
    ///
    /// Fails with [`TplI18nError::EmptyKey`] if the policy returns an empty key,
    /// or with the policy's own error.
    pub fn make_replacement(&mut self, occurrence: &Occurrence<'_>) -> Result<Replacement<'_, P>> {
        let key = self.policy.gen_key(occurrence)?;
        let mut replacement = Replacement {
            key: String::new(),
            expression: String::new(),
            policy: &self.policy,
        };
        replacement.set_key(key)?;
        Ok(replacement)
    }

    pub fn policy(&self) -> &P {
        &self.policy
    }

    pub fn into_policy(self) -> P {
        self.policy
    }
}

/// A key and the expression derived from it.
///
/// The expression always equals `gen_expression(key)`: it can only change
/// through [`Replacement::set_key`].
pub struct Replacement<'p, P: ?Sized> {
    key: String,
    expression: String,
    policy: &'p P,
}

impl<'p, P: KeyPolicy + ?Sized> Replacement<'p, P> {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// Replace the key and recompute the expression. An empty key is
    /// rejected and leaves the replacement unchanged.
    pub fn set_key(&mut self, key: impl Into<String>) -> Result<()> {
        let key = key.into();
        if key.is_empty() {
            return Err(TplI18nError::EmptyKey);
        }
        self.expression = self.policy.gen_expression(&key);
        self.key = key;
        Ok(())
    }

    /// Always fails: the expression is derived from the key.
    pub fn set_expression(&mut self, _expression: impl Into<String>) -> Result<()> {
        Err(TplI18nError::IllegalMutation)
    }

    pub fn into_parts(self) -> (String, String) {
        (self.key, self.expression)
    }
}

impl<P: ?Sized> fmt::Debug for Replacement<'_, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Replacement")
            .field("key", &self.key)
            .field("expression", &self.expression)
            .finish()
    }
}
