//! Identity types: the `Identifiable` trait, id references, and id generation.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{ReferenceError, ReferenceResult};

/// Anything with a stable string id.
///
/// The id is the equality and lookup key for elements of a combination,
/// entries of an options collection and entities of a settings store.
pub trait Identifiable {
    /// Returns the stable id.
    fn id(&self) -> &str;
}

impl Identifiable for String {
    fn id(&self) -> &str {
        self
    }
}

/// A non-owning, id-only pointer to an entity resolved elsewhere.
pub trait Reference: Identifiable + Clone + Sized {
    /// Human readable name of the referenced entity kind.
    const KIND: &'static str;

    /// Creates a reference to the given id.
    fn from_id(id: impl Into<String>) -> ReferenceResult<Self>;
}

fn validated(kind: &'static str, id: String) -> ReferenceResult<String> {
    if id.trim().is_empty() {
        return Err(ReferenceError::BlankId { kind });
    }
    Ok(id)
}

macro_rules! reference_type {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Creates a reference, rejecting blank ids.
            pub fn new(id: impl Into<String>) -> ReferenceResult<Self> {
                validated($kind, id.into()).map(Self)
            }
        }

        impl Identifiable for $name {
            fn id(&self) -> &str {
                &self.0
            }
        }

        impl Reference for $name {
            const KIND: &'static str = $kind;

            fn from_id(id: impl Into<String>) -> ReferenceResult<Self> {
                Self::new(id)
            }
        }

        impl TryFrom<String> for $name {
            type Error = ReferenceError;

            fn try_from(value: String) -> ReferenceResult<Self> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

reference_type!(
    /// Reference to a crafting component by id.
    ComponentReference,
    "component"
);

reference_type!(
    /// Reference to an essence by id.
    EssenceReference,
    "essence"
);

/// Capability for generating ids for newly created records.
pub trait IdentityFactory {
    /// Returns a new id, unique within the settings graph.
    fn make(&self) -> String;
}

/// Generates random UUID v4 ids in their simple (unhyphenated) form.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidIdentityFactory;

impl IdentityFactory for UuidIdentityFactory {
    fn make(&self) -> String {
        uuid::Uuid::new_v4().simple().to_string()
    }
}

/// Generates `<prefix>-<n>` ids from a counter owned by the factory.
#[derive(Debug)]
pub struct SequentialIdentityFactory {
    prefix: String,
    counter: AtomicU64,
}

impl SequentialIdentityFactory {
    /// Creates a factory whose first id is `<prefix>-1`.
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            counter: AtomicU64::new(1),
        }
    }

    /// Number of ids handed out so far.
    #[must_use]
    pub fn issued(&self) -> u64 {
        self.counter.load(Ordering::Relaxed) - 1
    }
}

impl IdentityFactory for SequentialIdentityFactory {
    fn make(&self) -> String {
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        format!("{}-{n}", self.prefix)
    }
}

impl<F: IdentityFactory + ?Sized> IdentityFactory for &F {
    fn make(&self) -> String {
        (**self).make()
    }
}

impl<F: IdentityFactory + ?Sized> IdentityFactory for Box<F> {
    fn make(&self) -> String {
        (**self).make()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_reference_rejected() {
        let err = ComponentReference::new("  ").expect_err("blank");
        assert_eq!(err, ReferenceError::BlankId { kind: "component" });
        assert!(EssenceReference::new("").is_err());
    }

    #[test]
    fn test_reference_serializes_as_string() {
        let reference = EssenceReference::new("water").expect("valid id");
        let json = serde_json::to_string(&reference).expect("serialize");
        assert_eq!(json, "\"water\"");

        let back: EssenceReference = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, reference);

        let blank: Result<EssenceReference, _> = serde_json::from_str("\"\"");
        assert!(blank.is_err());
    }

    #[test]
    fn test_sequential_factory() {
        let factory = SequentialIdentityFactory::new("opt");
        assert_eq!(factory.make(), "opt-1");
        assert_eq!(factory.make(), "opt-2");
        assert_eq!(factory.issued(), 2);
    }

    #[test]
    fn test_factories_are_independent() {
        let a = SequentialIdentityFactory::new("a");
        let b = SequentialIdentityFactory::new("a");
        assert_eq!(a.make(), b.make());
    }

    #[test]
    fn test_uuid_factory_simple_form() {
        let id = UuidIdentityFactory.make();
        assert_eq!(id.len(), 32);
        assert!(!id.contains('-'));
    }
}
