//! # Fabricate Common
//!
//! Common types, utilities, and shared abstractions for Fabricate.
//!
//! This crate provides foundational types used across all Fabricate crates:
//! - The `Identifiable` trait and id-only references to components/essences
//! - Id generation for freshly created records
//! - Settings model versions
//! - Common error types
//! - Prelude for convenient imports

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod error;
pub mod ids;
pub mod version;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::*;
    pub use crate::ids::*;
    pub use crate::version::*;
}

pub use prelude::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_identity() {
        let component = ComponentReference::new("iron-ore").expect("valid id");
        let essence = EssenceReference::new("fire").expect("valid id");

        assert_eq!(component.id(), "iron-ore");
        assert_eq!(essence.id(), "fire");
    }

    #[test]
    fn test_identity_factory_generation() {
        let factory = UuidIdentityFactory;
        let id1 = factory.make();
        let id2 = factory.make();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_version_ordering() {
        assert!(ModelVersion::V2 < ModelVersion::V3);
        assert_eq!(ModelVersion::CURRENT, ModelVersion::V3);
    }
}
