//! # Fabricate Crafting
//!
//! The crafting model for Fabricate.
//!
//! This crate provides the value types crafting systems are built from:
//! - Units and combinations (multisets of components or essences)
//! - Named, selectable options
//! - Requirements, recipe outputs and salvage
//! - Recipes, components, essences and crafting systems
//! - Lazily loaded item data

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod combination;
pub mod component;
pub mod crafting_system;
pub mod essence;
pub mod item_data;
pub mod options;
pub mod output;
pub mod recipe;
pub mod requirement;
pub mod salvage;
pub mod substitution;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::combination::*;
    pub use crate::component::*;
    pub use crate::crafting_system::*;
    pub use crate::essence::*;
    pub use crate::item_data::*;
    pub use crate::options::*;
    pub use crate::output::*;
    pub use crate::recipe::*;
    pub use crate::requirement::*;
    pub use crate::salvage::*;
    pub use crate::substitution::*;
}

pub use prelude::*;
