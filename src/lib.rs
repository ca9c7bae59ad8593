//! Compiles Tool Shed dependency descriptors into Homebrew formulae.
//!
//! A [`Package`] (parsed elsewhere from `tool_dependencies.xml`) carries one
//! [`ActionSet`] per OS/architecture variant. [`RecipeCompiler::compile`] turns it
//! into a single Ruby formula, collapsing variants that only differ in their
//! downloads and degrading unknown actions to warnings.

pub mod builder;
pub mod conditional;
pub mod config;
pub mod dispatch;
pub mod download;
pub mod environment;
pub mod error;
pub mod extension;
pub mod model;
pub mod placeholders;
pub mod recipe;
pub mod tap;

pub use error::{Result, ShedError, StructureError};
pub use model::{Action, ActionSet, Architecture, EnvironmentEdit, Mutation, Os, Package, PackageRef, Repository};
pub use recipe::{Recipe, RecipeCompiler, compile};
pub use tap::Tap;
