//! Compiled contract definitions.
//!
//! Contracts are looked up by name in a tree of JSON build artifacts as
//! emitted by Hardhat (`artifacts/`) or Foundry (`out/`) and turned into a
//! [`ContractFactory`] that produces the init code of a creation transaction.

pub mod artifact;
pub mod factory;
pub mod networks;

pub use {
    artifact::{Artifact, ArtifactError, ArtifactStore},
    factory::ContractFactory,
};
