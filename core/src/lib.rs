//! # quarry-core
//!
//! Trait abstractions for the model boundaries of the quarry workspace.
//!
//! The engine crate treats its two external collaborators as pure
//! capabilities behind traits, so any provider can plug in:
//!
//! - [`EmbeddingModel`] — maps text to fixed-dimensionality vectors.
//! - [`TextGenerator`] — produces an answer from instructions and a prompt.
//!
//! The crate is `no_std` (with `alloc`) so provider implementations carry
//! only the dependencies they actually need.

#![no_std]
extern crate alloc;

/// Text embeddings.
pub mod embedding;
/// Answer generation.
pub mod generation;

use alloc::string::String;

#[doc(inline)]
pub use embedding::{Embedding, EmbeddingModel};
#[doc(inline)]
pub use generation::TextGenerator;

/// Result type used throughout the workspace.
///
/// Type alias for [`anyhow::Result<T>`](anyhow::Result) with [`String`] as default success type.
pub type Result<T = String> = anyhow::Result<T>;

pub use anyhow::Error;
