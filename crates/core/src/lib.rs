//! # Tandem Core
//!
//! Domain types, traits, and error definitions for the Tandem multi-agent
//! pipeline. This crate has **no framework dependencies**: it defines the
//! domain model that every other crate implements against.
//!
//! ## Design Philosophy
//!
//! Each external collaborator is a trait here:
//! - [`Provider`] generates text (and optionally embeddings)
//! - [`Retriever`] returns ordered context snippets for a query
//! - [`AgentCapability`] performs one reasoning call keyed by [`TaskKind`]
//!
//! Implementations live in their own crates, so the pipeline can be driven
//! by real backends or by scripted test doubles.

pub mod agent;
pub mod envelope;
pub mod error;
pub mod event;
pub mod message;
pub mod provider;
pub mod retrieval;

// Re-export key types at crate root for ergonomics
pub use agent::{AgentCapability, AgentInputs, AgentRole, Stage, TaskKind};
pub use envelope::{AgentEvent, ContextEnvelope, SessionId};
pub use error::{Error, Result};
pub use event::{DomainEvent, EventBus};
pub use message::{Message, Role};
pub use provider::{Provider, ProviderRequest, ProviderResponse};
pub use retrieval::Retriever;
