//! Completion Port - the engine's only view of the model
//!
//! - `port` - the `CompletionPort` trait and its request type
//! - `structured` - shape descriptors and decoding of structured answers
//! - `client` - shared, cancellable, concurrency-bounded access to a port

mod client;
mod port;
mod structured;

pub use client::{CompletionClient, CompletionError};
pub use port::{CompletionPort, CompletionRequest};
pub use structured::{decode_structured, DecodeError, ResponseSchema, StructuredOutput};

#[cfg(test)]
pub use port::MockCompletionPort;
#[cfg(test)]
pub use port::mock::{ScriptedCompletionPort, ScriptedReply};
