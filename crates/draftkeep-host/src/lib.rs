//! draftkeep-host: contracts for the page a draft controller lives in
//!
//! This crate describes the two external collaborators of the draft
//! controller: the host document (elements, listeners, mutation
//! notifications) and the key-value persistence medium. It also ships
//! in-memory and file-backed implementations of both.

pub mod dom;
pub mod error;
pub mod markup;
pub mod media;
pub mod types;
pub mod virtual_dom;

pub use dom::{Document, Element, Listener, MutationReceiver};
pub use error::{Error, Result};
pub use media::Medium;
pub use types::*;
pub use virtual_dom::{VirtualDocument, VirtualElement};
