//! Question answering over a document corpus.
//!
//! Documents are split into overlapping chunks, embedded into a similarity
//! index, and retrieved per question. A conversation engine combines the
//! retrieved chunks with recent history, asks a generation model, and keeps a
//! role-tagged log of every exchange with the chunks it cited.

pub mod api;
pub mod application;
pub mod domain;
pub mod infrastructure;

#[cfg(test)]
pub(crate) mod testing;
