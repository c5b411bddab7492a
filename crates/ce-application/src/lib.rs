//! # Application Layer
//!
//! Use cases and capability ports for the component knowledge pipeline.
//!
//! ## Architecture
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`ports`] | Capability interfaces: storage, extractor, generator, embedding |
//! | [`services`] | Pipeline services: processing, generation, manifest, chunking, search, reconciliation, auth |
//!
//! Services receive their collaborators through constructor injection as
//! `Arc<dyn Port>`; nothing here talks to the network or filesystem directly.

/// Capability port interfaces
pub mod ports;
/// Pipeline and retrieval services
pub mod services;
