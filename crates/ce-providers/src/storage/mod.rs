//! Storage backends
//!
//! The PostgreSQL + pgvector deployment is an external collaborator; the
//! in-memory backend here is the reference implementation of the storage
//! ports, mirroring its required capabilities (weighted full-text rank,
//! cosine ANN, fair pending selection, CAS status claims) in process memory.

mod memory;

pub use memory::MemoryStore;
