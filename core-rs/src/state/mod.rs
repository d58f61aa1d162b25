// state/mod.rs - Durable client state (local + session scope)

pub mod kv;

pub use kv::{FileStore, KeyValueStore, LocalState, MemoryStore, BANNER_DISMISSED_KEY, PERSONA_KEY};
