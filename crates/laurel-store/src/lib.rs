// crates/laurel-store/src/lib.rs
//
// laurel-store: Ledger storage for the Laurel badge staking engine.
//
// Provides a RocksDB-backed ledger using optimistic transactions for
// compare-and-swap commits, and an in-memory ledger with the same semantics
// for development and tests.

pub mod memory;
pub mod rocks;

// Re-export key types for ergonomic access from downstream crates.
pub use memory::InMemoryLedger;
pub use rocks::RocksLedger;
