// crates/laurel-core/src/lib.rs
//
// laurel-core: Core types, traits, and error taxonomy for the Laurel
// badge staking engine.
//
// This is the leaf crate that all other crates in the workspace depend on.
// It defines the stake record and its identifiers, the timestamp and clock
// abstraction, the error taxonomy, and the trait interfaces for the
// collaborators the engine consumes (ledger store, ownership verification).

pub mod error;
pub mod ids;
pub mod receipt;
pub mod record;
pub mod time;
pub mod traits;

// Re-export key types for ergonomic access from downstream crates.
// Usage: `use laurel_core::StakeRecord;`

// Identifier types
pub use ids::{OwnerId, StakeKey, TokenId, MAX_ID_LEN};

// Record types
pub use receipt::{dedup_key, SettlementReceipt};
pub use record::{StakeRecord, StakeStatus};

// Time
pub use time::{Clock, ManualClock, SystemClock, Timestamp};

// Error type
pub use error::LaurelError;

// Traits
pub use traits::{LedgerStore, LedgerWrite, OwnershipVerifier};
