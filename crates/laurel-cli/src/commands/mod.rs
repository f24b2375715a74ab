// crates/laurel-cli/src/commands/mod.rs
//
// Command module declarations for the Laurel CLI.

pub mod stake;
pub mod status;
pub mod wallet;
