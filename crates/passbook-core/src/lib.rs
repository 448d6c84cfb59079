//! passbook-core — Account number formatting and validation by bank.
//!
//! Each bank writes account numbers in its own dashed layout. The registry
//! holds those layouts; the engine turns keystrokes into the canonical form
//! and says when a number is complete.

pub mod bank;
pub mod context;
pub mod error;
pub mod format;
pub mod input;
pub mod registry;

pub use bank::BankId;
pub use context::SessionContext;
pub use error::{AccountFormatError, RegistryError};
pub use format::{digits_only, AccountFormatEngine, FALLBACK_GROUPS, SEPARATOR};
pub use input::{AccountInput, BankChange};
pub use registry::{BankFormatSpec, BankRegistry};
