use crate::bank::BankId;
use thiserror::Error;

/// Failure to load a bank format registry.
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("failed to read registry file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("bad registry TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("{bank}: group list is empty")]
    EmptyGroups { bank: String },
    #[error("{bank}: group {index} has zero length")]
    ZeroGroup { bank: String, index: usize },
    #[error("{bank}: account numbers longer than {max} digits are not supported", max = crate::registry::MAX_ACCOUNT_DIGITS)]
    TooLong { bank: String },
    #[error("{bank}: prefix {prefix:?} must be digits and fit in the first group")]
    BadPrefix { bank: String, prefix: String },
    #[error("{bank}: invalid pattern: {source}")]
    BadPattern {
        bank: String,
        #[source]
        source: regex::Error,
    },
    #[error("{bank}: pattern rejects its own canonical form {sample:?}")]
    PatternMismatch { bank: String, sample: String },
    #[error("{bank}: listed more than once")]
    Duplicate { bank: String },
}

/// Why an account number can't be submitted yet.
///
/// These are shown to the user next to the input field; the `Display` text
/// is the user-facing message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccountFormatError {
    #[error("select a bank first")]
    NoBankSelected,
    #[error("the account number does not match the {bank} format")]
    Incomplete { bank: BankId },
    #[error("account numbers for {bank} can't be checked yet")]
    UnsupportedBank { bank: BankId },
}
