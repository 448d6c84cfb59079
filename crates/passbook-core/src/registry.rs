//! Bank format registry.
//!
//! Maps each bank to the digit grouping of its account numbers and the regex
//! that accepts a complete, dashed number. The built-in table is embedded at
//! compile time from `contrib/banks.toml`; deployments can merge an override
//! file on top of it.

use crate::bank::BankId;
use crate::error::RegistryError;
use crate::format::{group_digits, SEPARATOR};
use regex::{Regex, RegexBuilder};
use serde::Deserialize;
use std::path::Path;
use std::sync::OnceLock;

/// Longest account number a registry entry may describe.
pub const MAX_ACCOUNT_DIGITS: usize = 32;

const BUILTIN_BANKS: &str = include_str!("../../../contrib/banks.toml");

static BUILTIN: OnceLock<BankRegistry> = OnceLock::new();

/// Top-level registry file structure.
#[derive(Debug, Deserialize)]
struct RegistryFile {
    #[serde(default)]
    bank: Vec<BankEntry>,
}

/// One `[[bank]]` table.
#[derive(Debug, Deserialize)]
struct BankEntry {
    name: String,
    groups: Vec<usize>,
    prefix: Option<String>,
    pattern: Option<String>,
}

/// Digit layout and validation rule for one bank.
#[derive(Debug, Clone)]
pub struct BankFormatSpec {
    bank: BankId,
    groups: Vec<usize>,
    prefix: Option<String>,
    pattern: Regex,
}

impl BankFormatSpec {
    /// Build a spec, generating the pattern from the groups unless one is given.
    ///
    /// An explicit pattern is anchored on both ends and compiled without
    /// Unicode classes, so `\d` means ASCII digits only. It must still accept
    /// the canonical formatting of a complete number.
    pub fn new(
        bank: BankId,
        groups: Vec<usize>,
        prefix: Option<String>,
        pattern: Option<&str>,
    ) -> Result<Self, RegistryError> {
        let name = bank.name().to_string();
        if groups.is_empty() {
            return Err(RegistryError::EmptyGroups { bank: name });
        }
        if let Some(index) = groups.iter().position(|&g| g == 0) {
            return Err(RegistryError::ZeroGroup { bank: name, index });
        }
        let total = groups.iter().try_fold(0usize, |acc, &g| acc.checked_add(g));
        match total {
            Some(digits) if digits <= MAX_ACCOUNT_DIGITS => {}
            _ => return Err(RegistryError::TooLong { bank: name }),
        }
        if let Some(p) = &prefix {
            if p.is_empty() || !p.bytes().all(|b| b.is_ascii_digit()) || p.len() > groups[0] {
                return Err(RegistryError::BadPrefix {
                    bank: name,
                    prefix: p.clone(),
                });
            }
        }

        let source = match pattern {
            Some(p) => format!("^(?:{p})$"),
            None => canonical_pattern(&groups, prefix.as_deref()),
        };
        let pattern = RegexBuilder::new(&source)
            .unicode(false)
            .build()
            .map_err(|source| RegistryError::BadPattern {
            bank: name.clone(),
            source,
        })?;

        let spec = Self {
            bank,
            groups,
            prefix,
            pattern,
        };

        let sample = spec.sample();
        if !spec.pattern.is_match(&sample) {
            return Err(RegistryError::PatternMismatch { bank: name, sample });
        }
        Ok(spec)
    }

    pub fn bank(&self) -> &BankId {
        &self.bank
    }

    pub fn groups(&self) -> &[usize] {
        &self.groups
    }

    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    pub fn pattern(&self) -> &Regex {
        &self.pattern
    }

    /// Total digits in a complete account number.
    pub fn digit_count(&self) -> usize {
        self.groups.iter().sum()
    }

    /// True iff `formatted` is a complete, canonical account number.
    pub fn matches(&self, formatted: &str) -> bool {
        self.pattern.is_match(formatted)
    }

    /// Human-readable layout, e.g. `3333-####-####-####`.
    pub fn template(&self) -> String {
        let mut hashes: String = "#".repeat(self.digit_count());
        if let Some(p) = &self.prefix {
            hashes.replace_range(..p.len(), p);
        }
        group_digits(&hashes, &self.groups)
    }

    /// Canonical form of the smallest complete number: prefix then zeros.
    fn sample(&self) -> String {
        let prefix = self.prefix.as_deref().unwrap_or("");
        let zeros = "0".repeat(self.digit_count() - prefix.len());
        group_digits(&format!("{prefix}{zeros}"), &self.groups)
    }
}

/// Regex accepting exactly the dashed canonical form for `groups`.
fn canonical_pattern(groups: &[usize], prefix: Option<&str>) -> String {
    let mut parts: Vec<String> = groups.iter().map(|g| format!("[0-9]{{{g}}}")).collect();
    if let Some(p) = prefix {
        let rest = groups[0] - p.len();
        parts[0] = if rest == 0 {
            p.to_string()
        } else {
            format!("{p}[0-9]{{{rest}}}")
        };
    }
    format!("^{}$", parts.join(SEPARATOR.to_string().as_str()))
}

/// Ordered set of bank format specs.
#[derive(Debug, Clone, Default)]
pub struct BankRegistry {
    specs: Vec<BankFormatSpec>,
}

impl BankRegistry {
    /// The built-in registry. Parsed once on first use.
    pub fn builtin() -> &'static BankRegistry {
        BUILTIN.get_or_init(|| match Self::from_toml_str(BUILTIN_BANKS) {
            Ok(registry) => registry,
            Err(e) => {
                tracing::error!(error = %e, "bad built-in bank registry");
                BankRegistry::default()
            }
        })
    }

    /// Parse a registry from TOML text.
    pub fn from_toml_str(src: &str) -> Result<Self, RegistryError> {
        let file: RegistryFile = toml::from_str(src)?;
        let mut registry = BankRegistry::default();
        for entry in file.bank {
            let bank: BankId = entry.name.into();
            if registry.get(&bank).is_some() {
                return Err(RegistryError::Duplicate {
                    bank: bank.name().to_string(),
                });
            }
            let spec =
                BankFormatSpec::new(bank, entry.groups, entry.prefix, entry.pattern.as_deref())?;
            registry.specs.push(spec);
        }
        Ok(registry)
    }

    /// Read and parse a registry file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RegistryError> {
        let path = path.as_ref();
        let src = std::fs::read_to_string(path).map_err(|source| RegistryError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let registry = Self::from_toml_str(&src)?;
        tracing::info!(path = %path.display(), banks = registry.len(), "loaded bank registry");
        Ok(registry)
    }

    /// Overlay `other` on this registry; its entries replace same-bank ones.
    pub fn merge(mut self, other: BankRegistry) -> Self {
        for spec in other.specs {
            self.insert(spec);
        }
        self
    }

    /// Insert or replace a single spec.
    pub fn insert(&mut self, spec: BankFormatSpec) {
        match self.specs.iter_mut().find(|s| s.bank == spec.bank) {
            Some(existing) => *existing = spec,
            None => self.specs.push(spec),
        }
    }

    pub fn get(&self, bank: &BankId) -> Option<&BankFormatSpec> {
        self.specs.iter().find(|s| &s.bank == bank)
    }

    /// Specs in registration order.
    pub fn specs(&self) -> &[BankFormatSpec] {
        &self.specs
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}
