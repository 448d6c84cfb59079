//! Stateful account number field.

use crate::bank::BankId;
use crate::error::AccountFormatError;
use crate::format::AccountFormatEngine;

/// What happened to the typed number when the bank changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BankChange {
    /// The digits form a valid number for the new bank and were kept.
    Kept,
    /// The digits didn't fit the new bank and the field was emptied.
    Cleared,
}

/// The recipient account field on the transfer form.
///
/// `formatted` is always the canonical form of the typed digits for the
/// selected bank.
#[derive(Debug, Clone)]
pub struct AccountInput<'a> {
    engine: &'a AccountFormatEngine,
    bank: Option<BankId>,
    formatted: String,
}

impl<'a> AccountInput<'a> {
    pub fn new(engine: &'a AccountFormatEngine) -> Self {
        Self {
            engine,
            bank: None,
            formatted: String::new(),
        }
    }

    pub fn bank(&self) -> Option<&BankId> {
        self.bank.as_ref()
    }

    pub fn formatted(&self) -> &str {
        &self.formatted
    }

    /// Replace the field content with `raw` (a keystroke or a paste).
    pub fn input(&mut self, raw: &str) -> &str {
        self.formatted = self.engine.format(raw, &self.layout_bank());
        &self.formatted
    }

    /// Backspace at `cursor`; returns the new cursor position.
    pub fn backspace(&mut self, cursor: usize) -> usize {
        let (formatted, cursor) = self
            .engine
            .backspace(&self.formatted, cursor, &self.layout_bank());
        self.formatted = formatted;
        cursor
    }

    /// Select a bank, keeping the typed number only if it is valid there.
    pub fn select_bank(&mut self, bank: BankId) -> BankChange {
        let reformatted = self.engine.on_bank_change(&self.formatted, &bank);
        self.bank = Some(bank);
        let change = if reformatted.is_empty() && !self.formatted.is_empty() {
            BankChange::Cleared
        } else {
            BankChange::Kept
        };
        self.formatted = reformatted;
        change
    }

    /// Check that the field holds a submittable account number.
    pub fn check(&self) -> Result<(), AccountFormatError> {
        let bank = self.bank.as_ref().ok_or(AccountFormatError::NoBankSelected)?;
        if self.engine.registry().get(bank).is_none() {
            return Err(AccountFormatError::UnsupportedBank { bank: bank.clone() });
        }
        if !self.engine.validate(&self.formatted, bank) {
            return Err(AccountFormatError::Incomplete { bank: bank.clone() });
        }
        Ok(())
    }

    /// Bank whose layout drives formatting; unselected uses the fallback.
    fn layout_bank(&self) -> BankId {
        self.bank
            .clone()
            .unwrap_or_else(|| BankId::Other(String::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typing_before_bank_uses_fallback_layout() {
        let engine = AccountFormatEngine::default();
        let mut field = AccountInput::new(&engine);
        assert_eq!(field.input("12345"), "123-45");
        assert_eq!(field.check(), Err(AccountFormatError::NoBankSelected));
    }

    #[test]
    fn test_select_bank_clears_partial_number() {
        let engine = AccountFormatEngine::default();
        let mut field = AccountInput::new(&engine);
        field.input("12345");
        assert_eq!(field.select_bank(BankId::KBank), BankChange::Cleared);
        assert_eq!(field.formatted(), "");
    }

    #[test]
    fn test_select_bank_on_empty_field_is_kept() {
        let engine = AccountFormatEngine::default();
        let mut field = AccountInput::new(&engine);
        assert_eq!(field.select_bank(BankId::KBank), BankChange::Kept);
    }

    #[test]
    fn test_full_entry_flow() {
        let engine = AccountFormatEngine::default();
        let mut field = AccountInput::new(&engine);
        field.select_bank(BankId::Woori);

        field.input("1002123");
        assert_eq!(field.formatted(), "1002-123");
        assert_eq!(
            field.check(),
            Err(AccountFormatError::Incomplete { bank: BankId::Woori })
        );

        field.input("1002-123456789");
        assert_eq!(field.formatted(), "1002-123-456789");
        assert_eq!(field.check(), Ok(()));

        // Cursor right after the second dash removes "3-"
        let cursor = field.backspace(9);
        assert_eq!(field.formatted(), "1002-124-56789");
        assert_eq!(cursor, 7);
    }

    #[test]
    fn test_unregistered_bank_is_unsupported() {
        let engine = AccountFormatEngine::default();
        let mut field = AccountInput::new(&engine);
        field.select_bank(BankId::Other("수협은행".into()));
        field.input("12345678901");
        assert!(matches!(
            field.check(),
            Err(AccountFormatError::UnsupportedBank { .. })
        ));
    }
}
