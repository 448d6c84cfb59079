//! Account number formatting and validation.
//!
//! Formatting is lenient: any text goes in, digits are kept in order, the
//! result is cut to the bank's length and dashed at group boundaries.
//! Validation is strict: only a complete canonical number passes, and only
//! for banks the registry knows.

use crate::bank::BankId;
use crate::registry::BankRegistry;

/// Separator placed between digit groups.
pub const SEPARATOR: char = '-';

/// Display-only layout for banks with no registered spec.
pub const FALLBACK_GROUPS: [usize; 2] = [3, 8];

/// Keep only ASCII digits, in order.
pub fn digits_only(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}

/// Join `chars` into groups, inserting a separator at each boundary that
/// is followed by at least one more character. Input past the last group
/// is dropped.
pub fn group_digits(chars: &str, groups: &[usize]) -> String {
    let total: usize = groups.iter().sum();
    let mut out = String::with_capacity(total + groups.len());
    let mut rest = chars.chars().take(total).peekable();

    for &len in groups {
        for _ in 0..len {
            match rest.next() {
                Some(c) => out.push(c),
                None => return out,
            }
        }
        if rest.peek().is_some() {
            out.push(SEPARATOR);
        }
    }
    out
}

/// Formats and validates account numbers against a [`BankRegistry`].
#[derive(Debug, Clone)]
pub struct AccountFormatEngine {
    registry: BankRegistry,
}

impl Default for AccountFormatEngine {
    fn default() -> Self {
        Self::new(BankRegistry::builtin().clone())
    }
}

impl AccountFormatEngine {
    pub fn new(registry: BankRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &BankRegistry {
        &self.registry
    }

    /// Group layout used for `bank`, falling back to [`FALLBACK_GROUPS`].
    pub fn groups(&self, bank: &BankId) -> &[usize] {
        self.registry
            .get(bank)
            .map(|spec| spec.groups())
            .unwrap_or(&FALLBACK_GROUPS)
    }

    /// Canonical display form of `raw` for `bank`. Never fails.
    pub fn format(&self, raw: &str, bank: &BankId) -> String {
        group_digits(&digits_only(raw), self.groups(bank))
    }

    /// True iff `formatted` is a complete account number for `bank`.
    ///
    /// Always false for banks without a registered spec, so a number can't
    /// be submitted until the bank's layout is known.
    pub fn validate(&self, formatted: &str, bank: &BankId) -> bool {
        self.registry
            .get(bank)
            .is_some_and(|spec| spec.matches(formatted))
    }

    /// Reformat `current` for a newly selected bank.
    ///
    /// Returns an empty string unless the digits form a complete, valid
    /// number for `new_bank`; a number typed for one bank is never carried
    /// over half-matching into another.
    pub fn on_bank_change(&self, current: &str, new_bank: &BankId) -> String {
        let formatted = self.format(current, new_bank);
        if self.validate(&formatted, new_bank) {
            formatted
        } else {
            tracing::debug!(bank = %new_bank, "account number cleared on bank change");
            String::new()
        }
    }

    /// Apply one backspace at character position `cursor` of `formatted`.
    ///
    /// When the character before the cursor is a separator, the separator
    /// and the digit before it are removed together. Returns the reformatted
    /// string and the new cursor position in it.
    pub fn backspace(&self, formatted: &str, cursor: usize, bank: &BankId) -> (String, usize) {
        let chars: Vec<char> = formatted.chars().collect();
        let cursor = cursor.min(chars.len());
        if cursor == 0 {
            return (self.format(formatted, bank), 0);
        }

        let start = if chars[cursor - 1] == SEPARATOR {
            cursor.saturating_sub(2)
        } else {
            cursor - 1
        };

        let head: String = chars[..start].iter().collect();
        let tail: String = chars[cursor..].iter().collect();
        let digits_before = digits_only(&head).len();
        let result = self.format(&format!("{head}{tail}"), bank);
        let cursor = cursor_after_digits(&result, digits_before);
        (result, cursor)
    }
}

/// Character position right after the `n`th digit of `formatted`.
fn cursor_after_digits(formatted: &str, n: usize) -> usize {
    if n == 0 {
        return 0;
    }
    let mut seen = 0;
    for (i, c) in formatted.chars().enumerate() {
        if c.is_ascii_digit() {
            seen += 1;
            if seen == n {
                return i + 1;
            }
        }
    }
    formatted.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> AccountFormatEngine {
        AccountFormatEngine::default()
    }

    #[test]
    fn test_group_digits_partial() {
        assert_eq!(group_digits("", &[3, 4]), "");
        assert_eq!(group_digits("12", &[3, 4]), "12");
        assert_eq!(group_digits("123", &[3, 4]), "123");
        assert_eq!(group_digits("1234", &[3, 4]), "123-4");
        assert_eq!(group_digits("123456789", &[3, 4]), "123-4567");
    }

    #[test]
    fn test_format_strips_and_groups() {
        let e = engine();
        assert_eq!(e.format("123 456-12 abc 123456", &BankId::Kookmin), "123456-12-123456");
        assert_eq!(e.format("3523456789012", &BankId::Nonghyup), "352-3456-7890-12");
        assert_eq!(e.format("123456789012", &BankId::KBank), "123-456-789012");
    }

    #[test]
    fn test_format_truncates_to_bank_length() {
        let e = engine();
        assert_eq!(e.format("12345678901234567890", &BankId::TossBank), "1234567890");
        assert_eq!(e.format("1234567890123", &BankId::Shinhan), "123-45-678901-2");
    }

    #[test]
    fn test_format_preserves_digit_count_and_order() {
        let e = engine();
        let inputs = ["", "9", "98765", "1-2-3-4-5-6-7-8-9-0-1-2-3-4-5-6-7-8"];
        for bank in BankId::known().chain([BankId::Other("x".into())]) {
            let total: usize = e.groups(&bank).iter().sum();
            for input in inputs {
                let digits = digits_only(input);
                let out = e.format(input, &bank);
                let kept = digits_only(&out);
                assert_eq!(kept.len(), digits.len().min(total));
                assert!(digits.starts_with(&kept));
            }
        }
    }

    #[test]
    fn test_format_is_idempotent() {
        let e = engine();
        for bank in BankId::known().chain([BankId::Other("x".into())]) {
            for input in ["", "1", "1234", "12345678", "33331234567890123456", "a1b2c3d4e5f6g7h8"] {
                let once = e.format(input, &bank);
                assert_eq!(e.format(&once, &bank), once, "{bank} {input}");
            }
        }
    }

    #[test]
    fn test_complete_numbers_validate_short_ones_do_not() {
        let e = engine();
        for spec in e.registry().specs() {
            let bank = spec.bank();
            let prefix = spec.prefix().unwrap_or("");
            let full = format!("{prefix}{}", "7".repeat(spec.digit_count() - prefix.len()));
            assert!(e.validate(&e.format(&full, bank), bank), "{bank} full");

            let short = &full[..full.len() - 1];
            assert!(!e.validate(&e.format(short, bank), bank), "{bank} short");
        }
    }

    #[test]
    fn test_validate_rejects_full_width_digits() {
        let e = engine();
        let wide = "１２３-４５６-７８９０１２";
        assert_eq!(e.format(wide, &BankId::KBank), "");
        assert!(!e.validate(wide, &BankId::KBank));
        assert!(e.validate("123-456-789012", &BankId::KBank));
    }

    #[test]
    fn test_unknown_bank_never_validates() {
        let e = engine();
        let bank = BankId::Other("어딘가은행".into());
        let formatted = e.format("12345678901", &bank);
        assert_eq!(formatted, "123-45678901");
        assert!(!e.validate(&formatted, &bank));
    }

    #[test]
    fn test_bank_change_clears_mismatched_layout() {
        let e = engine();
        // 3-3-6 (K Bank) -> 3-4-4-2 (Nonghyup): 12 digits vs 13 needed
        let kbank = e.format("123456789012", &BankId::KBank);
        assert!(e.validate(&kbank, &BankId::KBank));
        assert_eq!(e.on_bank_change(&kbank, &BankId::Nonghyup), "");
    }

    #[test]
    fn test_bank_change_keeps_number_valid_for_both() {
        let e = engine();
        // Nonghyup and Busan share 3-4-4-2
        let number = "352-3456-7890-12";
        assert_eq!(e.on_bank_change(number, &BankId::Busan), number);
        // Same digit count, different grouping: regrouped, still valid
        let shinhan = "110-12-345678-9";
        assert_eq!(e.on_bank_change(shinhan, &BankId::KBank), "110-123-456789");
    }

    #[test]
    fn test_bank_change_clears_partial_input() {
        let e = engine();
        assert_eq!(e.on_bank_change("123-45", &BankId::Kookmin), "");
    }

    #[test]
    fn test_backspace_over_trailing_separator() {
        let e = engine();
        let bank = BankId::Other("x".into());
        assert_eq!(e.backspace("123-", 4, &bank), ("12".to_string(), 2));
    }

    #[test]
    fn test_backspace_over_inner_separator() {
        let e = engine();
        let bank = BankId::Other("x".into());
        // '3' and '-' go together; fallback layout regroups 1245
        assert_eq!(e.backspace("123-45", 4, &bank), ("124-5".to_string(), 2));
    }

    #[test]
    fn test_backspace_plain_digit() {
        let e = engine();
        let (out, cursor) = e.backspace("352-3456-7890-12", 16, &BankId::Nonghyup);
        assert_eq!(out, "352-3456-7890-1");
        assert_eq!(cursor, 15);
    }

    #[test]
    fn test_backspace_at_start_is_noop() {
        let e = engine();
        assert_eq!(e.backspace("123-45", 0, &BankId::Other("x".into())), ("123-45".to_string(), 0));
    }
}
