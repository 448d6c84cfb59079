//! Bank identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A bank, as selected on the transfer form.
///
/// Known banks get their own variant; anything else is carried verbatim in
/// [`BankId::Other`] so a registry override can still describe it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum BankId {
    Kookmin,
    Shinhan,
    Hana,
    Woori,
    Nonghyup,
    ScFirst,
    KakaoBank,
    KBank,
    TossBank,
    Busan,
    Daegu,
    Gwangju,
    Jeonbuk,
    Jeju,
    Other(String),
}

/// (variant, display name, ASCII slug)
const KNOWN: [(BankId, &str, &str); 14] = [
    (BankId::Kookmin, "국민은행", "kookmin"),
    (BankId::Shinhan, "신한은행", "shinhan"),
    (BankId::Hana, "하나은행", "hana"),
    (BankId::Woori, "우리은행", "woori"),
    (BankId::Nonghyup, "농협은행", "nonghyup"),
    (BankId::ScFirst, "SC제일은행", "sc-first"),
    (BankId::KakaoBank, "카카오뱅크", "kakaobank"),
    (BankId::KBank, "케이뱅크", "kbank"),
    (BankId::TossBank, "토스뱅크", "tossbank"),
    (BankId::Busan, "부산은행", "busan"),
    (BankId::Daegu, "대구은행", "daegu"),
    (BankId::Gwangju, "광주은행", "gwangju"),
    (BankId::Jeonbuk, "전북은행", "jeonbuk"),
    (BankId::Jeju, "제주은행", "jeju"),
];

impl BankId {
    /// Korean display name, as shown in the bank list.
    pub fn name(&self) -> &str {
        match self {
            BankId::Other(name) => name,
            known => KNOWN
                .iter()
                .find(|(id, _, _)| id == known)
                .map(|(_, name, _)| *name)
                .unwrap_or_default(),
        }
    }

    /// ASCII slug accepted on the command line, if this is a known bank.
    pub fn slug(&self) -> Option<&'static str> {
        KNOWN
            .iter()
            .find(|(id, _, _)| id == self)
            .map(|(_, _, slug)| *slug)
    }

    /// All built-in variants, in bank-list order.
    pub fn known() -> impl Iterator<Item = BankId> {
        KNOWN.into_iter().map(|(id, _, _)| id)
    }
}

impl FromStr for BankId {
    type Err = std::convert::Infallible;

    /// Parses a display name or slug. Unrecognised names become `Other`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let found = KNOWN
            .iter()
            .find(|(_, name, slug)| *name == s || slug.eq_ignore_ascii_case(s))
            .map(|(id, _, _)| id.clone());
        Ok(found.unwrap_or_else(|| BankId::Other(s.to_string())))
    }
}

impl From<String> for BankId {
    fn from(s: String) -> Self {
        match s.parse() {
            Ok(id) => id,
            Err(never) => match never {},
        }
    }
}

impl From<BankId> for String {
    fn from(id: BankId) -> Self {
        id.name().to_string()
    }
}

impl fmt::Display for BankId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
