use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("Invalid account number {value:?}: expected exactly 10 digits")]
pub struct AccountNumberError {
    value: String,
}

/// A ten-digit deposit account number, stored without separators.
///
/// The portal renders account numbers as `NNN-N-NNNNN-N`; both forms are
/// accepted on input.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccountNumber(String);

impl AccountNumber {
    pub const LEN: usize = 10;

    pub fn parse(value: impl Into<String>) -> Result<Self, AccountNumberError> {
        let value = value.into();
        let digits: String = value
            .chars()
            .filter(|c| *c != '-' && !c.is_whitespace())
            .collect();
        if digits.len() == Self::LEN && digits.bytes().all(|b| b.is_ascii_digit()) {
            Ok(Self(digits))
        } else {
            Err(AccountNumberError { value })
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The portal's display grouping: three, one, five and one digits.
    pub fn grouped(&self) -> String {
        let d = &self.0;
        format!("{}-{}-{}-{}", &d[0..3], &d[3..4], &d[4..9], &d[9..10])
    }

    /// Portal grouping with all but the last four digits replaced by `x`,
    /// safe for logs.
    pub fn masked(&self) -> String {
        let hidden = Self::LEN - 4;
        self.grouped()
            .chars()
            .scan(0, |seen, c| {
                if c.is_ascii_digit() {
                    *seen += 1;
                    Some(if *seen <= hidden { 'x' } else { c })
                } else {
                    Some(c)
                }
            })
            .collect()
    }
}

impl fmt::Display for AccountNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for AccountNumber {
    type Error = AccountNumberError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<AccountNumber> for String {
    fn from(value: AccountNumber) -> Self {
        value.0
    }
}
