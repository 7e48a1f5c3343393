use chrono::DateTime;
use chrono_tz::Tz;
use rust_decimal::Decimal;
use serde::Serialize;

/// One row of the today's-statement table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transaction {
    /// Posting time in the bank's local time zone.
    pub time: DateTime<Tz>,
    /// Signed amount; unparseable cells become zero.
    pub amount: Decimal,
    /// Counterparty account number with separators removed.
    pub counterparty_account: String,
    /// Free-text detail, exactly as rendered.
    pub detail: String,
}
