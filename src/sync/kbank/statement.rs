//! Today's-statement retrieval and table parsing.

use std::str::FromStr;
use std::sync::OnceLock;

use chrono::{DateTime, NaiveDateTime, TimeZone};
use chrono_tz::Tz;
use regex::Regex;
use rust_decimal::Decimal;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info};

use super::error::{KBankError, Result, Step};
use super::tokens::{self, TokenKind};
use super::KBankClient;
use crate::models::Transaction;

const STATEMENT_PATH: &str = "/retail/cashmanagement/TodayAccountStatementInquiry.do";

// Column positions in the `#trans_detail` table.
const TIME_COL: usize = 0;
const AMOUNT_COL: usize = 4;
const COUNTERPARTY_COL: usize = 5;
const DETAIL_COL: usize = 6;

impl KBankClient {
    /// Fetch today's transactions for the configured account, in table order.
    ///
    /// Requires a completed [`login`](KBankClient::login).
    pub async fn get_transactions(&mut self) -> Result<Vec<Transaction>> {
        if !self.state.is_authenticated() {
            return Err(KBankError::NotLoggedIn);
        }

        let url = self.options.endpoints.ebank_url(STATEMENT_PATH);
        let page = self.http.get(Step::StatementPage, &url).await?;

        let token = tokens::find(&page, TokenKind::StrutsToken).ok_or(KBankError::MissingToken {
            step: Step::StatementPage,
            token: TokenKind::StrutsToken.field_name(),
        })?;
        let account_id = tokens::find_account_id(&page, &self.credentials.account_no)
            .ok_or_else(|| KBankError::AccountNotFound(self.credentials.account_no.grouped()))?;
        debug!(%account_id, "Resolved statement account");

        let form = [
            (TokenKind::StrutsToken.field_name(), token.as_str()),
            ("captcha_check", "null"),
            ("acctId", account_id.as_str()),
            ("action", "detail"),
            ("st", "0"),
        ];
        let detail = self
            .http
            .post_form(Step::StatementDetail, &url, &form)
            .await?;

        let transactions = parse_statement(&detail, self.options.time_zone);
        info!(count = transactions.len(), "Fetched KBank statement");
        Ok(transactions)
    }
}

/// Parse the `#trans_detail` table of a statement page.
///
/// Malformed rows never fail the parse:
/// - a row whose first cell does not hold exactly six numbers, or whose
///   numbers are not a valid date and time, is skipped;
/// - an amount that does not parse becomes zero.
///
/// Rows come back in table order.
pub fn parse_statement(html: &str, time_zone: Tz) -> Vec<Transaction> {
    let document = Html::parse_document(html);
    let mut transactions = Vec::new();

    for row in document.select(row_selector()) {
        let cells = row_cells(row);
        let cell = |idx: usize| cells.get(idx).map(String::as_str).unwrap_or_default();

        let Some(time) = parse_time(cell(TIME_COL), time_zone) else {
            debug!(cell = cell(TIME_COL), "Skipping non-transaction row");
            continue;
        };

        transactions.push(Transaction {
            time,
            amount: parse_amount(cell(AMOUNT_COL)),
            counterparty_account: normalize_account(cell(COUNTERPARTY_COL)),
            detail: cell(DETAIL_COL).to_string(),
        });
    }

    transactions
}

fn row_selector() -> &'static Selector {
    static SEL: OnceLock<Selector> = OnceLock::new();
    SEL.get_or_init(|| Selector::parse("#trans_detail tbody tr").expect("invalid row selector"))
}

fn number_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[0-9]+").expect("invalid number regex"))
}

fn row_cells(row: ElementRef<'_>) -> Vec<String> {
    row.children()
        .filter_map(ElementRef::wrap)
        .filter(|cell| {
            let name = cell.value().name();
            name.eq_ignore_ascii_case("td") || name.eq_ignore_ascii_case("th")
        })
        .map(|cell| cell.text().collect::<String>())
        .collect()
}

/// Day, month, year, hour, minute, second in that order. Two-digit years
/// use the 1969-2068 window; four-digit years are taken as written.
///
/// Day, month, minute and second must be two digits and the hour one or
/// two, as the portal renders `dd/mm/yy HH:MM:SS`. Any other width is
/// rejected.
fn parse_time(cell: &str, time_zone: Tz) -> Option<DateTime<Tz>> {
    let parts: Vec<&str> = number_re().find_iter(cell).map(|m| m.as_str()).collect();
    let [day, month, year, hour, minute, second] = parts.as_slice() else {
        return None;
    };

    if [day, month, minute, second].iter().any(|p| p.len() != 2) || !(1..=2).contains(&hour.len())
    {
        return None;
    }
    let year_spec = match year.len() {
        2 => "%y",
        4 => "%Y",
        _ => return None,
    };
    let text = format!("{day}/{month}/{year} {hour}:{minute}:{second}");
    let naive =
        NaiveDateTime::parse_from_str(&text, &format!("%d/%m/{year_spec} %H:%M:%S")).ok()?;
    time_zone.from_local_datetime(&naive).earliest()
}

fn parse_amount(cell: &str) -> Decimal {
    let cleaned: String = cell.trim().chars().filter(|c| *c != ',').collect();
    Decimal::from_str(&cleaned).unwrap_or_else(|_| {
        debug!(cell, "Unparseable amount, using zero");
        Decimal::ZERO
    })
}

fn normalize_account(cell: &str) -> String {
    cell.chars()
        .filter(|c| *c != '-' && !c.is_whitespace())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, NaiveDate, Timelike};
    use chrono_tz::Asia::Bangkok;

    fn table(rows: &str) -> String {
        format!(
            r#"<html><body><table id="trans_detail">
<thead><tr><th>Date/Time</th><th>Channel</th><th>Type</th><th>Withdrawal</th><th>Amount</th><th>Account</th><th>Detail</th></tr></thead>
<tbody>{rows}</tbody></table></body></html>"#
        )
    }

    #[test]
    fn six_numbers_parse_in_bank_time_zone() {
        let time = parse_time("09 10 2023 14 30 00", Bangkok).unwrap();
        assert_eq!(
            time.naive_local(),
            NaiveDate::from_ymd_opt(2023, 10, 9)
                .unwrap()
                .and_hms_opt(14, 30, 0)
                .unwrap()
        );
        assert_eq!(time.timezone(), Bangkok);
    }

    #[test]
    fn two_digit_year_uses_century_window() {
        let time = parse_time("09/10/23 14:30:00", Bangkok).unwrap();
        assert_eq!(time.year(), 2023);
        assert_eq!((time.month(), time.day()), (10, 9));
        assert_eq!((time.hour(), time.minute(), time.second()), (14, 30, 0));

        assert_eq!(parse_time("01/01/99 00:00:00", Bangkok).unwrap().year(), 1999);
    }

    #[test]
    fn wrong_number_count_is_rejected() {
        assert!(parse_time("09/10/23 14:30", Bangkok).is_none());
        assert!(parse_time("09/10/23 14:30:00 7", Bangkok).is_none());
        assert!(parse_time("Total", Bangkok).is_none());
    }

    #[test]
    fn field_widths_must_match_portal_layout() {
        assert!(parse_time("09/10/123 14:30:00", Bangkok).is_none());
        assert!(parse_time("09/10/3 14:30:00", Bangkok).is_none());
        assert!(parse_time("09/10/02023 14:30:00", Bangkok).is_none());
        assert!(parse_time("9/1/23 4:30:00", Bangkok).is_none());
        assert!(parse_time("09/10/23 14:3:00", Bangkok).is_none());
        assert!(parse_time("09/10/23 14:30:0", Bangkok).is_none());

        let single_digit_hour = parse_time("09/10/23 4:30:00", Bangkok).unwrap();
        assert_eq!(single_digit_hour.hour(), 4);
    }

    #[test]
    fn odd_width_year_row_is_skipped_and_later_rows_kept() {
        let html = table(
            r#"<tr><td>09/10/23 09:00:00</td><td></td><td></td><td></td><td>10.00</td><td>111-2-33333-4</td><td>first</td></tr>
<tr><td>09/10/123 10:00:00</td><td></td><td></td><td></td><td>20.00</td><td>111-2-33333-4</td><td>bad year</td></tr>
<tr><td>09/10/23 11:00:00</td><td></td><td></td><td></td><td>30.00</td><td>111-2-33333-4</td><td>last</td></tr>"#,
        );

        let txns = parse_statement(&html, Bangkok);
        let details: Vec<&str> = txns.iter().map(|t| t.detail.as_str()).collect();
        assert_eq!(details, ["first", "last"]);
        assert_eq!(txns[1].time.hour(), 11);
    }

    #[test]
    fn impossible_dates_are_rejected() {
        assert!(parse_time("32/13/23 25:61:00", Bangkok).is_none());
    }

    #[test]
    fn amount_strips_thousands_separators() {
        assert_eq!(parse_amount("1,234.56"), Decimal::new(123456, 2));
        assert_eq!(parse_amount(" -1,000,000.00 "), Decimal::new(-100000000, 2));
    }

    #[test]
    fn unparseable_amount_is_zero() {
        assert_eq!(parse_amount("n/a"), Decimal::ZERO);
        assert_eq!(parse_amount(""), Decimal::ZERO);
    }

    #[test]
    fn counterparty_hyphens_are_removed() {
        assert_eq!(normalize_account("123-4-56789-0"), "1234567890");
        assert_eq!(normalize_account(" 987-6-54321-0\n"), "9876543210");
    }

    #[test]
    fn rows_are_kept_in_table_order_and_junk_rows_skipped() {
        let html = table(
            r#"<tr><td>10/10/23 09:00:00</td><td>K PLUS</td><td>Transfer</td><td></td><td>500.00</td><td>111-2-33333-4</td><td>From SOMCHAI</td></tr>
<tr><td colspan="7">No more data</td></tr>
<tr><td>09/10/23 14:30:00</td><td>ATM</td><td>Deposit</td><td></td><td>1,234.56</td><td>555-6-77777-8</td><td>Cash deposit</td></tr>
<tr><td>09/10/23</td><td>ATM</td><td>Deposit</td><td></td><td>1.00</td><td></td><td>broken</td></tr>"#,
        );

        let txns = parse_statement(&html, Bangkok);
        assert_eq!(txns.len(), 2);

        assert_eq!(txns[0].time.day(), 10);
        assert_eq!(txns[0].amount, Decimal::new(50000, 2));
        assert_eq!(txns[0].counterparty_account, "1112333334");
        assert_eq!(txns[0].detail, "From SOMCHAI");

        assert_eq!(txns[1].time.day(), 9);
        assert_eq!(txns[1].amount, Decimal::new(123456, 2));
        assert_eq!(txns[1].counterparty_account, "5556777778");
    }

    #[test]
    fn bad_amount_keeps_the_row() {
        let html = table(
            r#"<tr><td>09/10/23 14:30:00</td><td></td><td></td><td></td><td>--</td><td>123-4-56789-0</td><td>Fee</td></tr>"#,
        );
        let txns = parse_statement(&html, Bangkok);
        assert_eq!(txns.len(), 1);
        assert_eq!(txns[0].amount, Decimal::ZERO);
        assert_eq!(txns[0].detail, "Fee");
    }

    #[test]
    fn missing_table_yields_no_rows() {
        assert!(parse_statement("<html><body><p>Session expired</p></body></html>", Bangkok).is_empty());
    }

    #[test]
    fn detail_cell_is_taken_verbatim() {
        let html = table(
            r#"<tr><td>09/10/23 14:30:00</td><td></td><td></td><td></td><td>1.00</td><td></td><td>  Pay <b>Bill</b> #42 </td></tr>"#,
        );
        let txns = parse_statement(&html, Bangkok);
        assert_eq!(txns[0].detail, "  Pay Bill #42 ");
        assert_eq!(txns[0].counterparty_account, "");
    }
}
