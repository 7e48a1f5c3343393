//! Anchored pattern extraction of single-use tokens from portal pages.
//!
//! Each pattern matches the literal markup of one hidden form field as the
//! portal renders it. The anchors are tied to the page version they were
//! captured from; a change in the surrounding markup shows up as a missing
//! token, never as a parse error.

use std::sync::OnceLock;

use regex::Regex;

use crate::models::AccountNumber;

/// Body returned by `checkSession.jsp` for a live session.
pub const SESSION_OK_MARKER: &str = "<response><result>true</result></response>";

/// Hidden form fields carrying per-request tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// `tokenId` on the K-Online login form (digits).
    LoginToken,
    /// `txtParam` handed from K-Online to the ebank host (lowercase alphanumerics).
    HandoffParam,
    /// Struts anti-forgery token on ebank pages (digits and dots).
    StrutsToken,
}

impl TokenKind {
    /// Form field name the token is posted back under.
    pub fn field_name(self) -> &'static str {
        match self {
            TokenKind::LoginToken => "tokenId",
            TokenKind::HandoffParam => "txtParam",
            TokenKind::StrutsToken => "org.apache.struts.taglib.html.TOKEN",
        }
    }

    fn pattern(self) -> &'static Regex {
        static LOGIN: OnceLock<Regex> = OnceLock::new();
        static HANDOFF: OnceLock<Regex> = OnceLock::new();
        static STRUTS: OnceLock<Regex> = OnceLock::new();

        match self {
            TokenKind::LoginToken => LOGIN.get_or_init(|| {
                Regex::new(r#"<input type="hidden" name="tokenId" id="tokenId" value="([0-9]+)"/>"#)
                    .expect("invalid tokenId regex")
            }),
            TokenKind::HandoffParam => HANDOFF.get_or_init(|| {
                Regex::new(r#" <input type="hidden" name="txtParam" value="([a-z0-9]+)" />"#)
                    .expect("invalid txtParam regex")
            }),
            TokenKind::StrutsToken => STRUTS.get_or_init(|| {
                Regex::new(
                    r#"<input type="hidden" name="org\.apache\.struts\.taglib\.html\.TOKEN" value="([0-9.]+)">"#,
                )
                .expect("invalid struts token regex")
            }),
        }
    }
}

/// Find a token in `html`, or `None` when its anchor is absent.
pub fn find(html: &str, kind: TokenKind) -> Option<String> {
    kind.pattern()
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Find a token in `html`, returning an empty string when it is absent.
pub fn extract(html: &str, kind: TokenKind) -> String {
    find(html, kind).unwrap_or_default()
}

/// Internal identifier of the `<option>` whose label is `account` in the
/// portal's grouping, e.g. `<option value="42">123-4-56789-0 </option>`.
pub fn find_account_id(html: &str, account: &AccountNumber) -> Option<String> {
    let pattern = format!(
        r#"<option value="([0-9]+)">{} </option>"#,
        regex::escape(&account.grouped())
    );
    let re = Regex::new(&pattern).ok()?;
    re.captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Whether a session-check response reports an active session.
pub fn session_is_valid(body: &str) -> bool {
    body.contains(SESSION_OK_MARKER)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOGIN_PAGE: &str = r#"<form name="loginForm" method="post" action="/K-Online/login.do">
<input type="hidden" name="tokenIdOld" value="111"/>
<input type="hidden" name="tokenId" id="tokenId" value="8812345"/>
<input type="text" name="userName" /></form>"#;

    #[test]
    fn login_token_is_anchored_to_full_markup() {
        assert_eq!(find(LOGIN_PAGE, TokenKind::LoginToken).as_deref(), Some("8812345"));
    }

    #[test]
    fn similar_field_names_do_not_match() {
        let html = r#"<input type="hidden" name="tokenIdOld" id="tokenIdOld" value="999"/>"#;
        assert_eq!(find(html, TokenKind::LoginToken), None);
        assert_eq!(extract(html, TokenKind::LoginToken), "");
    }

    #[test]
    fn handoff_param_requires_lowercase_alphanumerics() {
        let ok = r#"<form> <input type="hidden" name="txtParam" value="a1b2c3" /></form>"#;
        assert_eq!(extract(ok, TokenKind::HandoffParam), "a1b2c3");

        let upper = r#"<form> <input type="hidden" name="txtParam" value="A1B2" /></form>"#;
        assert_eq!(extract(upper, TokenKind::HandoffParam), "");
    }

    #[test]
    fn struts_token_allows_dots() {
        let html = r#"<input type="hidden" name="org.apache.struts.taglib.html.TOKEN" value="1697.42.5">"#;
        assert_eq!(extract(html, TokenKind::StrutsToken), "1697.42.5");
    }

    #[test]
    fn struts_token_dots_are_literal_in_the_field_name() {
        let html = r#"<input type="hidden" name="orgXapacheXstrutsXtaglibXhtmlXTOKEN" value="1">"#;
        assert_eq!(find(html, TokenKind::StrutsToken), None);
    }

    #[test]
    fn extraction_is_repeatable() {
        let first = extract(LOGIN_PAGE, TokenKind::LoginToken);
        let second = extract(LOGIN_PAGE, TokenKind::LoginToken);
        assert_eq!(first, second);
    }

    #[test]
    fn empty_input_yields_empty_token() {
        for kind in [TokenKind::LoginToken, TokenKind::HandoffParam, TokenKind::StrutsToken] {
            assert_eq!(extract("", kind), "");
        }
    }

    #[test]
    fn account_option_matches_grouped_label_with_trailing_space() {
        let account = AccountNumber::parse("1234567890").unwrap();
        let html = r#"<select name="acctId">
<option value="">-- select --</option>
<option value="7001">987-6-54321-0 </option>
<option value="7002">123-4-56789-0 </option>
</select>"#;
        assert_eq!(find_account_id(html, &account).as_deref(), Some("7002"));

        let no_space = r#"<option value="7002">123-4-56789-0</option>"#;
        assert_eq!(find_account_id(no_space, &account), None);
    }

    #[test]
    fn session_marker_must_be_exact() {
        assert!(session_is_valid(
            "<?xml version=\"1.0\"?><response><result>true</result></response>"
        ));
        assert!(!session_is_valid("<response><result>false</result></response>"));
        assert!(!session_is_valid("<response> <result>true</result></response>"));
        assert!(!session_is_valid(""));
    }
}
