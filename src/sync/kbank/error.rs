use thiserror::Error;

use crate::models::AccountNumberError;

/// Login step or page an error was raised from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    LoginPage,
    SubmitCredentials,
    SessionCheck,
    RedirectToIb,
    Welcome,
    StatementPage,
    StatementDetail,
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Step::LoginPage => "login page",
            Step::SubmitCredentials => "credential submission",
            Step::SessionCheck => "session check",
            Step::RedirectToIb => "redirect to internet banking",
            Step::Welcome => "welcome handoff",
            Step::StatementPage => "statement page",
            Step::StatementDetail => "statement detail",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum KBankError {
    /// Connection, TLS or timeout failure. Never retried.
    #[error("{step}: request failed: {source}")]
    Transport {
        step: Step,
        #[source]
        source: reqwest::Error,
    },

    #[error("{step}: server answered {status} for {url}")]
    Status {
        step: Step,
        status: reqwest::StatusCode,
        url: String,
    },

    #[error("{step}: {token} not found in page")]
    MissingToken { step: Step, token: &'static str },

    #[error("session check did not report an active session")]
    SessionCheckFailed,

    #[error("account {0} is not listed on the statement page")]
    AccountNotFound(String),

    #[error(transparent)]
    InvalidAccountNumber(#[from] AccountNumberError),

    #[error("unknown time zone {0:?}")]
    InvalidTimeZone(String),

    #[error("not logged in: call login() first")]
    NotLoggedIn,

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

impl KBankError {
    /// True for failures of the network exchange itself rather than of the
    /// portal protocol.
    pub fn is_transport(&self) -> bool {
        matches!(self, KBankError::Transport { .. } | KBankError::Status { .. })
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, KBankError::Transport { source, .. } if source.is_timeout())
    }
}

pub type Result<T> = std::result::Result<T, KBankError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_failing_step() {
        let err = KBankError::MissingToken {
            step: Step::RedirectToIb,
            token: "txtParam",
        };
        assert_eq!(
            err.to_string(),
            "redirect to internet banking: txtParam not found in page"
        );
        assert!(!err.is_transport());
    }

    #[test]
    fn protocol_errors_are_not_transport() {
        assert!(!KBankError::SessionCheckFailed.is_transport());
        assert!(!KBankError::AccountNotFound("123-4-56789-0".into()).is_transport());
        assert!(!KBankError::NotLoggedIn.is_timeout());
    }
}
