//! KBank online-banking client.
//!
//! The portal is split over two hosts with separate session contexts:
//! K-Online (`online.kasikornbankgroup.com`) handles authentication and the
//! ebank host (`ebank.kasikornbankgroup.com`) serves account data. A login
//! authenticates against K-Online, then carries a single-use handoff
//! parameter across to ebank. Statement pages are server-rendered HTML, so
//! tokens are pulled out with anchored patterns and the transaction table is
//! parsed with `scraper`.
//!
//! ```no_run
//! # async fn run() -> anyhow::Result<()> {
//! use kbank::credentials::Credentials;
//! use kbank::sync::kbank::{ClientOptions, KBankClient};
//!
//! let credentials = Credentials::new("user", "secret", "123-4-56789-0")?;
//! let mut client = KBankClient::new(credentials, ClientOptions::default())?;
//! client.login().await?;
//! for txn in client.get_transactions().await? {
//!     println!("{} {} {}", txn.time, txn.amount, txn.detail);
//! }
//! # Ok(())
//! # }
//! ```

mod cookies;
mod error;
mod http;
mod login;
mod statement;
pub mod tokens;

pub use cookies::PortalCookieJar;
pub use error::{KBankError, Result, Step};
pub use http::PortalHttp;
pub use login::LoginState;
pub use statement::parse_statement;

use std::time::Duration;

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::credentials::Credentials;
use crate::models::AccountNumber;

const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Base URLs of the two portal hosts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    /// K-Online base, including the `/K-Online` context path.
    pub online: String,
    /// Ebank base.
    pub ebank: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            online: "https://online.kasikornbankgroup.com/K-Online".to_string(),
            ebank: "https://ebank.kasikornbankgroup.com".to_string(),
        }
    }
}

impl Endpoints {
    pub(crate) fn online_url(&self, path: &str) -> String {
        format!("{}{}", self.online.trim_end_matches('/'), path)
    }

    pub(crate) fn ebank_url(&self, path: &str) -> String {
        format!("{}{}", self.ebank.trim_end_matches('/'), path)
    }
}

/// Settings for a [`KBankClient`] other than credentials.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub endpoints: Endpoints,
    /// Bound on each request, covering connect through body read.
    pub timeout: Duration,
    /// Zone statement timestamps are rendered in.
    pub time_zone: Tz,
    /// `locale` posted with the credentials.
    pub locale: String,
    pub user_agent: String,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            endpoints: Endpoints::default(),
            timeout: Duration::from_secs(30),
            time_zone: chrono_tz::Asia::Bangkok,
            locale: "en".to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// A logged-in (or not yet logged-in) portal session for one user.
///
/// Session state lives in cookies that every request reads and rewrites, so
/// the flows that drive the session take `&mut self` and only one request is
/// in flight at a time.
pub struct KBankClient {
    http: PortalHttp,
    credentials: Credentials,
    options: ClientOptions,
    state: LoginState,
}

impl KBankClient {
    pub fn new(credentials: Credentials, options: ClientOptions) -> Result<Self> {
        let http = PortalHttp::new(options.timeout, &options.user_agent)?;
        Ok(Self {
            http,
            credentials,
            options,
            state: LoginState::Unauthenticated,
        })
    }

    pub fn state(&self) -> LoginState {
        self.state
    }

    pub fn account_no(&self) -> &AccountNumber {
        &self.credentials.account_no
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }
}
