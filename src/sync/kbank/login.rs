use secrecy::ExposeSecret;
use tracing::{debug, info, warn};

use super::error::{KBankError, Result, Step};
use super::tokens::{self, TokenKind};
use super::KBankClient;

const LOGIN_PATH: &str = "/login.do";
const CHECK_SESSION_PATH: &str = "/checkSession.jsp";
const REDIRECT_TO_IB_PATH: &str = "/ib/redirectToIB.jsp";
const WELCOME_PATH: &str = "/retail/security/Welcome.do";

/// Progress through the login handshake.
///
/// Transitions only move forward; a failure at any hop lands in `Failed`
/// and the next [`KBankClient::login`] starts again from the login page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginState {
    Unauthenticated,
    /// Credentials posted to K-Online, session not yet confirmed.
    Submitted,
    /// K-Online session confirmed.
    Primary,
    /// Handoff accepted by ebank; statement pages are reachable.
    Secondary,
    Failed,
}

impl LoginState {
    pub fn is_authenticated(self) -> bool {
        self == LoginState::Secondary
    }
}

impl KBankClient {
    /// Run the full login handshake across both portal hosts.
    ///
    /// Nothing is retried. On error the client is left in
    /// [`LoginState::Failed`] and the caller decides whether to try again.
    pub async fn login(&mut self) -> Result<()> {
        self.state = LoginState::Unauthenticated;

        match self.run_login().await {
            Ok(()) => {
                self.state = LoginState::Secondary;
                info!(account = %self.credentials.account_no.masked(), "KBank login complete");
                Ok(())
            }
            Err(err) => {
                warn!(state = ?self.state, error = %err, "KBank login failed");
                self.state = LoginState::Failed;
                Err(err)
            }
        }
    }

    async fn run_login(&mut self) -> Result<()> {
        let login_url = self.options.endpoints.online_url(LOGIN_PATH);

        let page = self.http.get(Step::LoginPage, &login_url).await?;
        let token = tokens::extract(&page, TokenKind::LoginToken);
        if token.is_empty() {
            // The session check below rejects the login if the token mattered.
            warn!("Login page has no tokenId, submitting without it");
        }

        let form = [
            (TokenKind::LoginToken.field_name(), token.as_str()),
            ("userName", self.credentials.username.as_str()),
            ("password", self.credentials.password.expose_secret()),
            ("cmd", "authenticate"),
            ("locale", self.options.locale.as_str()),
            ("custType", ""),
            ("app", "0"),
        ];
        self.http
            .post_form(Step::SubmitCredentials, &login_url, &form)
            .await?;
        self.state = LoginState::Submitted;
        debug!("Credentials submitted");

        if !self.check_session().await {
            return Err(KBankError::SessionCheckFailed);
        }
        self.state = LoginState::Primary;
        debug!("K-Online session confirmed");

        let redirect_url = self.options.endpoints.online_url(REDIRECT_TO_IB_PATH);
        let redirect = self.http.get(Step::RedirectToIb, &redirect_url).await?;
        let handoff = tokens::find(&redirect, TokenKind::HandoffParam).ok_or(
            KBankError::MissingToken {
                step: Step::RedirectToIb,
                token: TokenKind::HandoffParam.field_name(),
            },
        )?;

        let welcome_url = self.options.endpoints.ebank_url(WELCOME_PATH);
        self.http
            .post_form(
                Step::Welcome,
                &welcome_url,
                &[(TokenKind::HandoffParam.field_name(), handoff.as_str())],
            )
            .await?;
        debug!("Ebank handoff accepted");

        Ok(())
    }

    /// Ask K-Online whether the session is still live.
    ///
    /// Never fails: any transport or status error counts as "not logged in".
    pub async fn check_session(&self) -> bool {
        let url = self.options.endpoints.online_url(CHECK_SESSION_PATH);
        match self.http.post_form(Step::SessionCheck, &url, &[]).await {
            Ok(body) => tokens::session_is_valid(&body),
            Err(err) => {
                debug!(error = %err, "Session check request failed");
                false
            }
        }
    }
}
