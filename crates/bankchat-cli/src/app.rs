use std::io::{self, Write};

use anyhow::{anyhow, bail, Result};
use bankchat_core::api::ApiError;
use bankchat_core::models::{
    parse_amount, ChatTranscript, Credentials, DepositRequest, TransactionResult, TransferRequest,
};
use bankchat_core::utils::balance_display;
use bankchat_core::{BankingClient, Config, InFlightGuard, SessionStore};
use tracing::{error, info, warn};

/// Command that ends an interactive chat
const CHAT_QUIT: &str = "/quit";

const TRANSPORT_FAILURE: &str = "Failed to process transaction. Please try again later.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionKind {
    Send,
    Deposit,
}

impl TransactionKind {
    fn label(&self) -> &'static str {
        match self {
            TransactionKind::Send => "Transaction",
            TransactionKind::Deposit => "Deposit",
        }
    }
}

/// Text shown to the user for a transfer or deposit attempt, and whether it
/// counts as success.
pub fn outcome_message(
    kind: TransactionKind,
    result: &Result<TransactionResult, ApiError>,
) -> (bool, String) {
    match result {
        Ok(r) if r.is_success() => (
            true,
            format!(
                "{} completed successfully. Transaction ID: {}",
                kind.label(),
                r.transaction_id
            ),
        ),
        Ok(r) => (false, format!("{} Failed: {}", kind.label(), r.message)),
        Err(_) => (false, TRANSPORT_FAILURE.to_string()),
    }
}

pub fn login_failure_message(err: &ApiError) -> String {
    match err {
        ApiError::Authentication(_) | ApiError::Unauthorized => {
            "Invalid username or password".to_string()
        }
        ApiError::Network(_) => {
            "Unable to connect to server. Check your internet connection.".to_string()
        }
        ApiError::SessionNotSaved => {
            "Logged in, but the session could not be saved. Check the data directory.".to_string()
        }
        other => format!("Login failed: {}", other),
    }
}

pub struct App {
    config: Config,
    client: BankingClient,
    guard: InFlightGuard,
}

impl App {
    pub fn new(config: Config, base_url: &str) -> Result<Self> {
        let session = config.session_store()?;
        let client = BankingClient::connect(base_url, session)?;
        Ok(Self {
            config,
            client,
            guard: InFlightGuard::new(),
        })
    }

    fn session(&self) -> &SessionStore {
        self.client.session()
    }

    async fn require_login(&self) -> Result<()> {
        if !self.session().is_logged_in().await {
            bail!("Not logged in. Run `bankchat login` first.");
        }
        Ok(())
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    pub async fn login(&mut self, username: Option<String>) -> Result<()> {
        let username = match username {
            Some(u) => u,
            None => prompt_username(self.config.last_username.as_deref())?,
        };
        let password = rpassword::prompt_password("Password: ")?;

        let credentials = Credentials::new(username.trim(), password);
        if !credentials.is_filled() {
            bail!("Username and password required");
        }

        let _ticket = self
            .guard
            .try_begin()
            .ok_or_else(|| anyhow!("A login is already in progress"))?;

        println!("Authenticating...");
        match self.client.login_and_save(&credentials).await {
            Ok(_) => {
                self.config.last_username = Some(credentials.username.clone());
                if let Err(e) = self.config.save() {
                    warn!(error = %e, "Failed to save config");
                }
                println!("Login successful!");
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "Login failed");
                bail!(login_failure_message(&e))
            }
        }
    }

    pub async fn logout(&self) -> Result<()> {
        self.session().clear_all().await;
        info!("Logged out");
        println!("Logged out.");
        Ok(())
    }

    pub async fn status(&self) -> Result<()> {
        let session = self.session().snapshot().await;
        if session.is_complete() {
            println!("Logged in");
            println!("  User ID:    {}", session.user_id.unwrap_or_default());
            println!("  Account ID: {}", session.account_id.unwrap_or_default());
        } else if session.auth_token.is_some() {
            println!("Session incomplete. Run `bankchat login` again.");
        } else {
            println!("Not logged in.");
        }
        Ok(())
    }

    // =========================================================================
    // Account
    // =========================================================================

    pub async fn balance(&self) -> Result<()> {
        self.require_login().await?;

        let Some(account_id) = self.session().account_id().await else {
            self.session().clear_all().await;
            bail!("Account information not found. Run `bankchat login` again.");
        };

        let _ticket = self
            .guard
            .try_begin()
            .ok_or_else(|| anyhow!("A request is already in progress"))?;

        match self.client.get_balance(&account_id).await {
            Ok(snapshot) => {
                println!("Account: {}", account_id);
                println!("Balance: {}", balance_display(Some(&snapshot)));
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "Error fetching balance");
                println!("Balance: {}", balance_display(None));
                bail!("Failed to fetch account balance")
            }
        }
    }

    pub async fn submit(
        &self,
        kind: TransactionKind,
        recipient: Option<&str>,
        amount: &str,
    ) -> Result<()> {
        self.require_login().await?;

        let account_id = self
            .session()
            .account_id()
            .await
            .ok_or_else(|| anyhow!("Account information not found"))?;
        let amount = parse_amount(amount).map_err(|_| anyhow!("Please enter a valid amount"))?;
        let currency = self.config.currency.as_str();

        let _ticket = self
            .guard
            .try_begin()
            .ok_or_else(|| anyhow!("A request is already in progress"))?;

        let result = match kind {
            TransactionKind::Send => {
                let request =
                    TransferRequest::new(account_id, recipient.unwrap_or_default(), amount, currency)?;
                self.client.send_transaction(&request).await
            }
            TransactionKind::Deposit => {
                let request = DepositRequest::new(account_id, amount, currency)?;
                self.client.make_deposit(&request).await
            }
        };

        if let Err(ref e) = result {
            error!(error = %e, "Transaction error");
        }
        let (success, message) = outcome_message(kind, &result);
        if !success {
            bail!(message);
        }
        println!("{}", message);
        Ok(())
    }

    // =========================================================================
    // Chat
    // =========================================================================

    pub async fn chat(&self, message: Option<String>) -> Result<()> {
        self.require_login().await?;
        let user_id = self
            .session()
            .user_id()
            .await
            .ok_or_else(|| anyhow!("User information not found. Run `bankchat login` again."))?;

        let mut transcript = ChatTranscript::new();
        if let Some(welcome) = transcript.last() {
            println!("Assistant: {}", welcome.text);
        }

        if let Some(message) = message {
            self.chat_turn(&mut transcript, &user_id, &message).await;
            return Ok(());
        }

        loop {
            print!("You: ");
            io::stdout().flush()?;

            let mut input = String::new();
            if io::stdin().read_line(&mut input)? == 0 {
                break;
            }
            let input = input.trim();
            if input == CHAT_QUIT {
                break;
            }
            self.chat_turn(&mut transcript, &user_id, input).await;
        }
        Ok(())
    }

    async fn chat_turn(&self, transcript: &mut ChatTranscript, user_id: &str, text: &str) {
        let Some(_ticket) = self.guard.try_begin() else {
            return;
        };
        if let Some(reply) = transcript.send(&self.client, user_id, text).await {
            println!("Assistant: {}", reply.text);
        }
    }
}

fn prompt_username(last_username: Option<&str>) -> Result<String> {
    match last_username {
        Some(last) => print!("Username [{}]: ", last),
        None => print!("Username: "),
    }
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let input = input.trim();

    match (input.is_empty(), last_username) {
        (true, Some(last)) => Ok(last.to_string()),
        _ => Ok(input.to_string()),
    }
}
