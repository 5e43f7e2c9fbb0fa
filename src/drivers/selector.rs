//! Data-driven bank driver over a selector map.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use secrecy::ExposeSecret;
use tokio::time::sleep;
use tracing::{debug, info};

use crate::automation::{
    find_statement_link, resolve, select_account, simulate_typing, DelayPolicy,
};
use crate::credentials::Credentials;
use crate::page::{Located, Page};

use super::{BankDriver, SelectorMap};

/// Generic submit lookup for portals whose login button has no stable id.
const FALLBACK_SUBMIT_SELECTOR: &str = "button[type='submit'], input[type='submit']";

/// Human hesitation before clicking the login submit.
const PRE_SUBMIT_PAUSE: Duration = Duration::from_millis(500);

/// Settle delay after opening the accounts menu, so a lazily rendered
/// submenu exists before the statements link is queried.
const MENU_SETTLE: Duration = Duration::from_millis(500);

/// Settle delay after the download/proceed click, covering the page or
/// modal transition before the format selector is queried.
const DOWNLOAD_SETTLE: Duration = Duration::from_millis(2000);

/// Drives any bank whose flow fits the common three-stage shape; the bank's
/// identity is entirely in its selector map.
pub struct SelectorMapDriver {
    name: String,
    selectors: SelectorMap,
}

impl SelectorMapDriver {
    pub fn new(name: impl Into<String>, selectors: SelectorMap) -> Self {
        Self {
            name: name.into(),
            selectors,
        }
    }

    async fn click_and_type(
        &self,
        page: &dyn Page,
        selector: &str,
        what: &str,
        text: &str,
        delays: &DelayPolicy,
    ) -> Result<()> {
        if let Some(field) = resolve(page, selector, what).await? {
            // Explicit user-intent click before typing, matching real usage.
            page.click(field).await?;
            simulate_typing(page, field, text, delays).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl BankDriver for SelectorMapDriver {
    fn name(&self) -> &str {
        &self.name
    }

    async fn login(&self, page: &dyn Page, credentials: &Credentials) -> Result<()> {
        info!(bank = %self.name, "Starting login");

        self.click_and_type(
            page,
            &self.selectors.login.username_field,
            "username field",
            &credentials.user,
            &DelayPolicy::credentials(),
        )
        .await?;

        self.click_and_type(
            page,
            &self.selectors.login.password_field,
            "password field",
            credentials.pass.expose_secret(),
            &DelayPolicy::credentials(),
        )
        .await?;

        let submit = match resolve(page, &self.selectors.login.submit_button, "submit button")
            .await?
        {
            Some(el) => Some(el),
            None => resolve(page, FALLBACK_SUBMIT_SELECTOR, "generic submit button").await?,
        };
        if let Some(button) = submit {
            sleep(PRE_SUBMIT_PAUSE).await;
            page.click(button).await?;
        }

        Ok(())
    }

    async fn navigate_to_statements(&self, page: &dyn Page) -> Result<()> {
        info!(bank = %self.name, "Navigating to statements");

        match find_statement_link(page).await? {
            Located::Found(link) => {
                page.click(link).await?;
            }
            Located::NotFound => {
                // Some banks hide the statement link inside a menu that only
                // renders after a prior click; a page-load-time scan cannot
                // see it.
                debug!("Keyword scan missed, using configured menu path");
                if let Some(menu) =
                    resolve(page, &self.selectors.navigation.accounts_menu, "accounts menu")
                        .await?
                {
                    page.click(menu).await?;
                    sleep(MENU_SETTLE).await;
                    if let Some(link) = resolve(
                        page,
                        &self.selectors.navigation.statements_link,
                        "statements link",
                    )
                    .await?
                    {
                        page.click(link).await?;
                    }
                }
            }
        }

        Ok(())
    }

    async fn download_statement(
        &self,
        page: &dyn Page,
        account_number: &str,
        from_date: &str,
        to_date: &str,
    ) -> Result<()> {
        info!(bank = %self.name, account_number, "Configuring statement download");

        // Best effort: later steps no-op on their own against missing
        // context, so a failed account match does not gate them.
        let selection = select_account(page, account_number).await?;
        debug!(?selection, "Account selection outcome");

        if let Some(field) =
            resolve(page, &self.selectors.statement.from_date, "from-date field").await?
        {
            simulate_typing(page, field, from_date, &DelayPolicy::default()).await?;
        }
        if let Some(field) =
            resolve(page, &self.selectors.statement.to_date, "to-date field").await?
        {
            simulate_typing(page, field, to_date, &DelayPolicy::default()).await?;
        }

        if let Some(button) = resolve(
            page,
            &self.selectors.statement.download_button,
            "download button",
        )
        .await?
        {
            page.click(button).await?;
            sleep(DOWNLOAD_SETTLE).await;
        }

        if let Some(selector) = &self.selectors.statement.format_select {
            if let Some(icon) = resolve(page, selector, "format selector").await? {
                page.click(icon).await?;
            }
        }

        Ok(())
    }
}
