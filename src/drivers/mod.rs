//! Per-institution drivers for the login → navigate → download protocol.
//!
//! A driver is stateless apart from its immutable selector map; which
//! account and which dates are passed per call, and every stage re-queries
//! fresh elements so the document may be replaced between stages. Bank
//! variance lives in data (the selector map) wherever possible; custom
//! driver types are reserved for banks whose multi-step flow genuinely
//! diverges.

mod registry;
mod selector;

pub use registry::{create_driver, DefaultDriverFactory, DriverFactory, SELECTOR_MAP_DRIVER};
pub use selector::SelectorMapDriver;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::credentials::Credentials;
use crate::page::Page;

/// Login-phase selectors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginSelectors {
    pub username_field: String,
    pub password_field: String,
    pub submit_button: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub otp_input: Option<String>,
}

/// Navigation-phase selectors, used when the keyword heuristic cannot see a
/// statement link (typically because it only renders after a menu click).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavigationSelectors {
    pub accounts_menu: String,
    pub statements_link: String,
}

/// Statement-configuration selectors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatementSelectors {
    pub account_select: String,
    pub from_date: String,
    pub to_date: String,
    pub download_button: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format_select: Option<String>,
}

/// Per-bank selector configuration, grouped by automation phase.
/// Authored once per bank, never mutated at runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectorMap {
    pub login: LoginSelectors,
    pub navigation: NavigationSelectors,
    pub statement: StatementSelectors,
}

/// A per-institution strategy object sequencing the three stages against a
/// live page.
///
/// Stages are independently callable; the external scheduler decides
/// sequencing and may retry an individual stage. Element misses inside a
/// stage are logged and skipped, never raised: a missing field is usually
/// page-state variance (already logged in, different dialog order), not
/// true failure. `Err` is reserved for page-backend transport problems.
#[async_trait]
pub trait BankDriver: Send + Sync {
    /// Human-readable institution name.
    fn name(&self) -> &str;

    /// Fill the login form with human-like typing and submit it.
    async fn login(&self, page: &dyn Page, credentials: &Credentials) -> Result<()>;

    /// Reach the statement-download page, heuristically or via the
    /// configured menu path.
    async fn navigate_to_statements(&self, page: &dyn Page) -> Result<()>;

    /// Select the account, set the date range, and trigger the bank's own
    /// download control. Dates are pre-formatted strings in the bank's
    /// expected format; no parsing happens here.
    async fn download_statement(
        &self,
        page: &dyn Page,
        account_number: &str,
        from_date: &str,
        to_date: &str,
    ) -> Result<()>;
}
