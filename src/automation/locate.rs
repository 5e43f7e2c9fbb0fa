//! Heuristic element search: keyword navigation and account resolution.
//!
//! Statement links are buried in nav menus with inconsistent wording across
//! banks, and account pickers show up as `<select>` dropdowns, clickable card
//! lists, or table rows. These searches cover the dominant layouts without
//! bank-specific code; first match wins, and a miss is an explicit value the
//! caller decides what to do with.

use anyhow::Result;
use tracing::{debug, warn};

use crate::page::{ElementHandle, Located, Page};

/// Candidate link phrases, most specific first. Trying "Detailed Statement"
/// before the bare "Statement" avoids clicking a generic summary link on
/// banks that offer both. Matching is case-sensitive substring.
pub const STATEMENT_KEYWORDS: [&str; 5] = [
    "Detailed Statement",
    "Account Statement",
    "Transaction History",
    "Account Activity",
    "Statement",
];

/// Find a visible statement-navigation link by keyword scan.
///
/// Returns the first visible clickable element matching the most specific
/// keyword that matches anything; no scoring across candidates.
pub async fn find_statement_link(page: &dyn Page) -> Result<Located> {
    for keyword in STATEMENT_KEYWORDS {
        if let Located::Found(el) = page.find_clickable_by_text(keyword).await? {
            debug!(keyword, "Found statement link by keyword");
            return Ok(Located::Found(el));
        }
    }
    warn!("No statement link found via keyword scan");
    Ok(Located::NotFound)
}

/// How an account was selected, if at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountSelection {
    /// Matched a `<select>` option; the option was selected and `change`
    /// dispatched.
    Dropdown,
    /// Matched free text; the element and its immediate parent were clicked.
    Clicked,
    NotFound,
}

/// Locate and select the account matching `account_number`.
///
/// Strategy A scans every select control's options for a text or value
/// substring match. Strategy B scans direct text nodes, skipping option
/// elements already covered by A, and clicks both the matched element and
/// its parent: the actual clickable container is often the parent card/row,
/// and verifying which one would need bank-specific DOM knowledge. Neither
/// click is verified to have had effect.
pub async fn select_account(page: &dyn Page, account_number: &str) -> Result<AccountSelection> {
    // Strategy A: dropdowns.
    for select in page.select_controls().await? {
        for option in page.options(select).await? {
            if option.text.contains(account_number) || option.value.contains(account_number) {
                debug!(account_number, "Account found in dropdown");
                page.choose_option(select, option.index).await?;
                return Ok(AccountSelection::Dropdown);
            }
        }
    }

    // Strategy B: free text in cards, lists, or table rows.
    for el in page.find_text_matches(account_number).await? {
        if page.tag_name(el).await? == "option" {
            continue;
        }
        debug!(account_number, "Account found in free text, clicking");
        page.click(el).await?;
        if let Located::Found(parent) = page.parent(el).await? {
            page.click(parent).await?;
        }
        return Ok(AccountSelection::Clicked);
    }

    warn!(account_number, "Account not found on page");
    Ok(AccountSelection::NotFound)
}

/// Selector lookup with the engine's soft-failure policy: a miss is logged
/// with the human name of the element and skipped, never raised.
pub async fn resolve(
    page: &dyn Page,
    selector: &str,
    what: &str,
) -> Result<Option<ElementHandle>> {
    match page.query(selector).await? {
        Located::Found(el) => Ok(Some(el)),
        Located::NotFound => {
            warn!(selector, "{what} not found, skipping");
            Ok(None)
        }
    }
}
