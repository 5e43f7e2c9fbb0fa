//! The in-page automation engine: human-like typing and heuristic element
//! search. Everything here is best-effort by design; a missing element is a
//! normal condition on bank portals, not a failure.

pub mod locate;
pub mod typing;

pub use locate::{find_statement_link, resolve, select_account, AccountSelection};
pub use typing::{simulate_typing, simulate_typing_with_rng, DelayPolicy};
