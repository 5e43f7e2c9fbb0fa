//! Driver construction from bank profiles.

use anyhow::{anyhow, Result};

use crate::config::BankProfile;

use super::{BankDriver, SelectorMapDriver};

/// Kind tag in a bank profile selecting the driver implementation. The
/// data-driven driver covers every bank shipped so far; a bank whose flow
/// diverges gets its own kind and type here.
pub const SELECTOR_MAP_DRIVER: &str = "selector-map";

pub trait DriverFactory: Send + Sync {
    fn create(&self, profile: &BankProfile) -> Result<Box<dyn BankDriver>>;
}

#[derive(Debug, Clone, Default)]
pub struct DefaultDriverFactory;

impl DriverFactory for DefaultDriverFactory {
    fn create(&self, profile: &BankProfile) -> Result<Box<dyn BankDriver>> {
        match profile.driver.as_str() {
            SELECTOR_MAP_DRIVER => Ok(Box::new(SelectorMapDriver::new(
                profile.name.clone(),
                profile.selectors.clone(),
            ))),
            other => Err(anyhow!("Unknown driver kind: {other}")),
        }
    }
}

pub fn create_driver(profile: &BankProfile) -> Result<Box<dyn BankDriver>> {
    DefaultDriverFactory.create(profile)
}
