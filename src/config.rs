//! Configuration loading.
//!
//! Bank profiles are authored as TOML: one `[banks.<key>]` table per
//! institution carrying its login URL, date format, and selector map. A
//! handful of profiles ship built in; user configuration overrides them by
//! key.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::drivers::{
    LoginSelectors, NavigationSelectors, SelectorMap, StatementSelectors, SELECTOR_MAP_DRIVER,
};

fn default_driver() -> String {
    SELECTOR_MAP_DRIVER.to_string()
}

fn default_date_format() -> String {
    "%d/%m/%Y".to_string()
}

/// One bank's automation profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BankProfile {
    /// Human-readable institution name.
    pub name: String,

    /// Login page the browser is pointed at before the driver runs.
    pub login_url: String,

    /// Driver implementation for this bank.
    #[serde(default = "default_driver")]
    pub driver: String,

    /// strftime-style format the bank's date inputs expect. Dates are
    /// formatted by the caller; the driver only ever sees strings.
    #[serde(default = "default_date_format")]
    pub date_format: String,

    pub selectors: SelectorMap,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Where triggered downloads should land. Defaults under the platform
    /// data directory.
    pub download_dir: Option<PathBuf>,

    pub banks: HashMap<String, BankProfile>,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let mut config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config: {}", path.display()))?;

        // Built-ins fill in any bank the user did not define themselves.
        for (key, profile) in builtin_banks() {
            config.banks.entry(key).or_insert(profile);
        }
        Ok(config)
    }

    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self {
                download_dir: None,
                banks: builtin_banks(),
            })
        }
    }

    pub fn bank(&self, key: &str) -> Option<&BankProfile> {
        self.banks.get(key)
    }

    pub fn resolved_download_dir(&self) -> Result<PathBuf> {
        match &self.download_dir {
            Some(dir) => Ok(dir.clone()),
            None => {
                let base = dirs::data_dir().context("Could not find data directory")?;
                Ok(base.join("bankfetch").join("downloads"))
            }
        }
    }

    /// Per-bank browser profile directory, so sessions and cookies stay
    /// isolated between institutions.
    pub fn browser_profile_dir(&self, bank_key: &str) -> Result<PathBuf> {
        let base = dirs::data_dir().context("Could not find data directory")?;
        Ok(base.join("bankfetch").join("profiles").join(bank_key))
    }
}

/// Profiles shipped with the binary.
pub fn builtin_banks() -> HashMap<String, BankProfile> {
    let mut banks = HashMap::new();
    banks.insert(
        "svc".to_string(),
        BankProfile {
            name: "SVC Co-Operative Bank".to_string(),
            login_url: "https://netbankingpib.svcbank.com/PIB/DefaultPages/Login.aspx".to_string(),
            driver: default_driver(),
            date_format: default_date_format(),
            selectors: SelectorMap {
                login: LoginSelectors {
                    username_field: "input[name*='LoginId']".to_string(),
                    password_field: "input[type='password']".to_string(),
                    submit_button: "input[value='Log In']".to_string(),
                    otp_input: None,
                },
                navigation: NavigationSelectors {
                    accounts_menu: "a[href*='Accounts']".to_string(),
                    statements_link: "a[href*='DetailedStatement.aspx']".to_string(),
                },
                statement: StatementSelectors {
                    account_select: "select[name*='ddlAccount']".to_string(),
                    from_date: "input[name*='txtFromDate']".to_string(),
                    to_date: "input[name*='txtToDate']".to_string(),
                    download_button: "input[value='Proceed']".to_string(),
                    format_select: Some("img[src*='xls']".to_string()),
                },
            },
        },
    );
    banks
}
