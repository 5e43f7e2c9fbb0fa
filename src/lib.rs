pub mod automation;
pub mod browser;
pub mod config;
pub mod credentials;
pub mod drivers;
pub mod page;
