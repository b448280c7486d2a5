//! Scenarios for the public demo storefront
//!
//! Page objects live in [`pages`], the scenarios in [`scenarios`], and a
//! scripted copy of the site for offline runs in [`site`].

pub mod pages;
pub mod scenarios;
pub mod site;

pub use pages::{InventoryPage, LoginPage, MenuPage};
pub use scenarios::storefront_suite;
pub use site::mock_storefront;

/// Where the storefront is served
pub const DEFAULT_BASE_URL: &str = "https://www.saucedemo.com/";

/// User that can log in
pub const STANDARD_USER: &str = "standard_user";
/// Password shared by every demo user
pub const PASSWORD: &str = "secret_sauce";
/// User that does not exist
pub const INVALID_USER: &str = "invalid_user";
/// Password that matches no user
pub const INVALID_PASSWORD: &str = "wrong_password";
