//! Scripted copy of the storefront for `--backend mock`
//!
//! Mirrors the pieces of the real site the storefront scenarios touch: the
//! login form, six products with the real prices, the sort dropdown, the
//! cart badge and the side menu. Login redirects after a short delay so URL
//! waits are exercised.

use escenario::mock::{MockEffect, MockElement, MockPage};
use escenario::{EscenarioResult, Locator, PageObject};
use std::time::Duration;

use super::pages::{InventoryPage, LoginPage, MenuPage, SORT_PRICE_LOW_TO_HIGH};
use super::{PASSWORD, STANDARD_USER};

/// Prices of the six products in their default order
pub const PRICES: [f64; 6] = [29.99, 9.99, 15.99, 49.99, 7.99, 15.99];

const INVENTORY: &str = "inventory.html";
const LOGIN_REDIRECT: Duration = Duration::from_millis(300);
const REJECTED: &str = "Epic sadface: Username and password do not match any user in this service";

fn price_elements(prices: &[f64]) -> Vec<MockElement> {
    prices
        .iter()
        .map(|p| {
            MockElement::new(InventoryPage::prices())
                .with_text(format!("${p:.2}"))
                .on_page(INVENTORY)
        })
        .collect()
}

fn sorted_prices() -> Vec<f64> {
    let mut prices = PRICES.to_vec();
    prices.sort_by(f64::total_cmp);
    prices
}

fn cart_badge(count: &str) -> MockElement {
    MockElement::new(MenuPage::cart())
        .with_text(count)
        .on_page(INVENTORY)
}

fn login_form() -> [Locator; 3] {
    [
        LoginPage::username(),
        LoginPage::password(),
        LoginPage::login_button(),
    ]
}

fn login_effects(base: &str) -> Vec<MockEffect> {
    let reject = vec![MockEffect::Reveal(LoginPage::error_banner())];
    let mut accept: Vec<MockEffect> = login_form().into_iter().map(MockEffect::Remove).collect();
    accept.push(MockEffect::Remove(LoginPage::error_banner()));
    accept.push(MockEffect::NavigateAfter {
        url: format!("{}/{INVENTORY}", base.trim_end_matches('/')),
        delay: LOGIN_REDIRECT,
    });
    vec![MockEffect::When {
        field: LoginPage::username(),
        equals: STANDARD_USER.to_string(),
        then: vec![MockEffect::When {
            field: LoginPage::password(),
            equals: PASSWORD.to_string(),
            then: accept,
            otherwise: reject.clone(),
        }],
        otherwise: reject,
    }]
}

fn logout_effects(base: &str) -> Vec<MockEffect> {
    let mut effects = vec![
        MockEffect::Remove(MenuPage::logout_link()),
        MockEffect::Navigate(base.to_string()),
    ];
    effects.extend(login_form().into_iter().map(MockEffect::Reveal));
    effects
}

/// The storefront served at `base`
///
/// # Errors
///
/// Returns an error if the sort option locator cannot be built.
pub fn mock_storefront(base: &str) -> EscenarioResult<MockPage> {
    let mut login_button = MockElement::new(LoginPage::login_button());
    for effect in login_effects(base) {
        login_button = login_button.on_click(effect);
    }

    let mut logout = MockElement::new(MenuPage::logout_link())
        .hidden()
        .on_page(INVENTORY);
    for effect in logout_effects(base) {
        logout = logout.on_click(effect);
    }

    let mut sort_option =
        MockElement::new(InventoryPage::sort_select().option_with_text(SORT_PRICE_LOW_TO_HIGH)?)
            .with_text(SORT_PRICE_LOW_TO_HIGH)
            .on_page(INVENTORY)
            .on_click(MockEffect::Remove(InventoryPage::prices()));
    for price in price_elements(&sorted_prices()) {
        sort_option = sort_option.on_click(MockEffect::Insert(price));
    }

    let mut page = MockPage::new()
        .with_element(MockElement::new(LoginPage::username()))
        .with_element(MockElement::new(LoginPage::password()))
        .with_element(login_button)
        .with_element(
            MockElement::new(LoginPage::error_banner())
                .with_text(REJECTED)
                .hidden(),
        )
        .with_element(
            MockElement::new(InventoryPage.ready_locator())
                .appearing_after(Duration::from_millis(150))
                .on_page(INVENTORY),
        )
        .with_element(
            MockElement::new(InventoryPage::title())
                .with_text("Products")
                .on_page(INVENTORY),
        )
        .with_element(
            MockElement::new(InventoryPage::first_add_to_cart())
                .with_text("Add to cart")
                .on_page(INVENTORY)
                .on_click(MockEffect::Remove(InventoryPage::first_add_to_cart()))
                .on_click(MockEffect::Reveal(InventoryPage::remove_buttons()))
                .on_click(MockEffect::Remove(MenuPage::cart()))
                .on_click(MockEffect::Insert(cart_badge("1"))),
        )
        .with_element(
            MockElement::new(InventoryPage::remove_buttons())
                .with_text("Remove")
                .detached()
                .on_page(INVENTORY)
                .on_click(MockEffect::Remove(InventoryPage::remove_buttons()))
                .on_click(MockEffect::Reveal(InventoryPage::first_add_to_cart()))
                .on_click(MockEffect::Remove(MenuPage::cart()))
                .on_click(MockEffect::Insert(cart_badge(""))),
        )
        .with_element(cart_badge(""))
        .with_element(MockElement::new(InventoryPage::sort_select()).on_page(INVENTORY))
        .with_element(sort_option)
        .with_element(
            MockElement::new(MenuPage::burger())
                .on_page(INVENTORY)
                .on_click(MockEffect::Reveal(MenuPage::logout_link())),
        )
        .with_element(logout);

    for price in price_elements(&PRICES) {
        page = page.with_element(price);
    }
    Ok(page)
}
