//! The storefront suite

use escenario::page_object;
use escenario::prelude::*;

use super::pages::{InventoryPage, LoginPage, MenuPage, SORT_PRICE_LOW_TO_HIGH};
use super::{INVALID_PASSWORD, INVALID_USER, PASSWORD, STANDARD_USER};

async fn on_login_page(ctx: &mut ScenarioContext) -> EscenarioResult<()> {
    page_object::open(&LoginPage, ctx).await?;
    Ok(())
}

async fn logged_in(ctx: &mut ScenarioContext) -> EscenarioResult<()> {
    on_login_page(ctx).await?;
    LoginPage.login(ctx, STANDARD_USER, PASSWORD).await?;
    page_object::wait_loaded(&InventoryPage, ctx).await?;
    Ok(())
}

async fn item_in_cart(ctx: &mut ScenarioContext) -> EscenarioResult<()> {
    InventoryPage.add_first_to_cart(ctx).await?;
    let count = MenuPage.cart_count(ctx).await?;
    ctx.ensure(count == 1, &format!("cart badge shows {count}, expected 1"))
}

fn successful_login() -> Scenario {
    Scenario::new("Successful login")
        .tag("login")
        .tag("smoke")
        .given("the user is on the login page", |ctx| Box::pin(on_login_page(ctx)))
        .when("the user logs in with valid credentials", |ctx| {
            Box::pin(async move { LoginPage.login(ctx, STANDARD_USER, PASSWORD).await })
        })
        .then("the user is redirected to the inventory page", |ctx| {
            Box::pin(async move {
                page_object::wait_loaded(&InventoryPage, ctx).await?;
                let heading = InventoryPage.heading(ctx).await?;
                ctx.check_eq(&heading.as_str(), &"Products", "inventory heading")
            })
        })
}

fn failed_login() -> Scenario {
    Scenario::new("Failed login")
        .tag("login")
        .given("the user is on the login page", |ctx| Box::pin(on_login_page(ctx)))
        .when("the user logs in with invalid credentials", |ctx| {
            Box::pin(async move { LoginPage.login(ctx, INVALID_USER, INVALID_PASSWORD).await })
        })
        .then("the user sees a failed message", |ctx| {
            Box::pin(async move {
                let message = LoginPage.error_message(ctx).await?;
                ctx.ensure(
                    message.contains("do not match"),
                    &format!("unexpected error banner: {message:?}"),
                )
            })
        })
}

fn add_to_cart() -> Scenario {
    Scenario::new("Add item to cart")
        .tag("cart")
        .tag("smoke")
        .given("the user is logged in", |ctx| Box::pin(logged_in(ctx)))
        .when("the user adds the first item to the cart", |ctx| {
            Box::pin(async move { InventoryPage.add_first_to_cart(ctx).await })
        })
        .then("the cart badge shows 1", |ctx| {
            Box::pin(async move {
                let count = MenuPage.cart_count(ctx).await?;
                ctx.ensure(count == 1, &format!("cart badge shows {count}, expected 1"))
            })
        })
        .and("the item offers to be removed", |ctx| {
            Box::pin(async move {
                let buttons = ctx.session()?.find_all(&InventoryPage::remove_buttons()).await?;
                ctx.check_eq(&buttons.len(), &1, "remove buttons")
            })
        })
}

fn remove_from_cart() -> Scenario {
    Scenario::new("Remove item from cart")
        .tag("cart")
        .given("the user is logged in", |ctx| Box::pin(logged_in(ctx)))
        .and("an item is in the cart", |ctx| Box::pin(item_in_cart(ctx)))
        .when("the user removes the item", |ctx| {
            Box::pin(async move { InventoryPage.remove_first_from_cart(ctx).await })
        })
        .then("the cart is empty", |ctx| {
            Box::pin(async move {
                let count = MenuPage.cart_count(ctx).await?;
                ctx.ensure(count == 0, &format!("cart badge shows {count}, expected none"))
            })
        })
}

fn sort_by_price() -> Scenario {
    Scenario::new("Sort by price low to high")
        .tag("sort")
        .given("the user is logged in", |ctx| Box::pin(logged_in(ctx)))
        .when("the user sorts by price from low to high", |ctx| {
            Box::pin(async move { InventoryPage.sort_by(ctx, SORT_PRICE_LOW_TO_HIGH).await })
        })
        .then("the cheapest item is listed first", |ctx| {
            Box::pin(async move {
                let prices = InventoryPage.item_prices(ctx).await?;
                let Some(&first) = prices.first() else {
                    return Err(EscenarioError::assertion("no prices listed"));
                };
                ctx.ensure(
                    prices.iter().all(|&p| first <= p),
                    &format!("first price {first} is not the lowest of {prices:?}"),
                )?;
                let ascending = prices.windows(2).all(|w| w[0] <= w[1]);
                ctx.check(ascending, "prices ascend")
            })
        })
}

fn logout() -> Scenario {
    Scenario::new("Logout")
        .tag("menu")
        .given("the user is logged in", |ctx| Box::pin(logged_in(ctx)))
        .when("the user logs out from the menu", |ctx| {
            Box::pin(async move { MenuPage.logout(ctx).await })
        })
        .then("the login page is shown", |ctx| {
            Box::pin(async move {
                page_object::wait_loaded(&LoginPage, ctx).await?;
                let still_inside = page_object::is_loaded(&InventoryPage, ctx).await?;
                ctx.ensure(!still_inside, "inventory still shown after logout")
            })
        })
}

/// Every storefront scenario, in run order
#[must_use]
pub fn storefront_suite() -> Suite {
    Suite::new("storefront")
        .scenario(successful_login())
        .scenario(failed_login())
        .scenario(add_to_cart())
        .scenario(remove_from_cart())
        .scenario(sort_by_price())
        .scenario(logout())
}
