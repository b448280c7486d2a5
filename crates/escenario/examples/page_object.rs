//! Example: Page Object Model
//!
//! Demonstrates: a page object driving a login scenario against the
//! scripted mock browser, with the report printed at the end
//!
//! Run with: `cargo run --example page_object`

use escenario::mock::{MockEffect, MockElement, MockLauncher, MockPage};
use escenario::page_object;
use escenario::prelude::*;
use std::time::Duration;

const BASE: &str = "https://shop.test/";

struct LoginPage;

impl LoginPage {
    fn username() -> Locator {
        Locator::id("user-name")
    }

    fn password() -> Locator {
        Locator::id("password")
    }

    fn submit() -> Locator {
        Locator::id("login-button")
    }
}

impl PageObject for LoginPage {
    fn url_path(&self) -> &str {
        ""
    }

    fn ready_locator(&self) -> Locator {
        Self::username()
    }
}

struct DashboardPage;

impl PageObject for DashboardPage {
    fn url_path(&self) -> &str {
        "dashboard"
    }

    fn ready_locator(&self) -> Locator {
        Locator::class_name("welcome")
    }
}

fn site() -> MockPage {
    MockPage::new()
        .with_element(MockElement::new(LoginPage::username()))
        .with_element(MockElement::new(LoginPage::password()))
        .with_element(
            MockElement::new(LoginPage::submit()).on_click(MockEffect::NavigateAfter {
                url: format!("{BASE}dashboard"),
                delay: Duration::from_millis(200),
            }),
        )
        .with_element(
            MockElement::new(Locator::class_name("welcome"))
                .with_text("Welcome back")
                .visible_after(Duration::from_millis(100))
                .on_page("dashboard"),
        )
}

#[tokio::main]
async fn main() -> EscenarioResult<()> {
    println!("=== Page Object Model Example ===\n");

    println!("1. Page objects...");
    println!("   login     -> /{} ready at {}", LoginPage.url_path(), LoginPage.ready_locator());
    println!(
        "   dashboard -> /{} ready at {}",
        DashboardPage.url_path(),
        DashboardPage.ready_locator()
    );

    let scenario = Scenario::new("Login reaches the dashboard")
        .tag("demo")
        .given("the login page is open", |ctx| {
            Box::pin(async move {
                page_object::open(&LoginPage, ctx).await?;
                Ok(())
            })
        })
        .when("the user signs in", |ctx| {
            Box::pin(async move {
                ctx.fill(&LoginPage::username(), "demo").await?;
                ctx.fill(&LoginPage::password(), "demo").await?;
                ctx.click(&LoginPage::submit()).await
            })
        })
        .then("the dashboard greets the user", |ctx| {
            Box::pin(async move {
                page_object::wait_loaded(&DashboardPage, ctx).await?;
                let greeting = ctx.text(&DashboardPage.ready_locator()).await?;
                ctx.ensure(greeting.starts_with("Welcome"), "greeting shown")
            })
        });

    println!("\n2. Running scenario...");
    let launcher = MockLauncher::new(site());
    let runner = Runner::new(Arc::new(launcher.clone()), RunnerConfig::new().with_base_url(BASE));
    let report = runner.run(&scenario).await;

    println!("\n3. Report...");
    for step in &report.steps {
        println!("   {:?} {} ({} ms)", step.status, step.label, step.duration_ms);
    }
    println!("   status: {:?}, teardown: {:?}", report.status, report.teardown);
    println!("   browsers launched: {}, quit: {}", launcher.launch_count(), launcher.quit_count());

    println!("\n=== Page Object Model Example Complete ===");
    Ok(())
}
