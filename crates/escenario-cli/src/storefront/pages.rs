//! Page objects for the demo storefront

use escenario::prelude::*;

/// Username field
pub const USERNAME_ID: &str = "user-name";
/// Password field
pub const PASSWORD_ID: &str = "password";
/// Login button
pub const LOGIN_BUTTON_ID: &str = "login-button";

/// Sort option that orders items by ascending price
pub const SORT_PRICE_LOW_TO_HIGH: &str = "Price (low to high)";

/// Landing page with the login form
#[derive(Debug, Clone, Copy, Default)]
pub struct LoginPage;

impl LoginPage {
    /// Username input
    #[must_use]
    pub fn username() -> Locator {
        Locator::id(USERNAME_ID)
    }

    /// Password input
    #[must_use]
    pub fn password() -> Locator {
        Locator::id(PASSWORD_ID)
    }

    /// Submit button
    #[must_use]
    pub fn login_button() -> Locator {
        Locator::id(LOGIN_BUTTON_ID)
    }

    /// Banner shown after a rejected login
    #[must_use]
    pub fn error_banner() -> Locator {
        Locator::css("[data-test=\"error\"]")
    }

    /// Fill both fields and submit
    pub async fn login(self, ctx: &ScenarioContext, username: &str, password: &str) -> EscenarioResult<()> {
        ctx.fill(&Self::username(), username).await?;
        ctx.fill(&Self::password(), password).await?;
        ctx.click(&Self::login_button()).await
    }

    /// Text of the error banner once visible
    pub async fn error_message(self, ctx: &ScenarioContext) -> EscenarioResult<String> {
        ctx.text(&Self::error_banner()).await
    }
}

impl PageObject for LoginPage {
    fn url_path(&self) -> &str {
        ""
    }

    fn ready_locator(&self) -> Locator {
        Self::username()
    }

    fn load_timeout_ms(&self) -> u64 {
        DEFAULT_WAIT_TIMEOUT_MS
    }

    fn page_name(&self) -> &str {
        "login"
    }
}

/// Product listing shown after login
#[derive(Debug, Clone, Copy, Default)]
pub struct InventoryPage;

impl InventoryPage {
    /// Page heading
    #[must_use]
    pub fn title() -> Locator {
        Locator::class_name("title")
    }

    /// "Add to cart" on the first product still offering it
    #[must_use]
    pub fn first_add_to_cart() -> Locator {
        Locator::xpath("(//button[contains(text(),'Add to cart')])[1]")
    }

    /// Every "Remove" button
    #[must_use]
    pub fn remove_buttons() -> Locator {
        Locator::xpath("//button[contains(text(),'Remove')]")
    }

    /// Sort `<select>`
    #[must_use]
    pub fn sort_select() -> Locator {
        Locator::class_name("product_sort_container")
    }

    /// Every price label, in display order
    #[must_use]
    pub fn prices() -> Locator {
        Locator::class_name("inventory_item_price")
    }

    /// Heading text
    pub async fn heading(self, ctx: &ScenarioContext) -> EscenarioResult<String> {
        ctx.text(&Self::title()).await
    }

    /// Add the first available product to the cart
    pub async fn add_first_to_cart(self, ctx: &ScenarioContext) -> EscenarioResult<()> {
        ctx.click(&Self::first_add_to_cart()).await
    }

    /// Remove the first product in the cart
    ///
    /// # Errors
    ///
    /// [`EscenarioError::ElementNotFound`] when nothing is in the cart.
    pub async fn remove_first_from_cart(self, ctx: &ScenarioContext) -> EscenarioResult<()> {
        let session = ctx.session()?;
        let mut buttons = session.find_all(&Self::remove_buttons()).await?;
        let Some(first) = buttons.first_mut() else {
            return Err(EscenarioError::ElementNotFound {
                locator: Self::remove_buttons(),
                timeout_ms: 0,
            });
        };
        session.click_when_ready(first).await
    }

    /// Choose a sort order by its visible label
    pub async fn sort_by(self, ctx: &ScenarioContext, label: &str) -> EscenarioResult<()> {
        ctx.session()?
            .select_option(&Self::sort_select(), label, ctx.wait())
            .await
    }

    /// Prices in display order
    pub async fn item_prices(self, ctx: &ScenarioContext) -> EscenarioResult<Vec<f64>> {
        ctx.locate_visible(&Self::prices()).await?;
        let texts = ctx.session()?.texts_of_all(&Self::prices()).await?;
        texts.iter().map(|t| parse_price(t)).collect()
    }
}

impl PageObject for InventoryPage {
    fn url_path(&self) -> &str {
        "inventory.html"
    }

    fn ready_locator(&self) -> Locator {
        Locator::id("inventory_container")
    }

    fn page_name(&self) -> &str {
        "inventory"
    }
}

/// Header bar and side menu present on every page behind the login
#[derive(Debug, Clone, Copy, Default)]
pub struct MenuPage;

impl MenuPage {
    /// Cart icon; its text is the item count
    #[must_use]
    pub fn cart() -> Locator {
        Locator::id("shopping_cart_container")
    }

    /// Hamburger button
    #[must_use]
    pub fn burger() -> Locator {
        Locator::id("react-burger-menu-btn")
    }

    /// "Logout" entry in the side menu
    #[must_use]
    pub fn logout_link() -> Locator {
        Locator::id("logout_sidebar_link")
    }

    /// Number shown on the cart icon (0 when empty)
    pub async fn cart_count(self, ctx: &ScenarioContext) -> EscenarioResult<u32> {
        let text = ctx.text(&Self::cart()).await?;
        let text = text.trim();
        if text.is_empty() {
            return Ok(0);
        }
        text.parse()
            .map_err(|_| EscenarioError::assertion(format!("cart badge is not a number: {text:?}")))
    }

    /// Open the side menu and log out
    pub async fn logout(self, ctx: &ScenarioContext) -> EscenarioResult<()> {
        ctx.click(&Self::burger()).await?;
        ctx.click(&Self::logout_link()).await
    }
}

/// Parse a `$12.34` price label
///
/// # Errors
///
/// [`EscenarioError::AssertionFailed`] when the label is not a price.
pub fn parse_price(text: &str) -> EscenarioResult<f64> {
    let trimmed = text.trim();
    trimmed
        .strip_prefix('$')
        .unwrap_or(trimmed)
        .trim()
        .parse()
        .map_err(|_| EscenarioError::assertion(format!("not a price: {text:?}")))
}
