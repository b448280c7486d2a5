//! Locator abstraction for element selection.
//!
//! A [`Locator`] is an immutable strategy + value pair. It does not hold any
//! reference into a page; resolving it is the job of the interaction layer,
//! which turns it into an [`ElementHandle`](crate::ElementHandle) each time.

use serde::{Deserialize, Serialize};

/// How a locator finds elements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// `id` attribute
    Id,
    /// CSS selector (e.g., `[data-test="error"]`)
    Css,
    /// XPath expression
    #[serde(rename = "xpath")]
    XPath,
    /// Single class name
    #[serde(alias = "class")]
    ClassName,
}

impl Strategy {
    /// Short prefix used in display and logs
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Css => "css",
            Self::XPath => "xpath",
            Self::ClassName => "class",
        }
    }
}

/// Immutable description of how to find zero or more elements
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Locator {
    /// Lookup strategy
    pub strategy: Strategy,
    /// Selector value interpreted by the strategy
    pub value: String,
}

impl Locator {
    /// Create a locator from parts
    #[must_use]
    pub fn new(strategy: Strategy, value: impl Into<String>) -> Self {
        Self {
            strategy,
            value: value.into(),
        }
    }

    /// Locate by `id` attribute
    #[must_use]
    pub fn id(value: impl Into<String>) -> Self {
        Self::new(Strategy::Id, value)
    }

    /// Locate by CSS selector
    #[must_use]
    pub fn css(value: impl Into<String>) -> Self {
        Self::new(Strategy::Css, value)
    }

    /// Locate by XPath expression
    #[must_use]
    pub fn xpath(value: impl Into<String>) -> Self {
        Self::new(Strategy::XPath, value)
    }

    /// Locate by class name
    #[must_use]
    pub fn class_name(value: impl Into<String>) -> Self {
        Self::new(Strategy::ClassName, value)
    }

    /// JavaScript expression evaluating to an array of all matching nodes,
    /// in document order.
    #[must_use]
    pub fn to_query_all(&self) -> String {
        let v = js_string(&self.value);
        match self.strategy {
            Strategy::Id => {
                format!("(() => {{ const el = document.getElementById({v}); return el ? [el] : []; }})()")
            }
            Strategy::Css => format!("Array.from(document.querySelectorAll({v}))"),
            Strategy::XPath => format!(
                "(() => {{ const r = document.evaluate({v}, document, null, \
                 XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null); const out = []; \
                 for (let i = 0; i < r.snapshotLength; i++) {{ out.push(r.snapshotItem(i)); }} \
                 return out; }})()"
            ),
            Strategy::ClassName => {
                format!("Array.from(document.getElementsByClassName({v}))")
            }
        }
    }

    /// Parse `strategy=value` (e.g. `id=login-button`, `css=.title`)
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an unknown prefix or an empty value.
    pub fn parse(s: &str) -> crate::EscenarioResult<Self> {
        let (prefix, value) = s
            .split_once('=')
            .ok_or_else(|| crate::EscenarioError::config(format!("locator {s:?} has no '='")))?;
        let strategy = match prefix {
            "id" => Strategy::Id,
            "css" => Strategy::Css,
            "xpath" => Strategy::XPath,
            "class" | "class_name" => Strategy::ClassName,
            other => {
                return Err(crate::EscenarioError::config(format!(
                    "unknown locator strategy {other:?}"
                )))
            }
        };
        if value.is_empty() {
            return Err(crate::EscenarioError::config(format!(
                "locator {s:?} has an empty value"
            )));
        }
        Ok(Self::new(strategy, value))
    }

    /// The `<option>` labelled `option_text` inside the `<select>` this
    /// locator finds
    ///
    /// # Errors
    ///
    /// Returns [`crate::EscenarioError::Config`] for CSS select locators,
    /// which cannot scope an XPath option lookup.
    pub fn option_with_text(&self, option_text: &str) -> crate::EscenarioResult<Self> {
        let text = xpath_literal(option_text);
        let option = format!("option[normalize-space(.)={text}]");
        let xpath = match self.strategy {
            Strategy::Id => format!("//select[@id={}]//{option}", xpath_literal(&self.value)),
            Strategy::ClassName => format!(
                "//select[contains(concat(' ', normalize-space(@class), ' '), {})]//{option}",
                xpath_literal(&format!(" {} ", self.value))
            ),
            Strategy::XPath => format!("({})//{option}", self.value),
            Strategy::Css => {
                return Err(crate::EscenarioError::config(format!(
                    "cannot look up option {option_text:?} inside css select {}; use id, class or xpath",
                    self
                )))
            }
        };
        Ok(Self::xpath(xpath))
    }
}

/// JavaScript string literal for `s`
fn js_string(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| String::from("\"\""))
}

/// XPath string literal for arbitrary text
fn xpath_literal(text: &str) -> String {
    if !text.contains('\'') {
        format!("'{text}'")
    } else if !text.contains('"') {
        format!("\"{text}\"")
    } else {
        let parts: Vec<String> = text.split('\'').map(|p| format!("'{p}'")).collect();
        format!("concat({})", parts.join(", \"'\", "))
    }
}

impl std::fmt::Display for Locator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}={}", self.strategy.prefix(), self.value)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    mod constructor_tests {
        use super::*;

        #[test]
        fn test_id_locator() {
            let loc = Locator::id("user-name");
            assert_eq!(loc.strategy, Strategy::Id);
            assert_eq!(loc.value, "user-name");
        }

        #[test]
        fn test_equality_by_value() {
            assert_eq!(Locator::css(".title"), Locator::css(".title"));
            assert_ne!(Locator::css("title"), Locator::class_name("title"));
        }

        #[test]
        fn test_display() {
            assert_eq!(Locator::class_name("title").to_string(), "class=title");
            assert_eq!(
                Locator::xpath("//button").to_string(),
                "xpath=//button"
            );
        }
    }

    mod query_tests {
        use super::*;

        #[test]
        fn test_id_query() {
            let q = Locator::id("password").to_query_all();
            assert!(q.contains("getElementById(\"password\")"));
        }

        #[test]
        fn test_css_query_escapes_quotes() {
            let q = Locator::css("[data-test=\"error\"]").to_query_all();
            assert!(q.contains(r#"querySelectorAll("[data-test=\"error\"]")"#));
        }

        #[test]
        fn test_xpath_query_uses_snapshot() {
            let q = Locator::xpath("//button[contains(text(),'Remove')]").to_query_all();
            assert!(q.contains("ORDERED_NODE_SNAPSHOT_TYPE"));
            assert!(q.contains("snapshotItem"));
        }

        #[test]
        fn test_class_query() {
            let q = Locator::class_name("inventory_item_price").to_query_all();
            assert!(q.contains("getElementsByClassName(\"inventory_item_price\")"));
        }
    }

    mod parse_tests {
        use super::*;

        #[test]
        fn test_parse_round_trips_display() {
            for loc in [
                Locator::id("a"),
                Locator::css("div > span"),
                Locator::xpath("//option[text()='Name (A to Z)']"),
                Locator::class_name("title"),
            ] {
                assert_eq!(Locator::parse(&loc.to_string()).unwrap(), loc);
            }
        }

        #[test]
        fn test_parse_keeps_equals_in_value() {
            let loc = Locator::parse("css=[data-test=error]").unwrap();
            assert_eq!(loc.value, "[data-test=error]");
        }

        #[test]
        fn test_parse_rejects_unknown_prefix() {
            assert!(Locator::parse("name=foo").is_err());
            assert!(Locator::parse("nodelimiter").is_err());
            assert!(Locator::parse("id=").is_err());
        }
    }

    mod option_tests {
        use super::*;

        #[test]
        fn test_literal_quoting() {
            assert_eq!(xpath_literal("Name (A to Z)"), "'Name (A to Z)'");
            assert_eq!(xpath_literal("it's"), "\"it's\"");
            assert_eq!(xpath_literal("a'b\"c"), "concat('a', \"'\", 'b\"c')");
        }

        #[test]
        fn test_option_by_class() {
            let loc = Locator::class_name("product_sort_container").option_with_text("Price (low to high)")
                .unwrap();
            assert_eq!(loc.strategy, Strategy::XPath);
            assert!(loc.value.contains("' product_sort_container '"));
            assert!(loc.value.ends_with("option[normalize-space(.)='Price (low to high)']"));
        }

        #[test]
        fn test_option_by_id_and_xpath() {
            let by_id = Locator::id("sort").option_with_text("Name").unwrap();
            assert!(by_id.value.starts_with("//select[@id='sort']"));
            let by_xpath = Locator::xpath("//select[1]").option_with_text("Name").unwrap();
            assert!(by_xpath.value.starts_with("(//select[1])//option"));
        }

        #[test]
        fn test_option_in_css_select_is_rejected() {
            let err = Locator::css("select.sort").option_with_text("Name").unwrap_err();
            assert!(matches!(err, crate::EscenarioError::Config { .. }));
            assert!(err.to_string().contains("select.sort"));
        }
    }

    mod serde_tests {
        use super::*;

        #[test]
        fn test_yaml_shape() {
            let loc: Locator =
                serde_yaml_ng::from_str("strategy: class_name\nvalue: title\n").unwrap();
            assert_eq!(loc, Locator::class_name("title"));
            let loc: Locator = serde_yaml_ng::from_str("strategy: xpath\nvalue: //a\n").unwrap();
            assert_eq!(loc.strategy, Strategy::XPath);
        }
    }

    mod property_tests {
        use super::*;
        use crate::locator::Strategy;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn prop_parse_display_inverse(value in "[a-zA-Z0-9_#.\\-\\[\\]=' ]{1,40}") {
                for strategy in [Strategy::Id, Strategy::Css, Strategy::XPath, Strategy::ClassName] {
                    let loc = Locator::new(strategy, value.clone());
                    prop_assert_eq!(Locator::parse(&loc.to_string()).unwrap(), loc);
                }
            }
        }
    }
}
