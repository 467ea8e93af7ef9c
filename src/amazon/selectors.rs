//! CSS selectors for Amazon product pages.
//!
//! Each tracked field has exactly one selector. When Amazon changes a
//! product page layout, update the selector here and add a fixture to
//! `tests/fixtures/`.

use scraper::Selector;
use std::sync::LazyLock;

/// Selectors for the tracked fields on a product detail page.
pub mod product {
    use super::*;

    /// Product title.
    pub static TITLE: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("#productTitle").unwrap());

    /// Displayed price (screen-reader copy of the buy box price).
    pub static PRICE: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse(".a-price .a-offscreen").unwrap());

    /// Star rating text, e.g. "4.3 out of 5 stars".
    pub static RATING: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("span.a-icon-alt").unwrap());

    /// Review count text, e.g. "1,234 ratings".
    pub static REVIEW_COUNT: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("#acrCustomerReviewText").unwrap());
}

/// Selectors for detecting error/captcha pages.
pub mod errors {
    use super::*;

    /// CAPTCHA form.
    pub static CAPTCHA: LazyLock<Selector> = LazyLock::new(|| {
        Selector::parse(
            "form[action*='validateCaptcha'], \
             img[src*='captcha']",
        )
        .unwrap()
    });

    /// Dog page (Amazon's error page). Product images carry the listing
    /// title as `alt`, so only the page's own markers are matched here.
    pub static DOG_PAGE: LazyLock<Selector> = LazyLock::new(|| {
        Selector::parse(
            "a[href='/ref=cs_503_link'], \
             img[alt='Dogs of Amazon']",
        )
        .unwrap()
    });
}
