use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Url;
use scraper::Html;

use crate::errors::SourceError;
use crate::models::RawProduct;
use crate::scraping::extract_text::{extract_attr, extract_text, selector};
use crate::scraping::{discount_percent, parse_price, CategoryKeywords};
use crate::stores::load_page::load_page;
use crate::stores::{PageScope, SourceAdapter, StoreContext};

const OFFERS_URL: &str = "https://www.kaufland.bg/aktualni-predlozheniya/ot-ponedelnik/obsht-pregled.category=";
const MEAT_CATEGORY: &str = "01_Месо__колбаси__риба";
const STORE: &str = "Kaufland";
const MARKER: &str = ".k-product-grid__item";

/// Kaufland weekly offers, already narrowed to the meat, sausage and fish department.
pub struct Kaufland {
    context: Arc<StoreContext>,
}

impl Kaufland {
    pub fn new(context: Arc<StoreContext>) -> Self {
        Self { context }
    }
}

pub fn kaufland_url() -> String {
    format!("{OFFERS_URL}{}.html", urlencoding::encode(MEAT_CATEGORY))
}

#[async_trait]
impl SourceAdapter for Kaufland {
    fn store(&self) -> &'static str {
        STORE
    }

    fn scope(&self) -> PageScope {
        PageScope::Category
    }

    async fn fetch(&self) -> Result<Vec<RawProduct>, SourceError> {
        let url = kaufland_url();
        let html = load_page(
            self.context.engine.as_ref(),
            self.context.timeouts,
            STORE,
            &url,
            MARKER,
        )
        .await?;

        let products = extract_kaufland_products(&html, &url, &self.context.keywords);
        if products.is_empty() {
            return Err(SourceError::Empty { store: STORE });
        }
        Ok(products)
    }
}

/// Extracts every product tile. Kaufland labels its own discounts; the percentage is
/// only computed when the label is missing and both prices are shown.
pub fn extract_kaufland_products(
    html_content: &str,
    page_url: &str,
    keywords: &CategoryKeywords,
) -> Vec<RawProduct> {
    let document = Html::parse_document(html_content);
    let base = Url::parse(page_url).ok();

    let item_selector = selector(MARKER);
    let title_selector = selector(".k-product-tile__title");
    let subtitle_selector = selector(".k-product-tile__subtitle");
    let image_selector = selector(".k-product-tile__main-image");
    let price_selector = selector(".k-price-tag__price");
    let old_price_selector = selector(".k-price-tag__old-price-line-through");
    let discount_selector = selector(".k-price-tag__discount");
    let unit_selector = selector(".k-product-tile__unit-price");
    let base_price_selector = selector(".k-product-tile__base-price");

    document
        .select(&item_selector)
        .map(|item| {
            let title = extract_text(item, &title_selector).unwrap_or_default();
            let subtitle = extract_text(item, &subtitle_selector).unwrap_or_default();
            let price = extract_text(item, &price_selector).and_then(|t| parse_price(&t));
            let old_price = extract_text(item, &old_price_selector).and_then(|t| parse_price(&t));
            let discount = extract_text(item, &discount_selector).or_else(|| match (old_price, price) {
                (Some(old), Some(new)) if old > new => discount_percent(old, new),
                _ => None,
            });
            let image = extract_attr(item, &image_selector, "src")
                .or_else(|| extract_attr(item, &image_selector, "data-src"))
                .map(|src| resolve_url(base.as_ref(), &src));

            RawProduct {
                is_meat_product: keywords.is_meat_product(&title, &subtitle),
                title: Some(title),
                subtitle: Some(subtitle),
                store: Some(STORE.to_string()),
                price,
                old_price,
                discount: Some(discount.unwrap_or_default()),
                unit: extract_text(item, &unit_selector),
                base_price: extract_text(item, &base_price_selector),
                image,
            }
        })
        .collect()
}

fn resolve_url(base: Option<&Url>, src: &str) -> String {
    base.and_then(|b| b.join(src).ok())
        .map(|u| u.to_string())
        .unwrap_or_else(|| src.to_string())
}
