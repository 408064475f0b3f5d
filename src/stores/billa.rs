use std::sync::Arc;

use async_trait::async_trait;
use scraper::Html;

use crate::errors::SourceError;
use crate::models::RawProduct;
use crate::scraping::extract_text::{extract_all_text, extract_text, selector};
use crate::scraping::{derive_discount, parse_price, CategoryKeywords};
use crate::stores::load_page::load_page;
use crate::stores::{PageScope, SourceAdapter, StoreContext};

pub const BILLA_URL: &str = "https://ssbbilla.site/";
const STORE: &str = "Billa";
const MARKER: &str = ".product";

/// Labels glued in front of the product name on promoted items.
const PROMO_PREFIXES: [&str; 2] = ["Супер цена ", "Само с Billa Card "];

/// Billa weekly brochure. The page mixes all departments.
pub struct Billa {
    context: Arc<StoreContext>,
}

impl Billa {
    pub fn new(context: Arc<StoreContext>) -> Self {
        Self { context }
    }
}

#[async_trait]
impl SourceAdapter for Billa {
    fn store(&self) -> &'static str {
        STORE
    }

    fn scope(&self) -> PageScope {
        PageScope::Mixed
    }

    async fn fetch(&self) -> Result<Vec<RawProduct>, SourceError> {
        let html = load_page(
            self.context.engine.as_ref(),
            self.context.timeouts,
            STORE,
            BILLA_URL,
            MARKER,
        )
        .await?;

        let products = extract_billa_products(&html, &self.context.keywords);
        if products.is_empty() {
            return Err(SourceError::Empty { store: STORE });
        }
        Ok(products)
    }
}

/// Extracts every `.product` tile. Prices come as one or two unlabeled readings.
pub fn extract_billa_products(html_content: &str, keywords: &CategoryKeywords) -> Vec<RawProduct> {
    let document = Html::parse_document(html_content);
    let item_selector = selector(MARKER);
    let name_selector = selector(".actualProduct");
    let price_selector = selector(".price");

    document
        .select(&item_selector)
        .map(|item| {
            let full_name = extract_text(item, &name_selector).unwrap_or_default();
            let title = strip_promo_prefixes(&full_name);

            let readings: Vec<f64> = extract_all_text(item, &price_selector)
                .iter()
                .filter_map(|text| parse_price(text))
                .collect();
            let prices = derive_discount(&readings);

            let unit = if title.contains("За 1 кг") { "кг" } else { "бр." };

            RawProduct {
                is_meat_product: keywords.is_meat_product(&title, ""),
                title: Some(title),
                subtitle: Some(String::new()),
                store: Some(STORE.to_string()),
                price: prices.price,
                old_price: prices.old_price,
                discount: Some(prices.discount.unwrap_or_default()),
                unit: Some(unit.to_string()),
                base_price: None,
                image: None,
            }
        })
        .collect()
}

fn strip_promo_prefixes(name: &str) -> String {
    PROMO_PREFIXES
        .iter()
        .fold(name.to_string(), |title, prefix| title.replacen(prefix, "", 1))
        .trim()
        .to_string()
}
