use crate::models::product::{Product, RawProduct, UNKNOWN_STORE, UNKNOWN_TITLE};

/// Normalizes a raw listing into a `Product`: missing text becomes empty (or the
/// placeholder for title and store), non-finite numbers become absent.
pub fn validate_product(raw: RawProduct) -> Product {
    Product {
        title: non_blank(raw.title).unwrap_or_else(|| UNKNOWN_TITLE.to_string()),
        store: non_blank(raw.store).unwrap_or_else(|| UNKNOWN_STORE.to_string()),
        subtitle: raw.subtitle.unwrap_or_default(),
        price: raw.price.filter(|p| p.is_finite()),
        old_price: raw.old_price.filter(|p| p.is_finite()),
        discount: raw.discount.unwrap_or_default(),
        unit: raw.unit.unwrap_or_default(),
        base_price: raw.base_price.unwrap_or_default(),
        image: raw.image.unwrap_or_default(),
        is_meat_product: raw.is_meat_product,
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl From<Product> for RawProduct {
    fn from(product: Product) -> Self {
        RawProduct {
            title: Some(product.title),
            subtitle: Some(product.subtitle),
            store: Some(product.store),
            price: product.price,
            old_price: product.old_price,
            discount: Some(product.discount),
            unit: Some(product.unit),
            base_price: Some(product.base_price),
            image: Some(product.image),
            is_meat_product: product.is_meat_product,
        }
    }
}
