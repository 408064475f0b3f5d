pub mod derive_discount;
pub mod extract_text;
pub mod is_meat_product;
pub mod parse_price;
pub mod validate_product;

pub use derive_discount::{derive_discount, discount_percent, DerivedPrices};
pub use is_meat_product::CategoryKeywords;
pub use parse_price::parse_price;
pub use validate_product::validate_product;
