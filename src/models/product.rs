use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

pub const UNKNOWN_TITLE: &str = "Неизвестен продукт";
pub const UNKNOWN_STORE: &str = "Неизвестен магазин";

/// A product listing as extracted from a store page or read back from disk.
///
/// Every field may be missing. Numeric fields only keep real JSON numbers,
/// anything else is treated as absent.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawProduct {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub store: Option<String>,
    #[serde(default, deserialize_with = "number_or_none")]
    pub price: Option<f64>,
    #[serde(default, deserialize_with = "number_or_none")]
    pub old_price: Option<f64>,
    #[serde(default)]
    pub discount: Option<String>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub base_price: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default, deserialize_with = "bool_or_false")]
    pub is_meat_product: bool,
}

/// Canonical product record served to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub title: String,
    pub subtitle: String,
    pub store: String,
    pub price: Option<f64>,
    pub old_price: Option<f64>,
    pub discount: String,
    pub unit: String,
    pub base_price: String,
    pub image: String,
    pub is_meat_product: bool,
}

fn number_or_none<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value.as_f64().filter(|n| n.is_finite()))
}

fn bool_or_false<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Bool(b) => b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
        Value::Null => false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_numeric_prices_deserialize_as_absent() {
        let raw: RawProduct = serde_json::from_str(
            r#"{"title":"Кайма","price":"3,99","oldPrice":null,"isMeatProduct":1}"#,
        )
        .unwrap();

        assert_eq!(raw.title.as_deref(), Some("Кайма"));
        assert_eq!(raw.price, None);
        assert_eq!(raw.old_price, None);
        assert!(raw.is_meat_product);
    }

    #[test]
    fn product_serializes_camel_case_with_null_prices() {
        let product = Product {
            title: "Шунка".to_string(),
            subtitle: String::new(),
            store: "Billa".to_string(),
            price: None,
            old_price: Some(4.5),
            discount: String::new(),
            unit: "бр.".to_string(),
            base_price: String::new(),
            image: String::new(),
            is_meat_product: true,
        };

        let json = serde_json::to_value(&product).unwrap();
        assert_eq!(json["price"], Value::Null);
        assert_eq!(json["oldPrice"], 4.5);
        assert_eq!(json["isMeatProduct"], true);
        assert_eq!(json["basePrice"], "");
    }
}
