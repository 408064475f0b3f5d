/// Prices derived from the raw readings found on a product tile.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DerivedPrices {
    pub price: Option<f64>,
    pub old_price: Option<f64>,
    pub discount: Option<String>,
}

/// Derives current price, previous price and discount from the price readings of one item.
///
/// A single reading is the current price. With two or more readings the largest is the
/// previous price and the smallest the current one.
pub fn derive_discount(readings: &[f64]) -> DerivedPrices {
    let finite: Vec<f64> = readings.iter().copied().filter(|p| p.is_finite()).collect();
    let min = finite.iter().copied().reduce(f64::min);
    let max = finite.iter().copied().reduce(f64::max);

    match (finite.len(), min, max) {
        (0, _, _) => DerivedPrices::default(),
        (1, price, _) => DerivedPrices {
            price,
            ..DerivedPrices::default()
        },
        (_, Some(new), Some(old)) => DerivedPrices {
            price: Some(new),
            old_price: Some(old),
            discount: discount_percent(old, new),
        },
        _ => DerivedPrices::default(),
    }
}

/// `round((old - new) / old * 100)` as `"NN%"`; `None` when `old` is not positive.
pub fn discount_percent(old: f64, new: f64) -> Option<String> {
    if old.is_nan() || old <= 0.0 || !new.is_finite() {
        return None;
    }
    let percent = ((old - new) / old * 100.0).round() as i64;
    Some(format!("{percent}%"))
}
