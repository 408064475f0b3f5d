use scraper::{ElementRef, Html, Selector};

/// Parses a static CSS selector. Only used with literals known to be valid.
pub fn selector(css: &'static str) -> Selector {
    Selector::parse(css).unwrap()
}

/// Trimmed text of the first element matching `selector` under `item`, if non-empty.
pub fn extract_text(item: ElementRef<'_>, selector: &Selector) -> Option<String> {
    item.select(selector)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|text| !text.is_empty())
}

/// Trimmed text of every element matching `selector` under `item`.
pub fn extract_all_text(item: ElementRef<'_>, selector: &Selector) -> Vec<String> {
    item.select(selector)
        .map(|el| el.text().collect::<String>().trim().to_string())
        .collect()
}

/// Attribute value of the first element matching `selector` under `item`.
pub fn extract_attr(item: ElementRef<'_>, selector: &Selector, attr: &str) -> Option<String> {
    item.select(selector)
        .next()
        .and_then(|el| el.value().attr(attr))
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Whether the rendered document contains at least one element matching `css`.
pub fn has_marker(html_content: &str, css: &'static str) -> bool {
    let document = Html::parse_document(html_content);
    document.select(&selector(css)).next().is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAGMENT: &str = r#"
        <div class="tile">
            <span class="title">  Свински бут </span>
            <span class="price">7,99</span><span class="price">9,49</span>
            <img class="img" src=" /img/1.jpg ">
            <span class="empty">   </span>
        </div>"#;

    #[test]
    fn extracts_text_attributes_and_markers() {
        let document = Html::parse_document(FRAGMENT);
        let tile = document.select(&selector(".tile")).next().unwrap();

        assert_eq!(
            extract_text(tile, &selector(".title")).as_deref(),
            Some("Свински бут")
        );
        assert_eq!(extract_text(tile, &selector(".empty")), None);
        assert_eq!(extract_text(tile, &selector(".missing")), None);
        assert_eq!(
            extract_all_text(tile, &selector(".price")),
            vec!["7,99".to_string(), "9,49".to_string()]
        );
        assert_eq!(
            extract_attr(tile, &selector(".img"), "src").as_deref(),
            Some("/img/1.jpg")
        );
        assert!(has_marker(FRAGMENT, ".tile"));
        assert!(!has_marker(FRAGMENT, ".product"));
    }
}
