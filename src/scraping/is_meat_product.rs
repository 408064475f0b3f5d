/// Keyword set deciding whether a listing belongs to the tracked category.
///
/// Shared by every store adapter; matching is case-insensitive on `title + " " + subtitle`.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryKeywords {
    keywords: Vec<String>,
}

impl CategoryKeywords {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keywords = keywords
            .into_iter()
            .map(|k| k.as_ref().trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        Self { keywords }
    }

    pub fn is_meat_product(&self, title: &str, subtitle: &str) -> bool {
        let haystack = format!("{title} {subtitle}").to_lowercase();
        self.keywords.iter().any(|k| haystack.contains(k.as_str()))
    }

    pub fn len(&self) -> usize {
        self.keywords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }
}

/// Bulgarian keywords for meat, poultry, fish, sausages and cured meats.
pub fn default_meat_keywords() -> Vec<String> {
    [
        "месо", "пиле", "риба", "колбас", "луканка", "салам", "кайма", "пастет", "шунка",
        "бут", "филе", "пастърма", "суджук", "кренвирш", "вешалица",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

impl Default for CategoryKeywords {
    fn default() -> Self {
        Self::new(default_meat_keywords())
    }
}
