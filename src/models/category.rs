use std::fmt;
use std::str::FromStr;

/// Product categories the service tracks. The slug doubles as cache key and URL segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Meat,
}

impl Category {
    pub const ALL: [Category; 1] = [Category::Meat];

    pub fn slug(&self) -> &'static str {
        match self {
            Category::Meat => "meat",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown category: {0}")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.slug().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_slug_only() {
        assert_eq!("meat".parse::<Category>().unwrap(), Category::Meat);
        assert_eq!("MEAT".parse::<Category>().unwrap(), Category::Meat);
        assert!("dairy".parse::<Category>().is_err());
    }
}
