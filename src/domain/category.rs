use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fixed set of collections a bangle can be listed under.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Combo,
    Elegant,
    Olive,
    Oreo,
    Pearl,
    Raindrop,
    RaindropMulti,
}

impl Category {
    /// Every category in display order.
    pub const ALL: [Category; 7] = [
        Category::Combo,
        Category::Elegant,
        Category::Olive,
        Category::Oreo,
        Category::Pearl,
        Category::Raindrop,
        Category::RaindropMulti,
    ];

    /// Identifier used in URLs and in the `products.category` column.
    pub fn slug(self) -> &'static str {
        match self {
            Category::Combo => "combo",
            Category::Elegant => "elegant",
            Category::Olive => "olive",
            Category::Oreo => "oreo",
            Category::Pearl => "pearl",
            Category::Raindrop => "raindrop",
            Category::RaindropMulti => "raindrop-multi",
        }
    }

    /// Human-readable label shown in menus.
    pub fn label(self) -> &'static str {
        match self {
            Category::Combo => "Combo",
            Category::Elegant => "Elegant",
            Category::Olive => "Olive",
            Category::Oreo => "Oreo",
            Category::Pearl => "Pearl",
            Category::Raindrop => "Raindrop",
            Category::RaindropMulti => "Raindrop Multi",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

/// Returned when a string does not name a known category.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown category `{0}`")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase().replace(' ', "-");
        Category::ALL
            .into_iter()
            .find(|category| category.slug() == normalized)
            .ok_or_else(|| UnknownCategory(value.to_string()))
    }
}

impl TryFrom<String> for Category {
    type Error = UnknownCategory;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Category> for String {
    fn from(value: Category) -> Self {
        value.slug().to_string()
    }
}

/// Category selector used by the catalog: either every product or one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(Category),
}

impl CategoryFilter {
    pub fn matches(self, category: Category) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(expected) => expected == category,
        }
    }

    pub fn slug(self) -> &'static str {
        match self {
            CategoryFilter::All => "all",
            CategoryFilter::Only(category) => category.slug(),
        }
    }
}

impl FromStr for CategoryFilter {
    type Err = UnknownCategory;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("all") {
            return Ok(CategoryFilter::All);
        }
        trimmed.parse().map(CategoryFilter::Only)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_round_trips_through_slug() {
        for category in Category::ALL {
            assert_eq!(category.slug().parse::<Category>(), Ok(category));
        }
    }

    #[test]
    fn category_parse_accepts_spaced_labels() {
        assert_eq!("Raindrop Multi".parse(), Ok(Category::RaindropMulti));
    }

    #[test]
    fn category_parse_rejects_unknown_values() {
        assert_eq!(
            "traditional".parse::<Category>(),
            Err(UnknownCategory("traditional".to_string()))
        );
    }

    #[test]
    fn filter_all_matches_every_category() {
        let filter: CategoryFilter = "all".parse().expect("all is valid");
        assert!(Category::ALL.into_iter().all(|category| filter.matches(category)));
        assert_eq!("".parse::<CategoryFilter>(), Ok(CategoryFilter::All));
    }

    #[test]
    fn filter_only_matches_its_category() {
        let filter: CategoryFilter = "pearl".parse().expect("pearl is valid");
        assert!(filter.matches(Category::Pearl));
        assert!(!filter.matches(Category::Oreo));
        assert_eq!(filter.slug(), "pearl");
    }
}
