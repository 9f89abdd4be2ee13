use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::category::{Category, CategoryFilter};
use crate::domain::variation::{UpdateVariation, Variation, sort_by_size};

/// Domain representation of a catalog product.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Product {
    /// Identifier generated at creation, see [`generate_product_id`].
    pub id: String,
    /// Display name.
    pub name: String,
    /// Longer description shown on the product page.
    pub description: String,
    /// Image URLs; the first one is the primary image.
    pub images: Vec<String>,
    /// Collection the product belongs to.
    pub category: Category,
    /// Whether the product is promoted on the landing page.
    pub featured: bool,
    /// Purchasable options of the product.
    pub variations: Vec<Variation>,
    /// Timestamp for when the product record was created.
    pub created_at: NaiveDateTime,
    /// Timestamp for the last update to the product record.
    pub updated_at: NaiveDateTime,
}

impl Product {
    pub fn primary_image(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }

    pub fn find_variation(&self, variation_id: i32) -> Option<&Variation> {
        self.variations
            .iter()
            .find(|variation| variation.id == variation_id)
    }

    pub fn find_variation_by_options(&self, color: &str, size: &str) -> Option<&Variation> {
        self.variations
            .iter()
            .find(|variation| variation.same_options(color, size))
    }

    /// Lowest variation price, used for "from" prices and price sorting.
    pub fn min_price_cents(&self) -> Option<i64> {
        self.variations.iter().map(|v| v.price_cents).min()
    }

    pub fn max_price_cents(&self) -> Option<i64> {
        self.variations.iter().map(|v| v.price_cents).max()
    }

    /// Whether at least one active variation has stock left.
    pub fn is_purchasable(&self) -> bool {
        self.variations
            .iter()
            .any(|variation| variation.active && variation.stock > 0)
    }

    /// Distinct colors in first-seen order.
    pub fn colors(&self) -> Vec<&str> {
        let mut colors: Vec<&str> = Vec::new();
        for variation in &self.variations {
            if !colors.contains(&variation.color.as_str()) {
                colors.push(variation.color.as_str());
            }
        }
        colors
    }

    /// Variations in canonical size order.
    pub fn sorted_variations(&self) -> Vec<Variation> {
        let mut variations = self.variations.clone();
        sort_by_size(&mut variations);
        variations
    }
}

/// Payload required to insert a product row. Variations are inserted separately.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    pub id: String,
    pub name: String,
    pub description: String,
    pub images: Vec<String>,
    pub category: Category,
    pub featured: bool,
    pub created_at: NaiveDateTime,
}

impl NewProduct {
    /// Build a product payload whose identifier is derived from `category`,
    /// `name` and the current time.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        category: Category,
        images: Vec<String>,
    ) -> Self {
        let now = chrono::Utc::now();
        let name = name.into();
        Self {
            id: generate_product_id(category, &name, now.timestamp_millis()),
            name,
            description: description.into(),
            images,
            category,
            featured: false,
            created_at: now.naive_utc(),
        }
    }

    pub fn featured(mut self, featured: bool) -> Self {
        self.featured = featured;
        self
    }
}

/// Full replacement of a product's editable fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateProduct {
    pub name: String,
    pub description: String,
    pub images: Vec<String>,
    pub category: Category,
    pub featured: bool,
    pub updated_at: NaiveDateTime,
}

impl From<&Product> for UpdateProduct {
    /// Snapshot of the current values, used to restore a product.
    fn from(value: &Product) -> Self {
        Self {
            name: value.name.clone(),
            description: value.description.clone(),
            images: value.images.clone(),
            category: value.category,
            featured: value.featured,
            updated_at: chrono::Utc::now().naive_utc(),
        }
    }
}

/// A variation row submitted with a product update. Rows without an `id` are
/// new and are not written by the update path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariationChange {
    pub id: Option<i32>,
    pub update: UpdateVariation,
}

/// Everything the product update path writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductChanges {
    pub product: UpdateProduct,
    pub variations: Vec<VariationChange>,
}

/// Ordering applied to catalog listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProductSort {
    /// Featured products first, otherwise store order.
    #[default]
    Featured,
    /// Cheapest variation ascending.
    PriceLow,
    /// Most expensive variation descending.
    PriceHigh,
    Name,
    Newest,
}

impl ProductSort {
    pub const ALL: [ProductSort; 5] = [
        ProductSort::Featured,
        ProductSort::PriceLow,
        ProductSort::PriceHigh,
        ProductSort::Name,
        ProductSort::Newest,
    ];

    pub fn slug(self) -> &'static str {
        match self {
            ProductSort::Featured => "featured",
            ProductSort::PriceLow => "price-low",
            ProductSort::PriceHigh => "price-high",
            ProductSort::Name => "name",
            ProductSort::Newest => "newest",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ProductSort::Featured => "Featured",
            ProductSort::PriceLow => "Price: Low to High",
            ProductSort::PriceHigh => "Price: High to Low",
            ProductSort::Name => "Name",
            ProductSort::Newest => "Newest",
        }
    }

    /// Reorder `products` in place. All orderings are stable.
    pub fn apply(self, products: &mut [Product]) {
        match self {
            ProductSort::Featured => products.sort_by_key(|product| !product.featured),
            ProductSort::PriceLow => {
                products.sort_by_key(|product| product.min_price_cents().unwrap_or(i64::MAX))
            }
            ProductSort::PriceHigh => products.sort_by_key(|product| {
                std::cmp::Reverse(product.max_price_cents().unwrap_or(i64::MIN))
            }),
            ProductSort::Name => {
                products.sort_by_key(|product| product.name.to_lowercase());
            }
            ProductSort::Newest => {
                products.sort_by_key(|product| std::cmp::Reverse(product.created_at))
            }
        }
    }
}

impl FromStr for ProductSort {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        ProductSort::ALL
            .into_iter()
            .find(|sort| sort.slug() == value.trim())
            .ok_or(())
    }
}

/// Query definition used to list products.
#[derive(Debug, Clone, Default)]
pub struct ProductListQuery {
    /// Category restriction; [`CategoryFilter::All`] returns every product.
    pub category: CategoryFilter,
    /// Only return featured products.
    pub featured_only: bool,
    /// Case-insensitive term matched against name, description and category.
    pub search: Option<String>,
    /// Product to leave out of the results.
    pub exclude_id: Option<String>,
    /// Maximum number of products to return.
    pub limit: Option<usize>,
}

impl ProductListQuery {
    /// Construct a query that targets every product.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn category(mut self, category: CategoryFilter) -> Self {
        self.category = category;
        self
    }

    pub fn featured(mut self) -> Self {
        self.featured_only = true;
        self
    }

    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    pub fn exclude(mut self, product_id: impl Into<String>) -> Self {
        self.exclude_id = Some(product_id.into());
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Lowercase `input` and collapse every run of non-alphanumerics into `-`.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_dash = false;

    for ch in input.trim().chars() {
        if ch.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.extend(ch.to_lowercase());
        } else {
            pending_dash = true;
        }
    }

    slug
}

/// `slug(category)-slug(name)-timestamp`, unique without a central sequence as
/// long as the same name is not created twice within a millisecond.
pub fn generate_product_id(category: Category, name: &str, timestamp_millis: i64) -> String {
    let name_slug = slugify(name);
    if name_slug.is_empty() {
        format!("{}-{timestamp_millis}", category.slug())
    } else {
        format!("{}-{name_slug}-{timestamp_millis}", category.slug())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn datetime(day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, day)
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .unwrap_or_default()
    }

    fn variation(id: i32, price_cents: i64) -> Variation {
        Variation {
            id,
            product_id: String::new(),
            color: "Red".to_string(),
            size: "2.4".to_string(),
            price_cents,
            stock: 1,
            active: true,
        }
    }

    fn product(id: &str, name: &str, featured: bool, prices: &[i64], day: u32) -> Product {
        Product {
            id: id.to_string(),
            name: name.to_string(),
            description: String::new(),
            images: vec![],
            category: Category::Pearl,
            featured,
            variations: prices
                .iter()
                .enumerate()
                .map(|(index, price)| variation(index as i32, *price))
                .collect(),
            created_at: datetime(day),
            updated_at: datetime(day),
        }
    }

    fn ids(products: &[Product]) -> Vec<&str> {
        products.iter().map(|product| product.id.as_str()).collect()
    }

    #[test]
    fn slugify_collapses_separators() {
        assert_eq!(slugify("  Golden Glamour -- Bangles! "), "golden-glamour-bangles");
        assert_eq!(slugify("***"), "");
    }

    #[test]
    fn generate_product_id_combines_category_name_and_time() {
        assert_eq!(
            generate_product_id(Category::RaindropMulti, "Blue Drops", 1700000000000),
            "raindrop-multi-blue-drops-1700000000000"
        );
        assert_eq!(
            generate_product_id(Category::Oreo, "!!", 5),
            "oreo-5"
        );
    }

    #[test]
    fn featured_sort_is_stable() {
        let mut items = vec![
            product("a", "A", false, &[100], 1),
            product("b", "B", true, &[100], 2),
            product("c", "C", false, &[100], 3),
            product("d", "D", true, &[100], 4),
        ];

        ProductSort::Featured.apply(&mut items);

        assert_eq!(ids(&items), vec!["b", "d", "a", "c"]);
    }

    #[test]
    fn price_sorts_use_min_and_max_variation_price() {
        let mut items = vec![
            product("a", "A", false, &[300, 900], 1),
            product("b", "B", false, &[100, 200], 2),
            product("c", "C", false, &[500], 3),
        ];

        ProductSort::PriceLow.apply(&mut items);
        assert_eq!(ids(&items), vec!["b", "a", "c"]);

        ProductSort::PriceHigh.apply(&mut items);
        assert_eq!(ids(&items), vec!["a", "c", "b"]);
    }

    #[test]
    fn name_and_newest_sorts() {
        let mut items = vec![
            product("a", "pearl", false, &[1], 1),
            product("b", "Amber", false, &[1], 3),
            product("c", "Coral", false, &[1], 2),
        ];

        ProductSort::Name.apply(&mut items);
        assert_eq!(ids(&items), vec!["b", "c", "a"]);

        ProductSort::Newest.apply(&mut items);
        assert_eq!(ids(&items), vec!["b", "c", "a"]);
    }

    #[test]
    fn product_sort_parses_slugs() {
        assert_eq!("price-low".parse(), Ok(ProductSort::PriceLow));
        assert_eq!("bogus".parse::<ProductSort>(), Err(()));
    }

    #[test]
    fn colors_are_distinct_in_first_seen_order() {
        let mut item = product("a", "A", false, &[1, 2, 3], 1);
        item.variations[1].color = "Blue".to_string();
        assert_eq!(item.colors(), vec!["Red", "Blue"]);
    }
}
