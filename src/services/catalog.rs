//! Shopper-facing read paths: landing page, catalog listing and product page.

use serde::{Deserialize, Serialize};

use crate::domain::category::{Category, CategoryFilter};
use crate::domain::price::format_price;
use crate::domain::product::{Product, ProductListQuery, ProductSort};
use crate::domain::variation::Variation;
use crate::repository::ProductReader;
use crate::services::products::{self, RELATED_PRODUCTS_LIMIT};
use crate::services::{ServiceError, ServiceResult};

/// Query string accepted by the catalog page and the product API.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogQuery {
    pub category: Option<String>,
    pub search: Option<String>,
    pub sort: Option<String>,
}

impl CatalogQuery {
    /// Unknown categories fall back to every product.
    pub fn category_filter(&self) -> CategoryFilter {
        let raw = self.category.as_deref().unwrap_or_default();
        raw.parse().unwrap_or_else(|err| {
            log::debug!("Ignoring catalog filter: {err}");
            CategoryFilter::All
        })
    }

    pub fn sort(&self) -> ProductSort {
        self.sort
            .as_deref()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or_default()
    }

    pub fn search_term(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
    }
}

/// Compact product tile used by the landing and catalog pages.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ProductCard {
    pub id: String,
    pub name: String,
    pub category: String,
    pub category_label: String,
    pub image: Option<String>,
    pub price: String,
    /// Set when variations differ in price.
    pub max_price: Option<String>,
    pub featured: bool,
    pub in_stock: bool,
}

impl From<&Product> for ProductCard {
    fn from(product: &Product) -> Self {
        let min = product.min_price_cents();
        let max = product.max_price_cents();
        Self {
            id: product.id.clone(),
            name: product.name.clone(),
            category: product.category.slug().to_string(),
            category_label: product.category.label().to_string(),
            image: product.primary_image().map(str::to_string),
            price: min.map(format_price).unwrap_or_default(),
            max_price: max.filter(|max| Some(*max) != min).map(format_price),
            featured: product.featured,
            in_stock: product.is_purchasable(),
        }
    }
}

/// Select option for a category or sort order.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FilterOption {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct HomePage {
    pub featured: Vec<ProductCard>,
    pub categories: Vec<FilterOption>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CatalogPage {
    pub products: Vec<ProductCard>,
    pub total: usize,
    pub search: String,
    pub categories: Vec<FilterOption>,
    pub sorts: Vec<FilterOption>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProductPage {
    pub product: Product,
    pub category_label: &'static str,
    pub variations: Vec<VariationView>,
    pub colors: Vec<String>,
    pub related: Vec<ProductCard>,
}

/// Variation option on the product page.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct VariationView {
    pub id: i32,
    pub color: String,
    pub size: String,
    pub price: String,
    pub stock: i32,
    pub available: bool,
}

impl From<&Variation> for VariationView {
    fn from(variation: &Variation) -> Self {
        Self {
            id: variation.id,
            color: variation.color.clone(),
            size: variation.size.clone(),
            price: format_price(variation.price_cents),
            stock: variation.stock,
            available: variation.active && variation.stock > 0,
        }
    }
}

fn category_options(selected: CategoryFilter) -> Vec<FilterOption> {
    let mut options = vec![FilterOption {
        value: CategoryFilter::All.slug(),
        label: "All",
        selected: selected == CategoryFilter::All,
    }];
    options.extend(Category::ALL.into_iter().map(|category| FilterOption {
        value: category.slug(),
        label: category.label(),
        selected: selected == CategoryFilter::Only(category),
    }));
    options
}

fn sort_options(selected: ProductSort) -> Vec<FilterOption> {
    ProductSort::ALL
        .into_iter()
        .map(|sort| FilterOption {
            value: sort.slug(),
            label: sort.label(),
            selected: sort == selected,
        })
        .collect()
}

/// Products matching `query`, already sorted.
pub fn list_catalog<R>(repo: &R, query: &CatalogQuery) -> ServiceResult<Vec<Product>>
where
    R: ProductReader + ?Sized,
{
    let mut list_query = ProductListQuery::new().category(query.category_filter());
    if let Some(term) = query.search_term() {
        list_query = list_query.search(term);
    }

    let mut products = repo.list_products(list_query)?;
    query.sort().apply(&mut products);
    Ok(products)
}

pub fn load_home<R>(repo: &R) -> ServiceResult<HomePage>
where
    R: ProductReader + ?Sized,
{
    let featured = products::fetch_featured(repo)?;
    Ok(HomePage {
        featured: featured.iter().map(ProductCard::from).collect(),
        categories: category_options(CategoryFilter::All),
    })
}

pub fn load_catalog<R>(repo: &R, query: &CatalogQuery) -> ServiceResult<CatalogPage>
where
    R: ProductReader + ?Sized,
{
    let products = list_catalog(repo, query)?;
    Ok(CatalogPage {
        total: products.len(),
        products: products.iter().map(ProductCard::from).collect(),
        search: query.search_term().unwrap_or_default().to_string(),
        categories: category_options(query.category_filter()),
        sorts: sort_options(query.sort()),
    })
}

/// Product detail with related products of the same category.
pub fn load_product_page<R>(repo: &R, product_id: &str) -> ServiceResult<ProductPage>
where
    R: ProductReader + ?Sized,
{
    let product = products::fetch_by_id(repo, product_id)?.ok_or(ServiceError::NotFound)?;
    let related = products::fetch_related(repo, &product, RELATED_PRODUCTS_LIMIT)?;

    Ok(ProductPage {
        category_label: product.category.label(),
        variations: product
            .sorted_variations()
            .iter()
            .map(VariationView::from)
            .collect(),
        colors: product.colors().into_iter().map(str::to_string).collect(),
        related: related.iter().map(ProductCard::from).collect(),
        product,
    })
}
