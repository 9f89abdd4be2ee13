use std::collections::HashSet;

use actix_multipart::form::{MultipartForm, tempfile::TempFile, text::Text};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use validator::{Validate, ValidationErrors};

use crate::domain::category::Category;
use crate::domain::price::{format_price_input, parse_price};
use crate::domain::product::Product;
use crate::domain::variation::{NewVariation, UpdateVariation};
use crate::storage::PendingImage;

/// Maximum allowed length for a product name.
const NAME_MAX_LEN: usize = 128;
/// Maximum allowed length for a color or size label.
const OPTION_MAX_LEN: usize = 64;
const OPTION_MAX_LEN_VALIDATOR: u64 = OPTION_MAX_LEN as u64;

/// Result type returned by the product form helpers.
pub type ProductFormResult<T> = Result<T, ProductFormError>;

/// Errors that can occur while processing product forms. Messages are shown to
/// the admin as-is.
#[derive(Debug, Error)]
pub enum ProductFormError {
    /// Validation failures from the `validator` crate.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationErrors),
    #[error("Product name is required")]
    NameRequired,
    #[error("Product name must be at most {NAME_MAX_LEN} characters")]
    NameTooLong,
    #[error("Product description is required")]
    DescriptionRequired,
    #[error("Product category is required")]
    CategoryRequired,
    #[error("Unknown product category `{0}`")]
    UnknownCategory(String),
    #[error("At least one variation is required")]
    VariationsRequired,
    #[error("Color is required for all variations")]
    ColorRequired,
    #[error("Size is required for all variations")]
    SizeRequired,
    #[error("Price must be greater than 0 for all variations")]
    InvalidPrice,
    #[error("Stock cannot be negative")]
    NegativeStock,
    #[error("Stock must be a whole number")]
    InvalidStock,
    #[error("Variation {color} / {size} is listed more than once")]
    DuplicateVariation { color: String, size: String },
    #[error("Please provide at least one product image")]
    ImagesRequired,
    #[error("Could not read uploaded image {name}: {message}")]
    ImageRead { name: String, message: String },
}

/// One editable variation row. Price and stock keep the text the admin typed
/// so a rejected form can be shown again unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VariationRow {
    /// Set for rows that already exist in the store.
    pub id: Option<i32>,
    pub color: String,
    pub size: String,
    pub price: String,
    pub stock: String,
    pub active: bool,
}

impl VariationRow {
    pub fn blank() -> Self {
        Self {
            id: None,
            color: String::new(),
            size: String::new(),
            price: String::new(),
            stock: "0".to_string(),
            active: true,
        }
    }
}

/// Editable state of the admin product form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductForm {
    pub name: String,
    pub description: String,
    /// Raw category slug, empty until one is picked.
    pub category: String,
    pub featured: bool,
    /// Already stored image URLs the product keeps.
    pub images: Vec<String>,
    pub variations: Vec<VariationRow>,
}

impl Default for ProductForm {
    /// Empty template with one blank variation row.
    fn default() -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            category: String::new(),
            featured: false,
            images: Vec::new(),
            variations: vec![VariationRow::blank()],
        }
    }
}

impl From<&Product> for ProductForm {
    fn from(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            description: product.description.clone(),
            category: product.category.slug().to_string(),
            featured: product.featured,
            images: product.images.clone(),
            variations: product
                .variations
                .iter()
                .map(|variation| VariationRow {
                    id: Some(variation.id),
                    color: variation.color.clone(),
                    size: variation.size.clone(),
                    price: format_price_input(variation.price_cents),
                    stock: variation.stock.to_string(),
                    active: variation.active,
                })
                .collect(),
        }
    }
}

/// A variation row that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidVariation {
    pub id: Option<i32>,
    pub color: String,
    pub size: String,
    pub price_cents: i64,
    pub stock: i32,
    pub active: bool,
}

impl ValidVariation {
    pub fn to_new_variation(&self) -> NewVariation {
        let new = NewVariation::new(
            self.color.clone(),
            self.size.clone(),
            self.price_cents,
            self.stock,
        );
        if self.active { new } else { new.inactive() }
    }

    pub fn to_update_variation(&self, updated_at: NaiveDateTime) -> UpdateVariation {
        UpdateVariation {
            color: self.color.clone(),
            size: self.size.clone(),
            price_cents: self.price_cents,
            stock: self.stock,
            active: self.active,
            updated_at,
        }
    }
}

/// Sanitized product fields ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidProduct {
    pub name: String,
    pub description: String,
    pub category: Category,
    pub featured: bool,
    pub variations: Vec<ValidVariation>,
}

impl ProductForm {
    pub fn add_variation_row(&mut self) {
        self.variations.push(VariationRow::blank());
    }

    /// Remove the row at `index`; out-of-range indexes are ignored.
    pub fn remove_variation_row(&mut self, index: usize) {
        if index < self.variations.len() {
            self.variations.remove(index);
        }
    }

    /// Drop a kept image by URL.
    pub fn remove_image(&mut self, url: &str) {
        self.images.retain(|image| image != url);
    }

    /// Check every field in display order and stop at the first violation.
    /// `pending_images` counts files chosen but not yet stored.
    pub fn validate(&self, pending_images: usize) -> ProductFormResult<ValidProduct> {
        let name = sanitize_inline_text(&self.name);
        if name.is_empty() {
            return Err(ProductFormError::NameRequired);
        }
        if name.chars().count() > NAME_MAX_LEN {
            return Err(ProductFormError::NameTooLong);
        }

        let description = sanitize_multiline_text(&self.description);
        if description.is_empty() {
            return Err(ProductFormError::DescriptionRequired);
        }

        let category_raw = self.category.trim();
        if category_raw.is_empty() {
            return Err(ProductFormError::CategoryRequired);
        }
        let category: Category = category_raw
            .parse()
            .map_err(|_| ProductFormError::UnknownCategory(category_raw.to_string()))?;

        if self.variations.is_empty() {
            return Err(ProductFormError::VariationsRequired);
        }

        let mut variations = Vec::with_capacity(self.variations.len());
        for row in &self.variations {
            let color = sanitize_inline_text(&row.color);
            if color.is_empty() {
                return Err(ProductFormError::ColorRequired);
            }
            let size = sanitize_inline_text(&row.size);
            if size.is_empty() {
                return Err(ProductFormError::SizeRequired);
            }
            let price_cents = parse_price(&row.price)
                .filter(|cents| *cents > 0)
                .ok_or(ProductFormError::InvalidPrice)?;
            let stock = parse_stock(&row.stock)?;

            variations.push(ValidVariation {
                id: row.id,
                color,
                size,
                price_cents,
                stock,
                active: row.active,
            });
        }

        ensure_unique_options(&variations)?;

        if pending_images == 0 && self.images.is_empty() {
            return Err(ProductFormError::ImagesRequired);
        }

        Ok(ValidProduct {
            name,
            description,
            category,
            featured: self.featured,
            variations,
        })
    }
}

fn parse_stock(input: &str) -> ProductFormResult<i32> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(0);
    }
    match trimmed.parse::<i64>() {
        Ok(value) if value < 0 => Err(ProductFormError::NegativeStock),
        Ok(value) => i32::try_from(value).map_err(|_| ProductFormError::InvalidStock),
        Err(_) => Err(ProductFormError::InvalidStock),
    }
}

fn ensure_unique_options(variations: &[ValidVariation]) -> ProductFormResult<()> {
    let mut seen = HashSet::new();
    for variation in variations {
        if !seen.insert((variation.color.as_str(), variation.size.as_str())) {
            return Err(ProductFormError::DuplicateVariation {
                color: variation.color.clone(),
                size: variation.size.clone(),
            });
        }
    }
    Ok(())
}

/// Multipart payload posted by the product editor. Variation rows arrive as
/// parallel repeated fields.
#[derive(MultipartForm)]
pub struct ProductUploadForm {
    pub name: Text<String>,
    pub description: Text<String>,
    pub category: Text<String>,
    pub featured: Option<Text<String>>,
    /// URLs of stored images the admin kept.
    pub existing_images: Vec<Text<String>>,
    /// Files an earlier failed attempt already stored. They still count as new
    /// uploads.
    pub uploaded_images: Vec<Text<String>>,
    pub variation_id: Vec<Text<String>>,
    pub variation_color: Vec<Text<String>>,
    pub variation_size: Vec<Text<String>>,
    pub variation_price: Vec<Text<String>>,
    pub variation_stock: Vec<Text<String>>,
    /// `true` or `false` per row; a select is used because unchecked boxes are
    /// not posted.
    pub variation_active: Vec<Text<String>>,
    #[multipart(limit = "10MB")]
    pub images: Vec<TempFile>,
}

impl ProductUploadForm {
    /// Split the payload into the editable form state and the newly chosen
    /// image files, already stored ones first. Empty file inputs are skipped.
    pub fn into_parts(self) -> ProductFormResult<(ProductForm, Vec<PendingImage>)> {
        let texts = |values: Vec<Text<String>>| -> Vec<String> {
            values.into_iter().map(Text::into_inner).collect()
        };

        let rows = assemble_variation_rows(
            &texts(self.variation_id),
            &texts(self.variation_color),
            &texts(self.variation_size),
            &texts(self.variation_price),
            &texts(self.variation_stock),
            &texts(self.variation_active),
        );

        let form = ProductForm {
            name: self.name.into_inner(),
            description: self.description.into_inner(),
            category: self.category.into_inner(),
            featured: self
                .featured
                .map(|value| is_truthy(&value))
                .unwrap_or(false),
            images: texts(self.existing_images)
                .into_iter()
                .map(|url| url.trim().to_string())
                .filter(|url| !url.is_empty())
                .collect(),
            variations: rows,
        };

        let mut pending: Vec<PendingImage> = texts(self.uploaded_images)
            .into_iter()
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
            .map(PendingImage::already_uploaded)
            .collect();
        for file in self.images {
            if file.size == 0 {
                continue;
            }
            let name = file.file_name.clone().unwrap_or_else(|| "image".to_string());
            let bytes = std::fs::read(file.file.path()).map_err(|err| {
                ProductFormError::ImageRead {
                    name: name.clone(),
                    message: err.to_string(),
                }
            })?;
            pending.push(PendingImage::new(name, bytes));
        }

        Ok((form, pending))
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(value.trim(), "true" | "on" | "1" | "yes")
}

/// Zip the parallel variation columns into rows. Missing cells read as empty.
pub fn assemble_variation_rows(
    ids: &[String],
    colors: &[String],
    sizes: &[String],
    prices: &[String],
    stocks: &[String],
    actives: &[String],
) -> Vec<VariationRow> {
    let count = colors
        .len()
        .max(sizes.len())
        .max(prices.len())
        .max(stocks.len());
    let cell = |column: &[String], index: usize| column.get(index).cloned().unwrap_or_default();

    (0..count)
        .map(|index| VariationRow {
            id: ids
                .get(index)
                .and_then(|raw| raw.trim().parse::<i32>().ok())
                .filter(|id| *id > 0),
            color: cell(colors, index),
            size: cell(sizes, index),
            price: cell(prices, index),
            stock: cell(stocks, index),
            active: actives.get(index).map(|raw| is_truthy(raw)).unwrap_or(true),
        })
        .collect()
}

/// Form payload for adding one variation to an existing product.
#[derive(Debug, Deserialize, Validate)]
pub struct AddVariationForm {
    #[validate(length(min = 1, max = OPTION_MAX_LEN_VALIDATOR))]
    pub color: String,
    #[validate(length(min = 1, max = OPTION_MAX_LEN_VALIDATOR))]
    pub size: String,
    pub price: String,
    #[validate(range(min = 0))]
    pub stock: i32,
    #[serde(default)]
    pub inactive: bool,
}

impl AddVariationForm {
    pub fn into_new_variation(self) -> ProductFormResult<NewVariation> {
        self.validate()?;

        let color = sanitize_inline_text(&self.color);
        if color.is_empty() {
            return Err(ProductFormError::ColorRequired);
        }
        let size = sanitize_inline_text(&self.size);
        if size.is_empty() {
            return Err(ProductFormError::SizeRequired);
        }
        let price_cents = parse_price(&self.price)
            .filter(|cents| *cents > 0)
            .ok_or(ProductFormError::InvalidPrice)?;

        let new = NewVariation::new(color, size, price_cents, self.stock);
        Ok(if self.inactive { new.inactive() } else { new })
    }
}

/// Form payload for the inline stock editor.
#[derive(Debug, Deserialize)]
pub struct StockForm {
    pub stock: i32,
}

/// Form payload for the active toggle.
#[derive(Debug, Deserialize)]
pub struct ActiveForm {
    pub active: bool,
}

/// Collapse whitespace runs into single spaces and strip control characters.
pub(crate) fn sanitize_inline_text(input: &str) -> String {
    let mut sanitized = String::with_capacity(input.len());
    let mut previous_whitespace = false;

    for ch in input.trim().chars() {
        if ch.is_whitespace() {
            if !previous_whitespace {
                sanitized.push(' ');
                previous_whitespace = true;
            }
        } else if ch.is_control() {
            continue;
        } else {
            sanitized.push(ch);
            previous_whitespace = false;
        }
    }

    sanitized
}

/// Like [`sanitize_inline_text`] per line, keeping at most one blank line
/// between paragraphs.
pub(crate) fn sanitize_multiline_text(input: &str) -> String {
    let mut result: Vec<String> = Vec::new();
    let mut previous_empty = true;

    for line in input.lines().map(sanitize_inline_text) {
        if line.is_empty() {
            if !previous_empty {
                result.push(String::new());
            }
            previous_empty = true;
        } else {
            result.push(line);
            previous_empty = false;
        }
    }

    while matches!(result.last(), Some(line) if line.is_empty()) {
        result.pop();
    }

    result.join("\n")
}
