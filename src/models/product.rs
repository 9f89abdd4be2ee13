use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::category::Category;
use crate::domain::product::{
    NewProduct as DomainNewProduct, Product as DomainProduct, UpdateProduct as DomainUpdateProduct,
};
use crate::domain::variation::Variation as DomainVariation;
use crate::repository::errors::{RepositoryError, RepositoryResult};

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::products)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub description: String,
    /// JSON array of image URLs.
    pub images: String,
    pub category: String,
    pub featured: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::products)]
pub struct NewProduct<'a> {
    pub id: &'a str,
    pub name: &'a str,
    pub description: &'a str,
    pub images: String,
    pub category: &'static str,
    pub featured: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(AsChangeset)]
#[diesel(table_name = crate::schema::products)]
pub struct UpdateProduct<'a> {
    pub name: &'a str,
    pub description: &'a str,
    pub images: String,
    pub category: &'static str,
    pub featured: bool,
    pub updated_at: NaiveDateTime,
}

impl Product {
    /// Convert the row into a domain product carrying `variations`.
    pub fn into_domain(self, variations: Vec<DomainVariation>) -> RepositoryResult<DomainProduct> {
        let images: Vec<String> = serde_json::from_str(&self.images).map_err(|err| {
            RepositoryError::Serialization(format!("images of product {}: {err}", self.id))
        })?;
        let category: Category = self.category.parse().map_err(|err| {
            RepositoryError::Serialization(format!("category of product {}: {err}", self.id))
        })?;

        Ok(DomainProduct {
            id: self.id,
            name: self.name,
            description: self.description,
            images,
            category,
            featured: self.featured,
            variations,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

fn encode_images(images: &[String]) -> RepositoryResult<String> {
    serde_json::to_string(images).map_err(|err| RepositoryError::Serialization(err.to_string()))
}

impl<'a> NewProduct<'a> {
    pub fn try_from_domain(value: &'a DomainNewProduct) -> RepositoryResult<Self> {
        Ok(Self {
            id: value.id.as_str(),
            name: value.name.as_str(),
            description: value.description.as_str(),
            images: encode_images(&value.images)?,
            category: value.category.slug(),
            featured: value.featured,
            created_at: value.created_at,
            updated_at: value.created_at,
        })
    }
}

impl<'a> UpdateProduct<'a> {
    pub fn try_from_domain(value: &'a DomainUpdateProduct) -> RepositoryResult<Self> {
        Ok(Self {
            name: value.name.as_str(),
            description: value.description.as_str(),
            images: encode_images(&value.images)?,
            category: value.category.slug(),
            featured: value.featured,
            updated_at: value.updated_at,
        })
    }
}
