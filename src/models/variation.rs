use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::variation::{
    NewVariation as DomainNewVariation, UpdateVariation as DomainUpdateVariation,
    Variation as DomainVariation,
};

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::variations)]
pub struct Variation {
    pub id: i32,
    pub product_id: String,
    pub color: String,
    pub size: String,
    pub price_cents: i64,
    pub stock: i32,
    pub active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::variations)]
pub struct NewVariation<'a> {
    pub product_id: &'a str,
    pub color: &'a str,
    pub size: &'a str,
    pub price_cents: i64,
    pub stock: i32,
    pub active: bool,
    pub updated_at: NaiveDateTime,
}

#[derive(AsChangeset)]
#[diesel(table_name = crate::schema::variations)]
pub struct UpdateVariation<'a> {
    pub color: &'a str,
    pub size: &'a str,
    pub price_cents: i64,
    pub stock: i32,
    pub active: bool,
    pub updated_at: NaiveDateTime,
}

impl From<Variation> for DomainVariation {
    fn from(value: Variation) -> Self {
        Self {
            id: value.id,
            product_id: value.product_id,
            color: value.color,
            size: value.size,
            price_cents: value.price_cents,
            stock: value.stock,
            active: value.active,
        }
    }
}

impl<'a> NewVariation<'a> {
    pub fn for_product(
        product_id: &'a str,
        value: &'a DomainNewVariation,
        updated_at: NaiveDateTime,
    ) -> Self {
        Self {
            product_id,
            color: value.color.as_str(),
            size: value.size.as_str(),
            price_cents: value.price_cents,
            stock: value.stock,
            active: value.active,
            updated_at,
        }
    }
}

impl<'a> From<&'a DomainUpdateVariation> for UpdateVariation<'a> {
    fn from(value: &'a DomainUpdateVariation) -> Self {
        Self {
            color: value.color.as_str(),
            size: value.size.as_str(),
            price_cents: value.price_cents,
            stock: value.stock,
            active: value.active,
            updated_at: value.updated_at,
        }
    }
}
