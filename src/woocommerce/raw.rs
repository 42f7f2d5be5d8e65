//! Wire shape of `GET /wp-json/wc/v3/orders`.
//!
//! Only the fields the sync reads are declared; everything else in the
//! payload is ignored. Every scalar stays a raw `Value`, since stores and
//! plugins emit ids, totals, phone numbers and meta keys as either strings or
//! numbers. The normalizer resolves them to text.
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawOrder {
    pub id: Option<Value>,
    pub status: Option<Value>,
    pub total: Option<Value>,
    pub billing: Option<RawBilling>,
    pub shipping: Option<RawShipping>,
    pub shipping_lines: Option<Vec<RawShippingLine>>,
    pub line_items: Option<Vec<RawLineItem>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawBilling {
    pub first_name: Option<Value>,
    pub last_name: Option<Value>,
    pub email: Option<Value>,
    pub phone: Option<Value>,
    pub address_1: Option<Value>,
    pub city: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawShipping {
    pub address_1: Option<Value>,
    pub city: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawShippingLine {
    pub method_title: Option<Value>,
    pub total: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawLineItem {
    pub name: Option<Value>,
    pub quantity: Option<Value>,
    pub price: Option<Value>,
    pub total: Option<Value>,
    pub variation_id: Option<Value>,
    pub meta_data: Option<Vec<RawMeta>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawMeta {
    pub key: Option<Value>,
    pub value: Option<Value>,
}
