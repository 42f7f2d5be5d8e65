use std::str::FromStr;

use bigdecimal::{BigDecimal, Zero};
use serde_json::Value;

use crate::woocommerce::{RawLineItem, RawMeta, RawOrder};

pub const UNKNOWN: &str = "Unknown";
pub const ZERO_TEXT: &str = "0";

/// Canonical order header, one row per `order_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub order_id: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub billing_address: String,
    pub shipping_address: String,
    pub order_status: String,
    pub order_total: String,
    pub shipping_method: String,
    pub shipping_total: String,
}

/// Canonical line item. `(order_id, product_name, variation_details)` is the dedup key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderItem {
    pub order_id: String,
    pub product_name: String,
    pub quantity: i64,
    pub price: BigDecimal,
    pub total_price: BigDecimal,
    pub variation_details: String,
    pub product_attributes: String,
}

/// Render a loosely typed scalar as text. Strings pass through untouched,
/// numbers keep their JSON spelling (`727`, `19.35`).
fn scalar_text(v: &Value) -> Option<String> {
    match v {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn text_or(v: Option<&Value>, default: &str) -> String {
    v.and_then(scalar_text).unwrap_or_else(|| default.to_string())
}

fn decimal_or_zero(v: Option<&Value>) -> BigDecimal {
    let parsed = match v {
        Some(Value::Number(n)) => BigDecimal::from_str(&n.to_string()).ok(),
        Some(Value::String(s)) => BigDecimal::from_str(s.trim()).ok(),
        _ => None,
    };
    parsed.unwrap_or_else(BigDecimal::zero)
}

fn quantity_or_zero(v: Option<&Value>) -> i64 {
    let parsed = match v {
        Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    parsed.unwrap_or(0).max(0)
}

fn or_unknown(v: Option<&Value>) -> String {
    text_or(v, UNKNOWN)
}

fn address(line: Option<&Value>, city: Option<&Value>) -> String {
    format!("{}, {}", text_or(line, ""), text_or(city, ""))
}

/// Flatten variation metadata into `key: value, key: value`.
///
/// Entries missing either side are dropped; non-string values are written as
/// compact JSON.
pub fn flatten_attributes(meta: &[RawMeta]) -> String {
    let mut out = String::new();
    for entry in meta {
        let key = entry.key.as_ref().and_then(scalar_text);
        let value = entry.value.as_ref().and_then(scalar_text);
        let (Some(key), Some(value)) = (key, value) else {
            continue;
        };
        out.push_str(&key);
        out.push_str(": ");
        out.push_str(&value);
        out.push_str(", ");
    }
    if out.ends_with(", ") {
        out.truncate(out.len() - 2);
    }
    out
}

fn normalize_item(order_id: &str, raw: RawLineItem) -> OrderItem {
    let variation_id = raw.variation_id.as_ref().and_then(scalar_text);
    let (variation_details, product_attributes) = match variation_id {
        Some(id) => (
            format!("Variation ID: {id}"),
            raw.meta_data
                .as_deref()
                .map(flatten_attributes)
                .unwrap_or_default(),
        ),
        None => (String::new(), String::new()),
    };

    OrderItem {
        order_id: order_id.to_string(),
        product_name: or_unknown(raw.name.as_ref()),
        quantity: quantity_or_zero(raw.quantity.as_ref()),
        price: decimal_or_zero(raw.price.as_ref()),
        total_price: decimal_or_zero(raw.total.as_ref()),
        variation_details,
        product_attributes,
    }
}

/// Map one raw order document onto its canonical header and items.
pub fn normalize_order(raw: RawOrder) -> (Order, Vec<OrderItem>) {
    let billing = raw.billing.unwrap_or_default();
    let shipping = raw.shipping.unwrap_or_default();
    let first_line = raw
        .shipping_lines
        .as_deref()
        .and_then(|lines| lines.first());

    let order = Order {
        order_id: text_or(raw.id.as_ref(), UNKNOWN),
        customer_name: format!(
            "{} {}",
            or_unknown(billing.first_name.as_ref()),
            or_unknown(billing.last_name.as_ref())
        ),
        customer_email: or_unknown(billing.email.as_ref()),
        customer_phone: or_unknown(billing.phone.as_ref()),
        billing_address: address(billing.address_1.as_ref(), billing.city.as_ref()),
        shipping_address: address(shipping.address_1.as_ref(), shipping.city.as_ref()),
        order_status: or_unknown(raw.status.as_ref()),
        order_total: text_or(raw.total.as_ref(), ZERO_TEXT),
        shipping_method: or_unknown(first_line.and_then(|l| l.method_title.as_ref())),
        shipping_total: text_or(first_line.and_then(|l| l.total.as_ref()), ZERO_TEXT),
    };

    let items = raw
        .line_items
        .unwrap_or_default()
        .into_iter()
        .map(|item| normalize_item(&order.order_id, item))
        .collect();

    (order, items)
}

/// Lazily normalize a fetched page, consuming it in document order.
pub fn normalize_page(page: Vec<RawOrder>) -> impl Iterator<Item = (Order, Vec<OrderItem>)> {
    page.into_iter().map(normalize_order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: Value) -> RawOrder {
        serde_json::from_value(value).unwrap()
    }

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    #[test]
    fn full_order_maps_every_field() {
        let (order, items) = normalize_order(raw(json!({
            "id": 727,
            "status": "processing",
            "total": "29.35",
            "billing": {
                "first_name": "John", "last_name": "Doe",
                "email": "john@example.com", "phone": "555",
                "address_1": "969 Market", "city": "San Francisco"
            },
            "shipping": { "address_1": "1 Pier", "city": "Oakland" },
            "shipping_lines": [
                { "method_title": "Flat Rate", "total": "10.00" },
                { "method_title": "Ignored", "total": "99.00" }
            ],
            "line_items": [{ "name": "Mug", "quantity": 2, "price": 9.5, "total": "19.00" }]
        })));

        assert_eq!(
            order,
            Order {
                order_id: "727".into(),
                customer_name: "John Doe".into(),
                customer_email: "john@example.com".into(),
                customer_phone: "555".into(),
                billing_address: "969 Market, San Francisco".into(),
                shipping_address: "1 Pier, Oakland".into(),
                order_status: "processing".into(),
                order_total: "29.35".into(),
                shipping_method: "Flat Rate".into(),
                shipping_total: "10.00".into(),
            }
        );
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].order_id, "727");
        assert_eq!(items[0].quantity, 2);
        assert_eq!(items[0].price, dec("9.5"));
        assert_eq!(items[0].total_price, dec("19.00"));
        assert_eq!(items[0].variation_details, "");
        assert_eq!(items[0].product_attributes, "");
    }

    #[test]
    fn missing_billing_uses_unknown_and_bare_separator() {
        let (order, items) = normalize_order(raw(json!({ "id": "42", "status": "pending" })));

        assert_eq!(order.customer_name, "Unknown Unknown");
        assert_eq!(order.customer_email, "Unknown");
        assert_eq!(order.customer_phone, "Unknown");
        assert_eq!(order.billing_address, ", ");
        assert_eq!(order.shipping_address, ", ");
        assert_eq!(order.order_total, "0");
        assert!(items.is_empty());
    }

    #[test]
    fn name_parts_default_independently() {
        let (order, _) = normalize_order(raw(json!({
            "billing": { "first_name": "Ada", "city": "London" }
        })));
        assert_eq!(order.customer_name, "Ada Unknown");
        assert_eq!(order.billing_address, ", London");
        assert_eq!(order.order_id, "Unknown");
        assert_eq!(order.order_status, "Unknown");
    }

    #[test]
    fn shipping_defaults_when_lines_absent_or_empty() {
        for doc in [json!({}), json!({ "shipping_lines": [] })] {
            let (order, _) = normalize_order(raw(doc));
            assert_eq!(order.shipping_method, "Unknown");
            assert_eq!(order.shipping_total, "0");
        }
    }

    #[test]
    fn shipping_line_without_fields_uses_defaults() {
        let (order, _) = normalize_order(raw(json!({ "shipping_lines": [{}] })));
        assert_eq!(order.shipping_method, "Unknown");
        assert_eq!(order.shipping_total, "0");

        let (order, _) = normalize_order(raw(json!({
            "shipping_lines": [{ "method_title": null, "total": null }]
        })));
        assert_eq!(order.shipping_method, "Unknown");
        assert_eq!(order.shipping_total, "0");
    }

    #[test]
    fn numeric_text_fields_render_as_json_text() {
        let (order, items) = normalize_order(raw(json!({
            "id": 9,
            "status": 3,
            "billing": { "first_name": "Ada", "last_name": 7, "phone": 5551234, "city": 10115 },
            "shipping_lines": [{ "method_title": 2, "total": 4.5 }],
            "line_items": [{
                "name": 1984,
                "variation_id": 5,
                "meta_data": [{ "key": 12, "value": "x" }]
            }]
        })));

        assert_eq!(order.customer_phone, "5551234");
        assert_eq!(order.order_status, "3");
        assert_eq!(order.customer_name, "Ada 7");
        assert_eq!(order.billing_address, ", 10115");
        assert_eq!(order.shipping_method, "2");
        assert_eq!(order.shipping_total, "4.5");
        assert_eq!(items[0].product_name, "1984");
        assert_eq!(items[0].product_attributes, "12: x");
    }

    #[test]
    fn variation_metadata_is_flattened_without_trailing_comma() {
        let (_, items) = normalize_order(raw(json!({
            "id": 1,
            "line_items": [{
                "name": "Ticket",
                "variation_id": 55,
                "meta_data": [
                    { "key": "pa_age", "value": "adult" },
                    { "key": "pa_children", "value": "2" }
                ]
            }]
        })));

        assert_eq!(items[0].variation_details, "Variation ID: 55");
        assert_eq!(items[0].product_attributes, "pa_age: adult, pa_children: 2");
    }

    #[test]
    fn metadata_without_variation_is_ignored() {
        let (_, items) = normalize_order(raw(json!({
            "line_items": [{
                "name": "Ticket",
                "meta_data": [{ "key": "pa_age", "value": "adult" }]
            }]
        })));
        assert_eq!(items[0].variation_details, "");
        assert_eq!(items[0].product_attributes, "");
    }

    #[test]
    fn item_numeric_fields_default_to_zero() {
        let (_, items) = normalize_order(raw(json!({
            "line_items": [{}, { "quantity": "3", "price": "not a number", "total": null }]
        })));

        assert_eq!(items[0].product_name, "Unknown");
        assert_eq!(items[0].quantity, 0);
        assert_eq!(items[0].price, BigDecimal::zero());
        assert_eq!(items[0].total_price, BigDecimal::zero());
        assert_eq!(items[1].quantity, 3);
        assert_eq!(items[1].price, BigDecimal::zero());
    }

    #[test]
    fn negative_quantity_is_clamped() {
        let (_, items) = normalize_order(raw(json!({ "line_items": [{ "quantity": -4 }] })));
        assert_eq!(items[0].quantity, 0);
    }

    #[test]
    fn flatten_skips_incomplete_entries_and_renders_json_values() {
        let meta: Vec<RawMeta> = serde_json::from_value(json!([
            { "key": "pa_size", "value": "XL" },
            { "key": null, "value": "orphan" },
            { "key": "pa_missing" },
            { "key": "_reduced_stock", "value": 1 },
            { "key": "_bundle", "value": { "a": 1 } }
        ]))
        .unwrap();

        assert_eq!(
            flatten_attributes(&meta),
            r#"pa_size: XL, _reduced_stock: 1, _bundle: {"a":1}"#
        );
        assert_eq!(flatten_attributes(&[]), "");
    }

    #[test]
    fn page_is_normalized_in_document_order() {
        let page: Vec<RawOrder> =
            serde_json::from_value(json!([{ "id": 3 }, { "id": 1 }, { "id": 2 }])).unwrap();
        let ids: Vec<String> = normalize_page(page).map(|(o, _)| o.order_id).collect();
        assert_eq!(ids, ["3", "1", "2"]);
    }
}
