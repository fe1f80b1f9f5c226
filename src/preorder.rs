//! Group pre-order bill split
//!
//! Each item is split evenly among the members it is assigned to. Tax and
//! tip are charged on the whole subtotal and shared in proportion to each
//! member's part of it, so a member who ordered a third of the food pays a
//! third of the tax and tip.
//!
//! Amounts are rounded to cents only when the split is built; shares may
//! therefore differ from the total by a cent.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Tip used when the order does not name one
pub const DEFAULT_TIP_PERCENT: f64 = 18.0;

/// Looked up when a restaurant address carries no ZIP code
pub const DEFAULT_ZIP_CODE: &str = "94704";

pub const MAX_TIP_PERCENT: f64 = 100.0;

#[derive(Debug, Error, PartialEq)]
pub enum PreOrderError {
    #[error("Order has no items")]
    Empty,

    #[error("Item {0:?} needs a name and a positive price")]
    InvalidItem(String),

    #[error("Item {0:?} is not assigned to anyone")]
    Unassigned(String),

    #[error("{0} is not part of this order")]
    UnknownMember(String),

    #[error("Tip must be between 0 and 100 percent")]
    InvalidTip,

    #[error("Tax rate must be between 0 and 1")]
    InvalidTaxRate,
}

/// One line of the order
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub name: String,
    pub price: f64,
    /// Member user ids sharing this item
    pub assigned_to: Vec<String>,
    #[serde(default)]
    pub is_custom: bool,
}

/// Body of `POST /api/groups/:id/preorder`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreOrderRequest {
    pub items: Vec<OrderItem>,
    pub tip_percent: Option<f64>,
    /// Skips the ZIP lookup when set
    pub tax_rate: Option<f64>,
    /// Restaurant whose address gives the ZIP; defaults to the group's pick
    pub restaurant_id: Option<String>,
}

/// Totals plus what each member owes
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BillSplit {
    pub subtotal: f64,
    pub tax_rate: f64,
    pub tax: f64,
    pub tip_percent: f64,
    pub tip: f64,
    pub total: f64,
    pub shares: BTreeMap<String, f64>,
}

fn cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// Split `items` among `members`
///
/// Every member appears in the result, owing zero if nothing is assigned
/// to them. Items may only be assigned to listed members.
pub fn split(
    items: &[OrderItem],
    members: &[String],
    tax_rate: f64,
    tip_percent: f64,
) -> Result<BillSplit, PreOrderError> {
    if items.is_empty() {
        return Err(PreOrderError::Empty);
    }
    if !(0.0..=1.0).contains(&tax_rate) {
        return Err(PreOrderError::InvalidTaxRate);
    }
    if !(0.0..=MAX_TIP_PERCENT).contains(&tip_percent) {
        return Err(PreOrderError::InvalidTip);
    }

    let mut owed: BTreeMap<String, f64> = members.iter().map(|m| (m.clone(), 0.0)).collect();
    let mut subtotal = 0.0;

    for item in items {
        if item.name.trim().is_empty() || !item.price.is_finite() || item.price <= 0.0 {
            return Err(PreOrderError::InvalidItem(item.name.clone()));
        }

        let mut sharers: Vec<&str> = Vec::new();
        for member in &item.assigned_to {
            if !sharers.contains(&member.as_str()) {
                sharers.push(member);
            }
        }
        if sharers.is_empty() {
            return Err(PreOrderError::Unassigned(item.name.clone()));
        }

        let each = item.price / sharers.len() as f64;
        for member in sharers {
            let Some(amount) = owed.get_mut(member) else {
                return Err(PreOrderError::UnknownMember(member.to_string()));
            };
            *amount += each;
        }
        subtotal += item.price;
    }

    let tax = subtotal * tax_rate;
    let tip = subtotal * tip_percent / 100.0;
    let extras = tax + tip;

    let shares = owed
        .into_iter()
        .map(|(member, food)| (member, cents(food + extras * food / subtotal)))
        .collect();

    Ok(BillSplit {
        subtotal: cents(subtotal),
        tax_rate,
        tax: cents(tax),
        tip_percent,
        tip: cents(tip),
        total: cents(subtotal + extras),
        shares,
    })
}

/// First standalone five-digit run in an address
pub fn zip_from_address(address: &str) -> &str {
    address
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .find(|word| word.len() == 5 && word.bytes().all(|b| b.is_ascii_digit()))
        .unwrap_or(DEFAULT_ZIP_CODE)
}
