//! Restaurant catalog records
//!
//! Plain records mirrored from the static restaurant catalog:
//! - `Restaurant`: a venue with its deals, menus, reviews and images
//! - `Deal`: a promotion with a free-text validity window
//! - `Menu` / `MenuItem`: a titled list of priced dishes
//! - `Review`: a single user review
//! - `ImageRef`: either a full URL or a Cloudinary `public_id`

use serde::{Deserialize, Serialize};

/// A restaurant as it appears in the catalog
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Restaurant {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_range: Option<PriceRange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    /// Distance in miles from the user's location, when precomputed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
    #[serde(default)]
    pub images: Vec<ImageRef>,
    #[serde(default)]
    pub food_types: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub deals: Vec<Deal>,
    #[serde(default)]
    pub menus: Vec<Menu>,
    #[serde(default)]
    pub reviews: Vec<Review>,
}

impl Restaurant {
    /// Create a restaurant with only identity fields set
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            address: String::new(),
            phone: String::new(),
            price_range: None,
            rating: None,
            distance: None,
            images: Vec::new(),
            food_types: Vec::new(),
            tags: Vec::new(),
            deals: Vec::new(),
            menus: Vec::new(),
            reviews: Vec::new(),
        }
    }

    /// Builder method: set address
    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into();
        self
    }

    /// Builder method: set rating
    pub fn rating(mut self, rating: f64) -> Self {
        self.rating = Some(rating);
        self
    }

    /// Builder method: set price range
    pub fn price_range(mut self, price_range: PriceRange) -> Self {
        self.price_range = Some(price_range);
        self
    }

    /// Builder method: add a food type
    pub fn food_type(mut self, food_type: impl Into<String>) -> Self {
        self.food_types.push(food_type.into());
        self
    }

    /// Builder method: add a tag
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Builder method: add a deal
    pub fn deal(mut self, deal: Deal) -> Self {
        self.deals.push(deal);
        self
    }

    /// Builder method: add a menu
    pub fn menu(mut self, menu: Menu) -> Self {
        self.menus.push(menu);
        self
    }

    /// Builder method: add a declared image
    pub fn image(mut self, image: ImageRef) -> Self {
        self.images.push(image);
        self
    }

    /// Look up a deal by id
    pub fn find_deal(&self, deal_id: &str) -> Option<&Deal> {
        self.deals.iter().find(|d| d.id == deal_id)
    }
}

/// Price bracket shown as dollar signs
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum PriceRange {
    #[serde(rename = "$")]
    Budget,
    #[serde(rename = "$$")]
    Moderate,
    #[serde(rename = "$$$")]
    Upscale,
}

impl std::fmt::Display for PriceRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PriceRange::Budget => write!(f, "$"),
            PriceRange::Moderate => write!(f, "$$"),
            PriceRange::Upscale => write!(f, "$$$"),
        }
    }
}

/// A promotion offered by a restaurant
///
/// The validity window is free text ("Oct 10") and is never parsed as a date.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Deal {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eligibility: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restrictions: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_of_use: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limits: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refund_policy: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cash_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disclaimer: Option<String>,
}

impl Deal {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            ..Default::default()
        }
    }

    /// Builder method: set the validity window
    pub fn valid(mut self, from: Option<&str>, to: Option<&str>) -> Self {
        self.valid_from = from.map(str::to_string);
        self.valid_to = to.map(str::to_string);
        self
    }
}

/// A titled list of menu items
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Menu {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub items: Vec<MenuItem>,
}

impl Menu {
    pub fn new(id: impl Into<String>, title: impl Into<String>, items: Vec<MenuItem>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            items,
        }
    }
}

/// A single dish with its price in dollars
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MenuItem {
    pub id: String,
    pub name: String,
    pub price: f64,
}

impl MenuItem {
    pub fn new(id: impl Into<String>, name: impl Into<String>, price: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            price,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub user_name: String,
    pub rating: f64,
    #[serde(default)]
    pub comment: String,
}

/// An image declared in the catalog: a full `url` or a Cloudinary `public_id`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ImageRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_restaurant_deserialize_camel_case() {
        let json = r#"{
            "id": "r9",
            "name": "Noodle Bar",
            "address": "1 Main St",
            "phone": "(617) 555-0000",
            "priceRange": "$$",
            "rating": 4.3,
            "foodTypes": ["Chinese"],
            "deals": [{"id": "d1", "title": "Lunch", "validFrom": "Oct 1"}]
        }"#;

        let restaurant: Restaurant = serde_json::from_str(json).unwrap();
        assert_eq!(restaurant.price_range, Some(PriceRange::Moderate));
        assert_eq!(restaurant.food_types, vec!["Chinese"]);
        assert!(restaurant.tags.is_empty());
        assert_eq!(restaurant.deals[0].valid_from.as_deref(), Some("Oct 1"));
        assert!(restaurant.deals[0].valid_to.is_none());
    }

    #[test]
    fn test_price_range_display() {
        assert_eq!(PriceRange::Budget.to_string(), "$");
        assert_eq!(PriceRange::Upscale.to_string(), "$$$");
    }

    #[test]
    fn test_find_deal() {
        let restaurant = Restaurant::new("r1", "Test")
            .deal(Deal::new("d1", "One"))
            .deal(Deal::new("d2", "Two"));

        assert_eq!(restaurant.find_deal("d2").map(|d| d.title.as_str()), Some("Two"));
        assert!(restaurant.find_deal("missing").is_none());
    }
}
