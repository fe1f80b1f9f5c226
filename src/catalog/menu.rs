//! Menu categorization
//!
//! Splits a flat menu into category buckets by matching keywords against the
//! lower-cased item name. Rules are checked in order and the first match wins,
//! so "Pizza Roll" is a pizza and "Chicken Ramen" is a noodle dish.

use super::types::{Menu, MenuItem};

/// Category bucket for a menu item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MenuCategory {
    Pizza,
    BurritosAndTacos,
    NoodlesAndPasta,
    Appetizers,
    Soups,
    Salads,
    Meat,
    Seafood,
    RiceAndBowls,
    Beverages,
    Desserts,
    Other,
}

/// Ordered keyword rules. Order matters: earlier rules shadow later ones.
const RULES: &[(MenuCategory, &[&str])] = &[
    (MenuCategory::Pizza, &["pizza"]),
    (
        MenuCategory::BurritosAndTacos,
        &["burrito", "wrap", "tacos", "taco", "quesadilla"],
    ),
    (
        MenuCategory::NoodlesAndPasta,
        &[
            "noodle",
            "spaghetti",
            "pasta",
            "fettuccine",
            "penne",
            "chow mein",
            "ramen",
        ],
    ),
    (
        MenuCategory::Appetizers,
        &[
            "roll",
            "egg roll",
            "spring roll",
            "appetizer",
            "starter",
            "wing",
            "fried",
            "arancini",
            "breadstick",
            "pot sticker",
            "tempura",
            "gyoza",
            "dumpling",
        ],
    ),
    (MenuCategory::Soups, &["pho", "soup", "broth", "ramen"]),
    (
        MenuCategory::Salads,
        &["salad", "vegetable", "veggie", "veggies", "greens"],
    ),
    (
        MenuCategory::Meat,
        &["beef", "chicken", "pork", "duck", "turkey", "lamb"],
    ),
    (
        MenuCategory::Seafood,
        &[
            "shrimp", "fish", "tuna", "salmon", "calamari", "seafood", "crab", "lobster",
        ],
    ),
    (
        MenuCategory::RiceAndBowls,
        &["rice", "fried rice", "risotto", "bowl"],
    ),
    (
        MenuCategory::Beverages,
        &[
            "coffee",
            "latte",
            "cappuccino",
            "tea",
            "juice",
            "smoothie",
            "drink",
            "shake",
            "soda",
        ],
    ),
    (
        MenuCategory::Desserts,
        &[
            "dessert",
            "cake",
            "ice cream",
            "chocolate",
            "cheesecake",
            "pudding",
            "tart",
            "pastry",
        ],
    ),
];

impl MenuCategory {
    /// Classify a dish by name
    pub fn classify(name: &str) -> Self {
        let name = name.to_lowercase();
        RULES
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|k| name.contains(k)))
            .map(|(category, _)| *category)
            .unwrap_or(MenuCategory::Other)
    }

    /// Display title of the bucket
    pub fn title(&self) -> &'static str {
        match self {
            MenuCategory::Pizza => "Pizza",
            MenuCategory::BurritosAndTacos => "Burritos & Tacos",
            MenuCategory::NoodlesAndPasta => "Noodles & Pasta",
            MenuCategory::Appetizers => "Appetizers & Starters",
            MenuCategory::Soups => "Soups & Broths",
            MenuCategory::Salads => "Salads & Vegetables",
            MenuCategory::Meat => "Meat Dishes",
            MenuCategory::Seafood => "Seafood",
            MenuCategory::RiceAndBowls => "Rice & Bowls",
            MenuCategory::Beverages => "Beverages",
            MenuCategory::Desserts => "Desserts",
            MenuCategory::Other => "Other",
        }
    }

    /// Id fragment: lower-cased title with whitespace runs replaced by '-'
    pub fn slug(&self) -> String {
        self.title()
            .to_lowercase()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join("-")
    }
}

impl std::fmt::Display for MenuCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.title())
    }
}

/// Group items into buckets, keeping buckets in first-seen order
pub fn categorize_items(items: &[MenuItem]) -> Vec<(MenuCategory, Vec<MenuItem>)> {
    let mut buckets: Vec<(MenuCategory, Vec<MenuItem>)> = Vec::new();

    for item in items {
        let category = MenuCategory::classify(&item.name);
        match buckets.iter_mut().find(|(c, _)| *c == category) {
            Some((_, bucket)) => bucket.push(item.clone()),
            None => buckets.push((category, vec![item.clone()])),
        }
    }

    buckets
}

/// Turn buckets back into menus with ids derived from `base_id`
pub fn convert_to_menus(categorized: Vec<(MenuCategory, Vec<MenuItem>)>, base_id: &str) -> Vec<Menu> {
    categorized
        .into_iter()
        .map(|(category, items)| Menu {
            id: format!("{}-{}", base_id, category.slug()),
            title: category.title().to_string(),
            items,
        })
        .collect()
}

/// Split one menu into categorized menus
pub fn process_menu(menu: &Menu, base_id: &str) -> Vec<Menu> {
    convert_to_menus(categorize_items(&menu.items), base_id)
}

/// Split every menu of a restaurant, numbering base ids `menu-0`, `menu-1`, ...
pub fn process_restaurant_menus(menus: &[Menu]) -> Vec<Menu> {
    menus
        .iter()
        .enumerate()
        .flat_map(|(index, menu)| process_menu(menu, &format!("menu-{}", index)))
        .collect()
}
