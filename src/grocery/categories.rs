use std::fmt;

use serde::{Deserialize, Serialize};

/// Shopping-aisle grouping. Declaration order is the display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Produce,
    Meat,
    Dairy,
    Pantry,
    CannedGoods,
    Frozen,
    Bakery,
    Other,
}

impl Category {
    pub const ALL: [Category; 8] = [
        Category::Produce,
        Category::Meat,
        Category::Dairy,
        Category::Pantry,
        Category::CannedGoods,
        Category::Frozen,
        Category::Bakery,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Produce => "produce",
            Category::Meat => "meat",
            Category::Dairy => "dairy",
            Category::Pantry => "pantry",
            Category::CannedGoods => "canned_goods",
            Category::Frozen => "frozen",
            Category::Bakery => "bakery",
            Category::Other => "other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Checked top to bottom; the first keyword contained in the item wins.
const KEYWORDS: &[(Category, &[&str])] = &[
    (
        Category::Produce,
        &[
            "onion", "garlic", "tomato", "lettuce", "carrot", "potato", "bell pepper", "mushroom",
            "spinach", "broccoli", "cucumber", "celery", "lemon", "lime", "avocado", "herbs",
            "parsley", "cilantro", "basil",
        ],
    ),
    (
        Category::Meat,
        &["chicken", "beef", "pork", "turkey", "fish", "salmon", "shrimp", "ground beef", "ground turkey"],
    ),
    (Category::Dairy, &["milk", "cheese", "butter", "yogurt", "cream", "eggs", "sour cream"]),
    (
        Category::Pantry,
        &[
            "rice", "pasta", "flour", "sugar", "salt", "pepper", "oil", "vinegar", "soy sauce",
            "garlic powder", "onion powder", "paprika", "cumin", "oregano", "thyme", "bay leaves",
        ],
    ),
    (
        Category::CannedGoods,
        &["tomatoes", "beans", "broth", "stock", "coconut milk", "tomato paste", "corn", "diced tomatoes"],
    ),
    (Category::Frozen, &["peas", "corn", "berries", "ice cream"]),
    (Category::Bakery, &["bread", "tortillas", "bagels"]),
];

/// Keyword substring match against a lowercase item name.
pub fn classify(item: &str) -> Category {
    let item = item.to_lowercase();
    KEYWORDS
        .iter()
        .find(|(_, words)| words.iter().any(|w| item.contains(w)))
        .map_or(Category::Other, |(category, _)| *category)
}
