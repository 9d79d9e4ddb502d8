use std::collections::BTreeMap;

use super::categories::{classify, Category};
use super::combiner::{combine, CombinedItem};
use super::parser::parse_ingredient;
use crate::meal_plans::{Day, DayEntry};

pub type GroceryItems = BTreeMap<Category, Vec<String>>;

/// Ingredient lines of every cooked day, in day order. Title-only and
/// no-cooking days contribute nothing.
pub fn collect_ingredients(meals: &BTreeMap<Day, DayEntry>) -> Vec<&str> {
    meals
        .values()
        .filter_map(DayEntry::recipe)
        .flat_map(|r| r.ingredients.iter().map(String::as_str))
        .filter(|line| !line.trim().is_empty())
        .collect()
}

/// Parse, combine, classify and format a week's ingredients.
///
/// Pure and deterministic: every category is present and each list is
/// sorted, so the same plan always yields the same output.
pub fn build_items(meals: &BTreeMap<Day, DayEntry>) -> GroceryItems {
    let mut items: GroceryItems = Category::ALL.into_iter().map(|c| (c, Vec::new())).collect();

    let combined = combine(collect_ingredients(meals).into_iter().map(parse_ingredient));
    for entry in &combined {
        items
            .entry(classify(entry.item()))
            .or_default()
            .push(CombinedItem::render(entry));
    }
    for list in items.values_mut() {
        list.sort();
    }
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meal_plans::repo_types::Recipe;
    use serde_json::json;

    fn cooked(ingredients: &[&str]) -> DayEntry {
        let recipe: Recipe =
            serde_json::from_value(json!({"name": "Dish", "ingredients": ingredients})).unwrap();
        DayEntry::CookedMeal { date: None, recipe }
    }

    #[test]
    fn empty_plan_has_every_category_empty() {
        let items = build_items(&BTreeMap::new());
        assert_eq!(items.len(), 8);
        assert!(items.values().all(Vec::is_empty));
        let keys: Vec<_> = serde_json::to_value(&items).unwrap().as_object().unwrap().keys().cloned().collect();
        assert!(keys.contains(&"canned_goods".to_string()));
    }

    #[test]
    fn flour_from_two_recipes_is_summed_under_pantry() {
        let meals = BTreeMap::from([
            (Day::Monday, cooked(&["2 cups flour", "1 lb chicken breast"])),
            (Day::Thursday, cooked(&["2 cups flour"])),
        ]);
        let items = build_items(&meals);
        assert_eq!(items[&Category::Pantry], vec!["4 cups flour"]);
        assert_eq!(items[&Category::Meat], vec!["1 lb chicken breast"]);
    }

    #[test]
    fn avocado_and_avocados_stay_separate() {
        let meals = BTreeMap::from([(Day::Sunday, cooked(&["1 avocado", "3 avocados"]))]);
        assert_eq!(build_items(&meals)[&Category::Produce], vec!["3 avocados", "avocado"]);
    }

    #[test]
    fn pinch_of_salt_and_unknowns() {
        let meals = BTreeMap::from([(Day::Sunday, cooked(&["a pinch of salt", "2 sprigs rosemary"]))]);
        let items = build_items(&meals);
        assert_eq!(items[&Category::Pantry], vec!["a pinch of salt"]);
        assert_eq!(items[&Category::Other], vec!["2 sprigs rosemary"]);
    }

    #[test]
    fn title_and_no_cooking_days_contribute_nothing() {
        let meals = BTreeMap::from([
            (Day::Friday, DayEntry::from_title("Dining Out", None)),
            (Day::Saturday, DayEntry::from_title("Herb Roasted Chicken", None)),
        ]);
        assert!(collect_ingredients(&meals).is_empty());
        assert!(build_items(&meals).values().all(Vec::is_empty));
    }

    #[test]
    fn building_twice_is_identical() {
        let meals = BTreeMap::from([
            (Day::Monday, cooked(&["2 cups flour", "1 onion", "200 g flour", "1 can beans"])),
            (Day::Tuesday, cooked(&["3 eggs", "1 onion", "1 tbsp olive oil"])),
        ]);
        let a = serde_json::to_string(&build_items(&meals)).unwrap();
        let b = serde_json::to_string(&build_items(&meals)).unwrap();
        assert_eq!(a, b);
        assert!(a.contains("2 cups flour, 200 g flour"));
        assert!(a.contains("2 onion"));
    }
}
