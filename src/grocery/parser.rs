use lazy_static::lazy_static;
use regex::Regex;

/// Unit words recognised after a leading quantity. No conversion happens
/// between them; they only keep "2 cups flour" and "200 g flour" apart.
const UNITS: &[&str] = &[
    "cup", "cups", "tbsp", "tsp", "tablespoon", "tablespoons", "teaspoon", "teaspoons", "g",
    "gram", "grams", "kg", "mg", "ml", "l", "liter", "liters", "litre", "litres", "oz", "ounce",
    "ounces", "lb", "lbs", "pound", "pounds", "pinch", "pinches", "clove", "cloves", "can", "cans",
    "package", "packages", "pkg", "slice", "slices", "bunch", "bunches", "quart", "quarts", "pint",
    "pints", "stick", "sticks", "sprig", "sprigs", "head", "heads", "dash", "dashes", "piece",
    "pieces", "jar", "jars", "bag", "bags",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedIngredient {
    /// As written: "2", "0.5", "1/2", "1 1/2". Defaults to "1".
    pub quantity: String,
    /// Lowercase unit, or empty.
    pub unit: String,
    /// Lowercase item name; the grouping key.
    pub item: String,
    pub original: String,
    /// Whether the line started with a number; "1" is only a default otherwise.
    pub measured: bool,
}

/// Splits "quantity unit item". Best effort: a line without a leading number
/// is one of whatever it names.
pub fn parse_ingredient(line: &str) -> ParsedIngredient {
    lazy_static! {
        static ref LEADING_QTY: Regex =
            Regex::new(r"^(\d+\s+\d+/\d+|\d+/\d+|\d*\.\d+|\d+)\s*(.*)$").unwrap();
    }

    let original = line.trim().to_string();
    let plain = |text: &str| ParsedIngredient {
        quantity: "1".into(),
        unit: String::new(),
        item: text.to_lowercase(),
        original: original.clone(),
        measured: false,
    };

    let Some(caps) = LEADING_QTY.captures(&original) else {
        return plain(&original);
    };
    let quantity = caps[1].split_whitespace().collect::<Vec<_>>().join(" ");
    let rest = caps[2].trim();
    if rest.is_empty() {
        return plain(&original);
    }

    let (unit, item) = match rest.split_once(char::is_whitespace) {
        Some((word, tail)) if is_unit(word) && !tail.trim().is_empty() => {
            let tail = tail.trim();
            let tail = tail.strip_prefix("of ").unwrap_or(tail).trim();
            (word.trim_end_matches('.').to_lowercase(), tail)
        }
        _ => (String::new(), rest),
    };

    ParsedIngredient { quantity, unit, item: item.to_lowercase(), original, measured: true }
}

fn is_unit(word: &str) -> bool {
    let w = word.trim_end_matches('.').to_lowercase();
    UNITS.contains(&w.as_str())
}

/// Numeric value of a quantity string: decimals, "1/2" and "1 1/2".
pub fn quantity_value(quantity: &str) -> Option<f64> {
    let mut total = 0.0;
    let mut parts = 0;
    for part in quantity.split_whitespace() {
        parts += 1;
        total += match part.split_once('/') {
            Some((n, d)) => {
                let d: f64 = d.parse().ok()?;
                if d == 0.0 {
                    return None;
                }
                n.parse::<f64>().ok()? / d
            }
            None => part.parse::<f64>().ok()?,
        };
    }
    (parts > 0 && total.is_finite()).then_some(total)
}

/// Rounded to two decimals without trailing zeros: 4.0 -> "4", 1.50 -> "1.5".
pub fn format_quantity(value: f64) -> String {
    let s = format!("{value:.2}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    s.to_string()
}
