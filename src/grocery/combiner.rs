use super::parser::{format_quantity, quantity_value, ParsedIngredient};

/// One shopping-list line after merging every occurrence of an item.
#[derive(Debug, Clone, PartialEq)]
pub enum CombinedItem {
    /// All occurrences so far shared a unit and had numeric quantities.
    Measured {
        quantity: String,
        unit: String,
        item: String,
        /// Source line when the entry came from a single occurrence.
        original: Option<String>,
        /// False when the quantity is only the default "1".
        measured: bool,
    },
    /// Occurrences that could not be summed, kept as written.
    Listed { item: String, parts: Vec<String> },
}

impl CombinedItem {
    fn from_parsed(p: ParsedIngredient) -> Self {
        CombinedItem::Measured {
            quantity: p.quantity,
            unit: p.unit,
            item: p.item,
            original: Some(p.original),
            measured: p.measured,
        }
    }

    pub fn item(&self) -> &str {
        match self {
            CombinedItem::Measured { item, .. } | CombinedItem::Listed { item, .. } => item,
        }
    }

    fn absorb(&mut self, next: ParsedIngredient) {
        match self {
            CombinedItem::Measured { quantity, unit, item, original, measured } => {
                if *measured && next.measured && *unit == next.unit {
                    if let (Some(a), Some(b)) = (quantity_value(quantity), quantity_value(&next.quantity)) {
                        *quantity = format_quantity(a + b);
                        *original = None;
                        return;
                    }
                }
                let first = original.clone().unwrap_or_else(|| format_line(quantity, unit, item));
                let item = item.clone();
                *self = CombinedItem::Listed { item, parts: vec![first, next.original] };
            }
            CombinedItem::Listed { parts, .. } => parts.push(next.original),
        }
    }

    /// Display form: "4 cups flour", "2 avocado", "salt", or the kept
    /// originals joined with ", ".
    pub fn render(&self) -> String {
        match self {
            CombinedItem::Measured { quantity, unit, item, .. } => format_line(quantity, unit, item),
            CombinedItem::Listed { parts, .. } => parts.join(", "),
        }
    }
}

fn format_line(quantity: &str, unit: &str, item: &str) -> String {
    if !unit.is_empty() {
        format!("{quantity} {unit} {item}")
    } else if quantity == "1" {
        item.to_string()
    } else {
        format!("{quantity} {item}")
    }
}

/// Merges parsed ingredients by item name, keeping first-seen order.
///
/// Same unit and numeric quantities are summed; anything else is kept as
/// the original lines. Plural and singular names are different items.
pub fn combine(parsed: impl IntoIterator<Item = ParsedIngredient>) -> Vec<CombinedItem> {
    let mut out: Vec<CombinedItem> = Vec::new();
    for p in parsed {
        match out.iter_mut().find(|c| c.item() == p.item) {
            Some(existing) => existing.absorb(p),
            None => out.push(CombinedItem::from_parsed(p)),
        }
    }
    out
}
