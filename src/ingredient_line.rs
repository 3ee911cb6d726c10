//! # Ingredient Line Parser
//!
//! Splits a free-text ingredient line such as "2 1/4 cups flour" into an
//! amount, a unit and the ingredient name. Generated recipes usually come back
//! with quantity-bearing lines, and the name alone is what gets scored.
//!
//! ```rust
//! use pantry_recipes::ingredient_line::parse_ingredient_line;
//!
//! let line = parse_ingredient_line("1/2 cup sugar");
//! assert_eq!(line.amount, Some(0.5));
//! assert_eq!(line.unit, "cup");
//! assert_eq!(line.name, "sugar");
//! ```

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

/// Leading quantity: "2", "1.5", "1/2", "2 1/4", "2-3"
static QUANTITY_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<qty>\d+\s+\d+/\d+|\d+/\d+|\d+(?:\.\d+)?(?:\s*-\s*\d+(?:\.\d+)?)?)\s+(?P<rest>.+)$")
        .expect("Quantity prefix pattern should be valid")
});

/// Units recognised directly after a quantity
static KNOWN_UNITS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "tsp", "teaspoon", "teaspoons", "tbsp", "tablespoon", "tablespoons", "cup", "cups",
        "pint", "pints", "quart", "quarts", "gallon", "gallons", "ml", "l", "liter", "liters",
        "litre", "litres", "oz", "ounce", "ounces", "lb", "lbs", "pound", "pounds", "g", "gram",
        "grams", "kg", "kilogram", "kilograms", "pinch", "pinches", "dash", "dashes", "clove",
        "cloves", "can", "cans", "package", "packages", "pkg", "slice", "slices", "piece",
        "pieces", "bunch", "handful", "stick", "sticks",
    ]
    .into_iter()
    .collect()
});

/// One parsed ingredient line
#[derive(Debug, Clone, PartialEq)]
pub struct IngredientLine {
    pub amount: Option<f64>,
    pub unit: String,
    pub name: String,
}

/// Parse a single ingredient line; lines without a leading quantity keep their full text as the name
pub fn parse_ingredient_line(line: &str) -> IngredientLine {
    let line = line.trim();

    let Some(captures) = QUANTITY_PREFIX.captures(line) else {
        return IngredientLine {
            amount: None,
            unit: String::new(),
            name: line.to_string(),
        };
    };

    let amount = parse_amount(&captures["qty"]);
    let rest = captures["rest"].trim();

    let mut words = rest.splitn(2, char::is_whitespace);
    let first = words.next().unwrap_or_default();
    let remainder = words.next().map(str::trim).unwrap_or_default();
    let unit_candidate = first.trim_end_matches('.').to_lowercase();

    if KNOWN_UNITS.contains(unit_candidate.as_str()) && !remainder.is_empty() {
        IngredientLine {
            amount,
            unit: unit_candidate,
            name: strip_of(remainder).to_string(),
        }
    } else {
        IngredientLine {
            amount,
            unit: String::new(),
            name: rest.to_string(),
        }
    }
}

/// "2 cups of rice" names the rice, not "of rice"
fn strip_of(name: &str) -> &str {
    name.strip_prefix("of ").unwrap_or(name).trim()
}

fn parse_amount(qty: &str) -> Option<f64> {
    let qty = qty.trim();

    if let Some((low, high)) = qty.split_once('-') {
        let low: f64 = low.trim().parse().ok()?;
        let high: f64 = high.trim().parse().ok()?;
        return Some((low + high) / 2.0);
    }

    let mut total = 0.0;
    for part in qty.split_whitespace() {
        total += match part.split_once('/') {
            Some((numerator, denominator)) => {
                let numerator: f64 = numerator.parse().ok()?;
                let denominator: f64 = denominator.parse().ok()?;
                if denominator == 0.0 {
                    return None;
                }
                numerator / denominator
            }
            None => part.parse::<f64>().ok()?,
        };
    }
    Some(total)
}

/// Round an amount to two decimals for display
pub fn round_amount(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// Render an amount without trailing zeros ("2", "0.5", "1.25")
pub fn format_amount(amount: f64) -> String {
    let rounded = round_amount(amount);
    if rounded.fract() == 0.0 {
        format!("{}", rounded as i64)
    } else {
        format!("{rounded}")
    }
}
