use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::error::ImportError;

/// Measurement system requested for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitSystem {
    /// Units exactly as the recipe reported them
    #[default]
    Original,
    Metric,
    Imperial,
}

impl FromStr for UnitSystem {
    type Err = ImportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "original" => Ok(UnitSystem::Original),
            "metric" => Ok(UnitSystem::Metric),
            "imperial" => Ok(UnitSystem::Imperial),
            other => Err(ImportError::InvalidOption(format!(
                "unknown unit system '{other}', expected original, metric or imperial"
            ))),
        }
    }
}

impl fmt::Display for UnitSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UnitSystem::Original => "original",
            UnitSystem::Metric => "metric",
            UnitSystem::Imperial => "imperial",
        };
        f.write_str(name)
    }
}

/// One metric/imperial unit pair.
pub struct Conversion {
    pub metric: &'static str,
    pub imperial: &'static str,
    metric_aliases: &'static [&'static str],
    imperial_aliases: &'static [&'static str],
    /// How many metric units make up one imperial unit
    pub metric_per_imperial: f64,
}

/// The only conversion table; every rendering path goes through [`convert_unit`].
pub const CONVERSIONS: &[Conversion] = &[
    Conversion {
        metric: "grams",
        imperial: "ounces",
        metric_aliases: &["grams", "gram", "g", "gr"],
        imperial_aliases: &["ounces", "ounce", "oz"],
        metric_per_imperial: 28.35,
    },
    Conversion {
        metric: "ml",
        imperial: "fl oz",
        metric_aliases: &["ml", "milliliter", "milliliters", "millilitre", "millilitres"],
        imperial_aliases: &["fl oz", "fl. oz", "fl. oz.", "floz", "fluid ounce", "fluid ounces"],
        metric_per_imperial: 29.5735,
    },
    Conversion {
        metric: "liters",
        imperial: "cups",
        metric_aliases: &["liters", "liter", "litres", "litre", "l"],
        imperial_aliases: &["cups", "cup"],
        metric_per_imperial: 1.0 / 4.22675,
    },
];

/// A quantity together with the unit it is expressed in.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Measure {
    pub quantity: f64,
    pub unit: String,
}

/// Round to two decimal places, half away from zero.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Convert `quantity` of `unit` into the `target` system.
///
/// Units outside the table, and units already in the target system, keep their
/// spelling. The returned quantity is always rounded to two decimals.
pub fn convert_unit(quantity: f64, unit: &str, target: UnitSystem) -> Measure {
    let normalized = unit.trim().to_lowercase();

    let converted = CONVERSIONS.iter().find_map(|conversion| match target {
        UnitSystem::Imperial if conversion.metric_aliases.contains(&normalized.as_str()) => Some(
            (quantity / conversion.metric_per_imperial, conversion.imperial),
        ),
        UnitSystem::Metric if conversion.imperial_aliases.contains(&normalized.as_str()) => Some(
            (quantity * conversion.metric_per_imperial, conversion.metric),
        ),
        _ => None,
    });

    let (quantity, unit) = converted.unwrap_or((quantity, unit));
    Measure {
        quantity: round2(quantity),
        unit: unit.to_string(),
    }
}
