use crate::config::LanguageConfig;
use crate::error::{ImportError, Result};
use crate::model::{Recipe, RecipeSummary, Variant};
use crate::units::{convert_unit, round2, UnitSystem};
use serde::Serialize;
use std::fmt;

/// How a stored recipe should be shown.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DisplayOptions {
    /// Servings to scale to; `None` keeps the recipe's own count
    pub servings: Option<u32>,
    pub units: UnitSystem,
    pub variant: Variant,
}

impl DisplayOptions {
    /// Build options from the raw tokens a user typed.
    pub fn from_tokens(
        servings: Option<u32>,
        units: Option<&str>,
        language: Option<&str>,
        languages: &LanguageConfig,
    ) -> Result<Self> {
        if servings == Some(0) {
            return Err(ImportError::InvalidOption(
                "servings must be at least 1".to_string(),
            ));
        }
        let units = units
            .map(str::parse::<UnitSystem>)
            .transpose()?
            .unwrap_or_default();
        let variant = language
            .map(|token| language_variant(token, languages))
            .transpose()?
            .unwrap_or_default();

        Ok(Self {
            servings,
            units,
            variant,
        })
    }
}

/// Map a language code to the stored variant holding it.
pub fn language_variant(token: &str, languages: &LanguageConfig) -> Result<Variant> {
    let token = token.trim();
    if token.eq_ignore_ascii_case(&languages.primary) {
        return Ok(Variant::Primary);
    }
    match languages.secondary() {
        Some(secondary) if token.eq_ignore_ascii_case(secondary) => Ok(Variant::Secondary),
        _ => Err(ImportError::InvalidOption(format!(
            "unknown language '{token}', expected {}",
            std::iter::once(languages.primary.as_str())
                .chain(languages.secondary())
                .collect::<Vec<_>>()
                .join(" or ")
        ))),
    }
}

/// Scale a quantity from the recipe's servings to the desired servings.
pub fn scale_quantity(quantity: f64, original_servings: u32, desired_servings: u32) -> f64 {
    if original_servings == 0 || original_servings == desired_servings {
        return quantity;
    }
    quantity * (f64::from(desired_servings) / f64::from(original_servings))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngredientView {
    pub name: String,
    pub quantity: f64,
    pub unit: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepView {
    pub description: String,
    pub minutes: Option<u32>,
}

/// A recipe ready to print: one language, scaled and converted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecipeView {
    pub id: i64,
    pub url: String,
    pub name: String,
    pub servings: u32,
    pub original_servings: u32,
    pub units: UnitSystem,
    pub total_time: Option<u32>,
    pub image_path: Option<String>,
    pub ingredients: Vec<IngredientView>,
    pub steps: Vec<StepView>,
}

impl RecipeView {
    pub fn new(recipe: &Recipe, options: &DisplayOptions) -> Self {
        let servings = options.servings.unwrap_or(recipe.servings);

        let ingredients = recipe
            .ingredients
            .iter()
            .map(|ingredient| {
                let unit = ingredient.unit.get(options.variant);
                let quantity = scale_quantity(ingredient.quantity, recipe.servings, servings);
                let (quantity, unit) = match options.units {
                    UnitSystem::Original => (round2(quantity), unit.to_string()),
                    target => {
                        let measure = convert_unit(quantity, unit, target);
                        (measure.quantity, measure.unit)
                    }
                };
                IngredientView {
                    name: ingredient.name.get(options.variant).to_string(),
                    quantity,
                    unit,
                }
            })
            .collect();

        let steps = recipe
            .steps
            .iter()
            .map(|step| StepView {
                description: step.description.get(options.variant).to_string(),
                minutes: step.minutes,
            })
            .collect();

        Self {
            id: recipe.id,
            url: recipe.url.clone(),
            name: recipe.name.get(options.variant).to_string(),
            servings,
            original_servings: recipe.servings,
            units: options.units,
            total_time: recipe.total_time,
            image_path: recipe.image_path.clone(),
            ingredients,
            steps,
        }
    }
}

fn format_quantity(quantity: f64) -> String {
    let text = format!("{quantity:.2}");
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}

impl fmt::Display for RecipeView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.name)?;
        writeln!(f, "Original recipe: {}", self.url)?;
        if let Some(path) = &self.image_path {
            writeln!(f, "Image: {path}")?;
        }
        write!(f, "Servings: {}", self.servings)?;
        if self.servings != self.original_servings {
            write!(f, " (originally {})", self.original_servings)?;
        }
        writeln!(f)?;
        if let Some(minutes) = self.total_time {
            writeln!(f, "Total time: {minutes} minutes")?;
        }

        writeln!(f)?;
        writeln!(f, "Ingredients:")?;
        for ingredient in &self.ingredients {
            let quantity = format_quantity(ingredient.quantity);
            if ingredient.unit.is_empty() {
                writeln!(f, "- {} {}", quantity, ingredient.name)?;
            } else {
                writeln!(f, "- {} {} {}", quantity, ingredient.unit, ingredient.name)?;
            }
        }

        if !self.steps.is_empty() {
            writeln!(f)?;
            writeln!(f, "Cooking steps:")?;
            for (number, step) in self.steps.iter().enumerate() {
                match step.minutes {
                    Some(minutes) => {
                        writeln!(f, "{}. {} ({} minutes)", number + 1, step.description, minutes)?
                    }
                    None => writeln!(f, "{}. {}", number + 1, step.description)?,
                }
            }
        }
        Ok(())
    }
}

/// One line per saved recipe, newest first.
pub fn render_list(summaries: &[RecipeSummary], variant: Variant) -> String {
    if summaries.is_empty() {
        return "No recipes saved yet.\n".to_string();
    }
    summaries
        .iter()
        .map(|summary| {
            format!(
                "{:>4}  {} ({} servings)\n",
                summary.id,
                summary.name.get(variant),
                summary.servings
            )
        })
        .collect()
}
