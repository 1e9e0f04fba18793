use serde::{Deserialize, Serialize};

/// A piece of text in the primary language and, optionally, its translation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocalizedText {
    pub primary: String,
    pub secondary: Option<String>,
}

impl LocalizedText {
    pub fn new(primary: impl Into<String>) -> Self {
        Self {
            primary: primary.into(),
            secondary: None,
        }
    }

    pub fn with_secondary(mut self, secondary: impl Into<String>) -> Self {
        self.secondary = Some(secondary.into());
        self
    }

    /// The requested variant, falling back to the primary text when no translation exists.
    pub fn get(&self, variant: Variant) -> &str {
        match variant {
            Variant::Primary => &self.primary,
            Variant::Secondary => self.secondary.as_deref().unwrap_or(&self.primary),
        }
    }
}

/// Which side of a [`LocalizedText`] to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Variant {
    #[default]
    Primary,
    Secondary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    pub name: LocalizedText,
    /// Never negative
    pub quantity: f64,
    /// Unit as the recipe reported it, kept so it can be converted again later
    pub unit: LocalizedText,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub description: LocalizedText,
    pub minutes: Option<u32>,
}

/// A recipe as returned by the normalizer, before it has an identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeRecord {
    pub name: LocalizedText,
    /// Always at least 1
    pub servings: u32,
    pub total_time: Option<u32>,
    pub ingredients: Vec<Ingredient>,
    pub steps: Vec<Step>,
    /// Remote image to cache; empty when unknown
    pub image_url: String,
}

/// A persisted recipe with its ingredients and steps in insertion order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recipe {
    pub id: i64,
    pub url: String,
    pub name: LocalizedText,
    pub servings: u32,
    pub total_time: Option<u32>,
    /// Path of the cached image file inside the images directory
    pub image_path: Option<String>,
    pub created_at: String,
    pub ingredients: Vec<Ingredient>,
    pub steps: Vec<Step>,
}

/// One row of the recipe list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecipeSummary {
    pub id: i64,
    pub name: LocalizedText,
    pub servings: u32,
    pub created_at: String,
}
