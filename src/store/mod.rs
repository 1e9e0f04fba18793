//! SQLite persistence for recipes, their ingredients and steps.
//!
//! Saving is one transaction: the recipe row is upserted by URL, its previous
//! ingredients and steps are deleted and the new ones inserted. If anything fails the
//! transaction is dropped without commit and any image written for it is removed again.

mod images;
mod schema;

pub use images::{file_name_for, ImageCache};

use crate::error::{ImportError, Result};
use crate::model::{Ingredient, LocalizedText, Recipe, RecipeRecord, RecipeSummary, Step};
use log::{debug, info};
use rusqlite::{params, Connection, OptionalExtension, Transaction, TransactionBehavior};
use std::path::{Path, PathBuf};

/// Image bytes already downloaded for a recipe.
pub struct DownloadedImage<'a> {
    pub url: &'a str,
    pub bytes: &'a [u8],
}

/// Result of [`Store::save`].
#[derive(Debug, Clone, PartialEq)]
pub struct SavedRecipe {
    pub id: i64,
    /// Full path of the cached image inside the images directory
    pub image_path: Option<String>,
}

pub struct Store {
    conn: Connection,
    images: ImageCache,
}

impl Store {
    /// Open (and create if needed) the database at `path`.
    pub fn open(path: impl AsRef<Path>, images_dir: impl Into<PathBuf>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Opening database {}", path.display());
        Self::with_connection(Connection::open(path)?, images_dir)
    }

    pub fn open_in_memory(images_dir: impl Into<PathBuf>) -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?, images_dir)
    }

    fn with_connection(conn: Connection, images_dir: impl Into<PathBuf>) -> Result<Self> {
        conn.execute_batch(schema::SCHEMA)?;
        Ok(Self {
            conn,
            images: ImageCache::new(images_dir),
        })
    }

    /// Full path of a stored image name, as shown to callers.
    fn image_file(&self, name: &str) -> String {
        self.images.path(name).to_string_lossy().into_owned()
    }

    /// Insert or replace the recipe stored for `url`.
    ///
    /// The image, if given, is written first; a write failure aborts the save.
    pub fn save(
        &mut self,
        url: &str,
        record: &RecipeRecord,
        image: Option<DownloadedImage<'_>>,
    ) -> Result<SavedRecipe> {
        let written = image
            .map(|image| self.images.store(image.url, image.bytes))
            .transpose()?;

        match write_recipe(&mut self.conn, url, record, written.as_deref()) {
            Ok((saved, previous_image)) => {
                if let Some(previous) = previous_image {
                    if saved.image_path.as_deref() != Some(previous.as_str()) {
                        self.images.remove(&previous);
                    }
                }
                info!(
                    "Saved recipe {} ({} ingredients, {} steps) for {}",
                    saved.id,
                    record.ingredients.len(),
                    record.steps.len(),
                    url
                );
                Ok(SavedRecipe {
                    id: saved.id,
                    image_path: saved.image_path.map(|name| self.image_file(&name)),
                })
            }
            Err(e) => {
                debug!("Saving {} failed, rolling back: {}", url, e);
                if let Some(path) = &written {
                    self.images.remove(path);
                }
                Err(e.into())
            }
        }
    }

    /// All recipes, newest first.
    pub fn list(&self) -> Result<Vec<RecipeSummary>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name_primary, name_secondary, servings, created_at
             FROM recipes ORDER BY created_at DESC, id DESC",
        )?;
        let summaries = stmt
            .query_map([], |row| {
                Ok(RecipeSummary {
                    id: row.get(0)?,
                    name: localized(row.get(1)?, row.get(2)?),
                    servings: row.get(3)?,
                    created_at: row.get(4)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(summaries)
    }

    pub fn find_by_url(&self, url: &str) -> Result<Option<i64>> {
        Ok(self
            .conn
            .query_row("SELECT id FROM recipes WHERE url = ?1", [url], |row| {
                row.get(0)
            })
            .optional()?)
    }

    /// A recipe with its ingredients and steps in insertion order.
    pub fn get(&self, id: i64) -> Result<Recipe> {
        let recipe = self
            .conn
            .query_row(
                "SELECT id, url, name_primary, name_secondary, servings, total_time, image_path, created_at
                 FROM recipes WHERE id = ?1",
                [id],
                |row| {
                    Ok(Recipe {
                        id: row.get(0)?,
                        url: row.get(1)?,
                        name: localized(row.get(2)?, row.get(3)?),
                        servings: row.get(4)?,
                        total_time: row.get(5)?,
                        image_path: row.get(6)?,
                        created_at: row.get(7)?,
                        ingredients: Vec::new(),
                        steps: Vec::new(),
                    })
                },
            )
            .optional()?;
        let mut recipe = recipe.ok_or(ImportError::NotFound(id))?;
        recipe.image_path = recipe.image_path.map(|name| self.image_file(&name));

        let mut stmt = self.conn.prepare(
            "SELECT name_primary, name_secondary, quantity, unit_primary, unit_secondary
             FROM ingredients WHERE recipe_id = ?1 ORDER BY id",
        )?;
        recipe.ingredients = stmt
            .query_map([id], |row| {
                Ok(Ingredient {
                    name: localized(row.get(0)?, row.get(1)?),
                    quantity: row.get(2)?,
                    unit: localized(row.get(3)?, row.get(4)?),
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut stmt = self.conn.prepare(
            "SELECT description_primary, description_secondary, minutes
             FROM steps WHERE recipe_id = ?1 ORDER BY position",
        )?;
        recipe.steps = stmt
            .query_map([id], |row| {
                Ok(Step {
                    description: localized(row.get(0)?, row.get(1)?),
                    minutes: row.get(2)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(recipe)
    }

    /// Delete a recipe, its ingredients and steps, and its cached image.
    /// Returns `false` when no such recipe exists.
    pub fn delete(&mut self, id: i64) -> Result<bool> {
        let tx = self.conn.transaction()?;
        let image_path: Option<Option<String>> = tx
            .query_row("SELECT image_path FROM recipes WHERE id = ?1", [id], |row| {
                row.get(0)
            })
            .optional()?;
        let Some(image_path) = image_path else {
            debug!("Recipe {} does not exist, nothing to delete", id);
            return Ok(false);
        };

        tx.execute("DELETE FROM recipes WHERE id = ?1", [id])?;
        tx.commit()?;

        if let Some(name) = image_path {
            self.images.remove(&name);
        }
        info!("Deleted recipe {}", id);
        Ok(true)
    }
}

fn localized(primary: String, secondary: Option<String>) -> LocalizedText {
    LocalizedText { primary, secondary }
}

/// Returns the saved recipe and the image path it had before this save.
fn write_recipe(
    conn: &mut Connection,
    url: &str,
    record: &RecipeRecord,
    image_path: Option<&str>,
) -> rusqlite::Result<(SavedRecipe, Option<String>)> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let previous_image: Option<String> = tx
        .query_row(
            "SELECT image_path FROM recipes WHERE url = ?1",
            [url],
            |row| row.get(0),
        )
        .optional()?
        .flatten();

    let (id, stored_image): (i64, Option<String>) = tx.query_row(
        schema::UPSERT_RECIPE,
        params![
            url,
            record.name.primary,
            record.name.secondary,
            record.servings,
            record.total_time,
            image_path,
        ],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;

    replace_children(&tx, id, record)?;
    tx.commit()?;

    Ok((
        SavedRecipe {
            id,
            image_path: stored_image,
        },
        previous_image,
    ))
}

fn replace_children(tx: &Transaction<'_>, id: i64, record: &RecipeRecord) -> rusqlite::Result<()> {
    tx.execute("DELETE FROM ingredients WHERE recipe_id = ?1", [id])?;
    tx.execute("DELETE FROM steps WHERE recipe_id = ?1", [id])?;

    let mut insert_ingredient = tx.prepare(schema::INSERT_INGREDIENT)?;
    for ingredient in &record.ingredients {
        insert_ingredient.execute(params![
            id,
            ingredient.name.primary,
            ingredient.name.secondary,
            ingredient.quantity,
            ingredient.unit.primary,
            ingredient.unit.secondary,
        ])?;
    }

    let mut insert_step = tx.prepare(schema::INSERT_STEP)?;
    for (position, step) in record.steps.iter().enumerate() {
        insert_step.execute(params![
            id,
            position as i64,
            step.description.primary,
            step.description.secondary,
            step.minutes,
        ])?;
    }
    Ok(())
}
