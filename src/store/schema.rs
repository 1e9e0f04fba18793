/// Tables are created idempotently on every open.
pub const SCHEMA: &str = "
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS recipes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    url TEXT NOT NULL UNIQUE,
    name_primary TEXT NOT NULL,
    name_secondary TEXT,
    servings INTEGER NOT NULL CHECK (servings >= 1),
    total_time INTEGER,
    image_path TEXT,
    created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
);

CREATE TABLE IF NOT EXISTS ingredients (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    recipe_id INTEGER NOT NULL REFERENCES recipes(id) ON DELETE CASCADE,
    name_primary TEXT NOT NULL,
    name_secondary TEXT,
    quantity REAL NOT NULL CHECK (quantity >= 0),
    unit_primary TEXT NOT NULL,
    unit_secondary TEXT
);

CREATE TABLE IF NOT EXISTS steps (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    recipe_id INTEGER NOT NULL REFERENCES recipes(id) ON DELETE CASCADE,
    position INTEGER NOT NULL,
    description_primary TEXT NOT NULL,
    description_secondary TEXT,
    minutes INTEGER
);

CREATE INDEX IF NOT EXISTS idx_ingredients_recipe ON ingredients(recipe_id);
CREATE INDEX IF NOT EXISTS idx_steps_recipe ON steps(recipe_id, position);
";

/// Single-statement upsert keyed by the unique URL. A missing image keeps the
/// previously cached one.
pub const UPSERT_RECIPE: &str = "
INSERT INTO recipes (url, name_primary, name_secondary, servings, total_time, image_path)
VALUES (?1, ?2, ?3, ?4, ?5, ?6)
ON CONFLICT(url) DO UPDATE SET
    name_primary = excluded.name_primary,
    name_secondary = excluded.name_secondary,
    servings = excluded.servings,
    total_time = excluded.total_time,
    image_path = COALESCE(excluded.image_path, recipes.image_path)
RETURNING id, image_path";

pub const INSERT_INGREDIENT: &str = "
INSERT INTO ingredients (recipe_id, name_primary, name_secondary, quantity, unit_primary, unit_secondary)
VALUES (?1, ?2, ?3, ?4, ?5, ?6)";

pub const INSERT_STEP: &str = "
INSERT INTO steps (recipe_id, position, description_primary, description_secondary, minutes)
VALUES (?1, ?2, ?3, ?4, ?5)";
