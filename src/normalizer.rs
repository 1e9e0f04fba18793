//! Turns extracted page text into a validated [`RecipeRecord`] with one LLM call.
//!
//! The reply is parsed once. A reply that is not JSON, or that lacks the name, the
//! servings or the ingredient list, is rejected; nothing is retried or repaired.

use crate::config::LanguageConfig;
use crate::error::{ImportError, Result};
use crate::model::{Ingredient, LocalizedText, RecipeRecord, Step};
use crate::providers::{build_system_prompt, field_key, LlmProvider};
use log::{debug, error, warn};
use serde_json::{Map, Value};

pub struct Normalizer {
    provider: Box<dyn LlmProvider>,
    languages: LanguageConfig,
    system_prompt: String,
}

impl Normalizer {
    pub fn new(provider: Box<dyn LlmProvider>, languages: LanguageConfig) -> Self {
        let system_prompt = build_system_prompt(&languages);
        Self {
            provider,
            languages,
            system_prompt,
        }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.provider_name()
    }

    /// Ask the model for a structured recipe. A non-empty `image_hint` replaces
    /// whatever image URL the model reports.
    pub async fn normalize(&self, text: &str, image_hint: Option<&str>) -> Result<RecipeRecord> {
        let mut user_content = text.to_string();
        if let Some(hint) = image_hint {
            user_content.push_str("\n\nImage URL: ");
            user_content.push_str(hint);
        }
        debug!(
            "Sending {} characters to {}",
            user_content.len(),
            self.provider.provider_name()
        );

        let reply = self
            .provider
            .complete(&self.system_prompt, &user_content)
            .await?;
        debug!("Raw completion: {}", reply);

        let mut record = parse_reply(&reply, &self.languages).map_err(|e| {
            error!("Rejected completion: {}", e);
            e
        })?;

        if let Some(hint) = image_hint.map(str::trim).filter(|hint| !hint.is_empty()) {
            record.image_url = hint.to_string();
        }
        Ok(record)
    }
}

/// Parse and validate a completion reply against the recipe contract.
pub fn parse_reply(reply: &str, languages: &LanguageConfig) -> Result<RecipeRecord> {
    let value: Value = serde_json::from_str(strip_code_fence(reply))?;
    let object = value
        .as_object()
        .ok_or_else(|| schema_error("reply is not a JSON object"))?;

    let keys = ReplyKeys::new(languages);

    let name = localized(object, "name", &keys)
        .ok_or_else(|| schema_error(format!("missing \"{}\"", keys.primary("name"))))?;

    let servings = object
        .get("servings")
        .and_then(as_count)
        .ok_or_else(|| schema_error("missing \"servings\""))?;
    if servings < 1 {
        return Err(schema_error("\"servings\" must be at least 1"));
    }
    let servings =
        u32::try_from(servings).map_err(|_| schema_error("\"servings\" is out of range"))?;

    let ingredients = object
        .get("ingredients")
        .and_then(Value::as_array)
        .ok_or_else(|| schema_error("\"ingredients\" must be a list"))?
        .iter()
        .enumerate()
        .map(|(index, item)| parse_ingredient(index, item, &keys))
        .filter_map(Result::transpose)
        .collect::<Result<Vec<_>>>()?;

    let steps = match object.get("steps") {
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(index, item)| parse_step(index, item, &keys))
            .filter_map(Result::transpose)
            .collect::<Result<Vec<_>>>()?,
        Some(Value::Null) | None => Vec::new(),
        Some(_) => return Err(schema_error("\"steps\" must be a list")),
    };

    let image_url = object
        .get("image_url")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .trim()
        .to_string();

    Ok(RecipeRecord {
        name,
        servings,
        total_time: None,
        ingredients,
        steps,
        image_url,
    })
}

struct ReplyKeys<'a> {
    primary: Option<&'a str>,
    secondary: Option<&'a str>,
}

impl<'a> ReplyKeys<'a> {
    fn new(languages: &'a LanguageConfig) -> Self {
        match languages.secondary() {
            Some(secondary) => Self {
                primary: Some(languages.primary.as_str()),
                secondary: Some(secondary),
            },
            None => Self {
                primary: None,
                secondary: None,
            },
        }
    }

    fn primary(&self, base: &str) -> String {
        field_key(base, self.primary)
    }

    fn secondary(&self, base: &str) -> Option<String> {
        self.secondary.map(|lang| field_key(base, Some(lang)))
    }
}

fn localized(object: &Map<String, Value>, base: &str, keys: &ReplyKeys) -> Option<LocalizedText> {
    let primary = non_empty_str(object.get(&keys.primary(base)))?;
    let mut text = LocalizedText::new(primary);
    if let Some(secondary) = keys
        .secondary(base)
        .and_then(|key| non_empty_str(object.get(&key)))
    {
        text = text.with_secondary(secondary);
    }
    Some(text)
}

/// `Ok(None)` for entries without a usable name; those are skipped.
fn parse_ingredient(index: usize, item: &Value, keys: &ReplyKeys) -> Result<Option<Ingredient>> {
    let Some((object, name)) = item
        .as_object()
        .and_then(|object| Some((object, localized(object, "name", keys)?)))
    else {
        warn!(
            "Skipping ingredient {} without \"{}\"",
            index,
            keys.primary("name")
        );
        return Ok(None);
    };

    let quantity = match object.get("quantity") {
        None | Some(Value::Null) => {
            debug!("Ingredient {} has no quantity, storing 0", index);
            0.0
        }
        Some(value) => as_number(value).ok_or_else(|| {
            schema_error(format!("ingredient {index} has a non-numeric quantity"))
        })?,
    };
    if quantity < 0.0 || !quantity.is_finite() {
        return Err(schema_error(format!(
            "ingredient {index} has an invalid quantity {quantity}"
        )));
    }

    let unit = localized(object, "unit", keys).unwrap_or_default();

    Ok(Some(Ingredient {
        name,
        quantity,
        unit,
    }))
}

/// `Ok(None)` for steps without a description; those are skipped.
fn parse_step(index: usize, item: &Value, keys: &ReplyKeys) -> Result<Option<Step>> {
    let description = match item {
        Value::String(text) if !text.trim().is_empty() => Some(LocalizedText::new(text.trim())),
        Value::Object(object) => localized(object, "description", keys),
        _ => None,
    };
    let Some(description) = description else {
        warn!(
            "Skipping step {} without \"{}\"",
            index,
            keys.primary("description")
        );
        return Ok(None);
    };

    let minutes = item
        .get("time")
        .and_then(as_count)
        .filter(|minutes| *minutes >= 0)
        .and_then(|minutes| u32::try_from(minutes).ok());

    Ok(Some(Step {
        description,
        minutes,
    }))
}

/// Models sometimes wrap JSON in a markdown fence despite the instruction.
fn strip_code_fence(reply: &str) -> &str {
    let trimmed = reply.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = rest.split_once('\n').map(|(_, body)| body).unwrap_or("");
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

fn non_empty_str(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().replace(',', ".").parse().ok(),
        _ => None,
    }
}

/// Whole numbers; fractional values are rounded.
fn as_count(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().map(|n| n.round() as i64)),
        Value::String(text) => text.trim().parse::<f64>().ok().map(|n| n.round() as i64),
        _ => None,
    }
}

fn schema_error(message: impl Into<String>) -> ImportError {
    ImportError::LlmSchemaError(message.into())
}
