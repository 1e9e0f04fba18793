use html_escape::decode_html_entities;
use log::debug;
use scraper::{Html, Selector};
use serde_json::Value;

/// The fields a JSON-LD recipe must provide before it is trusted over the page text.
#[derive(Debug, Clone, PartialEq)]
pub struct StructuredRecipe {
    pub name: String,
    pub servings: u32,
    pub ingredients: Vec<String>,
    pub total_time: Option<u32>,
}

impl StructuredRecipe {
    /// Canonical plain-text block handed to the normalizer.
    pub fn to_text(&self) -> String {
        let mut text = format!(
            "Recipe Name: {}\nServings: {}\nIngredients:\n",
            self.name, self.servings
        );
        for ingredient in &self.ingredients {
            text.push_str("- ");
            text.push_str(ingredient);
            text.push('\n');
        }
        text
    }
}

pub struct JsonLdExtractor;

impl JsonLdExtractor {
    /// Return the first recipe object in the page's JSON-LD blocks that has a name,
    /// a yield and at least one ingredient.
    pub fn parse(&self, document: &Html) -> Option<StructuredRecipe> {
        let selector =
            Selector::parse("script[type='application/ld+json']").expect("valid selector");

        for (index, script) in document.select(&selector).enumerate() {
            let raw_json = script.text().collect::<String>();
            let json_ld = match parse_json_ld(&raw_json) {
                Some(value) => value,
                None => {
                    debug!("JsonLdExtractor: script {} is not valid JSON", index);
                    continue;
                }
            };

            let mut candidates = Vec::new();
            collect_candidates(&json_ld, &mut candidates);

            for candidate in candidates.into_iter().filter(|item| is_recipe_type(item)) {
                match structured_recipe(candidate) {
                    Some(recipe) => {
                        debug!("JsonLdExtractor: found recipe {:?}", recipe.name);
                        return Some(recipe);
                    }
                    None => debug!(
                        "JsonLdExtractor: recipe object in script {} lacks name, yield or ingredients",
                        index
                    ),
                }
            }
        }

        debug!("JsonLdExtractor: no complete recipe object found");
        None
    }
}

fn parse_json_ld(raw: &str) -> Option<Value> {
    serde_json::from_str(raw.trim())
        .or_else(|_| serde_json::from_str(&sanitize_json(raw)))
        .ok()
}

fn sanitize_json(json_str: &str) -> String {
    let mut cleaned = json_str
        .trim()
        .trim_start_matches("<![CDATA[")
        .trim_end_matches("]]>")
        .replace("<!--", "")
        .replace("-->", "");

    // Some sites put text in front of the object
    if !cleaned.starts_with('{') && !cleaned.starts_with('[') {
        if let Some(start) = cleaned.find(['{', '[']) {
            cleaned = cleaned[start..].to_string();
        }
    }

    // Trailing commas are the most common breakage
    let mut result = String::with_capacity(cleaned.len());
    let mut in_string = false;
    let mut escaped = false;
    let chars: Vec<char> = cleaned.chars().collect();
    for (i, &c) in chars.iter().enumerate() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            result.push(c);
            continue;
        }
        match c {
            '"' => {
                in_string = true;
                result.push(c);
            }
            ',' => {
                let next = chars[i + 1..].iter().find(|c| !c.is_whitespace());
                if !matches!(next, Some(']') | Some('}')) {
                    result.push(c);
                }
            }
            _ => result.push(c),
        }
    }
    result
}

/// Objects that may hold a recipe: the root, items of a top-level array and items of
/// an `@graph` collection, in document order.
fn collect_candidates<'a>(value: &'a Value, out: &mut Vec<&'a Value>) {
    match value {
        Value::Array(items) => {
            for item in items {
                collect_candidates(item, out);
            }
        }
        Value::Object(map) => {
            out.push(value);
            if let Some(graph) = map.get("@graph") {
                collect_candidates(graph, out);
            }
        }
        _ => {}
    }
}

fn is_recipe_type(value: &Value) -> bool {
    match value.get("@type") {
        Some(Value::String(type_str)) => type_str.eq_ignore_ascii_case("recipe"),
        Some(Value::Array(types)) => types
            .iter()
            .filter_map(Value::as_str)
            .any(|type_str| type_str.eq_ignore_ascii_case("recipe")),
        _ => false,
    }
}

fn structured_recipe(value: &Value) -> Option<StructuredRecipe> {
    let name = value
        .get("name")
        .and_then(Value::as_str)
        .map(decode_html_symbols)
        .filter(|name| !name.trim().is_empty())?;

    let servings = value.get("recipeYield").and_then(parse_yield)?;

    let ingredients: Vec<String> = match value.get("recipeIngredient") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(decode_html_symbols)
            .map(|ingredient| ingredient.trim().to_string())
            .filter(|ingredient| !ingredient.is_empty())
            .collect(),
        Some(Value::String(single)) if !single.trim().is_empty() => {
            vec![decode_html_symbols(single).trim().to_string()]
        }
        _ => Vec::new(),
    };
    if ingredients.is_empty() {
        return None;
    }

    let total_time = value
        .get("totalTime")
        .and_then(Value::as_str)
        .and_then(duration_minutes);

    Some(StructuredRecipe {
        name: name.trim().to_string(),
        servings,
        ingredients,
        total_time,
    })
}

/// Servings from `recipeYield`: the leading integer of a string, the first list entry
/// that has one, or a plain number.
pub fn parse_yield(value: &Value) -> Option<u32> {
    match value {
        Value::String(text) => leading_integer(text),
        Value::Number(number) => number
            .as_u64()
            .or_else(|| number.as_f64().filter(|n| *n >= 1.0).map(|n| n as u64))
            .and_then(|n| u32::try_from(n).ok())
            .filter(|n| *n > 0),
        Value::Array(items) => items.iter().find_map(parse_yield),
        _ => None,
    }
}

fn leading_integer(text: &str) -> Option<u32> {
    let digits: String = text
        .trim_start()
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse::<u32>().ok().filter(|n| *n > 0)
}

/// Minutes in an ISO 8601 duration such as `PT1H30M`, `P1DT2H` or `PT5400.0S`.
pub fn duration_minutes(duration: &str) -> Option<u32> {
    let rest = duration.trim().strip_prefix('P')?;
    let (date_part, time_part) = rest.split_once('T').unwrap_or((rest, ""));

    let mut seconds = 0.0;
    for (part, is_time) in [(date_part, false), (time_part, true)] {
        let mut number = String::new();
        for c in part.chars() {
            if c.is_ascii_digit() || c == '.' {
                number.push(c);
                continue;
            }
            let value: f64 = number.parse().ok()?;
            number.clear();
            seconds += match (c, is_time) {
                ('D', false) => value * 86_400.0,
                ('W', false) => value * 604_800.0,
                ('H', true) => value * 3_600.0,
                ('M', true) => value * 60.0,
                ('S', true) => value,
                _ => return None,
            };
        }
        if !number.is_empty() {
            return None;
        }
    }

    let minutes = (seconds / 60.0).round() as u32;
    (minutes > 0).then_some(minutes)
}

fn decode_html_symbols(text: &str) -> String {
    // Some sites double-encode entities
    decode_html_entities(&decode_html_entities(text)).into_owned()
}
