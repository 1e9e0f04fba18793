use crate::config::LanguageConfig;

/// Key of a textual field in the model's reply: `name_nl` when translating, `name` otherwise.
pub fn field_key(base: &str, language: Option<&str>) -> String {
    match language {
        Some(lang) => format!("{base}_{lang}"),
        None => base.to_string(),
    }
}

/// Human readable name for the language codes the prompt mentions.
pub fn language_name(code: &str) -> String {
    match code.to_ascii_lowercase().as_str() {
        "nl" => "Dutch".to_string(),
        "en" => "English".to_string(),
        "de" => "German".to_string(),
        "fr" => "French".to_string(),
        "es" => "Spanish".to_string(),
        "it" => "Italian".to_string(),
        "pt" => "Portuguese".to_string(),
        _ => format!("the language with code '{code}'"),
    }
}

/// Build the system instruction spelling out the exact JSON the model must return.
pub fn build_system_prompt(languages: &LanguageConfig) -> String {
    let (keys, language_rule) = match languages.secondary() {
        Some(secondary) => {
            let primary = languages.primary.as_str();
            let text_field = |base: &str| {
                format!(
                    "\"{}\" (string), \"{}\" (string)",
                    field_key(base, Some(primary)),
                    field_key(base, Some(secondary))
                )
            };
            let keys = format!(
                "{name}, \"servings\" (integer), \"ingredients\" (an array of objects, each with {ing_name}, \"quantity\" (number), {unit}), \"steps\" (an array of objects, each with {description} and \"time\" (integer, minutes)), and \"image_url\" (string)",
                name = text_field("name"),
                ing_name = text_field("name"),
                unit = text_field("unit"),
                description = text_field("description"),
            );
            let rule = format!(
                "Provide every textual value (recipe name, ingredient names, ingredient units, step descriptions) both in {} and in {}.",
                language_name(primary),
                language_name(secondary)
            );
            (keys, rule)
        }
        None => (
            "\"name\" (string), \"servings\" (integer), \"ingredients\" (an array of objects, each with \"name\" (string), \"quantity\" (number), \"unit\" (string)), \"steps\" (an array of objects, each with \"description\" (string) and \"time\" (integer, minutes)), and \"image_url\" (string)".to_string(),
            format!(
                "Write every textual value in {}.",
                language_name(&languages.primary)
            ),
        ),
    };

    format!(
        "You extract structured recipe data from text. Find the recipe name, the number of servings, \
the ingredients with quantity and unit, the cooking steps with an estimated duration, and the URL \
of a photo of the finished dish. {language_rule} \
Give each ingredient quantity as a number (decimals allowed) and its unit as a word such as \
\"grams\", \"ml\", \"liters\", \"cups\", \"teaspoons\" or \"pieces\". When the unit is missing, use \
the most common unit for that ingredient. When the quantity is missing, estimate a sensible amount \
(for example 1 for a pinch of salt). Give every step a description and an estimated time in whole minutes. \
Reply with a single JSON object and nothing else, using exactly these keys: {keys}. \
When no image URL is known, use an empty string for \"image_url\"."
    )
}
