use scraper::{Html, Selector};

const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

/// All visible text inside `<body>`, whitespace collapsed to single spaces.
pub fn visible_text(document: &Html) -> String {
    let selector = Selector::parse("body").expect("valid selector");
    let Some(body) = document.select(&selector).next() else {
        return String::new();
    };

    let mut words: Vec<&str> = Vec::new();
    for node in body.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|element| HIDDEN_ELEMENTS.contains(&element.name()))
        });
        if !hidden {
            words.extend(text.split_whitespace());
        }
    }
    words.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_text_from_html() {
        let document = Html::parse_document(
            r#"
            <html>
            <head><title>Not in body</title></head>
            <body>
                <h1>Test Recipe</h1>
                <p>Some   ingredients</p>
                <script>var tracking = true;</script>
                <style>p { color: red; }</style>
                <p>Some instructions</p>
            </body>
            </html>
            "#,
        );

        assert_eq!(
            visible_text(&document),
            "Test Recipe Some ingredients Some instructions"
        );
    }
}
