use scraper::{Html, Selector};

/// Pick a representative image: the Open Graph preview if the page declares one,
/// otherwise the first `<img>` with an absolute URL.
pub fn find_image_url(document: &Html) -> Option<String> {
    let og_selector = Selector::parse(r#"meta[property="og:image"]"#).expect("valid selector");
    let og_image = document
        .select(&og_selector)
        .filter_map(|meta| meta.value().attr("content"))
        .map(str::trim)
        .find(|content| !content.is_empty());
    if let Some(url) = og_image {
        return Some(url.to_string());
    }

    let img_selector = Selector::parse("img[src]").expect("valid selector");
    document
        .select(&img_selector)
        .filter_map(|img| img.value().attr("src"))
        .map(str::trim)
        .find(|src| src.starts_with("http"))
        .map(str::to_string)
}
