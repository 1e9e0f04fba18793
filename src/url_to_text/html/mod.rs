mod image;
mod json_ld;
mod text;

pub use image::find_image_url;
pub use json_ld::{JsonLdExtractor, StructuredRecipe};
pub use text::visible_text;
