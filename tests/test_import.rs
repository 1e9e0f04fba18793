use mockito::{Matcher, Server, ServerGuard};
use recipe_keeper::providers::OpenAIProvider;
use recipe_keeper::url_to_text::TextSource;
use recipe_keeper::{ImportError, Importer, LanguageConfig, Stage, Store, Variant};
use serde_json::json;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn recipe_page(server: &ServerGuard, name: &str) -> String {
    format!(
        r#"
        <html>
        <head>
            <meta property="og:image" content="{}/img/soup.jpg">
            <script type="application/ld+json">
            {{
                "@type": "Recipe",
                "name": "{}",
                "recipeYield": "4",
                "recipeIngredient": ["500 g tomatoes", "1 l stock"],
                "totalTime": "PT40M"
            }}
            </script>
        </head>
        <body><p>Soup</p></body>
        </html>
        "#,
        server.url(),
        name
    )
}

fn completion(reply: serde_json::Value) -> String {
    json!({
        "choices": [{"message": {"role": "assistant", "content": reply.to_string()}}]
    })
    .to_string()
}

fn soup_reply() -> serde_json::Value {
    json!({
        "name_nl": "Tomatensoep",
        "name_en": "Tomato soup",
        "servings": 4,
        "ingredients": [
            {"name_nl": "tomaten", "name_en": "tomatoes", "quantity": 500, "unit_nl": "gram", "unit_en": "grams"},
            {"name_nl": "bouillon", "name_en": "stock", "quantity": 1, "unit_nl": "liter", "unit_en": "liters"}
        ],
        "steps": [
            {"description_nl": "Kook de tomaten", "description_en": "Boil the tomatoes", "time": 30},
            {"description_nl": "Pureer", "description_en": "Blend", "time": 5}
        ],
        "image_url": ""
    })
}

fn importer(server: &ServerGuard) -> Importer {
    Importer::builder()
        .provider(Box::new(OpenAIProvider::with_base_url(
            "test_key".to_string(),
            server.url(),
            "gpt-4o-mini".to_string(),
        )))
        .languages(LanguageConfig::default())
        .build()
        .unwrap()
}

fn open_store(dir: &TempDir) -> Store {
    Store::open(dir.path().join("recipes.db"), dir.path().join("images")).unwrap()
}

fn image_count(dir: &Path) -> usize {
    fs::read_dir(dir).map(|entries| entries.count()).unwrap_or(0)
}

#[tokio::test]
async fn test_import_saves_recipe_and_image() {
    let mut server = Server::new_async().await;
    let page = server
        .mock("GET", "/soup")
        .with_status(200)
        .with_header("content-type", "text/html")
        .with_body(recipe_page(&server, "Tomato Soup"))
        .create_async()
        .await;
    let image = server
        .mock("GET", "/img/soup.jpg")
        .with_status(200)
        .with_header("content-type", "image/jpeg")
        .with_body(b"jpeg bytes")
        .create_async()
        .await;
    let llm = server
        .mock("POST", "/v1/chat/completions")
        .match_header("authorization", "Bearer test_key")
        .match_body(Matcher::Regex("Recipe Name: Tomato Soup".to_string()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(completion(soup_reply()))
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut store = open_store(&dir);
    let url = format!("{}/soup", server.url());

    let outcome = importer(&server).import(&mut store, &url).await.unwrap();

    page.assert_async().await;
    image.assert_async().await;
    llm.assert_async().await;
    assert_eq!(outcome.name, "Tomatensoep");
    assert_eq!(outcome.source, TextSource::Structured);

    let recipe = store.get(outcome.id).unwrap();
    assert_eq!(recipe.url, url);
    assert_eq!(recipe.name.get(Variant::Secondary), "Tomato soup");
    assert_eq!(recipe.servings, 4);
    assert_eq!(recipe.total_time, Some(40));
    assert_eq!(recipe.ingredients.len(), 2);
    assert_eq!(recipe.ingredients[0].quantity, 500.0);
    assert_eq!(recipe.ingredients[0].unit.primary, "gram");
    assert_eq!(recipe.steps[1].minutes, Some(5));

    let image_path = recipe.image_path.expect("image cached");
    assert_eq!(outcome.image_path.as_deref(), Some(image_path.as_str()));
    assert!(image_path.ends_with("soup.jpg"));
    assert_eq!(fs::read(&image_path).unwrap(), b"jpeg bytes");
}

#[tokio::test]
async fn test_resubmission_replaces_ingredients_and_steps() {
    let mut server = Server::new_async().await;
    let _image = server
        .mock("GET", "/img/soup.jpg")
        .with_status(200)
        .with_body(b"jpeg bytes")
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut store = open_store(&dir);
    let url = format!("{}/soup", server.url());
    let importer = importer(&server);

    let page = server
        .mock("GET", "/soup")
        .with_status(200)
        .with_body(recipe_page(&server, "Tomato Soup"))
        .create_async()
        .await;
    let llm = server
        .mock("POST", "/v1/chat/completions")
        .with_status(200)
        .with_body(completion(soup_reply()))
        .create_async()
        .await;
    let first = importer.import(&mut store, &url).await.unwrap();
    page.remove_async().await;
    llm.remove_async().await;

    let _page = server
        .mock("GET", "/soup")
        .with_status(200)
        .with_body(recipe_page(&server, "Tomato Soup Deluxe"))
        .create_async()
        .await;
    let _llm = server
        .mock("POST", "/v1/chat/completions")
        .with_status(200)
        .with_body(completion(json!({
            "name_nl": "Luxe tomatensoep",
            "name_en": "Deluxe tomato soup",
            "servings": 6,
            "ingredients": [
                {"name_nl": "tomaten", "name_en": "tomatoes", "quantity": 750, "unit_nl": "gram", "unit_en": "grams"}
            ],
            "steps": [
                {"description_nl": "Rooster de tomaten", "description_en": "Roast the tomatoes", "time": 45}
            ]
        })))
        .create_async()
        .await;
    let second = importer.import(&mut store, &url).await.unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(store.list().unwrap().len(), 1);

    let recipe = store.get(second.id).unwrap();
    assert_eq!(recipe.name.primary, "Luxe tomatensoep");
    assert_eq!(recipe.servings, 6);
    assert_eq!(recipe.ingredients.len(), 1);
    assert_eq!(recipe.ingredients[0].quantity, 750.0);
    assert_eq!(recipe.steps.len(), 1);
    assert_eq!(recipe.steps[0].description.primary, "Rooster de tomaten");

    // the replaced image file is gone, only the new one remains
    assert_eq!(image_count(&dir.path().join("images")), 1);
    assert!(Path::new(recipe.image_path.as_deref().unwrap()).exists());
}

#[tokio::test]
async fn test_delete_removes_recipe_and_image() {
    let mut server = Server::new_async().await;
    let _page = server
        .mock("GET", "/soup")
        .with_status(200)
        .with_body(recipe_page(&server, "Tomato Soup"))
        .create_async()
        .await;
    let _image = server
        .mock("GET", "/img/soup.jpg")
        .with_status(200)
        .with_body(b"jpeg bytes")
        .create_async()
        .await;
    let _llm = server
        .mock("POST", "/v1/chat/completions")
        .with_status(200)
        .with_body(completion(soup_reply()))
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut store = open_store(&dir);
    let url = format!("{}/soup", server.url());
    let outcome = importer(&server).import(&mut store, &url).await.unwrap();
    let image_path = outcome.image_path.unwrap();
    assert!(Path::new(&image_path).exists());

    assert!(store.delete(outcome.id).unwrap());

    assert!(!Path::new(&image_path).exists());
    assert!(matches!(store.get(outcome.id), Err(ImportError::NotFound(_))));
    assert!(store.find_by_url(&url).unwrap().is_none());
    assert!(!store.delete(outcome.id).unwrap());
}

#[tokio::test]
async fn test_image_download_failure_is_not_fatal() {
    let mut server = Server::new_async().await;
    let _page = server
        .mock("GET", "/soup")
        .with_status(200)
        .with_body(recipe_page(&server, "Tomato Soup"))
        .create_async()
        .await;
    let _image = server
        .mock("GET", "/img/soup.jpg")
        .with_status(404)
        .create_async()
        .await;
    let _llm = server
        .mock("POST", "/v1/chat/completions")
        .with_status(200)
        .with_body(completion(soup_reply()))
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut store = open_store(&dir);
    let url = format!("{}/soup", server.url());
    let outcome = importer(&server).import(&mut store, &url).await.unwrap();

    assert!(outcome.image_path.is_none());
    assert!(store.get(outcome.id).unwrap().image_path.is_none());
}

#[tokio::test]
async fn test_uninterpretable_reply_stores_nothing() {
    let mut server = Server::new_async().await;
    let _page = server
        .mock("GET", "/soup")
        .with_status(200)
        .with_body(recipe_page(&server, "Tomato Soup"))
        .create_async()
        .await;
    let _llm = server
        .mock("POST", "/v1/chat/completions")
        .with_status(200)
        .with_body(completion(json!({"name_nl": "Soep", "servings": 2})))
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut store = open_store(&dir);
    let url = format!("{}/soup", server.url());
    let failure = importer(&server).import(&mut store, &url).await.unwrap_err();

    assert_eq!(failure.stage, Stage::Interpret);
    assert!(matches!(failure.error, ImportError::LlmSchemaError(_)));
    assert!(store.list().unwrap().is_empty());
    assert_eq!(image_count(&dir.path().join("images")), 0);
}

#[tokio::test]
async fn test_llm_http_error_is_an_interpret_failure() {
    let mut server = Server::new_async().await;
    let _page = server
        .mock("GET", "/soup")
        .with_status(200)
        .with_body(recipe_page(&server, "Tomato Soup"))
        .create_async()
        .await;
    let _llm = server
        .mock("POST", "/v1/chat/completions")
        .with_status(500)
        .with_header("content-type", "application/json")
        .with_body(r#"{"error": {"message": "overloaded"}}"#)
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut store = open_store(&dir);
    let url = format!("{}/soup", server.url());
    let failure = importer(&server).import(&mut store, &url).await.unwrap_err();

    assert_eq!(failure.stage, Stage::Interpret);
    assert_eq!(failure.stage.failure_message(), "Error interpreting recipe.");
    assert!(store.list().unwrap().is_empty());
}

#[tokio::test]
async fn test_fetch_failure_stores_nothing() {
    let mut server = Server::new_async().await;
    let _page = server
        .mock("GET", "/soup")
        .with_status(500)
        .create_async()
        .await;
    let llm = server
        .mock("POST", "/v1/chat/completions")
        .expect(0)
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut store = open_store(&dir);
    let url = format!("{}/soup", server.url());
    let failure = importer(&server).import(&mut store, &url).await.unwrap_err();

    assert_eq!(failure.stage, Stage::Fetch);
    assert_eq!(
        failure.stage.failure_message(),
        "Error fetching recipe from URL."
    );
    llm.assert_async().await;
    assert!(store.list().unwrap().is_empty());
}

#[tokio::test]
async fn test_invalid_url_is_rejected_before_fetching() {
    let server = Server::new_async().await;
    let dir = tempfile::tempdir().unwrap();
    let mut store = open_store(&dir);

    let failure = importer(&server)
        .import(&mut store, "javascript:alert(1)")
        .await
        .unwrap_err();

    assert_eq!(failure.stage, Stage::Validate);
    assert_eq!(failure.stage.failure_message(), "Invalid URL.");
}
