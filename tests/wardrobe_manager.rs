mod common;

use common::{item_row, outfit, signed_in, TOKEN, USER_ID};
use outfit_wardrobe::error::Error;
use outfit_wardrobe::models::{
    Category, NewWardrobeItem, SortDirection, SortField, WardrobeFilters, WardrobeItemUpdate,
    WardrobeSortOptions,
};
use serde_json::json;
use wiremock::matchers::{any, body_json, body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TABLE: &str = "/rest/v1/wardrobe_items";

#[tokio::test]
async fn test_fetch_applies_owner_filters_and_sort() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(TABLE))
        .and(query_param("user_id", "eq.user-1"))
        .and(query_param("category", "eq.tops"))
        .and(query_param("is_favorite", "eq.true"))
        .and(query_param("or", "(primary_color.eq.\"navy\",secondary_color.eq.\"navy\")"))
        .and(query_param("name", "ilike.*shirt*"))
        .and(query_param("order", "name.asc"))
        .and(header("authorization", format!("Bearer {}", TOKEN).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            item_row("item-1", "Navy Shirt", "tops")
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let wardrobe = signed_in(&mock_server).wardrobe();
    wardrobe.set_filters(
        WardrobeFilters::default()
            .category(Category::Tops)
            .favorites(true)
            .color("navy")
            .search("shirt"),
    );
    wardrobe.set_sort_options(WardrobeSortOptions::new(SortField::Name, SortDirection::Asc));

    let result = wardrobe.fetch().await;
    assert!(result.is_ok(), "fetch failed: {:?}", result.err());
    assert_eq!(wardrobe.item_count(), 1);
    assert_eq!(wardrobe.items()[0].name, "Navy Shirt");
}

#[tokio::test]
async fn test_search_term_is_sent_untrimmed() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(TABLE))
        .and(query_param("name", "ilike.*blue *"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            item_row("item-1", "Blue Shirt", "tops")
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let wardrobe = signed_in(&mock_server).wardrobe();
    wardrobe.set_filters(WardrobeFilters::default().search("blue "));
    wardrobe.fetch().await.unwrap();

    assert_eq!(wardrobe.item_count(), 1);
}

#[tokio::test]
async fn test_fetch_twice_gives_same_items() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(TABLE))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            item_row("item-1", "Blue Shirt", "tops"),
            item_row("item-2", "Jeans", "bottoms")
        ])))
        .expect(2)
        .mount(&mock_server)
        .await;

    let wardrobe = signed_in(&mock_server).wardrobe();
    wardrobe.fetch().await.unwrap();
    let first = wardrobe.items();
    wardrobe.refetch().await.unwrap();

    assert_eq!(first, wardrobe.items());
    assert_eq!(wardrobe.category_count().get(&Category::Bottoms), Some(&1));
}

#[tokio::test]
async fn test_failed_fetch_keeps_previous_items() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(TABLE))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            item_row("item-1", "Blue Shirt", "tops")
        ])))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path(TABLE))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "code": "XX000",
            "message": "database unavailable",
            "details": null,
            "hint": null
        })))
        .mount(&mock_server)
        .await;

    let wardrobe = signed_in(&mock_server).wardrobe();
    wardrobe.fetch().await.unwrap();

    let result = wardrobe.fetch().await;
    assert!(matches!(result, Err(Error::Database(_))));
    assert_eq!(wardrobe.item_count(), 1);
    assert_eq!(wardrobe.error().as_deref(), Some("database unavailable"));
    assert!(!wardrobe.is_loading());
}

#[tokio::test]
async fn test_malformed_row_is_a_decode_error() {
    let mock_server = MockServer::start().await;

    let mut bad = item_row("item-9", "Cape", "tops");
    bad["category"] = json!("capes");
    Mock::given(method("GET"))
        .and(path(TABLE))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([bad])))
        .mount(&mock_server)
        .await;

    let wardrobe = signed_in(&mock_server).wardrobe();
    let result = wardrobe.fetch().await;
    assert!(matches!(result, Err(Error::Decode(ref e)) if e.row.as_deref() == Some("item-9")));
}

#[tokio::test]
async fn test_add_then_count() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(TABLE))
        .and(header("prefer", "return=representation"))
        .and(body_json(json!({
            "name": "Blue Shirt",
            "category": "tops",
            "classification_source": "manual",
            "ai_confidence": 1.0,
            "user_id": USER_ID
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            item_row("item-1", "Blue Shirt", "tops")
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let wardrobe = signed_in(&mock_server).wardrobe();
    let created = wardrobe
        .add(NewWardrobeItem::manual("Blue Shirt", Category::Tops))
        .await
        .unwrap();

    assert_eq!(created.id, "item-1");
    assert_eq!(wardrobe.item_count(), 1);
    assert_eq!(wardrobe.category_count().get(&Category::Tops), Some(&1));
}

#[tokio::test]
async fn test_add_without_user_makes_no_request() {
    let mock_server = MockServer::start().await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&mock_server)
        .await;

    let wardrobe = outfit(&mock_server).wardrobe();
    let result = wardrobe
        .add(NewWardrobeItem::manual("Blue Shirt", Category::Tops))
        .await;

    assert!(matches!(result, Err(Error::NotAuthenticated)));
    assert_eq!(result.unwrap_err().to_string(), "Not authenticated");
}

#[tokio::test]
async fn test_update_is_scoped_by_id_and_owner() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(TABLE))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            item_row("item-1", "Blue Shirt", "tops"),
            item_row("item-2", "Jeans", "bottoms")
        ])))
        .mount(&mock_server)
        .await;

    let mut updated = item_row("item-2", "Jeans", "bottoms");
    updated["is_favorite"] = json!(true);
    Mock::given(method("PATCH"))
        .and(path(TABLE))
        .and(query_param("id", "eq.item-2"))
        .and(query_param("user_id", "eq.user-1"))
        .and(body_partial_json(json!({ "is_favorite": true })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([updated])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let wardrobe = signed_in(&mock_server).wardrobe();
    wardrobe.fetch().await.unwrap();

    let item = wardrobe
        .update("item-2", WardrobeItemUpdate::favorite(true))
        .await
        .unwrap();
    assert!(item.is_favorite);

    let items = wardrobe.items();
    assert_eq!(items[1].id, "item-2");
    assert!(items[1].is_favorite);
}

#[tokio::test]
async fn test_update_of_foreign_item_changes_nothing() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path(TABLE))
        .and(query_param("id", "eq.someone-elses"))
        .and(query_param("user_id", "eq.user-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let wardrobe = signed_in(&mock_server).wardrobe();
    let result = wardrobe
        .update("someone-elses", WardrobeItemUpdate::favorite(true))
        .await;

    assert!(matches!(result, Err(Error::NotFound(_))));
    assert_eq!(wardrobe.item_count(), 0);
}

#[tokio::test]
async fn test_delete_removes_item_and_image() {
    let mock_server = MockServer::start().await;

    let mut row = item_row("item-1", "Blue Shirt", "tops");
    row["image_url"] = json!(format!(
        "{}/storage/v1/object/public/wardrobe-items/user-1/item-1.jpg?t=1700000000000",
        mock_server.uri()
    ));
    Mock::given(method("GET"))
        .and(path(TABLE))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([row.clone()])))
        .mount(&mock_server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(TABLE))
        .and(query_param("id", "eq.item-1"))
        .and(query_param("user_id", "eq.user-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([row])))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/storage/v1/object/wardrobe-items"))
        .and(body_json(json!({ "prefixes": ["user-1/item-1.jpg"] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let wardrobe = signed_in(&mock_server).wardrobe();
    wardrobe.fetch().await.unwrap();
    wardrobe.delete("item-1").await.unwrap();

    assert_eq!(wardrobe.item_count(), 0);
    assert_eq!(wardrobe.category_count().get(&Category::Tops), None);
}

#[tokio::test]
async fn test_delete_of_unowned_item_changes_nothing() {
    let mock_server = MockServer::start().await;

    let mut row = item_row("item-1", "Blue Shirt", "tops");
    row["image_url"] = json!(format!(
        "{}/storage/v1/object/public/wardrobe-items/user-1/item-1.jpg",
        mock_server.uri()
    ));
    Mock::given(method("GET"))
        .and(path(TABLE))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([row])))
        .mount(&mock_server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(TABLE))
        .and(query_param("id", "eq.item-1"))
        .and(query_param("user_id", "eq.user-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/storage/v1/object/wardrobe-items"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&mock_server)
        .await;

    let wardrobe = signed_in(&mock_server).wardrobe();
    wardrobe.fetch().await.unwrap();
    let result = wardrobe.delete("item-1").await;

    assert!(matches!(result, Err(Error::NotFound(_))));
    assert_eq!(wardrobe.item_count(), 1);
    assert_eq!(wardrobe.items()[0].id, "item-1");
}

#[tokio::test]
async fn test_delete_succeeds_when_image_cleanup_fails() {
    let mock_server = MockServer::start().await;

    let mut row = item_row("item-1", "Blue Shirt", "tops");
    row["image_url"] = json!(format!(
        "{}/storage/v1/object/public/wardrobe-items/user-1/item-1.jpg",
        mock_server.uri()
    ));
    Mock::given(method("GET"))
        .and(path(TABLE))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([row.clone()])))
        .mount(&mock_server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(TABLE))
        .respond_with(ResponseTemplate::new(204))
        .mount(&mock_server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/storage/v1/object/wardrobe-items"))
        .respond_with(ResponseTemplate::new(500).set_body_string("storage down"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let wardrobe = signed_in(&mock_server).wardrobe();
    wardrobe.fetch().await.unwrap();

    let result = wardrobe.delete("item-1").await;
    assert!(result.is_ok(), "delete failed: {:?}", result.err());
    assert_eq!(wardrobe.item_count(), 0);
}

#[tokio::test]
async fn test_get_item_is_none_on_failure() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(TABLE))
        .and(query_param("id", "eq.item-1"))
        .and(query_param("user_id", "eq.user-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            item_row("item-1", "Blue Shirt", "tops")
        ])))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path(TABLE))
        .and(query_param("id", "eq.missing"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path(TABLE))
        .and(query_param("id", "eq.denied"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "code": "42501",
            "message": "permission denied",
            "details": null,
            "hint": null
        })))
        .mount(&mock_server)
        .await;

    let wardrobe = signed_in(&mock_server).wardrobe();
    assert_eq!(
        wardrobe.get_item("item-1").await.map(|i| i.name),
        Some("Blue Shirt".to_string())
    );
    assert!(wardrobe.get_item("missing").await.is_none());
    assert!(wardrobe.get_item("denied").await.is_none());
    assert_eq!(wardrobe.item_count(), 0);
}

#[tokio::test]
async fn test_fetch_by_warmth_level_is_newest_first() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(TABLE))
        .and(query_param("warmth_level", "eq.very_heavy"))
        .and(query_param("order", "created_at.desc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let wardrobe = signed_in(&mock_server).wardrobe();
    let items = wardrobe
        .fetch_by_warmth_level(outfit_wardrobe::models::WarmthLevel::VeryHeavy)
        .await
        .unwrap();
    assert!(items.is_empty());
}
