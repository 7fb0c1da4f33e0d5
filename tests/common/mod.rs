#![allow(dead_code)]

use outfit_wardrobe::outfit_auth::{Session, User};
use outfit_wardrobe::Outfit;
use serde_json::{json, Value};
use wiremock::MockServer;

pub const USER_ID: &str = "user-1";
pub const TOKEN: &str = "access-token";

pub fn user() -> User {
    User {
        id: USER_ID.to_string(),
        email: Some("jane.doe@example.com".to_string()),
        phone: None,
        email_confirmed_at: None,
        user_metadata: Value::Null,
        created_at: None,
        updated_at: None,
    }
}

pub fn session() -> Session {
    Session {
        access_token: TOKEN.to_string(),
        refresh_token: "refresh-token".to_string(),
        expires_in: 3600,
        expires_at: None,
        token_type: "bearer".to_string(),
        user: user(),
    }
}

pub fn session_json() -> Value {
    json!({
        "access_token": TOKEN,
        "refresh_token": "refresh-token",
        "expires_in": 3600,
        "token_type": "bearer",
        "user": { "id": USER_ID, "email": "jane.doe@example.com" }
    })
}

pub fn outfit(server: &MockServer) -> Outfit {
    Outfit::new(&server.uri(), "anon-key").unwrap()
}

pub fn signed_in(server: &MockServer) -> Outfit {
    let outfit = outfit(server);
    outfit.auth().set_session(session());
    outfit
}

pub fn item_row(id: &str, name: &str, category: &str) -> Value {
    json!({
        "id": id,
        "user_id": USER_ID,
        "name": name,
        "category": category,
        "subcategory": null,
        "primary_color": "navy",
        "secondary_color": null,
        "pattern": null,
        "material": null,
        "warmth_level": "light",
        "weather_resistance": null,
        "image_url": null,
        "thumbnail_url": null,
        "classification_source": "manual",
        "ai_confidence": 1.0,
        "is_favorite": false,
        "times_worn": 0,
        "last_worn_at": null,
        "notes": null,
        "created_at": "2024-03-01T10:00:00+00:00",
        "updated_at": "2024-03-01T10:00:00+00:00"
    })
}

pub fn profile_row(username: &str) -> Value {
    json!({
        "id": USER_ID,
        "username": username,
        "full_name": null,
        "avatar_url": null,
        "bio": null,
        "created_at": "2024-03-01T10:00:00+00:00",
        "updated_at": "2024-03-01T10:00:00+00:00"
    })
}
