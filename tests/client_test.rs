use actix_web::{web, App, HttpServer};
use giftlink::client::{GiftLinkClient, SearchForm};
use giftlink::config::AuthConfig;
use giftlink::db::MemoryStore;
use giftlink::models::{Gift, RegisterRequest};
use giftlink::AppState;
use reqwest::StatusCode;
use std::sync::Arc;

fn gifts() -> Vec<Gift> {
    serde_json::from_str(
        r#"[
            {"id": "1", "name": "Sofa", "category": "Living", "condition": "New", "age_years": 1.0},
            {"id": "2", "name": "Wall Lamp", "category": "Bedroom", "condition": "Older", "age_years": 9.0},
            {"id": "3", "name": "Floor Lamp", "category": "Living", "condition": "Like New", "age_years": 2.0}
        ]"#,
    )
    .unwrap()
}

/// Starts a real server on an ephemeral port and returns its base URL.
fn spawn_server() -> String {
    let mut auth = AuthConfig::new("client-secret");
    auth.bcrypt_cost = 4;
    let state = web::Data::new(AppState::new(Arc::new(MemoryStore::with_gifts(gifts())), auth));

    let server = HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .configure(giftlink::configure)
    })
    .workers(1)
    .bind(("127.0.0.1", 0))
    .unwrap();
    let addr = server.addrs()[0];
    actix_web::rt::spawn(server.run());
    format!("http://{}", addr)
}

#[actix_web::test]
async fn register_login_logout_flow() {
    let mut client = GiftLinkClient::new(spawn_server());

    let user = client
        .register(&RegisterRequest {
            first_name: "Jane".into(),
            last_name: "Doe".into(),
            email: "jane@x.com".into(),
            password: "secret1".into(),
        })
        .await
        .unwrap();
    assert_eq!(user.first_name, "Jane");
    assert!(client.session.is_logged_in());

    let claims = client.me().await.unwrap();
    assert_eq!(claims.user_id, user.id);

    client.logout();
    assert!(!client.session.is_logged_in());
    let err = client.me().await.unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::UNAUTHORIZED));

    client.login("jane@x.com", "secret1").await.unwrap();
    assert_eq!(client.session.user().unwrap().unwrap().email, "jane@x.com");

    let err = client.login("jane@x.com", "wrong!").await.unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::UNAUTHORIZED));
    assert_eq!(err.to_string(), "401 Unauthorized: Invalid email or password");
    assert!(!client.session.is_logged_in());
}

#[actix_web::test]
async fn search_form_drives_the_search_endpoint() {
    let client = GiftLinkClient::new(spawn_server());

    assert_eq!(client.list_gifts().await.unwrap().len(), 3);

    let found = client
        .search(&SearchForm {
            name: " lamp".into(),
            age_years: 5,
            ..Default::default()
        })
        .await
        .unwrap();
    let names: Vec<_> = found.iter().map(|g| g.gift.name.as_str()).collect();
    assert_eq!(names, vec!["Floor Lamp"]);

    let gift = client.get_gift("2").await.unwrap();
    assert_eq!(gift.gift.name, "Wall Lamp");
    let same = client.get_gift(&gift.key).await.unwrap();
    assert_eq!(same, gift);
    let err = client.get_gift("42").await.unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
}
