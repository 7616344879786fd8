//! Route-level tests for the back-office guard behavior: locale handling
//! runs before authentication, and unauthenticated requests are rejected.

use actix_identity::IdentityMiddleware;
use actix_session::{storage::CookieSessionStore, SessionMiddleware};
use actix_web::cookie::Key;
use actix_web::http::StatusCode;
use actix_web::web::Data;
use actix_web::{test, App};
use sqlx::sqlite::SqlitePoolOptions;

use fakturo::config::Config;
use fakturo::routes::admin;
use fakturo::services::ares::AresClient;
use fakturo::{AppState, MIGRATOR};

async fn test_state() -> AppState {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory pool");
    MIGRATOR.run(&pool).await.expect("migrations");
    AppState {
        db_pool: pool,
        config: Config {
            database_url: "sqlite::memory:".into(),
            bind_addr: "127.0.0.1:0".into(),
            locales: vec!["cs".into(), "en".into()],
            ares_base_url: "http://127.0.0.1:1".into(),
        },
        ares: AresClient::new(reqwest::Client::new(), "http://127.0.0.1:1".into()),
    }
}

#[actix_web::test]
async fn unsupported_admin_locale_redirects_to_default() {
    let state = test_state().await;
    let app = test::init_service(
        App::new()
            .wrap(IdentityMiddleware::default())
            .wrap(SessionMiddleware::new(
                CookieSessionStore::default(),
                Key::generate(),
            ))
            .app_data(Data::new(state))
            .service(admin::users_handler),
    )
    .await;

    let req = test::TestRequest::get().uri("/xx/admin").to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    let location = resp
        .headers()
        .get("Location")
        .and_then(|v| v.to_str().ok())
        .unwrap();
    assert_eq!(location, "/cs/admin");
}

#[actix_web::test]
async fn supported_admin_locale_still_requires_a_session() {
    let state = test_state().await;
    let app = test::init_service(
        App::new()
            .wrap(IdentityMiddleware::default())
            .wrap(SessionMiddleware::new(
                CookieSessionStore::default(),
                Key::generate(),
            ))
            .app_data(Data::new(state))
            .service(admin::users_handler),
    )
    .await;

    let req = test::TestRequest::get().uri("/cs/admin").to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn unsupported_locale_on_admin_login_redirects_before_auth() {
    let state = test_state().await;
    let app = test::init_service(
        App::new()
            .wrap(IdentityMiddleware::default())
            .wrap(SessionMiddleware::new(
                CookieSessionStore::default(),
                Key::generate(),
            ))
            .app_data(Data::new(state))
            .service(admin::delete_user_handler),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/de/admin/users/1/delete")
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    let location = resp
        .headers()
        .get("Location")
        .and_then(|v| v.to_str().ok())
        .unwrap();
    assert_eq!(location, "/cs/admin");
}
