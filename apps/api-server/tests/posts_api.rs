mod common;

use actix_web::http::StatusCode;
use actix_web::test;
use serde_json::{Value, json};

use common::{bearer, create_post, new_post, register, titles, token};

#[actix_rt::test]
async fn test_inactive_posts_never_listed_and_date_range_applies() {
    let app = test::init_service(common::app()).await;
    let ada = token(&test::call_and_read_body_json(&app, register("ada").to_request()).await);

    let p1: Value = test::call_and_read_body_json(
        &app,
        create_post(&ada, new_post("P1", "Ada", "2025-01-10T09:00:00Z", true)).to_request(),
    )
    .await;
    let resp = test::call_service(
        &app,
        create_post(&ada, new_post("P2", "Ada", "2025-01-12T09:00:00Z", false)).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let req = test::TestRequest::get().uri("/api/posts/").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["results"][0]["id"], p1["id"]);
    assert_eq!(body["results"][0]["author_name"], "Ada");

    let req = test::TestRequest::get()
        .uri("/api/posts/?published_date__gte=2025-01-11&published_date__lte=2025-01-15")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["count"], 0);

    let req = test::TestRequest::get()
        .uri("/api/posts?from=2025-01-10&to=2025-01-10&search=p")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(titles(&body), ["P1"]);
}

#[actix_rt::test]
async fn test_listing_filters_order_and_paging() {
    let app = test::init_service(common::app()).await;
    let ada = token(&test::call_and_read_body_json(&app, register("ada").to_request()).await);
    let bob = token(&test::call_and_read_body_json(&app, register("bob").to_request()).await);

    for (title, date) in [
        ("Borrowing", "2025-02-01"),
        ("Lifetimes", "2025-02-02"),
        ("Traits", "2025-02-03"),
    ] {
        test::call_service(&app, create_post(&ada, new_post(title, "Ada", date, true)).to_request())
            .await;
    }
    test::call_service(
        &app,
        create_post(&bob, new_post("Bread", "Bob Baker", "2025-02-04", true)).to_request(),
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/api/posts/?author__name=bak")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(titles(&body), ["Bread"]);

    let req = test::TestRequest::get()
        .uri("/api/posts/?ordering=title&page_size=2&page=2")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["count"], 4);
    assert_eq!(body["page"], 2);
    assert_eq!(body["page_size"], 2);
    assert_eq!(titles(&body), ["Lifetimes", "Traits"]);

    let req = test::TestRequest::get().uri("/api/posts/?title=TRAIT").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(titles(&body), ["Traits"]);

    let req = test::TestRequest::get().uri("/api/posts/").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(titles(&body), ["Bread", "Traits", "Lifetimes", "Borrowing"]);
}

#[actix_rt::test]
async fn test_malformed_filters_are_rejected() {
    let app = test::init_service(common::app()).await;

    for query in [
        "published_date__gte=yesterday",
        "ordering=author",
        "page=0",
        "page_size=1000",
        "published_date__gte=2025-02-01&published_date__lte=2025-01-01",
    ] {
        let req = test::TestRequest::get()
            .uri(&format!("/api/posts/?{query}"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "query {query}");
        let body: Value = test::read_body_json(resp).await;
        assert!(body["errors"].is_object(), "query {query}");
    }
}

#[actix_rt::test]
async fn test_create_post_requires_authentication_and_valid_fields() {
    let app = test::init_service(common::app()).await;

    let req = test::TestRequest::post()
        .uri("/api/posts/")
        .set_json(new_post("Anon", "Nobody", "2025-01-01", true))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let ada = token(&test::call_and_read_body_json(&app, register("ada").to_request()).await);
    let resp = test::call_service(
        &app,
        create_post(&ada, json!({ "title": "x".repeat(201), "status": "archived" })).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    for field in ["title", "content", "published_date", "author_name", "status"] {
        assert!(body["errors"][field].is_array(), "missing error for {field}");
    }
}

#[actix_rt::test]
async fn test_create_post_returns_detail_and_creates_author() {
    let app = test::init_service(common::app()).await;
    let ada = token(&test::call_and_read_body_json(&app, register("ada").to_request()).await);

    let resp = test::call_service(
        &app,
        create_post(&ada, new_post("Hello", "Ada L.", "2025-01-01", true)).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let post: Value = test::read_body_json(resp).await;
    assert_eq!(post["status"], "draft");
    assert_eq!(post["active"], true);
    assert_eq!(post["author_name"], "Ada L.");

    let me = test::TestRequest::get()
        .uri("/api/auth/me")
        .insert_header(bearer(&ada))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, me).await;
    assert_eq!(body["author"]["name"], "Ada L.");

    let uri = format!("/api/posts/{}/", post["id"].as_str().unwrap());
    let req = test::TestRequest::get().uri(&uri).to_request();
    let detail: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(detail["title"], "Hello");
    assert_eq!(detail["comments"], json!([]));
}

#[actix_rt::test]
async fn test_detail_of_unknown_or_malformed_id_is_not_found() {
    let app = test::init_service(common::app()).await;

    let req = test::TestRequest::get()
        .uri("/api/posts/5f0c6a3e-2b7d-4c1e-9a55-2f1d8d3b9c10/")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::get().uri("/api/posts/42/").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn test_only_owner_may_edit() {
    let app = test::init_service(common::app()).await;
    let ada = token(&test::call_and_read_body_json(&app, register("ada").to_request()).await);
    let bob = token(&test::call_and_read_body_json(&app, register("bob").to_request()).await);

    let p1: Value = test::call_and_read_body_json(
        &app,
        create_post(&ada, new_post("P1", "Ada", "2025-01-10", true)).to_request(),
    )
    .await;
    let uri = format!("/api/posts/{}/edit/", p1["id"].as_str().unwrap());
    let patch = json!({ "title": "P1 revised" });

    let req = test::TestRequest::patch()
        .uri(&uri)
        .insert_header(bearer(&bob))
        .set_json(&patch)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::patch().uri(&uri).set_json(&patch).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::patch()
        .uri(&uri)
        .insert_header(bearer(&ada))
        .set_json(&patch)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["title"], "P1 revised");
    assert_eq!(body["content"], "P1 body");
}

#[actix_rt::test]
async fn test_edit_rejects_author_reassignment() {
    let app = test::init_service(common::app()).await;
    let ada = token(&test::call_and_read_body_json(&app, register("ada").to_request()).await);
    let p1: Value = test::call_and_read_body_json(
        &app,
        create_post(&ada, new_post("P1", "Ada", "2025-01-10", true)).to_request(),
    )
    .await;

    let req = test::TestRequest::patch()
        .uri(&format!("/api/posts/{}/edit", p1["id"].as_str().unwrap()))
        .insert_header(bearer(&ada))
        .set_json(json!({ "author_name": "Someone Else" }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["errors"]["author"].is_array());

    let req = test::TestRequest::patch()
        .uri(&format!("/api/posts/{}/edit", p1["id"].as_str().unwrap()))
        .insert_header(bearer(&ada))
        .set_json(json!({ "author": null, "title": "x" }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["errors"]["author"].is_array());
}

#[actix_rt::test]
async fn test_only_owner_may_delete() {
    let app = test::init_service(common::app()).await;
    let ada = token(&test::call_and_read_body_json(&app, register("ada").to_request()).await);
    let bob = token(&test::call_and_read_body_json(&app, register("bob").to_request()).await);

    let p1: Value = test::call_and_read_body_json(
        &app,
        create_post(&ada, new_post("P1", "Ada", "2025-01-10", true)).to_request(),
    )
    .await;
    let id = p1["id"].as_str().unwrap().to_string();

    let req = test::TestRequest::delete()
        .uri(&format!("/api/posts/{id}/delete/"))
        .insert_header(bearer(&bob))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/posts/{id}/delete/"))
        .insert_header(bearer(&ada))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let req = test::TestRequest::get()
        .uri(&format!("/api/posts/{id}/"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
