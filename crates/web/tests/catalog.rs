mod common;

use axum::http::StatusCode;
use common::{assert_redirect, json, spawn_app};

#[tokio::test]
async fn supplier_creates_item_visible_to_clients() {
    let app = spawn_app().await;
    let supplier = app.supplier("prov").await;
    let client = app.client("cli").await;

    let response = app
        .post(
            "/supplier/item/create/",
            Some(&supplier.cookie),
            "code=101&description=Tornillo+3mm&price=12.5",
        )
        .await;
    assert_redirect(&response, "/supplier/");

    let item = app.repo().find_item(101).await.unwrap().unwrap();
    assert_eq!(item.supplier_id, supplier.id);
    assert_eq!(item.price, 12.5);

    let body = json(app.get("/supplier/", Some(&supplier.cookie)).await).await;
    assert_eq!(body["items"].as_array().unwrap().len(), 1);

    let body = json(app.get("/", Some(&client.cookie)).await).await;
    assert_eq!(body["items"][0]["code"], 101);
}

#[tokio::test]
async fn supplier_home_lists_only_own_items() {
    let app = spawn_app().await;
    let first = app.supplier("prov1").await;
    let second = app.supplier("prov2").await;
    app.item(&first, 1).await;
    app.item(&second, 2).await;
    app.item(&second, 3).await;

    let body = json(app.get("/supplier/", Some(&second.cookie)).await).await;
    let codes: Vec<i64> = body["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["code"].as_i64().unwrap())
        .collect();
    assert_eq!(codes, vec![2, 3]);
}

#[tokio::test]
async fn invalid_item_form_is_redisplayed() {
    let app = spawn_app().await;
    let supplier = app.supplier("prov").await;
    app.item(&supplier, 7).await;

    let response = app
        .post(
            "/supplier/item/create/",
            Some(&supplier.cookie),
            "code=7&description=Repetido&price=1",
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json(response).await;
    assert!(body["errors"]["code"].is_array());

    let response = app
        .post(
            "/supplier/item/create/",
            Some(&supplier.cookie),
            "code=8&description=&price=-3",
        )
        .await;
    let body = json(response).await;
    assert!(body["errors"]["description"].is_array());
    assert!(body["errors"]["price"].is_array());
    assert!(app.repo().find_item(8).await.unwrap().is_none());
}

#[tokio::test]
async fn edit_keeps_the_code() {
    let app = spawn_app().await;
    let supplier = app.supplier("prov").await;
    app.item(&supplier, 5).await;

    let body = json(app.get("/supplier/item/5/edit/", Some(&supplier.cookie)).await).await;
    assert_eq!(body["values"]["code"], "5");

    let response = app
        .post(
            "/supplier/item/5/edit/",
            Some(&supplier.cookie),
            "code=999&description=Nuevo&price=2",
        )
        .await;
    assert_redirect(&response, "/supplier/");

    let item = app.repo().find_item(5).await.unwrap().unwrap();
    assert_eq!(item.description, "Nuevo");
    assert_eq!(item.price, 2.0);
    assert!(app.repo().find_item(999).await.unwrap().is_none());
}

#[tokio::test]
async fn other_suppliers_cannot_touch_an_item() {
    let app = spawn_app().await;
    let owner = app.supplier("owner").await;
    let other = app.supplier("other").await;
    app.item(&owner, 5).await;

    let response = app
        .post(
            "/supplier/item/5/edit/",
            Some(&other.cookie),
            "description=Robado&price=1",
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app.get("/supplier/item/5/delete/", Some(&other.cookie)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app.get("/supplier/item/5/", Some(&other.cookie)).await;
    assert_redirect(&response, "/supplier/");

    let item = app.repo().find_item(5).await.unwrap().unwrap();
    assert_eq!(item.description, "Articulo 5");
}

#[tokio::test]
async fn missing_item_is_not_found() {
    let app = spawn_app().await;
    let supplier = app.supplier("prov").await;
    let client = app.client("cli").await;

    let response = app.get("/supplier/item/404/edit/", Some(&supplier.cookie)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app.get("/item/404/", Some(&client.cookie)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn deleting_an_item_cascades() {
    let app = spawn_app().await;
    let supplier = app.supplier("prov").await;
    let client = app.client("cli").await;
    app.item(&supplier, 5).await;
    let order_no = app.order(&client, 5, (true, false, false)).await;

    let response = app
        .post(
            &format!("/supplier/item/5/order/edit/{}/", order_no),
            Some(&supplier.cookie),
            "warehouse=Bodega+Sur",
        )
        .await;
    assert_redirect(&response, "/supplier/");

    let response = app.get("/supplier/item/5/delete/", Some(&supplier.cookie)).await;
    assert_redirect(&response, "/supplier/");

    let repo = app.repo();
    assert!(repo.find_item(5).await.unwrap().is_none());
    assert!(repo.find_order(order_no).await.unwrap().is_none());
    assert!(repo.find_fulfillment(order_no).await.unwrap().is_none());
}

#[tokio::test]
async fn supplier_item_detail_lists_orders_with_state() {
    let app = spawn_app().await;
    let supplier = app.supplier("prov").await;
    let first = app.client("cli1").await;
    let second = app.client("cli2").await;
    app.item(&supplier, 5).await;
    let managed = app.order(&first, 5, (false, true, false)).await;
    app.order(&second, 5, (false, false, true)).await;

    let response = app
        .post(
            &format!("/supplier/item/5/order/edit/{}/", managed),
            Some(&supplier.cookie),
            "reference=REF-1&branch_code=12",
        )
        .await;
    assert_redirect(&response, "/supplier/");

    let body = json(app.get("/supplier/item/5/", Some(&supplier.cookie)).await).await;
    assert_eq!(body["item"]["code"], 5);
    let orders = body["orders"].as_array().unwrap();
    assert_eq!(orders.len(), 2);
    assert_eq!(orders[0]["state"], "managed");
    assert_eq!(orders[0]["fulfillment"]["branch_code"], 12);
    assert_eq!(orders[1]["state"], "dispatch_pending");
    assert!(orders[1]["fulfillment"].is_null());
}
