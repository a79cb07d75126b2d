mod common;

use axum::http::StatusCode;
use common::{assert_redirect, json, spawn_app};

#[tokio::test]
async fn client_places_an_order() {
    let app = spawn_app().await;
    let supplier = app.supplier("prov").await;
    let client = app.client("cli").await;
    app.item(&supplier, 5).await;

    let body = json(app.get("/item/5/", Some(&client.cookie)).await).await;
    assert_eq!(body["ordered"], false);
    assert_eq!(body["state"], "unordered");

    let response = app
        .post(
            "/item/5/order/",
            Some(&client.cookie),
            "is_urgent=on&branch=on&quantity=3",
        )
        .await;
    assert_redirect(&response, "/");

    let order = app.repo().find_order_for(client.id, 5).await.unwrap().unwrap();
    assert!(order.is_urgent);
    assert!(order.branch);
    assert!(!order.distribution_center);
    assert_eq!(order.quantity, 3);

    let body = json(app.get("/item/5/", Some(&client.cookie)).await).await;
    assert_eq!(body["ordered"], true);
    assert_eq!(body["state"], "dispatch_pending");
    assert_eq!(body["order"]["order_no"], order.order_no);
}

#[tokio::test]
async fn second_order_for_same_item_is_refused() {
    let app = spawn_app().await;
    let supplier = app.supplier("prov").await;
    let client = app.client("cli").await;
    app.item(&supplier, 5).await;
    app.order(&client, 5, (true, false, false)).await;

    let response = app
        .post("/item/5/order/", Some(&client.cookie), "quantity=1")
        .await;
    assert_redirect(&response, "/?error=order_exists");
    assert_eq!(response.headers()["x-error-code"], "DUPLICATE_ORDER");

    let response = app.get("/item/5/order/", Some(&client.cookie)).await;
    assert_redirect(&response, "/?error=order_exists");

    assert_eq!(app.repo().count_orders_for(client.id, 5).await.unwrap(), 1);
}

#[tokio::test]
async fn orders_are_per_client() {
    let app = spawn_app().await;
    let supplier = app.supplier("prov").await;
    let first = app.client("cli1").await;
    let second = app.client("cli2").await;
    app.item(&supplier, 5).await;
    app.order(&first, 5, (true, false, false)).await;

    let response = app.get("/item/5/order/", Some(&second.cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .post("/item/5/order/", Some(&second.cookie), "quantity=1")
        .await;
    assert_redirect(&response, "/");
}

#[tokio::test]
async fn invalid_quantity_is_a_field_error() {
    let app = spawn_app().await;
    let supplier = app.supplier("prov").await;
    let client = app.client("cli").await;
    app.item(&supplier, 5).await;

    let response = app
        .post("/item/5/order/", Some(&client.cookie), "quantity=cero")
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json(response).await;
    assert!(body["errors"]["quantity"].is_array());
    assert_eq!(body["item"]["code"], 5);

    assert!(app.repo().find_order_for(client.id, 5).await.unwrap().is_none());
}

#[tokio::test]
async fn client_edits_own_order() {
    let app = spawn_app().await;
    let supplier = app.supplier("prov").await;
    let client = app.client("cli").await;
    app.item(&supplier, 5).await;
    let order_no = app.order(&client, 5, (true, false, false)).await;
    let before = app.repo().find_order(order_no).await.unwrap().unwrap();

    let uri = format!("/item/5/order/edit/{}/", order_no);
    let body = json(app.get(&uri, Some(&client.cookie)).await).await;
    assert_eq!(body["values"]["distribution_center"], "on");
    assert_eq!(body["values"]["quantity"], "2");

    let response = app
        .post(&uri, Some(&client.cookie), "associated_company=on&quantity=9")
        .await;
    assert_redirect(&response, "/");

    let after = app.repo().find_order(order_no).await.unwrap().unwrap();
    assert!(!after.distribution_center);
    assert!(after.associated_company);
    assert_eq!(after.quantity, 9);
    assert_eq!(after.client_id, before.client_id);
    assert_eq!(after.item_code, before.item_code);
    assert_eq!(after.created_at.timestamp(), before.created_at.timestamp());
}

#[tokio::test]
async fn other_clients_cannot_touch_an_order() {
    let app = spawn_app().await;
    let supplier = app.supplier("prov").await;
    let owner = app.client("owner").await;
    let other = app.client("other").await;
    app.item(&supplier, 5).await;
    let order_no = app.order(&owner, 5, (true, false, false)).await;

    let uri = format!("/item/5/order/edit/{}/", order_no);
    let response = app.post(&uri, Some(&other.cookie), "quantity=50").await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app.get(&format!("{}delete/", uri), Some(&other.cookie)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let order = app.repo().find_order(order_no).await.unwrap().unwrap();
    assert_eq!(order.quantity, 2);
}

#[tokio::test]
async fn order_must_belong_to_the_item_in_the_path() {
    let app = spawn_app().await;
    let supplier = app.supplier("prov").await;
    let client = app.client("cli").await;
    app.item(&supplier, 5).await;
    app.item(&supplier, 6).await;
    let order_no = app.order(&client, 5, (true, false, false)).await;

    let response = app
        .get(&format!("/item/6/order/edit/{}/", order_no), Some(&client.cookie))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .get(
            &format!("/supplier/item/6/order/edit/{}/", order_no),
            Some(&supplier.cookie),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn deleting_an_order_removes_its_fulfillment() {
    let app = spawn_app().await;
    let supplier = app.supplier("prov").await;
    let client = app.client("cli").await;
    app.item(&supplier, 5).await;
    let order_no = app.order(&client, 5, (true, false, false)).await;

    let response = app
        .post(
            &format!("/supplier/item/5/order/edit/{}/", order_no),
            Some(&supplier.cookie),
            "warehouse=Central",
        )
        .await;
    assert_redirect(&response, "/supplier/");

    let response = app
        .post(
            &format!("/item/5/order/edit/{}/delete/", order_no),
            Some(&client.cookie),
            "",
        )
        .await;
    assert_redirect(&response, "/");

    let repo = app.repo();
    assert!(repo.find_order(order_no).await.unwrap().is_none());
    assert!(repo.find_fulfillment(order_no).await.unwrap().is_none());
    assert!(repo.find_item(5).await.unwrap().is_some());

    // the pair can be ordered again
    let response = app.get("/item/5/order/", Some(&client.cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn destination_precedence_picks_the_dispatch_form() {
    let app = spawn_app().await;
    let supplier = app.supplier("prov").await;
    let client = app.client("cli").await;
    app.item(&supplier, 5).await;
    let order_no = app.order(&client, 5, (true, true, true)).await;
    let uri = format!("/supplier/item/5/order/edit/{}/", order_no);

    let body = json(app.get(&uri, Some(&supplier.cookie)).await).await;
    assert_eq!(body["destination"], "distribution_center");
    assert_eq!(body["required_fields"], serde_json::json!(["warehouse"]));
    assert_eq!(body["state"], "dispatch_pending");

    // branch fields do not satisfy a distribution center order
    let response = app
        .post(&uri, Some(&supplier.cookie), "reference=R&branch_code=4")
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json(response).await;
    assert!(body["errors"]["warehouse"].is_array());
    assert!(app.repo().find_fulfillment(order_no).await.unwrap().is_none());

    let response = app
        .post(&uri, Some(&supplier.cookie), "warehouse=Bodega+1")
        .await;
    assert_redirect(&response, "/supplier/");

    let record = app.repo().find_fulfillment(order_no).await.unwrap().unwrap();
    assert_eq!(record.warehouse, "Bodega 1");
    assert_eq!(record.branch_code, None);

    let body = json(app.get("/item/5/", Some(&client.cookie)).await).await;
    assert_eq!(body["state"], "managed");
    assert_eq!(body["fulfillment"]["warehouse"], "Bodega 1");
}

#[tokio::test]
async fn associated_company_dispatch() {
    let app = spawn_app().await;
    let supplier = app.supplier("prov").await;
    let client = app.client("cli").await;
    app.item(&supplier, 5).await;
    let order_no = app.order(&client, 5, (false, false, true)).await;

    let response = app
        .post(
            &format!("/supplier/item/5/order/edit/{}/", order_no),
            Some(&supplier.cookie),
            "reference=AC-7&branch_code=31&details=Entrega+en+muelle+2",
        )
        .await;
    assert_redirect(&response, "/supplier/");

    let record = app.repo().find_fulfillment(order_no).await.unwrap().unwrap();
    assert_eq!(record.reference, "AC-7");
    assert_eq!(record.branch_code, Some(31));
    assert_eq!(record.details, "Entrega en muelle 2");
}

#[tokio::test]
async fn an_order_is_managed_once() {
    let app = spawn_app().await;
    let supplier = app.supplier("prov").await;
    let client = app.client("cli").await;
    app.item(&supplier, 5).await;
    let order_no = app.order(&client, 5, (false, true, false)).await;
    let uri = format!("/supplier/item/5/order/edit/{}/", order_no);

    let response = app
        .post(&uri, Some(&supplier.cookie), "reference=R-1&branch_code=1")
        .await;
    assert_redirect(&response, "/supplier/");

    let response = app
        .post(&uri, Some(&supplier.cookie), "reference=R-2&branch_code=2")
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let record = app.repo().find_fulfillment(order_no).await.unwrap().unwrap();
    assert_eq!(record.reference, "R-1");
}

#[tokio::test]
async fn order_without_destination_cannot_be_dispatched() {
    let app = spawn_app().await;
    let supplier = app.supplier("prov").await;
    let client = app.client("cli").await;
    app.item(&supplier, 5).await;
    let order_no = app.order(&client, 5, (false, false, false)).await;
    let uri = format!("/supplier/item/5/order/edit/{}/", order_no);

    let body = json(app.get(&uri, Some(&supplier.cookie)).await).await;
    assert!(body["destination"].is_null());
    assert_eq!(body["state"], "ordered");
    assert!(body["errors"]["__all__"].is_array());

    let response = app.post(&uri, Some(&supplier.cookie), "warehouse=X").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(app.repo().find_fulfillment(order_no).await.unwrap().is_none());
}

#[tokio::test]
async fn only_the_item_owner_dispatches() {
    let app = spawn_app().await;
    let owner = app.supplier("owner").await;
    let other = app.supplier("other").await;
    let client = app.client("cli").await;
    app.item(&owner, 5).await;
    let order_no = app.order(&client, 5, (true, false, false)).await;

    let response = app
        .post(
            &format!("/supplier/item/5/order/edit/{}/", order_no),
            Some(&other.cookie),
            "warehouse=X",
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(app.repo().find_fulfillment(order_no).await.unwrap().is_none());
}
