use axum::{
    Json, Router,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    response::Json as ResponseJson,
    routing::{get, post},
};
use indexmap::IndexMap;
use utils::response::ApiResponse;

use crate::{
    error::ApiError,
    service::{
        ConnectRequest, ConnectionRequest, RouteResponse, RouterList, RouterRequest,
        StatusResponse, TopologyService,
    },
};

pub async fn add_router(
    State(service): State<TopologyService>,
    payload: Result<Json<RouterRequest>, JsonRejection>,
) -> Result<ResponseJson<StatusResponse>, ApiError> {
    let Json(payload) = payload?;
    Ok(ResponseJson(service.add_router(payload).await?))
}

pub async fn connect(
    State(service): State<TopologyService>,
    payload: Result<Json<ConnectRequest>, JsonRejection>,
) -> Result<ResponseJson<StatusResponse>, ApiError> {
    let Json(payload) = payload?;
    Ok(ResponseJson(service.connect(payload).await?))
}

pub async fn remove_router(
    State(service): State<TopologyService>,
    payload: Result<Json<RouterRequest>, JsonRejection>,
) -> Result<ResponseJson<StatusResponse>, ApiError> {
    let Json(payload) = payload?;
    Ok(ResponseJson(service.remove_router(payload).await))
}

pub async fn remove_connection(
    State(service): State<TopologyService>,
    payload: Result<Json<ConnectionRequest>, JsonRejection>,
) -> Result<ResponseJson<StatusResponse>, ApiError> {
    let Json(payload) = payload?;
    Ok(ResponseJson(service.remove_connection(payload).await))
}

pub async fn route(
    State(service): State<TopologyService>,
    payload: Result<Json<ConnectionRequest>, JsonRejection>,
) -> Result<ResponseJson<RouteResponse>, ApiError> {
    let Json(payload) = payload?;
    Ok(ResponseJson(service.route(payload).await?))
}

pub async fn connection_status(
    State(service): State<TopologyService>,
    query: Result<Query<ConnectionRequest>, QueryRejection>,
) -> Result<ResponseJson<StatusResponse>, ApiError> {
    let Query(query) = query?;
    Ok(ResponseJson(service.connection_status(query).await?))
}

pub async fn list_routers(
    State(service): State<TopologyService>,
) -> ResponseJson<ApiResponse<RouterList>> {
    ResponseJson(ApiResponse::success(service.list_routers().await))
}

pub async fn get_neighbors(
    State(service): State<TopologyService>,
    Path(name): Path<String>,
) -> Result<ResponseJson<ApiResponse<IndexMap<String, f64>>>, ApiError> {
    let neighbors = service.neighbors(&name).await?;
    Ok(ResponseJson(ApiResponse::success(neighbors)))
}

pub async fn get_distances(
    State(service): State<TopologyService>,
    Path(name): Path<String>,
) -> Result<ResponseJson<ApiResponse<IndexMap<String, f64>>>, ApiError> {
    let distances = service.distances(&name).await?;
    Ok(ResponseJson(ApiResponse::success(distances)))
}

pub fn router() -> Router<TopologyService> {
    Router::new()
        .route("/addrouter", post(add_router))
        .route("/connect", post(connect))
        .route("/removerouter", post(remove_router))
        .route("/removeconnection", post(remove_connection))
        .route("/route", post(route))
        .route("/routers", get(list_routers))
        .route("/routers/{name}/neighbors", get(get_neighbors))
        .route("/routers/{name}/distances", get(get_distances))
        .route("/connection/status", get(connection_status))
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode, header},
    };
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use crate::{routes::app, service::TopologyService};

    async fn send(service: &TopologyService, request: Request<Body>) -> (StatusCode, Value) {
        let response = app(service.clone()).oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    async fn post(service: &TopologyService, uri: &str, body: Value) -> Value {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let (status, json) = send(service, request).await;
        assert_eq!(status, StatusCode::OK, "{} -> {}", uri, json);
        json
    }

    async fn get(service: &TopologyService, uri: &str) -> (StatusCode, Value) {
        send(service, Request::builder().uri(uri).body(Body::empty()).unwrap()).await
    }

    #[tokio::test]
    async fn test_add_router_statuses() {
        let service = TopologyService::default();

        assert_eq!(
            post(&service, "/addrouter", json!({ "name": "A" })).await,
            json!({ "status": "success" })
        );
        assert_eq!(
            post(&service, "/addrouter", json!({ "name": "A" })).await,
            json!({ "status": "Error, node already exists" })
        );
    }

    #[tokio::test]
    async fn test_connect_accepts_integer_weights() {
        let service = TopologyService::default();
        post(&service, "/addrouter", json!({ "name": "A" })).await;
        post(&service, "/addrouter", json!({ "name": "B" })).await;

        assert_eq!(
            post(&service, "/connect", json!({ "from": "A", "to": "B", "weight": 10 })).await,
            json!({ "status": "success" })
        );
        assert_eq!(
            post(&service, "/connect", json!({ "from": "A", "to": "B", "weight": 3 })).await,
            json!({ "status": "updated" })
        );
        assert_eq!(
            post(&service, "/connect", json!({ "from": "A", "to": "X", "weight": 3 })).await,
            json!({ "status": "Error, router does not exist" })
        );

        let (status, neighbors) = get(&service, "/routers/B/neighbors").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(neighbors, json!({ "success": true, "data": { "A": 3.0 } }));
    }

    #[tokio::test]
    async fn test_unknown_router_lookups_are_not_found() {
        let service = TopologyService::default();

        let (status, body) = get(&service, "/routers/Z/neighbors").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "success": false, "message": "Router not found: Z" }));

        let (status, _) = get(&service, "/routers/Z/distances").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_connection_status_preview() {
        let service = TopologyService::default();
        post(&service, "/addrouter", json!({ "name": "A" })).await;
        post(&service, "/addrouter", json!({ "name": "B" })).await;

        let (_, before) = get(&service, "/connection/status?from=A&to=B").await;
        assert_eq!(before, json!({ "status": "success" }));

        post(&service, "/connect", json!({ "from": "A", "to": "B", "weight": 1 })).await;
        let (_, after) = get(&service, "/connection/status?from=B&to=A").await;
        assert_eq!(after, json!({ "status": "updated" }));

        let (_, missing) = get(&service, "/connection/status?from=A&to=Q").await;
        assert_eq!(missing, json!({ "status": "Error, router does not exist" }));
    }

    #[tokio::test]
    async fn test_malformed_requests_are_bad_requests() {
        let service = TopologyService::default();

        let request = Request::builder()
            .method("POST")
            .uri("/connect")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"from":"A","to":"B"}"#))
            .unwrap();
        let (status, body) = send(&service, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], json!(false));
        assert!(body["message"].as_str().unwrap().contains("weight"));

        let request = Request::builder()
            .method("POST")
            .uri("/addrouter")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("not json"))
            .unwrap();
        let (status, body) = send(&service, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], json!(false));

        let (status, body) = get(&service, "/connection/status?from=A").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], json!(false));
    }

    #[tokio::test]
    async fn test_list_routers_in_insertion_order() {
        let service = TopologyService::default();
        for name in ["gw", "core", "edge"] {
            post(&service, "/addrouter", json!({ "name": name })).await;
        }

        let (status, body) = get(&service, "/routers").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["routers"], json!(["gw", "core", "edge"]));
        assert_eq!(body["data"]["version"], json!(3));
    }
}
