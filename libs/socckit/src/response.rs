use axum::{
    Json,
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};

/// 200 OK + JSON with extra headers.
pub fn ok_json<T: serde::Serialize>(value: T, headers: HeaderMap) -> Response {
    (StatusCode::OK, headers, Json(value)).into_response()
}

/// 201 Created + JSON with a `Location` of `<collection>/<id>`.
pub fn created_json<T: serde::Serialize>(
    value: T,
    collection_path: &str,
    new_id: &str,
    mut headers: HeaderMap,
) -> Response {
    let location = [collection_path.trim_end_matches('/'), new_id].join("/");
    if let Ok(location) = HeaderValue::from_str(&location) {
        headers.insert(header::LOCATION, location);
    }
    (StatusCode::CREATED, headers, Json(value)).into_response()
}

/// 200 OK with an empty body and extra headers.
pub fn ok_empty(headers: HeaderMap) -> Response {
    (StatusCode::OK, headers).into_response()
}
