use serde::Serialize;
use serde_json::json;
use std::convert::Infallible;
use tracing::warn;
use warp::http::StatusCode;
use warp::reply::{self, Response};
use warp::{Rejection, Reply};

/// Serializes a body into a JSON response with the given status
pub fn json_response<T: Serialize>(body: &T, status: StatusCode) -> Response {
    reply::with_status(reply::json(body), status).into_response()
}

/// JSON response of the form `{"error": message}`
pub fn error_response(message: impl ToString, status: StatusCode) -> Response {
    json_response(&json!({ "error": message.to_string() }), status)
}

/// Converts rejections into JSON error responses
///
/// Intended to be passed to [`Filter::recover`](warp::Filter::recover) as the last step of a route tree.
pub async fn recover_rejection(rejection: Rejection) -> Result<Response, Infallible> {
    if rejection.is_not_found() {
        Ok(error_response("Not found", StatusCode::NOT_FOUND))
    } else if let Some(error) = rejection.find::<warp::filters::body::BodyDeserializeError>() {
        Ok(error_response(error, StatusCode::BAD_REQUEST))
    } else if rejection.find::<warp::reject::PayloadTooLarge>().is_some() {
        Ok(error_response("Payload too large", StatusCode::PAYLOAD_TOO_LARGE))
    } else if rejection.find::<warp::reject::MethodNotAllowed>().is_some() {
        Ok(error_response("Method not allowed", StatusCode::METHOD_NOT_ALLOWED))
    } else {
        warn!(?rejection, "Unhandled rejection");
        Ok(error_response("Bad request", StatusCode::BAD_REQUEST))
    }
}
