//! JSON body extractor whose rejections use the error envelope

use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json as AxumJson,
};
use serde::de::DeserializeOwned;

use super::error::ApiError;

/// `axum::Json` with body rejections reported as 400 `BAD_REQUEST`
#[derive(Debug, Clone, Copy, Default)]
pub struct Json<T>(pub T);

impl<T> Json<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<S, T> FromRequest<S> for Json<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match AxumJson::<T>::from_request(req, state).await {
            Ok(AxumJson(value)) => Ok(Json(value)),
            Err(rejection) => Err(ApiError::bad_request(rejection_message(&rejection))),
        }
    }
}

fn rejection_message(rejection: &JsonRejection) -> String {
    match rejection {
        JsonRejection::JsonDataError(err) => format!("Invalid JSON data: {}", err.body_text()),
        JsonRejection::JsonSyntaxError(err) => {
            format!("Invalid JSON syntax: {}", err.body_text())
        }
        JsonRejection::MissingJsonContentType(_) => {
            "Missing Content-Type header. Expected 'application/json'.".to_string()
        }
        JsonRejection::BytesRejection(err) => {
            format!("Failed to read request body: {}", err.body_text())
        }
        _ => "Invalid JSON request".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, StatusCode};
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Payload {
        name: String,
    }

    fn request(content_type: Option<&str>, body: &'static str) -> Request {
        let mut builder = Request::builder().method("POST").uri("/");
        if let Some(ct) = content_type {
            builder = builder.header(header::CONTENT_TYPE, ct);
        }
        builder.body(Body::from(body)).unwrap()
    }

    #[tokio::test]
    async fn test_valid_body() {
        let Json(body) = Json::<Payload>::from_request(
            request(Some("application/json"), r#"{"name":"kim"}"#),
            &(),
        )
        .await
        .unwrap();

        assert_eq!(body.name, "kim");
    }

    #[tokio::test]
    async fn test_rejections_are_bad_request() {
        let syntax = Json::<Payload>::from_request(request(Some("application/json"), "{"), &())
            .await
            .unwrap_err();
        assert_eq!(syntax.status, StatusCode::BAD_REQUEST);
        assert!(syntax.body.error.message.starts_with("Invalid JSON syntax"));

        let missing = Json::<Payload>::from_request(request(None, r#"{"name":"kim"}"#), &())
            .await
            .unwrap_err();
        assert_eq!(missing.status, StatusCode::BAD_REQUEST);

        let data = Json::<Payload>::from_request(
            request(Some("application/json"), r#"{"name":1}"#),
            &(),
        )
        .await
        .unwrap_err();
        assert!(data.body.error.message.starts_with("Invalid JSON data"));
    }
}
