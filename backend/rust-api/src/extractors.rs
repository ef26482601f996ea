use axum::{
    extract::{FromRequest, Request},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// JSON body extractor whose rejections use the same `{message, status}`
/// shape as `ApiError` instead of axum's plain-text bodies.
pub struct AppJson<T>(pub T);

impl<T, S> FromRequest<S> for AppJson<T>
where
    T: serde::de::DeserializeOwned + 'static,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(AppJson(value)),
            Err(rejection) => {
                let status = rejection.status();
                let message = format!("Invalid answer payload: {}", rejection.body_text());
                tracing::warn!("{}", message);
                Err((
                    status,
                    Json(json!({
                        "message": message,
                        "status": status.as_u16()
                    })),
                )
                    .into_response())
            }
        }
    }
}
