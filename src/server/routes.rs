use crate::core::{Pipeline, ProcessedCsv};
use crate::server::AppState;
use crate::utils::error::{ErrorKind, GeoError};
use axum::extract::multipart::MultipartError;
use axum::extract::{Multipart, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};

const UPLOAD_PAGE: &str = include_str!("static/index.html");

pub const FILE_FIELD: &str = "file";
pub const API_KEY_FIELD: &str = "apiKey";

/// The two form fields the endpoint understands. Anything else in the form is ignored.
#[derive(Debug, Default)]
pub struct UploadForm {
    pub file: Option<Vec<u8>>,
    pub api_key: Option<String>,
}

impl UploadForm {
    pub async fn read(multipart: &mut Multipart) -> Result<Self, MultipartError> {
        let mut form = UploadForm::default();

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().map(str::to_owned);
            match name.as_deref() {
                Some(FILE_FIELD) => form.file = Some(field.bytes().await?.to_vec()),
                Some(API_KEY_FIELD) => form.api_key = Some(field.text().await?),
                _ => {}
            }
        }

        Ok(form)
    }
}

pub async fn upload_page() -> Html<&'static str> {
    Html(UPLOAD_PAGE)
}

pub async fn geolocate<P: Pipeline + 'static>(
    State(state): State<AppState<P>>,
    mut multipart: Multipart,
) -> Response {
    let form = match UploadForm::read(&mut multipart).await {
        Ok(form) => form,
        Err(err) => {
            tracing::debug!("Rejected malformed upload: {}", err);
            return (err.status(), err.body_text()).into_response();
        }
    };

    match state
        .engine
        .run(form.file.as_deref(), form.api_key.as_deref())
        .await
    {
        Ok(output) => csv_response(output),
        Err(err) => error_response(err),
    }
}

fn csv_response(output: ProcessedCsv) -> Response {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename={}", output.file_name),
            ),
        ],
        output.content,
    )
        .into_response()
}

fn error_response(err: GeoError) -> Response {
    match err.kind() {
        ErrorKind::MissingInput | ErrorKind::InvalidInput => {
            tracing::info!("Rejected upload: {}", err);
        }
        ErrorKind::GeocodeRowFailure | ErrorKind::InternalError => {
            tracing::error!("Processing failed: {:?}", err);
        }
    }

    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, err.user_friendly_message()).into_response()
}
