use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use gthome_core::auth::email_to_name;
use gthome_core::http::{Request, ResourceAction, Response, ResponseStatus};
use gthome_core::serde::deserialize_optional_string;
use gthome_core::storage::{Cursor, PageRequest};
use gthome_core::tables::{Photo, PhotoMeta, PhotoMetaKey, UserRole};

use super::{require_role, AppError, RequestError};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatePhotoBody {
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    uri: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    title: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    caption: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    alt: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    description: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    file_name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    file_mime_type: Option<String>,
}

/// Photo as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoView {
    pub id: Uuid,
    pub uri: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl From<Photo> for PhotoView {
    fn from(photo: Photo) -> Self {
        Self {
            id: photo.id(),
            uri: photo.uri,
            title: photo.title,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PhotoPage {
    items: Vec<PhotoView>,
    last_evaluated: Option<String>,
}

/// Register an uploaded photo (POST /photos).
pub async fn create_photo_attachment(
    state: &AppState,
    request: &Request,
) -> Result<Response, AppError> {
    require_role(
        request,
        ResourceAction::CreatePhotoAttachment,
        UserRole::can_upload_media,
    )?;

    let body: CreatePhotoBody = request.json_body()?;
    let uri = body.uri.ok_or(RequestError::MissingField("uri"))?;
    let uri = uri.trim();
    if !(uri.starts_with("https://") || uri.starts_with("http://")) {
        return Err(RequestError::invalid("uri", "must be an http(s) URL").into());
    }

    let mut photo = Photo::new(uri);
    if let Some(title) = &body.title {
        photo = photo.with_title(title.trim());
    }
    let id = photo.id();
    let uploaded_by = request.email.as_deref().map(email_to_name).unwrap_or_default();
    let mut meta = vec![
        PhotoMeta::timestamp(id, PhotoMetaKey::UploadedAt, Utc::now()),
        PhotoMeta::new(id, PhotoMetaKey::UploadedById, request.subject.clone().unwrap_or_default()),
        PhotoMeta::new(id, PhotoMetaKey::UploadedByName, uploaded_by),
    ];
    let optional = [
        (PhotoMetaKey::Title, body.title),
        (PhotoMetaKey::Caption, body.caption),
        (PhotoMetaKey::Alt, body.alt),
        (PhotoMetaKey::Description, body.description),
        (PhotoMetaKey::FileName, body.file_name),
        (PhotoMetaKey::FileMimeType, body.file_mime_type),
    ];
    meta.extend(
        optional
            .into_iter()
            .filter_map(|(key, value)| value.map(|value| PhotoMeta::new(id, key, value.trim()))),
    );
    state.photos.create_photo_with_meta(&photo, &meta).await?;

    tracing::info!(photo_id = %id, uploaded_by = ?request.subject, "photo attachment created");

    let mut response = Response::json(ResponseStatus::Created, &PhotoView::from(photo))?;
    response.headers_mut().content_location = Some(format!("/photos/{id}"));
    Ok(response)
}

/// List photos one page at a time (GET /photos).
///
/// `limit` defaults to the configured page size; `cursor` is the
/// `Last-Evaluated` value of the previous page.
pub async fn list_photo_attachments(
    state: &AppState,
    request: &Request,
) -> Result<Response, AppError> {
    let limit = match request.query_param("limit") {
        Some(raw) => raw
            .trim()
            .parse::<usize>()
            .map_err(|_| RequestError::invalid("limit", "must be a positive integer"))?,
        None => state.config.page_size,
    };
    let cursor = request.query_param("cursor").map(Cursor::decode).transpose()?;

    let page = state
        .photos
        .list_photos(PageRequest::new(limit).with_cursor(cursor))
        .await?;
    let (photos, last_evaluated) = page.into_parts();
    let items: Vec<PhotoView> = photos.into_iter().map(PhotoView::from).collect();

    tracing::debug!(count = items.len(), has_more = last_evaluated.is_some(), "listed photos");

    let mut response = Response::json(
        ResponseStatus::Ok,
        &PhotoPage {
            items,
            last_evaluated: last_evaluated.clone(),
        },
    )?;
    response.headers_mut().last_evaluated = last_evaluated;
    Ok(response)
}
