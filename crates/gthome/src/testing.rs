//! Recording fakes for the event seams and a storage backend that is down.

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use gthome_core::events::{EmailContent, EmailDispatcher, Event, EventPublisher, Result};
use gthome_core::storage::{self, PageRequest, PhotoRepository, RepositoryError, UserRepository};
use gthome_core::tables::{
    EntityPage, Photo, PhotoMeta, PhotoMetaKey, User, UserMeta, UserMetaKey, UserRole,
};

#[derive(Debug, Default)]
pub struct RecordingPublisher {
    events: Mutex<Vec<Event>>,
}

impl RecordingPublisher {
    pub async fn published(&self) -> Vec<Event> {
        self.events.lock().await.clone()
    }
}

#[async_trait]
impl EventPublisher for RecordingPublisher {
    async fn publish(&self, event: &Event) -> Result<()> {
        self.events.lock().await.push(event.clone());
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct RecordingDispatcher {
    sent: Mutex<Vec<EmailContent>>,
}

impl RecordingDispatcher {
    pub async fn sent(&self) -> Vec<EmailContent> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl EmailDispatcher for RecordingDispatcher {
    async fn dispatch(&self, email: &EmailContent) -> Result<()> {
        self.sent.lock().await.push(email.clone());
        Ok(())
    }
}

/// Reads find nothing and every write fails with `ConnectionFailed`.
#[derive(Debug, Default)]
pub struct UnavailableRepository;

fn unavailable<T>() -> storage::Result<T> {
    Err(RepositoryError::ConnectionFailed(
        "connection refused".to_string(),
    ))
}

#[async_trait]
impl UserRepository for UnavailableRepository {
    async fn get_user(&self, _id: Uuid) -> storage::Result<Option<User>> {
        Ok(None)
    }

    async fn get_user_by_username(&self, _username: &str) -> storage::Result<Option<User>> {
        Ok(None)
    }

    async fn create_user(&self, _user: &User) -> storage::Result<()> {
        unavailable()
    }

    async fn create_user_with_meta(&self, _user: &User, _meta: &[UserMeta]) -> storage::Result<()> {
        unavailable()
    }

    async fn update_user(&self, _user: &User) -> storage::Result<()> {
        unavailable()
    }

    async fn delete_user(&self, _id: Uuid) -> storage::Result<()> {
        unavailable()
    }

    async fn list_users_by_role(&self, _role: UserRole) -> storage::Result<Vec<User>> {
        Ok(Vec::new())
    }

    async fn put_user_meta(&self, _meta: &UserMeta) -> storage::Result<()> {
        unavailable()
    }

    async fn get_user_meta(
        &self,
        _user_id: Uuid,
        _key: UserMetaKey,
    ) -> storage::Result<Option<UserMeta>> {
        Ok(None)
    }
}

#[async_trait]
impl PhotoRepository for UnavailableRepository {
    async fn get_photo(&self, _id: Uuid) -> storage::Result<Option<Photo>> {
        Ok(None)
    }

    async fn create_photo(&self, _photo: &Photo) -> storage::Result<()> {
        unavailable()
    }

    async fn create_photo_with_meta(
        &self,
        _photo: &Photo,
        _meta: &[PhotoMeta],
    ) -> storage::Result<()> {
        unavailable()
    }

    async fn list_photos(&self, _page: PageRequest) -> storage::Result<EntityPage<Photo>> {
        unavailable()
    }

    async fn put_photo_meta(&self, _meta: &PhotoMeta) -> storage::Result<()> {
        unavailable()
    }

    async fn get_photo_meta(
        &self,
        _photo_id: Uuid,
        _key: PhotoMetaKey,
    ) -> storage::Result<Option<PhotoMeta>> {
        Ok(None)
    }
}
