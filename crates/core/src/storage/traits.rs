use async_trait::async_trait;
use uuid::Uuid;

use crate::tables::{
    EntityPage, Photo, PhotoMeta, PhotoMetaKey, User, UserMeta, UserMetaKey, UserRole,
};

use super::{PageRequest, Result};

/// Repository for user records and their meta rows.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Gets a user by their ID.
    async fn get_user(&self, id: Uuid) -> Result<Option<User>>;

    /// Gets a user by username through the sparse index.
    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>>;

    /// Creates a new user. Fails with `AlreadyExists` when the id or the
    /// username is taken.
    async fn create_user(&self, user: &User) -> Result<()>;

    /// Creates a user together with its meta rows in one write. Nothing is
    /// stored when any part fails, including a meta row that belongs to
    /// another user.
    async fn create_user_with_meta(&self, user: &User, meta: &[UserMeta]) -> Result<()>;

    /// Updates an existing user.
    async fn update_user(&self, user: &User) -> Result<()>;

    /// Deletes a user and every meta row under its partition.
    async fn delete_user(&self, id: Uuid) -> Result<()>;

    /// Lists users holding a role through `GSI1`.
    async fn list_users_by_role(&self, role: UserRole) -> Result<Vec<User>>;

    /// Writes a meta row, replacing any previous value for the same key.
    async fn put_user_meta(&self, meta: &UserMeta) -> Result<()>;

    async fn get_user_meta(&self, user_id: Uuid, key: UserMetaKey) -> Result<Option<UserMeta>>;
}

/// Repository for photo attachments and their meta rows.
#[async_trait]
pub trait PhotoRepository: Send + Sync {
    async fn get_photo(&self, id: Uuid) -> Result<Option<Photo>>;

    /// Creates a new photo. Fails with `AlreadyExists` when the id is taken.
    async fn create_photo(&self, photo: &Photo) -> Result<()>;

    /// Creates a photo together with its meta rows in one write.
    async fn create_photo_with_meta(&self, photo: &Photo, meta: &[PhotoMeta]) -> Result<()>;

    /// Lists photos through `GSI1`, one page at a time.
    async fn list_photos(&self, page: PageRequest) -> Result<EntityPage<Photo>>;

    async fn put_photo_meta(&self, meta: &PhotoMeta) -> Result<()>;

    async fn get_photo_meta(
        &self,
        photo_id: Uuid,
        key: PhotoMetaKey,
    ) -> Result<Option<PhotoMeta>>;
}
