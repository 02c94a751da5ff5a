//! In-memory repository implementation.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

use gthome_core::storage::{
    Cursor, PageRequest, PhotoRepository, RepositoryError, Result, UserRepository,
};
use gthome_core::tables::{
    keys, DomainLabel, EntityPage, Photo, PhotoMeta, PhotoMetaKey, PrimaryKey, Record,
    RecordKind, User, UserMeta, UserMetaKey, UserRole, ATTR_KIND, ATTR_PK, ATTR_PK1, ATTR_SI,
    ATTR_SK, ATTR_SK1,
};

type ItemKey = (String, String);

/// In-memory single-table storage.
///
/// Uses a `BTreeMap` wrapped in `Arc<RwLock<_>>` so scans come back in key
/// order, the way a DynamoDB query over one partition would.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRepository {
    items: Arc<RwLock<BTreeMap<ItemKey, Value>>>,
}

impl InMemoryRepository {
    /// Creates a new empty in-memory repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored items, across every kind.
    pub async fn len(&self) -> usize {
        self.items.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.items.read().await.is_empty()
    }
}

fn item_key(key: &PrimaryKey) -> ItemKey {
    (key.pk().to_string(), key.sk().to_string())
}

fn encode(record: impl Into<Record>) -> Result<Value> {
    record
        .into()
        .to_json()
        .map_err(|e| RepositoryError::Serialization(e.to_string()))
}

fn decode<T: DeserializeOwned>(item: &Value) -> Result<T> {
    serde_json::from_value(item.clone()).map_err(|e| RepositoryError::Serialization(e.to_string()))
}

fn attr<'a>(item: &'a Value, name: &str) -> Option<&'a str> {
    item.get(name).and_then(Value::as_str)
}

/// Items a `GSI1` query on `PK1 = domain AND SK1 = sk1` would return,
/// narrowed to one record kind.
fn gsi1_matches(item: &Value, domain: DomainLabel, sk1: &str, kind: RecordKind) -> bool {
    attr(item, ATTR_PK1) == Some(domain.as_str())
        && attr(item, ATTR_SK1) == Some(sk1)
        && attr(item, ATTR_KIND) == Some(kind.as_str())
}

fn cursor_for(item: &Value) -> Cursor {
    Cursor::from_pairs(
        [ATTR_PK, ATTR_SK, ATTR_PK1, ATTR_SK1]
            .into_iter()
            .filter_map(|name| attr(item, name).map(|value| (name, value))),
    )
}

fn cursor_position(cursor: &Cursor) -> Result<ItemKey> {
    match (cursor.get(ATTR_PK), cursor.get(ATTR_SK)) {
        (Some(pk), Some(sk)) => Ok((pk.to_string(), sk.to_string())),
        _ => Err(RepositoryError::InvalidData(
            "cursor is missing its key attributes".to_string(),
        )),
    }
}

/// Key for a new user, once neither its id nor its username is taken.
fn new_user_key(items: &BTreeMap<ItemKey, Value>, user: &User) -> Result<ItemKey> {
    let key = item_key(&user.key());
    if items.contains_key(&key) {
        return Err(RepositoryError::AlreadyExists {
            entity_type: "User",
            id: user.id().to_string(),
        });
    }
    let si = user.si();
    if items
        .values()
        .any(|item| attr(item, ATTR_SI) == Some(si.as_str()))
    {
        return Err(RepositoryError::AlreadyExists {
            entity_type: "User",
            id: user.username.clone(),
        });
    }
    Ok(key)
}

fn foreign_meta(entity_type: &str, owner: Uuid, expected: Uuid) -> RepositoryError {
    RepositoryError::InvalidData(format!(
        "meta row for {entity_type} {owner} cannot be written with {entity_type} {expected}"
    ))
}

// ============================================================================
// UserRepository implementation
// ============================================================================

#[async_trait]
impl UserRepository for InMemoryRepository {
    async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
        let items = self.items.read().await;
        items
            .get(&item_key(&keys::user_key(id)))
            .map(decode)
            .transpose()
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let si = keys::user_si(username);
        let items = self.items.read().await;
        items
            .values()
            .find(|item| attr(item, ATTR_SI) == Some(si.as_str()))
            .map(decode)
            .transpose()
    }

    async fn create_user(&self, user: &User) -> Result<()> {
        self.create_user_with_meta(user, &[]).await
    }

    async fn create_user_with_meta(&self, user: &User, meta: &[UserMeta]) -> Result<()> {
        let mut items = self.items.write().await;
        let key = new_user_key(&items, user)?;
        if let Some(row) = meta.iter().find(|row| row.user_id() != user.id()) {
            return Err(foreign_meta("User", row.user_id(), user.id()));
        }

        let mut batch = vec![(key, encode(user.clone())?)];
        for row in meta {
            batch.push((item_key(&row.key()), encode(row.clone())?));
        }
        items.extend(batch);
        Ok(())
    }

    async fn update_user(&self, user: &User) -> Result<()> {
        let mut items = self.items.write().await;
        let key = item_key(&user.key());
        if !items.contains_key(&key) {
            return Err(RepositoryError::NotFound {
                entity_type: "User",
                id: user.id().to_string(),
            });
        }
        let si = user.si();
        let taken = items.iter().any(|(other, item)| {
            *other != key && attr(item, ATTR_SI) == Some(si.as_str())
        });
        if taken {
            return Err(RepositoryError::AlreadyExists {
                entity_type: "User",
                id: user.username.clone(),
            });
        }
        items.insert(key, encode(user.clone())?);
        Ok(())
    }

    async fn delete_user(&self, id: Uuid) -> Result<()> {
        let mut items = self.items.write().await;
        let pk = keys::user_pk(id);
        let before = items.len();
        items.retain(|(item_pk, _), _| *item_pk != pk);
        if items.len() == before {
            return Err(RepositoryError::NotFound {
                entity_type: "User",
                id: id.to_string(),
            });
        }
        Ok(())
    }

    async fn list_users_by_role(&self, role: UserRole) -> Result<Vec<User>> {
        let items = self.items.read().await;
        items
            .values()
            .filter(|item| gsi1_matches(item, DomainLabel::User, role.as_str(), User::KIND))
            .map(decode)
            .collect()
    }

    async fn put_user_meta(&self, meta: &UserMeta) -> Result<()> {
        let mut items = self.items.write().await;
        items.insert(item_key(&meta.key()), encode(meta.clone())?);
        Ok(())
    }

    async fn get_user_meta(&self, user_id: Uuid, key: UserMetaKey) -> Result<Option<UserMeta>> {
        let items = self.items.read().await;
        items
            .get(&(keys::user_pk(user_id), key.as_str().to_string()))
            .map(decode)
            .transpose()
    }
}

// ============================================================================
// PhotoRepository implementation
// ============================================================================

#[async_trait]
impl PhotoRepository for InMemoryRepository {
    async fn get_photo(&self, id: Uuid) -> Result<Option<Photo>> {
        let items = self.items.read().await;
        items
            .get(&item_key(&keys::photo_key(id)))
            .map(decode)
            .transpose()
    }

    async fn create_photo(&self, photo: &Photo) -> Result<()> {
        self.create_photo_with_meta(photo, &[]).await
    }

    async fn create_photo_with_meta(&self, photo: &Photo, meta: &[PhotoMeta]) -> Result<()> {
        let mut items = self.items.write().await;
        let key = item_key(&photo.key());
        if items.contains_key(&key) {
            return Err(RepositoryError::AlreadyExists {
                entity_type: "Photo",
                id: photo.id().to_string(),
            });
        }
        if let Some(row) = meta.iter().find(|row| row.photo_id() != photo.id()) {
            return Err(foreign_meta("Photo", row.photo_id(), photo.id()));
        }

        let mut batch = vec![(key, encode(photo.clone())?)];
        for row in meta {
            batch.push((item_key(&row.key()), encode(row.clone())?));
        }
        items.extend(batch);
        Ok(())
    }

    async fn list_photos(&self, page: PageRequest) -> Result<EntityPage<Photo>> {
        let after = page.cursor.as_ref().map(cursor_position).transpose()?;
        let items = self.items.read().await;

        let mut matching = items
            .iter()
            .filter(|(key, _)| after.as_ref().is_none_or(|after| *key > after))
            .filter(|(_, item)| {
                gsi1_matches(item, DomainLabel::Attachment, Photo::KIND.as_str(), Photo::KIND)
            })
            .map(|(_, item)| item)
            .take(page.limit() + 1)
            .collect::<Vec<_>>();

        let last_evaluated = if matching.len() > page.limit() {
            matching.truncate(page.limit());
            matching.last().map(|item| cursor_for(item).encode()).transpose()?
        } else {
            None
        };

        let photos = matching
            .into_iter()
            .map(decode)
            .collect::<Result<Vec<Photo>>>()?;

        Ok(EntityPage::new(photos, last_evaluated))
    }

    async fn put_photo_meta(&self, meta: &PhotoMeta) -> Result<()> {
        let mut items = self.items.write().await;
        items.insert(item_key(&meta.key()), encode(meta.clone())?);
        Ok(())
    }

    async fn get_photo_meta(
        &self,
        photo_id: Uuid,
        key: PhotoMetaKey,
    ) -> Result<Option<PhotoMeta>> {
        let items = self.items.read().await;
        items
            .get(&(keys::photo_pk(photo_id), key.as_str().to_string()))
            .map(decode)
            .transpose()
    }
}
