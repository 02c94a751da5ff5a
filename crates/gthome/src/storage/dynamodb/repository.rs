//! DynamoDB repository implementation.
//!
//! Implements the repository traits from `gthome_core::storage` against the
//! single table: `GetItem`/`PutItem` on `PK`/`SK`, queries on `GSI1` for
//! listings and on the sparse `SI` index for username lookups.

use async_trait::async_trait;
use aws_sdk_dynamodb::types::{AttributeValue, Put, TransactWriteItem};
use aws_sdk_dynamodb::Client;
use uuid::Uuid;

use gthome_core::storage::{PageRequest, PhotoRepository, RepositoryError, Result, UserRepository};
use gthome_core::tables::{
    keys, DomainLabel, EntityPage, Photo, PhotoMeta, PhotoMetaKey, PrimaryKey, User, UserMeta,
    UserMetaKey, UserRole, ATTR_KIND, GSI1_INDEX, SPARSE_INDEX,
};

use super::conversions::{
    cursor_from_item, cursor_to_key, item_to_record, key_to_item, record_to_item, Item,
};
use super::error::{
    map_delete_item_error, map_get_item_error, map_put_item_error, map_query_error,
    map_transact_write_error, OnConditionFailed,
};
use crate::config::Config;

const GSI1_CONDITION: &str = "PK1 = :pk1 AND SK1 = :sk1";
const KIND_FILTER: &str = "#kind = :kind";

/// DynamoDB-based repository implementation.
///
/// Provides async access to DynamoDB storage for all entity types.
#[derive(Debug, Clone)]
pub struct DynamoDbRepository {
    client: Client,
    table_name: String,
}

impl DynamoDbRepository {
    /// Creates a new repository with the given DynamoDB client and table name.
    pub fn new(client: Client, table_name: impl Into<String>) -> Self {
        Self {
            client,
            table_name: table_name.into(),
        }
    }

    /// Creates a new repository from the application configuration.
    ///
    /// Uses the AWS SDK default credential chain.
    pub async fn from_config(config: &Config) -> Self {
        let sdk_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Self::new(Client::new(&sdk_config), config.table_name.clone())
    }

    /// Get the table name.
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    async fn get_item(&self, key: &PrimaryKey, entity_type: &'static str) -> Result<Option<Item>> {
        let result = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .set_key(Some(key_to_item(key)))
            .send()
            .await
            .map_err(|e| map_get_item_error(e, entity_type, key.pk()))?;

        Ok(result.item)
    }

    async fn put_item(
        &self,
        item: Item,
        condition: Option<OnConditionFailed>,
        entity_type: &'static str,
        id: String,
    ) -> Result<()> {
        let expression = condition.map(|condition| match condition {
            OnConditionFailed::AlreadyExists => "attribute_not_exists(PK)",
            OnConditionFailed::NotFound => "attribute_exists(PK)",
        });

        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(item))
            .set_condition_expression(expression.map(str::to_string))
            .send()
            .await
            .map_err(|e| {
                map_put_item_error(
                    e,
                    condition.unwrap_or(OnConditionFailed::AlreadyExists),
                    entity_type,
                    id,
                )
            })?;

        Ok(())
    }

    /// Writes a new record and its meta rows in one transaction. Only the
    /// record is conditioned on not existing yet.
    async fn create_with_meta(
        &self,
        record: Item,
        meta: Vec<Item>,
        entity_type: &'static str,
        id: String,
    ) -> Result<()> {
        let mut writes = Vec::with_capacity(meta.len() + 1);
        writes.push(self.transact_put(record, Some("attribute_not_exists(PK)"))?);
        for item in meta {
            writes.push(self.transact_put(item, None)?);
        }

        self.client
            .transact_write_items()
            .set_transact_items(Some(writes))
            .send()
            .await
            .map_err(|e| map_transact_write_error(e, entity_type, id.clone()))?;

        tracing::debug!(entity_type, id = %id, "created record with meta rows");
        Ok(())
    }

    fn transact_put(&self, item: Item, condition: Option<&str>) -> Result<TransactWriteItem> {
        let put = Put::builder()
            .table_name(&self.table_name)
            .set_item(Some(item))
            .set_condition_expression(condition.map(str::to_string))
            .build()
            .map_err(|e| RepositoryError::Serialization(e.to_string()))?;
        Ok(TransactWriteItem::builder().put(put).build())
    }

    /// Every item of one partition, following pagination to the end.
    async fn query_partition(&self, pk: &str) -> Result<Vec<Item>> {
        let mut items = Vec::new();
        let mut start_key = None;
        loop {
            let result = self
                .client
                .query()
                .table_name(&self.table_name)
                .key_condition_expression("PK = :pk")
                .expression_attribute_values(":pk", AttributeValue::S(pk.to_string()))
                .set_exclusive_start_key(start_key)
                .send()
                .await
                .map_err(map_query_error)?;

            items.extend(result.items.unwrap_or_default());
            match result.last_evaluated_key {
                Some(key) if !key.is_empty() => start_key = Some(key),
                _ => break,
            }
        }
        Ok(items)
    }
}

// ============================================================================
// UserRepository implementation
// ============================================================================

#[async_trait]
impl UserRepository for DynamoDbRepository {
    async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
        self.get_item(&keys::user_key(id), "User")
            .await?
            .map(|item| item_to_record(&item))
            .transpose()
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let result = self
            .client
            .query()
            .table_name(&self.table_name)
            .index_name(SPARSE_INDEX)
            .key_condition_expression("SI = :si")
            .expression_attribute_values(":si", AttributeValue::S(keys::user_si(username)))
            .send()
            .await
            .map_err(map_query_error)?;

        let items = result.items.unwrap_or_default();
        match items.first() {
            Some(item) => Ok(Some(item_to_record(item)?)),
            None => Ok(None),
        }
    }

    async fn create_user(&self, user: &User) -> Result<()> {
        if self.get_user_by_username(&user.username).await?.is_some() {
            return Err(RepositoryError::AlreadyExists {
                entity_type: "User",
                id: user.username.clone(),
            });
        }

        let item = record_to_item(user.clone())?;
        self.put_item(
            item,
            Some(OnConditionFailed::AlreadyExists),
            "User",
            user.id().to_string(),
        )
        .await
    }

    async fn create_user_with_meta(&self, user: &User, meta: &[UserMeta]) -> Result<()> {
        if let Some(row) = meta.iter().find(|row| row.user_id() != user.id()) {
            return Err(RepositoryError::InvalidData(format!(
                "meta row for User {} cannot be written with User {}",
                row.user_id(),
                user.id()
            )));
        }
        if self.get_user_by_username(&user.username).await?.is_some() {
            return Err(RepositoryError::AlreadyExists {
                entity_type: "User",
                id: user.username.clone(),
            });
        }

        let record = record_to_item(user.clone())?;
        let rows = meta
            .iter()
            .map(|row| record_to_item(row.clone()))
            .collect::<Result<Vec<_>>>()?;
        self.create_with_meta(record, rows, "User", user.id().to_string())
            .await
    }

    async fn update_user(&self, user: &User) -> Result<()> {
        if let Some(owner) = self.get_user_by_username(&user.username).await? {
            if owner.id() != user.id() {
                return Err(RepositoryError::AlreadyExists {
                    entity_type: "User",
                    id: user.username.clone(),
                });
            }
        }

        let item = record_to_item(user.clone())?;
        self.put_item(
            item,
            Some(OnConditionFailed::NotFound),
            "User",
            user.id().to_string(),
        )
        .await
    }

    async fn delete_user(&self, id: Uuid) -> Result<()> {
        let items = self.query_partition(&keys::user_pk(id)).await?;
        if items.is_empty() {
            return Err(RepositoryError::NotFound {
                entity_type: "User",
                id: id.to_string(),
            });
        }

        for item in items {
            let key: Item = item
                .into_iter()
                .filter(|(name, _)| name == "PK" || name == "SK")
                .collect();
            self.client
                .delete_item()
                .table_name(&self.table_name)
                .set_key(Some(key))
                .send()
                .await
                .map_err(|e| map_delete_item_error(e, "User", id.to_string()))?;
        }

        tracing::debug!(user_id = %id, "deleted user partition");
        Ok(())
    }

    async fn list_users_by_role(&self, role: UserRole) -> Result<Vec<User>> {
        let mut users = Vec::new();
        let mut start_key = None;
        loop {
            let result = self
                .client
                .query()
                .table_name(&self.table_name)
                .index_name(GSI1_INDEX)
                .key_condition_expression(GSI1_CONDITION)
                .filter_expression(KIND_FILTER)
                .expression_attribute_names("#kind", ATTR_KIND)
                .expression_attribute_values(
                    ":pk1",
                    AttributeValue::S(DomainLabel::User.to_string()),
                )
                .expression_attribute_values(":sk1", AttributeValue::S(role.to_string()))
                .expression_attribute_values(":kind", AttributeValue::S(User::KIND.to_string()))
                .set_exclusive_start_key(start_key)
                .send()
                .await
                .map_err(map_query_error)?;

            for item in result.items.unwrap_or_default() {
                users.push(item_to_record(&item)?);
            }
            match result.last_evaluated_key {
                Some(key) if !key.is_empty() => start_key = Some(key),
                _ => break,
            }
        }
        Ok(users)
    }

    async fn put_user_meta(&self, meta: &UserMeta) -> Result<()> {
        let item = record_to_item(meta.clone())?;
        self.put_item(item, None, "UserMeta", meta.meta_key().to_string())
            .await
    }

    async fn get_user_meta(&self, user_id: Uuid, key: UserMetaKey) -> Result<Option<UserMeta>> {
        let primary = PrimaryKey::new(keys::user_pk(user_id), key.as_str());
        self.get_item(&primary, "UserMeta")
            .await?
            .map(|item| item_to_record(&item))
            .transpose()
    }
}

// ============================================================================
// PhotoRepository implementation
// ============================================================================

#[async_trait]
impl PhotoRepository for DynamoDbRepository {
    async fn get_photo(&self, id: Uuid) -> Result<Option<Photo>> {
        self.get_item(&keys::photo_key(id), "Photo")
            .await?
            .map(|item| item_to_record(&item))
            .transpose()
    }

    async fn create_photo(&self, photo: &Photo) -> Result<()> {
        let item = record_to_item(photo.clone())?;
        self.put_item(
            item,
            Some(OnConditionFailed::AlreadyExists),
            "Photo",
            photo.id().to_string(),
        )
        .await
    }

    async fn create_photo_with_meta(&self, photo: &Photo, meta: &[PhotoMeta]) -> Result<()> {
        if let Some(row) = meta.iter().find(|row| row.photo_id() != photo.id()) {
            return Err(RepositoryError::InvalidData(format!(
                "meta row for Photo {} cannot be written with Photo {}",
                row.photo_id(),
                photo.id()
            )));
        }

        let record = record_to_item(photo.clone())?;
        let rows = meta
            .iter()
            .map(|row| record_to_item(row.clone()))
            .collect::<Result<Vec<_>>>()?;
        self.create_with_meta(record, rows, "Photo", photo.id().to_string())
            .await
    }

    async fn list_photos(&self, page: PageRequest) -> Result<EntityPage<Photo>> {
        let mut start_key = page.cursor.as_ref().map(cursor_to_key).transpose()?;
        // One extra item tells whether another page exists. `Limit` applies
        // before the kind filter, so keep querying until it is found or the
        // index is exhausted.
        let wanted = page.limit() + 1;
        let mut items: Vec<Item> = Vec::with_capacity(wanted);

        loop {
            let remaining = i32::try_from(wanted - items.len()).unwrap_or(i32::MAX);
            let result = self
                .client
                .query()
                .table_name(&self.table_name)
                .index_name(GSI1_INDEX)
                .key_condition_expression(GSI1_CONDITION)
                .filter_expression(KIND_FILTER)
                .expression_attribute_names("#kind", ATTR_KIND)
                .expression_attribute_values(
                    ":pk1",
                    AttributeValue::S(DomainLabel::Attachment.to_string()),
                )
                .expression_attribute_values(":sk1", AttributeValue::S(Photo::KIND.to_string()))
                .expression_attribute_values(":kind", AttributeValue::S(Photo::KIND.to_string()))
                .limit(remaining)
                .set_exclusive_start_key(start_key.take())
                .send()
                .await
                .map_err(map_query_error)?;

            items.extend(result.items.unwrap_or_default());
            start_key = result.last_evaluated_key.filter(|key| !key.is_empty());
            if items.len() >= wanted || start_key.is_none() {
                break;
            }
        }

        let last_evaluated = if items.len() > page.limit() {
            items.truncate(page.limit());
            items
                .last()
                .map(|item| cursor_from_item(item)?.encode())
                .transpose()?
        } else {
            None
        };

        let photos = items
            .iter()
            .map(item_to_record)
            .collect::<Result<Vec<Photo>>>()?;

        Ok(EntityPage::new(photos, last_evaluated))
    }

    async fn put_photo_meta(&self, meta: &PhotoMeta) -> Result<()> {
        let item = record_to_item(meta.clone())?;
        self.put_item(item, None, "PhotoMeta", meta.meta_key().to_string())
            .await
    }

    async fn get_photo_meta(
        &self,
        photo_id: Uuid,
        key: PhotoMetaKey,
    ) -> Result<Option<PhotoMeta>> {
        let primary = PrimaryKey::new(keys::photo_pk(photo_id), key.as_str());
        self.get_item(&primary, "PhotoMeta")
            .await?
            .map(|item| item_to_record(&item))
            .transpose()
    }
}
