//! Seed command implementation.
//!
//! Building the seed (Functional Core) is kept apart from writing it
//! (Imperative Shell) so the records can be inspected before anything
//! touches the table.

use std::collections::HashMap;

use aws_sdk_dynamodb::types::{AttributeValue, PutRequest, WriteRequest};
use aws_sdk_dynamodb::Client;
use chrono::{DateTime, Utc};
use gthome_core::auth::{email_to_name, hash_password};
use gthome_core::tables::{
    Photo, PhotoMeta, PhotoMetaKey, Record, User, UserMeta, UserMetaKey, UserRole, SPARSE_INDEX,
};
use serde_json::Value;

use super::error::{DynamodbError, Result};

type Item = HashMap<String, AttributeValue>;

/// Largest batch `BatchWriteItem` accepts.
const BATCH_SIZE: usize = 25;

const SAMPLE_PHOTOS: [(&str, &str); 5] = [
    ("Sala de estar", "sala-de-estar"),
    ("Cozinha planejada", "cozinha-planejada"),
    ("Quarto de casal", "quarto-de-casal"),
    ("Varanda gourmet", "varanda-gourmet"),
    ("Home office", "home-office"),
];

const SAMPLE_BASE_URI: &str = "https://images.gthome.com.br/samples";

/// Everything the seed command writes.
#[derive(Debug, Clone)]
pub struct SeedPlan {
    pub admin: User,
    pub admin_meta: Vec<UserMeta>,
    pub photos: Vec<(Photo, Vec<PhotoMeta>)>,
}

/// Outcome of applying a seed plan.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SeedReport {
    pub admin_created: bool,
    pub photos_created: usize,
}

/// Admin account details used to build the plan.
#[derive(Debug, Clone)]
pub struct AdminSeed<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub cpf: &'a str,
    pub rg: &'a str,
}

/// Build the records for a super user and `photo_count` sample photos.
///
/// Sample photos cycle through a fixed set of rooms; past the first lap the
/// title gets a sequence number so every photo stays distinguishable.
pub fn build_seed_plan(admin: &AdminSeed<'_>, photo_count: usize, now: DateTime<Utc>) -> SeedPlan {
    let user = User::new(admin.email, admin.cpf, admin.rg, UserRole::Super)
        .with_password(hash_password(admin.password));
    let id = user.id();

    let admin_meta = vec![
        UserMeta::new(id, UserMetaKey::Role, user.role.as_str()),
        UserMeta::timestamp(id, UserMetaKey::CreatedAt, now),
        UserMeta::flag(id, UserMetaKey::HasPassword, true),
        UserMeta::new(id, UserMetaKey::DisplayName, email_to_name(admin.email)),
    ];

    let uploader = email_to_name(admin.email);
    let photos = (0..photo_count)
        .map(|n| {
            let (room, slug) = SAMPLE_PHOTOS[n % SAMPLE_PHOTOS.len()];
            let lap = n / SAMPLE_PHOTOS.len();
            let (title, file_name) = if lap == 0 {
                (room.to_string(), format!("{slug}.jpg"))
            } else {
                (format!("{room} {}", lap + 1), format!("{slug}-{}.jpg", lap + 1))
            };

            let photo = Photo::new(format!("{SAMPLE_BASE_URI}/{file_name}")).with_title(&title);
            let photo_id = photo.id();
            let meta = vec![
                PhotoMeta::new(photo_id, PhotoMetaKey::Title, &title),
                PhotoMeta::new(photo_id, PhotoMetaKey::Alt, &title),
                PhotoMeta::new(photo_id, PhotoMetaKey::FileName, file_name),
                PhotoMeta::new(photo_id, PhotoMetaKey::FileMimeType, "image/jpeg"),
                PhotoMeta::timestamp(photo_id, PhotoMetaKey::UploadedAt, now),
                PhotoMeta::new(photo_id, PhotoMetaKey::UploadedById, id.to_string()),
                PhotoMeta::new(photo_id, PhotoMetaKey::UploadedByName, &uploader),
            ];
            (photo, meta)
        })
        .collect();

    SeedPlan {
        admin: user,
        admin_meta,
        photos,
    }
}

impl SeedPlan {
    /// Photo records in write order, each photo followed by its meta rows.
    fn photo_records(&self) -> Vec<Record> {
        self.photos
            .iter()
            .flat_map(|(photo, meta)| {
                std::iter::once(Record::from(photo.clone()))
                    .chain(meta.iter().cloned().map(Record::from))
            })
            .collect()
    }

    fn admin_records(&self) -> Vec<Record> {
        std::iter::once(Record::from(self.admin.clone()))
            .chain(self.admin_meta.iter().cloned().map(Record::from))
            .collect()
    }
}

/// Encode a record as a table item. Only scalar attributes occur in records.
fn record_to_item(record: &Record) -> Result<Item> {
    let value = record
        .to_json()
        .map_err(|e| DynamodbError::Encode(e.to_string()))?;

    let Value::Object(object) = value else {
        return Err(DynamodbError::Encode(format!(
            "{} did not encode as an object",
            record.kind()
        )));
    };

    Ok(object
        .into_iter()
        .filter_map(|(name, value)| {
            let attr = match value {
                Value::String(s) => AttributeValue::S(s),
                Value::Bool(b) => AttributeValue::Bool(b),
                Value::Number(n) => AttributeValue::N(n.to_string()),
                _ => return None,
            };
            Some((name, attr))
        })
        .collect())
}

async fn username_taken(client: &Client, table_name: &str, user: &User) -> Result<bool> {
    let result = client
        .query()
        .table_name(table_name)
        .index_name(SPARSE_INDEX)
        .key_condition_expression("SI = :si")
        .expression_attribute_values(":si", AttributeValue::S(user.si()))
        .limit(1)
        .send()
        .await
        .map_err(|e| DynamodbError::sdk("Query", e))?;

    Ok(!result.items().is_empty())
}

async fn write_records(client: &Client, table_name: &str, records: &[Record]) -> Result<()> {
    for chunk in records.chunks(BATCH_SIZE) {
        let write_requests = chunk
            .iter()
            .map(|record| {
                let put = PutRequest::builder()
                    .set_item(Some(record_to_item(record)?))
                    .build()
                    .map_err(|e| DynamodbError::sdk("BuildRequest", e))?;
                Ok(WriteRequest::builder().put_request(put).build())
            })
            .collect::<Result<Vec<_>>>()?;

        let output = client
            .batch_write_item()
            .request_items(table_name, write_requests)
            .send()
            .await
            .map_err(|e| DynamodbError::sdk("BatchWriteItem", e))?;

        if output.unprocessed_items().is_some_and(|pending| !pending.is_empty()) {
            return Err(DynamodbError::sdk(
                "BatchWriteItem",
                "throughput exceeded, some records were not written",
            ));
        }
    }
    Ok(())
}

/// Write a seed plan to the table.
///
/// An admin whose username is already taken is left untouched; the photos
/// are still inserted.
pub async fn apply_seed_plan(client: &Client, table_name: &str, plan: &SeedPlan) -> Result<SeedReport> {
    let mut report = SeedReport::default();

    if !username_taken(client, table_name, &plan.admin).await? {
        write_records(client, table_name, &plan.admin_records()).await?;
        report.admin_created = true;
    }

    write_records(client, table_name, &plan.photo_records()).await?;
    report.photos_created = plan.photos.len();

    Ok(report)
}
