//! Entities stored in the table.
//!
//! Each entity keeps only the data that varies between records. The constant
//! attributes (`PK1`, `Kind`, fixed `SK1` values) are derived from the entity
//! type when encoding and validated when decoding, so a record can never be
//! written under the wrong domain label.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use super::keys;
use super::{DomainLabel, PrimaryKey, RecordKind, TableError};

// ============================================================================
// User roles
// ============================================================================

/// Roles a user can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UserRole {
    Super,
    Admin,
    AdminWarehouse,
    AdminFinancial,
    AdminReports,
    Dealer,
    Editor,
    EditorAuthor,
    EditorContributor,
    Customer,
    Guest,
}

impl UserRole {
    pub const ALL: [UserRole; 11] = [
        UserRole::Super,
        UserRole::Admin,
        UserRole::AdminWarehouse,
        UserRole::AdminFinancial,
        UserRole::AdminReports,
        UserRole::Dealer,
        UserRole::Editor,
        UserRole::EditorAuthor,
        UserRole::EditorContributor,
        UserRole::Customer,
        UserRole::Guest,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Super => "Super",
            Self::Admin => "Admin",
            Self::AdminWarehouse => "AdminWarehouse",
            Self::AdminFinancial => "AdminFinancial",
            Self::AdminReports => "AdminReports",
            Self::Dealer => "Dealer",
            Self::Editor => "Editor",
            Self::EditorAuthor => "EditorAuthor",
            Self::EditorContributor => "EditorContributor",
            Self::Customer => "Customer",
            Self::Guest => "Guest",
        }
    }

    /// Super and every `Admin*` role.
    pub fn is_admin(&self) -> bool {
        matches!(
            self,
            Self::Super
                | Self::Admin
                | Self::AdminWarehouse
                | Self::AdminFinancial
                | Self::AdminReports
        )
    }

    pub fn is_editor(&self) -> bool {
        matches!(
            self,
            Self::Editor | Self::EditorAuthor | Self::EditorContributor
        )
    }

    pub fn can_manage_dealers(&self) -> bool {
        matches!(self, Self::Super | Self::Admin)
    }

    pub fn can_upload_media(&self) -> bool {
        matches!(self, Self::Super | Self::Admin) || self.is_editor()
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = TableError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| TableError::UnknownRole(s.to_string()))
    }
}

// ============================================================================
// Metadata keys
// ============================================================================

/// Reserved sort keys for user metadata rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UserMetaKey {
    #[serde(rename = "_#userPhone")]
    Phone,
    #[serde(rename = "_#userWhatsapp")]
    Whatsapp,
    #[serde(rename = "_#userCv")]
    Cv,
    #[serde(rename = "_#userRole")]
    Role,
    #[serde(rename = "_#userHasPassword")]
    HasPassword,
    #[serde(rename = "_#userCreatedAt")]
    CreatedAt,
    #[serde(rename = "_#userDisplayName")]
    DisplayName,
    #[serde(rename = "_#userPasswordlessEnabled")]
    PasswordlessEnabled,
    #[serde(rename = "_#userLastAccessAt")]
    LastAccessAt,
    #[serde(rename = "_#userContact")]
    ContactBy,
    #[serde(rename = "_#userTerms")]
    Terms,
    #[serde(rename = "_#userAcceptedTermsAt")]
    AcceptedTermsAt,
    #[serde(rename = "_#userExclusive")]
    Exclusive,
}

impl UserMetaKey {
    pub const ALL: [UserMetaKey; 13] = [
        UserMetaKey::Phone,
        UserMetaKey::Whatsapp,
        UserMetaKey::Cv,
        UserMetaKey::Role,
        UserMetaKey::HasPassword,
        UserMetaKey::CreatedAt,
        UserMetaKey::DisplayName,
        UserMetaKey::PasswordlessEnabled,
        UserMetaKey::LastAccessAt,
        UserMetaKey::ContactBy,
        UserMetaKey::Terms,
        UserMetaKey::AcceptedTermsAt,
        UserMetaKey::Exclusive,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Phone => "_#userPhone",
            Self::Whatsapp => "_#userWhatsapp",
            Self::Cv => "_#userCv",
            Self::Role => "_#userRole",
            Self::HasPassword => "_#userHasPassword",
            Self::CreatedAt => "_#userCreatedAt",
            Self::DisplayName => "_#userDisplayName",
            Self::PasswordlessEnabled => "_#userPasswordlessEnabled",
            Self::LastAccessAt => "_#userLastAccessAt",
            Self::ContactBy => "_#userContact",
            Self::Terms => "_#userTerms",
            Self::AcceptedTermsAt => "_#userAcceptedTermsAt",
            Self::Exclusive => "_#userExclusive",
        }
    }
}

impl fmt::Display for UserMetaKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserMetaKey {
    type Err = TableError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| TableError::UnknownMetaKey(s.to_string()))
    }
}

/// Reserved sort keys for photo metadata rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PhotoMetaKey {
    #[serde(rename = "_#photoTitle")]
    Title,
    #[serde(rename = "_#photoCaption")]
    Caption,
    #[serde(rename = "_#photoAlt")]
    Alt,
    #[serde(rename = "_#photoDescription")]
    Description,
    #[serde(rename = "_#photoFilename")]
    FileName,
    #[serde(rename = "_#photoFileMimeType")]
    FileMimeType,
    #[serde(rename = "_#photoUploadedAt")]
    UploadedAt,
    #[serde(rename = "_#photoUploadedById")]
    UploadedById,
    #[serde(rename = "_#photoUploadedByName")]
    UploadedByName,
}

impl PhotoMetaKey {
    pub const ALL: [PhotoMetaKey; 9] = [
        PhotoMetaKey::Title,
        PhotoMetaKey::Caption,
        PhotoMetaKey::Alt,
        PhotoMetaKey::Description,
        PhotoMetaKey::FileName,
        PhotoMetaKey::FileMimeType,
        PhotoMetaKey::UploadedAt,
        PhotoMetaKey::UploadedById,
        PhotoMetaKey::UploadedByName,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Title => "_#photoTitle",
            Self::Caption => "_#photoCaption",
            Self::Alt => "_#photoAlt",
            Self::Description => "_#photoDescription",
            Self::FileName => "_#photoFilename",
            Self::FileMimeType => "_#photoFileMimeType",
            Self::UploadedAt => "_#photoUploadedAt",
            Self::UploadedById => "_#photoUploadedById",
            Self::UploadedByName => "_#photoUploadedByName",
        }
    }
}

impl fmt::Display for PhotoMetaKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PhotoMetaKey {
    type Err = TableError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| TableError::UnknownMetaKey(s.to_string()))
    }
}

// ============================================================================
// User
// ============================================================================

/// Basic user entity.
///
/// `SK1` holds the role so the `GSI1` index lists users by role. `SI` holds
/// the normalized username so only user rows appear in the sparse index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "UserItem", into = "UserItem")]
pub struct User {
    id: Uuid,
    pub role: UserRole,
    pub username: String,
    pub cpf: String,
    pub rg: String,
    /// Stored password digest, never the plain password.
    pub password: Option<String>,
}

impl User {
    pub const KIND: RecordKind = RecordKind::User;

    pub fn new(
        username: impl Into<String>,
        cpf: impl Into<String>,
        rg: impl Into<String>,
        role: UserRole,
    ) -> Self {
        Self::with_id(Uuid::new_v4(), username, cpf, rg, role)
    }

    pub fn with_id(
        id: Uuid,
        username: impl Into<String>,
        cpf: impl Into<String>,
        rg: impl Into<String>,
        role: UserRole,
    ) -> Self {
        Self {
            id,
            role,
            username: keys::normalize_username(&username.into()),
            cpf: cpf.into(),
            rg: rg.into(),
            password: None,
        }
    }

    pub fn with_password(mut self, digest: impl Into<String>) -> Self {
        self.password = Some(digest.into());
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn key(&self) -> PrimaryKey {
        keys::user_key(self.id)
    }

    pub fn si(&self) -> String {
        keys::user_si(&self.username)
    }

    pub fn has_password(&self) -> bool {
        self.password.is_some()
    }
}

#[derive(Clone, Serialize, Deserialize)]
struct UserItem {
    #[serde(rename = "PK")]
    pk: String,
    #[serde(rename = "SK")]
    sk: String,
    #[serde(rename = "PK1")]
    pk1: String,
    #[serde(rename = "SK1")]
    sk1: String,
    #[serde(rename = "SI", default)]
    si: Option<String>,
    #[serde(rename = "Kind")]
    kind: String,
    #[serde(rename = "Username")]
    username: String,
    #[serde(rename = "CPF")]
    cpf: String,
    #[serde(rename = "RG")]
    rg: String,
    #[serde(rename = "Password", default, skip_serializing_if = "Option::is_none")]
    password: Option<String>,
}

impl From<User> for UserItem {
    fn from(user: User) -> Self {
        let key = user.key();
        Self {
            pk: key.pk().to_string(),
            sk: key.sk().to_string(),
            pk1: User::KIND.domain().to_string(),
            sk1: user.role.to_string(),
            si: Some(user.si()),
            kind: User::KIND.to_string(),
            username: user.username,
            cpf: user.cpf,
            rg: user.rg,
            password: user.password,
        }
    }
}

impl TryFrom<UserItem> for User {
    type Error = TableError;

    fn try_from(item: UserItem) -> Result<Self, Self::Error> {
        User::KIND.check_kind(item.kind.parse()?)?;
        User::KIND.check_domain(item.pk1.parse()?)?;
        let id = keys::user_id_from_pk(&item.pk)?;
        expect_sort_key(&item.sk, &keys::user_sk(id))?;

        Ok(Self {
            id,
            role: item.sk1.parse()?,
            username: keys::normalize_username(&item.username),
            cpf: item.cpf,
            rg: item.rg,
            password: item.password,
        })
    }
}

// ============================================================================
// User metadata
// ============================================================================

/// One metadata value of a user, stored beside the profile row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "MetaItem", into = "MetaItem")]
pub struct UserMeta {
    user_id: Uuid,
    meta_key: UserMetaKey,
    /// Stored in `SK1`.
    pub value: String,
}

impl UserMeta {
    pub const KIND: RecordKind = RecordKind::UserMetadata;

    pub fn new(user_id: Uuid, meta_key: UserMetaKey, value: impl Into<String>) -> Self {
        Self {
            user_id,
            meta_key,
            value: value.into(),
        }
    }

    pub fn flag(user_id: Uuid, meta_key: UserMetaKey, value: bool) -> Self {
        Self::new(user_id, meta_key, value.to_string())
    }

    pub fn timestamp(user_id: Uuid, meta_key: UserMetaKey, at: DateTime<Utc>) -> Self {
        Self::new(user_id, meta_key, at.to_rfc3339())
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn meta_key(&self) -> UserMetaKey {
        self.meta_key
    }

    pub fn key(&self) -> PrimaryKey {
        PrimaryKey::new(keys::user_pk(self.user_id), self.meta_key.as_str())
    }

    pub fn as_bool(&self) -> Option<bool> {
        self.value.parse().ok()
    }

    pub fn as_datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.value)
            .ok()
            .map(|at| at.with_timezone(&Utc))
    }
}

impl From<UserMeta> for MetaItem {
    fn from(meta: UserMeta) -> Self {
        Self {
            pk: keys::user_pk(meta.user_id),
            sk: meta.meta_key.as_str().to_string(),
            pk1: UserMeta::KIND.domain().to_string(),
            sk1: meta.value,
            kind: UserMeta::KIND.to_string(),
        }
    }
}

impl TryFrom<MetaItem> for UserMeta {
    type Error = TableError;

    fn try_from(item: MetaItem) -> Result<Self, Self::Error> {
        UserMeta::KIND.check_kind(item.kind.parse()?)?;
        UserMeta::KIND.check_domain(item.pk1.parse()?)?;

        Ok(Self {
            user_id: keys::user_id_from_pk(&item.pk)?,
            meta_key: item.sk.parse()?,
            value: item.sk1,
        })
    }
}

// ============================================================================
// Photo
// ============================================================================

/// Photo attachment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "PhotoItem", into = "PhotoItem")]
pub struct Photo {
    id: Uuid,
    pub uri: String,
    pub title: Option<String>,
}

impl Photo {
    pub const KIND: RecordKind = RecordKind::Photo;

    pub fn new(uri: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4(), uri)
    }

    pub fn with_id(id: Uuid, uri: impl Into<String>) -> Self {
        Self {
            id,
            uri: uri.into(),
            title: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn key(&self) -> PrimaryKey {
        keys::photo_key(self.id)
    }
}

#[derive(Clone, Serialize, Deserialize)]
struct PhotoItem {
    #[serde(rename = "PK")]
    pk: String,
    #[serde(rename = "SK")]
    sk: String,
    #[serde(rename = "PK1")]
    pk1: String,
    #[serde(rename = "SK1")]
    sk1: String,
    #[serde(rename = "Kind")]
    kind: String,
    #[serde(rename = "URI")]
    uri: String,
    #[serde(rename = "Title", default, skip_serializing_if = "Option::is_none")]
    title: Option<String>,
}

impl From<Photo> for PhotoItem {
    fn from(photo: Photo) -> Self {
        let key = photo.key();
        Self {
            pk: key.pk().to_string(),
            sk: key.sk().to_string(),
            pk1: Photo::KIND.domain().to_string(),
            sk1: Photo::KIND.to_string(),
            kind: Photo::KIND.to_string(),
            uri: photo.uri,
            title: photo.title,
        }
    }
}

impl TryFrom<PhotoItem> for Photo {
    type Error = TableError;

    fn try_from(item: PhotoItem) -> Result<Self, Self::Error> {
        Photo::KIND.check_kind(item.kind.parse()?)?;
        Photo::KIND.check_domain(item.pk1.parse()?)?;
        Photo::KIND.check_kind(item.sk1.parse()?)?;
        let id = keys::photo_id_from_pk(&item.pk)?;
        expect_sort_key(&item.sk, &keys::photo_sk(id))?;

        Ok(Self {
            id,
            uri: item.uri,
            title: item.title,
        })
    }
}

// ============================================================================
// Photo metadata
// ============================================================================

/// One metadata value of a photo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "MetaItem", into = "MetaItem")]
pub struct PhotoMeta {
    photo_id: Uuid,
    meta_key: PhotoMetaKey,
    pub value: String,
}

impl PhotoMeta {
    pub const KIND: RecordKind = RecordKind::PhotoMetadata;

    pub fn new(photo_id: Uuid, meta_key: PhotoMetaKey, value: impl Into<String>) -> Self {
        Self {
            photo_id,
            meta_key,
            value: value.into(),
        }
    }

    pub fn timestamp(photo_id: Uuid, meta_key: PhotoMetaKey, at: DateTime<Utc>) -> Self {
        Self::new(photo_id, meta_key, at.to_rfc3339())
    }

    pub fn photo_id(&self) -> Uuid {
        self.photo_id
    }

    pub fn meta_key(&self) -> PhotoMetaKey {
        self.meta_key
    }

    pub fn key(&self) -> PrimaryKey {
        PrimaryKey::new(keys::photo_pk(self.photo_id), self.meta_key.as_str())
    }
}

impl From<PhotoMeta> for MetaItem {
    fn from(meta: PhotoMeta) -> Self {
        Self {
            pk: keys::photo_pk(meta.photo_id),
            sk: meta.meta_key.as_str().to_string(),
            pk1: PhotoMeta::KIND.domain().to_string(),
            sk1: meta.value,
            kind: PhotoMeta::KIND.to_string(),
        }
    }
}

impl TryFrom<MetaItem> for PhotoMeta {
    type Error = TableError;

    fn try_from(item: MetaItem) -> Result<Self, Self::Error> {
        PhotoMeta::KIND.check_kind(item.kind.parse()?)?;
        PhotoMeta::KIND.check_domain(item.pk1.parse()?)?;

        Ok(Self {
            photo_id: keys::photo_id_from_pk(&item.pk)?,
            meta_key: item.sk.parse()?,
            value: item.sk1,
        })
    }
}

/// Wire shape shared by both metadata kinds.
#[derive(Clone, Serialize, Deserialize)]
struct MetaItem {
    #[serde(rename = "PK")]
    pk: String,
    #[serde(rename = "SK")]
    sk: String,
    #[serde(rename = "PK1")]
    pk1: String,
    #[serde(rename = "SK1")]
    sk1: String,
    #[serde(rename = "Kind")]
    kind: String,
}

fn expect_sort_key(found: &str, expected: &str) -> Result<(), TableError> {
    if found == expected {
        Ok(())
    } else {
        Err(TableError::InvalidAttribute {
            attribute: "SK",
            value: found.to_string(),
        })
    }
}

// ============================================================================
// Record
// ============================================================================

/// Any item of the table, discriminated by its `Kind` attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    User(User),
    UserMeta(UserMeta),
    Photo(Photo),
    PhotoMeta(PhotoMeta),
}

impl Record {
    pub fn kind(&self) -> RecordKind {
        match self {
            Self::User(_) => User::KIND,
            Self::UserMeta(_) => UserMeta::KIND,
            Self::Photo(_) => Photo::KIND,
            Self::PhotoMeta(_) => PhotoMeta::KIND,
        }
    }

    pub fn domain(&self) -> DomainLabel {
        self.kind().domain()
    }

    pub fn key(&self) -> PrimaryKey {
        match self {
            Self::User(user) => user.key(),
            Self::UserMeta(meta) => meta.key(),
            Self::Photo(photo) => photo.key(),
            Self::PhotoMeta(meta) => meta.key(),
        }
    }

    /// Sparse index value, present only for records that carry one.
    pub fn si(&self) -> Option<String> {
        match self {
            Self::User(user) => Some(user.si()),
            _ => None,
        }
    }

    /// Value of the `SK1` attribute as stored.
    pub fn sk1(&self) -> String {
        match self {
            Self::User(user) => user.role.to_string(),
            Self::UserMeta(meta) => meta.value.clone(),
            Self::Photo(_) => Photo::KIND.to_string(),
            Self::PhotoMeta(meta) => meta.value.clone(),
        }
    }

    /// Encode as a flat JSON object of table attributes.
    pub fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }

    /// Decode a flat JSON object of table attributes.
    pub fn from_json(value: serde_json::Value) -> serde_json::Result<Self> {
        serde_json::from_value(value)
    }
}

impl From<User> for Record {
    fn from(user: User) -> Self {
        Self::User(user)
    }
}

impl From<UserMeta> for Record {
    fn from(meta: UserMeta) -> Self {
        Self::UserMeta(meta)
    }
}

impl From<Photo> for Record {
    fn from(photo: Photo) -> Self {
        Self::Photo(photo)
    }
}

impl From<PhotoMeta> for Record {
    fn from(meta: PhotoMeta) -> Self {
        Self::PhotoMeta(meta)
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::User(user) => user.serialize(serializer),
            Self::UserMeta(meta) => meta.serialize(serializer),
            Self::Photo(photo) => photo.serialize(serializer),
            Self::PhotoMeta(meta) => meta.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Record {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        use serde::de::Error;

        let value = serde_json::Value::deserialize(deserializer)?;
        let kind: RecordKind = value
            .get("Kind")
            .and_then(|kind| kind.as_str())
            .ok_or_else(|| D::Error::missing_field("Kind"))?
            .parse()
            .map_err(D::Error::custom)?;

        let record = match kind {
            RecordKind::User => serde_json::from_value(value).map(Self::User),
            RecordKind::UserMetadata => serde_json::from_value(value).map(Self::UserMeta),
            RecordKind::Photo => serde_json::from_value(value).map(Self::Photo),
            RecordKind::PhotoMetadata => serde_json::from_value(value).map(Self::PhotoMeta),
        };
        record.map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn user_id() -> Uuid {
        Uuid::parse_str("550e8400-e29b-41d4-a716-446655440001").unwrap()
    }

    fn photo_id() -> Uuid {
        Uuid::parse_str("550e8400-e29b-41d4-a716-446655440003").unwrap()
    }

    fn sample_user() -> User {
        User::with_id(
            user_id(),
            "Dealer@Example.com",
            "123.456.789-00",
            "12.345.678-9",
            UserRole::Dealer,
        )
    }

    #[test]
    fn test_user_encodes_table_attributes() {
        let value = serde_json::to_value(sample_user()).unwrap();
        assert_eq!(
            value,
            json!({
                "PK": "USER#550e8400-e29b-41d4-a716-446655440001",
                "SK": "USER#550e8400-e29b-41d4-a716-446655440001",
                "PK1": "User",
                "SK1": "Dealer",
                "SI": "EMAIL#dealer@example.com",
                "Kind": "User",
                "Username": "dealer@example.com",
                "CPF": "123.456.789-00",
                "RG": "12.345.678-9",
            })
        );
    }

    #[test]
    fn test_user_decode_rejects_wrong_domain() {
        let mut value = serde_json::to_value(sample_user()).unwrap();
        value["PK1"] = json!("Attachment");
        let err = serde_json::from_value::<User>(value).unwrap_err();
        assert!(err.to_string().contains("belong to the User domain"));
    }

    #[test]
    fn test_user_decode_rejects_wrong_kind() {
        let mut value = serde_json::to_value(sample_user()).unwrap();
        value["Kind"] = json!("Photo");
        assert!(serde_json::from_value::<User>(value).is_err());
    }

    #[test]
    fn test_user_decode_rejects_unknown_role() {
        let mut value = serde_json::to_value(sample_user()).unwrap();
        value["SK1"] = json!("Owner");
        let err = serde_json::from_value::<User>(value).unwrap_err();
        assert!(err.to_string().contains("unknown user role: Owner"));
    }

    #[test]
    fn test_user_decode_rejects_foreign_sort_key() {
        let mut value = serde_json::to_value(sample_user()).unwrap();
        value["SK"] = json!("USER#other");
        assert!(serde_json::from_value::<User>(value).is_err());
    }

    #[test]
    fn test_user_password_is_optional_attribute() {
        let user = sample_user().with_password("sha256$salt$digest");
        let value = serde_json::to_value(&user).unwrap();
        assert_eq!(value["Password"], json!("sha256$salt$digest"));

        let decoded: User = serde_json::from_value(value).unwrap();
        assert!(decoded.has_password());
        assert_eq!(decoded, user);
    }

    #[test]
    fn test_user_meta_key_and_value() {
        let meta = UserMeta::new(user_id(), UserMetaKey::Phone, "+55 11 99999-0000");
        let key = meta.key();
        assert_eq!(key.pk(), "USER#550e8400-e29b-41d4-a716-446655440001");
        assert_eq!(key.sk(), "_#userPhone");

        let value = serde_json::to_value(&meta).unwrap();
        assert_eq!(value["Kind"], json!("UserMetadata"));
        assert_eq!(value["PK1"], json!("User"));
        assert_eq!(value["SK1"], json!("+55 11 99999-0000"));
    }

    #[test]
    fn test_user_meta_rejects_photo_key() {
        let value = json!({
            "PK": "USER#550e8400-e29b-41d4-a716-446655440001",
            "SK": "_#photoTitle",
            "PK1": "User",
            "SK1": "x",
            "Kind": "UserMetadata",
        });
        let err = serde_json::from_value::<UserMeta>(value).unwrap_err();
        assert!(err.to_string().contains("unknown metadata key"));
    }

    #[test]
    fn test_user_meta_typed_values() {
        let flag = UserMeta::flag(user_id(), UserMetaKey::HasPassword, false);
        assert_eq!(flag.value, "false");
        assert_eq!(flag.as_bool(), Some(false));

        let at = DateTime::parse_from_rfc3339("2024-01-15T10:30:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let created = UserMeta::timestamp(user_id(), UserMetaKey::CreatedAt, at);
        assert_eq!(created.as_datetime(), Some(at));
    }

    #[test]
    fn test_photo_fixed_secondary_sort_key() {
        let photo = Photo::with_id(photo_id(), "https://cdn.example.com/a.jpg").with_title("Sala");
        let value = serde_json::to_value(&photo).unwrap();
        assert_eq!(value["PK1"], json!("Attachment"));
        assert_eq!(value["SK1"], json!("Photo"));
        assert_eq!(value["Kind"], json!("Photo"));
        assert_eq!(value["URI"], json!("https://cdn.example.com/a.jpg"));
        assert_eq!(value["Title"], json!("Sala"));

        let mut tampered = value.clone();
        tampered["SK1"] = json!("PhotoMetadata");
        assert!(serde_json::from_value::<Photo>(tampered).is_err());
    }

    #[test]
    fn test_photo_meta_round_trip() {
        let meta = PhotoMeta::new(photo_id(), PhotoMetaKey::FileMimeType, "image/jpeg");
        let value = serde_json::to_value(&meta).unwrap();
        assert_eq!(value["SK"], json!("_#photoFileMimeType"));
        assert_eq!(serde_json::from_value::<PhotoMeta>(value).unwrap(), meta);
    }

    #[test]
    fn test_record_dispatches_on_kind() {
        let records: Vec<Record> = vec![
            sample_user().into(),
            UserMeta::new(user_id(), UserMetaKey::DisplayName, "Maria").into(),
            Photo::with_id(photo_id(), "s3://bucket/a.jpg").into(),
            PhotoMeta::new(photo_id(), PhotoMetaKey::Alt, "A living room").into(),
        ];

        for record in records {
            let value = record.to_json().unwrap();
            assert_eq!(value["Kind"], json!(record.kind().as_str()));
            assert_eq!(value["PK1"], json!(record.domain().as_str()));
            assert_eq!(Record::from_json(value).unwrap(), record);
        }
    }

    #[test]
    fn test_record_requires_kind() {
        let err = Record::from_json(json!({"PK": "USER#1", "SK": "USER#1"})).unwrap_err();
        assert!(err.to_string().contains("Kind"));
    }

    #[test]
    fn test_only_users_carry_sparse_key() {
        assert!(Record::from(sample_user()).si().is_some());
        assert!(Record::from(Photo::new("s3://a")).si().is_none());
    }

    #[test]
    fn test_role_capabilities() {
        assert!(UserRole::Super.can_manage_dealers());
        assert!(UserRole::Admin.can_manage_dealers());
        assert!(!UserRole::AdminReports.can_manage_dealers());
        assert!(UserRole::AdminReports.is_admin());
        assert!(UserRole::EditorAuthor.can_upload_media());
        assert!(!UserRole::Dealer.can_upload_media());
        assert!(!UserRole::Guest.is_admin());
    }

    #[test]
    fn test_meta_key_wire_strings() {
        for key in UserMetaKey::ALL {
            let json = serde_json::to_string(&key).unwrap();
            assert_eq!(json, format!("\"{}\"", key.as_str()));
            assert_eq!(key.as_str().parse::<UserMetaKey>().unwrap(), key);
        }
        for key in PhotoMetaKey::ALL {
            assert_eq!(key.as_str().parse::<PhotoMetaKey>().unwrap(), key);
        }
        assert_eq!(UserMetaKey::ContactBy.as_str(), "_#userContact");
        assert_eq!(PhotoMetaKey::FileName.as_str(), "_#photoFilename");
    }
}
