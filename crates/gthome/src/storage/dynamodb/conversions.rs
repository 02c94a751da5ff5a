//! DynamoDB attribute conversion functions.
//!
//! Records already know how to encode themselves as flat JSON objects of
//! table attributes; these pure functions move those objects in and out of
//! `AttributeValue` maps. Testable in isolation without DynamoDB access.

use std::collections::{BTreeMap, HashMap};

use aws_sdk_dynamodb::types::AttributeValue;
use serde::de::DeserializeOwned;
use serde_json::{Map, Number, Value};

use gthome_core::storage::{Cursor, RepositoryError};
use gthome_core::tables::{PrimaryKey, Record, ATTR_PK, ATTR_PK1, ATTR_SK, ATTR_SK1};

pub type Item = HashMap<String, AttributeValue>;

// ============================================================================
// Records
// ============================================================================

/// Convert a record to a DynamoDB item.
pub fn record_to_item(record: impl Into<Record>) -> Result<Item, RepositoryError> {
    let value = record
        .into()
        .to_json()
        .map_err(|e| RepositoryError::Serialization(e.to_string()))?;

    let Value::Object(object) = value else {
        return Err(RepositoryError::Serialization(
            "record did not encode as an object".to_string(),
        ));
    };

    Ok(object
        .into_iter()
        .filter_map(|(name, value)| json_to_attribute(value).map(|attr| (name, attr)))
        .collect())
}

/// Convert a DynamoDB item to any record type.
pub fn item_to_record<T: DeserializeOwned>(item: &Item) -> Result<T, RepositoryError> {
    let object = item
        .iter()
        .map(|(name, attr)| Ok((name.clone(), attribute_to_json(attr)?)))
        .collect::<Result<Map<String, Value>, RepositoryError>>()?;

    serde_json::from_value(Value::Object(object))
        .map_err(|e| RepositoryError::Serialization(e.to_string()))
}

// ============================================================================
// Attribute values
// ============================================================================

/// Nulls are dropped so optional attributes are simply absent.
pub fn json_to_attribute(value: Value) -> Option<AttributeValue> {
    Some(match value {
        Value::Null => return None,
        Value::Bool(b) => AttributeValue::Bool(b),
        Value::Number(n) => AttributeValue::N(n.to_string()),
        Value::String(s) => AttributeValue::S(s),
        Value::Array(values) => {
            AttributeValue::L(values.into_iter().filter_map(json_to_attribute).collect())
        }
        Value::Object(object) => AttributeValue::M(
            object
                .into_iter()
                .filter_map(|(name, value)| json_to_attribute(value).map(|attr| (name, attr)))
                .collect(),
        ),
    })
}

pub fn attribute_to_json(attr: &AttributeValue) -> Result<Value, RepositoryError> {
    Ok(match attr {
        AttributeValue::S(s) => Value::String(s.clone()),
        AttributeValue::N(n) => Value::Number(
            n.parse::<Number>()
                .map_err(|e| RepositoryError::Serialization(format!("invalid number {n}: {e}")))?,
        ),
        AttributeValue::Bool(b) => Value::Bool(*b),
        AttributeValue::Null(_) => Value::Null,
        AttributeValue::L(values) => Value::Array(
            values
                .iter()
                .map(attribute_to_json)
                .collect::<Result<_, _>>()?,
        ),
        AttributeValue::M(object) => Value::Object(
            object
                .iter()
                .map(|(name, attr)| Ok((name.clone(), attribute_to_json(attr)?)))
                .collect::<Result<_, RepositoryError>>()?,
        ),
        AttributeValue::Ss(values) => {
            Value::Array(values.iter().cloned().map(Value::String).collect())
        }
        other => {
            return Err(RepositoryError::Serialization(format!(
                "unsupported attribute type: {other:?}"
            )))
        }
    })
}

// ============================================================================
// Keys and cursors
// ============================================================================

/// `PK`/`SK` attributes for GetItem and DeleteItem.
pub fn key_to_item(key: &PrimaryKey) -> Item {
    HashMap::from([
        (ATTR_PK.to_string(), AttributeValue::S(key.pk().to_string())),
        (ATTR_SK.to_string(), AttributeValue::S(key.sk().to_string())),
    ])
}

/// Cursor pointing just past `item` in the `GSI1` listing: its table key
/// plus its index key, the shape of a `LastEvaluatedKey` on that index.
pub fn cursor_from_item(item: &Item) -> Result<Cursor, RepositoryError> {
    let attributes = [ATTR_PK, ATTR_SK, ATTR_PK1, ATTR_SK1]
        .into_iter()
        .map(|name| match item.get(name) {
            Some(AttributeValue::S(value)) => Ok((name.to_string(), value.clone())),
            Some(other) => Err(RepositoryError::Serialization(format!(
                "unexpected key attribute {name}: {other:?}"
            ))),
            None => Err(RepositoryError::Serialization(format!(
                "item is missing key attribute {name}"
            ))),
        })
        .collect::<Result<BTreeMap<_, _>, _>>()?;
    Ok(Cursor::new(attributes))
}

/// Convert a cursor back into an `ExclusiveStartKey`.
pub fn cursor_to_key(cursor: &Cursor) -> Result<Item, RepositoryError> {
    if cursor.get(ATTR_PK).is_none() || cursor.get(ATTR_SK).is_none() {
        return Err(RepositoryError::InvalidData(
            "cursor is missing its key attributes".to_string(),
        ));
    }
    Ok(cursor
        .attributes()
        .iter()
        .map(|(name, value)| (name.clone(), AttributeValue::S(value.clone())))
        .collect())
}

/// Read a string attribute.
pub fn get_string(item: &Item, field: &str) -> Option<String> {
    item.get(field).and_then(|v| v.as_s().ok()).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use gthome_core::tables::{Photo, User, UserMeta, UserMetaKey, UserRole};
    use uuid::Uuid;

    fn sample_user() -> User {
        User::with_id(
            Uuid::parse_str("550e8400-e29b-41d4-a716-446655440001").unwrap(),
            "maria@example.com",
            "529.982.247-25",
            "12.345.678-9",
            UserRole::Dealer,
        )
    }

    #[test]
    fn test_user_round_trip() {
        let user = sample_user().with_password("sha256$salt$abc");
        let item = record_to_item(user.clone()).unwrap();
        let parsed: User = item_to_record(&item).unwrap();

        assert_eq!(parsed, user);
    }

    #[test]
    fn test_user_item_has_index_attributes() {
        let item = record_to_item(sample_user()).unwrap();

        assert_eq!(
            get_string(&item, "PK").as_deref(),
            Some("USER#550e8400-e29b-41d4-a716-446655440001")
        );
        assert_eq!(get_string(&item, "PK1").as_deref(), Some("User"));
        assert_eq!(get_string(&item, "SK1").as_deref(), Some("Dealer"));
        assert_eq!(
            get_string(&item, "SI").as_deref(),
            Some("EMAIL#maria@example.com")
        );
        assert!(!item.contains_key("Password"));
    }

    #[test]
    fn test_meta_item_round_trip_as_record() {
        let meta = UserMeta::new(sample_user().id(), UserMetaKey::DisplayName, "Maria");
        let item = record_to_item(meta.clone()).unwrap();
        let record: Record = item_to_record(&item).unwrap();

        assert_eq!(record, Record::UserMeta(meta));
    }

    #[test]
    fn test_photo_item_rejects_wrong_domain() {
        let mut item = record_to_item(Photo::new("https://cdn.gthome.com.br/a.jpg")).unwrap();
        item.insert("PK1".to_string(), AttributeValue::S("User".to_string()));

        assert!(matches!(
            item_to_record::<Photo>(&item),
            Err(RepositoryError::Serialization(_))
        ));
    }

    #[test]
    fn test_nested_attribute_conversion() {
        let value = serde_json::json!({"n": 1.5, "flags": [true, null], "m": {"s": "x"}});
        let attr = json_to_attribute(value).unwrap();
        let back = attribute_to_json(&attr).unwrap();

        assert_eq!(back, serde_json::json!({"n": 1.5, "flags": [true], "m": {"s": "x"}}));
    }

    #[test]
    fn test_cursor_from_photo_item_keeps_only_key_attributes() {
        let photo = Photo::new("https://cdn.example.com/sala.jpg").with_title("Sala");
        let item = record_to_item(photo.clone()).unwrap();

        let token = cursor_from_item(&item).unwrap().encode().unwrap();
        let start_key = cursor_to_key(&Cursor::decode(&token).unwrap()).unwrap();

        let expected = HashMap::from([
            ("PK".to_string(), AttributeValue::S(photo.key().pk().to_string())),
            ("SK".to_string(), AttributeValue::S(photo.key().sk().to_string())),
            ("PK1".to_string(), AttributeValue::S("Attachment".to_string())),
            ("SK1".to_string(), AttributeValue::S("Photo".to_string())),
        ]);
        assert_eq!(start_key, expected);
    }

    #[test]
    fn test_cursor_from_item_requires_index_attributes() {
        let item = key_to_item(&PrimaryKey::new("PHOTO#1", "PHOTO#1"));
        assert!(matches!(
            cursor_from_item(&item),
            Err(RepositoryError::Serialization(_))
        ));
    }

    #[test]
    fn test_cursor_without_keys_is_invalid() {
        let cursor = Cursor::from_pairs([("PK1", "Attachment")]);
        assert!(matches!(
            cursor_to_key(&cursor),
            Err(RepositoryError::InvalidData(_))
        ));
    }
}
