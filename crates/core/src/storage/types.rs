use std::collections::BTreeMap;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};

use super::{RepositoryError, Result};

/// Largest page a listing may request.
pub const MAX_PAGE_SIZE: usize = 100;

/// Opaque continuation token: the key attributes of the last item returned,
/// carried to the client as URL-safe base64 JSON.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cursor {
    attributes: BTreeMap<String, String>,
}

impl Cursor {
    pub fn new(attributes: BTreeMap<String, String>) -> Self {
        Self { attributes }
    }

    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self::new(
            pairs
                .into_iter()
                .map(|(name, value)| (name.to_string(), value.to_string()))
                .collect(),
        )
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }

    pub fn encode(&self) -> Result<String> {
        let json = serde_json::to_vec(&self.attributes)
            .map_err(|e| RepositoryError::Serialization(e.to_string()))?;
        Ok(URL_SAFE_NO_PAD.encode(json))
    }

    /// Decode a client-supplied cursor. Anything that is not our own encoding
    /// is invalid input.
    pub fn decode(token: &str) -> Result<Self> {
        let bytes = URL_SAFE_NO_PAD
            .decode(token.trim())
            .map_err(|e| RepositoryError::InvalidData(format!("malformed cursor: {e}")))?;
        let attributes: BTreeMap<String, String> = serde_json::from_slice(&bytes)
            .map_err(|e| RepositoryError::InvalidData(format!("malformed cursor: {e}")))?;
        if attributes.is_empty() {
            return Err(RepositoryError::InvalidData("empty cursor".to_string()));
        }
        Ok(Self { attributes })
    }
}

/// A page request for listing operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    limit: usize,
    pub cursor: Option<Cursor>,
}

impl PageRequest {
    /// Creates a page request, clamping the limit to `1..=MAX_PAGE_SIZE`.
    pub fn new(limit: usize) -> Self {
        Self {
            limit: limit.clamp(1, MAX_PAGE_SIZE),
            cursor: None,
        }
    }

    pub fn with_cursor(mut self, cursor: Option<Cursor>) -> Self {
        self.cursor = cursor;
        self
    }

    pub fn limit(&self) -> usize {
        self.limit
    }
}
