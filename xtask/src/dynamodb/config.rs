//! Table configuration types (Functional Core - pure data).

use gthome_core::tables::{ATTR_PK, ATTR_PK1, ATTR_SI, ATTR_SK, ATTR_SK1, GSI1_INDEX, SPARSE_INDEX};

/// Table schema configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableConfig {
    pub table_name: String,
    pub partition_key: KeyAttribute,
    pub sort_key: Option<KeyAttribute>,
    pub gsis: Vec<GsiConfig>,
}

/// A key attribute definition. Every key in the table is a string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyAttribute {
    pub name: String,
}

impl KeyAttribute {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }
}

/// Global Secondary Index configuration. Indexes project all attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GsiConfig {
    pub name: String,
    pub partition_key: KeyAttribute,
    pub sort_key: Option<KeyAttribute>,
}

impl GsiConfig {
    /// Key attributes of the index, partition key first.
    pub fn key_attributes(&self) -> impl Iterator<Item = &KeyAttribute> {
        std::iter::once(&self.partition_key).chain(self.sort_key.as_ref())
    }
}

impl TableConfig {
    /// Sets the table name.
    pub fn with_table_name(mut self, name: &str) -> Self {
        self.table_name = name.to_string();
        self
    }

    /// Every key attribute the table or one of its indexes uses, without
    /// duplicates.
    pub fn key_attributes(&self) -> Vec<&KeyAttribute> {
        let mut attributes: Vec<&KeyAttribute> = Vec::new();
        let table_keys = std::iter::once(&self.partition_key).chain(self.sort_key.as_ref());
        let index_keys = self.gsis.iter().flat_map(GsiConfig::key_attributes);

        for attribute in table_keys.chain(index_keys) {
            if !attributes.iter().any(|a| a.name == attribute.name) {
                attributes.push(attribute);
            }
        }
        attributes
    }
}

/// Returns the canonical single-table configuration for gthome.
/// This is a pure function - no I/O.
pub fn gthome_table_config() -> TableConfig {
    TableConfig {
        table_name: "gthome".to_string(),
        partition_key: KeyAttribute::new(ATTR_PK),
        sort_key: Some(KeyAttribute::new(ATTR_SK)),
        gsis: vec![
            GsiConfig {
                name: GSI1_INDEX.to_string(),
                partition_key: KeyAttribute::new(ATTR_PK1),
                sort_key: Some(KeyAttribute::new(ATTR_SK1)),
            },
            GsiConfig {
                name: SPARSE_INDEX.to_string(),
                partition_key: KeyAttribute::new(ATTR_SI),
                sort_key: None,
            },
        ],
    }
}
