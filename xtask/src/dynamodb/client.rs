//! AWS SDK client setup (Imperative Shell).

use aws_sdk_dynamodb::types::{IndexStatus, TableStatus as SdkTableStatus};
use aws_sdk_dynamodb::Client;

use super::error::{DynamodbError, Result};
use super::planning::{GsiState, GsiStatus, TableState, TableStatus};

const DEFAULT_REGION: &str = "sa-east-1";

/// Where the commands send their requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AwsTarget {
    /// Local DynamoDB endpoint, when set.
    pub endpoint_url: Option<String>,
    pub region: String,
}

impl AwsTarget {
    /// Read `AWS_ENDPOINT_URL` and `AWS_REGION`.
    pub fn from_env() -> Self {
        Self::new(
            std::env::var("AWS_ENDPOINT_URL").ok(),
            std::env::var("AWS_REGION").ok(),
        )
    }

    fn new(endpoint_url: Option<String>, region: Option<String>) -> Self {
        Self {
            endpoint_url: endpoint_url.filter(|url| !url.is_empty()),
            region: region
                .filter(|region| !region.is_empty())
                .unwrap_or_else(|| DEFAULT_REGION.to_string()),
        }
    }

    pub fn describe(&self) -> String {
        match &self.endpoint_url {
            Some(url) => format!("Local DynamoDB ({url})"),
            None => format!("AWS DynamoDB (region: {})", self.region),
        }
    }

    pub async fn connect(&self) -> Client {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(self.region.clone()));

        if let Some(endpoint) = &self.endpoint_url {
            loader = loader.endpoint_url(endpoint);
        }

        Client::new(&loader.load().await)
    }
}

fn table_status(status: Option<&SdkTableStatus>) -> TableStatus {
    match status {
        Some(SdkTableStatus::Creating) => TableStatus::Creating,
        Some(SdkTableStatus::Updating) => TableStatus::Updating,
        Some(SdkTableStatus::Deleting) => TableStatus::Deleting,
        _ => TableStatus::Active,
    }
}

fn gsi_status(status: Option<&IndexStatus>) -> GsiStatus {
    match status {
        Some(IndexStatus::Creating) => GsiStatus::Creating,
        Some(IndexStatus::Updating) => GsiStatus::Updating,
        Some(IndexStatus::Deleting) => GsiStatus::Deleting,
        _ => GsiStatus::Active,
    }
}

/// Fetch the current table state; `None` when the table does not exist.
pub async fn get_table_state(client: &Client, table_name: &str) -> Result<Option<TableState>> {
    let response = match client.describe_table().table_name(table_name).send().await {
        Ok(response) => response,
        Err(err)
            if err
                .as_service_error()
                .is_some_and(|e| e.is_resource_not_found_exception()) =>
        {
            return Ok(None);
        }
        Err(err) => return Err(DynamodbError::sdk("DescribeTable", err)),
    };

    let Some(table) = response.table() else {
        return Err(DynamodbError::sdk(
            "DescribeTable",
            format!("no description returned for '{table_name}'"),
        ));
    };

    let gsis = table
        .global_secondary_indexes()
        .iter()
        .map(|gsi| GsiState {
            name: gsi.index_name().unwrap_or_default().to_string(),
            status: gsi_status(gsi.index_status()),
        })
        .collect();

    Ok(Some(TableState {
        status: table_status(table.table_status()),
        gsis,
    }))
}

/// Fail with `TableNotFound` unless the table exists.
pub async fn require_table(client: &Client, table_name: &str) -> Result<TableState> {
    get_table_state(client, table_name)
        .await?
        .ok_or_else(|| DynamodbError::TableNotFound {
            table_name: table_name.to_string(),
        })
}
