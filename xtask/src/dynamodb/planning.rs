//! Pure functions for calculating deployment plans (Functional Core).

use super::config::{GsiConfig, TableConfig};

/// Represents the current state of a table.
#[derive(Debug, Clone)]
pub struct TableState {
    pub status: TableStatus,
    pub gsis: Vec<GsiState>,
}

/// Table status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableStatus {
    Active,
    Creating,
    Updating,
    Deleting,
}

/// GSI state.
#[derive(Debug, Clone)]
pub struct GsiState {
    pub name: String,
    pub status: GsiStatus,
}

/// GSI status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GsiStatus {
    Active,
    Creating,
    Updating,
    Deleting,
}

/// Planned changes for deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeployPlan {
    /// Table doesn't exist, needs to be created.
    CreateTable { config: TableConfig },
    /// Table exists, GSIs need to be added. DynamoDB accepts one index
    /// creation per update, so they are applied in order.
    AddGsis {
        table_name: String,
        gsis_to_add: Vec<GsiConfig>,
    },
    /// Table is being changed by someone else; nothing can be applied yet.
    TableBusy {
        table_name: String,
        status: TableStatus,
    },
    /// Table is up to date, no changes needed.
    NoChanges { table_name: String },
}

/// Plan for destroying a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DestroyPlan {
    /// Table exists and will be deleted.
    DeleteTable { table_name: String },
    /// Table doesn't exist, nothing to do.
    AlreadyGone { table_name: String },
}

/// Pure function: Calculate what changes are needed to reach desired state.
pub fn calculate_deploy_plan(current: Option<&TableState>, desired: &TableConfig) -> DeployPlan {
    let Some(state) = current else {
        return DeployPlan::CreateTable {
            config: desired.clone(),
        };
    };

    if state.status != TableStatus::Active {
        return DeployPlan::TableBusy {
            table_name: desired.table_name.clone(),
            status: state.status,
        };
    }

    let gsis_to_add: Vec<GsiConfig> = desired
        .gsis
        .iter()
        .filter(|gsi| !state.gsis.iter().any(|existing| existing.name == gsi.name))
        .cloned()
        .collect();

    if gsis_to_add.is_empty() {
        DeployPlan::NoChanges {
            table_name: desired.table_name.clone(),
        }
    } else {
        DeployPlan::AddGsis {
            table_name: desired.table_name.clone(),
            gsis_to_add,
        }
    }
}

/// Pure function: Calculate destroy plan.
pub fn calculate_destroy_plan(current: Option<&TableState>, table_name: &str) -> DestroyPlan {
    match current {
        Some(_) => DestroyPlan::DeleteTable {
            table_name: table_name.to_string(),
        },
        None => DestroyPlan::AlreadyGone {
            table_name: table_name.to_string(),
        },
    }
}

fn format_gsi(lines: &mut Vec<String>, prefix: &str, gsi: &GsiConfig) {
    lines.push(format!("{prefix}+ GSI: {}", gsi.name));
    lines.push(format!("{prefix}  Partition key: {} (S)", gsi.partition_key.name));
    if let Some(sk) = &gsi.sort_key {
        lines.push(format!("{prefix}  Sort key: {} (S)", sk.name));
    }
}

/// Pure function: Format a deploy plan for display.
pub fn format_deploy_plan(plan: &DeployPlan) -> Vec<String> {
    match plan {
        DeployPlan::CreateTable { config } => {
            let mut lines = vec![
                format!("+ Create table: {}", config.table_name),
                format!("  Partition key: {} (S)", config.partition_key.name),
            ];
            if let Some(sk) = &config.sort_key {
                lines.push(format!("  Sort key: {} (S)", sk.name));
            }
            for gsi in &config.gsis {
                format_gsi(&mut lines, "  ", gsi);
            }
            lines.push("  Billing: PAY_PER_REQUEST".to_string());
            lines
        }
        DeployPlan::AddGsis {
            table_name,
            gsis_to_add,
        } => {
            let mut lines = vec![format!("~ Update table: {table_name}")];
            for gsi in gsis_to_add {
                format_gsi(&mut lines, "  ", gsi);
            }
            lines
        }
        DeployPlan::TableBusy { table_name, status } => {
            vec![format!("~ Table '{table_name}' is {status:?}, try again once it is active")]
        }
        DeployPlan::NoChanges { table_name } => {
            vec![format!("= Table '{table_name}' is up to date")]
        }
    }
}

/// Pure function: Format a destroy plan for display.
pub fn format_destroy_plan(plan: &DestroyPlan) -> Vec<String> {
    match plan {
        DestroyPlan::DeleteTable { table_name } => {
            vec![format!("- Delete table: {table_name} (ALL DATA WILL BE LOST)")]
        }
        DestroyPlan::AlreadyGone { table_name } => {
            vec![format!("= Table '{table_name}' does not exist")]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dynamodb::config::gthome_table_config;

    fn active_table(gsis: &[&str]) -> TableState {
        TableState {
            status: TableStatus::Active,
            gsis: gsis
                .iter()
                .map(|name| GsiState {
                    name: name.to_string(),
                    status: GsiStatus::Active,
                })
                .collect(),
        }
    }

    #[test]
    fn test_missing_table_is_created() {
        let config = gthome_table_config();
        let plan = calculate_deploy_plan(None, &config);
        assert_eq!(plan, DeployPlan::CreateTable { config });

        let lines = format_deploy_plan(&plan);
        assert_eq!(lines[0], "+ Create table: gthome");
        assert!(lines.contains(&"  + GSI: SI".to_string()));
        assert!(lines.contains(&"    Partition key: SI (S)".to_string()));
    }

    #[test]
    fn test_missing_sparse_index_is_added() {
        let config = gthome_table_config();
        let plan = calculate_deploy_plan(Some(&active_table(&["GSI1"])), &config);

        match plan {
            DeployPlan::AddGsis { gsis_to_add, .. } => {
                assert_eq!(gsis_to_add.len(), 1);
                assert_eq!(gsis_to_add[0].name, "SI");
            }
            other => panic!("expected AddGsis, got {other:?}"),
        }
    }

    #[test]
    fn test_complete_table_has_no_changes() {
        let config = gthome_table_config();
        let plan = calculate_deploy_plan(Some(&active_table(&["GSI1", "SI"])), &config);
        assert_eq!(
            plan,
            DeployPlan::NoChanges {
                table_name: "gthome".to_string()
            }
        );
    }

    #[test]
    fn test_busy_table_is_left_alone() {
        let mut state = active_table(&[]);
        state.status = TableStatus::Updating;

        let plan = calculate_deploy_plan(Some(&state), &gthome_table_config());

        assert!(matches!(
            plan,
            DeployPlan::TableBusy {
                status: TableStatus::Updating,
                ..
            }
        ));
    }

    #[test]
    fn test_destroy_plan() {
        assert_eq!(
            calculate_destroy_plan(None, "gthome"),
            DestroyPlan::AlreadyGone {
                table_name: "gthome".to_string()
            }
        );
        let plan = calculate_destroy_plan(Some(&active_table(&[])), "gthome");
        assert_eq!(
            format_destroy_plan(&plan),
            ["- Delete table: gthome (ALL DATA WILL BE LOST)"]
        );
    }
}
