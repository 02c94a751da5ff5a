//! DynamoDB infrastructure management commands.

mod client;
mod config;
mod deploy;
mod error;
mod planning;
mod seed;

pub use error::{DynamodbError, Result};

use aws_sdk_dynamodb::Client;
use dialoguer::Confirm;

use crate::prelude::*;

/// DynamoDB infrastructure management commands.
#[derive(Debug, clap::Parser)]
pub struct DynamodbCommand {
    #[command(subcommand)]
    pub action: DynamodbAction,
}

/// Available DynamoDB actions.
#[derive(Debug, clap::Subcommand)]
pub enum DynamodbAction {
    /// Deploy or destroy DynamoDB table infrastructure.
    Deploy(DeployCommand),

    /// Seed the table with an admin account and sample photos.
    Seed(SeedCommand),
}

/// Deploy or update DynamoDB infrastructure.
#[derive(Debug, clap::Parser)]
#[command(long_about = "Deploy or destroy DynamoDB table infrastructure.

By default, this command creates or updates the gthome DynamoDB table
with its primary key, the GSI1 index and the SI sparse index.

The command shows a plan of changes before applying and asks for confirmation.

Environment variables:
  AWS_ENDPOINT_URL    - Use local DynamoDB (e.g., http://localhost:8000)
  AWS_REGION          - AWS region (defaults to sa-east-1)
  AWS_PROFILE         - AWS profile to use for credentials")]
pub struct DeployCommand {
    /// Skip confirmation prompts.
    #[arg(long)]
    pub force: bool,

    /// Destroy the table instead of creating/updating.
    #[arg(long)]
    pub destroy: bool,

    /// Table name to use.
    #[arg(long, default_value = "gthome")]
    pub table_name: String,
}

/// Seed the table with an admin account and sample photos.
#[derive(Debug, clap::Parser)]
#[command(long_about = "Insert a super user and a set of sample photos into DynamoDB.

The admin account gets a password so it can sign in through POST /auth
right away. If the username is already taken the account is left as is
and only the photos are inserted.

Environment variables:
  SEED_ADMIN_PASSWORD - Password for the admin account")]
pub struct SeedCommand {
    /// E-mail (username) of the admin account.
    #[arg(long, default_value = "admin@gthome.com.br")]
    pub admin_email: String,

    /// Password of the admin account.
    #[arg(long, env = "SEED_ADMIN_PASSWORD", hide_env_values = true)]
    pub admin_password: String,

    /// CPF of the admin account.
    #[arg(long, default_value = "52998224725")]
    pub admin_cpf: String,

    /// RG of the admin account.
    #[arg(long, default_value = "0000000")]
    pub admin_rg: String,

    /// Number of sample photos to insert.
    #[arg(long, default_value = "5")]
    pub photos: usize,

    /// Table name to use.
    #[arg(long, default_value = "gthome")]
    pub table_name: String,

    /// Skip confirmation prompts.
    #[arg(long)]
    pub force: bool,
}

/// Main entry point for dynamodb command.
pub async fn run(command: DynamodbCommand, global: crate::Global) -> Result<()> {
    let target = client::AwsTarget::from_env();
    let out = Output {
        silent: global.is_silent(),
    };
    out.line(format!("{} {}", p_b("Target:"), target.describe()));

    let dynamo = target.connect().await;
    match command.action {
        DynamodbAction::Deploy(cmd) if cmd.destroy => run_destroy(&dynamo, cmd, out).await,
        DynamodbAction::Deploy(cmd) => run_deploy(&dynamo, cmd, out).await,
        DynamodbAction::Seed(cmd) => run_seed(&dynamo, cmd, out).await,
    }
}

/// Console output honoring `--silent`.
#[derive(Debug, Clone, Copy)]
struct Output {
    silent: bool,
}

impl Output {
    fn line(&self, text: impl std::fmt::Display) {
        if !self.silent {
            aprintln!("{text}");
        }
    }

    /// Print plan lines colored by their leading marker.
    fn plan(&self, title: String, lines: &[String]) {
        self.line(title);
        for line in lines {
            let painted = match line.chars().next() {
                Some('+') => p_g(line),
                Some('-') => p_r(line),
                Some('~') => p_y(line),
                _ => line.clone(),
            };
            self.line(format!("  {painted}"));
        }
        self.line("");
    }
}

/// Ask for confirmation unless `force` is set.
fn confirm(force: bool, prompt: &str, default: bool) -> Result<()> {
    if force {
        return Ok(());
    }
    let confirmed = Confirm::new()
        .with_prompt(prompt)
        .default(default)
        .interact()?;
    if confirmed {
        Ok(())
    } else {
        Err(DynamodbError::UserCancelled)
    }
}

async fn run_destroy(dynamo: &Client, cmd: DeployCommand, out: Output) -> Result<()> {
    let current = client::get_table_state(dynamo, &cmd.table_name).await?;
    let plan = planning::calculate_destroy_plan(current.as_ref(), &cmd.table_name);
    out.plan(p_y("Destroy Plan:"), &planning::format_destroy_plan(&plan));

    if matches!(plan, planning::DestroyPlan::AlreadyGone { .. }) {
        out.line(p_g("Nothing to destroy."));
        return Ok(());
    }

    confirm(
        cmd.force,
        "Are you sure you want to delete this table? ALL DATA WILL BE LOST",
        false,
    )?;
    out.line(p_b("Deleting table..."));
    deploy::execute_destroy_plan(dynamo, &plan).await?;
    out.line(p_g("Table destroyed successfully."));
    Ok(())
}

async fn run_deploy(dynamo: &Client, cmd: DeployCommand, out: Output) -> Result<()> {
    let desired = config::gthome_table_config().with_table_name(&cmd.table_name);
    let current = client::get_table_state(dynamo, &cmd.table_name).await?;
    let plan = planning::calculate_deploy_plan(current.as_ref(), &desired);
    out.plan(p_c("Deploy Plan:"), &planning::format_deploy_plan(&plan));

    match plan {
        planning::DeployPlan::NoChanges { .. } => {
            out.line(p_g("Infrastructure is up to date."));
            return Ok(());
        }
        // Nothing to change yet; wait so a follow-up run sees the final state.
        planning::DeployPlan::TableBusy { .. } => {
            out.line(p_b("Waiting for the table to settle..."));
            deploy::execute_deploy_plan(dynamo, &plan).await?;
            out.line(p_g("Table is active. Run deploy again to apply pending changes."));
            return Ok(());
        }
        _ => {}
    }

    confirm(cmd.force, "Apply these changes?", true)?;
    out.line(p_b("Applying changes..."));
    deploy::execute_deploy_plan(dynamo, &plan).await?;
    out.line(p_g("Infrastructure deployed successfully."));
    Ok(())
}

async fn run_seed(dynamo: &Client, cmd: SeedCommand, out: Output) -> Result<()> {
    out.line(format!("{} {}", p_b("Table:"), cmd.table_name));
    out.line(format!("{} {}", p_b("Admin:"), cmd.admin_email));
    out.line(format!("{} {}", p_b("Sample photos:"), cmd.photos));
    out.line("");

    client::require_table(dynamo, &cmd.table_name).await?;

    let admin = seed::AdminSeed {
        email: &cmd.admin_email,
        password: &cmd.admin_password,
        cpf: &cmd.admin_cpf,
        rg: &cmd.admin_rg,
    };
    let plan = seed::build_seed_plan(&admin, cmd.photos, chrono::Utc::now());

    let mut preview = vec![format!("+ {} ({})", plan.admin.username, plan.admin.role)];
    preview.extend(plan.photos.iter().take(5).map(|(photo, _)| format!("+ {}", photo.uri)));
    if plan.photos.len() > 5 {
        preview.push(format!("... and {} more", plan.photos.len() - 5));
    }
    out.plan(p_c("Records to create:"), &preview);

    confirm(cmd.force, "Insert these records?", true)?;
    let report = seed::apply_seed_plan(dynamo, &cmd.table_name, &plan).await?;

    if report.admin_created {
        out.line(format!("{} admin account created.", p_g("Success:")));
    } else {
        out.line(format!(
            "{} {} already exists, left untouched.",
            p_y("Skipped:"),
            plan.admin.username
        ));
    }
    out.line(format!(
        "{} {} photos inserted.",
        p_g("Success:"),
        report.photos_created
    ));
    Ok(())
}
