//! command handling: resource documents in, reconciliation calls out.

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use serde_json::Value;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use vantage_engine::{ApplyOptions, Client, Config, Lifecycle, Resource};
use vantage_monitoring::{
    Group, MetricDescriptor, MetricsScope, MonitoredProject, NotificationChannel, ResourceKind,
    ServiceLevelObjective,
};

#[cfg(test)]
mod test_support;

/// top-level cli definition.
#[derive(Parser)]
#[command(name = "vantage")]
#[command(about = "Declarative reconciler for cloud monitoring resources")]
pub(crate) struct Cli {
    #[command(flatten)]
    connection: Connection,
    #[command(subcommand)]
    command: Command,
}

/// how to reach the api.
#[derive(Args, Default)]
struct Connection {
    /// yaml file with client settings.
    #[arg(long, global = true, env = "VANTAGE_CONFIG")]
    config: Option<PathBuf>,
    #[arg(long, global = true)]
    base_path: Option<String>,
    #[arg(long, global = true)]
    token: Option<String>,
}

/// cli subcommands. every command reads resource documents from `--file`.
#[derive(Subcommand)]
enum Command {
    /// check documents without calling the api.
    Validate {
        #[arg(short = 'f', long)]
        file: PathBuf,
    },
    Get {
        #[arg(short = 'f', long)]
        file: PathBuf,
    },
    /// list resources under the parent each document names.
    List {
        #[arg(short = 'f', long)]
        file: PathBuf,
    },
    /// show what apply would do.
    Plan {
        #[arg(short = 'f', long)]
        file: PathBuf,
        #[command(flatten)]
        lifecycle: LifecycleFlags,
    },
    Apply {
        #[arg(short = 'f', long)]
        file: PathBuf,
        #[command(flatten)]
        lifecycle: LifecycleFlags,
    },
    Delete {
        #[arg(short = 'f', long)]
        file: PathBuf,
    },
}

#[derive(Args, Debug, Default, Clone, Copy, PartialEq, Eq)]
struct LifecycleFlags {
    /// fail instead of creating missing resources.
    #[arg(long, default_value_t = false)]
    block_creation: bool,
    /// fail instead of taking over existing resources.
    #[arg(long, default_value_t = false)]
    block_acquire: bool,
    /// fail instead of updating existing resources.
    #[arg(long, default_value_t = false)]
    block_modification: bool,
}

impl LifecycleFlags {
    fn options<R: Resource>(&self) -> ApplyOptions<R> {
        let mut options = ApplyOptions::default();
        if self.block_creation {
            options = options.with_lifecycle(Lifecycle::BlockCreation);
        }
        if self.block_acquire {
            options = options.with_lifecycle(Lifecycle::BlockAcquire);
        }
        if self.block_modification {
            options = options.with_lifecycle(Lifecycle::BlockModification);
        }
        options
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Validate,
    Get,
    List,
    Plan(LifecycleFlags),
    Apply(LifecycleFlags),
    Delete,
}

/// one resource document: its kind plus the api-shaped body.
#[derive(Debug, Clone, PartialEq)]
struct Document {
    kind: ResourceKind,
    body: Value,
}

pub(crate) async fn run(cli: Cli) -> Result<()> {
    let (file, action) = match cli.command {
        Command::Validate { file } => (file, Action::Validate),
        Command::Get { file } => (file, Action::Get),
        Command::List { file } => (file, Action::List),
        Command::Plan { file, lifecycle } => (file, Action::Plan(lifecycle)),
        Command::Apply { file, lifecycle } => (file, Action::Apply(lifecycle)),
        Command::Delete { file } => (file, Action::Delete),
    };
    let documents = load_documents(&file)?;
    let client = match action {
        Action::Validate => None,
        _ => Some(build_client(&cli.connection)?),
    };
    for document in documents {
        for line in dispatch(client.as_ref(), action, document).await? {
            println!("{line}");
        }
    }
    Ok(())
}

/// read one document or a sequence of documents from yaml or json.
fn load_documents(path: &Path) -> Result<Vec<Document>> {
    let raw =
        fs::read_to_string(path).with_context(|| format!("read resources: {}", path.display()))?;
    let value: Value = serde_yaml::from_str(&raw)
        .with_context(|| format!("parse resources: {}", path.display()))?;
    let items = match value {
        Value::Array(items) => items,
        Value::Null => Vec::new(),
        other => vec![other],
    };
    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            parse_document(item)
                .with_context(|| format!("document {} in {}", index + 1, path.display()))
        })
        .collect()
}

fn parse_document(value: Value) -> Result<Document> {
    let Value::Object(mut map) = value else {
        bail!("resource document must be a mapping");
    };
    let kind = match map.remove("kind") {
        Some(Value::String(kind)) => kind.parse::<ResourceKind>()?,
        Some(other) => bail!("kind must be a string, got {other}"),
        None => bail!("missing kind"),
    };
    Ok(Document {
        kind,
        body: Value::Object(map),
    })
}

/// load client settings, then apply flag and environment overrides.
fn load_config(path: Option<&Path>, base_path: Option<String>) -> Result<Config> {
    let mut config = match path {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("read config: {}", path.display()))?;
            serde_yaml::from_str(&raw)
                .with_context(|| format!("parse config: {}", path.display()))?
        }
        None => Config::default(),
    };
    if let Some(base_path) = base_path.or_else(|| std::env::var("VANTAGE_BASE_PATH").ok()) {
        config.base_path = Some(base_path);
    }
    Ok(config)
}

/// resolve the access token from flags or environment.
fn access_token(token: Option<String>) -> Result<String> {
    token
        .or_else(|| std::env::var("VANTAGE_ACCESS_TOKEN").ok())
        .ok_or_else(|| anyhow!("missing --token or VANTAGE_ACCESS_TOKEN"))
}

fn build_client(connection: &Connection) -> Result<Client> {
    let config = load_config(connection.config.as_deref(), connection.base_path.clone())?;
    let token = access_token(connection.token.clone())?;
    Client::from_config(config, Some(token)).context("build http client")
}

async fn dispatch(client: Option<&Client>, action: Action, document: Document) -> Result<Vec<String>> {
    let body = document.body;
    match document.kind {
        ResourceKind::Group => perform::<Group>(client, action, body).await,
        ResourceKind::MetricDescriptor => perform::<MetricDescriptor>(client, action, body).await,
        ResourceKind::MetricsScope => perform::<MetricsScope>(client, action, body).await,
        ResourceKind::MonitoredProject => perform::<MonitoredProject>(client, action, body).await,
        ResourceKind::NotificationChannel => {
            perform::<NotificationChannel>(client, action, body).await
        }
        ResourceKind::ServiceLevelObjective => {
            perform::<ServiceLevelObjective>(client, action, body).await
        }
    }
}

fn connected(client: Option<&Client>) -> Result<&Client> {
    client.ok_or_else(|| anyhow!("command needs an api client"))
}

/// run `action` for one resource and return the lines to print.
async fn perform<R>(client: Option<&Client>, action: Action, body: Value) -> Result<Vec<String>>
where
    R: Resource + fmt::Display,
{
    let resource = R::from_json(body).with_context(|| format!("parse {} document", R::KIND))?;
    match action {
        Action::Validate => {
            resource
                .validate()
                .with_context(|| format!("validate {resource}"))?;
            Ok(vec![format!("ok: {resource}")])
        }
        Action::Get => {
            let state = connected(client)?
                .get(&resource)
                .await
                .with_context(|| format!("get {resource}"))?;
            Ok(vec![serde_json::to_string_pretty(&state)?])
        }
        Action::List => {
            let client = connected(client)?;
            let mut page = client
                .list(&resource)
                .await
                .with_context(|| format!("list {}", R::KIND))?;
            let mut lines: Vec<String> = page.items.iter().map(ToString::to_string).collect();
            while page.has_next() {
                page.next(client).await?;
                lines.extend(page.items.iter().map(ToString::to_string));
            }
            info!(kind = R::KIND, count = lines.len(), "listed resources");
            Ok(lines)
        }
        Action::Plan(flags) => {
            let plan = connected(client)?
                .plan(&resource, &flags.options())
                .await
                .with_context(|| format!("plan {resource}"))?;
            if plan.is_noop() {
                return Ok(vec![format!("{resource}: no changes")]);
            }
            let mut lines: Vec<String> = plan
                .operations
                .iter()
                .map(|operation| format!("{resource}: {operation}"))
                .collect();
            lines.extend(plan.diffs.iter().map(|diff| format!("  {diff}")));
            Ok(lines)
        }
        Action::Apply(flags) => {
            let state = connected(client)?
                .apply(&resource, &flags.options())
                .await
                .with_context(|| format!("apply {resource}"))?;
            Ok(vec![format!("applied {state}")])
        }
        Action::Delete => {
            connected(client)?
                .delete(&resource)
                .await
                .with_context(|| format!("delete {resource}"))?;
            Ok(vec![format!("deleted {resource}")])
        }
    }
}
