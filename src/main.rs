mod config;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use clusterq::inventory::Inventory;
use clusterq::{
    ClusterController, ComparisonOp, FilterFormatter, Predicate, PredicateBuilder, PropertyId,
    Request, Resource, ResourceType, Schema, TemporalInfo,
};
use chrono::{DateTime, Utc};
use config::Config;
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// Version injected at compile time via CLUSTERQ_VERSION env var (set by
/// CI/CD), or "dev" for local builds.
pub const VERSION: &str = match option_env!("CLUSTERQ_VERSION") {
    Some(v) => v,
    None => "dev",
};

/// Typed queries over cluster inventory snapshots
#[derive(Parser, Debug)]
#[command(name = "clusterq", version = VERSION, about, long_about = None)]
struct Args {
    /// Resource type to query (cluster, service, host, component,
    /// host_component); omit for a per-type summary
    resource: Option<ResourceType>,

    /// Inventory snapshot file (JSON)
    #[arg(short, long)]
    inventory: Option<PathBuf>,

    /// Comma-separated property paths to project
    /// (e.g. Hosts/host_name,metrics/cpu/load)
    #[arg(short, long)]
    fields: Option<String>,

    /// Filter clause `category/name<op>value` with =, !=, >, >=, <, <=;
    /// repeatable, clauses AND together
    #[arg(short = 'w', long = "where", value_name = "CLAUSE")]
    filters: Vec<String>,

    /// Start of the temporal range (RFC 3339)
    #[arg(long)]
    since: Option<String>,

    /// End of the temporal range (RFC 3339)
    #[arg(long)]
    until: Option<String>,

    /// Output format
    #[arg(short, long, value_enum)]
    output: Option<OutputFormat>,

    /// Print the schema of the resource type instead of querying
    #[arg(long)]
    schema: bool,

    /// Print the predicate as a filter clause and exit
    #[arg(long)]
    explain: bool,

    /// Remember --inventory and --output as defaults for future runs
    #[arg(long)]
    save_defaults: bool,

    /// Log level for debugging
    #[arg(long, value_enum, default_value = "off")]
    log_level: LogLevel,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
    Yaml,
}

impl OutputFormat {
    fn from_name(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "json" => Self::Json,
            "yaml" => Self::Yaml,
            _ => Self::Text,
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Json => "json",
            Self::Yaml => "yaml",
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

fn setup_logging(level: LogLevel) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let tracing_level = level.to_tracing_level()?;

    let log_path = get_log_path();

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .expect("Failed to open log file");

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::fmt()
        .with_max_level(tracing_level)
        .with_writer(non_blocking.with_max_level(tracing_level))
        .with_ansi(false)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("clusterq started with log level: {:?}", level);
    tracing::info!("Log file: {:?}", log_path);

    Some(guard)
}

fn get_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("clusterq").join("clusterq.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".clusterq").join("clusterq.log");
    }
    PathBuf::from("clusterq.log")
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let _log_guard = setup_logging(args.log_level);

    let mut config = Config::load();

    let predicate = build_predicate(&args.filters)?;

    if args.explain {
        let rendered = match &predicate {
            Some(predicate) => FilterFormatter::format(predicate),
            None => FilterFormatter::format(&Predicate::Always),
        };
        println!("{}", rendered);
        return Ok(());
    }

    if args.save_defaults {
        if let Some(path) = &args.inventory {
            config.inventory = Some(path.clone());
        }
        if let Some(output) = args.output {
            config.output = Some(output.as_str().to_string());
        }
        config.save().context("Failed to save defaults")?;
    }

    let inventory_path = args
        .inventory
        .clone()
        .or_else(|| config.inventory.clone())
        .context("No inventory snapshot configured. Pass --inventory or persist one with --save-defaults")?;

    let inventory = Inventory::load(&inventory_path)
        .with_context(|| format!("Failed to load inventory {}", inventory_path.display()))?;
    let controller = inventory.into_controller();

    let format = args
        .output
        .unwrap_or_else(|| OutputFormat::from_name(&config.effective_output()));

    match args.resource {
        Some(resource_type) => {
            let _ = config.set_last_resource(resource_type.as_str());

            if args.schema {
                let schema = controller.get_schema(resource_type)?;
                println!("{}", render_schema(schema, format)?);
                return Ok(());
            }

            let request = build_request(&args)?;
            let result = controller
                .get_resources(resource_type, &request, predicate.as_ref())
                .await?;
            let resources = result.into_vec();
            tracing::info!(count = resources.len(), %resource_type, "query complete");
            println!("{}", render_resources(&resources, format)?);
        }
        None => {
            print_summary(&controller).await;
        }
    }

    Ok(())
}

/// Query every registered type concurrently and print one count per line.
async fn print_summary(controller: &ClusterController) {
    let types = controller.resource_types();
    let request = Request::all_properties();
    let queries = types
        .iter()
        .map(|t| controller.get_resources(*t, &request, None));
    let results = futures::future::join_all(queries).await;

    for (resource_type, result) in types.iter().zip(results) {
        match result {
            Ok(result) => println!("{:<16} {}", resource_type, result.iter().count()),
            Err(e) => println!("{:<16} error: {}", resource_type, e),
        }
    }
}

/// AND the `--where` clauses into one predicate; no clauses means no filter.
fn build_predicate(clauses: &[String]) -> Result<Option<Predicate>> {
    if clauses.is_empty() {
        return Ok(None);
    }
    let mut builder = PredicateBuilder::new();
    for (position, clause) in clauses.iter().enumerate() {
        let (path, op, value) = split_clause(clause)?;
        if position > 0 {
            builder = builder.and();
        }
        let step = builder.path(path);
        builder = match op {
            ComparisonOp::Equals => step.equals(value),
            ComparisonOp::NotEquals => step.not_equals(value),
            ComparisonOp::GreaterThan => step.greater_than(value),
            ComparisonOp::GreaterThanOrEquals => step.greater_than_or_equals(value),
            ComparisonOp::LessThan => step.less_than(value),
            ComparisonOp::LessThanOrEquals => step.less_than_or_equals(value),
        };
    }
    Ok(Some(builder.to_predicate()))
}

/// Split `category/name<op>value`; two-character operators are matched
/// first so `>=` does not parse as `>`.
fn split_clause(clause: &str) -> Result<(&str, ComparisonOp, &str)> {
    const OPS: [(&str, ComparisonOp); 6] = [
        ("!=", ComparisonOp::NotEquals),
        (">=", ComparisonOp::GreaterThanOrEquals),
        ("<=", ComparisonOp::LessThanOrEquals),
        ("=", ComparisonOp::Equals),
        (">", ComparisonOp::GreaterThan),
        ("<", ComparisonOp::LessThan),
    ];
    for (token, op) in OPS {
        if let Some((path, value)) = clause.split_once(token) {
            let (path, value) = (path.trim(), value.trim());
            if path.is_empty() || value.is_empty() {
                anyhow::bail!("Bad filter clause: {}", clause);
            }
            return Ok((path, op, value));
        }
    }
    anyhow::bail!(
        "No operator in filter clause: {} (expected =, !=, >, >=, < or <=)",
        clause
    )
}

fn build_request(args: &Args) -> Result<Request> {
    let request = match &args.fields {
        Some(fields) => Request::new(
            fields
                .split(',')
                .map(str::trim)
                .filter(|f| !f.is_empty())
                .map(PropertyId::from_path),
        ),
        None => Request::all_properties(),
    };

    let Some(since) = &args.since else {
        if args.until.is_some() {
            anyhow::bail!("--until requires --since");
        }
        return Ok(request);
    };

    let mut temporal = TemporalInfo::new(parse_instant(since)?);
    if let Some(until) = &args.until {
        temporal = temporal.with_end(parse_instant(until)?);
    }
    Ok(request.with_temporal_info(temporal))
}

fn parse_instant(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|instant| instant.with_timezone(&Utc))
        .with_context(|| format!("Invalid RFC 3339 timestamp: {}", value))
}

fn render_resources(resources: &[Resource], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(resources)?),
        OutputFormat::Yaml => Ok(serde_yaml::to_string(resources)?),
        OutputFormat::Text => {
            let mut blocks = Vec::new();
            for resource in resources {
                let lines: Vec<String> = resource
                    .flat_properties()
                    .iter()
                    .map(|(path, value)| format!("{} = {}", path, value))
                    .collect();
                blocks.push(lines.join("\n"));
            }
            blocks.push(format!("({} resources)", resources.len()));
            Ok(blocks.join("\n\n"))
        }
    }
}

fn render_schema(schema: &Schema, format: OutputFormat) -> Result<String> {
    let keys: serde_json::Map<String, serde_json::Value> = ResourceType::ALL
        .iter()
        .filter_map(|ancestor| {
            schema.key_property_id(*ancestor).map(|id| {
                (
                    ancestor.to_string(),
                    serde_json::Value::String(id.to_string()),
                )
            })
        })
        .collect();
    let value = serde_json::json!({
        "type": schema.resource_type(),
        "categories": schema.categories(),
        "keys": keys,
    });

    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&value)?),
        OutputFormat::Yaml => Ok(serde_yaml::to_string(&value)?),
        OutputFormat::Text => {
            let mut lines = vec![format!("type: {}", schema.resource_type())];
            for (category, names) in schema.categories() {
                let label = if category.is_empty() { "(root)" } else { category };
                let names: Vec<&str> = names.iter().map(String::as_str).collect();
                lines.push(format!("{}: {}", label, names.join(", ")));
            }
            for (ancestor, key) in &keys {
                lines.push(format!("key[{}]: {}", ancestor, key.as_str().unwrap_or("")));
            }
            Ok(lines.join("\n"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_clause_orders_operators() {
        let (path, op, value) = split_clause("metrics/cpu/load>=0.5").unwrap();
        assert_eq!(path, "metrics/cpu/load");
        assert_eq!(op, ComparisonOp::GreaterThanOrEquals);
        assert_eq!(value, "0.5");

        let (_, op, _) = split_clause("Hosts/state!=HEALTHY").unwrap();
        assert_eq!(op, ComparisonOp::NotEquals);
    }

    #[test]
    fn test_split_clause_rejects_garbage() {
        assert!(split_clause("no operator here").is_err());
        assert!(split_clause("=value").is_err());
        assert!(split_clause("path=").is_err());
    }

    #[test]
    fn test_build_predicate_ands_clauses() {
        let clauses = vec![
            "Hosts/state=HEALTHY".to_string(),
            "metrics/cpu/load>0.5".to_string(),
        ];
        let predicate = build_predicate(&clauses).unwrap().unwrap();
        match predicate {
            Predicate::And(terms) => assert_eq!(terms.len(), 2),
            other => panic!("expected And, got {:?}", other),
        }
    }

    #[test]
    fn test_no_clauses_no_predicate() {
        assert!(build_predicate(&[]).unwrap().is_none());
    }
}
