//! Command-line host for flow definitions
//!
//! Loads a definition, runs every root and prints the resulting output
//! values of each node as JSON.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use flow_engine::{
    validate_definition_with, GraphDefinition, NodeRegistry, Runner, RunnerConfig,
    StructuralError,
};

/// Run a dataflow graph definition
#[derive(Debug, Parser)]
#[command(name = "flow", version, about)]
struct Cli {
    /// JSON definition to load
    #[arg(required_unless_present = "list_nodes")]
    definition: Option<PathBuf>,

    /// JSON runner configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// Reject definitions whose connections form a cycle
    #[arg(long)]
    detect_cycles: bool,

    /// Fail on connections to unknown nodes instead of skipping them
    #[arg(long)]
    strict_targets: bool,

    /// Report every problem in the definition without running it
    ///
    /// Honours `--config` and `--strict-targets` the way a run would; cycles
    /// are always reported.
    #[arg(long)]
    check: bool,

    /// Print the available node types and exit
    #[arg(long)]
    list_nodes: bool,
}

impl Cli {
    fn runner_config(&self) -> anyhow::Result<RunnerConfig> {
        let mut config = match &self.config {
            Some(path) => RunnerConfig::load(path)
                .with_context(|| format!("Failed to read config {}", path.display()))?,
            None => RunnerConfig::default(),
        };
        config.detect_cycles |= self.detect_cycles;
        config.strict_targets |= self.strict_targets;
        Ok(config)
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    match run(Cli::parse()) {
        Ok(code) => code,
        Err(err) => {
            log::error!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let registry = Arc::new(flow_nodes::builtin_registry());

    if cli.list_nodes {
        println!("{}", serde_json::to_string_pretty(&registry.all_metadata())?);
        return Ok(ExitCode::SUCCESS);
    }

    let Some(path) = cli.definition.as_deref() else {
        anyhow::bail!("No definition given");
    };

    if cli.check {
        let errors = check(path, &registry, &cli.runner_config()?)?;
        if errors.is_empty() {
            log::info!("{} is valid", path.display());
            return Ok(ExitCode::SUCCESS);
        }
        for error in &errors {
            log::error!("{}", error);
        }
        return Ok(ExitCode::FAILURE);
    }

    let mut runner = Runner::new(registry).with_config(cli.runner_config()?);
    runner.load(path)?;
    let report = runner.run()?;

    let outputs: serde_json::Map<String, serde_json::Value> = runner
        .graph()
        .iter()
        .map(|(_, node)| {
            let values = node
                .ports()
                .outputs()
                .iter()
                .map(|(port, value)| (port.clone(), value.clone()))
                .collect::<serde_json::Map<_, _>>();
            (node.id().to_string(), serde_json::Value::Object(values))
        })
        .collect();

    log::info!(
        "Run {} finished after {} node execution(s)",
        report.execution_id,
        report.executed_nodes
    );
    println!("{}", serde_json::to_string_pretty(&outputs)?);
    Ok(ExitCode::SUCCESS)
}

/// Every problem a runner with `config` would hit loading `path`
fn check(
    path: &Path,
    registry: &NodeRegistry,
    config: &RunnerConfig,
) -> anyhow::Result<Vec<StructuralError>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Cannot open {}", path.display()))?;
    let definition = GraphDefinition::from_json(&text)?;
    Ok(validate_definition_with(&definition, registry, config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_cli_flags_override_config() {
        let cli = Cli::parse_from(["flow", "graph.json", "--detect-cycles"]);
        let config = cli.runner_config().unwrap();
        assert!(config.detect_cycles);
        assert!(!config.strict_targets);
        assert!(config.validate_ports);
    }

    #[test]
    fn test_list_nodes_needs_no_definition() {
        let cli = Cli::try_parse_from(["flow", "--list-nodes"]).unwrap();
        assert!(cli.list_nodes);
        assert!(cli.definition.is_none());

        assert!(Cli::try_parse_from(["flow"]).is_err());
    }

    #[test]
    fn test_check_honours_config() {
        let mut definition = tempfile::NamedTempFile::new().unwrap();
        write!(
            definition,
            r#"{{"nodes":[{{"id":"a","type":"RandomNumber","connections":[{{"node":"ghost","map":"number:input"}}]}}]}}"#
        )
        .unwrap();
        let registry = flow_nodes::builtin_registry();

        let cli = Cli::parse_from(["flow", "graph.json", "--check"]);
        let errors = check(definition.path(), &registry, &cli.runner_config().unwrap()).unwrap();
        assert!(errors.is_empty(), "got: {:?}", errors);

        let cli = Cli::parse_from(["flow", "graph.json", "--check", "--strict-targets"]);
        let errors = check(definition.path(), &registry, &cli.runner_config().unwrap()).unwrap();
        assert!(matches!(
            errors.as_slice(),
            [StructuralError::UnknownConnectionTarget { .. }]
        ));

        let mut config = tempfile::NamedTempFile::new().unwrap();
        write!(config, r#"{{"strictTargets": true}}"#).unwrap();
        let config_path = config.path().to_str().unwrap();
        let cli = Cli::parse_from(["flow", "graph.json", "--check", "--config", config_path]);
        let errors = check(definition.path(), &registry, &cli.runner_config().unwrap()).unwrap();
        assert_eq!(errors.len(), 1);
    }
}
