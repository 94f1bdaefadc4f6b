use crate::analyzer::{AnalysisReport, Analyzer};
use crate::config::{AnalyzerConfig, DocumentInfo, LookupConfig, ResolverBackend};
use crate::lookup::flow::DEFAULT_TIMEOUT_SECS;
use crate::lookup::DefinitionService;
use crate::serializer::{serialize_json, serialize_yaml, write_to_file};
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::{debug, info, warn};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Swagger from Flow - Generate Swagger 2.0 documentation from Flow-annotated route handlers
#[derive(Parser, Debug)]
#[command(name = "swagger-from-flow")]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Handler file, or folder whose files are all analyzed
    #[arg(value_name = "TARGET")]
    pub target: PathBuf,

    /// Output format (yaml or json)
    #[arg(short = 'f', long = "format", value_enum, default_value = "yaml")]
    pub output_format: OutputFormat,

    /// Output file path (if not specified, outputs to stdout)
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output_path: Option<PathBuf>,

    /// Write the graph schema to this file
    #[arg(short = 'g', long = "graphql-output", value_name = "FILE")]
    pub graph_output_path: Option<PathBuf>,

    /// Definition lookup backend
    #[arg(long = "resolver", value_enum, default_value = "flow")]
    pub resolver: ResolverBackend,

    /// Flow executable used by the flow resolver
    #[arg(long = "flow-bin", value_name = "PATH", default_value = "flow")]
    pub flow_binary: PathBuf,

    /// Timeout in seconds for one definition lookup
    #[arg(long = "lookup-timeout", value_name = "SECS", default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub lookup_timeout: u64,

    /// Host written into the document
    #[arg(long = "host", default_value = "localhost:3000")]
    pub host: String,

    /// Base path written into the document
    #[arg(long = "base-path", default_value = "/v1")]
    pub base_path: String,

    /// Title written into the document
    #[arg(long = "title", default_value = "Auto generated")]
    pub title: String,

    /// Exit with an error when any route could not be analyzed
    #[arg(long = "strict")]
    pub strict: bool,

    /// Enable verbose output
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// YAML format
    Yaml,
    /// JSON format
    Json,
}

impl CliArgs {
    /// Converts the arguments into library configuration.
    pub fn to_config(&self) -> AnalyzerConfig {
        AnalyzerConfig {
            lookup: LookupConfig {
                backend: self.resolver,
                flow_binary: self.flow_binary.clone(),
                timeout: Duration::from_secs(self.lookup_timeout),
            },
            document: DocumentInfo {
                host: self.host.clone(),
                base_path: self.base_path.clone(),
                title: self.title.clone(),
                ..Default::default()
            },
        }
    }
}

/// Validate and log already-parsed arguments
pub fn parse_args_from_parsed(args: CliArgs) -> Result<CliArgs> {
    debug!("Parsed arguments: {:?}", args);

    if !args.target.exists() {
        anyhow::bail!("Target does not exist: {}", args.target.display());
    }

    if args.lookup_timeout == 0 {
        anyhow::bail!("Lookup timeout must be at least one second");
    }

    info!("Target: {}", args.target.display());
    info!("Output format: {:?}", args.output_format);
    if let Some(ref output) = args.output_path {
        info!("Output file: {}", output.display());
    } else {
        info!("Output: stdout");
    }
    info!("Definition lookup: {:?}", args.resolver);

    Ok(args)
}

/// Run the main workflow
pub fn run(args: CliArgs) -> Result<()> {
    let config = args.to_config();
    let analyzer = Analyzer::from_config(&config.lookup);

    info!("Starting Swagger document generation...");
    let report = analyze_target(&analyzer, &args.target)?;

    for warning in &report.warnings {
        warn!("{}", warning);
    }

    let swagger = report.swagger(&config.document);
    let content = render(&swagger, args.output_format)?;

    if let Some(output_path) = &args.output_path {
        info!("Writing output to: {}", output_path.display());
        write_to_file(&content, output_path)?;
        info!("Successfully wrote Swagger document to {}", output_path.display());
    } else {
        println!("{}", content);
    }

    if let Some(graph_path) = &args.graph_output_path {
        let graph = render(&report.graph, args.output_format)?;
        write_to_file(&graph, graph_path)?;
        info!("Successfully wrote graph schema to {}", graph_path.display());
    } else if !report.graph.is_empty() {
        info!(
            "{} graph fields found; pass --graphql-output to write them",
            report.graph.len()
        );
    }

    info!("Generation complete!");
    info!("Summary:");
    info!("  - Operations: {}", report.api.operation_count());
    info!("  - Graph fields: {}", report.graph.len());
    info!("  - Failures: {}", report.failures.len());

    if args.strict && !report.is_clean() {
        anyhow::bail!("{} route(s) could not be analyzed", report.failures.len());
    }

    Ok(())
}

fn analyze_target<S: DefinitionService>(
    analyzer: &Analyzer<S>,
    target: &Path,
) -> Result<AnalysisReport> {
    let report = if target.is_dir() {
        analyzer.analyze_folder(target)
    } else {
        analyzer.analyze_file(target)
    };
    report.with_context(|| format!("Failed to analyze {}", target.display()))
}

fn render<T: Serialize>(doc: &T, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Yaml => serialize_yaml(doc),
        OutputFormat::Json => serialize_json(doc),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    /// Helper function to create a temporary file with content
    fn create_temp_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    const TYPES: &str = "export type Path<T> = T;\nexport type JSONResp<T> = T;\n";

    const CONTROLLER: &str = r#"import type { Path, JSONResp } from './types';
type Pet = { name: string, id: number };

route({ method: 'get', path: '/pet/:id' })((id: Path<number>): JSONResp<Pet> => ({}));

GraphQLResolver({ typeName: 'pet' })((id: number): Pet => ({}));
"#;

    fn args_for(target: &Path, extra: &[&str]) -> CliArgs {
        let mut argv = vec![
            "swagger-from-flow".to_string(),
            target.display().to_string(),
            "--resolver".to_string(),
            "local".to_string(),
        ];
        argv.extend(extra.iter().map(|s| s.to_string()));
        CliArgs::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_defaults() {
        let args = CliArgs::try_parse_from(["swagger-from-flow", "handlers"]).unwrap();

        assert_eq!(args.output_format, OutputFormat::Yaml);
        assert_eq!(args.resolver, ResolverBackend::Flow);
        assert_eq!(args.to_config(), AnalyzerConfig::default());
        assert!(!args.strict);
    }

    #[test]
    fn test_to_config() {
        let args = CliArgs::try_parse_from([
            "swagger-from-flow",
            "handlers",
            "--resolver",
            "local",
            "--flow-bin",
            "/opt/flow",
            "--lookup-timeout",
            "5",
            "--host",
            "api.example.com",
            "--base-path",
            "/v2",
        ])
        .unwrap();

        let config = args.to_config();

        assert_eq!(config.lookup.backend, ResolverBackend::Local);
        assert_eq!(config.lookup.flow_binary, PathBuf::from("/opt/flow"));
        assert_eq!(config.lookup.timeout, Duration::from_secs(5));
        assert_eq!(config.document.host, "api.example.com");
        assert_eq!(config.document.base_path, "/v2");
        assert_eq!(config.document.version, "1.0");
    }

    #[test]
    fn test_missing_target_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let args = args_for(&temp_dir.path().join("nope.js"), &[]);

        assert!(parse_args_from_parsed(args).is_err());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let args = args_for(temp_dir.path(), &["--lookup-timeout", "0"]);

        assert!(parse_args_from_parsed(args).is_err());
    }

    #[test]
    fn test_run_writes_documents() {
        let temp_dir = TempDir::new().unwrap();
        create_temp_file(&temp_dir, "types.js", TYPES);
        let controller = create_temp_file(&temp_dir, "controller.js", CONTROLLER);
        let output = temp_dir.path().join("out/swagger.json");
        let graph = temp_dir.path().join("out/graph.json");
        let args = args_for(
            &controller,
            &[
                "-f",
                "json",
                "-o",
                output.to_str().unwrap(),
                "-g",
                graph.to_str().unwrap(),
            ],
        );

        run(args).unwrap();

        let swagger: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(swagger["swagger"], "2.0");
        assert_eq!(
            swagger["paths"]["/pet/{id}"]["get"]["parameters"][0]["in"],
            "path"
        );

        let graph: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&graph).unwrap()).unwrap();
        assert_eq!(graph["pet"]["mutation"], false);
        assert_eq!(graph["pet"]["response"]["required"][0], "name");
    }

    #[test]
    fn test_strict_mode_fails_on_route_errors() {
        let temp_dir = TempDir::new().unwrap();
        create_temp_file(
            &temp_dir,
            "broken.js",
            "route({ method: 'get', path: '/x' })((): JSONResp<Missing> => ({}));\n",
        );
        let output = temp_dir.path().join("swagger.yaml");

        let lenient = args_for(temp_dir.path(), &["-o", output.to_str().unwrap()]);
        assert!(run(lenient).is_ok());
        assert!(output.exists());

        let strict = args_for(
            temp_dir.path(),
            &["-o", output.to_str().unwrap(), "--strict"],
        );
        assert!(run(strict).is_err());
    }
}
