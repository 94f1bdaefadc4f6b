use crate::lookup::flow::DEFAULT_TIMEOUT_SECS;
use crate::lookup::{DefinitionService, FlowDefinitionService, SourceIndexService};
use clap::ValueEnum;
use log::debug;
use std::path::PathBuf;
use std::time::Duration;

/// Which definition lookup backend to use
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ResolverBackend {
    /// `flow get-def` subprocess
    #[default]
    Flow,
    /// In-process source index (no Flow server needed)
    Local,
}

/// Definition lookup settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupConfig {
    pub backend: ResolverBackend,
    /// Flow executable, resolved through `PATH` when relative
    pub flow_binary: PathBuf,
    /// Timeout for one lookup subprocess
    pub timeout: Duration,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            backend: ResolverBackend::default(),
            flow_binary: PathBuf::from("flow"),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl LookupConfig {
    /// Builds the configured lookup service.
    pub fn build_service(&self) -> Box<dyn DefinitionService> {
        debug!("Using {:?} definition lookup", self.backend);
        match self.backend {
            ResolverBackend::Flow => Box::new(FlowDefinitionService::new(
                self.flow_binary.clone(),
                self.timeout,
            )),
            ResolverBackend::Local => Box::new(SourceIndexService::new()),
        }
    }
}

/// Values of the Swagger envelope that do not come from the sources
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentInfo {
    pub host: String,
    pub base_path: String,
    pub title: String,
    pub version: String,
}

impl Default for DocumentInfo {
    fn default() -> Self {
        Self {
            host: "localhost:3000".to_string(),
            base_path: "/v1".to_string(),
            title: "Auto generated".to_string(),
            version: "1.0".to_string(),
        }
    }
}

/// Complete analyzer configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalyzerConfig {
    pub lookup: LookupConfig,
    pub document: DocumentInfo,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AnalyzerConfig::default();

        assert_eq!(config.lookup.backend, ResolverBackend::Flow);
        assert_eq!(config.lookup.flow_binary, PathBuf::from("flow"));
        assert_eq!(config.lookup.timeout, Duration::from_secs(30));
        assert_eq!(config.document.host, "localhost:3000");
        assert_eq!(config.document.base_path, "/v1");
        assert_eq!(config.document.title, "Auto generated");
        assert_eq!(config.document.version, "1.0");
    }

    #[test]
    fn test_local_backend_service() {
        let lookup = LookupConfig {
            backend: ResolverBackend::Local,
            ..Default::default()
        };
        let dir = tempfile::TempDir::new().unwrap();
        let file = dir.path().join("model.js");
        std::fs::write(&file, "type Pet = { id: number };\n").unwrap();
        let query = crate::ast::SourceLocation::new(
            file,
            crate::ast::Position::new(1, 6),
            crate::ast::Position::new(1, 9),
        );

        let service = lookup.build_service();

        assert_eq!(service.lookup_definition(&query).unwrap(), Some(query));
    }
}
