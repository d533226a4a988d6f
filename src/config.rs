/// Configuration resolution module
///
/// This module handles:
/// - The immutable `ReporterConfig` snapshot handed to the session
/// - Partial `ConfigLayer`s read from a JSON file, the environment, and the CLI
/// - Applying layers in precedence order (defaults < file < env < explicit)
///
/// Configuration problems are never fatal: a bad value is logged and the
/// lower layer's value is kept.
use log::{debug, warn};
use serde::Deserialize;
use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Config file names searched for, in order, from the working directory upward
pub const CONFIG_FILE_NAMES: [&str; 2] = [".llm-reporter.json", ".llm-reporter.config.json"];

pub const DEFAULT_MAX_VALUE_LENGTH: usize = 100;
pub const DEFAULT_STACK_TRACE_LINES: usize = 5;

/// Rendering style of the report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputMode {
    #[default]
    Summary,
    Detailed,
}

impl OutputMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputMode::Summary => "summary",
            OutputMode::Detailed => "detailed",
        }
    }
}

impl fmt::Display for OutputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "summary" => Ok(OutputMode::Summary),
            "detailed" => Ok(OutputMode::Detailed),
            other => Err(format!("unknown output mode '{}' (expected summary or detailed)", other)),
        }
    }
}

/// Fully resolved reporter configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReporterConfig {
    pub mode: OutputMode,
    pub include_passed_suites: bool,
    pub max_value_length: usize, // > 0
    pub stack_trace_lines: usize,
    pub detect_patterns: bool,
    pub output_file: Option<PathBuf>,
}

impl Default for ReporterConfig {
    fn default() -> Self {
        Self {
            mode: OutputMode::Summary,
            include_passed_suites: false,
            max_value_length: DEFAULT_MAX_VALUE_LENGTH,
            stack_trace_lines: DEFAULT_STACK_TRACE_LINES,
            detect_patterns: true,
            output_file: None,
        }
    }
}

/// A partial configuration: each layer only overrides the fields it sets
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigLayer {
    pub mode: Option<OutputMode>,
    pub include_passed_suites: Option<bool>,
    pub max_value_length: Option<usize>,
    pub stack_trace_lines: Option<usize>,
    pub detect_patterns: Option<bool>,
    pub output_file: Option<PathBuf>,
}

/// On-disk shape of `.llm-reporter.json`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileConfig {
    mode: Option<String>,
    include_passed_suites: Option<bool>,
    max_value_length: Option<i64>,
    stack_trace_lines: Option<i64>,
    detect_patterns: Option<bool>,
    output_file: Option<PathBuf>,
}

impl ConfigLayer {
    /// Parse a JSON config document. Unknown keys are ignored; invalid values are skipped.
    pub fn from_json_str(content: &str) -> Result<Self, String> {
        let file: FileConfig =
            serde_json::from_str(content).map_err(|e| format!("Failed to parse config file: {}", e))?;

        let mut layer = ConfigLayer::default();
        if let Some(mode) = file.mode {
            layer.mode = accept("mode", mode.parse::<OutputMode>());
        }
        layer.include_passed_suites = file.include_passed_suites;
        if let Some(len) = file.max_value_length {
            layer.max_value_length = accept("maxValueLength", positive_length(len));
        }
        if let Some(lines) = file.stack_trace_lines {
            layer.stack_trace_lines =
                accept("stackTraceLines", usize::try_from(lines).map_err(|_| format!("{} is negative", lines)));
        }
        layer.detect_patterns = file.detect_patterns;
        layer.output_file = file.output_file;
        Ok(layer)
    }

    /// Read a config file. A missing or malformed file yields an empty layer.
    pub fn from_file(path: &Path) -> Self {
        let content = match fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) => {
                warn!("Ignoring config file {}: {}", path.display(), e);
                return ConfigLayer::default();
            }
        };

        match ConfigLayer::from_json_str(&content) {
            Ok(layer) => {
                debug!("Loaded config file {}", path.display());
                layer
            }
            Err(e) => {
                warn!("Ignoring config file {}: {}", path.display(), e);
                ConfigLayer::default()
            }
        }
    }

    /// Build a layer from environment variables, read through `lookup`
    ///
    /// Each setting has a `LLM_REPORTER_*` name and a shorter legacy alias;
    /// the `LLM_REPORTER_*` name wins when both are set.
    pub fn from_env_with<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |primary: &str, alias: &str| -> Option<(String, String)> {
            lookup(primary)
                .map(|v| (primary.to_string(), v))
                .or_else(|| lookup(alias).map(|v| (alias.to_string(), v)))
                .filter(|(_, v)| !v.trim().is_empty())
        };

        let mut layer = ConfigLayer::default();

        if let Some((name, value)) = var("LLM_REPORTER_MODE", "LLM_OUTPUT_MODE") {
            layer.mode = accept(&name, value.parse::<OutputMode>());
        }
        if let Some((_, value)) = var("LLM_REPORTER_OUTPUT_FILE", "LLM_OUTPUT_FILE") {
            layer.output_file = Some(PathBuf::from(value));
        }
        if let Some((name, value)) = var("LLM_REPORTER_INCLUDE_PASSED_SUITES", "LLM_INCLUDE_PASSED_SUITES") {
            layer.include_passed_suites = accept(&name, parse_bool(&value));
        }
        if let Some((name, value)) = var("LLM_REPORTER_MAX_VALUE_LENGTH", "LLM_MAX_VALUE_LENGTH") {
            layer.max_value_length = accept(
                &name,
                value.trim().parse::<i64>().map_err(|e| format!("'{}': {}", value, e)).and_then(positive_length),
            );
        }
        if let Some((name, value)) = var("LLM_REPORTER_STACK_TRACE_LINES", "LLM_STACK_TRACE_LINES") {
            layer.stack_trace_lines =
                accept(&name, value.trim().parse::<usize>().map_err(|e| format!("'{}': {}", value, e)));
        }
        if let Some((name, value)) = var("LLM_REPORTER_DETECT_PATTERNS", "LLM_DETECT_PATTERNS") {
            layer.detect_patterns = accept(&name, parse_bool(&value));
        }

        layer
    }

    /// Build a layer from the process environment
    pub fn from_env() -> Self {
        ConfigLayer::from_env_with(|name| env::var(name).ok())
    }
}

impl ReporterConfig {
    /// Override the fields `layer` sets
    pub fn apply(&mut self, layer: &ConfigLayer) {
        if let Some(mode) = layer.mode {
            self.mode = mode;
        }
        if let Some(include) = layer.include_passed_suites {
            self.include_passed_suites = include;
        }
        if let Some(len) = layer.max_value_length {
            if len > 0 {
                self.max_value_length = len;
            } else {
                warn!("Ignoring maxValueLength of 0");
            }
        }
        if let Some(lines) = layer.stack_trace_lines {
            self.stack_trace_lines = lines;
        }
        if let Some(detect) = layer.detect_patterns {
            self.detect_patterns = detect;
        }
        if let Some(ref path) = layer.output_file {
            self.output_file = Some(path.clone());
        }
    }

    /// Resolve the configuration from all layers, lowest precedence first
    pub fn resolve(file: Option<&ConfigLayer>, env: &ConfigLayer, explicit: &ConfigLayer) -> Self {
        let mut config = ReporterConfig::default();
        if let Some(file) = file {
            config.apply(file);
        }
        config.apply(env);
        config.apply(explicit);
        debug!("Resolved reporter config: {:?}", config);
        config
    }

    /// Load from the config file (explicit path or discovered), the process environment,
    /// and the caller's explicit options
    pub fn load(config_path: Option<&Path>, explicit: &ConfigLayer) -> Self {
        let file_path = match config_path {
            Some(p) => Some(p.to_path_buf()),
            None => env::current_dir().ok().and_then(|dir| find_config_file(&dir)),
        };
        let file_layer = file_path.as_deref().map(ConfigLayer::from_file);
        ReporterConfig::resolve(file_layer.as_ref(), &ConfigLayer::from_env(), explicit)
    }
}

/// Search `start` and its ancestors for a config file
pub fn find_config_file(start: &Path) -> Option<PathBuf> {
    for dir in start.ancestors() {
        for name in CONFIG_FILE_NAMES {
            let candidate = dir.join(name);
            if candidate.is_file() {
                debug!("Found config file {:?}", candidate);
                return Some(candidate);
            }
        }
    }
    None
}

fn accept<T>(name: &str, value: Result<T, String>) -> Option<T> {
    match value {
        Ok(v) => Some(v),
        Err(e) => {
            warn!("Ignoring invalid value for {}: {}", name, e);
            None
        }
    }
}

fn parse_bool(value: &str) -> Result<bool, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        other => Err(format!("'{}' is not a boolean", other)),
    }
}

fn positive_length(len: i64) -> Result<usize, String> {
    if len > 0 { usize::try_from(len).map_err(|e| e.to_string()) } else { Err(format!("{} must be > 0", len)) }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;
