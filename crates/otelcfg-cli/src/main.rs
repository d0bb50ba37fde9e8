//! otelcfg - telemetry settings installer
//!
//! Resolves the OpenTelemetry export settings from defaults, an optional
//! `.env` (or `.env.example`) file and command-line flags, then merges them
//! into the `env` object of the platform's managed settings file.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

use std::path::PathBuf;
use std::process::ExitCode;

use clap::builder::{NonEmptyStringValueParser, PossibleValuesParser};
use clap::{Parser, ValueEnum};
use otelcfg_config::{Overrides, keys::PROTOCOLS};
use otelcfg_telemetry::{LogConfig, LogFormat, setup_logging};

mod commands;
mod report;
mod theme;

use commands::install::{self, InstallOptions};
use theme::Theme;

/// Report output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Human-readable report.
    #[default]
    Text,
    /// JSON report on stdout.
    Json,
}

/// Install OpenTelemetry export settings into the managed settings file
#[derive(Parser, Debug)]
#[command(name = "otelcfg")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Collector endpoint (OTEL_EXPORTER_OTLP_ENDPOINT)
    #[arg(long, value_parser = NonEmptyStringValueParser::new())]
    endpoint: Option<String>,

    /// Service name (OTEL_SERVICE_NAME)
    #[arg(long, value_parser = NonEmptyStringValueParser::new())]
    service_name: Option<String>,

    /// Enable telemetry: 1 or 0 (CLAUDE_CODE_ENABLE_TELEMETRY)
    #[arg(long, value_parser = ["0", "1"])]
    enable_telemetry: Option<String>,

    /// Export protocol (OTEL_EXPORTER_OTLP_PROTOCOL)
    #[arg(long, value_parser = PossibleValuesParser::new(PROTOCOLS.iter().copied()))]
    protocol: Option<String>,

    /// Log user prompts: 1 or 0 (OTEL_LOG_USER_PROMPTS)
    #[arg(long, value_parser = ["0", "1"])]
    log_prompts: Option<String>,

    /// Resource attributes, comma-separated key=value pairs (OTEL_RESOURCE_ATTRIBUTES)
    #[arg(long, value_parser = NonEmptyStringValueParser::new())]
    resource_attributes: Option<String>,

    /// User identifier prepended to the resource attributes as `user.id`
    #[arg(long, env = "OTELCFG_USER_ID", value_parser = NonEmptyStringValueParser::new())]
    user_id: Option<String>,

    /// Write to this settings file instead of the platform location
    #[arg(long, value_name = "PATH")]
    settings_file: Option<PathBuf>,

    /// Directory searched for `.env` and `.env.example`
    #[arg(long, value_name = "DIR", default_value = ".")]
    workdir: PathBuf,

    /// Resolve and merge, but do not write the settings file
    #[arg(long)]
    dry_run: bool,

    /// Report format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Diagnostic log format on stderr: compact, pretty, json or full
    #[arg(long, default_value = "compact", value_parser = parse_log_format)]
    log_format: LogFormat,

    /// Extra log filter directive, e.g. `otelcfg_settings=trace` (repeatable)
    #[arg(long = "log-directive", value_name = "DIRECTIVE")]
    log_directives: Vec<String>,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Increase diagnostic verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            endpoint: self.endpoint.clone(),
            service_name: self.service_name.clone(),
            enable_telemetry: self.enable_telemetry.clone(),
            protocol: self.protocol.clone(),
            log_prompts: self.log_prompts.clone(),
            resource_attributes: self.resource_attributes.clone(),
            user_id: self.user_id.clone(),
        }
    }

    fn log_config(&self) -> LogConfig {
        let level = match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        };
        let mut config = LogConfig::new(level)
            .with_format(self.log_format)
            .with_env_override();
        if self.verbose >= 2 {
            config = config.with_file_info();
        }
        if self.log_format == LogFormat::Json {
            config = config.with_timestamps();
        }
        if self.no_color {
            config = config.without_ansi();
        }
        for directive in &self.log_directives {
            config = config.with_directive(directive.clone());
        }
        config
    }
}

fn parse_log_format(s: &str) -> Result<LogFormat, String> {
    s.parse().map_err(|e: otelcfg_telemetry::TelemetryError| e.to_string())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }

    if let Err(e) = setup_logging(&cli.log_config()) {
        eprintln!("Failed to initialize logging: {e}");
    }

    let options = InstallOptions {
        workdir: cli.workdir.clone(),
        overrides: cli.overrides(),
        settings_file: cli.settings_file.clone(),
        dry_run: cli.dry_run,
        json: cli.format == OutputFormat::Json,
    };

    match install::run_install(&options) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", Theme::error(&format!("{e:#}")));
            ExitCode::FAILURE
        },
    }
}
