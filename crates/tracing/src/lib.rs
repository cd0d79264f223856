//! Tracing configuration for evmstate.
//!
//! Provides [`EvmStateTracer`], a small builder over `tracing-subscriber` which wires a stdout
//! layer and optional journald and rolling-file layers into the global subscriber.
//!
//! ```no_run
//! use evmstate_tracing::{EvmStateTracer, LayerInfo, LogFormat, Tracer};
//!
//! let _guard = EvmStateTracer::new()
//!     .with_stdout(LayerInfo::new(LogFormat::Terminal, "info".to_string(), String::new(), None))
//!     .init()
//!     .expect("failed to initialize tracing");
//! ```

mod formatter;
mod layers;

pub use formatter::LogFormat;
pub use layers::{BoxedLayer, FileInfo, FileWorkerGuard};

// Re-export tracing crates
pub use tracing;
pub use tracing_subscriber;

use layers::Layers;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{filter::Directive, layer::SubscriberExt, util::SubscriberInitExt};

/// Configuration for a single logging layer.
#[derive(Debug, Clone)]
pub struct LayerInfo {
    format: LogFormat,
    default_directive: String,
    filters: String,
    color: Option<String>,
}

impl LayerInfo {
    /// Constructs a new `LayerInfo`.
    ///
    /// * `default_directive` - the directive applied when nothing more specific matches
    /// * `filters` - additional comma separated directives
    /// * `color` - `Some("always" | "auto" | "never")` for formats that can emit ANSI escapes
    pub fn new(
        format: LogFormat,
        default_directive: String,
        filters: String,
        color: Option<String>,
    ) -> Self {
        Self { format, default_directive, filters, color }
    }
}

impl Default for LayerInfo {
    fn default() -> Self {
        Self {
            format: LogFormat::Terminal,
            default_directive: LevelFilter::INFO.to_string(),
            filters: String::new(),
            color: Some("always".to_string()),
        }
    }
}

/// A trait defining a general interface for logging configuration.
pub trait Tracer {
    /// Initialize the logging configuration, returning a guard for the file layer if one was
    /// configured. Logs written to the file are only guaranteed to be flushed while the guard is
    /// alive.
    fn init(self) -> eyre::Result<Option<FileWorkerGuard>>;
}

/// Tracer for evmstate binaries and tests.
#[derive(Debug, Clone)]
pub struct EvmStateTracer {
    stdout: LayerInfo,
    journald: Option<String>,
    file: Option<(LayerInfo, FileInfo)>,
}

impl EvmStateTracer {
    /// Constructs a new tracer with a default stdout layer and no journald or file layer.
    pub fn new() -> Self {
        Self { stdout: LayerInfo::default(), journald: None, file: None }
    }

    /// Sets the stdout layer configuration.
    pub fn with_stdout(mut self, config: LayerInfo) -> Self {
        self.stdout = config;
        self
    }

    /// Enables journald logging with the given filter.
    pub fn with_journald(mut self, filter: String) -> Self {
        self.journald = Some(filter);
        self
    }

    /// Enables rolling file logging.
    pub fn with_file(mut self, config: LayerInfo, file_info: FileInfo) -> Self {
        self.file = Some((config, file_info));
        self
    }
}

impl Default for EvmStateTracer {
    fn default() -> Self {
        Self::new()
    }
}

impl Tracer for EvmStateTracer {
    fn init(self) -> eyre::Result<Option<FileWorkerGuard>> {
        let mut layers = Layers::new();

        layers.stdout(
            self.stdout.format,
            self.stdout.default_directive.parse::<Directive>()?,
            &self.stdout.filters,
            self.stdout.color,
        )?;

        if let Some(filter) = self.journald {
            layers.journald(&filter)?;
        }

        let file_guard = if let Some((config, file_info)) = self.file {
            Some(layers.file(config.format, &config.filters, file_info)?)
        } else {
            None
        };

        // a subscriber may already be installed (e.g. by another test), which is fine
        let _ = tracing_subscriber::registry().with(layers.into_inner()).try_init();
        Ok(file_guard)
    }
}

/// Initializes a tracing subscriber for tests.
///
/// The filter is configurable via `RUST_LOG`. Calling this more than once is harmless.
pub fn init_test_tracing() {
    let _ = EvmStateTracer::new()
        .with_stdout(LayerInfo::new(
            LogFormat::Terminal,
            LevelFilter::INFO.to_string(),
            String::new(),
            Some("always".to_string()),
        ))
        .init();
}
