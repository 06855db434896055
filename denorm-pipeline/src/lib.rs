//! Content denormalization stage.
//!
//! Wires the classifier, the content cache engine and an output sink into
//! [`EnrichmentTask`], which turns each inbound telemetry event into exactly
//! one routing outcome:
//!
//! ```ignore
//! let task = EnrichmentTask::new(config, Arc::new(store), Arc::new(search))?;
//! match task.process(event).await {
//!     RoutingOutcome::Success(event) => forward(task.config().success_topic.as_str(), event),
//!     RoutingOutcome::Failure { event, detail } => park(event, detail),
//! }
//! ```

pub mod classifier;
pub mod error;
pub mod outcome;
pub mod runner;
pub mod settings;
pub mod sink;
pub mod store;
pub mod task;
pub mod telemetry;

pub use classifier::{category_of, Classification, EventClassifier, SkipReason};
pub use error::{PipelineError, PipelineResult};
pub use outcome::{Destination, FailureDetail, RoutingOutcome, MALFORMED_INPUT_CODE};
pub use runner::{run_lines, RunSummary};
pub use settings::{PipelineSettings, PipelineSettingsError, CONFIG_ENV_VAR};
pub use sink::{CollectingSink, JsonLinesSink, OutgoingEnvelope, RoutingSink, SinkError};
pub use store::{PipelineStore, StoreSettings};
pub use task::{EnrichmentTask, TaskStats};
pub use telemetry::{build_subscriber, init_logging, LogFormat, LoggingConfig, TelemetryError};
