// Observability: structured pipeline events, their sinks, and metrics

pub mod events;
pub mod metrics;
pub mod sink;

pub use events::PipelineEvent;
pub use sink::{EventSink, NullSink, RecordingSink, TracingSink};
