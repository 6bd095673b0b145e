pub mod fingerprint;
pub mod model;
pub mod sink;

pub use fingerprint::fingerprint;
pub use model::{AuditError, AuditEvent, AuditEventBuilder, AuditResult, ValidationSummary};
pub use sink::{AuditSink, KafkaSink, LocalLogSink};
