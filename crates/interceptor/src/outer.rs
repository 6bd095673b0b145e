use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use sqlguard_ast::{CommandType, ExecutionLayer, SqlContext};
use sqlguard_audit::{AuditEventBuilder, AuditSink};

use crate::chain::{BlockError, Operation};
use crate::interceptors::check_interceptor::take_last_validation_result;
use crate::InterceptorChain;

/// Result of handing rewritten SQL to the host's actual database client.
/// The client itself is explicitly out of scope (spec §1); this is only the
/// minimal callable boundary the core needs in order to time and observe
/// one execution.
#[derive(Debug, Clone)]
pub struct DriverOutcome {
    pub rows_affected: i64,
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("driver execution failed: {0}")]
pub struct DriverError(pub String);

/// Errors `OuterInterceptor::execute` can return to the host — either the
/// chain blocked the call (BLOCK strategy) or the driver itself failed.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ExecuteError {
    #[error(transparent)]
    Blocked(#[from] BlockError),
    #[error(transparent)]
    Driver(#[from] DriverError),
}

pub type Driver = dyn Fn(&str, &HashMap<String, serde_json::Value>) -> Result<DriverOutcome, DriverError> + Send + Sync;

/// Wraps execution: runs the inner chain, times and dispatches to the
/// host-supplied driver closure, then emits exactly one `AuditEvent`
/// (spec §4.5 "after execution").
pub struct OuterInterceptor {
    chain: InterceptorChain,
    sink: Arc<dyn AuditSink>,
}

impl OuterInterceptor {
    pub fn new(chain: InterceptorChain, sink: Arc<dyn AuditSink>) -> Self {
        Self { chain, sink }
    }

    pub fn execute(&self, ctx: &mut SqlContext, driver: &Driver) -> Result<DriverOutcome, ExecuteError> {
        let operation = match ctx.command_type {
            CommandType::Select => Operation::Query,
            _ => Operation::Update,
        };

        let rewritten_sql = match self.chain.run(operation, ctx) {
            Ok(sql) => sql,
            Err(block) => {
                self.emit_audit(ctx, None, Some(block.to_string()), None);
                return Err(ExecuteError::Blocked(block));
            }
        };

        let started = Instant::now();
        let outcome = driver(&rewritten_sql, &ctx.params);
        let elapsed_ms = started.elapsed().as_millis() as i64;

        match &outcome {
            Ok(result) => self.emit_audit(ctx, Some(elapsed_ms), None, Some(result.rows_affected)),
            Err(e) => self.emit_audit(ctx, Some(elapsed_ms), Some(e.0.clone()), None),
        }

        outcome.map_err(ExecuteError::Driver)
    }

    fn emit_audit(&self, ctx: &SqlContext, elapsed_ms: Option<i64>, error_message: Option<String>, rows_affected: Option<i64>) {
        let mut builder = AuditEventBuilder::new(ctx.raw_sql(), ctx.command_type, exec_layer_or_unknown(ctx));
        if let Some(id) = &ctx.statement_id {
            builder = builder.statement_id(id.clone());
        }
        if let Some(ds) = &ctx.datasource {
            builder = builder.datasource(ds.clone());
        }
        if !ctx.params.is_empty() {
            builder = builder.params(serde_json::to_value(&ctx.params).unwrap_or(serde_json::Value::Null));
        }
        if let Some(ms) = elapsed_ms {
            builder = builder.execution_time_ms(ms);
        }
        if let Some(rows) = rows_affected {
            builder = builder.rows_affected(rows);
        }
        if let Some(err) = error_message {
            builder = builder.error_message(err);
        }
        if let Some(result) = take_last_validation_result() {
            builder = builder.pre_validation_result(&result);
        }

        let event = match builder.build() {
            Ok(event) => event,
            Err(e) => {
                tracing::error!(error = %e, "failed to build audit event");
                return;
            }
        };

        let sink = self.sink.clone();
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move { sink.emit(event).await });
            }
            Err(_) => {
                tracing::warn!("no tokio runtime available on this thread, dropping audit event");
            }
        }
    }
}

fn exec_layer_or_unknown(ctx: &SqlContext) -> ExecutionLayer {
    ctx.execution_layer
}
