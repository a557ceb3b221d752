/*!
 * Monitoring
 * Structured logging setup shared by the demo binary, tests and benches
 */

mod tracer;

pub use tracer::{init_tracing, WorkerSpan, TRACE_JSON_ENV};
