//! Logging service

use crate::models::audit::AuditEntry;
use crate::models::LogLevel;
use uuid::Uuid;

/// Initialize logging with the specified level
pub fn init_logging(level: LogLevel) -> Result<(), Box<dyn std::error::Error>> {
    let filter = match level {
        LogLevel::Error => "fluxo=error,fluxo_core=error",
        LogLevel::Warn => "fluxo=warn,fluxo_core=warn",
        LogLevel::Info => "fluxo=info,fluxo_core=info",
        LogLevel::Debug => "fluxo=debug,fluxo_core=debug",
        LogLevel::Trace => "fluxo=trace,fluxo_core=trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| -> Box<dyn std::error::Error> { e })?;

    Ok(())
}

/// Log a committed transition
pub fn log_transition_committed(entry: &AuditEntry) {
    tracing::info!(
        record_id = %entry.record_id,
        kind = %entry.kind,
        transition = %entry.transition,
        from = %entry.from_state,
        to = %entry.to_state,
        actor = %entry.actor_id,
        sequence_no = entry.sequence_no,
        "Transition committed"
    );
}

/// Log a rejected transition attempt
pub fn log_transition_rejected(record_id: Uuid, transition: &str, actor_id: &str, reason: &str) {
    tracing::warn!(
        record_id = %record_id,
        transition = transition,
        actor = actor_id,
        reason = reason,
        "Transition rejected"
    );
}
