//! Command handlers

use anyhow::{Context, Result};
use fluxo_core::models::{
    AttachmentRef, Configuration, TransitionPayload, UserProfile, WorkflowDefinition,
};
use fluxo_core::workflow::{builtin_registry, validate_definition, SolicitationStore, WorkflowEngine};
use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;

/// Get default solicitation store path
fn get_store_path(config: &Configuration) -> PathBuf {
    if let Some(path) = &config.store_path {
        return path.clone();
    }
    let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    home.join(".fluxo").join("solicitations.json")
}

/// Create an engine over the built-in catalog
fn create_engine(config: &Configuration) -> Result<WorkflowEngine> {
    let registry = builtin_registry().context("Failed to load built-in workflow catalog")?;
    let store = SolicitationStore::new(get_store_path(config))
        .context("Failed to initialize solicitation store")?;
    Ok(WorkflowEngine::new(Arc::new(registry), Arc::new(store)))
}

/// Build the acting profile from CLI flags plus configured defaults
fn resolve_actor(actor: String, capabilities: &[String], config: &Configuration) -> UserProfile {
    let actor_id = if actor == "cli-user" {
        config.default_actor.clone().unwrap_or(actor)
    } else {
        actor
    };
    let mut profile = UserProfile::new(actor_id);
    for capability in capabilities {
        profile = profile.grant(capability);
    }
    for capability in &config.default_capabilities {
        profile = profile.grant(capability);
    }
    profile
}

fn parse_attachment(raw: &str) -> Result<AttachmentRef> {
    let (name, reference) = raw
        .split_once('=')
        .ok_or_else(|| anyhow::anyhow!("Invalid attachment '{}' (expected NAME=REFERENCE)", raw))?;
    Ok(AttachmentRef::new(name, reference))
}

/// Handle validate command
pub async fn handle_validate(workflow_file: String, json: bool) -> Result<()> {
    let content = std::fs::read_to_string(&workflow_file)
        .with_context(|| format!("Failed to read workflow file: {}", workflow_file))?;
    let definition: WorkflowDefinition =
        serde_yaml::from_str(&content).context("Failed to parse workflow YAML")?;

    let result = validate_definition(&definition);

    if json {
        let output = serde_json::json!({
            "kind": definition.kind,
            "valid": result.is_valid(),
            "errors": result.errors.iter().map(|e| serde_json::json!({
                "field": e.field,
                "message": e.message,
            })).collect::<Vec<_>>(),
            "warnings": result.warnings.iter().map(|w| serde_json::json!({
                "field": w.field,
                "message": w.message,
            })).collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("Validating workflow kind: {}", definition.kind);
        println!("File: {}", workflow_file);
        println!();

        if result.is_valid() {
            println!("✓ Definition is valid");
            println!();
            println!("Summary:");
            println!("  Kind:            {}", definition.kind);
            if let Some(desc) = &definition.description {
                println!("  Description:     {}", desc);
            }
            println!("  Initial state:   {}", definition.initial_state);
            println!(
                "  Terminal states: {}",
                definition
                    .terminal_states
                    .iter()
                    .map(|s| s.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
            println!("  Total states:    {}", definition.states.len());
            println!("  Transitions:     {}", definition.transitions.len());

            if !result.warnings.is_empty() {
                println!();
                println!("Warnings:");
                for warning in &result.warnings {
                    println!("  ⚠  {}: {}", warning.field, warning.message);
                }
            }
        } else {
            println!("✗ Definition validation failed");
            println!();
            println!("Errors:");
            for error in &result.errors {
                println!("  ✗ {}: {}", error.field, error.message);
            }

            if !result.warnings.is_empty() {
                println!();
                println!("Warnings:");
                for warning in &result.warnings {
                    println!("  ⚠  {}: {}", warning.field, warning.message);
                }
            }

            return Err(anyhow::anyhow!("Definition validation failed"));
        }
    }

    Ok(())
}

/// Handle kinds command
pub async fn handle_kinds(json: bool) -> Result<()> {
    let registry = builtin_registry().context("Failed to load built-in workflow catalog")?;
    let kinds = registry.kinds();

    if json {
        let mut entries = Vec::new();
        for kind in &kinds {
            let definition = registry.get(kind)?;
            entries.push(serde_json::json!({
                "kind": definition.kind,
                "description": definition.description,
                "states": definition.states.len(),
                "transitions": definition.transitions.len(),
                "initial_state": definition.initial_state,
                "terminal_states": definition.terminal_states,
            }));
        }
        let output = serde_json::json!({
            "kinds": entries,
            "count": kinds.len()
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("Available Workflow Kinds:");
        println!("=========================");
        for kind in &kinds {
            let definition = registry.get(kind)?;
            println!("  • {}", definition.kind);
            if let Some(desc) = &definition.description {
                println!("    {}", desc);
            }
            println!(
                "    {} states, {} transitions, initial: {}",
                definition.states.len(),
                definition.transitions.len(),
                definition.initial_state
            );
        }
    }

    Ok(())
}

/// Handle show command
pub async fn handle_show(kind: String, json: bool) -> Result<()> {
    let registry = builtin_registry().context("Failed to load built-in workflow catalog")?;
    let definition = registry.get(&kind)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&*definition)?);
    } else {
        println!("Workflow Kind: {}", definition.kind);
        println!("=============================");
        if let Some(desc) = &definition.description {
            println!("{}", desc);
        }
        println!();
        println!("States:");
        for decl in &definition.states {
            let mut notes = Vec::new();
            if decl.name == definition.initial_state {
                notes.push("initial");
            }
            if definition.is_terminal(&decl.name) {
                notes.push("terminal");
            }
            if notes.is_empty() {
                println!("  {}  {}", decl.name, decl.label);
            } else {
                println!("  {}  {} ({})", decl.name, decl.label, notes.join(", "));
            }
        }
        println!();
        println!("Transitions:");
        for transition in &definition.transitions {
            let from = transition
                .from
                .iter()
                .map(|s| s.as_str())
                .collect::<Vec<_>>()
                .join(" | ");
            let mut line = format!(
                "  {}: {} -> {} (requires {})",
                transition.name, from, transition.to, transition.required_capability
            );
            if transition.precondition.is_some() {
                line.push_str(" [guarded]");
            }
            println!("{}", line);
        }
    }

    Ok(())
}

/// Handle start command
pub async fn handle_start(kind: String, json: bool) -> Result<()> {
    let config = Configuration::load()?;
    let engine = create_engine(&config)?;

    // Check if the kind exists
    if !engine.registry().contains(&kind) {
        return Err(anyhow::anyhow!(
            "Workflow kind '{}' not found. Use 'fluxo kinds' to see available kinds.",
            kind
        ));
    }

    let record = engine.start(&kind)?;
    let definition = engine.registry().get(&kind)?;

    if json {
        let output = serde_json::json!({
            "record_id": record.id.to_string(),
            "kind": record.kind,
            "state": record.current_state,
            "state_label": definition.label_for(&record.current_state),
            "version": record.version,
            "created_at": record.created_at.to_rfc3339(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("✅ Started solicitation '{}'", kind);
        println!("   Record ID: {}", record.id);
        println!(
            "   State: {} ({})",
            record.current_state,
            definition.label_for(&record.current_state).unwrap_or("")
        );
        println!();
        println!(
            "Use 'fluxo status {}' to see available transitions",
            record.id
        );
    }

    Ok(())
}

/// Handle fire command
pub async fn handle_fire(
    record_id: String,
    transition: String,
    actor: String,
    capabilities: Vec<String>,
    justification: Option<String>,
    acknowledge: Option<bool>,
    attachments: Vec<String>,
    json: bool,
) -> Result<()> {
    let record_uuid =
        Uuid::parse_str(&record_id).context("Invalid record ID format (expected UUID)")?;

    let config = Configuration::load()?;
    let engine = create_engine(&config)?;
    let profile = resolve_actor(actor, &capabilities, &config);

    let mut payload = TransitionPayload::default();
    if let Some(justification) = justification {
        payload = payload.with_justification(justification);
    }
    if let Some(answer) = acknowledge {
        payload = payload.with_acknowledgment(answer);
    }
    for raw in &attachments {
        payload.attachments.push(parse_attachment(raw)?);
    }

    let entry = engine
        .fire(record_uuid, &transition, &profile, payload)
        .await?;

    if json {
        let output = serde_json::json!({
            "record_id": entry.record_id.to_string(),
            "transition": entry.transition,
            "from_state": entry.from_state,
            "to_state": entry.to_state,
            "actor": entry.actor_id,
            "sequence_no": entry.sequence_no,
            "occurred_at": entry.occurred_at.to_rfc3339(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("✅ Fired '{}'", entry.transition);
        println!("   {} -> {}", entry.from_state, entry.to_state);
        println!("   Actor: {}", entry.actor_id);
        println!("   Sequence: {}", entry.sequence_no);
        if let Some(justification) = &entry.justification {
            println!("   Justification: {}", justification);
        }
    }

    Ok(())
}

/// Handle status command
pub async fn handle_status(record_id: String, json: bool) -> Result<()> {
    let record_uuid =
        Uuid::parse_str(&record_id).context("Invalid record ID format (expected UUID)")?;

    let config = Configuration::load()?;
    let engine = create_engine(&config)?;

    let record = engine
        .store()
        .get_record(record_uuid)
        .ok_or_else(|| anyhow::anyhow!("Record '{}' not found", record_id))?;
    let definition = engine.registry().get(&record.kind)?;
    let available = definition.transitions_from(&record.current_state);

    if json {
        let output = serde_json::json!({
            "record_id": record.id.to_string(),
            "kind": record.kind,
            "state": record.current_state,
            "state_label": definition.label_for(&record.current_state),
            "terminal": definition.is_terminal(&record.current_state),
            "version": record.version,
            "created_at": record.created_at.to_rfc3339(),
            "updated_at": record.updated_at.to_rfc3339(),
            "available_transitions": available.iter().map(|t| serde_json::json!({
                "name": t.name,
                "to": t.to,
                "requires": t.required_capability,
            })).collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("Solicitation Status");
        println!("===================");
        println!("Record ID:      {}", record.id);
        println!("Kind:           {}", record.kind);
        println!(
            "Current State:  {} ({})",
            record.current_state,
            definition.label_for(&record.current_state).unwrap_or("")
        );
        println!("Version:        {}", record.version);
        println!(
            "Created At:     {}",
            record.created_at.format("%Y-%m-%d %H:%M:%S")
        );
        println!(
            "Updated At:     {}",
            record.updated_at.format("%Y-%m-%d %H:%M:%S")
        );

        println!();
        if definition.is_terminal(&record.current_state) {
            println!("The record reached a terminal state.");
        } else if available.is_empty() {
            println!("No transitions available from this state.");
        } else {
            println!("Available Transitions:");
            println!("----------------------");
            for transition in available {
                println!(
                    "  {} -> {} (requires {})",
                    transition.name, transition.to, transition.required_capability
                );
            }
        }
    }

    Ok(())
}

/// Handle history command
pub async fn handle_history(record_id: String, json: bool) -> Result<()> {
    use fluxo_core::models::replay;

    let record_uuid =
        Uuid::parse_str(&record_id).context("Invalid record ID format (expected UUID)")?;

    let config = Configuration::load()?;
    let engine = create_engine(&config)?;

    let record = engine
        .store()
        .get_record(record_uuid)
        .ok_or_else(|| anyhow::anyhow!("Record '{}' not found", record_id))?;
    let definition = engine.registry().get(&record.kind)?;
    let entries = engine.store().history(record_uuid);

    let replayed = replay(&definition, &entries);
    let consistent = matches!(&replayed, Ok(state) if *state == record.current_state);

    if json {
        let output = serde_json::json!({
            "record_id": record.id.to_string(),
            "kind": record.kind,
            "current_state": record.current_state,
            "consistent": consistent,
            "entries": entries,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("Audit Trail: {}", record.id);
        println!("============");
        if entries.is_empty() {
            println!("No transitions recorded yet.");
        }
        for entry in &entries {
            let mut line = format!(
                "  #{} {} -> {} via '{}' by {} at {}",
                entry.sequence_no,
                entry.from_state,
                entry.to_state,
                entry.transition,
                entry.actor_id,
                entry.occurred_at.format("%Y-%m-%d %H:%M:%S")
            );
            if let Some(justification) = &entry.justification {
                line.push_str(&format!(" ({})", justification));
            }
            println!("{}", line);
        }
        println!();
        match replayed {
            Ok(state) if state == record.current_state => {
                println!("✓ Trail replays to the current state");
            }
            Ok(state) => {
                println!(
                    "⚠  Trail replays to '{}' but the record is in '{}'",
                    state, record.current_state
                );
            }
            Err(e) => {
                println!("⚠  Trail does not replay cleanly: {}", e);
            }
        }
    }

    Ok(())
}

/// Handle records command
pub async fn handle_records(kind: Option<String>, json: bool) -> Result<()> {
    let config = Configuration::load()?;
    let engine = create_engine(&config)?;
    let records = engine.store().list_records(kind.as_deref());

    if json {
        let output = serde_json::json!({
            "records": records,
            "count": records.len()
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if records.is_empty() {
        println!("No solicitations recorded.");
        println!();
        println!("Use 'fluxo start <kind>' to open one.");
    } else {
        println!("Solicitations:");
        println!("==============");
        for record in &records {
            println!(
                "  {}  {}  {}  v{}  updated {}",
                record.id,
                record.kind,
                record.current_state,
                record.version,
                record.updated_at.format("%Y-%m-%d %H:%M:%S")
            );
        }
    }

    Ok(())
}

/// Handle metrics command
pub async fn handle_metrics(kind: Option<String>, json: bool) -> Result<()> {
    let config = Configuration::load()?;
    let engine = create_engine(&config)?;
    let metrics = engine.store().query_metrics(kind.as_deref());

    if json {
        let output = serde_json::json!({
            "kind": kind.as_deref().unwrap_or("all"),
            "record_count": metrics.record_count,
            "transition_count": metrics.transition_count,
            "records_by_state": metrics.records_by_state,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        let scope = kind.as_deref().unwrap_or("All kinds");
        println!("Solicitation Metrics: {}", scope);
        println!();
        println!("Records:     {}", metrics.record_count);
        println!("Transitions: {}", metrics.transition_count);
        if !metrics.records_by_state.is_empty() {
            println!();
            println!("Records by state:");
            let mut states: Vec<_> = metrics.records_by_state.iter().collect();
            states.sort();
            for (state, count) in states {
                println!("  {}: {}", state, count);
            }
        }
    }

    Ok(())
}

/// Handle config command
pub async fn handle_config(init: bool) -> Result<()> {
    let path = Configuration::default_config_path()?;

    if init {
        if path.exists() {
            println!("Configuration already exists at {}", path.display());
            return Ok(());
        }
        let config = Configuration::default();
        config.save_to_file(&path)?;
        println!("✅ Wrote default configuration to {}", path.display());
        return Ok(());
    }

    let config = Configuration::load()?;
    println!("Configuration ({})", path.display());
    println!();
    println!("store_path:           {}", get_store_path(&config).display());
    println!(
        "default_actor:        {}",
        config.default_actor.as_deref().unwrap_or("cli-user")
    );
    println!(
        "default_capabilities: {}",
        if config.default_capabilities.is_empty() {
            "(none)".to_string()
        } else {
            config.default_capabilities.join(", ")
        }
    );
    println!("log_level:            {:?}", config.log_level);
    println!();
    println!("Use 'fluxo config --init' to write a default file.");

    Ok(())
}
