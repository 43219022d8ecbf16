//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use super::{Context, EventFormat};
use genprov_core::{
    AttributionResult, Event, EventReport, GenprovError, GraphView, IssueKind, MemorySink,
    ObjectId, RecordWriter, RedbRecordStore, SerializableEvent, attribute, event_from_bytes,
    event_from_bytes_strict, event_to_bytes, flatten, select_leading,
};
use serde::Serialize;
use std::path::{Path, PathBuf};

// =============================================================================
// FILE SIZE LIMITS
// =============================================================================

/// Maximum event file size (512 MB).
///
/// JSON events are several times larger than their binary encoding, so this
/// sits above the binary decoder's own payload limit.
const MAX_EVENT_FILE_SIZE: u64 = 512 * 1024 * 1024;

/// Validate file size before reading.
fn validate_file_size(path: &Path, max_size: u64) -> Result<(), GenprovError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| GenprovError::IoError(format!("Cannot read file metadata: {}", e)))?;

    if metadata.len() > max_size {
        return Err(GenprovError::IoError(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            max_size
        )));
    }
    Ok(())
}

/// Resolve an input path and make sure it names a regular file.
fn validate_file_path(path: &Path) -> Result<PathBuf, GenprovError> {
    let canonical = path.canonicalize().map_err(|e| {
        GenprovError::IoError(format!("Invalid file path '{}': {}", path.display(), e))
    })?;

    if !canonical.is_file() {
        return Err(GenprovError::IoError(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    Ok(canonical)
}

/// Resolve an output path whose parent directory must already exist.
fn validate_output_path(path: &Path) -> Result<PathBuf, GenprovError> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let canonical_parent = parent.canonicalize().map_err(|e| {
        GenprovError::IoError(format!(
            "Invalid output directory '{}': {}",
            parent.display(),
            e
        ))
    })?;

    if !canonical_parent.is_dir() {
        return Err(GenprovError::IoError(format!(
            "Output directory '{}' is not a valid directory",
            parent.display()
        )));
    }

    let filename = path
        .file_name()
        .ok_or_else(|| GenprovError::IoError("Output path has no filename".to_string()))?;

    Ok(canonical_parent.join(filename))
}

// =============================================================================
// EVENT I/O
// =============================================================================

/// Read and rebuild an event from disk.
pub fn read_event(
    path: &Path,
    format: Option<EventFormat>,
    strict: bool,
) -> Result<Event, GenprovError> {
    let path = validate_file_path(path)?;
    validate_file_size(&path, MAX_EVENT_FILE_SIZE)?;

    let format = format.unwrap_or_else(|| EventFormat::infer(&path));
    let bytes = std::fs::read(&path)
        .map_err(|e| GenprovError::IoError(format!("Cannot read '{}': {}", path.display(), e)))?;
    tracing::debug!(path = %path.display(), ?format, bytes = bytes.len(), "Reading event");

    match (format, strict) {
        (EventFormat::Binary, false) => event_from_bytes(&bytes),
        (EventFormat::Binary, true) => event_from_bytes_strict(&bytes),
        (EventFormat::Json, strict) => {
            let flat: SerializableEvent = serde_json::from_slice(&bytes)
                .map_err(|e| GenprovError::DeserializationError(e.to_string()))?;
            flat.into_event(strict)
        }
    }
}

/// Encode an event in the format implied by `path` and write it.
pub fn write_event(event: &Event, path: &Path) -> Result<(), GenprovError> {
    let path = validate_output_path(path)?;
    let bytes = match EventFormat::infer(&path) {
        EventFormat::Binary => event_to_bytes(event)?,
        EventFormat::Json => serde_json::to_vec_pretty(&SerializableEvent::from(event))
            .map_err(|e| GenprovError::SerializationError(e.to_string()))?,
    };
    std::fs::write(&path, bytes)
        .map_err(|e| GenprovError::IoError(format!("Cannot write '{}': {}", path.display(), e)))
}

fn print_json<T: Serialize + ?Sized>(value: &T, pretty: bool) -> Result<(), GenprovError> {
    let text = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
    .map_err(|e| GenprovError::SerializationError(e.to_string()))?;
    println!("{}", text);
    Ok(())
}

fn log_malformations(event: &Event) {
    for malformation in event.graph().malformations() {
        tracing::warn!(event = event.id(), "Malformed hierarchy: {}", malformation);
    }
}

fn log_report(report: &EventReport) {
    for issue in &report.issues {
        match &issue.kind {
            IssueKind::SinkFailed(reason) => {
                tracing::error!(event = report.event_id, object = %issue.object, "Record not written: {}", reason);
            }
            IssueKind::Malformed(_) | IssueKind::Skipped(_) => {
                tracing::warn!(event = report.event_id, object = %issue.object, "{:?}", issue.kind);
            }
            IssueKind::UndefinedFraction | IssueKind::NoLeadingParticle => {
                tracing::debug!(event = report.event_id, object = %issue.object, "{:?}", issue.kind);
            }
        }
    }
}

/// One-line summary of the energy split, using the fractions the writer records.
pub fn fraction_summary(attribution: &AttributionResult) -> String {
    match (
        attribution.primary_fraction().value(),
        attribution.secondary_fraction().value(),
    ) {
        (Some(hard), Some(pileup)) => {
            format!("hard fraction {:.4}, pileup fraction {:.4}", hard, pileup)
        }
        _ => "fractions undefined (zero total energy)".to_string(),
    }
}

// =============================================================================
// PROCESS COMMAND
// =============================================================================

/// Run the record writer over an event.
pub fn cmd_process(
    ctx: &Context,
    input: &Path,
    format: Option<EventFormat>,
    output: Option<&Path>,
) -> Result<(), GenprovError> {
    let event = read_event(input, format, ctx.strict)?;
    log_malformations(&event);
    tracing::info!(
        event = event.id(),
        nodes = event.graph().len(),
        objects = event.objects().len(),
        "Processing event"
    );

    let writer = RecordWriter::new(ctx.config.writer_options());

    match output {
        Some(db_path) => {
            let db_path = validate_output_path(db_path)?;
            let mut store = RedbRecordStore::open(&db_path)?;
            let report = writer.process_event(&event, &mut store)?;
            log_report(&report);

            if ctx.json_mode {
                print_json(&report, ctx.config.output.pretty)?;
            } else {
                println!(
                    "Wrote {} records for event {} to {:?}",
                    report.records_written, report.event_id, db_path
                );
                println!("Issues: {}", report.issues.len());
                println!("Total records in store: {}", store.record_count()?);
            }
        }
        None => {
            let mut sink = MemorySink::new();
            let report = writer.process_event(&event, &mut sink)?;
            log_report(&report);
            print_json(sink.records(), ctx.config.output.pretty)?;
        }
    }
    Ok(())
}

// =============================================================================
// INSPECT COMMAND
// =============================================================================

/// Dump flattened leaves, attribution and leading particle of one object.
pub fn cmd_inspect(
    ctx: &Context,
    input: &Path,
    format: Option<EventFormat>,
    object_id: u64,
) -> Result<(), GenprovError> {
    let event = read_event(input, format, ctx.strict)?;
    let object = event
        .object(ObjectId(object_id))
        .ok_or(GenprovError::UnknownObject(ObjectId(object_id)))?;
    let graph = event.graph();

    let flattened = flatten(graph, object);
    let attribution = attribute(graph, object);
    let leading = select_leading(graph, object);

    if ctx.json_mode {
        let leaves: Vec<_> = flattened
            .iter()
            .filter_map(|id| graph.node(id))
            .map(|leaf| {
                serde_json::json!({
                    "node": leaf.id,
                    "pid": leaf.pid,
                    "is_pileup": leaf.is_pileup,
                    "pt": leaf.momentum.pt(),
                    "eta": leaf.momentum.eta(),
                    "phi": leaf.momentum.phi(),
                    "e": leaf.momentum.e,
                })
            })
            .collect();
        let value = serde_json::json!({
            "event": event.id(),
            "object": object.id,
            "kind": object.kind,
            "leaves": leaves,
            "skipped": flattened.skipped,
            "attribution": attribution,
            "hard_fraction": attribution.primary_fraction(),
            "pileup_fraction": attribution.secondary_fraction(),
            "leading": leading,
        });
        return print_json(&value, ctx.config.output.pretty);
    }

    println!("Object {} ({}) in event {}", object.id, object.kind, event.id());
    println!("==================================");
    println!(
        "pt {:.4}  eta {:.4}  phi {:.4}  E {:.4}",
        object.momentum.pt(),
        object.momentum.eta(),
        object.momentum.phi(),
        object.momentum.e
    );
    println!();
    println!("Generator particles ({}):", flattened.len());
    for (i, id) in flattened.iter().enumerate() {
        if let Some(leaf) = graph.node(id) {
            println!(
                "  [{:>3}] node {:<8} pid {:<6} pileup {:<5}  pt {:>10.4}  eta {:>8.4}  phi {:>8.4}  E {:>10.4}",
                i,
                leaf.id,
                leaf.pid,
                leaf.is_pileup,
                leaf.momentum.pt(),
                leaf.momentum.eta(),
                leaf.momentum.phi(),
                leaf.momentum.e
            );
        }
    }
    if ctx.verbose {
        for skipped in &flattened.skipped {
            println!("  skipped: {:?}", skipped);
        }
    }

    println!();
    println!("Attribution:");
    println!(
        "  primary   E {:>10.4}  ({} distinct)",
        attribution.primary.e, attribution.primary_count
    );
    println!(
        "  pileup    E {:>10.4}  ({} distinct)",
        attribution.secondary.e, attribution.secondary_count
    );
    println!("  {}", fraction_summary(&attribution));

    println!();
    match leading {
        Some(leading) => println!(
            "Leading particle: node {}  pt {:.4}  eta {:.4}  phi {:.4}  E {:.4}",
            leading.node,
            leading.pt(),
            leading.eta(),
            leading.phi(),
            leading.energy()
        ),
        None => println!("Leading particle: none"),
    }
    Ok(())
}

// =============================================================================
// VALIDATE COMMAND
// =============================================================================

/// List malformed nodes. Fails under strict mode when any are found.
pub fn cmd_validate(
    ctx: &Context,
    input: &Path,
    format: Option<EventFormat>,
) -> Result<(), GenprovError> {
    let event = read_event(input, format, false)?;
    let malformations: Vec<_> = event.graph().malformations().cloned().collect();

    if ctx.json_mode {
        print_json(
            &serde_json::json!({
                "event": event.id(),
                "nodes": event.graph().len(),
                "objects": event.objects().len(),
                "malformations": malformations,
            }),
            ctx.config.output.pretty,
        )?;
    } else {
        println!("Event {}", event.id());
        println!("Nodes:          {}", event.graph().len());
        println!("Objects:        {}", event.objects().len());
        println!("Malformations:  {}", malformations.len());
        for malformation in &malformations {
            println!("  {}", malformation);
        }
    }

    match malformations.into_iter().next() {
        Some(first) if ctx.strict => Err(GenprovError::MalformedHierarchy(first)),
        _ => Ok(()),
    }
}

// =============================================================================
// CONVERT COMMAND
// =============================================================================

/// Re-encode an event, formats taken from the file extensions.
pub fn cmd_convert(ctx: &Context, input: &Path, output: &Path) -> Result<(), GenprovError> {
    let event = read_event(input, None, ctx.strict)?;
    write_event(&event, output)?;
    tracing::info!(
        event = event.id(),
        from = ?EventFormat::infer(input),
        to = ?EventFormat::infer(output),
        "Converted event"
    );
    if !ctx.json_mode {
        println!("Converted event {} to {:?}", event.id(), output);
    }
    Ok(())
}
