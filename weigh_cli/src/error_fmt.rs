//! Human-readable error descriptions and structured JSON error formatting.

use weigh_core::{BuildError, WeighError};

/// Find the first typed domain error anywhere in the report's chain.
fn weigh_error(err: &eyre::Report) -> Option<&WeighError> {
    err.chain().find_map(|e| e.downcast_ref::<WeighError>())
}

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    // Typed matches first
    if let Some(be) = err.chain().find_map(|e| e.downcast_ref::<BuildError>()) {
        return match be {
            BuildError::MissingSource => {
                "What happened: No reading source was provided to the capture session.\nLikely causes: The configured source failed to initialize or was not registered.\nHow to fix: Check [source] in the config and rerun with --log-level=debug.".to_string()
            }
            BuildError::MissingSlot => {
                "What happened: The capture session was not told which reading to take.\nLikely causes: Internal wiring error.\nHow to fix: Re-run with --log-level=debug and report the output.".to_string()
            }
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid capture configuration ({msg}).\nLikely causes: Missing or out-of-range values under [capture] or [timeouts].\nHow to fix: Edit the config file, then rerun. See etc/weigh_config.toml for a sample."
            ),
        };
    }

    if let Some(we) = weigh_error(err) {
        return match we {
            WeighError::Timeout => "What happened: No stable weight within the allowed time.\nLikely causes: Vehicle still moving on the platform, a noisy load cell, or capture.max_wait_ms too low.\nHow to fix: Wait for the vehicle to stop, raise capture.stability_threshold or capture.max_wait_ms, or commit with --capture-after-ms.".to_string(),
            WeighError::SourceFailing { failures } => format!(
                "What happened: The reading source failed {failures} polls in a row.\nLikely causes: Scale gateway offline, device unplugged, or a wrong device_id.\nHow to fix: Check the device and [source] settings; raise capture.max_consecutive_failures to tolerate longer dropouts."
            ),
            WeighError::Cancelled => "What happened: Capture was cancelled before a weight was committed.\nLikely causes: Ctrl-C or a stop request.\nHow to fix: Start a new capture.".to_string(),
            WeighError::InvalidCaptureRequest(msg) => format!(
                "What happened: The capture request was not valid ({msg}).\nLikely causes: Missing axles, a tare above the gross, or a bad entered weight.\nHow to fix: Capture every axle before finishing and check the entered values."
            ),
            WeighError::ConfigurationUnavailable(msg) => format!(
                "What happened: No axle configuration could be used ({msg}).\nLikely causes: Unknown vehicle or an axle count of 0.\nHow to fix: Check the fleet CSV or [vehicle] section."
            ),
            other => format!(
                "What happened: {other}.\nLikely causes: See logs.\nHow to fix: Re-run with --log-level=debug or set RUST_LOG for more detail."
            ),
        };
    }

    // String-based heuristics for errors coming from config or fleet loading
    let msg = format!("{err:#}");
    let lower = msg.to_ascii_lowercase();

    if lower.contains("fleet csv must have headers") {
        return "Invalid headers in fleet CSV. Expected 'vehicle_id,name,type,axle_count,axle_types'.".to_string();
    }

    if lower.contains("parse config toml") || lower.contains("read config") {
        return format!(
            "What happened: The config file could not be loaded.\nLikely causes: Wrong path, or TOML syntax / type errors.\nHow to fix: Fix the file and rerun. Details: {msg}"
        );
    }

    if lower.contains("invalid configuration") {
        return format!(
            "What happened: Configuration is invalid.\nLikely causes: Out-of-range values.\nHow to fix: Edit the TOML config and try again. Details: {msg}"
        );
    }

    // Generic fallback
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable short name for the JSON `reason` field.
pub fn reason_name(err: &eyre::Report) -> &'static str {
    match weigh_error(err) {
        Some(WeighError::Timeout) => "Timeout",
        Some(WeighError::SourceFailing { .. }) => "SourceFailing",
        Some(WeighError::Cancelled) => "Cancelled",
        Some(WeighError::InvalidCaptureRequest(_)) => "InvalidCaptureRequest",
        Some(WeighError::ConfigurationUnavailable(_)) => "ConfigurationUnavailable",
        Some(WeighError::Config(_)) => "Config",
        Some(WeighError::ReadingUnavailable(_)) => "ReadingUnavailable",
        None => "Error",
    }
}

/// Map typed capture failures to stable exit codes; anything else returns 1.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    match weigh_error(err) {
        Some(WeighError::Timeout) => 3,
        Some(WeighError::SourceFailing { .. }) => 4,
        Some(WeighError::InvalidCaptureRequest(_)) => 5,
        // Same as a shell reporting SIGINT
        Some(WeighError::Cancelled) => 130,
        _ => 1,
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use serde_json::json;

    let mut obj = json!({ "reason": reason_name(err), "message": humanize(err) });
    if let Some(WeighError::SourceFailing { failures }) = weigh_error(err) {
        obj["details"] = json!({ "failures": failures });
    }
    obj.to_string()
}
