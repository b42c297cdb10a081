//! Terminal and JSON output.
//!
//! Command results go to stdout. In pretty mode, status and error reports go
//! to stderr; in JSON mode every outcome, failures included, is a single JSON
//! object on stdout.

use std::io::{self, IsTerminal};

use ariadne::{Color, Config, Fmt, Label, Report, ReportKind, Source};
use serde_json::{Value, json};
use zpl_labelkit_core::{RenderError, SourceError};
use zpl_labelkit_preview::PreviewError;

// ── Output format ───────────────────────────────────────────────────────

/// How command output is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Format {
    /// Human-oriented text, coloured where it helps.
    Pretty,
    /// Machine-readable JSON.
    Json,
}

impl Format {
    /// Use the explicit choice, else pretty on a TTY and JSON when piped.
    pub(crate) fn resolve_or_detect(explicit: Option<&str>) -> Self {
        match explicit {
            Some("json") => Format::Json,
            Some("pretty") => Format::Pretty,
            _ => {
                if io::stdout().is_terminal() {
                    Format::Pretty
                } else {
                    Format::Json
                }
            }
        }
    }
}

/// Print a JSON value to stdout.
pub(crate) fn print_json(value: &Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Report a status line for `--check` / `--write` style operations.
pub(crate) fn status_message(
    format: Format,
    mode: &str,
    condition: bool,
    if_true: &str,
    if_false: &str,
    file: &str,
) -> anyhow::Result<()> {
    let msg = if condition { if_true } else { if_false };
    match format {
        Format::Json => print_json(&json!({ "mode": mode, "status": msg, "file": file })),
        Format::Pretty => {
            eprintln!("{msg}: {file}");
            Ok(())
        }
    }
}

// ── Failures ────────────────────────────────────────────────────────────

/// Error envelope for a failed command.
///
/// Typed render failures carry their own code and details; everything else
/// is `command_failed` with the full context chain as the message.
pub(crate) fn error_envelope(err: &anyhow::Error) -> Value {
    let Some(typed) = render_error(err) else {
        return json!({
            "success": false,
            "error": "command_failed",
            "message": format!("{err:#}"),
        });
    };
    match typed {
        RenderError::DimensionOverflow {
            dimension,
            requested,
            max,
        } => json!({
            "success": false,
            "error": typed.code(),
            "message": typed.to_string(),
            "dimension": dimension,
            "requested": requested,
            "max": max,
        }),
        RenderError::ResolutionMismatch { render, device } => json!({
            "success": false,
            "error": typed.code(),
            "message": typed.to_string(),
            "render_dpi": render,
            "device_dpi": device,
        }),
        _ => json!({
            "success": false,
            "error": typed.code(),
            "message": format!("{err:#}"),
        }),
    }
}

/// Write a failure report in the requested format.
pub(crate) fn report_error(err: &anyhow::Error, format: Format) {
    match format {
        Format::Json => {
            let envelope = error_envelope(err);
            match serde_json::to_string_pretty(&envelope) {
                Ok(text) => println!("{text}"),
                Err(_) => println!("{envelope}"),
            }
        }
        Format::Pretty => {
            let code = render_error(err).map_or("error", RenderError::code);
            eprintln!("{}: {err:#}", code.fg(Color::Red));
        }
    }
}

/// Find a typed render failure anywhere in the chain, including one wrapped
/// by the preview layer.
fn render_error(err: &anyhow::Error) -> Option<&RenderError> {
    err.chain().find_map(|cause| {
        cause.downcast_ref::<RenderError>().or_else(|| {
            match cause.downcast_ref::<PreviewError>() {
                Some(PreviewError::Render(inner)) => Some(inner),
                _ => None,
            }
        })
    })
}

/// Show a template expansion failure against the template body.
///
/// Only failures with a byte position get an annotated report; the rest are
/// left to the generic error path.
pub(crate) fn report_template_error(name: &str, body: &str, err: &SourceError) -> bool {
    let SourceError::UnterminatedTag { offset } = err else {
        return false;
    };
    let start = (*offset).min(body.len());
    let end = (start + 2).min(body.len()).max(start);
    let report = Report::build(ReportKind::Error, (name, start..end))
        .with_message(err.to_string())
        .with_config(Config::default().with_compact(false))
        .with_label(
            Label::new((name, start..end))
                .with_message("tag opened here is never closed")
                .with_color(Color::Red),
        )
        .with_help("close '{{' with '}}' and '{%' with '%}'")
        .finish();
    let mut cache = (name, Source::from(body));
    report.eprint(&mut cache).is_ok()
}

// ── Summaries ───────────────────────────────────────────────────────────

/// Coloured `label: value` line on stdout.
pub(crate) fn print_field(label: &str, value: impl std::fmt::Display) {
    println!("{:>12}: {value}", label.fg(Color::Cyan));
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;
    use zpl_labelkit_core::Dimension;

    #[test]
    fn overflow_envelope_carries_details() {
        let err = anyhow::Error::new(RenderError::DimensionOverflow {
            dimension: Dimension::Length,
            requested: 9000,
            max: 7917,
        });
        let env = error_envelope(&err);
        assert_eq!(env["success"], false);
        assert_eq!(env["error"], "dimension_overflow");
        assert_eq!(env["dimension"], "length");
        assert_eq!(env["requested"], 9000);
        assert_eq!(env["max"], 7917);
    }

    #[test]
    fn render_error_is_found_behind_context() {
        let err = Err::<(), _>(RenderError::ResolutionMismatch {
            render: 300,
            device: 203,
        })
        .context("rendering label.zpl")
        .unwrap_err();
        let env = error_envelope(&err);
        assert_eq!(env["error"], "resolution_mismatch");
        assert_eq!(env["render_dpi"], 300);
    }

    #[test]
    fn preview_wrapped_render_error_keeps_its_code() {
        let err = anyhow::Error::new(PreviewError::Render(RenderError::DimensionOverflow {
            dimension: Dimension::Width,
            requested: 900,
            max: 832,
        }));
        assert_eq!(error_envelope(&err)["error"], "dimension_overflow");
    }

    #[test]
    fn other_failures_are_command_failed() {
        let err = anyhow::anyhow!("boom").context("reading input");
        let env = error_envelope(&err);
        assert_eq!(env["error"], "command_failed");
        assert_eq!(env["message"], "reading input: boom");
    }
}
