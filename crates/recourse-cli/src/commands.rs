use anyhow::{Context, Result};
use recourse_core::{
    decide, display_message, template, ClassifiedError, Classifier, ErrorKind, Locale, RawFailure,
};
use recourse_runtime::RuntimeConfig;
use std::fmt::Write as _;
use std::io::Read;
use std::path::{Path, PathBuf};

pub fn classify(
    file: Option<PathBuf>,
    context: Option<String>,
    locale: Locale,
    json: bool,
) -> Result<String> {
    let input = match &file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read stdin")?;
            buf
        }
    };

    let error =
        Classifier::with_locale(locale).classify(RawFailure::parse(&input), context.as_deref());
    tracing::debug!(kind = %error.kind(), status = error.http_status(), "Classified input");

    if json {
        return serde_json::to_string_pretty(&error).context("Failed to serialize error");
    }
    Ok(render_error(&error, locale))
}

fn render_error(error: &ClassifiedError, locale: Locale) -> String {
    let decision = decide(error);
    let mut out = String::new();

    let _ = writeln!(out, "kind:        {}", error.kind());
    let _ = writeln!(out, "status:      {}", error.http_status());
    let _ = writeln!(out, "message:     {}", display_message(error, locale));
    let _ = writeln!(out, "internal:    {}", error.message());
    if let Some(context) = error.context() {
        let _ = writeln!(out, "context:     {}", context);
    }
    for (field, messages) in error.field_errors() {
        let _ = writeln!(out, "field:       {} ({})", field, messages.join("; "));
    }
    let _ = writeln!(out, "recovery:    {}", decision.action);
    let _ = write!(out, "recoverable: {}", decision.recoverable);
    out
}

pub fn taxonomy(locale: Locale) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{:<20} {:<16} {:<8} {}", "KIND", "RECOVERY", "RETRIED", "MESSAGE");

    for kind in ErrorKind::ALL {
        let _ = writeln!(
            out,
            "{:<20} {:<16} {:<8} {}",
            kind.as_str(),
            kind.default_recovery().to_string(),
            if kind.fails_fast() { "no" } else { "yes" },
            template(kind, locale)
        );
    }
    out
}

pub fn check_config(file: &Path) -> Result<String> {
    let config = RuntimeConfig::from_file(file)
        .with_context(|| format!("Invalid configuration in {}", file.display()))?;
    tracing::info!(path = %file.display(), "Configuration is valid");

    serde_json::to_string_pretty(&config).context("Failed to serialize configuration")
}
