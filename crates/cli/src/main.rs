//! `labelkit`: finalize, inspect, preview, and print ZPL labels from the shell.

mod media;
mod render;

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Read};
use std::path::Path;
use std::process;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{ArgAction, Args, Parser, Subcommand};
use serde_json::json;
use tracing::debug;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use zpl_labelkit_core::{
    DefaultEngine, EstimatorConfig, LabelSource, RenderConfig, RenderError, RenderOptions,
    TemplateArchive, TemplateLabel, estimate_detailed, minify, pretty_print, render_final_markup,
    tokenize,
};
use zpl_labelkit_preview::{
    ImageRenderOptions, ImageRenderer, LabelaryRenderer, PreviewService, Zpl2PngRenderer,
};
use zpl_labelkit_print_client::{FileTarget, Payload, Target, WriterTarget};

use crate::media::MediaArgs;
use crate::render::{Format, print_field, print_json, status_message};

// ── CLI definition ──────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "labelkit",
    version,
    about = "Estimate, finalize, format, preview, and print ZPL II labels"
)]
struct Cli {
    /// Output mode: "pretty" for terminal output, "json" for machine-readable
    /// JSON. Defaults to "pretty" when stdout is a TTY, "json" otherwise.
    #[arg(long, global = true, value_parser = ["pretty", "json"])]
    output: Option<String>,

    /// More log output on stderr (-v info, -vv debug, -vvv trace).
    /// `RUST_LOG` overrides this.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    // ── Analysis ────────────────────────────────────────────────────
    /// List the commands recognized in a label file.
    Tokens {
        /// Label file, or `-` for stdin.
        file: String,
    },

    /// Estimate the printed length of a label in dots.
    Estimate {
        /// Label file, or `-` for stdin.
        file: String,
        #[command(flatten)]
        estimator: EstimatorArgs,
    },

    // ── Transformation ──────────────────────────────────────────────
    /// Finalize a label for a device: framing, ^LL injection, limit checks.
    Render {
        /// Label file, or `-` for stdin.
        file: String,
        #[command(flatten)]
        media: MediaArgs,
        #[command(flatten)]
        engine: EngineArgs,
        /// Pretty-print the finalized markup, one command per line.
        #[arg(long, conflicts_with = "minify")]
        pretty: bool,
        /// Minify the finalized markup.
        #[arg(long)]
        minify: bool,
    },

    /// Format a label file (one command per line, or minified).
    Format {
        /// Label file, or `-` for stdin.
        file: String,
        /// Strip all whitespace outside field data instead.
        #[arg(long)]
        minify: bool,
        /// Write formatted output back to the file (in-place).
        #[arg(long, short, conflicts_with = "check")]
        write: bool,
        /// Check if the file is already formatted (exit 1 if not). For CI.
        #[arg(long)]
        check: bool,
    },

    /// Manage and expand a JSON template archive.
    Template {
        #[command(subcommand)]
        action: TemplateCmd,
    },

    // ── Output ──────────────────────────────────────────────────────
    /// Finalize a label and send it to a printer, a file, or stdout.
    Print(PrintArgs),

    /// Finalize a label and save a PNG preview.
    Preview(PreviewArgs),
}

#[derive(Subcommand, Debug)]
enum TemplateCmd {
    /// List template names.
    List {
        /// Template archive JSON.
        #[arg(long)]
        archive: String,
    },

    /// Expand a template and finalize it.
    Render {
        /// Template archive JSON.
        #[arg(long)]
        archive: String,
        /// Template name.
        #[arg(long)]
        name: String,
        /// Context variable, repeatable.
        #[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_key_val)]
        vars: Vec<(String, String)>,
        /// Print the expansion without finalizing it.
        #[arg(long)]
        raw: bool,
        #[command(flatten)]
        media: MediaArgs,
        #[command(flatten)]
        engine: EngineArgs,
    },

    /// Add or replace a template from a file.
    Add {
        /// Template archive JSON (created if missing).
        #[arg(long)]
        archive: String,
        /// Template name.
        #[arg(long)]
        name: String,
        /// Template body file, or `-` for stdin.
        #[arg(long)]
        from: String,
    },

    /// Remove a template.
    Remove {
        /// Template archive JSON.
        #[arg(long)]
        archive: String,
        /// Template name.
        #[arg(long)]
        name: String,
    },
}

/// Estimator approximations.
#[derive(Args, Debug, Clone, Default)]
struct EstimatorArgs {
    /// Font height in dots until ^A or ^CF sets one.
    #[arg(long)]
    font_height: Option<u32>,
    /// Gap in dots between lines of multi-line field data.
    #[arg(long)]
    line_gap: Option<u32>,
    /// Barcode height in dots when ^BC leaves it unset.
    #[arg(long)]
    barcode_height: Option<u32>,
}

impl EstimatorArgs {
    fn config(&self) -> EstimatorConfig {
        let defaults = EstimatorConfig::default();
        EstimatorConfig {
            default_font_height: self.font_height.unwrap_or(defaults.default_font_height),
            default_line_gap: self.line_gap.unwrap_or(defaults.default_line_gap),
            default_barcode_height: self
                .barcode_height
                .unwrap_or(defaults.default_barcode_height),
        }
    }
}

/// Render engine settings.
#[derive(Args, Debug, Clone, Default)]
struct EngineArgs {
    /// Render config JSON; the flags below override it.
    #[arg(long)]
    config: Option<String>,
    /// Dots added past the estimated content.
    #[arg(long)]
    margin: Option<u32>,
    /// Text replaced by the computed ^LL command (empty disables injection).
    #[arg(long)]
    placeholder: Option<String>,
    /// Fail when rendering at a resolution other than the device's.
    #[arg(long)]
    strict: bool,
    /// Insert ^PW after ^XA when the label sets no print width.
    #[arg(long)]
    pw: bool,
}

impl EngineArgs {
    fn config(&self) -> Result<RenderConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let text = fs::read_to_string(path)
                    .with_context(|| format!("failed to read render config '{path}'"))?;
                serde_json::from_str::<RenderConfig>(&text)
                    .with_context(|| format!("invalid render config '{path}'"))?
            }
            None => RenderConfig::default(),
        };
        if let Some(margin) = self.margin {
            config.margin_dots = margin;
        }
        if let Some(placeholder) = &self.placeholder {
            config.length_placeholder.clone_from(placeholder);
        }
        config.strict_resolution |= self.strict;
        config.inject_print_width |= self.pw;
        Ok(config)
    }
}

#[derive(Args, Debug)]
struct PrintArgs {
    /// Label file, or `-` for stdin.
    file: String,
    /// Printer address: `host` or `host:port` (port defaults to 9100).
    #[arg(long, required_unless_present_any = ["to_file", "dry_run"])]
    printer: Option<String>,
    /// Write the finalized label to a file instead of a printer.
    #[arg(long, conflicts_with_all = ["printer", "dry_run"])]
    to_file: Option<String>,
    /// Finalize and show the label without sending it.
    #[arg(long, conflicts_with = "printer")]
    dry_run: bool,
    /// Attempts for transient network failures, the first one included.
    #[arg(long, default_value_t = 3)]
    retries: u32,
    /// Connect timeout in seconds.
    #[arg(long)]
    timeout: Option<u64>,
    #[command(flatten)]
    media: MediaArgs,
    #[command(flatten)]
    engine: EngineArgs,
}

#[derive(Args, Debug)]
struct PreviewArgs {
    /// Label file, or `-` for stdin.
    file: String,
    /// Where to write the PNG.
    #[arg(long)]
    out: String,
    /// Rasterize with a local zpl2png executable instead of Labelary.
    #[arg(long, conflicts_with = "labelary_url")]
    helper: Option<String>,
    /// Labelary base URL.
    #[arg(long)]
    labelary_url: Option<String>,
    /// Rasterization timeout in seconds.
    #[arg(long, default_value_t = 10)]
    timeout: u64,
    #[command(flatten)]
    media: MediaArgs,
    #[command(flatten)]
    engine: EngineArgs,
}

// ── Main ────────────────────────────────────────────────────────────────

fn main() {
    let cli = Cli::parse();
    let format = Format::resolve_or_detect(cli.output.as_deref());
    init_tracing(cli.verbose);

    if let Err(err) = run(cli.cmd, format) {
        render::report_error(&err, format);
        process::exit(1);
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "warn,labelkit={level},zpl_labelkit_core={level},\
             zpl_labelkit_print_client={level},zpl_labelkit_preview={level}"
        ))
    });
    // A second init (only possible in tests) keeps the first subscriber.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_target(false),
        )
        .try_init();
}

fn run(cmd: Cmd, format: Format) -> Result<()> {
    match cmd {
        Cmd::Tokens { file } => cmd_tokens(&file, format),
        Cmd::Estimate { file, estimator } => cmd_estimate(&file, &estimator, format),
        Cmd::Render {
            file,
            media,
            engine,
            pretty,
            minify,
        } => cmd_render(&file, &media, &engine, Layout::new(pretty, minify), format),
        Cmd::Format {
            file,
            minify,
            write,
            check,
        } => cmd_format(&file, minify, write, check, format),
        Cmd::Template { action } => cmd_template(action, format),
        Cmd::Print(args) => cmd_print(&args, format),
        Cmd::Preview(args) => cmd_preview(&args, format),
    }
}

// ── Commands ────────────────────────────────────────────────────────────

fn cmd_tokens(file: &str, format: Format) -> Result<()> {
    let input = read_input(file)?;
    let tokens = tokenize(&input);
    match format {
        Format::Json => print_json(&json!({ "tokens": tokens }))?,
        Format::Pretty => {
            for tok in &tokens {
                println!("{:>6}  {:<3} {}", tok.start, tok.name, tok.params.escape_debug());
            }
            eprintln!("{} commands", tokens.len());
        }
    }
    Ok(())
}

fn cmd_estimate(file: &str, args: &EstimatorArgs, format: Format) -> Result<()> {
    let config = args.config();
    let input = read_input(file)?;
    let estimate = estimate_detailed(&input, &config);
    match format {
        Format::Json => print_json(&json!({ "estimate": estimate, "config": config }))?,
        Format::Pretty => {
            print_field("structural", format_args!("{} dots", estimate.structural));
            match estimate.explicit {
                Some(ll) => print_field("explicit", format_args!("{ll} dots (^LL)")),
                None => print_field("explicit", "none"),
            }
            print_field("estimate", format_args!("{} dots", estimate.dots));
        }
    }
    Ok(())
}

/// Optional re-serialization of finalized markup.
#[derive(Debug, Clone, Copy)]
enum Layout {
    AsIs,
    Pretty,
    Minify,
}

impl Layout {
    fn new(pretty: bool, minify: bool) -> Self {
        match (pretty, minify) {
            (true, _) => Layout::Pretty,
            (_, true) => Layout::Minify,
            _ => Layout::AsIs,
        }
    }

    fn apply(self, markup: String) -> String {
        match self {
            Layout::AsIs => markup,
            Layout::Pretty => pretty_print(&markup),
            Layout::Minify => minify(&markup),
        }
    }
}

fn cmd_render(
    file: &str,
    media: &MediaArgs,
    engine: &EngineArgs,
    layout: Layout,
    format: Format,
) -> Result<()> {
    let options = media.resolve()?;
    let config = engine.config()?;
    let input = read_input(file)?;
    let markup = render_final_markup(input.as_str(), &options, &config)
        .with_context(|| format!("failed to render '{file}'"))?;
    emit_markup(&layout.apply(markup), &options, format)
}

fn cmd_format(file: &str, minified: bool, write: bool, check: bool, format: Format) -> Result<()> {
    if write && file == "-" {
        bail!("--write needs a file path, not stdin");
    }
    let input = read_input(file)?;
    let mut formatted = if minified {
        minify(&input)
    } else {
        pretty_print(&input)
    };
    formatted.push('\n');
    let already_formatted = formatted == input;

    if check {
        status_message(
            format,
            "check",
            already_formatted,
            "already formatted",
            "not formatted",
            file,
        )?;
        if !already_formatted {
            process::exit(1);
        }
    } else if write {
        if !already_formatted {
            fs::write(file, &formatted).with_context(|| format!("failed to write '{file}'"))?;
        }
        status_message(
            format,
            "write",
            !already_formatted,
            "formatted",
            "already formatted",
            file,
        )?;
    } else {
        print!("{formatted}");
    }
    Ok(())
}

fn cmd_template(action: TemplateCmd, format: Format) -> Result<()> {
    match action {
        TemplateCmd::List { archive } => {
            let loaded = TemplateArchive::load(Path::new(&archive))?;
            let names: Vec<&str> = loaded.names().collect();
            match format {
                Format::Json => print_json(&json!({ "archive": archive, "templates": names }))?,
                Format::Pretty if names.is_empty() => eprintln!("no templates in {archive}"),
                Format::Pretty => names.iter().for_each(|n| println!("{n}")),
            }
            Ok(())
        }
        TemplateCmd::Render {
            archive,
            name,
            vars,
            raw,
            media,
            engine,
        } => {
            let loaded = TemplateArchive::load(Path::new(&archive))?;
            let options = media.resolve()?;
            let config = engine.config()?;
            let context: BTreeMap<String, String> = vars.into_iter().collect();
            let label = TemplateLabel::new(&loaded, name.as_str())
                .with_context(context)
                .with_placeholder(config.length_placeholder.as_str());

            let result = if raw {
                label.produce_markup().map_err(RenderError::from)
            } else {
                render_final_markup(&label, &options, &config)
            };
            let markup = match result {
                Ok(markup) => markup,
                Err(err) => {
                    if format == Format::Pretty
                        && let RenderError::Source(source) = &err
                        && let Some(body) = loaded.get(&name)
                        && render::report_template_error(&name, body, source)
                    {
                        process::exit(1);
                    }
                    return Err(
                        anyhow::Error::new(err).context(format!("failed to render template '{name}'"))
                    );
                }
            };
            emit_markup(&markup, &options, format)
        }
        TemplateCmd::Add {
            archive,
            name,
            from,
        } => {
            let path = Path::new(&archive);
            let mut loaded = TemplateArchive::load(path)?;
            let body = read_input(&from)?;
            let replaced = loaded.insert(name.as_str(), body).is_some();
            loaded.save(path, true)?;
            status_message(format, "add", replaced, "replaced", "added", &name)
        }
        TemplateCmd::Remove { archive, name } => {
            let path = Path::new(&archive);
            let mut loaded = TemplateArchive::load(path)?;
            if loaded.remove(&name).is_none() {
                bail!("template not found: {name}");
            }
            loaded.save(path, true)?;
            status_message(format, "remove", true, "removed", "removed", &name)
        }
    }
}

fn cmd_print(args: &PrintArgs, format: Format) -> Result<()> {
    let options = args.media.resolve()?;
    let config = args.engine.config()?;
    let input = read_input(&args.file)?;
    let markup = render_final_markup(input.as_str(), &options, &config)
        .with_context(|| format!("failed to render '{}'", args.file))?;

    let bytes = markup.len();
    let payload = Payload::markup(markup, options.geometry.dpi);
    let native = options.device.native_dpi.value();
    let strict = config.strict_resolution;

    let destination = if args.dry_run {
        let mut target = WriterTarget::new(Vec::new()).with_native_dpi(native);
        target.send(&payload, strict)?;
        let shown = String::from_utf8_lossy(&target.into_inner()).into_owned();
        match format {
            Format::Json => {
                return print_json(&json!({
                    "success": true,
                    "destination": "dry-run",
                    "bytes": bytes,
                    "output": shown,
                }));
            }
            Format::Pretty => print!("{shown}"),
        }
        "dry-run".to_string()
    } else if let Some(path) = &args.to_file {
        FileTarget::new(path)
            .with_native_dpi(native)
            .send(&payload, strict)?;
        path.clone()
    } else if let Some(addr) = &args.printer {
        send_to_printer(addr, &payload, native, strict, args)?;
        addr.clone()
    } else {
        bail!("no destination: use --printer, --to-file, or --dry-run");
    };

    debug!(%destination, bytes, "label delivered");
    match format {
        Format::Json => print_json(&json!({
            "success": true,
            "destination": destination,
            "bytes": bytes,
        })),
        Format::Pretty => {
            eprintln!("sent {bytes} bytes to {destination}");
            Ok(())
        }
    }
}

#[cfg(feature = "tcp")]
fn send_to_printer(
    addr: &str,
    payload: &Payload,
    native_dpi: u32,
    strict: bool,
    args: &PrintArgs,
) -> Result<()> {
    use zpl_labelkit_print_client::{PrinterConfig, PrinterTarget, ReconnectRetryPrinter, TcpPrinter};

    let mut config = PrinterConfig::default().with_max_attempts(args.retries.max(1));
    if let Some(secs) = args.timeout {
        config.timeouts.connect = Duration::from_secs(secs);
    }
    let retry = config.retry.clone();
    let printer = TcpPrinter::connect(addr, config)
        .with_context(|| format!("failed to connect to printer '{addr}'"))?;
    let mut target = PrinterTarget::new(ReconnectRetryPrinter::new(printer, retry), native_dpi);
    target
        .send(payload, strict)
        .with_context(|| format!("failed to print to '{addr}'"))?;
    Ok(())
}

#[cfg(not(feature = "tcp"))]
fn send_to_printer(
    _addr: &str,
    _payload: &Payload,
    _native_dpi: u32,
    _strict: bool,
    _args: &PrintArgs,
) -> Result<()> {
    bail!("this build has no network printer support (enable the `tcp` feature)")
}

fn cmd_preview(args: &PreviewArgs, format: Format) -> Result<()> {
    let options = args.media.resolve()?;
    let config = args.engine.config()?;
    let strict = config.strict_resolution;
    let input = read_input(&args.file)?;

    let renderer: Box<dyn ImageRenderer> = match (&args.helper, &args.labelary_url) {
        (Some(helper), _) => Box::new(Zpl2PngRenderer::new(helper)),
        (None, Some(url)) => Box::new(LabelaryRenderer::new(url.as_str())),
        (None, None) => Box::new(LabelaryRenderer::default()),
    };
    let image_options =
        ImageRenderOptions::new(options.geometry).with_timeout(Duration::from_secs(args.timeout));
    let service = PreviewService::new(DefaultEngine::new(config), renderer);
    let png = service
        .png(&input, &options, &image_options)
        .with_context(|| format!("failed to preview '{}'", args.file))?;

    let bytes = png.len();
    FileTarget::new(&args.out)
        .with_native_dpi(options.device.native_dpi.value())
        .send(&Payload::image(png, options.geometry.dpi), strict)?;

    match format {
        Format::Json => print_json(&json!({
            "success": true,
            "out": args.out,
            "bytes": bytes,
        })),
        Format::Pretty => {
            eprintln!("wrote {bytes} byte preview to {}", args.out);
            Ok(())
        }
    }
}

// ── Helpers ─────────────────────────────────────────────────────────────

/// Read a label file, or stdin for `-`.
fn read_input(file: &str) -> Result<String> {
    if file == "-" {
        let mut input = String::new();
        io::stdin()
            .read_to_string(&mut input)
            .context("failed to read stdin")?;
        return Ok(input);
    }
    fs::read_to_string(file).with_context(|| format!("failed to read '{file}'"))
}

/// Print finalized markup: raw in pretty mode, wrapped with context in JSON.
fn emit_markup(markup: &str, options: &RenderOptions, format: Format) -> Result<()> {
    match format {
        Format::Json => print_json(&json!({
            "success": true,
            "device": options.device.name,
            "dpi": options.geometry.dpi,
            "markup": markup,
        })),
        Format::Pretty => {
            println!("{markup}");
            Ok(())
        }
    }
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{s}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty key in '{s}'"));
    }
    Ok((key.to_string(), value.to_string()))
}
