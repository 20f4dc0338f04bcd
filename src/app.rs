use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use clap::{error::ErrorKind, Parser};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::time::Instant;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use crate::catalog::ColumnKey;
use crate::cli::args::CliArgs;
use crate::cli::validation;
use crate::config::{self, ConfigFile};
use crate::export::{ExportEngine, FileSink};
use crate::output::{self, OutputFormat, ResultPage};
use crate::preferences::{PreferenceChannel, PreferenceFile};
use crate::render::Renderer;
use crate::search::{ElasticClient, SearchQuery, SearchSession};
use crate::table;
use crate::visibility::{ColumnPanel, Detached, Toggle, VisibilityStore};

fn format_kv_line(label: &str, value: &str) {
    eprintln!(":: {:<10}: {}", label, value);
}

fn format_opt_value<'a>(v: &'a str, default: &'a str) -> &'a str {
    if v.trim().is_empty() {
        default
    } else {
        v
    }
}

fn verbosity_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

fn init_tracing(verbose: u8) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("warn,avrsearch={}", verbosity_filter(verbose)))
    });
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[derive(Clone, Debug)]
struct RunConfig {
    query: String,
    from: u64,
    page_size: u64,
    search_url: String,
    index: String,
    assets_url: String,
    timeout: u64,
    proxy: Option<String>,
    preferences_path: PathBuf,
    toggles: Vec<Toggle>,
    list_columns: bool,
    output: Option<String>,
    output_format: Option<OutputFormat>,
    export: bool,
    export_dir: PathBuf,
    export_asset_urls: bool,
    no_color: bool,
}

// Bulk toggles first, then individual columns, so `--clear-all --show host`
// leaves exactly `host` visible.
fn collect_toggles(args: &CliArgs) -> Result<Vec<Toggle>, String> {
    let mut toggles = Vec::new();
    if args.show_all {
        toggles.push(Toggle::SetAll);
    }
    if args.clear_all {
        toggles.push(Toggle::ClearAll);
    }
    for (values, visible) in [(&args.show, true), (&args.hide, false)] {
        for raw in values {
            let key = ColumnKey::parse_optional(raw).map_err(|e| e.to_string())?;
            toggles.push(Toggle::Set(key, visible));
        }
    }
    Ok(toggles)
}

fn build_run_config(args: CliArgs, cfg: ConfigFile) -> Result<RunConfig, String> {
    validation::validate(&args)?;

    let toggles = collect_toggles(&args)?;
    let no_color = args.no_color || cfg.no_color.unwrap_or(false);

    let search_url = args
        .search_url
        .or(cfg.search_url)
        .unwrap_or_else(|| config::DEFAULT_SEARCH_URL.to_string());
    reqwest::Url::parse(&search_url).map_err(|e| format!("invalid search URL '{search_url}': {e}"))?;
    let index = args
        .index
        .or(cfg.index)
        .unwrap_or_else(|| config::DEFAULT_INDEX.to_string());
    if index.trim().is_empty() {
        return Err("index name must not be empty".to_string());
    }
    let assets_url = args
        .assets_url
        .or(cfg.assets_url)
        .unwrap_or_else(|| config::DEFAULT_ASSETS_URL.to_string());

    let timeout = args.timeout.or(cfg.timeout).unwrap_or(config::DEFAULT_TIMEOUT);
    let page_size = args
        .page_size
        .or(cfg.page_size)
        .unwrap_or(config::DEFAULT_PAGE_SIZE);
    if timeout == 0 || page_size == 0 {
        return Err("timeout and page_size must be positive".to_string());
    }
    let proxy = args.proxy.or(cfg.proxy).filter(|p| !p.trim().is_empty());

    let preferences_path = match args.preferences.or(cfg.preferences) {
        Some(path) => config::expand_tilde(&path),
        None => config::default_preferences_path()
            .ok_or_else(|| "cannot locate home directory for column preferences".to_string())?,
    };

    let output = args
        .output
        .or(cfg.output)
        .map(|p| config::expand_tilde_string(&p));
    let output_format = match args.output_format.or(cfg.output_format) {
        Some(raw) => Some(
            OutputFormat::parse(&raw)
                .ok_or_else(|| format!("invalid output format '{raw}'"))?,
        ),
        None => None,
    };

    let export_dir = args
        .export_dir
        .or(cfg.export_dir)
        .map(|p| config::expand_tilde(&p))
        .unwrap_or_else(|| PathBuf::from("."));
    let export_asset_urls = args
        .export_asset_urls
        .or(cfg.export_asset_urls)
        .unwrap_or(false);

    Ok(RunConfig {
        query: args.query.unwrap_or_default(),
        from: args.from.unwrap_or(0),
        page_size,
        search_url,
        index,
        assets_url,
        timeout,
        proxy,
        preferences_path,
        toggles,
        list_columns: args.columns,
        output,
        output_format,
        export: args.export,
        export_dir,
        export_asset_urls,
        no_color,
    })
}

fn print_columns<P: PreferenceChannel>(panel: &ColumnPanel<P>) {
    for entry in panel.entries() {
        let mark = if entry.checked {
            "[x]".green().to_string()
        } else {
            "[ ]".dimmed().to_string()
        };
        println!("{mark} {:<22} {}", entry.key.as_str(), entry.label);
    }
}

async fn write_output(path: &str, rendered: &[u8]) -> Result<(), String> {
    let mut outfile = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)
        .await
        .map_err(|e| format!("failed to open output file: {e}"))?;
    outfile
        .write_all(rendered)
        .await
        .map_err(|e| format!("failed to write output file: {e}"))
}

async fn run_async(run: RunConfig) -> Result<(), String> {
    if run.no_color {
        colored::control::set_override(false);
    }
    let now = Instant::now();

    let preferences =
        PreferenceFile::open(&run.preferences_path).map_err(|e| e.to_string())?;
    let persisted = preferences.load().map_err(|e| e.to_string())?;
    let store = VisibilityStore::from_catalog(&persisted);
    let mut panel = ColumnPanel::new(store.clone(), preferences);

    if run.list_columns {
        for toggle in &run.toggles {
            panel
                .apply(*toggle, &mut Detached)
                .map_err(|e| e.to_string())?;
        }
        print_columns(&panel);
        return Ok(());
    }

    format_kv_line("Search", &format!("{}/{}", run.search_url, run.index));
    format_kv_line("Query", format_opt_value(&run.query, "(all reports)"));
    format_kv_line(
        "Columns",
        &panel.preferences().path().display().to_string(),
    );

    let client = ElasticClient::new(
        &run.search_url,
        &run.index,
        run.timeout,
        run.proxy.as_deref(),
    )
    .map_err(|e| e.to_string())?;
    let mut session = SearchSession::new(SearchQuery::from_text(
        &run.query,
        run.from,
        run.page_size,
    ));
    let response = session.run(&client).await.map_err(|e| e.to_string())?;

    let renderer = Renderer::new(&run.assets_url).with_export_asset_urls(run.export_asset_urls);
    let mut table = table::assemble(&response.hits, &store, &renderer);
    for toggle in &run.toggles {
        if let Err(e) = panel.apply(*toggle, &mut table) {
            warn!(error = %e, "column preference not saved");
        }
    }

    let entries = panel.entries();
    let page = ResultPage {
        query: &run.query,
        total: response.total,
        table: &table,
        panel: &entries,
    };
    match run.output.as_deref() {
        Some(path) => {
            let format = run
                .output_format
                .or_else(|| output::infer_format_from_path(path))
                .unwrap_or(OutputFormat::Text);
            let rendered = output::render(format, &page);
            write_output(path, &rendered).await?;
            debug!(path, ?format, "results written");
        }
        None => {
            let rendered = output::render(run.output_format.unwrap_or(OutputFormat::Text), &page);
            std::io::stdout()
                .write_all(&rendered)
                .map_err(|e| format!("failed to write results: {e}"))?;
        }
    }

    if run.export {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::with_template("{spinner} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(format!("exporting {} reports", response.total));
        pb.enable_steady_tick(Duration::from_millis(120));

        let engine = ExportEngine::new();
        let mut sink = FileSink::new(run.export_dir.clone());
        let result = engine
            .download(&client, &session, &store, &renderer, &mut sink)
            .await;
        pb.finish_and_clear();

        match result {
            Ok(report) => eprintln!(
                "{} {} rows x {} columns -> {}",
                ":: Exported ::".green().bold(),
                report.rows,
                report.columns,
                report.location
            ),
            Err(e) => {
                eprintln!("{} {e}", ":: Export failed ::".red().bold());
                return Err(e.to_string());
            }
        }
    }

    eprintln!();
    eprintln!(
        "{}",
        format!(
            ":: Completed :: {} of {} reports in {}ms ::",
            table.rows().len(),
            response.total,
            now.elapsed().as_millis()
        )
        .bold()
    );
    Ok(())
}

pub fn run_cli() -> Result<(), String> {
    let args = match CliArgs::try_parse() {
        Ok(args) => args,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                let _ = e.print();
                return Ok(());
            }
            _ => return Err(e.to_string()),
        },
    };

    init_tracing(args.verbose);

    let config_path = match args.config.as_deref() {
        Some(path) => Some(config::expand_tilde(path)),
        None => config::default_config_path(),
    };

    if args.init_config {
        let path = config_path.ok_or_else(|| "cannot locate home directory".to_string())?;
        config::ensure_default_config_file(&path)?;
        println!("config: {}", path.display());
        return Ok(());
    }

    let cfg = match (config_path.as_ref(), args.config.is_some()) {
        (Some(path), explicit) => config::load_config(path, !explicit)?,
        (None, _) => ConfigFile::default(),
    };

    let run = build_run_config(args, cfg)?;

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("failed to build runtime: {e}"))?;

    rt.block_on(run_async(run))
}
