use clap::{ArgAction, Parser};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "avrsearch",
    version,
    about = "antibody validation report search",
    long_about = "avrsearch queries an antibody validation report index, renders the matching reports as a table and exports the full result set as CSV.\n\nExamples:\n  avrsearch CD8\n  avrsearch kidney --show host --show rrid -o results.html\n  avrsearch 'CD3' --export\n  avrsearch --columns\n\nTip: Column choices are remembered in ~/.avrsearch/columns.yml."
)]
pub struct CliArgs {
    #[arg(
        value_name = "QUERY",
        help = "Full-text query (empty lists every current report)."
    )]
    pub query: Option<String>,

    #[arg(
        short = 'v',
        long = "vb",
        visible_alias = "verbose",
        action = ArgAction::Count,
        help_heading = "Output",
        help = "Increase verbosity (-v, -vv, -vvv)."
    )]
    pub verbose: u8,

    #[arg(
        short = 'C',
        long = "cfg",
        visible_alias = "config",
        value_name = "FILE",
        help_heading = "Input",
        help = "Path to config file (defaults to ~/.avrsearch/config.yml)."
    )]
    pub config: Option<String>,

    #[arg(
        long = "init-config",
        help_heading = "Input",
        help = "Write a commented default config file and exit."
    )]
    pub init_config: bool,

    #[arg(
        short = 's',
        long = "su",
        visible_alias = "search-url",
        value_name = "URL",
        help_heading = "Search",
        help = "Search backend base URL."
    )]
    pub search_url: Option<String>,

    #[arg(
        short = 'x',
        long = "ix",
        visible_alias = "index",
        value_name = "NAME",
        help_heading = "Search",
        help = "Index holding the reports."
    )]
    pub index: Option<String>,

    #[arg(
        short = 'a',
        long = "au",
        visible_alias = "assets-url",
        value_name = "URL",
        help_heading = "Search",
        help = "Base URL for validation report files."
    )]
    pub assets_url: Option<String>,

    #[arg(
        long = "timeout",
        value_name = "SECONDS",
        help_heading = "Search",
        help = "Request timeout."
    )]
    pub timeout: Option<u64>,

    #[arg(
        short = 'p',
        long = "px",
        visible_alias = "proxy",
        value_name = "URL",
        help_heading = "Search",
        help = "HTTP proxy."
    )]
    pub proxy: Option<String>,

    #[arg(
        short = 'n',
        long = "ps",
        visible_alias = "page-size",
        value_name = "N",
        help_heading = "Search",
        help = "Reports shown per page."
    )]
    pub page_size: Option<u64>,

    #[arg(
        long = "from",
        value_name = "N",
        help_heading = "Search",
        help = "Offset of the first report shown."
    )]
    pub from: Option<u64>,

    #[arg(
        long = "show",
        value_name = "COLUMN",
        action = ArgAction::Append,
        help_heading = "Columns",
        help = "Show an optional column (repeatable)."
    )]
    pub show: Vec<String>,

    #[arg(
        long = "hide",
        value_name = "COLUMN",
        action = ArgAction::Append,
        help_heading = "Columns",
        help = "Hide an optional column (repeatable)."
    )]
    pub hide: Vec<String>,

    #[arg(
        long = "sa",
        visible_alias = "show-all",
        help_heading = "Columns",
        help = "Show every optional column."
    )]
    pub show_all: bool,

    #[arg(
        long = "ca",
        visible_alias = "clear-all",
        help_heading = "Columns",
        help = "Hide every optional column."
    )]
    pub clear_all: bool,

    #[arg(
        short = 'l',
        long = "columns",
        help_heading = "Columns",
        help = "List optional columns with their current state and exit."
    )]
    pub columns: bool,

    #[arg(
        long = "prefs",
        visible_alias = "preferences",
        value_name = "FILE",
        help_heading = "Columns",
        help = "Column preference file (defaults to ~/.avrsearch/columns.yml)."
    )]
    pub preferences: Option<String>,

    #[arg(
        short = 'o',
        long = "out",
        visible_alias = "output",
        value_name = "FILE",
        help_heading = "Output",
        help = "Write results to a file."
    )]
    pub output: Option<String>,

    #[arg(
        short = 'A',
        long = "of",
        visible_alias = "output-format",
        value_name = "FORMAT",
        help_heading = "Output",
        help = "Output format (text, json, html)."
    )]
    pub output_format: Option<String>,

    #[arg(
        short = 'e',
        long = "export",
        help_heading = "Export",
        help = "Export every matching report to avr.csv."
    )]
    pub export: bool,

    #[arg(
        long = "ed",
        visible_alias = "export-dir",
        value_name = "DIR",
        help_heading = "Export",
        help = "Directory that receives avr.csv (defaults to the current directory)."
    )]
    pub export_dir: Option<String>,

    #[arg(
        long = "eau",
        visible_alias = "export-asset-urls",
        num_args = 0..=1,
        default_missing_value = "true",
        help_heading = "Export",
        help = "Export full validation report URLs instead of filenames."
    )]
    pub export_asset_urls: Option<bool>,

    #[arg(
        long = "nc",
        visible_alias = "no-color",
        help_heading = "Output",
        help = "Disable colored output."
    )]
    pub no_color: bool,
}
