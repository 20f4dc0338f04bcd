use crate::catalog::ColumnKey;
use crate::cli::args::CliArgs;

fn parse_columns(flag: &str, values: &[String]) -> Result<Vec<ColumnKey>, String> {
    values
        .iter()
        .map(|raw| {
            ColumnKey::parse_optional(raw).map_err(|e| format!("invalid --{flag} '{raw}': {e}"))
        })
        .collect()
}

pub fn validate(args: &CliArgs) -> Result<(), String> {
    if let Some(size) = args.page_size {
        if size == 0 {
            return Err("invalid page-size, expected positive integer".to_string());
        }
    }
    if let Some(timeout) = args.timeout {
        if timeout == 0 {
            return Err("invalid timeout, expected positive integer".to_string());
        }
    }
    if let Some(raw) = args.output_format.as_deref() {
        if crate::output::OutputFormat::parse(raw).is_none() {
            return Err(format!(
                "invalid --output-format '{raw}', expected text, json or html"
            ));
        }
    }
    if args.show_all && args.clear_all {
        return Err("use either --show-all or --clear-all, not both".to_string());
    }
    let show = parse_columns("show", &args.show)?;
    let hide = parse_columns("hide", &args.hide)?;
    if let Some(key) = show.iter().find(|k| hide.contains(k)) {
        return Err(format!("column '{key}' is both shown and hidden"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn args(extra: &[&str]) -> CliArgs {
        CliArgs::parse_from(std::iter::once("avrsearch").chain(extra.iter().copied()))
    }

    #[test]
    fn accepts_defaults() {
        assert!(validate(&args(&[])).is_ok());
    }

    #[test]
    fn rejects_core_and_unknown_columns() {
        let err = validate(&args(&["--show", "target_symbol"])).unwrap_err();
        assert!(err.contains("target_symbol"));
        assert!(validate(&args(&["--hide", "nope"])).is_err());
    }

    #[test]
    fn rejects_contradictions() {
        assert!(validate(&args(&["--show-all", "--clear-all"])).is_err());
        assert!(validate(&args(&["--show", "host", "--hide", "HOST"])).is_err());
        assert!(validate(&args(&["--page-size", "0"])).is_err());
        assert!(validate(&args(&["--output-format", "xml"])).is_err());
    }
}
