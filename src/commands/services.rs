//! List declared and running services

use std::collections::HashSet;
use std::path::Path;

use compose_stack::{print_table, Config, LogDiagnostics, Row, Stack, SystemRunner, TableOptions};

#[derive(clap::Args, Debug, Default)]
pub struct ServicesArgs {
    /// Show every parameter of the services with this name
    pub name: Option<String>,

    /// Show short container ids
    #[arg(short, long)]
    pub ids: bool,

    /// Show port mappings and network mode
    #[arg(short, long)]
    pub network: bool,

    /// Show finish and change times
    #[arg(short, long)]
    pub times: bool,

    /// Show image details
    #[arg(short, long)]
    pub docker: bool,

    /// Show CPU and memory usage of containers
    #[arg(short, long)]
    pub stats: bool,

    /// Show ids, network, times and image details
    #[arg(short, long)]
    pub all: bool,

    /// Only list what the stack definition declares
    #[arg(short = 'C', long)]
    pub only_config: bool,

    /// Tab separated output
    #[arg(long)]
    pub plain: bool,
}

pub fn services(config: Option<&Path>, args: &ServicesArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load(config)?;
    let mut stack = Stack::new();
    stack.seed_from_config(&config)?;

    if args.only_config {
        let options = table_options(&["TYPE", "STACK", "NAME", "NETPORT"], args.plain);
        print_table(&stack.to_rows(), &options)?;
        return Ok(());
    }

    let runner = SystemRunner;
    let diag = LogDiagnostics;
    stack.refresh_from_dockerd(&runner, &diag, None, args.stats);
    let units: HashSet<String> = config.systemd_unit_names().iter().cloned().collect();
    stack.refresh_from_systemd(&runner, &diag, Some(&units));
    log::debug!("{}", stack);

    if let Some(name) = &args.name {
        let rows: Vec<Row> = stack.find(name, None).iter().flat_map(|s| s.details()).collect();
        if rows.is_empty() {
            return Err(format!("cannot find service named '{}'", name).into());
        }
        let options = table_options(&["NAME", "STACK", "PARAMETER", "VALUE"], args.plain);
        print_table(&rows, &options)?;
        return Ok(());
    }

    print_table(&stack.to_rows(), &table_options(&columns(args), args.plain))?;
    Ok(())
}

/// Columns for the service listing
fn columns(args: &ServicesArgs) -> Vec<&'static str> {
    let mut cols = vec!["TYPE", "STACK", "NAME"];
    if args.ids || args.all {
        cols.push("PID6");
    }
    cols.extend(["STATE", "STARTED"]);
    if args.network || args.all {
        cols.extend(["NETMAP", "NETMODE"]);
    } else {
        cols.push("NETPORT");
    }
    if args.times || args.all {
        cols.extend(["FINISHED", "CHANGED"]);
    }
    if args.docker || args.all {
        cols.extend(["IMAGE", "IMAGEVER", "IMAGEDATE"]);
    }
    if args.stats {
        cols.extend(["CPU", "MEM"]);
    }
    cols
}

fn table_options(columns: &[&str], plain: bool) -> TableOptions {
    TableOptions {
        align: !plain,
        ..TableOptions::with_columns(columns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_columns() {
        let cols = columns(&ServicesArgs::default());
        assert_eq!(cols, vec!["TYPE", "STACK", "NAME", "STATE", "STARTED", "NETPORT"]);
    }

    #[test]
    fn test_network_replaces_ports() {
        let args = ServicesArgs {
            network: true,
            ..Default::default()
        };
        assert_eq!(
            columns(&args),
            vec!["TYPE", "STACK", "NAME", "STATE", "STARTED", "NETMAP", "NETMODE"]
        );
    }

    #[test]
    fn test_all_columns() {
        let args = ServicesArgs {
            all: true,
            stats: true,
            ..Default::default()
        };
        assert_eq!(
            columns(&args),
            vec![
                "TYPE", "STACK", "NAME", "PID6", "STATE", "STARTED", "NETMAP", "NETMODE", "FINISHED",
                "CHANGED", "IMAGE", "IMAGEVER", "IMAGEDATE", "CPU", "MEM"
            ]
        );
    }

    #[test]
    fn test_plain_output_is_delimited() {
        let options = table_options(&["NAME"], true);
        assert!(!options.align);
        assert_eq!(options.columns, Some(vec!["NAME".to_string()]));
    }
}
