use anyhow::{bail, Context, Result};
use itertools::Itertools;
use tracing_subscriber::EnvFilter;

use app_store_queries::{
    config::HarnessConfig, harness::catalog, sqlite::snapshot::SnapshotStore,
};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = std::env::args().collect::<Vec<_>>();
    match args.len() {
        0 | 1 => bail!("Missing <snapshot dir> and <command>"),
        2 => bail!("Missing <command>"),
        _ => {}
    }

    let config = HarnessConfig::from_env()?.with_snapshot_dir(&args[1]);
    let store = SnapshotStore::new(&config.snapshot_dir);
    tracing::debug!(?config, "starting");

    // Parse command and act accordingly
    let command = &args[2];
    match command.as_str() {
        ".snapshots" => {
            println!("{}", store.list()?.join(" "));
        }

        ".tables" => {
            let stage = arg(&args, 3, "<stage>")?;
            let conn = store.open(stage, Some(config.case_timeout))?;
            println!("{}", conn.tables()?.join(" "));
        }

        ".restore" => {
            let from = arg(&args, 3, "<source stage>")?;
            let to = arg(&args, 4, "<destination stage>")?;
            let path = store.restore(from, to)?;
            println!("{}", path.display());
        }

        ".run" => {
            let report = catalog::queries_across_tables(config.case_timeout).run(&store);
            report.print()?;
            if !report.is_success() {
                bail!(
                    "{} of {} cases did not pass",
                    report.cases.len() - report.passed(),
                    report.cases.len()
                );
            }
        }

        stage => {
            let query = arg(&args, 3, "<query>")?;
            let conn = store.open(stage, Some(config.case_timeout))?;
            let rows = conn
                .fetch_multiple_rows(query)
                .with_context(|| format!("running query against stage {stage}"))?;
            for row in rows {
                println!("{}", row.values().iter().join("|"));
            }
        }
    }

    Ok(())
}

fn arg<'a>(args: &'a [String], index: usize, name: &str) -> Result<&'a str> {
    match args.get(index) {
        Some(value) => Ok(value.trim()),
        None => bail!("Missing {name}"),
    }
}
