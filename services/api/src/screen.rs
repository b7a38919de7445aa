use clap::Args;
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;
use watchlist::config::ScreeningConfig;
use watchlist::error::AppError;
use watchlist::index::IndexSnapshot;
use watchlist::loader::{CsvDirectoryLoader, SourceLoader};
use watchlist::search::{Evaluator, SearchQuery, SearchSettings};

#[derive(Args, Debug, Default)]
pub(crate) struct ScreenArgs {
    /// Directory holding sdn.csv and the optional alt.csv, add.csv, dpl.txt and csl.csv
    #[arg(long)]
    pub(crate) data_dir: PathBuf,
    #[arg(long)]
    pub(crate) name: Option<String>,
    #[arg(long)]
    pub(crate) alt_name: Option<String>,
    #[arg(long)]
    pub(crate) address: Option<String>,
    #[arg(long)]
    pub(crate) city: Option<String>,
    #[arg(long)]
    pub(crate) state: Option<String>,
    #[arg(long)]
    pub(crate) country: Option<String>,
    /// Exact identifier lookup against SDN records
    #[arg(long)]
    pub(crate) id: Option<String>,
    /// Free text matched against names and addresses
    #[arg(long)]
    pub(crate) q: Option<String>,
    /// Maximum results per category
    #[arg(long)]
    pub(crate) limit: Option<usize>,
    /// Drop matches scoring below this threshold (0.0 to 1.0)
    #[arg(long)]
    pub(crate) min_match: Option<f64>,
    /// Print matching records as entity envelopes instead of scored rows
    #[arg(long)]
    pub(crate) entities: bool,
}

impl ScreenArgs {
    fn query(&self) -> SearchQuery {
        SearchQuery {
            name: self.name.clone(),
            alt_name: self.alt_name.clone(),
            address: self.address.clone(),
            city: self.city.clone(),
            state: self.state.clone(),
            country: self.country.clone(),
            id: self.id.clone(),
            q: self.q.clone(),
            limit: self.limit,
            min_match: self.min_match,
        }
    }
}

/// One-shot screening against a list directory. Builds a throwaway snapshot and
/// prints the results as JSON on stdout.
pub(crate) fn run_screen(args: ScreenArgs) -> Result<(), AppError> {
    let query = args.query();
    query.validate()?;

    let config = ScreeningConfig::default();
    let data = CsvDirectoryLoader::new(args.data_dir.clone()).load()?;
    let snapshot = IndexSnapshot::build(data, config.build_workers)
        .map_err(|err| AppError::Refresh(err.into()))?;

    let evaluator = Evaluator::new(SearchSettings::from(&config));
    let results = evaluator.evaluate(&query, &snapshot, evaluator.deadline())?;

    let stdout = std::io::stdout();
    if args.entities {
        write_json(stdout.lock(), &results.entities(&snapshot))
    } else {
        write_json(stdout.lock(), &results)
    }
}

fn write_json<W: Write, T: Serialize>(mut out: W, value: &T) -> Result<(), AppError> {
    serde_json::to_writer_pretty(&mut out, value)?;
    writeln!(out)?;
    Ok(())
}
