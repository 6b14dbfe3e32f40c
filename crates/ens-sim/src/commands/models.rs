use std::error::Error;

use clap::Args;
use ens_sim::ToyModel;
use serde::Serialize;

#[derive(Args, Debug)]
pub struct ModelsArgs {
    /// Emit the listing as JSON.
    #[arg(long)]
    pub json: bool,
    /// Dimension used for the analytic evidence column.
    #[arg(long, default_value_t = 2)]
    pub npar: usize,
}

#[derive(Debug, Serialize)]
struct ModelEntry {
    name: &'static str,
    description: &'static str,
    analytic_logz: f64,
}

pub fn run(args: &ModelsArgs) -> Result<(), Box<dyn Error>> {
    let entries: Vec<ModelEntry> = ToyModel::ALL
        .iter()
        .map(|model| ModelEntry {
            name: model.name(),
            description: model.description(),
            analytic_logz: model.analytic_logz(args.npar),
        })
        .collect();
    if args.json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }
    for entry in entries {
        println!(
            "{:<14} logz={:>9.4}  {}",
            entry.name, entry.analytic_logz, entry.description
        );
    }
    Ok(())
}
