use std::error::Error;
use std::path::{Path, PathBuf};

use clap::Args;
use ens_nest::{NestConfig, Sampler, TracingObserver};
use ens_sim::{RunManifest, ToyModel};

#[derive(Args, Debug)]
pub struct RunArgs {
    /// YAML configuration; defaults are used when omitted.
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Toy model to sample.
    #[arg(long, value_enum, default_value_t = ToyModel::Gaussian)]
    pub model: ToyModel,
    /// Number of parameters.
    #[arg(long, default_value_t = 2)]
    pub npar: usize,
    /// Seed overriding `seed_policy.master_seed`.
    #[arg(long)]
    pub seed: Option<u64>,
    /// Result JSON path; the manifest is written alongside as `manifest.json`.
    #[arg(long)]
    pub out: PathBuf,
    /// Log progress every N iterations.
    #[arg(long, default_value_t = 100)]
    pub progress_every: usize,
}

pub fn run(args: &RunArgs) -> Result<(), Box<dyn Error>> {
    let mut config = match &args.config {
        Some(path) => NestConfig::load(path)?,
        None => NestConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed_policy.master_seed = seed;
    }
    let master_seed = config.seed_policy.master_seed;

    let mut observer = TracingObserver::new().every(args.progress_every);
    if let Some(label) = &config.label {
        observer = observer.with_label(label.clone());
    }
    let problem = args.model.instantiate(args.npar);
    let result = Sampler::new(problem, args.npar, &config)
        .with_seed(master_seed)
        .observe(observer)
        .run()?;

    result.write_json(&args.out)?;
    let manifest_path = manifest_path(&args.out);
    let result_file = args
        .out
        .file_name()
        .map(PathBuf::from)
        .unwrap_or_else(|| args.out.clone());
    let manifest = RunManifest::new(
        &config,
        args.model,
        args.npar,
        master_seed,
        result_file,
        &result,
    )?;
    manifest.write(&manifest_path)?;
    tracing::info!(
        result = %args.out.display(),
        manifest = %manifest_path.display(),
        config_hash = %manifest.config_hash,
        "wrote run artefacts"
    );

    println!(
        "{} npar={} logz={:.4} +/- {:.4} (analytic {:.4}) niter={} ncalls={}",
        args.model.name(),
        args.npar,
        result.logz,
        result.logzerr,
        manifest.analytic_logz,
        result.niter,
        result.ncalls
    );
    Ok(())
}

fn manifest_path(out: &Path) -> PathBuf {
    out.with_file_name("manifest.json")
}
