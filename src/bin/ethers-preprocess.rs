use clap::Parser;
use ethers_preprocess::{PreprocessConfig, Preprocessor, ProjectPathsConfigBuilder, Remappings};
use eyre::{Result, WrapErr};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "ethers-preprocess",
    version,
    about = "Remaps solidity imports before compilation"
)]
struct Args {
    /// The project root, defaults to the current directory
    #[arg(long, value_name = "DIR")]
    root: Option<PathBuf>,

    /// Json config file, defaults to `<root>/preprocess.json` if it exists
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Where to find the solidity sources
    #[arg(long, value_name = "DIR")]
    sources: Option<PathBuf>,

    /// Where to write the preprocessed sources
    #[arg(long, value_name = "DIR")]
    cache: Option<PathBuf>,

    /// The remappings file
    #[arg(long, value_name = "FILE")]
    remappings: Option<PathBuf>,

    /// The compiler version, e.g. `0.8.19`
    #[arg(long, value_name = "VERSION")]
    solc: Option<String>,

    /// Only load and print the remappings, don't write anything
    #[arg(long)]
    check: bool,
}

impl Args {
    fn config(&self) -> Result<PreprocessConfig> {
        let root = match &self.root {
            Some(root) => root.clone(),
            None => std::env::current_dir()?,
        };
        let mut config = match &self.config {
            Some(file) => PreprocessConfig::read(file)?,
            None => PreprocessConfig::load(&root)?,
        };

        config.paths = config.paths.merge(self.path_overrides());

        if let Some(version) = &self.solc {
            config = config.with_solc_version(version)?;
        }
        Ok(config)
    }

    /// The paths set on the command line, these take precedence over the config file
    fn path_overrides(&self) -> ProjectPathsConfigBuilder {
        let mut overrides = ProjectPathsConfigBuilder::default();
        if let Some(root) = &self.root {
            overrides = overrides.root(root);
        }
        if let Some(sources) = &self.sources {
            overrides = overrides.sources(sources);
        }
        if let Some(cache) = &self.cache {
            overrides = overrides.cache(cache);
        }
        if let Some(remappings) = &self.remappings {
            overrides = overrides.remappings(remappings);
        }
        overrides
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let args = Args::parse();
    let config = args.config().wrap_err("failed to load config")?;
    let paths = config.project_paths()?;

    if args.check {
        let remappings = Remappings::read(&paths.remappings)
            .wrap_err_with(|| format!("failed to load {}", paths.remappings.display()))?;
        print!("{paths}");
        println!("solc: {}", config.solc);
        println!("{} remappings:", remappings.len());
        print!("{remappings}");
        return Ok(())
    }

    let preprocessor = Preprocessor::new(paths)?.solc(config.solc);
    let output = preprocessor.run()?;
    println!("{output}");
    Ok(())
}
