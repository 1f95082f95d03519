//! `specwiz` - CLI for specwizard
//!
//! This binary provides the command-line interface for searching a product
//! dataset by specification and for running QR-code treasure hunts.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;

use specwizard::catalog::CatalogBuilder;
use specwizard::cli::{
    Cli, Command, ConfigCommand, FacetsCommand, HuntCommand, ImportCommand, SearchCommand,
    WithSpecCommand,
};
use specwizard::hunt::{HuntEvent, HuntMode, HuntSession, HuntStore, StdinScanSource};
use specwizard::view::{render_text, WizardView};
use specwizard::{init_logging, Config, DatasetLoader, FacetEngine};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // `config` subcommands load configuration themselves
    let load_config = || Config::load_from(cli.config.clone()).context("loading configuration");

    // Execute the command
    match cli.command {
        Command::Stats(cmd) => handle_stats(&load_config()?, cmd.json).await,
        Command::Facets(cmd) => handle_facets(&load_config()?, &cmd).await,
        Command::Search(cmd) => handle_search(&load_config()?, &cmd).await,
        Command::WithSpec(cmd) => handle_with_spec(&load_config()?, &cmd).await,
        Command::Import(cmd) => handle_import(&load_config()?, cmd),
        Command::Hunt(cmd) => handle_hunt(&load_config()?, cmd).await,
        Command::Config(cmd) => handle_config(cli.config.clone(), cmd),
    }
}

async fn load_engine(config: &Config) -> anyhow::Result<FacetEngine> {
    let loader = DatasetLoader::from_config(config);
    let mut engine = FacetEngine::new();
    engine
        .load(&loader)
        .await
        .with_context(|| format!("loading dataset {}", loader.path().display()))?;
    Ok(engine)
}

async fn handle_stats(config: &Config, json: bool) -> anyhow::Result<()> {
    let engine = load_engine(config).await?;
    let catalog = engine.require_catalog()?;
    let stats = catalog.stats()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        println!("specwiz stats");
        println!("-------------");
        println!("Dataset:        {}", catalog.path().display());
        println!("Products:       {}", stats.products);
        println!("Specifications: {}", stats.spec_keys);
        if let Some(fingerprint) = &stats.fingerprint {
            println!("Fingerprint:    {fingerprint}");
        }
    }
    Ok(())
}

async fn handle_facets(config: &Config, cmd: &FacetsCommand) -> anyhow::Result<()> {
    let engine = load_engine(config).await?;
    let mut groups = engine.require_catalog()?.facets()?;
    if let Some(name) = &cmd.group {
        groups.retain(|g| &g.name == name);
        if groups.is_empty() {
            bail!("no specification group named '{name}'");
        }
    }

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&groups)?);
        return Ok(());
    }

    for group in &groups {
        println!("{} ({} keys)", group.name, group.key_count());
        let mut last_key = None;
        for facet in &group.facets {
            if last_key != Some(facet.key.as_str()) {
                println!("  {}", facet.display_name);
                last_key = Some(facet.key.as_str());
            }
            println!(
                "    [{}/{}={}] {} ({})",
                facet.group, facet.key, facet.value, facet.display_value, facet.product_count
            );
        }
    }
    Ok(())
}

async fn handle_search(config: &Config, cmd: &SearchCommand) -> anyhow::Result<()> {
    let mut engine = load_engine(config).await?;
    for criterion in &cmd.specs {
        engine.toggle_criterion(&criterion.group, &criterion.key, &criterion.value, true);
    }
    engine.set_invert(cmd.invert || config.display.show_inverted);

    let view = WizardView::project(&engine, &config.display);
    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&view)?);
    } else {
        print!("{}", render_text(&view));
    }
    Ok(())
}

async fn handle_with_spec(config: &Config, cmd: &WithSpecCommand) -> anyhow::Result<()> {
    let engine = load_engine(config).await?;
    let products = engine
        .require_catalog()?
        .products_with_spec(&cmd.key, &cmd.value)?;

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&products)?);
    } else if products.is_empty() {
        println!("No products with {}={}.", cmd.key, cmd.value);
    } else {
        for product in &products {
            println!(
                "{}  {}  <{}>",
                product.price_label(&config.display.price_placeholder, &config.display.currency),
                product.display_name,
                product.product_url
            );
        }
    }
    Ok(())
}

fn handle_import(config: &Config, cmd: ImportCommand) -> anyhow::Result<()> {
    let output = cmd.output.unwrap_or_else(|| config.dataset_path());
    let mut builder = CatalogBuilder::create(&output)
        .with_context(|| format!("creating dataset {}", output.display()))?;
    let summary = builder
        .import_json(&cmd.input)
        .with_context(|| format!("importing {}", cmd.input.display()))?;
    let catalog = builder.finish()?;

    println!(
        "Imported {} products and {} specifications into {}",
        summary.products,
        summary.specs,
        catalog.path().display()
    );
    Ok(())
}

async fn handle_hunt(config: &Config, cmd: HuntCommand) -> anyhow::Result<()> {
    let store = HuntStore::open(config.hunt_database_path())?;

    match cmd {
        HuntCommand::List => {
            let steps = store.steps()?;
            if steps.is_empty() {
                println!("No hunt steps. Add one with `specwiz hunt add CODE IMAGE`.");
            }
            for (i, step) in steps.iter().enumerate() {
                let added = step
                    .added_at
                    .map_or_else(|| "-".to_string(), |t| t.format("%Y-%m-%d %H:%M").to_string());
                let role = if i + 1 == steps.len() { "  (treasure)" } else { "" };
                println!("{:>3}. {}  {} bytes  added {added}{role}", i + 1, step.qr_code, step.image.len());
            }
        }
        HuntCommand::Add { code, image } => {
            let bytes = std::fs::read(&image)
                .with_context(|| format!("reading image {}", image.display()))?;
            store.add_step(&code, &bytes)?;
            println!("Added step {code} ({} bytes)", bytes.len());
        }
        HuntCommand::Remove { code } => {
            if !store.remove_step(&code)? {
                return Err(specwizard::Error::StepNotFound { code }.into());
            }
            println!("Removed step {code}");
        }
        HuntCommand::Play { mode, seed } => {
            let mode = mode.map_or(config.hunt.mode, HuntMode::from);
            let mut rng = seed.map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);

            let mut session = HuntSession::new(&store)?;
            print_hunt_event(&session.start(mode, &mut rng)?);
            println!("Scan codes, one per line (Ctrl-D to stop).");

            let complete = session
                .run(&mut StdinScanSource::stdin(), print_hunt_event)
                .await?;
            if !complete {
                println!("Hunt stopped at step {}.", session.game().current_step());
            }
        }
    }
    Ok(())
}

fn print_hunt_event(event: &HuntEvent) {
    match event {
        HuntEvent::Clue { step, code, image } => {
            println!(
                "Step {step}: find the code shown in picture {code} ({})",
                describe_image(image.as_deref())
            );
        }
        HuntEvent::Ignored { code } => println!("Code {code} does not lead anywhere. Keep looking."),
        HuntEvent::Treasure { code, image } => {
            println!(
                "Well done! The treasure is in picture {code} ({})",
                describe_image(image.as_deref())
            );
        }
    }
}

fn describe_image(image: Option<&[u8]>) -> String {
    image.map_or_else(|| "missing".to_string(), |bytes| format!("{} bytes", bytes.len()))
}

fn handle_config(config_path: Option<PathBuf>, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            let config = &Config::load_from(config_path).context("loading configuration")?;
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Dataset]");
                println!("  Path:               {}", config.dataset_path().display());
                println!("  Retry delay (ms):   {}", config.dataset.retry_delay_ms);
                println!();
                println!("[Display]");
                println!("  Price placeholder:  {}", config.display.price_placeholder);
                println!("  Currency:           {:?}", config.display.currency);
                println!("  Show inverted:      {}", config.display.show_inverted);
                println!();
                println!("[Hunt]");
                println!("  Database path:      {}", config.hunt_database_path().display());
                println!("  Mode:               {}", config.hunt.mode);
            }
        }
        ConfigCommand::Path => {
            let path = config_path.unwrap_or_else(Config::default_config_path);
            println!("{}", path.display());
        }
        ConfigCommand::Validate { file } => {
            let path = file
                .or(config_path)
                .unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => bail!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}
