mod cli;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::Cli;
use wf2sanity::prelude::*;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref())?;
    let creds = Credentials::from_env()?;

    let source = WebflowClient::new(&creds.webflow_api_key, &settings.webflow)?;
    let destination = SanityClient::new(
        &creds.sanity_project_id,
        &creds.sanity_dataset,
        &creds.sanity_token,
        &settings.sanity,
    )?;
    let options = MigrateOptions { dry_run: cli.dry_run };
    let migrator = Migrator::new(&source, &destination, settings.mapping.clone(), options);

    let stdin = std::io::stdin();
    let mut input = stdin.lock();
    let mut output = std::io::stdout();
    let report = migrator.run(&mut input, &mut output).await?;

    if let (Some(site), Some(collection)) = (&report.site, &report.collection) {
        println!("{} / {}", site, collection);
    }
    print!("{}", report);
    Ok(())
}
