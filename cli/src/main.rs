//! linode-prep - Prepare a Linode for a manual encrypted install

use clap::Parser;
use tracing_subscriber::EnvFilter;

use linode_prep::app::AppContext;
use linode_prep::application::services::provision::ProvisionError;
use linode_prep::cli::Cli;
use linode_prep::output::json;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let app = AppContext::new(&cli.app_flags());
    if let Err(e) = cli.run(&app).await {
        report(&app, &e);
        std::process::exit(1);
    }
}

fn report(app: &AppContext, err: &anyhow::Error) {
    if app.is_json() {
        match json::format_error(err) {
            Ok(doc) => println!("{doc}"),
            Err(_) => eprintln!("Error: {err:#}"),
        }
        return;
    }
    app.output.error(&format!("Error: {err:#}"));
    if let Some(failure) = err.downcast_ref::<ProvisionError>() {
        app.renderer().render_failure(failure);
    }
}
