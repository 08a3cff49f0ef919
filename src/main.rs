use custom_uploader::{cli, logging};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::initialize_logging(None)?;

    let matches = cli::build_cli().get_matches();
    cli::run(matches).await
}
