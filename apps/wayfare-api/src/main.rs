use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = wayfare_api::Args::parse();

	wayfare_api::run(args).await
}
