use anyhow::Result;
use clap::Parser;
use wxnorm_cli::Cli;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Observability
    wxnorm_obs::init_with_filter("wxnorm", &cli.log_level);

    let input = wxnorm_cli::read_input(cli.input.as_deref())?;
    let output = wxnorm_cli::run(&cli, &input)?;

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
