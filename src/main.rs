use colored::Colorize;
use json_pg::cli;

fn main() {
    // stdout carries the generated artifact; logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let command_line_interface = cli::CommandLineInterface::load();
    if let Err(error) = command_line_interface.run() {
        eprintln!("{} {error}", "error:".red().bold());
        for cause in error.chain().skip(1) {
            eprintln!("  {} {cause}", "caused by:".red());
        }
        std::process::exit(1);
    }
}
