use clap::Parser;
use deskrelay::cli::{
    desks, handle_completions, handle_config_init, reservations, watch, Cli, Commands,
    ConfigCommands,
};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Watch(args) => watch::run_watch(args).await,
        Commands::Desks(args) => match api_for(&args.server) {
            Ok(api) => desks::handle_desks(&args, &api).await.map(|output| {
                println!("{}", output);
            }),
            Err(e) => Err(e),
        },
        Commands::Reservations(args) => match api_for(&args.server) {
            Ok(api) => reservations::handle_reservations(&args, &api)
                .await
                .map(|output| {
                    println!("{}", output);
                }),
            Err(e) => Err(e),
        },
        Commands::Config(config_cmd) => match config_cmd {
            ConfigCommands::Init(args) => handle_config_init(&args),
        },
        Commands::Completions(args) => {
            handle_completions(&args);
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn api_for(
    args: &deskrelay::cli::ServerArgs,
) -> Result<deskrelay::api::ApiClient, Box<dyn std::error::Error>> {
    let config = watch::load_config_with_overrides(args)?;
    config.validate()?;
    watch::build_api_client(&config)
}
