use clap::Parser;
use printwatch::cli::{
    commands, printers, status, token, handle_completions, handle_config_init, Cli, Commands,
    ConfigCommands, PrintersCommands, TokenCommands,
};

fn print_output(
    result: Result<String, Box<dyn std::error::Error>>,
) -> Result<(), Box<dyn std::error::Error>> {
    let output = result?;
    println!("{}", output);
    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Watch(args) => printwatch::cli::watch::run_watch(args).await,
        Commands::Status(args) => print_output(status::handle_status(&args).await),
        Commands::Printers(cmd) => match cmd {
            PrintersCommands::List(args) => {
                print_output(printers::handle_printers_list(&args).await)
            }
            PrintersCommands::Add(args) => {
                print_output(printers::handle_printers_add(&args).await)
            }
        },
        Commands::Send(args) => print_output(commands::handle_send(&args).await),
        Commands::Commands(args) => {
            println!("{}", commands::handle_commands(&args));
            Ok(())
        }
        Commands::Token(cmd) => match cmd {
            TokenCommands::Set(args) => print_output(token::handle_token_set(&args)),
            TokenCommands::Clear(args) => print_output(token::handle_token_clear(&args)),
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
