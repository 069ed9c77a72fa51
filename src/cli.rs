use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "convertbox")]
#[command(about = "ConvertBox document conversion service", long_about = None)]
pub struct Cli {
    /// Configuration file (takes precedence over CONVERTBOX_CONFIG)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP server
    Server(ServerArgs),
    /// Convert a local file without starting the server
    Convert(ConvertArgs),
    /// Print the effective configuration as TOML
    Config,
}

#[derive(clap::Args, Debug)]
pub struct ServerArgs {
    /// Address to bind the HTTP server to (defaults to server.bind_addr)
    #[arg(long)]
    pub address: Option<SocketAddr>,
}

#[derive(clap::Args, Debug)]
pub struct ConvertArgs {
    /// File to convert
    pub input: PathBuf,

    /// Conversion type, e.g. pdf-to-word (defaults to conversion.default_type)
    #[arg(short = 't', long = "type")]
    pub conversion_type: Option<String>,

    /// Destination file or directory (defaults to the output name in the
    /// current directory)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_convert() {
        let cli = Cli::parse_from([
            "convertbox",
            "convert",
            "deck.pdf",
            "--type",
            "pdf-to-ppt",
            "-o",
            "out/",
        ]);

        match cli.command {
            Commands::Convert(args) => {
                assert_eq!(args.input, PathBuf::from("deck.pdf"));
                assert_eq!(args.conversion_type.as_deref(), Some("pdf-to-ppt"));
                assert_eq!(args.output, Some(PathBuf::from("out/")));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_global_config_flag() {
        let cli = Cli::parse_from([
            "convertbox",
            "server",
            "--address",
            "127.0.0.1:5001",
            "--config",
            "/etc/convertbox.toml",
        ]);

        assert_eq!(cli.config, Some(PathBuf::from("/etc/convertbox.toml")));
        match cli.command {
            Commands::Server(args) => {
                assert_eq!(args.address.unwrap().to_string(), "127.0.0.1:5001")
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
