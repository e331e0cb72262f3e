use super::Parser;

#[derive(Parser, Debug)]
#[command(name = "tokengate", about = "Access/refresh token issuing service")]
pub struct Cli {
    /// Path to a TOML settings file.
    #[arg(long)]
    pub settings: Option<String>,
}
