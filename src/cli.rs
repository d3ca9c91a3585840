use clap::{ArgGroup, Parser};

#[derive(Parser, Debug, Clone)]
#[command(name = "codeplay", about = "Run Python and C programs on a playground execution service", version)]
#[command(group(ArgGroup::new("action").args(["install", "list_packages", "health", "check_compiler"]).multiple(false)))]
#[command(group(ArgGroup::new("render_switch").args(["html", "plain"]).multiple(false)))]
pub struct Cli {
    /// Program file to run. Reads stdin when omitted.
    #[arg(value_name = "FILE")]
    pub file: Option<String>,

    /// Language of the program (python|c). Inferred from the file extension when omitted.
    #[arg(long = "lang")]
    pub lang: Option<String>,

    /// Value for the next stdin read, in order. Can be used multiple times:
    /// --input 5 --input 7
    #[arg(long = "input", action = clap::ArgAction::Append)]
    pub inputs: Vec<String>,

    /// Print the output as HTML markup.
    #[arg(long)]
    pub html: bool,
    /// Print the output as terminal text (default).
    #[arg(long)]
    pub plain: bool,

    /// Install a Python package into the execution environment.
    #[arg(long, value_name = "PACKAGE")]
    pub install: Option<String>,

    /// List packages installed in the execution environment.
    #[arg(long = "list-packages")]
    pub list_packages: bool,

    /// Check whether the execution service is reachable.
    #[arg(long)]
    pub health: bool,

    /// Check whether the service has a working C compiler.
    #[arg(long = "check-compiler")]
    pub check_compiler: bool,

    /// Execution service base URL (overrides BACKEND_URL).
    #[arg(long = "backend-url")]
    pub backend_url: Option<String>,

    /// Enable verbose logging.
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }
}
