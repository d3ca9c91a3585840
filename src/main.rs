use std::{
    fs,
    io::{self, Read},
};

use anyhow::{bail, Context, Result};
use codeplay::{
    cli::Cli,
    config::Config,
    execution::Language,
    handlers,
    printer::OutputPrinter,
};
use is_terminal::IsTerminal;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    let filter = if args.verbose {
        tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::DEBUG.into())
    } else {
        tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into())
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    let mut cfg = Config::load();
    if let Some(url) = args.backend_url.as_deref() {
        cfg.set("BACKEND_URL", url);
    }
    tracing::debug!(backend = %cfg.backend_url(), config = %cfg.config_path.display(), "configuration loaded");

    let html = if args.plain { false } else if args.html { true } else { cfg.get_bool("RENDER_HTML") };
    let color = cfg.get_bool("PRETTIFY_OUTPUT") && io::stdout().is_terminal();
    let printer = OutputPrinter { html, color };

    // Service-level actions
    if args.health {
        return handlers::status::health(&cfg).await;
    }
    if args.check_compiler {
        return handlers::status::check_compiler(&cfg).await;
    }
    if let Some(name) = args.install.as_deref() {
        return handlers::packages::install(&cfg, name, &printer).await;
    }
    if args.list_packages {
        return handlers::packages::list(&cfg).await;
    }

    // Program source: file argument, else piped stdin
    let code = match args.file.as_deref() {
        Some(path) => fs::read_to_string(path).with_context(|| format!("failed to read {}", path))?,
        None => {
            if io::stdin().is_terminal() {
                bail!("no program given: pass a FILE or pipe source code on stdin");
            }
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    let language = match args.lang.as_deref() {
        Some(lang) => lang.parse::<Language>().map_err(anyhow::Error::msg)?,
        None => match args.file.as_deref().and_then(Language::from_path) {
            Some(lang) => lang,
            None => cfg.default_language()?,
        },
    };

    handlers::run::run(&cfg, &code, language, args.inputs, &printer).await
}
