// src/main.rs

use dirmirror::{cli, config, logging, run};

#[tokio::main]
async fn main() {
    if let Err(err) = run_main().await {
        eprintln!("dirmirror error: {err:?}");
        std::process::exit(1);
    }
}

async fn run_main() -> anyhow::Result<()> {
    let args = cli::parse();
    let cfg = config::load_effective(&args)?;
    logging::init_logging(args.log_level, cfg.logging.level.as_deref())?;
    run(args, cfg).await?;
    Ok(())
}
