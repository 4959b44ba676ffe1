// ext-fuzzing/src/bin/fuzz_harness.rs
//! Fuzz-execution harness entry point
//!
//! Readiness gate -> fetch queue -> sequential execution -> single report.

use std::env;
use std::sync::Arc;

use clap::Parser;
use log::{error, info};

use ext_fuzzing::client::ControllerClient;
use ext_fuzzing::constants::{self, env_vars};
use ext_fuzzing::demo;
use ext_fuzzing::error::HarnessError;
use ext_fuzzing::executor::CaseExecutor;
use ext_fuzzing::instrumentation::coverage::CoverageSession;
use ext_fuzzing::isolation::TargetEnv;
use ext_fuzzing::reporters;
use ext_fuzzing::resolver::Resolver;
use ext_fuzzing::tracker::CoverageTracker;

/// Coverage-guided fuzz-execution harness CLI
#[derive(Parser, Debug)]
#[clap(author, version, about = "Coverage-guided fuzz-execution harness")]
struct Cli {
    /// Controller host supplying the fuzz-case queue
    #[clap(long)]
    controller_host: Option<String>,

    /// Controller port
    #[clap(long)]
    controller_port: Option<u16>,
}

#[tokio::main]
async fn main() {
    ext_fuzzing::init();

    let cli = Cli::parse();
    let host = cli
        .controller_host
        .or_else(|| env::var(env_vars::CONTROLLER_HOST).ok())
        .unwrap_or_else(|| constants::CONTROLLER_HOST.to_string());
    let port = cli
        .controller_port
        .or_else(|| {
            env::var(env_vars::CONTROLLER_PORT)
                .ok()
                .and_then(|p| p.parse().ok())
        })
        .unwrap_or(constants::CONTROLLER_PORT);

    println!("=================================================================");
    println!("Extension Fuzz-Execution Harness");
    println!("=================================================================");
    println!("Controller: http://{}:{}", host, port);

    if let Err(err) = run(&host, port).await {
        error!("fuzzing run failed: {}", err);
        std::process::exit(1);
    }

    ext_fuzzing::finalize();
}

async fn run(host: &str, port: u16) -> Result<(), HarnessError> {
    let client = ControllerClient::new(host, port);

    // Isolate the target before anything in it can run: dummy-seeded
    // configuration plus the stubbed fetch capability.
    let target_env = Arc::new(TargetEnv::seeded());

    let session = CoverageSession::open();
    let module = demo::build(&session, &target_env);
    let resolver = Resolver::from_module(&module);
    info!("available exports: {:?}", resolver.names());

    client.wait_ready().await?;
    let cases = client.fetch_cases().await;

    let tracker = CoverageTracker::new(session);
    let mut executor = CaseExecutor::new(&resolver, tracker);
    executor.run(cases).await?;

    let (clean, errors, tracker) = executor.finish();
    reporters::finalize_run(tracker, clean, errors, &client).await?;
    Ok(())
}
