#![allow(unused_imports)]
#![recursion_limit = "256"]

mod cli;
mod application;
mod config;
mod domain;
mod data;
mod resolver;
mod ml;
mod eval;
mod infra;

use anyhow::Result;
use cli::Cli;
use clap::Parser;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("phish_brand_qa=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    cli.run()
}
