mod app;
mod input;
mod render;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    app::run(app::Args::parse())
}
