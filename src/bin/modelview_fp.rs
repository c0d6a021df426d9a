use anyhow::Context;
use modelview::ViewerConfig;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    modelview::viewer::run(ViewerConfig::first_person()).context("first-person viewer failed")
}
