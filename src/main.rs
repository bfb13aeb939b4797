// src/main.rs
use std::path::PathBuf;

use anyhow::Result;

use avalia::config::{AppConfig, CONFIG_ENV};
use avalia::lifecycle;

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::args_os()
        .nth(1)
        .or_else(|| std::env::var_os(CONFIG_ENV))
        .map(PathBuf::from);
    let config = AppConfig::load(config_path.as_deref())?;
    lifecycle::init_logging(config.log_filter.as_deref());

    let ctx = lifecycle::setup(&config).await?;

    let subjects = ctx.subjects.get_all_subjects().await?;
    let classes = ctx.classes.get_all_classes().await?;
    let teachers = ctx.teachers.get_all_teachers().await?;
    tracing::info!(
        "Ready: {} subjects, {} classes, {} teachers at {}",
        subjects.len(),
        classes.len(),
        teachers.len(),
        config.database.path.display()
    );

    lifecycle::shutdown(ctx).await;
    Ok(())
}
