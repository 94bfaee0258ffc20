pub fn set_up_logging(default_log_level: log::LevelFilter) -> anyhow::Result<()> {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(default_log_level.to_string()),
    )
    .format_timestamp_millis()
    .try_init()?;

    Ok(())
}
