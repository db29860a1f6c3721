use anyhow::Result;

/// Every handler of the agent runs on this runtime, one at a time.
pub fn single_thread_runtime() -> Result<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?)
}
