use anyhow::Result;

/// Reminders only need a single task at a time, so everything runs on the current thread.
pub fn single_thread_runtime() -> Result<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?)
}
