#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = taskdesk::run().await {
        eprintln!("taskdesk fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}
