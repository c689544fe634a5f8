use inventory_desk::app::DeskApp;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app = DeskApp::from_env();
    app.setup_tracing()?;
    app.run().await
}
