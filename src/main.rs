#[tokio::main]
async fn main() -> anyhow::Result<()> {
    stegano_gateway::run().await
}
