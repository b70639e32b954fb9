#[cfg(feature = "server")]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    blogforge::server::run().await
}
