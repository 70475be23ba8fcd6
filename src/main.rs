#[tokio::main]
async fn main() -> std::io::Result<()> {
    medsafe::run().await
}
