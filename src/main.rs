#[tokio::main]
async fn main() {
    fanpost_backend::run().await;
}
