#[tokio::main]
async fn main() {
    coaching_booking::run().await
}
