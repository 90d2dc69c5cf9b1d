use tracing::error;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    if let Err(e) = slot_booking::run().await {
        error!("Fatal: {}", e);
        eprintln!("slot-booking failed: {}", e);
        std::process::exit(1);
    }
}
