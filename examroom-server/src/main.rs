use examroom_server::{init_logger, run_server};
use log::info;

#[tokio::main]
async fn main() {
    init_logger();

    info!("Starting examroom server...");
    run_server().await
}
