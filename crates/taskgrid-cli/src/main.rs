#[tokio::main]
async fn main() {
    std::process::exit(taskgrid_cli::run().await);
}
