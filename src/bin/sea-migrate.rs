#[async_std::main]
async fn main() {
    sea_migrate::cli::run_cli().await
}
