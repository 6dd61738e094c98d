#[tokio::main]
async fn main() {
    let code = dbmcp_cli::run().await;
    std::process::exit(code);
}
