use campus_feedback_lib::{connect_gateway, AppConfig};

#[tokio::main]
async fn main() {
    env_logger::init();

    println!("🔧 Checking document store configuration...");

    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    };

    println!("   Backend: {:?}", config.backend);

    match connect_gateway(&config).await {
        Ok(_) => println!("✅ Document store ready"),
        Err(e) => {
            eprintln!("❌ Document store unavailable: {}", e);
            std::process::exit(1);
        }
    }
}
