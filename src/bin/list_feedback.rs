use anyhow::Context;
use campus_feedback_lib::database::{PostgresGateway, FACILITIES_COLLECTION};
use campus_feedback_lib::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let collection = std::env::args()
        .nth(1)
        .unwrap_or_else(|| FACILITIES_COLLECTION.to_string());

    println!("🔧 Listing documents in {}...", collection);

    let config = AppConfig::load()?;
    let gateway = PostgresGateway::connect(&config.postgres)
        .await
        .context("Database connection failed")?;

    let documents = gateway.list_documents(&collection).await?;

    println!("\n📋 Found {} documents:", documents.len());
    println!("{:-<100}", "");
    for document in &documents {
        println!(
            "{:<38} {}",
            document.handle.id,
            document.payload.submitted_at.format("%Y-%m-%d %H:%M:%S")
        );
        println!("   {}", serde_json::to_string(&document.payload.fields)?);
    }
    println!("{:-<100}", "");

    Ok(())
}
