use rliblib::{LiblibClient, LiblibConfig, ModelCatalog, SizeSpec};
use std::env;

const DEFAULT_PROMPT: &str = "A serene landscape with mountains and a lake at sunset";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    match dotenv::dotenv() {
        Ok(_) => log::info!("✅ .env file loaded successfully"),
        Err(_) => log::warn!("⚠️  No .env file found, using system environment variables"),
    }

    rliblib::logger::init_with_config(
        rliblib::logger::LoggerConfig::development().with_level(rliblib::logger::LogLevel::Debug),
    )?;

    let config = LiblibConfig::from_env();
    rliblib::logger::log_client_info(&config);

    log::info!("🖼️  Available models:");
    for model in ModelCatalog::supported_models() {
        log::info!("  {} ({})", model.name, model.family);
    }

    let client = match LiblibClient::new(config) {
        Ok(client) => {
            log::info!("✅ LibLib client initialized successfully");
            client
        }
        Err(e) => {
            log::error!("❌ Failed to initialize LibLib client: {}", e);
            log::warn!("💡 Set LIBLIB_ACCESS_KEY and LIBLIB_SECRET_KEY");
            return Err(e.into());
        }
    };

    let args: Vec<String> = env::args().skip(1).collect();
    let prompt = if args.is_empty() {
        DEFAULT_PROMPT.to_string()
    } else {
        args.join(" ")
    };

    log::info!("🎨 Generating: {}", prompt);
    let _timer = rliblib::logger::timer("Text-to-image demo");

    let job = client
        .text_to_image(
            &prompt,
            rliblib::models::DEFAULT_MODEL,
            &SizeSpec::aspect(rliblib::AspectRatio::Square),
            1,
        )
        .await?;

    let images = match client.poll_until_terminal(&job.generate_uuid).await {
        Ok(images) => images,
        Err(e) => {
            log::error!("❌ Job {} did not complete: {}", job.generate_uuid, e);
            return Err(e.into());
        }
    };

    log::info!("✅ Job {} finished with {} image(s)", job.generate_uuid, images.len());
    for (index, image) in images.iter().enumerate() {
        log::info!("📷 Image {}: {}", index + 1, image.image_url);
        log::info!("   Seed: {}, audit: {:?}", image.seed, image.audit_status);

        match client.fetch_image(&image.image_url).await {
            Ok(tensor) => log::info!("   Tensor shape: {:?}", tensor.shape()),
            Err(e) => log::error!("❌ Download failed: {}", e),
        }
    }

    Ok(())
}
