//! `localchat onboard`: First-time setup.

use localchat_config::AppConfig;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config_dir = AppConfig::config_dir();
    let config_path = config_dir.join("config.toml");

    println!("🦀 LocalChat — First-Time Setup");
    println!("===============================\n");

    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir)?;
        println!("✅ Created config directory: {}", config_dir.display());
    } else {
        println!("  Config directory exists: {}", config_dir.display());
    }

    if config_path.exists() {
        println!("\n⚠️  Config already exists at: {}", config_path.display());
        println!("   Edit it manually or delete and re-run onboard.\n");
    } else {
        let default_toml = AppConfig::default_toml();
        std::fs::write(&config_path, &default_toml)?;
        println!("✅ Created config.toml at: {}", config_path.display());
        println!("\n📝 Next steps:");
        println!("   1. Start Ollama and pull the models:");
        println!("        ollama pull llama3.2");
        println!("        ollama pull qwen2.5:1.5b");
        println!("   2. Start SearXNG with the JSON format enabled (default: http://localhost:8082)");
        println!("   3. Run: localchat doctor");
        println!("   4. Run: localchat chat\n");
    }

    println!("🎉 Setup complete! Run `localchat chat` to start chatting.\n");

    Ok(())
}
