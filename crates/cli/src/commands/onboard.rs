//! `tandem onboard` — First-time setup.

use tandem_config::AppConfig;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config_dir = AppConfig::config_dir();
    let config_path = config_dir.join("config.toml");

    println!("Tandem — First-Time Setup");
    println!("=========================\n");

    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir)?;
        println!("✅ Created config directory: {}", config_dir.display());
    } else {
        println!("  Config directory exists: {}", config_dir.display());
    }

    let docs_dir = config_dir.join("documents");
    if !docs_dir.exists() {
        std::fs::create_dir_all(&docs_dir)?;
        println!("✅ Created documents directory: {}", docs_dir.display());
    }

    if config_path.exists() {
        println!("\n⚠️  Config already exists at: {}", config_path.display());
        println!("   Edit it manually or delete and re-run onboard.\n");
        return Ok(());
    }

    let mut config = AppConfig::default();
    config.retrieval.documents_dir = Some(docs_dir.display().to_string());
    std::fs::write(&config_path, config.to_toml())?;

    println!("✅ Created config.toml at: {}", config_path.display());
    println!("\n📝 Next steps:");
    println!("   1. Edit {} and add your API key", config_path.display());
    println!("   2. Put .txt / .md files in {}", docs_dir.display());
    println!("   3. Run: tandem ask \"your question\"\n");

    Ok(())
}
