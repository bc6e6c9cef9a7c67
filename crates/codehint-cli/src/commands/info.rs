//! Info command - show paths and defaults.

use codehint_ai::{default_model, local_ai_paths, HintConfig, ModelStore};

pub(crate) fn run() -> miette::Result<()> {
    println!("Codehint");
    println!("========");
    println!();
    println!("Version: {}", env!("CARGO_PKG_VERSION"));
    println!();

    println!("Data directory:   {}", local_ai_paths::data_dir().display());
    println!("Models directory: {}", local_ai_paths::models_dir().display());
    println!("Binaries:         {}", local_ai_paths::bin_dir().display());
    println!();
    println!(
        "Server binary:    {}",
        local_ai_paths::llama_server_path().display()
    );
    println!("  Exists: {}", local_ai_paths::llama_server_path().exists());
    println!();

    let store = ModelStore::new();
    let model = default_model();
    println!("Default model:    {}", model.model_id);
    println!("  Installed: {}", store.is_installed(&model.model_file));
    println!();

    let config = HintConfig::from_env();
    println!("Port:             {}", config.port);
    println!("Temperature:      {}", config.temperature);
    println!("Max tokens:       {}", config.max_tokens);
    println!(
        "Start timeout:    {}s",
        config.start_timeout.as_secs()
    );

    Ok(())
}
