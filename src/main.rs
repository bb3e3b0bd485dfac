use anyhow::Result;
use novel2script::core::config::Config;
use novel2script::core::io::{NativeStorage, Storage};
use novel2script::services::console::Console;
use novel2script::services::library::Library;
use novel2script::services::llm::create_llm;
use novel2script::services::setup::{default_selection, run_setup};
use novel2script::services::workflow::WorkflowManager;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    // 1. Load Config
    let mut config = match Config::load() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            eprintln!("Please ensure 'config.yml' exists with valid LLM settings.");
            return Err(e);
        }
    };

    config.ensure_directories()?;

    // 2. Knowledge base
    let storage: Arc<dyn Storage> = Arc::new(NativeStorage::new());
    let library = Library::load(storage.as_ref(), &config.input_folder).await?;

    // 3. Pick source, references and mode
    let selection = if config.unattended {
        default_selection(&library, config.generation.mode)?
    } else {
        run_setup(&mut config, &library)?
    };

    // 4. Initialize LLM
    let llm = create_llm(&config.llm)?;

    // 5. Run
    let workflow = WorkflowManager::new(&config, llm);
    let unattended = config.unattended;
    let console = Console::new(config, storage, library, workflow, selection);
    if unattended {
        console.run_unattended().await?;
    } else {
        console.run().await?;
    }

    Ok(())
}
