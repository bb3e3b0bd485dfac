use crate::core::config::Config;
use crate::core::state::{AudienceMode, Category, SourceDocument};
use crate::services::library::Library;
use anyhow::{anyhow, Result};
use inquire::Select;

const NO_REFERENCE: &str = "(不使用参考)";

/// Documents and mode a session works with.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub mode: AudienceMode,
    pub source: SourceDocument,
    pub reference: Option<SourceDocument>,
    pub outline_reference: Option<SourceDocument>,
}

/// First document of each category and the configured mode.
pub fn default_selection(library: &Library, mode: AudienceMode) -> Result<Selection> {
    let first = |category| library.by_category(category).first().map(|d| (*d).clone());
    let source = first(Category::Original).ok_or_else(|| {
        anyhow!(
            "No source novel found. Put .txt or .md files under <input>/{}",
            Category::Original.folder()
        )
    })?;
    Ok(Selection {
        mode,
        source,
        reference: first(Category::LayoutReference),
        outline_reference: first(Category::OutlineReference),
    })
}

/// Asks the operator for source, references and mode. A changed mode is saved back to the config.
pub fn run_setup(config: &mut Config, library: &Library) -> Result<Selection> {
    let originals = library.by_category(Category::Original);
    if originals.is_empty() {
        return default_selection(library, config.generation.mode);
    }

    let source = select_document("选择小说原著:", &originals, 0)?;
    let reference = select_optional(
        "选择剧本排版参考:",
        &library.by_category(Category::LayoutReference),
    )?;
    let outline_reference = select_optional(
        "选择大纲写法参考:",
        &library.by_category(Category::OutlineReference),
    )?;

    let mode = Select::new("选择受众模式:", AudienceMode::ALL.to_vec())
        .with_starting_cursor(mode_index(config.generation.mode))
        .prompt()?;
    if mode != config.generation.mode {
        config.generation.mode = mode;
        config.save()?;
        println!("Configuration saved.");
    }

    Ok(Selection {
        mode,
        source,
        reference,
        outline_reference,
    })
}

fn mode_index(mode: AudienceMode) -> usize {
    AudienceMode::ALL
        .iter()
        .position(|m| *m == mode)
        .unwrap_or(0)
}

/// Menu entries for `documents`, numbered so equal names stay distinct.
pub fn document_options(documents: &[&SourceDocument]) -> Vec<String> {
    documents
        .iter()
        .enumerate()
        .map(|(i, d)| {
            format!(
                "{}. [{}] {} ({} 字)",
                i + 1,
                d.category.label(),
                d.name,
                d.content.chars().count()
            )
        })
        .collect()
}

/// Asks for one of `documents`, starting at index `cursor`.
pub fn select_document(
    prompt: &str,
    documents: &[&SourceDocument],
    cursor: usize,
) -> Result<SourceDocument> {
    let options = document_options(documents);
    let picked = Select::new(prompt, options.clone())
        .with_starting_cursor(cursor.min(options.len().saturating_sub(1)))
        .prompt()?;
    let index = options
        .iter()
        .position(|o| *o == picked)
        .ok_or_else(|| anyhow!("Unknown selection: {}", picked))?;
    Ok(documents[index].clone())
}

fn select_optional(prompt: &str, documents: &[&SourceDocument]) -> Result<Option<SourceDocument>> {
    if documents.is_empty() {
        return Ok(None);
    }
    let mut options = document_options(documents);
    options.push(NO_REFERENCE.to_string());
    let picked = Select::new(prompt, options.clone()).prompt()?;
    Ok(options
        .iter()
        .position(|o| *o == picked)
        .and_then(|i| documents.get(i))
        .map(|d| (*d).clone()))
}
