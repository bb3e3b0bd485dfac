use crate::core::config::Config;
use crate::core::error::WorkflowError;
use crate::core::io::Storage;
use crate::core::state::SourceDocument;
use crate::services::export::{export_text, save_export, script_title};
use crate::services::library::Library;
use crate::services::setup::{select_document, Selection};
use crate::services::workflow::{AnalysisKind, WorkflowManager};
use crate::utils::progress::SyntheticProgress;
use anyhow::Result;
use inquire::{Confirm, Select};
use log::{info, warn};
use std::fmt;
use std::future::Future;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    GenerateNext,
    Regenerate,
    View,
    ExportScript,
    PlotOutline,
    Characters,
    Quit,
}

impl fmt::Display for MenuAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MenuAction::GenerateNext => "生成下一段 (3 集)",
            MenuAction::Regenerate => "重新生成某一段",
            MenuAction::View => "查看剧本",
            MenuAction::ExportScript => "导出剧本 (.docx)",
            MenuAction::PlotOutline => "全篇剧情总结",
            MenuAction::Characters => "人物统计",
            MenuAction::Quit => "退出",
        };
        f.write_str(label)
    }
}

/// Actions that make sense with `block_count` blocks on hand.
pub fn menu_actions(block_count: usize) -> Vec<MenuAction> {
    let mut actions = vec![MenuAction::GenerateNext];
    if block_count > 0 {
        actions.extend([
            MenuAction::Regenerate,
            MenuAction::View,
            MenuAction::ExportScript,
        ]);
    }
    actions.extend([
        MenuAction::PlotOutline,
        MenuAction::Characters,
        MenuAction::Quit,
    ]);
    actions
}

/// Documents an analysis may target, and the cursor position of `preferred`.
///
/// An empty library offers `preferred` alone.
pub fn analysis_targets<'a>(
    library: &'a Library,
    preferred: &'a SourceDocument,
) -> (Vec<&'a SourceDocument>, usize) {
    let documents: Vec<&SourceDocument> = library.documents().iter().collect();
    if documents.is_empty() {
        return (vec![preferred], 0);
    }
    let cursor = documents
        .iter()
        .position(|d| d.id == preferred.id)
        .unwrap_or(0);
    (documents, cursor)
}

/// Runs a backend-bound call behind a progress bar.
async fn with_progress<T, F>(message: &str, call: F) -> Result<T, WorkflowError>
where
    F: Future<Output = Result<T, WorkflowError>>,
{
    let progress = SyntheticProgress::start(message);
    let result = call.await;
    match &result {
        Ok(_) => progress.finish("完成"),
        Err(e) => progress.abandon(e.user_message()),
    }
    result
}

pub struct Console {
    config: Config,
    storage: Arc<dyn Storage>,
    library: Library,
    workflow: WorkflowManager,
    selection: Selection,
}

impl Console {
    pub fn new(
        config: Config,
        storage: Arc<dyn Storage>,
        library: Library,
        workflow: WorkflowManager,
        selection: Selection,
    ) -> Self {
        workflow.set_mode(selection.mode);
        workflow.select_source(Some(selection.source.clone()));
        workflow.select_reference(selection.reference.clone());
        Self {
            config,
            storage,
            library,
            workflow,
            selection,
        }
    }

    pub fn workflow(&self) -> &WorkflowManager {
        &self.workflow
    }

    pub async fn run(&self) -> Result<()> {
        println!(
            "原著：{}  模式：{}",
            self.selection.source.name, self.selection.mode
        );
        loop {
            let actions = menu_actions(self.workflow.block_count());
            let action = Select::new("请选择操作:", actions).prompt()?;
            let outcome = match action {
                MenuAction::GenerateNext => self.generate_next().await,
                MenuAction::Regenerate => self.regenerate().await,
                MenuAction::View => {
                    self.view();
                    Ok(())
                }
                MenuAction::ExportScript => self.export_script().await.map(|_| ()),
                MenuAction::PlotOutline => self.analyze(AnalysisKind::PlotOutline).await,
                MenuAction::Characters => self.analyze(AnalysisKind::Characters).await,
                MenuAction::Quit => break,
            };
            if let Err(e) = outcome {
                warn!("{}", e);
                println!("{}", e.user_message());
            }
        }
        Ok(())
    }

    /// Generates the configured number of blocks, then exports whatever was produced.
    pub async fn run_unattended(&self) -> Result<Option<String>> {
        let target = self.config.generation.unattended_blocks;
        info!("Unattended run: {} block(s) from {}", target, self.selection.source.name);
        for _ in 0..target {
            if let Err(e) = self.generate_next().await {
                println!("{}", e.user_message());
                break;
            }
        }
        if self.workflow.block_count() == 0 {
            println!("没有可导出的剧本。");
            return Ok(None);
        }
        Ok(Some(self.export_script().await?))
    }

    async fn generate_next(&self) -> Result<(), WorkflowError> {
        let message = format!("正在生成第 {} 段", self.workflow.block_count() + 1);
        let block = with_progress(&message, self.workflow.generate_next()).await?;
        println!("第 {} 集已生成。", block.range);
        Ok(())
    }

    async fn regenerate(&self) -> Result<(), WorkflowError> {
        let options: Vec<String> = self
            .workflow
            .blocks()
            .iter()
            .map(|b| format!("第 {} 集", b.range))
            .collect();
        let picked = match Select::new("选择要重新生成的段落:", options.clone()).prompt() {
            Ok(picked) => picked,
            Err(e) => {
                warn!("Selection cancelled: {}", e);
                return Ok(());
            }
        };
        let index = options.iter().position(|o| *o == picked).unwrap_or(0);

        let block = with_progress("正在重新生成", self.workflow.regenerate(index)).await?;
        println!("第 {} 集已重写。", block.range);
        Ok(())
    }

    fn view(&self) {
        for (index, block) in self.workflow.blocks().iter().enumerate() {
            println!("\n======== 第 {} 集 ========", block.range);
            for line in self.workflow.render_block(index).unwrap_or_default() {
                println!("{}", line);
            }
        }
    }

    async fn export_script(&self) -> Result<String, WorkflowError> {
        let bytes = self.workflow.export_script()?;
        let title = script_title(self.workflow.mode());
        let path = save_export(
            self.storage.as_ref(),
            &self.config.output_folder,
            &title,
            &bytes,
        )
        .await?;
        println!("已导出：{}", path);
        Ok(path)
    }

    async fn analyze(&self, kind: AnalysisKind) -> Result<(), WorkflowError> {
        let (candidates, cursor) = analysis_targets(&self.library, &self.selection.source);
        let prompt = format!("选择{}目标:", kind.label());
        let target = match select_document(&prompt, &candidates, cursor) {
            Ok(target) => target,
            Err(e) => {
                warn!("Selection cancelled: {:#}", e);
                return Ok(());
            }
        };
        let reference = match kind {
            AnalysisKind::PlotOutline => self.selection.outline_reference.as_ref(),
            AnalysisKind::Characters => None,
        };
        let message = format!("正在{}", kind.label());
        let result = with_progress(&message, self.workflow.analyze(kind, &target, reference)).await?;
        println!("\n{}\n", result);

        let wants_export = Confirm::new("导出为 Word 文档?")
            .with_default(false)
            .prompt()
            .unwrap_or(false);
        if wants_export {
            let title = kind.title(self.workflow.mode());
            let bytes = export_text(&title, &result)?;
            let path = save_export(
                self.storage.as_ref(),
                &self.config.output_folder,
                &title,
                &bytes,
            )
            .await?;
            println!("已导出：{}", path);
        }
        Ok(())
    }
}
