use crate::core::config::{Config, GenerationConfig};
use crate::core::error::WorkflowError;
use crate::core::state::{AudienceMode, EpisodeBlock, EpisodeRange, SourceDocument};
use crate::services::episode::{build_context, next_range};
use crate::services::export;
use crate::services::llm::{ChatRequest, LlmClient};
use crate::services::prompt::{character_request, outline_request, EpisodePrompt};
use crate::services::script::{Classifier, SemanticLine};
use crate::utils::text::sanitize_text;
use log::{debug, info, warn};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Stored when the backend answers with nothing usable.
pub const EMPTY_SCRIPT_PLACEHOLDER: &str = "AI 返回了空内容。";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationState {
    Idle,
    Generating,
}

/// Single-shot reports that run against one document instead of the block sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisKind {
    Characters,
    PlotOutline,
}

impl AnalysisKind {
    pub fn label(&self) -> &'static str {
        match self {
            AnalysisKind::Characters => "人物统计",
            AnalysisKind::PlotOutline => "全篇总结",
        }
    }

    pub fn title(&self, mode: AudienceMode) -> String {
        match self {
            AnalysisKind::Characters => "漫剧全集角色深度统计报表".to_string(),
            AnalysisKind::PlotOutline => format!("{} - 漫剧全集剧情大纲(深度总结版)", mode),
        }
    }

    fn placeholder(&self) -> &'static str {
        match self {
            AnalysisKind::Characters => "未能提取到人物信息。",
            AnalysisKind::PlotOutline => "生成大纲失败。",
        }
    }
}

#[derive(Debug, Default)]
struct Session {
    mode: AudienceMode,
    source: Option<Arc<SourceDocument>>,
    reference: Option<Arc<SourceDocument>>,
}

/// Marks the workflow busy for its lifetime.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Drives episode generation against the backend and owns the block sequence.
///
/// Blocks only ever grow at the end; regeneration rewrites one block's content
/// in place. At most one backend call runs at a time, and a second call made
/// meanwhile is refused with [`WorkflowError::Busy`].
pub struct WorkflowManager {
    settings: GenerationConfig,
    timeout: Option<Duration>,
    llm: Box<dyn LlmClient>,
    classifier: Classifier,
    session: Mutex<Session>,
    blocks: Mutex<Vec<EpisodeBlock>>,
    generating: AtomicBool,
}

impl WorkflowManager {
    pub fn new(config: &Config, llm: Box<dyn LlmClient>) -> Self {
        Self::with_settings(config.generation.clone(), llm)
            .with_timeout(config.llm.timeout_seconds.map(Duration::from_secs))
    }

    pub fn with_settings(settings: GenerationConfig, llm: Box<dyn LlmClient>) -> Self {
        let session = Session {
            mode: settings.mode,
            ..Default::default()
        };
        Self {
            classifier: Classifier::with_speaker_limit(settings.speaker_max_chars),
            settings,
            timeout: None,
            llm,
            session: Mutex::new(session),
            blocks: Mutex::new(Vec::new()),
            generating: AtomicBool::new(false),
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn state(&self) -> GenerationState {
        if self.generating.load(Ordering::Acquire) {
            GenerationState::Generating
        } else {
            GenerationState::Idle
        }
    }

    pub fn mode(&self) -> AudienceMode {
        self.session.lock().mode
    }

    pub fn set_mode(&self, mode: AudienceMode) {
        self.session.lock().mode = mode;
    }

    pub fn select_source(&self, source: Option<SourceDocument>) {
        self.session.lock().source = source.map(Arc::new);
    }

    pub fn select_reference(&self, reference: Option<SourceDocument>) {
        self.session.lock().reference = reference.map(Arc::new);
    }

    /// Snapshot of the block sequence.
    pub fn blocks(&self) -> Vec<EpisodeBlock> {
        self.blocks.lock().clone()
    }

    pub fn block_count(&self) -> usize {
        self.blocks.lock().len()
    }

    /// Classified lines of one block, ready to render.
    pub fn render_block(&self, index: usize) -> Option<Vec<SemanticLine>> {
        let blocks = self.blocks.lock();
        blocks
            .get(index)
            .map(|block| self.classifier.classify_text(&block.content))
    }

    /// `.docx` of every block in order, titled after the current mode.
    pub fn export_script(&self) -> Result<Vec<u8>, WorkflowError> {
        let blocks = self.blocks();
        export::export_script(self.mode(), &blocks)
    }

    /// Generates the next three episodes and appends them.
    pub async fn generate_next(&self) -> Result<EpisodeBlock, WorkflowError> {
        let _in_flight = self.begin()?;
        let (mode, source, reference) = self.selection()?;

        let (target, context) = {
            let blocks = self.blocks.lock();
            let target =
                next_range(blocks.len()).ok_or(WorkflowError::EpisodeLimit(blocks.len()))?;
            (
                target,
                build_context(&blocks, self.settings.context_excerpt_chars),
            )
        };
        info!("Generating episodes {}", target);

        let content = self
            .request_block(mode, target, &context, &source, reference.as_deref())
            .await?;

        let block = EpisodeBlock {
            range: target,
            content,
        };
        self.blocks.lock().push(block.clone());
        info!("Episodes {} committed", target);
        Ok(block)
    }

    /// Rewrites block `index` in place, seeing only the blocks before it.
    pub async fn regenerate(&self, index: usize) -> Result<EpisodeBlock, WorkflowError> {
        let _in_flight = self.begin()?;

        let (target, context) = {
            let blocks = self.blocks.lock();
            let block = blocks.get(index).ok_or(WorkflowError::InvalidBlock {
                index,
                len: blocks.len(),
            })?;
            (
                block.range,
                build_context(&blocks[..index], self.settings.context_excerpt_chars),
            )
        };
        let (mode, source, reference) = self.selection()?;
        info!("Regenerating episodes {}", target);

        let content = self
            .request_block(mode, target, &context, &source, reference.as_deref())
            .await?;

        let mut blocks = self.blocks.lock();
        let len = blocks.len();
        let block = blocks
            .get_mut(index)
            .ok_or(WorkflowError::InvalidBlock { index, len })?;
        block.content = content;
        info!("Episodes {} replaced", target);
        Ok(block.clone())
    }

    /// Runs a one-off report over `target`. The block sequence is untouched.
    pub async fn analyze(
        &self,
        kind: AnalysisKind,
        target: &SourceDocument,
        reference: Option<&SourceDocument>,
    ) -> Result<String, WorkflowError> {
        let _in_flight = self.begin()?;
        let mode = self.mode();
        info!("Running {} on {}", kind.label(), target.name);

        let request = match kind {
            AnalysisKind::Characters => character_request(&target.content),
            AnalysisKind::PlotOutline => outline_request(
                mode,
                &target.content,
                reference.map_or("", |r| r.content.as_str()),
                self.settings.outline_reference_chars,
            ),
        };
        let raw = self.call_backend(&request).await?;
        Ok(finalize(&raw, kind.placeholder()))
    }

    fn begin(&self) -> Result<InFlight<'_>, WorkflowError> {
        self.generating
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| WorkflowError::Busy)?;
        Ok(InFlight(&self.generating))
    }

    fn selection(
        &self,
    ) -> Result<(AudienceMode, Arc<SourceDocument>, Option<Arc<SourceDocument>>), WorkflowError>
    {
        let session = self.session.lock();
        let source = session
            .source
            .clone()
            .ok_or(WorkflowError::MissingSource)?;
        Ok((session.mode, source, session.reference.clone()))
    }

    async fn request_block(
        &self,
        mode: AudienceMode,
        target: EpisodeRange,
        context: &str,
        source: &SourceDocument,
        reference: Option<&SourceDocument>,
    ) -> Result<String, WorkflowError> {
        let request = EpisodePrompt {
            mode,
            target,
            context,
            source: &source.content,
            reference: reference.map_or("", |r| r.content.as_str()),
            reference_chars: self.settings.reference_excerpt_chars,
        }
        .to_request();

        let raw = self.call_backend(&request).await?;
        Ok(finalize(&raw, EMPTY_SCRIPT_PLACEHOLDER))
    }

    async fn call_backend(&self, request: &ChatRequest) -> Result<String, WorkflowError> {
        debug!(
            "Backend request: temperature={} prompt_chars={}",
            request.temperature,
            request.prompt.chars().count()
        );
        let call = self.llm.generate(request);
        let result = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .map_err(|_| WorkflowError::Timeout(limit))?,
            None => call.await,
        };
        result.map_err(|e| {
            warn!("Backend call failed: {:#}", e);
            WorkflowError::Backend(e)
        })
    }
}

fn finalize(raw: &str, placeholder: &str) -> String {
    let cleaned = sanitize_text(raw);
    if cleaned.trim().is_empty() {
        warn!("Backend returned no usable text, storing placeholder");
        placeholder.to_string()
    } else {
        cleaned
    }
}
