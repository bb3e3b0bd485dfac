use std::time::Duration;
use thiserror::Error;

/// Failures surfaced at the generation boundary.
///
/// Every variant leaves the workflow idle, so the operator can simply retry.
#[derive(Error, Debug)]
pub enum WorkflowError {
    /// Generation was requested before a source novel was chosen.
    #[error("no source document selected")]
    MissingSource,

    #[error("block {index} does not exist ({len} blocks generated)")]
    InvalidBlock { index: usize, len: usize },

    #[error("episode numbering exhausted after {0} blocks")]
    EpisodeLimit(usize),

    /// Another backend call is still in flight.
    #[error("a generation is already running")]
    Busy,

    #[error("backend call failed: {0:#}")]
    Backend(anyhow::Error),

    #[error("backend call timed out after {0:?}")]
    Timeout(Duration),

    #[error("failed to export document: {0:#}")]
    Export(anyhow::Error),
}

impl WorkflowError {
    /// One-line message for the operator.
    pub fn user_message(&self) -> String {
        match self {
            WorkflowError::MissingSource => "请选择小说原著作为作业锚点".to_string(),
            WorkflowError::InvalidBlock { index, len } => {
                format!("第 {} 段不存在（当前共 {} 段）", index + 1, len)
            }
            WorkflowError::EpisodeLimit(_) => "集数已达上限，无法继续生成".to_string(),
            WorkflowError::Busy => "已有生成任务在进行中，请稍候".to_string(),
            WorkflowError::Backend(_) | WorkflowError::Timeout(_) => {
                format!("生成失败，请检查 API 状态。({})", self)
            }
            WorkflowError::Export(_) => format!("导出失败。({})", self),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_cause_chain() {
        let err = WorkflowError::Backend(
            anyhow::anyhow!("connection reset").context("Gemini request failed"),
        );
        let text = err.to_string();
        assert!(text.contains("Gemini request failed"));
        assert!(text.contains("connection reset"));
    }

    #[test]
    fn test_user_messages() {
        assert!(WorkflowError::MissingSource.user_message().contains("原著"));
        assert!(WorkflowError::InvalidBlock { index: 4, len: 2 }
            .user_message()
            .contains("第 5 段"));
        assert!(WorkflowError::Timeout(Duration::from_secs(30))
            .user_message()
            .contains("30s"));
    }
}
