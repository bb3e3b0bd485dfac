use crate::core::state::{EpisodeBlock, EpisodeRange};
use crate::utils::text::truncate_chars;

pub const EPISODES_PER_BLOCK: u32 = 3;

/// Characters of each prior block carried into the continuity context.
pub const DEFAULT_CONTEXT_EXCERPT_CHARS: usize = 500;

/// Context handed to the backend when nothing has been generated yet.
pub const FIRST_INSTALLMENT: &str = "本季首播。";

const CONTEXT_HEADER: &str = "前序剧集背景（必须遵守因果律）：";

/// Range for the block that follows `existing_blocks` already generated ones.
///
/// `None` once episode numbers no longer fit in a `u32`.
pub fn next_range(existing_blocks: usize) -> Option<EpisodeRange> {
    let first = u32::try_from(existing_blocks)
        .ok()?
        .checked_mul(EPISODES_PER_BLOCK)?
        .checked_add(1)?;
    let last = first.checked_add(EPISODES_PER_BLOCK - 1)?;
    Some(EpisodeRange::new(first, last))
}

/// Causal continuity context from the blocks preceding the target.
///
/// Each block contributes its range label and the first `excerpt_chars`
/// characters of its content. This is a hard cut, not a summary.
pub fn build_context(prior_blocks: &[EpisodeBlock], excerpt_chars: usize) -> String {
    if prior_blocks.is_empty() {
        return FIRST_INSTALLMENT.to_string();
    }

    let excerpts = prior_blocks
        .iter()
        .map(|block| {
            format!(
                "第{}集内容：\n{}...",
                block.range,
                truncate_chars(&block.content, excerpt_chars)
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    format!("{}\n{}", CONTEXT_HEADER, excerpts)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(range: &str, content: &str) -> EpisodeBlock {
        EpisodeBlock {
            range: range.parse().unwrap(),
            content: content.to_string(),
        }
    }

    #[test]
    fn test_next_range_first_blocks() {
        assert_eq!(next_range(0).unwrap().to_string(), "1-3");
        assert_eq!(next_range(1).unwrap().to_string(), "4-6");
        assert_eq!(next_range(2).unwrap().to_string(), "7-9");
    }

    #[test]
    fn test_next_range_is_contiguous_and_fixed_width() {
        for n in 0..200usize {
            let current = next_range(n).unwrap();
            let following = next_range(n + 1).unwrap();
            assert_eq!(current.start, 3 * n as u32 + 1);
            assert_eq!(current.width(), 3);
            assert_eq!(current.end + 1, following.start);
        }
    }

    #[test]
    fn test_next_range_stops_at_u32_limit() {
        let last = next_range(1_431_655_764).unwrap();
        assert_eq!(last.end, u32::MAX);
        assert!(next_range(1_431_655_765).is_none());
        assert!(next_range(usize::MAX).is_none());
    }

    #[test]
    fn test_build_context_empty_is_sentinel() {
        assert_eq!(build_context(&[], DEFAULT_CONTEXT_EXCERPT_CHARS), FIRST_INSTALLMENT);
    }

    #[test]
    fn test_build_context_labels_and_separates_blocks() {
        let blocks = vec![block("1-3", "林渊醒来。"), block("4-6", "反派登场。")];
        let context = build_context(&blocks, DEFAULT_CONTEXT_EXCERPT_CHARS);

        assert!(context.starts_with(CONTEXT_HEADER));
        assert!(context.contains("第1-3集内容：\n林渊醒来。..."));
        assert!(context.contains("第4-6集内容：\n反派登场。..."));
        assert!(context.contains("林渊醒来。...\n\n第4-6集"));
        assert!(context.find("1-3").unwrap() < context.find("4-6").unwrap());
    }

    #[test]
    fn test_build_context_truncates_each_excerpt() {
        let long = "字".repeat(800);
        let blocks = vec![block("1-3", &long), block("4-6", "短")];
        let context = build_context(&blocks, DEFAULT_CONTEXT_EXCERPT_CHARS);

        let first = context
            .split("第1-3集内容：\n")
            .nth(1)
            .unwrap()
            .split("...")
            .next()
            .unwrap();
        assert_eq!(first.chars().count(), 500);
        assert!(!context.contains(&"字".repeat(501)));
    }
}
