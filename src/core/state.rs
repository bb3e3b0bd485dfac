use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Knowledge-base buckets an operator files source documents under.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// 原著剧本: the novel being adapted.
    Original,
    /// 剧情脚本排版参考: a finished script whose layout and pacing we imitate.
    LayoutReference,
    /// 剧情大纲写法参考: an outline whose writing style we imitate.
    OutlineReference,
}

impl Category {
    pub const ALL: [Category; 3] = [
        Category::Original,
        Category::LayoutReference,
        Category::OutlineReference,
    ];

    /// Sub-folder of the input folder holding this category.
    pub fn folder(&self) -> &'static str {
        match self {
            Category::Original => "original",
            Category::LayoutReference => "layout_reference",
            Category::OutlineReference => "outline_reference",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Category::Original => "原著剧本",
            Category::LayoutReference => "剧情脚本排版参考",
            Category::OutlineReference => "剧情大纲写法参考",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SourceDocument {
    pub id: String,
    pub name: String,
    pub category: Category,
    pub content: String,
    /// Unix millis of the file's modification time, 0 when unknown.
    pub uploaded_at: u64,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AudienceMode {
    #[default]
    Male,
    Female,
}

impl AudienceMode {
    pub const ALL: [AudienceMode; 2] = [AudienceMode::Male, AudienceMode::Female];

    pub fn label(&self) -> &'static str {
        match self {
            AudienceMode::Male => "男频模式",
            AudienceMode::Female => "女频模式",
        }
    }
}

impl fmt::Display for AudienceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Closed interval of episode numbers, rendered as `"start-end"`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EpisodeRange {
    pub start: u32,
    pub end: u32,
}

impl EpisodeRange {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// Number of episodes covered.
    pub fn width(&self) -> u32 {
        self.end - self.start + 1
    }
}

impl fmt::Display for EpisodeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

impl FromStr for EpisodeRange {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        let (start, end) = s
            .split_once('-')
            .ok_or_else(|| anyhow::anyhow!("Episode range must look like 'start-end': {}", s))?;
        let start: u32 = start.trim().parse()?;
        let end: u32 = end.trim().parse()?;
        if start == 0 || end < start {
            anyhow::bail!("Invalid episode range: {}", s);
        }
        Ok(Self { start, end })
    }
}

/// One generated unit of script covering a contiguous run of episodes.
#[derive(Clone, Debug, PartialEq)]
pub struct EpisodeBlock {
    pub range: EpisodeRange,
    pub content: String,
}
