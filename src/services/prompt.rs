use crate::core::state::{AudienceMode, EpisodeRange};
use crate::services::llm::ChatRequest;
use crate::utils::text::truncate_chars;

pub const DEFAULT_REFERENCE_EXCERPT_CHARS: usize = 1000;
pub const DEFAULT_OUTLINE_REFERENCE_CHARS: usize = 2000;

const SCRIPT_REFERENCE_FALLBACK: &str = "2025年动漫节奏";
const OUTLINE_REFERENCE_FALLBACK: &str = "2025年漫剧节奏";

const SCRIPT_TEMPERATURE: f32 = 0.8;
const SCRIPT_THINKING_BUDGET: u32 = 2500;
const OUTLINE_TEMPERATURE: f32 = 0.75;
const OUTLINE_THINKING_BUDGET: u32 = 5000;
const CHARACTER_TEMPERATURE: f32 = 0.1;
const CHARACTER_THINKING_BUDGET: u32 = 2000;

/// Shared system instruction for script and outline work.
pub const ADAPTATION_SYSTEM_PROMPT: &str = "你是一位漫剧（2D动漫剧本）改编专家，负责把网络小说改编成信息密度极高的动漫剧情脚本。\n\
\n\
排版要求（最高优先级）：\n\
1. 正文中不得出现 ***、===、~~~、###、> 之类的 Markdown 装饰符。\n\
2. 除标准中文标点和必要的结构标记（第X集、场景、动作、角色名）外，不输出任何特殊字符。\n\
3. 直接输出内容本身，不要附带 Markdown 源码标记。\n\
\n\
改编原则：\n\
1. 节奏：每集 1-3 分钟，每集 2-3 个冲突爽点或悬念钩子；全剧建议 60-100 集，前 9 集必须极度紧凑。\n\
2. 因果锚定：核对动作的发起者、接收者与道具，不得改变物理逻辑。\n\
3. 台词：反派要有居高临下的压迫感，主角回击简练、冷静、一针见血；删除所有拟声词，台词必须适合配音。\n\
4. 忠于原著：不做任何文学性加戏，内容以原著知识库为准。\n\
\n\
输出格式：\n\
[集数]\n\
[本集钩子]\n\
[场景描述]\n\
[动作描述]\n\
[角色名]：[台词]";

const CHARACTER_SYSTEM_PROMPT: &str = "你是一位专业剧本分析师。直接输出文字内容，不要带 Markdown 语法标记。";

fn reference_excerpt<'a>(reference: &'a str, max_chars: usize, fallback: &'a str) -> &'a str {
    if reference.trim().is_empty() {
        fallback
    } else {
        truncate_chars(reference, max_chars)
    }
}

/// Inputs for one episode-block request.
#[derive(Debug, Clone, Copy)]
pub struct EpisodePrompt<'a> {
    pub mode: AudienceMode,
    pub target: EpisodeRange,
    pub context: &'a str,
    pub source: &'a str,
    pub reference: &'a str,
    pub reference_chars: usize,
}

impl EpisodePrompt<'_> {
    pub fn render(&self) -> String {
        format!(
            "当前模式：{mode}\n\
            目标改编：第 {target} 集\n\
            \n\
            强制要求：\n\
            1. 不得使用 #、*、>、- 等 Markdown 符号装饰。\n\
            2. 直接按以下格式输出：\n\
            \n\
            第X集：[标题]\n\
            本集钩子：1.xxx 2.xxx\n\
            \n\
            场景：[时间/地点]\n\
            动作：[描述]\n\
            角色名：台词内容\n\
            \n\
            （循环此结构）\n\
            \n\
            3. 冲突/悬念：每集必须包含 2-3 个明确钩子。\n\
            4. 物理锚定：严格遵守因果逻辑。\n\
            \n\
            参考风格：\n{reference}\n\
            \n\
            原著小说：\n{source}\n\
            \n\
            {context}\n\
            \n\
            请输出第 {target} 集的纯净版剧本。",
            mode = self.mode,
            target = self.target,
            reference = reference_excerpt(
                self.reference,
                self.reference_chars,
                SCRIPT_REFERENCE_FALLBACK
            ),
            source = self.source,
            context = self.context,
        )
    }

    pub fn to_request(&self) -> ChatRequest {
        ChatRequest {
            system: ADAPTATION_SYSTEM_PROMPT.to_string(),
            prompt: self.render(),
            temperature: SCRIPT_TEMPERATURE,
            thinking_budget: Some(SCRIPT_THINKING_BUDGET),
        }
    }
}

/// Whole-story outline of 2000-3000 characters.
pub fn outline_request(
    mode: AudienceMode,
    source: &str,
    reference: &str,
    reference_chars: usize,
) -> ChatRequest {
    let prompt = format!(
        "任务：生成 2000-3000 字全集剧情深度总结（{mode}）\n\
        \n\
        要求：\n\
        1. 不使用任何特殊装饰符号，保持排版纯净。\n\
        2. 分段清晰：核心故事核、世界观锚定、前瞻期、爆发期、巅峰收官。\n\
        3. 每段详实有力，总字数在 2000-3000 字之间。\n\
        \n\
        参考风格：\n{reference}\n\
        \n\
        原著小说：\n{source}",
        mode = mode,
        reference = reference_excerpt(reference, reference_chars, OUTLINE_REFERENCE_FALLBACK),
        source = source,
    );
    ChatRequest {
        system: ADAPTATION_SYSTEM_PROMPT.to_string(),
        prompt,
        temperature: OUTLINE_TEMPERATURE,
        thinking_budget: Some(OUTLINE_THINKING_BUDGET),
    }
}

/// Character census over a script or novel.
pub fn character_request(source: &str) -> ChatRequest {
    let prompt = format!(
        "任务：全集人物检索与统计（纯净版）\n\
        \n\
        要求：\n\
        1. 不使用 Markdown 符号装饰。\n\
        2. 字段：姓名、性别、年龄、身份、性格、形象、关系、出现集数。\n\
        \n\
        检索源：\n{}",
        source
    );
    ChatRequest {
        system: CHARACTER_SYSTEM_PROMPT.to_string(),
        prompt,
        temperature: CHARACTER_TEMPERATURE,
        thinking_budget: Some(CHARACTER_THINKING_BUDGET),
    }
}
