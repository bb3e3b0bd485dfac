use crate::utils::text::{sanitize, split_lines};
use log::trace;
use std::fmt;

/// Prefixes shorter than this (in characters) before a colon are read as a speaker name.
pub const DEFAULT_SPEAKER_MAX_CHARS: usize = 15;

const EPISODE_MARKER: &str = "第";
const EPISODE_SUFFIX: &str = "集";
const HOOK_MARKER: &str = "本集钩子";
const SUSPENSE_MARKER: &str = "悬念";
const SCENE_MARKER: &str = "场景";
const ACTION_MARKER: &str = "动作";
const FULLWIDTH_COLON: char = '：';
const HALFWIDTH_COLON: char = ':';
const BRACKET_OPENERS: [char; 2] = ['[', '（'];

/// Rendering unit for one line of generated script.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SemanticLine {
    Spacer,
    EpisodeHeader(String),
    Hook(String),
    Scene(String),
    Dialogue { speaker: String, line: String },
    StageDirection(String),
    Narration(String),
}

impl SemanticLine {
    pub fn kind(&self) -> &'static str {
        match self {
            SemanticLine::Spacer => "spacer",
            SemanticLine::EpisodeHeader(_) => "episode_header",
            SemanticLine::Hook(_) => "hook",
            SemanticLine::Scene(_) => "scene",
            SemanticLine::Dialogue { .. } => "dialogue",
            SemanticLine::StageDirection(_) => "stage_direction",
            SemanticLine::Narration(_) => "narration",
        }
    }
}

impl fmt::Display for SemanticLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SemanticLine::Spacer => Ok(()),
            SemanticLine::EpisodeHeader(text) => write!(f, "\n━━ {} ━━", text),
            SemanticLine::Hook(text) => write!(f, "⚡ {}", text),
            SemanticLine::Scene(text) => write!(f, "🎬 {}", text),
            SemanticLine::Dialogue { speaker, line } => write!(f, "    【{}】{}", speaker, line),
            SemanticLine::StageDirection(text) => write!(f, "      {}", text),
            SemanticLine::Narration(text) => write!(f, "    {}", text),
        }
    }
}

/// A predicate/constructor pair. Both sides see the sanitized line.
struct Rule {
    name: &'static str,
    matches: fn(&Classifier, &str) -> bool,
    build: fn(&Classifier, &str) -> SemanticLine,
}

/// Evaluated top to bottom, first match wins. Narration is the fallback.
const RULES: [Rule; 6] = [
    Rule {
        name: "spacer",
        matches: |_, s| s.is_empty(),
        build: |_, _| SemanticLine::Spacer,
    },
    Rule {
        name: "episode_header",
        matches: |_, s| s.starts_with(EPISODE_MARKER) && s.contains(EPISODE_SUFFIX),
        build: |_, s| SemanticLine::EpisodeHeader(s.to_string()),
    },
    Rule {
        name: "hook",
        matches: |_, s| s.starts_with(HOOK_MARKER) || s.contains(SUSPENSE_MARKER),
        build: |_, s| SemanticLine::Hook(s.to_string()),
    },
    Rule {
        name: "scene",
        matches: |_, s| s.starts_with(SCENE_MARKER),
        build: |_, s| SemanticLine::Scene(s.to_string()),
    },
    Rule {
        name: "dialogue",
        matches: |c, s| c.split_dialogue(s).is_some(),
        build: |c, s| match c.split_dialogue(s) {
            Some((speaker, line)) => SemanticLine::Dialogue {
                speaker: speaker.to_string(),
                line: line.to_string(),
            },
            None => SemanticLine::Narration(s.to_string()),
        },
    },
    Rule {
        name: "stage_direction",
        matches: |_, s| s.starts_with(ACTION_MARKER) || s.starts_with(BRACKET_OPENERS),
        build: |_, s| SemanticLine::StageDirection(s.to_string()),
    },
];

#[derive(Clone, Copy, Debug)]
pub struct Classifier {
    speaker_max_chars: usize,
}

impl Default for Classifier {
    fn default() -> Self {
        Self {
            speaker_max_chars: DEFAULT_SPEAKER_MAX_CHARS,
        }
    }
}

impl Classifier {
    pub fn with_speaker_limit(speaker_max_chars: usize) -> Self {
        Self { speaker_max_chars }
    }

    /// Classifies one raw line. Total: every input maps to some variant.
    pub fn classify(&self, raw: &str) -> SemanticLine {
        let line = sanitize(raw);
        for rule in &RULES {
            if (rule.matches)(self, &line) {
                trace!("{} <- {:?}", rule.name, line);
                return (rule.build)(self, &line);
            }
        }
        SemanticLine::Narration(line)
    }

    pub fn classify_text(&self, text: &str) -> Vec<SemanticLine> {
        split_lines(text).map(|line| self.classify(line)).collect()
    }

    // The full-width colon wins whenever present; everything after the first
    // separator is the spoken line, later separators included.
    fn split_dialogue<'a>(&self, line: &'a str) -> Option<(&'a str, &'a str)> {
        let sep = if line.contains(FULLWIDTH_COLON) {
            FULLWIDTH_COLON
        } else if line.contains(HALFWIDTH_COLON) {
            HALFWIDTH_COLON
        } else {
            return None;
        };
        let (speaker, rest) = line.split_once(sep)?;
        let speaker_len = speaker.chars().count();
        if speaker_len > 0 && speaker_len < self.speaker_max_chars {
            Some((speaker, rest))
        } else {
            None
        }
    }
}

/// Classifies with the default speaker limit.
pub fn classify(raw: &str) -> SemanticLine {
    Classifier::default().classify(raw)
}
