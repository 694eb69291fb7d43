//! Structured writing style descriptor
//!
//! Every level carries `#[serde(default)]`, so a partial document coming from
//! a form is completed from the default template instead of leaving holes in
//! the serialized prompt.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PromptStyle {
    pub language: LanguageStyle,
    pub structure: StructureStyle,
    pub narrative: NarrativeStyle,
    pub emotion: EmotionStyle,
    pub rhetoric: RhetoricStyle,
    pub rhythm: RhythmStyle,
    pub culture: CultureStyle,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LanguageStyle {
    pub register: String,
    pub vocabulary: String,
    pub sentence_patterns: String,
}

impl Default for LanguageStyle {
    fn default() -> Self {
        Self {
            register: "书面语，兼顾口语的亲切感".to_string(),
            vocabulary: "准确、生动，避免生僻词".to_string(),
            sentence_patterns: "长短句结合".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StructureStyle {
    pub opening: String,
    pub development: String,
    pub closing: String,
    pub paragraphing: String,
}

impl Default for StructureStyle {
    fn default() -> Self {
        Self {
            opening: "以具体场景或细节切入".to_string(),
            development: "层层递进，由表及里".to_string(),
            closing: "呼应开头，留有余味".to_string(),
            paragraphing: "段落短小，每段一个中心".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NarrativeStyle {
    pub perspective: String,
    pub stance: String,
    pub voice: String,
}

impl Default for NarrativeStyle {
    fn default() -> Self {
        Self {
            perspective: "第一人称".to_string(),
            stance: "客观叙述中带有个人思考".to_string(),
            voice: "真诚、克制".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EmotionStyle {
    pub tone: String,
    pub intensity: String,
    pub progression: String,
}

impl Default for EmotionStyle {
    fn default() -> Self {
        Self {
            tone: "温暖".to_string(),
            intensity: "含蓄".to_string(),
            progression: "由淡到浓".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RhetoricStyle {
    pub devices: Vec<String>,
    pub frequency: String,
}

impl Default for RhetoricStyle {
    fn default() -> Self {
        Self {
            devices: vec!["比喻".to_string(), "排比".to_string(), "对比".to_string()],
            frequency: "适度使用，不堆砌".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RhythmStyle {
    pub pace: String,
    pub sentence_length: String,
    pub cadence: String,
}

impl Default for RhythmStyle {
    fn default() -> Self {
        Self {
            pace: "舒缓".to_string(),
            sentence_length: "以中短句为主".to_string(),
            cadence: "注意声韵的起伏".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CultureStyle {
    pub references: Vec<String>,
    pub allusions: String,
}

impl Default for CultureStyle {
    fn default() -> Self {
        Self {
            references: vec!["古典诗词".to_string(), "日常生活".to_string()],
            allusions: "自然融入，不生硬".to_string(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Invalid prompt style: {0}")]
pub struct StyleError(#[from] serde_json::Error);

impl PromptStyle {
    /// Parse a style document, filling every missing field from the defaults.
    ///
    /// Type mismatches (e.g. a number where text is expected) are errors.
    pub fn from_json(text: &str) -> Result<Self, StyleError> {
        Ok(serde_json::from_str(text)?)
    }
}
