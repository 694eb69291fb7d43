//! Prompt text construction

use super::PromptStyle;
use crate::api::PolishType;

/// Line placed between the style block and the instruction
pub const SECTION_SEPARATOR: &str = "\n\n---\n\n";

/// Keyword separator (full-width comma)
pub const KEYWORD_SEPARATOR: &str = "，";

/// Length phrase used when no word count is given
pub const APPROPRIATE_LENGTH: &str = "适当长度";

/// Build the generation prompt: serialized style, separator, instruction
pub fn format_prompt(style: &PromptStyle, topic: &str, keywords: &[String], word_count: u32) -> String {
    let style_block =
        serde_json::to_string_pretty(style).unwrap_or_else(|_| "{}".to_string());

    let length = if word_count > 0 {
        format!("{}字", word_count)
    } else {
        APPROPRIATE_LENGTH.to_string()
    };

    format!(
        "{}{}请按照以上写作风格，写一篇{}的文章。主题：{}。关键词：{}。",
        style_block,
        SECTION_SEPARATOR,
        length,
        topic,
        keywords.join(KEYWORD_SEPARATOR)
    )
}

/// Build the polishing prompt for the given flavour
pub fn format_polish_prompt(polish_type: PolishType, original_text: &str) -> String {
    let instruction = match polish_type {
        PolishType::Standard => {
            "请润色下面的文字：修正错别字和语病，使表达更通顺流畅，保持原意和段落结构不变。"
        }
        PolishType::Academic => {
            "请以学术写作的标准润色下面的文字：用词严谨客观，逻辑清晰，避免口语化表达，保持原意和段落结构不变。"
        }
        PolishType::Business => {
            "请以商务写作的标准润色下面的文字：简洁专业，重点突出，语气得体，保持原意和段落结构不变。"
        }
        PolishType::Creative => {
            "请以文学创作的标准润色下面的文字：增强画面感和感染力，丰富修辞，保持原意和段落结构不变。"
        }
    };

    format!(
        "{}只输出润色后的正文，不要添加任何解释。{}{}",
        instruction, SECTION_SEPARATOR, original_text
    )
}
