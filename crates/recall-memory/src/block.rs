//! Conversational units exchanged within a session.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Discriminant of a [`Block`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    Text,
    Code,
    ToolCall,
}

impl BlockKind {
    pub fn as_str(self) -> &'static str {
        match self {
            BlockKind::Text => "text",
            BlockKind::Code => "code",
            BlockKind::ToolCall => "tool_call",
        }
    }
}

/// Plain conversational text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextBlock {
    pub role: String,
    pub content: String,
}

/// A message carrying a code body next to its surrounding text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeBlock {
    pub role: String,
    pub content: String,
    pub code: String,
}

/// A tool invocation together with its result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallBlock {
    pub role: String,
    #[serde(default)]
    pub content: String,
    pub id: String,
    pub name: String,
    pub arguments: String,
    pub response: String,
}

/// One conversational unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Text(TextBlock),
    Code(CodeBlock),
    ToolCall(ToolCallBlock),
}

impl Block {
    pub fn text(role: impl Into<String>, content: impl Into<String>) -> Self {
        Block::Text(TextBlock {
            role: role.into(),
            content: content.into(),
        })
    }

    pub fn code(
        role: impl Into<String>,
        content: impl Into<String>,
        code: impl Into<String>,
    ) -> Self {
        Block::Code(CodeBlock {
            role: role.into(),
            content: content.into(),
            code: code.into(),
        })
    }

    pub fn tool_call(
        role: impl Into<String>,
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: impl Into<String>,
        response: impl Into<String>,
    ) -> Self {
        Block::ToolCall(ToolCallBlock {
            role: role.into(),
            content: String::new(),
            id: id.into(),
            name: name.into(),
            arguments: arguments.into(),
            response: response.into(),
        })
    }

    pub fn kind(&self) -> BlockKind {
        match self {
            Block::Text(_) => BlockKind::Text,
            Block::Code(_) => BlockKind::Code,
            Block::ToolCall(_) => BlockKind::ToolCall,
        }
    }

    pub fn role(&self) -> &str {
        match self {
            Block::Text(b) => &b.role,
            Block::Code(b) => &b.role,
            Block::ToolCall(b) => &b.role,
        }
    }

    pub fn content(&self) -> &str {
        match self {
            Block::Text(b) => &b.content,
            Block::Code(b) => &b.content,
            Block::ToolCall(b) => &b.content,
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Block::Text(_))
    }

    pub fn is_code(&self) -> bool {
        matches!(self, Block::Code(_))
    }

    pub fn is_tool_call(&self) -> bool {
        matches!(self, Block::ToolCall(_))
    }

    /// The payload a memory fragment keeps for this block: the code body for
    /// code blocks, the rendered text otherwise.
    pub fn payload(&self) -> String {
        match self {
            Block::Code(b) => b.code.clone(),
            Block::Text(_) | Block::ToolCall(_) => self.to_string(),
        }
    }

    /// Line used when rendering a whole session transcript.
    ///
    /// Code blocks show their code body in place of the wrapping text.
    pub fn transcript_line(&self) -> String {
        match self {
            Block::Code(b) => format!("{}: {}", b.role, b.code),
            Block::Text(_) | Block::ToolCall(_) => self.to_string(),
        }
    }
}

/// Rendered form submitted for embedding.
impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Block::Text(b) => write!(f, "{}: {}", b.role, b.content),
            Block::Code(b) => write!(f, "{}: {}", b.role, b.content),
            Block::ToolCall(b) => write!(
                f,
                "Tool Call [{}]: {} - {} -> {}",
                b.id, b.name, b.arguments, b.response
            ),
        }
    }
}
