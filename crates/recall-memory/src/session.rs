//! A single sitting of the dialogue.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Index;

use crate::block::Block;

/// Ordered blocks exchanged in one sitting. Order is conversational order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Session {
    blocks: Vec<Block>,
}

impl Session {
    pub fn new(blocks: Vec<Block>) -> Self {
        Self { blocks }
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn get(&self, index: usize) -> Option<&Block> {
        self.blocks.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Block> {
        self.blocks.iter()
    }

    pub fn push(&mut self, block: Block) {
        self.blocks.push(block);
    }

    pub fn blocks_by_role(&self, role: &str) -> Vec<&Block> {
        self.blocks.iter().filter(|b| b.role() == role).collect()
    }

    /// Plain text blocks, neither code nor tool calls.
    pub fn text_blocks(&self) -> Vec<&Block> {
        self.blocks.iter().filter(|b| b.is_text()).collect()
    }

    pub fn code_blocks(&self) -> Vec<&Block> {
        self.blocks.iter().filter(|b| b.is_code()).collect()
    }

    pub fn tool_calls(&self) -> Vec<&Block> {
        self.blocks.iter().filter(|b| b.is_tool_call()).collect()
    }

    /// Text blocks rendered one per line; this is what summarizers read.
    pub fn text_transcript(&self) -> String {
        self.text_blocks()
            .iter()
            .map(|b| b.to_string())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl From<Vec<Block>> for Session {
    fn from(blocks: Vec<Block>) -> Self {
        Self::new(blocks)
    }
}

impl Index<usize> for Session {
    type Output = Block;

    fn index(&self, index: usize) -> &Self::Output {
        &self.blocks[index]
    }
}

impl<'a> IntoIterator for &'a Session {
    type Item = &'a Block;
    type IntoIter = std::slice::Iter<'a, Block>;

    fn into_iter(self) -> Self::IntoIter {
        self.blocks.iter()
    }
}

/// Full transcript, one block per line.
impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lines: Vec<String> = self.blocks.iter().map(Block::transcript_line).collect();
        f.write_str(&lines.join("\n"))
    }
}
