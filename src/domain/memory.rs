use chrono::Utc;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::domain::{errors::DomainError, ConversationTurn, Result};

/// Append-only log of one conversation's turns.
///
/// Readers always get a copy, so a snapshot stays valid while further turns
/// are appended.
#[derive(Debug, Default)]
pub struct ConversationMemory {
    turns: RwLock<Vec<ConversationTurn>>,
}

impl ConversationMemory {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Vec<ConversationTurn>>> {
        self.turns
            .read()
            .map_err(|e| DomainError::internal(e.to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Vec<ConversationTurn>>> {
        self.turns
            .write()
            .map_err(|e| DomainError::internal(e.to_string()))
    }

    /// Appends a turn and returns its sequence number.
    pub fn append(&self, turn: ConversationTurn) -> Result<u64> {
        validate(&turn)?;
        let mut turns = self.write()?;
        Ok(push(&mut turns, turn))
    }

    /// Appends a question and its answer under a single lock.
    pub fn append_exchange(
        &self,
        user: ConversationTurn,
        assistant: ConversationTurn,
    ) -> Result<(u64, u64)> {
        validate(&user)?;
        validate(&assistant)?;
        let mut turns = self.write()?;
        let first = push(&mut turns, user);
        let second = push(&mut turns, assistant);
        Ok((first, second))
    }

    pub fn history(&self) -> Result<Vec<ConversationTurn>> {
        Ok(self.read()?.clone())
    }

    /// The last `n` turns in chronological order.
    pub fn recent(&self, n: usize) -> Result<Vec<ConversationTurn>> {
        let turns = self.read()?;
        let skip = turns.len().saturating_sub(n);
        Ok(turns[skip..].to_vec())
    }

    pub fn clear(&self) -> Result<()> {
        self.write()?.clear();
        Ok(())
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.read()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.read()?.is_empty())
    }

    /// Flat export, one `"<Role>: <text>\n\n"` block per turn.
    pub fn transcript(&self) -> Result<String> {
        Ok(render_transcript(&self.read()?))
    }
}

pub fn render_transcript(turns: &[ConversationTurn]) -> String {
    turns.iter().map(ConversationTurn::transcript_line).collect()
}

fn validate(turn: &ConversationTurn) -> Result<()> {
    if turn.text.trim().is_empty() {
        return Err(DomainError::invalid_turn(format!(
            "{} turn has no text",
            turn.role.as_str()
        )));
    }
    Ok(())
}

fn push(turns: &mut Vec<ConversationTurn>, mut turn: ConversationTurn) -> u64 {
    let sequence = turns.len() as u64;
    turn.sequence = sequence;
    turn.timestamp = Utc::now();
    turns.push(turn);
    sequence
}
