// User-curated pick queue.
//
// Ordered, deduplicated by player ID. Drafted players are evicted after every
// sync tick that adds picks, so the queue only ever holds available players.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::draft::player::Player;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveDirection {
    Up,
    Down,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PickQueue {
    players: Vec<Player>,
}

impl PickQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore a persisted queue, dropping duplicate IDs.
    pub fn from_players(players: Vec<Player>) -> Self {
        let mut queue = Self::new();
        for p in players {
            queue.enqueue(p);
        }
        queue
    }

    /// Append `player` unless already queued. Returns whether it was added.
    pub fn enqueue(&mut self, player: Player) -> bool {
        if self.contains(&player.id) {
            return false;
        }
        self.players.push(player);
        true
    }

    pub fn dequeue(&mut self, player_id: &str) -> Option<Player> {
        let idx = self.players.iter().position(|p| p.id == player_id)?;
        Some(self.players.remove(idx))
    }

    /// Swap a player with its neighbour. Returns false at either end or when
    /// the player is not queued.
    pub fn reorder(&mut self, player_id: &str, direction: MoveDirection) -> bool {
        let Some(idx) = self.players.iter().position(|p| p.id == player_id) else {
            return false;
        };
        let target = match direction {
            MoveDirection::Up if idx > 0 => idx - 1,
            MoveDirection::Down if idx + 1 < self.players.len() => idx + 1,
            _ => return false,
        };
        self.players.swap(idx, target);
        true
    }

    /// Remove every queued player whose ID is in `drafted`.
    pub fn evict_drafted(&mut self, drafted: &HashSet<String>) -> Vec<Player> {
        let (evicted, kept): (Vec<Player>, Vec<Player>) = std::mem::take(&mut self.players)
            .into_iter()
            .partition(|p| drafted.contains(&p.id));
        self.players = kept;
        evicted
    }

    pub fn head(&self) -> Option<&Player> {
        self.players.first()
    }

    pub fn contains(&self, player_id: &str) -> bool {
        self.players.iter().any(|p| p.id == player_id)
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}
