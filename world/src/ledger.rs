//! Player resource counters.

/// Health and gold held by the player.
///
/// Health saturates at zero and zero is terminal for the session. Gold only
/// ever grows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Ledger {
    health: u32,
    gold: u64,
}

/// Before/after pair describing a single ledger mutation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Change<T> {
    pub(crate) from: T,
    pub(crate) to: T,
}

impl<T: PartialEq> Change<T> {
    pub(crate) fn is_noop(&self) -> bool {
        self.from == self.to
    }
}

impl Ledger {
    pub(crate) const fn new(health: u32, gold: u64) -> Self {
        Self { health, gold }
    }

    pub(crate) const fn health(&self) -> u32 {
        self.health
    }

    pub(crate) const fn gold(&self) -> u64 {
        self.gold
    }

    pub(crate) fn apply_route_completion_penalty(&mut self) -> Change<u32> {
        let from = self.health;
        self.health = self.health.saturating_sub(1);
        Change {
            from,
            to: self.health,
        }
    }

    pub(crate) fn apply_kill_reward(&mut self) -> Change<u64> {
        let from = self.gold;
        self.gold = self.gold.saturating_add(1);
        Change { from, to: self.gold }
    }
}
