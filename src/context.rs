use crate::error::RollError;

/// Budget and cancellation for a single `roll()` call. Every new die draw,
/// including rerolls and explosions, must call [`RollContext::count_roll`]
/// first; this is the sole termination witness for the open-ended
/// reroll-while/explode-while loops in the operator algebra.
#[derive(Debug, Clone)]
pub struct RollContext {
    max_rolls: usize,
    rolls: usize,
}

impl RollContext {
    pub const DEFAULT_MAX_ROLLS: usize = 1000;

    pub fn new(max_rolls: usize) -> Self {
        RollContext { max_rolls, rolls: 0 }
    }

    pub fn rolls(&self) -> usize {
        self.rolls
    }

    pub fn max_rolls(&self) -> usize {
        self.max_rolls
    }

    /// Resets the counter; called at the start of every `roll()`.
    pub fn reset(&mut self) {
        self.rolls = 0;
    }

    /// Registers `n` new die draws, raising `TooManyRolls` if the budget is
    /// exhausted.
    pub fn count_roll(&mut self, n: usize) -> Result<(), RollError> {
        self.rolls += n;
        if self.rolls > self.max_rolls {
            tracing::debug!(rolls = self.rolls, max = self.max_rolls, "roll budget exceeded");
            return Err(RollError::TooManyRolls);
        }
        Ok(())
    }
}

impl Default for RollContext {
    fn default() -> Self {
        RollContext::new(Self::DEFAULT_MAX_ROLLS)
    }
}
