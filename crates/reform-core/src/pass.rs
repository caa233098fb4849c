//! Sequencing of validation passes.

/// Ticket identifying one validation pass.
pub type PassTicket = u64;

/// Orders validation passes by start, not by completion.
///
/// Every pass takes a ticket from [`PassSequence::begin`]. A pass may commit
/// only while it is the most recently started one and nothing newer has
/// committed, so a superseded pass that resolves late never overwrites the
/// state of its successor.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PassSequence {
    started: u64,
    committed: u64,
}

impl PassSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a pass.
    pub fn begin(&mut self) -> PassTicket {
        self.started += 1;
        self.started
    }

    /// Whether the pass may still mutate state.
    pub fn is_current(&self, ticket: PassTicket) -> bool {
        ticket == self.started && self.committed < ticket
    }

    /// Finish a pass. Stale tickets are ignored.
    pub fn commit(&mut self, ticket: PassTicket) -> bool {
        if self.is_current(ticket) {
            self.committed = ticket;
            true
        } else {
            false
        }
    }

    /// Mark every in-flight pass obsolete without starting a new one.
    pub fn invalidate(&mut self) {
        self.started += 1;
        self.committed = self.started;
    }

    /// Whether a started pass has not committed yet.
    pub fn is_validating(&self) -> bool {
        self.committed < self.started
    }

    /// Number of passes started so far, including invalidations.
    pub fn started(&self) -> u64 {
        self.started
    }
}
