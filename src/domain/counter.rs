// Incident counter domain model

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterAction {
    Increment,
    Decrement,
    Reset,
}

impl CounterAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Increment => "increment",
            Self::Decrement => "decrement",
            Self::Reset => "reset",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IncidentCounter {
    pub incidents: u64,
}

impl IncidentCounter {
    pub fn new(incidents: u64) -> Self {
        Self { incidents }
    }

    /// Value after applying `action`, or `None` when the action changes
    /// nothing and no write should be issued.
    pub fn next_value(&self, action: CounterAction) -> Option<u64> {
        match action {
            CounterAction::Increment => Some(self.incidents.saturating_add(1)),
            CounterAction::Decrement if self.incidents == 0 => None,
            CounterAction::Decrement => Some(self.incidents - 1),
            CounterAction::Reset => Some(0),
        }
    }
}

/// Result of a counter mutation as reported back to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterOutcome {
    pub incidents: u64,
    pub action: CounterAction,
    pub changed: bool,
}
