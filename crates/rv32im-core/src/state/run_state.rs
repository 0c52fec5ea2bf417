use crate::Fault;

/// Execution-state machine for the driving loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum RunState {
    /// Ready to execute the next instruction.
    #[default]
    Running,
    /// Program executed its halt instruction. Terminal.
    Halted,
    /// A fault ended the run. Terminal.
    FaultLatched(Fault),
}

impl RunState {
    /// Returns the currently latched fault, if this state is fault-latched.
    #[must_use]
    pub const fn latched_fault(self) -> Option<Fault> {
        match self {
            Self::FaultLatched(fault) => Some(fault),
            Self::Running | Self::Halted => None,
        }
    }

    /// Returns `true` once no further instruction can execute.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Running)
    }
}

#[cfg(test)]
mod tests {
    use super::RunState;
    use crate::{DecodeError, Fault};

    #[test]
    fn run_state_default_is_running() {
        assert_eq!(RunState::default(), RunState::Running);
        assert!(!RunState::Running.is_terminal());
    }

    #[test]
    fn latched_fault_accessor_reports_only_fault_latched_variant() {
        let fault = Fault::from(DecodeError::UnknownEncoding {
            address: 0x8000_0000,
            word: 0,
        });

        assert_eq!(RunState::Running.latched_fault(), None);
        assert_eq!(RunState::Halted.latched_fault(), None);
        assert_eq!(RunState::FaultLatched(fault).latched_fault(), Some(fault));
        assert!(RunState::Halted.is_terminal());
        assert!(RunState::FaultLatched(fault).is_terminal());
    }
}
