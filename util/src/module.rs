//! Interface for cyclic processing modules
//!
//! A module is initialised once and then processed every cycle by an executive. Guidance in
//! `guide_exec` implements this so it can be driven without knowing where its inputs came from.

// ---------------------------------------------------------------------------
// MODULE STATE
// ---------------------------------------------------------------------------

/// State of a cyclic module.
pub trait State {
    /// Configuration the module is initialised with
    type InitData;
    type InitError;

    /// Everything the module consumes in one cycle
    type InputData;
    /// Command produced each cycle
    type OutputData;
    /// Diagnostics produced each cycle
    type StatusReport;
    type ProcError;

    /// (Re)initialise the module, returning it to its starting state.
    ///
    /// Rejected configuration leaves the module as it was.
    fn init(&mut self, init_data: Self::InitData) -> Result<(), Self::InitError>;

    /// Process one cycle, producing the output and a status report.
    fn proc(&mut self, input_data: &Self::InputData)
        -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError>;
}
