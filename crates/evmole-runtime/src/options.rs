//! Analysis options and their engine bitmask.
//!
//! Callers only see [`AnalysisOptions`]; the mask handed across the sandbox
//! boundary is built here and nowhere else.

/// Revision of the host/engine calling convention this crate speaks.
///
/// Revision 1: `contract_info(ptr: i32, len: i32, options: i32) -> i32` with
/// a 32-bit mask of seven toggles.
pub const ABI_REVISION: u32 = 1;

/// Which outputs to request from the engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct AnalysisOptions {
    pub selectors: bool,
    pub arguments: bool,
    pub state_mutability: bool,
    pub storage: bool,
    pub disassemble: bool,
    pub basic_blocks: bool,
    pub control_flow_graph: bool,
}

impl AnalysisOptions {
    /// No outputs requested.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every output the engine can produce.
    pub fn all() -> Self {
        Self {
            selectors: true,
            arguments: true,
            state_mutability: true,
            storage: true,
            disassemble: true,
            basic_blocks: true,
            control_flow_graph: true,
        }
    }

    pub fn with_selectors(mut self) -> Self {
        self.selectors = true;
        self
    }

    /// Argument recovery works per function, so it implies selectors.
    pub fn with_arguments(mut self) -> Self {
        self.selectors = true;
        self.arguments = true;
        self
    }

    /// Implies selectors.
    pub fn with_state_mutability(mut self) -> Self {
        self.selectors = true;
        self.state_mutability = true;
        self
    }

    /// Storage layout recovery needs function arguments, and so selectors.
    pub fn with_storage(mut self) -> Self {
        self.selectors = true;
        self.arguments = true;
        self.storage = true;
        self
    }

    pub fn with_disassemble(mut self) -> Self {
        self.disassemble = true;
        self
    }

    pub fn with_basic_blocks(mut self) -> Self {
        self.basic_blocks = true;
        self
    }

    /// Implies basic blocks.
    pub fn with_control_flow_graph(mut self) -> Self {
        self.basic_blocks = true;
        self.control_flow_graph = true;
        self
    }

    /// True if nothing was requested.
    pub fn is_empty(&self) -> bool {
        self.to_mask().0 == 0
    }

    pub(crate) fn to_mask(self) -> OptionMask {
        let toggles = [
            (self.selectors, OptionMask::SELECTORS),
            (self.arguments, OptionMask::ARGUMENTS),
            (self.state_mutability, OptionMask::STATE_MUTABILITY),
            (self.storage, OptionMask::STORAGE),
            (self.disassemble, OptionMask::DISASSEMBLE),
            (self.basic_blocks, OptionMask::BASIC_BLOCKS),
            (self.control_flow_graph, OptionMask::CONTROL_FLOW_GRAPH),
        ];
        OptionMask(
            toggles
                .iter()
                .filter(|(on, _)| *on)
                .fold(0, |mask, (_, bit)| mask | bit),
        )
    }
}

/// The fixed-width mask passed as the third `contract_info` argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct OptionMask(pub(crate) u32);

impl OptionMask {
    pub(crate) const SELECTORS: u32 = 1 << 0;
    pub(crate) const ARGUMENTS: u32 = 1 << 1;
    pub(crate) const STATE_MUTABILITY: u32 = 1 << 2;
    pub(crate) const STORAGE: u32 = 1 << 3;
    pub(crate) const DISASSEMBLE: u32 = 1 << 4;
    pub(crate) const BASIC_BLOCKS: u32 = 1 << 5;
    pub(crate) const CONTROL_FLOW_GRAPH: u32 = 1 << 6;

    /// Bit pattern as the engine's `i32` parameter.
    pub(crate) fn as_wasm(self) -> i32 {
        self.0 as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bit_assignment_is_pinned() {
        let single = |o: AnalysisOptions| o.to_mask().0;
        let mut o = AnalysisOptions::new();
        o.selectors = true;
        assert_eq!(single(o), 1);
        let mut o = AnalysisOptions::new();
        o.arguments = true;
        assert_eq!(single(o), 2);
        let mut o = AnalysisOptions::new();
        o.state_mutability = true;
        assert_eq!(single(o), 4);
        let mut o = AnalysisOptions::new();
        o.storage = true;
        assert_eq!(single(o), 8);
        let mut o = AnalysisOptions::new();
        o.disassemble = true;
        assert_eq!(single(o), 16);
        let mut o = AnalysisOptions::new();
        o.basic_blocks = true;
        assert_eq!(single(o), 32);
        let mut o = AnalysisOptions::new();
        o.control_flow_graph = true;
        assert_eq!(single(o), 64);
    }

    #[test]
    fn test_unrequested_bits_stay_zero() {
        assert_eq!(AnalysisOptions::new().to_mask().0, 0);
        assert!(AnalysisOptions::new().is_empty());
        assert_eq!(AnalysisOptions::all().to_mask().0, 0x7f);
    }

    #[test]
    fn test_builder_implications() {
        assert_eq!(AnalysisOptions::new().with_arguments().to_mask().0, 0b11);
        assert_eq!(AnalysisOptions::new().with_state_mutability().to_mask().0, 0b101);
        assert_eq!(AnalysisOptions::new().with_storage().to_mask().0, 0b1011);
        assert_eq!(
            AnalysisOptions::new().with_control_flow_graph().to_mask().0,
            0b110_0000
        );
        assert_eq!(AnalysisOptions::new().with_disassemble().to_mask().as_wasm(), 16);
    }
}
