//! Assembler-wide options threaded through the analyzer.

/// Options a driving CLI (out of scope for this crate) collects and
/// hands to [`crate::analyzer::Analyzer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AssemblerOptions {
    /// Allow jumps to external symbols to use the 2-instruction short-jump
    /// sequence instead of always falling back to a full 26-bit jump. Off
    /// by default since a short jump to an external symbol assumes the
    /// eventual link target lands within range, which the assembler alone
    /// cannot verify.
    pub short_jumps: bool,
}

impl Default for AssemblerOptions {
    fn default() -> Self {
        AssemblerOptions { short_jumps: false }
    }
}
