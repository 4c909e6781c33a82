//! Language feature toggles relevant to call completion.

use bitflags::bitflags;

bitflags! {
    /// The subset of language-version settings this engine consults.
    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    pub struct LanguageFeatures: u8 {
        /// Propagate an enclosing cast expression's target type into the
        /// call's constraint system.
        const EXPECTED_TYPE_FROM_CAST = 1 << 0;
        /// SAM conversion is decided per argument rather than per call.
        const SAM_CONVERSION_PER_ARGUMENT = 1 << 1;
        /// Reject, rather than warn about, a trailing vararg argument after a
        /// SAM-converted one.
        const PROHIBIT_VARARG_AS_ARRAY_AFTER_SAM = 1 << 2;
    }
}

impl Default for LanguageFeatures {
    fn default() -> Self {
        LanguageFeatures::empty()
    }
}
