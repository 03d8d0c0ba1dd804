const OPTIMIZE_INSTRUCTION: &str = "optimize this text for clarity, accuracy, and professionalism";
const EXPAND_INSTRUCTION: &str =
    "expand this text with more detail while preserving its core meaning";
const CONTRACT_INSTRUCTION: &str =
    "condense this text, keeping core information and removing redundancy";

/// Canned workflow instructions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Preset {
    Optimize,
    Expand,
    Contract,
}

impl Preset {
    pub const ALL: [Preset; 3] = [Preset::Optimize, Preset::Expand, Preset::Contract];

    pub fn instruction(&self) -> &'static str {
        match self {
            Preset::Optimize => OPTIMIZE_INSTRUCTION,
            Preset::Expand => EXPAND_INSTRUCTION,
            Preset::Contract => CONTRACT_INSTRUCTION,
        }
    }

    /// Field name the editor front end reads the result from.
    pub fn output_field(&self) -> &'static str {
        match self {
            Preset::Optimize => "rewritten_text",
            Preset::Expand => "expanded_text",
            Preset::Contract => "contracted_text",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instructions_are_distinct() {
        let [a, b, c] = Preset::ALL.map(|p| p.instruction());
        assert_ne!(a, b);
        assert_ne!(b, c);
        assert_ne!(a, c);
    }

    #[test]
    fn output_fields() {
        assert_eq!(Preset::Optimize.output_field(), "rewritten_text");
        assert_eq!(Preset::Expand.output_field(), "expanded_text");
        assert_eq!(Preset::Contract.output_field(), "contracted_text");
    }
}
