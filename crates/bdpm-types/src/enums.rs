//! BDPM enumeration types.

/// Role of a medication within a generic group.
///
/// Coded as a small integer in the fourth column of `CIS_GENER_bdpm.txt`.
///
/// # Examples
///
/// ```
/// use bdpm_types::GenericType;
///
/// assert_eq!(GenericType::from_code(0), Some(GenericType::Princeps));
/// assert_eq!(GenericType::from_code(3), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GenericType {
    /// The reference medication of the group.
    Princeps,
    /// A generic of the princeps.
    Generic,
    /// Generic by posology complementarity.
    Complementary,
    /// Substitutable generic.
    Substitutable,
}

impl GenericType {
    /// Code for a princeps.
    pub const PRINCEPS_CODE: u8 = 0;
    /// Code for a generic.
    pub const GENERIC_CODE: u8 = 1;
    /// Code for a posology-complementary generic.
    pub const COMPLEMENTARY_CODE: u8 = 2;
    /// Code for a substitutable generic.
    pub const SUBSTITUTABLE_CODE: u8 = 4;

    /// Creates a GenericType from its dataset code.
    ///
    /// Returns `None` for codes the dataset does not define.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            Self::PRINCEPS_CODE => Some(Self::Princeps),
            Self::GENERIC_CODE => Some(Self::Generic),
            Self::COMPLEMENTARY_CODE => Some(Self::Complementary),
            Self::SUBSTITUTABLE_CODE => Some(Self::Substitutable),
            _ => None,
        }
    }

    /// Returns the dataset code for this type.
    pub fn to_code(self) -> u8 {
        match self {
            Self::Princeps => Self::PRINCEPS_CODE,
            Self::Generic => Self::GENERIC_CODE,
            Self::Complementary => Self::COMPLEMENTARY_CODE,
            Self::Substitutable => Self::SUBSTITUTABLE_CODE,
        }
    }

    /// Display label as used by the public database.
    pub fn label(self) -> &'static str {
        match self {
            Self::Princeps => "Princeps",
            Self::Generic => "Générique",
            Self::Complementary => "Génériques par complémentarité posologique",
            Self::Substitutable => "Générique substituable",
        }
    }

    /// Returns true for the reference medication of a group.
    pub fn is_princeps(self) -> bool {
        self == Self::Princeps
    }
}

/// Nature of a composition component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ComponentNature {
    /// Active substance ("SA").
    ActiveSubstance,
    /// Therapeutic fraction ("FT").
    TherapeuticFraction,
}

impl ComponentNature {
    /// Parses the two-letter code used in `CIS_COMPO_bdpm.txt`.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "SA" => Some(Self::ActiveSubstance),
            "FT" => Some(Self::TherapeuticFraction),
            _ => None,
        }
    }

    /// Returns the two-letter dataset code.
    pub fn code(self) -> &'static str {
        match self {
            Self::ActiveSubstance => "SA",
            Self::TherapeuticFraction => "FT",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generic_type_codes() {
        for code in [0u8, 1, 2, 4] {
            let kind = GenericType::from_code(code).unwrap();
            assert_eq!(kind.to_code(), code);
        }
        assert_eq!(GenericType::from_code(3), None);
        assert_eq!(GenericType::from_code(9), None);
    }

    #[test]
    fn test_princeps() {
        assert!(GenericType::Princeps.is_princeps());
        assert!(!GenericType::Generic.is_princeps());
        assert_eq!(GenericType::Generic.label(), "Générique");
    }

    #[test]
    fn test_component_nature() {
        assert_eq!(
            ComponentNature::from_code("SA"),
            Some(ComponentNature::ActiveSubstance)
        );
        assert_eq!(
            ComponentNature::from_code("FT"),
            Some(ComponentNature::TherapeuticFraction)
        );
        assert_eq!(ComponentNature::from_code("XX"), None);
        assert_eq!(ComponentNature::TherapeuticFraction.code(), "FT");
    }
}
