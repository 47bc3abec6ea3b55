//! Radio hardware emulation profiles

/// Hardware profile the engine uses to shape radio audio
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum HardwareType {
    #[default]
    Garex220,
    RockwellCollins2100,
    SchmidEd137b,
}

impl HardwareType {
    /// All profiles in engine index order
    pub const ALL: [HardwareType; 3] = [
        HardwareType::Garex220,
        HardwareType::RockwellCollins2100,
        HardwareType::SchmidEd137b,
    ];

    /// Look up a profile by its engine index
    pub fn from_index(index: i32) -> Option<Self> {
        usize::try_from(index)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
    }

    /// Engine index for this profile
    pub fn index(&self) -> i32 {
        match self {
            HardwareType::Garex220 => 0,
            HardwareType::RockwellCollins2100 => 1,
            HardwareType::SchmidEd137b => 2,
        }
    }

    /// Returns a human-readable name for the profile
    pub fn name(&self) -> &'static str {
        match self {
            HardwareType::Garex220 => "Garex 220",
            HardwareType::RockwellCollins2100 => "Rockwell Collins 2100",
            HardwareType::SchmidEd137b => "Schmid ED-137B",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_lookup() {
        for hw in HardwareType::ALL {
            assert_eq!(HardwareType::from_index(hw.index()), Some(hw));
        }
        assert_eq!(HardwareType::from_index(-1), None);
        assert_eq!(HardwareType::from_index(3), None);
    }
}
