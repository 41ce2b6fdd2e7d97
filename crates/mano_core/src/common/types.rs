use enum_map::Enum;
use strum_macros::{Display, EnumIter, EnumString};
/// Which hand a MANO model describes. Left and right assets differ in their
/// buffers and in one fingertip vertex.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Enum, EnumIter, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum HandSide {
    Left,
    Right,
}
impl HandSide {
    /// File name of the asset for this side, e.g. `MANO_RIGHT.npz`
    pub fn asset_file_name(self) -> &'static str {
        match self {
            HandSide::Left => "MANO_LEFT.npz",
            HandSide::Right => "MANO_RIGHT.npz",
        }
    }
}
/// Rotation parameterization of the raw pose vector
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum RotMode {
    #[strum(serialize = "axisang")]
    AxisAngle,
    #[strum(serialize = "quat")]
    Quaternion,
}
impl RotMode {
    /// Number of raw components per joint rotation
    pub fn rot_dim(self) -> usize {
        match self {
            RotMode::AxisAngle => 3,
            RotMode::Quaternion => 4,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn parses_mode_and_side_names() {
        assert_eq!(RotMode::from_str("axisang").unwrap(), RotMode::AxisAngle);
        assert_eq!(RotMode::from_str("QUAT").unwrap(), RotMode::Quaternion);
        assert!(RotMode::from_str("euler").is_err());
        assert_eq!(HandSide::from_str("Left").unwrap(), HandSide::Left);
        assert_eq!(HandSide::Right.to_string(), "right");
        assert_eq!(RotMode::AxisAngle.to_string(), "axisang");
    }
}
