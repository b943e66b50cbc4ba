// Legal outfield formations.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::model::Position;

/// An outfield shape, written defenders-midfielders-forwards. The goalkeeper
/// is implied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Formation {
    pub defenders: u8,
    pub midfielders: u8,
    pub forwards: u8,
}

impl Formation {
    pub const fn new(defenders: u8, midfielders: u8, forwards: u8) -> Self {
        Formation {
            defenders,
            midfielders,
            forwards,
        }
    }

    /// Every formation a lineup may use.
    pub const LEGAL: [Formation; 7] = [
        Formation::new(3, 4, 3),
        Formation::new(3, 5, 2),
        Formation::new(4, 3, 3),
        Formation::new(4, 4, 2),
        Formation::new(4, 5, 1),
        Formation::new(5, 3, 2),
        Formation::new(5, 4, 1),
    ];

    pub fn is_legal(&self) -> bool {
        Formation::LEGAL.contains(self)
    }

    /// Starters required at `pos`, goalkeeper included.
    pub fn starters(&self, pos: Position) -> usize {
        match pos {
            Position::Goalkeeper => 1,
            Position::Defender => self.defenders as usize,
            Position::Midfielder => self.midfielders as usize,
            Position::Forward => self.forwards as usize,
        }
    }
}

impl Default for Formation {
    fn default() -> Self {
        Formation::new(4, 4, 2)
    }
}

impl fmt::Display for Formation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.defenders, self.midfielders, self.forwards)
    }
}

/// Why a formation string was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidFormation(pub String);

impl fmt::Display for InvalidFormation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid formation '{}'", self.0)
    }
}

impl std::error::Error for InvalidFormation {}

impl FromStr for Formation {
    type Err = InvalidFormation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().split('-').collect();
        let [d, m, f] = parts.as_slice() else {
            return Err(InvalidFormation(s.to_string()));
        };
        let parse = |p: &str| p.trim().parse::<u8>().map_err(|_| InvalidFormation(s.to_string()));
        let formation = Formation::new(parse(d)?, parse(m)?, parse(f)?);
        if formation.is_legal() {
            Ok(formation)
        } else {
            Err(InvalidFormation(s.to_string()))
        }
    }
}

impl TryFrom<String> for Formation {
    type Error = InvalidFormation;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Formation> for String {
    fn from(f: Formation) -> Self {
        f.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_legal_formation() {
        for f in Formation::LEGAL {
            let parsed: Formation = f.to_string().parse().unwrap();
            assert_eq!(parsed, f);
            assert_eq!(1 + f.defenders + f.midfielders + f.forwards, 11);
        }
    }

    #[test]
    fn rejects_illegal_or_malformed() {
        for bad in ["4-4-3", "2-5-3", "4-4", "4-4-2-0", "a-b-c", ""] {
            let err = bad.parse::<Formation>().unwrap_err();
            assert_eq!(err.to_string(), format!("invalid formation '{bad}'"));
        }
    }

    #[test]
    fn serde_uses_dashed_string() {
        let json = serde_json::to_string(&Formation::new(3, 5, 2)).unwrap();
        assert_eq!(json, "\"3-5-2\"");
        let back: Formation = serde_json::from_str("\"5-4-1\"").unwrap();
        assert_eq!(back, Formation::new(5, 4, 1));
        assert!(serde_json::from_str::<Formation>("\"6-3-1\"").is_err());
    }

    #[test]
    fn default_is_four_four_two() {
        assert_eq!(Formation::default().to_string(), "4-4-2");
        assert_eq!(Formation::default().starters(Position::Goalkeeper), 1);
    }
}
