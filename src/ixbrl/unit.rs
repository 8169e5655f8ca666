use std::fmt;

use serde::{Deserialize, Serialize};

/// Measurement unit of a numeric fact.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Unit {
    Measure {
        symbol: String,
    },
    Divide {
        numerator: Box<Unit>,
        denominator: Box<Unit>,
    },
}

impl Unit {
    pub fn measure(symbol: impl Into<String>) -> Self {
        Unit::Measure {
            symbol: symbol.into(),
        }
    }

    pub fn divide(numerator: Unit, denominator: Unit) -> Self {
        Unit::Divide {
            numerator: Box::new(numerator),
            denominator: Box::new(denominator),
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unit::Measure { symbol } => write!(f, "{}", symbol),
            Unit::Divide {
                numerator,
                denominator,
            } => write!(f, "{}/{}", numerator, denominator),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Unit::measure("iso4217:GBP").to_string(), "iso4217:GBP");
        let per_share = Unit::divide(Unit::measure("iso4217:USD"), Unit::measure("xbrli:shares"));
        assert_eq!(per_share.to_string(), "iso4217:USD/xbrli:shares");
    }
}
