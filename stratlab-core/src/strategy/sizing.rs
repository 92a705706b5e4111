//! Entry sizing.

use serde::{Deserialize, Serialize};

/// Default share of available cash committed on entry.
pub const DEFAULT_CASH_FRACTION: f64 = 0.9;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Sizing {
    /// `floor(cash * fraction / price)` whole units.
    CashFraction { fraction: f64 },
    /// A fixed number of units regardless of cash.
    FixedUnits { units: f64 },
}

impl Default for Sizing {
    fn default() -> Self {
        Sizing::CashFraction {
            fraction: DEFAULT_CASH_FRACTION,
        }
    }
}

impl Sizing {
    /// Units to buy at `price` given `cash`. Zero when nothing affordable.
    pub fn units(&self, cash: f64, price: f64) -> f64 {
        match *self {
            Sizing::CashFraction { fraction } => {
                if price <= 0.0 || cash <= 0.0 {
                    return 0.0;
                }
                (cash * fraction / price).floor()
            }
            Sizing::FixedUnits { units } => units,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        match *self {
            Sizing::CashFraction { fraction } if !(fraction > 0.0 && fraction <= 1.0) => {
                Err(format!("cash fraction must be in (0, 1], got {fraction}"))
            }
            Sizing::FixedUnits { units } if !(units.is_finite() && units > 0.0) => {
                Err(format!("fixed units must be positive, got {units}"))
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cash_fraction_floors() {
        let s = Sizing::default();
        assert_eq!(s.units(100_000.0, 92.0), 978.0);
        assert_eq!(s.units(50.0, 92.0), 0.0);
        assert_eq!(s.units(-10.0, 92.0), 0.0);
    }

    #[test]
    fn fixed_units_ignore_cash() {
        assert_eq!(Sizing::FixedUnits { units: 1.0 }.units(0.0, 500.0), 1.0);
    }

    #[test]
    fn validation_ranges() {
        assert!(Sizing::default().validate().is_ok());
        assert!(Sizing::CashFraction { fraction: 1.0 }.validate().is_ok());
        assert!(Sizing::CashFraction { fraction: 0.0 }.validate().is_err());
        assert!(Sizing::CashFraction { fraction: 1.5 }.validate().is_err());
        assert!(Sizing::FixedUnits { units: 0.0 }.validate().is_err());
    }

    #[test]
    fn tagged_serde_shape() {
        let json = serde_json::to_string(&Sizing::FixedUnits { units: 2.0 }).unwrap();
        assert_eq!(json, r#"{"type":"fixed_units","units":2.0}"#);
    }
}
