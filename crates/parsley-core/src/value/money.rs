//! Money domain literal: integer minor units + currency code + scale
//! (spec §3, §9 Open Question iii).

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Money {
    /// Amount in minor units (e.g. cents for a 2-scale currency).
    pub minor_units: i64,
    pub currency: [u8; 3],
    pub scale: u8,
}

impl Money {
    #[must_use]
    pub fn new(minor_units: i64, currency: &str, scale: u8) -> Self {
        let mut code = [b' '; 3];
        for (slot, byte) in code.iter_mut().zip(currency.bytes()) {
            *slot = byte;
        }
        Self {
            minor_units,
            currency: code,
            scale,
        }
    }

    #[must_use]
    pub fn currency_code(&self) -> String {
        String::from_utf8_lossy(&self.currency).trim_end().to_string()
    }

    /// `.amount`: the decimal value as a float (display only — arithmetic on
    /// money should stay in minor units to avoid float drift).
    #[must_use]
    pub fn amount(&self) -> f64 {
        self.minor_units as f64 / 10f64.powi(i32::from(self.scale))
    }

    /// JSON encoding decided in spec §9 Open Question (iii):
    /// `{"amount": <minor-units-int>, "currency": "<code>", "scale": <int>}`.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "amount": self.minor_units,
            "currency": self.currency_code(),
            "scale": self.scale,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amount_divides_by_scale() {
        let m = Money::new(1234, "USD", 2);
        assert!((m.amount() - 12.34).abs() < f64::EPSILON);
    }

    #[test]
    fn json_shape_matches_open_question_resolution() {
        let m = Money::new(500, "GBP", 2);
        let json = m.to_json();
        assert_eq!(json["amount"], 500);
        assert_eq!(json["currency"], "GBP");
        assert_eq!(json["scale"], 2);
    }
}
