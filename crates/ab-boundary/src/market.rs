//! Market description of a single American option.

use ab_core::{
    errors::{Error, Result},
    require, OptionType, Price, Rate, Real, Time, Volatility,
};

/// Strike, rates, volatility and expiry of one American option under
/// Black-Scholes dynamics with a continuous dividend yield.
///
/// Construction validates the inputs; the solver validates again, so a
/// value obtained by deserialisation cannot bypass the checks.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MarketParameters {
    option_type: OptionType,
    strike: Price,
    risk_free_rate: Rate,
    dividend_yield: Rate,
    volatility: Volatility,
    expiry: Time,
}

impl MarketParameters {
    /// Build and validate a parameter set.
    ///
    /// # Errors
    /// [`Error::InvalidMarketParameters`] when the strike, volatility or
    /// expiry is not strictly positive, any input is non-finite, or early
    /// exercise is never optimal (put with `r <= 0`, call with `q <= 0`).
    pub fn new(
        option_type: OptionType,
        strike: Price,
        risk_free_rate: Rate,
        dividend_yield: Rate,
        volatility: Volatility,
        expiry: Time,
    ) -> Result<Self> {
        let params = Self {
            option_type,
            strike,
            risk_free_rate,
            dividend_yield,
            volatility,
            expiry,
        };
        params.validate()?;
        Ok(params)
    }

    /// Shorthand for an American put.
    pub fn put(
        strike: Price,
        risk_free_rate: Rate,
        dividend_yield: Rate,
        volatility: Volatility,
        expiry: Time,
    ) -> Result<Self> {
        Self::new(
            OptionType::Put,
            strike,
            risk_free_rate,
            dividend_yield,
            volatility,
            expiry,
        )
    }

    /// Shorthand for an American call.
    pub fn call(
        strike: Price,
        risk_free_rate: Rate,
        dividend_yield: Rate,
        volatility: Volatility,
        expiry: Time,
    ) -> Result<Self> {
        Self::new(
            OptionType::Call,
            strike,
            risk_free_rate,
            dividend_yield,
            volatility,
            expiry,
        )
    }

    /// Check every field; see [`MarketParameters::new`].
    pub fn validate(&self) -> Result<()> {
        let invalid = Error::InvalidMarketParameters;
        require!(
            invalid,
            self.strike.is_finite() && self.strike > 0.0,
            "strike must be positive and finite, got {}",
            self.strike
        );
        require!(
            invalid,
            self.volatility.is_finite() && self.volatility > 0.0,
            "volatility must be positive and finite, got {}",
            self.volatility
        );
        require!(
            invalid,
            self.expiry.is_finite() && self.expiry > 0.0,
            "expiry must be positive and finite, got {}",
            self.expiry
        );
        require!(
            invalid,
            self.risk_free_rate.is_finite() && self.dividend_yield.is_finite(),
            "rates must be finite, got r = {} and q = {}",
            self.risk_free_rate,
            self.dividend_yield
        );
        let (r, _) = self.normalized_rates();
        require!(
            invalid,
            r > 0.0,
            "early exercise of a {} is never optimal with r = {} and q = {}",
            self.option_type,
            self.risk_free_rate,
            self.dividend_yield
        );
        Ok(())
    }

    /// Call or put.
    pub fn option_type(&self) -> OptionType {
        self.option_type
    }

    /// Strike `K`.
    pub fn strike(&self) -> Price {
        self.strike
    }

    /// Continuously compounded risk-free rate `r`.
    pub fn risk_free_rate(&self) -> Rate {
        self.risk_free_rate
    }

    /// Continuous dividend yield `q`.
    pub fn dividend_yield(&self) -> Rate {
        self.dividend_yield
    }

    /// Black-Scholes volatility `σ`.
    pub fn volatility(&self) -> Volatility {
        self.volatility
    }

    /// Time to expiry `T` in years.
    pub fn expiry(&self) -> Time {
        self.expiry
    }

    /// `(r, q)` of the equivalent put problem.
    ///
    /// A call with rates `(r, q)` has the boundary `K² / B` where `B` is the
    /// put boundary with the rates swapped.
    pub(crate) fn normalized_rates(&self) -> (Rate, Rate) {
        match self.option_type {
            OptionType::Put => (self.risk_free_rate, self.dividend_yield),
            OptionType::Call => (self.dividend_yield, self.risk_free_rate),
        }
    }

    /// Map a put-problem boundary value back to this option's boundary.
    pub(crate) fn denormalize(&self, put_boundary: Real) -> Price {
        match self.option_type {
            OptionType::Put => put_boundary,
            OptionType::Call => self.strike * self.strike / put_boundary,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_standard_put() {
        let m = MarketParameters::put(100.0, 0.06, 0.0, 0.2, 1.0).unwrap();
        assert_eq!(m.option_type(), OptionType::Put);
        assert_eq!(m.normalized_rates(), (0.06, 0.0));
        assert_eq!(m.denormalize(80.0), 80.0);
    }

    #[test]
    fn call_swaps_rates_and_inverts() {
        let m = MarketParameters::call(100.0, 0.02, 0.05, 0.3, 2.0).unwrap();
        assert_eq!(m.normalized_rates(), (0.05, 0.02));
        assert_eq!(m.denormalize(80.0), 125.0);
    }

    #[test]
    fn rejects_bad_inputs() {
        let cases = [
            MarketParameters::put(0.0, 0.05, 0.0, 0.2, 1.0),
            MarketParameters::put(100.0, 0.05, 0.0, -0.2, 1.0),
            MarketParameters::put(100.0, 0.05, 0.0, 0.2, 0.0),
            MarketParameters::put(100.0, f64::NAN, 0.0, 0.2, 1.0),
            MarketParameters::put(100.0, 0.05, f64::INFINITY, 0.2, 1.0),
            MarketParameters::put(100.0, 0.05, 0.0, 0.2, f64::INFINITY),
        ];
        for case in cases {
            assert!(matches!(case, Err(Error::InvalidMarketParameters(_))));
        }
    }

    #[test]
    fn rejects_never_exercised_options() {
        assert!(matches!(
            MarketParameters::put(100.0, 0.0, 0.02, 0.2, 1.0),
            Err(Error::InvalidMarketParameters(_))
        ));
        match MarketParameters::call(100.0, 0.05, 0.0, 0.2, 1.0) {
            Err(Error::InvalidMarketParameters(msg)) => assert!(msg.contains("Call")),
            other => panic!("unexpected {other:?}"),
        }
    }
}
