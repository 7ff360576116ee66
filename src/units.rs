//! This module defines the unit types used for quantities in the simulation.
//!
//! Household wealth and portfolio payoffs are in [`Money`], labour inputs are in [`Hours`] and
//! returns on investment and preference weights are in [`MoneyPerHour`]. Shares, reservation
//! parameters and adaptation rates are [`Dimensionless`].
use serde::{Deserialize, Serialize};

macro_rules! unit_struct {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            PartialOrd,
            Default,
            Serialize,
            Deserialize,
            derive_more::Add,
            derive_more::Sub,
            derive_more::AddAssign,
            derive_more::SubAssign,
            derive_more::Display,
        )]
        #[serde(transparent)]
        pub struct $name(pub f64);

        impl $name {
            /// Create a new instance of the unit type from an `f64` value
            pub const fn new(value: f64) -> Self {
                Self(value)
            }

            /// Get the underlying `f64` value
            pub const fn value(self) -> f64 {
                self.0
            }

            /// Whether the underlying value is finite
            pub fn is_finite(self) -> bool {
                self.0.is_finite()
            }

            /// The smaller of two values
            pub fn min(self, other: Self) -> Self {
                Self(self.0.min(other.0))
            }

            /// The larger of two values
            pub fn max(self, other: Self) -> Self {
                Self(self.0.max(other.0))
            }

            /// Restrict the value to the given interval
            pub fn clamp(self, min: Self, max: Self) -> Self {
                Self(self.0.clamp(min.0, max.0))
            }

            /// A total ordering over values, as per [`f64::total_cmp`]
            pub fn total_cmp(&self, other: &Self) -> std::cmp::Ordering {
                self.0.total_cmp(&other.0)
            }
        }

        impl std::iter::Sum for $name {
            fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
                $name(iter.map(|x| x.0).sum())
            }
        }
    };
}

/// Scaling by a [`Dimensionless`] factor and ratios between like quantities
macro_rules! impl_scale {
    ($name:ident) => {
        impl std::ops::Mul<Dimensionless> for $name {
            type Output = $name;
            fn mul(self, rhs: Dimensionless) -> $name {
                $name(self.0 * rhs.0)
            }
        }

        impl std::ops::Mul<$name> for Dimensionless {
            type Output = $name;
            fn mul(self, rhs: $name) -> $name {
                $name(self.0 * rhs.0)
            }
        }

        impl std::ops::Div<$name> for $name {
            type Output = Dimensionless;
            fn div(self, rhs: $name) -> Dimensionless {
                Dimensionless(self.0 / rhs.0)
            }
        }
    };
}

macro_rules! impl_mul {
    ($Lhs:ty, $Rhs:ty, $Out:ty) => {
        impl std::ops::Mul<$Rhs> for $Lhs {
            type Output = $Out;
            fn mul(self, rhs: $Rhs) -> $Out {
                <$Out>::new(self.0 * rhs.0)
            }
        }
        impl std::ops::Mul<$Lhs> for $Rhs {
            type Output = $Out;
            fn mul(self, lhs: $Lhs) -> $Out {
                <$Out>::new(self.0 * lhs.0)
            }
        }
    };
}

unit_struct!(
    /// A quantity with no units (shares, proportions, rates)
    Dimensionless
);
unit_struct!(
    /// An amount of money
    Money
);
unit_struct!(
    /// An amount of labour input
    Hours
);
unit_struct!(
    /// A return on labour input
    MoneyPerHour
);

impl_scale!(Money);
impl_scale!(Hours);
impl_scale!(MoneyPerHour);
impl_mul!(MoneyPerHour, Hours, Money);

impl std::ops::Mul for Dimensionless {
    type Output = Dimensionless;
    fn mul(self, rhs: Dimensionless) -> Dimensionless {
        Dimensionless(self.0 * rhs.0)
    }
}

impl std::ops::Div for Dimensionless {
    type Output = Dimensionless;
    fn div(self, rhs: Dimensionless) -> Dimensionless {
        Dimensionless(self.0 / rhs.0)
    }
}
