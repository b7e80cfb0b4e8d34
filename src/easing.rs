//! Easing curves.
//!
//! Names follow the animation-library convention used by the page markup
//! (`"power3.out"`, `"back.out(1.7)"`, `"none"`), so section code and config
//! files can spell eases the same way designers do.

use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ReelError;

/// Default overshoot for `back.out`.
pub const BACK_OVERSHOOT: f64 = 1.70158;

/// An easing curve mapping linear progress in `[0, 1]` to eased progress.
///
/// Every curve maps `0.0` to exactly `0.0` and `1.0` to exactly `1.0`, and is
/// a pure function of its input so frame replays are reproducible.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Ease {
    /// No easing (`"none"` / `"linear"`).
    Linear,
    /// `powerN.in`, `N` in `1..=4`.
    PowerIn(u8),
    /// `powerN.out`, `N` in `1..=4`.
    PowerOut(u8),
    /// `powerN.inOut`, `N` in `1..=4`.
    PowerInOut(u8),
    /// `sine.in`
    SineIn,
    /// `sine.out`
    SineOut,
    /// `sine.inOut`
    SineInOut,
    /// `back.out(overshoot)`
    BackOut(f64),
    /// `expo.out`, the smooth-scroll default.
    ExpoOut,
}

impl Default for Ease {
    fn default() -> Self {
        Self::PowerOut(1)
    }
}

impl Ease {
    /// Evaluate the curve at `t`. Input is clamped to `[0, 1]`.
    #[must_use]
    pub fn apply(self, t: f64) -> f64 {
        if t.is_nan() || t <= 0.0 {
            return 0.0;
        }
        if t >= 1.0 {
            return 1.0;
        }
        match self {
            Self::Linear => t,
            Self::PowerIn(n) => t.powi(exponent(n)),
            Self::PowerOut(n) => 1.0 - (1.0 - t).powi(exponent(n)),
            Self::PowerInOut(n) => {
                let p = exponent(n);
                if t < 0.5 {
                    (2.0 * t).powi(p) / 2.0
                } else {
                    1.0 - (2.0 * (1.0 - t)).powi(p) / 2.0
                }
            }
            Self::SineIn => 1.0 - (t * PI / 2.0).cos(),
            Self::SineOut => (t * PI / 2.0).sin(),
            Self::SineInOut => -((PI * t).cos() - 1.0) / 2.0,
            Self::BackOut(s) => {
                let u = t - 1.0;
                1.0 + (s + 1.0) * u.powi(3) + s * u.powi(2)
            }
            Self::ExpoOut => (1.001 - 2f64.powf(-10.0 * t)).min(1.0),
        }
    }
}

/// `power1` is quadratic, `power4` is quintic.
fn exponent(n: u8) -> i32 {
    i32::from(n.clamp(1, 4)) + 1
}

impl fmt::Display for Ease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Linear => write!(f, "none"),
            Self::PowerIn(n) => write!(f, "power{n}.in"),
            Self::PowerOut(n) => write!(f, "power{n}.out"),
            Self::PowerInOut(n) => write!(f, "power{n}.inOut"),
            Self::SineIn => write!(f, "sine.in"),
            Self::SineOut => write!(f, "sine.out"),
            Self::SineInOut => write!(f, "sine.inOut"),
            Self::BackOut(s) => write!(f, "back.out({s})"),
            Self::ExpoOut => write!(f, "expo.out"),
        }
    }
}

impl FromStr for Ease {
    type Err = ReelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        let unknown = || ReelError::UnknownEase(name.to_string());

        let (family, variant) = match name.split_once('.') {
            Some((family, variant)) => (family, Some(variant)),
            None => (name, None),
        };

        match family {
            "none" | "linear" if variant.is_none() => Ok(Self::Linear),
            "expo" if matches!(variant, None | Some("out")) => Ok(Self::ExpoOut),
            "sine" => match variant {
                Some("in") => Ok(Self::SineIn),
                None | Some("out") => Ok(Self::SineOut),
                Some("inOut") => Ok(Self::SineInOut),
                Some(_) => Err(unknown()),
            },
            "back" => {
                let variant = variant.unwrap_or("out");
                let Some(rest) = variant.strip_prefix("out") else {
                    return Err(unknown());
                };
                if rest.is_empty() {
                    return Ok(Self::BackOut(BACK_OVERSHOOT));
                }
                let overshoot = rest
                    .strip_prefix('(')
                    .and_then(|r| r.strip_suffix(')'))
                    .and_then(|r| r.trim().parse::<f64>().ok())
                    .filter(|v| v.is_finite())
                    .ok_or_else(unknown)?;
                Ok(Self::BackOut(overshoot))
            }
            _ => {
                let n = family
                    .strip_prefix("power")
                    .and_then(|d| d.parse::<u8>().ok())
                    .filter(|n| (1..=4).contains(n))
                    .ok_or_else(unknown)?;
                match variant {
                    Some("in") => Ok(Self::PowerIn(n)),
                    None | Some("out") => Ok(Self::PowerOut(n)),
                    Some("inOut") => Ok(Self::PowerInOut(n)),
                    Some(_) => Err(unknown()),
                }
            }
        }
    }
}

impl TryFrom<String> for Ease {
    type Error = ReelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Ease> for String {
    fn from(ease: Ease) -> Self {
        ease.to_string()
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(Ease::Linear ; "linear")]
    #[test_case(Ease::PowerIn(2) ; "power2 in")]
    #[test_case(Ease::PowerOut(3) ; "power3 out")]
    #[test_case(Ease::PowerInOut(4) ; "power4 in out")]
    #[test_case(Ease::SineInOut ; "sine in out")]
    #[test_case(Ease::BackOut(1.7) ; "back out")]
    #[test_case(Ease::ExpoOut ; "expo out")]
    fn test_endpoints_are_exact(ease: Ease) {
        assert_eq!(ease.apply(0.0), 0.0, "{ease} at 0");
        assert_eq!(ease.apply(1.0), 1.0, "{ease} at 1");
        assert_eq!(ease.apply(-3.0), 0.0, "{ease} clamps below");
        assert_eq!(ease.apply(7.0), 1.0, "{ease} clamps above");
    }

    #[test_case("none", Ease::Linear)]
    #[test_case("power2.out", Ease::PowerOut(2))]
    #[test_case("power3", Ease::PowerOut(3))]
    #[test_case("power2.inOut", Ease::PowerInOut(2))]
    #[test_case("back.out(1.7)", Ease::BackOut(1.7))]
    #[test_case("back.out", Ease::BackOut(BACK_OVERSHOOT))]
    #[test_case("expo.out", Ease::ExpoOut)]
    fn test_parse_names(name: &str, expected: Ease) {
        assert_eq!(name.parse::<Ease>().unwrap(), expected);
    }

    #[test]
    fn test_parse_rejects_unknown() {
        assert!("power7.out".parse::<Ease>().is_err());
        assert!("elastic.out".parse::<Ease>().is_err());
        assert!("back.out(abc)".parse::<Ease>().is_err());
    }

    #[test]
    fn test_back_out_overshoots() {
        let peak = (1..100)
            .map(|i| Ease::BackOut(1.7).apply(f64::from(i) / 100.0))
            .fold(0.0_f64, f64::max);
        assert!(peak > 1.0, "back.out should overshoot, peak was {peak}");
    }

    #[test]
    fn test_display_round_trips_through_serde() {
        let json = serde_json::to_string(&Ease::PowerInOut(2)).unwrap();
        assert_eq!(json, "\"power2.inOut\"");
        let back: Ease = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Ease::PowerInOut(2));
    }
}
