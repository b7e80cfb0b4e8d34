//! Trigger start/end anchors.
//!
//! An anchor pairs a point on the element with a point on the viewport:
//! `"top 80%"` means "when the element's top edge reaches 80% down the
//! viewport". Resolved against element bounds it becomes an absolute scroll
//! offset.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ReelError;
use crate::geometry::Bounds;

/// A point along an element or the viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Edge {
    Top,
    Center,
    Bottom,
    /// Percentage of the length from the top (`"80%"`).
    Percent(f64),
    /// Pixels from the top (`"100px"` or `"100"`).
    Pixels(f64),
}

impl Edge {
    /// Distance of this edge from the top of something `length` tall.
    pub fn offset_in(self, length: f64) -> f64 {
        match self {
            Self::Top => 0.0,
            Self::Center => length / 2.0,
            Self::Bottom => length,
            Self::Percent(p) => length * p / 100.0,
            Self::Pixels(px) => px,
        }
    }
}

/// An [`Edge`] with a relative adjustment (`"center+=100"`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeSpec {
    pub edge: Edge,
    pub adjust: f64,
}

impl EdgeSpec {
    pub const fn new(edge: Edge) -> Self {
        Self { edge, adjust: 0.0 }
    }

    fn offset_in(self, length: f64) -> f64 {
        self.edge.offset_in(length) + self.adjust
    }
}

/// Where a trigger region starts or ends.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Anchor {
    /// Element edge meets viewport edge.
    Relative { element: EdgeSpec, viewport: EdgeSpec },
    /// A fixed scroll offset.
    Absolute(f64),
}

impl Anchor {
    /// `element` edge meets `viewport` edge, no adjustments.
    pub const fn relative(element: Edge, viewport: Edge) -> Self {
        Self::Relative {
            element: EdgeSpec::new(element),
            viewport: EdgeSpec::new(viewport),
        }
    }

    /// `"top bottom"`: the element starts entering the viewport.
    pub const TOP_BOTTOM: Self = Self::relative(Edge::Top, Edge::Bottom);
    /// `"top top"`: the element's top reaches the viewport top.
    pub const TOP_TOP: Self = Self::relative(Edge::Top, Edge::Top);
    /// `"bottom top"`: the element has fully left through the top.
    pub const BOTTOM_TOP: Self = Self::relative(Edge::Bottom, Edge::Top);

    /// Scroll offset at which this anchor is reached.
    pub fn resolve(&self, bounds: Bounds, viewport_height: f64) -> f64 {
        match *self {
            Self::Relative { element, viewport } => {
                bounds.top + element.offset_in(bounds.height) - viewport.offset_in(viewport_height)
            }
            Self::Absolute(offset) => offset,
        }
    }
}

fn parse_number(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

fn parse_edge(token: &str) -> Option<Edge> {
    match token {
        "top" => Some(Edge::Top),
        "center" => Some(Edge::Center),
        "bottom" => Some(Edge::Bottom),
        _ => {
            if let Some(p) = token.strip_suffix('%') {
                parse_number(p).map(Edge::Percent)
            } else if let Some(px) = token.strip_suffix("px") {
                parse_number(px).map(Edge::Pixels)
            } else {
                parse_number(token).map(Edge::Pixels)
            }
        }
    }
}

fn parse_edge_spec(token: &str) -> Option<EdgeSpec> {
    for (op, sign) in [("+=", 1.0), ("-=", -1.0)] {
        if let Some((edge, amount)) = token.split_once(op) {
            let amount = amount.strip_suffix("px").unwrap_or(amount);
            return Some(EdgeSpec {
                edge: parse_edge(edge)?,
                adjust: sign * parse_number(amount)?,
            });
        }
    }
    parse_edge(token).map(EdgeSpec::new)
}

impl FromStr for Anchor {
    type Err = ReelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ReelError::InvalidAnchor(s.to_string());
        let tokens: Vec<&str> = s.split_whitespace().collect();
        match tokens.as_slice() {
            [single] => {
                let single = single.strip_suffix("px").unwrap_or(single);
                parse_number(single)
                    .map(Self::Absolute)
                    .ok_or_else(invalid)
            }
            [element, viewport] => Ok(Self::Relative {
                element: parse_edge_spec(element).ok_or_else(invalid)?,
                viewport: parse_edge_spec(viewport).ok_or_else(invalid)?,
            }),
            _ => Err(invalid()),
        }
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Top => write!(f, "top"),
            Self::Center => write!(f, "center"),
            Self::Bottom => write!(f, "bottom"),
            Self::Percent(p) => write!(f, "{p}%"),
            Self::Pixels(px) => write!(f, "{px}px"),
        }
    }
}

impl fmt::Display for EdgeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.edge)?;
        if self.adjust > 0.0 {
            write!(f, "+={}", self.adjust)?;
        } else if self.adjust < 0.0 {
            write!(f, "-={}", -self.adjust)?;
        }
        Ok(())
    }
}

impl fmt::Display for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Relative { element, viewport } => write!(f, "{element} {viewport}"),
            Self::Absolute(offset) => write!(f, "{offset}"),
        }
    }
}

impl TryFrom<String> for Anchor {
    type Error = ReelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Anchor> for String {
    fn from(anchor: Anchor) -> Self {
        anchor.to_string()
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

    const SECTION: Bounds = Bounds {
        top: 2000.0,
        height: 600.0,
    };

    #[test_case("top bottom", 1200.0 ; "enters from below")]
    #[test_case("top top", 2000.0 ; "top reaches top")]
    #[test_case("bottom top", 2600.0 ; "fully leaves")]
    #[test_case("top 80%", 1360.0 ; "percent viewport")]
    #[test_case("center center", 1900.0 ; "centers")]
    #[test_case("top 100px", 1900.0 ; "pixel viewport")]
    #[test_case("top top+=50", 1950.0 ; "adjusted viewport")]
    #[test_case("top-=20 top", 1980.0 ; "adjusted element")]
    #[test_case("1500", 1500.0 ; "absolute")]
    fn test_resolve(anchor: &str, expected: f64) {
        let anchor: Anchor = anchor.parse().unwrap();
        assert_eq!(anchor.resolve(SECTION, 800.0), expected, "{anchor}");
    }

    #[test_case("" ; "empty")]
    #[test_case("top" ; "lone edge")]
    #[test_case("middle top" ; "unknown edge")]
    #[test_case("top bottom extra" ; "too many tokens")]
    #[test_case("top top+=abc" ; "bad adjustment")]
    fn test_rejects(anchor: &str) {
        assert!(
            matches!(anchor.parse::<Anchor>(), Err(ReelError::InvalidAnchor(_))),
            "{anchor:?} should be rejected"
        );
    }

    #[test]
    fn test_display_parses_back() {
        for text in ["top 80%", "center center+=100", "bottom top", "250"] {
            let anchor: Anchor = text.parse().unwrap();
            let again: Anchor = anchor.to_string().parse().unwrap();
            assert_eq!(anchor, again, "{text}");
        }
    }
}
