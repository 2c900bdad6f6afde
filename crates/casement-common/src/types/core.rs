use serde::{Deserialize, Serialize};
use std::fmt;

/// Screen-relative position and viewport size of one context.
///
/// Persisted as `{x, y, w, h}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    pub x: f64,
    pub y: f64,
    #[serde(rename = "w")]
    pub width: f64,
    #[serde(rename = "h")]
    pub height: f64,
}

impl Shape {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Parses `x,y,w,h` (whitespace around the parts is ignored).
    /// NaN and infinite components are rejected.
    pub fn parse(s: &str) -> Option<Self> {
        let parts: Vec<&str> = s.split(',').collect();
        if parts.len() != 4 {
            return None;
        }
        let x = parts[0].trim().parse::<f64>().ok()?;
        let y = parts[1].trim().parse::<f64>().ok()?;
        let w = parts[2].trim().parse::<f64>().ok()?;
        let h = parts[3].trim().parse::<f64>().ok()?;
        Some(Self::new(x, y, w, h)).filter(Shape::is_finite)
    }

    /// Whether every component is a finite number. JSON has no encoding
    /// for NaN or infinity, so only finite shapes may be stored.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.width.is_finite() && self.height.is_finite()
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{} {}x{}", self.x, self.y, self.width, self.height)
    }
}

/// Registry-assigned identifier. Drawn from the shared counter, never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WindowId(pub u64);

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "window-{}", self.0)
    }
}

/// One registered context as stored under the `windows` key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowEntry {
    pub id: WindowId,
    pub shape: Shape,
    /// Caller-supplied payload, stored verbatim.
    #[serde(rename = "metaData", default)]
    pub meta_data: serde_json::Value,
}

impl WindowEntry {
    pub fn new(id: WindowId, shape: Shape, meta_data: serde_json::Value) -> Self {
        Self {
            id,
            shape,
            meta_data,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationState {
    Unregistered,
    Registered,
    Deregistered,
}
