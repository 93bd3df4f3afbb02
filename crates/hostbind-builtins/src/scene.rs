//! Scene graph types

use hostbind_sdk::{script_methods, script_type};

/// Base of every scene component; scripts cannot construct it
#[script_type(is_abstract)]
pub struct Component {
    #[script_property(read_only)]
    pub id: u32,
    #[script_property]
    pub enabled: bool,
}

/// Light source; hides the component members from scripts
#[script_type(base = Component, inherit_base_members = false)]
pub struct Light {
    #[script_property]
    pub intensity: f64,
    #[script_property(read_only)]
    pub kind: String,
}

#[script_methods]
impl Light {
    #[script_constructor]
    pub fn new(intensity: f64) -> Self {
        Light {
            intensity,
            kind: "point".to_string(),
        }
    }

    #[script_constructor]
    pub fn with_kind(intensity: f64, kind: &str) -> Result<Self, String> {
        match kind {
            "point" | "spot" | "directional" => Ok(Light {
                intensity,
                kind: kind.to_string(),
            }),
            other => Err(format!("unknown light kind `{}`", other)),
        }
    }
}

/// Host-only base; never exposed
pub struct Node;

/// Exposed type whose base is not exposed
#[script_type(base = Node)]
pub struct Marker {
    #[script_property]
    pub label: String,
}

#[script_methods]
impl Marker {
    #[script_constructor]
    pub fn new(label: String) -> Self {
        Marker { label }
    }
}

/// Countdown driven by the host clock
#[script_type]
pub struct Timer {
    remaining: f64,
    fired: u32,
}

#[script_methods]
impl Timer {
    #[script_constructor]
    pub fn new() -> Self {
        Timer::with_seconds(1.0)
    }

    #[script_constructor]
    pub fn with_seconds(seconds: f64) -> Self {
        Timer {
            remaining: seconds,
            fired: 0,
        }
    }

    #[script_property]
    pub fn get_remaining(&self) -> f64 {
        self.remaining
    }

    #[script_property]
    pub fn set_remaining(&mut self, seconds: f64) {
        self.remaining = seconds.max(0.0);
    }

    /// Read-only even though a setter exists
    #[script_property(read_only)]
    pub fn get_fired(&self) -> u32 {
        self.fired
    }

    #[script_property]
    pub fn set_fired(&mut self, fired: u32) {
        self.fired = fired;
    }

    /// Advance by `dt` seconds; true when the timer fires
    #[script_method]
    pub fn tick(&mut self, dt: f64) -> bool {
        if self.remaining <= 0.0 {
            return false;
        }
        self.remaining = (self.remaining - dt).max(0.0);
        if self.remaining == 0.0 {
            self.fired += 1;
            return true;
        }
        false
    }
}
