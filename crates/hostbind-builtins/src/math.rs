//! Vector and numeric helpers

use hostbind_sdk::{instance_of, script_methods, script_type, ConvertError, FromValue, Value};

/// Three-component vector, exposed as `Vector3`
#[script_type(name = "Vector3")]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vec3 {
    #[script_property]
    pub x: f32,
    #[script_property]
    pub y: f32,
    #[script_property]
    pub z: f32,
}

#[script_methods]
impl Vec3 {
    #[script_constructor]
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Vec3 { x, y, z }
    }

    /// Any other argument count: `()` is the zero vector, `(s)` splats `s`
    #[script_constructor]
    pub fn from_args(args: &[Value]) -> Result<Self, String> {
        match args {
            [] => Ok(Vec3::new(0.0, 0.0, 0.0)),
            [scalar] => {
                let s = scalar
                    .as_float()
                    .ok_or_else(|| format!("expected a number, got {}", scalar.kind()))?;
                Ok(Vec3::new(s as f32, s as f32, s as f32))
            }
            _ => Err(format!("expected 0, 1 or 3 arguments, got {}", args.len())),
        }
    }

    #[script_method]
    pub fn length(&self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Move along the x axis
    #[script_method(name = "move")]
    pub fn translate(&mut self, #[script_default(1.0)] distance: f32) {
        self.x += distance;
    }

    #[script_method]
    pub fn dot(&self, other: Vec3) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    #[script_method]
    pub fn scaled(&self, factor: f32) -> Vec3 {
        Vec3::new(self.x * factor, self.y * factor, self.z * factor)
    }

    #[script_method]
    pub fn normalized(&self) -> Result<Vec3, String> {
        let length = self.length();
        if length == 0.0 {
            return Err("cannot normalize the zero vector".to_string());
        }
        Ok(self.scaled(1.0 / length))
    }
}

// Lets host methods take `Vector3` arguments by value
impl FromValue for Vec3 {
    fn from_value(value: &Value) -> Result<Self, ConvertError> {
        instance_of::<Vec3>(value)
    }
}

/// Numeric helpers; type-level only
#[script_type(is_static)]
pub struct MathUtil;

#[script_methods]
impl MathUtil {
    #[script_method]
    pub fn clamp(value: f64, #[script_default(0)] min: f64, #[script_default(1)] max: f64) -> f64 {
        value.max(min).min(max)
    }

    #[script_method]
    pub fn sum(values: Vec<f64>) -> f64 {
        values.iter().sum()
    }

    #[script_property(name = "PI")]
    pub fn pi() -> f64 {
        std::f64::consts::PI
    }
}
