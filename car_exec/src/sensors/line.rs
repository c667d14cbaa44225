//! Line detection with the infrared sensor array

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use crate::{
    hw::LineSensorArray,
    module::{Module, ModuleError},
    vehicle::VehicleState,
};

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Colour of the line relative to the floor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineColor {
    /// Dark line on a light floor, the line absorbs the infrared light
    Dark,

    /// Light line on a dark floor, the line reflects the infrared light
    Light,
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LineParams {
    pub line_color: LineColor,
}

/// Writes the line pattern seen by the sensor array into the vehicle state.
pub struct LineDetector<L> {
    sensor: L,
    line_color: LineColor,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for LineParams {
    fn default() -> Self {
        Self {
            line_color: LineColor::Dark,
        }
    }
}

impl<L: LineSensorArray> LineDetector<L> {
    pub fn new(sensor: L, params: &LineParams) -> Self {
        Self {
            sensor,
            line_color: params.line_color,
        }
    }
}

impl<L: LineSensorArray> Module for LineDetector<L> {
    fn update(&mut self, state: &mut VehicleState) -> Result<(), ModuleError> {
        let reflections = self.sensor.read()?;

        for (p, r) in state.line_pattern.iter_mut().zip(reflections.iter()) {
            let on_line = match self.line_color {
                LineColor::Dark => !r,
                LineColor::Light => *r,
            };

            *p = on_line as u8;
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::sim::SimLineSensor;

    #[test]
    fn test_line_polarity() {
        let sensor = SimLineSensor::new([true, true, false, true, true]);
        let mut state = VehicleState::default();

        let mut dark = LineDetector::new(sensor.clone(), &LineParams { line_color: LineColor::Dark });
        dark.update(&mut state).unwrap();
        assert_eq!(state.line_pattern, [0, 0, 1, 0, 0]);

        let mut light = LineDetector::new(sensor.clone(), &LineParams { line_color: LineColor::Light });
        light.update(&mut state).unwrap();
        assert_eq!(state.line_pattern, [1, 1, 0, 1, 1]);

        sensor.set_reflections([true; 5]);
        dark.update(&mut state).unwrap();
        assert_eq!(state.line_pattern, [0; 5]);
    }
}
