#![allow(dead_code)]

use std::collections::HashMap;

use kleczewsky_world::tween::{Animatable, NodeRef, Property, Target, Value};

/// A property store standing in for the stage.
#[derive(Default)]
pub(crate) struct MockScene {
    pub values: HashMap<(Target, Property), Value>,
    pub writes: usize,
}

impl MockScene {
    pub fn with(mut self, target: Target, property: Property, value: impl Into<Value>) -> Self {
        self.values.insert((target, property), value.into());
        self
    }

    pub fn get(&self, target: &Target, property: Property) -> Option<Value> {
        self.values.get(&(target.clone(), property)).copied()
    }

    pub fn scalar(&self, target: &Target, property: Property) -> f32 {
        self.get(target, property).map(|v| v.scalar()).unwrap_or(f32::NAN)
    }
}

impl Animatable for MockScene {
    fn read(&self, target: &Target, property: Property) -> Option<Value> {
        self.get(target, property)
    }

    fn write(&mut self, target: &Target, property: Property, value: Value) -> bool {
        self.writes += 1;
        match self.values.get_mut(&(target.clone(), property)) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }
}

pub(crate) fn node(id: usize) -> Target {
    Target::Node(NodeRef::new(0, vec![id]))
}

pub(crate) fn assert_close(actual: f32, expected: f32) {
    assert!(
        (actual - expected).abs() < 1e-4,
        "expected {} but got {}",
        expected,
        actual
    );
}
