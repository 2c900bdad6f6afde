//! Where a context's own geometry comes from.

use std::sync::{Arc, Mutex};

use casement_common::Shape;

/// Reports the current on-screen rectangle of this context.
///
/// Polled by [`WindowRegistry::poll_shape_change`](crate::WindowRegistry::poll_shape_change);
/// implementations should be cheap.
pub trait ShapeSource {
    fn current_shape(&self) -> Shape;
}

impl<F: Fn() -> Shape> ShapeSource for F {
    fn current_shape(&self) -> Shape {
        (self)()
    }
}

/// Geometry that never changes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedShape(pub Shape);

impl ShapeSource for FixedShape {
    fn current_shape(&self) -> Shape {
        self.0
    }
}

/// Geometry that can be moved and resized from elsewhere through a cloned
/// handle.
#[derive(Debug, Clone)]
pub struct SharedShape {
    inner: Arc<Mutex<Shape>>,
}

impl SharedShape {
    pub fn new(shape: Shape) -> Self {
        Self {
            inner: Arc::new(Mutex::new(shape)),
        }
    }

    pub fn get(&self) -> Shape {
        match self.inner.lock() {
            Ok(shape) => *shape,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    pub fn set(&self, shape: Shape) {
        self.update(|s| *s = shape);
    }

    pub fn move_by(&self, dx: f64, dy: f64) {
        self.update(|s| {
            s.x += dx;
            s.y += dy;
        });
    }

    pub fn resize(&self, width: f64, height: f64) {
        self.update(|s| {
            s.width = width;
            s.height = height;
        });
    }

    fn update(&self, f: impl FnOnce(&mut Shape)) {
        let mut guard = match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(&mut guard);
    }
}

impl ShapeSource for SharedShape {
    fn current_shape(&self) -> Shape {
        self.get()
    }
}
