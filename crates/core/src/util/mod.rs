pub mod range;

use nalgebra::Vector3;

/// A macro to measure the evaluation time of an expression. Wraps an
/// expression, logs how long it took to evaluate, and returns its value.
#[macro_export]
macro_rules! timed {
    ($label:expr, $ex:expr) => {
        $crate::timed!($label, log::Level::Debug, $ex)
    };
    ($label:expr, $log_level:expr, $ex:expr) => {{
        let now = std::time::Instant::now();
        let value = $ex;
        let elapsed = now.elapsed();
        log::log!($log_level, "{} took {} ms", $label, elapsed.as_millis());
        value
    }};
}

/// Calculate the number of tiles in a hexasphere based on its subdivision
/// factor. 2 divisions means 42 tiles, 3 is 92, 4 is 162, etc.
pub fn tile_count(divisions: u32) -> usize {
    // Every subdivision of the icosahedron gives 10n² triangle vertices that
    // aren't one of the original 12 corners, plus those corners. Each vertex
    // becomes one tile in the dual.
    let n = divisions as usize;
    10 * n * n + 2
}

/// Build an orthonormal basis for the plane tangent to the unit sphere at the
/// given point. Returns `(east, north)`. Near the poles, east is derived from
/// the X axis instead of Y, which would be degenerate.
pub fn tangent_frame(normal: &Vector3<f64>) -> (Vector3<f64>, Vector3<f64>) {
    let normal = normal.normalize();
    let reference = if normal.y.abs() > 0.999 {
        Vector3::x()
    } else {
        Vector3::y()
    };
    let east = reference.cross(&normal).normalize();
    let north = normal.cross(&east);
    (east, north)
}
