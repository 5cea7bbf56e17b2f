//! Tick placement for the map axes and the legend bar

/// Round a raw step up to 1, 2 or 5 times a power of ten
pub fn nice_step(span: f64, max_ticks: usize) -> f64 {
    if !(span.is_finite() && span > 0.0) || max_ticks == 0 {
        return 1.0;
    }
    let raw = span / max_ticks as f64;
    let magnitude = 10f64.powf(raw.log10().floor());
    let normalized = raw / magnitude;
    let nice = if normalized <= 1.0 {
        1.0
    } else if normalized <= 2.0 {
        2.0
    } else if normalized <= 5.0 {
        5.0
    } else {
        10.0
    };
    nice * magnitude
}

/// Evenly spaced round values inside `[min, max]`, at most about `max_ticks` of them
pub fn ticks(min: f64, max: f64, max_ticks: usize) -> Vec<f64> {
    if !(min.is_finite() && max.is_finite()) {
        return Vec::new();
    }
    if max <= min {
        return vec![min];
    }

    let step = nice_step(max - min, max_ticks);
    let eps = step * 1e-9;
    let mut value = (min / step).ceil() * step;
    let mut out = Vec::new();
    while value <= max + eps {
        // Snap values like 1e-17 back to zero so they print as "0"
        out.push(if value.abs() < eps { 0.0 } else { value });
        value += step;
    }
    out
}

/// Format a tick value with just enough decimals for its step
pub fn format_tick(value: f64, step: f64) -> String {
    let decimals = if step >= 1.0 || step <= 0.0 {
        0
    } else {
        (-step.log10().floor()) as usize
    };
    format!("{:.*}", decimals, value)
}
