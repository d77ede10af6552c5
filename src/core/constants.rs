//! Constants shared by the state engine and the angle resolver.

/// Prototype amplitude vectors and angle constants
pub mod mbqc_constants {
    use num_complex::Complex;
    use std::f64::consts::{FRAC_1_SQRT_2, PI as STD_PI};

    /// Used for measurement angles and the `t`-signal shift.
    pub const PI: f64 = STD_PI;

    /// `|+⟩ = (|0⟩ + |1⟩)/√2`, the ancilla tensored onto a group by `add_qubit`.
    pub const PLUS_STATE: [Complex<f64>; 2] = [
        Complex::new(FRAC_1_SQRT_2, 0.0),
        Complex::new(FRAC_1_SQRT_2, 0.0),
    ];

    /// `CZ |+⟩|+⟩ = ½(|00⟩ + |01⟩ + |10⟩ − |11⟩)`, the state of two freshly
    /// entangled qubits.
    pub const CZ_PLUS_PLUS_STATE: [Complex<f64>; 4] = [
        Complex::new(0.5, 0.0),
        Complex::new(0.5, 0.0),
        Complex::new(0.5, 0.0),
        Complex::new(-0.5, 0.0),
    ];

    /// Angle names every program can use without declaring them.
    pub const BUILTIN_ANGLES: [(&str, f64); 8] = [
        ("PI", PI),
        ("PI/2", PI / 2.0),
        ("PI/4", PI / 4.0),
        ("PI/8", PI / 8.0),
        ("-PI", -PI),
        ("-PI/2", -PI / 2.0),
        ("-PI/4", -PI / 4.0),
        ("-PI/8", -PI / 8.0),
    ];

    /// Slot table size used when no capacity is configured.
    pub const DEFAULT_MAX_TANGLES: usize = i16::MAX as usize;

    /// Smallest slice a rayon worker receives in amplitude loops.
    pub const PARALLEL_MIN_LEN: usize = 1 << 12;
}
