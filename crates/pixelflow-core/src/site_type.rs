//! The physical site model: sources and obstacles.
//!
//! A [`SiteType`] is immutable and shared by every site that refers to
//! it. Its [`SiteKind`] is a tagged union; the update kernel matches on
//! the variant instead of dispatching through a trait object.

use std::f64::consts::TAU;
use std::fmt;

use crate::direction::Direction;
use crate::error::ConfigError;

/// A 4×4 matrix over flow slots, indexed `[out][in]` in
/// [`Direction`] slot order.
pub type CouplingMatrix = [[f64; 4]; 4];

const REFLECTION_PATTERN: CouplingMatrix = [
    [0.0, -1.0, 0.0, 0.0],
    [-1.0, 0.0, 0.0, 0.0],
    [0.0, 0.0, 0.0, -1.0],
    [0.0, 0.0, -1.0, 0.0],
];

const TRANSMISSION_PATTERN: CouplingMatrix = [
    [1.0, -1.0, 1.0, 1.0],
    [-1.0, 1.0, 1.0, 1.0],
    [1.0, 1.0, 1.0, -1.0],
    [1.0, 1.0, -1.0, 1.0],
];

/// Slack allowed on `beta² + beta·gamma + gamma² ≤ 1` for coefficients
/// read from decimal text.
const COEFFICIENT_TOLERANCE: f64 = 1e-9;

// ── Color ──────────────────────────────────────────────────────────

/// Display colour of a site type. Opaque to the simulation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Color {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

impl Color {
    /// White.
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    /// Dark gray.
    pub const DARK_GRAY: Color = Color::rgb(64, 64, 64);
    /// Blue.
    pub const BLUE: Color = Color::rgb(0, 0, 255);
    /// Magenta.
    pub const MAGENTA: Color = Color::rgb(255, 0, 255);

    /// Build a colour from its channels.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

// ── SourceParams ───────────────────────────────────────────────────

/// Parameters of an energy source.
///
/// The emitted value is a pure function of simulated time; a source has
/// no internal state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SourceParams {
    frequency: f64,
    amplitude: f64,
    constant: bool,
}

impl SourceParams {
    /// A sinusoidal source emitting `amplitude · sin(2π · frequency · t)`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidSiteParameters`] if either value is
    /// not finite or the frequency is not positive.
    pub fn sine(frequency: f64, amplitude: f64) -> Result<Self, ConfigError> {
        if !frequency.is_finite() || frequency <= 0.0 {
            return Err(ConfigError::InvalidSiteParameters {
                reason: format!("source frequency must be finite and positive, got {frequency}"),
            });
        }
        Self::check_amplitude(amplitude)?;
        Ok(Self {
            frequency,
            amplitude,
            constant: false,
        })
    }

    /// A source emitting `amplitude` at every instant.
    pub fn constant(amplitude: f64) -> Result<Self, ConfigError> {
        Self::check_amplitude(amplitude)?;
        Ok(Self {
            frequency: 0.0,
            amplitude,
            constant: true,
        })
    }

    fn check_amplitude(amplitude: f64) -> Result<(), ConfigError> {
        if amplitude.is_finite() {
            Ok(())
        } else {
            Err(ConfigError::InvalidSiteParameters {
                reason: format!("source amplitude must be finite, got {amplitude}"),
            })
        }
    }

    /// Oscillation frequency (zero for constant sources).
    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    /// Peak emitted value.
    pub fn amplitude(&self) -> f64 {
        self.amplitude
    }

    /// Whether the source ignores time.
    pub fn is_constant(&self) -> bool {
        self.constant
    }

    /// Value emitted at simulated time `t`.
    pub fn value(&self, t: f64) -> f64 {
        if self.constant {
            self.amplitude
        } else {
            self.amplitude * (TAU * self.frequency * t).sin()
        }
    }
}

// ── ObstacleParams ─────────────────────────────────────────────────

/// Parameters of a passive obstacle and its derived coupling matrices.
///
/// `beta` is the transmission coefficient and `gamma` the reflection
/// coefficient. The matrices and loss factor are computed once here so
/// the per-step kernel only does a matrix-vector product.
#[derive(Clone, Debug, PartialEq)]
pub struct ObstacleParams {
    beta: f64,
    gamma: f64,
    energy_to_raise_one_degree: f32,
    gamma_matrix: CouplingMatrix,
    beta_matrix: CouplingMatrix,
    scattering: CouplingMatrix,
    energy_loss_factor: f64,
}

impl ObstacleParams {
    /// Build obstacle parameters, deriving the coupling matrices.
    ///
    /// `energy_to_raise_one_degree` is the heat capacity proxy; use
    /// `f32::MAX` for a medium that never warms up.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidSiteParameters`] if a coefficient is
    /// not finite, if `beta² + beta·gamma + gamma² > 1`, or if the heat
    /// capacity is not positive.
    pub fn new(beta: f64, gamma: f64, energy_to_raise_one_degree: f32) -> Result<Self, ConfigError> {
        if !beta.is_finite() || !gamma.is_finite() {
            return Err(ConfigError::InvalidSiteParameters {
                reason: format!("coefficients must be finite, got beta={beta} gamma={gamma}"),
            });
        }
        let coupling = beta * beta + beta * gamma + gamma * gamma;
        if coupling > 1.0 + COEFFICIENT_TOLERANCE {
            return Err(ConfigError::InvalidSiteParameters {
                reason: format!(
                    "beta² + beta·gamma + gamma² must not exceed 1, got {coupling} (beta={beta}, gamma={gamma})"
                ),
            });
        }
        if energy_to_raise_one_degree.is_nan() || energy_to_raise_one_degree <= 0.0 {
            return Err(ConfigError::InvalidSiteParameters {
                reason: format!(
                    "energy to raise one degree must be positive, got {energy_to_raise_one_degree}"
                ),
            });
        }

        let gamma_matrix = scale(&REFLECTION_PATTERN, gamma);
        let beta_matrix = scale(&TRANSMISSION_PATTERN, beta / 2.0);
        let mut scattering = [[0.0; 4]; 4];
        for (out, row) in scattering.iter_mut().enumerate() {
            for (inp, cell) in row.iter_mut().enumerate() {
                *cell = gamma_matrix[out][inp] + beta_matrix[out][inp];
            }
        }

        Ok(Self {
            beta,
            gamma,
            energy_to_raise_one_degree,
            gamma_matrix,
            beta_matrix,
            scattering,
            energy_loss_factor: (1.0 - coupling).max(0.0),
        })
    }

    /// Transmission coefficient.
    pub fn beta(&self) -> f64 {
        self.beta
    }

    /// Reflection coefficient.
    pub fn gamma(&self) -> f64 {
        self.gamma
    }

    /// Reflection matrix, `gamma` times the slot-swap pattern.
    pub fn gamma_matrix(&self) -> &CouplingMatrix {
        &self.gamma_matrix
    }

    /// Transmission matrix, `beta / 2` times the scattering pattern.
    pub fn beta_matrix(&self) -> &CouplingMatrix {
        &self.beta_matrix
    }

    /// `1 − gamma² − beta·gamma − beta²`; zero for a lossless medium.
    pub fn energy_loss_factor(&self) -> f64 {
        self.energy_loss_factor
    }

    /// Energy needed to raise the temperature by one degree.
    pub fn energy_to_raise_one_degree(&self) -> f32 {
        self.energy_to_raise_one_degree
    }

    /// Outgoing flows for the given incoming flows:
    /// `gammaMatrix · f + betaMatrix · f`.
    ///
    /// Component `d` of the result leaves the site travelling in
    /// direction `d`.
    pub fn scatter(&self, flows: &[f64; 4]) -> [f64; 4] {
        let mut out = [0.0; 4];
        for (o, row) in out.iter_mut().zip(self.scattering.iter()) {
            *o = row.iter().zip(flows.iter()).map(|(m, f)| m * f).sum();
        }
        out
    }

    /// Temperature increase from absorbing part of `flows` over `dt`.
    pub fn heat_gain(&self, flows: &[f64; 4], dt: f64) -> f64 {
        if self.energy_loss_factor == 0.0 {
            return 0.0;
        }
        let magnitude: f64 = flows.iter().map(|f| f * f).sum();
        self.energy_loss_factor * dt * magnitude / f64::from(self.energy_to_raise_one_degree)
    }
}

fn scale(pattern: &CouplingMatrix, factor: f64) -> CouplingMatrix {
    let mut m = *pattern;
    for row in m.iter_mut() {
        for cell in row.iter_mut() {
            *cell *= factor;
        }
    }
    m
}

// ── SiteType ───────────────────────────────────────────────────────

/// Physical behaviour of a site type.
#[derive(Clone, Debug, PartialEq)]
pub enum SiteKind {
    /// Emits a time-dependent value uniformly in all four directions.
    Source(SourceParams),
    /// Scatters incoming flow and absorbs part of it as heat.
    Obstacle(ObstacleParams),
}

/// A named, immutable cell kind shared by many sites.
///
/// Two site types are equal when their names are equal; the registry
/// rejects duplicates.
#[derive(Clone, Debug)]
pub struct SiteType {
    name: String,
    color: Color,
    kind: SiteKind,
}

impl SiteType {
    /// Create a site type from its parts.
    pub fn new(name: impl Into<String>, color: Color, kind: SiteKind) -> Self {
        Self {
            name: name.into(),
            color,
            kind,
        }
    }

    /// A sinusoidal source type.
    pub fn source(
        name: impl Into<String>,
        color: Color,
        frequency: f64,
        amplitude: f64,
    ) -> Result<Self, ConfigError> {
        Ok(Self::new(
            name,
            color,
            SiteKind::Source(SourceParams::sine(frequency, amplitude)?),
        ))
    }

    /// An obstacle type.
    pub fn obstacle(
        name: impl Into<String>,
        color: Color,
        beta: f64,
        gamma: f64,
        energy_to_raise_one_degree: f32,
    ) -> Result<Self, ConfigError> {
        Ok(Self::new(
            name,
            color,
            SiteKind::Obstacle(ObstacleParams::new(beta, gamma, energy_to_raise_one_degree)?),
        ))
    }

    /// Type name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Display colour.
    pub fn color(&self) -> Color {
        self.color
    }

    /// Physical behaviour.
    pub fn kind(&self) -> &SiteKind {
        &self.kind
    }

    /// Source parameters, if this is a source.
    pub fn as_source(&self) -> Option<&SourceParams> {
        match &self.kind {
            SiteKind::Source(p) => Some(p),
            SiteKind::Obstacle(_) => None,
        }
    }

    /// Obstacle parameters, if this is an obstacle.
    pub fn as_obstacle(&self) -> Option<&ObstacleParams> {
        match &self.kind {
            SiteKind::Obstacle(p) => Some(p),
            SiteKind::Source(_) => None,
        }
    }

    /// Whether this is a source.
    pub fn is_source(&self) -> bool {
        matches!(self.kind, SiteKind::Source(_))
    }
}

impl PartialEq for SiteType {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for SiteType {}

impl fmt::Display for SiteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

// Slot order sanity for the patterns above.
const _: () = {
    assert!(Direction::Right as usize == 0);
    assert!(Direction::Left as usize == 1);
    assert!(Direction::Down as usize == 2);
    assert!(Direction::Up as usize == 3);
};

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn energy(f: &[f64; 4]) -> f64 {
        f.iter().map(|v| v * v).sum()
    }

    // ── Source ──────────────────────────────────────────────────

    #[test]
    fn source_value_starts_at_zero() {
        let s = SourceParams::sine(24.5, 40.0).unwrap();
        assert_eq!(s.value(0.0), 0.0);
    }

    #[test]
    fn source_peaks_at_quarter_period() {
        let s = SourceParams::sine(24.5, 40.0).unwrap();
        let quarter = 0.25 / 24.5;
        assert!((s.value(quarter) - 40.0).abs() < 1e-9);
    }

    #[test]
    fn constant_source_ignores_time() {
        let s = SourceParams::constant(3.5).unwrap();
        assert!(s.is_constant());
        assert_eq!(s.value(0.0), 3.5);
        assert_eq!(s.value(123.4), 3.5);
    }

    #[test]
    fn source_rejects_non_positive_frequency() {
        assert!(SourceParams::sine(0.0, 1.0).is_err());
        assert!(SourceParams::sine(-2.0, 1.0).is_err());
        assert!(SourceParams::sine(f64::NAN, 1.0).is_err());
        assert!(SourceParams::constant(f64::INFINITY).is_err());
    }

    // ── Obstacle ────────────────────────────────────────────────

    #[test]
    fn air_has_zero_reflection_and_no_loss() {
        let air = ObstacleParams::new(1.0, 0.0, f32::MAX).unwrap();
        assert!(air.gamma_matrix().iter().flatten().all(|v| *v == 0.0));
        assert_eq!(air.energy_loss_factor(), 0.0);
    }

    #[test]
    fn wall_reflects_back_towards_sender() {
        let wall = ObstacleParams::new(0.0, 1.0, f32::MAX).unwrap();
        // Flow travelling right hits the wall and leaves travelling left.
        let out = wall.scatter(&[2.0, 0.0, 0.0, 0.0]);
        assert_eq!(out, [0.0, -2.0, 0.0, 0.0]);
        assert_eq!(wall.energy_loss_factor(), 0.0);
    }

    #[test]
    fn water_is_lossy() {
        let water = ObstacleParams::new(0.93, 0.0, 4.2).unwrap();
        let expected = 1.0 - 0.93 * 0.93;
        assert!((water.energy_loss_factor() - expected).abs() < 1e-12);
        let gain = water.heat_gain(&[1.0, 0.0, 0.0, 1.0], 0.5);
        assert!((gain - expected * 0.5 * 2.0 / 4.2f32 as f64).abs() < 1e-9);
    }

    #[test]
    fn rejects_coupling_above_one() {
        let err = ObstacleParams::new(0.9, 0.5, 1.0).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidSiteParameters { .. }));
    }

    #[test]
    fn rejects_non_positive_heat_capacity() {
        assert!(ObstacleParams::new(0.5, 0.0, 0.0).is_err());
        assert!(ObstacleParams::new(0.5, 0.0, -1.0).is_err());
    }

    #[test]
    fn beta_matrix_matches_definition() {
        let o = ObstacleParams::new(0.6, 0.2, 1.0).unwrap();
        assert_eq!(o.beta_matrix()[0], [0.3, -0.3, 0.3, 0.3]);
        assert_eq!(o.gamma_matrix()[2], [0.0, 0.0, 0.0, -0.2]);
    }

    #[test]
    fn site_types_compare_by_name() {
        let a = SiteType::obstacle("air", Color::WHITE, 1.0, 0.0, f32::MAX).unwrap();
        let b = SiteType::source("air", Color::MAGENTA, 1.0, 1.0).unwrap();
        let c = SiteType::obstacle("wall", Color::WHITE, 1.0, 0.0, f32::MAX).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(b.is_source());
        assert!(a.as_obstacle().is_some());
    }

    proptest! {
        #[test]
        fn lossless_transmission_preserves_energy(
            r in -100.0f64..100.0,
            l in -100.0f64..100.0,
            d in -100.0f64..100.0,
            u in -100.0f64..100.0,
        ) {
            let air = ObstacleParams::new(1.0, 0.0, f32::MAX).unwrap();
            let f = [r, l, d, u];
            let out = air.scatter(&f);
            let before = energy(&f);
            prop_assert!((energy(&out) - before).abs() <= 1e-9 * before.max(1.0));
        }

        #[test]
        fn pure_transmission_scales_energy_by_beta_squared(
            beta in 0.0f64..1.0,
            f in prop::array::uniform4(-10.0f64..10.0),
        ) {
            let o = ObstacleParams::new(beta, 0.0, 1.0).unwrap();
            let expected = beta * beta * energy(&f);
            prop_assert!((energy(&o.scatter(&f)) - expected).abs() <= 1e-9 * expected.max(1.0));
        }

        #[test]
        fn source_is_periodic(t in 0.0f64..10.0) {
            let s = SourceParams::sine(24.5, 40.0).unwrap();
            let period = 1.0 / 24.5;
            prop_assert!((s.value(t) - s.value(t + period)).abs() < 1e-6);
        }
    }
}
