//! The fractal-zoom pattern rendered by the demo.
//!
//! The GLSL body below runs on the GPU; [`Pattern`] is a CPU rendition of the
//! same math used for still exports and tests. Both share [`ZOOM_STEPS`].
//!
//! Pattern after "Shader Art Coding" by kishimisu (<https://www.shadertoy.com/view/mtyGWy>).

use glam::{Vec2, Vec3, Vec4};

/// Number of fold/accumulate iterations per pixel.
pub const ZOOM_STEPS: u32 = 4;

const ZOOM_FACTOR: f32 = 1.5;
/// The shader's `2π`, written as the same truncated literal the GLSL uses.
const PALETTE_SCALE: f32 = 6.28318;
const PALETTE_PHASE: Vec3 = Vec3::new(0.263, 0.416, 0.557);
const RING_FREQUENCY: f32 = 8.0;
const GLOW_NUMERATOR: f32 = 0.01;
const GLOW_SHARPNESS: f32 = 1.2;

/// ShaderToy-style `mainImage` body. `ZOOM_STEPS` is supplied as a define when
/// the source is wrapped.
pub const FRAGMENT_BODY: &str = r"vec3 palette(float t) {
    vec3 a = vec3(0.5, 0.5, 0.5);
    vec3 b = vec3(0.5, 0.5, 0.5);
    vec3 c = vec3(1.0, 1.0, 1.0);
    vec3 d = vec3(0.263, 0.416, 0.557);
    return a + b * cos(6.28318 * (c * t + d));
}

void mainImage(out vec4 fragColor, in vec2 fragCoord) {
    vec2 uv = (fragCoord * 2.0 - iResolution.xy) / iResolution.y;
    vec2 uv0 = uv;
    vec3 finalColor = vec3(0.0);

    for (int n = 0; n < ZOOM_STEPS; n++) {
        float i = float(n);
        uv = fract(uv * 1.5) - 0.5;

        float d = length(uv) * exp(-length(uv0));
        vec3 col = palette(length(uv0) + i * 0.4 + iTime * 0.4);

        d = sin(d * 8.0 + iTime) / 8.0;
        d = abs(d);
        d = pow(0.01 / d, 1.2);

        finalColor += col * d;
    }

    fragColor = vec4(finalColor, 1.0);
}
";

/// Cosine palette, `0.5 + 0.5 * cos(6.28318 (t + phase))`.
pub fn palette(t: f32) -> Vec3 {
    let angle = (Vec3::splat(t) + PALETTE_PHASE) * PALETTE_SCALE;
    Vec3::splat(0.5) + Vec3::splat(0.5) * Vec3::new(angle.x.cos(), angle.y.cos(), angle.z.cos())
}

/// Centered, aspect-corrected coordinate: the viewport center maps to the origin
/// and the vertical extent spans `[-1, 1]`.
pub fn normalize(frag_coord: Vec2, resolution: Vec2) -> Vec2 {
    (frag_coord * 2.0 - resolution) / resolution.y
}

/// GLSL `fract`, which floors toward negative infinity.
fn fract(v: Vec2) -> Vec2 {
    v - v.floor()
}

/// One accumulation step of the zoom loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomStep {
    pub index: u32,
    pub folded: Vec2,
    pub color: Vec3,
    pub glow: f32,
}

impl ZoomStep {
    pub fn contribution(&self) -> Vec3 {
        self.color * self.glow
    }
}

/// Evaluates the pattern for one frame's uniforms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pattern {
    time: f32,
    resolution: Vec2,
}

impl Pattern {
    /// `resolution` is the `iResolution` uniform; only `x` and `y` matter.
    pub fn new(time: f32, resolution: [f32; 3]) -> Self {
        Self {
            time,
            resolution: Vec2::new(resolution[0], resolution[1]),
        }
    }

    /// The fold/accumulate iterations for `frag_coord`, in order.
    pub fn steps(&self, frag_coord: Vec2) -> impl Iterator<Item = ZoomStep> {
        let origin = normalize(frag_coord, self.resolution);
        let time = self.time;
        let falloff = (-origin.length()).exp();
        let mut uv = origin;

        (0..ZOOM_STEPS).map(move |index| {
            uv = fract(uv * ZOOM_FACTOR) - Vec2::splat(0.5);
            let distance = uv.length() * falloff;
            let color = palette(origin.length() + index as f32 * 0.4 + time * 0.4);
            let ring = ((distance * RING_FREQUENCY + time).sin() / RING_FREQUENCY).abs();
            let glow = (GLOW_NUMERATOR / ring).powf(GLOW_SHARPNESS);
            ZoomStep {
                index,
                folded: uv,
                color,
                glow,
            }
        })
    }

    /// RGBA color for `frag_coord` (bottom-left origin, pixel centers at `.5`).
    pub fn shade(&self, frag_coord: Vec2) -> Vec4 {
        let color = self
            .steps(frag_coord)
            .fold(Vec3::ZERO, |acc, step| acc + step.contribution());
        color.extend(1.0)
    }
}
