// Per-measure voice behaviors.
//
// Each pitched voice picks one behavior per measure. A behavior is a closed
// enum variant carrying everything it drew up front (which burst shape,
// which octave shift, which pad degree), and `render` turns it plus the
// measure's motif into exactly one measure of events.
//
// Catalogs:
// - `BassBehavior`: burst / dense / simple / groove onset grids.
// - `LeadBehavior`: either a `RhythmBehavior` onset grid (full, groove,
//   simple, burst) or a support-style texture borrowed from the support
//   voice's catalog.
// - `SupportBehavior`: plain, octave swap, double rhythm, ambient pad,
//   stepping pad, stab harmony.
//
// All rendering goes through `TrackBuilder` (assembler.rs), so a behavior
// only decides what sounds where; the builder owns the clock and checks the
// measure length. Pads shorter than the measure close with an explicit rest.

use crate::assembler::{Role, TrackBuilder};
use crate::config::STEPS_PER_MEASURE;
use crate::motif::Motif;
use crate::scale::{Key, to_midi_pitch};
use cumbia_prng::SongRng;

/// Onset grids shared by the bass and lead catalogs.
const GROOVE_STEPS: [usize; 4] = [0, 4, 8, 12];
const SIMPLE_STEPS: [usize; 1] = [0];
const BURST_SHORT: [usize; 2] = [0, 8];
const BURST_LONG: [usize; 3] = [0, 8, 12];

/// Accent grids for stab harmony.
pub const STAB_PATTERNS: [&[usize]; 3] = [
    &[0, 4, 8, 12],
    &[1, 5, 9, 13],
    &[0, 3, 5, 7, 10, 12],
];

/// Scale-degree indices a pad may rest on (root, third, fifth).
const PAD_DEGREES: [usize; 3] = [0, 2, 4];
/// Pad lengths in steps.
const PAD_STEPS: [usize; 2] = [8, 16];

/// Note-on and note-off velocities for one kind of note.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dynamics {
    pub on: u8,
    pub off: u8,
}

impl Dynamics {
    pub const fn new(on: u8, off: u8) -> Self {
        Dynamics { on, off }
    }
}

/// Read-only inputs for rendering one measure of one voice.
#[derive(Debug, Clone, Copy)]
pub struct MeasureContext<'a> {
    pub key: &'a Key,
    pub motif: &'a Motif,
    pub role: Role,
    /// Octave offset from the key root.
    pub octave: i32,
    pub ticks_per_step: u32,
}

impl MeasureContext<'_> {
    /// Quantized pitch of the motif degree at `step`, shifted by extra octaves.
    pub fn motif_pitch(&self, step: usize, octave_shift: i32, rng: &mut SongRng) -> u8 {
        let candidate = self.key.root as i32
            + self.motif.degree_at(step)
            + 12 * (self.octave + octave_shift);
        to_midi_pitch(self.key.quantize(candidate, rng))
    }

    /// Quantized pitch of a scale degree (index into the scale) at this octave.
    pub fn scale_pitch(&self, degree: usize, rng: &mut SongRng) -> u8 {
        let candidate = self.key.degree_pitch(degree, self.octave);
        to_midi_pitch(self.key.quantize(candidate, rng))
    }

    pub fn ticks_per_measure(&self) -> u32 {
        self.ticks_per_step * STEPS_PER_MEASURE as u32
    }
}

/// A per-measure behavior catalog for one voice kind.
pub trait VoiceBehavior: Sized {
    /// Draw this measure's behavior and any parameters it needs.
    fn choose(rng: &mut SongRng) -> Self;

    /// Write exactly one measure into `out`.
    fn render(&self, ctx: &MeasureContext<'_>, out: &mut TrackBuilder, rng: &mut SongRng);

    fn name(&self) -> &'static str;
}

/// Sound one-step notes on the given steps, resting everywhere else.
fn render_onsets(
    ctx: &MeasureContext<'_>,
    out: &mut TrackBuilder,
    onsets: &[usize],
    dynamics: Dynamics,
    rng: &mut SongRng,
) {
    for step in 0..STEPS_PER_MEASURE {
        if onsets.contains(&step) {
            let pitch = ctx.motif_pitch(step, 0, rng);
            out.note(pitch, dynamics.on, dynamics.off, ctx.ticks_per_step);
        } else {
            out.rest(ctx.ticks_per_step);
        }
    }
}

fn draw_burst(rng: &mut SongRng) -> &'static [usize] {
    if rng.random_bool(0.5) {
        &BURST_SHORT
    } else {
        &BURST_LONG
    }
}

// ---------------------------------------------------------------------------
// Bass
// ---------------------------------------------------------------------------

const BASS_DYNAMICS: Dynamics = Dynamics::new(90, 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BassBehavior {
    /// Downbeat and mid-measure, optionally with a pickup on step 12.
    Burst { onsets: &'static [usize] },
    /// Every even step.
    Dense,
    /// A single downbeat.
    Simple,
    /// Every beat.
    Groove,
}

impl BassBehavior {
    const WEIGHTS: [u32; 4] = [30, 35, 10, 25];

    pub fn onsets(&self) -> Vec<usize> {
        match self {
            BassBehavior::Burst { onsets } => onsets.to_vec(),
            BassBehavior::Dense => (0..STEPS_PER_MEASURE).step_by(2).collect(),
            BassBehavior::Simple => SIMPLE_STEPS.to_vec(),
            BassBehavior::Groove => GROOVE_STEPS.to_vec(),
        }
    }
}

impl VoiceBehavior for BassBehavior {
    fn choose(rng: &mut SongRng) -> Self {
        match rng.weighted_index(&Self::WEIGHTS) {
            0 => BassBehavior::Burst {
                onsets: draw_burst(rng),
            },
            1 => BassBehavior::Dense,
            2 => BassBehavior::Simple,
            _ => BassBehavior::Groove,
        }
    }

    fn render(&self, ctx: &MeasureContext<'_>, out: &mut TrackBuilder, rng: &mut SongRng) {
        render_onsets(ctx, out, &self.onsets(), BASS_DYNAMICS, rng);
    }

    fn name(&self) -> &'static str {
        match self {
            BassBehavior::Burst { .. } => "burst",
            BassBehavior::Dense => "dense",
            BassBehavior::Simple => "simple",
            BassBehavior::Groove => "groove",
        }
    }
}

// ---------------------------------------------------------------------------
// Lead rhythm grids
// ---------------------------------------------------------------------------

const LEAD_RHYTHM_DYNAMICS: Dynamics = Dynamics::new(80, 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RhythmBehavior {
    /// All sixteen steps.
    Full,
    Groove,
    Simple,
    Burst { onsets: &'static [usize] },
}

impl RhythmBehavior {
    const WEIGHTS: [u32; 4] = [50, 20, 15, 15];

    pub fn onsets(&self) -> Vec<usize> {
        match self {
            RhythmBehavior::Full => (0..STEPS_PER_MEASURE).collect(),
            RhythmBehavior::Groove => GROOVE_STEPS.to_vec(),
            RhythmBehavior::Simple => SIMPLE_STEPS.to_vec(),
            RhythmBehavior::Burst { onsets } => onsets.to_vec(),
        }
    }

    fn choose(rng: &mut SongRng) -> Self {
        match rng.weighted_index(&Self::WEIGHTS) {
            0 => RhythmBehavior::Full,
            1 => RhythmBehavior::Groove,
            2 => RhythmBehavior::Simple,
            _ => RhythmBehavior::Burst {
                onsets: draw_burst(rng),
            },
        }
    }

    fn name(&self) -> &'static str {
        match self {
            RhythmBehavior::Full => "full",
            RhythmBehavior::Groove => "groove",
            RhythmBehavior::Simple => "simple",
            RhythmBehavior::Burst { .. } => "burst",
        }
    }
}

// ---------------------------------------------------------------------------
// Support textures
// ---------------------------------------------------------------------------

const PAD_DYNAMICS: Dynamics = Dynamics::new(42, 35);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupportBehavior {
    /// The motif restated one note per step.
    Plain,
    /// Plain, transposed a whole octave (`shift` is +1 or -1).
    OctaveSwap { shift: i32 },
    /// Each motif degree twice, at half-step length.
    DoubleRhythm,
    /// One sustained scale tone, then silence to the barline.
    AmbientPad { degree: usize, steps: usize },
    /// Two half-measure scale tones.
    SteppingPad { first: usize, second: usize },
    /// Motif notes on accent steps only.
    StabHarmony { accents: &'static [usize] },
}

impl SupportBehavior {
    /// Draw one of the support voice's own textures.
    pub fn choose_support(rng: &mut SongRng) -> Self {
        match rng.range_usize(0, 5) {
            0 => SupportBehavior::Plain,
            1 => Self::octave_swap(rng),
            2 => SupportBehavior::DoubleRhythm,
            3 => Self::ambient_pad(rng),
            _ => Self::stab_harmony(rng),
        }
    }

    /// Draw a texture for a support-style lead measure.
    pub fn choose_lead_style(rng: &mut SongRng) -> Self {
        match rng.range_usize(0, 5) {
            0 => Self::ambient_pad(rng),
            1 => Self::stepping_pad(rng),
            2 => Self::stab_harmony(rng),
            3 => Self::octave_swap(rng),
            _ => SupportBehavior::DoubleRhythm,
        }
    }

    fn octave_swap(rng: &mut SongRng) -> Self {
        SupportBehavior::OctaveSwap {
            shift: rng.random_sign(),
        }
    }

    fn ambient_pad(rng: &mut SongRng) -> Self {
        SupportBehavior::AmbientPad {
            degree: *rng.choose(&PAD_DEGREES),
            steps: *rng.choose(&PAD_STEPS),
        }
    }

    fn stepping_pad(rng: &mut SongRng) -> Self {
        let picks = rng.sample_indices(PAD_DEGREES.len(), 2);
        SupportBehavior::SteppingPad {
            first: PAD_DEGREES[picks[0]],
            second: PAD_DEGREES[picks[1]],
        }
    }

    fn stab_harmony(rng: &mut SongRng) -> Self {
        SupportBehavior::StabHarmony {
            accents: *rng.choose(&STAB_PATTERNS),
        }
    }

    /// Velocities by texture and by which voice is playing it.
    fn dynamics(&self, role: Role) -> Dynamics {
        let lead = role == Role::Lead;
        match self {
            SupportBehavior::Plain => Dynamics::new(75, 60),
            SupportBehavior::OctaveSwap { .. } if lead => Dynamics::new(80, 60),
            SupportBehavior::OctaveSwap { .. } => Dynamics::new(70, 60),
            SupportBehavior::DoubleRhythm if lead => Dynamics::new(70, 60),
            SupportBehavior::DoubleRhythm => Dynamics::new(60, 50),
            SupportBehavior::AmbientPad { .. } | SupportBehavior::SteppingPad { .. } => {
                PAD_DYNAMICS
            }
            SupportBehavior::StabHarmony { .. } if lead => Dynamics::new(75, 60),
            SupportBehavior::StabHarmony { .. } => Dynamics::new(70, 60),
        }
    }
}

impl VoiceBehavior for SupportBehavior {
    fn choose(rng: &mut SongRng) -> Self {
        Self::choose_support(rng)
    }

    fn render(&self, ctx: &MeasureContext<'_>, out: &mut TrackBuilder, rng: &mut SongRng) {
        let dynamics = self.dynamics(ctx.role);
        let step = ctx.ticks_per_step;
        match *self {
            SupportBehavior::Plain => {
                for s in 0..STEPS_PER_MEASURE {
                    let pitch = ctx.motif_pitch(s, 0, rng);
                    out.note(pitch, dynamics.on, dynamics.off, step);
                }
            }
            SupportBehavior::OctaveSwap { shift } => {
                for s in 0..STEPS_PER_MEASURE {
                    let pitch = ctx.motif_pitch(s, shift, rng);
                    out.note(pitch, dynamics.on, dynamics.off, step);
                }
            }
            SupportBehavior::DoubleRhythm => {
                for s in 0..STEPS_PER_MEASURE * 2 {
                    let pitch = ctx.motif_pitch(s / 2, 0, rng);
                    out.note(pitch, dynamics.on, dynamics.off, step / 2);
                }
            }
            SupportBehavior::AmbientPad { degree, steps } => {
                let pitch = ctx.scale_pitch(degree, rng);
                out.note(pitch, dynamics.on, dynamics.off, steps as u32 * step);
                out.rest((STEPS_PER_MEASURE - steps) as u32 * step);
            }
            SupportBehavior::SteppingPad { first, second } => {
                let half = STEPS_PER_MEASURE as u32 / 2 * step;
                let first_pitch = ctx.scale_pitch(first, rng);
                let second_pitch = ctx.scale_pitch(second, rng);
                out.note(first_pitch, dynamics.on, dynamics.off, half);
                out.note(second_pitch, dynamics.on, dynamics.off, half);
            }
            SupportBehavior::StabHarmony { accents } => {
                render_onsets(ctx, out, accents, dynamics, rng);
            }
        }
    }

    fn name(&self) -> &'static str {
        match self {
            SupportBehavior::Plain => "plain",
            SupportBehavior::OctaveSwap { .. } => "octave_swap",
            SupportBehavior::DoubleRhythm => "double_rhythm",
            SupportBehavior::AmbientPad { .. } => "ambient_pad",
            SupportBehavior::SteppingPad { .. } => "stepping_pad",
            SupportBehavior::StabHarmony { .. } => "stab_harmony",
        }
    }
}

// ---------------------------------------------------------------------------
// Lead
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeadBehavior {
    Rhythmic(RhythmBehavior),
    /// A support texture that fills the whole measure on its own.
    SupportStyle(SupportBehavior),
}

impl LeadBehavior {
    /// Rhythmic vs support-style split.
    const WEIGHTS: [u32; 2] = [60, 40];
}

impl VoiceBehavior for LeadBehavior {
    fn choose(rng: &mut SongRng) -> Self {
        if rng.weighted_index(&Self::WEIGHTS) == 0 {
            LeadBehavior::Rhythmic(RhythmBehavior::choose(rng))
        } else {
            LeadBehavior::SupportStyle(SupportBehavior::choose_lead_style(rng))
        }
    }

    fn render(&self, ctx: &MeasureContext<'_>, out: &mut TrackBuilder, rng: &mut SongRng) {
        match self {
            LeadBehavior::Rhythmic(rhythm) => {
                render_onsets(ctx, out, &rhythm.onsets(), LEAD_RHYTHM_DYNAMICS, rng);
            }
            LeadBehavior::SupportStyle(texture) => texture.render(ctx, out, rng),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            LeadBehavior::Rhythmic(rhythm) => rhythm.name(),
            LeadBehavior::SupportStyle(texture) => texture.name(),
        }
    }
}
