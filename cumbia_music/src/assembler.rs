// Event stream assembly: relative-time note events with measure accounting.
//
// Every track is a flat list of note-on / note-off events whose `delta` is
// the tick delay since the previous event on the same track. Silence is
// carried by a rest marker: a note-off with pitch 0 and velocity 0 whose
// only job is to advance time.
//
// `TrackBuilder` is the small state machine every producer writes through:
//
//   begin_measure -> (note | rest)* -> end_measure
//
// It holds the time already emitted in the current measure and a pending
// rest. `note` flushes the pending rest before sounding; `end_measure`
// flushes whatever is left and then checks the postcondition that the
// measure took exactly `ticks_per_measure` ticks. Overshooting mid-measure
// and falling short at the boundary are both logic defects and panic.
//
// Because every voice goes through this, all four tracks stay phase-aligned
// at every barline no matter how dense each behavior is.

use serde::{Deserialize, Serialize};

/// Note-on or note-off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    On,
    Off,
}

/// A single timed event on one track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NoteEvent {
    pub kind: EventKind,
    /// MIDI pitch; 0 on rest markers.
    pub pitch: u8,
    pub velocity: u8,
    /// Ticks since the previous event on this track.
    pub delta: u32,
    pub channel: u8,
}

impl NoteEvent {
    /// A time-only marker that sounds nothing.
    pub fn rest(delta: u32, channel: u8) -> Self {
        NoteEvent {
            kind: EventKind::Off,
            pitch: 0,
            velocity: 0,
            delta,
            channel,
        }
    }

    pub fn is_rest(&self) -> bool {
        self.kind == EventKind::Off && self.pitch == 0 && self.velocity == 0
    }
}

/// The four parts of an arrangement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Bass,
    Lead,
    Support,
    Drums,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Bass, Role::Lead, Role::Support, Role::Drums];

    /// MIDI channel (0-based; 9 is General MIDI percussion).
    pub fn channel(self) -> u8 {
        match self {
            Role::Bass => 0,
            Role::Lead => 1,
            Role::Support => 2,
            Role::Drums => 9,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Role::Bass => "Bass",
            Role::Lead => "Lead",
            Role::Support => "Support",
            Role::Drums => "Drums",
        }
    }
}

/// A finished track: events plus where each measure starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub role: Role,
    pub channel: u8,
    /// General MIDI program; `None` for percussion.
    pub instrument: Option<u8>,
    pub events: Vec<NoteEvent>,
    /// Index into `events` of the first event of each measure.
    pub measure_starts: Vec<usize>,
}

impl Track {
    pub fn measure_count(&self) -> usize {
        self.measure_starts.len()
    }

    /// Events belonging to one measure.
    pub fn measure_events(&self, measure: usize) -> &[NoteEvent] {
        let start = self.measure_starts[measure];
        let end = self
            .measure_starts
            .get(measure + 1)
            .copied()
            .unwrap_or(self.events.len());
        &self.events[start..end]
    }

    /// Sum of deltas within one measure.
    pub fn measure_ticks(&self, measure: usize) -> u32 {
        self.measure_events(measure).iter().map(|e| e.delta).sum()
    }

    pub fn total_ticks(&self) -> u64 {
        self.events.iter().map(|e| e.delta as u64).sum()
    }

    /// Pitches of every sounding note, in order.
    pub fn sounding_pitches(&self) -> impl Iterator<Item = u8> + '_ {
        self.events
            .iter()
            .filter(|e| e.kind == EventKind::On)
            .map(|e| e.pitch)
    }
}

/// Incremental track writer enforcing the measure-duration invariant.
#[derive(Debug, Clone)]
pub struct TrackBuilder {
    channel: u8,
    ticks_per_measure: u32,
    events: Vec<NoteEvent>,
    measure_starts: Vec<usize>,
    elapsed_in_measure: u32,
    pending_rest: u32,
    in_measure: bool,
}

impl TrackBuilder {
    pub fn new(channel: u8, ticks_per_measure: u32) -> Self {
        TrackBuilder {
            channel,
            ticks_per_measure,
            events: Vec::new(),
            measure_starts: Vec::new(),
            elapsed_in_measure: 0,
            pending_rest: 0,
            in_measure: false,
        }
    }

    /// Ticks not yet accounted for in the current measure.
    pub fn remaining(&self) -> u32 {
        self.ticks_per_measure - self.elapsed_in_measure - self.pending_rest
    }

    pub fn begin_measure(&mut self) {
        assert!(!self.in_measure, "begin_measure called inside an open measure");
        self.measure_starts.push(self.events.len());
        self.elapsed_in_measure = 0;
        self.pending_rest = 0;
        self.in_measure = true;
    }

    /// Sound `pitch` for `duration` ticks, after any pending rest.
    pub fn note(&mut self, pitch: u8, on_velocity: u8, off_velocity: u8, duration: u32) {
        self.claim(duration);
        self.flush_rest();
        self.events.push(NoteEvent {
            kind: EventKind::On,
            pitch,
            velocity: on_velocity,
            delta: 0,
            channel: self.channel,
        });
        self.events.push(NoteEvent {
            kind: EventKind::Off,
            pitch,
            velocity: off_velocity,
            delta: duration,
            channel: self.channel,
        });
        self.elapsed_in_measure += duration;
    }

    /// Add `ticks` of silence to the pending rest.
    pub fn rest(&mut self, ticks: u32) {
        self.claim(ticks);
        self.pending_rest += ticks;
    }

    /// Emit the pending rest as a marker event, if there is one.
    pub fn flush_rest(&mut self) {
        if self.pending_rest > 0 {
            self.events.push(NoteEvent::rest(self.pending_rest, self.channel));
            self.elapsed_in_measure += self.pending_rest;
            self.pending_rest = 0;
        }
    }

    /// Close the measure: flush silence and check the duration postcondition.
    pub fn end_measure(&mut self) {
        assert!(self.in_measure, "end_measure called with no open measure");
        self.flush_rest();
        assert_eq!(
            self.elapsed_in_measure,
            self.ticks_per_measure,
            "measure {} on channel {} took {} ticks, expected {}",
            self.measure_starts.len() - 1,
            self.channel,
            self.elapsed_in_measure,
            self.ticks_per_measure
        );
        self.in_measure = false;
    }

    pub fn finish(self, role: Role, instrument: Option<u8>) -> Track {
        assert!(!self.in_measure, "finish called inside an open measure");
        Track {
            role,
            channel: self.channel,
            instrument,
            events: self.events,
            measure_starts: self.measure_starts,
        }
    }

    fn claim(&self, ticks: u32) {
        assert!(self.in_measure, "events must be written inside a measure");
        assert!(
            ticks <= self.remaining(),
            "{} ticks overflow measure on channel {} ({} left)",
            ticks,
            self.channel,
            self.remaining()
        );
    }
}
