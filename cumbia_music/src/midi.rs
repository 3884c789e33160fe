// MIDI output from composed arrangements.
//
// Writes a Standard MIDI File, format 1: a conductor track with tempo and
// time signature, then one track per voice. Voice events map one-to-one onto
// MIDI events with their deltas unchanged, so barlines in the file line up
// exactly where the assembler put them. Rest markers become note-off events
// on pitch 0 with velocity 0; players ignore them but they carry the time.
//
// Uses the `midly` crate for encoding.

use crate::arrangement::Arrangement;
use crate::assembler::{EventKind, NoteEvent, Track as VoiceTrack};
use crate::error::{ComposerError, Result};
use midly::{
    Format, Header, MetaMessage, MidiMessage, Smf, Timing, Track, TrackEvent, TrackEventKind,
    num::{u4, u7, u15, u24, u28},
};
use std::path::Path;
use tracing::info;

/// MIDI clocks per metronome click in the time-signature event.
const CLOCKS_PER_CLICK: u8 = 24;
/// Notated 32nd notes per quarter note.
const THIRTY_SECONDS_PER_QUARTER: u8 = 8;
/// Largest value a 24-bit tempo field holds.
const MAX_TEMPO_MICROSECONDS: u32 = (1 << 24) - 1;

/// Encode an arrangement and write it to `path`.
pub fn write_midi(song: &Arrangement, path: &Path) -> Result<()> {
    let buf = encode_midi(song)?;
    std::fs::write(path, &buf)?;
    info!(path = %path.display(), bytes = buf.len(), "wrote MIDI file");
    Ok(())
}

/// Encode an arrangement as SMF bytes.
pub fn encode_midi(song: &Arrangement) -> Result<Vec<u8>> {
    let smf = arrangement_to_smf(song)?;
    let mut buf = Vec::new();
    smf.write_std(&mut buf)?;
    Ok(buf)
}

/// Microseconds per quarter note at `tempo_bpm`, checked against the
/// 24-bit tempo field.
pub fn tempo_microseconds(tempo_bpm: u32) -> Result<u24> {
    if tempo_bpm == 0 {
        return Err(ComposerError::invalid_config("tempo must be at least 1 BPM"));
    }
    let micros = 60_000_000 / tempo_bpm;
    if micros > MAX_TEMPO_MICROSECONDS {
        return Err(ComposerError::invalid_config(format!(
            "tempo {tempo_bpm} BPM is too slow for a MIDI tempo event"
        )));
    }
    Ok(u24::new(micros))
}

/// Convert an arrangement to an in-memory SMF.
pub fn arrangement_to_smf(song: &Arrangement) -> Result<Smf<'static>> {
    let meta = &song.meta;
    let mut smf = Smf::new(Header::new(
        Format::Parallel,
        Timing::Metrical(u15::new(meta.ticks_per_beat as u16)),
    ));

    // Track 0: conductor
    let tempo = tempo_microseconds(meta.tempo_bpm)?;
    let (numerator, denominator) = meta.time_signature;
    let conductor: Track<'static> = vec![
        TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Meta(MetaMessage::Tempo(tempo)),
        },
        TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Meta(MetaMessage::TimeSignature(
                numerator,
                denominator.trailing_zeros() as u8,
                CLOCKS_PER_CLICK,
                THIRTY_SECONDS_PER_QUARTER,
            )),
        },
        end_of_track(),
    ];
    smf.tracks.push(conductor);

    for voice in &song.tracks {
        smf.tracks.push(voice_to_track(voice));
    }

    Ok(smf)
}

fn voice_to_track(voice: &VoiceTrack) -> Track<'static> {
    let channel = u4::new(voice.channel);
    let mut track: Track<'static> = Vec::with_capacity(voice.events.len() + 3);

    track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::TrackName(voice.role.name().as_bytes())),
    });

    if let Some(program) = voice.instrument {
        track.push(TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Midi {
                channel,
                message: MidiMessage::ProgramChange {
                    program: u7::new(program),
                },
            },
        });
    }

    track.extend(voice.events.iter().map(|e| note_event(e, channel)));
    track.push(end_of_track());
    track
}

fn note_event(event: &NoteEvent, channel: u4) -> TrackEvent<'static> {
    let key = u7::new(event.pitch);
    let vel = u7::new(event.velocity);
    let message = match event.kind {
        EventKind::On => MidiMessage::NoteOn { key, vel },
        EventKind::Off => MidiMessage::NoteOff { key, vel },
    };
    TrackEvent {
        delta: u28::new(event.delta),
        kind: TrackEventKind::Midi { channel, message },
    }
}

fn end_of_track() -> TrackEvent<'static> {
    TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    }
}
