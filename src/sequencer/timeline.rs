// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Song flattening.
//!
//! Expands sections and repeats into a gap-free list of timed instances
//! with absolute beat positions. Both playback and file export read this
//! list, so the two can never disagree about where an event lands.

use crate::arrangement::{ChordRef, Song};

/// Id for one pass over one event
///
/// Each free-form id is length-prefixed, so separators inside section or
/// event ids can never make two different instances read the same.
/// Unchanged content keeps the same id across rebuilds.
pub fn instance_id(section_id: &str, repeat_index: u32, event_id: &str, event_index: usize) -> String {
    format!(
        "{}:{}/{}/{}:{}/{}",
        section_id.len(),
        section_id,
        repeat_index,
        event_id.len(),
        event_id,
        event_index
    )
}

/// One time-placed occurrence of a song event after repeat expansion
#[derive(Debug, Clone, PartialEq)]
pub struct TimedInstance {
    /// Unique across the whole timeline, including repeats
    pub instance_id: String,
    /// Chord to play, or None for a rest
    pub chord: Option<ChordRef>,
    /// Length in beats (already normalized)
    pub duration_beats: f64,
    /// Absolute start beat
    pub start_beat: f64,
    /// Absolute end beat (exclusive)
    pub end_beat: f64,
    /// Index of the owning section in the song
    pub section_index: usize,
    /// Name of the owning section
    pub section_name: String,
    /// Which pass through the section (0-based)
    pub repeat_index: u32,
    /// Total passes through the section
    pub repeat_count: u32,
    /// Position of the event within its section
    pub event_index: usize,
}

impl TimedInstance {
    /// Check if the beat falls inside `[start_beat, end_beat)`
    pub fn contains(&self, beat: f64) -> bool {
        beat >= self.start_beat && beat < self.end_beat
    }

    /// Check if this is the first instance of its section
    pub fn is_section_start(&self) -> bool {
        self.repeat_index == 0 && self.event_index == 0
    }

    /// Check if this instance is a rest
    pub fn is_rest(&self) -> bool {
        self.chord.is_none()
    }

    /// Length in seconds at the given tempo
    pub fn duration_seconds(&self, tempo: f64) -> f64 {
        self.duration_beats * 60.0 / tempo
    }
}

/// The flattened song
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Timeline {
    instances: Vec<TimedInstance>,
    total_beats: f64,
}

impl Timeline {
    /// Flatten a song snapshot
    pub fn build(song: &Song) -> Self {
        let mut instances = Vec::new();
        let mut running = 0.0;

        for (section_index, section) in song.sections.iter().enumerate() {
            let repeat_count = section.repeat_count();

            for repeat_index in 0..repeat_count {
                for (event_index, event) in section.events.iter().enumerate() {
                    let duration_beats = event.duration_beats();
                    let start_beat = running;
                    running += duration_beats;

                    instances.push(TimedInstance {
                        instance_id: instance_id(
                            &section.id,
                            repeat_index,
                            &event.id,
                            event_index,
                        ),
                        chord: event.chord.clone(),
                        duration_beats,
                        start_beat,
                        end_beat: running,
                        section_index,
                        section_name: section.name.clone(),
                        repeat_index,
                        repeat_count,
                        event_index,
                    });
                }
            }
        }

        Self {
            instances,
            total_beats: running,
        }
    }

    /// All instances in play order
    pub fn instances(&self) -> &[TimedInstance] {
        &self.instances
    }

    /// Instance at index
    pub fn get(&self, index: usize) -> Option<&TimedInstance> {
        self.instances.get(index)
    }

    /// Number of instances
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    /// Check if there is nothing to play
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// End beat of the last instance (0 when empty)
    pub fn total_beats(&self) -> f64 {
        self.total_beats
    }

    /// Length in seconds at the given tempo
    pub fn total_seconds(&self, tempo: f64) -> f64 {
        self.total_beats * 60.0 / tempo
    }

    /// Clamp an index into the valid range (None when empty)
    pub fn clamp_index(&self, index: usize) -> Option<usize> {
        if self.instances.is_empty() {
            None
        } else {
            Some(index.min(self.instances.len() - 1))
        }
    }

    /// Index of the instance whose `[start, end)` holds the beat
    pub fn instance_at(&self, beat: f64) -> Option<usize> {
        if !beat.is_finite() || beat < 0.0 || beat >= self.total_beats {
            return None;
        }
        // Intervals are contiguous and sorted: the first instance ending after
        // the beat is the one containing it.
        let index = self.instances.partition_point(|i| i.end_beat <= beat);
        self.instances
            .get(index)
            .filter(|instance| instance.contains(beat))
            .map(|_| index)
    }

    /// Index of the first instance of the section owning `index`
    pub fn section_start(&self, index: usize) -> Option<usize> {
        let section_index = self.instances.get(index)?.section_index;
        self.instances
            .iter()
            .position(|i| i.section_index == section_index)
    }

    /// Index of the first instance of the next section after `index`
    pub fn next_section_start(&self, index: usize) -> Option<usize> {
        let section_index = self.instances.get(index)?.section_index;
        self.instances[index..]
            .iter()
            .position(|i| i.section_index > section_index)
            .map(|offset| index + offset)
    }

    /// Index of the first instance of the section played before the one owning `index`
    pub fn previous_section_start(&self, index: usize) -> Option<usize> {
        let start = self.section_start(index)?;
        if start == 0 {
            return None;
        }
        self.section_start(start - 1)
    }

    /// Name of the next section that differs from the one at `index`
    pub fn next_section_name(&self, index: usize) -> Option<&str> {
        let current = self.instances.get(index)?;
        self.instances[index + 1..]
            .iter()
            .find(|i| i.section_name != current.section_name)
            .map(|i| i.section_name.as_str())
    }

    /// Check if the instance at `index` is the first of its section
    pub fn is_section_marker(&self, index: usize) -> bool {
        self.instances
            .get(index)
            .map(TimedInstance::is_section_start)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arrangement::{ChordDefinition, ChordPosition, SongEvent, SongSection, MIN_DURATION_BEATS};

    fn c_major() -> ChordRef {
        ChordRef::new(
            ChordDefinition::new("C", "major")
                .with_position(ChordPosition::from_shape("x32010").unwrap()),
            0,
        )
    }

    fn two_section_song() -> Song {
        Song::new("Two")
            .with_section(
                SongSection::new("intro", "Intro")
                    .with_repeat(2)
                    .with_event(SongEvent::chord("a", c_major(), 4.0))
                    .with_event(SongEvent::rest("b", 2.0)),
            )
            .with_section(
                SongSection::new("verse", "Verse")
                    .with_event(SongEvent::chord("c", c_major(), 1.5))
                    .with_event(SongEvent::chord("d", c_major(), 0.5)),
            )
    }

    #[test]
    fn test_empty_song() {
        let timeline = Timeline::build(&Song::new("Empty"));
        assert!(timeline.is_empty());
        assert_eq!(timeline.total_beats(), 0.0);
        assert_eq!(timeline.instance_at(0.0), None);
        assert_eq!(timeline.clamp_index(5), None);
    }

    #[test]
    fn test_contiguous_instances() {
        let timeline = Timeline::build(&two_section_song());
        let instances = timeline.instances();
        assert_eq!(instances.len(), 6);

        for pair in instances.windows(2) {
            assert_eq!(pair[0].end_beat, pair[1].start_beat);
        }
        for instance in instances {
            assert_eq!(instance.end_beat - instance.start_beat, instance.duration_beats);
        }
        assert_eq!(instances.last().unwrap().end_beat, timeline.total_beats());
        assert_eq!(timeline.total_beats(), 14.0);
    }

    #[test]
    fn test_repeat_expansion() {
        let timeline = Timeline::build(&two_section_song());
        let intro: Vec<_> = timeline
            .instances()
            .iter()
            .filter(|i| i.section_index == 0)
            .collect();
        assert_eq!(intro.len(), 4);
        assert_eq!(intro.iter().map(|i| i.duration_beats).sum::<f64>(), 12.0);
        assert_eq!(intro[2].repeat_index, 1);
        assert_eq!(intro[2].repeat_count, 2);
        assert_eq!(intro[2].event_index, 0);
    }

    #[test]
    fn test_instance_ids_unique_across_repeats() {
        let timeline = Timeline::build(&two_section_song());
        let instances = timeline.instances();
        assert_eq!(instances[0].instance_id, "5:intro/0/1:a/0");
        assert_eq!(instances[2].instance_id, "5:intro/1/1:a/0");

        let mut ids: Vec<_> = instances.iter().map(|i| i.instance_id.as_str()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), instances.len());
    }

    #[test]
    fn test_hyphenated_ids_do_not_collide() {
        // Plain joining would give "a-0-0-b-0" for both
        let song = Song::new("Hyphens")
            .with_section(SongSection::new("a", "A").with_event(SongEvent::rest("0-b", 1.0)))
            .with_section(SongSection::new("a-0", "B").with_event(SongEvent::rest("b", 1.0)));
        assert!(song.validate().is_ok());

        let timeline = Timeline::build(&song);
        let ids: Vec<_> = timeline.instances().iter().map(|i| i.instance_id.as_str()).collect();
        assert_eq!(ids, ["1:a/0/3:0-b/0", "3:a-0/0/1:b/0"]);
        assert_ne!(ids[0], ids[1]);
    }

    #[test]
    fn test_build_is_deterministic() {
        let song = two_section_song();
        assert_eq!(Timeline::build(&song), Timeline::build(&song));
    }

    #[test]
    fn test_zero_duration_clamped() {
        let song = Song::new("Zero").with_section(
            SongSection::new("s", "S")
                .with_event(SongEvent::rest("a", 0.0))
                .with_event(SongEvent::rest("b", -2.0)),
        );
        let timeline = Timeline::build(&song);
        assert_eq!(timeline.len(), 2);
        assert_eq!(timeline.instances()[0].duration_beats, MIN_DURATION_BEATS);
        assert!(timeline.instances()[1].start_beat > 0.0);
        assert_eq!(timeline.total_beats(), 2.0 * MIN_DURATION_BEATS);
    }

    #[test]
    fn test_instance_at() {
        let timeline = Timeline::build(&two_section_song());
        assert_eq!(timeline.instance_at(0.0), Some(0));
        assert_eq!(timeline.instance_at(3.999), Some(0));
        assert_eq!(timeline.instance_at(4.0), Some(1));
        assert_eq!(timeline.instance_at(6.0), Some(2));
        assert_eq!(timeline.instance_at(12.0), Some(4));
        assert_eq!(timeline.instance_at(13.9), Some(5));
        assert_eq!(timeline.instance_at(14.0), None);
        assert_eq!(timeline.instance_at(-1.0), None);
        assert_eq!(timeline.instance_at(f64::NAN), None);
    }

    #[test]
    fn test_instance_at_matches_linear_scan() {
        let timeline = Timeline::build(&two_section_song());
        let mut beat = 0.0;
        while beat < 15.0 {
            let linear = timeline.instances().iter().position(|i| i.contains(beat));
            assert_eq!(timeline.instance_at(beat), linear, "beat {}", beat);
            beat += 0.125;
        }
    }

    #[test]
    fn test_section_navigation() {
        let timeline = Timeline::build(&two_section_song());
        assert_eq!(timeline.section_start(3), Some(0));
        assert_eq!(timeline.section_start(5), Some(4));
        assert_eq!(timeline.next_section_start(1), Some(4));
        assert_eq!(timeline.next_section_start(4), None);
        assert_eq!(timeline.previous_section_start(4), Some(0));
        assert_eq!(timeline.previous_section_start(2), None);
    }

    #[test]
    fn test_next_section_name() {
        let timeline = Timeline::build(&two_section_song());
        assert_eq!(timeline.next_section_name(0), Some("Verse"));
        assert_eq!(timeline.next_section_name(4), None);
        assert_eq!(timeline.next_section_name(99), None);
    }

    #[test]
    fn test_section_markers() {
        let timeline = Timeline::build(&two_section_song());
        let markers: Vec<_> = (0..timeline.len())
            .filter(|&i| timeline.is_section_marker(i))
            .collect();
        assert_eq!(markers, vec![0, 4]);
    }

    #[test]
    fn test_section_without_events_skipped() {
        let song = Song::new("Gap")
            .with_section(SongSection::new("a", "A").with_event(SongEvent::rest("x", 1.0)))
            .with_section(SongSection::new("b", "B").with_repeat(3))
            .with_section(SongSection::new("c", "C").with_event(SongEvent::rest("y", 1.0)));
        let timeline = Timeline::build(&song);
        assert_eq!(timeline.len(), 2);
        assert_eq!(timeline.instances()[1].section_index, 2);
        assert_eq!(timeline.previous_section_start(1), Some(0));
    }
}
