// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Playback clock and timeline scrubber.
//!
//! The reference host has no video decoder, so playback is simulated by a
//! wall-clock driven position that the engine samples like a video element's
//! time updates.

use std::time::Instant;

/// Length of the simulated clip when no annotation runs longer.
pub const DEFAULT_DURATION: f64 = 60.0;

/// Simulated playback position.
#[derive(Debug, Clone)]
pub struct PlaybackClock {
    position: f64,
    duration: f64,
    playing: bool,
    last_tick: Option<Instant>,
}

impl Default for PlaybackClock {
    fn default() -> Self {
        Self::new(DEFAULT_DURATION)
    }
}

impl PlaybackClock {
    pub fn new(duration: f64) -> Self {
        Self {
            position: 0.0,
            duration: duration.max(0.0),
            playing: false,
            last_tick: None,
        }
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Grow the clip so `end` is reachable.
    pub fn extend_to(&mut self, end: f64) {
        if end > self.duration {
            self.duration = end.ceil();
        }
    }

    pub fn set_playing(&mut self, playing: bool) {
        self.playing = playing;
        self.last_tick = None;
    }

    pub fn seek(&mut self, position: f64) {
        self.position = position.clamp(0.0, self.duration);
        self.last_tick = None;
    }

    /// Advance by the wall time since the previous tick. Playback stops at
    /// the end of the clip.
    pub fn tick(&mut self, now: Instant) -> f64 {
        if self.playing {
            if let Some(last) = self.last_tick {
                self.position += now.saturating_duration_since(last).as_secs_f64();
            }
            self.last_tick = Some(now);
            if self.position >= self.duration {
                self.position = self.duration;
                self.playing = false;
                self.last_tick = None;
            }
        }
        self.position
    }
}

fn format_time(t: f64) -> String {
    let minutes = (t / 60.0).floor();
    format!("{:02}:{:05.2}", minutes as u32, t - minutes * 60.0)
}

/// Display play/pause and the scrubber. Mutates `clock` directly.
pub fn show(ui: &mut egui::Ui, clock: &mut PlaybackClock) {
    ui.horizontal(|ui| {
        let label = if clock.is_playing() { "⏸ Pause" } else { "▶ Play" };
        if ui.button(label).clicked() {
            let playing = !clock.is_playing();
            if playing && clock.position() >= clock.duration() {
                clock.seek(0.0);
            }
            clock.set_playing(playing);
        }

        let mut position = clock.position();
        ui.spacing_mut().slider_width = (ui.available_width() - 140.0).max(100.0);
        let response = ui.add(
            egui::Slider::new(&mut position, 0.0..=clock.duration())
                .show_value(false)
                .clamp_to_range(true),
        );
        if response.changed() {
            clock.seek(position);
        }

        ui.label(
            egui::RichText::new(format!(
                "{} / {}",
                format_time(clock.position()),
                format_time(clock.duration())
            ))
            .monospace(),
        );
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_clock_advances_only_while_playing() {
        let start = Instant::now();
        let mut clock = PlaybackClock::new(10.0);
        assert_eq!(clock.tick(start + Duration::from_secs(1)), 0.0);

        clock.set_playing(true);
        clock.tick(start);
        assert_eq!(clock.tick(start + Duration::from_millis(500)), 0.5);
    }

    #[test]
    fn test_clock_stops_at_end() {
        let start = Instant::now();
        let mut clock = PlaybackClock::new(1.0);
        clock.set_playing(true);
        clock.tick(start);
        assert_eq!(clock.tick(start + Duration::from_secs(3)), 1.0);
        assert!(!clock.is_playing());
    }

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(75.5), "01:15.50");
    }
}
