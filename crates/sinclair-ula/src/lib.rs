//! Standard Sinclair ULA (Uncommitted Logic Array).
//!
//! The ULA generates the video signal and, because it shares the lower RAM
//! bank with the CPU, arbitrates every bus access that collides with its
//! own fetches. This crate models the timing half of the chip: the screen
//! geometry descriptor, the memory and I/O contention delay functions, and
//! the maskable-interrupt pulse window. Pixel rendering and keyboard I/O
//! are separate concerns wired through the system bus.
//!
//! # Standalone IC
//!
//! This crate has no dependencies — all queries are pure functions of a
//! frame-relative tact, keeping the chip decoupled from any particular CPU
//! clock or memory model.
//!
//! # Timing (48K PAL)
//!
//! - 224 CPU tacts per line: 40 blanking, 24 left border, 128 display,
//!   24 right border, 8 non-visible right border
//! - 312 lines per frame: 8 vertical sync, 8 non-visible top border,
//!   48 top border, 192 display, 48 bottom border, 8 non-visible bottom
//! - 69,888 tacts per frame, 50 frames per second at 3.5 MHz
//! - INT asserted from frame tact 32 for the length of the longest
//!   instruction (23 tacts)
//!
//! # Contention
//!
//! During display lines the ULA steals bus slots for its bitmap and
//! attribute prefetches. A CPU access to contended RAM starting one tact
//! before the first display column and up to the second-to-last display
//! column is delayed by the repeating pattern `[6, 5, 4, 3, 2, 1, 0, 0]`.
//! Port accesses overlay the same pattern according to the ULA's snoop
//! rules (see [`ScreenTiming::io_contention_delay`]).

/// Contention delay pattern (repeats every 8 tacts).
const CONTENTION_PATTERN: [u8; 8] = [6, 5, 4, 3, 2, 1, 0, 0];

/// What the beam is producing at a given frame tact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenPhase {
    /// Sync or blanking: nothing reaches the visible screen.
    NonVisible,
    /// Visible border area.
    Border,
    /// The 256x192 pixel display area.
    Display,
}

/// Screen timing descriptor.
///
/// One plain-data value describes a complete ULA edition; the canonical
/// 48K descriptor is [`ScreenTiming::spectrum_48k`]. All counts are CPU
/// tacts at the base clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenTiming {
    /// Lines spent in vertical sync at the top of the frame.
    pub vertical_sync_lines: u32,
    /// Border lines above the screen that never reach the display.
    pub non_visible_border_top_lines: u32,
    /// Visible border lines above the display area.
    pub border_top_lines: u32,
    /// Display area lines.
    pub display_lines: u32,
    /// Visible border lines below the display area.
    pub border_bottom_lines: u32,
    /// Border lines below the screen that never reach the display.
    pub non_visible_border_bottom_lines: u32,
    /// Horizontal blanking (including sync) tacts at the start of a line.
    pub horizontal_blanking_time: u32,
    /// Visible left border tacts.
    pub border_left_time: u32,
    /// Display area tacts within a line.
    pub display_line_time: u32,
    /// Visible right border tacts.
    pub border_right_time: u32,
    /// Right border tacts that never reach the display.
    pub non_visible_border_right_time: u32,
    /// Tacts of pixel byte prefetch before the display column.
    pub pixel_data_prefetch_time: u32,
    /// Tacts of attribute byte prefetch before the display column.
    pub attribute_data_prefetch_time: u32,
    /// Frame tact at which the INT line is raised.
    pub interrupt_tact: u32,
    /// Tacts the INT line stays observable (the longest instruction).
    pub interrupt_pulse_tacts: u32,
    /// Screen refresh rate in frames per second.
    pub refresh_rate: u32,
    /// Frames between FLASH attribute toggles.
    pub flash_toggle_frames: u32,
}

impl ScreenTiming {
    /// The canonical 48K PAL descriptor.
    #[must_use]
    pub const fn spectrum_48k() -> Self {
        Self {
            vertical_sync_lines: 8,
            non_visible_border_top_lines: 8,
            border_top_lines: 48,
            display_lines: 192,
            border_bottom_lines: 48,
            non_visible_border_bottom_lines: 8,
            horizontal_blanking_time: 40,
            border_left_time: 24,
            display_line_time: 128,
            border_right_time: 24,
            non_visible_border_right_time: 8,
            pixel_data_prefetch_time: 2,
            attribute_data_prefetch_time: 1,
            interrupt_tact: 32,
            interrupt_pulse_tacts: 23,
            refresh_rate: 50,
            flash_toggle_frames: 25,
        }
    }

    /// Tacts per complete scanline (224 on the 48K).
    #[must_use]
    pub const fn screen_line_time(&self) -> u32 {
        self.horizontal_blanking_time
            + self.border_left_time
            + self.display_line_time
            + self.border_right_time
            + self.non_visible_border_right_time
    }

    /// Total scanlines per frame (312 on the 48K).
    #[must_use]
    pub const fn screen_lines(&self) -> u32 {
        self.vertical_sync_lines
            + self.non_visible_border_top_lines
            + self.border_top_lines
            + self.display_lines
            + self.border_bottom_lines
            + self.non_visible_border_bottom_lines
    }

    /// First scanline of the display area (64 on the 48K).
    #[must_use]
    pub const fn first_display_line(&self) -> u32 {
        self.vertical_sync_lines + self.non_visible_border_top_lines + self.border_top_lines
    }

    /// One past the last scanline of the display area.
    #[must_use]
    pub const fn last_display_line_end(&self) -> u32 {
        self.first_display_line() + self.display_lines
    }

    /// Tacts per complete frame (69,888 on the 48K).
    #[must_use]
    pub const fn frame_tacts(&self) -> u32 {
        self.screen_lines() * self.screen_line_time()
    }

    /// Tact within a line at which the display area starts (64 on the 48K).
    #[must_use]
    pub const fn first_pixel_tact_in_line(&self) -> u32 {
        self.horizontal_blanking_time + self.border_left_time
    }

    /// Frame tact of the first display-area pixel (14,400 on the 48K).
    #[must_use]
    pub const fn first_display_pixel_tact(&self) -> u32 {
        self.first_display_line() * self.screen_line_time() + self.first_pixel_tact_in_line()
    }

    /// Frame tact of the first visible screen pixel, top border included
    /// (3,624 on the 48K).
    #[must_use]
    pub const fn first_screen_pixel_tact(&self) -> u32 {
        (self.vertical_sync_lines + self.non_visible_border_top_lines) * self.screen_line_time()
            + self.horizontal_blanking_time
    }

    /// Contention delay in tacts for a contended-RAM access starting at
    /// `frame_tact`.
    ///
    /// Returns 0 outside display lines. Within a display line the window
    /// opens one tact before the first display column (the ULA has already
    /// latched its prefetch address) and closes before the final display
    /// tact, which is always free.
    #[must_use]
    pub fn contention_delay(&self, frame_tact: u32) -> u8 {
        let line_time = self.screen_line_time();
        let line = frame_tact / line_time;
        if line < self.first_display_line() || line >= self.last_display_line_end() {
            return 0;
        }
        let pixel_tact =
            (frame_tact % line_time) as i32 - self.first_pixel_tact_in_line() as i32;
        if !(-1..self.display_line_time as i32 - 1).contains(&pixel_tact) {
            return 0;
        }
        CONTENTION_PATTERN[((pixel_tact + 1) & 7) as usize]
    }

    /// Contention delay in tacts for a 4-tact port access starting at
    /// `frame_tact`.
    ///
    /// `high_byte_contended` is true when the port's high byte falls in
    /// contended RAM ($40-$7F); `ula_port` is true when bit 0 of the port
    /// address is clear. The ULA snoops the port cycle tact by tact, so
    /// each sample position advances past the delays already granted:
    ///
    /// | High $40-$7F? | ULA port? | Pattern          |
    /// |---------------|-----------|------------------|
    /// | no            | no        | N:4              |
    /// | no            | yes       | N:1, C:3         |
    /// | yes           | yes       | C:1, C:3         |
    /// | yes           | no        | C:1, C:1, C:1, C:1 |
    #[must_use]
    pub fn io_contention_delay(
        &self,
        frame_tact: u32,
        high_byte_contended: bool,
        ula_port: bool,
    ) -> u8 {
        match (high_byte_contended, ula_port) {
            (false, false) => 0,
            (false, true) => self.contention_delay(frame_tact + 1),
            (true, true) => {
                let d0 = self.contention_delay(frame_tact);
                let d1 = self.contention_delay(frame_tact + u32::from(d0) + 1);
                d0 + d1
            }
            (true, false) => {
                let mut total = 0u8;
                for step in 0..4 {
                    let delay = self.contention_delay(frame_tact + u32::from(total) + step);
                    total += delay;
                }
                total
            }
        }
    }

    /// Is the INT line observable at `frame_tact`?
    ///
    /// The pulse opens at [`ScreenTiming::interrupt_tact`] and stays long
    /// enough that even the longest instruction retiring at the open
    /// cannot miss it.
    #[must_use]
    pub const fn interrupt_active(&self, frame_tact: u32) -> bool {
        frame_tact >= self.interrupt_tact
            && frame_tact <= self.interrupt_tact + self.interrupt_pulse_tacts
    }

    /// Classify what the beam is producing at `frame_tact`.
    #[must_use]
    pub fn phase_at(&self, frame_tact: u32) -> ScreenPhase {
        let line_time = self.screen_line_time();
        let line = frame_tact % self.frame_tacts() / line_time;
        let tact_in_line = frame_tact % line_time;

        let sync_lines = self.vertical_sync_lines + self.non_visible_border_top_lines;
        let visible_lines_end =
            self.screen_lines() - self.non_visible_border_bottom_lines;
        if line < sync_lines || line >= visible_lines_end {
            return ScreenPhase::NonVisible;
        }

        let visible_start = self.horizontal_blanking_time;
        let visible_end = self.screen_line_time() - self.non_visible_border_right_time;
        if tact_in_line < visible_start || tact_in_line >= visible_end {
            return ScreenPhase::NonVisible;
        }

        let display_start = self.first_pixel_tact_in_line();
        let display_end = display_start + self.display_line_time;
        let display_line =
            line >= self.first_display_line() && line < self.last_display_line_end();
        if display_line && tact_in_line >= display_start && tact_in_line < display_end {
            ScreenPhase::Display
        } else {
            ScreenPhase::Border
        }
    }
}

impl Default for ScreenTiming {
    fn default() -> Self {
        Self::spectrum_48k()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timing() -> ScreenTiming {
        ScreenTiming::spectrum_48k()
    }

    #[test]
    fn derived_frame_geometry() {
        let t = timing();
        assert_eq!(t.screen_line_time(), 224);
        assert_eq!(t.screen_lines(), 312);
        assert_eq!(t.first_display_line(), 64);
        assert_eq!(t.frame_tacts(), 69_888);
        assert_eq!(t.first_pixel_tact_in_line(), 64);
        assert_eq!(t.first_display_pixel_tact(), 14_400);
        assert_eq!(t.first_screen_pixel_tact(), 3_624);
    }

    #[test]
    fn contention_pattern_across_first_display_line() {
        let t = timing();
        let base = t.first_display_pixel_tact();
        let expected = [5, 4, 3, 2, 1, 0, 0, 6, 5, 4];
        for (offset, &delay) in expected.iter().enumerate() {
            assert_eq!(
                t.contention_delay(base + offset as u32),
                delay,
                "offset {offset}"
            );
        }
    }

    #[test]
    fn contention_window_edges() {
        let t = timing();
        let base = t.first_display_pixel_tact();

        // One tact before the display column: prefetch already underway.
        assert_eq!(t.contention_delay(base - 1), 6);
        // Two tacts before: still border time.
        assert_eq!(t.contention_delay(base - 2), 0);
        // Last two display tacts are free.
        assert_eq!(t.contention_delay(base + 126), 0);
        assert_eq!(t.contention_delay(base + 127), 0);
        // Penultimate pattern slot still delays.
        assert_eq!(t.contention_delay(base + 124), 1);
    }

    #[test]
    fn contention_outside_display_lines() {
        let t = timing();
        // Line 63 is the last border line; same column as a hit below.
        assert_eq!(t.contention_delay(63 * 224 + 64), 0);
        // Line 64, same column, delays.
        assert_eq!(t.contention_delay(64 * 224 + 64), 5);
        // Last display line still contends.
        assert_eq!(t.contention_delay(255 * 224 + 64), 5);
        // First bottom-border line does not.
        assert_eq!(t.contention_delay(256 * 224 + 64), 0);
        // Top of frame (interrupt area) never contends.
        assert_eq!(t.contention_delay(0), 0);
        assert_eq!(t.contention_delay(100), 0);
    }

    #[test]
    fn io_contention_four_cases() {
        let t = timing();
        let base = t.first_display_pixel_tact();

        // Uncontended high byte, odd port: untouched.
        assert_eq!(t.io_contention_delay(base, false, false), 0);
        // Uncontended high byte, ULA port: one sample after the first tact.
        assert_eq!(t.io_contention_delay(base, false, true), 4);
        // Contended high byte, ULA port: sample, advance past the delay,
        // sample again (5 then 0).
        assert_eq!(t.io_contention_delay(base, true, true), 5);
        // Contended high byte, odd port: four cumulative samples
        // (5, 0, 6, 0).
        assert_eq!(t.io_contention_delay(base, true, false), 11);
    }

    #[test]
    fn io_contention_outside_display() {
        let t = timing();
        assert_eq!(t.io_contention_delay(100, true, false), 0);
        assert_eq!(t.io_contention_delay(100, true, true), 0);
    }

    #[test]
    fn interrupt_window() {
        let t = timing();
        assert!(!t.interrupt_active(31));
        assert!(t.interrupt_active(32));
        assert!(t.interrupt_active(40));
        assert!(t.interrupt_active(55));
        assert!(!t.interrupt_active(56));
    }

    #[test]
    fn phase_classification() {
        let t = timing();
        // Vertical sync.
        assert_eq!(t.phase_at(0), ScreenPhase::NonVisible);
        // Top border, visible column.
        assert_eq!(t.phase_at(20 * 224 + 50), ScreenPhase::Border);
        // Display line, blanking column.
        assert_eq!(t.phase_at(64 * 224 + 20), ScreenPhase::NonVisible);
        // Display line, left border column.
        assert_eq!(t.phase_at(64 * 224 + 50), ScreenPhase::Border);
        // First display pixel.
        assert_eq!(t.phase_at(14_400), ScreenPhase::Display);
        // Display line, right border column.
        assert_eq!(t.phase_at(64 * 224 + 200), ScreenPhase::Border);
        // Display line, non-visible right edge.
        assert_eq!(t.phase_at(64 * 224 + 220), ScreenPhase::NonVisible);
        // Bottom border, display column.
        assert_eq!(t.phase_at(256 * 224 + 100), ScreenPhase::Border);
        // Non-visible bottom lines.
        assert_eq!(t.phase_at(305 * 224 + 100), ScreenPhase::NonVisible);
    }
}
