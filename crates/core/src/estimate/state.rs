//! Interpreter state for a single estimation walk.

use tracing::trace;

use super::{EstimatorConfig, HeightEstimate};
use crate::grammar::lexer::Token;

/// ZPL line break escape inside field data.
const LINE_BREAK_ESCAPE: &str = "\\&";

#[derive(Debug, Default, Clone, Copy)]
struct Point {
    x: i64,
    y: i64,
}

/// Cursor, font and extent state, created per walk and consumed by
/// [`LayoutState::finish`].
#[derive(Debug)]
pub(super) struct LayoutState<'c> {
    config: &'c EstimatorConfig,
    /// `^LH` offset added to every field origin.
    home: Point,
    /// Current `^FO` origin, home offset included.
    field: Point,
    font_height: i64,
    max_bottom: i64,
    explicit_length: Option<i64>,
}

impl<'c> LayoutState<'c> {
    pub(super) fn new(config: &'c EstimatorConfig) -> Self {
        Self {
            config,
            home: Point::default(),
            field: Point::default(),
            font_height: i64::from(config.default_font_height),
            max_bottom: 0,
            explicit_length: None,
        }
    }

    /// Update state from one command. Unknown commands are ignored.
    pub(super) fn apply(&mut self, tok: &Token<'_>) {
        match tok.name {
            "LH" => self.apply_lh(tok.params),
            "FO" => self.apply_fo(tok.params),
            "A" | "A@" => self.apply_a(tok.params),
            "CF" => self.apply_cf(tok.params),
            "BC" => self.apply_bc(tok.params),
            "GB" => self.apply_gb(tok.params),
            "LL" => self.apply_ll(tok.params),
            "FD" => self.apply_fd(tok.params),
            _ => {}
        }
    }

    pub(super) fn finish(self) -> HeightEstimate {
        let structural = clamp_dots(self.max_bottom);
        let explicit = self.explicit_length.map(clamp_dots);
        HeightEstimate {
            structural,
            explicit,
            dots: structural.max(explicit.unwrap_or(0)),
        }
    }

    fn apply_lh(&mut self, params: &str) {
        self.home = Point {
            x: int_field(params, 0).unwrap_or(0),
            y: int_field(params, 1).unwrap_or(0),
        };
    }

    fn apply_fo(&mut self, params: &str) {
        self.field = Point {
            x: int_field(params, 0).unwrap_or(0).saturating_add(self.home.x),
            y: int_field(params, 1).unwrap_or(0).saturating_add(self.home.y),
        };
        trace!(x = self.field.x, y = self.field.y, "field origin");
    }

    fn apply_a(&mut self, params: &str) {
        if let Some(h) = first_int_field(params) {
            self.font_height = h;
        }
    }

    /// `^CF` changes the label-wide default, which is also the height in
    /// effect from here on. Like `^A`, the first numeric field wins, so
    /// `^CF0,40` selects 0 and `^CFD,24` selects 24.
    fn apply_cf(&mut self, params: &str) {
        if let Some(h) = first_int_field(params) {
            self.font_height = h;
        }
    }

    fn apply_bc(&mut self, params: &str) {
        // ^BCo,h,...: a one-character (or empty) first field is the
        // orientation and the height follows it.
        let first = params.split(',').next().unwrap_or("").trim();
        let height = if first.chars().count() <= 1 {
            int_field(params, 1)
        } else {
            int_field(params, 0)
        };
        self.extend_to(height.unwrap_or_else(|| i64::from(self.config.default_barcode_height)));
    }

    fn apply_gb(&mut self, params: &str) {
        if let Some(h) = int_field(params, 1) {
            self.extend_to(h);
        }
    }

    fn apply_ll(&mut self, params: &str) {
        if let Some(n) = int_field(params, 0) {
            self.explicit_length = Some(self.explicit_length.map_or(n, |prev| prev.max(n)));
        }
    }

    fn apply_fd(&mut self, payload: &str) {
        let lines = count_lines(payload);
        let gap = i64::from(self.config.default_line_gap);
        let content = if lines == 0 {
            0
        } else {
            lines
                .saturating_mul(self.font_height)
                .saturating_add((lines - 1).saturating_mul(gap))
        };
        self.extend_to(content);
    }

    /// Record content of `height` dots starting at the current field origin.
    fn extend_to(&mut self, height: i64) {
        let bottom = self.field.y.saturating_add(height);
        self.max_bottom = self.max_bottom.max(bottom);
    }
}

/// Lines in a field data payload: `\&` escapes and real line breaks both
/// start a new line, and an empty payload still occupies one line.
fn count_lines(payload: &str) -> i64 {
    let normalized = payload
        .replace(LINE_BREAK_ESCAPE, "\n")
        .replace("\r\n", "\n")
        .replace('\r', "\n");
    let count = normalized.split('\n').count();
    i64::try_from(count.max(1)).unwrap_or(i64::MAX)
}

fn parse_int(s: &str) -> Option<i64> {
    s.trim().parse::<i64>().ok()
}

fn int_field(params: &str, idx: usize) -> Option<i64> {
    params.split(',').nth(idx).and_then(parse_int)
}

fn first_int_field(params: &str) -> Option<i64> {
    params.split(',').find_map(parse_int)
}

fn clamp_dots(v: i64) -> u32 {
    u32::try_from(v.max(0)).unwrap_or(u32::MAX)
}
