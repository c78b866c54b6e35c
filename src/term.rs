//! Terminal width probing.

use terminal_size::{terminal_size, Width};

/// Width used when the terminal cannot be queried.
pub const DEFAULT_WIDTH: usize = 80;

/// Anything narrower is treated as a failed query.
pub const MIN_WIDTH: usize = 10;

/// Width of the terminal attached to stdout, or [`DEFAULT_WIDTH`].
pub fn width() -> usize {
    let probed = terminal_size().map(|(Width(w), _)| usize::from(w));
    sanitize(probed)
}

fn sanitize(probed: Option<usize>) -> usize {
    match probed {
        Some(w) if w >= MIN_WIDTH => w,
        _ => DEFAULT_WIDTH,
    }
}
