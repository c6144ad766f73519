//! ASCII plot of a hand skeleton in normalized image space.

use crate::hand::{Hand, HandLandmark, HAND_CONNECTIONS};

const EDGE: char = '.';
const JOINT: char = 'o';
const WRIST: char = 'W';

fn tip_char(landmark: HandLandmark) -> Option<char> {
    match landmark {
        HandLandmark::ThumbTip => Some('T'),
        HandLandmark::IndexTip => Some('I'),
        HandLandmark::MiddleTip => Some('M'),
        HandLandmark::RingTip => Some('R'),
        HandLandmark::PinkyTip => Some('P'),
        _ => None,
    }
}

/// Map a normalized coordinate onto `cells` cells, clamped to the grid.
fn to_cell(v: f32, cells: u16) -> usize {
    let max = cells.saturating_sub(1) as f32;
    (v.clamp(0.0, 1.0) * max).round() as usize
}

/// Render `hand` into `rows` lines of `cols` characters.
///
/// Skeleton edges are dotted, joints are `o`, the wrist is `W` and
/// fingertips are their initial (T, I, M, R, P).  Later layers win.
pub fn plot_hand(hand: &Hand, cols: u16, rows: u16) -> Vec<String> {
    let mut grid = vec![vec![' '; cols as usize]; rows as usize];
    if cols == 0 || rows == 0 {
        return Vec::new();
    }

    let cell = |l: HandLandmark| {
        let p = hand.point(l);
        (to_cell(p.x, cols), to_cell(p.y, rows))
    };

    for (a, b) in HAND_CONNECTIONS.iter() {
        let (x0, y0) = cell(*a);
        let (x1, y1) = cell(*b);
        let steps = x0.abs_diff(x1).max(y0.abs_diff(y1)).max(1);
        for i in 0..=steps {
            let t = i as f32 / steps as f32;
            let x = (x0 as f32 + (x1 as f32 - x0 as f32) * t).round() as usize;
            let y = (y0 as f32 + (y1 as f32 - y0 as f32) * t).round() as usize;
            grid[y][x] = EDGE;
        }
    }

    for (idx, p) in hand.points.iter().enumerate() {
        let x = to_cell(p.x, cols);
        let y = to_cell(p.y, rows);
        grid[y][x] = if idx == HandLandmark::Wrist.index() {
            WRIST
        } else {
            JOINT
        };
    }

    for tip in HandLandmark::fingertips() {
        let (x, y) = cell(tip);
        if let Some(c) = tip_char(tip) {
            grid[y][x] = c;
        }
    }

    grid.into_iter().map(|row| row.into_iter().collect()).collect()
}
