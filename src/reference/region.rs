//! Region selection text.

use std::fmt::Write;

fn push_coords(out: &mut String, coords: &[u64]) {
    out.push('(');
    for (j, c) in coords.iter().enumerate() {
        if j > 0 {
            out.push(',');
        }
        let _ = write!(out, "{}", c);
    }
    out.push(')');
}

/// `{ (c0,c1) (c0,c1) }` from `rank` coordinates per point.
pub fn format_points(coords: &[u64], rank: usize) -> String {
    let mut out = String::from("{ ");
    if rank > 0 {
        for (i, point) in coords.chunks_exact(rank).enumerate() {
            if i > 0 {
                out.push(' ');
            }
            push_coords(&mut out, point);
        }
    }
    out.push_str(" }");
    out
}

/// `{ (lo0,lo1)-(hi0,hi1) }` from start and end corners per block.
pub fn format_blocks(coords: &[u64], rank: usize) -> String {
    let mut out = String::from("{ ");
    if rank > 0 {
        for (i, block) in coords.chunks_exact(2 * rank).enumerate() {
            if i > 0 {
                out.push(' ');
            }
            let (start, end) = block.split_at(rank);
            push_coords(&mut out, start);
            out.push('-');
            push_coords(&mut out, end);
        }
    }
    out.push_str(" }");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_points() {
        assert_eq!(format_points(&[1, 2, 3, 4], 2), "{ (1,2) (3,4) }");
        assert_eq!(format_points(&[7], 1), "{ (7) }");
        assert_eq!(format_points(&[], 2), "{  }");
    }

    #[test]
    fn test_blocks() {
        assert_eq!(format_blocks(&[0, 0, 1, 1], 2), "{ (0,0)-(1,1) }");
        assert_eq!(
            format_blocks(&[0, 0, 1, 1, 4, 4, 5, 6], 2),
            "{ (0,0)-(1,1) (4,4)-(5,6) }"
        );
    }
}
