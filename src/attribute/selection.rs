//! Selection state for ranked attribute values.

use smallvec::SmallVec;

use crate::util::Dimensions;

/// Which part of a ranked value is materialized as a 2-D view.
///
/// `selected_index` names the row, column and frame dimensions. For rank > 2
/// only those three take part: the view is `count[row] x count[col]`
/// elements of frame `start[frame]`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Selection {
    pub start: SmallVec<[usize; 4]>,
    pub stride: SmallVec<[usize; 4]>,
    pub count: SmallVec<[usize; 4]>,
    pub selected_index: [usize; 3],
}

impl Selection {
    /// Whole-value selection for 1-D and 2-D data, first frame of the
    /// leading three dimensions otherwise.
    pub fn for_dims(dims: &Dimensions) -> Self {
        let dims = dims.normalized();
        let rank = dims.rank();
        let mut count: SmallVec<[usize; 4]> = SmallVec::from_slice(dims.sizes());
        if rank > 2 {
            for c in count.iter_mut().skip(2) {
                *c = 1;
            }
        }
        Self {
            start: smallvec::smallvec![0; rank],
            stride: smallvec::smallvec![1; rank],
            count,
            selected_index: [0, 1, 2],
        }
    }

    pub fn rank(&self) -> usize {
        self.count.len()
    }

    fn count_at(&self, slot: usize) -> usize {
        self.count.get(self.selected_index[slot]).copied().unwrap_or(1)
    }

    /// Rows of the view.
    pub fn height(&self) -> usize {
        self.count_at(0)
    }

    /// Columns of the view (1 for 1-D data).
    pub fn width(&self) -> usize {
        if self.rank() < 2 {
            1
        } else {
            self.count_at(1)
        }
    }

    /// Frame shown for rank > 2.
    pub fn frame(&self) -> usize {
        self.start.get(self.selected_index[2]).copied().unwrap_or(0)
    }

    /// Show frame `frame` of the frame dimension.
    pub fn set_frame(&mut self, frame: usize) {
        if let Some(s) = self.start.get_mut(self.selected_index[2]) {
            *s = frame;
        }
    }

    /// Choose the row, column and frame dimensions.
    pub fn set_selected_index(&mut self, row: usize, col: usize, frame: usize) {
        self.selected_index = [row, col, frame];
    }

    /// Elements in the materialized view.
    pub fn num_selected(&self) -> usize {
        if self.rank() > 2 {
            self.height() * self.width()
        } else {
            self.count.iter().product()
        }
    }
}

/// Copy the selected frame of `full` into a `height x width` view.
///
/// Each element spans `group` consecutive items. Element `(row, col)` of the
/// view comes from `frame * width * height + col * height + row`. Source
/// elements past the end of `full` are logged and left as `fill`.
pub fn select_frame<T: Clone>(full: &[T], group: usize, selection: &Selection, fill: T) -> Vec<T> {
    let h = selection.height();
    let w = selection.width();
    let frame = selection.frame();
    let group = group.max(1);

    let mut out = vec![fill; h * w * group];
    for col in 0..w {
        for row in 0..h {
            let to = (col * h + row) * group;
            let src = source_offset(frame, w, h, col, row, group)
                .and_then(|from| full.get(from..from.checked_add(group)?));
            match src {
                Some(src) => out[to..to + group].clone_from_slice(src),
                None => tracing::debug!(
                    "element ({}, {}) of frame {} out of range ({} available)",
                    row,
                    col,
                    frame,
                    full.len() / group
                ),
            }
        }
    }
    out
}

/// `(frame * w * h + col * h + row) * group`, or `None` on overflow.
fn source_offset(frame: usize, w: usize, h: usize, col: usize, row: usize, group: usize) -> Option<usize> {
    frame
        .checked_mul(w)?
        .checked_mul(h)?
        .checked_add(col * h + row)?
        .checked_mul(group)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let s = Selection::for_dims(&Dimensions::scalar());
        assert_eq!(s.rank(), 1);
        assert_eq!(s.num_selected(), 1);

        let s = Selection::for_dims(&Dimensions::d2(3, 4));
        assert_eq!((s.height(), s.width()), (3, 4));
        assert_eq!(s.num_selected(), 12);

        let s = Selection::for_dims(&Dimensions::from_slice(&[2, 3, 4, 5]));
        assert_eq!(&s.count[..], &[2, 3, 1, 1]);
        assert_eq!(s.num_selected(), 6);
        assert_eq!(s.frame(), 0);
    }

    #[test]
    fn test_select_frame() {
        let full: Vec<u32> = (0..24).collect();
        let mut s = Selection::for_dims(&Dimensions::from_slice(&[2, 3, 4]));
        s.set_frame(1);
        assert_eq!(select_frame(&full, 1, &s, 0), vec![6, 7, 8, 9, 10, 11]);
    }

    #[test]
    fn test_select_frame_grouped() {
        let full: Vec<u8> = (0..16).collect();
        let mut s = Selection::for_dims(&Dimensions::from_slice(&[2, 2, 2]));
        s.set_frame(1);
        assert_eq!(select_frame(&full, 2, &s, 0), (8..16).collect::<Vec<u8>>());
    }

    #[test]
    fn test_out_of_range_frame_does_not_panic() {
        let full: Vec<u32> = (0..8).collect();
        let mut s = Selection::for_dims(&Dimensions::from_slice(&[2, 2, 2]));
        s.set_frame(5);
        assert_eq!(select_frame(&full, 1, &s, u32::MAX), vec![u32::MAX; 4]);
    }

    #[test]
    fn test_huge_frame_is_out_of_range() {
        let full: Vec<u32> = (0..8).collect();
        let mut s = Selection::for_dims(&Dimensions::from_slice(&[2, 2, 2]));
        s.set_frame(usize::MAX / 2);
        assert_eq!(select_frame(&full, 1, &s, 0), vec![0; 4]);
        assert_eq!(select_frame(&full, 3, &s, 0), vec![0; 12]);
    }
}
