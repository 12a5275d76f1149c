//! Weave deinterlacing of single-field output into progressive frames

use crate::frame::{FieldParity, Rect, Surface};

#[derive(Debug, Clone)]
struct Field {
    parity: FieldParity,
    lines: Vec<Vec<u32>>,
}

/// Combines consecutive fields of opposite parity into one frame of twice the field height.
///
/// When there is no usable previous field (after [`Deinterlacer::clear_state`], on the first
/// field, when the field height changes, or when two fields of the same parity arrive in a row),
/// the current field is line-doubled instead.
#[derive(Debug, Clone, Default)]
pub struct Deinterlacer {
    previous: Option<Field>,
}

impl Deinterlacer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear_state(&mut self) {
        self.previous = None;
    }

    /// Rewrite the field at `rect` (height N) in place as a progressive frame of height 2N.
    ///
    /// `line_widths` is either empty (every line is `rect.w` wide) or holds one width per field
    /// line; on return it is empty or holds one width per output line. Output lines that would
    /// fall below the bottom of the surface are dropped.
    pub fn process(
        &mut self,
        surface: &mut Surface,
        rect: &mut Rect,
        line_widths: &mut Vec<u32>,
        parity: FieldParity,
    ) {
        let field_height = rect.h as usize;
        let explicit_widths = !line_widths.is_empty();
        let width_of = |line: usize| line_widths.get(line).copied().unwrap_or(rect.w);

        let current: Vec<Vec<u32>> = (0..field_height)
            .map(|i| {
                let y = rect.y + i as u32;
                if y >= surface.height() {
                    return Vec::new();
                }
                let row = surface.row(y);
                let start = (rect.x as usize).min(row.len());
                let end = (start + width_of(i) as usize).min(row.len());
                row[start..end].to_vec()
            })
            .collect();

        let previous = self.previous.take().filter(|prev| {
            let usable = prev.parity != parity && prev.lines.len() == field_height;
            if !usable {
                log::debug!(
                    "Dropping {:?} field of {} lines; line doubling {parity:?} field of {field_height} lines",
                    prev.parity,
                    prev.lines.len()
                );
            }
            usable
        });
        let other_lines = previous.as_ref().map_or(&current, |prev| &prev.lines);

        let mut new_widths = Vec::with_capacity(2 * field_height);
        for i in 0..field_height {
            let (top, bottom) = match parity {
                FieldParity::Even => (&current[i], &other_lines[i]),
                FieldParity::Odd => (&other_lines[i], &current[i]),
            };

            for (offset, line) in [top, bottom].into_iter().enumerate() {
                let y = rect.y + 2 * i as u32 + offset as u32;
                new_widths.push(line.len() as u32);
                if y >= surface.height() {
                    continue;
                }

                let row = surface.row_mut(y);
                let start = (rect.x as usize).min(row.len());
                let end = (start + line.len()).min(row.len());
                row[start..end].copy_from_slice(&line[..end - start]);
            }
        }

        rect.h = (2 * rect.h).min(surface.height().saturating_sub(rect.y));
        new_widths.truncate(rect.h as usize);
        *line_widths = if explicit_widths { new_widths } else { Vec::new() };

        self.previous = Some(Field { parity, lines: current });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::PixelFormat;
    use test_log::test;

    fn field_surface(lines: &[u32]) -> Surface {
        let mut surface = Surface::new(2, 2 * lines.len() as u32, PixelFormat::Xrgb8888);
        for (y, &color) in lines.iter().enumerate() {
            surface.row_mut(y as u32).fill(color);
        }
        surface
    }

    fn column(surface: &Surface, rect: Rect) -> Vec<u32> {
        (rect.y..rect.y + rect.h).map(|y| surface.row(y)[0]).collect()
    }

    #[test]
    fn weaves_opposite_fields() {
        let mut deinterlacer = Deinterlacer::new();
        let mut widths = Vec::new();

        let mut surface = field_surface(&[10, 12, 14]);
        let mut rect = Rect::new(0, 0, 2, 3);
        deinterlacer.process(&mut surface, &mut rect, &mut widths, FieldParity::Even);
        assert_eq!(rect.h, 6);
        // No history: line doubled
        assert_eq!(column(&surface, rect), vec![10, 10, 12, 12, 14, 14]);

        let mut surface = field_surface(&[11, 13, 15]);
        let mut rect = Rect::new(0, 0, 2, 3);
        deinterlacer.process(&mut surface, &mut rect, &mut widths, FieldParity::Odd);
        assert_eq!(rect.h, 6);
        assert_eq!(column(&surface, rect), vec![10, 11, 12, 13, 14, 15]);
        assert!(widths.is_empty());
    }

    #[test]
    fn cleared_history_is_not_used() {
        let mut deinterlacer = Deinterlacer::new();
        let mut widths = Vec::new();

        let mut surface = field_surface(&[1, 1]);
        deinterlacer.process(&mut surface, &mut Rect::new(0, 0, 2, 2), &mut widths, FieldParity::Even);

        deinterlacer.clear_state();

        let mut surface = field_surface(&[2, 3]);
        let mut rect = Rect::new(0, 0, 2, 2);
        deinterlacer.process(&mut surface, &mut rect, &mut widths, FieldParity::Odd);
        assert_eq!(column(&surface, rect), vec![2, 2, 3, 3]);
    }

    #[test]
    fn same_parity_twice_line_doubles() {
        let mut deinterlacer = Deinterlacer::new();
        let mut widths = Vec::new();

        let mut surface = field_surface(&[1, 1]);
        deinterlacer.process(&mut surface, &mut Rect::new(0, 0, 2, 2), &mut widths, FieldParity::Odd);

        let mut surface = field_surface(&[5, 6]);
        let mut rect = Rect::new(0, 0, 2, 2);
        deinterlacer.process(&mut surface, &mut rect, &mut widths, FieldParity::Odd);
        assert_eq!(column(&surface, rect), vec![5, 5, 6, 6]);
    }

    #[test]
    fn height_change_line_doubles() {
        let mut deinterlacer = Deinterlacer::new();
        let mut widths = Vec::new();

        let mut surface = field_surface(&[1, 1, 1]);
        deinterlacer.process(&mut surface, &mut Rect::new(0, 0, 2, 3), &mut widths, FieldParity::Even);

        let mut surface = field_surface(&[7, 8]);
        let mut rect = Rect::new(0, 0, 2, 2);
        deinterlacer.process(&mut surface, &mut rect, &mut widths, FieldParity::Odd);
        assert_eq!(rect.h, 4);
        assert_eq!(column(&surface, rect), vec![7, 7, 8, 8]);

        // The 2-line field is now usable history
        let mut surface = field_surface(&[9, 10]);
        let mut rect = Rect::new(0, 0, 2, 2);
        deinterlacer.process(&mut surface, &mut rect, &mut widths, FieldParity::Even);
        assert_eq!(column(&surface, rect), vec![9, 7, 10, 8]);
    }

    #[test]
    fn per_line_widths_are_expanded() {
        let mut deinterlacer = Deinterlacer::new();

        let mut surface = field_surface(&[1, 2]);
        let mut rect = Rect::new(0, 0, 2, 2);
        let mut widths = vec![2, 1];
        deinterlacer.process(&mut surface, &mut rect, &mut widths, FieldParity::Even);

        assert_eq!(widths, vec![2, 2, 1, 1]);
    }
}
