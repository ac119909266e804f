//! Line rasterizer property tests.

use proptest::prelude::*;

use frame_compositor::graphics::geometry::{Point, Vector};
use frame_compositor::graphics::line::{draw_line, LineSteps, LineStyle};
use frame_compositor::graphics::scene::NoWrap;
use frame_compositor::graphics::surface::Surface;

fn lit_pixels(surface: &Surface) -> Vec<(i32, i32)> {
    let mut out = Vec::new();
    for y in 0..surface.height() as i32 {
        for x in 0..surface.width() as i32 {
            if surface.get_pixel(x, y) != Some(0) {
                out.push((x, y));
            }
        }
    }
    out
}

/// Expected plot count and final skip counter for `candidates` pixels
fn skip_model(candidates: u32, skip: u32, skip_start: u32) -> (usize, u32) {
    let mut counter = skip_start;
    let mut plots = 0;
    for _ in 0..candidates {
        counter += 1;
        if counter > skip {
            plots += 1;
            counter = 0;
        }
    }
    (plots, counter)
}

proptest! {
    #[test]
    fn steps_walk_one_pixel_at_a_time(dx in -40i32..=40, dy in -40i32..=40) {
        let start = Point::new(3, -7);
        let steps: Vec<Point> = LineSteps::new(start, Point::new(dx, dy)).collect();

        prop_assert_eq!(steps.len() as i32, dx.abs().max(dy.abs()));
        if let Some(last) = steps.last() {
            prop_assert_eq!(*last, Point::new(start.x + dx, start.y + dy));
        }

        let mut prev = start;
        for step in &steps {
            let moved = (step.x - prev.x).abs().max((step.y - prev.y).abs());
            prop_assert_eq!(moved, 1);
            prev = *step;
        }
    }

    #[test]
    fn plot_count_follows_skip_counter(
        dx in -15i32..=15,
        dy in -15i32..=15,
        skip in 0u16..5,
        skip_start in 0u16..5,
    ) {
        let mut s = Surface::new_indexed(64, 64).unwrap();
        let style = LineStyle::solid(1).with_skip(skip, skip_start);
        let start = Vector::new(30.0, 30.0);
        let end = Vector::new(30.0 + dx as f32, 30.0 + dy as f32);
        let residual = draw_line(&mut s, &NoWrap, start, end, &style);

        let candidates = dx.abs().max(dy.abs()) as u32;
        if candidates == 0 {
            prop_assert_eq!(residual, 0);
            prop_assert!(lit_pixels(&s).is_empty());
        } else {
            let (plots, counter) = skip_model(candidates, skip as u32, skip_start as u32);
            prop_assert_eq!(lit_pixels(&s).len(), plots);
            prop_assert_eq!(residual as u32, counter);
        }
    }

    #[test]
    fn residual_joins_dashes_across_segments(
        first in 1i32..20,
        second in 1i32..20,
        skip in 0u16..6,
    ) {
        let style = LineStyle::solid(1).with_skip(skip, 0);

        let mut joined = Surface::new_indexed(48, 1).unwrap();
        let residual = draw_line(&mut joined, &NoWrap, Vector::new(0.0, 0.0), Vector::new(first as f32, 0.0), &style);
        draw_line(
            &mut joined,
            &NoWrap,
            Vector::new(first as f32, 0.0),
            Vector::new((first + second) as f32, 0.0),
            &style.with_skip(skip, residual),
        );

        let mut whole = Surface::new_indexed(48, 1).unwrap();
        draw_line(&mut whole, &NoWrap, Vector::new(0.0, 0.0), Vector::new((first + second) as f32, 0.0), &style);

        prop_assert_eq!(lit_pixels(&joined), lit_pixels(&whole));
    }
}

#[test]
fn steps_report_exact_length() {
    let steps = LineSteps::new(Point::new(0, 0), Point::new(-6, 2));
    assert_eq!(steps.len(), 6);
}
