use std::f64::consts::FRAC_PI_2;

use crate::core::Point;
use crate::render::PathCommand;

/// Straight segments through `points`.
#[must_use]
pub fn polyline(points: &[Point]) -> Vec<PathCommand> {
    let mut commands = Vec::with_capacity(points.len());
    for (index, point) in points.iter().enumerate() {
        commands.push(if index == 0 {
            PathCommand::MoveTo {
                x: point.x,
                y: point.y,
            }
        } else {
            PathCommand::LineTo {
                x: point.x,
                y: point.y,
            }
        });
    }
    commands
}

/// Monotone cubic interpolation in x (Fritsch-Carlson tangents).
///
/// The curve passes through every point and never overshoots between two
/// samples, so smoothed lines keep the extremes of the data.
#[must_use]
pub fn monotone_curve(points: &[Point]) -> Vec<PathCommand> {
    if points.len() < 3 {
        return polyline(points);
    }
    let n = points.len();
    let secants: Vec<f64> = points
        .windows(2)
        .map(|pair| {
            let dx = pair[1].x - pair[0].x;
            if dx == 0.0 {
                0.0
            } else {
                (pair[1].y - pair[0].y) / dx
            }
        })
        .collect();

    let mut tangents = vec![0.0; n];
    tangents[0] = secants[0];
    tangents[n - 1] = secants[n - 2];
    for index in 1..n - 1 {
        let (left, right) = (secants[index - 1], secants[index]);
        tangents[index] = if left * right <= 0.0 {
            0.0
        } else {
            (left + right) / 2.0
        };
    }
    for index in 0..n - 1 {
        let secant = secants[index];
        if secant == 0.0 {
            tangents[index] = 0.0;
            tangents[index + 1] = 0.0;
            continue;
        }
        let a = tangents[index] / secant;
        let b = tangents[index + 1] / secant;
        let magnitude = a.hypot(b);
        if magnitude > 3.0 {
            let scale = 3.0 / magnitude;
            tangents[index] = scale * a * secant;
            tangents[index + 1] = scale * b * secant;
        }
    }

    let mut commands = Vec::with_capacity(n);
    commands.push(PathCommand::MoveTo {
        x: points[0].x,
        y: points[0].y,
    });
    for index in 0..n - 1 {
        let (p0, p1) = (points[index], points[index + 1]);
        let third = (p1.x - p0.x) / 3.0;
        commands.push(PathCommand::CubicTo {
            c1x: p0.x + third,
            c1y: p0.y + tangents[index] * third,
            c2x: p1.x - third,
            c2y: p1.y - tangents[index + 1] * third,
            x: p1.x,
            y: p1.y,
        });
    }
    commands
}

/// Horizontal cubic link from `from` to `to`, control points at the x midpoint.
#[must_use]
pub fn horizontal_link(from: Point, to: Point) -> Vec<PathCommand> {
    let mid_x = (from.x + to.x) / 2.0;
    vec![
        PathCommand::MoveTo {
            x: from.x,
            y: from.y,
        },
        PathCommand::CubicTo {
            c1x: mid_x,
            c1y: from.y,
            c2x: mid_x,
            c2y: to.y,
            x: to.x,
            y: to.y,
        },
    ]
}

/// Point at `radius` from `center`; `angle` in radians clockwise from 12 o'clock.
#[must_use]
pub fn polar_point(center: Point, radius: f64, angle: f64) -> Point {
    Point::new(
        center.x + radius * angle.sin(),
        center.y - radius * angle.cos(),
    )
}

/// Converts a clockwise-from-12-o'clock angle into screen arc convention
/// (zero along +x, growing towards +y).
#[must_use]
pub fn to_screen_angle(angle: f64) -> f64 {
    angle - FRAC_PI_2
}

/// Pie wedge or annular sector between `start` and `end` (clockwise from 12 o'clock).
///
/// With `inner_radius <= 0` the outline runs through the center.
#[must_use]
pub fn annular_sector(
    center: Point,
    inner_radius: f64,
    outer_radius: f64,
    start: f64,
    end: f64,
) -> Vec<PathCommand> {
    let (screen_start, screen_end) = (to_screen_angle(start), to_screen_angle(end));
    if inner_radius <= 0.0 {
        return vec![
            PathCommand::MoveTo {
                x: center.x,
                y: center.y,
            },
            PathCommand::Arc {
                cx: center.x,
                cy: center.y,
                radius: outer_radius,
                start_angle: screen_start,
                end_angle: screen_end,
            },
            PathCommand::Close,
        ];
    }
    vec![
        PathCommand::Arc {
            cx: center.x,
            cy: center.y,
            radius: outer_radius,
            start_angle: screen_start,
            end_angle: screen_end,
        },
        PathCommand::Arc {
            cx: center.x,
            cy: center.y,
            radius: inner_radius,
            start_angle: screen_end,
            end_angle: screen_start,
        },
        PathCommand::Close,
    ]
}

/// Closed polygon through `points`.
#[must_use]
pub fn polygon(points: &[Point]) -> Vec<PathCommand> {
    let mut commands = polyline(points);
    if !commands.is_empty() {
        commands.push(PathCommand::Close);
    }
    commands
}

#[cfg(test)]
mod tests {
    use super::{annular_sector, horizontal_link, monotone_curve, polar_point};
    use crate::core::Point;
    use crate::render::PathCommand;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::PI;

    #[test]
    fn monotone_curve_interpolates_every_point() {
        let points = [
            Point::new(0.0, 10.0),
            Point::new(10.0, 0.0),
            Point::new(20.0, 5.0),
            Point::new(30.0, 5.0),
        ];
        let commands = monotone_curve(&points);
        assert_eq!(commands.len(), 4);
        let PathCommand::CubicTo { x, y, .. } = commands[2] else {
            panic!("expected cubic segment");
        };
        assert_eq!((x, y), (20.0, 5.0));
    }

    #[test]
    fn flat_segments_stay_flat() {
        let points = [Point::new(0.0, 5.0), Point::new(10.0, 5.0), Point::new(20.0, 5.0)];
        for command in monotone_curve(&points) {
            if let PathCommand::CubicTo { c1y, c2y, .. } = command {
                assert_eq!(c1y, 5.0);
                assert_eq!(c2y, 5.0);
            }
        }
    }

    #[test]
    fn link_controls_sit_at_horizontal_midpoint() {
        let commands = horizontal_link(Point::new(0.0, 0.0), Point::new(100.0, 50.0));
        let PathCommand::CubicTo { c1x, c2x, c2y, .. } = commands[1] else {
            panic!("expected cubic segment");
        };
        assert_eq!(c1x, 50.0);
        assert_eq!(c2x, 50.0);
        assert_eq!(c2y, 50.0);
    }

    #[test]
    fn polar_zero_points_up() {
        let top = polar_point(Point::new(50.0, 50.0), 10.0, 0.0);
        assert_abs_diff_eq!(top.y, 40.0, epsilon = 1e-12);
        let right = polar_point(Point::new(50.0, 50.0), 10.0, PI / 2.0);
        assert_abs_diff_eq!(right.x, 60.0, epsilon = 1e-12);
    }

    #[test]
    fn donut_sector_has_two_arcs() {
        let commands = annular_sector(Point::new(0.0, 0.0), 5.0, 10.0, 0.0, PI);
        assert_eq!(commands.len(), 3);
        assert!(matches!(commands[0], PathCommand::Arc { radius, .. } if radius == 10.0));
        assert!(matches!(commands[1], PathCommand::Arc { radius, .. } if radius == 5.0));
    }
}
