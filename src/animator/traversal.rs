use crate::{routing::Route, shared::geo::Coordinate};

/// Cursor over the segments of a route.
///
/// Within a segment the traveled distance only grows, so positions returned by
/// `advance` never move backwards along the polyline. Reaching the end of a
/// segment snaps exactly onto its end point and drops any overshoot.
#[derive(Debug, Clone)]
pub struct Traversal {
    route: Route,
    segment: usize,
    traveled_km: f64,
}

impl Traversal {
    pub fn new(route: Route) -> Self {
        let mut traversal = Self {
            route,
            segment: 0,
            traveled_km: 0.0,
        };
        traversal.skip_empty_segments();
        traversal
    }

    /// Index of the active segment, equal to the segment count once finished.
    pub fn segment(&self) -> usize {
        self.segment
    }

    pub fn is_finished(&self) -> bool {
        self.segment >= self.route.segment_count()
    }

    /// Moves `distance_km` along the active segment and returns the new
    /// position, or `None` if every segment was already traversed.
    pub fn advance(&mut self, distance_km: f64) -> Option<Coordinate> {
        let (start, end) = self.route.segment(self.segment)?;
        let length = start.distance(&end).as_kilometers();
        self.traveled_km += distance_km.max(0.0);

        if self.traveled_km >= length {
            self.segment += 1;
            self.traveled_km = 0.0;
            self.skip_empty_segments();
            Some(end)
        } else {
            Some(start.lerp(&end, self.traveled_km / length))
        }
    }

    /// `position` followed by every waypoint not reached yet.
    pub fn remaining(&self, position: Coordinate) -> Vec<Coordinate> {
        let rest = self.route.get(self.segment + 1..).unwrap_or_default();
        let mut line = Vec::with_capacity(rest.len() + 1);
        line.push(position);
        line.extend_from_slice(rest);
        line
    }

    // Duplicate waypoints count as already traversed
    fn skip_empty_segments(&mut self) {
        while let Some((start, end)) = self.route.segment(self.segment) {
            if start.distance(&end).as_kilometers() > 0.0 {
                break;
            }
            self.segment += 1;
            self.traveled_km = 0.0;
        }
    }
}

#[test]
fn overshoot_snaps_to_segment_end() {
    let a = Coordinate::new(10.0, 106.0);
    let b = Coordinate::new(10.0, 106.001);
    let mut traversal = Traversal::new(vec![a, b].into());
    assert_eq!(traversal.advance(10.0), Some(b));
    assert!(traversal.is_finished());
    assert_eq!(traversal.advance(1.0), None);
}

#[test]
fn remaining_starts_at_position() {
    let a = Coordinate::new(10.0, 106.0);
    let b = Coordinate::new(10.0, 106.001);
    let c = Coordinate::new(10.0, 106.002);
    let mut traversal = Traversal::new(vec![a, b, c].into());
    let position = traversal.advance(0.01).unwrap();
    assert_eq!(traversal.remaining(position), vec![position, b, c]);
}
