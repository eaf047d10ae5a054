use crate::shared::face::DisplayRect;

/// Visible area of the overlay layer: the full canvas minus face holes,
/// expressed as non-overlapping rectangles.
#[derive(Clone, Debug, PartialEq)]
pub struct CutoutMask {
    width: f64,
    height: f64,
    regions: Vec<DisplayRect>,
}

impl CutoutMask {
    /// A mask with no holes: the overlay stays visible everywhere.
    pub fn full(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            regions: vec![DisplayRect::new(0.0, 0.0, width, height)],
        }
    }

    /// Canvas minus one face, as the regions above, below, left and right of
    /// it. Regions that collapse to zero area at a canvas edge are omitted.
    pub fn around(face: &DisplayRect, width: f64, height: f64) -> Self {
        let Some(hole) = face.clamp_to(width, height) else {
            return Self::full(width, height);
        };

        let candidates = [
            DisplayRect::new(0.0, 0.0, width, hole.y),
            DisplayRect::new(0.0, hole.bottom(), width, height - hole.bottom()),
            DisplayRect::new(0.0, hole.y, hole.x, hole.height),
            DisplayRect::new(hole.right(), hole.y, width - hole.right(), hole.height),
        ];

        Self {
            width,
            height,
            regions: candidates.into_iter().filter(|r| !r.is_empty()).collect(),
        }
    }

    /// Canvas minus the union of all faces.
    ///
    /// The canvas is cut into horizontal bands at every face edge; within a
    /// band, uncovered cells are merged into runs, and runs with the same
    /// horizontal extent in consecutive bands are merged vertically.
    pub fn around_all(faces: &[DisplayRect], width: f64, height: f64) -> Self {
        let holes: Vec<DisplayRect> = faces
            .iter()
            .filter_map(|f| f.clamp_to(width, height))
            .collect();
        if holes.is_empty() {
            return Self::full(width, height);
        }
        if holes.len() == 1 {
            return Self::around(&holes[0], width, height);
        }

        let xs = edges(&holes, width, |r| (r.x, r.right()));
        let ys = edges(&holes, height, |r| (r.y, r.bottom()));

        let mut regions: Vec<DisplayRect> = Vec::new();
        // (region index, x0, x1) of the runs emitted for the band above.
        let mut previous_band: Vec<(usize, f64, f64)> = Vec::new();

        for band in ys.windows(2) {
            let (y0, y1) = (band[0], band[1]);
            let in_band: Vec<&DisplayRect> =
                holes.iter().filter(|h| h.y < y1 && h.bottom() > y0).collect();

            let mut current_band = Vec::new();
            for (x0, x1) in uncovered_runs(&xs, &in_band) {
                let above = previous_band
                    .iter()
                    .find(|&&(_, px0, px1)| px0 == x0 && px1 == x1)
                    .map(|&(i, _, _)| i);
                let index = match above {
                    Some(i) => {
                        regions[i].height = y1 - regions[i].y;
                        i
                    }
                    None => {
                        regions.push(DisplayRect::new(x0, y0, x1 - x0, y1 - y0));
                        regions.len() - 1
                    }
                };
                current_band.push((index, x0, x1));
            }
            previous_band = current_band;
        }

        Self {
            width,
            height,
            regions,
        }
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn regions(&self) -> &[DisplayRect] {
        &self.regions
    }

    pub fn visible_area(&self) -> f64 {
        self.regions.iter().map(DisplayRect::area).sum()
    }

    /// How many regions contain the point. A valid mask yields 0 or 1.
    pub fn coverage_at(&self, x: f64, y: f64) -> usize {
        self.regions
            .iter()
            .filter(|r| x >= r.x && x < r.right() && y >= r.y && y < r.bottom())
            .count()
    }
}

/// Sorted, deduplicated cut positions along one axis, including both canvas edges.
fn edges(
    holes: &[DisplayRect],
    extent: f64,
    span: impl Fn(&DisplayRect) -> (f64, f64),
) -> Vec<f64> {
    let mut cuts = vec![0.0, extent];
    for h in holes {
        let (a, b) = span(h);
        cuts.push(a);
        cuts.push(b);
    }
    cuts.sort_by(|a, b| a.total_cmp(b));
    cuts.dedup();
    cuts
}

/// Maximal horizontal runs between consecutive cuts not covered by any hole.
fn uncovered_runs(xs: &[f64], holes: &[&DisplayRect]) -> Vec<(f64, f64)> {
    let mut runs: Vec<(f64, f64)> = Vec::new();
    for cell in xs.windows(2) {
        let (x0, x1) = (cell[0], cell[1]);
        if holes.iter().any(|h| h.x < x1 && h.right() > x0) {
            continue;
        }
        match runs.last_mut() {
            Some(last) if last.1 == x0 => last.1 = x1,
            _ => runs.push((x0, x1)),
        }
    }
    runs
}
