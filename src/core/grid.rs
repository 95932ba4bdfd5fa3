//! Uniform spatial grid for proximity queries
//!
//! Cells are squares with side equal to the connection distance, so any two
//! particles closer than that distance sit in the same or adjacent cells.
//! Buckets are stored as one flat index array plus per-cell offsets
//! (counting sort), and every buffer is reused between frames.

use tracing::trace;

use super::particle::Particle;

/// Marks a particle that fell outside the grid and was not bucketed
const UNBUCKETED: usize = usize::MAX;

#[derive(Debug, Default)]
pub struct SpatialGrid {
    cell_size: f64,
    cols: usize,
    rows: usize,
    /// `cell_start[c]..cell_start[c + 1]` is the slice of `indices` for cell c
    cell_start: Vec<usize>,
    /// Particle indices grouped by cell, ascending within each cell
    indices: Vec<usize>,
    /// Cell of each particle, or `UNBUCKETED`
    particle_cell: Vec<usize>,
    /// Scratch write cursors for the counting sort
    cursor: Vec<usize>,
}

impl SpatialGrid {
    pub fn new(cell_size: f64) -> Self {
        Self {
            cell_size,
            ..Default::default()
        }
    }

    /// Grid dimensions as (cols, rows)
    pub fn dimensions(&self) -> (usize, usize) {
        (self.cols, self.rows)
    }

    /// Re-bucket every particle for a viewport of the given size.
    ///
    /// The grid is `ceil(w / cell) + 1` by `ceil(h / cell) + 1` cells.
    pub fn rebuild(&mut self, particles: &[Particle], width: f64, height: f64) {
        self.cols = axis_cells(width, self.cell_size);
        self.rows = axis_cells(height, self.cell_size);
        let cell_count = self.cols * self.rows;

        self.cell_start.clear();
        self.cell_start.resize(cell_count + 1, 0);
        self.particle_cell.clear();
        self.particle_cell.reserve(particles.len());

        // Count particles per cell, shifted by one for the prefix sum
        for p in particles {
            let cell = self.cell_index(p.x, p.y).unwrap_or(UNBUCKETED);
            self.particle_cell.push(cell);
            if cell != UNBUCKETED {
                self.cell_start[cell + 1] += 1;
            }
        }

        for c in 0..cell_count {
            self.cell_start[c + 1] += self.cell_start[c];
        }

        let bucketed = self.cell_start[cell_count];
        self.indices.clear();
        self.indices.resize(bucketed, 0);
        self.cursor.clear();
        self.cursor.extend_from_slice(&self.cell_start[..cell_count]);

        for (i, &cell) in self.particle_cell.iter().enumerate() {
            if cell != UNBUCKETED {
                self.indices[self.cursor[cell]] = i;
                self.cursor[cell] += 1;
            }
        }

        trace!(
            cols = self.cols,
            rows = self.rows,
            bucketed,
            skipped = particles.len() - bucketed,
            "Spatial grid rebuilt"
        );
    }

    /// Linear cell index for a position, if it falls inside the grid
    pub fn cell_index(&self, x: f64, y: f64) -> Option<usize> {
        let (col, row) = self.cell_coords(x, y)?;
        Some(row * self.cols + col)
    }

    fn cell_coords(&self, x: f64, y: f64) -> Option<(usize, usize)> {
        let gc = (x / self.cell_size).floor();
        let gr = (y / self.cell_size).floor();
        if gc >= 0.0 && gr >= 0.0 && (gc as usize) < self.cols && (gr as usize) < self.rows {
            Some((gc as usize, gr as usize))
        } else {
            None
        }
    }

    /// Particle indices bucketed in the given cell
    pub fn cell(&self, cell: usize) -> &[usize] {
        &self.indices[self.cell_start[cell]..self.cell_start[cell + 1]]
    }

    /// Cells of the 3x3 block centered on particle `i`, clipped to the grid
    fn neighborhood(&self, i: usize) -> impl Iterator<Item = usize> + '_ {
        let cell = self.particle_cell.get(i).copied().unwrap_or(UNBUCKETED);
        let (cols, rows) = (self.cols as isize, self.rows as isize);
        let (gc, gr) = if cell == UNBUCKETED {
            (-2, -2)
        } else {
            ((cell % self.cols) as isize, (cell / self.cols) as isize)
        };

        (-1..=1isize)
            .flat_map(move |dr| (-1..=1isize).map(move |dc| (gc + dc, gr + dr)))
            .filter(move |&(nc, nr)| nc >= 0 && nc < cols && nr >= 0 && nr < rows)
            .map(move |(nc, nr)| (nr * cols + nc) as usize)
    }

    /// Visit every pair `(i, j)` with `i < j` closer than `max_dist`.
    ///
    /// Each pair is reported exactly once, with its distance. `particles`
    /// must be the slice the grid was last rebuilt from.
    pub fn for_each_pair<F>(&self, particles: &[Particle], max_dist: f64, mut f: F)
    where
        F: FnMut(usize, usize, f64),
    {
        for (i, a) in particles.iter().enumerate() {
            for cell in self.neighborhood(i) {
                for &j in self.cell(cell) {
                    if j <= i {
                        continue;
                    }
                    let dist = a.distance_to(particles[j].x, particles[j].y);
                    if dist < max_dist {
                        f(i, j, dist);
                    }
                }
            }
        }
    }

    /// Indices of all particles other than `i` closer than `max_dist` to it
    pub fn neighbors_within(&self, particles: &[Particle], i: usize, max_dist: f64) -> Vec<usize> {
        let a = &particles[i];
        let mut found: Vec<usize> = self
            .neighborhood(i)
            .flat_map(|cell| self.cell(cell).iter().copied())
            .filter(|&j| j != i && a.distance_to(particles[j].x, particles[j].y) < max_dist)
            .collect();
        found.sort_unstable();
        found
    }
}

fn axis_cells(extent: f64, cell_size: f64) -> usize {
    if extent.is_finite() && extent > 0.0 {
        (extent / cell_size).ceil() as usize + 1
    } else {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    fn brute_force_pairs(particles: &[Particle], max_dist: f64) -> Vec<(usize, usize)> {
        let mut pairs = Vec::new();
        for i in 0..particles.len() {
            for j in (i + 1)..particles.len() {
                if particles[i].distance_to(particles[j].x, particles[j].y) < max_dist {
                    pairs.push((i, j));
                }
            }
        }
        pairs
    }

    fn random_particles(rng: &mut SmallRng, n: usize, w: f64, h: f64) -> Vec<Particle> {
        (0..n)
            .map(|_| Particle::at_rest(rng.gen::<f64>() * w, rng.gen::<f64>() * h))
            .collect()
    }

    #[test]
    fn test_dimensions() {
        let mut grid = SpatialGrid::new(120.0);
        grid.rebuild(&[], 800.0, 600.0);
        assert_eq!(grid.dimensions(), (8, 6));
        grid.rebuild(&[], 1000.0, 700.0);
        assert_eq!(grid.dimensions(), (10, 7));
    }

    #[test]
    fn test_pairs_match_brute_force() {
        let mut rng = SmallRng::seed_from_u64(42);
        let mut grid = SpatialGrid::new(120.0);
        for n in [0, 1, 2, 17, 150, 400] {
            let particles = random_particles(&mut rng, n, 900.0, 700.0);
            grid.rebuild(&particles, 900.0, 700.0);

            let mut pairs = Vec::new();
            grid.for_each_pair(&particles, 120.0, |i, j, _| pairs.push((i, j)));
            pairs.sort_unstable();

            assert_eq!(pairs, brute_force_pairs(&particles, 120.0), "n = {}", n);
        }
    }

    #[test]
    fn test_neighbor_query_matches_brute_force() {
        let mut rng = SmallRng::seed_from_u64(9);
        let particles = random_particles(&mut rng, 250, 640.0, 480.0);
        let mut grid = SpatialGrid::new(120.0);
        grid.rebuild(&particles, 640.0, 480.0);

        for i in 0..particles.len() {
            let expected: Vec<usize> = (0..particles.len())
                .filter(|&j| {
                    j != i && particles[i].distance_to(particles[j].x, particles[j].y) < 120.0
                })
                .collect();
            assert_eq!(grid.neighbors_within(&particles, i, 120.0), expected);
        }
    }

    #[test]
    fn test_clustered_on_cell_boundaries() {
        // Points straddling cell edges are the case a 3x3 window must not miss
        let particles: Vec<Particle> = [
            (119.9, 119.9),
            (120.0, 120.0),
            (239.99, 0.0),
            (240.0, 0.5),
            (0.0, 0.0),
            (359.0, 359.0),
            (360.0, 360.0),
        ]
        .iter()
        .map(|&(x, y)| Particle::at_rest(x, y))
        .collect();
        let mut grid = SpatialGrid::new(120.0);
        grid.rebuild(&particles, 480.0, 480.0);

        let mut pairs = Vec::new();
        grid.for_each_pair(&particles, 120.0, |i, j, _| pairs.push((i, j)));
        pairs.sort_unstable();
        assert_eq!(pairs, brute_force_pairs(&particles, 120.0));
    }

    #[test]
    fn test_coincident_particles_pair_once() {
        let particles = vec![Particle::at_rest(50.0, 50.0), Particle::at_rest(50.0, 50.0)];
        let mut grid = SpatialGrid::new(120.0);
        grid.rebuild(&particles, 200.0, 200.0);

        let mut pairs = Vec::new();
        grid.for_each_pair(&particles, 120.0, |i, j, d| pairs.push((i, j, d)));
        assert_eq!(pairs, vec![(0, 1, 0.0)]);
    }

    #[test]
    fn test_out_of_range_particle_is_skipped() {
        let particles = vec![
            Particle::at_rest(10.0, 10.0),
            Particle::at_rest(-500.0, 10.0),
            Particle::at_rest(20.0, 10.0),
        ];
        let mut grid = SpatialGrid::new(120.0);
        grid.rebuild(&particles, 200.0, 200.0);

        let mut pairs = Vec::new();
        grid.for_each_pair(&particles, 120.0, |i, j, _| pairs.push((i, j)));
        assert_eq!(pairs, vec![(0, 2)]);
        assert!(grid.neighbors_within(&particles, 1, 120.0).is_empty());
    }

    #[test]
    fn test_buffers_reused_across_rebuilds() {
        let mut rng = SmallRng::seed_from_u64(1);
        let mut grid = SpatialGrid::new(120.0);

        let big = random_particles(&mut rng, 300, 800.0, 600.0);
        grid.rebuild(&big, 800.0, 600.0);
        let capacity = grid.indices.capacity();

        let small = random_particles(&mut rng, 40, 800.0, 600.0);
        grid.rebuild(&small, 800.0, 600.0);
        assert_eq!(grid.indices.capacity(), capacity);
        assert_eq!(grid.indices.len(), 40);

        let total: usize = (0..grid.cols * grid.rows).map(|c| grid.cell(c).len()).sum();
        assert_eq!(total, 40);
    }
}
