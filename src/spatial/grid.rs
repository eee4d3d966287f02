//! Uniform 3D spatial hash grid.
//!
//! Rebuilt from scratch every simulation step. Each node is bucketed by
//! `floor(p / cell_size)` per axis; neighbor queries scan the 3×3×3 block of
//! cells around a position. Pairs further apart than one cell width may be
//! missed, which is acceptable for an inverse-square force.

use std::collections::HashMap;

/// Integer coordinates of a grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellKey {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl CellKey {
    /// Cell containing the given point.
    #[inline]
    pub fn of(x: f64, y: f64, z: f64, cell_size: f64) -> Self {
        // `as` saturates, so far-flung or non-finite positions land in edge cells
        Self {
            x: (x / cell_size).floor() as i32,
            y: (y / cell_size).floor() as i32,
            z: (z / cell_size).floor() as i32,
        }
    }

    #[inline]
    fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
            z: self.z.saturating_add(dz),
        }
    }
}

/// Spatial hash grid over node slot indices.
pub struct SpatialHashGrid {
    cell_size: f64,
    cells: HashMap<CellKey, Vec<u32>>,
    /// Cell key per node, from the last rebuild
    keys: Vec<CellKey>,
}

impl SpatialHashGrid {
    /// Create an empty grid with the given cell edge length.
    pub fn new(cell_size: f64) -> Self {
        Self {
            cell_size,
            cells: HashMap::new(),
            keys: Vec::new(),
        }
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    /// Rebuild the grid from SoA positions.
    ///
    /// Bucket allocations are reused across rebuilds; empty buckets are
    /// dropped so the map does not grow without bound as the layout moves.
    pub fn rebuild(&mut self, xs: &[f64], ys: &[f64], zs: &[f64], cell_size: f64) {
        self.cell_size = cell_size;
        self.cells.values_mut().for_each(Vec::clear);
        self.keys.clear();
        self.keys.reserve(xs.len());

        for i in 0..xs.len() {
            let key = CellKey::of(xs[i], ys[i], zs[i], cell_size);
            self.keys.push(key);
            self.cells.entry(key).or_default().push(i as u32);
        }

        self.cells.retain(|_, bucket| !bucket.is_empty());
    }

    /// Visit every node in the 27 cells around `key`.
    pub fn for_each_near(&self, key: CellKey, mut f: impl FnMut(usize)) {
        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    if let Some(bucket) = self.cells.get(&key.offset(dx, dy, dz)) {
                        bucket.iter().for_each(|&j| f(j as usize));
                    }
                }
            }
        }
    }

    /// Visit every node near node `i` (including `i` itself).
    pub fn for_each_neighbor(&self, i: usize, f: impl FnMut(usize)) {
        if let Some(&key) = self.keys.get(i) {
            self.for_each_near(key, f);
        }
    }

    /// Nodes in node `i`'s cell and its 26 adjacent cells, excluding `i`.
    pub fn neighbors(&self, i: usize) -> Vec<usize> {
        let mut out = Vec::new();
        self.for_each_neighbor(i, |j| {
            if j != i {
                out.push(j);
            }
        });
        out
    }

    /// Number of non-empty cells.
    pub fn occupied_cells(&self) -> usize {
        self.cells.len()
    }

    /// Number of nodes indexed by the last rebuild.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn clear(&mut self) {
        self.cells.clear();
        self.keys.clear();
    }
}

impl Default for SpatialHashGrid {
    fn default() -> Self {
        Self::new(1.0)
    }
}
