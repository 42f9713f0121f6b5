//! Fixed-size rectangular arrangement of nodes.

use skirmish_core::{GridError, Node};

/// Rectangular battle map owning exactly one [`Node`] per coordinate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    width: u32,
    height: u32,
    nodes: Vec<Node>,
}

impl Grid {
    /// Builds a `width` by `height` grid.
    ///
    /// Both dimensions must be at least one.
    pub fn new(width: u32, height: u32) -> Result<Self, GridError> {
        if width == 0 || height == 0 {
            return Err(GridError::OutOfBounds {
                x: width,
                y: height,
                width,
                height,
            });
        }

        let capacity = usize::try_from(u64::from(width) * u64::from(height)).unwrap_or(0);
        let mut nodes = Vec::with_capacity(capacity);
        for y in 0..height {
            for x in 0..width {
                nodes.push(Node::new(x, y));
            }
        }

        Ok(Self {
            width,
            height,
            nodes,
        })
    }

    /// Number of columns.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Number of rows.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Total number of nodes owned by the grid.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false; grids hold at least one node.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterates nodes in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    /// Reports whether the coordinate addresses a node.
    #[must_use]
    pub const fn contains(&self, x: u32, y: u32) -> bool {
        x < self.width && y < self.height
    }

    /// Returns the node at `(x, y)`.
    pub fn get_node(&self, x: u32, y: u32) -> Result<&Node, GridError> {
        self.index(x, y)
            .and_then(|index| self.nodes.get(index))
            .ok_or(GridError::OutOfBounds {
                x,
                y,
                width: self.width,
                height: self.height,
            })
    }

    /// Nodes inside the square of radius `dist` centred on `node`.
    ///
    /// The centre is excluded and the square is clipped to the grid, so a
    /// corner node has 3 neighbours at distance one, an edge node 5 and an
    /// interior node 8. Callers must not rely on the order.
    #[must_use]
    pub fn neighbors(&self, node: &Node, dist: u32) -> Vec<&Node> {
        let min_x = node.x().saturating_sub(dist);
        let min_y = node.y().saturating_sub(dist);
        let max_x = node.x().saturating_add(dist).min(self.width - 1);
        let max_y = node.y().saturating_add(dist).min(self.height - 1);

        let mut found = Vec::new();
        if min_x > max_x || min_y > max_y {
            return found;
        }

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                if x == node.x() && y == node.y() {
                    continue;
                }
                if let Some(neighbor) = self.index(x, y).and_then(|index| self.nodes.get(index)) {
                    found.push(neighbor);
                }
            }
        }
        found
    }

    fn index(&self, x: u32, y: u32) -> Option<usize> {
        if !self.contains(x, y) {
            return None;
        }
        let row = usize::try_from(y).ok()?;
        let column = usize::try_from(x).ok()?;
        let width = usize::try_from(self.width).ok()?;
        Some(row * width + column)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn nodes_match_their_coordinates() {
        let grid = Grid::new(2, 3).expect("valid grid");
        for y in 0..3 {
            for x in 0..2 {
                let node = grid.get_node(x, y).expect("in bounds");
                assert_eq!((node.x(), node.y()), (x, y));
            }
        }
    }

    #[test]
    fn grid_holds_one_node_per_coordinate() {
        let grid = Grid::new(7, 4).expect("valid grid");
        let unique: HashSet<_> = grid.iter().copied().collect();
        assert_eq!(grid.len(), 28);
        assert_eq!(unique.len(), 28);
    }

    #[test]
    fn zero_dimensions_are_rejected() {
        assert!(matches!(
            Grid::new(0, 5),
            Err(GridError::OutOfBounds { .. })
        ));
        assert!(matches!(
            Grid::new(5, 0),
            Err(GridError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn get_node_rejects_out_of_range_coordinates() {
        let grid = Grid::new(3, 2).expect("valid grid");
        assert_eq!(
            grid.get_node(3, 0),
            Err(GridError::OutOfBounds {
                x: 3,
                y: 0,
                width: 3,
                height: 2,
            })
        );
        assert!(grid.get_node(0, 2).is_err());
        assert!(grid.get_node(2, 1).is_ok());
    }

    #[test]
    fn neighbor_counts_depend_on_position() {
        let grid = Grid::new(10, 10).expect("valid grid");
        let interior = grid.get_node(5, 5).expect("in bounds");
        let edge = grid.get_node(0, 3).expect("in bounds");
        let corner = grid.get_node(9, 9).expect("in bounds");

        assert_eq!(grid.neighbors(interior, 1).len(), 8);
        assert_eq!(grid.neighbors(edge, 1).len(), 5);
        assert_eq!(grid.neighbors(corner, 1).len(), 3);
    }

    #[test]
    fn neighbors_exclude_centre_and_use_square_radius() {
        let grid = Grid::new(10, 10).expect("valid grid");
        let centre = *grid.get_node(4, 4).expect("in bounds");
        let found = grid.neighbors(&centre, 2);

        assert_eq!(found.len(), 24);
        assert!(found.iter().all(|node| **node != centre));
        assert!(found.iter().all(|node| node.chebyshev_distance(centre) <= 2));
        assert!(found.contains(&&Node::new(6, 6)), "diagonal corners count");
    }

    #[test]
    fn neighbors_clip_on_non_square_grids() {
        let grid = Grid::new(2, 5).expect("valid grid");
        let node = grid.get_node(1, 4).expect("in bounds");
        let found = grid.neighbors(node, 3);

        assert_eq!(found.len(), 7);
        assert!(found.iter().all(|n| n.x() < 2 && n.y() < 5));
    }

    #[test]
    fn single_cell_grid_has_no_neighbors() {
        let grid = Grid::new(1, 1).expect("valid grid");
        let only = grid.get_node(0, 0).expect("in bounds");
        assert!(grid.neighbors(only, 4).is_empty());
    }
}
