/// Canonical edge key: the two endpoint vertex indices, smaller first.
pub type EdgeKey = (usize, usize);

/// Canonical key for the unordered vertex pair `(a, b)`.
#[inline]
pub const fn edge_key(a: usize, b: usize) -> EdgeKey {
    if a <= b { (a, b) } else { (b, a) }
}

/// An unordered pair of vertex indices with a "sharp" shading flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    pub vertices: [usize; 2],
    pub sharp: bool,
}

impl Edge {
    pub const fn new(a: usize, b: usize) -> Self {
        Edge {
            vertices: [a, b],
            sharp: false,
        }
    }

    pub const fn with_sharp(mut self, sharp: bool) -> Self {
        self.sharp = sharp;
        self
    }

    #[inline]
    pub const fn key(&self) -> EdgeKey {
        edge_key(self.vertices[0], self.vertices[1])
    }

    /// Both ends on the same vertex
    #[inline]
    pub const fn is_degenerate(&self) -> bool {
        self.vertices[0] == self.vertices[1]
    }
}
