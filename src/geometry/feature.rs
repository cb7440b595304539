//! Support features returned by shapes for manifold generation.

use vek::Vec2;

/// A single vertex of a shape in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VertexFeature {
    /// World position.
    pub point: Vec2<f64>,
    /// Index into the parent shape, 0 for shapes without vertices.
    pub index: u32,
}

impl VertexFeature {
    /// Construct from a world point and its index in the parent shape.
    pub fn new(point: Vec2<f64>, index: u32) -> Self {
        Self { point, index }
    }
}

/// An edge of a shape in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeFeature {
    /// First endpoint, in winding order.
    pub v1: VertexFeature,
    /// Second endpoint, in winding order.
    pub v2: VertexFeature,
    /// The endpoint farthest along the query direction.
    pub max: VertexFeature,
    /// Index of the edge in the parent shape.
    pub index: u32,
}

impl EdgeFeature {
    /// Construct from both endpoints, the farthest endpoint and the edge index.
    pub fn new(v1: VertexFeature, v2: VertexFeature, max: VertexFeature, index: u32) -> Self {
        Self { v1, v2, max, index }
    }

    /// Edge vector from the first to the second endpoint.
    pub fn vector(&self) -> Vec2<f64> {
        self.v2.point - self.v1.point
    }
}

/// Farthest feature of a shape along a direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Feature {
    /// A lone vertex.
    Vertex(VertexFeature),
    /// A full edge.
    Edge(EdgeFeature),
}

impl Feature {
    /// The farthest world point of the feature along the query direction.
    pub fn max_point(&self) -> Vec2<f64> {
        match self {
            Feature::Vertex(vertex) => vertex.point,
            Feature::Edge(edge) => edge.max.point,
        }
    }
}
