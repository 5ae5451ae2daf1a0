use lyon::path::Path;
use lyon::tessellation::{BuffersBuilder, FillOptions, FillRule, FillTessellator, FillVertex, VertexBuffers};

use crate::error::GeometryError;
use crate::spacial::Position;

/// Triangles of a filled ring, for plotting consumers.
#[derive(Debug, Clone)]
pub struct PolygonMesh {
    pub vertices: Vec<[f32; 2]>,
    pub indices: Vec<u32>,
}

/// Fill-tessellate a closed ring using the even-odd rule.
pub fn tessellate_polygon(vertices: &[Position]) -> Result<PolygonMesh, GeometryError> {
    let mut path_builder = Path::builder();
    if let Some(first) = vertices.first() {
        path_builder.begin(lyon::math::Point::new(first.x as f32, first.y as f32));
        for pos in &vertices[1..] {
            path_builder.line_to(lyon::math::Point::new(pos.x as f32, pos.y as f32));
        }
        path_builder.close();
    }
    let path = path_builder.build();

    let mut geometry: VertexBuffers<[f32; 2], u32> = VertexBuffers::new();
    let mut tessellator = FillTessellator::new();

    tessellator
        .tessellate_path(
            &path,
            &FillOptions::default().with_fill_rule(FillRule::EvenOdd),
            &mut BuffersBuilder::new(&mut geometry, |vertex: FillVertex| {
                [vertex.position().x, vertex.position().y]
            }),
        )
        .map_err(|error| GeometryError::Tessellation(format!("{:?}", error)))?;

    Ok(PolygonMesh {
        vertices: geometry.vertices,
        indices: geometry.indices,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::square;

    #[test]
    fn test_square_is_two_triangles() {
        // when
        let mesh = tessellate_polygon(&square(Position::new(0.0, 0.0), 2.0)).unwrap();

        // then
        assert_eq!(mesh.vertices.len(), 4);
        assert_eq!(mesh.indices.len(), 6);
    }

    #[test]
    fn test_empty_ring_has_no_triangles() {
        let mesh = tessellate_polygon(&[]).unwrap();
        assert!(mesh.indices.is_empty());
    }
}
