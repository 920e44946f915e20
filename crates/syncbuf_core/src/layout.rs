//! # Vertex Attribute Layouts
//!
//! Describes how one buffer element is split into shader attributes.
//! A layout is fixed for the lifetime of a buffer.

use bytemuck::Pod;

use crate::error::{BufferError, BufferResult};

/// Scalar type of a vertex attribute component.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AttributeKind {
    /// 32-bit float.
    F32,
    /// 32-bit signed integer.
    I32,
    /// 32-bit unsigned integer.
    U32,
    /// 16-bit unsigned integer.
    U16,
    /// 8-bit unsigned integer.
    U8,
    /// 8-bit unsigned integer, normalized to `[0, 1]` by the shader.
    U8Norm,
}

impl AttributeKind {
    /// Size of one component in bytes.
    #[inline]
    #[must_use]
    pub const fn size_bytes(self) -> usize {
        match self {
            Self::F32 | Self::I32 | Self::U32 => 4,
            Self::U16 => 2,
            Self::U8 | Self::U8Norm => 1,
        }
    }
}

/// One attribute inside an element.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct VertexAttribute {
    /// Shader location.
    pub location: u32,
    /// Number of components (1-4).
    pub components: u8,
    /// Component type.
    pub kind: AttributeKind,
    /// Byte offset from the start of the element.
    pub offset: usize,
}

impl VertexAttribute {
    /// Size of the whole attribute in bytes.
    #[inline]
    #[must_use]
    pub const fn size_bytes(&self) -> usize {
        self.components as usize * self.kind.size_bytes()
    }
}

/// Per-element attribute descriptors plus the element stride.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct AttributeLayout {
    stride: usize,
    attributes: Vec<VertexAttribute>,
}

impl AttributeLayout {
    /// Creates a layout from explicit attributes.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::InvalidLayout`] if an attribute has 0 or more
    /// than 4 components, or does not fit inside `stride`.
    pub fn new(stride: usize, attributes: Vec<VertexAttribute>) -> BufferResult<Self> {
        for attr in &attributes {
            if attr.components == 0 || attr.components > 4 {
                return Err(BufferError::InvalidLayout(format!(
                    "location {} has {} components",
                    attr.location, attr.components
                )));
            }
            let Some(end) = attr.offset.checked_add(attr.size_bytes()) else {
                return Err(BufferError::InvalidLayout(format!(
                    "location {} offset {} overflows",
                    attr.location, attr.offset
                )));
            };
            if end > stride {
                return Err(BufferError::InvalidLayout(format!(
                    "location {} ends at byte {} past stride {}",
                    attr.location, end, stride
                )));
            }
        }
        Ok(Self { stride, attributes })
    }

    /// Layout of a single attribute at location 0 filling the whole element.
    #[must_use]
    pub fn single(kind: AttributeKind, components: u8) -> Self {
        let attribute = VertexAttribute {
            location: 0,
            components,
            kind,
            offset: 0,
        };
        Self {
            stride: attribute.size_bytes(),
            attributes: vec![attribute],
        }
    }

    /// Byte stride between consecutive elements.
    #[inline]
    #[must_use]
    pub const fn stride(&self) -> usize {
        self.stride
    }

    /// The attribute descriptors, in declaration order.
    #[inline]
    #[must_use]
    pub fn attributes(&self) -> &[VertexAttribute] {
        &self.attributes
    }

    /// Number of attributes.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    /// True if the layout declares no attributes.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

/// Element type storable in a device buffer.
///
/// Elements must be plain old data: fixed layout, bitwise copyable, no
/// references. `Pod` enforces that at compile time.
///
/// # Example
///
/// ```rust,ignore
/// #[repr(C)]
/// #[derive(Clone, Copy, Debug, Pod, Zeroable)]
/// struct ColoredVertex {
///     position: [f32; 3],
///     color: [u8; 4],
/// }
///
/// impl Vertex for ColoredVertex {
///     fn layout() -> AttributeLayout {
///         AttributeLayout::new(16, vec![
///             VertexAttribute { location: 0, components: 3, kind: AttributeKind::F32, offset: 0 },
///             VertexAttribute { location: 1, components: 4, kind: AttributeKind::U8Norm, offset: 12 },
///         ]).expect("static layout")
///     }
/// }
/// ```
pub trait Vertex: Pod + Send + Sync + 'static {
    /// Attribute layout of one element.
    fn layout() -> AttributeLayout;
}

macro_rules! scalar_vertex {
    ($($ty:ty => $kind:expr),* $(,)?) => {
        $(
            impl Vertex for $ty {
                fn layout() -> AttributeLayout {
                    AttributeLayout::single($kind, 1)
                }
            }
        )*
    };
}

scalar_vertex! {
    f32 => AttributeKind::F32,
    i32 => AttributeKind::I32,
    u32 => AttributeKind::U32,
    u16 => AttributeKind::U16,
    u8 => AttributeKind::U8,
}

impl Vertex for [f32; 2] {
    fn layout() -> AttributeLayout {
        AttributeLayout::single(AttributeKind::F32, 2)
    }
}

impl Vertex for [f32; 3] {
    fn layout() -> AttributeLayout {
        AttributeLayout::single(AttributeKind::F32, 3)
    }
}

impl Vertex for [f32; 4] {
    fn layout() -> AttributeLayout {
        AttributeLayout::single(AttributeKind::F32, 4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_layouts() {
        let layout = <i32 as Vertex>::layout();
        assert_eq!(layout.stride(), 4);
        assert_eq!(layout.len(), 1);
        assert_eq!(layout.attributes()[0].kind, AttributeKind::I32);

        let layout = <[f32; 3] as Vertex>::layout();
        assert_eq!(layout.stride(), 12);
        assert_eq!(layout.attributes()[0].components, 3);
    }

    #[test]
    fn test_interleaved_layout() {
        let layout = AttributeLayout::new(
            16,
            vec![
                VertexAttribute {
                    location: 0,
                    components: 3,
                    kind: AttributeKind::F32,
                    offset: 0,
                },
                VertexAttribute {
                    location: 1,
                    components: 4,
                    kind: AttributeKind::U8Norm,
                    offset: 12,
                },
            ],
        )
        .unwrap();

        assert_eq!(layout.stride(), 16);
        assert_eq!(layout.attributes()[1].size_bytes(), 4);
    }

    #[test]
    fn test_attribute_past_stride_rejected() {
        let result = AttributeLayout::new(
            8,
            vec![VertexAttribute {
                location: 2,
                components: 3,
                kind: AttributeKind::F32,
                offset: 0,
            }],
        );
        assert!(matches!(result, Err(BufferError::InvalidLayout(_))));
    }

    #[test]
    fn test_huge_offset_rejected() {
        let result = AttributeLayout::new(
            16,
            vec![VertexAttribute {
                location: 0,
                components: 4,
                kind: AttributeKind::F32,
                offset: usize::MAX,
            }],
        );
        assert!(matches!(result, Err(BufferError::InvalidLayout(_))));
    }

    #[test]
    fn test_zero_components_rejected() {
        let result = AttributeLayout::new(
            4,
            vec![VertexAttribute {
                location: 0,
                components: 0,
                kind: AttributeKind::F32,
                offset: 0,
            }],
        );
        assert!(result.is_err());
    }
}
