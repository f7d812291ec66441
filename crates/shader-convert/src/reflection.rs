//! Decoding of the cross-compiler's JSON reflection document into the
//! binding model consumed by the GPU backends.
//!
//! The document is keyed by stage (`vs`, `fs`). Only vertex inputs are kept.
//! Uniform blocks and textures come from the vertex stage when it declares
//! any, and from the fragment stage otherwise.

use crate::data_type::{parse_data_type, DataType, UnsupportedTypeError};

/// A vertex input attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct InputBinding {
    /// Name of the input variable.
    pub name: String,
    /// Location slot.
    pub location: i32,
    /// HLSL semantic name, such as `TEXCOORD`.
    pub semantic: String,
    /// HLSL semantic index.
    pub semantic_index: i32,
    /// Component kind.
    pub data_type: DataType,
    /// Number of components.
    pub size: u32,
}

/// A declared uniform block and the binding it is bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct UniformBlock {
    /// Block name.
    pub name: String,
    /// Binding slot.
    pub binding: i32,
}

/// A uniform block member, positioned inside the flattened uniform buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct UniformMember {
    /// Synthetic `_<block id>.<member>` name, as emitted by the cross-compiler
    /// for flattened blocks.
    pub name: String,
    /// Component kind.
    pub data_type: DataType,
    /// Number of components.
    pub size: u32,
    /// Byte offset from the start of the flattened buffer.
    pub offset: u32,
}

/// All uniform blocks of a shader laid out back to back in one buffer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[non_exhaustive]
pub struct UniformLayout {
    /// Blocks in declaration order.
    pub blocks: Vec<UniformBlock>,
    /// Members of every block, in declaration order.
    pub members: Vec<UniformMember>,
    /// Total size in bytes of all blocks.
    pub size: u32,
}

/// A sampled texture and its binding slot.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct TextureBinding {
    /// Texture name.
    pub name: String,
    /// Binding slot.
    pub binding: i32,
}

/// Everything the backends need to know to bind resources for one shader variant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[non_exhaustive]
pub struct ReflectionInfo {
    /// Vertex inputs, sorted by location.
    pub inputs: Vec<InputBinding>,
    /// Flattened uniform layout.
    pub uniforms: UniformLayout,
    /// Texture bindings.
    pub textures: Vec<TextureBinding>,
}

/// An error indicating the reflection document could not be understood.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ReflectionParseError {
    /// The document is not valid JSON or does not have the expected shape.
    #[error("malformed reflection document: {0}")]
    Json(#[from] serde_json::Error),
    /// An input or uniform member uses a type outside the supported vocabulary.
    #[error(transparent)]
    UnsupportedType(#[from] UnsupportedTypeError),
    /// The flattened uniform layout does not fit in 32 bits.
    #[error("uniform block '{block}' overflows the flattened uniform layout")]
    LayoutOverflow {
        /// Name of the block being laid out.
        block: String,
    },
}

/// Raw reflection document, mirroring the parts of the cross-compiler's
/// JSON schema that are used. Unknown fields are ignored and missing ones default.
mod raw {
    #[derive(Debug, Default, serde::Deserialize)]
    #[serde(default)]
    pub(super) struct Input {
        pub name: String,
        pub location: i32,
        pub semantic: String,
        pub semantic_index: i32,
        #[serde(rename = "type")]
        pub type_name: String,
    }

    #[derive(Debug, Default, serde::Deserialize)]
    #[serde(default)]
    pub(super) struct UniformMember {
        pub name: String,
        #[serde(rename = "type")]
        pub type_name: String,
        pub offset: u32,
    }

    #[derive(Debug, Default, serde::Deserialize)]
    #[serde(default)]
    pub(super) struct UniformBuffer {
        pub id: i32,
        pub name: String,
        pub binding: i32,
        pub block_size: u32,
        pub members: Vec<UniformMember>,
    }

    #[derive(Debug, Default, serde::Deserialize)]
    #[serde(default)]
    pub(super) struct Texture {
        pub name: String,
        pub binding: i32,
    }

    #[derive(Debug, Default, serde::Deserialize)]
    #[serde(default)]
    pub(super) struct Stage {
        pub inputs: Vec<Input>,
        pub uniform_buffers: Vec<UniformBuffer>,
        pub textures: Vec<Texture>,
    }

    #[derive(Debug, Default, serde::Deserialize)]
    #[serde(default)]
    pub(super) struct Document {
        pub vs: Stage,
        pub fs: Stage,
    }
}

/// Picks the vertex stage's list, falling back to the fragment stage's when it is empty.
fn vertex_or_fragment<'doc, T>(vertex: &'doc [T], fragment: &'doc [T], what: &str) -> &'doc [T] {
    if vertex.is_empty() {
        log::debug!("taking {what} from the fragment stage");
        fragment
    } else {
        log::debug!("taking {what} from the vertex stage");
        vertex
    }
}

/// Decodes a reflection document.
///
/// # Errors
///
/// Fails if the JSON is malformed or uses a type outside of
/// [`parse_data_type`]'s vocabulary.
#[inline]
pub fn parse_reflection(json: &[u8]) -> Result<ReflectionInfo, ReflectionParseError> {
    let document: raw::Document = serde_json::from_slice(json)?;

    let mut inputs = document
        .vs
        .inputs
        .iter()
        .map(|input| -> Result<InputBinding, ReflectionParseError> {
            let (data_type, size) = parse_data_type(&input.type_name)?;
            Ok(InputBinding {
                name: input.name.clone(),
                location: input.location,
                semantic: input.semantic.clone(),
                semantic_index: input.semantic_index,
                data_type,
                size,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    inputs.sort_by_key(|input| input.location);

    let mut uniforms = UniformLayout::default();
    let buffers = vertex_or_fragment(
        &document.vs.uniform_buffers,
        &document.fs.uniform_buffers,
        "uniform blocks",
    );
    let mut block_offset: u32 = 0;
    for block in buffers {
        let overflow = || ReflectionParseError::LayoutOverflow {
            block: block.name.clone(),
        };
        uniforms.blocks.push(UniformBlock {
            name: block.name.clone(),
            binding: block.binding,
        });
        for member in &block.members {
            let (data_type, size) = parse_data_type(&member.type_name)?;
            uniforms.members.push(UniformMember {
                name: format!("_{}.{}", block.id, member.name),
                data_type,
                size,
                offset: block_offset
                    .checked_add(member.offset)
                    .ok_or_else(overflow)?,
            });
        }
        block_offset = block_offset
            .checked_add(block.block_size)
            .ok_or_else(overflow)?;
    }
    uniforms.size = block_offset;

    let textures = vertex_or_fragment(
        &document.vs.textures,
        &document.fs.textures,
        "textures",
    )
    .iter()
    .map(|texture| TextureBinding {
        name: texture.name.clone(),
        binding: texture.binding,
    })
    .collect();

    Ok(ReflectionInfo {
        inputs,
        uniforms,
        textures,
    })
}

#[cfg(test)]
mod test {
    use super::*;

    #[test_log::test]
    fn inputs_sorted_by_location() {
        let json = br#"{
            "vs": {
                "inputs": [
                    {"id": 1, "name": "uv", "location": 2, "semantic": "TEXCOORD", "semantic_index": 1, "type": "float2"},
                    {"id": 2, "name": "pos", "location": 0, "semantic": "POSITION", "semantic_index": 0, "type": "float4"},
                    {"id": 3, "name": "index", "location": 1, "semantic": "TEXCOORD", "semantic_index": 0, "type": "int"}
                ]
            }
        }"#;
        let info = parse_reflection(json).unwrap();
        let names: Vec<_> = info.inputs.iter().map(|input| input.name.as_str()).collect();
        assert_eq!(names, ["pos", "index", "uv"]);
        assert_eq!(
            info.inputs[2],
            InputBinding {
                name: "uv".to_owned(),
                location: 2,
                semantic: "TEXCOORD".to_owned(),
                semantic_index: 1,
                data_type: DataType::Float,
                size: 2,
            }
        );
        assert_eq!(info.inputs[1].data_type, DataType::Int);
        assert!(info.uniforms.blocks.is_empty());
        assert_eq!(info.uniforms.size, 0);
    }

    #[test_log::test]
    fn single_color_block() {
        let json = br#"{
            "fs": {
                "uniform_buffers": [
                    {"id": 3, "name": "Color", "set": 0, "binding": 0, "block_size": 16,
                     "members": [{"name": "_color", "type": "float4", "offset": 0, "size": 16}]}
                ]
            }
        }"#;
        let info = parse_reflection(json).unwrap();
        assert_eq!(
            info.uniforms.blocks,
            [UniformBlock {
                name: "Color".to_owned(),
                binding: 0,
            }]
        );
        assert_eq!(
            info.uniforms.members,
            [UniformMember {
                name: "_3._color".to_owned(),
                data_type: DataType::Float,
                size: 4,
                offset: 0,
            }]
        );
        assert_eq!(info.uniforms.size, 16);
    }

    #[test_log::test]
    fn blocks_are_flattened_in_declaration_order() {
        let json = br#"{
            "vs": {
                "uniform_buffers": [
                    {"id": 7, "name": "Block", "binding": 0, "block_size": 32,
                     "members": [
                        {"name": "transform", "type": "float4", "offset": 0},
                        {"name": "uvTransform", "type": "float4", "offset": 16}
                     ]},
                    {"id": 9, "name": "Gradient", "binding": 1, "block_size": 48,
                     "members": [
                        {"name": "color1", "type": "float4", "offset": 0},
                        {"name": "color2", "type": "float4", "offset": 16},
                        {"name": "index", "type": "int", "offset": 32}
                     ]}
                ]
            },
            "fs": {
                "uniform_buffers": [
                    {"id": 1, "name": "Ignored", "binding": 5, "block_size": 16,
                     "members": [{"name": "x", "type": "float", "offset": 0}]}
                ]
            }
        }"#;
        let info = parse_reflection(json).unwrap();
        let blocks: Vec<_> = info
            .uniforms
            .blocks
            .iter()
            .map(|block| (block.name.as_str(), block.binding))
            .collect();
        assert_eq!(blocks, [("Block", 0), ("Gradient", 1)]);
        let members: Vec<_> = info
            .uniforms
            .members
            .iter()
            .map(|member| (member.name.as_str(), member.offset))
            .collect();
        assert_eq!(
            members,
            [
                ("_7.transform", 0),
                ("_7.uvTransform", 16),
                ("_9.color1", 32),
                ("_9.color2", 48),
                ("_9.index", 64),
            ]
        );
        assert_eq!(info.uniforms.size, 80);
    }

    #[test_log::test]
    fn textures_prefer_vertex_stage() {
        let both = br#"{
            "vs": {"textures": [{"id": 1, "name": "vtex", "binding": 2, "dimension": "2d"}]},
            "fs": {"textures": [{"id": 2, "name": "ftex", "binding": 0, "dimension": "2d"}]}
        }"#;
        let info = parse_reflection(both).unwrap();
        assert_eq!(
            info.textures,
            [TextureBinding {
                name: "vtex".to_owned(),
                binding: 2,
            }]
        );

        let fragment_only = br#"{"fs": {"textures": [{"name": "tex", "binding": 0}]}}"#;
        let info = parse_reflection(fragment_only).unwrap();
        assert_eq!(info.textures.len(), 1);
        assert_eq!(info.textures[0].name, "tex");
    }

    #[test_log::test]
    fn fragment_inputs_are_not_reflected() {
        let json = br#"{"fs": {"inputs": [{"name": "vUV", "location": 0, "type": "float2"}]}}"#;
        let info = parse_reflection(json).unwrap();
        assert!(info.inputs.is_empty());
    }

    #[test_log::test]
    fn unsupported_member_type() {
        let json = br#"{
            "vs": {"uniform_buffers": [{"id": 0, "name": "B", "block_size": 64,
                "members": [{"name": "m", "type": "mat4", "offset": 0}]}]}
        }"#;
        let err = parse_reflection(json).unwrap_err();
        assert!(
            matches!(&err, ReflectionParseError::UnsupportedType(UnsupportedTypeError(name)) if name == "mat4"),
            "{err}"
        );
    }

    #[test_log::test]
    fn unsupported_input_type() {
        let json = br#"{"vs": {"inputs": [{"name": "n", "location": 0, "type": "half3"}]}}"#;
        let err = parse_reflection(json).unwrap_err();
        assert_eq!(err.to_string(), "unsupported input data type: half3");
    }

    #[test_log::test]
    fn layout_overflow_is_rejected() {
        let json = br#"{
            "vs": {"uniform_buffers": [
                {"id": 0, "name": "Huge", "block_size": 4294967295, "members": []},
                {"id": 1, "name": "Next", "block_size": 16,
                 "members": [{"name": "x", "type": "float", "offset": 0}]}
            ]}
        }"#;
        let err = parse_reflection(json).unwrap_err();
        assert!(
            matches!(&err, ReflectionParseError::LayoutOverflow { block } if block == "Next"),
            "{err}"
        );

        let member = br#"{
            "vs": {"uniform_buffers": [
                {"id": 0, "name": "A", "block_size": 4294967295, "members": []},
                {"id": 1, "name": "B", "block_size": 0,
                 "members": [{"name": "x", "type": "float", "offset": 4}]}
            ]}
        }"#;
        let err = parse_reflection(member).unwrap_err();
        assert!(matches!(err, ReflectionParseError::LayoutOverflow { .. }), "{err}");
    }

    #[test_log::test]
    fn malformed_json() {
        let err = parse_reflection(b"{\"vs\": [").unwrap_err();
        assert!(matches!(err, ReflectionParseError::Json(_)));
        let err = parse_reflection(br#"{"vs": {"inputs": 3}}"#).unwrap_err();
        assert!(matches!(err, ReflectionParseError::Json(_)));
    }

    #[test_log::test]
    fn empty_document() {
        let info = parse_reflection(b"{}").unwrap();
        assert_eq!(info, ReflectionInfo::default());
    }
}
