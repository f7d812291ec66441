//! Folding converted shader variants into the generated Go module.

use core::fmt::{self, Write as _};

use crate::{go_syntax::Go, reflection::ReflectionInfo};

/// Derives the GLSL 1.50 source from the GLSL 1.30 one.
///
/// OpenGL 3.2 core only accepts `#version 150`, but is otherwise compatible
/// with 1.30 sources, so only the first version directive changes.
#[inline]
#[must_use]
pub fn glsl150_from_glsl130(glsl130: &str) -> String {
    glsl130.replacen("#version 130", "#version 150", 1)
}

/// Every representation of one shader variant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[non_exhaustive]
pub struct ShaderVariant {
    /// Inputs, uniforms and textures.
    pub reflection: ReflectionInfo,
    /// OpenGL ES 2.0 source.
    pub glsl100es: String,
    /// OpenGL ES 3.0 source.
    pub glsl300es: String,
    /// OpenGL 3.0 source.
    pub glsl130: String,
    /// OpenGL 3.2 core source.
    pub glsl150: String,
    /// HLSL source the bytecode was compiled from.
    pub hlsl_source: String,
    /// Direct3D bytecode.
    pub hlsl: Vec<u8>,
}

impl ShaderVariant {
    /// Creates a variant, deriving the GLSL 1.50 source from `glsl130`.
    #[inline]
    #[must_use]
    pub fn new(
        reflection: ReflectionInfo,
        glsl100es: String,
        glsl300es: String,
        glsl130: String,
        hlsl_source: String,
        hlsl: Vec<u8>,
    ) -> Self {
        let glsl150 = glsl150_from_glsl130(&glsl130);
        Self {
            reflection,
            glsl100es,
            glsl300es,
            glsl130,
            glsl150,
            hlsl_source,
            hlsl,
        }
    }
}

impl fmt::Display for ShaderVariant {
    /// Writes the `backend.ShaderSources` literal, fields in a fixed order.
    #[expect(
        clippy::min_ident_chars,
        reason = "It's a core library trait implementation"
    )]
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ReflectionInfo {
            inputs,
            uniforms,
            textures,
        } = &self.reflection;

        f.write_str("backend.ShaderSources{\n")?;
        if !inputs.is_empty() {
            writeln!(f, "Inputs: {},", Go(inputs.as_slice()))?;
        }
        if !uniforms.blocks.is_empty() {
            f.write_str("Uniforms: backend.UniformsReflection{\n")?;
            writeln!(f, "Blocks: {},", Go(uniforms.blocks.as_slice()))?;
            writeln!(f, "Locations: {},", Go(uniforms.members.as_slice()))?;
            writeln!(f, "Size: {},", uniforms.size)?;
            f.write_str("},\n")?;
        }
        if !textures.is_empty() {
            writeln!(f, "Textures: {},", Go(textures.as_slice()))?;
        }
        writeln!(f, "GLSL100ES: {},", Go(&self.glsl100es))?;
        writeln!(f, "GLSL300ES: {},", Go(&self.glsl300es))?;
        writeln!(f, "GLSL130: {},", Go(&self.glsl130))?;
        writeln!(f, "GLSL150: {},", Go(&self.glsl150))?;
        // A `*/` inside the HLSL would end the comment early.
        writeln!(f, "/*\n{}\n*/", self.hlsl_source.replace("*/", "* /"))?;
        writeln!(f, "HLSL: {},", Go(self.hlsl.as_slice()))?;
        f.write_char('}')
    }
}

/// The solid color and textured variants of one shader.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct ShaderRecord {
    /// File name of the shader source, such as `blit.frag`.
    pub name: String,
    /// Variants in [`VARIANTS`](crate::template::VARIANTS) order.
    pub variants: [ShaderVariant; 2],
}

impl ShaderRecord {
    /// Creates a record for the shader file `name`.
    #[inline]
    #[must_use]
    pub const fn new(name: String, variants: [ShaderVariant; 2]) -> Self {
        Self { name, variants }
    }

    /// Whether the variants differ, judged by their GLSL ES 2.0 output.
    /// A shader ignoring the variant parameters renders identically for both.
    #[inline]
    #[must_use]
    pub fn is_multi_variant(&self) -> bool {
        let [solid, textured] = &self.variants;
        solid.glsl100es != textured.glsl100es
    }

    /// The variants that end up in the generated module.
    #[inline]
    #[must_use]
    pub fn emitted_variants(&self) -> &[ShaderVariant] {
        if self.is_multi_variant() {
            &self.variants
        } else {
            &self.variants[..1]
        }
    }

    /// Name of the Go variable holding this shader, such as `shader_blit_frag`.
    #[inline]
    #[must_use]
    pub fn binding_name(&self) -> String {
        let sanitized: String = self
            .name
            .chars()
            .map(|ch| if ch.is_ascii_alphanumeric() { ch } else { '_' })
            .collect();
        format!("shader_{sanitized}")
    }
}

impl fmt::Display for ShaderRecord {
    /// Writes `shader_<name> = <value>`, the value being a single
    /// `backend.ShaderSources` or an array of two.
    #[expect(
        clippy::min_ident_chars,
        reason = "It's a core library trait implementation"
    )]
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\t{} = ", self.binding_name())?;
        if self.is_multi_variant() {
            f.write_str("[...]backend.ShaderSources{\n")?;
            for variant in &self.variants {
                writeln!(f, "{variant},")?;
            }
            f.write_str("}\n")
        } else {
            writeln!(f, "{}", self.variants[0])
        }
    }
}

/// The generated Go source module.
#[derive(Debug, Clone, Copy)]
#[non_exhaustive]
pub struct Module<'records> {
    /// Go package name.
    pub package: &'records str,
    /// Shaders, in the order they are declared.
    pub records: &'records [ShaderRecord],
}

impl<'records> Module<'records> {
    /// Creates a module declaring `records` in package `package`.
    #[inline]
    #[must_use]
    pub const fn new(package: &'records str, records: &'records [ShaderRecord]) -> Self {
        Self { package, records }
    }
}

impl fmt::Display for Module<'_> {
    #[expect(
        clippy::min_ident_chars,
        reason = "It's a core library trait implementation"
    )]
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("// Code generated by shader-convert. DO NOT EDIT.\n\n")?;
        writeln!(f, "package {}\n", self.package)?;
        writeln!(f, "import {}\n", Go("gioui.org/gpu/backend"))?;
        f.write_str("var (\n")?;
        for record in self.records {
            write!(f, "{record}")?;
        }
        f.write_str(")\n")
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        data_type::DataType,
        reflection::{TextureBinding, UniformBlock, UniformLayout, UniformMember},
    };

    fn variant(glsl100es: &str) -> ShaderVariant {
        ShaderVariant::new(
            ReflectionInfo::default(),
            glsl100es.to_owned(),
            "#version 300 es\n".to_owned(),
            "#version 130\nvoid main() {}\n".to_owned(),
            "float4 main() : SV_Target { return 0; }".to_owned(),
            vec![0x44, 0x58],
        )
    }

    #[test_log::test]
    fn glsl150_only_changes_first_directive() {
        let glsl130 = "#version 130\n// #version 130\nvoid main() {}\n";
        assert_eq!(
            glsl150_from_glsl130(glsl130),
            "#version 150\n// #version 130\nvoid main() {}\n"
        );
        assert_eq!(glsl150_from_glsl130("no directive"), "no directive");
        assert_eq!(variant("x").glsl150, "#version 150\nvoid main() {}\n");
    }

    #[test_log::test]
    fn identical_variants_collapse() {
        let record = ShaderRecord::new(
            "blit.vert".to_owned(),
            [variant("#version 100\n"), variant("#version 100\n")],
        );
        assert!(!record.is_multi_variant());
        assert_eq!(record.emitted_variants().len(), 1);

        let text = record.to_string();
        assert!(text.starts_with("\tshader_blit_vert = backend.ShaderSources{\n"), "{text}");
        assert!(!text.contains("[...]"));
        assert_eq!(text.matches("backend.ShaderSources{").count(), 1);
        assert!(text.ends_with("}\n"));
    }

    #[test_log::test]
    fn differing_variants_are_both_emitted_in_order() {
        let record = ShaderRecord::new(
            "copy.frag".to_owned(),
            [variant("solid"), variant("textured")],
        );
        assert!(record.is_multi_variant());
        assert_eq!(record.emitted_variants().len(), 2);

        let text = record.to_string();
        assert!(text.starts_with("\tshader_copy_frag = [...]backend.ShaderSources{\n"));
        assert_eq!(text.matches("backend.ShaderSources{\n").count(), 3);
        let solid = text.find("GLSL100ES: \"solid\"").unwrap();
        let textured = text.find("GLSL100ES: \"textured\"").unwrap();
        assert!(solid < textured);
        assert!(text.ends_with("},\n}\n"));
    }

    #[test_log::test]
    fn variant_field_order() {
        let reflection = ReflectionInfo {
            inputs: Vec::new(),
            uniforms: UniformLayout {
                blocks: vec![UniformBlock {
                    name: "Color".to_owned(),
                    binding: 0,
                }],
                members: vec![UniformMember {
                    name: "_3._color".to_owned(),
                    data_type: DataType::Float,
                    size: 4,
                    offset: 0,
                }],
                size: 16,
            },
            textures: vec![TextureBinding {
                name: "tex".to_owned(),
                binding: 1,
            }],
        };
        let variant = ShaderVariant {
            reflection,
            ..variant("#version 100\n")
        };
        let expected = "backend.ShaderSources{\n\
            Uniforms: backend.UniformsReflection{\n\
            Blocks: []backend.UniformBlock{backend.UniformBlock{Name:\"Color\", Binding:0}},\n\
            Locations: []backend.UniformLocation{backend.UniformLocation{Name:\"_3._color\", Type:0x0, Size:4, Offset:0}},\n\
            Size: 16,\n\
            },\n\
            Textures: []backend.TextureBinding{backend.TextureBinding{Name:\"tex\", Binding:1}},\n\
            GLSL100ES: \"#version 100\\n\",\n\
            GLSL300ES: \"#version 300 es\\n\",\n\
            GLSL130: \"#version 130\\nvoid main() {}\\n\",\n\
            GLSL150: \"#version 150\\nvoid main() {}\\n\",\n\
            /*\n\
            float4 main() : SV_Target { return 0; }\n\
            */\n\
            HLSL: []byte{0x44, 0x58},\n\
            }";
        assert_eq!(variant.to_string(), expected);
    }

    #[test_log::test]
    fn hlsl_comment_cannot_be_closed_early() {
        let variant = ShaderVariant {
            hlsl_source: "/* header */ float4 main();".to_owned(),
            ..variant("x")
        };
        let text = variant.to_string();
        assert!(text.contains("/*\n/* header * / float4 main();\n*/\n"), "{text}");
    }

    #[test_log::test]
    fn binding_names_are_sanitized() {
        let record = ShaderRecord::new("stencil-blit.frag".to_owned(), [variant("a"), variant("a")]);
        assert_eq!(record.binding_name(), "shader_stencil_blit_frag");
    }

    #[test_log::test]
    fn module_layout() {
        let records = [
            ShaderRecord::new("a.frag".to_owned(), [variant("a"), variant("a")]),
            ShaderRecord::new("b.vert".to_owned(), [variant("b"), variant("b")]),
        ];
        let text = Module::new("gpu", &records).to_string();
        assert!(text.starts_with(
            "// Code generated by shader-convert. DO NOT EDIT.\n\n\
             package gpu\n\n\
             import \"gioui.org/gpu/backend\"\n\n\
             var (\n\
             \tshader_a_frag = backend.ShaderSources{\n"
        ));
        assert!(text.find("shader_a_frag").unwrap() < text.find("shader_b_vert").unwrap());
        assert!(text.ends_with("}\n)\n"));

        let empty = Module::new("gpu", &[]).to_string();
        assert!(empty.ends_with("var (\n)\n"));
    }
}
