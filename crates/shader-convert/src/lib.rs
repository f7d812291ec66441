//! Ahead-of-time conversion of portable GLSL shaders for the gio GPU backends.
//!
//! Every `.vert` and `.frag` source in a directory is rendered as a template
//! into a solid color and a textured variant. Each variant is then translated
//! by `glslcc` into GLSL ES 1.00, GLSL ES 3.00, GLSL 1.30 and HLSL, the HLSL
//! is compiled to Direct3D bytecode, and the results are emitted together with
//! their reflection data as a Go source module.
//!
//! # How it works
//!
//! The [`Generator`] drives the pipeline one shader, variant and target at a
//! time:
//!
//! 1. [`template`] renders the variant into a scratch file.
//! 2. [`glslcc`] runs the cross-compiler once per [`Target`].
//! 3. [`reflection`] decodes the reflection document of the first GLSL ES pass.
//! 4. [`bytecode`] compiles the HLSL, falling back to a higher feature level.
//! 5. [`assemble`] folds both variants into a [`ShaderRecord`] and renders the module.
//!
//! Any error aborts the whole run before the module is written.

#![expect(clippy::pub_use, reason = "part of public API")]

pub use self::{
    assemble::{Module, ShaderRecord, ShaderVariant},
    bytecode::{BytecodeCompiler, Fxc, FxcError},
    generate::{GenerateError, GenerateParams, Generator},
    glslcc::{Glslcc, Target},
    stage::{find_shaders, ShaderStage},
};

pub mod assemble;
pub mod bytecode;
pub mod command;
pub mod data_type;
pub mod generate;
pub mod glslcc;
pub mod go_syntax;
pub mod reflection;
pub mod stage;
pub mod template;

/// Writes a short progress line to the user.
///
/// Evaluates to the [`io::Result`](std::io::Result) of writing and flushing.
#[macro_export]
macro_rules! user_output {
    ($dst: expr, $($args: tt)*) => { {
        #[allow(
            clippy::allow_attributes,
            clippy::useless_attribute,
            unused_imports,
            reason = "`std::io::Write` is only sometimes called??"
        )]
        use ::std::io::Write as _;

        let writer = &mut $dst;
        ::std::write!(writer, $($args)*).and_then(|()| writer.flush())
    } };
}
