//! Rendering of values as Go composite literals, the way Go's `%#v` verb prints them.

use core::fmt::{self, Write as _};

use crate::{
    data_type::DataType,
    reflection::{InputBinding, TextureBinding, UniformBlock, UniformMember},
};

/// A value that can be written as a Go expression.
pub trait GoSyntax {
    /// Writes the Go expression for `self`.
    ///
    /// # Errors
    ///
    /// Only fails if the formatter does.
    fn fmt_go(&self, out: &mut fmt::Formatter<'_>) -> fmt::Result;
}

/// A value that is written as a Go struct literal of the `backend` package.
pub trait GoStruct {
    /// Qualified Go type name, such as `backend.TextureBinding`.
    const TYPE_NAME: &'static str;

    /// Field names and values, in declaration order.
    fn fields(&self) -> Vec<(&'static str, &dyn GoSyntax)>;
}

/// Adapter displaying a value in Go syntax.
#[derive(Debug)]
#[expect(clippy::exhaustive_structs, reason = "a plain wrapper")]
pub struct Go<'value, T: ?Sized>(pub &'value T);

impl<T: GoSyntax + ?Sized> fmt::Display for Go<'_, T> {
    #[expect(
        clippy::min_ident_chars,
        reason = "It's a core library trait implementation"
    )]
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt_go(f)
    }
}

impl GoSyntax for str {
    /// Double-quoted with the escapes of Go's `strconv.Quote`.
    #[inline]
    fn fmt_go(&self, out: &mut fmt::Formatter<'_>) -> fmt::Result {
        out.write_char('"')?;
        for ch in self.chars() {
            match ch {
                '\x07' => out.write_str("\\a")?,
                '\x08' => out.write_str("\\b")?,
                '\x0c' => out.write_str("\\f")?,
                '\n' => out.write_str("\\n")?,
                '\r' => out.write_str("\\r")?,
                '\t' => out.write_str("\\t")?,
                '\x0b' => out.write_str("\\v")?,
                '\\' => out.write_str("\\\\")?,
                '"' => out.write_str("\\\"")?,
                ' '..='~' => out.write_char(ch)?,
                '\0'..='\x1f' | '\x7f' => write!(out, "\\x{:02x}", u32::from(ch))?,
                _ if !is_go_printable(ch) => {
                    if u32::from(ch) < 0x1_0000 {
                        write!(out, "\\u{:04x}", u32::from(ch))?;
                    } else {
                        write!(out, "\\U{:08x}", u32::from(ch))?;
                    }
                }
                _ => out.write_char(ch)?,
            }
        }
        out.write_char('"')
    }
}

/// Format characters and private use areas, which `strconv.IsPrint` rejects.
const FORMAT_AND_PRIVATE_USE: &[(char, char)] = &[
    ('\u{ad}', '\u{ad}'),
    ('\u{600}', '\u{605}'),
    ('\u{61c}', '\u{61c}'),
    ('\u{6dd}', '\u{6dd}'),
    ('\u{70f}', '\u{70f}'),
    ('\u{890}', '\u{891}'),
    ('\u{8e2}', '\u{8e2}'),
    ('\u{180e}', '\u{180e}'),
    ('\u{200b}', '\u{200f}'),
    ('\u{202a}', '\u{202e}'),
    ('\u{2060}', '\u{206f}'),
    ('\u{e000}', '\u{f8ff}'),
    ('\u{feff}', '\u{feff}'),
    ('\u{fff9}', '\u{fffb}'),
    ('\u{110bd}', '\u{110bd}'),
    ('\u{110cd}', '\u{110cd}'),
    ('\u{13430}', '\u{1343f}'),
    ('\u{1bca0}', '\u{1bca3}'),
    ('\u{1d173}', '\u{1d17a}'),
    ('\u{e0001}', '\u{e0001}'),
    ('\u{e0020}', '\u{e007f}'),
    ('\u{f0000}', '\u{10ffff}'),
];

/// Whether Go's `strconv.Quote` writes `ch` as is: ASCII space, or a
/// character that is neither a control, a space nor a format or private use one.
fn is_go_printable(ch: char) -> bool {
    ch == ' '
        || !(ch.is_control()
            || ch.is_whitespace()
            || FORMAT_AND_PRIVATE_USE
                .iter()
                .any(|&(first, last)| (first..=last).contains(&ch)))
}

impl GoSyntax for String {
    #[inline]
    fn fmt_go(&self, out: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.as_str().fmt_go(out)
    }
}

impl GoSyntax for [u8] {
    #[inline]
    fn fmt_go(&self, out: &mut fmt::Formatter<'_>) -> fmt::Result {
        out.write_str("[]byte{")?;
        for (index, byte) in self.iter().enumerate() {
            if index > 0 {
                out.write_str(", ")?;
            }
            write!(out, "{byte:#x}")?;
        }
        out.write_char('}')
    }
}

impl GoSyntax for i32 {
    #[inline]
    fn fmt_go(&self, out: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(out, "{self}")
    }
}

impl GoSyntax for u32 {
    #[inline]
    fn fmt_go(&self, out: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(out, "{self}")
    }
}

impl GoSyntax for DataType {
    /// `backend.DataType` is a `uint8`, which `%#v` prints in hex.
    #[inline]
    fn fmt_go(&self, out: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(out, "{:#x}", self.code())
    }
}

impl<T: GoStruct> GoSyntax for T {
    #[inline]
    fn fmt_go(&self, out: &mut fmt::Formatter<'_>) -> fmt::Result {
        out.write_str(T::TYPE_NAME)?;
        out.write_char('{')?;
        for (index, (name, value)) in self.fields().into_iter().enumerate() {
            if index > 0 {
                out.write_str(", ")?;
            }
            write!(out, "{name}:")?;
            value.fmt_go(out)?;
        }
        out.write_char('}')
    }
}

impl<T: GoStruct> GoSyntax for [T] {
    #[inline]
    fn fmt_go(&self, out: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(out, "[]{}{{", T::TYPE_NAME)?;
        for (index, item) in self.iter().enumerate() {
            if index > 0 {
                out.write_str(", ")?;
            }
            item.fmt_go(out)?;
        }
        out.write_char('}')
    }
}

impl GoStruct for InputBinding {
    const TYPE_NAME: &'static str = "backend.InputLocation";

    #[inline]
    fn fields(&self) -> Vec<(&'static str, &dyn GoSyntax)> {
        vec![
            ("Name", &self.name),
            ("Location", &self.location),
            ("Semantic", &self.semantic),
            ("SemanticIndex", &self.semantic_index),
            ("Type", &self.data_type),
            ("Size", &self.size),
        ]
    }
}

impl GoStruct for UniformBlock {
    const TYPE_NAME: &'static str = "backend.UniformBlock";

    #[inline]
    fn fields(&self) -> Vec<(&'static str, &dyn GoSyntax)> {
        vec![("Name", &self.name), ("Binding", &self.binding)]
    }
}

impl GoStruct for UniformMember {
    const TYPE_NAME: &'static str = "backend.UniformLocation";

    #[inline]
    fn fields(&self) -> Vec<(&'static str, &dyn GoSyntax)> {
        vec![
            ("Name", &self.name),
            ("Type", &self.data_type),
            ("Size", &self.size),
            ("Offset", &self.offset),
        ]
    }
}

impl GoStruct for TextureBinding {
    const TYPE_NAME: &'static str = "backend.TextureBinding";

    #[inline]
    fn fields(&self) -> Vec<(&'static str, &dyn GoSyntax)> {
        vec![("Name", &self.name), ("Binding", &self.binding)]
    }
}
