//! Built-in GLSL types and the pass-through node identities derived from them.

use std::{collections::HashSet, str::FromStr};

use paste::paste;

/// Name of the fragment output slot. Nodes of this identity are referenced directly.
pub const OUTPUT_COLOR: &str = "outColor";

/// Literal used for inputs whose type has no dedicated default.
pub const FALLBACK_LITERAL: &str = "1.0";

macro_rules! glsl_types {
    (@pass_through pass_through) => { true };
    (@pass_through) => { false };

    { $($(#[$attr:meta])* $ty:ident => $default:literal $(| $flag:ident)?),+ $(,)? } => {
        paste! {
            #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
            /// GLSL types the compiler knows defaults for.
            pub enum GlslType {
                $(
                    $(#[$attr])*
                    [<$ty:camel>],
                )+
            }

            impl GlslType {
                /// Every known type, in declaration order.
                pub const ALL: &'static [GlslType] = &[$(GlslType::[<$ty:camel>]),+];

                /// GLSL spelling of the type.
                pub fn as_str(self) -> &'static str {
                    match self {
                        $(Self::[<$ty:camel>] => stringify!($ty),)+
                    }
                }

                /// Literal substituted for an input of this type that nothing feeds.
                pub fn default_literal(self) -> &'static str {
                    match self {
                        $(Self::[<$ty:camel>] => $default,)+
                    }
                }

                /// Whether a node of this identity is a raw value rather than a function call.
                pub fn is_pass_through(self) -> bool {
                    match self {
                        $(Self::[<$ty:camel>] => glsl_types!(@pass_through $($flag)?),)+
                    }
                }
            }

            impl FromStr for GlslType {
                type Err = String;

                fn from_str(s: &str) -> Result<Self, Self::Err> {
                    Ok(match s {
                        $(stringify!($ty) => Self::[<$ty:camel>],)+
                        other => Err(format!("Unrecognized GLSL type `{other}`."))?,
                    })
                }
            }
        }
    };
}

glsl_types! {
    /// Signed integer
    int => "1" | pass_through,
    /// Single float
    float => "1.0" | pass_through,
    /// 2D vector
    vec2 => "vec2(0, 0)" | pass_through,
    /// 3D vector
    vec3 => "vec3(0, 0, 0)" | pass_through,
    /// 4D vector, opaque by default
    vec4 => "vec4(0, 0, 0, 1)" | pass_through,
    /// 2x2 matrix
    mat2 => "mat2(1.0)",
    /// 3x3 matrix
    mat3 => "mat3(1.0)",
    /// 4x4 matrix
    mat4 => "mat4(1.0)",
    /// 2D texture sampler
    sampler2D => "1.0" | pass_through,
    /// Cube map sampler
    samplerCube => "1.0" | pass_through,
}

lazy_static::lazy_static! {
    static ref PASS_THROUGH: HashSet<&'static str> = GlslType::ALL
        .iter()
        .filter(|ty| ty.is_pass_through())
        .map(|ty| ty.as_str())
        .chain(std::iter::once(OUTPUT_COLOR))
        .collect();
}

/// Whether nodes of the given function identity are referenced directly instead of called.
pub fn is_pass_through(function: &str) -> bool {
    PASS_THROUGH.contains(function)
}

/// Default literal for a type given by name, falling back to [FALLBACK_LITERAL].
pub fn default_literal(ty: &str) -> &'static str {
    GlslType::from_str(ty).map_or(FALLBACK_LITERAL, GlslType::default_literal)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn names_round_trip() {
        for ty in GlslType::ALL {
            assert_eq!(GlslType::from_str(ty.as_str()), Ok(*ty));
        }
        assert_eq!(GlslType::Sampler2D.as_str(), "sampler2D");
        assert_eq!(GlslType::SamplerCube.as_str(), "samplerCube");
        assert!(GlslType::from_str("Light").is_err());
    }

    #[test]
    fn pass_through_identities() {
        for name in ["int", "float", "vec2", "vec3", "vec4", "sampler2D", "samplerCube", "outColor"] {
            assert!(is_pass_through(name), "{name} should be pass-through");
        }
        for name in ["mat4", "phong", "vec3_shadow", ""] {
            assert!(!is_pass_through(name), "{name} should be called");
        }
    }

    #[test]
    fn default_literals_match_arity() {
        assert_eq!(default_literal("float"), "1.0");
        assert_eq!(default_literal("vec2"), "vec2(0, 0)");
        assert_eq!(default_literal("vec3"), "vec3(0, 0, 0)");
        assert_eq!(default_literal("vec4"), "vec4(0, 0, 0, 1)");
        assert_eq!(default_literal("mat3"), "mat3(1.0)");
        assert_eq!(default_literal("LightData"), FALLBACK_LITERAL);
    }
}
